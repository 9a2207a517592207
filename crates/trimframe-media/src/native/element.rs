// crates/trimframe-media/src/native/element.rs
//
// FfmpegVideoElement: a decode-backed video element.
//
// Holds one open input and one decoder for the attached source and keeps the
// most recent decoded frame as "the frame at the playhead". Seeks that move
// forward by less than FORWARD_DECODE_SECS decode sequentially instead of
// flushing, so the sampler's monotonic seeks never pay for a keyframe rewind
// twice. Playback is wall-clock driven: `current_time` is the play origin
// plus elapsed real time, and `draw_to` decodes forward to that position.

use std::path::PathBuf;
use std::time::Instant;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::{input, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video as VideoFrame;
use anyhow::{anyhow, Context as _};
use log::{debug, warn};
use trimframe_core::{MediaError, Result};

use crate::helpers::pixels::frame_to_surface;
use crate::helpers::seek::seek_to_secs;
use crate::host::{Surface, VideoElement, VideoMetadata};

/// Forward jumps shorter than this decode through instead of seeking.
const FORWARD_DECODE_SECS: f64 = 2.0;

/// Used when the stream does not report an average frame rate.
const FALLBACK_FRAME_SECS: f64 = 1.0 / 30.0;

// ── Attached source ───────────────────────────────────────────────────────────

struct Source {
    src:        String,
    ictx:       ffmpeg::format::context::Input,
    decoder:    ffmpeg::decoder::video::Video,
    video_idx:  usize,
    time_base:  f64,
    frame_secs: f64,
    meta:       VideoMetadata,
    eof:        bool,
    /// Last decoded frame and its presentation time in seconds.
    current:    Option<(VideoFrame, f64)>,
    /// RGBA scaler keyed by its output size.
    scaler:     Option<(SwsContext, u32, u32)>,
}

impl Source {
    fn open(src: &str) -> anyhow::Result<Self> {
        let ictx = input(&PathBuf::from(src)).with_context(|| format!("open input {src}"))?;
        let video_idx = ictx.streams().best(Type::Video)
            .ok_or_else(|| anyhow!("no video stream"))?
            .index();

        let (time_base, frame_secs, stream_secs, width, height) = {
            let stream = ictx.stream(video_idx).ok_or_else(|| anyhow!("video stream vanished"))?;
            let tb  = f64::from(stream.time_base());
            let fps = f64::from(stream.avg_frame_rate());
            let frame_secs = if fps.is_finite() && fps > 0.0 { 1.0 / fps } else { FALLBACK_FRAME_SECS };
            let stream_secs = if stream.duration() > 0 { stream.duration() as f64 * tb } else { 0.0 };
            let (w, h) = unsafe {
                let p = stream.parameters().as_ptr();
                ((*p).width as u32, (*p).height as u32)
            };
            (tb, frame_secs, stream_secs, w, h)
        };

        // Second context for decoder params (Parameters borrows from the stream).
        let ictx2   = input(&PathBuf::from(src))?;
        let stream2 = ictx2.stream(video_idx).ok_or_else(|| anyhow!("video stream vanished"))?;
        let decoder = ffmpeg::codec::context::Context::from_parameters(stream2.parameters())?
            .decoder()
            .video()
            .context("open video decoder")?;

        let container_secs = if ictx.duration() > 0 {
            ictx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
        } else {
            0.0
        };
        let duration = if container_secs > 0.0 { container_secs } else { stream_secs };

        Ok(Self {
            src: src.to_string(),
            ictx,
            decoder,
            video_idx,
            time_base,
            frame_secs,
            meta: VideoMetadata { duration, width: width.max(1), height: height.max(1) },
            eof: false,
            current: None,
            scaler: None,
        })
    }

    /// Pull the next decoded frame, feeding packets as needed.
    /// `Ok(None)` once the decoder is drained.
    fn next_frame(&mut self) -> Result<Option<(VideoFrame, f64)>> {
        let mut decoded = VideoFrame::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let fallback = self.current.as_ref().map(|(_, t)| t + self.frame_secs).unwrap_or(0.0);
                let secs = decoded.pts()
                    .or(decoded.timestamp())
                    .map(|pts| pts as f64 * self.time_base)
                    .unwrap_or(fallback);
                return Ok(Some((decoded, secs)));
            }
            if self.eof {
                return Ok(None);
            }
            let packet = match self.ictx.packets().next() {
                Some(Ok((stream, packet))) => {
                    if stream.index() != self.video_idx { continue; }
                    packet
                }
                Some(Err(e)) => {
                    warn!("[ffmpeg] read error in {}: {e}", self.src);
                    self.finish_input();
                    continue;
                }
                None => {
                    self.finish_input();
                    continue;
                }
            };
            // Corrupt packets are skipped; the decoder resyncs on the next keyframe.
            let _ = self.decoder.send_packet(&packet);
        }
    }

    fn finish_input(&mut self) {
        self.eof = true;
        let _ = self.decoder.send_eof();
    }

    /// Decode forward until the frame covering `target` is current.
    /// Returns `false` if the input ran out first; the last frame stays current.
    fn decode_to(&mut self, target: f64) -> Result<bool> {
        let tolerance = self.frame_secs / 2.0;
        if let Some((_, t)) = &self.current {
            if *t >= target - tolerance {
                return Ok(true);
            }
        }
        while let Some((frame, secs)) = self.next_frame()? {
            self.current = Some((frame, secs));
            if secs >= target - tolerance {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Position the decoder so the next decoded frames lead up to `target`.
    fn rewind_to(&mut self, target: f64) -> Result<()> {
        if seek_to_secs(&mut self.ictx, target, "element") {
            self.decoder.flush();
        } else {
            // Reopen and decode from the start.
            debug!("[ffmpeg] reopening {} after failed seek", self.src);
            let fresh = Source::open(&self.src).map_err(|e| MediaError::Seek {
                time:   target,
                reason: format!("{e:#}"),
            })?;
            self.ictx    = fresh.ictx;
            self.decoder = fresh.decoder;
        }
        self.eof = false;
        self.current = None;
        Ok(())
    }

    fn seek(&mut self, target: f64) -> Result<()> {
        let near_ahead = self.current.as_ref()
            .is_some_and(|(_, t)| target >= *t && target - *t < FORWARD_DECODE_SECS);
        if !near_ahead {
            self.rewind_to(target)?;
        }
        self.decode_to(target)?;
        if self.current.is_none() {
            return Err(MediaError::Seek { time: target, reason: "no decodable frame".into() });
        }
        Ok(())
    }

    fn paint(&mut self, surface: &mut Surface) -> Result<()> {
        let (w, h) = (surface.width(), surface.height());
        let Some((frame, _)) = &self.current else {
            return Err(MediaError::Encode("no frame decoded yet".into()));
        };
        let stale = self.scaler.as_ref().map_or(true, |(_, sw, sh)| (*sw, *sh) != (w, h));
        if stale {
            let scaler = SwsContext::get(
                frame.format(), frame.width(), frame.height(),
                Pixel::RGBA, w, h, Flags::BILINEAR,
            )
            .map_err(|e| MediaError::Encode(format!("scaler: {e}")))?;
            self.scaler = Some((scaler, w, h));
        }
        let (scaler, _, _) = self.scaler.as_mut()
            .ok_or_else(|| MediaError::Encode("scaler missing".into()))?;
        let mut rgba = VideoFrame::empty();
        scaler.run(frame, &mut rgba)
            .map_err(|e| MediaError::Encode(format!("scale: {e}")))?;
        frame_to_surface(&rgba, surface);
        Ok(())
    }
}

// ── Element ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FfmpegVideoElement {
    source:   Option<Source>,
    playhead: f64,
    /// Wall-clock origin and playhead at the moment `play` was called.
    playing:  Option<(Instant, f64)>,
    ended:    bool,
}

impl FfmpegVideoElement {
    pub fn new() -> Self {
        Self::default()
    }

    fn source_mut(&mut self) -> Result<&mut Source> {
        self.source.as_mut()
            .ok_or_else(|| MediaError::InvalidRequest("video element has no source".into()))
    }

    fn duration(&self) -> f64 {
        self.source.as_ref().map(|s| s.meta.duration).unwrap_or(0.0)
    }
}

impl VideoElement for FfmpegVideoElement {
    fn load(&mut self, src: &str) -> Result<VideoMetadata> {
        self.detach();
        let mut source = Source::open(src).map_err(|e| MediaError::load(src, format!("{e:#}")))?;
        source.decode_to(0.0)?;
        if source.current.is_none() {
            return Err(MediaError::load(src, "no decodable video frame"));
        }
        let meta = source.meta;
        debug!("[ffmpeg] loaded {src}: {:.3}s {}x{}", meta.duration, meta.width, meta.height);
        self.source = Some(source);
        Ok(meta)
    }

    fn seek_to(&mut self, time: f64) -> Result<()> {
        let target = time.clamp(0.0, self.duration());
        self.source_mut()?.seek(target)?;
        self.playhead = target;
        if self.playing.is_some() {
            self.playing = Some((Instant::now(), target));
        }
        self.ended = false;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.source_mut()?;
        if self.playing.is_none() {
            self.playing = Some((Instant::now(), self.playhead));
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.playhead = self.current_time();
        self.playing = None;
    }

    fn current_time(&self) -> f64 {
        match self.playing {
            Some((origin, from)) => (from + origin.elapsed().as_secs_f64()).min(self.duration()),
            None => self.playhead,
        }
    }

    fn ended(&self) -> bool {
        self.ended || (self.playing.is_some() && self.current_time() >= self.duration())
    }

    fn draw_to(&mut self, surface: &mut Surface) -> Result<()> {
        if self.playing.is_some() {
            let now = self.current_time();
            let source = self.source_mut()?;
            if !source.decode_to(now)? {
                self.ended = true;
            }
        }
        self.source_mut()?.paint(surface)
    }

    fn detach(&mut self) {
        self.source   = None;
        self.playing  = None;
        self.playhead = 0.0;
        self.ended    = false;
    }

    fn has_source(&self) -> bool {
        self.source.is_some()
    }
}
