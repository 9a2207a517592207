// crates/trimframe-media/src/native/recorder.rs
//
// FfmpegRecorder: captures surfaces into a WebM (VP8/VP9) or MP4 (H.264) file.
//
// The muxed output goes to a temp file that is read back and split into
// CHUNK_BYTES pieces on stop, which is the shape a streaming recorder hands
// its data out in.
//
// Timestamps follow the wall clock, not the capture count: a frame captured
// `t` seconds after start gets pts round(t * fps). When painting or encoding
// runs slower than real time, frames are missing from the stream but the
// output duration still matches the time that was recorded. A capture that
// would reuse the previous pts is dropped.
//
// H.264 is encoded as baseline profile at the lowest level that fits the
// frame size, rate and bitrate. The reported MIME carries the profile and
// level read back from the encoder's SPS, not the ones that were asked for.

use std::path::Path;
use std::time::Instant;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::codec;
use ffmpeg::encoder;
use ffmpeg::format::{output as open_output, Pixel};
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video as VideoFrame;
use ffmpeg::{Packet, Rational};
use log::{debug, info};
use tempfile::NamedTempFile;
use trimframe_core::helpers::geometry::even;
use trimframe_core::{CodecKind, ContainerFamily, MediaError, MimeType, Result};

use crate::helpers::pixels::surface_to_frame;
use crate::host::{Recorder, RecorderOptions, Surface};
use crate::native::capability::codec_id;

/// Size of each chunk handed back by `stop`.
pub const CHUNK_BYTES: usize = 64 * 1024;

const PROFILE_BASELINE: u8 = 66;

/// (level_idc, MaxFS in macroblocks, MaxMBPS, baseline MaxBR in kbit/s), Table A-1.
const H264_LEVELS: [(u8, u64, u64, u64); 16] = [
    (10,    99,    1_485,      64),
    (11,   396,    3_000,     192),
    (12,   396,    6_000,     384),
    (13,   396,   11_880,     768),
    (20,   396,   11_880,   2_000),
    (21,   792,   19_800,   4_000),
    (22, 1_620,   20_250,   4_000),
    (30, 1_620,   40_500,  10_000),
    (31, 3_600,  108_000,  14_000),
    (32, 5_120,  216_000,  20_000),
    (40, 8_192,  245_760,  20_000),
    (41, 8_192,  245_760,  50_000),
    (42, 8_704,  522_240,  50_000),
    (50, 22_080, 589_824, 135_000),
    (51, 36_864, 983_040, 240_000),
    (52, 36_864, 2_073_600, 240_000),
];

/// Lowest H.264 level_idc whose limits hold the stream. Saturates at 5.2.
pub fn h264_level(width: u32, height: u32, fps: u32, bits_per_second: u64) -> u8 {
    let mbs  = u64::from(width.div_ceil(16)) * u64::from(height.div_ceil(16));
    let mbps = mbs * u64::from(fps.max(1));
    let kbps = bits_per_second.div_ceil(1000);
    H264_LEVELS.iter()
        .find(|&&(_, max_fs, max_mbps, max_br)| mbs <= max_fs && mbps <= max_mbps && kbps <= max_br)
        .map_or(52, |&(level, ..)| level)
}

/// RFC 6381 `avc1.PPCCLL` from encoder extradata, either an avcC record
/// or Annex-B parameter sets.
pub fn avc1_codec_string(extradata: &[u8]) -> Option<String> {
    let fmt = |b: &[u8]| format!("avc1.{:02X}{:02X}{:02X}", b[0], b[1], b[2]);
    if extradata.first() == Some(&1) && extradata.len() >= 4 {
        return Some(fmt(&extradata[1..4]));
    }
    extradata.windows(3)
        .enumerate()
        .filter(|(_, w)| *w == [0, 0, 1])
        .map(|(i, _)| i + 3)
        .find(|&nal| extradata.get(nal).is_some_and(|b| b & 0x1f == 7) && extradata.len() >= nal + 4)
        .map(|nal| fmt(&extradata[nal + 1..nal + 4]))
}

struct Session {
    octx:     ffmpeg::format::context::Output,
    encoder:  encoder::video::Video,
    scaler:   SwsContext,
    frame_tb: Rational,
    ost_tb:   Rational,
    started:  Instant,
    last_pts: Option<i64>,
    frames:   u64,
}

impl Session {
    fn drain_packets(&mut self) -> Result<()> {
        let mut pkt = Packet::empty();
        while self.encoder.receive_packet(&mut pkt).is_ok() {
            pkt.set_stream(0);
            pkt.rescale_ts(self.frame_tb, self.ost_tb);
            pkt.write_interleaved(&mut self.octx)
                .map_err(|e| MediaError::Recorder(format!("write packet: {e}")))?;
        }
        Ok(())
    }
}

pub struct FfmpegRecorder {
    options: RecorderOptions,
    family:  ContainerFamily,
    codec:   CodecKind,
    width:   u32,
    height:  u32,
    output:  NamedTempFile,
    session: Option<Session>,
    /// What the encoder actually produced, known once started.
    produced_mime: Option<String>,
}

impl FfmpegRecorder {
    pub fn new(options: &RecorderOptions) -> Result<Self> {
        let mime = MimeType::parse(&options.mime_type);
        let family = ContainerFamily::from_mime(&mime.essence)
            .ok_or_else(|| MediaError::unsupported(mime.subtype()))?;
        let codec = mime.codec_kinds()
            .ok_or_else(|| MediaError::unsupported(&options.mime_type))?
            .into_iter()
            .find(|k| k.is_video())
            .unwrap_or_else(|| family.default_video_codec());
        if !family.accepts(codec) || !matches!(codec, CodecKind::Vp8 | CodecKind::Vp9 | CodecKind::H264) {
            return Err(MediaError::unsupported(&options.mime_type));
        }
        if encoder::find(codec_id(codec)).is_none() {
            return Err(MediaError::unsupported(&options.mime_type));
        }

        let output = tempfile::Builder::new()
            .prefix("trimframe-rec-")
            .suffix(&format!(".{}", family.extension()))
            .tempfile()?;

        let width  = even(options.width);
        let height = even(options.height);

        Ok(Self {
            options: options.clone(),
            family,
            codec,
            width,
            height,
            output,
            session: None,
            produced_mime: None,
        })
    }

    pub fn path(&self) -> &Path {
        self.output.path()
    }

    fn open_session(&self) -> Result<Session> {
        let fail = |what: &str, e: ffmpeg::Error| MediaError::Recorder(format!("{what}: {e}"));
        let fps      = self.options.frame_rate.max(1) as i32;
        let frame_tb = Rational::new(1, fps);
        let bitrate  = self.options.video_bits_per_second as usize;

        let mut octx = open_output(&self.output.path().to_path_buf()).map_err(|e| fail("open output", e))?;
        let global_header = octx.format().flags().contains(ffmpeg::format::Flags::GLOBAL_HEADER);

        let codec = encoder::find(codec_id(self.codec))
            .ok_or_else(|| MediaError::unsupported(&self.options.mime_type))?;

        let mut ost = octx.add_stream(codec).map_err(|e| fail("add video stream", e))?;
        ost.set_time_base(frame_tb);

        let ctx = codec::context::Context::new_with_codec(codec);
        let mut enc = ctx.encoder().video().map_err(|e| fail("create encoder context", e))?;
        enc.set_width(self.width);
        enc.set_height(self.height);
        enc.set_format(Pixel::YUV420P);
        enc.set_time_base(frame_tb);
        enc.set_frame_rate(Some(Rational::new(fps, 1)));
        enc.set_bit_rate(bitrate);
        enc.set_max_bit_rate(bitrate);
        enc.set_gop(fps as u32);
        if global_header {
            enc.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let mut opts = ffmpeg::Dictionary::new();
        match self.codec {
            CodecKind::H264 => {
                let level = h264_level(self.width, self.height, fps as u32, self.options.video_bits_per_second);
                opts.set("preset",  "veryfast");
                opts.set("tune",    "zerolatency");
                opts.set("profile", "baseline");
                opts.set("level",   &format!("{}.{}", level / 10, level % 10));
            }
            _ => {
                opts.set("deadline", "realtime");
                opts.set("cpu-used", "8");
            }
        }

        let mut encoder = enc.open_as_with(codec, opts).map_err(|e| fail("open encoder", e))?;
        encoder.set_aspect_ratio(Rational::new(1, 1));

        unsafe {
            let ret = ffmpeg::ffi::avcodec_parameters_from_context(
                (**(*octx.as_mut_ptr()).streams.add(0)).codecpar,
                encoder.as_ptr() as *mut ffmpeg::ffi::AVCodecContext,
            );
            if ret < 0 {
                return Err(MediaError::Recorder(format!("avcodec_parameters_from_context failed: {ret}")));
            }
        }

        octx.write_header().map_err(|e| fail("write header", e))?;
        let ost_tb = octx.stream(0)
            .map(|s| s.time_base())
            .ok_or_else(|| MediaError::Recorder("output stream missing".into()))?;

        let scaler = SwsContext::get(
            Pixel::RGBA, self.width, self.height,
            Pixel::YUV420P, self.width, self.height,
            Flags::BILINEAR,
        )
        .map_err(|e| fail("scaler", e))?;

        Ok(Session {
            octx,
            encoder,
            scaler,
            frame_tb,
            ost_tb,
            started: Instant::now(),
            last_pts: None,
            frames: 0,
        })
    }

    fn describe_output(&self, session: &Session) -> Option<String> {
        if self.codec != CodecKind::H264 {
            return None;
        }
        let extradata = unsafe {
            let ctx = session.encoder.as_ptr();
            let (ptr, len) = ((*ctx).extradata, (*ctx).extradata_size);
            if ptr.is_null() || len <= 0 {
                &[][..]
            } else {
                std::slice::from_raw_parts(ptr, len as usize)
            }
        };
        let codecs = avc1_codec_string(extradata).unwrap_or_else(|| {
            let level = h264_level(
                self.width, self.height, self.options.frame_rate, self.options.video_bits_per_second,
            );
            format!("avc1.{PROFILE_BASELINE:02X}00{level:02X}")
        });
        Some(format!("{};codecs={codecs}", self.family.mime()))
    }

    fn read_chunks(&self) -> Result<Vec<Vec<u8>>> {
        let data = std::fs::read(self.output.path())?;
        Ok(data.chunks(CHUNK_BYTES).map(<[u8]>::to_vec).collect())
    }
}

impl Recorder for FfmpegRecorder {
    fn start(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(MediaError::Recorder("recorder already started".into()));
        }
        let session = self.open_session()?;
        self.produced_mime = self.describe_output(&session);
        self.session = Some(session);
        debug!(
            "[ffmpeg] recording {} {:?} {}x{} @ {}fps as {}",
            self.family, self.codec, self.width, self.height, self.options.frame_rate,
            self.mime_type().unwrap_or_else(|| self.options.mime_type.clone()),
        );
        Ok(())
    }

    fn capture(&mut self, surface: &Surface) -> Result<()> {
        let fps = self.options.frame_rate.max(1) as f64;
        let session = self.session.as_mut()
            .ok_or_else(|| MediaError::Recorder("capture before start".into()))?;

        let pts = (session.started.elapsed().as_secs_f64() * fps).round() as i64;
        if session.last_pts.is_some_and(|last| pts <= last) {
            return Ok(());
        }

        let rgba = surface_to_frame(surface);
        let mut yuv = VideoFrame::empty();
        let scaled = if (surface.width(), surface.height()) == (self.width, self.height) {
            session.scaler.run(&rgba, &mut yuv)
        } else {
            // Odd-sized surface: scale onto the even encoder size.
            SwsContext::get(
                Pixel::RGBA, surface.width(), surface.height(),
                Pixel::YUV420P, self.width, self.height,
                Flags::BILINEAR,
            )
            .and_then(|mut s| s.run(&rgba, &mut yuv))
        };
        scaled.map_err(|e| MediaError::Recorder(format!("scale: {e}")))?;

        yuv.set_pts(Some(pts));
        session.encoder.send_frame(&yuv)
            .map_err(|e| MediaError::Recorder(format!("send frame: {e}")))?;
        session.last_pts = Some(pts);
        session.frames += 1;
        session.drain_packets()
    }

    fn stop(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut session = self.session.take()
            .ok_or_else(|| MediaError::Recorder("stop before start".into()))?;
        session.encoder.send_eof()
            .map_err(|e| MediaError::Recorder(format!("send EOF: {e}")))?;
        session.drain_packets()?;
        session.octx.write_trailer()
            .map_err(|e| MediaError::Recorder(format!("write trailer: {e}")))?;
        let frames = session.frames;
        drop(session);

        let chunks = self.read_chunks()?;
        info!(
            "[ffmpeg] recorded {frames} frames into {} chunks ({} bytes)",
            chunks.len(),
            chunks.iter().map(Vec::len).sum::<usize>(),
        );
        Ok(chunks)
    }

    fn mime_type(&self) -> Option<String> {
        self.produced_mime.clone()
    }
}
