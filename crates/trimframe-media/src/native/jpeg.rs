// crates/trimframe-media/src/native/jpeg.rs
//
// JpegEncoder: lossy thumbnails through ffmpeg's MJPEG encoder.
//
// The encoder and its RGBA → YUVJ420P scaler are built lazily for the first
// surface size and rebuilt only if a later surface differs. MJPEG is
// intra-only, so every frame sent produces exactly one packet.

use ffmpeg_the_third as ffmpeg;
use ffmpeg::codec::{self, Id as CodecId};
use ffmpeg::encoder;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video as VideoFrame;
use ffmpeg::{Packet, Rational};
use trimframe_core::{MediaError, Result};

use crate::helpers::pixels::surface_to_frame;
use crate::host::{ImageEncoder, Surface};

/// libavcodec's FF_QP2LAMBDA: quantizer → lambda scale.
const QP2LAMBDA: i32 = 118;

/// Map a 0.0–1.0 quality to an MJPEG qscale (2 best … 31 worst).
pub fn qscale_for(quality: f32) -> i32 {
    let q = if quality.is_finite() { quality.clamp(0.0, 1.0) } else { 0.8 };
    (2.0 + (1.0 - q) * 29.0).round() as i32
}

struct Session {
    width:   u32,
    height:  u32,
    encoder: encoder::video::Video,
    scaler:  SwsContext,
}

pub struct JpegEncoder {
    qscale:  i32,
    session: Option<Session>,
}

impl JpegEncoder {
    pub fn new(quality: f32) -> Result<Self> {
        if encoder::find(CodecId::MJPEG).is_none() {
            return Err(MediaError::Encode("MJPEG encoder not found".into()));
        }
        Ok(Self { qscale: qscale_for(quality), session: None })
    }

    fn open(&self, width: u32, height: u32) -> Result<Session> {
        let fail = |what: &str, e: ffmpeg::Error| MediaError::Encode(format!("{what}: {e}"));

        let mjpeg = encoder::find(CodecId::MJPEG)
            .ok_or_else(|| MediaError::Encode("MJPEG encoder not found".into()))?;
        let ctx = codec::context::Context::new_with_codec(mjpeg);
        let mut enc = ctx.encoder().video().map_err(|e| fail("mjpeg context", e))?;
        enc.set_width(width);
        enc.set_height(height);
        enc.set_format(Pixel::YUVJ420P);
        enc.set_time_base(Rational::new(1, 25));
        enc.set_flags(codec::Flags::QSCALE);
        unsafe {
            let p = enc.as_mut_ptr();
            (*p).global_quality = self.qscale * QP2LAMBDA;
            (*p).qmin = self.qscale;
            (*p).qmax = self.qscale;
        }

        let encoder = enc.open_as_with(mjpeg, ffmpeg::Dictionary::new())
            .map_err(|e| fail("open mjpeg", e))?;
        let scaler = SwsContext::get(
            Pixel::RGBA, width, height,
            Pixel::YUVJ420P, width, height,
            Flags::BILINEAR,
        )
        .map_err(|e| fail("mjpeg scaler", e))?;

        Ok(Session { width, height, encoder, scaler })
    }
}

impl ImageEncoder for JpegEncoder {
    fn mime(&self) -> &'static str {
        "image/jpeg"
    }

    fn encode(&mut self, surface: &Surface) -> Result<Vec<u8>> {
        let (w, h) = (surface.width(), surface.height());
        let reuse = self.session.as_ref().is_some_and(|s| (s.width, s.height) == (w, h));
        if !reuse {
            self.session = Some(self.open(w, h)?);
        }
        let qscale = self.qscale;
        let session = self.session.as_mut()
            .ok_or_else(|| MediaError::Encode("mjpeg session missing".into()))?;

        let rgba = surface_to_frame(surface);
        let mut yuv = VideoFrame::empty();
        session.scaler.run(&rgba, &mut yuv)
            .map_err(|e| MediaError::Encode(format!("mjpeg scale: {e}")))?;
        yuv.set_pts(Some(0));
        unsafe {
            (*yuv.as_mut_ptr()).quality = qscale * QP2LAMBDA;
        }

        session.encoder.send_frame(&yuv)
            .map_err(|e| MediaError::Encode(format!("mjpeg send: {e}")))?;
        let mut pkt = Packet::empty();
        session.encoder.receive_packet(&mut pkt)
            .map_err(|e| MediaError::Encode(format!("mjpeg receive: {e}")))?;
        pkt.data()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| MediaError::Encode("mjpeg produced an empty packet".into()))
    }
}
