// crates/trimframe-media/src/native/fixture.rs
//
// Test clips recorded through FfmpegRecorder. Each frame is a flat grey
// whose level is 60 × (seconds since recording started), so a decoded
// frame tells which instant it came from.

use std::time::Instant;

use ffmpeg_the_third as ffmpeg;
use trimframe_core::Blob;

use crate::host::{FrameClock, Recorder, RecorderOptions, Surface};
use crate::native::{FfmpegRecorder, RealtimeClock};

pub const WIDTH:  u32 = 160;
pub const HEIGHT: u32 = 90;
pub const FPS:    u32 = 30;

/// Grey level painted at `secs` into the clip.
pub fn level_at(secs: f64) -> f64 {
    (secs * 60.0).min(255.0)
}

/// Mean red channel of a surface.
pub fn mean_level(surface: &Surface) -> f64 {
    let px = surface.pixels();
    let sum: u64 = px.chunks_exact(4).map(|p| p[0] as u64).sum();
    sum as f64 / (px.len() / 4) as f64
}

/// Record about `secs` seconds of VP8 WebM in real time.
/// `None` when the linked ffmpeg cannot encode VP8.
pub fn record_clip(secs: f64) -> Option<Blob> {
    ffmpeg::init().ok()?;
    let options = RecorderOptions {
        mime_type:             "video/webm;codecs=vp8".into(),
        video_bits_per_second: 800_000,
        frame_rate:            FPS,
        width:                 WIDTH,
        height:                HEIGHT,
    };
    let mut rec = FfmpegRecorder::new(&options).ok()?;
    let mut surface = Surface::new(WIDTH, HEIGHT);
    let mut clock = RealtimeClock::new(FPS);

    rec.start().unwrap();
    let started = Instant::now();
    loop {
        let t = started.elapsed().as_secs_f64();
        if t >= secs {
            break;
        }
        surface.pixels_mut().fill(level_at(t).round() as u8);
        rec.capture(&surface).unwrap();
        clock.wait_next_frame();
    }
    Some(Blob::from_chunks(rec.stop().unwrap(), "video/webm"))
}

/// Container duration in seconds of an encoded file.
pub fn container_secs(path: &std::path::Path) -> f64 {
    let ictx = ffmpeg::format::input(&path.to_path_buf()).unwrap();
    ictx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
}
