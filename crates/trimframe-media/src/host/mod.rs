// crates/trimframe-media/src/host/mod.rs
//
// The playback/paint primitives the sampler and the export engine drive.
//
// A source video is only reachable through a stateful element that can be
// loaded, seeked, played and painted onto a surface. The algorithms in
// sampler.rs and processor.rs are written against these traits alone; the
// `native` module provides the ffmpeg implementation and `fake` (tests only)
// a scripted one.
//
// Every blocking call here stands for one suspension point of an
// event-driven flow:
//   load            : "first frame decoded"
//   seek_to         : "seek completed"
//   wait_next_frame : render-loop tick
//   Recorder::stop  : "recorder stopped", chunks delivered

use trimframe_core::{Blob, Result, ThumbnailFormat};

mod guard;
#[cfg(test)]
pub(crate) mod fake;

pub use guard::{ObjectUrlGuard, ScopedElement};

/// What a loaded element knows about its source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoMetadata {
    pub duration: f64,
    pub width:    u32,
    pub height:   u32,
}

/// RGBA drawing surface with fixed dimensions. Rows are tightly packed.
#[derive(Clone, Debug)]
pub struct Surface {
    width:  u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        let width  = width.max(1);
        let height = height.max(1);
        Self { width, height, pixels: vec![0; width as usize * height as usize * 4] }
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }

    pub fn pixels(&self) -> &[u8] { &self.pixels }
    pub fn pixels_mut(&mut self) -> &mut [u8] { &mut self.pixels }

    pub fn row_bytes(&self) -> usize { self.width as usize * 4 }
}

pub trait VideoElement {
    /// Attach `src` and block until the first frame is decoded.
    fn load(&mut self, src: &str) -> Result<VideoMetadata>;

    /// Move the playhead to `time` and block until the frame there is ready.
    fn seek_to(&mut self, time: f64) -> Result<()>;

    /// Start advancing the playhead in real time from its current position.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn current_time(&self) -> f64;

    /// Playback reached the end of the source.
    fn ended(&self) -> bool;

    /// Paint the frame at the playhead onto `surface`, scaled to its size.
    fn draw_to(&mut self, surface: &mut Surface) -> Result<()>;

    /// Drop the source and every decode resource. Idempotent.
    fn detach(&mut self);

    fn has_source(&self) -> bool;
}

/// Compresses a surface into a still image (canvas → data URL).
pub trait ImageEncoder {
    fn mime(&self) -> &'static str;
    fn encode(&mut self, surface: &Surface) -> Result<Vec<u8>>;
}

/// Settings handed to a recorder when it is created.
#[derive(Clone, Debug, PartialEq)]
pub struct RecorderOptions {
    pub mime_type:             String,
    pub video_bits_per_second: u64,
    pub frame_rate:            u32,
    pub width:                 u32,
    pub height:                u32,
}

/// Streaming recorder bound to a surface captured at a fixed frame rate.
pub trait Recorder {
    fn start(&mut self) -> Result<()>;

    /// One captured frame of the surface stream.
    fn capture(&mut self, surface: &Surface) -> Result<()>;

    /// Finish the stream and hand back every data chunk in order.
    fn stop(&mut self) -> Result<Vec<Vec<u8>>>;

    /// The MIME type of what was actually encoded, once the recorder knows
    /// it. `None` keeps the type the recorder was created with.
    fn mime_type(&self) -> Option<String> {
        None
    }
}

/// "Can this MIME type be recorded" query.
pub trait CapabilityQuery {
    fn is_type_supported(&self, mime: &str) -> bool;
}

/// Render-loop cadence used by the export draw loop.
pub trait FrameClock {
    fn wait_next_frame(&mut self);
}

/// Factory for every per-call resource. Shared across threads by MediaWorker,
/// so implementations keep their own state behind locks.
pub trait MediaHost: Send + Sync {
    fn create_video_element(&self) -> Result<Box<dyn VideoElement>>;

    fn create_image_encoder(&self, format: ThumbnailFormat, quality: f32) -> Result<Box<dyn ImageEncoder>>;

    fn create_recorder(&self, options: &RecorderOptions) -> Result<Box<dyn Recorder>>;

    /// `None` when the runtime has no recording capability API at all.
    fn capabilities(&self) -> Option<&dyn CapabilityQuery>;

    fn frame_clock(&self, fps: u32) -> Box<dyn FrameClock>;

    /// Make `blob` loadable by a video element. The returned URL stays valid
    /// until `revoke_object_url` is called with it.
    fn create_object_url(&self, blob: &Blob) -> Result<String>;

    fn revoke_object_url(&self, url: &str);

    /// Give the rest of the process a turn between sampler chunks.
    fn yield_now(&self) {
        std::thread::yield_now();
    }
}
