// crates/trimframe-media/src/lib.rs
//
// Thumbnail sampling and trim export over a pluggable media host.
//
// The algorithms (sampler, processor, probe) only see the traits in `host`.
// `native::FfmpegHost` runs them against the linked ffmpeg libraries, and
// `MediaWorker` moves them onto background threads.

pub mod host;
pub mod image;
pub mod native;
pub mod probe;
pub mod processor;
pub mod sampler;
pub mod worker;

mod helpers;

pub use host::{MediaHost, Surface, VideoMetadata};
pub use native::FfmpegHost;
pub use probe::check_codec_support;
pub use processor::{resolve_output_family, ExportState, VideoProcessor};
pub use sampler::FrameSampler;
pub use worker::MediaWorker;
