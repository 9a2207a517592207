// crates/trimframe-core/src/lib.rs
//
// Plain data and pure logic shared by trimframe-media and its callers.
// No ffmpeg and no threads; everything here is unit-testable on its own.

pub mod cancel;
pub mod config;
pub mod error;
pub mod formats;
pub mod helpers;
pub mod media_types;

pub use cancel::CancelToken;
pub use config::{ExportConfig, FallbackPolicy, SamplerConfig, ThumbnailFormat};
pub use error::{MediaError, Result};
pub use formats::{CodecKind, ContainerFamily, MimeType};
pub use helpers::naming::trimmed_file_name;
pub use media_types::{
    Blob, CodecSupport, Frame, MediaResult, SamplingMode, SamplingRequest, TrimRange,
};
