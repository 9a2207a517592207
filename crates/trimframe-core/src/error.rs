// crates/trimframe-core/src/error.rs
//
// Error taxonomy for sampling and export. Every failure path of the core
// surfaces as one of these; nothing is logged-and-swallowed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    /// The runtime cannot record the requested container/codec family.
    #[error("this runtime doesn't support processing {format} videos")]
    Unsupported { format: String },

    /// Network, corrupt file or decode failure while opening a source.
    #[error("failed to load video '{source_url}': {reason}")]
    Load { source_url: String, reason: String },

    #[error("seek to {time:.3}s failed: {reason}")]
    Seek { time: f64, reason: String },

    #[error("recorder error: {0}")]
    Recorder(String),

    #[error("image encode failed: {0}")]
    Encode(String),

    #[error("invalid trim range: {0}")]
    InvalidRange(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn unsupported(format: impl Into<String>) -> Self {
        MediaError::Unsupported { format: format.into() }
    }

    pub fn load(source_url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        MediaError::Load { source_url: source_url.into(), reason: reason.to_string() }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, MediaError::Cancelled)
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, MediaError::Unsupported { .. })
    }
}

pub type Result<T> = std::result::Result<T, MediaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_message_names_format() {
        let e = MediaError::unsupported("mp4");
        assert_eq!(e.to_string(), "this runtime doesn't support processing mp4 videos");
        assert!(e.is_unsupported());
        assert!(!e.is_cancelled());
    }

    #[test]
    fn load_message_carries_source_and_reason() {
        let e = MediaError::load("/tmp/x.webm", "No such file or directory");
        let msg = e.to_string();
        assert!(msg.contains("/tmp/x.webm"));
        assert!(msg.contains("No such file"));
    }
}
