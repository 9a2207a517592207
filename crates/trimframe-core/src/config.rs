// crates/trimframe-core/src/config.rs
//
// Tunables for the sampler and the export engine. Every field has a
// default, so a caller can deserialize a partial table and get the rest.

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailFormat {
    Jpeg,
    Png,
}

impl ThumbnailFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ThumbnailFormat::Jpeg => "image/jpeg",
            ThumbnailFormat::Png  => "image/png",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Lower bound of the frame band used with a container-width hint.
    pub min_frames:       usize,
    /// Upper bound for every sampling mode.
    pub max_frames:       usize,
    /// Layout pixels per thumbnail when a container width is supplied.
    pub pixels_per_frame: u32,
    /// Long-edge bound of the decode surface, in pixels.
    pub max_dimension:    u32,
    pub image_format:     ThumbnailFormat,
    /// Lossy image quality in (0, 1]. Ignored for PNG.
    pub quality:          f32,
    /// Samples processed between two yields to the host.
    pub chunk_size:       usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_frames:       12,
            max_frames:       24,
            pixels_per_frame: 100,
            max_dimension:    1280,
            image_format:     ThumbnailFormat::Jpeg,
            quality:          0.8,
            chunk_size:       5,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_frames == 0 || self.min_frames > self.max_frames {
            return Err(MediaError::InvalidRequest(format!(
                "frame band [{}, {}] is empty",
                self.min_frames, self.max_frames
            )));
        }
        if self.pixels_per_frame == 0 || self.max_dimension == 0 || self.chunk_size == 0 {
            return Err(MediaError::InvalidRequest(
                "pixels_per_frame, max_dimension and chunk_size must be non-zero".into(),
            ));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(MediaError::InvalidRequest(format!(
                "quality {} outside (0, 1]",
                self.quality
            )));
        }
        Ok(())
    }
}

/// What to do when the input's container family cannot be recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Fail with `MediaError::Unsupported`.
    #[default]
    Strict,
    /// Record into the other family if it is supported. The returned blob's
    /// MIME type tells the caller which container it got.
    AllowOtherContainer,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Capture rate of the drawing surface.
    pub frame_rate:            u32,
    pub video_bits_per_second: u64,
    pub fallback:              FallbackPolicy,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            frame_rate:            30,
            video_bits_per_second: 8_000_000,
            fallback:              FallbackPolicy::Strict,
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 || self.frame_rate > 240 {
            return Err(MediaError::InvalidRequest(format!(
                "frame rate {} outside 1..=240",
                self.frame_rate
            )));
        }
        if self.video_bits_per_second == 0 {
            return Err(MediaError::InvalidRequest("bitrate must be non-zero".into()));
        }
        Ok(())
    }
}
