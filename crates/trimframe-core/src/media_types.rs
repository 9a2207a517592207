// crates/trimframe-core/src/media_types.rs
//
// Types that cross the boundary between trimframe-media and its callers.
// No ffmpeg, just plain data.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MediaError, Result};
use crate::formats::ContainerFamily;

// ── Frames ────────────────────────────────────────────────────────────────────

/// One sampled instant of a source video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Sample timestamp, two decimals (`"0.00"`, `"10.00"`).
    pub id:     String,
    /// `data:` URL holding the encoded thumbnail.
    pub src:    String,
    pub width:  u32,
    pub height: u32,
}

impl Frame {
    /// Timestamp in seconds, parsed back from `id`.
    pub fn timestamp(&self) -> Option<f64> {
        self.id.parse().ok()
    }

    /// Copy with display dimensions chosen by the layout. `id` and `src` are shared.
    pub fn with_display_size(&self, width: u32, height: u32) -> Frame {
        Frame { width, height, ..self.clone() }
    }
}

/// How `SamplingRequest::amount` is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// `amount` frames per second of duration.
    #[default]
    Fps,
    /// `amount` frames across the whole duration.
    TotalFrames,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplingRequest {
    /// File path or object URL of the source.
    pub source:          String,
    pub amount:          f64,
    #[serde(default)]
    pub mode:            SamplingMode,
    /// Layout width the thumbnails will fill. Overrides `amount` when set.
    #[serde(default)]
    pub container_width: Option<u32>,
}

impl SamplingRequest {
    pub fn new(source: impl Into<String>, amount: f64, mode: SamplingMode) -> Self {
        Self { source: source.into(), amount, mode, container_width: None }
    }

    pub fn with_container_width(mut self, width: u32) -> Self {
        self.container_width = Some(width);
        self
    }
}

// ── Trim range ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start_seconds: f64,
    pub end_seconds:   f64,
}

impl TrimRange {
    /// ```
    /// use trimframe_core::TrimRange;
    /// assert!(TrimRange::new(2.0, 5.0).is_ok());
    /// assert!(TrimRange::new(5.0, 5.0).is_err());
    /// assert!(TrimRange::new(-1.0, 5.0).is_err());
    /// ```
    pub fn new(start_seconds: f64, end_seconds: f64) -> Result<Self> {
        if !start_seconds.is_finite() || !end_seconds.is_finite() {
            return Err(MediaError::InvalidRange(format!(
                "bounds must be finite, got [{start_seconds}, {end_seconds}]"
            )));
        }
        if start_seconds < 0.0 {
            return Err(MediaError::InvalidRange(format!("start {start_seconds} is negative")));
        }
        if start_seconds >= end_seconds {
            return Err(MediaError::InvalidRange(format!(
                "start {start_seconds} is not before end {end_seconds}"
            )));
        }
        Ok(Self { start_seconds, end_seconds })
    }

    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// Fit the range to a loaded source. `end` past the source is clamped;
    /// a `start` at or past the end of the source is an error.
    pub fn fit_to(&self, duration: f64) -> Result<TrimRange> {
        if self.start_seconds >= duration {
            return Err(MediaError::InvalidRange(format!(
                "start {:.3}s is beyond the source duration {duration:.3}s",
                self.start_seconds
            )));
        }
        Ok(TrimRange {
            start_seconds: self.start_seconds,
            end_seconds:   self.end_seconds.min(duration),
        })
    }
}

// ── Codec support / blobs ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecSupport {
    pub webm: bool,
    pub mp4:  bool,
}

impl CodecSupport {
    pub fn any(&self) -> bool {
        self.webm || self.mp4
    }

    pub fn supports(&self, family: ContainerFamily) -> bool {
        match family {
            ContainerFamily::WebM => self.webm,
            ContainerFamily::Mp4  => self.mp4,
        }
    }
}

/// Bytes plus a declared MIME type. Export input and export output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
    pub mime: String,
}

impl Blob {
    pub fn new(data: Vec<u8>, mime: impl Into<String>) -> Self {
        Self { data, mime: mime.into() }
    }

    /// Concatenate recorder chunks in arrival order.
    pub fn from_chunks(chunks: Vec<Vec<u8>>, mime: impl Into<String>) -> Self {
        let total = chunks.iter().map(Vec::len).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in chunks {
            data.extend_from_slice(&chunk);
        }
        Self { data, mime: mime.into() }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn container_family(&self) -> Option<ContainerFamily> {
        ContainerFamily::from_mime(&self.mime)
    }
}

// ── Worker results ────────────────────────────────────────────────────────────

/// Results sent from MediaWorker background threads to the caller.
#[derive(Debug)]
pub enum MediaResult {
    SampleProgress { job_id: Uuid, done: usize, total: usize },
    Frames         { job_id: Uuid, frames: Vec<Frame> },
    /// Fraction of the trim range recorded so far, in [0, 1].
    ExportProgress { job_id: Uuid, fraction: f32 },
    ExportDone     { job_id: Uuid, blob: Blob },
    Error          { job_id: Uuid, error: MediaError },
}

impl MediaResult {
    pub fn job_id(&self) -> Uuid {
        match self {
            MediaResult::SampleProgress { job_id, .. }
            | MediaResult::Frames { job_id, .. }
            | MediaResult::ExportProgress { job_id, .. }
            | MediaResult::ExportDone { job_id, .. }
            | MediaResult::Error { job_id, .. } => *job_id,
        }
    }
}
