// crates/trimframe-core/src/helpers/time.rs
//
// Sample planning: how many thumbnails to take from a source and at which
// instants. Kept free of any media types so the count/coverage rules can be
// checked without decoding anything.
//
// Rules:
//   - Container-width hint → one frame per `pixels_per_frame`, clamped to
//     [min_frames, max_frames].
//   - Otherwise `amount` per second (Fps) or `amount` total (TotalFrames),
//     clamped to [1, max_frames].
//   - Instants are evenly spaced and include both 0 and `duration`.
//   - A source shorter than DEGENERATE_DURATION yields one instant at 0.

use crate::config::SamplerConfig;
use crate::error::{MediaError, Result};
use crate::helpers::geometry::optimal_frame_count;
use crate::media_types::{SamplingMode, SamplingRequest};

/// Durations at or below this are sampled as a single still at t = 0.
pub const DEGENERATE_DURATION: f64 = 0.001;

/// Frame id for a sample instant: seconds with two decimals.
///
/// ```
/// use trimframe_core::helpers::time::frame_id;
/// assert_eq!(frame_id(0.0), "0.00");
/// assert_eq!(frame_id(9.999), "10.00");
/// assert_eq!(frame_id(1.0 / 3.0), "0.33");
/// ```
pub fn frame_id(t: f64) -> String {
    format!("{t:.2}")
}

/// The ordered instants one sampling call will visit.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplePlan {
    pub duration: f64,
    pub times:    Vec<f64>,
}

impl SamplePlan {
    pub fn new(request: &SamplingRequest, duration: f64, config: &SamplerConfig) -> Result<Self> {
        let count = frame_count(request, duration, config)?;
        Ok(Self { duration, times: sample_times(duration, count) })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Spacing between consecutive instants (0 for a single-instant plan).
    pub fn step(&self) -> f64 {
        if self.times.len() < 2 {
            0.0
        } else {
            self.duration / (self.times.len() - 1) as f64
        }
    }
}

/// Effective frame count N for a request against a source of `duration` seconds.
pub fn frame_count(request: &SamplingRequest, duration: f64, config: &SamplerConfig) -> Result<usize> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(MediaError::InvalidRequest(format!("unusable duration {duration}")));
    }
    if duration <= DEGENERATE_DURATION {
        return Ok(1);
    }
    if let Some(width) = request.container_width {
        return Ok(optimal_frame_count(width, config));
    }
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(MediaError::InvalidRequest(format!(
            "amount must be a positive number, got {}",
            request.amount
        )));
    }
    let raw = match request.mode {
        SamplingMode::Fps         => duration * request.amount,
        SamplingMode::TotalFrames => request.amount,
    };
    Ok((raw.round() as usize).clamp(1, config.max_frames.max(1)))
}

/// `count` evenly spaced instants over `[0, duration]`, both ends included.
///
/// Instants whose ids would collide (very short sources) are collapsed onto
/// the later instant, so the result may be shorter than `count` but never
/// has duplicate ids and still ends at `duration`. The instant at 0 is never
/// displaced; a source under 5 ms therefore collapses to that one instant.
pub fn sample_times(duration: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 || duration <= DEGENERATE_DURATION {
        return vec![0.0];
    }
    let step = duration / (count - 1) as f64;
    let mut times: Vec<f64> = Vec::with_capacity(count);
    let mut last_id = String::new();
    for i in 0..count {
        let t = if i + 1 == count { duration } else { (i as f64 * step).min(duration) };
        let id = frame_id(t);
        if id != last_id {
            last_id = id;
            times.push(t);
        } else if times.len() > 1 {
            if let Some(last) = times.last_mut() {
                *last = t;
            }
        }
    }
    times
}
