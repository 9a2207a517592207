// crates/trimframe-core/src/helpers/geometry.rs
//
// Sizing helpers for the decode surface and the thumbnail strip.

use crate::config::SamplerConfig;

/// Scale `(width, height)` so the long edge is at most `max_dim`, keeping
/// the aspect ratio. Sources already inside the bound are returned as-is.
///
/// ```
/// use trimframe_core::helpers::geometry::fit_within;
/// assert_eq!(fit_within(1920, 1080, 1280), (1280, 720));
/// assert_eq!(fit_within(1080, 1920, 1280), (720, 1280));
/// assert_eq!(fit_within(640, 360, 1280), (640, 360));
/// ```
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let long = width.max(height);
    if long <= max_dim || long == 0 {
        return (width.max(1), height.max(1));
    }
    let scale = max_dim as f64 / long as f64;
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_dim);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_dim);
    (w, h)
}

/// Round down to an even value (min 2). YUV 4:2:0 encoders need even sizes.
#[inline]
pub fn even(v: u32) -> u32 {
    v.max(2) & !1
}

/// Thumbnail count that fills `container_width` at roughly one frame per
/// `pixels_per_frame`, kept inside `[min_frames, max_frames]`.
pub fn optimal_frame_count(container_width: u32, config: &SamplerConfig) -> usize {
    let per = config.pixels_per_frame.max(1) as f64;
    let raw = (container_width as f64 / per).round() as usize;
    raw.clamp(config.min_frames, config.max_frames.max(config.min_frames))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_keeps_aspect_ratio() {
        let (w, h) = fit_within(3840, 1600, 1280);
        assert_eq!(w, 1280);
        assert!((w as f64 / h as f64 - 3840.0 / 1600.0).abs() < 0.01);
    }

    #[test]
    fn fit_handles_degenerate_sizes() {
        assert_eq!(fit_within(0, 0, 1280), (1, 1));
        assert_eq!(fit_within(5000, 1, 1280), (1280, 1));
    }

    #[test]
    fn even_rounds_down() {
        assert_eq!(even(721), 720);
        assert_eq!(even(720), 720);
        assert_eq!(even(1), 2);
        assert_eq!(even(0), 2);
    }

    #[test]
    fn optimal_count_band() {
        let cfg = SamplerConfig::default();
        assert_eq!(optimal_frame_count(375, &cfg), 12);
        assert_eq!(optimal_frame_count(1440, &cfg), 14);
        assert_eq!(optimal_frame_count(2560, &cfg), 24);
    }
}
