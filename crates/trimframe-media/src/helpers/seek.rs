// crates/trimframe-media/src/helpers/seek.rs
//
// Seek helper wrapping ffmpeg's avformat seek.
//
// Always a backward seek (`..=seek_ts`): it lands on the keyframe at or
// before the target, and the caller decodes forward past the pre-roll.
// A forward seek would land on the next keyframe, which may be seconds past
// the target, and the thumbnail/recorded frame would come from the wrong
// place.
//
// The caller decides what a failure means. The element falls back to
// re-opening the source and decoding from the start.

use ffmpeg_the_third as ffmpeg;
use log::warn;

/// Seek `ictx` to `target_secs`. Returns `false` on failure after logging it.
pub fn seek_to_secs(
    ictx:        &mut ffmpeg::format::context::Input,
    target_secs: f64,
    label:       &str,
) -> bool {
    let seek_ts = (target_secs.max(0.0) * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
    match ictx.seek(seek_ts, ..=seek_ts) {
        Ok(()) => true,
        Err(e) => {
            warn!("[seek] soft-fail in {label} at {target_secs:.3}s: {e}");
            false
        }
    }
}
