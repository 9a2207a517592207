// crates/trimframe-media/src/helpers/mod.rs
//
// Internal helpers for the native backend.
// Not re-exported from lib.rs: decode/encode implementation details.

pub mod pixels;
pub mod seek;
