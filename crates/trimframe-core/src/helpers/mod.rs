// crates/trimframe-core/src/helpers/mod.rs
//
// Pure helpers shared by the sampler, the export engine and callers.

pub mod geometry;
pub mod naming;
pub mod time;
