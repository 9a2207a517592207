// crates/trimframe-core/src/cancel.rs
//
// Cooperative cancellation flag. Cloned into a job, checked before every
// seek (sampler) and every draw tick (export).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{MediaError, Result};

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(MediaError::Cancelled)` once `cancel` has been called on any clone.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MediaError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(a.check().is_ok());
        b.cancel();
        assert!(a.is_cancelled());
        assert!(matches!(a.check(), Err(MediaError::Cancelled)));
    }
}
