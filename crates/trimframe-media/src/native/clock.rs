// crates/trimframe-media/src/native/clock.rs
//
// Wall-clock frame pacing for the export draw loop.

use std::time::{Duration, Instant};

use crate::host::FrameClock;

/// Sleeps until the next 1/fps deadline. When the caller falls behind, the
/// schedule restarts from now instead of bursting to catch up.
pub struct RealtimeClock {
    interval: Duration,
    next:     Instant,
}

impl RealtimeClock {
    pub fn new(fps: u32) -> Self {
        let interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        Self { interval, next: Instant::now() + interval }
    }
}

impl FrameClock for RealtimeClock {
    fn wait_next_frame(&mut self) {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
            self.next += self.interval;
        } else {
            self.next = now + self.interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_are_paced() {
        let mut clock = RealtimeClock::new(100);
        let start = Instant::now();
        for _ in 0..5 {
            clock.wait_next_frame();
        }
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn lag_does_not_burst() {
        let mut clock = RealtimeClock::new(100);
        std::thread::sleep(Duration::from_millis(60));
        clock.wait_next_frame();
        let start = Instant::now();
        clock.wait_next_frame();
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
