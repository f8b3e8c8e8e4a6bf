//=========================================================================
// Frame Pacer
//=========================================================================
//
// Fixed minimum frame budget.
//
// ```text
//   frame_start ── poll ── TICK ──┬── pace() ──┬── DRAW
//                                 │ elapsed <  │
//                                 │ budget:    │
//                                 │ sleep rest │
// ```
//
// Pacing only pads short frames. A frame that already overran its budget
// proceeds immediately; there is no catch-up and no variable timestep.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::thread;
use std::time::{Duration, Instant};

//=== External Crates =====================================================

use log::trace;

//=== FramePacer ==========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePacer {
    budget: Duration,
}

impl FramePacer {
    /// Minimum frame rate the runtime paces to by default.
    pub const DEFAULT_FPS: u32 = 30;

    /// Budget of `1000 / fps` whole milliseconds (30 fps ⇒ 33 ms).
    ///
    /// # Panics
    /// Panics if `fps` is zero.
    pub fn from_fps(fps: u32) -> Self {
        assert!(fps > 0, "FPS must be positive");
        Self {
            budget: Duration::from_millis(u64::from(1000 / fps)),
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left in the budget after `elapsed`, zero once overrun.
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.budget.saturating_sub(elapsed)
    }

    /// Sleeps until `frame_start + budget`, if that is still ahead.
    ///
    /// Returns the time slept.
    pub fn pace(&self, frame_start: Instant) -> Duration {
        let remaining = self.remaining(frame_start.elapsed());
        if !remaining.is_zero() {
            trace!(target: "runtime", "Pacing {:?}", remaining);
            thread::sleep(remaining);
        }
        remaining
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::from_fps(Self::DEFAULT_FPS)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_33ms() {
        assert_eq!(FramePacer::default().budget(), Duration::from_millis(33));
    }

    #[test]
    fn budget_uses_whole_milliseconds() {
        assert_eq!(FramePacer::from_fps(60).budget(), Duration::from_millis(16));
        assert_eq!(FramePacer::from_fps(1000).budget(), Duration::from_millis(1));
    }

    #[test]
    #[should_panic(expected = "FPS must be positive")]
    fn zero_fps_panics() {
        FramePacer::from_fps(0);
    }

    #[test]
    fn remaining_saturates() {
        let pacer = FramePacer::from_fps(50);
        assert_eq!(pacer.remaining(Duration::from_millis(5)), Duration::from_millis(15));
        assert_eq!(pacer.remaining(Duration::from_millis(50)), Duration::ZERO);
    }

    #[test]
    fn short_frame_is_padded_to_budget() {
        let pacer = FramePacer::from_fps(100);
        let start = Instant::now();

        pacer.pace(start);

        assert!(start.elapsed() >= pacer.budget());
    }

    #[test]
    fn overrun_frame_is_not_delayed() {
        let pacer = FramePacer::from_fps(1000);
        let start = Instant::now();
        thread::sleep(Duration::from_millis(3));

        assert_eq!(pacer.pace(start), Duration::ZERO);
    }
}
