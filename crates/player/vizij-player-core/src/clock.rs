//! Time sources and the player's frame clock.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Wall-clock source consulted by the player on `play()` and on every frame.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Monotonic system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Used by hosts with their own timeline
/// and by tests that need exact deltas.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Cell::new(Duration::ZERO),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Time elapsed since the clock was created.
    pub fn offset(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

/// Accumulated playback time and frame count.
#[derive(Debug, Clone, Copy)]
pub struct ClockState {
    /// Seconds simulated since the last stop.
    pub elapsed: f64,
    /// Frames processed since the last stop.
    pub frames: u64,
    /// Timestamp of the last processed frame.
    pub last_frame: Instant,
}

impl ClockState {
    #[inline]
    pub fn new(now: Instant) -> Self {
        Self {
            elapsed: 0.0,
            frames: 0,
            last_frame: now,
        }
    }

    /// Seconds between the last processed frame and `now`; zero if `now` is earlier.
    #[inline]
    pub fn delta_to(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.last_frame).as_secs_f64()
    }

    /// Record a processed frame at `at` that advanced time by `delta` seconds.
    #[inline]
    pub fn advance(&mut self, at: Instant, delta: f64) {
        self.last_frame = at;
        self.elapsed += delta;
        self.frames += 1;
    }

    /// Zero elapsed time and the frame counter. The timestamp is kept.
    #[inline]
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_advanced() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now().duration_since(t0), Duration::from_millis(250));
        assert_eq!(clock.offset(), Duration::from_millis(250));
    }

    #[test]
    fn clock_state_advances_and_resets() {
        let clock = ManualClock::new();
        let mut state = ClockState::new(clock.now());
        clock.advance(Duration::from_millis(20));
        let delta = state.delta_to(clock.now());
        assert!((delta - 0.02).abs() < 1e-12);
        state.advance(clock.now(), delta);
        assert_eq!(state.frames, 1);
        assert!((state.elapsed - 0.02).abs() < 1e-12);

        state.reset();
        assert_eq!(state.frames, 0);
        assert_eq!(state.elapsed, 0.0);
        assert_eq!(state.last_frame, clock.now());
    }

    #[test]
    fn delta_saturates_for_earlier_instants() {
        let clock = ManualClock::new();
        let earlier = clock.now();
        clock.advance(Duration::from_millis(5));
        let state = ClockState::new(clock.now());
        assert_eq!(state.delta_to(earlier), 0.0);
    }
}
