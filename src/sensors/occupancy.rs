//! Presence inference from raw motion and ranging signals.
//!
//! Each raw signal has its own debounce window.  A pulse at `t0` keeps the
//! room occupied while `now < t0 + window`; the windows are independent and
//! either one refreshes the shared "last occupied" timestamp.

/// Holds a signal "active" for a fixed window after its last trigger.
#[derive(Debug, Clone, Copy)]
pub struct DebounceTimer {
    window_ms: u64,
    last_seen_ms: Option<u64>,
}

impl DebounceTimer {
    pub const fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_seen_ms: None,
        }
    }

    pub fn trigger(&mut self, now_ms: u64) {
        self.last_seen_ms = Some(now_ms);
    }

    pub fn is_active(&self, now_ms: u64) -> bool {
        self.last_seen_ms
            .is_some_and(|t| now_ms < t.saturating_add(self.window_ms))
    }

    pub fn last_seen_ms(&self) -> Option<u64> {
        self.last_seen_ms
    }
}

/// Combines motion and distance into one debounced presence flag.
#[derive(Debug, Clone)]
pub struct OccupancyTracker {
    motion: DebounceTimer,
    distance: DebounceTimer,
    /// Closest echo that still counts (filters transducer ringing).
    min_cm: f32,
    /// Farthest echo that still counts as someone in the room.
    range_cm: f32,
    last_occupied_ms: Option<u64>,
}

impl OccupancyTracker {
    pub fn new(motion_window_ms: u64, distance_window_ms: u64, min_cm: f32, range_cm: f32) -> Self {
        Self {
            motion: DebounceTimer::new(motion_window_ms),
            distance: DebounceTimer::new(distance_window_ms),
            min_cm,
            range_cm,
            last_occupied_ms: None,
        }
    }

    /// Feed one raw sample of each signal.  Returns the debounced flag.
    pub fn update(&mut self, now_ms: u64, motion: bool, distance_cm: Option<f32>) -> bool {
        if motion {
            self.motion.trigger(now_ms);
            self.last_occupied_ms = Some(now_ms);
        }
        if distance_cm.is_some_and(|d| d >= self.min_cm && d < self.range_cm) {
            self.distance.trigger(now_ms);
            self.last_occupied_ms = Some(now_ms);
        }
        self.is_occupied(now_ms)
    }

    pub fn is_occupied(&self, now_ms: u64) -> bool {
        self.motion.is_active(now_ms) || self.distance.is_active(now_ms)
    }

    pub fn last_occupied_ms(&self) -> Option<u64> {
        self.last_occupied_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> OccupancyTracker {
        OccupancyTracker::new(5_000, 10_000, 2.0, 150.0)
    }

    #[test]
    fn motion_pulse_holds_for_exactly_the_window() {
        let mut t = tracker();
        assert!(t.update(1_000, true, None));
        assert!(t.update(5_999, false, None));
        assert!(!t.update(6_000, false, None));
    }

    #[test]
    fn distance_has_its_own_longer_window() {
        let mut t = tracker();
        assert!(t.update(0, false, Some(80.0)));
        assert!(t.update(9_999, false, None));
        assert!(!t.update(10_000, false, None));
    }

    #[test]
    fn out_of_range_echo_is_not_presence() {
        let mut t = tracker();
        assert!(!t.update(0, false, Some(400.0)));
        assert!(!t.update(0, false, Some(0.5)));
        assert_eq!(t.last_occupied_ms(), None);
    }

    #[test]
    fn either_signal_refreshes_last_occupied() {
        let mut t = tracker();
        t.update(1_000, true, None);
        t.update(3_000, false, Some(50.0));
        assert_eq!(t.last_occupied_ms(), Some(3_000));
    }
}
