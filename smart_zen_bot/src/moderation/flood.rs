//! Burst detector: three or more messages from one user inside a ten
//! second sliding window count as a flood. This is deliberately not a
//! long-term rate limiter; normal chat cadence must never trip it.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::{Duration, Instant},
};

const WINDOW: Duration = Duration::from_secs(10);
const FLOOD_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodVerdict {
    Ok,
    Flood,
}

/// Per-user message timestamp windows, in-memory only. Losing these on
/// restart is fine.
pub struct FloodTracker {
    windows: Mutex<HashMap<u64, VecDeque<Instant>>>,
}

impl FloodTracker {
    pub fn new() -> FloodTracker {
        FloodTracker {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record a message at `now` and check the window. Timestamps only
    /// ever grow, so stale entries are evicted from the front.
    pub fn record_and_check(&self, user_id: u64, now: Instant) -> FloodVerdict {
        let mut windows = self.windows.lock().expect("Flood tracker lock poisoned");
        let window = windows.entry(user_id).or_default();

        window.push_back(now);
        while let Some(front) = window.front() {
            if now.duration_since(*front) > WINDOW {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= FLOOD_THRESHOLD {
            FloodVerdict::Flood
        } else {
            FloodVerdict::Ok
        }
    }

    /// Forget a user's window. Called after a flood kick so that their
    /// next message starts fresh.
    pub fn clear(&self, user_id: u64) {
        self.windows
            .lock()
            .expect("Flood tracker lock poisoned")
            .remove(&user_id);
    }

    /// How many users currently have a tracked window.
    pub fn tracked_users(&self) -> usize {
        self.windows
            .lock()
            .expect("Flood tracker lock poisoned")
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_is_a_flood() {
        let tracker = FloodTracker::new();
        let start = Instant::now();
        assert_eq!(tracker.record_and_check(1, start), FloodVerdict::Ok);
        assert_eq!(
            tracker.record_and_check(1, start + Duration::from_secs(1)),
            FloodVerdict::Ok
        );
        assert_eq!(
            tracker.record_and_check(1, start + Duration::from_secs(2)),
            FloodVerdict::Flood
        );
    }

    #[test]
    fn spread_messages_are_fine() {
        let tracker = FloodTracker::new();
        let start = Instant::now();
        assert_eq!(tracker.record_and_check(1, start), FloodVerdict::Ok);
        assert_eq!(
            tracker.record_and_check(1, start + Duration::from_secs(6)),
            FloodVerdict::Ok
        );
        // The first message has aged out of the window by now.
        assert_eq!(
            tracker.record_and_check(1, start + Duration::from_secs(12)),
            FloodVerdict::Ok
        );
    }

    #[test]
    fn users_are_tracked_independently() {
        let tracker = FloodTracker::new();
        let start = Instant::now();
        for user in [1, 2] {
            tracker.record_and_check(user, start);
            tracker.record_and_check(user, start);
        }
        assert_eq!(tracker.tracked_users(), 2);
        // Two messages each; a third from one user floods only them.
        assert_eq!(tracker.record_and_check(1, start), FloodVerdict::Flood);
        assert_eq!(tracker.record_and_check(3, start), FloodVerdict::Ok);
    }

    #[test]
    fn clear_forgets_the_window() {
        let tracker = FloodTracker::new();
        let start = Instant::now();
        for _ in 0..3 {
            tracker.record_and_check(1, start);
        }
        tracker.clear(1);
        assert_eq!(tracker.record_and_check(1, start), FloodVerdict::Ok);
        assert_eq!(tracker.tracked_users(), 1);
    }
}
