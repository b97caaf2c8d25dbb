//! # Scan De-duplication
//!
//! Reduces a noisy decode stream to distinct scan events.
//!
//! ## The Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  repeat = (code == last_code) AND (now - last_accepted_at < window)    │
//! │                                                                         │
//! │  window = 250ms                                                        │
//! │                                                                         │
//! │  t=0    "A"  ──► EMIT   (first)                                        │
//! │  t=100  "A"  ──► drop   (same label, camera re-read it)                │
//! │  t=110  "B"  ──► EMIT   (different code: never suppressed)             │
//! │  t=120  "A"  ──► EMIT   (last code was B)                              │
//! │  t=400  "A"  ──► EMIT   (window elapsed: cashier scanned another unit) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A global cooldown would block scanning two different items quickly;
//! keying on the code alone would block scanning five units of one product.
//! The (code, elapsed) key allows both.
//!
//! The window is measured from the last ACCEPTED scan, so a label held in
//! front of the camera produces one event per window, not one per frame.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::ScanEvent;
use crate::validation::normalize_key;

/// Default de-duplication window.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_millis(250);

/// Rolling de-duplication state for one continuous scanning session.
#[derive(Debug, Clone)]
pub struct ScanSession {
    id: Uuid,
    window: Duration,
    last_code: Option<String>,
    last_accepted_at: Option<Instant>,
    accepted: u64,
    suppressed: u64,
}

impl ScanSession {
    /// Starts a fresh session with the given window.
    pub fn new(window: Duration) -> Self {
        ScanSession {
            id: Uuid::new_v4(),
            window,
            last_code: None,
            last_accepted_at: None,
            accepted: 0,
            suppressed: 0,
        }
    }

    /// Session id, for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Last accepted code.
    pub fn last_code(&self) -> Option<&str> {
        self.last_code.as_deref()
    }

    /// Number of events emitted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Number of repeats dropped so far.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Returns true if `code` (already trimmed) at `now` would be dropped.
    pub fn is_repeat(&self, code: &str, now: Instant) -> bool {
        match (&self.last_code, self.last_accepted_at) {
            (Some(last), Some(at)) => {
                last == code && now.saturating_duration_since(at) < self.window
            }
            _ => false,
        }
    }

    /// Feeds one raw decoded string into the session.
    ///
    /// Returns the distinct scan event to emit, or `None` when the input is
    /// empty or a repeat. `now` is the monotonic time of the decode and
    /// `wall` the timestamp recorded on the event.
    pub fn observe(&mut self, raw: &str, now: Instant, wall: DateTime<Utc>) -> Option<ScanEvent> {
        let code = normalize_key(raw)?;

        if self.is_repeat(code, now) {
            self.suppressed += 1;
            return None;
        }

        self.last_code = Some(code.to_string());
        self.last_accepted_at = Some(now);
        self.accepted += 1;

        Some(ScanEvent {
            code: code.to_string(),
            scanned_at: wall,
        })
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        ScanSession::new(DEFAULT_DEDUP_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays `(code, millis)` pairs and returns the millis of emitted events.
    fn replay(events: &[(&str, u64)]) -> Vec<(String, u64)> {
        let base = Instant::now();
        let mut session = ScanSession::default();
        events
            .iter()
            .filter_map(|(code, ms)| {
                session
                    .observe(code, base + Duration::from_millis(*ms), Utc::now())
                    .map(|e| (e.code, *ms))
            })
            .collect()
    }

    #[test]
    fn test_same_code_within_window_is_dropped() {
        let emitted = replay(&[("A", 0), ("A", 100), ("A", 260)]);
        assert_eq!(emitted, vec![("A".to_string(), 0), ("A".to_string(), 260)]);
    }

    #[test]
    fn test_different_code_is_never_suppressed() {
        let emitted = replay(&[("A", 0), ("B", 10)]);
        assert_eq!(emitted.len(), 2);

        let emitted = replay(&[("A", 0), ("B", 1), ("A", 2), ("B", 3)]);
        assert_eq!(emitted.len(), 4);
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let emitted = replay(&[("A", 0), ("A", 249), ("A", 250)]);
        assert_eq!(emitted, vec![("A".to_string(), 0), ("A".to_string(), 250)]);
    }

    #[test]
    fn test_window_measured_from_last_accepted() {
        // A label held under the camera: frames every 50ms for 600ms.
        let frames: Vec<(&str, u64)> = (0..=12).map(|i| ("A", i * 50)).collect();
        let emitted = replay(&frames);
        let times: Vec<u64> = emitted.iter().map(|(_, t)| *t).collect();
        assert_eq!(times, vec![0, 250, 500]);
    }

    #[test]
    fn test_input_is_trimmed_and_empty_rejected() {
        let emitted = replay(&[("  ", 0), ("", 5), (" A\n", 10), ("A", 20)]);
        assert_eq!(emitted, vec![("A".to_string(), 10)]);
    }

    #[test]
    fn test_counters() {
        let base = Instant::now();
        let mut session = ScanSession::new(Duration::from_millis(250));
        session.observe("A", base, Utc::now());
        session.observe("A", base + Duration::from_millis(50), Utc::now());
        session.observe("A", base + Duration::from_millis(60), Utc::now());

        assert_eq!(session.accepted(), 1);
        assert_eq!(session.suppressed(), 2);
        assert_eq!(session.last_code(), Some("A"));
    }

    #[test]
    fn test_out_of_order_timestamps_do_not_panic() {
        let base = Instant::now() + Duration::from_secs(1);
        let mut session = ScanSession::default();
        assert!(session.observe("A", base, Utc::now()).is_some());
        // Earlier instant than the last accepted one counts as zero elapsed.
        assert!(session
            .observe("A", base - Duration::from_millis(10), Utc::now())
            .is_none());
    }

    #[test]
    fn test_fresh_sessions_have_distinct_ids() {
        assert_ne!(ScanSession::default().id(), ScanSession::default().id());
    }
}
