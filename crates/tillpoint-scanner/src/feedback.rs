//! # Scan Feedback
//!
//! The short beep after a distinct scan. Best-effort: a failure is logged by
//! the filter and never affects the scan event.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::FeedbackError;

/// A confirmation tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    /// 0-100.
    pub volume_percent: u8,
}

impl Default for Tone {
    fn default() -> Self {
        Tone {
            frequency_hz: 1200,
            duration_ms: 80,
            volume_percent: 30,
        }
    }
}

/// Plays feedback for a distinct scan.
///
/// Called synchronously from the decode callback, so implementations must
/// return quickly (hand off to an audio thread if playback blocks).
pub trait ScanFeedback: Send + Sync {
    fn confirm(&self, tone: &Tone) -> Result<(), FeedbackError>;
}

/// No feedback at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentFeedback;

impl ScanFeedback for SilentFeedback {
    fn confirm(&self, _tone: &Tone) -> Result<(), FeedbackError> {
        Ok(())
    }
}

/// Rings the terminal bell (BEL on stderr).
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl ScanFeedback for TerminalBell {
    fn confirm(&self, tone: &Tone) -> Result<(), FeedbackError> {
        if tone.volume_percent == 0 {
            return Ok(());
        }
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        Ok(())
    }
}
