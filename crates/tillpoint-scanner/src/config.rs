//! # Scanner Settings
//!
//! The `[scanner]` table of the terminal config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decoder::DecoderSettings;

/// Scanner behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Same-code repeats closer than this are dropped (milliseconds).
    #[serde(default = "default_dedup_window")]
    pub dedup_window_ms: u64,

    /// Decoder capture rate.
    #[serde(default = "default_fps")]
    pub frames_per_second: u32,

    /// Play the confirmation tone on each distinct scan.
    #[serde(default = "default_true")]
    pub beep: bool,
}

fn default_dedup_window() -> u64 {
    250
}
fn default_fps() -> u32 {
    15
}
fn default_true() -> bool {
    true
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            dedup_window_ms: default_dedup_window(),
            frames_per_second: default_fps(),
            beep: true,
        }
    }
}

impl ScannerSettings {
    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    /// Decoder settings with this capture rate and the retail defaults.
    pub fn decoder_settings(&self) -> DecoderSettings {
        DecoderSettings {
            frames_per_second: self.frames_per_second,
            ..DecoderSettings::default()
        }
    }

    /// Returns a description of the first invalid value, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.dedup_window_ms == 0 {
            return Err("dedup_window_ms must be greater than 0".into());
        }
        if !(1..=60).contains(&self.frames_per_second) {
            return Err("frames_per_second must be between 1 and 60".into());
        }
        Ok(())
    }
}
