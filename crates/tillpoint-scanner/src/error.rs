//! # Scanner Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ScannerError (returned)          AcquisitionError (stored, shown)     │
//! │  ───────────────────────          ────────────────────────────────     │
//! │  SurfaceNotMounted                PermissionDenied                     │
//! │    caller bug: no preview         NoCameraFound                        │
//! │    element to draw into           DeviceFailure(msg)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Acquisition failures are expected at a till (camera unplugged, browser
//! permission revoked), so `start_scanning` records them and returns `Ok`.
//! Only a missing render surface is reported as an error.

use thiserror::Error;

/// Result type alias for scanner operations.
pub type ScannerResult<T> = Result<T, ScannerError>;

/// Errors returned by [`crate::ScanEventFilter`] operations.
#[derive(Debug, Error)]
pub enum ScannerError {
    /// `start_scanning` was called with no render surface mounted.
    #[error("No scanner surface is mounted")]
    SurfaceNotMounted,

    /// Camera acquisition failed.
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
}

/// Why the camera could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    /// The user or the platform refused camera access.
    #[error("Camera permission denied")]
    PermissionDenied,

    /// No video input device exists.
    #[error("No camera found")]
    NoCameraFound,

    /// Anything else, with the host's message.
    #[error("Camera failure: {0}")]
    DeviceFailure(String),
}

impl AcquisitionError {
    /// Maps a host error name or message to one of the three kinds.
    ///
    /// ```rust
    /// use tillpoint_scanner::AcquisitionError;
    ///
    /// assert_eq!(AcquisitionError::classify("NotAllowedError"), AcquisitionError::PermissionDenied);
    /// assert_eq!(AcquisitionError::classify("DevicesNotFoundError"), AcquisitionError::NoCameraFound);
    /// ```
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_lowercase();

        if lower.contains("notallowed")
            || lower.contains("permissiondenied")
            || lower.contains("permission")
            || lower.contains("securityerror")
        {
            AcquisitionError::PermissionDenied
        } else if lower.contains("notfound")
            || lower.contains("devicesnotfound")
            || lower.contains("no camera")
            || lower.contains("not found")
            || lower.contains("overconstrained")
        {
            AcquisitionError::NoCameraFound
        } else {
            let message = raw.trim();
            AcquisitionError::DeviceFailure(if message.is_empty() {
                "unknown error".to_string()
            } else {
                message.to_string()
            })
        }
    }

    /// Text shown to the cashier.
    pub fn user_message(&self) -> String {
        match self {
            AcquisitionError::PermissionDenied => {
                "Camera access was denied. Allow camera access and try again.".to_string()
            }
            AcquisitionError::NoCameraFound => {
                "No camera was found. Connect a camera or use a handheld scanner.".to_string()
            }
            AcquisitionError::DeviceFailure(msg) => format!("Could not start the camera: {}", msg),
        }
    }
}

/// Audio feedback could not be played. Never affects the scan itself.
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),

    #[error("Feedback I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_permission() {
        for raw in [
            "NotAllowedError",
            "PermissionDeniedError",
            "NotAllowedError: Permission denied",
            "camera permission was revoked",
        ] {
            assert_eq!(AcquisitionError::classify(raw), AcquisitionError::PermissionDenied, "{}", raw);
        }
    }

    #[test]
    fn test_classify_no_camera() {
        for raw in [
            "NotFoundError",
            "DevicesNotFoundError",
            "Requested device not found",
            "no camera attached",
        ] {
            assert_eq!(AcquisitionError::classify(raw), AcquisitionError::NoCameraFound, "{}", raw);
        }
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(
            AcquisitionError::classify("NotReadableError: Could not start video source"),
            AcquisitionError::DeviceFailure("NotReadableError: Could not start video source".into())
        );
        assert_eq!(
            AcquisitionError::classify("  "),
            AcquisitionError::DeviceFailure("unknown error".into())
        );
    }

    #[test]
    fn test_user_messages() {
        assert!(AcquisitionError::PermissionDenied.user_message().contains("denied"));
        assert!(AcquisitionError::NoCameraFound.user_message().contains("No camera"));
        assert!(AcquisitionError::DeviceFailure("busy".into())
            .user_message()
            .ends_with("busy"));
    }

    #[test]
    fn test_scanner_error_display() {
        assert_eq!(ScannerError::SurfaceNotMounted.to_string(), "No scanner surface is mounted");
        let err: ScannerError = AcquisitionError::NoCameraFound.into();
        assert_eq!(err.to_string(), "No camera found");
    }
}
