//! # tillpoint-scanner: Continuous Barcode Scanning
//!
//! A camera decoder reports the same label many times per second. This
//! crate turns that stream into one event per physical scan and keeps the
//! camera lifecycle leak-free.
//!
//! ## Modules
//!
//! - [`filter`] - `ScanEventFilter` state machine and `DecodeSink`
//! - [`decoder`] - `Decoder` seam, symbologies, render surface
//! - [`camera`] - One-holder camera lease
//! - [`feedback`] - Confirmation tone seam
//! - [`wedge`] - Keyboard-wedge (handheld scanner) decoder
//! - [`config`] - `[scanner]` settings
//! - [`error`] - Error types and acquisition classification

pub mod camera;
pub mod config;
pub mod decoder;
pub mod error;
pub mod feedback;
pub mod filter;
pub mod wedge;

pub use camera::{CameraDevice, CameraLease};
pub use config::ScannerSettings;
pub use decoder::{
    Decoder, DecoderHandle, DecoderSettings, FrameMiss, RenderSurface, StartFailure, Symbology,
    TargetBox,
};
pub use error::{AcquisitionError, FeedbackError, ScannerError, ScannerResult};
pub use feedback::{ScanFeedback, SilentFeedback, TerminalBell, Tone};
pub use filter::{DecodeSink, ScanEventFilter, ScanListener, ScannerState, ScannerStatus};
pub use wedge::{KeyboardWedgeDecoder, WedgeInput};
