//! # Scan Event Filter
//!
//! Wraps the external decoder and turns its callback stream into distinct
//! scan events.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            start_scanning()            decoder ready                    │
//! │   ┌──────┐ ─────────────► ┌──────────┐ ────────────► ┌──────────┐       │
//! │   │ Idle │                │ Starting │               │ Scanning │       │
//! │   └──────┘ ◄───────────── └──────────┘               └──────────┘       │
//! │     ▲  ▲     stop_scanning()    │                         │             │
//! │     │  │                        │ acquisition failed      │             │
//! │     │  │                        ▼                         │             │
//! │     │  │  stop / reset_error ┌───────┐                    │             │
//! │     │  └──────────────────── │ Error │                    │             │
//! │     │                        └───────┘                    │             │
//! │     └─────────────────────────────────────────────────────┘             │
//! │                         stop_scanning()                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Decode Path
//! [`DecodeSink::deliver`] runs on the decoder's thread for every frame. It
//! takes one short lock, runs [`ScanSession::observe`] and, for a distinct
//! code, calls the listener and then the feedback outside the lock.
//!
//! Every start bumps an epoch. A sink, or a decoder that finishes starting,
//! from an older epoch is ignored, so nothing leaks past `stop_scanning`.
//!
//! ## Camera Lease
//! Stopping while the decoder is still acquiring the device parks the lease
//! instead of dropping it. The parked lease is returned to the camera only
//! after the late handle is released, so another filter can never open the
//! device underneath a decoder that is still coming up.

use std::sync::{Arc, Weak};
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tillpoint_core::{ScanEvent, ScanSession};
use tracing::{debug, info, trace, warn};
use ts_rs::TS;

use crate::camera::{CameraDevice, CameraLease};
use crate::config::ScannerSettings;
use crate::decoder::{Decoder, DecoderHandle, DecoderSettings, FrameMiss, RenderSurface};
use crate::error::{AcquisitionError, ScannerError, ScannerResult};
use crate::feedback::{ScanFeedback, SilentFeedback, Tone};

// =============================================================================
// Public Types
// =============================================================================

/// Lifecycle state of the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ScannerState {
    #[default]
    Idle,
    Starting,
    Scanning,
    Error,
}

/// Snapshot of the filter for UI bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScannerStatus {
    pub state: ScannerState,
    pub is_scanning: bool,
    pub enabled: bool,
    pub surface_mounted: bool,
    pub session_id: Option<String>,
    pub last_scan: Option<ScanEvent>,

    /// User-facing error message.
    pub error: Option<String>,

    #[ts(type = "number")]
    pub accepted: u64,
    #[ts(type = "number")]
    pub suppressed: u64,
}

/// Receives each distinct scan.
pub trait ScanListener: Send + Sync {
    fn on_scan(&self, event: &ScanEvent);
}

impl<F> ScanListener for F
where
    F: Fn(&ScanEvent) + Send + Sync,
{
    fn on_scan(&self, event: &ScanEvent) {
        self(event)
    }
}

// =============================================================================
// Shared State
// =============================================================================

struct Inner {
    state: ScannerState,
    enabled: bool,
    surface: Option<RenderSurface>,
    session: Option<ScanSession>,
    epoch: u64,
    handle: Option<Box<dyn DecoderHandle>>,
    lease: Option<CameraLease>,
    last_scan: Option<ScanEvent>,
    last_error: Option<AcquisitionError>,

    /// Decoder starts that have not returned yet, current or abandoned.
    starts_in_flight: u32,

    /// Lease of an abandoned start, held until its decoder is released.
    parked_lease: Option<CameraLease>,
}

impl Inner {
    /// Gives up the active lease. While a start is in flight the lease is
    /// parked rather than returned to the camera.
    fn retire_lease(&mut self) {
        let lease = self.lease.take();
        if self.starts_in_flight > 0 && lease.is_some() {
            self.parked_lease = lease;
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    listener: Arc<dyn ScanListener>,
    feedback: Arc<dyn ScanFeedback>,
    tone: Tone,
    beep: bool,
}

// =============================================================================
// Decode Sink
// =============================================================================

/// Callback target handed to the decoder on start.
#[derive(Clone)]
pub struct DecodeSink {
    shared: Weak<Shared>,
    epoch: u64,
}

impl std::fmt::Debug for DecodeSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeSink").field("epoch", &self.epoch).finish()
    }
}

impl DecodeSink {
    /// Feeds one decoder callback into the filter.
    pub fn deliver(&self, decoded: Result<String, FrameMiss>) {
        self.deliver_at(decoded, Instant::now());
    }

    /// Same as [`deliver`](Self::deliver) with an explicit decode time.
    pub fn deliver_at(&self, decoded: Result<String, FrameMiss>, now: Instant) {
        let raw = match decoded {
            Ok(raw) => raw,
            Err(miss) => {
                trace!(reason = %miss.reason, "Frame without a code");
                return;
            }
        };

        let Some(shared) = self.shared.upgrade() else {
            return;
        };

        let event = {
            let mut inner = shared.inner.lock();
            if inner.epoch != self.epoch
                || !matches!(inner.state, ScannerState::Starting | ScannerState::Scanning)
            {
                trace!("Decode from a stopped session dropped");
                return;
            }
            let Some(session) = inner.session.as_mut() else {
                return;
            };
            let Some(event) = session.observe(&raw, now, Utc::now()) else {
                trace!("Repeat decode suppressed");
                return;
            };
            inner.last_scan = Some(event.clone());
            event
        };

        debug!(code = %event.code, "Distinct scan");
        shared.listener.on_scan(&event);

        if shared.beep {
            if let Err(e) = shared.feedback.confirm(&shared.tone) {
                debug!(error = %e, "Scan feedback failed");
            }
        }
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Continuous barcode scanner with temporal de-duplication.
///
/// Dropping the filter stops it and releases the camera.
pub struct ScanEventFilter {
    shared: Arc<Shared>,
    decoder: Arc<dyn Decoder>,
    camera: CameraDevice,
    settings: ScannerSettings,
    decoder_settings: DecoderSettings,
}

impl ScanEventFilter {
    /// Creates an idle, enabled filter with silent feedback and its own
    /// camera device.
    pub fn new(
        decoder: Arc<dyn Decoder>,
        settings: ScannerSettings,
        listener: Arc<dyn ScanListener>,
    ) -> Self {
        Self::with_parts(
            decoder,
            settings,
            listener,
            Arc::new(SilentFeedback),
            CameraDevice::new(),
        )
    }

    /// Creates a filter with explicit feedback and a shared camera device.
    pub fn with_parts(
        decoder: Arc<dyn Decoder>,
        settings: ScannerSettings,
        listener: Arc<dyn ScanListener>,
        feedback: Arc<dyn ScanFeedback>,
        camera: CameraDevice,
    ) -> Self {
        let decoder_settings = settings.decoder_settings();
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                state: ScannerState::Idle,
                enabled: true,
                surface: None,
                session: None,
                epoch: 0,
                handle: None,
                lease: None,
                last_scan: None,
                last_error: None,
                starts_in_flight: 0,
                parked_lease: None,
            }),
            listener,
            feedback,
            tone: decoder_settings.tone,
            beep: settings.beep,
        });

        ScanEventFilter {
            shared,
            decoder,
            camera,
            settings,
            decoder_settings,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Starts the camera and decoding.
    ///
    /// A no-op when already starting, scanning or disabled. Camera failures
    /// are recorded (see [`error`](Self::error)) and return `Ok`.
    pub async fn start_scanning(&self) -> ScannerResult<()> {
        let (surface, epoch) = {
            let mut inner = self.shared.inner.lock();
            if !inner.enabled {
                debug!("Scanner disabled, not starting");
                return Ok(());
            }
            if matches!(inner.state, ScannerState::Starting | ScannerState::Scanning) {
                return Ok(());
            }
            let surface = inner.surface.clone().ok_or(ScannerError::SurfaceNotMounted)?;

            inner.epoch += 1;
            inner.last_error = None;

            let lease = inner
                .parked_lease
                .take()
                .or_else(|| self.camera.try_acquire());
            let Some(lease) = lease else {
                let err = AcquisitionError::DeviceFailure("camera already in use".into());
                warn!(error = %err, "Scanner could not start");
                inner.last_error = Some(err);
                inner.state = ScannerState::Error;
                return Ok(());
            };

            let session = ScanSession::new(self.settings.dedup_window());
            debug!(session_id = %session.id(), surface = %surface.id, "Starting scanner");
            inner.lease = Some(lease);
            inner.session = Some(session);
            inner.state = ScannerState::Starting;
            inner.starts_in_flight += 1;
            (surface, inner.epoch)
        };

        let sink = DecodeSink {
            shared: Arc::downgrade(&self.shared),
            epoch,
        };
        let started = self
            .decoder
            .start(&surface, &self.decoder_settings, sink)
            .await;

        let mut inner = self.shared.inner.lock();
        match started {
            Ok(mut handle) if inner.epoch != epoch => {
                drop(inner);
                handle.release();
                self.finish_abandoned_start();
                info!("Scanner stopped while starting, released decoder");
            }
            Ok(handle) => {
                inner.starts_in_flight -= 1;
                inner.handle = Some(handle);
                inner.state = ScannerState::Scanning;
                info!(
                    session_id = ?inner.session.as_ref().map(|s| s.id()),
                    "Scanner started"
                );
            }
            Err(_) if inner.epoch != epoch => {
                drop(inner);
                self.finish_abandoned_start();
                debug!("Scanner stopped while a failing start was in flight");
            }
            Err(failure) => {
                let err = AcquisitionError::classify(&failure.0);
                warn!(error = %err, raw = %failure, "Camera acquisition failed");
                inner.starts_in_flight -= 1;
                inner.retire_lease();
                inner.session = None;
                inner.last_error = Some(err);
                inner.state = ScannerState::Error;
            }
        }

        Ok(())
    }

    /// Returns the parked lease once no decoder start is left in flight.
    fn finish_abandoned_start(&self) {
        let lease = {
            let mut inner = self.shared.inner.lock();
            inner.starts_in_flight -= 1;
            if inner.starts_in_flight == 0 {
                inner.parked_lease.take()
            } else {
                None
            }
        };
        drop(lease);
    }

    /// Stops decoding and releases the camera. Safe in every state.
    ///
    /// During `Starting` the camera stays leased until the decoder returns
    /// and its late handle is released.
    pub fn stop_scanning(&self) {
        let (handle, was) = {
            let mut inner = self.shared.inner.lock();
            inner.epoch += 1;
            inner.session = None;
            inner.retire_lease();
            let was = inner.state;
            inner.state = ScannerState::Idle;
            (inner.handle.take(), was)
        };

        if let Some(mut handle) = handle {
            handle.release();
        }
        if was != ScannerState::Idle {
            info!(from = ?was, "Scanner stopped");
        }
    }

    /// Clears the last acquisition error.
    pub fn reset_error(&self) {
        let mut inner = self.shared.inner.lock();
        inner.last_error = None;
        if inner.state == ScannerState::Error {
            inner.state = ScannerState::Idle;
        }
    }

    /// Enables or disables scanning. Disabling stops a running scanner.
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.inner.lock().enabled = enabled;
        if !enabled {
            self.stop_scanning();
        }
    }

    /// Provides the surface the preview is drawn into.
    pub fn mount_surface(&self, surface: RenderSurface) {
        self.shared.inner.lock().surface = Some(surface);
    }

    /// Removes the surface. Scanning cannot outlive it.
    pub fn unmount_surface(&self) {
        self.stop_scanning();
        self.shared.inner.lock().surface = None;
    }

    // =========================================================================
    // Observables
    // =========================================================================

    pub fn state(&self) -> ScannerState {
        self.shared.inner.lock().state
    }

    pub fn is_scanning(&self) -> bool {
        self.state() == ScannerState::Scanning
    }

    /// Most recent distinct scan.
    pub fn last_scan(&self) -> Option<ScanEvent> {
        self.shared.inner.lock().last_scan.clone()
    }

    /// User-facing message for the last acquisition failure.
    pub fn error(&self) -> Option<String> {
        self.shared
            .inner
            .lock()
            .last_error
            .as_ref()
            .map(AcquisitionError::user_message)
    }

    pub fn last_error(&self) -> Option<AcquisitionError> {
        self.shared.inner.lock().last_error.clone()
    }

    pub fn status(&self) -> ScannerStatus {
        let inner = self.shared.inner.lock();
        let session = inner.session.as_ref();
        ScannerStatus {
            state: inner.state,
            is_scanning: inner.state == ScannerState::Scanning,
            enabled: inner.enabled,
            surface_mounted: inner.surface.is_some(),
            session_id: session.map(|s| s.id().to_string()),
            last_scan: inner.last_scan.clone(),
            error: inner.last_error.as_ref().map(AcquisitionError::user_message),
            accepted: session.map_or(0, |s| s.accepted()),
            suppressed: session.map_or(0, |s| s.suppressed()),
        }
    }
}

impl Drop for ScanEventFilter {
    fn drop(&mut self) {
        self.stop_scanning();
    }
}
