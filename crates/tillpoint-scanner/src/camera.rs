//! # Camera Ownership
//!
//! A camera can be opened by one scanner at a time. Filters that share a
//! device share one [`CameraDevice`]; starting takes a [`CameraLease`] and
//! dropping the lease hands the device back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A physical camera that at most one filter may hold.
#[derive(Debug, Clone, Default)]
pub struct CameraDevice {
    in_use: Arc<AtomicBool>,
}

impl CameraDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the device, or `None` if another filter holds it.
    pub fn try_acquire(&self) -> Option<CameraLease> {
        self.in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CameraLease {
                in_use: Arc::clone(&self.in_use),
            })
    }

    pub fn is_in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }
}

/// Exclusive hold on a [`CameraDevice`]. Released on drop.
#[derive(Debug)]
pub struct CameraLease {
    in_use: Arc<AtomicBool>,
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        self.in_use.store(false, Ordering::Release);
    }
}
