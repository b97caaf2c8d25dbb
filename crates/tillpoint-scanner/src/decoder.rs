//! # Decoder Seam
//!
//! The barcode decoding library is external. The filter only needs to start
//! it, receive decoded strings and release the camera again.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  filter ── start(surface, settings, sink) ──► Decoder                   │
//! │                                                  │                      │
//! │         ◄── Box<dyn DecoderHandle> ──────────────┘                      │
//! │                                                                         │
//! │  decoder loop:  sink.deliver(Ok("5449000000996"))                       │
//! │                 sink.deliver(Err(FrameMiss))        (no code in frame)  │
//! │                                                                         │
//! │  filter ── handle.release() ──► camera light off                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feedback::Tone;
use crate::filter::DecodeSink;

/// Barcode symbologies the decoder is asked to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Code128,
    Code39,
    QrCode,
}

impl Symbology {
    /// Retail symbologies accepted at the till.
    pub const RETAIL: [Symbology; 7] = [
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Code128,
        Symbology::Code39,
        Symbology::QrCode,
    ];
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcA => "UPC-A",
            Symbology::UpcE => "UPC-E",
            Symbology::Code128 => "Code 128",
            Symbology::Code39 => "Code 39",
            Symbology::QrCode => "QR Code",
        };
        f.write_str(name)
    }
}

/// Region of the preview the decoder scans, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetBox {
    pub width: u32,
    pub height: u32,
}

impl Default for TargetBox {
    fn default() -> Self {
        TargetBox {
            width: 280,
            height: 160,
        }
    }
}

/// Everything the decoder is started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderSettings {
    pub symbologies: Vec<Symbology>,
    pub frames_per_second: u32,
    pub target_box: TargetBox,
    pub tone: Tone,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        DecoderSettings {
            symbologies: Symbology::RETAIL.to_vec(),
            frames_per_second: 15,
            target_box: TargetBox::default(),
            tone: Tone::default(),
        }
    }
}

/// Where the camera preview is drawn (a DOM element id, a window handle...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSurface {
    pub id: String,
}

impl RenderSurface {
    pub fn new(id: impl Into<String>) -> Self {
        RenderSurface { id: id.into() }
    }
}

/// A frame in which no code could be decoded. Normal; dropped silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMiss {
    pub reason: String,
}

/// Raw failure reported by the decoder while acquiring the camera.
///
/// Carries the host's error name or message; the filter classifies it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StartFailure(pub String);

/// A running decoder. Dropping the handle without `release` is a leak the
/// filter never commits.
pub trait DecoderHandle: Send {
    /// Stops decoding and frees the camera. Must be idempotent.
    fn release(&mut self);
}

/// The external barcode decoder.
#[async_trait]
pub trait Decoder: Send + Sync {
    /// Acquires the camera, mounts the preview on `surface` and starts
    /// delivering decodes to `sink`.
    async fn start(
        &self,
        surface: &RenderSurface,
        settings: &DecoderSettings,
        sink: DecodeSink,
    ) -> Result<Box<dyn DecoderHandle>, StartFailure>;
}
