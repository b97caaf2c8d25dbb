//! # Keyboard-Wedge Decoder
//!
//! USB and Bluetooth handheld scanners present themselves as keyboards and
//! "type" each barcode followed by Enter. [`KeyboardWedgeDecoder`] turns
//! those lines into decoder callbacks, so a handheld scanner goes through
//! the same filter as a camera.
//!
//! ```text
//! stdin / input box ──► WedgeInput::push(line) ──► broadcast ──► sink.deliver(Ok(line))
//!                                                    (only while started)
//! ```
//!
//! The host owns the input source and decides which lines are scans; the
//! terminal, for example, keeps `:` lines for itself.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::decoder::{Decoder, DecoderHandle, DecoderSettings, RenderSurface, StartFailure};
use crate::filter::DecodeSink;

/// Lines buffered per running decoder before the oldest are dropped.
const LINE_BUFFER: usize = 64;

/// Producer side: the host pushes typed lines here.
#[derive(Debug, Clone)]
pub struct WedgeInput {
    tx: broadcast::Sender<String>,
}

impl Default for WedgeInput {
    fn default() -> Self {
        Self::new()
    }
}

impl WedgeInput {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(LINE_BUFFER);
        WedgeInput { tx }
    }

    /// Pushes one line. Returns false if no decoder is running.
    pub fn push(&self, line: impl Into<String>) -> bool {
        self.tx.send(line.into()).is_ok()
    }

    /// A decoder reading from this input.
    pub fn decoder(&self) -> KeyboardWedgeDecoder {
        KeyboardWedgeDecoder {
            tx: self.tx.clone(),
        }
    }
}

/// [`Decoder`] fed by a [`WedgeInput`].
#[derive(Debug, Clone)]
pub struct KeyboardWedgeDecoder {
    tx: broadcast::Sender<String>,
}

struct WedgeHandle {
    task: JoinHandle<()>,
}

impl DecoderHandle for WedgeHandle {
    fn release(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl Decoder for KeyboardWedgeDecoder {
    async fn start(
        &self,
        surface: &RenderSurface,
        settings: &DecoderSettings,
        sink: DecodeSink,
    ) -> Result<Box<dyn DecoderHandle>, StartFailure> {
        debug!(surface = %surface.id, symbologies = settings.symbologies.len(), "Keyboard wedge listening");
        let mut rx = self.tx.subscribe();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(line) => sink.deliver(Ok(line)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Keyboard wedge fell behind, lines dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Box::new(WedgeHandle { task }))
    }
}
