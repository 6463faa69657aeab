//! AI image generation adapter.
//!
//! The core never talks to a model directly; the host supplies an
//! [`ImageGenerator`] backend and the core hands it a [`GenerationRequest`]
//! on a worker thread. The adapter contract is synchronous and blocking —
//! backends check the [`CancelToken`] between inference steps and report
//! progress (optionally with an intermediate preview image) through the
//! provided callback. The worker relays everything to the UI thread as
//! [`WorkerEvent`]s; on `Complete` the host inserts the image through a
//! `Paste` command.

use core_events::{WorkerEvent, worker_channel};
use core_raster::RasterBuffer;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiError {
    #[error("no image generation backend is configured")]
    DependencyMissing,
    #[error("generation was cancelled")]
    Cancelled,
    #[error("backend failure: {0}")]
    Backend(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationMode {
    PromptToImage,
    ImageToImage,
    Inpaint,
}

/// Everything a backend needs for one generation run. `strength` only
/// applies to the image-to-image and inpaint modes; `mask` only to inpaint.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    pub prompt: String,
    pub input: Option<RasterBuffer>,
    pub mask: Option<RasterBuffer>,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub guidance: f32,
    pub strength: f32,
}

impl GenerationRequest {
    pub fn prompt_to_image(prompt: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            mode: GenerationMode::PromptToImage,
            prompt: prompt.into(),
            input: None,
            mask: None,
            width,
            height,
            steps: 20,
            guidance: 7.0,
            strength: 0.8,
        }
    }
}

/// Cooperative cancellation flag shared between the UI thread and the
/// generation worker.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Convenience for backends: error out at a step boundary if cancelled.
    pub fn check(&self) -> Result<(), AiError> {
        if self.is_cancelled() {
            Err(AiError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Per-step progress callback: `(finished_step, preview)`.
pub type ProgressFn<'a> = dyn FnMut(u32, Option<&RasterBuffer>) + 'a;

/// A blocking image generation backend. Implementations run on a worker
/// thread owned by [`spawn_generation`]; they must poll `cancel` between
/// steps and invoke `progress` after each one.
pub trait ImageGenerator: Send {
    fn generate(
        &mut self,
        request: &GenerationRequest,
        progress: &mut ProgressFn<'_>,
        cancel: &CancelToken,
    ) -> Result<RasterBuffer, AiError>;
}

/// Run one generation on a background thread, returning the UI-side receiver.
/// Progress, completion, and failure all arrive as [`WorkerEvent`]s; the
/// worker never touches the document.
pub fn spawn_generation(
    mut generator: Box<dyn ImageGenerator>,
    request: GenerationRequest,
    cancel: CancelToken,
) -> Receiver<WorkerEvent<RasterBuffer>> {
    let (tx, rx) = worker_channel();
    let total = request.steps;
    thread::spawn(move || {
        info!(target: "ai", mode = ?request.mode, steps = request.steps, "generation_started");
        let progress_tx = tx.clone();
        let mut progress = move |step: u32, preview: Option<&RasterBuffer>| {
            let _ = progress_tx.send(WorkerEvent::Progress {
                step,
                total,
                preview: preview.cloned(),
            });
        };
        let result = generator.generate(&request, &mut progress, &cancel);
        match result {
            Ok(image) => {
                let _ = tx.send(WorkerEvent::Complete(image));
            }
            Err(err) => {
                warn!(target: "ai", %err, "generation_failed");
                let _ = tx.send(WorkerEvent::Failed(err.to_string()));
            }
        }
    });
    rx
}
