use crate::error::{RestoreError, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Keeps the parent process alive when Ctrl+C arrives.
///
/// The terminal delivers SIGINT to the whole foreground process group, so the
/// engine receives it directly. The parent only records the interruption and
/// keeps waiting, which lets the ephemeral artifacts be removed once the
/// engine has exited.
#[derive(Clone)]
pub struct GracefulShutdown {
    interrupted: Arc<AtomicBool>,
    signal_count: Arc<AtomicUsize>,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let shutdown = Self::unregistered();

        let interrupted = shutdown.interrupted.clone();
        let signal_count = shutdown.signal_count.clone();

        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);

            if signal_count.fetch_add(1, Ordering::SeqCst) == 0 {
                eprintln!("\nInterrupted; waiting for the decompression engine to exit...");
            } else {
                eprintln!(
                    "\nStill waiting for the decompression engine so temporary files \
                     can be removed..."
                );
            }
        })
        .map_err(|e| RestoreError::EnvironmentResolution {
            message: format!("Failed to set signal handler: {}", e),
        })?;

        Ok(shutdown)
    }

    /// Create an instance without registering a process-wide handler.
    #[cfg(test)]
    pub(crate) fn new_for_test() -> Self {
        Self::unregistered()
    }

    fn unregistered() -> Self {
        Self {
            interrupted: Arc::new(AtomicBool::new(false)),
            signal_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn was_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Record an interruption as if Ctrl+C had been pressed.
    #[cfg(test)]
    pub(crate) fn request_shutdown(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        self.signal_count.fetch_add(1, Ordering::SeqCst);
    }
}
