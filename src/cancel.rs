//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is cloned into a conversion and polled at page
//! boundaries. Cancelling never interrupts a page that is already being
//! parsed, rendered or recognised; the conversion stops at the next
//! boundary with [`Layout2MdError::Cancelled`].

use crate::error::Layout2MdError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<(), Layout2MdError> {
        if self.is_cancelled() {
            Err(Layout2MdError::Cancelled)
        } else {
            Ok(())
        }
    }
}
