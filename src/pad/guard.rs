//! Exactly-once cleanup for the virtual pad
//!
//! The guard owns the sink for the whole run. [`PadGuard::release`] resets the
//! pad to neutral and flushes; later calls are no-ops. If the guard is dropped
//! without an explicit release (early return, panic unwinding) the same cleanup
//! runs from `Drop`, so the game is never left holding a button.

use super::{PadError, PadFrame, VirtualPad};
use tracing::{error, info, warn};

pub struct PadGuard {
    pad: Box<dyn VirtualPad>,
    released: bool,
}

impl PadGuard {
    pub fn new(pad: Box<dyn VirtualPad>) -> Self {
        Self {
            pad,
            released: false,
        }
    }

    /// Applies a frame and flushes it as one report
    pub fn commit(&mut self, frame: &PadFrame) -> Result<(), PadError> {
        if self.released {
            warn!("Dropping pad frame submitted after cleanup");
            return Ok(());
        }
        self.pad.commit(frame)
    }

    /// Resets the pad to neutral and flushes; returns `false` if already done
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;

        info!("Resetting virtual pad to neutral");
        self.pad.reset();
        if let Err(e) = self.pad.flush() {
            error!("Failed to flush neutral pad report: {}", e);
        }
        true
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for PadGuard {
    fn drop(&mut self) {
        if !self.released {
            warn!("Pad guard dropped without cleanup, resetting now");
            self.release();
        }
    }
}
