//! Sink that only logs the reports it would submit
//!
//! Used on platforms without ViGEmBus and for dry runs.

use super::{PadError, PadReport, Stick, Trigger, VirtualPad, XButton};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct TracePad {
    pending: PadReport,
    submitted: PadReport,
    flushes: u64,
}

impl TracePad {
    pub fn new() -> Self {
        info!("Using trace-only virtual pad, reports are logged at debug level");
        Self::default()
    }

    /// Report as of the last flush
    pub fn submitted(&self) -> &PadReport {
        &self.submitted
    }

    pub fn flushes(&self) -> u64 {
        self.flushes
    }
}

impl VirtualPad for TracePad {
    fn set_stick(&mut self, stick: Stick, x: f32, y: f32) {
        self.pending.set_stick(stick, x, y);
    }

    fn set_trigger(&mut self, trigger: Trigger, value: f32) {
        self.pending.set_trigger(trigger, value);
    }

    fn press_button(&mut self, button: XButton) {
        self.pending.press(button);
    }

    fn release_button(&mut self, button: XButton) {
        self.pending.release(button);
    }

    fn flush(&mut self) -> Result<(), PadError> {
        if self.pending != self.submitted {
            debug!(
                "Pad report: buttons={:#06x} lt={:.2} rt={:.2} ls=({:.2}, {:.2}) rs=({:.2}, {:.2})",
                self.pending.buttons,
                self.pending.left_trigger,
                self.pending.right_trigger,
                self.pending.left_stick.0,
                self.pending.left_stick.1,
                self.pending.right_stick.0,
                self.pending.right_stick.1,
            );
        }
        self.submitted = self.pending.clone();
        self.flushes += 1;
        Ok(())
    }

    fn reset(&mut self) {
        self.pending = PadReport::default();
    }
}
