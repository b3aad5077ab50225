//! ViGEmBus-backed virtual Xbox 360 controller (Windows only)

use super::{PadError, PadReport, Stick, Trigger, VirtualPad, XButton};
use tracing::{debug, info, warn};
use vigem_client::{Client, TargetId, XButtons, XGamepad, Xbox360Wired};

pub struct ViGEmPad {
    target: Xbox360Wired<Client>,
    report: PadReport,
}

impl ViGEmPad {
    /// Connects to the bus and plugs in a wired Xbox 360 target
    pub fn connect() -> Result<Self, PadError> {
        info!("Connecting to ViGEmBus");
        let client = Client::connect().map_err(|e| PadError::Connect(e.to_string()))?;

        let mut target = Xbox360Wired::new(client, TargetId::XBOX360_WIRED);
        target
            .plugin()
            .map_err(|e| PadError::Connect(format!("plugin failed: {}", e)))?;
        target
            .wait_ready()
            .map_err(|e| PadError::Connect(format!("target not ready: {}", e)))?;

        info!("Virtual Xbox 360 controller plugged in");
        Ok(Self {
            target,
            report: PadReport::default(),
        })
    }

    fn to_xgamepad(report: &PadReport) -> XGamepad {
        XGamepad {
            buttons: XButtons {
                raw: report.buttons,
            },
            left_trigger: PadReport::trigger_value(report.left_trigger),
            right_trigger: PadReport::trigger_value(report.right_trigger),
            thumb_lx: PadReport::thumb_value(report.left_stick.0),
            thumb_ly: PadReport::thumb_value(report.left_stick.1),
            thumb_rx: PadReport::thumb_value(report.right_stick.0),
            thumb_ry: PadReport::thumb_value(report.right_stick.1),
        }
    }
}

impl VirtualPad for ViGEmPad {
    fn set_stick(&mut self, stick: Stick, x: f32, y: f32) {
        self.report.set_stick(stick, x, y);
    }

    fn set_trigger(&mut self, trigger: Trigger, value: f32) {
        self.report.set_trigger(trigger, value);
    }

    fn press_button(&mut self, button: XButton) {
        self.report.press(button);
    }

    fn release_button(&mut self, button: XButton) {
        self.report.release(button);
    }

    fn flush(&mut self) -> Result<(), PadError> {
        let gamepad = Self::to_xgamepad(&self.report);
        self.target
            .update(&gamepad)
            .map_err(|e| PadError::Submit(e.to_string()))
    }

    fn reset(&mut self) {
        debug!("Resetting virtual pad report");
        self.report = PadReport::default();
    }
}

impl Drop for ViGEmPad {
    fn drop(&mut self) {
        if let Err(e) = self.target.unplug() {
            warn!("Failed to unplug virtual controller: {}", e);
        }
    }
}
