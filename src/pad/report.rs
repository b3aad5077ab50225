//! In-memory XUSB report shared by the pad sinks

use super::{PadCommand, Stick, Trigger, XButton};

/// Current state of every control on the virtual pad
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PadReport {
    pub buttons: u16,
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub left_stick: (f32, f32),
    pub right_stick: (f32, f32),
}

impl PadReport {
    pub fn apply(&mut self, command: &PadCommand) {
        match *command {
            PadCommand::Stick { stick, x, y } => self.set_stick(stick, x, y),
            PadCommand::Trigger { trigger, value } => self.set_trigger(trigger, value),
            PadCommand::Press(button) => self.press(button),
            PadCommand::Release(button) => self.release(button),
        }
    }

    pub fn set_stick(&mut self, stick: Stick, x: f32, y: f32) {
        let pos = (x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0));
        match stick {
            Stick::Left => self.left_stick = pos,
            Stick::Right => self.right_stick = pos,
        }
    }

    pub fn set_trigger(&mut self, trigger: Trigger, value: f32) {
        let value = value.clamp(0.0, 1.0);
        match trigger {
            Trigger::Left => self.left_trigger = value,
            Trigger::Right => self.right_trigger = value,
        }
    }

    pub fn press(&mut self, button: XButton) {
        self.buttons |= button.mask();
    }

    pub fn release(&mut self, button: XButton) {
        self.buttons &= !button.mask();
    }

    pub fn is_pressed(&self, button: XButton) -> bool {
        self.buttons & button.mask() != 0
    }

    pub fn pressed_buttons(&self) -> Vec<XButton> {
        XButton::ALL
            .iter()
            .copied()
            .filter(|b| self.is_pressed(*b))
            .collect()
    }

    pub fn is_neutral(&self) -> bool {
        *self == PadReport::default()
    }

    /// Stick axis as the signed 16-bit value of the XUSB report
    pub fn thumb_value(value: f32) -> i16 {
        (value.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
    }

    /// Trigger as the unsigned 8-bit value of the XUSB report
    pub fn trigger_value(value: f32) -> u8 {
        (value.clamp(0.0, 1.0) * u8::MAX as f32).round() as u8
    }
}
