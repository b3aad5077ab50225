//! Normalized controls to pad sticks, triggers and rudder buttons

use super::bindings::RuntimeControlState;
use super::normalizer::{ControlValues, HAT_X, HAT_Y};
use crate::pad::{PadFrame, Stick, Trigger, XButton};

/// Yaw beyond this magnitude holds a shoulder button
pub const RUDDER_THRESHOLD: f32 = 0.3;

pub const ROLL: &str = "roll";
pub const PITCH: &str = "pitch";
pub const YAW: &str = "yaw";
pub const THROTTLE: &str = "throttle";

/// Builds the axis part of a frame
///
/// Disabled stick axes read as 0. A disabled yaw or throttle emits nothing at
/// all, leaving the buttons and triggers to whatever else drives them.
pub fn translate(controls: &ControlValues, state: &RuntimeControlState) -> PadFrame {
    let read = |name: &str| {
        if state.is_disabled(name) {
            0.0
        } else {
            controls.get(name)
        }
    };

    let mut frame = PadFrame::new();
    frame.stick(Stick::Left, read(ROLL), -read(PITCH));
    frame.stick(Stick::Right, read(HAT_X), read(HAT_Y));

    if !state.is_disabled(YAW) {
        rudder(controls.get(YAW), &mut frame);
    }
    if !state.is_disabled(THROTTLE) {
        throttle(controls.get(THROTTLE), &mut frame);
    }
    frame
}

/// Emulates a rudder with the shoulder buttons
pub fn rudder(yaw: f32, frame: &mut PadFrame) {
    if yaw > RUDDER_THRESHOLD {
        frame.press(XButton::RightShoulder);
        frame.release(XButton::LeftShoulder);
    } else if yaw < -RUDDER_THRESHOLD {
        frame.press(XButton::LeftShoulder);
        frame.release(XButton::RightShoulder);
    } else {
        frame.release(XButton::LeftShoulder);
        frame.release(XButton::RightShoulder);
    }
}

/// Splits the throttle across the triggers: forward on the left, back on the right
pub fn throttle(value: f32, frame: &mut PadFrame) {
    if value < 0.0 {
        frame.trigger(Trigger::Right, value.abs());
        frame.trigger(Trigger::Left, 0.0);
    } else if value > 0.0 {
        frame.trigger(Trigger::Left, value);
        frame.trigger(Trigger::Right, 0.0);
    } else {
        frame.trigger(Trigger::Left, 0.0);
        frame.trigger(Trigger::Right, 0.0);
    }
}
