//! Virtual Xbox controller output
//!
//! Everything the mapping engine wants the game to see is expressed as a
//! [`PadCommand`]. One tick's worth of commands forms a [`PadFrame`], which is
//! applied to a [`VirtualPad`] and committed with a single flush so the game
//! never observes half a frame.
//!
//! ```text
//! MappingEngine ──► PadFrame ──► PadGuard ──► VirtualPad ──► ViGEmBus / trace log
//!                                   │
//!                              reset on exit
//! ```

pub mod guard;
pub mod report;
pub mod trace_pad;
#[cfg(windows)]
pub mod vigem;

pub use guard::PadGuard;
pub use report::PadReport;
pub use trace_pad::TracePad;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Analog sticks of the virtual pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stick {
    Left,
    Right,
}

/// Analog triggers of the virtual pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Left,
    Right,
}

/// Digital buttons of an XUSB (Xbox 360) controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XButton {
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Start,
    Back,
    LeftThumb,
    RightThumb,
    LeftShoulder,
    RightShoulder,
    Guide,
    A,
    B,
    X,
    Y,
}

impl XButton {
    pub const ALL: [XButton; 15] = [
        XButton::DPadUp,
        XButton::DPadDown,
        XButton::DPadLeft,
        XButton::DPadRight,
        XButton::Start,
        XButton::Back,
        XButton::LeftThumb,
        XButton::RightThumb,
        XButton::LeftShoulder,
        XButton::RightShoulder,
        XButton::Guide,
        XButton::A,
        XButton::B,
        XButton::X,
        XButton::Y,
    ];

    /// Bit of this button in the XUSB report `wButtons` field
    pub const fn mask(self) -> u16 {
        match self {
            XButton::DPadUp => 0x0001,
            XButton::DPadDown => 0x0002,
            XButton::DPadLeft => 0x0004,
            XButton::DPadRight => 0x0008,
            XButton::Start => 0x0010,
            XButton::Back => 0x0020,
            XButton::LeftThumb => 0x0040,
            XButton::RightThumb => 0x0080,
            XButton::LeftShoulder => 0x0100,
            XButton::RightShoulder => 0x0200,
            XButton::Guide => 0x0400,
            XButton::A => 0x1000,
            XButton::B => 0x2000,
            XButton::X => 0x4000,
            XButton::Y => 0x8000,
        }
    }

    /// Short name used after the `XUSB_GAMEPAD_` prefix
    pub const fn short_name(self) -> &'static str {
        match self {
            XButton::DPadUp => "DPAD_UP",
            XButton::DPadDown => "DPAD_DOWN",
            XButton::DPadLeft => "DPAD_LEFT",
            XButton::DPadRight => "DPAD_RIGHT",
            XButton::Start => "START",
            XButton::Back => "BACK",
            XButton::LeftThumb => "LEFT_THUMB",
            XButton::RightThumb => "RIGHT_THUMB",
            XButton::LeftShoulder => "LEFT_SHOULDER",
            XButton::RightShoulder => "RIGHT_SHOULDER",
            XButton::Guide => "GUIDE",
            XButton::A => "A",
            XButton::B => "B",
            XButton::X => "X",
            XButton::Y => "Y",
        }
    }
}

impl fmt::Display for XButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XUSB_GAMEPAD_{}", self.short_name())
    }
}

/// Error for a virtual button name that is not part of the XUSB set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown virtual button '{0}'")]
pub struct UnknownButton(pub String);

impl FromStr for XButton {
    type Err = UnknownButton;

    /// Accepts `XUSB_GAMEPAD_A` as well as the bare `A`, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let short = upper.strip_prefix("XUSB_GAMEPAD_").unwrap_or(&upper);
        XButton::ALL
            .iter()
            .copied()
            .find(|button| button.short_name() == short)
            .ok_or_else(|| UnknownButton(s.to_string()))
    }
}

/// A single primitive update for the virtual pad
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadCommand {
    Stick { stick: Stick, x: f32, y: f32 },
    Trigger { trigger: Trigger, value: f32 },
    Press(XButton),
    Release(XButton),
}

/// Ordered commands produced by one tick of the mapping engine
///
/// Later commands win over earlier ones touching the same control.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PadFrame {
    commands: Vec<PadCommand>,
}

impl PadFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stick(&mut self, stick: Stick, x: f32, y: f32) {
        self.commands.push(PadCommand::Stick { stick, x, y });
    }

    pub fn trigger(&mut self, trigger: Trigger, value: f32) {
        self.commands.push(PadCommand::Trigger { trigger, value });
    }

    pub fn press(&mut self, button: XButton) {
        self.commands.push(PadCommand::Press(button));
    }

    pub fn release(&mut self, button: XButton) {
        self.commands.push(PadCommand::Release(button));
    }

    pub fn set_button(&mut self, button: XButton, pressed: bool) {
        if pressed {
            self.press(button);
        } else {
            self.release(button);
        }
    }

    pub fn extend(&mut self, other: PadFrame) {
        self.commands.extend(other.commands);
    }

    pub fn commands(&self) -> &[PadCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Folds the frame into a report, which is what the game would end up seeing
    pub fn resolve(&self, base: &PadReport) -> PadReport {
        let mut report = base.clone();
        for command in &self.commands {
            report.apply(command);
        }
        report
    }
}

/// Errors raised by a virtual pad sink
#[derive(Debug, Error)]
pub enum PadError {
    #[error("Failed to connect to virtual pad bus: {0}")]
    Connect(String),

    #[error("Failed to submit pad report: {0}")]
    Submit(String),
}

/// Output sink accepting normalized pad updates
///
/// Implementations buffer updates until [`VirtualPad::flush`] is called.
pub trait VirtualPad {
    fn set_stick(&mut self, stick: Stick, x: f32, y: f32);

    /// `value` is in `[0, 1]`
    fn set_trigger(&mut self, trigger: Trigger, value: f32);

    fn press_button(&mut self, button: XButton);

    fn release_button(&mut self, button: XButton);

    /// Submits all buffered updates as one report
    fn flush(&mut self) -> Result<(), PadError>;

    /// Returns every control to neutral; takes effect on the next flush
    fn reset(&mut self);

    fn apply(&mut self, command: &PadCommand) {
        match *command {
            PadCommand::Stick { stick, x, y } => self.set_stick(stick, x, y),
            PadCommand::Trigger { trigger, value } => self.set_trigger(trigger, value),
            PadCommand::Press(button) => self.press_button(button),
            PadCommand::Release(button) => self.release_button(button),
        }
    }

    /// Applies a whole frame and flushes once
    fn commit(&mut self, frame: &PadFrame) -> Result<(), PadError> {
        for command in frame.commands() {
            self.apply(command);
        }
        self.flush()
    }
}

impl<P: VirtualPad + ?Sized> VirtualPad for Box<P> {
    fn set_stick(&mut self, stick: Stick, x: f32, y: f32) {
        (**self).set_stick(stick, x, y)
    }

    fn set_trigger(&mut self, trigger: Trigger, value: f32) {
        (**self).set_trigger(trigger, value)
    }

    fn press_button(&mut self, button: XButton) {
        (**self).press_button(button)
    }

    fn release_button(&mut self, button: XButton) {
        (**self).release_button(button)
    }

    fn flush(&mut self) -> Result<(), PadError> {
        (**self).flush()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_and_short_button_names() {
        assert_eq!("XUSB_GAMEPAD_A".parse::<XButton>(), Ok(XButton::A));
        assert_eq!(
            "xusb_gamepad_left_shoulder".parse::<XButton>(),
            Ok(XButton::LeftShoulder)
        );
        assert_eq!("RIGHT_THUMB".parse::<XButton>(), Ok(XButton::RightThumb));
        assert!("XUSB_GAMEPAD_TURBO".parse::<XButton>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for button in XButton::ALL {
            assert_eq!(button.to_string().parse::<XButton>(), Ok(button));
        }
    }

    #[test]
    fn masks_match_xusb_layout() {
        assert_eq!(XButton::A.mask(), 0x1000);
        assert_eq!(XButton::Start.mask(), 0x0010);
        assert_eq!(XButton::RightShoulder.mask(), 0x0200);
        let all = XButton::ALL.iter().fold(0u16, |acc, b| acc | b.mask());
        assert_eq!(all.count_ones(), 15);
    }

    #[test]
    fn later_commands_win_when_resolving() {
        let mut frame = PadFrame::new();
        frame.press(XButton::A);
        frame.trigger(Trigger::Left, 0.4);
        frame.release(XButton::A);
        frame.trigger(Trigger::Left, 1.0);

        let report = frame.resolve(&PadReport::default());
        assert!(!report.is_pressed(XButton::A));
        assert_eq!(report.left_trigger, 1.0);
    }
}
