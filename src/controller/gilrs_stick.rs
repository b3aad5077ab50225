use super::{HatPosition, InputError, StickSource};
use gilrs::ev::Code;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use std::collections::HashMap;
use tracing::{error, info, warn};

// Axes and buttons gilrs knows by name. Unnamed ones (extra flight stick axes)
// only show up in the gamepad state after their first event.
const KNOWN_AXES: [Axis; 6] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::LeftZ,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::RightZ,
];

const KNOWN_BUTTONS: [Button; 15] = [
    Button::South,
    Button::East,
    Button::North,
    Button::West,
    Button::LeftTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
    Button::C,
    Button::Z,
];

/// Native codes in the order they were first seen
///
/// An index never moves once handed out, so calibrated axis and button
/// numbers stay valid when a control shows up late.
#[derive(Debug)]
struct CodeIndex<C> {
    codes: Vec<C>,
    positions: HashMap<u32, usize>,
}

impl<C> Default for CodeIndex<C> {
    fn default() -> Self {
        Self {
            codes: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<C> CodeIndex<C> {
    /// Returns the new index, or `None` if `raw` was already known
    fn register(&mut self, raw: u32, code: C) -> Option<usize> {
        if self.positions.contains_key(&raw) {
            return None;
        }
        let index = self.codes.len();
        self.codes.push(code);
        self.positions.insert(raw, index);
        Some(index)
    }

    fn get(&self, index: usize) -> Option<&C> {
        self.codes.get(index)
    }

    fn len(&self) -> usize {
        self.codes.len()
    }
}

/// Flight stick read through gilrs
///
/// Raw axes and buttons are addressed by index. Controls present at open are
/// numbered in ascending native code order, which matches the order the OS
/// reports them in; controls that first appear later are appended. Hat
/// switches surface as the D-pad in gilrs and are kept out of the axis list.
pub struct GilrsStick {
    gilrs: Gilrs,
    id: GamepadId,
    name: String,
    axis_codes: CodeIndex<Code>,
    button_codes: CodeIndex<Code>,
    hat_codes: Vec<u32>,
    has_hat: bool,
    connected: bool,
}

impl GilrsStick {
    /// Opens the first connected device
    pub fn open() -> Result<Self, InputError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(InputError::Backend(e.to_string()));
            }
        };

        let (id, name) = {
            let gamepads: Vec<(GamepadId, Gamepad<'_>)> = gilrs.gamepads().collect();
            if gamepads.is_empty() {
                return Err(InputError::DeviceUnavailable(
                    "no joystick detected".to_string(),
                ));
            }

            info!("Found {} input devices:", gamepads.len());
            for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
                info!(
                    "  [{}] ID: {}, Name: {}, UUID: {:?}",
                    idx,
                    id,
                    gamepad.name(),
                    gamepad.uuid()
                );
            }

            let (id, gamepad) = &gamepads[0];
            (*id, gamepad.name().to_string())
        };
        info!("Selected device: {} ({})", name, id);

        let mut stick = Self {
            gilrs,
            id,
            name,
            axis_codes: CodeIndex::default(),
            button_codes: CodeIndex::default(),
            hat_codes: Vec::new(),
            has_hat: false,
            connected: true,
        };
        stick.discover_controls();
        info!(
            "Device exposes {} axes, {} buttons, {} hats",
            stick.axis_count(),
            stick.button_count(),
            stick.hat_count()
        );
        Ok(stick)
    }

    fn discover_controls(&mut self) {
        let gamepad = self.gilrs.gamepad(self.id);

        self.hat_codes = [Axis::DPadX, Axis::DPadY]
            .iter()
            .filter_map(|axis| gamepad.axis_code(*axis))
            .map(|code| code.into_u32())
            .collect();
        self.has_hat = !self.hat_codes.is_empty() || gamepad.button_code(Button::DPadUp).is_some();

        let mut axes: Vec<Code> = KNOWN_AXES
            .iter()
            .filter_map(|axis| gamepad.axis_code(*axis))
            .collect();
        axes.extend(gamepad.state().axes().map(|(code, _)| code));

        let mut buttons: Vec<Code> = KNOWN_BUTTONS
            .iter()
            .filter_map(|button| gamepad.button_code(*button))
            .collect();
        buttons.extend(gamepad.state().buttons().map(|(code, _)| code));

        axes.sort_by_key(|code| code.into_u32());
        buttons.sort_by_key(|code| code.into_u32());
        for code in axes {
            self.register_axis(code);
        }
        for code in buttons {
            self.register_button(code);
        }
    }

    fn register_axis(&mut self, code: Code) {
        let raw = code.into_u32();
        if self.hat_codes.contains(&raw) {
            return;
        }
        if let Some(index) = self.axis_codes.register(raw, code) {
            info!("Registered axis code {} as index {}", raw, index);
        }
    }

    fn register_button(&mut self, code: Code) {
        let raw = code.into_u32();
        if let Some(index) = self.button_codes.register(raw, code) {
            info!("Registered button code {} as index {}", raw, index);
        }
    }

    fn gamepad(&self) -> Option<Gamepad<'_>> {
        self.gilrs.connected_gamepad(self.id)
    }
}

impl StickSource for GilrsStick {
    fn pump(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if id != self.id {
                continue;
            }
            match event {
                EventType::AxisChanged(_, _, code) => self.register_axis(code),
                EventType::ButtonChanged(_, _, code) => self.register_button(code),
                EventType::Disconnected => {
                    warn!("Input device disconnected: {}", self.name);
                    self.connected = false;
                }
                EventType::Connected => {
                    info!("Input device reconnected: {}", self.name);
                    self.connected = true;
                }
                _ => {}
            }
        }
    }

    fn axis_count(&self) -> usize {
        self.axis_codes.len()
    }

    fn button_count(&self) -> usize {
        self.button_codes.len()
    }

    fn hat_count(&self) -> usize {
        usize::from(self.has_hat)
    }

    fn read_axis(&self, index: usize) -> Result<f32, InputError> {
        let code = self
            .axis_codes
            .get(index)
            .copied()
            .ok_or(InputError::AxisOutOfRange {
                index,
                count: self.axis_codes.len(),
            })?;

        let gamepad = self.gamepad().ok_or_else(|| InputError::AxisRead {
            index,
            reason: "device disconnected".to_string(),
        })?;

        Ok(gamepad
            .state()
            .axis_data(code)
            .map(|data| data.value())
            .unwrap_or(0.0))
    }

    fn read_button(&self, index: usize) -> bool {
        let Some(code) = self.button_codes.get(index) else {
            return false;
        };
        self.gamepad()
            .map(|gamepad| gamepad.state().is_pressed(*code))
            .unwrap_or(false)
    }

    fn read_hat(&self, index: usize) -> HatPosition {
        if index > 0 || !self.has_hat || !self.connected {
            return (0, 0);
        }
        let Some(gamepad) = self.gamepad() else {
            return (0, 0);
        };

        let x = i8::from(gamepad.is_pressed(Button::DPadRight))
            - i8::from(gamepad.is_pressed(Button::DPadLeft));
        let y = i8::from(gamepad.is_pressed(Button::DPadUp))
            - i8::from(gamepad.is_pressed(Button::DPadDown));
        (x, y)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_codes_are_appended() {
        let mut index = CodeIndex::default();
        assert_eq!(index.register(8, "rudder"), Some(0));
        assert_eq!(index.register(2, "x"), Some(1));
        assert_eq!(index.register(8, "rudder"), None);

        // a lower code showing up later does not shift earlier indices
        assert_eq!(index.register(6, "throttle"), Some(2));
        assert_eq!(index.get(0), Some(&"rudder"));
        assert_eq!(index.get(1), Some(&"x"));
        assert_eq!(index.get(2), Some(&"throttle"));
        assert_eq!(index.get(3), None);
        assert_eq!(index.len(), 3);
    }
}
