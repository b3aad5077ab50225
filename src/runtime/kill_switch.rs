//! Keyboard kill switch
//!
//! A dedicated thread polls the keyboard and trips the shared [`StopSignal`]
//! as soon as the configured key is down, independently of the tick loop.

use super::{StopReason, StopSignal};
use std::fmt;
use std::str::FromStr;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Keyboard poll interval of the watcher thread
pub const KEY_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Key that stops the mapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KillKey {
    /// Letter or digit, stored lowercase
    Char(char),
    /// Function key `F1`..=`F12`
    F(u8),
    Escape,
    Space,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDown,
    Backspace,
    Tab,
    Enter,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown key name: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for KillKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();

        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphanumeric() {
                return Ok(KillKey::Char(c));
            }
        }

        if let Some(n) = name.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            if (1..=12).contains(&n) {
                return Ok(KillKey::F(n));
            }
        }

        let key = match name.as_str() {
            "esc" | "escape" => KillKey::Escape,
            "space" => KillKey::Space,
            "home" => KillKey::Home,
            "end" => KillKey::End,
            "insert" | "ins" => KillKey::Insert,
            "delete" | "del" => KillKey::Delete,
            "pageup" | "page_up" | "pgup" => KillKey::PageUp,
            "pagedown" | "page_down" | "pgdn" => KillKey::PageDown,
            "backspace" => KillKey::Backspace,
            "tab" => KillKey::Tab,
            "enter" | "return" => KillKey::Enter,
            _ => return Err(UnknownKey(s.to_string())),
        };
        Ok(key)
    }
}

impl fmt::Display for KillKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KillKey::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            KillKey::F(n) => write!(f, "F{n}"),
            KillKey::Escape => f.write_str("Escape"),
            KillKey::Space => f.write_str("Space"),
            KillKey::Home => f.write_str("Home"),
            KillKey::End => f.write_str("End"),
            KillKey::Insert => f.write_str("Insert"),
            KillKey::Delete => f.write_str("Delete"),
            KillKey::PageUp => f.write_str("PageUp"),
            KillKey::PageDown => f.write_str("PageDown"),
            KillKey::Backspace => f.write_str("Backspace"),
            KillKey::Tab => f.write_str("Tab"),
            KillKey::Enter => f.write_str("Enter"),
        }
    }
}

/// Source of live keyboard state
pub trait KeyProbe {
    fn is_pressed(&mut self, key: KillKey) -> bool;
}

impl<P: KeyProbe + ?Sized> KeyProbe for Box<P> {
    fn is_pressed(&mut self, key: KillKey) -> bool {
        (**self).is_pressed(key)
    }
}

/// Probe for platforms without global keyboard access; never reports a key
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKeyboard;

impl KeyProbe for NoKeyboard {
    fn is_pressed(&mut self, _key: KillKey) -> bool {
        false
    }
}

/// Whether global key state can be read; Linux needs an X display
pub fn keyboard_available() -> bool {
    if cfg!(target_os = "linux") {
        std::env::var_os("DISPLAY").is_some()
    } else {
        true
    }
}

/// Keyboard probe for the current platform
pub fn platform_probe() -> Box<dyn KeyProbe> {
    match DeviceQueryProbe::new() {
        Some(probe) => Box::new(probe),
        None => {
            warn!("Keyboard state is not readable, key presses are ignored");
            Box::new(NoKeyboard)
        }
    }
}

/// Background thread watching for the kill key
pub struct KillKeyWatcher {
    handle: Option<JoinHandle<()>>,
    signal: StopSignal,
}

impl KillKeyWatcher {
    /// Starts the watcher. The probe is built on the watcher thread, so it
    /// does not have to be `Send`.
    pub fn spawn<F, P>(key: KillKey, make_probe: F, signal: StopSignal) -> std::io::Result<Self>
    where
        F: FnOnce() -> P + Send + 'static,
        P: KeyProbe,
    {
        let thread_signal = signal.clone();
        let handle = thread::Builder::new()
            .name("kill-key".to_string())
            .spawn(move || {
                let mut probe = make_probe();
                debug!("Kill key watcher polling for {}", key);
                while !thread_signal.is_triggered() {
                    if probe.is_pressed(key) {
                        info!("Kill key {} pressed", key);
                        thread_signal.trigger(StopReason::KillKey);
                        break;
                    }
                    thread::sleep(KEY_POLL_INTERVAL);
                }
                debug!("Kill key watcher stopped");
            })?;

        Ok(Self {
            handle: Some(handle),
            signal,
        })
    }

    /// Waits for the thread to exit; only returns once the signal has tripped
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for KillKeyWatcher {
    fn drop(&mut self) {
        // Unblock the thread so it does not outlive the runtime
        if self.handle.is_some() && !self.signal.is_triggered() {
            self.signal.trigger(StopReason::Shutdown);
        }
    }
}

/// Keyboard state read through `device_query`
pub struct DeviceQueryProbe {
    state: device_query::DeviceState,
}

impl DeviceQueryProbe {
    /// `None` when no X display can be opened
    pub fn new() -> Option<Self> {
        #[cfg(target_os = "linux")]
        let state = device_query::DeviceState::checked_new()?;
        #[cfg(not(target_os = "linux"))]
        let state = device_query::DeviceState::new();
        Some(Self { state })
    }

    fn keycode(key: KillKey) -> Option<device_query::Keycode> {
        use device_query::Keycode;

        let code = match key {
            KillKey::Char(c) => match c {
                'a' => Keycode::A,
                'b' => Keycode::B,
                'c' => Keycode::C,
                'd' => Keycode::D,
                'e' => Keycode::E,
                'f' => Keycode::F,
                'g' => Keycode::G,
                'h' => Keycode::H,
                'i' => Keycode::I,
                'j' => Keycode::J,
                'k' => Keycode::K,
                'l' => Keycode::L,
                'm' => Keycode::M,
                'n' => Keycode::N,
                'o' => Keycode::O,
                'p' => Keycode::P,
                'q' => Keycode::Q,
                'r' => Keycode::R,
                's' => Keycode::S,
                't' => Keycode::T,
                'u' => Keycode::U,
                'v' => Keycode::V,
                'w' => Keycode::W,
                'x' => Keycode::X,
                'y' => Keycode::Y,
                'z' => Keycode::Z,
                '0' => Keycode::Key0,
                '1' => Keycode::Key1,
                '2' => Keycode::Key2,
                '3' => Keycode::Key3,
                '4' => Keycode::Key4,
                '5' => Keycode::Key5,
                '6' => Keycode::Key6,
                '7' => Keycode::Key7,
                '8' => Keycode::Key8,
                '9' => Keycode::Key9,
                _ => return None,
            },
            KillKey::F(n) => match n {
                1 => Keycode::F1,
                2 => Keycode::F2,
                3 => Keycode::F3,
                4 => Keycode::F4,
                5 => Keycode::F5,
                6 => Keycode::F6,
                7 => Keycode::F7,
                8 => Keycode::F8,
                9 => Keycode::F9,
                10 => Keycode::F10,
                11 => Keycode::F11,
                12 => Keycode::F12,
                _ => return None,
            },
            KillKey::Escape => Keycode::Escape,
            KillKey::Space => Keycode::Space,
            KillKey::Home => Keycode::Home,
            KillKey::End => Keycode::End,
            KillKey::Insert => Keycode::Insert,
            KillKey::Delete => Keycode::Delete,
            KillKey::PageUp => Keycode::PageUp,
            KillKey::PageDown => Keycode::PageDown,
            KillKey::Backspace => Keycode::Backspace,
            KillKey::Tab => Keycode::Tab,
            KillKey::Enter => Keycode::Enter,
        };
        Some(code)
    }
}

impl KeyProbe for DeviceQueryProbe {
    fn is_pressed(&mut self, key: KillKey) -> bool {
        use device_query::DeviceQuery;

        match Self::keycode(key) {
            Some(code) => self.state.get_keys().contains(&code),
            None => false,
        }
    }
}
