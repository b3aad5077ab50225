//! Persisted configuration document
//!
//! Mirrors the TOML file one to one and is what the calibration tool edits and
//! saves. Nothing here is validated; [`super::ControllerConfig`] is built from
//! it at load time.
//!
//! ```toml
//! [axes.x]
//! deadzone = 0.1
//! sensitivity = 1.0
//!
//! [axis_mapping]
//! x = 0
//! roll = { source = "x", scale = 1.0 }
//!
//! [bindings.standard.fire_missile]
//! button = 0
//! xusb = "XUSB_GAMEPAD_B"
//!
//! [bindings.combos.high_g_turn]
//! trigger = 4
//! xusb = []
//! disable_axes = ["throttle"]
//! analog = true
//!
//! [kill_switch]
//! key = "f12"
//! ```

use super::ordered;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Deadzone and gain of one raw axis
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct AxisSetting {
    /// Fraction of travel around centre treated as no input, `[0, 1)`
    pub deadzone: f32,
    /// Linear gain applied after the deadzone, `> 0`
    pub sensitivity: f32,
}

impl AxisSetting {
    pub const fn new(deadzone: f32, sensitivity: f32) -> Self {
        Self {
            deadzone,
            sensitivity,
        }
    }
}

impl Default for AxisSetting {
    fn default() -> Self {
        Self::new(0.1, 1.0)
    }
}

/// Entry of the `axis_mapping` table
///
/// A bare integer binds a raw axis name to a device axis index. A table
/// defines a control as a scaled copy of a named raw axis.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum AxisMapping {
    Direct(u32),
    Named {
        source: String,
        #[serde(default = "unit_scale")]
        scale: f32,
    },
}

fn unit_scale() -> f32 {
    1.0
}

/// Table entry that survives having fields of the wrong type
///
/// A malformed entry keeps its raw TOML, so saving the document writes it
/// back untouched and validation can skip just that entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry<T> {
    Parsed(T),
    Malformed { raw: toml::Value, reason: String },
}

impl<T> Entry<T> {
    pub fn parsed(&self) -> Option<&T> {
        match self {
            Entry::Parsed(entry) => Some(entry),
            Entry::Malformed { .. } => None,
        }
    }

    pub fn parsed_mut(&mut self) -> Option<&mut T> {
        match self {
            Entry::Parsed(entry) => Some(entry),
            Entry::Malformed { .. } => None,
        }
    }
}

impl<T> From<T> for Entry<T> {
    fn from(entry: T) -> Self {
        Entry::Parsed(entry)
    }
}

impl<T: Default> Default for Entry<T> {
    fn default() -> Self {
        Entry::Parsed(T::default())
    }
}

impl<T: Serialize> Serialize for Entry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Entry::Parsed(entry) => entry.serialize(serializer),
            Entry::Malformed { raw, .. } => raw.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Entry<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = toml::Value::deserialize(deserializer)?;
        Ok(match raw.clone().try_into::<T>() {
            Ok(entry) => Entry::Parsed(entry),
            Err(e) => Entry::Malformed {
                raw,
                reason: e.message().to_string(),
            },
        })
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct StandardBindingDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xusb: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ComboDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<i64>,
    pub xusb: Vec<String>,
    pub disable_axes: Vec<String>,
    pub analog: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct BindingsDocument {
    #[serde(with = "ordered")]
    pub standard: Vec<(String, Entry<StandardBindingDocument>)>,
    #[serde(with = "ordered")]
    pub combos: Vec<(String, Entry<ComboDocument>)>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct KillSwitchDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<i64>,
}

/// Root of the config file
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ConfigDocument {
    #[serde(with = "ordered")]
    pub axes: Vec<(String, AxisSetting)>,
    #[serde(with = "ordered")]
    pub axis_mapping: Vec<(String, AxisMapping)>,
    pub bindings: BindingsDocument,
    pub kill_switch: Entry<KillSwitchDocument>,
}

impl ConfigDocument {
    /// Configuration used when no config file exists
    ///
    /// Assumes the common flight stick layout: X, Y, twist and throttle on
    /// the first four device axes.
    pub fn builtin() -> Self {
        let axes = vec![
            ("x".to_string(), AxisSetting::new(0.1, 1.0)),
            ("y".to_string(), AxisSetting::new(0.1, 1.0)),
            ("twist".to_string(), AxisSetting::new(0.2, 1.2)),
            ("throttle".to_string(), AxisSetting::new(0.05, 1.0)),
        ];

        let named = |source: &str| AxisMapping::Named {
            source: source.to_string(),
            scale: 1.0,
        };
        let axis_mapping = vec![
            ("x".to_string(), AxisMapping::Direct(0)),
            ("y".to_string(), AxisMapping::Direct(1)),
            ("twist".to_string(), AxisMapping::Direct(2)),
            ("throttle".to_string(), AxisMapping::Direct(3)),
            ("roll".to_string(), named("x")),
            ("pitch".to_string(), named("y")),
            ("yaw".to_string(), named("twist")),
        ];

        let standard_binding = |button: i64, xusb: &str| {
            Entry::Parsed(StandardBindingDocument {
                button: Some(button),
                xusb: Some(xusb.to_string()),
            })
        };
        let standard = vec![
            ("fire_missile".to_string(), standard_binding(0, "XUSB_GAMEPAD_B")),
            ("fire_gun".to_string(), standard_binding(1, "XUSB_GAMEPAD_A")),
            ("switch_weapon".to_string(), standard_binding(2, "XUSB_GAMEPAD_X")),
            ("switch_target".to_string(), standard_binding(3, "XUSB_GAMEPAD_Y")),
            ("pause".to_string(), standard_binding(6, "XUSB_GAMEPAD_START")),
            ("map".to_string(), standard_binding(7, "XUSB_GAMEPAD_BACK")),
        ];

        let combos = vec![
            (
                "high_g_turn".to_string(),
                Entry::Parsed(ComboDocument {
                    trigger: Some(4),
                    xusb: Vec::new(),
                    disable_axes: vec!["throttle".to_string()],
                    analog: true,
                }),
            ),
            // idle combos release their buttons every tick, so nothing here
            // may share a button with the rudder or a standard binding
            (
                "flares".to_string(),
                Entry::Parsed(ComboDocument {
                    trigger: Some(5),
                    xusb: vec![
                        "XUSB_GAMEPAD_LEFT_THUMB".to_string(),
                        "XUSB_GAMEPAD_RIGHT_THUMB".to_string(),
                    ],
                    disable_axes: Vec::new(),
                    analog: false,
                }),
            ),
        ];

        Self {
            axes,
            axis_mapping,
            bindings: BindingsDocument { standard, combos },
            kill_switch: Entry::Parsed(KillSwitchDocument {
                key: Some("f12".to_string()),
                button: None,
            }),
        }
    }

    pub fn axis_setting(&self, name: &str) -> Option<&AxisSetting> {
        self.axes.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn axis_mapping(&self, name: &str) -> Option<&AxisMapping> {
        self.axis_mapping
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    /// Inserts or replaces an `axis_mapping` entry, keeping its position
    pub fn set_axis_mapping(&mut self, name: &str, mapping: AxisMapping) {
        match self.axis_mapping.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = mapping,
            None => self.axis_mapping.push((name.to_string(), mapping)),
        }
    }

    /// Adds a default `axes` entry unless one exists
    pub fn ensure_axis(&mut self, name: &str) {
        if self.axis_setting(name).is_none() {
            self.axes.push((name.to_string(), AxisSetting::default()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_axis_mapping() {
        let doc: ConfigDocument = toml::from_str(
            r#"
            [axis_mapping]
            x = 0
            roll = { source = "x", scale = -0.5 }
            pitch = { source = "y" }
            "#,
        )
        .unwrap();

        assert_eq!(doc.axis_mapping("x"), Some(&AxisMapping::Direct(0)));
        assert_eq!(
            doc.axis_mapping("roll"),
            Some(&AxisMapping::Named {
                source: "x".to_string(),
                scale: -0.5
            })
        );
        assert_eq!(
            doc.axis_mapping("pitch"),
            Some(&AxisMapping::Named {
                source: "y".to_string(),
                scale: 1.0
            })
        );
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let doc: ConfigDocument = toml::from_str("[kill_switch]\nbutton = 9\n").unwrap();
        assert!(doc.axes.is_empty());
        assert!(doc.bindings.combos.is_empty());
        let kill = doc.kill_switch.parsed().unwrap();
        assert_eq!(kill.button, Some(9));
        assert_eq!(kill.key, None);
    }

    #[test]
    fn wrongly_typed_entry_is_kept_raw() {
        let text = r#"
            [bindings.standard.bad]
            button = "3"
            xusb = "XUSB_GAMEPAD_A"

            [bindings.standard.good]
            button = 1
            xusb = "XUSB_GAMEPAD_B"

            [bindings.combos.half]
            trigger = 1.5
        "#;
        let doc: ConfigDocument = toml::from_str(text).unwrap();

        let (name, bad) = &doc.bindings.standard[0];
        assert_eq!(name, "bad");
        match bad {
            Entry::Malformed { raw, reason } => {
                assert_eq!(raw.get("button"), Some(&toml::Value::from("3")));
                assert!(reason.contains("invalid type"), "{reason}");
            }
            Entry::Parsed(_) => panic!("string button was accepted"),
        }
        assert_eq!(
            doc.bindings.standard[1].1.parsed().unwrap().button,
            Some(1)
        );
        assert!(doc.bindings.combos[0].1.parsed().is_none());

        // saving writes the broken entry back as it was
        let saved = toml::to_string_pretty(&doc).unwrap();
        let reloaded: ConfigDocument = toml::from_str(&saved).unwrap();
        assert_eq!(reloaded, doc);
    }

    #[test]
    fn integer_settings_are_accepted_as_floats() {
        let doc: ConfigDocument =
            toml::from_str("[axes.throttle]\ndeadzone = 0\nsensitivity = 1\n").unwrap();
        assert_eq!(doc.axis_setting("throttle"), Some(&AxisSetting::new(0.0, 1.0)));
    }

    #[test]
    fn builtin_survives_save_and_reload() {
        let doc = ConfigDocument::builtin();
        let text = toml::to_string_pretty(&doc).unwrap();
        let reloaded: ConfigDocument = toml::from_str(&text).unwrap();
        assert_eq!(reloaded, doc);
    }

    #[test]
    fn set_axis_mapping_replaces_in_place() {
        let mut doc = ConfigDocument::builtin();
        doc.set_axis_mapping("y", AxisMapping::Direct(5));
        doc.set_axis_mapping("rudder", AxisMapping::Direct(6));

        assert_eq!(doc.axis_mapping[1], ("y".to_string(), AxisMapping::Direct(5)));
        assert_eq!(doc.axis_mapping.last().unwrap().0, "rudder");
    }
}
