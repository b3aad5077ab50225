//! Configuration model
//!
//! The TOML file is read into a [`ConfigDocument`] and then validated once
//! into a [`ControllerConfig`], which is what the mapping pipeline runs on.
//! Validation never fails as a whole: a broken binding or combo is dropped
//! and reported as a [`ConfigWarning`], everything else keeps working.

mod document;
pub mod ordered;
mod store;

pub use document::{
    AxisMapping, AxisSetting, BindingsDocument, ComboDocument, ConfigDocument, Entry,
    KillSwitchDocument, StandardBindingDocument,
};
pub use store::{ConfigStore, DEFAULT_CONFIG_PATH};

use crate::pad::XButton;
use crate::runtime::kill_switch::KillKey;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Prefix of raw axis names fed from the hat instead of a device axis
pub const HAT_AXIS_PREFIX: &str = "hat_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Problem with a single config entry; the entry is skipped or kept as noted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigWarning {
    #[error("{entry}: no physical button assigned, entry skipped")]
    Unassigned { entry: String },

    #[error("{entry}: {reason}, entry skipped")]
    MalformedEntry { entry: String, reason: String },

    #[error("{entry}: invalid button index {index}, entry skipped")]
    InvalidButton { entry: String, index: i64 },

    #[error("{entry}: no virtual button given, entry skipped")]
    MissingVirtualButton { entry: String },

    #[error("{entry}: unknown virtual button '{name}', entry skipped")]
    UnknownVirtualButton { entry: String, name: String },

    #[error("kill_switch: unknown key '{0}', keyboard kill switch disabled")]
    UnknownKillKey(String),

    #[error("axes.{axis}: deadzone {deadzone} collapses every reading to 0")]
    DegenerateDeadzone { axis: String, deadzone: f32 },

    #[error("axes.{axis}: sensitivity {sensitivity} is not positive")]
    NonPositiveSensitivity { axis: String, sensitivity: f32 },

    #[error("axes.{axis}: no device index in axis_mapping, axis ignored")]
    MissingAxisIndex { axis: String },
}

/// Raw axis read from a device index
#[derive(Debug, Clone, PartialEq)]
pub struct RawAxis {
    pub name: String,
    pub index: usize,
    pub setting: AxisSetting,
}

/// Control defined as a scaled copy of a raw axis
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMapping {
    pub name: String,
    pub source: String,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardBinding {
    pub name: String,
    pub button: u32,
    pub target: XButton,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combo {
    pub name: String,
    pub trigger: u32,
    pub buttons: Vec<XButton>,
    pub disable_axes: Vec<String>,
    pub analog: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KillSwitch {
    pub key: Option<KillKey>,
    pub button: Option<u32>,
}

impl KillSwitch {
    pub fn is_configured(&self) -> bool {
        self.key.is_some() || self.button.is_some()
    }
}

/// Validated configuration, read-only after load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerConfig {
    pub raw_axes: Vec<RawAxis>,
    pub controls: Vec<ControlMapping>,
    pub standard: Vec<StandardBinding>,
    pub combos: Vec<Combo>,
    pub kill_switch: KillSwitch,
}

impl ControllerConfig {
    pub fn from_document(document: &ConfigDocument) -> (Self, Vec<ConfigWarning>) {
        let mut warnings = Vec::new();
        let mut config = Self::default();

        for (name, setting) in &document.axes {
            if name.starts_with(HAT_AXIS_PREFIX) {
                continue;
            }
            if setting.deadzone >= 1.0 || !setting.deadzone.is_finite() {
                warnings.push(ConfigWarning::DegenerateDeadzone {
                    axis: name.clone(),
                    deadzone: setting.deadzone,
                });
            }
            if setting.sensitivity <= 0.0 || setting.sensitivity.is_nan() {
                warnings.push(ConfigWarning::NonPositiveSensitivity {
                    axis: name.clone(),
                    sensitivity: setting.sensitivity,
                });
            }
            match document.axis_mapping(name) {
                Some(AxisMapping::Direct(index)) => config.raw_axes.push(RawAxis {
                    name: name.clone(),
                    index: *index as usize,
                    setting: *setting,
                }),
                _ => warnings.push(ConfigWarning::MissingAxisIndex { axis: name.clone() }),
            }
        }

        for (name, mapping) in &document.axis_mapping {
            if let AxisMapping::Named { source, scale } = mapping {
                config.controls.push(ControlMapping {
                    name: name.clone(),
                    source: source.clone(),
                    scale: *scale,
                });
            }
        }

        for (name, entry) in &document.bindings.standard {
            match parsed(&format!("standard:{name}"), entry)
                .and_then(|entry| standard_binding(name, entry))
            {
                Ok(binding) => config.standard.push(binding),
                Err(warning) => warnings.push(warning),
            }
        }

        for (name, entry) in &document.bindings.combos {
            match parsed(&format!("combo:{name}"), entry).and_then(|entry| combo(name, entry)) {
                Ok(combo) => config.combos.push(combo),
                Err(warning) => warnings.push(warning),
            }
        }

        match parsed("kill_switch", &document.kill_switch) {
            Ok(kill) => {
                if let Some(key) = &kill.key {
                    match key.parse::<KillKey>() {
                        Ok(key) => config.kill_switch.key = Some(key),
                        Err(_) => warnings.push(ConfigWarning::UnknownKillKey(key.clone())),
                    }
                }
                if let Some(index) = kill.button {
                    match physical_button("kill_switch", Some(index)) {
                        Ok(button) => config.kill_switch.button = Some(button),
                        Err(warning) => warnings.push(warning),
                    }
                }
            }
            Err(warning) => warnings.push(warning),
        }

        (config, warnings)
    }

    /// Validates the document and logs every warning
    pub fn load(document: &ConfigDocument) -> Self {
        let (config, warnings) = Self::from_document(document);
        for warning in &warnings {
            warn!("Config: {}", warning);
        }
        config
    }
}

fn parsed<'a, T>(entry: &str, document: &'a Entry<T>) -> Result<&'a T, ConfigWarning> {
    match document {
        Entry::Parsed(parsed) => Ok(parsed),
        Entry::Malformed { reason, .. } => Err(ConfigWarning::MalformedEntry {
            entry: entry.to_string(),
            reason: reason.clone(),
        }),
    }
}

fn physical_button(entry: &str, index: Option<i64>) -> Result<u32, ConfigWarning> {
    let index = index.ok_or_else(|| ConfigWarning::Unassigned {
        entry: entry.to_string(),
    })?;
    u32::try_from(index).map_err(|_| ConfigWarning::InvalidButton {
        entry: entry.to_string(),
        index,
    })
}

fn virtual_button(entry: &str, name: &str) -> Result<XButton, ConfigWarning> {
    name.parse().map_err(|_| ConfigWarning::UnknownVirtualButton {
        entry: entry.to_string(),
        name: name.to_string(),
    })
}

fn standard_binding(
    name: &str,
    entry: &StandardBindingDocument,
) -> Result<StandardBinding, ConfigWarning> {
    let label = format!("standard:{name}");
    let button = physical_button(&label, entry.button)?;
    let xusb = entry
        .xusb
        .as_deref()
        .ok_or_else(|| ConfigWarning::MissingVirtualButton {
            entry: label.clone(),
        })?;
    let target = virtual_button(&label, xusb)?;

    Ok(StandardBinding {
        name: name.to_string(),
        button,
        target,
    })
}

fn combo(name: &str, entry: &ComboDocument) -> Result<Combo, ConfigWarning> {
    let label = format!("combo:{name}");
    let trigger = physical_button(&label, entry.trigger)?;

    let mut buttons = Vec::with_capacity(entry.xusb.len());
    for xusb in &entry.xusb {
        let button = virtual_button(&label, xusb)?;
        if !buttons.contains(&button) {
            buttons.push(button);
        }
    }

    let mut disable_axes: Vec<String> = Vec::with_capacity(entry.disable_axes.len());
    for axis in &entry.disable_axes {
        if !disable_axes.contains(axis) {
            disable_axes.push(axis.clone());
        }
    }

    Ok(Combo {
        name: name.to_string(),
        trigger,
        buttons,
        disable_axes,
        analog: entry.analog,
    })
}
