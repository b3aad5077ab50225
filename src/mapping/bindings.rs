//! Physical buttons to virtual buttons
//!
//! Standard bindings mirror a physical button onto a virtual one every tick.
//! Combos hold a set of virtual buttons while their trigger is down and can
//! take axes away from normal processing for that time.

use crate::config::{Combo, ControllerConfig, StandardBinding};
use crate::controller::StickSnapshot;
use crate::pad::{PadFrame, Trigger};
use std::collections::HashSet;
use tracing::debug;

/// Live combo state, rebuilt every tick from the pressed triggers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeControlState {
    disabled_axes: HashSet<String>,
    active_combos: Vec<String>,
}

impl RuntimeControlState {
    pub fn is_disabled(&self, axis: &str) -> bool {
        self.disabled_axes.contains(axis)
    }

    pub fn is_active(&self, combo: &str) -> bool {
        self.active_combos.iter().any(|name| name == combo)
    }

    pub fn disabled_axes(&self) -> &HashSet<String> {
        &self.disabled_axes
    }

    /// Active combos in declaration order
    pub fn active_combos(&self) -> &[String] {
        &self.active_combos
    }
}

/// Button commands for one tick, emitted after the axis commands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonFrames {
    pub standard: PadFrame,
    pub combos: PadFrame,
}

pub struct BindingResolver {
    standard: Vec<StandardBinding>,
    combos: Vec<Combo>,
    state: RuntimeControlState,
}

impl BindingResolver {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            standard: config.standard.clone(),
            combos: config.combos.clone(),
            state: RuntimeControlState::default(),
        }
    }

    pub fn state(&self) -> &RuntimeControlState {
        &self.state
    }

    /// Updates the combo state and returns this tick's button commands
    ///
    /// Combos are evaluated in declaration order, so on overlap the one
    /// declared last decides the final state of a shared button. An idle
    /// combo releases its buttons every tick, which also overrides a standard
    /// binding or the rudder holding the same button.
    pub fn resolve(&mut self, snapshot: &StickSnapshot) -> ButtonFrames {
        let mut frames = ButtonFrames::default();

        for binding in &self.standard {
            frames
                .standard
                .set_button(binding.target, snapshot.is_pressed(binding.button));
        }

        let mut active = Vec::with_capacity(self.combos.len());
        let mut disabled = HashSet::new();
        for combo in &self.combos {
            let was_active = self.state.is_active(&combo.name);

            if snapshot.is_pressed(combo.trigger) {
                if !was_active {
                    debug!("Combo {} engaged", combo.name);
                }
                for button in &combo.buttons {
                    frames.combos.press(*button);
                }
                if combo.analog {
                    frames.combos.trigger(Trigger::Left, 1.0);
                    frames.combos.trigger(Trigger::Right, 1.0);
                }
                active.push(combo.name.clone());
                disabled.extend(combo.disable_axes.iter().cloned());
            } else {
                if was_active {
                    debug!("Combo {} released", combo.name);
                }
                for button in &combo.buttons {
                    frames.combos.release(*button);
                }
            }
        }

        self.state.active_combos = active;
        self.state.disabled_axes = disabled;
        frames
    }
}
