//! Raw axis readings to normalized control values

use crate::config::{AxisSetting, ControlMapping, ControllerConfig, RawAxis};
use crate::controller::StickSnapshot;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

pub const HAT_X: &str = "hat_x";
pub const HAT_Y: &str = "hat_y";

/// Clamps to `[-1, 1]`; non-finite values collapse to 0
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Applies deadzone and sensitivity to a raw reading
///
/// Readings inside the deadzone are 0. Outside it the remaining travel is
/// rescaled to start at 0, so the curve is continuous at the boundary, and
/// then multiplied by the sensitivity. A deadzone of 1 or more leaves no
/// travel and always yields 0.
pub fn apply_deadzone(raw: f32, setting: &AxisSetting) -> f32 {
    if !raw.is_finite() || setting.deadzone.is_nan() || setting.deadzone >= 1.0 {
        return 0.0;
    }
    let deadzone = setting.deadzone.max(0.0);

    let magnitude = raw.abs();
    if magnitude < deadzone {
        return 0.0;
    }

    let normalized = (magnitude - deadzone) / (1.0 - deadzone);
    clamp_unit(raw.signum() * normalized * setting.sensitivity)
}

/// Normalized values for one tick, keyed by axis or control name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlValues {
    values: HashMap<String, f32>,
}

impl ControlValues {
    /// Value of a control, 0 when it is absent
    pub fn get(&self, name: &str) -> f32 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    pub fn value(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f32) {
        self.values.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Turns a [`StickSnapshot`] into [`ControlValues`]
pub struct Normalizer {
    raw_axes: Vec<RawAxis>,
    controls: Vec<ControlMapping>,
    failing: HashSet<String>,
}

impl Normalizer {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            raw_axes: config.raw_axes.clone(),
            controls: config.controls.clone(),
            failing: HashSet::new(),
        }
    }

    pub fn process(&mut self, snapshot: &StickSnapshot) -> ControlValues {
        let mut values = ControlValues::default();

        for axis in &self.raw_axes {
            match snapshot.axis(axis.index) {
                Ok(raw) => {
                    if self.failing.remove(&axis.name) {
                        info!("Axis {} readable again", axis.name);
                    }
                    values.insert(axis.name.clone(), apply_deadzone(raw, &axis.setting));
                }
                Err(e) => {
                    // once per failure streak
                    if self.failing.insert(axis.name.clone()) {
                        warn!("Axis {} skipped: {}", axis.name, e);
                    }
                }
            }
        }

        if let Some((x, y)) = snapshot.hat(0) {
            values.insert(HAT_X, f32::from(x));
            values.insert(HAT_Y, f32::from(y));
        }

        for control in &self.controls {
            if let Some(source) = values.value(&control.source) {
                values.insert(control.name.clone(), clamp_unit(source * control.scale));
            }
        }

        values
    }

    /// Names of axes whose last read failed
    pub fn failing_axes(&self) -> impl Iterator<Item = &str> {
        self.failing.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDocument;
    use crate::controller::StickSource;
    use crate::testing::FakeStick;
    use proptest::prelude::*;

    const BASIC: AxisSetting = AxisSetting::new(0.1, 1.0);

    #[test]
    fn deadzone_examples() {
        assert_eq!(apply_deadzone(0.05, &BASIC), 0.0);
        assert_eq!(apply_deadzone(-0.0999, &BASIC), 0.0);
        assert!((apply_deadzone(0.5, &BASIC) - 0.4444).abs() < 1e-3);
        assert!((apply_deadzone(-0.5, &BASIC) + 0.4444).abs() < 1e-3);
        assert_eq!(apply_deadzone(1.0, &BASIC), 1.0);
    }

    #[test]
    fn degenerate_inputs_yield_zero() {
        assert_eq!(apply_deadzone(0.9, &AxisSetting::new(1.0, 1.0)), 0.0);
        assert_eq!(apply_deadzone(0.9, &AxisSetting::new(f32::NAN, 1.0)), 0.0);
        assert_eq!(apply_deadzone(f32::NAN, &BASIC), 0.0);
        assert_eq!(apply_deadzone(0.9, &AxisSetting::new(0.1, f32::INFINITY)), 0.0);
    }

    #[test]
    fn sensitivity_is_clamped() {
        let hot = AxisSetting::new(0.0, 3.0);
        assert_eq!(apply_deadzone(0.5, &hot), 1.0);
        assert_eq!(apply_deadzone(-0.5, &hot), -1.0);
    }

    #[test]
    fn builtin_pipeline_maps_named_controls() {
        let config = ControllerConfig::load(&ConfigDocument::builtin());
        let mut normalizer = Normalizer::new(&config);
        let (mut stick, handle) = FakeStick::new(4, 0, 1);
        {
            let mut state = handle.lock().unwrap();
            state.axes = vec![0.5, -1.0, 0.1, 0.6];
            state.hats[0] = (-1, 1);
        }

        let values = normalizer.process(&stick.snapshot());
        assert!((values.get("roll") - 0.4444).abs() < 1e-3);
        assert_eq!(values.get("pitch"), -1.0);
        assert_eq!(values.get("yaw"), 0.0);
        assert!((values.get("throttle") - 0.5789).abs() < 1e-3);
        assert_eq!(values.get(HAT_X), -1.0);
        assert_eq!(values.get(HAT_Y), 1.0);
    }

    #[test]
    fn named_scale_is_clamped_and_unresolved_sources_are_absent() {
        let document: ConfigDocument = toml::from_str(
            r#"
            [axes.x]
            deadzone = 0.0
            sensitivity = 1.0
            [axis_mapping]
            x = 0
            roll = { source = "x", scale = 4.0 }
            ghost = { source = "nowhere" }
            "#,
        )
        .unwrap();
        let config = ControllerConfig::load(&document);
        let mut normalizer = Normalizer::new(&config);
        let (mut stick, handle) = FakeStick::new(1, 0, 0);
        handle.lock().unwrap().axes[0] = 0.5;

        let values = normalizer.process(&stick.snapshot());
        assert_eq!(values.get("roll"), 1.0);
        assert!(!values.contains("ghost"));
        assert_eq!(values.get("ghost"), 0.0);
        assert!(!values.contains(HAT_X));
    }

    #[test]
    fn failed_axis_is_omitted_and_recovers() {
        let config = ControllerConfig::load(&ConfigDocument::builtin());
        let mut normalizer = Normalizer::new(&config);
        let (mut stick, handle) = FakeStick::new(4, 0, 0);
        {
            let mut state = handle.lock().unwrap();
            state.axes[0] = 0.8;
            state.failing_axes.insert(0);
        }

        for _ in 0..3 {
            let values = normalizer.process(&stick.snapshot());
            assert!(!values.contains("x"));
            assert!(!values.contains("roll"));
            assert!(values.contains("pitch"));
        }
        assert_eq!(normalizer.failing_axes().collect::<Vec<_>>(), ["x"]);

        handle.lock().unwrap().failing_axes.clear();
        let values = normalizer.process(&stick.snapshot());
        assert!(values.get("roll") > 0.7);
        assert_eq!(normalizer.failing_axes().count(), 0);
    }

    #[test]
    fn axis_beyond_device_is_omitted() {
        let config = ControllerConfig::load(&ConfigDocument::builtin());
        let mut normalizer = Normalizer::new(&config);
        let (mut stick, _handle) = FakeStick::new(2, 0, 0);

        let values = normalizer.process(&stick.snapshot());
        assert!(values.contains("x"));
        assert!(!values.contains("throttle"));
        assert_eq!(values.get("throttle"), 0.0);
    }

    proptest! {
        #[test]
        fn output_is_bounded(raw in -1.0f32..=1.0, deadzone in 0.0f32..0.99, sensitivity in -10.0f32..10.0) {
            let value = apply_deadzone(raw, &AxisSetting::new(deadzone, sensitivity));
            prop_assert!((-1.0..=1.0).contains(&value));
        }

        #[test]
        fn inside_deadzone_is_zero(deadzone in 0.01f32..0.99, fraction in 0.0f32..1.0, sensitivity in 0.1f32..5.0) {
            let raw = deadzone * fraction * 0.999;
            prop_assert_eq!(apply_deadzone(raw, &AxisSetting::new(deadzone, sensitivity)), 0.0);
            prop_assert_eq!(apply_deadzone(-raw, &AxisSetting::new(deadzone, sensitivity)), 0.0);
        }

        #[test]
        fn monotonic_in_magnitude(a in 0.0f32..=1.0, b in 0.0f32..=1.0, deadzone in 0.0f32..0.95, sensitivity in 0.1f32..5.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let setting = AxisSetting::new(deadzone, sensitivity);
            prop_assert!(apply_deadzone(low, &setting) <= apply_deadzone(high, &setting));
            prop_assert!(apply_deadzone(-low, &setting) >= apply_deadzone(-high, &setting));
        }

        #[test]
        fn continuous_at_boundary(deadzone in 0.0f32..0.9, sensitivity in 0.1f32..5.0) {
            let setting = AxisSetting::new(deadzone, sensitivity);
            prop_assert!(apply_deadzone(deadzone, &setting).abs() < 1e-6);
            prop_assert!(apply_deadzone(deadzone + 1e-4, &setting).abs() < 1e-2);
        }
    }
}
