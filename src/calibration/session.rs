use super::conflicts::{axis_conflicts, button_conflicts, AxisConflict, ButtonConflict};
use super::CalibrationError;
use crate::config::{AxisMapping, ConfigDocument};
use crate::controller::StickSource;
use crate::runtime::kill_switch::{KeyProbe, KillKey};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info};

/// Raw axes discovered by movement, with the control each one drives
pub const CALIBRATED_AXES: [(&str, &str); 4] = [
    ("x", "Roll"),
    ("y", "Pitch"),
    ("twist", "Yaw"),
    ("throttle", "Throttle"),
];

#[derive(Debug, Clone)]
pub struct CalibrationSettings {
    pub poll_interval: Duration,
    /// Movement from the resting value that counts as "this axis"
    pub axis_threshold: f32,
    /// Wait after a detected axis so it can re-centre
    pub settle_time: Duration,
    pub skip_key: KillKey,
    /// Pause after the skip key so one press skips one step
    pub skip_debounce: Duration,
    /// Give up on a step after this long; `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            axis_threshold: 0.5,
            settle_time: Duration::from_millis(500),
            skip_key: KillKey::Char('s'),
            skip_debounce: Duration::from_millis(200),
            timeout: None,
        }
    }
}

/// Outcome of a full calibration run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationReport {
    pub axes: Vec<(String, u32)>,
    pub hat: Option<usize>,
    pub button_conflicts: Vec<ButtonConflict>,
    pub axis_conflicts: Vec<AxisConflict>,
}

impl CalibrationReport {
    pub fn has_conflicts(&self) -> bool {
        !self.button_conflicts.is_empty() || !self.axis_conflicts.is_empty()
    }
}

/// Interactive discovery of axes, hat and buttons on a live device
pub struct CalibrationSession<S, K> {
    source: S,
    keys: K,
    settings: CalibrationSettings,
}

impl<S: StickSource, K: KeyProbe> CalibrationSession<S, K> {
    pub fn new(source: S, keys: K, settings: CalibrationSettings) -> Self {
        Self {
            source,
            keys,
            settings,
        }
    }

    fn timed_out(&self, started: Instant) -> bool {
        self.settings
            .timeout
            .is_some_and(|limit| started.elapsed() >= limit)
    }

    async fn skip_pressed(&mut self) -> bool {
        if self.keys.is_pressed(self.settings.skip_key) {
            sleep(self.settings.skip_debounce).await;
            return true;
        }
        false
    }

    /// Returns the first axis that moves past the threshold from where it rested
    pub async fn wait_for_axis(&mut self) -> Result<usize, CalibrationError> {
        self.source.pump();
        let resting: Vec<f32> = (0..self.source.axis_count())
            .map(|i| self.source.read_axis(i).unwrap_or(0.0))
            .collect();
        if resting.is_empty() {
            return Err(CalibrationError::NoAxes);
        }

        let started = Instant::now();
        loop {
            self.source.pump();
            for index in 0..self.source.axis_count() {
                let Ok(value) = self.source.read_axis(index) else {
                    continue;
                };
                let rest = resting.get(index).copied().unwrap_or(0.0);
                if (value - rest).abs() > self.settings.axis_threshold {
                    debug!("Axis {} moved from {:.2} to {:.2}", index, rest, value);
                    sleep(self.settings.settle_time).await;
                    return Ok(index);
                }
            }
            if self.timed_out(started) {
                return Err(CalibrationError::Timeout("axis movement"));
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    /// Returns the first hat that leaves centre, `None` without hats or on skip
    pub async fn detect_hat(&mut self) -> Result<Option<usize>, CalibrationError> {
        self.source.pump();
        if self.source.hat_count() == 0 {
            return Ok(None);
        }

        let started = Instant::now();
        loop {
            self.source.pump();
            let moved = (0..self.source.hat_count()).find(|i| self.source.read_hat(*i) != (0, 0));
            if let Some(index) = moved {
                sleep(self.settings.settle_time).await;
                return Ok(Some(index));
            }
            if self.skip_pressed().await || self.timed_out(started) {
                return Ok(None);
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    /// Waits for a button press and its release; `None` when skipped
    pub async fn wait_for_button(&mut self) -> Result<Option<u32>, CalibrationError> {
        let started = Instant::now();
        loop {
            self.source.pump();
            if self.skip_pressed().await {
                return Ok(None);
            }

            let pressed = (0..self.source.button_count()).find(|i| self.source.read_button(*i));
            if let Some(index) = pressed {
                while self.source.read_button(index) {
                    sleep(self.settings.poll_interval).await;
                    self.source.pump();
                }
                return Ok(Some(index as u32));
            }

            if self.timed_out(started) {
                return Ok(None);
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    /// Walks through every step and writes the results into `document`
    pub async fn run(
        &mut self,
        document: &mut ConfigDocument,
    ) -> Result<CalibrationReport, CalibrationError> {
        let mut report = CalibrationReport::default();
        println!("Starting calibration on {}", self.source.name());
        println!("Press '{}' to skip any binding", self.settings.skip_key);

        println!("\nAxis calibration\n----------------");
        for (axis, control) in CALIBRATED_AXES {
            println!("\nMove the {axis} ({control}) axis...");
            let index = self.wait_for_axis().await? as u32;
            println!("Mapped to axis {index}");
            report.axes.push((axis.to_string(), index));
        }
        apply_axes(document, &report.axes);

        println!("\nHat switch calibration\n----------------------");
        println!("Move the hat switch in any direction...");
        report.hat = self.detect_hat().await?;
        match report.hat {
            Some(index) => println!("Hat switch {index} will be used for camera control"),
            None => println!("No hat switch detected"),
        }

        println!("\nStandard buttons\n----------------");
        for (name, entry) in &mut document.bindings.standard {
            println!("\nAction: {name}");
            let Some(binding) = entry.parsed_mut() else {
                println!("Skipped, entry is malformed");
                continue;
            };
            if let Some(button) = self.prompt_button().await? {
                binding.button = Some(i64::from(button));
            }
        }

        println!("\nCombo triggers\n--------------");
        for (name, entry) in &mut document.bindings.combos {
            println!("\nCombo: {name}");
            let Some(combo) = entry.parsed_mut() else {
                println!("Skipped, entry is malformed");
                continue;
            };
            println!("Press the button that will trigger this combo");
            if let Some(button) = self.prompt_button().await? {
                combo.trigger = Some(i64::from(button));
            }
        }

        println!("\nFinally, the kill switch button...");
        match document.kill_switch.parsed_mut() {
            Some(kill) => {
                if let Some(button) = self.prompt_button().await? {
                    kill.button = Some(i64::from(button));
                }
            }
            None => println!("Skipped, kill_switch is malformed"),
        }

        println!("\nCalibration complete!");
        println!("\nConfigured combos:");
        for line in combo_summary(document) {
            println!("{line}");
        }

        report.button_conflicts = button_conflicts(document);
        report.axis_conflicts = axis_conflicts(&report.axes);
        info!(
            "Calibration found {} button and {} axis conflicts",
            report.button_conflicts.len(),
            report.axis_conflicts.len()
        );
        Ok(report)
    }

    async fn prompt_button(&mut self) -> Result<Option<u32>, CalibrationError> {
        let button = self.wait_for_button().await?;
        match button {
            Some(index) => println!("Mapped to button {index}"),
            None => println!("Skipped"),
        }
        Ok(button)
    }
}

/// Writes discovered axis indices, adding default settings for new axes
pub fn apply_axes(document: &mut ConfigDocument, axes: &[(String, u32)]) {
    for (axis, index) in axes {
        document.ensure_axis(axis);
        document.set_axis_mapping(axis, AxisMapping::Direct(*index));
    }
}

/// One line per combo trigger, one more when it disables axes
pub fn combo_summary(document: &ConfigDocument) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, entry) in &document.bindings.combos {
        let Some(combo) = entry.parsed() else {
            lines.push(format!("- {name}: malformed"));
            continue;
        };
        let trigger = combo
            .trigger
            .map_or_else(|| "unassigned".to_string(), |b| format!("Button {b}"));
        lines.push(format!("- {name}: {trigger}"));
        if !combo.disable_axes.is_empty() {
            lines.push(format!("  Disables: {}", combo.disable_axes.join(", ")));
        }
    }
    lines
}
