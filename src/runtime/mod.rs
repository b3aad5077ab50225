//! Polling loop and shutdown handling
//!
//! The [`Runtime`] is a type-state machine:
//!
//! ```text
//! Running ──(kill key | kill button | Ctrl+C)──► Stopping ──cleanup──► Stopped
//! ```
//!
//! Every stop source trips the same [`StopSignal`]. The loop checks it once per
//! tick and also races it against the tick sleep, so shutdown takes at most
//! one tick.

pub mod kill_switch;

use crate::config::{ControllerConfig, KillSwitch};
use crate::controller::StickSource;
use crate::mapping::MappingEngine;
use crate::pad::PadGuard;
use statum::{machine, state};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Why the runtime left `Running`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    KillKey,
    KillButton,
    Interrupt,
    /// The owner of the signal went away without a user request
    Shutdown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::KillKey => f.write_str("keyboard kill switch"),
            StopReason::KillButton => f.write_str("joystick kill switch"),
            StopReason::Interrupt => f.write_str("Ctrl+C"),
            StopReason::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// Stop request shared between the loop, the kill key thread and the Ctrl+C task
///
/// The first reason posted is kept; later triggers only re-cancel the token.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<StopReason>>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self, reason: StopReason) {
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<StopReason> {
        self.reason.get().copied()
    }

    pub async fn triggered(&self) {
        self.token.cancelled().await
    }

    /// Trips the signal on Ctrl+C
    pub fn listen_for_ctrl_c(&self) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => {
                        info!("Ctrl+C received");
                        signal.trigger(StopReason::Interrupt);
                    }
                    Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
                },
                _ = signal.triggered() => {}
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    /// Sleep between iterations; not drift-corrected
    pub tick_interval: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum RuntimeState {
    Running,
    Stopping,
    Stopped,
}

#[machine]
pub struct Runtime<S: RuntimeState> {
    source: Box<dyn StickSource>,
    pad: PadGuard,
    engine: MappingEngine,
    kill_button: Option<u32>,
    signal: StopSignal,
    settings: RuntimeSettings,
    ticks: u64,
}

impl<S: RuntimeState> Runtime<S> {
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn signal(&self) -> &StopSignal {
        &self.signal
    }

    /// Reason of the stop, if one was posted
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.signal.reason()
    }
}

impl Runtime<Running> {
    pub fn start(
        source: Box<dyn StickSource>,
        pad: PadGuard,
        config: &ControllerConfig,
        signal: StopSignal,
        settings: RuntimeSettings,
    ) -> Self {
        info!(
            "Starting runtime on {} with {} ms ticks",
            source.name(),
            settings.tick_interval.as_millis()
        );
        Self::new(
            source,
            pad,
            MappingEngine::new(config),
            config.kill_switch.button,
            signal,
            settings,
            0,
        )
    }

    /// Runs one iteration; returns the stop reason once the signal has tripped
    pub fn tick(&mut self) -> Option<StopReason> {
        if self.signal.is_triggered() {
            return Some(self.signal.reason().unwrap_or(StopReason::Shutdown));
        }

        let snapshot = self.source.snapshot();
        let frame = self.engine.process(&snapshot);
        if let Err(e) = self.pad.commit(&frame) {
            warn!("Failed to update virtual pad: {}", e);
        }
        self.ticks += 1;

        let controls = self.engine.controls();
        debug!(
            "Controls: roll {:>5.2} pitch {:>5.2} yaw {:>5.2} throttle {:>5.2} camera {:>4.1}/{:<4.1}",
            controls.get("roll"),
            controls.get("pitch"),
            controls.get("yaw"),
            controls.get("throttle"),
            controls.get("hat_x"),
            controls.get("hat_y"),
        );

        if let Some(button) = self.kill_button {
            if snapshot.is_pressed(button) {
                info!("Kill button {} pressed", button);
                self.signal.trigger(StopReason::KillButton);
                return self.signal.reason();
            }
        }
        None
    }

    pub async fn run_until_stopped(mut self) -> Runtime<Stopping> {
        loop {
            if self.tick().is_some() {
                break;
            }
            tokio::select! {
                _ = self.signal.triggered() => {}
                _ = sleep(self.settings.tick_interval) => {}
            }
        }

        let reason = self.signal.reason().unwrap_or(StopReason::Shutdown);
        info!("Stopping after {} ticks: {}", self.ticks, reason);
        self.transition()
    }
}

impl Runtime<Stopping> {
    /// Returns the pad to neutral and flushes it
    pub fn cleanup(mut self) -> Runtime<Stopped> {
        if self.pad.release() {
            info!("Virtual pad reset to neutral");
        }
        self.transition()
    }
}

impl Runtime<Stopped> {
    pub fn is_pad_released(&self) -> bool {
        self.pad.is_released()
    }
}

/// Logs the available ways to stop the mapper
pub fn log_banner(switch: &KillSwitch) {
    info!("Virtual Xbox controller ready");
    if let Some(button) = switch.button {
        info!("Joystick kill switch: button {}", button);
    }
    if let Some(key) = switch.key {
        if kill_switch::keyboard_available() {
            info!("Keyboard kill switch: {} key", key);
        } else {
            warn!(
                "Keyboard kill switch {} is unavailable, no readable keyboard",
                key
            );
        }
    }
    if !switch.is_configured() {
        info!("No kill switches configured, use Ctrl+C to exit");
    }
    info!("Use --debug to show control values");
}
