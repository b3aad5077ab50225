//! Test doubles for the device, the pad and the keyboard

use crate::controller::{HatPosition, InputError, StickSource};
use crate::pad::{PadError, PadReport, Stick, Trigger, VirtualPad, XButton};
use crate::runtime::kill_switch::{KeyProbe, KillKey};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct FakeStickState {
    pub axes: Vec<f32>,
    pub failing_axes: HashSet<usize>,
    pub buttons: Vec<bool>,
    pub hats: Vec<HatPosition>,
    pub pumps: u64,
}

/// Stick whose state is driven through a shared handle
pub struct FakeStick {
    state: Arc<Mutex<FakeStickState>>,
}

impl FakeStick {
    pub fn new(axes: usize, buttons: usize, hats: usize) -> (Self, Arc<Mutex<FakeStickState>>) {
        let state = Arc::new(Mutex::new(FakeStickState {
            axes: vec![0.0; axes],
            failing_axes: HashSet::new(),
            buttons: vec![false; buttons],
            hats: vec![(0, 0); hats],
            pumps: 0,
        }));
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl StickSource for FakeStick {
    fn pump(&mut self) {
        self.state.lock().unwrap().pumps += 1;
    }

    fn axis_count(&self) -> usize {
        self.state.lock().unwrap().axes.len()
    }

    fn button_count(&self) -> usize {
        self.state.lock().unwrap().buttons.len()
    }

    fn hat_count(&self) -> usize {
        self.state.lock().unwrap().hats.len()
    }

    fn read_axis(&self, index: usize) -> Result<f32, InputError> {
        let state = self.state.lock().unwrap();
        if state.failing_axes.contains(&index) {
            return Err(InputError::AxisRead {
                index,
                reason: "simulated fault".to_string(),
            });
        }
        state
            .axes
            .get(index)
            .copied()
            .ok_or(InputError::AxisOutOfRange {
                index,
                count: state.axes.len(),
            })
    }

    fn read_button(&self, index: usize) -> bool {
        self.state
            .lock()
            .unwrap()
            .buttons
            .get(index)
            .copied()
            .unwrap_or(false)
    }

    fn read_hat(&self, index: usize) -> HatPosition {
        self.state
            .lock()
            .unwrap()
            .hats
            .get(index)
            .copied()
            .unwrap_or((0, 0))
    }
}

#[derive(Debug, Default)]
pub struct PadLog {
    pub submitted: PadReport,
    pub history: Vec<PadReport>,
    pub flushes: u64,
    pub resets: u64,
}

/// Pad that records every flushed report
pub struct RecordingPad {
    pending: PadReport,
    log: Arc<Mutex<PadLog>>,
}

impl RecordingPad {
    pub fn new() -> (Self, Arc<Mutex<PadLog>>) {
        let log = Arc::new(Mutex::new(PadLog::default()));
        (
            Self {
                pending: PadReport::default(),
                log: log.clone(),
            },
            log,
        )
    }
}

impl VirtualPad for RecordingPad {
    fn set_stick(&mut self, stick: Stick, x: f32, y: f32) {
        self.pending.set_stick(stick, x, y);
    }

    fn set_trigger(&mut self, trigger: Trigger, value: f32) {
        self.pending.set_trigger(trigger, value);
    }

    fn press_button(&mut self, button: XButton) {
        self.pending.press(button);
    }

    fn release_button(&mut self, button: XButton) {
        self.pending.release(button);
    }

    fn flush(&mut self) -> Result<(), PadError> {
        let mut log = self.log.lock().unwrap();
        log.submitted = self.pending.clone();
        log.history.push(self.pending.clone());
        log.flushes += 1;
        Ok(())
    }

    fn reset(&mut self) {
        self.pending = PadReport::default();
        self.log.lock().unwrap().resets += 1;
    }
}

/// Keyboard whose kill key state is flipped from the test
#[derive(Clone, Default)]
pub struct ScriptedKeys {
    pressed: Arc<AtomicBool>,
}

impl ScriptedKeys {
    pub fn press(&self) {
        self.pressed.store(true, Ordering::SeqCst);
    }
}

impl KeyProbe for ScriptedKeys {
    fn is_pressed(&mut self, _key: KillKey) -> bool {
        self.pressed.load(Ordering::SeqCst)
    }
}
