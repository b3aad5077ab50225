//! Physical flight stick input
//!
//! The rest of the crate never talks to a device directly. Each tick the
//! runtime asks a [`StickSource`] for a [`StickSnapshot`]: a read-only copy of
//! every axis, button and hat, taken right after the source was pumped.
//!
//! ```text
//! gilrs ──► GilrsStick::pump ──► StickSnapshot ──► MappingEngine
//! ```

pub mod gilrs_stick;

pub use gilrs_stick::GilrsStick;

use thiserror::Error;

/// Errors raised while opening or reading the input device
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// No compatible device is connected; fatal at startup
    #[error("No compatible input device found: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to initialize input backend: {0}")]
    Backend(String),

    #[error("Axis {index} out of range, device has {count} axes")]
    AxisOutOfRange { index: usize, count: usize },

    #[error("Failed to read axis {index}: {reason}")]
    AxisRead { index: usize, reason: String },
}

/// Hat switch position, each component in `-1..=1`
pub type HatPosition = (i8, i8);

/// Opaque source of raw stick state
pub trait StickSource {
    /// Refreshes device state; called once per tick before any read
    fn pump(&mut self);

    fn axis_count(&self) -> usize;

    fn button_count(&self) -> usize;

    fn hat_count(&self) -> usize;

    /// Raw axis value in `[-1, 1]`
    fn read_axis(&self, index: usize) -> Result<f32, InputError>;

    /// Out-of-range indices read as released
    fn read_button(&self, index: usize) -> bool;

    /// Out-of-range indices read as centred
    fn read_hat(&self, index: usize) -> HatPosition;

    fn name(&self) -> &str {
        "flight stick"
    }

    /// Pumps the source and copies its whole state
    fn snapshot(&mut self) -> StickSnapshot {
        self.pump();
        StickSnapshot {
            axes: (0..self.axis_count()).map(|i| self.read_axis(i)).collect(),
            buttons: (0..self.button_count()).map(|i| self.read_button(i)).collect(),
            hats: (0..self.hat_count()).map(|i| self.read_hat(i)).collect(),
        }
    }
}

impl<S: StickSource + ?Sized> StickSource for Box<S> {
    fn pump(&mut self) {
        (**self).pump()
    }

    fn axis_count(&self) -> usize {
        (**self).axis_count()
    }

    fn button_count(&self) -> usize {
        (**self).button_count()
    }

    fn hat_count(&self) -> usize {
        (**self).hat_count()
    }

    fn read_axis(&self, index: usize) -> Result<f32, InputError> {
        (**self).read_axis(index)
    }

    fn read_button(&self, index: usize) -> bool {
        (**self).read_button(index)
    }

    fn read_hat(&self, index: usize) -> HatPosition {
        (**self).read_hat(index)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Device state for a single tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StickSnapshot {
    pub axes: Vec<Result<f32, InputError>>,
    pub buttons: Vec<bool>,
    pub hats: Vec<HatPosition>,
}

impl StickSnapshot {
    pub fn axis(&self, index: usize) -> Result<f32, InputError> {
        match self.axes.get(index) {
            Some(reading) => reading.clone(),
            None => Err(InputError::AxisOutOfRange {
                index,
                count: self.axes.len(),
            }),
        }
    }

    pub fn is_pressed(&self, button: u32) -> bool {
        self.buttons.get(button as usize).copied().unwrap_or(false)
    }

    pub fn hat(&self, index: usize) -> Option<HatPosition> {
        self.hats.get(index).copied()
    }

    /// Indices of all pressed buttons, ascending
    pub fn pressed_buttons(&self) -> Vec<u32> {
        self.buttons
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .map(|(i, _)| i as u32)
            .collect()
    }

    /// Axis values with failed reads replaced by `None`
    pub fn axis_values(&self) -> Vec<Option<f32>> {
        self.axes.iter().map(|r| r.as_ref().ok().copied()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeStick;

    #[test]
    fn snapshot_copies_every_control() {
        let (mut stick, handle) = FakeStick::new(3, 4, 1);
        {
            let mut state = handle.lock().unwrap();
            state.axes[1] = -0.5;
            state.buttons[2] = true;
            state.hats[0] = (1, -1);
        }

        let snapshot = stick.snapshot();
        assert_eq!(snapshot.axis(1), Ok(-0.5));
        assert!(snapshot.is_pressed(2));
        assert!(!snapshot.is_pressed(0));
        assert_eq!(snapshot.hat(0), Some((1, -1)));
        assert_eq!(handle.lock().unwrap().pumps, 1);
    }

    #[test]
    fn out_of_range_reads_are_safe() {
        let (mut stick, _handle) = FakeStick::new(2, 2, 0);
        let snapshot = stick.snapshot();

        assert_eq!(
            snapshot.axis(5),
            Err(InputError::AxisOutOfRange { index: 5, count: 2 })
        );
        assert!(!snapshot.is_pressed(99));
        assert_eq!(snapshot.hat(0), None);
    }

    #[test]
    fn pressed_buttons_are_listed_in_order() {
        let (mut stick, handle) = FakeStick::new(0, 6, 0);
        {
            let mut state = handle.lock().unwrap();
            state.buttons[4] = true;
            state.buttons[1] = true;
        }
        assert_eq!(stick.snapshot().pressed_buttons(), vec![1, 4]);
    }
}
