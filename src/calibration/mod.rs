//! Interactive discovery of the device layout
//!
//! Finds which device axis is which by asking the user to move them, records
//! the buttons for every binding and combo, and checks the result for
//! buttons or axes claimed twice.

pub mod conflicts;
pub mod session;

pub use conflicts::{axis_conflicts, button_conflicts, AxisConflict, ButtonConflict};
pub use session::{CalibrationReport, CalibrationSession, CalibrationSettings};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalibrationError {
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Device reports no axes")]
    NoAxes,
}
