//! Flight stick to virtual Xbox 360 controller mapper

pub mod calibration;
pub mod config;
pub mod controller;
pub mod mapping;
pub mod monitor;
pub mod pad;
pub mod runtime;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;
