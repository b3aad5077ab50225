//! Stick state to virtual pad commands
//!
//! ```text
//! StickSnapshot ──► BindingResolver ──► RuntimeControlState
//!       │                  │                    │
//!       └──► Normalizer ──► ControlValues ──► translator ──► PadFrame
//!                          └── button frames ─────────────────┘
//! ```

pub mod bindings;
pub mod engine;
pub mod normalizer;
pub mod translator;

pub use bindings::{BindingResolver, ButtonFrames, RuntimeControlState};
pub use engine::MappingEngine;
pub use normalizer::{apply_deadzone, ControlValues, Normalizer};
