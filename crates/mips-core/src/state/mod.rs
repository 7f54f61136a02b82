//! Architectural state and run-flag primitives.

/// Register file types and storage model.
pub mod registers;
/// Run flag and stop reasons.
pub mod run_state;

pub use registers::{ArchitecturalState, GeneralRegister, GENERAL_REGISTER_COUNT};
pub use run_state::{RunState, StopReason};
