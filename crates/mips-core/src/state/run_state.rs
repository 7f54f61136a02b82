use crate::FaultCode;

/// Why the run flag was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StopReason {
    /// The program executed the halt service (`syscall` with `$v0 = 10`).
    Halted,
    /// A fault was raised by the instruction at `pc`.
    Fault {
        /// Raised fault code.
        cause: FaultCode,
        /// Address of the faulting instruction.
        pc: u32,
    },
    /// The host called `stop()`.
    Requested,
}

/// Run flag as seen by the cycle controller.
///
/// Only reset/initialize moves a stopped machine back to running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Run flag set; cycles may execute.
    #[default]
    Running,
    /// Run flag cleared by a terminal condition.
    Stopped(StopReason),
}

impl RunState {
    /// Returns `true` while the run flag is set.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns the stop reason, if stopped.
    #[must_use]
    pub const fn stop_reason(self) -> Option<StopReason> {
        match self {
            Self::Running => None,
            Self::Stopped(reason) => Some(reason),
        }
    }

    /// Returns the latched fault, if the machine stopped on one.
    #[must_use]
    pub const fn latched_fault(self) -> Option<FaultCode> {
        match self {
            Self::Stopped(StopReason::Fault { cause, .. }) => Some(cause),
            Self::Running | Self::Stopped(StopReason::Halted | StopReason::Requested) => None,
        }
    }
}
