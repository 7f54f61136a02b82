//! Host-facing configuration, state and outcome types for embedding the
//! simulator core.

use thiserror::Error;

use crate::encoding::Operation;
use crate::memory::{AccessWidth, AddressSpace, LayoutError, MemoryRegion, TEXT_START};
use crate::{ArchitecturalState, FaultCode, RunState, StopReason};

/// Top-level immutable configuration for a simulator instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Executes the instruction after every taken control transfer before
    /// entering its target. When cleared, the target is the very next fetch.
    pub branch_delay_slots: bool,
    /// Enables trace callback dispatch.
    pub tracing_enabled: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            branch_delay_slots: true,
            tracing_enabled: false,
        }
    }
}

/// Complete machine state owned by the cycle controller.
///
/// `current` is the committed generation; `next` is the generation being
/// written during a cycle and equals `current` between cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreState {
    /// Committed register generation, read by the executor.
    pub current: ArchitecturalState,
    /// Register generation written by the executor this cycle.
    pub next: ArchitecturalState,
    /// Memory regions.
    pub memory: AddressSpace,
    /// Run flag and the reason it was last cleared.
    pub run_state: RunState,
    /// Cycles attempted since the last reset, faulting cycles included.
    pub instruction_count: u64,
}

impl Default for CoreState {
    fn default() -> Self {
        Self::with_memory(AddressSpace::standard())
    }
}

impl CoreState {
    /// Creates a running core over `memory` with `PC` at the text base.
    #[must_use]
    pub fn with_memory(memory: AddressSpace) -> Self {
        let current = ArchitecturalState::with_pc(text_base(&memory));
        Self {
            current,
            next: current,
            memory,
            run_state: RunState::Running,
            instruction_count: 0,
        }
    }

    /// Address the program is loaded at and execution starts from.
    #[must_use]
    pub fn text_base(&self) -> u32 {
        text_base(&self.memory)
    }

    /// Zeroes memory and both register generations, points `PC` at the text
    /// base, clears the instruction counter and sets the run flag.
    pub fn reset_canonical(&mut self) {
        self.memory.clear();
        self.current = ArchitecturalState::with_pc(self.text_base());
        self.next = self.current;
        self.run_state = RunState::Running;
        self.instruction_count = 0;
    }
}

fn text_base(memory: &AddressSpace) -> u32 {
    memory
        .region(MemoryRegion::Text)
        .map_or(TEXT_START, |descriptor| descriptor.start)
}

/// Status of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instruction retired and its effects were committed.
    Retired {
        /// Address of the retired instruction.
        pc: u32,
        /// Tag of the retired instruction.
        operation: Operation,
    },
    /// Halt request retired; the run flag is now clear.
    Halted {
        /// Address of the halting `syscall`.
        pc: u32,
    },
    /// Cycle faulted; nothing was committed and the run flag is now clear.
    Fault {
        /// Raised fault.
        cause: FaultCode,
        /// Address of the faulting instruction.
        pc: u32,
    },
    /// Run flag was already clear; no cycle was attempted.
    Stopped(StopReason),
}

/// Why a multi-cycle run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunBoundary {
    /// Requested number of cycles executed; the run flag is still set.
    CycleBudget,
    /// Program halted.
    Halted,
    /// A cycle faulted.
    Fault {
        /// Raised fault.
        cause: FaultCode,
    },
    /// Run flag was clear before the run began.
    Stopped,
}

/// Aggregated outcome of running several cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Cycles attempted during this call, the halting or faulting one included.
    pub cycles: u64,
    /// Boundary that ended the run.
    pub boundary: RunBoundary,
}

/// Trace events emitted in execution order when tracing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Instruction fetched.
    InstructionStart {
        /// Fetch address.
        pc: u32,
        /// Raw instruction word.
        word: u32,
    },
    /// Data memory access, in commit order.
    MemoryAccess {
        /// Effective address.
        addr: u32,
        /// Access width.
        width: AccessWidth,
        /// Value read (zero-extended) or written (low `width` bytes).
        value: u32,
        /// True for stores.
        is_write: bool,
    },
    /// Instruction retired.
    InstructionRetired {
        /// Address of the retired instruction.
        pc: u32,
        /// Tag of the retired instruction.
        operation: Operation,
    },
    /// Fault raised; the cycle committed nothing.
    FaultRaised {
        /// Raised fault.
        cause: FaultCode,
        /// Address of the faulting instruction.
        pc: u32,
    },
    /// Halt request retired.
    Halted {
        /// Address of the halting `syscall`.
        pc: u32,
    },
}

/// Sink for trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Trace sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTraceSink;

impl TraceSink for NoopTraceSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Errors returned by the host-facing simulator API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SimError {
    /// Register index outside `0..=31`.
    #[error("register index {0} is out of range")]
    InvalidRegister(usize),
    /// Program does not fit in the text region.
    #[error("program of {words} words exceeds text capacity of {capacity} words")]
    ProgramTooLarge {
        /// Words in the rejected program.
        words: usize,
        /// Words the text region can hold.
        capacity: usize,
    },
    /// Region table rejected.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// Direct memory access violated the alignment policy.
    #[error(transparent)]
    Fault(#[from] FaultCode),
}
