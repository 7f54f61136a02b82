//! Instruction-level simulator core for a 32-bit MIPS-like processor.

/// Memory model primitives and region map.
pub mod memory;
pub use memory::{
    decode_memory_region, validate_alignment, validate_word_alignment, AccessWidth, AddressSpace,
    LayoutError, MemoryRegion, RegionDescriptor, DATA_END, DATA_START, KDATA_END, KDATA_START,
    KTEXT_END, KTEXT_START, MIPS_MEMORY_REGIONS, REGION_BYTES, STACK_END, STACK_START, TEXT_END,
    TEXT_START,
};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    CoreConfig, CoreState, NoopTraceSink, RunBoundary, RunOutcome, SimError, StepOutcome,
    TraceEvent, TraceSink,
};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{ArchitecturalState, GeneralRegister, RunState, StopReason, GENERAL_REGISTER_COUNT};

/// Opcode and function-code classification tables.
pub mod encoding;
pub use encoding::{
    classify_funct, classify_opcode, classify_regimm, ImmediateExtension, InstructionFormat,
    Operation, OperationEncoding, OPERATION_COUNT, OPERATION_TABLE,
};

/// Instruction decode with field extraction.
pub mod decoder;
pub use decoder::{DecodedInstruction, Decoder, ImmediateFields, JumpFields, RegisterFields};

/// Fault taxonomy.
pub mod fault;
pub use fault::{FaultClass, FaultCode};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{commit_execution, execute_instruction, ExecuteState, MemoryAccess};

/// Fetch/decode/execute/commit cycle controller.
pub mod control;
pub use control::{run_cycles, run_until_stopped, step_one};

/// Instruction disassembly.
pub mod disasm;
pub use disasm::{
    disassemble_one, disassemble_range, disassemble_window, disassemble_word, DisassemblyRow,
};

/// Host-facing simulator facade.
pub mod simulator;
pub use simulator::Simulator;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
