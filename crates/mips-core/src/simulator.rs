//! Host-facing simulator facade.
//!
//! [`Simulator`] owns the machine state, the configuration and the last
//! loaded program. It is the surface a shell or test harness drives; direct
//! register and memory writes here bypass the decode/execute pipeline.

use tracing::{debug, info};

use crate::api::{
    CoreConfig, CoreState, NoopTraceSink, RunOutcome, SimError, StepOutcome, TraceSink,
};
use crate::control::{run_cycles, run_until_stopped, step_one};
use crate::disasm::{disassemble_range, disassemble_word, DisassemblyRow};
use crate::memory::{AddressSpace, LayoutError, MemoryRegion, RegionDescriptor};
use crate::{ArchitecturalState, GeneralRegister, RunState, StopReason};

/// Instruction-level simulator instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulator {
    config: CoreConfig,
    state: CoreState,
    program: Vec<u32>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}

impl Simulator {
    /// Creates an initialized simulator over the standard memory map.
    #[must_use]
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            state: CoreState::default(),
            program: Vec::new(),
        }
    }

    /// Creates an initialized simulator over a custom region table.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Layout`] when the table has no text region or a
    /// descriptor is inverted, misaligned or overlapping.
    pub fn with_layout(config: CoreConfig, regions: &[RegionDescriptor]) -> Result<Self, SimError> {
        if !regions
            .iter()
            .any(|descriptor| descriptor.region == MemoryRegion::Text)
        {
            return Err(LayoutError::MissingText.into());
        }
        let memory = AddressSpace::with_regions(regions)?;

        Ok(Self {
            config,
            state: CoreState::with_memory(memory),
            program: Vec::new(),
        })
    }

    /// Returns the configuration this instance was built with.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Zeroes memory and registers, points `PC` at the text base, clears the
    /// instruction counter and sets the run flag. Forgets the loaded program.
    pub fn initialize(&mut self) {
        self.state.reset_canonical();
        self.program.clear();
        debug!(pc = self.state.current.pc(), "simulator initialized");
    }

    /// Writes `words` sequentially from the text base and records them as the
    /// program to restore on [`Simulator::reset`].
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ProgramTooLarge`] when `words` does not fit in the
    /// text region; memory is left untouched in that case.
    pub fn load(&mut self, words: &[u32]) -> Result<(), SimError> {
        let capacity = self.text_capacity_words();
        if words.len() > capacity {
            return Err(SimError::ProgramTooLarge {
                words: words.len(),
                capacity,
            });
        }

        let base = self.state.text_base();
        store_words(&mut self.state.memory, base, words);
        self.program = words.to_vec();
        info!(words = words.len(), base, "program loaded");
        Ok(())
    }

    /// Initializes the machine and reloads the last loaded program.
    pub fn reset(&mut self) {
        self.state.reset_canonical();
        let base = self.state.text_base();
        store_words(&mut self.state.memory, base, &self.program);
        debug!(words = self.program.len(), "simulator reset");
    }

    fn text_capacity_words(&self) -> usize {
        self.state
            .memory
            .region(MemoryRegion::Text)
            .map_or(0, |descriptor| descriptor.len_bytes() / 4)
    }

    /// Executes one cycle.
    pub fn step(&mut self) -> StepOutcome {
        self.step_with_sink(&mut NoopTraceSink)
    }

    /// Executes one cycle, reporting trace events to `sink`.
    pub fn step_with_sink<T: TraceSink + ?Sized>(&mut self, sink: &mut T) -> StepOutcome {
        step_one(&mut self.state, &self.config, sink)
    }

    /// Executes up to `cycles` cycles, stopping early if the run flag clears.
    pub fn run(&mut self, cycles: u64) -> RunOutcome {
        self.run_with_sink(cycles, &mut NoopTraceSink)
    }

    /// Executes up to `cycles` cycles, reporting trace events to `sink`.
    pub fn run_with_sink<T: TraceSink + ?Sized>(&mut self, cycles: u64, sink: &mut T) -> RunOutcome {
        run_cycles(&mut self.state, &self.config, sink, cycles)
    }

    /// Executes until the run flag clears.
    ///
    /// Does not return for a program that never halts or faults.
    pub fn run_to_completion(&mut self) -> RunOutcome {
        self.run_to_completion_with_sink(&mut NoopTraceSink)
    }

    /// Executes until the run flag clears, reporting trace events to `sink`.
    pub fn run_to_completion_with_sink<T: TraceSink + ?Sized>(&mut self, sink: &mut T) -> RunOutcome {
        run_until_stopped(&mut self.state, &self.config, sink)
    }

    /// Clears the run flag. A machine already stopped keeps its reason.
    pub fn stop(&mut self) {
        if self.state.run_state.is_running() {
            self.state.run_state = RunState::Stopped(StopReason::Requested);
            debug!(pc = self.state.current.pc(), "stop requested");
        }
    }

    /// Reads general-purpose register `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidRegister`] when `index > 31`.
    pub fn read_register(&self, index: usize) -> Result<u32, SimError> {
        Ok(self.state.current.gpr(register(index)?))
    }

    /// Writes general-purpose register `index` in both generations.
    ///
    /// Writes to register 0 are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidRegister`] when `index > 31`.
    pub fn write_register(&mut self, index: usize, value: u32) -> Result<(), SimError> {
        let reg = register(index)?;
        self.state.current.set_gpr(reg, value);
        self.state.next.set_gpr(reg, value);
        Ok(())
    }

    /// Reads `HI`.
    #[must_use]
    pub const fn read_hi(&self) -> u32 {
        self.state.current.hi()
    }

    /// Writes `HI` in both generations.
    pub const fn write_hi(&mut self, value: u32) {
        self.state.current.set_hi(value);
        self.state.next.set_hi(value);
    }

    /// Reads `LO`.
    #[must_use]
    pub const fn read_lo(&self) -> u32 {
        self.state.current.lo()
    }

    /// Writes `LO` in both generations.
    pub const fn write_lo(&mut self, value: u32) {
        self.state.current.set_lo(value);
        self.state.next.set_lo(value);
    }

    /// Reads `PC`.
    #[must_use]
    pub const fn read_pc(&self) -> u32 {
        self.state.current.pc()
    }

    /// Reads the little-endian word at `addr`; unmapped addresses read zero.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fault`] when `addr` is not word aligned.
    pub fn read_memory_word(&self, addr: u32) -> Result<u32, SimError> {
        Ok(self.state.memory.read32(addr)?)
    }

    /// Writes the little-endian word at `addr`; unmapped addresses are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fault`] when `addr` is not word aligned.
    pub fn write_memory_word(&mut self, addr: u32, value: u32) -> Result<(), SimError> {
        Ok(self.state.memory.write32(addr, value)?)
    }

    /// Reads the byte at `addr`; unmapped addresses read zero.
    #[must_use]
    pub fn read_memory_byte(&self, addr: u32) -> u8 {
        self.state.memory.read8(addr)
    }

    /// Disassembles the instruction word at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fault`] when `addr` is misaligned or outside every
    /// region.
    pub fn decode_for_display(&self, addr: u32) -> Result<String, SimError> {
        let word = self.state.memory.fetch(addr)?;
        Ok(disassemble_word(addr, word).to_string())
    }

    /// Disassembles the loaded program from the text base.
    #[must_use]
    pub fn disassemble_program(&self) -> Vec<DisassemblyRow> {
        disassemble_range(
            self.state.text_base(),
            self.program.len(),
            &self.state.memory,
        )
    }

    /// Cycles attempted since the last reset.
    #[must_use]
    pub const fn instruction_count(&self) -> u64 {
        self.state.instruction_count
    }

    /// Words in the loaded program.
    #[must_use]
    pub fn program_size(&self) -> usize {
        self.program.len()
    }

    /// Run flag and stop reason.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.state.run_state
    }

    /// Returns `true` while the run flag is set.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.state.run_state.is_running()
    }

    /// Committed register generation.
    #[must_use]
    pub const fn current_state(&self) -> &ArchitecturalState {
        &self.state.current
    }

    /// Next register generation; equal to the current one between cycles.
    #[must_use]
    pub const fn next_state(&self) -> &ArchitecturalState {
        &self.state.next
    }

    /// Memory regions.
    #[must_use]
    pub const fn memory(&self) -> &AddressSpace {
        &self.state.memory
    }

    /// Complete machine state.
    #[must_use]
    pub const fn core_state(&self) -> &CoreState {
        &self.state
    }
}

fn register(index: usize) -> Result<GeneralRegister, SimError> {
    u8::try_from(index)
        .ok()
        .and_then(GeneralRegister::from_u5)
        .ok_or(SimError::InvalidRegister(index))
}

fn store_words(memory: &mut AddressSpace, base: u32, words: &[u32]) {
    let mut addr = base;
    for word in words {
        for byte in word.to_le_bytes() {
            memory.write8(addr, byte);
            addr = addr.wrapping_add(1);
        }
    }
}
