//! Cycle controller.
//!
//! One cycle fetches the word at `current.PC`, decodes it, executes it
//! against `current`, commits into `next`, then publishes `next` as
//! `current`. The run flag is checked between cycles, never mid-cycle.

use tracing::{debug, trace, warn};

use crate::api::{
    CoreConfig, CoreState, RunBoundary, RunOutcome, StepOutcome, TraceEvent, TraceSink,
};
use crate::decoder::Decoder;
use crate::encoding::Operation;
use crate::execute::{commit_execution, execute_instruction, ExecuteState};
use crate::{FaultCode, RunState, StopReason};

fn emit<T: TraceSink + ?Sized>(config: &CoreConfig, sink: &mut T, event: TraceEvent) {
    if config.tracing_enabled {
        sink.on_event(event);
    }
}

/// Executes a single cycle.
///
/// A stopped machine is left untouched. Otherwise the instruction counter
/// advances exactly once, whether the cycle retires or faults. A faulting
/// cycle commits nothing: `PC` still addresses the faulting instruction.
pub fn step_one<T: TraceSink + ?Sized>(
    state: &mut CoreState,
    config: &CoreConfig,
    sink: &mut T,
) -> StepOutcome {
    if let RunState::Stopped(reason) = state.run_state {
        return StepOutcome::Stopped(reason);
    }

    let pc = state.current.pc();
    state.next = state.current;
    let result = fetch_execute_commit(state, config, sink, pc);
    state.instruction_count = state.instruction_count.wrapping_add(1);

    match result {
        Ok((operation, exec)) => {
            state.current = state.next;
            if exec.halt {
                debug!(pc, cycles = state.instruction_count, "halt requested");
                state.run_state = RunState::Stopped(StopReason::Halted);
                emit(config, sink, TraceEvent::Halted { pc });
                StepOutcome::Halted { pc }
            } else {
                emit(config, sink, TraceEvent::InstructionRetired { pc, operation });
                StepOutcome::Retired { pc, operation }
            }
        }
        Err(cause) => {
            state.next = state.current;
            warn!(pc, %cause, "fault raised; run flag cleared");
            state.run_state = RunState::Stopped(StopReason::Fault { cause, pc });
            emit(config, sink, TraceEvent::FaultRaised { cause, pc });
            StepOutcome::Fault { cause, pc }
        }
    }
}

fn fetch_execute_commit<T: TraceSink + ?Sized>(
    state: &mut CoreState,
    config: &CoreConfig,
    sink: &mut T,
    pc: u32,
) -> Result<(Operation, ExecuteState), FaultCode> {
    let word = state.memory.fetch(pc)?;
    trace!(pc, word, "fetch");
    emit(config, sink, TraceEvent::InstructionStart { pc, word });

    let instr = Decoder::decode(word);
    let operation = instr.operation()?;
    let exec = execute_instruction(&instr, &state.current, &state.memory)?;
    commit_execution(&mut state.next, &mut state.memory, &exec, config)?;

    for (access, is_write) in [(exec.memory_read, false), (exec.memory_write, true)] {
        if let Some(access) = access {
            emit(
                config,
                sink,
                TraceEvent::MemoryAccess {
                    addr: access.addr,
                    width: access.width,
                    value: access.value,
                    is_write,
                },
            );
        }
    }

    Ok((operation, exec))
}

fn boundary_after(outcome: StepOutcome) -> Option<RunBoundary> {
    match outcome {
        StepOutcome::Retired { .. } => None,
        StepOutcome::Halted { .. } => Some(RunBoundary::Halted),
        StepOutcome::Fault { cause, .. } => Some(RunBoundary::Fault { cause }),
        StepOutcome::Stopped(_) => Some(RunBoundary::Stopped),
    }
}

/// Executes up to `budget` cycles, returning early once the run flag clears.
///
/// Exhausting the budget leaves the run flag set.
pub fn run_cycles<T: TraceSink + ?Sized>(
    state: &mut CoreState,
    config: &CoreConfig,
    sink: &mut T,
    budget: u64,
) -> RunOutcome {
    let mut cycles = 0;

    while cycles < budget {
        let outcome = step_one(state, config, sink);
        if let Some(boundary) = boundary_after(outcome) {
            if !matches!(boundary, RunBoundary::Stopped) {
                cycles += 1;
            }
            return RunOutcome { cycles, boundary };
        }
        cycles += 1;
    }

    RunOutcome {
        cycles,
        boundary: RunBoundary::CycleBudget,
    }
}

/// Executes cycles until the run flag clears.
///
/// Does not return for a program that never halts or faults.
pub fn run_until_stopped<T: TraceSink + ?Sized>(
    state: &mut CoreState,
    config: &CoreConfig,
    sink: &mut T,
) -> RunOutcome {
    let mut cycles: u64 = 0;

    loop {
        let outcome = step_one(state, config, sink);
        if let Some(boundary) = boundary_after(outcome) {
            if !matches!(boundary, RunBoundary::Stopped) {
                cycles += 1;
            }
            return RunOutcome { cycles, boundary };
        }
        cycles += 1;
    }
}
