//! Cycle controller behavior: run flag, delay slots, links, faults and tracing.

#![allow(clippy::pedantic, clippy::nursery)]

use mips_core::{
    CoreConfig, DecodedInstruction, FaultCode, GeneralRegister, Operation, RunBoundary,
    RunOutcome, RunState, Simulator, StepOutcome, StopReason, TraceEvent, TEXT_START,
};
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const NOP: u32 = 0x0000_0000;
const SYSCALL: u32 = 0x0000_000C;

fn reg(number: u8) -> GeneralRegister {
    GeneralRegister::from_field(number)
}

fn addi(rt: u8, rs: u8, immediate: u16) -> u32 {
    DecodedInstruction::immediate(Operation::Addi, reg(rt), reg(rs), immediate)
        .expect("I-format operation")
        .encode()
}

fn branch(operation: Operation, rs: u8, rt: u8, offset: u16) -> u32 {
    DecodedInstruction::immediate(operation, reg(rt), reg(rs), offset)
        .expect("branch operation")
        .encode()
}

fn jump(operation: Operation, addr: u32) -> u32 {
    DecodedInstruction::jump(operation, addr >> 2)
        .expect("J-format operation")
        .encode()
}

fn jr(rs: u8) -> u32 {
    DecodedInstruction::register(Operation::Jr, reg(0), reg(rs), reg(0), 0)
        .expect("R-format operation")
        .encode()
}

fn loaded(config: CoreConfig, program: &[u32]) -> Simulator {
    let mut sim = Simulator::new(config);
    sim.load(program).expect("program fits");
    sim
}

#[test]
fn three_instruction_program_sums_registers() {
    let mut sim = loaded(
        CoreConfig::default(),
        &[0x2001_0005, 0x2002_000A, 0x0022_1820],
    );

    let outcome = sim.run(3);

    assert_eq!(
        outcome,
        RunOutcome {
            cycles: 3,
            boundary: RunBoundary::CycleBudget
        }
    );
    assert_eq!(sim.read_register(3), Ok(15));
    assert_eq!(sim.read_pc(), TEXT_START + 12);
    assert_eq!(sim.instruction_count(), 3);
    assert!(sim.is_running());
}

#[rstest]
#[case::delay_slot_runs_before_target(true, 1, 3, 16, 3)]
#[case::target_follows_branch_directly(false, 0, 3, 16, 2)]
fn taken_branch_ordering(
    #[case] branch_delay_slots: bool,
    #[case] r1: u32,
    #[case] r3: u32,
    #[case] pc_offset: u32,
    #[case] cycles: u64,
) {
    let config = CoreConfig {
        branch_delay_slots,
        ..CoreConfig::default()
    };
    let mut sim = loaded(
        config,
        &[
            branch(Operation::Beq, 0, 0, 2),
            addi(1, 0, 1),
            addi(2, 0, 2),
            addi(3, 0, 3),
        ],
    );

    sim.run(cycles);

    assert_eq!(sim.read_register(1), Ok(r1));
    assert_eq!(sim.read_register(2), Ok(0));
    assert_eq!(sim.read_register(3), Ok(r3));
    assert_eq!(sim.read_pc(), TEXT_START + pc_offset);
}

#[test]
fn branch_in_delay_slot_enters_pending_target_first() {
    let config = CoreConfig {
        tracing_enabled: true,
        ..CoreConfig::default()
    };
    let mut sim = loaded(
        config,
        &[
            branch(Operation::Beq, 0, 0, 3),
            branch(Operation::Beq, 0, 0, 5),
            addi(2, 0, 2),
            NOP,
            addi(3, 0, 3),
            addi(4, 0, 4),
            addi(5, 0, 5),
            addi(6, 0, 6),
        ],
    );
    let mut events = Vec::new();

    sim.run_with_sink(4, &mut events);

    let fetched: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            TraceEvent::InstructionStart { pc, .. } => Some(*pc - TEXT_START),
            _ => None,
        })
        .collect();
    assert_eq!(fetched, vec![0, 4, 16, 28]);
    assert_eq!(sim.read_register(2), Ok(0));
    assert_eq!(sim.read_register(3), Ok(3));
    assert_eq!(sim.read_register(4), Ok(0));
    assert_eq!(sim.read_register(6), Ok(6));
    assert_eq!(sim.read_pc(), TEXT_START + 32);
}

#[test]
fn not_taken_branch_falls_through() {
    let mut sim = loaded(
        CoreConfig::default(),
        &[branch(Operation::Bne, 0, 0, 2), addi(1, 0, 1), addi(2, 0, 2)],
    );

    sim.run(3);

    assert_eq!(sim.read_register(1), Ok(1));
    assert_eq!(sim.read_register(2), Ok(2));
    assert_eq!(sim.read_pc(), TEXT_START + 12);
}

#[test]
fn pending_target_is_visible_between_cycles() {
    let mut sim = loaded(
        CoreConfig::default(),
        &[branch(Operation::Beq, 0, 0, 2), NOP],
    );

    sim.step();

    assert_eq!(sim.read_pc(), TEXT_START + 4);
    assert_eq!(
        sim.current_state().delay_slot_target(),
        Some(TEXT_START + 12)
    );
    assert_eq!(sim.next_state(), sim.current_state());
}

#[test]
fn call_and_return_through_jal_and_jr() {
    let mut sim = loaded(
        CoreConfig::default(),
        &[
            jump(Operation::Jal, TEXT_START + 16),
            addi(1, 0, 1),
            addi(2, 0, 0x0A),
            SYSCALL,
            jr(31),
            NOP,
        ],
    );

    let outcome = sim.run_to_completion();

    assert_eq!(
        outcome,
        RunOutcome {
            cycles: 6,
            boundary: RunBoundary::Halted
        }
    );
    assert_eq!(sim.read_register(1), Ok(1));
    assert_eq!(sim.read_register(31), Ok(TEXT_START + 8));
    assert_eq!(sim.read_pc(), TEXT_START + 16);
    assert_eq!(sim.run_state(), RunState::Stopped(StopReason::Halted));
}

#[rstest]
#[case::bltzal_taken(Operation::Bltzal, 0xFFFF_FFFF, true)]
#[case::bltzal_not_taken(Operation::Bltzal, 1, false)]
#[case::bgezal_taken(Operation::Bgezal, 0, true)]
#[case::bgezal_not_taken(Operation::Bgezal, 0xFFFF_FFFF, false)]
fn linking_branches_always_write_ra(
    #[case] operation: Operation,
    #[case] rs: u32,
    #[case] taken: bool,
) {
    let mut sim = loaded(CoreConfig::default(), &[branch(operation, 1, 0, 4), NOP]);
    sim.write_register(1, rs).expect("valid register");

    sim.run(2);

    assert_eq!(sim.read_register(31), Ok(TEXT_START + 8));
    let expected_pc = if taken {
        TEXT_START + 20
    } else {
        TEXT_START + 8
    };
    assert_eq!(sim.read_pc(), expected_pc);
}

#[test]
fn jalr_links_to_rd() {
    let jalr = DecodedInstruction::register(Operation::Jalr, reg(5), reg(4), reg(0), 0)
        .expect("R-format operation")
        .encode();
    let mut sim = loaded(CoreConfig::default(), &[jalr, NOP]);
    sim.write_register(4, TEXT_START + 0x40)
        .expect("valid register");

    sim.run(2);

    assert_eq!(sim.read_register(5), Ok(TEXT_START + 4));
    assert_eq!(sim.read_pc(), TEXT_START + 0x40);
}

#[test]
fn halted_machine_ignores_further_runs() {
    let mut sim = loaded(
        CoreConfig::default(),
        &[addi(2, 0, 0x0A), SYSCALL, addi(1, 0, 1)],
    );

    let first = sim.run(10);
    let second = sim.run(10);

    assert_eq!(
        first,
        RunOutcome {
            cycles: 2,
            boundary: RunBoundary::Halted
        }
    );
    assert_eq!(
        second,
        RunOutcome {
            cycles: 0,
            boundary: RunBoundary::Stopped
        }
    );
    assert_eq!(sim.read_register(1), Ok(0));
    assert_eq!(sim.instruction_count(), 2);
}

#[test]
fn fault_leaves_pc_on_the_faulting_instruction() {
    let mut sim = loaded(CoreConfig::default(), &[addi(1, 0, 1), 0xFC00_0000]);

    let outcome = sim.run(5);

    assert_eq!(
        outcome,
        RunOutcome {
            cycles: 2,
            boundary: RunBoundary::Fault {
                cause: FaultCode::IllegalInstruction
            }
        }
    );
    assert_eq!(sim.read_pc(), TEXT_START + 4);
    assert_eq!(sim.read_register(1), Ok(1));
    assert_eq!(sim.instruction_count(), 2);
}

#[test]
fn stop_then_reset_resumes_from_the_top() {
    let mut sim = loaded(CoreConfig::default(), &[addi(1, 1, 1), addi(1, 1, 1)]);

    sim.step();
    sim.stop();
    assert_eq!(
        sim.step(),
        StepOutcome::Stopped(StopReason::Requested)
    );

    sim.reset();
    let outcome = sim.run(2);

    assert_eq!(outcome.cycles, 2);
    assert_eq!(sim.read_register(1), Ok(2));
}

#[test]
fn trace_sink_receives_events_in_execution_order() {
    let config = CoreConfig {
        tracing_enabled: true,
        ..CoreConfig::default()
    };
    let mut sim = loaded(config, &[addi(2, 0, 0x0A), SYSCALL]);
    let mut events = Vec::new();

    sim.run_to_completion_with_sink(&mut events);

    assert_eq!(
        events,
        vec![
            TraceEvent::InstructionStart {
                pc: TEXT_START,
                word: addi(2, 0, 0x0A)
            },
            TraceEvent::InstructionRetired {
                pc: TEXT_START,
                operation: Operation::Addi
            },
            TraceEvent::InstructionStart {
                pc: TEXT_START + 4,
                word: SYSCALL
            },
            TraceEvent::Halted {
                pc: TEXT_START + 4
            },
        ]
    );
}
