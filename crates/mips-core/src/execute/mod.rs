//! Instruction execution and commit.
//!
//! Execution is split in two phases so faults are precise:
//! 1. [`execute_instruction`] reads only the committed generation and memory
//!    and accumulates every side effect in an [`ExecuteState`].
//! 2. [`commit_execution`] applies them to the next generation: memory store
//!    first, then the destination register and `HI`/`LO`, then `PC`.
//!
//! A faulting instruction never reaches phase 2.

#![allow(clippy::similar_names, clippy::too_many_lines)]

/// Integer arithmetic with trap detection.
pub mod alu;
mod helpers;

pub use alu::HiLo;
pub use helpers::{
    branch_target, effective_address, jump_target, link_address, sign_extend_byte,
    sign_extend_halfword,
};

use tracing::{debug, warn};

use crate::decoder::{DecodedInstruction, ImmediateFields, JumpFields, RegisterFields};
use crate::encoding::Operation;
use crate::memory::{validate_alignment, AccessWidth, AddressSpace};
use crate::{ArchitecturalState, CoreConfig, FaultCode, GeneralRegister};

/// `$v0` service number that halts the simulator.
pub const SYSCALL_EXIT: u32 = 0x0A;

/// A data memory access performed or requested by one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryAccess {
    /// Effective address.
    pub addr: u32,
    /// Access width.
    pub width: AccessWidth,
    /// Loaded value (zero-extended) or stored value (masked to `width`).
    pub value: u32,
}

/// Side effects accumulated while executing one instruction.
///
/// Nothing here is visible until [`commit_execution`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteState {
    /// Register written by the instruction.
    pub dest_reg: Option<GeneralRegister>,
    /// Value written to `dest_reg`.
    pub dest_value: Option<u32>,
    /// New `HI` value.
    pub hi: Option<u32>,
    /// New `LO` value.
    pub lo: Option<u32>,
    /// Load performed during execution, kept for tracing.
    pub memory_read: Option<MemoryAccess>,
    /// Store applied at commit.
    pub memory_write: Option<MemoryAccess>,
    /// Target of a taken branch or jump.
    pub control_transfer: Option<u32>,
    /// Halt service requested.
    pub halt: bool,
}

impl ExecuteState {
    fn write_register(&mut self, reg: GeneralRegister, value: u32) {
        self.dest_reg = Some(reg);
        self.dest_value = Some(value);
    }
}

/// Executes one decoded instruction against the committed generation.
///
/// # Errors
///
/// Returns the raised [`FaultCode`]; no side effect has been recorded
/// anywhere in that case.
pub fn execute_instruction(
    instr: &DecodedInstruction,
    current: &ArchitecturalState,
    memory: &AddressSpace,
) -> Result<ExecuteState, FaultCode> {
    let operation = instr.operation()?;

    match instr {
        DecodedInstruction::Register(fields) => {
            execute_register_format(operation, fields, current)
        }
        DecodedInstruction::Immediate(fields) => {
            execute_immediate_format(operation, fields, current, memory)
        }
        DecodedInstruction::Jump(fields) => execute_jump_format(operation, fields, current),
    }
}

/// Executes an R-format instruction.
///
/// # Errors
///
/// Returns [`FaultCode::ArithmeticOverflow`] for a signed `add`/`sub`
/// overflow, [`FaultCode::DivisionByZero`] for a zero divisor, and
/// [`FaultCode::IllegalInstruction`] when `operation` is not R-format.
pub fn execute_register_format(
    operation: Operation,
    fields: &RegisterFields,
    current: &ArchitecturalState,
) -> Result<ExecuteState, FaultCode> {
    let rs = current.gpr(fields.rs);
    let rt = current.gpr(fields.rt);
    let shamt = u32::from(fields.shamt);
    let rd = fields.rd;
    let mut exec = ExecuteState::default();

    match operation {
        Operation::Sll => exec.write_register(rd, alu::shift_left_logical(rt, shamt)),
        Operation::Srl => exec.write_register(rd, alu::shift_right_logical(rt, shamt)),
        Operation::Sra => exec.write_register(rd, alu::shift_right_arithmetic(rt, shamt)),
        Operation::Sllv => exec.write_register(rd, alu::shift_left_logical(rt, rs)),
        Operation::Srlv => exec.write_register(rd, alu::shift_right_logical(rt, rs)),
        Operation::Srav => exec.write_register(rd, alu::shift_right_arithmetic(rt, rs)),
        Operation::Jr => exec.control_transfer = Some(rs),
        Operation::Jalr => {
            exec.write_register(rd, current.pc().wrapping_add(4));
            exec.control_transfer = Some(rs);
        }
        Operation::Syscall => {
            let service = current.gpr(GeneralRegister::V0);
            if service == SYSCALL_EXIT {
                exec.halt = true;
            } else {
                warn!(pc = current.pc(), service, "unsupported syscall service ignored");
            }
        }
        Operation::Mfhi => exec.write_register(rd, current.hi()),
        Operation::Mthi => exec.hi = Some(rs),
        Operation::Mflo => exec.write_register(rd, current.lo()),
        Operation::Mtlo => exec.lo = Some(rs),
        Operation::Mult => apply_hi_lo(&mut exec, alu::multiply_signed(rs, rt)),
        Operation::Multu => apply_hi_lo(&mut exec, alu::multiply_unsigned(rs, rt)),
        Operation::Div => apply_hi_lo(&mut exec, alu::divide_signed(rs, rt)?),
        Operation::Divu => apply_hi_lo(&mut exec, alu::divide_unsigned(rs, rt)?),
        Operation::Add => exec.write_register(rd, alu::add_signed(rs, rt)?),
        Operation::Addu => exec.write_register(rd, rs.wrapping_add(rt)),
        Operation::Sub => exec.write_register(rd, alu::sub_signed(rs, rt)?),
        Operation::Subu => exec.write_register(rd, rs.wrapping_sub(rt)),
        Operation::And => exec.write_register(rd, rs & rt),
        Operation::Or => exec.write_register(rd, rs | rt),
        Operation::Xor => exec.write_register(rd, rs ^ rt),
        Operation::Nor => exec.write_register(rd, !(rs | rt)),
        Operation::Slt => exec.write_register(rd, alu::set_less_than_signed(rs, rt)),
        Operation::Sltu => exec.write_register(rd, alu::set_less_than_unsigned(rs, rt)),
        Operation::Bltz
        | Operation::Bgez
        | Operation::Bltzal
        | Operation::Bgezal
        | Operation::J
        | Operation::Jal
        | Operation::Beq
        | Operation::Bne
        | Operation::Blez
        | Operation::Bgtz
        | Operation::Addi
        | Operation::Addiu
        | Operation::Slti
        | Operation::Sltiu
        | Operation::Andi
        | Operation::Ori
        | Operation::Xori
        | Operation::Lui
        | Operation::Lb
        | Operation::Lh
        | Operation::Lw
        | Operation::Lbu
        | Operation::Lhu
        | Operation::Sb
        | Operation::Sh
        | Operation::Sw => return Err(FaultCode::IllegalInstruction),
    }

    Ok(exec)
}

fn apply_hi_lo(exec: &mut ExecuteState, result: HiLo) {
    exec.hi = Some(result.hi);
    exec.lo = Some(result.lo);
}

/// Executes an I-format instruction, including the REGIMM branches.
///
/// Loads read memory here; stores are only validated and recorded.
///
/// # Errors
///
/// Returns [`FaultCode::ArithmeticOverflow`] for an `addi` overflow,
/// [`FaultCode::UnalignedAccess`] for a misaligned load or store, and
/// [`FaultCode::IllegalInstruction`] when `operation` is not I-format.
pub fn execute_immediate_format(
    operation: Operation,
    fields: &ImmediateFields,
    current: &ArchitecturalState,
    memory: &AddressSpace,
) -> Result<ExecuteState, FaultCode> {
    let Some(extension) = operation.immediate_extension() else {
        return Err(FaultCode::IllegalInstruction);
    };
    let pc = current.pc();
    let rs = current.gpr(fields.rs);
    let rt = current.gpr(fields.rt);
    let imm = extension.extend(fields.immediate);
    let target = branch_target(pc, fields.immediate);
    let mut exec = ExecuteState::default();

    match operation {
        Operation::Beq => take_branch_if(&mut exec, rs == rt, target),
        Operation::Bne => take_branch_if(&mut exec, rs != rt, target),
        Operation::Blez => take_branch_if(&mut exec, as_signed(rs) <= 0, target),
        Operation::Bgtz => take_branch_if(&mut exec, as_signed(rs) > 0, target),
        Operation::Bltz => take_branch_if(&mut exec, as_signed(rs) < 0, target),
        Operation::Bgez => take_branch_if(&mut exec, as_signed(rs) >= 0, target),
        Operation::Bltzal => {
            exec.write_register(GeneralRegister::RA, link_address(pc));
            take_branch_if(&mut exec, as_signed(rs) < 0, target);
        }
        Operation::Bgezal => {
            exec.write_register(GeneralRegister::RA, link_address(pc));
            take_branch_if(&mut exec, as_signed(rs) >= 0, target);
        }
        Operation::Addi => exec.write_register(fields.rt, alu::add_signed(rs, imm)?),
        Operation::Addiu => exec.write_register(fields.rt, rs.wrapping_add(imm)),
        Operation::Slti => exec.write_register(fields.rt, alu::set_less_than_signed(rs, imm)),
        Operation::Sltiu => {
            exec.write_register(fields.rt, alu::set_less_than_unsigned(rs, imm));
        }
        Operation::Andi => exec.write_register(fields.rt, rs & imm),
        Operation::Ori => exec.write_register(fields.rt, rs | imm),
        Operation::Xori => exec.write_register(fields.rt, rs ^ imm),
        Operation::Lui => exec.write_register(fields.rt, imm),
        Operation::Lb => load(&mut exec, fields, rs, memory, AccessWidth::Byte, true)?,
        Operation::Lh => load(&mut exec, fields, rs, memory, AccessWidth::Half, true)?,
        Operation::Lw => load(&mut exec, fields, rs, memory, AccessWidth::Word, false)?,
        Operation::Lbu => load(&mut exec, fields, rs, memory, AccessWidth::Byte, false)?,
        Operation::Lhu => load(&mut exec, fields, rs, memory, AccessWidth::Half, false)?,
        Operation::Sb => store(&mut exec, fields, rs, rt, AccessWidth::Byte)?,
        Operation::Sh => store(&mut exec, fields, rs, rt, AccessWidth::Half)?,
        Operation::Sw => store(&mut exec, fields, rs, rt, AccessWidth::Word)?,
        Operation::Sll
        | Operation::Srl
        | Operation::Sra
        | Operation::Sllv
        | Operation::Srlv
        | Operation::Srav
        | Operation::Jr
        | Operation::Jalr
        | Operation::Syscall
        | Operation::Mfhi
        | Operation::Mthi
        | Operation::Mflo
        | Operation::Mtlo
        | Operation::Mult
        | Operation::Multu
        | Operation::Div
        | Operation::Divu
        | Operation::Add
        | Operation::Addu
        | Operation::Sub
        | Operation::Subu
        | Operation::And
        | Operation::Or
        | Operation::Xor
        | Operation::Nor
        | Operation::Slt
        | Operation::Sltu
        | Operation::J
        | Operation::Jal => return Err(FaultCode::IllegalInstruction),
    }

    Ok(exec)
}

#[allow(clippy::cast_possible_wrap)]
const fn as_signed(value: u32) -> i32 {
    value as i32
}

fn take_branch_if(exec: &mut ExecuteState, taken: bool, target: u32) {
    if taken {
        exec.control_transfer = Some(target);
    }
}

fn load(
    exec: &mut ExecuteState,
    fields: &ImmediateFields,
    base: u32,
    memory: &AddressSpace,
    width: AccessWidth,
    sign_extend: bool,
) -> Result<(), FaultCode> {
    let addr = effective_address(base, fields.immediate);
    let raw = memory.read(addr, width)?;
    let value = match (width, sign_extend) {
        (AccessWidth::Byte, true) => sign_extend_byte(raw.to_le_bytes()[0]),
        (AccessWidth::Half, true) => {
            let [low, high, _, _] = raw.to_le_bytes();
            sign_extend_halfword(u16::from_le_bytes([low, high]))
        }
        _ => raw,
    };
    exec.memory_read = Some(MemoryAccess {
        addr,
        width,
        value: raw,
    });
    exec.write_register(fields.rt, value);
    Ok(())
}

fn store(
    exec: &mut ExecuteState,
    fields: &ImmediateFields,
    base: u32,
    value: u32,
    width: AccessWidth,
) -> Result<(), FaultCode> {
    let addr = effective_address(base, fields.immediate);
    validate_alignment(addr, width)?;
    exec.memory_write = Some(MemoryAccess {
        addr,
        width,
        value: value & width.value_mask(),
    });
    Ok(())
}

/// Executes a J-format instruction.
///
/// # Errors
///
/// Returns [`FaultCode::IllegalInstruction`] when `operation` is not
/// J-format.
pub fn execute_jump_format(
    operation: Operation,
    fields: &JumpFields,
    current: &ArchitecturalState,
) -> Result<ExecuteState, FaultCode> {
    let pc = current.pc();
    let mut exec = ExecuteState::default();
    exec.control_transfer = Some(jump_target(pc, fields.target));

    match operation {
        Operation::J => {}
        Operation::Jal => exec.write_register(GeneralRegister::RA, link_address(pc)),
        _ => return Err(FaultCode::IllegalInstruction),
    }

    Ok(exec)
}

/// Applies the side effects of a retired instruction to `next` and memory.
///
/// `next` must hold a copy of the committed generation. `PC` advances to the
/// pending delay-slot target when one exists, otherwise sequentially; a new
/// control transfer becomes pending (or, with delay slots disabled, is taken
/// immediately).
///
/// # Errors
///
/// Returns [`FaultCode::UnalignedAccess`] when the recorded store is
/// misaligned; `next` is left untouched in that case.
pub fn commit_execution(
    next: &mut ArchitecturalState,
    memory: &mut AddressSpace,
    exec: &ExecuteState,
    config: &CoreConfig,
) -> Result<(), FaultCode> {
    if let Some(write) = exec.memory_write {
        memory.write(write.addr, write.width, write.value)?;
    }

    if let (Some(reg), Some(value)) = (exec.dest_reg, exec.dest_value) {
        next.set_gpr(reg, value);
    }
    if let Some(hi) = exec.hi {
        next.set_hi(hi);
    }
    if let Some(lo) = exec.lo {
        next.set_lo(lo);
    }

    let sequential = next.pc().wrapping_add(4);
    let pending = next.delay_slot_target();

    if config.branch_delay_slots {
        next.set_pc(pending.unwrap_or(sequential));
        next.set_delay_slot_target(exec.control_transfer);
    } else {
        next.set_pc(exec.control_transfer.or(pending).unwrap_or(sequential));
        next.set_delay_slot_target(None);
    }

    if let Some(target) = exec.control_transfer {
        debug!(target, delayed = config.branch_delay_slots, "control transfer");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{commit_execution, execute_instruction, ExecuteState, MemoryAccess};
    use crate::decoder::{DecodedInstruction, Decoder};
    use crate::encoding::Operation;
    use crate::memory::{AccessWidth, AddressSpace, DATA_START, TEXT_START};
    use crate::{ArchitecturalState, CoreConfig, FaultCode, GeneralRegister};

    fn reg(bits: u8) -> GeneralRegister {
        GeneralRegister::from_field(bits)
    }

    fn r_type(operation: Operation, rd: u8, rs: u8, rt: u8) -> DecodedInstruction {
        DecodedInstruction::register(operation, reg(rd), reg(rs), reg(rt), 0)
            .expect("r-format operation")
    }

    fn i_type(operation: Operation, rt: u8, rs: u8, imm: u16) -> DecodedInstruction {
        DecodedInstruction::immediate(operation, reg(rt), reg(rs), imm)
            .expect("i-format operation")
    }

    fn state_with(values: &[(u8, u32)]) -> ArchitecturalState {
        let mut state = ArchitecturalState::with_pc(TEXT_START);
        for (bits, value) in values {
            state.set_gpr(reg(*bits), *value);
        }
        state
    }

    fn run(
        instr: &DecodedInstruction,
        state: &ArchitecturalState,
    ) -> Result<ExecuteState, FaultCode> {
        execute_instruction(instr, state, &AddressSpace::standard())
    }

    #[rstest]
    #[case(Operation::Addu, 0x7FFF_FFFF, 1, 0x8000_0000)]
    #[case(Operation::Subu, 0, 1, 0xFFFF_FFFF)]
    #[case(Operation::And, 0xF0F0_F0F0, 0xFF00_FF00, 0xF000_F000)]
    #[case(Operation::Or, 0xF0F0_0000, 0x0000_0F0F, 0xF0F0_0F0F)]
    #[case(Operation::Xor, 0xFFFF_0000, 0xFF00_FF00, 0x00FF_FF00)]
    #[case(Operation::Nor, 0xF0F0_0000, 0x0000_0F0F, 0x0F0F_F0F0)]
    #[case(Operation::Slt, 0xFFFF_FFFF, 0, 1)]
    #[case(Operation::Sltu, 0xFFFF_FFFF, 0, 0)]
    #[case(Operation::Sllv, 36, 0x0000_0001, 0x0000_0010)]
    #[case(Operation::Srav, 4, 0x8000_0000, 0xF800_0000)]
    fn register_alu_operations(
        #[case] operation: Operation,
        #[case] rs: u32,
        #[case] rt: u32,
        #[case] expected: u32,
    ) {
        let state = state_with(&[(1, rs), (2, rt)]);
        let exec = run(&r_type(operation, 3, 1, 2), &state).expect("retires");

        assert_eq!(exec.dest_reg, Some(reg(3)));
        assert_eq!(exec.dest_value, Some(expected));
    }

    #[test]
    fn add_overflow_raises_fault() {
        let state = state_with(&[(1, 0x7FFF_FFFF), (2, 1)]);
        assert_eq!(
            run(&r_type(Operation::Add, 3, 1, 2), &state),
            Err(FaultCode::ArithmeticOverflow)
        );
    }

    #[test]
    fn shifts_use_shamt_field() {
        let state = state_with(&[(2, 0x8000_0001)]);
        let sra = DecodedInstruction::register(Operation::Sra, reg(3), reg(0), reg(2), 1)
            .expect("r-format operation");
        let srl = DecodedInstruction::register(Operation::Srl, reg(3), reg(0), reg(2), 1)
            .expect("r-format operation");
        let sll = DecodedInstruction::register(Operation::Sll, reg(3), reg(0), reg(2), 1)
            .expect("r-format operation");

        assert_eq!(run(&sra, &state).expect("retires").dest_value, Some(0xC000_0000));
        assert_eq!(run(&srl, &state).expect("retires").dest_value, Some(0x4000_0000));
        assert_eq!(run(&sll, &state).expect("retires").dest_value, Some(0x0000_0002));
    }

    #[test]
    fn divide_records_quotient_and_remainder() {
        let state = state_with(&[(1, 10), (2, 3)]);
        let exec = run(&r_type(Operation::Div, 0, 1, 2), &state).expect("retires");

        assert_eq!(exec.lo, Some(3));
        assert_eq!(exec.hi, Some(1));
        assert_eq!(exec.dest_reg, None);
    }

    #[test]
    fn divide_by_zero_raises_fault() {
        let state = state_with(&[(1, 10)]);
        assert_eq!(
            run(&r_type(Operation::Divu, 0, 1, 2), &state),
            Err(FaultCode::DivisionByZero)
        );
    }

    #[test]
    fn hi_lo_moves() {
        let mut state = state_with(&[(1, 0xAAAA_5555)]);
        state.set_hi(0x1111_0000);
        state.set_lo(0x0000_2222);

        let mfhi = run(&r_type(Operation::Mfhi, 4, 0, 0), &state).expect("retires");
        let mflo = run(&r_type(Operation::Mflo, 4, 0, 0), &state).expect("retires");
        let mthi = run(&r_type(Operation::Mthi, 0, 1, 0), &state).expect("retires");
        let mtlo = run(&r_type(Operation::Mtlo, 0, 1, 0), &state).expect("retires");

        assert_eq!(mfhi.dest_value, Some(0x1111_0000));
        assert_eq!(mflo.dest_value, Some(0x0000_2222));
        assert_eq!((mthi.hi, mthi.lo), (Some(0xAAAA_5555), None));
        assert_eq!((mtlo.hi, mtlo.lo), (None, Some(0xAAAA_5555)));
    }

    #[test]
    fn jump_register_links_next_instruction() {
        let state = state_with(&[(5, 0x0040_0100)]);

        let jr = run(&r_type(Operation::Jr, 0, 5, 0), &state).expect("retires");
        let jalr = run(&r_type(Operation::Jalr, 31, 5, 0), &state).expect("retires");

        assert_eq!(jr.control_transfer, Some(0x0040_0100));
        assert_eq!(jr.dest_reg, None);
        assert_eq!(jalr.control_transfer, Some(0x0040_0100));
        assert_eq!(jalr.dest_value, Some(TEXT_START + 4));
    }

    #[test]
    fn syscall_halts_only_for_exit_service() {
        let exit = state_with(&[(2, 0x0A)]);
        let print = state_with(&[(2, 0x01)]);
        let syscall = Decoder::decode(0x0000_000C);

        assert!(run(&syscall, &exit).expect("retires").halt);
        assert!(!run(&syscall, &print).expect("retires").halt);
    }

    #[rstest]
    #[case(Operation::Addi, 0xFFFF_FFFF, 0x0001, 0)]
    #[case(Operation::Addiu, 0x0000_0010, 0xFFF0, 0)]
    #[case(Operation::Slti, 0xFFFF_FFFE, 0xFFFF, 1)]
    #[case(Operation::Sltiu, 0x0000_0001, 0xFFFF, 1)]
    #[case(Operation::Andi, 0xFFFF_FFFF, 0x8001, 0x0000_8001)]
    #[case(Operation::Ori, 0x1234_0000, 0x8000, 0x1234_8000)]
    #[case(Operation::Xori, 0x0000_FFFF, 0xFFFF, 0)]
    #[case(Operation::Lui, 0xDEAD_BEEF, 0x1234, 0x1234_0000)]
    fn immediate_alu_operations(
        #[case] operation: Operation,
        #[case] rs: u32,
        #[case] imm: u16,
        #[case] expected: u32,
    ) {
        let state = state_with(&[(1, rs)]);
        let exec = run(&i_type(operation, 2, 1, imm), &state).expect("retires");

        assert_eq!(exec.dest_reg, Some(reg(2)));
        assert_eq!(exec.dest_value, Some(expected));
    }

    #[test]
    fn addi_overflow_raises_fault() {
        let state = state_with(&[(1, 0x7FFF_FFFF)]);
        assert_eq!(
            run(&i_type(Operation::Addi, 2, 1, 1), &state),
            Err(FaultCode::ArithmeticOverflow)
        );
    }

    #[rstest]
    #[case(Operation::Beq, 7, 7, true)]
    #[case(Operation::Beq, 7, 8, false)]
    #[case(Operation::Bne, 7, 8, true)]
    #[case(Operation::Blez, 0, 0, true)]
    #[case(Operation::Blez, 1, 0, false)]
    #[case(Operation::Bgtz, 1, 0, true)]
    #[case(Operation::Bgtz, 0x8000_0000, 0, false)]
    #[case(Operation::Bltz, 0xFFFF_FFFF, 0, true)]
    #[case(Operation::Bgez, 0, 0, true)]
    fn branch_conditions(
        #[case] operation: Operation,
        #[case] rs: u32,
        #[case] rt: u32,
        #[case] taken: bool,
    ) {
        let state = state_with(&[(1, rs), (2, rt)]);
        let exec = run(&i_type(operation, 2, 1, 0x0004), &state).expect("retires");

        let expected = taken.then_some(TEXT_START + 4 + 16);
        assert_eq!(exec.control_transfer, expected);
        assert_eq!(exec.dest_reg, None);
    }

    #[test]
    fn and_link_branches_always_write_return_address() {
        let state = state_with(&[(1, 5)]);

        let bltzal = i_type(Operation::Bltzal, 0, 1, 0x0010);
        let bgezal = i_type(Operation::Bgezal, 0, 1, 0x0010);

        let not_taken = run(&bltzal, &state).expect("retires");
        let taken = run(&bgezal, &state).expect("retires");

        assert_eq!(not_taken.control_transfer, None);
        assert_eq!(not_taken.dest_reg, Some(GeneralRegister::RA));
        assert_eq!(not_taken.dest_value, Some(TEXT_START + 8));
        assert_eq!(taken.control_transfer, Some(TEXT_START + 4 + 0x40));
        assert_eq!(taken.dest_value, Some(TEXT_START + 8));
    }

    #[test]
    fn jumps_use_pseudo_direct_target_and_jal_links() {
        let state = state_with(&[]);
        let j = DecodedInstruction::jump(Operation::J, 0x0010_0040).expect("j-format operation");
        let jal =
            DecodedInstruction::jump(Operation::Jal, 0x0010_0040).expect("j-format operation");

        let j = run(&j, &state).expect("retires");
        let jal = run(&jal, &state).expect("retires");

        assert_eq!(j.control_transfer, Some(0x0040_0100));
        assert_eq!(j.dest_reg, None);
        assert_eq!(jal.control_transfer, Some(0x0040_0100));
        assert_eq!(jal.dest_reg, Some(GeneralRegister::RA));
        assert_eq!(jal.dest_value, Some(TEXT_START + 8));
    }

    #[test]
    fn loads_extend_per_variant() {
        let mut memory = AddressSpace::standard();
        memory.write32(DATA_START, 0x8081_F0FF).expect("aligned write");
        let state = state_with(&[(1, DATA_START)]);

        let value = |operation, offset| {
            execute_instruction(&i_type(operation, 2, 1, offset), &state, &memory)
                .expect("retires")
                .dest_value
        };

        assert_eq!(value(Operation::Lb, 0), Some(0xFFFF_FFFF));
        assert_eq!(value(Operation::Lbu, 0), Some(0x0000_00FF));
        assert_eq!(value(Operation::Lb, 1), Some(0xFFFF_FFF0));
        assert_eq!(value(Operation::Lh, 2), Some(0xFFFF_8081));
        assert_eq!(value(Operation::Lhu, 2), Some(0x0000_8081));
        assert_eq!(value(Operation::Lw, 0), Some(0x8081_F0FF));
    }

    #[test]
    fn unaligned_load_and_store_fault() {
        let state = state_with(&[(1, DATA_START), (2, 1)]);

        assert_eq!(
            run(&i_type(Operation::Lw, 2, 1, 2), &state),
            Err(FaultCode::UnalignedAccess)
        );
        assert_eq!(
            run(&i_type(Operation::Sh, 2, 1, 1), &state),
            Err(FaultCode::UnalignedAccess)
        );
    }

    #[test]
    fn stores_are_deferred_to_commit_and_masked() {
        let mut memory = AddressSpace::standard();
        memory.write32(DATA_START, 0xAABB_CCDD).expect("aligned write");
        let current = state_with(&[(1, DATA_START), (2, 0x1234_5678)]);

        let exec = execute_instruction(&i_type(Operation::Sb, 2, 1, 2), &current, &memory)
            .expect("retires");
        assert_eq!(
            exec.memory_write,
            Some(MemoryAccess {
                addr: DATA_START + 2,
                width: AccessWidth::Byte,
                value: 0x78,
            })
        );
        assert_eq!(memory.read32(DATA_START), Ok(0xAABB_CCDD));

        let mut next = current;
        commit_execution(&mut next, &mut memory, &exec, &CoreConfig::default())
            .expect("commit succeeds");
        assert_eq!(memory.read32(DATA_START), Ok(0xAA78_CCDD));
    }

    #[test]
    fn illegal_encoding_is_reported_before_any_effect() {
        let state = state_with(&[]);
        assert_eq!(
            run(&Decoder::decode(0xFC00_0000), &state),
            Err(FaultCode::IllegalInstruction)
        );
    }

    #[test]
    fn commit_enters_pending_target_after_delay_slot() {
        let config = CoreConfig::default();
        let mut memory = AddressSpace::standard();
        let mut next = ArchitecturalState::with_pc(TEXT_START);

        let branch = ExecuteState {
            control_transfer: Some(0x0040_0100),
            ..ExecuteState::default()
        };
        commit_execution(&mut next, &mut memory, &branch, &config).expect("commit succeeds");
        assert_eq!(next.pc(), TEXT_START + 4);
        assert_eq!(next.delay_slot_target(), Some(0x0040_0100));

        commit_execution(&mut next, &mut memory, &ExecuteState::default(), &config)
            .expect("commit succeeds");
        assert_eq!(next.pc(), 0x0040_0100);
        assert_eq!(next.delay_slot_target(), None);
    }

    #[test]
    fn commit_without_delay_slots_redirects_immediately() {
        let config = CoreConfig {
            branch_delay_slots: false,
            ..CoreConfig::default()
        };
        let mut memory = AddressSpace::standard();
        let mut next = ArchitecturalState::with_pc(TEXT_START);
        let branch = ExecuteState {
            control_transfer: Some(0x0040_0100),
            ..ExecuteState::default()
        };

        commit_execution(&mut next, &mut memory, &branch, &config).expect("commit succeeds");

        assert_eq!(next.pc(), 0x0040_0100);
        assert_eq!(next.delay_slot_target(), None);
    }

    #[test]
    fn commit_never_writes_zero_register() {
        let mut memory = AddressSpace::standard();
        let mut next = ArchitecturalState::with_pc(TEXT_START);
        let exec = ExecuteState {
            dest_reg: Some(GeneralRegister::ZERO),
            dest_value: Some(0xFFFF_FFFF),
            ..ExecuteState::default()
        };

        commit_execution(&mut next, &mut memory, &exec, &CoreConfig::default())
            .expect("commit succeeds");

        assert_eq!(next.gpr(GeneralRegister::ZERO), 0);
    }
}
