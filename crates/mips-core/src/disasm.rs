//! Instruction disassembly.
//!
//! Produces assembler-style text for words in memory. Operands use numeric
//! register names (`$3`); branch and jump operands are shown as absolute
//! target addresses.

use core::fmt;

use crate::decoder::{DecodedInstruction, Decoder, ImmediateFields, JumpFields, RegisterFields};
use crate::encoding::Operation;
use crate::execute::{branch_target, jump_target};
use crate::memory::AddressSpace;

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DisassemblyRow {
    /// Address of the instruction.
    pub addr: u32,
    /// Raw instruction word.
    pub raw_word: u32,
    /// Lower-case mnemonic, or `.word` for an illegal encoding.
    pub mnemonic: String,
    /// Formatted operands, possibly empty.
    pub operands: String,
    /// Whether the word is an illegal encoding.
    pub is_illegal: bool,
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operands.is_empty() {
            f.write_str(&self.mnemonic)
        } else {
            write!(f, "{} {}", self.mnemonic, self.operands)
        }
    }
}

/// Disassembles `word` as if fetched from `addr`.
#[must_use]
pub fn disassemble_word(addr: u32, word: u32) -> DisassemblyRow {
    let decoded = Decoder::decode(word);

    match decoded.operation() {
        Ok(operation) => DisassemblyRow {
            addr,
            raw_word: word,
            mnemonic: operation.mnemonic().to_string(),
            operands: format_operands(operation, &decoded, addr),
            is_illegal: false,
        },
        Err(_) => DisassemblyRow {
            addr,
            raw_word: word,
            mnemonic: ".word".to_string(),
            operands: format!("0x{word:08X} ; ILLEGAL"),
            is_illegal: true,
        },
    }
}

/// Disassembles the instruction at `addr`.
///
/// Returns `None` when `addr` could not be fetched (misaligned or unmapped).
#[must_use]
pub fn disassemble_one(addr: u32, memory: &AddressSpace) -> Option<DisassemblyRow> {
    let word = memory.fetch(addr).ok()?;
    Some(disassemble_word(addr, word))
}

/// Disassembles `count` consecutive words starting at `start`.
///
/// Stops early at the first address that cannot be fetched.
#[must_use]
pub fn disassemble_range(start: u32, count: usize, memory: &AddressSpace) -> Vec<DisassemblyRow> {
    (0..count)
        .map_while(|index| {
            let offset = u32::try_from(index).ok()?.checked_mul(4)?;
            disassemble_one(start.checked_add(offset)?, memory)
        })
        .collect()
}

/// Disassembles `before` rows preceding `center`, the row at `center`, and
/// `after` rows following it. Rows that cannot be fetched are omitted, and the
/// window ends at the top of the address space.
#[must_use]
pub fn disassemble_window(
    center: u32,
    before: usize,
    after: usize,
    memory: &AddressSpace,
) -> Vec<DisassemblyRow> {
    let available_before = u32::try_from(before)
        .unwrap_or(u32::MAX)
        .min(center / 4);
    let first = center - available_before * 4;
    let total = usize::try_from(available_before)
        .unwrap_or(usize::MAX)
        .saturating_add(1)
        .saturating_add(after);

    (0..total)
        .map_while(|index| {
            let offset = u32::try_from(index).ok()?.checked_mul(4)?;
            first.checked_add(offset)
        })
        .filter_map(|addr| disassemble_one(addr, memory))
        .collect()
}

fn format_operands(operation: Operation, decoded: &DecodedInstruction, addr: u32) -> String {
    match decoded {
        DecodedInstruction::Register(fields) => format_register_operands(operation, fields),
        DecodedInstruction::Immediate(fields) => {
            format_immediate_operands(operation, fields, addr)
        }
        DecodedInstruction::Jump(fields) => format_jump_operands(fields, addr),
    }
}

fn format_register_operands(operation: Operation, fields: &RegisterFields) -> String {
    let RegisterFields {
        rs, rt, rd, shamt, ..
    } = fields;

    match operation {
        Operation::Sll | Operation::Srl | Operation::Sra => format!("{rd}, {rt}, {shamt}"),
        Operation::Sllv | Operation::Srlv | Operation::Srav => format!("{rd}, {rt}, {rs}"),
        Operation::Jr | Operation::Mthi | Operation::Mtlo => rs.to_string(),
        Operation::Jalr => format!("{rd}, {rs}"),
        Operation::Mfhi | Operation::Mflo => rd.to_string(),
        Operation::Mult | Operation::Multu | Operation::Div | Operation::Divu => {
            format!("{rs}, {rt}")
        }
        Operation::Syscall => String::new(),
        _ => format!("{rd}, {rs}, {rt}"),
    }
}

#[allow(clippy::cast_possible_wrap)]
fn format_immediate_operands(operation: Operation, fields: &ImmediateFields, addr: u32) -> String {
    let ImmediateFields {
        rs, rt, immediate, ..
    } = fields;
    let signed = *immediate as i16;
    let target = branch_target(addr, *immediate);

    match operation {
        Operation::Beq | Operation::Bne => format!("{rs}, {rt}, 0x{target:08x}"),
        Operation::Blez
        | Operation::Bgtz
        | Operation::Bltz
        | Operation::Bgez
        | Operation::Bltzal
        | Operation::Bgezal => format!("{rs}, 0x{target:08x}"),
        Operation::Andi | Operation::Ori | Operation::Xori => {
            format!("{rt}, {rs}, 0x{immediate:04x}")
        }
        Operation::Lui => format!("{rt}, 0x{immediate:04x}"),
        Operation::Lb
        | Operation::Lh
        | Operation::Lw
        | Operation::Lbu
        | Operation::Lhu
        | Operation::Sb
        | Operation::Sh
        | Operation::Sw => format!("{rt}, {signed}({rs})"),
        _ => format!("{rt}, {rs}, {signed}"),
    }
}

fn format_jump_operands(fields: &JumpFields, addr: u32) -> String {
    format!("0x{:08x}", jump_target(addr, fields.target))
}
