//! Instruction decoder for 32-bit MIPS words.
//!
//! Decoding is total: every word yields one of the three format variants.
//! Whether the opcode/funct combination names a defined instruction is only
//! judged by [`DecodedInstruction::operation`].

use crate::encoding::{
    classify_funct, classify_opcode, classify_regimm, InstructionFormat, Operation,
    OperationEncoding, OPCODE_REGIMM,
};
use crate::fault::FaultCode;
use crate::state::GeneralRegister;

/// Mask of the 26-bit J-format target field.
pub const JUMP_TARGET_MASK: u32 = 0x03FF_FFFF;

/// Extracts bits `[31:26]`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn opcode_field(word: u32) -> u8 {
    (word >> 26) as u8
}

/// Extracts bits `[25:21]`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn rs_field(word: u32) -> u8 {
    ((word >> 21) & 0x1F) as u8
}

/// Extracts bits `[20:16]`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn rt_field(word: u32) -> u8 {
    ((word >> 16) & 0x1F) as u8
}

/// Extracts bits `[15:11]`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn rd_field(word: u32) -> u8 {
    ((word >> 11) & 0x1F) as u8
}

/// Extracts bits `[10:6]`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn shamt_field(word: u32) -> u8 {
    ((word >> 6) & 0x1F) as u8
}

/// Extracts bits `[5:0]`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn funct_field(word: u32) -> u8 {
    (word & 0x3F) as u8
}

/// Extracts bits `[15:0]`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn immediate_field(word: u32) -> u16 {
    (word & 0xFFFF) as u16
}

/// R-format fields: `opcode rs rt rd shamt funct`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub struct RegisterFields {
    pub opcode: u8,
    pub rs: GeneralRegister,
    pub rt: GeneralRegister,
    pub rd: GeneralRegister,
    pub shamt: u8,
    pub funct: u8,
}

/// I-format fields: `opcode rs rt immediate`.
///
/// The immediate is kept raw; widening depends on the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub struct ImmediateFields {
    pub opcode: u8,
    pub rs: GeneralRegister,
    pub rt: GeneralRegister,
    pub immediate: u16,
}

/// J-format fields: `opcode target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct JumpFields {
    /// 6-bit primary opcode.
    pub opcode: u8,
    /// 26-bit word index within the current 256 MiB segment.
    pub target: u32,
}

/// A raw word split into the fields of its format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DecodedInstruction {
    /// Opcode `000000`.
    Register(RegisterFields),
    /// Every opcode that is neither R- nor J-format.
    Immediate(ImmediateFields),
    /// `j` and `jal`.
    Jump(JumpFields),
}

impl DecodedInstruction {
    /// Returns the 6-bit primary opcode.
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        match self {
            Self::Register(fields) => fields.opcode,
            Self::Immediate(fields) => fields.opcode,
            Self::Jump(fields) => fields.opcode,
        }
    }

    /// Returns the format variant.
    #[must_use]
    pub const fn format(&self) -> InstructionFormat {
        match self {
            Self::Register(_) => InstructionFormat::Register,
            Self::Immediate(_) => InstructionFormat::Immediate,
            Self::Jump(_) => InstructionFormat::Jump,
        }
    }

    /// Resolves the instruction tag.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::IllegalInstruction`] when the opcode, funct or
    /// REGIMM selector is not assigned.
    pub fn operation(&self) -> Result<Operation, FaultCode> {
        let operation = match self {
            Self::Register(fields) => classify_funct(fields.funct),
            Self::Immediate(fields) if fields.opcode == OPCODE_REGIMM => {
                classify_regimm(fields.rt.number())
            }
            Self::Immediate(fields) => classify_opcode(fields.opcode),
            Self::Jump(fields) => classify_opcode(fields.opcode),
        };
        operation.ok_or(FaultCode::IllegalInstruction)
    }

    /// Re-encodes the fields into a 32-bit word. Inverse of [`Decoder::decode`].
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn encode(&self) -> u32 {
        match self {
            Self::Register(fields) => {
                (u32::from(fields.opcode & 0x3F) << 26)
                    | (u32::from(fields.rs.number()) << 21)
                    | (u32::from(fields.rt.number()) << 16)
                    | (u32::from(fields.rd.number()) << 11)
                    | (u32::from(fields.shamt & 0x1F) << 6)
                    | u32::from(fields.funct & 0x3F)
            }
            Self::Immediate(fields) => {
                (u32::from(fields.opcode & 0x3F) << 26)
                    | (u32::from(fields.rs.number()) << 21)
                    | (u32::from(fields.rt.number()) << 16)
                    | u32::from(fields.immediate)
            }
            Self::Jump(fields) => {
                (u32::from(fields.opcode & 0x3F) << 26) | (fields.target & JUMP_TARGET_MASK)
            }
        }
    }

    /// Builds an R-format instruction for `operation`.
    ///
    /// Returns `None` when `operation` is not R-format.
    #[must_use]
    pub fn register(
        operation: Operation,
        rd: GeneralRegister,
        rs: GeneralRegister,
        rt: GeneralRegister,
        shamt: u8,
    ) -> Option<Self> {
        let OperationEncoding::Special { funct } = operation.encoding()? else {
            return None;
        };
        Some(Self::Register(RegisterFields {
            opcode: 0,
            rs,
            rt,
            rd,
            shamt: shamt & 0x1F,
            funct,
        }))
    }

    /// Builds an I-format instruction for `operation`.
    ///
    /// For the REGIMM branches `rt` is replaced by the operation's selector.
    /// Returns `None` when `operation` is not I-format.
    #[must_use]
    pub fn immediate(
        operation: Operation,
        rt: GeneralRegister,
        rs: GeneralRegister,
        immediate: u16,
    ) -> Option<Self> {
        let (opcode, rt) = match operation.encoding()? {
            OperationEncoding::RegImm { rt: selector } => {
                (OPCODE_REGIMM, GeneralRegister::from_field(selector))
            }
            OperationEncoding::Primary { opcode }
                if operation.format() == InstructionFormat::Immediate =>
            {
                (opcode, rt)
            }
            _ => return None,
        };
        Some(Self::Immediate(ImmediateFields {
            opcode,
            rs,
            rt,
            immediate,
        }))
    }

    /// Builds a J-format instruction for `operation`.
    ///
    /// Returns `None` when `operation` is not J-format.
    #[must_use]
    pub fn jump(operation: Operation, target: u32) -> Option<Self> {
        match operation.encoding()? {
            OperationEncoding::Primary { opcode }
                if operation.format() == InstructionFormat::Jump =>
            {
                Some(Self::Jump(JumpFields {
                    opcode,
                    target: target & JUMP_TARGET_MASK,
                }))
            }
            _ => None,
        }
    }
}

/// Instruction decoder.
pub struct Decoder;

impl Decoder {
    /// Splits a 32-bit word into the fields of the format selected by its
    /// opcode. Never fails.
    #[must_use]
    pub const fn decode(word: u32) -> DecodedInstruction {
        let opcode = opcode_field(word);

        match InstructionFormat::from_opcode(opcode) {
            InstructionFormat::Register => DecodedInstruction::Register(RegisterFields {
                opcode,
                rs: GeneralRegister::from_field(rs_field(word)),
                rt: GeneralRegister::from_field(rt_field(word)),
                rd: GeneralRegister::from_field(rd_field(word)),
                shamt: shamt_field(word),
                funct: funct_field(word),
            }),
            InstructionFormat::Immediate => DecodedInstruction::Immediate(ImmediateFields {
                opcode,
                rs: GeneralRegister::from_field(rs_field(word)),
                rt: GeneralRegister::from_field(rt_field(word)),
                immediate: immediate_field(word),
            }),
            InstructionFormat::Jump => DecodedInstruction::Jump(JumpFields {
                opcode,
                target: word & JUMP_TARGET_MASK,
            }),
        }
    }
}
