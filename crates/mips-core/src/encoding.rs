//! Opcode, funct and REGIMM selector tables.
//!
//! [`OPERATION_TABLE`] is the single source of truth mapping raw encodings to
//! the closed [`Operation`] set. Its uniqueness and coverage are checked at
//! compile time, so no encoding can be assigned twice and no operation can be
//! left without an encoding.

/// Primary opcode selecting R-format (function chosen by `funct`).
pub const OPCODE_SPECIAL: u8 = 0x00;
/// Primary opcode selecting the REGIMM branch group (selector in `rt`).
pub const OPCODE_REGIMM: u8 = 0x01;
/// Primary opcode of `j`.
pub const OPCODE_J: u8 = 0x02;
/// Primary opcode of `jal`.
pub const OPCODE_JAL: u8 = 0x03;

/// The three instruction encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionFormat {
    /// `opcode rs rt rd shamt funct`.
    Register,
    /// `opcode rs rt immediate`.
    Immediate,
    /// `opcode target`.
    Jump,
}

impl InstructionFormat {
    /// Selects the format from the 6-bit primary opcode alone.
    ///
    /// Unassigned opcodes still select I-format; legality is judged when the
    /// operation is resolved.
    #[must_use]
    pub const fn from_opcode(opcode: u8) -> Self {
        match opcode {
            OPCODE_SPECIAL => Self::Register,
            OPCODE_J | OPCODE_JAL => Self::Jump,
            _ => Self::Immediate,
        }
    }
}

/// How an I-format immediate is widened to 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImmediateExtension {
    /// Replicate bit 15 (arithmetic, compare, branch offset, address offset).
    Sign,
    /// Fill with zeros (bitwise logical immediates).
    Zero,
    /// Place in the upper halfword (`lui`).
    Upper,
}

impl ImmediateExtension {
    /// Widens a raw 16-bit immediate.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub const fn extend(self, immediate: u16) -> u32 {
        match self {
            Self::Sign => immediate as i16 as i32 as u32,
            Self::Zero => immediate as u32,
            Self::Upper => (immediate as u32) << 16,
        }
    }
}

/// Closed set of instruction tags with defined semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Operation {
    Sll,
    Srl,
    Sra,
    Sllv,
    Srlv,
    Srav,
    Jr,
    Jalr,
    Syscall,
    Mfhi,
    Mthi,
    Mflo,
    Mtlo,
    Mult,
    Multu,
    Div,
    Divu,
    Add,
    Addu,
    Sub,
    Subu,
    And,
    Or,
    Xor,
    Nor,
    Slt,
    Sltu,
    Bltz,
    Bgez,
    Bltzal,
    Bgezal,
    J,
    Jal,
    Beq,
    Bne,
    Blez,
    Bgtz,
    Addi,
    Addiu,
    Slti,
    Sltiu,
    Andi,
    Ori,
    Xori,
    Lui,
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Sb,
    Sh,
    Sw,
}

/// Number of [`Operation`] variants.
pub const OPERATION_COUNT: usize = Operation::Sw as usize + 1;

/// Raw encoding that selects an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationEncoding {
    /// Opcode `000000`, selected by the 6-bit `funct` field.
    Special {
        /// `funct` field value.
        funct: u8,
    },
    /// Opcode `000001`, selected by the 5-bit `rt` field.
    RegImm {
        /// `rt` field value.
        rt: u8,
    },
    /// Any other primary opcode.
    Primary {
        /// 6-bit opcode value.
        opcode: u8,
    },
}

impl OperationEncoding {
    /// Returns the 6-bit primary opcode of this encoding.
    #[must_use]
    pub const fn opcode(self) -> u8 {
        match self {
            Self::Special { .. } => OPCODE_SPECIAL,
            Self::RegImm { .. } => OPCODE_REGIMM,
            Self::Primary { opcode } => opcode,
        }
    }

    const fn same_as(self, other: Self) -> bool {
        match (self, other) {
            (Self::Special { funct: a }, Self::Special { funct: b }) => a == b,
            (Self::RegImm { rt: a }, Self::RegImm { rt: b }) => a == b,
            (Self::Primary { opcode: a }, Self::Primary { opcode: b }) => a == b,
            _ => false,
        }
    }
}

/// Single source-of-truth encoding table.
///
/// Any opcode, funct or REGIMM selector not present here is illegal.
pub const OPERATION_TABLE: &[(OperationEncoding, Operation)] = &[
    (OperationEncoding::Special { funct: 0x00 }, Operation::Sll),
    (OperationEncoding::Special { funct: 0x02 }, Operation::Srl),
    (OperationEncoding::Special { funct: 0x03 }, Operation::Sra),
    (OperationEncoding::Special { funct: 0x04 }, Operation::Sllv),
    (OperationEncoding::Special { funct: 0x06 }, Operation::Srlv),
    (OperationEncoding::Special { funct: 0x07 }, Operation::Srav),
    (OperationEncoding::Special { funct: 0x08 }, Operation::Jr),
    (OperationEncoding::Special { funct: 0x09 }, Operation::Jalr),
    (OperationEncoding::Special { funct: 0x0C }, Operation::Syscall),
    (OperationEncoding::Special { funct: 0x10 }, Operation::Mfhi),
    (OperationEncoding::Special { funct: 0x11 }, Operation::Mthi),
    (OperationEncoding::Special { funct: 0x12 }, Operation::Mflo),
    (OperationEncoding::Special { funct: 0x13 }, Operation::Mtlo),
    (OperationEncoding::Special { funct: 0x18 }, Operation::Mult),
    (OperationEncoding::Special { funct: 0x19 }, Operation::Multu),
    (OperationEncoding::Special { funct: 0x1A }, Operation::Div),
    (OperationEncoding::Special { funct: 0x1B }, Operation::Divu),
    (OperationEncoding::Special { funct: 0x20 }, Operation::Add),
    (OperationEncoding::Special { funct: 0x21 }, Operation::Addu),
    (OperationEncoding::Special { funct: 0x22 }, Operation::Sub),
    (OperationEncoding::Special { funct: 0x23 }, Operation::Subu),
    (OperationEncoding::Special { funct: 0x24 }, Operation::And),
    (OperationEncoding::Special { funct: 0x25 }, Operation::Or),
    (OperationEncoding::Special { funct: 0x26 }, Operation::Xor),
    (OperationEncoding::Special { funct: 0x27 }, Operation::Nor),
    (OperationEncoding::Special { funct: 0x2A }, Operation::Slt),
    (OperationEncoding::Special { funct: 0x2B }, Operation::Sltu),
    (OperationEncoding::RegImm { rt: 0x00 }, Operation::Bltz),
    (OperationEncoding::RegImm { rt: 0x01 }, Operation::Bgez),
    (OperationEncoding::RegImm { rt: 0x10 }, Operation::Bltzal),
    (OperationEncoding::RegImm { rt: 0x11 }, Operation::Bgezal),
    (OperationEncoding::Primary { opcode: OPCODE_J }, Operation::J),
    (OperationEncoding::Primary { opcode: OPCODE_JAL }, Operation::Jal),
    (OperationEncoding::Primary { opcode: 0x04 }, Operation::Beq),
    (OperationEncoding::Primary { opcode: 0x05 }, Operation::Bne),
    (OperationEncoding::Primary { opcode: 0x06 }, Operation::Blez),
    (OperationEncoding::Primary { opcode: 0x07 }, Operation::Bgtz),
    (OperationEncoding::Primary { opcode: 0x08 }, Operation::Addi),
    (OperationEncoding::Primary { opcode: 0x09 }, Operation::Addiu),
    (OperationEncoding::Primary { opcode: 0x0A }, Operation::Slti),
    (OperationEncoding::Primary { opcode: 0x0B }, Operation::Sltiu),
    (OperationEncoding::Primary { opcode: 0x0C }, Operation::Andi),
    (OperationEncoding::Primary { opcode: 0x0D }, Operation::Ori),
    (OperationEncoding::Primary { opcode: 0x0E }, Operation::Xori),
    (OperationEncoding::Primary { opcode: 0x0F }, Operation::Lui),
    (OperationEncoding::Primary { opcode: 0x20 }, Operation::Lb),
    (OperationEncoding::Primary { opcode: 0x21 }, Operation::Lh),
    (OperationEncoding::Primary { opcode: 0x23 }, Operation::Lw),
    (OperationEncoding::Primary { opcode: 0x24 }, Operation::Lbu),
    (OperationEncoding::Primary { opcode: 0x25 }, Operation::Lhu),
    (OperationEncoding::Primary { opcode: 0x28 }, Operation::Sb),
    (OperationEncoding::Primary { opcode: 0x29 }, Operation::Sh),
    (OperationEncoding::Primary { opcode: 0x2B }, Operation::Sw),
];

const _: () = assert_operation_table();

const fn assert_operation_table() {
    assert!(
        OPERATION_TABLE.len() == OPERATION_COUNT,
        "every operation must have exactly one encoding"
    );

    let mut index = 0;
    while index < OPERATION_TABLE.len() {
        let (encoding, operation) = OPERATION_TABLE[index];

        match encoding {
            OperationEncoding::Special { funct } => {
                assert!(funct <= 0x3F, "funct is a 6-bit field");
            }
            OperationEncoding::RegImm { rt } => {
                assert!(rt <= 0x1F, "rt is a 5-bit field");
            }
            OperationEncoding::Primary { opcode } => {
                assert!(opcode <= 0x3F, "opcode is a 6-bit field");
                assert!(
                    opcode != OPCODE_SPECIAL && opcode != OPCODE_REGIMM,
                    "special and regimm opcodes are selected by sub-fields"
                );
            }
        }

        let mut other = index + 1;
        while other < OPERATION_TABLE.len() {
            let (other_encoding, other_operation) = OPERATION_TABLE[other];
            assert!(
                !encoding.same_as(other_encoding),
                "duplicate encoding in operation table"
            );
            assert!(
                operation as u8 != other_operation as u8,
                "operation listed twice in operation table"
            );
            other += 1;
        }

        index += 1;
    }
}

/// Resolves an R-format `funct` value.
#[must_use]
pub fn classify_funct(funct: u8) -> Option<Operation> {
    classify(OperationEncoding::Special { funct })
}

/// Resolves a REGIMM `rt` selector.
#[must_use]
pub fn classify_regimm(rt: u8) -> Option<Operation> {
    classify(OperationEncoding::RegImm { rt })
}

/// Resolves an I- or J-format primary opcode.
///
/// Returns `None` for `000000`/`000001`, which need a sub-field.
#[must_use]
pub fn classify_opcode(opcode: u8) -> Option<Operation> {
    classify(OperationEncoding::Primary { opcode })
}

fn classify(encoding: OperationEncoding) -> Option<Operation> {
    OPERATION_TABLE
        .iter()
        .find_map(|(entry, operation)| (*entry == encoding).then_some(*operation))
}

impl Operation {
    /// Returns the encoding assigned to this operation.
    #[must_use]
    pub fn encoding(self) -> Option<OperationEncoding> {
        OPERATION_TABLE
            .iter()
            .find_map(|(encoding, operation)| (*operation == self).then_some(*encoding))
    }

    /// Returns the instruction format this operation is encoded in.
    #[must_use]
    pub const fn format(self) -> InstructionFormat {
        match self {
            Self::Sll
            | Self::Srl
            | Self::Sra
            | Self::Sllv
            | Self::Srlv
            | Self::Srav
            | Self::Jr
            | Self::Jalr
            | Self::Syscall
            | Self::Mfhi
            | Self::Mthi
            | Self::Mflo
            | Self::Mtlo
            | Self::Mult
            | Self::Multu
            | Self::Div
            | Self::Divu
            | Self::Add
            | Self::Addu
            | Self::Sub
            | Self::Subu
            | Self::And
            | Self::Or
            | Self::Xor
            | Self::Nor
            | Self::Slt
            | Self::Sltu => InstructionFormat::Register,
            Self::J | Self::Jal => InstructionFormat::Jump,
            Self::Bltz
            | Self::Bgez
            | Self::Bltzal
            | Self::Bgezal
            | Self::Beq
            | Self::Bne
            | Self::Blez
            | Self::Bgtz
            | Self::Addi
            | Self::Addiu
            | Self::Slti
            | Self::Sltiu
            | Self::Andi
            | Self::Ori
            | Self::Xori
            | Self::Lui
            | Self::Lb
            | Self::Lh
            | Self::Lw
            | Self::Lbu
            | Self::Lhu
            | Self::Sb
            | Self::Sh
            | Self::Sw => InstructionFormat::Immediate,
        }
    }

    /// Immediate widening policy, for I-format operations only.
    #[must_use]
    pub const fn immediate_extension(self) -> Option<ImmediateExtension> {
        match self {
            Self::Andi | Self::Ori | Self::Xori => Some(ImmediateExtension::Zero),
            Self::Lui => Some(ImmediateExtension::Upper),
            Self::Bltz
            | Self::Bgez
            | Self::Bltzal
            | Self::Bgezal
            | Self::Beq
            | Self::Bne
            | Self::Blez
            | Self::Bgtz
            | Self::Addi
            | Self::Addiu
            | Self::Slti
            | Self::Sltiu
            | Self::Lb
            | Self::Lh
            | Self::Lw
            | Self::Lbu
            | Self::Lhu
            | Self::Sb
            | Self::Sh
            | Self::Sw => Some(ImmediateExtension::Sign),
            Self::Sll
            | Self::Srl
            | Self::Sra
            | Self::Sllv
            | Self::Srlv
            | Self::Srav
            | Self::Jr
            | Self::Jalr
            | Self::Syscall
            | Self::Mfhi
            | Self::Mthi
            | Self::Mflo
            | Self::Mtlo
            | Self::Mult
            | Self::Multu
            | Self::Div
            | Self::Divu
            | Self::Add
            | Self::Addu
            | Self::Sub
            | Self::Subu
            | Self::And
            | Self::Or
            | Self::Xor
            | Self::Nor
            | Self::Slt
            | Self::Sltu
            | Self::J
            | Self::Jal => None,
        }
    }

    /// Returns `true` for branches and jumps, which have a delay slot.
    #[must_use]
    pub const fn is_control_transfer(self) -> bool {
        matches!(
            self,
            Self::Jr
                | Self::Jalr
                | Self::Bltz
                | Self::Bgez
                | Self::Bltzal
                | Self::Bgezal
                | Self::J
                | Self::Jal
                | Self::Beq
                | Self::Bne
                | Self::Blez
                | Self::Bgtz
        )
    }

    /// Lower-case assembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Sllv => "sllv",
            Self::Srlv => "srlv",
            Self::Srav => "srav",
            Self::Jr => "jr",
            Self::Jalr => "jalr",
            Self::Syscall => "syscall",
            Self::Mfhi => "mfhi",
            Self::Mthi => "mthi",
            Self::Mflo => "mflo",
            Self::Mtlo => "mtlo",
            Self::Mult => "mult",
            Self::Multu => "multu",
            Self::Div => "div",
            Self::Divu => "divu",
            Self::Add => "add",
            Self::Addu => "addu",
            Self::Sub => "sub",
            Self::Subu => "subu",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Nor => "nor",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Bltz => "bltz",
            Self::Bgez => "bgez",
            Self::Bltzal => "bltzal",
            Self::Bgezal => "bgezal",
            Self::J => "j",
            Self::Jal => "jal",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blez => "blez",
            Self::Bgtz => "bgtz",
            Self::Addi => "addi",
            Self::Addiu => "addiu",
            Self::Slti => "slti",
            Self::Sltiu => "sltiu",
            Self::Andi => "andi",
            Self::Ori => "ori",
            Self::Xori => "xori",
            Self::Lui => "lui",
            Self::Lb => "lb",
            Self::Lh => "lh",
            Self::Lw => "lw",
            Self::Lbu => "lbu",
            Self::Lhu => "lhu",
            Self::Sb => "sb",
            Self::Sh => "sh",
            Self::Sw => "sw",
        }
    }
}
