use thiserror::Error;

/// Fault classes used for reporting and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Opcode/funct combination has no defined semantics.
    Decode,
    /// Signed arithmetic trap or divide-by-zero.
    Arithmetic,
    /// Alignment or fetch-mapping violation.
    Memory,
}

/// Stable fault taxonomy raised by the decode/execute engine.
///
/// Every fault is terminal for the current run: the cycle that raised it
/// commits nothing and the run flag is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// Opcode, funct or REGIMM selector has no defined semantics.
    #[error("illegal instruction")]
    IllegalInstruction = 0x01,
    /// Signed `add`/`addi`/`sub` overflowed 32 bits.
    #[error("signed arithmetic overflow")]
    ArithmeticOverflow = 0x02,
    /// `div`/`divu` with a zero divisor.
    #[error("integer division by zero")]
    DivisionByZero = 0x03,
    /// Address is not a multiple of the access width.
    #[error("unaligned memory access")]
    UnalignedAccess = 0x04,
    /// Instruction fetch from an address outside every memory region.
    #[error("instruction fetch from unmapped address")]
    UnmappedFetch = 0x05,
}

impl FaultCode {
    /// Converts a fault code to its stable byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable byte value back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::IllegalInstruction),
            0x02 => Some(Self::ArithmeticOverflow),
            0x03 => Some(Self::DivisionByZero),
            0x04 => Some(Self::UnalignedAccess),
            0x05 => Some(Self::UnmappedFetch),
            _ => None,
        }
    }

    /// Returns the reporting class for this fault code.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::IllegalInstruction => FaultClass::Decode,
            Self::ArithmeticOverflow | Self::DivisionByZero => FaultClass::Arithmetic,
            Self::UnalignedAccess | Self::UnmappedFetch => FaultClass::Memory,
        }
    }
}
