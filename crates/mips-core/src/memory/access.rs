//! Alignment policy helpers for data and instruction accesses.

use crate::FaultCode;

/// Byte width of an architectural memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum AccessWidth {
    /// 8-bit access (`lb`, `lbu`, `sb`).
    Byte = 1,
    /// 16-bit access (`lh`, `lhu`, `sh`).
    Half = 2,
    /// 32-bit access (`lw`, `sw`, instruction fetch).
    Word = 4,
}

impl AccessWidth {
    /// Number of bytes moved by an access of this width.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        self as u32
    }

    /// Mask selecting the low bits that must be zero for a naturally
    /// aligned access of this width.
    #[must_use]
    pub const fn alignment_mask(self) -> u32 {
        self.bytes() - 1
    }

    /// Mask selecting the value bits moved by an access of this width.
    #[must_use]
    pub const fn value_mask(self) -> u32 {
        match self {
            Self::Byte => 0x0000_00FF,
            Self::Half => 0x0000_FFFF,
            Self::Word => 0xFFFF_FFFF,
        }
    }
}

/// Validates natural alignment for an access of `width` at `addr`.
///
/// # Errors
///
/// Returns [`FaultCode::UnalignedAccess`] when `addr` is not a multiple of
/// the access width.
pub const fn validate_alignment(addr: u32, width: AccessWidth) -> Result<(), FaultCode> {
    if addr & width.alignment_mask() == 0 {
        Ok(())
    } else {
        Err(FaultCode::UnalignedAccess)
    }
}

/// Validates 4-byte alignment for word accesses and instruction fetch.
///
/// # Errors
///
/// Returns [`FaultCode::UnalignedAccess`] when `addr` is not a multiple of 4.
pub const fn validate_word_alignment(addr: u32) -> Result<(), FaultCode> {
    validate_alignment(addr, AccessWidth::Word)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{validate_alignment, validate_word_alignment, AccessWidth};
    use crate::FaultCode;

    #[rstest]
    #[case(0x0040_0000, AccessWidth::Word, true)]
    #[case(0x0040_0002, AccessWidth::Word, false)]
    #[case(0x0040_0003, AccessWidth::Word, false)]
    #[case(0x0040_0002, AccessWidth::Half, true)]
    #[case(0x0040_0001, AccessWidth::Half, false)]
    #[case(0x0040_0001, AccessWidth::Byte, true)]
    #[case(0x0040_0003, AccessWidth::Byte, true)]
    fn alignment_follows_access_width(
        #[case] addr: u32,
        #[case] width: AccessWidth,
        #[case] aligned: bool,
    ) {
        let expected = if aligned {
            Ok(())
        } else {
            Err(FaultCode::UnalignedAccess)
        };
        assert_eq!(validate_alignment(addr, width), expected);
    }

    #[test]
    fn word_alignment_outcome_is_deterministic_for_low_addresses() {
        for addr in 0_u32..=0x1000 {
            if addr % 4 == 0 {
                assert_eq!(validate_word_alignment(addr), Ok(()));
            } else {
                assert_eq!(
                    validate_word_alignment(addr),
                    Err(FaultCode::UnalignedAccess)
                );
            }
        }
    }

    #[test]
    fn value_masks_match_widths() {
        assert_eq!(AccessWidth::Byte.value_mask(), 0xFF);
        assert_eq!(AccessWidth::Half.value_mask(), 0xFFFF);
        assert_eq!(AccessWidth::Word.value_mask(), u32::MAX);
        assert_eq!(AccessWidth::Word.bytes(), 4);
    }
}
