//! Integer arithmetic for the executor.
//!
//! Every operand is a raw 32-bit register value; signedness is chosen by the
//! function, not the type.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]

use crate::fault::FaultCode;

/// `HI`/`LO` pair produced by multiply and divide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HiLo {
    /// High product word, or remainder.
    pub hi: u32,
    /// Low product word, or quotient.
    pub lo: u32,
}

/// Signed 32-bit addition that traps instead of wrapping.
///
/// # Errors
///
/// Returns [`FaultCode::ArithmeticOverflow`] when the operands share a sign
/// and the sum does not.
pub const fn add_signed(a: u32, b: u32) -> Result<u32, FaultCode> {
    match (a as i32).checked_add(b as i32) {
        Some(sum) => Ok(sum as u32),
        None => Err(FaultCode::ArithmeticOverflow),
    }
}

/// Signed 32-bit subtraction that traps instead of wrapping.
///
/// # Errors
///
/// Returns [`FaultCode::ArithmeticOverflow`] when the operands differ in sign
/// and the difference takes the sign of the subtrahend.
pub const fn sub_signed(a: u32, b: u32) -> Result<u32, FaultCode> {
    match (a as i32).checked_sub(b as i32) {
        Some(difference) => Ok(difference as u32),
        None => Err(FaultCode::ArithmeticOverflow),
    }
}

/// Signed 64-bit product split into `HI:LO`.
#[must_use]
pub const fn multiply_signed(a: u32, b: u32) -> HiLo {
    let product = (a as i32 as i64) * (b as i32 as i64);
    HiLo {
        hi: (product >> 32) as u32,
        lo: product as u32,
    }
}

/// Unsigned 64-bit product split into `HI:LO`.
#[must_use]
pub const fn multiply_unsigned(a: u32, b: u32) -> HiLo {
    let product = (a as u64) * (b as u64);
    HiLo {
        hi: (product >> 32) as u32,
        lo: product as u32,
    }
}

/// Signed division: quotient to `LO`, remainder to `HI`.
///
/// `i32::MIN / -1` wraps to `LO = i32::MIN`, `HI = 0`.
///
/// # Errors
///
/// Returns [`FaultCode::DivisionByZero`] when `divisor` is zero.
pub const fn divide_signed(dividend: u32, divisor: u32) -> Result<HiLo, FaultCode> {
    if divisor == 0 {
        return Err(FaultCode::DivisionByZero);
    }
    let (n, d) = (dividend as i32, divisor as i32);
    Ok(HiLo {
        hi: n.wrapping_rem(d) as u32,
        lo: n.wrapping_div(d) as u32,
    })
}

/// Unsigned division: quotient to `LO`, remainder to `HI`.
///
/// # Errors
///
/// Returns [`FaultCode::DivisionByZero`] when `divisor` is zero.
pub const fn divide_unsigned(dividend: u32, divisor: u32) -> Result<HiLo, FaultCode> {
    if divisor == 0 {
        return Err(FaultCode::DivisionByZero);
    }
    Ok(HiLo {
        hi: dividend % divisor,
        lo: dividend / divisor,
    })
}

/// `1` when `a < b` as signed values, else `0`.
#[must_use]
pub const fn set_less_than_signed(a: u32, b: u32) -> u32 {
    ((a as i32) < (b as i32)) as u32
}

/// `1` when `a < b` as unsigned values, else `0`.
#[must_use]
pub const fn set_less_than_unsigned(a: u32, b: u32) -> u32 {
    (a < b) as u32
}

/// Logical left shift by the low five bits of `amount`.
#[must_use]
pub const fn shift_left_logical(value: u32, amount: u32) -> u32 {
    value << (amount & 0x1F)
}

/// Logical right shift (zero fill) by the low five bits of `amount`.
#[must_use]
pub const fn shift_right_logical(value: u32, amount: u32) -> u32 {
    value >> (amount & 0x1F)
}

/// Arithmetic right shift (sign fill) by the low five bits of `amount`.
#[must_use]
pub const fn shift_right_arithmetic(value: u32, amount: u32) -> u32 {
    ((value as i32) >> (amount & 0x1F)) as u32
}
