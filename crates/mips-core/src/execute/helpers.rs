//! Address and immediate arithmetic shared by the format handlers.

/// Widens a 16-bit value by replicating bit 15.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn sign_extend_halfword(value: u16) -> u32 {
    value as i16 as i32 as u32
}

/// Widens an 8-bit value by replicating bit 7.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn sign_extend_byte(value: u8) -> u32 {
    value as i8 as i32 as u32
}

/// Address of the instruction after the delay slot.
#[must_use]
pub const fn link_address(pc: u32) -> u32 {
    pc.wrapping_add(8)
}

/// PC-relative branch target: `pc + 4 + (sign_extend(offset) << 2)`.
#[must_use]
pub const fn branch_target(pc: u32, offset: u16) -> u32 {
    pc.wrapping_add(4)
        .wrapping_add(sign_extend_halfword(offset) << 2)
}

/// Pseudo-direct jump target: the top four bits of `pc + 4` joined with
/// `target << 2`.
#[must_use]
pub const fn jump_target(pc: u32, target: u32) -> u32 {
    (pc.wrapping_add(4) & 0xF000_0000) | ((target & 0x03FF_FFFF) << 2)
}

/// Load/store address: `base + sign_extend(offset)`, wrapping.
#[must_use]
pub const fn effective_address(base: u32, offset: u16) -> u32 {
    base.wrapping_add(sign_extend_halfword(offset))
}
