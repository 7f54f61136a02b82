use core::fmt;

/// Number of architecturally visible general-purpose registers (`$0..$31`).
pub const GENERAL_REGISTER_COUNT: usize = 32;

const REGISTER_NAMES: [&str; GENERAL_REGISTER_COUNT] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
    "fp", "ra",
];

/// Architecturally visible general-purpose register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct GeneralRegister(u8);

impl GeneralRegister {
    /// `$zero`, hard-wired to zero.
    pub const ZERO: Self = Self(0);
    /// `$v0`, syscall service selector.
    pub const V0: Self = Self(2);
    /// `$sp`, stack pointer by convention.
    pub const SP: Self = Self(29);
    /// `$ra`, link register written by `jal`.
    pub const RA: Self = Self(31);

    /// Decodes a 5-bit register field, rejecting wider values.
    #[must_use]
    pub const fn from_u5(bits: u8) -> Option<Self> {
        if (bits as usize) < GENERAL_REGISTER_COUNT {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Builds a register from an instruction field, keeping its low 5 bits.
    #[must_use]
    pub const fn from_field(bits: u8) -> Self {
        Self(bits & 0x1F)
    }

    /// Returns the array index for this register (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the register number as a raw 5-bit field.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Returns the conventional ABI name without the `$` sigil.
    #[must_use]
    pub const fn abi_name(self) -> &'static str {
        REGISTER_NAMES[self.index()]
    }
}

impl fmt::Display for GeneralRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// One generation of the register file: `$0..$31`, `HI`, `LO`, `PC`, plus
/// the target of a control transfer waiting for its delay slot to retire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    gpr: [u32; GENERAL_REGISTER_COUNT],
    hi: u32,
    lo: u32,
    pc: u32,
    delay_slot_target: Option<u32>,
}

impl ArchitecturalState {
    /// Creates a zeroed register file with `PC` set to `pc`.
    #[must_use]
    pub const fn with_pc(pc: u32) -> Self {
        Self {
            gpr: [0; GENERAL_REGISTER_COUNT],
            hi: 0,
            lo: 0,
            pc,
            delay_slot_target: None,
        }
    }

    /// Reads a general-purpose register. `$zero` always reads as zero.
    #[must_use]
    pub const fn gpr(&self, reg: GeneralRegister) -> u32 {
        if reg.index() == 0 {
            0
        } else {
            self.gpr[reg.index()]
        }
    }

    /// Writes a general-purpose register. Writes to `$zero` are discarded.
    pub const fn set_gpr(&mut self, reg: GeneralRegister, value: u32) {
        if reg.index() != 0 {
            self.gpr[reg.index()] = value;
        }
    }

    /// Returns all 32 register values in index order.
    #[must_use]
    pub const fn gprs(&self) -> [u32; GENERAL_REGISTER_COUNT] {
        let mut values = self.gpr;
        values[0] = 0;
        values
    }

    /// Reads the `HI` register.
    #[must_use]
    pub const fn hi(&self) -> u32 {
        self.hi
    }

    /// Writes the `HI` register.
    pub const fn set_hi(&mut self, value: u32) {
        self.hi = value;
    }

    /// Reads the `LO` register.
    #[must_use]
    pub const fn lo(&self) -> u32 {
        self.lo
    }

    /// Writes the `LO` register.
    pub const fn set_lo(&mut self, value: u32) {
        self.lo = value;
    }

    /// Reads the `PC` register.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the `PC` register.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    /// Target entered once the instruction at `PC` (a delay slot) retires.
    #[must_use]
    pub const fn delay_slot_target(&self) -> Option<u32> {
        self.delay_slot_target
    }

    /// Sets or clears the pending delay-slot target.
    pub const fn set_delay_slot_target(&mut self, target: Option<u32>) {
        self.delay_slot_target = target;
    }
}
