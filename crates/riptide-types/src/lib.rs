//! Shared register/width vocabulary for the riptide x86-64 fault path.
//!
//! This crate sits below the decoder and the fault handler so both can agree
//! on register identities and operand widths without depending on each other.

use core::fmt;

/// x86-64 general-purpose register, identified by its 4-bit encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Gpr {
    Rax = 0,
    Rcx = 1,
    Rdx = 2,
    Rbx = 3,
    Rsp = 4,
    Rbp = 5,
    Rsi = 6,
    Rdi = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    R13 = 13,
    R14 = 14,
    R15 = 15,
}

impl Gpr {
    /// Decode a 4-bit register number (ModRM/SIB field plus REX extension bit).
    #[must_use]
    pub fn from_u4(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Rax,
            1 => Self::Rcx,
            2 => Self::Rdx,
            3 => Self::Rbx,
            4 => Self::Rsp,
            5 => Self::Rbp,
            6 => Self::Rsi,
            7 => Self::Rdi,
            8 => Self::R8,
            9 => Self::R9,
            10 => Self::R10,
            11 => Self::R11,
            12 => Self::R12,
            13 => Self::R13,
            14 => Self::R14,
            15 => Self::R15,
            _ => return None,
        })
    }

    /// The 4-bit hardware encoding of this register.
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Gpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rax => "rax",
            Self::Rcx => "rcx",
            Self::Rdx => "rdx",
            Self::Rbx => "rbx",
            Self::Rsp => "rsp",
            Self::Rbp => "rbp",
            Self::Rsi => "rsi",
            Self::Rdi => "rdi",
            Self::R8 => "r8",
            Self::R9 => "r9",
            Self::R10 => "r10",
            Self::R11 => "r11",
            Self::R12 => "r12",
            Self::R13 => "r13",
            Self::R14 => "r14",
            Self::R15 => "r15",
        };
        f.write_str(s)
    }
}

/// Operand width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
}

impl Width {
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    #[must_use]
    pub fn bytes(self) -> usize {
        match self {
            Self::W8 => 1,
            Self::W16 => 2,
            Self::W32 => 4,
            Self::W64 => 8,
        }
    }

    /// Keep only the low `self` bits of `value`.
    #[must_use]
    pub fn truncate(self, value: u64) -> u64 {
        match self {
            Self::W8 => value & 0xff,
            Self::W16 => value & 0xffff,
            Self::W32 => value & 0xffff_ffff,
            Self::W64 => value,
        }
    }

    /// Sign-extend the low `self` bits of `value` to 64 bits.
    #[must_use]
    pub fn sign_extend(self, value: u64) -> u64 {
        match self {
            Self::W8 => value as u8 as i8 as i64 as u64,
            Self::W16 => value as u16 as i16 as i64 as u64,
            Self::W32 => value as u32 as i32 as i64 as u64,
            Self::W64 => value,
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Direction of the memory access a decoded instruction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    Read,
    Write,
}

impl AccessType {
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}
