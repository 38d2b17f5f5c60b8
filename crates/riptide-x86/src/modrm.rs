//! REX, ModRM and SIB byte decomposition.
//!
//! These are pure bit extractions; semantic validity (does `rm == 4` actually
//! introduce a SIB byte, is the no-base escape active) depends on the
//! addressing mode and is the decoder's responsibility.

/// Decomposed REX prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rex {
    /// Whether a REX byte was present at all. An "empty" REX (0x40) still
    /// changes byte-register selection, so presence is tracked separately
    /// from the four extension bits.
    pub present: bool,
    pub w: bool,
    pub r: bool,
    pub x: bool,
    pub b: bool,
}

impl Rex {
    #[must_use]
    pub fn none() -> Self {
        Self {
            present: false,
            w: false,
            r: false,
            x: false,
            b: false,
        }
    }

    #[must_use]
    pub fn from_byte(b: u8) -> Self {
        debug_assert!((0x40..=0x4f).contains(&b));
        Self {
            present: true,
            w: (b & 0x08) != 0,
            r: (b & 0x04) != 0,
            x: (b & 0x02) != 0,
            b: (b & 0x01) != 0,
        }
    }
}

/// Decomposed ModRM byte.
///
/// `reg` is REX.R-extended into the 0..=15 range. `rm` is deliberately left
/// raw (0..=7): it is overloaded between a register number, a SIB escape and
/// the RIP-relative escape, and REX.B applies differently per addressing
/// mode, so the consumer applies the extension where it is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModRm {
    pub mod_bits: u8,
    pub reg: u8,
    pub rm: u8,
}

impl ModRm {
    #[must_use]
    pub fn parse(byte: u8, rex: Rex) -> Self {
        Self {
            mod_bits: byte >> 6,
            reg: ((byte >> 3) & 0x7) | if rex.r { 8 } else { 0 },
            rm: byte & 0x7,
        }
    }
}

/// Decomposed SIB byte.
///
/// Unlike ModRM's `rm`, the SIB sub-fields are not overloaded across
/// addressing modes, so `index` and `base` come back REX.X/REX.B-extended.
/// The two escapes remain the consumer's job: `index & 7 == 4` with no REX.X
/// (i.e. `index == 4`) means "no index", and a raw base field of `0b101`
/// under `mod == 0` means "no base, disp32 follows".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sib {
    /// Index scale factor: 1, 2, 4 or 8.
    pub scale: u8,
    pub index: u8,
    pub base: u8,
}

impl Sib {
    #[must_use]
    pub fn parse(byte: u8, rex: Rex) -> Self {
        Self {
            scale: 1 << ((byte >> 6) & 0x3),
            index: ((byte >> 3) & 0x7) | if rex.x { 8 } else { 0 },
            base: (byte & 0x7) | if rex.b { 8 } else { 0 },
        }
    }
}
