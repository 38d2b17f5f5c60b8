//! Recognition and operand extraction for the supported `MOV` subset.

use riptide_types::{AccessType, Gpr, Width};
use thiserror::Error;

use crate::modrm::{ModRm, Rex, Sib};

/// Maximum x86 instruction length (architectural limit).
pub const MAX_INST_LEN: usize = 15;

/// Decode failure. There is no recoverable-vs-fatal distinction here; the
/// fault handler decides severity (typically fatal, since an unrecognized
/// instruction on the fault path means the code generator emitted a form this
/// decoder was never taught).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("instruction bytes ended before the encoding was complete")]
    UnexpectedEof,
    #[error("not a supported mov encoding")]
    UnsupportedEncoding,
}

/// Operand metadata for one decoded instruction.
///
/// Populated in a single [`decode_mov`] call and meant to be consumed
/// immediately: the fault handler reads the register fields, width and
/// displacement to emulate the access, then uses [`len`](Self::len) to skip
/// past the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionInfo {
    /// Width of the value moved. For `MOVZX`/`MOVSX` this is the width of the
    /// *memory* (source) operand, i.e. of the faulting access itself; the
    /// extend flags say how the loaded value widens into the destination.
    pub operand_size: Width,
    /// Total encoded length: prefixes + opcode + ModRM (+ SIB) +
    /// displacement + immediate.
    pub len: u8,
    /// Register named by the ModRM `reg` field, REX.R-extended. Meaningless
    /// for the move-immediate forms, where the field is the opcode group
    /// selector instead.
    pub reg: Gpr,
    /// Base register of the memory operand, REX.B-extended. `None` only for
    /// the SIB no-base form (base field `0b101` under `mod == 0`), where a
    /// bare disp32 addresses memory.
    pub base: Option<Gpr>,
    /// Scaled index register from the SIB byte, REX.X-extended. `None` when
    /// there is no SIB byte or the SIB encodes no index.
    pub index: Option<Gpr>,
    /// Index scale factor (1, 2, 4 or 8). Meaningful only when `index` is
    /// `Some`.
    pub scale: u8,
    /// The load widens its source by zero extension (`MOVZX`).
    pub zero_extend: bool,
    /// The load widens its source by sign extension (`MOVSX`).
    pub sign_extend: bool,
    /// Immediate operand of the move-immediate forms, sign-extended to 64
    /// bits where the encoding demands it (imm32 under REX.W).
    pub immediate: Option<u64>,
    /// True when the memory operand is the destination (store), false when it
    /// is the source (load).
    pub is_memory_write: bool,
    /// Signed displacement added to the base (and scaled index) register.
    /// Zero when the addressing mode encodes none.
    pub displacement: i32,
}

impl InstructionInfo {
    /// Direction of the memory access, derived from the opcode.
    #[must_use]
    pub fn access_type(&self) -> AccessType {
        if self.is_memory_write {
            AccessType::Write
        } else {
            AccessType::Read
        }
    }
}

/// The closed set of recognized opcode forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MovForm {
    /// 0x88 / 0x89: store register to memory.
    Store,
    /// 0x8A / 0x8B: load memory into register.
    Load,
    /// 0xC6 /0 / 0xC7 /0: store immediate to memory.
    StoreImm,
    /// 0x0F B6/B7/BE/BF: widening load.
    LoadExtend { sign: bool },
}

fn read_u8(bytes: &[u8], offset: usize) -> Result<u8, DecodeError> {
    bytes.get(offset).copied().ok_or(DecodeError::UnexpectedEof)
}

fn read_le(bytes: &[u8], offset: usize, len: usize) -> Result<u64, DecodeError> {
    if bytes.len() < offset + len {
        return Err(DecodeError::UnexpectedEof);
    }
    let mut out = 0u64;
    for i in 0..len {
        out |= (bytes[offset + i] as u64) << (i * 8);
    }
    Ok(out)
}

fn gpr(code: u8) -> Result<Gpr, DecodeError> {
    Gpr::from_u4(code).ok_or(DecodeError::UnsupportedEncoding)
}

/// Operand width of the non-byte opcodes: REX.W forces 64-bit, else the 0x66
/// override forces 16-bit, else 32-bit.
fn op_width(rex: Rex, operand_override: bool) -> Width {
    if rex.w {
        Width::W64
    } else if operand_override {
        Width::W16
    } else {
        Width::W32
    }
}

/// Decode one supported `MOV`-family instruction from the start of `bytes`.
///
/// The caller passes the instruction's bytes, up to [`MAX_INST_LEN`] of them;
/// the slice bound is what keeps the decoder from reading past the caller's
/// guarantee. On success every field of [`InstructionInfo`] is populated per
/// its documentation; on failure nothing is produced. Callers must treat an
/// error as "cannot characterize this instruction" and escalate, never as a
/// partial result.
pub fn decode_mov(bytes: &[u8]) -> Result<InstructionInfo, DecodeError> {
    let mut offset = 0usize;
    let mut rex = Rex::none();
    let mut operand_override = false;

    // Prefix scan. The generator only ever emits 0x66 and REX in front of the
    // forms below, in that order; REX must immediately precede the opcode
    // (hardware ignores a REX followed by another prefix). Anything else
    // (segment overrides, LOCK/REP, 0x67, a second REX) falls through to
    // opcode matching and is rejected there.
    while read_u8(bytes, offset)? == 0x66 {
        operand_override = true;
        offset += 1;
    }
    let b = read_u8(bytes, offset)?;
    if (0x40..=0x4f).contains(&b) {
        rex = Rex::from_byte(b);
        offset += 1;
    }

    let opcode = read_u8(bytes, offset)?;
    offset += 1;

    let wide = op_width(rex, operand_override);
    let (form, width) = match opcode {
        0x88 => (MovForm::Store, Width::W8),
        0x89 => (MovForm::Store, wide),
        0x8a => (MovForm::Load, Width::W8),
        0x8b => (MovForm::Load, wide),
        0xc6 => (MovForm::StoreImm, Width::W8),
        0xc7 => (MovForm::StoreImm, wide),
        0x0f => {
            let opcode2 = read_u8(bytes, offset)?;
            offset += 1;
            match opcode2 {
                0xb6 => (MovForm::LoadExtend { sign: false }, Width::W8),
                0xb7 => (MovForm::LoadExtend { sign: false }, Width::W16),
                0xbe => (MovForm::LoadExtend { sign: true }, Width::W8),
                0xbf => (MovForm::LoadExtend { sign: true }, Width::W16),
                _ => return Err(DecodeError::UnsupportedEncoding),
            }
        }
        _ => return Err(DecodeError::UnsupportedEncoding),
    };

    let modrm = ModRm::parse(read_u8(bytes, offset)?, rex);
    offset += 1;

    // Register-direct forms never fault on memory; there is nothing for the
    // fault handler to emulate.
    if modrm.mod_bits == 3 {
        return Err(DecodeError::UnsupportedEncoding);
    }

    // 0xC6/0xC7 are Group 11; only /0 is MOV.
    if matches!(form, MovForm::StoreImm) && modrm.reg & 0x7 != 0 {
        return Err(DecodeError::UnsupportedEncoding);
    }

    // Without REX, byte-register encodings 4..=7 name AH/CH/DH/BH. The
    // generator never touches the high-byte registers, so reject rather than
    // mis-attribute the value to RSP..RDI.
    if width == Width::W8
        && matches!(form, MovForm::Store | MovForm::Load)
        && !rex.present
        && (4..=7).contains(&modrm.reg)
    {
        return Err(DecodeError::UnsupportedEncoding);
    }

    let mut base = None;
    let mut index = None;
    let mut scale = 1u8;
    let mut displacement = 0i32;

    if modrm.rm == 4 {
        let sib = Sib::parse(read_u8(bytes, offset)?, rex);
        offset += 1;
        scale = sib.scale;
        // Index field 0b100 without REX.X encodes "no index".
        if sib.index != 4 {
            index = Some(gpr(sib.index)?);
        }
        if sib.base & 0x7 == 5 && modrm.mod_bits == 0 {
            // No base register; a mandatory disp32 carries the whole address.
            displacement = read_le(bytes, offset, 4)? as u32 as i32;
            offset += 4;
        } else {
            base = Some(gpr(sib.base)?);
        }
    } else if modrm.rm == 5 && modrm.mod_bits == 0 {
        // RIP-relative. The generator addresses guest memory through base
        // registers, so this form is rejected rather than decoded.
        return Err(DecodeError::UnsupportedEncoding);
    } else {
        base = Some(gpr(modrm.rm | if rex.b { 8 } else { 0 })?);
    }

    match modrm.mod_bits {
        0 => {}
        1 => {
            displacement = read_u8(bytes, offset)? as i8 as i32;
            offset += 1;
        }
        2 => {
            displacement = read_le(bytes, offset, 4)? as u32 as i32;
            offset += 4;
        }
        _ => unreachable!(),
    }

    let mut immediate = None;
    if matches!(form, MovForm::StoreImm) {
        // C6 takes imm8; C7 takes imm16 under 0x66, else imm32. There is no
        // imm64 memory store; REX.W sign-extends the imm32 instead.
        let imm_len = match width {
            Width::W8 => 1,
            Width::W16 => 2,
            Width::W32 | Width::W64 => 4,
        };
        let raw = read_le(bytes, offset, imm_len)?;
        offset += imm_len;
        let value = if width == Width::W64 {
            Width::W32.sign_extend(raw)
        } else {
            width.truncate(raw)
        };
        immediate = Some(value);
    }

    let (zero_extend, sign_extend) = match form {
        MovForm::LoadExtend { sign } => (!sign, sign),
        _ => (false, false),
    };

    Ok(InstructionInfo {
        operand_size: width,
        len: offset as u8,
        reg: gpr(modrm.reg)?,
        base,
        index,
        scale,
        zero_extend,
        sign_extend,
        immediate,
        is_memory_write: matches!(form, MovForm::Store | MovForm::StoreImm),
        displacement,
    })
}

/// Decode the instruction starting at `code`.
///
/// Thin wrapper over [`decode_mov`] for the fault-handler boundary, where the
/// faulting instruction pointer arrives as a raw pointer into executable
/// memory.
///
/// # Safety
///
/// `code` must point to at least [`MAX_INST_LEN`] readable bytes. The fault
/// handler guarantees this for instruction pointers inside generated code;
/// there is deliberately no redundant bounds probing here that would mask a
/// generator handing over a bad pointer.
pub unsafe fn decode_mov_at(code: *const u8) -> Result<InstructionInfo, DecodeError> {
    decode_mov(core::slice::from_raw_parts(code, MAX_INST_LEN))
}
