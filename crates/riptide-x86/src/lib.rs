//! Fault-path decoder for JIT-emitted x86-64 `MOV` instructions.
//!
//! When generated code faults on a guest memory access, the runtime has to
//! inspect the faulting instruction to learn which register carries the
//! value, at what width, and through which addressing form, so it can emulate
//! the access in software and resume execution past the instruction.
//!
//! This crate recognizes exactly the `MOV`/`MOVZX`/`MOVSX` forms the paired
//! code generator emits. It is **not** a general x86 decoder: anything outside
//! the supported set is an error, never a best-effort decode, so a gap in the
//! generator's emission patterns surfaces as a precise failure instead of a
//! silent misdecode.

pub mod modrm;
pub mod mov;

pub use modrm::{ModRm, Rex, Sib};
pub use mov::{decode_mov, decode_mov_at, DecodeError, InstructionInfo, MAX_INST_LEN};
