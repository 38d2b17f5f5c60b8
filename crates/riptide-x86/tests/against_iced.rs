//! Differential tests: every encoding this decoder accepts must agree with
//! iced-x86 on length, direction, width, registers, displacement and
//! immediate. Encodings we reject carry no claim; the supported set is
//! deliberately smaller than the ISA.

use iced_x86::{Decoder, DecoderOptions, Mnemonic, OpKind, Register};
use riptide_types::Gpr;
use riptide_x86::{decode_mov, InstructionInfo};

fn full_reg(gpr: Gpr) -> Register {
    match gpr {
        Gpr::Rax => Register::RAX,
        Gpr::Rcx => Register::RCX,
        Gpr::Rdx => Register::RDX,
        Gpr::Rbx => Register::RBX,
        Gpr::Rsp => Register::RSP,
        Gpr::Rbp => Register::RBP,
        Gpr::Rsi => Register::RSI,
        Gpr::Rdi => Register::RDI,
        Gpr::R8 => Register::R8,
        Gpr::R9 => Register::R9,
        Gpr::R10 => Register::R10,
        Gpr::R11 => Register::R11,
        Gpr::R12 => Register::R12,
        Gpr::R13 => Register::R13,
        Gpr::R14 => Register::R14,
        Gpr::R15 => Register::R15,
    }
}

fn check_against_iced(bytes: &[u8], info: &InstructionInfo) {
    let mut decoder = Decoder::with_ip(64, bytes, 0x1000, DecoderOptions::NONE);
    let ins = decoder.decode();

    assert!(!ins.is_invalid(), "iced rejects {bytes:02X?}");
    assert!(
        matches!(
            ins.mnemonic(),
            Mnemonic::Mov | Mnemonic::Movzx | Mnemonic::Movsx
        ),
        "iced sees {:?} in {bytes:02X?}",
        ins.mnemonic()
    );
    assert_eq!(ins.len(), info.len as usize, "length of {bytes:02X?}");

    let mem_op: u32 = if info.is_memory_write { 0 } else { 1 };
    assert_eq!(ins.op_kind(mem_op), OpKind::Memory, "direction of {bytes:02X?}");

    assert_eq!(
        ins.memory_base(),
        info.base.map_or(Register::None, full_reg),
        "base of {bytes:02X?}"
    );
    assert_eq!(
        ins.memory_index(),
        info.index.map_or(Register::None, full_reg),
        "index of {bytes:02X?}"
    );
    if info.index.is_some() {
        assert_eq!(
            ins.memory_index_scale(),
            info.scale as u32,
            "scale of {bytes:02X?}"
        );
    }
    assert_eq!(
        ins.memory_displacement64() as i64,
        info.displacement as i64,
        "displacement of {bytes:02X?}"
    );
    assert_eq!(
        ins.memory_size().size(),
        info.operand_size.bytes(),
        "memory width of {bytes:02X?}"
    );

    match info.immediate {
        Some(imm) => assert_eq!(ins.immediate(1), imm, "immediate of {bytes:02X?}"),
        None => {
            let reg_op = 1 - mem_op;
            assert_eq!(
                ins.op_register(reg_op).full_register(),
                full_reg(info.reg),
                "value register of {bytes:02X?}"
            );
        }
    }
}

const PREFIXES: &[&[u8]] = &[
    &[],
    &[0x66],
    &[0x40],
    &[0x41],
    &[0x44],
    &[0x48],
    &[0x49],
    &[0x4A],
    &[0x4D],
    &[0x4F],
    &[0x66, 0x41],
    &[0x66, 0x48],
];

const SIBS: &[u8] = &[0x00, 0x24, 0x4C, 0x65, 0x85, 0x9C, 0xD1, 0xE5];

// Enough trailing bytes for any displacement + immediate combination, with a
// sign bit set in the disp32 position to exercise sign extension.
const TAIL: &[u8] = &[0xEF, 0xBE, 0xAD, 0xDE, 0x78, 0x56, 0x34, 0x12];

fn sweep(opcode: &[u8]) {
    for prefix in PREFIXES {
        for modrm in 0u16..=0xFF {
            let modrm = modrm as u8;
            let sib_needed = (modrm >> 6) != 3 && (modrm & 0x7) == 4;
            let sibs: Vec<Option<u8>> = if sib_needed {
                SIBS.iter().copied().map(Some).collect()
            } else {
                vec![None]
            };
            for sib in &sibs {
                let mut bytes = Vec::with_capacity(16);
                bytes.extend_from_slice(prefix);
                bytes.extend_from_slice(opcode);
                bytes.push(modrm);
                if let Some(sib) = sib {
                    bytes.push(*sib);
                }
                bytes.extend_from_slice(TAIL);

                if let Ok(info) = decode_mov(&bytes) {
                    check_against_iced(&bytes, &info);
                }
            }
        }
    }
}

#[test]
fn reg_mem_mov_forms_agree_with_iced() {
    for opcode in [0x88u8, 0x89, 0x8A, 0x8B] {
        sweep(&[opcode]);
    }
}

#[test]
fn immediate_mov_forms_agree_with_iced() {
    for opcode in [0xC6u8, 0xC7] {
        sweep(&[opcode]);
    }
}

#[test]
fn extend_mov_forms_agree_with_iced() {
    for opcode2 in [0xB6u8, 0xB7, 0xBE, 0xBF] {
        sweep(&[0x0F, opcode2]);
    }
}
