//! Opcode decode tables. Two fixed 256-entry tables of decode function
//! pointers (one per first byte, one behind the 0xCB escape prefix),
//! built once at startup. The builders assign one function per
//! bit-pattern family; decoders extract operand slots from the opcode's
//! bit-fields, fetch any immediates, and hand back an immutable
//! `Instruction` without touching CPU state.

use lazy_static::lazy_static;

use crate::bus::Memory;
use crate::constants::CB_PREFIX_OPCODE_BYTE;
use crate::cpu::instruction::*;
use crate::error::CoreError;
use crate::registers::{Reg8, Reg16};

type DecodeFn = fn(&dyn Memory, u16, u8) -> Result<Instruction, CoreError>;

lazy_static! {
    static ref OPCODES: [Option<DecodeFn>; 256] = build_unprefixed();
    static ref CB_OPCODES: [Option<DecodeFn>; 256] = build_prefixed();
}

/// Decodes the instruction at `pc`. Does not mutate anything; the
/// execution engine owns the PC advance.
pub fn decode(bus: &dyn Memory, pc: u16) -> Result<Instruction, CoreError> {
    let opcode = bus.read(pc)?;

    if opcode == CB_PREFIX_OPCODE_BYTE {
        let cb = bus.read(pc.wrapping_add(1))?;
        let decode_fn = CB_OPCODES[cb as usize].ok_or(CoreError::UnknownOpcode {
            opcode: cb,
            prefixed: true,
            addr: pc,
        })?;
        decode_fn(bus, pc, cb)
    } else {
        let decode_fn = OPCODES[opcode as usize].ok_or(CoreError::UnknownOpcode {
            opcode,
            prefixed: false,
            addr: pc,
        })?;
        decode_fn(bus, pc, opcode)
    }
}

/// Fetches the instruction's raw bytes and assembles the final object.
fn finish(
    bus: &dyn Memory,
    pc: u16,
    opcode: u8,
    prefixed: bool,
    kind: Kind,
) -> Result<Instruction, CoreError> {
    let len = kind.encoded_length();
    let mut bytes = [0u8; 3];
    bus.read_bytes(pc, &mut bytes[..len as usize])?;

    Ok(Instruction {
        opcode,
        prefixed,
        addr: pc,
        bytes,
        len,
        kind,
    })
}

// --- bit-slice helpers -------------------------------------------------

/// The value of bits hi..=lo of `val`.
fn bit_slice(val: u8, hi: u8, lo: u8) -> u8 {
    (val >> lo) & ((1 << (hi - lo + 1)) - 1)
}

/// Register operand slot. Slot 6 is the (HL) placeholder; the table
/// builders route those opcodes to the indirect decoders, so hitting it
/// here is a builder bug.
fn reg_slot(bits: u8) -> Reg8 {
    match bits {
        0 => Reg8::B,
        1 => Reg8::C,
        2 => Reg8::D,
        3 => Reg8::E,
        4 => Reg8::H,
        5 => Reg8::L,
        7 => Reg8::A,
        _ => unreachable!("slot 6 encodes (HL)"),
    }
}

fn wide_slot(bits: u8) -> Reg16 {
    match bits {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        3 => Reg16::SP,
        _ => unreachable!("wide slots are 2 bits"),
    }
}

/// PUSH/POP use AF where the other wide families use SP.
fn stack_slot(bits: u8) -> Reg16 {
    match bits {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        3 => Reg16::AF,
        _ => unreachable!("stack slots are 2 bits"),
    }
}

fn cond_slot(bits: u8) -> Cond {
    match bits {
        0 => Cond::NotZero,
        1 => Cond::Zero,
        2 => Cond::NotCarry,
        3 => Cond::Carry,
        _ => unreachable!("condition slots are 2 bits"),
    }
}

fn indirect_slot(bits: u8) -> Indirect {
    match bits {
        0 => Indirect::Bc,
        1 => Indirect::De,
        2 => Indirect::HlInc,
        3 => Indirect::HlDec,
        _ => unreachable!("pointer slots are 2 bits"),
    }
}

fn alu_slot(bits: u8) -> AluOp {
    match bits {
        0 => AluOp::Add,
        1 => AluOp::Adc,
        2 => AluOp::Sub,
        3 => AluOp::Sbc,
        4 => AluOp::And,
        5 => AluOp::Xor,
        6 => AluOp::Or,
        7 => AluOp::Cp,
        _ => unreachable!("ALU slots are 3 bits"),
    }
}

fn rot_slot(bits: u8) -> RotOp {
    match bits {
        0 => RotOp::Rlc,
        1 => RotOp::Rrc,
        2 => RotOp::Rl,
        3 => RotOp::Rr,
        4 => RotOp::Sla,
        5 => RotOp::Sra,
        6 => RotOp::Swap,
        7 => RotOp::Srl,
        _ => unreachable!("rotate slots are 3 bits"),
    }
}

fn cb_target(bits: u8) -> CbTarget {
    if bits == 6 {
        CbTarget::HlIndirect
    } else {
        CbTarget::Reg(reg_slot(bits))
    }
}

// --- unprefixed decoders -----------------------------------------------

fn decode_nop(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Nop)
}

fn decode_stop(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Stop)
}

fn decode_halt(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Halt)
}

fn decode_di(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Di)
}

fn decode_ei(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Ei)
}

fn decode_ld_r_r(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let dst = reg_slot(bit_slice(op, 5, 3));
    let src = reg_slot(bit_slice(op, 2, 0));
    finish(bus, pc, op, false, Kind::LdRR { dst, src })
}

fn decode_ld_r_hl(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let dst = reg_slot(bit_slice(op, 5, 3));
    finish(bus, pc, op, false, Kind::LdRHl { dst })
}

fn decode_ld_hl_r(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let src = reg_slot(bit_slice(op, 2, 0));
    finish(bus, pc, op, false, Kind::LdHlR { src })
}

fn decode_ld_r_imm(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let dst = reg_slot(bit_slice(op, 5, 3));
    finish(bus, pc, op, false, Kind::LdRImm { dst })
}

fn decode_ld_hl_imm(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::LdHlImm)
}

fn decode_ld16_imm(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let dst = wide_slot(bit_slice(op, 5, 4));
    finish(bus, pc, op, false, Kind::Ld16Imm { dst })
}

fn decode_ld_ind_a(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let dst = indirect_slot(bit_slice(op, 5, 4));
    finish(bus, pc, op, false, Kind::LdIndA { dst })
}

fn decode_ld_a_ind(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let src = indirect_slot(bit_slice(op, 5, 4));
    finish(bus, pc, op, false, Kind::LdAInd { src })
}

fn decode_inc_r(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let reg = reg_slot(bit_slice(op, 5, 3));
    finish(bus, pc, op, false, Kind::IncR { reg })
}

fn decode_dec_r(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let reg = reg_slot(bit_slice(op, 5, 3));
    finish(bus, pc, op, false, Kind::DecR { reg })
}

fn decode_inc_hl_ind(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::IncHlInd)
}

fn decode_dec_hl_ind(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::DecHlInd)
}

fn decode_inc16(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let reg = wide_slot(bit_slice(op, 5, 4));
    finish(bus, pc, op, false, Kind::Inc16 { reg })
}

fn decode_dec16(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let reg = wide_slot(bit_slice(op, 5, 4));
    finish(bus, pc, op, false, Kind::Dec16 { reg })
}

fn decode_add_hl16(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let src = wide_slot(bit_slice(op, 5, 4));
    finish(bus, pc, op, false, Kind::AddHl16 { src })
}

fn decode_rot_a(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let rot = rot_slot(bit_slice(op, 4, 3));
    finish(bus, pc, op, false, Kind::RotateA { op: rot })
}

fn decode_daa(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Daa)
}

fn decode_cpl(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Cpl)
}

fn decode_scf(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Scf)
}

fn decode_ccf(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Ccf)
}

fn decode_alu_r(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let alu = alu_slot(bit_slice(op, 5, 3));
    let src = reg_slot(bit_slice(op, 2, 0));
    finish(bus, pc, op, false, Kind::AluR { op: alu, src })
}

fn decode_alu_hl(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let alu = alu_slot(bit_slice(op, 5, 3));
    finish(bus, pc, op, false, Kind::AluHl { op: alu })
}

fn decode_alu_imm(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let alu = alu_slot(bit_slice(op, 5, 3));
    finish(bus, pc, op, false, Kind::AluImm { op: alu })
}

fn decode_jp(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Jp)
}

fn decode_jp_cond(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let cond = cond_slot(bit_slice(op, 4, 3));
    finish(bus, pc, op, false, Kind::JpCond { cond })
}

fn decode_jp_hl(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::JpHl)
}

fn decode_jr(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Jr)
}

fn decode_jr_cond(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let cond = cond_slot(bit_slice(op, 4, 3));
    finish(bus, pc, op, false, Kind::JrCond { cond })
}

fn decode_call(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Call)
}

fn decode_call_cond(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let cond = cond_slot(bit_slice(op, 4, 3));
    finish(bus, pc, op, false, Kind::CallCond { cond })
}

fn decode_ret(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Ret)
}

fn decode_ret_cond(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let cond = cond_slot(bit_slice(op, 4, 3));
    finish(bus, pc, op, false, Kind::RetCond { cond })
}

fn decode_reti(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::Reti)
}

fn decode_rst(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let vector = bit_slice(op, 5, 3) * 8;
    finish(bus, pc, op, false, Kind::Rst { vector })
}

fn decode_push(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let reg = stack_slot(bit_slice(op, 5, 4));
    finish(bus, pc, op, false, Kind::Push { reg })
}

fn decode_pop(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let reg = stack_slot(bit_slice(op, 5, 4));
    finish(bus, pc, op, false, Kind::Pop { reg })
}

fn decode_ldh_imm_a(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::LdhImmA)
}

fn decode_ldh_a_imm(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::LdhAImm)
}

fn decode_ldh_c_a(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::LdhCA)
}

fn decode_ldh_a_c(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::LdhAC)
}

fn decode_ld_abs_a(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::LdAbsA)
}

fn decode_ld_a_abs(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::LdAAbs)
}

fn decode_ld_abs_sp(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::LdAbsSp)
}

fn decode_ld_sp_hl(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::LdSpHl)
}

fn decode_ld_hl_sp_rel(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::LdHlSpRel)
}

fn decode_add_sp_rel(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    finish(bus, pc, op, false, Kind::AddSpRel)
}

// --- prefixed decoders -------------------------------------------------

fn decode_cb_rotate(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let rot = rot_slot(bit_slice(op, 5, 3));
    let target = cb_target(bit_slice(op, 2, 0));
    finish(bus, pc, op, true, Kind::CbRotate { op: rot, target })
}

fn decode_cb_bit(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let bit = bit_slice(op, 5, 3);
    let target = cb_target(bit_slice(op, 2, 0));
    finish(bus, pc, op, true, Kind::CbBit { bit, target })
}

fn decode_cb_res(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let bit = bit_slice(op, 5, 3);
    let target = cb_target(bit_slice(op, 2, 0));
    finish(bus, pc, op, true, Kind::CbRes { bit, target })
}

fn decode_cb_set(bus: &dyn Memory, pc: u16, op: u8) -> Result<Instruction, CoreError> {
    let bit = bit_slice(op, 5, 3);
    let target = cb_target(bit_slice(op, 2, 0));
    finish(bus, pc, op, true, Kind::CbSet { bit, target })
}

// --- table builders ----------------------------------------------------

fn build_unprefixed() -> [Option<DecodeFn>; 256] {
    let mut t: [Option<DecodeFn>; 256] = [None; 256];

    t[0x00] = Some(decode_nop as DecodeFn);
    t[0x10] = Some(decode_stop);
    t[0x76] = Some(decode_halt);
    t[0xF3] = Some(decode_di);
    t[0xFB] = Some(decode_ei);

    // 01dddsss: register-to-register loads. Slot 6 is the (HL)
    // placeholder, so the family splits into three shapes, with HALT
    // sitting in the double-indirect hole at 0x76.
    for op in 0x40..=0x7Fu8 {
        if op == 0x76 {
            continue;
        }
        let dst = bit_slice(op, 5, 3);
        let src = bit_slice(op, 2, 0);
        t[op as usize] = Some(match (dst, src) {
            (6, _) => decode_ld_hl_r,
            (_, 6) => decode_ld_r_hl,
            _ => decode_ld_r_r,
        });
    }

    // 00ddd110: LD r,n8 / LD (HL),n8
    for slot in 0..8u8 {
        let op = (slot << 3) | 0x06;
        t[op as usize] = Some(if slot == 6 {
            decode_ld_hl_imm
        } else {
            decode_ld_r_imm
        });
    }

    // 00rr0001 etc: the wide-register column families
    for slot in 0..4u8 {
        t[((slot << 4) | 0x01) as usize] = Some(decode_ld16_imm as DecodeFn);
        t[((slot << 4) | 0x02) as usize] = Some(decode_ld_ind_a);
        t[((slot << 4) | 0x03) as usize] = Some(decode_inc16);
        t[((slot << 4) | 0x09) as usize] = Some(decode_add_hl16);
        t[((slot << 4) | 0x0A) as usize] = Some(decode_ld_a_ind);
        t[((slot << 4) | 0x0B) as usize] = Some(decode_dec16);
    }

    // 00ddd100 / 00ddd101: INC r / DEC r, with the (HL) slot distinct
    for slot in 0..8u8 {
        let inc = (slot << 3) | 0x04;
        let dec = (slot << 3) | 0x05;
        t[inc as usize] = Some(if slot == 6 {
            decode_inc_hl_ind
        } else {
            decode_inc_r
        });
        t[dec as usize] = Some(if slot == 6 {
            decode_dec_hl_ind
        } else {
            decode_dec_r
        });
    }

    // 000rr111: the four accumulator rotates
    for slot in 0..4u8 {
        t[((slot << 3) | 0x07) as usize] = Some(decode_rot_a as DecodeFn);
    }
    t[0x27] = Some(decode_daa);
    t[0x2F] = Some(decode_cpl);
    t[0x37] = Some(decode_scf);
    t[0x3F] = Some(decode_ccf);

    // 10ooosss: the accumulator ALU block
    for op in 0x80..=0xBFu8 {
        t[op as usize] = Some(if bit_slice(op, 2, 0) == 6 {
            decode_alu_hl
        } else {
            decode_alu_r
        });
    }
    // 11ooo110: ALU with immediate operand
    for slot in 0..8u8 {
        t[(0xC6 | (slot << 3)) as usize] = Some(decode_alu_imm as DecodeFn);
    }

    // Control flow. The conditional forms share a 2-bit cc field.
    t[0x18] = Some(decode_jr);
    for cc in 0..4u8 {
        t[(0x20 | (cc << 3)) as usize] = Some(decode_jr_cond as DecodeFn);
        t[(0xC0 | (cc << 3)) as usize] = Some(decode_ret_cond);
        t[(0xC2 | (cc << 3)) as usize] = Some(decode_jp_cond);
        t[(0xC4 | (cc << 3)) as usize] = Some(decode_call_cond);
    }
    t[0xC3] = Some(decode_jp);
    t[0xC9] = Some(decode_ret);
    t[0xCD] = Some(decode_call);
    t[0xD9] = Some(decode_reti);
    t[0xE9] = Some(decode_jp_hl);

    // 11vvv111: RST vectors
    for slot in 0..8u8 {
        t[(0xC7 | (slot << 3)) as usize] = Some(decode_rst as DecodeFn);
    }

    // 11rr0101 / 11rr0001: PUSH / POP
    for slot in 0..4u8 {
        t[(0xC1 | (slot << 4)) as usize] = Some(decode_pop as DecodeFn);
        t[(0xC5 | (slot << 4)) as usize] = Some(decode_push);
    }

    // High-page and absolute accumulator transfers
    t[0xE0] = Some(decode_ldh_imm_a);
    t[0xE2] = Some(decode_ldh_c_a);
    t[0xEA] = Some(decode_ld_abs_a);
    t[0xF0] = Some(decode_ldh_a_imm);
    t[0xF2] = Some(decode_ldh_a_c);
    t[0xFA] = Some(decode_ld_a_abs);

    // Stack-pointer transfers and arithmetic
    t[0x08] = Some(decode_ld_abs_sp);
    t[0xE8] = Some(decode_add_sp_rel);
    t[0xF8] = Some(decode_ld_hl_sp_rel);
    t[0xF9] = Some(decode_ld_sp_hl);

    t
}

fn build_prefixed() -> [Option<DecodeFn>; 256] {
    let mut t: [Option<DecodeFn>; 256] = [None; 256];

    // The CB block is perfectly regular: the top two bits pick the
    // family, and every one of the 256 encodings is defined.
    for op in 0..=255u8 {
        t[op as usize] = Some(match bit_slice(op, 7, 6) {
            0b00 => decode_cb_rotate as DecodeFn,
            0b01 => decode_cb_bit,
            0b10 => decode_cb_res,
            _ => decode_cb_set,
        });
    }
    t
}
