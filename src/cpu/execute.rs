//! Instruction execution. One dispatch over the decoded tag; every arm
//! applies the register/memory/flag effects and the machine-cycle cost
//! comes from the instruction itself. The PC is advanced past the
//! encoding up front so the jump arms simply overwrite it.

use crate::bus::Memory;
use crate::constants::*;
use crate::cpu::instruction::*;
use crate::cpu::Cpu;
use crate::error::CoreError;
use crate::registers::{Reg16, Registers};

pub(crate) fn execute(
    cpu: &mut Cpu,
    bus: &mut dyn Memory,
    instr: &Instruction,
) -> Result<u8, CoreError> {
    cpu.regs.pc = instr.addr.wrapping_add(instr.len as u16);
    let mut taken = true;

    match instr.kind {
        Kind::Nop => {}
        // Low-power mode is not modeled; STOP parks the CPU the same
        // way HALT does.
        Kind::Stop | Kind::Halt => cpu.halted = true,
        Kind::Di => {
            cpu.regs.ime = false;
            cpu.ime_scheduled = false;
        }
        // Takes effect after the next instruction; the step loop
        // applies the delay.
        Kind::Ei => cpu.ime_scheduled = true,

        Kind::LdRR { dst, src } => {
            let val = cpu.regs.get8(src);
            cpu.regs.set8(dst, val);
        }
        Kind::LdRImm { dst } => cpu.regs.set8(dst, instr.imm8()),
        Kind::LdRHl { dst } => {
            let val = bus.read(cpu.regs.get16(Reg16::HL))?;
            cpu.regs.set8(dst, val);
        }
        Kind::LdHlR { src } => {
            bus.write(cpu.regs.get16(Reg16::HL), cpu.regs.get8(src))?;
        }
        Kind::LdHlImm => bus.write(cpu.regs.get16(Reg16::HL), instr.imm8())?,
        Kind::LdAInd { src } => {
            let addr = indirect_addr(&mut cpu.regs, src);
            cpu.regs.a = bus.read(addr)?;
        }
        Kind::LdIndA { dst } => {
            let addr = indirect_addr(&mut cpu.regs, dst);
            bus.write(addr, cpu.regs.a)?;
        }
        Kind::Ld16Imm { dst } => cpu.regs.set16(dst, instr.imm16()),
        Kind::LdAbsA => bus.write(instr.imm16(), cpu.regs.a)?,
        Kind::LdAAbs => cpu.regs.a = bus.read(instr.imm16())?,
        Kind::LdhImmA => bus.write(0xFF00 | instr.imm8() as u16, cpu.regs.a)?,
        Kind::LdhAImm => cpu.regs.a = bus.read(0xFF00 | instr.imm8() as u16)?,
        Kind::LdhCA => bus.write(0xFF00 | cpu.regs.c as u16, cpu.regs.a)?,
        Kind::LdhAC => cpu.regs.a = bus.read(0xFF00 | cpu.regs.c as u16)?,
        Kind::LdAbsSp => bus.write_u16(instr.imm16(), cpu.regs.sp)?,
        Kind::LdSpHl => cpu.regs.sp = cpu.regs.get16(Reg16::HL),
        Kind::LdHlSpRel => {
            let val = sp_offset(&mut cpu.regs, instr.rel8());
            cpu.regs.set16(Reg16::HL, val);
        }
        Kind::AddSpRel => cpu.regs.sp = sp_offset(&mut cpu.regs, instr.rel8()),

        Kind::IncR { reg } => {
            let val = cpu.regs.get8(reg);
            let val = inc8(&mut cpu.regs, val);
            cpu.regs.set8(reg, val);
        }
        Kind::DecR { reg } => {
            let val = cpu.regs.get8(reg);
            let val = dec8(&mut cpu.regs, val);
            cpu.regs.set8(reg, val);
        }
        Kind::IncHlInd => {
            let addr = cpu.regs.get16(Reg16::HL);
            let val = inc8(&mut cpu.regs, bus.read(addr)?);
            bus.write(addr, val)?;
        }
        Kind::DecHlInd => {
            let addr = cpu.regs.get16(Reg16::HL);
            let val = dec8(&mut cpu.regs, bus.read(addr)?);
            bus.write(addr, val)?;
        }
        // The 16-bit inc/dec pass through the pair without touching
        // flags.
        Kind::Inc16 { reg } => {
            let val = cpu.regs.get16(reg).wrapping_add(1);
            cpu.regs.set16(reg, val);
        }
        Kind::Dec16 { reg } => {
            let val = cpu.regs.get16(reg).wrapping_sub(1);
            cpu.regs.set16(reg, val);
        }
        Kind::AddHl16 { src } => {
            let hl = cpu.regs.get16(Reg16::HL);
            let rhs = cpu.regs.get16(src);
            let result = hl.wrapping_add(rhs);
            cpu.regs.set_flag(FLAG_N, false);
            cpu.regs
                .set_flag(FLAG_H, (hl & 0x0FFF) + (rhs & 0x0FFF) > 0x0FFF);
            cpu.regs.set_flag(FLAG_C, hl as u32 + rhs as u32 > 0xFFFF);
            cpu.regs.set16(Reg16::HL, result);
        }

        Kind::AluR { op, src } => {
            let val = cpu.regs.get8(src);
            alu(&mut cpu.regs, op, val);
        }
        Kind::AluHl { op } => {
            let val = bus.read(cpu.regs.get16(Reg16::HL))?;
            alu(&mut cpu.regs, op, val);
        }
        Kind::AluImm { op } => alu(&mut cpu.regs, op, instr.imm8()),

        // The accumulator-only rotates always clear Z, unlike their
        // CB-prefixed twins.
        Kind::RotateA { op } => {
            let (val, carry) = rotate(op, cpu.regs.a, cpu.regs.get_flag(FLAG_C));
            cpu.regs.a = val;
            cpu.regs.f = 0;
            cpu.regs.set_flag(FLAG_C, carry);
        }
        Kind::Daa => daa(&mut cpu.regs),
        Kind::Cpl => {
            cpu.regs.a = !cpu.regs.a;
            cpu.regs.set_flag(FLAG_N, true);
            cpu.regs.set_flag(FLAG_H, true);
        }
        Kind::Scf => {
            cpu.regs.set_flag(FLAG_N, false);
            cpu.regs.set_flag(FLAG_H, false);
            cpu.regs.set_flag(FLAG_C, true);
        }
        Kind::Ccf => {
            let carry = cpu.regs.get_flag(FLAG_C);
            cpu.regs.set_flag(FLAG_N, false);
            cpu.regs.set_flag(FLAG_H, false);
            cpu.regs.set_flag(FLAG_C, !carry);
        }

        Kind::Jp => cpu.regs.pc = instr.imm16(),
        Kind::JpCond { cond } => {
            taken = condition(&cpu.regs, cond);
            if taken {
                cpu.regs.pc = instr.imm16();
            }
        }
        Kind::JpHl => cpu.regs.pc = cpu.regs.get16(Reg16::HL),
        Kind::Jr => cpu.regs.pc = cpu.regs.pc.wrapping_add(instr.rel8() as i16 as u16),
        Kind::JrCond { cond } => {
            taken = condition(&cpu.regs, cond);
            if taken {
                cpu.regs.pc = cpu.regs.pc.wrapping_add(instr.rel8() as i16 as u16);
            }
        }
        Kind::Call => {
            cpu.push_u16(bus, cpu.regs.pc)?;
            cpu.regs.pc = instr.imm16();
        }
        Kind::CallCond { cond } => {
            taken = condition(&cpu.regs, cond);
            if taken {
                cpu.push_u16(bus, cpu.regs.pc)?;
                cpu.regs.pc = instr.imm16();
            }
        }
        Kind::Ret => cpu.regs.pc = cpu.pop_u16(bus)?,
        Kind::RetCond { cond } => {
            taken = condition(&cpu.regs, cond);
            if taken {
                cpu.regs.pc = cpu.pop_u16(bus)?;
            }
        }
        // RETI enables interrupts immediately, without EI's delay.
        Kind::Reti => {
            cpu.regs.pc = cpu.pop_u16(bus)?;
            cpu.regs.ime = true;
        }
        Kind::Rst { vector } => {
            cpu.push_u16(bus, cpu.regs.pc)?;
            cpu.regs.pc = vector as u16;
        }
        Kind::Push { reg } => cpu.push_u16(bus, cpu.regs.get16(reg))?,
        Kind::Pop { reg } => {
            let val = cpu.pop_u16(bus)?;
            cpu.regs.set16(reg, val);
        }

        Kind::CbRotate { op, target } => {
            let val = read_cb_target(&cpu.regs, bus, target)?;
            let (result, carry) = rotate(op, val, cpu.regs.get_flag(FLAG_C));
            cpu.regs.f = 0;
            cpu.regs.set_flag(FLAG_Z, result == 0);
            cpu.regs.set_flag(FLAG_C, carry);
            write_cb_target(&mut cpu.regs, bus, target, result)?;
        }
        // BIT only inspects; C survives.
        Kind::CbBit { bit, target } => {
            let val = read_cb_target(&cpu.regs, bus, target)?;
            cpu.regs.set_flag(FLAG_Z, val & (1 << bit) == 0);
            cpu.regs.set_flag(FLAG_N, false);
            cpu.regs.set_flag(FLAG_H, true);
        }
        Kind::CbRes { bit, target } => {
            let val = read_cb_target(&cpu.regs, bus, target)?;
            write_cb_target(&mut cpu.regs, bus, target, val & !(1 << bit))?;
        }
        Kind::CbSet { bit, target } => {
            let val = read_cb_target(&cpu.regs, bus, target)?;
            write_cb_target(&mut cpu.regs, bus, target, val | (1 << bit))?;
        }
    }

    Ok(instr.kind.cycles(taken))
}

fn condition(regs: &Registers, cond: Cond) -> bool {
    match cond {
        Cond::NotZero => !regs.get_flag(FLAG_Z),
        Cond::Zero => regs.get_flag(FLAG_Z),
        Cond::NotCarry => !regs.get_flag(FLAG_C),
        Cond::Carry => regs.get_flag(FLAG_C),
    }
}

/// Resolves a pointer register, applying the HL post-increment or
/// post-decrement before returning the original address.
fn indirect_addr(regs: &mut Registers, ind: Indirect) -> u16 {
    match ind {
        Indirect::Bc => regs.get16(Reg16::BC),
        Indirect::De => regs.get16(Reg16::DE),
        Indirect::HlInc => {
            let hl = regs.get16(Reg16::HL);
            regs.set16(Reg16::HL, hl.wrapping_add(1));
            hl
        }
        Indirect::HlDec => {
            let hl = regs.get16(Reg16::HL);
            regs.set16(Reg16::HL, hl.wrapping_sub(1));
            hl
        }
    }
}

fn read_cb_target(regs: &Registers, bus: &dyn Memory, target: CbTarget) -> Result<u8, CoreError> {
    match target {
        CbTarget::Reg(reg) => Ok(regs.get8(reg)),
        CbTarget::HlIndirect => bus.read(regs.get16(Reg16::HL)),
    }
}

fn write_cb_target(
    regs: &mut Registers,
    bus: &mut dyn Memory,
    target: CbTarget,
    val: u8,
) -> Result<(), CoreError> {
    match target {
        CbTarget::Reg(reg) => {
            regs.set8(reg, val);
            Ok(())
        }
        CbTarget::HlIndirect => bus.write(regs.get16(Reg16::HL), val),
    }
}

/// Applies an accumulator ALU operation and its full flag effects.
fn alu(regs: &mut Registers, op: AluOp, rhs: u8) {
    let a = regs.a;
    match op {
        AluOp::Add => regs.a = add8(regs, a, rhs, false),
        AluOp::Adc => {
            let carry = regs.get_flag(FLAG_C);
            regs.a = add8(regs, a, rhs, carry);
        }
        AluOp::Sub => regs.a = sub8(regs, a, rhs, false),
        AluOp::Sbc => {
            let carry = regs.get_flag(FLAG_C);
            regs.a = sub8(regs, a, rhs, carry);
        }
        AluOp::And => {
            regs.a = a & rhs;
            regs.f = 0;
            regs.set_flag(FLAG_Z, regs.a == 0);
            regs.set_flag(FLAG_H, true);
        }
        AluOp::Xor => {
            regs.a = a ^ rhs;
            regs.f = 0;
            regs.set_flag(FLAG_Z, regs.a == 0);
        }
        AluOp::Or => {
            regs.a = a | rhs;
            regs.f = 0;
            regs.set_flag(FLAG_Z, regs.a == 0);
        }
        // CP is a subtraction that throws the result away.
        AluOp::Cp => {
            sub8(regs, a, rhs, false);
        }
    }
}

fn add8(regs: &mut Registers, lhs: u8, rhs: u8, carry_in: bool) -> u8 {
    let carry = carry_in as u8;
    let result = lhs.wrapping_add(rhs).wrapping_add(carry);
    regs.set_flag(FLAG_Z, result == 0);
    regs.set_flag(FLAG_N, false);
    regs.set_flag(FLAG_H, (lhs & 0x0F) + (rhs & 0x0F) + carry > 0x0F);
    regs.set_flag(FLAG_C, lhs as u16 + rhs as u16 + carry as u16 > 0xFF);
    result
}

fn sub8(regs: &mut Registers, lhs: u8, rhs: u8, carry_in: bool) -> u8 {
    let carry = carry_in as u8;
    let result = lhs.wrapping_sub(rhs).wrapping_sub(carry);
    regs.set_flag(FLAG_Z, result == 0);
    regs.set_flag(FLAG_N, true);
    regs.set_flag(FLAG_H, (lhs & 0x0F) < (rhs & 0x0F) + carry);
    regs.set_flag(FLAG_C, (lhs as u16) < rhs as u16 + carry as u16);
    result
}

/// INC r: half-carry out of bit 3, carry untouched.
fn inc8(regs: &mut Registers, val: u8) -> u8 {
    let result = val.wrapping_add(1);
    regs.set_flag(FLAG_Z, result == 0);
    regs.set_flag(FLAG_N, false);
    regs.set_flag(FLAG_H, val & 0x0F == 0x0F);
    result
}

fn dec8(regs: &mut Registers, val: u8) -> u8 {
    let result = val.wrapping_sub(1);
    regs.set_flag(FLAG_Z, result == 0);
    regs.set_flag(FLAG_N, true);
    regs.set_flag(FLAG_H, val & 0x0F == 0);
    result
}

/// SP plus signed offset, shared by ADD SP,e8 and LD HL,SP+e8. The
/// flags come from unsigned byte arithmetic on the low byte; Z is
/// always cleared.
fn sp_offset(regs: &mut Registers, offset: i8) -> u16 {
    let sp = regs.sp;
    let rhs = offset as i16 as u16;
    regs.f = 0;
    regs.set_flag(FLAG_H, (sp & 0x0F) + (rhs & 0x0F) > 0x0F);
    regs.set_flag(FLAG_C, (sp & 0xFF) + (rhs & 0xFF) > 0xFF);
    sp.wrapping_add(rhs)
}

fn rotate(op: RotOp, val: u8, carry_in: bool) -> (u8, bool) {
    match op {
        RotOp::Rlc => (val.rotate_left(1), val & 0x80 != 0),
        RotOp::Rrc => (val.rotate_right(1), val & 0x01 != 0),
        RotOp::Rl => ((val << 1) | carry_in as u8, val & 0x80 != 0),
        RotOp::Rr => ((val >> 1) | ((carry_in as u8) << 7), val & 0x01 != 0),
        RotOp::Sla => (val << 1, val & 0x80 != 0),
        // SRA keeps the sign bit.
        RotOp::Sra => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
        RotOp::Swap => (val.rotate_left(4), false),
        RotOp::Srl => (val >> 1, val & 0x01 != 0),
    }
}

/// Decimal adjust after a BCD add or subtract. The correction depends
/// on the N/H/C flags left by the previous operation.
fn daa(regs: &mut Registers) {
    let mut adjust = 0u8;
    let mut carry = regs.get_flag(FLAG_C);

    if !regs.get_flag(FLAG_N) {
        if regs.get_flag(FLAG_H) || regs.a & 0x0F > 0x09 {
            adjust |= 0x06;
        }
        if carry || regs.a > 0x99 {
            adjust |= 0x60;
            carry = true;
        }
        regs.a = regs.a.wrapping_add(adjust);
    } else {
        if regs.get_flag(FLAG_H) {
            adjust |= 0x06;
        }
        if carry {
            adjust |= 0x60;
        }
        regs.a = regs.a.wrapping_sub(adjust);
    }

    regs.set_flag(FLAG_Z, regs.a == 0);
    regs.set_flag(FLAG_H, false);
    regs.set_flag(FLAG_C, carry);
}
