use crate::constants::*;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl fmt::Display for Reg8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    SP,
}

impl fmt::Display for Reg16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Flat register file. The 16-bit pairs are pure composition over the
/// 8-bit halves, never references into them.
#[derive(Debug, Clone)]
pub struct Registers {
    pub a: u8,
    pub f: u8, // Flags register, lower nibble always reads 0
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    pub pc: u16,
    pub sp: u16,

    pub ime: bool, // Interrupt Master Enable
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub fn new() -> Self {
        Self {
            // These values are standard for the GB after the boot ROM runs
            a: 0x01,
            f: 0xB0,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            pc: 0x0100, // Entry point for cartridges
            sp: 0xFFFE,
            ime: false,
        }
    }

    pub fn get8(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::A => self.a,
            Reg8::B => self.b,
            Reg8::C => self.c,
            Reg8::D => self.d,
            Reg8::E => self.e,
            Reg8::H => self.h,
            Reg8::L => self.l,
        }
    }

    pub fn set8(&mut self, reg: Reg8, val: u8) {
        match reg {
            Reg8::A => self.a = val,
            Reg8::B => self.b = val,
            Reg8::C => self.c = val,
            Reg8::D => self.d = val,
            Reg8::E => self.e = val,
            Reg8::H => self.h = val,
            Reg8::L => self.l = val,
        }
    }

    pub fn get16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::AF => u16::from_be_bytes([self.a, self.flags()]),
            Reg16::BC => u16::from_be_bytes([self.b, self.c]),
            Reg16::DE => u16::from_be_bytes([self.d, self.e]),
            Reg16::HL => u16::from_be_bytes([self.h, self.l]),
            Reg16::SP => self.sp,
        }
    }

    pub fn set16(&mut self, reg: Reg16, val: u16) {
        let bytes = val.to_be_bytes();
        match reg {
            Reg16::AF => {
                self.a = bytes[0];
                // The lower 4 bits of F are hardwired to 0
                self.f = bytes[1] & 0xF0;
            }
            Reg16::BC => {
                self.b = bytes[0];
                self.c = bytes[1];
            }
            Reg16::DE => {
                self.d = bytes[0];
                self.e = bytes[1];
            }
            Reg16::HL => {
                self.h = bytes[0];
                self.l = bytes[1];
            }
            Reg16::SP => self.sp = val,
        }
    }

    /// The flags register with its lower nibble masked off.
    pub fn flags(&self) -> u8 {
        self.f & 0xF0
    }

    pub fn get_flag(&self, flag: u8) -> bool {
        (self.f & flag) != 0
    }

    pub fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.f |= flag;
        } else {
            self.f &= !flag;
        }
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let z = if self.get_flag(FLAG_Z) { 'Z' } else { '-' };
        let n = if self.get_flag(FLAG_N) { 'N' } else { '-' };
        let h = if self.get_flag(FLAG_H) { 'H' } else { '-' };
        let c = if self.get_flag(FLAG_C) { 'C' } else { '-' };

        write!(
            f,
            "A:{:02X} B:{:02X} C:{:02X} D:{:02X} E:{:02X} H:{:02X} L:{:02X} SP:{:04X} PC:{:04X} Flags:[{}{}{}{}]",
            self.a, self.b, self.c, self.d, self.e, self.h, self.l, self.sp, self.pc, z, n, h, c
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_write_reads_back_through_halves() {
        let mut regs = Registers::new();

        regs.set16(Reg16::BC, 0x1234);
        assert_eq!(regs.b, 0x12, "B holds the high byte");
        assert_eq!(regs.c, 0x34, "C holds the low byte");

        regs.set16(Reg16::DE, 0xBEEF);
        assert_eq!(regs.d, 0xBE);
        assert_eq!(regs.e, 0xEF);

        regs.set16(Reg16::HL, 0x0001);
        assert_eq!(regs.h, 0x00);
        assert_eq!(regs.l, 0x01);
    }

    #[test]
    fn test_half_write_reflected_in_pair() {
        let mut regs = Registers::new();

        regs.set8(Reg8::H, 0xAB);
        regs.set8(Reg8::L, 0xCD);
        assert_eq!(regs.get16(Reg16::HL), 0xABCD);

        regs.set8(Reg8::B, 0x80);
        assert_eq!(regs.get16(Reg16::BC) >> 8, 0x80);
    }

    #[test]
    fn test_af_write_masks_flag_nibble() {
        let mut regs = Registers::new();

        regs.set16(Reg16::AF, 0x12FF);
        assert_eq!(regs.a, 0x12);
        assert_eq!(regs.f, 0xF0, "lower nibble of F must be dropped");
        assert_eq!(regs.get16(Reg16::AF), 0x12F0);
    }

    #[test]
    fn test_flags_read_always_masked() {
        let mut regs = Registers::new();

        // Poke the raw field directly; flags() must still mask.
        regs.f = 0xAB;
        assert_eq!(regs.flags(), 0xA0);
    }

    #[test]
    fn test_flag_set_and_clear() {
        let mut regs = Registers::new();

        regs.set_flag(FLAG_Z, true);
        assert!(regs.get_flag(FLAG_Z));
        regs.set_flag(FLAG_Z, false);
        assert!(!regs.get_flag(FLAG_Z));

        regs.set_flag(FLAG_H, true);
        regs.set_flag(FLAG_C, true);
        assert!(regs.get_flag(FLAG_H));
        assert!(regs.get_flag(FLAG_C));
        assert!(!regs.get_flag(FLAG_N));
    }
}
