use crate::registers::{Reg8, Reg16};
use std::fmt;

/// Branch conditions encoded in the `cc` bit-field of jumps/calls/rets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cond {
    NotZero,
    Zero,
    NotCarry,
    Carry,
}

/// The eight accumulator ALU operations from the 10xxxrrr block.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

/// Rotate/shift operations. The accumulator-only forms use the first
/// four; the CB-prefixed block uses all eight.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RotOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

/// Pointer registers for the LD A,(rr) / LD (rr),A family, including
/// the post-increment/decrement HL forms.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Indirect {
    Bc,
    De,
    HlInc,
    HlDec,
}

/// Operand slot of a CB-prefixed instruction: a register or (HL).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CbTarget {
    Reg(Reg8),
    HlIndirect,
}

/// Decoded instruction payload: one tag per opcode family, carrying
/// only the operand selection extracted from the opcode's bit-fields.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Kind {
    Nop,
    Stop,
    Halt,
    Di,
    Ei,

    LdRR { dst: Reg8, src: Reg8 },
    LdRImm { dst: Reg8 },
    LdRHl { dst: Reg8 },
    LdHlR { src: Reg8 },
    LdHlImm,
    LdAInd { src: Indirect },
    LdIndA { dst: Indirect },
    Ld16Imm { dst: Reg16 },
    LdAbsA,
    LdAAbs,
    LdhImmA, // LDH (a8),A
    LdhAImm, // LDH A,(a8)
    LdhCA,   // LD (0xFF00+C),A
    LdhAC,   // LD A,(0xFF00+C)
    LdAbsSp, // LD (a16),SP
    LdSpHl,
    LdHlSpRel, // LD HL,SP+e8
    AddSpRel,  // ADD SP,e8

    IncR { reg: Reg8 },
    DecR { reg: Reg8 },
    IncHlInd,
    DecHlInd,
    Inc16 { reg: Reg16 },
    Dec16 { reg: Reg16 },
    AddHl16 { src: Reg16 },

    AluR { op: AluOp, src: Reg8 },
    AluHl { op: AluOp },
    AluImm { op: AluOp },

    RotateA { op: RotOp },
    Daa,
    Cpl,
    Scf,
    Ccf,

    Jp,
    JpCond { cond: Cond },
    JpHl,
    Jr,
    JrCond { cond: Cond },
    Call,
    CallCond { cond: Cond },
    Ret,
    RetCond { cond: Cond },
    Reti,
    Rst { vector: u8 },
    Push { reg: Reg16 },
    Pop { reg: Reg16 },

    CbRotate { op: RotOp, target: CbTarget },
    CbBit { bit: u8, target: CbTarget },
    CbRes { bit: u8, target: CbTarget },
    CbSet { bit: u8, target: CbTarget },
}

impl Kind {
    /// Static encoded length in bytes, prefix included.
    pub fn encoded_length(&self) -> u8 {
        use Kind::*;
        match self {
            LdRImm { .. } | LdHlImm | AluImm { .. } | Jr | JrCond { .. } | LdhImmA | LdhAImm
            | LdHlSpRel | AddSpRel | Stop => 2,
            Ld16Imm { .. } | LdAbsA | LdAAbs | LdAbsSp | Jp | JpCond { .. } | Call
            | CallCond { .. } => 3,
            CbRotate { .. } | CbBit { .. } | CbRes { .. } | CbSet { .. } => 2,
            _ => 1,
        }
    }

    /// Machine-cycle cost. For conditional control flow the not-taken
    /// path skips the memory traffic of the jump and is strictly
    /// cheaper.
    pub fn cycles(&self, taken: bool) -> u8 {
        use Kind::*;
        match self {
            Nop | Stop | Halt | Di | Ei | LdRR { .. } | IncR { .. } | DecR { .. }
            | AluR { .. } | RotateA { .. } | Daa | Cpl | Scf | Ccf | JpHl => 1,
            LdRImm { .. } | LdRHl { .. } | LdHlR { .. } | LdAInd { .. } | LdIndA { .. }
            | AluHl { .. } | AluImm { .. } | Inc16 { .. } | Dec16 { .. } | AddHl16 { .. }
            | LdSpHl | LdhCA | LdhAC => 2,
            LdHlImm | Ld16Imm { .. } | IncHlInd | DecHlInd | LdhImmA | LdhAImm | LdHlSpRel
            | Pop { .. } => 3,
            LdAbsA | LdAAbs | AddSpRel | Ret | Reti | Rst { .. } | Push { .. } => 4,
            LdAbsSp => 5,
            Jp => 4,
            JpCond { .. } => {
                if taken {
                    4
                } else {
                    3
                }
            }
            Jr => 3,
            JrCond { .. } => {
                if taken {
                    3
                } else {
                    2
                }
            }
            Call => 6,
            CallCond { .. } => {
                if taken {
                    6
                } else {
                    3
                }
            }
            RetCond { .. } => {
                if taken {
                    5
                } else {
                    2
                }
            }
            CbRotate { target, .. } => match target {
                CbTarget::HlIndirect => 4,
                CbTarget::Reg(_) => 2,
            },
            CbBit { target, .. } => match target {
                CbTarget::HlIndirect => 3,
                CbTarget::Reg(_) => 2,
            },
            CbRes { target, .. } | CbSet { target, .. } => match target {
                CbTarget::HlIndirect => 4,
                CbTarget::Reg(_) => 2,
            },
        }
    }
}

/// One decoded instruction. Immutable once the decoder hands it over;
/// consumed by the execution engine and discarded.
#[derive(Debug, Copy, Clone)]
pub struct Instruction {
    pub opcode: u8,
    pub prefixed: bool,
    /// Address the first byte was fetched from.
    pub addr: u16,
    /// Raw encoded bytes; 16-bit immediates are little endian.
    pub bytes: [u8; 3],
    pub len: u8,
    pub kind: Kind,
}

impl Instruction {
    /// The 8-bit immediate, for 2-byte encodings.
    pub fn imm8(&self) -> u8 {
        self.bytes[1]
    }

    /// The signed relative offset of JR and the SP+e8 forms.
    pub fn rel8(&self) -> i8 {
        self.bytes[1] as i8
    }

    /// The 16-bit immediate, assembled little endian.
    pub fn imm16(&self) -> u16 {
        u16::from_le_bytes([self.bytes[1], self.bytes[2]])
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefixed {
            write!(f, "CB {:02X} {:?}", self.opcode, self.kind)
        } else {
            write!(f, "{:02X} {:?}", self.opcode, self.kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_lengths() {
        assert_eq!(Kind::Nop.encoded_length(), 1);
        assert_eq!(Kind::LdRImm { dst: Reg8::A }.encoded_length(), 2);
        assert_eq!(Kind::Jp.encoded_length(), 3);
        assert_eq!(
            Kind::CbBit {
                bit: 0,
                target: CbTarget::Reg(Reg8::B)
            }
            .encoded_length(),
            2
        );
    }

    #[test]
    fn test_conditional_cycles_are_cheaper_when_not_taken() {
        let conditionals = [
            Kind::JpCond { cond: Cond::Zero },
            Kind::JrCond { cond: Cond::Carry },
            Kind::CallCond {
                cond: Cond::NotZero,
            },
            Kind::RetCond {
                cond: Cond::NotCarry,
            },
        ];
        for kind in conditionals {
            assert!(
                kind.cycles(false) < kind.cycles(true),
                "{:?} not-taken path must be strictly cheaper",
                kind
            );
        }
    }

    #[test]
    fn test_imm16_is_little_endian() {
        let instr = Instruction {
            opcode: 0xC3,
            prefixed: false,
            addr: 0x0100,
            bytes: [0xC3, 0x37, 0x06],
            len: 3,
            kind: Kind::Jp,
        };
        assert_eq!(instr.imm16(), 0x0637);
    }
}
