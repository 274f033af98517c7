//! The SM83 execution engine: fetch, decode, execute, plus interrupt
//! dispatch and the HALT state. All memory traffic goes through the
//! injected bus; the CPU owns nothing but its register file.

pub mod decode;
mod execute;
pub mod instruction;

use log::{debug, trace};

use crate::bus::Memory;
use crate::error::CoreError;
use crate::interrupts::InterruptKind;
use crate::registers::Registers;

/// Machine cycles spent dispatching an interrupt: two idle, two for the
/// PC push, one for the vector jump.
const INTERRUPT_DISPATCH_CYCLES: u8 = 5;

pub struct Cpu {
    pub regs: Registers,
    pub halted: bool,
    /// Set by EI; interrupts enable after the following instruction.
    pub(crate) ime_scheduled: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            regs: Registers::new(),
            halted: false,
            ime_scheduled: false,
        }
    }

    /// Runs one unit of work: an interrupt dispatch, a halted idle
    /// cycle, or a single instruction. Returns the machine-cycle cost.
    pub fn step(&mut self, bus: &mut dyn Memory) -> Result<u8, CoreError> {
        if let Some(kind) = bus.requested_interrupt()? {
            // A pending source always ends HALT, even with the master
            // enable off; it is only serviced when IME says so.
            self.halted = false;
            if self.regs.ime {
                return self.dispatch_interrupt(bus, kind);
            }
        }

        if self.halted {
            return Ok(1);
        }

        let enable_after = self.ime_scheduled;

        let instr = decode::decode(bus, self.regs.pc)?;
        trace!("0x{:04X}: {}", instr.addr, instr);
        let cycles = execute::execute(self, bus, &instr)?;

        if enable_after && self.ime_scheduled {
            self.regs.ime = true;
            self.ime_scheduled = false;
        }

        Ok(cycles)
    }

    /// Jumps to the source's fixed vector: master enable off, request
    /// bit acknowledged, return address pushed.
    fn dispatch_interrupt(
        &mut self,
        bus: &mut dyn Memory,
        kind: InterruptKind,
    ) -> Result<u8, CoreError> {
        debug!("dispatching {:?} interrupt to 0x{:04X}", kind, kind.vector());

        self.regs.ime = false;
        self.ime_scheduled = false;

        let flags = bus.read_if()?;
        bus.write_if(flags & !kind.mask())?;

        self.push_u16(bus, self.regs.pc)?;
        self.regs.pc = kind.vector();

        Ok(INTERRUPT_DISPATCH_CYCLES)
    }

    pub(crate) fn push_u16(&mut self, bus: &mut dyn Memory, val: u16) -> Result<(), CoreError> {
        self.regs.sp = self.regs.sp.wrapping_sub(2);
        bus.write_u16(self.regs.sp, val)
    }

    pub(crate) fn pop_u16(&mut self, bus: &mut dyn Memory) -> Result<u16, CoreError> {
        let val = bus.read_u16(self.regs.sp)?;
        self.regs.sp = self.regs.sp.wrapping_add(2);
        Ok(val)
    }
}
