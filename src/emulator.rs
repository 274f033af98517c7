//! The master step loop. One iteration is one CPU step followed by the
//! same span of time on every clocked peripheral, so nothing ever runs
//! ahead of the CPU by more than a single instruction.

use log::debug;

use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::constants::T_CYCLES_PER_M_CYCLE;
use crate::cpu::Cpu;
use crate::error::CoreError;
use crate::ppu::Ppu;

pub struct Emulator {
    pub cpu: Cpu,
    pub bus: Bus,
    m_cycles: u64,
}

impl Emulator {
    pub fn new(cartridge: Cartridge) -> Self {
        Emulator {
            cpu: Cpu::new(),
            bus: Bus::new(cartridge),
            m_cycles: 0,
        }
    }

    pub fn with_ppu(cartridge: Cartridge, ppu: Box<dyn Ppu>) -> Self {
        Emulator {
            cpu: Cpu::new(),
            bus: Bus::with_ppu(cartridge, ppu),
            m_cycles: 0,
        }
    }

    /// One master iteration: one CPU step, then the elapsed T-cycles
    /// through the peripherals. Returns true once a frame is complete.
    pub fn step(&mut self) -> Result<bool, CoreError> {
        let cycles = self.cpu.step(&mut self.bus)?;
        self.m_cycles += cycles as u64;
        self.bus.tick_components(cycles as u32 * T_CYCLES_PER_M_CYCLE)
    }

    /// Steps until the video peripheral reports a completed frame and
    /// resets the signal before returning.
    pub fn run_frame(&mut self) -> Result<(), CoreError> {
        while !self.step()? {}
        self.bus.clear_frame_ready();
        debug!("frame complete at {} machine cycles", self.m_cycles);
        Ok(())
    }

    /// Total machine cycles executed since power-on.
    pub fn elapsed_m_cycles(&self) -> u64 {
        self.m_cycles
    }

    pub fn battery_ram(&self) -> &[u8] {
        self.bus.cartridge.battery_ram()
    }

    /// Everything the ROM wrote to the serial port so far.
    pub fn serial_out(&self) -> &[u8] {
        &self.bus.io.serial_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    /// A 32 KiB ROM-only image with a valid header and `code` placed at
    /// the 0x0100 entry point.
    fn test_cartridge(code: &[u8]) -> Cartridge {
        let mut rom = vec![0u8; 32 * 1024];
        rom[0x0100..0x0100 + code.len()].copy_from_slice(code);
        let mut x: u8 = 0;
        for i in 0x0134..=0x014C {
            x = x.wrapping_sub(rom[i]).wrapping_sub(1);
        }
        rom[0x014D] = x;
        Cartridge::new(rom, None).unwrap()
    }

    #[test]
    fn test_peripherals_advance_with_the_cpu() {
        // JR -2: a two-instruction-byte infinite loop, 3 M-cycles each.
        let mut emu = Emulator::new(test_cartridge(&[0x18, 0xFE]));

        for _ in 0..100 {
            emu.step().unwrap();
        }
        assert_eq!(emu.elapsed_m_cycles(), 300);
        // DIV is the upper byte of the T-cycle counter: 1200 / 256 = 4.
        assert_eq!(emu.bus.timer.read_div(), 4);
    }

    #[test]
    fn test_run_frame_stops_at_vblank_and_clears_signal() {
        let mut emu = Emulator::new(test_cartridge(&[0x18, 0xFE]));

        emu.run_frame().unwrap();

        // One scanline costs 456 T-cycles and V-Blank starts at line 144.
        let t_cycles = emu.elapsed_m_cycles() * T_CYCLES_PER_M_CYCLE as u64;
        assert!(t_cycles >= 144 * 456, "must reach the V-Blank boundary");
        assert!(t_cycles < 145 * 456, "must stop within the first line of it");

        assert!(
            !emu.step().unwrap(),
            "frame signal must be cleared before the loop resumes"
        );
    }

    #[test]
    fn test_unknown_opcode_stops_the_loop() {
        let mut emu = Emulator::new(test_cartridge(&[0xD3]));
        assert!(matches!(
            emu.run_frame(),
            Err(CoreError::UnknownOpcode { opcode: 0xD3, .. })
        ));
    }
}
