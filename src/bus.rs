/*
Source: https://gbdev.io/pandocs/Memory_Map.html

Start   End     Description
0000    7FFF    Cartridge ROM, bank switching via the MBC
8000    9FFF    8 KiB Video RAM (VRAM)
A000    BFFF    8 KiB External RAM, from cartridge
C000    DFFF    8 KiB Work RAM (WRAM)
E000    FDFF    Echo RAM - prohibited, we treat any access as fatal
FE00    FE9F    Object attribute memory (OAM)
FEA0    FEFF    Not usable - also fatal
FF00    FF7F    I/O registers
FF80    FFFE    High RAM (HRAM)
FFFF    FFFF    Interrupt Enable register (IE)

Every address belongs to exactly one zone. The bus only routes; all
behavior lives in the component behind each zone.
*/

use log::trace;

use crate::{
    apu::Apu,
    cartridge::Cartridge,
    constants::*,
    dma::OamDma,
    error::CoreError,
    interrupts::{InterruptKind, Interrupts},
    io::IoRegisters,
    ppu::{DummyPpu, Ppu},
    timer::Timer,
};

const VRAM_SIZE: usize = 0x2000;
const WRAM_SIZE: usize = 0x2000;
const OAM_SIZE: usize = 0xA0;
const HRAM_SIZE: usize = 0x7F;

/// The seam between the CPU and whatever backs its address space.
/// Forbidden-zone accesses surface as `CoreError`, which is why every
/// operation returns a Result.
pub trait Memory {
    fn read(&self, addr: u16) -> Result<u8, CoreError>;
    fn write(&mut self, addr: u16, val: u8) -> Result<(), CoreError>;

    /// 16-bit reads are little endian: low byte first.
    fn read_u16(&self, addr: u16) -> Result<u16, CoreError> {
        let low = self.read(addr)? as u16;
        let high = self.read(addr.wrapping_add(1))? as u16;
        Ok((high << 8) | low)
    }

    fn write_u16(&mut self, addr: u16, val: u16) -> Result<(), CoreError> {
        self.write(addr, (val & 0xFF) as u8)?;
        self.write(addr.wrapping_add(1), (val >> 8) as u8)
    }

    /// Bulk fetch for multi-byte instructions. Routes exactly like
    /// single-byte reads, range by range.
    fn read_bytes(&self, addr: u16, buf: &mut [u8]) -> Result<(), CoreError> {
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = self.read(addr.wrapping_add(i as u16))?;
        }
        Ok(())
    }

    fn read_if(&self) -> Result<u8, CoreError> {
        self.read(IF_ADDR)
    }

    fn write_if(&mut self, value: u8) -> Result<(), CoreError> {
        self.write(IF_ADDR, value)
    }

    fn read_ie(&self) -> Result<u8, CoreError> {
        self.read(IE_ADDR)
    }

    /// The highest-priority source that is both requested and enabled.
    fn requested_interrupt(&self) -> Result<Option<InterruptKind>, CoreError> {
        let fired = self.read_if()? & self.read_ie()? & 0x1F;
        Ok(InterruptKind::ALL
            .into_iter()
            .find(|kind| fired & kind.mask() != 0))
    }

    fn pending_interrupt(&self) -> Result<bool, CoreError> {
        Ok(self.requested_interrupt()?.is_some())
    }
}

pub struct Bus {
    pub cartridge: Cartridge,
    // Boxed: 16 KiB of arrays does not belong on the stack.
    vram: Box<[u8; VRAM_SIZE]>,
    wram: Box<[u8; WRAM_SIZE]>,
    oam: [u8; OAM_SIZE],
    hram: [u8; HRAM_SIZE],
    pub io: IoRegisters,
    pub interrupts: Interrupts,
    pub timer: Timer,
    dma: OamDma,
    pub ppu: Box<dyn Ppu>,
    pub apu: Apu,
}

impl Bus {
    pub fn new(cartridge: Cartridge) -> Self {
        Self::with_ppu(cartridge, Box::new(DummyPpu::new()))
    }

    /// Injects a real pixel peripheral in place of the headless one.
    pub fn with_ppu(cartridge: Cartridge, ppu: Box<dyn Ppu>) -> Self {
        Bus {
            cartridge,
            vram: Box::new([0; VRAM_SIZE]),
            wram: Box::new([0; WRAM_SIZE]),
            oam: [0; OAM_SIZE],
            hram: [0; HRAM_SIZE],
            io: IoRegisters::new(),
            interrupts: Interrupts::new(),
            timer: Timer::new(),
            dma: OamDma::new(),
            ppu,
            apu: Apu::new(),
        }
    }

    /// Advances every clocked component by the elapsed T-cycles. The
    /// order is fixed: DMA first so redirected OAM bytes are visible to
    /// everything after it, then timer, audio, video. Returns true once
    /// the video peripheral has a completed frame.
    pub fn tick_components(&mut self, t_cycles: u32) -> Result<bool, CoreError> {
        if let Some((base, first, count)) = self.dma.tick(t_cycles) {
            for i in 0..count {
                let idx = first + i;
                let byte = self.read(base + idx as u16)?;
                self.oam[idx as usize] = byte;
            }
        }

        self.timer.tick(t_cycles, &mut self.interrupts);
        self.apu.tick(t_cycles);

        if self.ppu.tick(t_cycles) {
            self.interrupts.request(InterruptKind::VBlank);
        }
        Ok(self.ppu.frame_ready())
    }

    pub fn clear_frame_ready(&mut self) {
        self.ppu.clear_frame_ready();
    }

    pub fn dma_active(&self) -> bool {
        self.dma.active()
    }
}

impl Memory for Bus {
    fn read(&self, addr: u16) -> Result<u8, CoreError> {
        let val = match addr {
            // Cartridge windows: ROM and external RAM
            0x0000..=0x7FFF | 0xA000..=0xBFFF => self.cartridge.read(addr),

            0x8000..=0x9FFF => self.vram[addr as usize & 0x1FFF],
            0xC000..=0xDFFF => self.wram[addr as usize & 0x1FFF],

            // Echo RAM and the OAM hole are not modeled as valid memory
            0xE000..=0xFDFF | 0xFEA0..=0xFEFF => {
                return Err(CoreError::ForbiddenAddress { addr });
            }

            0xFE00..=0xFE9F => self.oam[(addr - 0xFE00) as usize],

            ADDR_TIMER_DIV => self.timer.read_div(),
            ADDR_TIMER_TIMA => self.timer.tima,
            ADDR_TIMER_TMA => self.timer.tma,
            ADDR_TIMER_TAC => self.timer.tac,

            IF_ADDR => self.interrupts.read_flags(),

            ADDR_APU_START..=ADDR_APU_END => self.apu.read_reg(addr),

            // The DMA register reads back whatever was last written.
            ADDR_OAM_DMA => self.io.read(addr),
            ADDR_PPU_REG_START..=ADDR_PPU_REG_END => self.ppu.read_reg(addr),

            0xFF00..=0xFF7F => self.io.read(addr),

            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize],

            IE_ADDR => self.interrupts.read_enable(),
        };
        Ok(val)
    }

    fn write(&mut self, addr: u16, val: u8) -> Result<(), CoreError> {
        match addr {
            0x0000..=0x7FFF | 0xA000..=0xBFFF => {
                trace!("write 0x{:02X} -> 0x{:04X} (cartridge)", val, addr);
                self.cartridge.write(addr, val);
            }
            0x8000..=0x9FFF => self.vram[addr as usize & 0x1FFF] = val,
            0xC000..=0xDFFF => self.wram[addr as usize & 0x1FFF] = val,

            0xE000..=0xFDFF | 0xFEA0..=0xFEFF => {
                return Err(CoreError::ForbiddenAddress { addr });
            }

            0xFE00..=0xFE9F => self.oam[(addr - 0xFE00) as usize] = val,

            ADDR_TIMER_DIV => self.timer.reset_div(&mut self.interrupts),
            ADDR_TIMER_TIMA => self.timer.tima = val,
            ADDR_TIMER_TMA => self.timer.tma = val,
            ADDR_TIMER_TAC => self.timer.write_tac(val, &mut self.interrupts),

            IF_ADDR => self.interrupts.write_flags(val),

            ADDR_APU_START..=ADDR_APU_END => self.apu.write_reg(addr, val),

            // 0xFF46 sits inside the PPU register range but belongs to
            // the DMA engine; keep the last written value readable.
            ADDR_OAM_DMA => {
                self.io.write(addr, val);
                self.dma.start(val);
            }
            ADDR_PPU_REG_START..=ADDR_PPU_REG_END => self.ppu.write_reg(addr, val),

            0xFF00..=0xFF7F => self.io.write(addr, val),

            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize] = val,

            IE_ADDR => self.interrupts.write_enable(val),
        }
        Ok(())
    }
}
