use crate::cartridge::header::MbcKind;
use crate::constants::{RAM_BANK_SIZE, ROM_BANK_SIZE};
use log::trace;

/// Byte returned when reading a disabled or absent memory-mapped resource.
const OPEN_BUS: u8 = 0xFF;

/// Cartridge bank controller. A closed enum instead of trait objects:
/// adding a controller kind is an exhaustive-match update, and the bus
/// dispatches with no indirection.
///
/// Reads never fail; a disabled or absent RAM window reads as open bus
/// and writes to it are dropped.
pub enum Mbc {
    RomOnly {
        rom: Vec<u8>,
    },
    Mbc1 {
        rom: Vec<u8>,
        ram: Vec<u8>,
        ram_enabled: bool,
        /// 5-bit ROM bank number. A raw value of 0 selects bank 1.
        rom_bank: u8,
        /// 2-bit RAM bank number, doubling as ROM bank bits 5-6.
        ram_bank: u8,
        /// false: the 2-bit register extends the ROM bank.
        /// true: it selects the RAM bank (and shifts the low ROM window).
        banking_mode: bool,
    },
}

impl Mbc {
    pub fn new(kind: MbcKind, rom: Vec<u8>, ram: Vec<u8>) -> Self {
        match kind {
            MbcKind::RomOnly => Mbc::RomOnly { rom },
            MbcKind::Mbc1 => Mbc::Mbc1 {
                rom,
                ram,
                ram_enabled: false,
                rom_bank: 0x01,
                ram_bank: 0x00,
                banking_mode: false,
            },
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match self {
            Mbc::RomOnly { rom } => match addr {
                // No RAM on a plain ROM cartridge.
                0xA000..=0xBFFF => OPEN_BUS,
                _ => rom.get(addr as usize).copied().unwrap_or(OPEN_BUS),
            },
            Mbc::Mbc1 {
                rom,
                ram,
                ram_enabled,
                rom_bank,
                ram_bank,
                banking_mode,
            } => match addr {
                0x0000..=0x3FFF => {
                    // Bank 0, unless mode 1 lets the upper bits shift
                    // the low window too.
                    let bank = if *banking_mode {
                        (*ram_bank as usize) << 5
                    } else {
                        0
                    };
                    let offset = bank * ROM_BANK_SIZE + addr as usize;
                    rom[offset % rom.len()]
                }
                0x4000..=0x7FFF => {
                    let low = if *rom_bank == 0 { 1 } else { *rom_bank & 0x1F };
                    let bank = low as usize | ((*ram_bank as usize) << 5);
                    let offset = bank * ROM_BANK_SIZE + (addr as usize & 0x3FFF);
                    // Truncated carts mirror: wrap on the physical size.
                    rom[offset % rom.len()]
                }
                0xA000..=0xBFFF => {
                    if !*ram_enabled || ram.is_empty() {
                        return OPEN_BUS;
                    }
                    let bank = if *banking_mode { *ram_bank as usize } else { 0 };
                    let offset = bank * RAM_BANK_SIZE + (addr as usize - 0xA000);
                    ram[offset % ram.len()]
                }
                _ => OPEN_BUS,
            },
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match self {
            Mbc::RomOnly { .. } => {
                // You can't write to ROM.
                trace!("dropped write 0x{:02X} to ROM-only cart at 0x{:04X}", val, addr);
            }
            Mbc::Mbc1 {
                ram,
                ram_enabled,
                rom_bank,
                ram_bank,
                banking_mode,
                ..
            } => match addr {
                0x0000..=0x1FFF => {
                    // RAM is enabled iff the low nibble is 0xA.
                    *ram_enabled = (val & 0x0F) == 0x0A;
                }
                0x2000..=0x3FFF => {
                    *rom_bank = val & 0x1F;
                }
                0x4000..=0x5FFF => {
                    *ram_bank = val & 0x03;
                }
                0x6000..=0x7FFF => {
                    *banking_mode = (val & 0x01) != 0;
                }
                0xA000..=0xBFFF => {
                    if !*ram_enabled || ram.is_empty() {
                        trace!("dropped RAM write at 0x{:04X} (disabled/absent)", addr);
                        return;
                    }
                    let bank = if *banking_mode { *ram_bank as usize } else { 0 };
                    let len = ram.len();
                    let offset = (bank * RAM_BANK_SIZE + (addr as usize - 0xA000)) % len;
                    ram[offset] = val;
                }
                _ => {}
            },
        }
    }

    /// The battery-backed RAM buffer, for the host to persist.
    pub fn ram(&self) -> &[u8] {
        match self {
            Mbc::RomOnly { .. } => &[],
            Mbc::Mbc1 { ram, .. } => ram,
        }
    }
}
