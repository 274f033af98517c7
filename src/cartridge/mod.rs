mod error;
mod header;
mod loader;
mod mbc;

pub use error::LoadError;
pub use header::{Header, MbcKind, TargetModel};
pub use loader::load_rom;
pub use mbc::Mbc;

use crate::error::CoreError;
use log::{debug, warn};

/// A loaded cartridge: the parsed header plus whichever bank controller
/// the header names.
pub struct Cartridge {
    pub header: Header,
    mbc: Mbc,
}

impl Cartridge {
    /// Builds a cartridge from a raw ROM image and an optional saved
    /// battery-RAM buffer. A save buffer whose length disagrees with the
    /// header is discarded for a fresh zeroed one; everything else that
    /// can go wrong here is fatal.
    pub fn new(rom: Vec<u8>, save_ram: Option<Vec<u8>>) -> Result<Self, CoreError> {
        let header = Header::parse(&rom)?;
        debug!(
            "cartridge '{}': {:?}, {} KiB ROM, {} KiB RAM",
            header.title,
            header.mbc_kind,
            header.rom_size / 1024,
            header.ram_size / 1024
        );

        let ram = match save_ram {
            Some(buf) if buf.len() == header.ram_size => buf,
            Some(buf) => {
                warn!(
                    "save RAM is {} bytes but the header declares {}, starting fresh",
                    buf.len(),
                    header.ram_size
                );
                vec![0u8; header.ram_size]
            }
            None => vec![0u8; header.ram_size],
        };

        let mbc = Mbc::new(header.mbc_kind, rom, ram);
        Ok(Self { header, mbc })
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.mbc.read(addr)
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        self.mbc.write(addr, val)
    }

    /// Battery-backed RAM for the host to persist between sessions.
    pub fn battery_ram(&self) -> &[u8] {
        self.mbc.ram()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    fn test_rom(cart_type: u8, ram_size: u8) -> Vec<u8> {
        let mut buf = vec![0u8; 32 * 1024];
        buf[HDR_TITLE_START..HDR_TITLE_START + 4].copy_from_slice(b"TEST");
        buf[HDR_CART_TYPE] = cart_type;
        buf[HDR_ROM_SIZE] = 0x00;
        buf[HDR_RAM_SIZE] = ram_size;
        let mut x: u8 = 0;
        for i in 0x0134..=0x014C {
            x = x.wrapping_sub(buf[i]).wrapping_sub(1);
        }
        buf[0x014D] = x;
        buf
    }

    #[test]
    fn test_construction_selects_mbc_variant() {
        let cart = Cartridge::new(test_rom(0x00, 0x00), None).unwrap();
        assert_eq!(cart.header.mbc_kind, MbcKind::RomOnly);

        let cart = Cartridge::new(test_rom(0x03, 0x02), None).unwrap();
        assert_eq!(cart.header.mbc_kind, MbcKind::Mbc1);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = Cartridge::new(test_rom(0x42, 0x00), None);
        assert!(matches!(
            result,
            Err(CoreError::UnsupportedCartridgeType(0x42))
        ));
    }

    #[test]
    fn test_matching_save_ram_is_kept() {
        let mut save = vec![0u8; 8 * 1024];
        save[0] = 0xAB;
        let cart = Cartridge::new(test_rom(0x03, 0x02), Some(save)).unwrap();
        assert_eq!(cart.battery_ram()[0], 0xAB);
    }

    #[test]
    fn test_mismatched_save_ram_is_replaced() {
        let save = vec![0xFFu8; 123];
        let cart = Cartridge::new(test_rom(0x03, 0x02), Some(save)).unwrap();

        assert_eq!(cart.battery_ram().len(), 8 * 1024);
        assert!(
            cart.battery_ram().iter().all(|&b| b == 0),
            "mismatched save data must be discarded for a zeroed buffer"
        );
    }
}
