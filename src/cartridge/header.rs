/*
parses ROM headers

Address Range,Name,Purpose
0x0134-0x0143,Title,Uppercase ASCII text of the game's name.
0x0143,CGB Flag,0x80 = dual-mode, 0xC0 = color-only, shares space with the title.
0x0147,Cartridge Type,Crucial: Tells you which MBC (if any) is inside the cart.
0x0148,ROM Size,Indicates how many banks the ROM has.
0x0149,RAM Size,Indicates how much external Save RAM is on the cart.
0x014D,Header Checksum,A checksum of bytes 0134-014C.
*/

use crate::constants::*;
use crate::error::CoreError;
use log::warn;

/// Which hardware the cartridge targets, from byte 0x0143.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TargetModel {
    /// Original DMG hardware only.
    Classic,
    /// Runs on both DMG and Color hardware.
    Dual,
    /// Color hardware required.
    ColorOnly,
}

/// Which bank controller sits inside the cartridge, from byte 0x0147.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MbcKind {
    RomOnly,
    Mbc1,
}

#[derive(Debug, Clone)]
pub struct Header {
    pub title: String,
    pub target: TargetModel,
    pub mbc_kind: MbcKind,
    pub rom_size: usize, // bytes
    pub ram_size: usize, // bytes
    pub checksum_ok: bool,
}

impl Header {
    /// Parses and validates the fixed-offset header fields. Malformed
    /// enumerated fields and a ROM shorter or longer than the declared
    /// size are all fatal; a bad checksum is only logged.
    pub fn parse(rom: &[u8]) -> Result<Self, CoreError> {
        if rom.len() < HDR_END {
            return Err(CoreError::InvalidHeader(format!(
                "ROM of {} bytes is too small to hold a header",
                rom.len()
            )));
        }

        let target = parse_target(rom[HDR_CGB_FLAG])?;
        let mbc_kind = parse_mbc_kind(rom[HDR_CART_TYPE])?;
        let rom_size = parse_rom_size(rom[HDR_ROM_SIZE])?;
        let ram_size = parse_ram_size(rom[HDR_RAM_SIZE])?;

        if rom.len() != rom_size {
            return Err(CoreError::RomSizeMismatch {
                declared: rom_size,
                actual: rom.len(),
            });
        }

        let checksum_ok = verify_checksum(rom);
        if !checksum_ok {
            warn!("header checksum mismatch, continuing anyway");
        }

        Ok(Self {
            title: extract_title(rom, target),
            target,
            mbc_kind,
            rom_size,
            ram_size,
            checksum_ok,
        })
    }

    pub fn rom_banks(&self) -> usize {
        self.rom_size / ROM_BANK_SIZE
    }
}

fn parse_target(flag: u8) -> Result<TargetModel, CoreError> {
    match flag {
        0x80 => Ok(TargetModel::Dual),
        0xC0 => Ok(TargetModel::ColorOnly),
        // A plain title byte: zero padding or printable ASCII.
        0x00 => Ok(TargetModel::Classic),
        b if b.is_ascii_graphic() || b == b' ' => Ok(TargetModel::Classic),
        other => Err(CoreError::InvalidHeader(format!(
            "bad CGB flag 0x{:02X}",
            other
        ))),
    }
}

fn parse_mbc_kind(code: u8) -> Result<MbcKind, CoreError> {
    match code {
        0x00 => Ok(MbcKind::RomOnly),
        // MBC1, MBC1+RAM, MBC1+RAM+BATTERY
        0x01..=0x03 => Ok(MbcKind::Mbc1),
        other => Err(CoreError::UnsupportedCartridgeType(other)),
    }
}

fn parse_rom_size(raw: u8) -> Result<usize, CoreError> {
    if raw > 8 {
        return Err(CoreError::InvalidHeader(format!(
            "bad ROM size byte 0x{:02X}",
            raw
        )));
    }
    // 32 KiB shifted left by the raw value.
    Ok((32 * 1024) << raw)
}

fn parse_ram_size(raw: u8) -> Result<usize, CoreError> {
    let kib = match raw {
        0x00 => 0,
        0x02 => 8,
        0x03 => 32,
        0x04 => 128,
        0x05 => 64,
        other => {
            return Err(CoreError::InvalidHeader(format!(
                "bad RAM size byte 0x{:02X}",
                other
            )));
        }
    };
    Ok(kib * 1024)
}

fn extract_title(rom: &[u8], target: TargetModel) -> String {
    // The CGB flag steals the last title byte on dual/color carts.
    let end = match target {
        TargetModel::Classic => HDR_TITLE_START + 16,
        TargetModel::Dual | TargetModel::ColorOnly => HDR_TITLE_START + 15,
    };
    let title_bytes = &rom[HDR_TITLE_START..end];

    // Stop at the first NULL byte
    String::from_utf8_lossy(title_bytes.split(|&b| b == 0).next().unwrap_or(&[])).into_owned()
}

fn verify_checksum(rom: &[u8]) -> bool {
    let mut x: u8 = 0;
    for b in &rom[0x0134..=0x014C] {
        x = x.wrapping_sub(*b).wrapping_sub(1);
    }
    x == rom[0x014D]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal 32 KiB ROM with a header the parser accepts.
    pub fn test_rom(cart_type: u8) -> Vec<u8> {
        let mut buf = vec![0u8; 32 * 1024];
        buf[HDR_TITLE_START..HDR_TITLE_START + 6].copy_from_slice(b"TETRIS");
        buf[HDR_CART_TYPE] = cart_type;
        buf[HDR_ROM_SIZE] = 0x00; // 32 KiB
        buf[HDR_RAM_SIZE] = 0x00;

        let mut x: u8 = 0;
        for i in 0x0134..=0x014C {
            x = x.wrapping_sub(buf[i]).wrapping_sub(1);
        }
        buf[0x014D] = x;
        buf
    }

    #[test]
    fn test_valid_header_parsing() {
        let h = Header::parse(&test_rom(0x01)).unwrap();

        assert_eq!(h.title, "TETRIS");
        assert_eq!(h.target, TargetModel::Classic);
        assert_eq!(h.mbc_kind, MbcKind::Mbc1);
        assert_eq!(h.rom_size, 32 * 1024);
        assert_eq!(h.ram_size, 0);
        assert_eq!(h.rom_banks(), 2);
        assert!(h.checksum_ok);
    }

    #[test]
    fn test_too_small_buffer_is_fatal() {
        let result = Header::parse(&vec![0u8; 0x100]);
        assert!(matches!(result, Err(CoreError::InvalidHeader(_))));
    }

    #[test]
    fn test_rom_length_must_match_declared_size() {
        let mut rom = test_rom(0x00);
        rom.truncate(0x4000); // Half the declared 32 KiB

        let result = Header::parse(&rom);
        assert!(matches!(
            result,
            Err(CoreError::RomSizeMismatch {
                declared: 0x8000,
                actual: 0x4000
            })
        ));
    }

    #[test]
    fn test_unknown_cartridge_type_is_fatal() {
        let rom = test_rom(0xFE);
        let result = Header::parse(&rom);
        assert!(matches!(
            result,
            Err(CoreError::UnsupportedCartridgeType(0xFE))
        ));
    }

    #[test]
    fn test_bad_rom_size_byte_is_fatal() {
        let mut rom = test_rom(0x00);
        rom[HDR_ROM_SIZE] = 0x09;
        assert!(matches!(
            Header::parse(&rom),
            Err(CoreError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_bad_ram_size_byte_is_fatal() {
        let mut rom = test_rom(0x00);
        rom[HDR_RAM_SIZE] = 0x01; // Not in the enumerated set
        assert!(matches!(
            Header::parse(&rom),
            Err(CoreError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_ram_size_mapping() {
        for (raw, kib) in [(0x00u8, 0), (0x02, 8), (0x03, 32), (0x04, 128), (0x05, 64)] {
            let mut rom = test_rom(0x03);
            rom[HDR_RAM_SIZE] = raw;
            let h = Header::parse(&rom).unwrap();
            assert_eq!(h.ram_size, kib * 1024, "RAM size byte 0x{:02X}", raw);
        }
    }

    #[test]
    fn test_cgb_flag_shortens_title() {
        let mut rom = test_rom(0x00);
        rom[HDR_CGB_FLAG] = 0x80;
        // Re-seal the checksum after editing the header.
        let mut x: u8 = 0;
        for i in 0x0134..=0x014C {
            x = x.wrapping_sub(rom[i]).wrapping_sub(1);
        }
        rom[0x014D] = x;

        let h = Header::parse(&rom).unwrap();
        assert_eq!(h.target, TargetModel::Dual);
        assert_eq!(h.title, "TETRIS");
    }

    #[test]
    fn test_invalid_cgb_flag_is_fatal() {
        let mut rom = test_rom(0x00);
        rom[HDR_CGB_FLAG] = 0x91; // Not 0x80/0xC0/printable/zero
        assert!(matches!(
            Header::parse(&rom),
            Err(CoreError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_bad_checksum_is_only_a_warning() {
        let mut rom = test_rom(0x00);
        rom[0x014D] = rom[0x014D].wrapping_add(1);

        let h = Header::parse(&rom).unwrap();
        assert!(!h.checksum_ok);
    }
}
