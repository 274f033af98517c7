use pocketgb::cartridge::Cartridge;
use pocketgb::constants::*;

/// A 32 KiB ROM-only image with a valid header and `code` placed at the
/// 0x0100 entry point.
pub fn rom_with_code(code: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; 32 * 1024];
    rom[0x0100..0x0100 + code.len()].copy_from_slice(code);
    rom[HDR_TITLE_START..HDR_TITLE_START + 4].copy_from_slice(b"TEST");
    rom[HDR_CART_TYPE] = 0x00; // ROM only
    rom[HDR_ROM_SIZE] = 0x00; // 32 KiB
    rom[HDR_RAM_SIZE] = 0x00;
    fix_header_checksum(&mut rom);
    rom
}

/// An MBC1 image of `banks` 16 KiB banks. Each bank's first byte is its
/// own bank number so reads reveal which bank is mapped.
pub fn mbc1_rom(banks: usize) -> Vec<u8> {
    let mut rom = vec![0u8; banks * ROM_BANK_SIZE];
    for bank in 0..banks {
        rom[bank * ROM_BANK_SIZE] = bank as u8;
    }
    rom[HDR_CART_TYPE] = 0x03; // MBC1 + RAM + battery
    rom[HDR_ROM_SIZE] = (banks / 2).trailing_zeros() as u8;
    rom[HDR_RAM_SIZE] = 0x02; // 8 KiB
    fix_header_checksum(&mut rom);
    rom
}

pub fn cartridge(code: &[u8]) -> Cartridge {
    Cartridge::new(rom_with_code(code), None).unwrap()
}

fn fix_header_checksum(rom: &mut [u8]) {
    let mut x: u8 = 0;
    for i in 0x0134..=0x014C {
        x = x.wrapping_sub(rom[i]).wrapping_sub(1);
    }
    rom[0x014D] = x;
}
