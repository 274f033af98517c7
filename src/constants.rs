use std::time::Duration;

// Constants for flags
pub const FLAG_Z: u8 = 0b1000_0000;
pub const FLAG_N: u8 = 0b0100_0000;
pub const FLAG_H: u8 = 0b0010_0000;
pub const FLAG_C: u8 = 0b0001_0000;

pub const CB_PREFIX_OPCODE_BYTE: u8 = 0xCB;

/// One machine cycle is four T-cycles.
pub const T_CYCLES_PER_M_CYCLE: u32 = 4;

pub const IF_ADDR: u16 = 0xFF0F;
pub const IE_ADDR: u16 = 0xFFFF;

pub const ADDR_VEC_VBLANK: u16 = 0x0040;
pub const ADDR_VEC_LCD_STAT: u16 = 0x0048;
pub const ADDR_VEC_TIMER: u16 = 0x0050;
pub const ADDR_VEC_SERIAL: u16 = 0x0058;
pub const ADDR_VEC_JOYPAD: u16 = 0x0060;

pub const ADDR_JOYPAD: u16 = 0xFF00;
pub const ADDR_SERIAL_DATA: u16 = 0xFF01;
pub const ADDR_SERIAL_CTRL: u16 = 0xFF02;
pub const ADDR_TIMER_DIV: u16 = 0xFF04;
pub const ADDR_TIMER_TIMA: u16 = 0xFF05;
pub const ADDR_TIMER_TMA: u16 = 0xFF06;
pub const ADDR_TIMER_TAC: u16 = 0xFF07;
pub const ADDR_APU_START: u16 = 0xFF10;
pub const ADDR_APU_END: u16 = 0xFF3F;
pub const ADDR_PPU_REG_START: u16 = 0xFF40;
pub const ADDR_PPU_REG_END: u16 = 0xFF4B;
pub const ADDR_OAM_DMA: u16 = 0xFF46;

// Header field offsets, see cartridge/header.rs
pub const HDR_TITLE_START: usize = 0x0134;
pub const HDR_CGB_FLAG: usize = 0x0143;
pub const HDR_CART_TYPE: usize = 0x0147;
pub const HDR_ROM_SIZE: usize = 0x0148;
pub const HDR_RAM_SIZE: usize = 0x0149;
pub const HDR_END: usize = 0x0150;

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const RAM_BANK_SIZE: usize = 0x2000;

pub const FRAME_DURATION: Duration = Duration::from_nanos(16_742_706); // ~59.7 fps
