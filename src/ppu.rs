use log::trace;

pub const LCD_WIDTH: usize = 160;
pub const LCD_HEIGHT: usize = 144;

const DOTS_PER_LINE: u32 = 456;
const LINES_PER_FRAME: u8 = 154;
const VBLANK_LINE: u8 = 144;

/// Contract for the (external) pixel peripheral. The core only needs to
/// advance it by elapsed T-cycles, route its register window, and learn
/// when a frame is done.
pub trait Ppu {
    /// Advances the internal state machine by a number of T-cycles.
    /// Returns true if a V-Blank interrupt should be triggered.
    fn tick(&mut self, t_cycles: u32) -> bool;

    /// Register window 0xFF40-0xFF4B, addressed absolutely.
    fn read_reg(&self, addr: u16) -> u8;
    fn write_reg(&mut self, addr: u16, val: u8);

    /// True once a full frame's worth of pixel data is ready.
    fn frame_ready(&self) -> bool;
    fn clear_frame_ready(&mut self);

    /// The 160x144 frame, one byte per pixel (shades 0-3).
    fn frame_buffer(&self) -> &[u8; LCD_WIDTH * LCD_HEIGHT];
}

/// Headless PPU: keeps the LY/V-Blank cadence honest so timing-sensitive
/// code runs, produces a blank frame.
pub struct DummyPpu {
    dot_counter: u32,
    ly: u8, // Current scanline (0xFF44)
    frame_done: bool,
    frame_buffer: [u8; LCD_WIDTH * LCD_HEIGHT],
    regs: [u8; 12], // 0xFF40-0xFF4B
}

impl Default for DummyPpu {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyPpu {
    pub fn new() -> Self {
        Self {
            dot_counter: 0,
            ly: 0,
            frame_done: false,
            frame_buffer: [0; LCD_WIDTH * LCD_HEIGHT],
            regs: [0; 12],
        }
    }
}

impl Ppu for DummyPpu {
    fn tick(&mut self, t_cycles: u32) -> bool {
        let mut vblank_started = false;

        self.dot_counter += t_cycles;
        while self.dot_counter >= DOTS_PER_LINE {
            self.dot_counter -= DOTS_PER_LINE;
            self.ly = (self.ly + 1) % LINES_PER_FRAME;

            if self.ly == VBLANK_LINE {
                trace!("vblank at dot {}", self.dot_counter);
                vblank_started = true;
                self.frame_done = true;
            }
        }
        vblank_started
    }

    fn read_reg(&self, addr: u16) -> u8 {
        match addr {
            0xFF44 => self.ly,
            0xFF40..=0xFF4B => self.regs[(addr - 0xFF40) as usize],
            _ => 0xFF,
        }
    }

    fn write_reg(&mut self, addr: u16, val: u8) {
        match addr {
            // LY is read-only
            0xFF44 => {}
            0xFF40..=0xFF4B => self.regs[(addr - 0xFF40) as usize] = val,
            _ => {}
        }
    }

    fn frame_ready(&self) -> bool {
        self.frame_done
    }

    fn clear_frame_ready(&mut self) {
        self.frame_done = false;
    }

    fn frame_buffer(&self) -> &[u8; LCD_WIDTH * LCD_HEIGHT] {
        &self.frame_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vblank_after_144_lines() {
        let mut ppu = DummyPpu::new();

        let mut vblank = false;
        for _ in 0..144 {
            vblank = ppu.tick(DOTS_PER_LINE);
        }
        assert!(vblank, "line 144 starts the V-Blank period");
        assert!(ppu.frame_ready());
        assert_eq!(ppu.read_reg(0xFF44), 144);
    }

    #[test]
    fn test_frame_ready_reset() {
        let mut ppu = DummyPpu::new();
        ppu.tick(DOTS_PER_LINE * 144);
        assert!(ppu.frame_ready());

        ppu.clear_frame_ready();
        assert!(!ppu.frame_ready());
    }

    #[test]
    fn test_ly_wraps_at_154() {
        let mut ppu = DummyPpu::new();
        ppu.tick(DOTS_PER_LINE * 154);
        assert_eq!(ppu.read_reg(0xFF44), 0);
    }

    #[test]
    fn test_ly_is_read_only() {
        let mut ppu = DummyPpu::new();
        ppu.write_reg(0xFF44, 0x99);
        assert_eq!(ppu.read_reg(0xFF44), 0);
    }
}
