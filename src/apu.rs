use crate::constants::*;

// Unused register bits read back as 1, per channel.
const APU_READ_MASKS: [u8; 48] = [
    0x80, 0x3F, 0x00, 0xFF, 0xBF, // NR10 - NR14
    0xFF, 0x3F, 0x00, 0xFF, 0xBF, // NR20 - NR24 (NR20 is unused)
    0x7F, 0xFF, 0x9F, 0xFF, 0xBF, // NR30 - NR34
    0xFF, 0xFF, 0x00, 0x00, 0xBF, // NR40 - NR44 (NR40 is unused)
    0x00, 0x00, 0x70, // NR50 - NR52
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // Unused
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // Wave RAM (No mask)
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Audio peripheral stub: keeps the register window (0xFF10-0xFF3F)
/// readable/writable with correct masking and accepts elapsed cycles.
/// Sound synthesis lives outside the core.
pub struct Apu {
    enabled: bool,
    registers: [u8; 0x30],
    t_cycles: u64,
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl Apu {
    pub fn new() -> Self {
        Self {
            enabled: false,
            registers: [0; 0x30],
            t_cycles: 0,
        }
    }

    pub fn tick(&mut self, t_cycles: u32) {
        self.t_cycles += t_cycles as u64;
    }

    pub fn read_reg(&self, addr: u16) -> u8 {
        let offset = (addr - ADDR_APU_START) as usize;

        // When the APU is off most registers read as 0 before masking.
        // Wave RAM stays accessible on DMG.
        let val = if !self.enabled && addr < 0xFF30 && addr != 0xFF26 {
            0x00
        } else {
            self.registers[offset]
        };

        val | APU_READ_MASKS[offset]
    }

    pub fn write_reg(&mut self, addr: u16, val: u8) {
        let offset = (addr - ADDR_APU_START) as usize;

        if addr == 0xFF26 {
            // NR52: only the power bit is writable.
            self.enabled = (val & 0x80) != 0;
            if !self.enabled {
                // Power-off clears every channel register.
                for reg in &mut self.registers[..0x16] {
                    *reg = 0;
                }
            }
            self.registers[offset] = val & 0x80;
            return;
        }

        // Writes are dropped while the APU is off, except wave RAM.
        if !self.enabled && addr < 0xFF30 {
            return;
        }
        self.registers[offset] = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_dead_while_powered_off() {
        let mut apu = Apu::new();
        apu.write_reg(0xFF11, 0xBF);
        assert_eq!(apu.read_reg(0xFF11), 0x3F, "write ignored, mask remains");
    }

    #[test]
    fn test_power_on_enables_writes() {
        let mut apu = Apu::new();
        apu.write_reg(0xFF26, 0x80);
        apu.write_reg(0xFF12, 0xF3);
        assert_eq!(apu.read_reg(0xFF12), 0xF3);
    }

    #[test]
    fn test_power_off_clears_channel_registers() {
        let mut apu = Apu::new();
        apu.write_reg(0xFF26, 0x80);
        apu.write_reg(0xFF12, 0xF3);

        apu.write_reg(0xFF26, 0x00);
        apu.write_reg(0xFF26, 0x80);
        assert_eq!(apu.read_reg(0xFF12), 0x00);
    }

    #[test]
    fn test_wave_ram_always_accessible() {
        let mut apu = Apu::new();
        apu.write_reg(0xFF30, 0x5A);
        assert_eq!(apu.read_reg(0xFF30), 0x5A);
    }
}
