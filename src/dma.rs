use log::trace;

const OAM_SIZE: u8 = 0xA0; // 160 bytes
const T_CYCLES_PER_BYTE: u32 = 4;

/// OAM DMA engine. A write to 0xFF46 starts a 160-byte copy from
/// `value << 8` into OAM, one byte every machine cycle. The engine only
/// tracks progress; the bus performs the actual copies so that address
/// routing stays in one place.
pub struct OamDma {
    source_base: u16,
    next_index: u8,
    budget: u32,
    active: bool,
}

impl Default for OamDma {
    fn default() -> Self {
        Self::new()
    }
}

impl OamDma {
    pub fn new() -> Self {
        Self {
            source_base: 0,
            next_index: 0,
            budget: 0,
            active: false,
        }
    }

    pub fn start(&mut self, val: u8) {
        trace!("OAM DMA from 0x{:02X}00", val);
        self.source_base = (val as u16) << 8;
        self.next_index = 0;
        self.budget = 0;
        self.active = true;
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// Advances the engine and returns the (source base, first OAM
    /// index, byte count) slice that became due in this span, if any.
    pub fn tick(&mut self, t_cycles: u32) -> Option<(u16, u8, u8)> {
        if !self.active {
            return None;
        }

        self.budget += t_cycles;
        let due = (self.budget / T_CYCLES_PER_BYTE) as u8;
        let remaining = OAM_SIZE - self.next_index;
        let count = due.min(remaining);
        if count == 0 {
            return None;
        }

        self.budget -= count as u32 * T_CYCLES_PER_BYTE;
        let first = self.next_index;
        self.next_index += count;
        if self.next_index == OAM_SIZE {
            self.active = false;
        }

        Some((self.source_base, first, count))
    }
}
