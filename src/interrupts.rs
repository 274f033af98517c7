use crate::constants::*;

/// The five interrupt sources, in priority order. Lower bit index wins
/// when several are requested at once.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterruptKind {
    VBlank = 0,
    LcdStat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

impl InterruptKind {
    pub const ALL: [InterruptKind; 5] = [
        InterruptKind::VBlank,
        InterruptKind::LcdStat,
        InterruptKind::Timer,
        InterruptKind::Serial,
        InterruptKind::Joypad,
    ];

    pub fn mask(self) -> u8 {
        1 << (self as u8)
    }

    /// The fixed address the CPU jumps to when servicing this source.
    pub fn vector(self) -> u16 {
        match self {
            InterruptKind::VBlank => ADDR_VEC_VBLANK,
            InterruptKind::LcdStat => ADDR_VEC_LCD_STAT,
            InterruptKind::Timer => ADDR_VEC_TIMER,
            InterruptKind::Serial => ADDR_VEC_SERIAL,
            InterruptKind::Joypad => ADDR_VEC_JOYPAD,
        }
    }
}

/// Interrupt controller: the IF (request) and IE (enable) registers.
/// Only the low 5 bits of either are meaningful; bulk writes truncate.
#[derive(Debug, Default)]
pub struct Interrupts {
    requested: u8,
    enabled: u8,
}

impl Interrupts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, kind: InterruptKind) {
        self.requested |= kind.mask();
    }

    pub fn clear_request(&mut self, kind: InterruptKind) {
        self.requested &= !kind.mask();
    }

    pub fn enable(&mut self, kind: InterruptKind) {
        self.enabled |= kind.mask();
    }

    pub fn disable(&mut self, kind: InterruptKind) {
        self.enabled &= !kind.mask();
    }

    /// IF as seen by software. Unused upper bits read high, matching
    /// the open-bus behavior of the register.
    pub fn read_flags(&self) -> u8 {
        self.requested | 0xE0
    }

    pub fn write_flags(&mut self, val: u8) {
        self.requested = val & 0x1F;
    }

    pub fn read_enable(&self) -> u8 {
        self.enabled
    }

    pub fn write_enable(&mut self, val: u8) {
        self.enabled = val & 0x1F;
    }

    /// The highest-priority source that is both requested and enabled,
    /// or None. VBlank (bit 0) beats everything; Joypad beats nothing.
    pub fn highest_priority(&self) -> Option<InterruptKind> {
        let pending = self.requested & self.enabled & 0x1F;
        InterruptKind::ALL
            .into_iter()
            .find(|kind| pending & kind.mask() != 0)
    }

    pub fn any_pending(&self) -> bool {
        (self.requested & self.enabled & 0x1F) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_and_clear_single_source() {
        let mut ic = Interrupts::new();

        ic.request(InterruptKind::Timer);
        assert_eq!(ic.read_flags() & 0x1F, 0b00100);

        ic.request(InterruptKind::VBlank);
        assert_eq!(ic.read_flags() & 0x1F, 0b00101);

        ic.clear_request(InterruptKind::Timer);
        assert_eq!(ic.read_flags() & 0x1F, 0b00001);
    }

    #[test]
    fn test_bulk_writes_truncate_to_five_bits() {
        let mut ic = Interrupts::new();

        ic.write_flags(0xFF);
        assert_eq!(ic.read_flags() & 0x1F, 0x1F);

        ic.write_enable(0xA5);
        assert_eq!(ic.read_enable(), 0x05, "bits above 4 must be dropped");
    }

    #[test]
    fn test_lowest_bit_index_wins() {
        let mut ic = Interrupts::new();

        ic.write_flags(0x1F);
        ic.write_enable(0x1F);
        assert_eq!(ic.highest_priority(), Some(InterruptKind::VBlank));

        ic.clear_request(InterruptKind::VBlank);
        assert_eq!(ic.highest_priority(), Some(InterruptKind::LcdStat));
    }

    #[test]
    fn test_enable_mask_overrides_nominal_priority() {
        let mut ic = Interrupts::new();

        // VBlank and Timer both requested, but only Timer is enabled.
        ic.request(InterruptKind::VBlank);
        ic.request(InterruptKind::Timer);
        ic.enable(InterruptKind::Timer);

        assert_eq!(
            ic.highest_priority(),
            Some(InterruptKind::Timer),
            "disabled VBlank must be skipped despite its higher priority"
        );
    }

    #[test]
    fn test_none_when_nothing_is_both_requested_and_enabled() {
        let mut ic = Interrupts::new();

        assert_eq!(ic.highest_priority(), None);

        ic.request(InterruptKind::Serial);
        assert_eq!(ic.highest_priority(), None);
        assert!(!ic.any_pending());

        ic.enable(InterruptKind::Serial);
        assert!(ic.any_pending());
    }

    #[test]
    fn test_vectors() {
        assert_eq!(InterruptKind::VBlank.vector(), 0x0040);
        assert_eq!(InterruptKind::LcdStat.vector(), 0x0048);
        assert_eq!(InterruptKind::Timer.vector(), 0x0050);
        assert_eq!(InterruptKind::Serial.vector(), 0x0058);
        assert_eq!(InterruptKind::Joypad.vector(), 0x0060);
    }
}
