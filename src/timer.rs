use crate::interrupts::{InterruptKind, Interrupts};

/// Hardware timer: a free-running 16-bit counter whose selected bit is
/// watched for falling edges. DIV (0xFF04) is simply the counter's top
/// eight bits.
pub struct Timer {
    pub internal_counter: u16, // Increments every T-cycle
    pub tima: u8,              // 0xFF05
    pub tma: u8,               // 0xFF06
    pub tac: u8,               // 0xFF07
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            internal_counter: 0,
            tima: 0,
            tma: 0,
            tac: 0,
        }
    }

    pub fn read_div(&self) -> u8 {
        (self.internal_counter >> 8) as u8
    }

    pub fn timer_enabled(&self) -> bool {
        // Bit 2 of TAC enables/disables the TIMA counter
        (self.tac & 0b100) != 0
    }

    /// Maps TAC bits 0-1 to the watched bit in the internal counter.
    pub fn watched_bit(&self) -> u16 {
        match self.tac & 0b11 {
            0b00 => 9, // 1024 cycles (4096 Hz)
            0b01 => 3, // 16 cycles   (262144 Hz)
            0b10 => 5, // 64 cycles   (65536 Hz)
            0b11 => 7, // 256 cycles  (16384 Hz)
            _ => unreachable!(),
        }
    }

    fn increment_tima(&mut self, interrupts: &mut Interrupts) {
        let (new_tima, overflow) = self.tima.overflowing_add(1);
        if overflow {
            // TIMA reloads from TMA and the timer interrupt fires
            self.tima = self.tma;
            interrupts.request(InterruptKind::Timer);
        } else {
            self.tima = new_tima;
        }
    }

    /// Advances the timer by a number of T-cycles, one at a time. The
    /// edge detector needs every intermediate counter value, so this
    /// never skips ahead.
    pub fn tick(&mut self, t_cycles: u32, interrupts: &mut Interrupts) {
        for _ in 0..t_cycles {
            let old_counter = self.internal_counter;
            self.internal_counter = self.internal_counter.wrapping_add(1);

            let bit_index = self.watched_bit();
            let enabled = self.timer_enabled();
            let old_signal = enabled && ((old_counter >> bit_index) & 1) != 0;
            let new_signal = enabled && ((self.internal_counter >> bit_index) & 1) != 0;

            // Signal was high and is now low
            if old_signal && !new_signal {
                self.increment_tima(interrupts);
            }
        }
    }

    /// Writing any value to DIV zeroes the whole internal counter.
    /// Timing state is otherwise untouched, but dropping the counter to
    /// zero while the watched bit is high is itself a falling edge.
    pub fn reset_div(&mut self, interrupts: &mut Interrupts) {
        let bit_was_high = (self.internal_counter >> self.watched_bit()) & 1 == 1;
        self.internal_counter = 0;

        if self.timer_enabled() && bit_was_high {
            self.increment_tima(interrupts);
        }
    }

    /// TAC writes can also produce a falling edge when the watched bit
    /// or the enable bit changes under the counter's feet.
    pub fn write_tac(&mut self, new_val: u8, interrupts: &mut Interrupts) {
        let old_signal = self.timer_enabled() && (self.internal_counter >> self.watched_bit()) & 1 == 1;

        self.tac = new_val & 0b111;

        let new_signal = self.timer_enabled() && (self.internal_counter >> self.watched_bit()) & 1 == 1;

        if old_signal && !new_signal {
            self.increment_tima(interrupts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixteen_cycles_increment_once() {
        let mut timer = Timer::new();
        let mut ic = Interrupts::new();
        timer.tac = 0x05; // Enabled, speed 01: every 16 T-cycles (bit 3)

        timer.tick(15, &mut ic);
        // internal_counter is 15 (0b01111). Bit 3 is 1, no edge yet.
        assert_eq!(timer.tima, 0);

        timer.tick(1, &mut ic);
        // internal_counter is 16 (0b10000). Bit 3 dropped: falling edge.
        assert_eq!(timer.tima, 1, "TIMA failed to increment at 16 cycles");
    }

    #[test]
    fn test_eight_cycles_do_not_increment() {
        let mut timer = Timer::new();
        let mut ic = Interrupts::new();
        timer.tac = 0x05;

        timer.tick(8, &mut ic);
        assert_eq!(timer.tima, 0, "half a period must not tick TIMA");
    }

    #[test]
    fn test_disabled_timer_keeps_counting_div() {
        let mut timer = Timer::new();
        let mut ic = Interrupts::new();
        timer.tac = 0x01; // Speed set, but enable bit clear

        timer.tick(1024, &mut ic);
        assert_eq!(timer.tima, 0, "TIMA must not move while disabled");
        assert_eq!(timer.read_div(), 4, "DIV tracks the counter regardless");
    }

    #[test]
    fn test_overflow_reloads_tma_and_requests_interrupt() {
        let mut timer = Timer {
            internal_counter: 0,
            tima: 0xFE,
            tma: 0xAA,
            tac: 0x05,
        };
        let mut ic = Interrupts::new();

        // 16 cycles for 0xFE -> 0xFF, 16 more for the overflow.
        timer.tick(32, &mut ic);

        assert_eq!(timer.tima, 0xAA, "TIMA should have reloaded from TMA");
        assert_eq!(
            ic.read_flags() & 0b100,
            0b100,
            "timer interrupt should have been requested"
        );
    }

    #[test]
    fn test_div_reset_falling_edge() {
        let mut timer = Timer::new();
        let mut ic = Interrupts::new();
        timer.tac = 0x05; // Speed: 16 cycles (bit 3)

        // Counter at 8 (0b1000): bit 3 is high.
        timer.tick(8, &mut ic);
        assert_eq!(timer.tima, 0);

        // Resetting DIV drops the bit, which is a falling edge.
        timer.reset_div(&mut ic);
        assert_eq!(timer.internal_counter, 0);
        assert_eq!(
            timer.tima, 1,
            "TIMA should have incremented due to DIV reset falling edge"
        );
    }

    #[test]
    fn test_tac_disable_falling_edge() {
        let mut timer = Timer::new();
        let mut ic = Interrupts::new();
        timer.tac = 0x05;

        timer.tick(8, &mut ic); // Bit 3 high

        // Clearing the enable bit gates the signal low: falling edge.
        timer.write_tac(0x01, &mut ic);
        assert_eq!(timer.tima, 1);
    }

    #[test]
    fn test_watched_bit_mapping() {
        let mut timer = Timer::new();
        for (sel, bit) in [(0b00, 9), (0b01, 3), (0b10, 5), (0b11, 7)] {
            timer.tac = sel;
            assert_eq!(timer.watched_bit(), bit);
        }
    }
}
