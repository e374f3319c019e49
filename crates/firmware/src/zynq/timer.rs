//! Busy-wait delay on the Cortex-A9 MPCore global timer.

use embedded_hal::delay::DelayNs;

use super::Mmio;

const COUNTER_LO: usize = 0x00;
const COUNTER_HI: usize = 0x04;
const CONTROL: usize = 0x08;

const TIMER_ENABLE: u32 = 1;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// [`DelayNs`] over the free-running 64-bit global timer.
pub struct GlobalTimerDelay {
    regs: Mmio,
    hz: u32,
}

impl GlobalTimerDelay {
    /// Delay source over the global timer at `base`, counting at `hz`.
    ///
    /// # Safety
    ///
    /// `base` must be the global timer register block. Other users may read
    /// the counter but must not stop or reload it.
    pub const unsafe fn new(base: usize, hz: u32) -> Self {
        Self {
            // SAFETY: forwarded to the caller.
            regs: unsafe { Mmio::new(base) },
            hz,
        }
    }

    /// Start the counter if the boot code left it stopped.
    pub fn start(&mut self) {
        self.regs.modify(CONTROL, |v| v | TIMER_ENABLE);
    }

    /// Current counter value.
    pub fn now(&self) -> u64 {
        // The upper word can roll over between the two reads.
        loop {
            let hi = self.regs.read(COUNTER_HI);
            let lo = self.regs.read(COUNTER_LO);
            if self.regs.read(COUNTER_HI) == hi {
                return u64::from(hi).wrapping_shl(32) | u64::from(lo);
            }
        }
    }

    /// Timer ticks covering `ns` nanoseconds, rounded down.
    pub fn ticks_for_ns(&self, ns: u32) -> u64 {
        u64::from(ns).saturating_mul(u64::from(self.hz)) / NANOS_PER_SEC
    }
}

impl DelayNs for GlobalTimerDelay {
    fn delay_ns(&mut self, ns: u32) {
        let ticks = self.ticks_for_ns(ns);
        if ticks == 0 {
            return;
        }
        let deadline = self.now().saturating_add(ticks);
        while self.now() < deadline {
            core::hint::spin_loop();
        }
    }
}
