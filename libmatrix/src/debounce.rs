use crate::keys::KeyLatch;

pub const DEFAULT_DEBOUNCE_CYCLES: u8 = 5;

/// Scan-side half of the key latch.
///
/// A raw change seen during a sampling cycle arms a countdown of
/// `debounce_cycles` full cycles during which the input lines are not read at
/// all. The cycle after the countdown confirms: only bits that disagree with
/// `committed` in every sample of that cycle get committed.
pub struct InputLatch {
    committed: u8,
    pending: u8,
    countdown: u8,
    confirming: bool,
    debounce_cycles: u8,
}

impl InputLatch {
    pub fn new(debounce_cycles: u8) -> Self {
        Self {
            committed: 0,
            pending: 0,
            countdown: 0,
            confirming: false,
            debounce_cycles,
        }
    }

    pub fn committed(&self) -> u8 {
        self.committed
    }

    pub fn pending(&self) -> u8 {
        self.pending
    }

    pub fn countdown(&self) -> u8 {
        self.countdown
    }

    pub fn sampling(&self) -> bool {
        self.countdown == 0
    }

    pub fn sample(&mut self, raw: u8) {
        if self.countdown != 0 {
            return;
        }

        let delta = self.committed ^ raw;

        if self.confirming {
            self.pending &= delta;
        } else {
            self.pending = delta;
        }
    }

    pub fn end_cycle(&mut self, keys: &KeyLatch) {
        if self.countdown != 0 {
            self.countdown -= 1;
            return;
        }

        if self.confirming {
            self.confirming = false;
            self.commit(keys);
        } else if self.pending != 0 {
            if self.debounce_cycles == 0 {
                self.commit(keys);
            } else {
                self.countdown = self.debounce_cycles;
                self.confirming = true;
            }
        }
    }

    fn commit(&mut self, keys: &KeyLatch) {
        let delta = core::mem::take(&mut self.pending);

        if delta == 0 {
            return;
        }

        self.committed ^= delta;
        keys.commit(delta & self.committed, delta & !self.committed);
    }
}
