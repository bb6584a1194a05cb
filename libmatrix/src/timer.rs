use crate::{Platform, TICK_TIME_MS};

/// Software timer paced by refresh cycles.
///
/// Every `tick()` adds `rate` to a phase accumulator; reaching `max` wraps it
/// and reports an elapsed period. With one `tick()` per cycle of
/// `TICK_TIME_MS`, `freq_hz / divider` periods elapse per second on average.
pub struct Timer {
    cnt: u32,
    rate: u32,
    max: u32,
}

impl Timer {
    pub fn new(freq_hz: u32) -> Self {
        Self::with_divider(freq_hz, 1)
    }

    pub fn with_divider(freq_hz: u32, divider: u32) -> Self {
        let mut timer = Self {
            cnt: 0,
            rate: 0,
            max: 1,
        };
        timer.reinit_divided(freq_hz, divider);
        timer
    }

    pub fn reinit(&mut self, freq_hz: u32) {
        self.reinit_divided(freq_hz, 1);
    }

    pub fn reinit_divided(&mut self, freq_hz: u32, divider: u32) {
        self.rate = freq_hz.saturating_mul(TICK_TIME_MS);
        self.max = divider.max(1).saturating_mul(1000);
        self.cnt = 0;
    }

    pub fn reset(&mut self, fire_immediately: bool) {
        self.cnt = if fire_immediately { self.max } else { 0 };
    }

    pub fn tick(&mut self) -> bool {
        self.cnt = self.cnt.saturating_add(self.rate);

        if self.cnt >= self.max {
            self.cnt %= self.max;
            true
        } else {
            false
        }
    }

    pub fn wait(&mut self, platform: &impl Platform) {
        loop {
            platform.read_key();

            if self.tick() {
                return;
            }
        }
    }
}
