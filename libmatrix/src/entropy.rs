use core::sync::atomic::{AtomicU32, Ordering};

/// Folds free-running counter values captured at asynchronous events into a
/// CRC-32 accumulator.
///
/// There is no seed: quality comes only from the jitter between events, so a
/// caller whose timing is fully deterministic gets a deterministic sequence.
pub struct Harvester {
    acc: AtomicU32,
}

impl Harvester {
    pub const fn new() -> Self {
        Self {
            acc: AtomicU32::new(0),
        }
    }

    pub fn mix(&self, counter: u32) -> u32 {
        let mut acc = self.acc.load(Ordering::Relaxed);

        loop {
            let next = Self::fold(acc, counter);

            match self
                .acc
                .compare_exchange_weak(acc, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(current) => acc = current,
            }
        }
    }

    fn fold(acc: u32, counter: u32) -> u32 {
        let mut hasher = crc32fast::Hasher::new_with_initial(acc);
        hasher.update(&counter.to_le_bytes());
        hasher.finalize()
    }
}

impl Default for Harvester {
    fn default() -> Self {
        Self::new()
    }
}
