use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use libmatrix::{Keys, Pixels, Platform, Shared};

use crate::matrix::LEDS;

/// Foreground side of the desktop build: the game thread blocks in
/// `read_key` on a condition variable pulsed by the scan thread.
pub struct Desktop {
    shared: Shared,
    buttons: Arc<AtomicU8>,
    cycles: Mutex<u64>,
    cycle_done: Condvar,
    frame: Mutex<[u8; LEDS]>,
    started: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Desktop {
    pub fn new() -> Self {
        Self {
            shared: Shared::new(),
            buttons: Arc::new(AtomicU8::new(0)),
            cycles: Mutex::new(0),
            cycle_done: Condvar::new(),
            frame: Mutex::new([0; LEDS]),
            started: Instant::now(),
        }
    }

    pub fn shared(&self) -> &Shared {
        &self.shared
    }

    pub fn buttons(&self) -> Arc<AtomicU8> {
        Arc::clone(&self.buttons)
    }

    pub fn set_buttons(&self, keys: Keys) {
        if self.buttons.swap(keys.bits(), Ordering::Relaxed) != keys.bits() {
            self.shared.feed_entropy(self.started.elapsed().as_nanos() as u32);
        }
    }

    /// Called by the scan thread after each completed refresh cycle.
    pub fn publish(&self, frame: [u8; LEDS]) {
        *lock(&self.frame) = frame;

        let mut cycles = lock(&self.cycles);
        *cycles += 1;
        self.cycle_done.notify_all();
    }

    pub fn frame(&self) -> [u8; LEDS] {
        *lock(&self.frame)
    }

    pub fn cycles(&self) -> u64 {
        *lock(&self.cycles)
    }
}

impl Platform for Desktop {
    fn read_key(&self) -> Keys {
        let mut guard = lock(&self.cycles);

        while !self.shared.take_cycle_complete() {
            guard = self
                .cycle_done
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }

        self.shared.active_keys()
    }

    fn clr_keys(&self, keys: Keys) {
        self.shared.clr_keys(keys);
    }

    fn get_random(&self) -> u32 {
        self.shared.feed_entropy(self.started.elapsed().subsec_nanos())
    }

    fn with_pixels<R>(&self, f: impl FnOnce(&mut Pixels) -> R) -> R {
        self.shared.with_pixels(f)
    }
}
