use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use crate::entropy::Harvester;
use crate::keys::{KeyLatch, Keys};
use crate::led::LedRequest;
use crate::pixels::Pixels;

/// Everything both the scan interrupt and the foreground touch.
///
/// `const`-constructible so the board can keep it in a `static`. The scan
/// side never blocks on it: the front framebuffer is only ever `try_lock`ed
/// from there.
pub struct Shared {
    front: Mutex<Pixels>,
    keys: KeyLatch,
    led: LedRequest,
    entropy: Harvester,
    cycle_complete: AtomicBool,
}

impl Shared {
    pub const fn new() -> Self {
        Self {
            front: Mutex::new(Pixels::new()),
            keys: KeyLatch::new(),
            led: LedRequest::new(),
            entropy: Harvester::new(),
            cycle_complete: AtomicBool::new(false),
        }
    }

    pub fn with_pixels<R>(&self, f: impl FnOnce(&mut Pixels) -> R) -> R {
        let mut front = self.front.lock();
        f(&mut front)
    }

    pub fn keys(&self) -> &KeyLatch {
        &self.keys
    }

    pub fn active_keys(&self) -> Keys {
        self.keys.active()
    }

    pub fn clr_keys(&self, keys: Keys) {
        self.keys.clear(keys);
    }

    pub fn led(&self) -> &LedRequest {
        &self.led
    }

    pub fn entropy(&self) -> &Harvester {
        &self.entropy
    }

    pub fn feed_entropy(&self, counter: u32) -> u32 {
        self.entropy.mix(counter)
    }

    /// Consumes the cycle-complete signal. At most one `true` per refresh cycle.
    pub fn take_cycle_complete(&self) -> bool {
        self.cycle_complete.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn try_snapshot(&self) -> Option<Pixels> {
        self.front.try_lock().map(|front| *front)
    }

    pub(crate) fn signal_cycle_complete(&self) {
        self.cycle_complete.store(true, Ordering::Release);
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}
