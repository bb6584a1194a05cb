use core::sync::atomic::{AtomicU8, Ordering};

use bitflags::bitflags;

bitflags! {
    /// The eight console keys. Bit positions match the board's input lines.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Keys: u8 {
        const LEFT = 1 << 0;
        const DOWN = 1 << 1;
        const RIGHT = 1 << 2;
        const UP = 1 << 3;
        const K3 = 1 << 4;
        const HIT = 1 << 5;
        const K2 = 1 << 6;
        const K1 = 1 << 7;

        const ARROWS = Self::LEFT.bits() | Self::DOWN.bits() | Self::RIGHT.bits() | Self::UP.bits();
    }
}

/// Sticky copy of the debounced key state shared with the foreground.
///
/// The scan interrupt sets freshly pressed bits and clears released ones; the
/// foreground only ever clears bits. Every update is a single atomic bit
/// operation, so neither side can lose the other's change.
pub struct KeyLatch {
    active: AtomicU8,
}

impl KeyLatch {
    pub const fn new() -> Self {
        Self {
            active: AtomicU8::new(0),
        }
    }

    pub fn active(&self) -> Keys {
        Keys::from_bits_retain(self.active.load(Ordering::Acquire))
    }

    pub fn clear(&self, keys: Keys) {
        self.active.fetch_and(!keys.bits(), Ordering::AcqRel);
    }

    pub(crate) fn commit(&self, pressed: u8, released: u8) {
        if pressed != 0 {
            self.active.fetch_or(pressed, Ordering::AcqRel);
        }

        if released != 0 {
            self.active.fetch_and(!released, Ordering::AcqRel);
        }
    }
}

impl Default for KeyLatch {
    fn default() -> Self {
        Self::new()
    }
}
