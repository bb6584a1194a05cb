use crate::{Keys, Pixels};

/// What a deployment target (the board or the desktop harness) provides to the
/// foreground: games, the menu and anything else above the scan interrupt.
pub trait Platform {
    /// Blocks until the next refresh cycle completes and returns the sticky key latch.
    fn read_key(&self) -> Keys;

    /// Drops `keys` from the sticky latch until they are released and pressed again.
    fn clr_keys(&self, keys: Keys);

    /// Timing-jitter based random word. Do not rely on it from code whose timing
    /// is fully deterministic.
    fn get_random(&self) -> u32;

    /// Runs `f` with exclusive access to the front framebuffer.
    ///
    /// Must not call back into `read_key` from inside `f`.
    fn with_pixels<R>(&self, f: impl FnOnce(&mut Pixels) -> R) -> R;
}
