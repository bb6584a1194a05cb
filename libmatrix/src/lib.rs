#![cfg_attr(not(test), no_std)]

mod art;
mod debounce;
mod entropy;
mod keys;
mod led;
mod pixels;
mod platform;
mod scan;
mod shared;
mod sprite;
mod timer;

pub mod games;
pub mod menu;

/// Duration of one refresh cycle, the unit every `Timer` counts in.
pub const TICK_TIME_MS: u32 = 10;

pub use debounce::{InputLatch, DEFAULT_DEBOUNCE_CYCLES};
pub use entropy::Harvester;
pub use keys::{KeyLatch, Keys};
pub use led::{
    LedRequest, LedState, Rail, Rails, ADC_MAX, DEFAULT_LED_TIMEOUT_CYCLES, LED_SAMPLES_PER_RAIL,
    NOT_SAMPLED,
};
pub use pixels::{Pixels, COLUMNS, ROWS};
pub use platform::Platform;
pub use scan::{Phase, PhaseTable, PlaneMix, ScanConfig, ScanEngine, ScanHardware};
pub use shared::Shared;
pub use sprite::{catalog, Color, Sprite, SpriteDef};
pub use timer::Timer;
