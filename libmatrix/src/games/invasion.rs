//! Rows of ships descend on the player's platform.
//!
//! Ships are dim, bullets medium, the platform is an animated grayscale
//! sprite on the two bottom rows. Every timer period is one of four phases:
//! ships descend on phase 0, bullets climb on phases 1 and 3.

use log::info;

use crate::sprite::catalog::{PLATFORM, SPRITES};
use crate::{Color, Keys, Platform, Sprite, Timer, ROWS};

const CYCLE_HZ: u32 = 2;
const LEVEL_THRESHOLD: u32 = 5;

const FIRE_ROW: usize = ROWS - 3;
const TIP_ROW: usize = ROWS - 2;
const BASE_ROW: usize = ROWS - 1;

struct LevelSetup {
    max_ships: usize,
    /// Rows between two spawned waves.
    spacing: u32,
}

const LEVELS: [LevelSetup; 5] = [
    LevelSetup { max_ships: 1, spacing: 5 },
    LevelSetup { max_ships: 2, spacing: 4 },
    LevelSetup { max_ships: 3, spacing: 3 },
    LevelSetup { max_ships: 4, spacing: 3 },
    LevelSetup { max_ships: 6, spacing: 1 },
];

/// Every non-empty 6-bit wave, ordered by ship count.
const WAVES: [u8; 63] = waves();

/// `WAVE_LIMIT[n - 1]` waves in `WAVES` have at most `n` ships.
const WAVE_LIMIT: [usize; 6] = wave_limits();

const fn waves() -> [u8; 63] {
    let mut out = [0; 63];
    let mut n = 0;
    let mut ships = 1;

    while ships <= 6 {
        let mut wave = 1u8;
        while wave < 64 {
            if wave.count_ones() == ships {
                out[n] = wave;
                n += 1;
            }
            wave += 1;
        }
        ships += 1;
    }

    out
}

const fn wave_limits() -> [usize; 6] {
    let mut out = [0; 6];
    let mut i = 0;

    while i < WAVES.len() {
        let ships = WAVES[i].count_ones() as usize;
        let mut limit = ships - 1;
        while limit < 6 {
            out[limit] += 1;
            limit += 1;
        }
        i += 1;
    }

    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    Running,
    Quit,
    /// A ship reached the bottom row.
    Landed,
    /// A descending ship hit the platform.
    Crashed,
}

pub(super) struct Invasion {
    timer: Timer,
    platform: Sprite<'static>,
    phase: i32,
    level: usize,
    hits: u32,
    rows_since_wave: u32,
    position: i32,
    bullets: [u8; ROWS],
    ships: [u8; ROWS],
}

impl Invasion {
    pub(super) fn new() -> Self {
        Self {
            timer: Timer::new(CYCLE_HZ),
            platform: Sprite::new(&SPRITES, PLATFORM),
            phase: 0,
            level: 0,
            hits: 0,
            rows_since_wave: 0,
            position: 4,
            bullets: [0; ROWS],
            ships: [0; ROWS],
        }
    }

    pub(super) fn run(&mut self, platform: &impl Platform) {
        self.spawn(platform, 1);

        let status = loop {
            let keys = platform.read_key();
            platform.clr_keys(Keys::K1 | Keys::K2 | Keys::K3 | Keys::HIT);

            let status = if self.timer.tick() {
                self.step(keys)
            } else {
                self.steer_aux(keys);
                if keys.intersects(Keys::HIT | Keys::UP) {
                    self.fire();
                }
                Status::Running
            };

            if self.level < LEVELS.len() - 1 && self.hits >= LEVEL_THRESHOLD {
                self.level += 1;
                self.timer.reinit(CYCLE_HZ + self.level as u32);
                self.hits = 0;
                info!("invasion level {}", self.level);
            }

            if self.rows_since_wave >= LEVELS[self.level].spacing {
                self.spawn(platform, LEVELS[self.level].max_ships);
                self.rows_since_wave = 0;
            }

            self.show(platform);

            if status != Status::Running {
                break status;
            }
        };

        info!("invasion ended at level {}: {status:?}", self.level);
    }

    fn spawn(&mut self, platform: &impl Platform, max_ships: usize) {
        let wave = WAVES[platform.get_random() as usize % WAVE_LIMIT[max_ships - 1]];
        self.ships[0] = wave << 1;
    }

    fn show(&mut self, platform: &impl Platform) {
        let (bullets, ships) = (&self.bullets, &self.ships);
        let sprite = &mut self.platform;
        let (position, phase) = (self.position, self.phase);

        platform.with_pixels(|pixs| {
            for y in 0..ROWS {
                pixs.br1[y] = bullets[y] | ships[y];
                pixs.br2[y] = bullets[y];
            }
            sprite.place(pixs, position, BASE_ROW as i32, phase, Color::Natural);
        });
    }

    fn step(&mut self, keys: Keys) -> Status {
        if keys.contains(Keys::K1) {
            return Status::Quit;
        }

        if keys.intersects(Keys::LEFT | Keys::RIGHT) {
            self.steer(if keys.contains(Keys::RIGHT) { 1 } else { -1 });
        } else {
            self.steer_aux(keys);
        }

        match self.phase {
            0 => {
                if self.ships[BASE_ROW] != 0 {
                    return Status::Landed;
                }
                if self.descend() {
                    return Status::Crashed;
                }
            }
            1 | 3 => self.climb(),
            _ => {}
        }

        self.phase = (self.phase + 1) & 3;
        Status::Running
    }

    fn steer_aux(&mut self, keys: Keys) {
        if keys.intersects(Keys::K2 | Keys::K3) {
            self.steer(if keys.contains(Keys::K3) { 1 } else { -1 });
        }
    }

    fn climb(&mut self) {
        self.bullets.copy_within(1.., 0);
        self.bullets[ROWS - 1] = 0;
        self.collide();
    }

    /// Moves every ship down a row. `true` when one lands on the platform base.
    fn descend(&mut self) -> bool {
        self.ships.copy_within(..ROWS - 1, 1);
        self.ships[0] = 0;
        self.collide();
        self.rows_since_wave += 1;
        self.crashed()
    }

    fn collide(&mut self) {
        for (bullets, ships) in self.bullets.iter_mut().zip(self.ships.iter_mut()) {
            let hit = *bullets & *ships;
            if hit != 0 {
                *bullets &= !hit;
                *ships &= !hit;
                self.hits += 1;
            }
        }
    }

    /// The platform tip destroys a ship above it; a ship beside the base is fatal.
    fn crashed(&mut self) -> bool {
        self.ships[TIP_ROW] &= !(1 << self.position);
        self.ships[BASE_ROW] & (0b111 << (self.position - 1)) != 0
    }

    fn fire(&mut self) {
        let mask = 1 << self.position;

        if self.ships[FIRE_ROW] & mask != 0 {
            self.ships[FIRE_ROW] &= !mask;
            self.hits += 1;
        } else {
            self.bullets[FIRE_ROW] |= mask;
        }
    }

    /// Moves the platform, ramming any ship in its way.
    fn steer(&mut self, delta: i32) {
        let position = self.position + delta;
        if !(1..=6).contains(&position) {
            return;
        }

        let tip = 1u8 << position;
        if self.ships[TIP_ROW] & tip != 0 {
            self.ships[TIP_ROW] &= !tip;
            self.hits += 1;
        }

        let edge = if delta > 0 { tip << 1 } else { tip >> 1 };
        if self.ships[BASE_ROW] & edge != 0 {
            self.ships[BASE_ROW] &= !edge;
            self.hits += 1;
        }

        self.position = position;
    }
}
