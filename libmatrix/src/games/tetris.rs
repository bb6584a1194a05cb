//! Falling tetrominoes.
//!
//! The active figure is drawn at full brightness, settled figures on plane 2
//! only. Completed rows flash and collapse.

use log::{debug, info};

use crate::sprite::catalog::{SPRITES, TETROMINOES};
use crate::{Color, Keys, Pixels, Platform, Sprite, Timer, ROWS};

const MAX_LEVEL: u32 = 10;
const FALL_DOWN_MULT: u32 = 10;
const SETTLE_DOWN_MULT: u32 = 10;
const SETTLE_DOWN_TIMEOUT: u32 = 2 * SETTLE_DOWN_MULT;
const SQUEEZE_MULT: u32 = 8;
const SQUEEZE_COUNT: usize = 2;
const LINES_PER_LEVEL: u32 = 10;

/// Plane bytes shown on collapsing rows, in order, for each flash.
const SQUEEZE_FLASH: [(u8, u8); 4] = [(0xff, 0xff), (0x00, 0xff), (0xff, 0x00), (0x00, 0xff)];

pub(super) struct Tetris {
    /// Also the fall rate in Hz.
    level: u32,
    collapsed_lines: u32,
    figure: Sprite<'static>,
    timer: Timer,
}

impl Tetris {
    pub(super) fn new() -> Self {
        Self {
            level: 1,
            collapsed_lines: 0,
            figure: Sprite::new(&SPRITES, TETROMINOES[0]),
            timer: Timer::new(1),
        }
    }

    pub(super) fn run(&mut self, platform: &impl Platform) {
        while self.place_figure(platform) {
            self.timer.reinit(self.level);

            loop {
                let keys = platform.read_key();
                platform.clr_keys(Keys::all());
                self.process_key(platform, keys);

                if keys.contains(Keys::K3) {
                    info!("tetris abandoned at level {}", self.level);
                    return;
                }

                if self.timer.tick() && !self.shift(platform, 0, 1, 0, Color::Unchanged) {
                    self.settle_down(platform);
                    self.squeeze(platform);
                    break;
                }
            }
        }

        info!("tetris over at level {}", self.level);
    }

    fn shift(
        &mut self,
        platform: &impl Platform,
        dx: i32,
        dy: i32,
        drot: i32,
        color: Color,
    ) -> bool {
        let figure = &mut self.figure;
        platform.with_pixels(|pixs| figure.move_by(pixs, dx, dy, drot, color))
    }

    /// Spawns a random figure at the top. `false` when there is no room left.
    fn place_figure(&mut self, platform: &impl Platform) -> bool {
        let base = TETROMINOES[platform.get_random() as usize % TETROMINOES.len()];
        self.figure = Sprite::new(&SPRITES, base);

        let y = self.figure.def().height as i32 / 2;
        let figure = &mut self.figure;
        platform.with_pixels(|pixs| figure.place(pixs, 4, y, 0, Color::Natural))
    }

    fn process_key(&mut self, platform: &impl Platform, keys: Keys) {
        if keys.contains(Keys::LEFT) {
            self.shift(platform, -1, 0, 0, Color::Unchanged);
        } else if keys.contains(Keys::RIGHT) {
            self.shift(platform, 1, 0, 0, Color::Unchanged);
        } else if keys.contains(Keys::UP) {
            self.shift(platform, 0, 0, 1, Color::Unchanged);
        } else if keys.contains(Keys::DOWN) {
            self.timer.reinit(self.level * FALL_DOWN_MULT);
        }
    }

    /// Blinks the landed figure. Any key other than Down still moves it and
    /// restarts the countdown, so a figure can slide under an overhang.
    fn settle_down(&mut self, platform: &impl Platform) {
        let mut dimmed = true;
        let mut countdown = SETTLE_DOWN_TIMEOUT;

        self.timer.reinit(self.level * SETTLE_DOWN_MULT);

        while countdown > 0 {
            let color = if dimmed { Color::PlaneB } else { Color::Full };
            self.shift(platform, 0, 0, 0, color);

            let keys = platform.read_key();
            platform.clr_keys(Keys::all());
            let keys = keys - Keys::DOWN;

            if !keys.is_empty() {
                self.process_key(platform, keys);
                while self.shift(platform, 0, 1, 0, Color::Unchanged) {}
                countdown = SETTLE_DOWN_TIMEOUT;
            }

            if self.timer.tick() {
                dimmed = !dimmed;
                countdown -= 1;
            }
        }

        self.shift(platform, 0, 0, 0, Color::PlaneB);
        self.timer.reinit(self.level);
    }

    fn squeeze(&mut self, platform: &impl Platform) {
        let full = platform.with_pixels(|pixs| full_rows(pixs));
        if full == 0 {
            return;
        }

        self.collapsed_lines += full.count_ones();
        debug!("collapsing rows {full:#06x}");

        self.timer.reinit(self.level * SQUEEZE_MULT);

        for _ in 0..SQUEEZE_COUNT {
            for (c1, c2) in SQUEEZE_FLASH {
                platform.with_pixels(|pixs| fill_rows(pixs, full, c1, c2));
                self.timer.wait(platform);
            }
        }

        platform.with_pixels(|pixs| fill_rows(pixs, full, 0, 0));
        self.timer.wait(platform);
        self.timer.reinit(self.level);

        platform.with_pixels(compact);

        if self.collapsed_lines >= LINES_PER_LEVEL {
            if self.level < MAX_LEVEL {
                self.level += 1;
                info!("tetris level {}", self.level);
            }
            self.collapsed_lines -= LINES_PER_LEVEL;
        }
    }
}

/// Rows completely filled with settled blocks, one bit per row.
fn full_rows(pixs: &Pixels) -> u16 {
    (0..ROWS)
        .filter(|&y| pixs.br2[y] == 0xff)
        .fold(0, |mask, y| mask | 1 << y)
}

fn fill_rows(pixs: &mut Pixels, rows: u16, c1: u8, c2: u8) {
    for y in (0..ROWS).filter(|y| rows & (1 << y) != 0) {
        pixs.br1[y] = c1;
        pixs.br2[y] = c2;
    }
}

/// Drops every blank row, shifting the rows above it down.
fn compact(pixs: &mut Pixels) {
    let mut dst = ROWS;

    for y in (0..ROWS).rev() {
        if pixs.br1[y] | pixs.br2[y] != 0 {
            dst -= 1;
            pixs.br1[dst] = pixs.br1[y];
            pixs.br2[dst] = pixs.br2[y];
        }
    }

    for y in 0..dst {
        pixs.br1[y] = 0;
        pixs.br2[y] = 0;
    }
}
