//! Game selector and the foreground main loop.

use log::{debug, info};

use crate::art::{self, PLANE1, PLANE2};
use crate::games::Game;
use crate::{Keys, Pixels, Platform, Timer, ROWS};

const LOGO_COLUMNS: u32 = 6;
const LOGO_ROWS: usize = ROWS - 2;

const SCROLL_MUL: u32 = 2;
const ANIMATION_HZ: u32 = 4;

/// A 6×14 two-plane icon, shown inside a full brightness frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Logo {
    br1: [u8; LOGO_ROWS],
    br2: [u8; LOGO_ROWS],
}

impl Logo {
    const fn from_art(art: &[&str; LOGO_ROWS]) -> Self {
        Self {
            br1: art::rows(art, PLANE1),
            br2: art::rows(art, PLANE2),
        }
    }

    /// The right `6 - bits_first` columns of `self` followed by the left
    /// `bits_first` columns of `next`.
    pub fn hor_mix(&self, next: &Logo, bits_first: u32) -> Logo {
        let mask = (1u8 << bits_first) - 1;
        let shift = LOGO_COLUMNS - bits_first;
        let mix = |a: &[u8; LOGO_ROWS], b: &[u8; LOGO_ROWS]| {
            core::array::from_fn(|i| (a[i] >> bits_first) | ((b[i] & mask) << shift))
        };

        Logo {
            br1: mix(&self.br1, &next.br1),
            br2: mix(&self.br2, &next.br2),
        }
    }

    /// `self` with its first `lines_first` rows scrolled out, continued by `next`.
    pub fn ver_mix(&self, next: &Logo, lines_first: usize) -> Logo {
        let mix = |a: &[u8; LOGO_ROWS], b: &[u8; LOGO_ROWS]| {
            core::array::from_fn(|i| match i + lines_first {
                row if row < LOGO_ROWS => a[row],
                row => b[row - LOGO_ROWS],
            })
        };

        Logo {
            br1: mix(&self.br1, &next.br1),
            br2: mix(&self.br2, &next.br2),
        }
    }

    pub fn draw(&self, pixs: &mut Pixels) {
        for (plane, rows) in [(&mut pixs.br1, &self.br1), (&mut pixs.br2, &self.br2)] {
            plane[0] = 0xff;
            plane[ROWS - 1] = 0xff;

            for (dst, src) in plane[1..ROWS - 1].iter_mut().zip(rows.iter()) {
                *dst = (src << 1) | 0x81;
            }
        }
    }
}

static TETRIS_LOGOS: [Logo; 2] = [
    Logo::from_art(&[
        " ooo  ", "  o   ", "      ", "      ", "      ", "      ", "      ",
        "      ", "#    #", "##  ##", "### ##", "#.####", "######", "#o####",
    ]),
    Logo::from_art(&[
        "      ", "      ", "      ", " ooo  ", "  o   ", "      ", "      ",
        "      ", "#    #", "##  ##", "### ##", "#.####", "######", "#o####",
    ]),
];

static SNAKE_LOGOS: [Logo; 2] = [
    Logo::from_art(&[
        "      ", "  #   ", "      ", "      ", " oo#  ", " o    ", " o    ",
        " oooo ", "    o ", "    o ", " .  o ", "    o ", "      ", "      ",
    ]),
    Logo::from_art(&[
        "      ", "  #   ", "      ", "      ", " ooo# ", " o    ", " o    ",
        " oooo ", "    o ", "    o ", " .  o ", "      ", "      ", "      ",
    ]),
];

static INVASION_LOGOS: [Logo; 2] = [
    Logo::from_art(&[
        " .  . ", "   .  ", " .   .", "      ", "  .   ", "      ", "      ",
        "  o   ", "      ", "  o   ", "      ", "      ", "  #   ", " #o#  ",
    ]),
    Logo::from_art(&[
        " .  . ", "   .  ", " .   .", "      ", "  .   ", "      ", "  o   ",
        "      ", "  o   ", "      ", "      ", "      ", "  #   ", " #.#  ",
    ]),
];

/// Animation frames of a game's icon. The first one is the still icon.
pub fn logos(game: Game) -> &'static [Logo] {
    match game {
        Game::Tetris => &TETRIS_LOGOS,
        Game::Snake => &SNAKE_LOGOS,
        Game::Invasion => &INVASION_LOGOS,
    }
}

fn show(platform: &impl Platform, logo: &Logo) {
    platform.with_pixels(|pixs| logo.draw(pixs));
}

fn scroll_hor(platform: &impl Platform, game: Game, delta: i32) -> Game {
    let next = game.step(delta);
    let (from, to) = (&logos(game)[0], &logos(next)[0]);
    let mut timer = Timer::new(6 * SCROLL_MUL);

    for i in 0..=LOGO_COLUMNS {
        let logo = match delta > 0 {
            true => from.hor_mix(to, i),
            false => to.hor_mix(from, LOGO_COLUMNS - i),
        };
        show(platform, &logo);
        timer.wait(platform);
    }

    next
}

fn scroll_ver(platform: &impl Platform, game: Game, delta: i32) -> Game {
    let next = game.step(delta);
    let (from, to) = (&logos(game)[0], &logos(next)[0]);
    let mut timer = Timer::new(14 * SCROLL_MUL);

    for i in 0..=LOGO_ROWS {
        let logo = match delta > 0 {
            true => from.ver_mix(to, i),
            false => to.ver_mix(from, LOGO_ROWS - i),
        };
        show(platform, &logo);
        timer.wait(platform);
    }

    next
}

/// Animates the icon of `game` until a navigation key arrives.
fn update_icon(platform: &impl Platform, game: Game) -> Keys {
    let frames = logos(game);
    let mut timer = Timer::new(ANIMATION_HZ);
    let mut frame = 0;

    loop {
        let keys = platform.read_key();
        platform.clr_keys(Keys::all());

        if keys.intersects(Keys::ARROWS | Keys::HIT) {
            return keys;
        }

        if timer.tick() {
            show(platform, &frames[frame]);
            frame = (frame + 1) % frames.len();
        }
    }
}

fn select_game(platform: &impl Platform, mut game: Game) -> Game {
    show(platform, &logos(game)[0]);

    loop {
        let keys = update_icon(platform, game);

        game = if keys == Keys::UP {
            scroll_ver(platform, game, 1)
        } else if keys == Keys::DOWN {
            scroll_ver(platform, game, -1)
        } else if keys == Keys::RIGHT {
            scroll_hor(platform, game, -1)
        } else if keys == Keys::LEFT {
            scroll_hor(platform, game, 1)
        } else if keys == Keys::HIT {
            return game;
        } else {
            game
        };

        debug!("selector on {game:?}");
        show(platform, &logos(game)[0]);
    }
}

/// `true` to play again, `false` to go back to the selector.
fn replay(platform: &impl Platform) -> bool {
    loop {
        let keys = platform.read_key();
        platform.clr_keys(Keys::all());

        if keys.contains(Keys::K1) {
            return false;
        }
        if keys.contains(Keys::K2) {
            return true;
        }
    }
}

pub fn run(platform: &impl Platform) -> ! {
    let mut game = Game::Tetris;

    loop {
        game = select_game(platform, game);

        loop {
            info!("starting {game:?}");

            platform.with_pixels(Pixels::clear);
            game.play(platform);
            platform.with_pixels(Pixels::freeze);

            info!("{game:?} round over");

            if !replay(platform) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logo(rows: [u8; LOGO_ROWS]) -> Logo {
        Logo {
            br1: rows,
            br2: [0; LOGO_ROWS],
        }
    }

    #[test]
    fn frame_border_is_full_brightness() {
        let mut pixs = Pixels::new();
        logos(Game::Snake)[0].draw(&mut pixs);

        for plane in [&pixs.br1, &pixs.br2] {
            assert_eq!(plane[0], 0xff);
            assert_eq!(plane[ROWS - 1], 0xff);
            assert!(plane.iter().all(|row| row & 0x81 == 0x81));
        }
    }

    #[test]
    fn hor_mix_slides_columns() {
        let a = logo([0b10_0001; LOGO_ROWS]);
        let b = logo([0b00_0011; LOGO_ROWS]);

        assert_eq!(a.hor_mix(&b, 0), a);
        assert_eq!(a.hor_mix(&b, LOGO_COLUMNS), b);
        assert_eq!(a.hor_mix(&b, 1).br1[0], 0b11_0000);
        assert_eq!(a.hor_mix(&b, 2).br1[0], 0b11_1000);
    }

    #[test]
    fn ver_mix_slides_rows() {
        let a = logo(core::array::from_fn(|i| i as u8));
        let b = logo(core::array::from_fn(|i| 0x20 | i as u8));

        assert_eq!(a.ver_mix(&b, 0), a);
        assert_eq!(a.ver_mix(&b, LOGO_ROWS), b);

        let mixed = a.ver_mix(&b, 3);
        assert_eq!(mixed.br1[0], 3);
        assert_eq!(mixed.br1[LOGO_ROWS - 4], 13);
        assert_eq!(mixed.br1[LOGO_ROWS - 3], 0x20);
        assert_eq!(mixed.br1[LOGO_ROWS - 1], 0x22);
    }

    #[test]
    fn every_game_has_animated_icon() {
        for game in Game::ALL {
            let frames = logos(game);
            assert!(frames.len() >= 2);
            assert!(frames.windows(2).all(|w| w[0] != w[1]));
            assert!(frames.iter().all(|f| f.br1.iter().chain(f.br2.iter()).all(|r| r >> 6 == 0)));
        }
    }
}
