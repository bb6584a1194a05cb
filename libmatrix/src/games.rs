//! Game rule sets built on the sprite engine and the input contract.
//!
//! Every game keeps its scratch state in its own value, created when a round
//! starts and dropped when it ends, so only one game's state is ever live.

mod invasion;
mod snake;
mod tetris;

use crate::Platform;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Game {
    Tetris,
    Snake,
    Invasion,
}

impl Game {
    pub const ALL: [Game; 3] = [Game::Tetris, Game::Snake, Game::Invasion];

    /// Neighbour `delta` steps away in selector order, wrapping around.
    pub fn step(self, delta: i32) -> Game {
        let count = Self::ALL.len() as i32;
        let pos = Self::ALL.iter().position(|g| *g == self).unwrap_or(0) as i32;

        Self::ALL[(pos + delta).rem_euclid(count) as usize]
    }

    /// Plays one round on the front framebuffer.
    pub fn play(self, platform: &impl Platform) {
        match self {
            Game::Tetris => tetris::Tetris::new().run(platform),
            Game::Snake => snake::Snake::new(platform).run(platform),
            Game::Invasion => invasion::Invasion::new().run(platform),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wraps_both_ways() {
        assert_eq!(Game::Tetris.step(1), Game::Snake);
        assert_eq!(Game::Invasion.step(1), Game::Tetris);
        assert_eq!(Game::Tetris.step(-1), Game::Invasion);
        assert_eq!(Game::Snake.step(-4), Game::Tetris);
    }
}
