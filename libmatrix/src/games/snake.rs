use log::info;

use crate::{Keys, Pixels, Platform, Timer, COLUMNS, ROWS};

const MAX_LEVEL: u32 = 10;
const FOOD_PER_LEVEL: u32 = 8;
const BODY_CAPACITY: usize = 512;

/// Brightness code of each kind of cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
enum Cell {
    Free = 0,
    Brick = 1,
    Body = 2,
    Food = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
    Right,
    Left,
}

impl Direction {
    fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Coord {
    x: usize,
    y: usize,
}

impl Coord {
    fn step(self, dir: Direction) -> Option<Coord> {
        let Coord { x, y } = self;

        match dir {
            Direction::Up => y.checked_sub(1).map(|y| Coord { x, y }),
            Direction::Down => (y + 1 < ROWS).then_some(Coord { x, y: y + 1 }),
            Direction::Right => (x + 1 < COLUMNS).then_some(Coord { x: x + 1, y }),
            Direction::Left => x.checked_sub(1).map(|x| Coord { x, y }),
        }
    }

    /// Whether the head moving in `dir` from `self` will run over `other`.
    fn ahead(self, dir: Direction, other: Coord) -> bool {
        match dir {
            Direction::Up => other.x == self.x && other.y <= self.y,
            Direction::Down => other.x == self.x && other.y >= self.y,
            Direction::Left => other.y == self.y && other.x <= self.x,
            Direction::Right => other.y == self.y && other.x >= self.x,
        }
    }
}

fn fetch(pixs: &Pixels, at: Coord) -> Cell {
    match pixs.get_br(at.x, at.y) {
        0 => Cell::Free,
        1 => Cell::Brick,
        2 => Cell::Body,
        _ => Cell::Food,
    }
}

fn draw(pixs: &mut Pixels, at: Coord, cell: Cell) {
    pixs.set_br(at.x, at.y, cell as u8);
}

enum Step {
    Moved,
    Ate,
    Blocked,
}

pub(super) struct Snake {
    /// Also the crawl rate in Hz.
    level: u32,
    eaten: u32,
    bricks: u32,
    timer: Timer,
    dir: Direction,
    head: Coord,
    body: [Coord; BODY_CAPACITY],
    body_head: usize,
    body_tail: usize,
}

impl Snake {
    pub(super) fn new(platform: &impl Platform) -> Self {
        let mut snake = Self {
            level: 1,
            eaten: 0,
            bricks: 0,
            timer: Timer::new(1),
            dir: Direction::Up,
            head: Coord { x: 4, y: 8 },
            body: [Coord::default(); BODY_CAPACITY],
            body_head: 0,
            body_tail: 0,
        };

        snake.push_head(snake.head);
        platform.with_pixels(|pixs| draw(pixs, snake.head, Cell::Body));
        snake.put_in_random(platform, Cell::Food);

        snake
    }

    pub(super) fn run(&mut self, platform: &impl Platform) {
        loop {
            let keys = platform.read_key();
            platform.clr_keys(keys);

            if keys.contains(Keys::K3) {
                info!("snake abandoned at level {}", self.level);
                return;
            }

            if let Some(dir) = turn(keys & Keys::ARROWS) {
                if dir != self.dir.opposite() {
                    self.dir = dir;
                }
            }

            if self.timer.tick() {
                if !self.crawl(platform) {
                    info!("snake crashed at level {}", self.level);
                    return;
                }

                if self.need_brick(platform) {
                    self.bricks += 1;
                    self.put_in_random(platform, Cell::Brick);
                }
            }
        }
    }

    fn push_head(&mut self, at: Coord) {
        self.body_head = (self.body_head + 1) % BODY_CAPACITY;
        self.body[self.body_head] = at;
    }

    fn pop_tail(&mut self) -> Coord {
        self.body_tail = (self.body_tail + 1) % BODY_CAPACITY;
        self.body[self.body_tail]
    }

    fn expected_bricks(&self) -> u32 {
        self.level.saturating_sub(2) * 2
    }

    /// Bricks trickle in at random while fewer than expected are on screen,
    /// faster the bigger the shortfall.
    fn need_brick(&self, platform: &impl Platform) -> bool {
        let expected = self.expected_bricks();
        if expected <= self.bricks {
            return false;
        }

        match expected - self.bricks {
            missing if missing >= 5 => true,
            missing => platform.get_random() % ((5 - missing) * 10) == 0,
        }
    }

    fn head_step(&self, pixs: &Pixels) -> (Coord, Step) {
        let Some(next) = self.head.step(self.dir) else {
            return (self.head, Step::Blocked);
        };

        match fetch(pixs, next) {
            Cell::Free => (next, Step::Moved),
            Cell::Food => (next, Step::Ate),
            Cell::Brick | Cell::Body => (next, Step::Blocked),
        }
    }

    /// Moves one cell. `false` when the head hits a wall, a brick or the body.
    fn crawl(&mut self, platform: &impl Platform) -> bool {
        let (next, step) = platform.with_pixels(|pixs| self.head_step(pixs));

        if let Step::Blocked = step {
            return false;
        }

        self.head = next;
        self.push_head(next);
        platform.with_pixels(|pixs| draw(pixs, next, Cell::Body));

        match step {
            Step::Ate => {
                self.eaten += 1;
                if self.eaten >= FOOD_PER_LEVEL {
                    self.eaten = 0;
                    if self.level < MAX_LEVEL {
                        self.level += 1;
                        self.timer.reinit(self.level);
                        info!("snake level {}", self.level);
                    }
                }
                self.put_in_random(platform, Cell::Food);
            }
            _ => {
                let tail = self.pop_tail();
                platform.with_pixels(|pixs| draw(pixs, tail, Cell::Free));
            }
        }

        true
    }

    /// Puts `cell` on a random free pixel that is not straight ahead of the head.
    fn put_in_random(&self, platform: &impl Platform, cell: Cell) {
        let (head, dir) = (self.head, self.dir);
        let roll = platform.get_random() as usize;
        let cells = || (0..ROWS).flat_map(|y| (0..COLUMNS).map(move |x| Coord { x, y }));

        platform.with_pixels(|pixs| {
            let free = |at: &Coord| fetch(pixs, *at) == Cell::Free && !head.ahead(dir, *at);

            let count = cells().filter(&free).count();
            if count == 0 {
                return;
            }

            let target = cells().filter(&free).nth(roll % count);
            if let Some(at) = target {
                draw(pixs, at, cell);
            }
        });
    }
}

fn turn(arrows: Keys) -> Option<Direction> {
    if arrows == Keys::UP {
        Some(Direction::Up)
    } else if arrows == Keys::DOWN {
        Some(Direction::Down)
    } else if arrows == Keys::LEFT {
        Some(Direction::Left)
    } else if arrows == Keys::RIGHT {
        Some(Direction::Right)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_stop_at_walls() {
        let corner = Coord { x: 0, y: 0 };
        assert_eq!(corner.step(Direction::Up), None);
        assert_eq!(corner.step(Direction::Left), None);
        assert_eq!(corner.step(Direction::Right), Some(Coord { x: 1, y: 0 }));

        let far = Coord { x: COLUMNS - 1, y: ROWS - 1 };
        assert_eq!(far.step(Direction::Down), None);
        assert_eq!(far.step(Direction::Right), None);
        assert_eq!(far.step(Direction::Up), Some(Coord { x: 7, y: 14 }));
    }

    #[test]
    fn ahead_covers_the_path() {
        let head = Coord { x: 4, y: 8 };

        assert!(head.ahead(Direction::Up, Coord { x: 4, y: 2 }));
        assert!(!head.ahead(Direction::Up, Coord { x: 4, y: 9 }));
        assert!(!head.ahead(Direction::Up, Coord { x: 3, y: 2 }));
        assert!(head.ahead(Direction::Right, Coord { x: 7, y: 8 }));
        assert!(!head.ahead(Direction::Left, Coord { x: 7, y: 8 }));
    }

    #[test]
    fn cells_round_trip_through_pixels() {
        let mut pixs = Pixels::new();

        for (i, cell) in [Cell::Free, Cell::Brick, Cell::Body, Cell::Food].into_iter().enumerate() {
            let at = Coord { x: i, y: 3 };
            draw(&mut pixs, at, cell);
            assert_eq!(fetch(&pixs, at), cell);
        }
    }

    #[test]
    fn only_single_arrows_turn() {
        assert_eq!(turn(Keys::LEFT), Some(Direction::Left));
        assert_eq!(turn(Keys::LEFT | Keys::UP), None);
        assert_eq!(turn(Keys::empty()), None);
    }
}
