//! Built-in sprites.
//!
//! Tetrominoes are followed by their distinct clockwise rotations. The
//! invasion platform is a grayscale group of four animation frames.

use crate::art::{PLANE1, PLANE2};
use crate::sprite::SpriteDef;

const O: SpriteDef = SpriteDef::from_art(&["##", "##"]);
const I: SpriteDef = SpriteDef::from_art(&["####"]);
const S: SpriteDef = SpriteDef::from_art(&[" ##", "## "]);
const Z: SpriteDef = SpriteDef::from_art(&["## ", " ##"]);
const T: SpriteDef = SpriteDef::from_art(&["###", " # "]);
const L: SpriteDef = SpriteDef::from_art(&["###", "#  "]);
const J: SpriteDef = SpriteDef::from_art(&["###", "  #"]);

const PLATFORM_FRAMES: [[&str; 2]; 4] = [
    [" # ", "#o."],
    [" # ", "o#o"],
    [" # ", ".o#"],
    [" # ", "o.o"],
];

const fn frame(index: usize, plane: u8) -> SpriteDef {
    SpriteDef::plane_from_art(&PLATFORM_FRAMES[index], plane)
}

/// Catalog index of every tetromino's base rotation.
pub const TETROMINOES: [usize; 7] = [0, 1, 3, 5, 7, 11, 15];

pub const PLATFORM: usize = 19;

pub static SPRITES: [SpriteDef; 27] = [
    O,
    I.grouped(1),
    I.rotated(),
    S.grouped(1),
    S.rotated(),
    Z.grouped(1),
    Z.rotated(),
    T.grouped(3),
    T.rotated(),
    T.rotated().rotated(),
    T.rotated().rotated().rotated(),
    L.grouped(3),
    L.rotated(),
    L.rotated().rotated(),
    L.rotated().rotated().rotated(),
    J.grouped(3),
    J.rotated(),
    J.rotated().rotated(),
    J.rotated().rotated().rotated(),
    frame(0, PLANE1).grouped(3),
    frame(0, PLANE2).grouped(3),
    frame(1, PLANE1),
    frame(1, PLANE2),
    frame(2, PLANE1),
    frame(2, PLANE2),
    frame(3, PLANE1),
    frame(3, PLANE2),
];
