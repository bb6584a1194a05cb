pub const COLUMNS: usize = 8;
pub const ROWS: usize = 16;

/// Two parallel bit-planes holding a 2-bit brightness code per LED.
///
/// Row `y` is one byte per plane, bit `x` is column `x`. The code of a cell is
/// `bit(br1) + 2 * bit(br2)`: 0 off, 1 dim, 2 medium, 3 full.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Pixels {
    pub br1: [u8; ROWS],
    pub br2: [u8; ROWS],
}

impl Pixels {
    pub const fn new() -> Self {
        Self {
            br1: [0u8; ROWS],
            br2: [0u8; ROWS],
        }
    }

    pub fn get_br(&self, x: usize, y: usize) -> u8 {
        ((self.br1[y] >> x) & 1) + ((self.br2[y] >> x) & 1) * 2
    }

    pub fn set_br(&mut self, x: usize, y: usize, br: u8) {
        let mask = 1 << x;
        let b1 = &mut self.br1[y];
        let b2 = &mut self.br2[y];

        match br & 3 {
            0 => {
                *b1 &= !mask;
                *b2 &= !mask;
            }
            1 => {
                *b1 |= mask;
                *b2 &= !mask;
            }
            2 => {
                *b1 &= !mask;
                *b2 |= mask;
            }
            _ => {
                *b1 |= mask;
                *b2 |= mask;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Demotes every lit cell to the dimmest level.
    pub fn freeze(&mut self) {
        for (b1, b2) in self.br1.iter_mut().zip(self.br2.iter_mut()) {
            *b1 |= *b2;
            *b2 = 0;
        }
    }

    /// Row word latched for scan column `col`: rows `col` and `col + 8` side by side.
    pub(crate) fn row_word(plane: &[u8; ROWS], col: usize) -> u16 {
        u16::from_le_bytes([plane[col], plane[col + COLUMNS]])
    }
}
