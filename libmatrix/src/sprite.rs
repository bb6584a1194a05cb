use crate::art;
use crate::pixels::{Pixels, COLUMNS, ROWS};

pub mod catalog;

/// Immutable catalog entry.
///
/// `pixels` holds `height` rows of `width` bits, first row in the low bits.
/// A base entry with `group_size` n is followed by n alternative rotations.
/// A grayscale entry occupies two slots: plane 1 bitmap, then plane 2 bitmap,
/// and so does every rotation of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpriteDef {
    pub pixels: u32,
    pub width: u8,
    pub height: u8,
    pub group_size: u8,
    pub grayscale: bool,
}

impl SpriteDef {
    pub const fn from_art(art: &[&str]) -> Self {
        Self::build(art, art::BOTH_PLANES, false)
    }

    /// One plane of a grayscale sprite; `plane` is `art::PLANE1` or `art::PLANE2`.
    pub const fn plane_from_art(art: &[&str], plane: u8) -> Self {
        Self::build(art, plane, true)
    }

    const fn build(art: &[&str], planes: u8, grayscale: bool) -> Self {
        let width = art::width(art);
        let height = art.len();
        assert!(width >= 1 && width <= COLUMNS, "sprite width out of range");
        assert!(height >= 1 && height <= ROWS, "sprite height out of range");

        Self {
            pixels: art::pack(art, planes),
            width: width as u8,
            height: height as u8,
            group_size: 0,
            grayscale,
        }
    }

    pub const fn grouped(mut self, extra_rotations: u8) -> Self {
        assert!(extra_rotations <= 3, "at most four rotations per group");
        self.group_size = extra_rotations;
        self
    }

    /// Quarter turn clockwise.
    pub const fn rotated(self) -> Self {
        let w = self.width as usize;
        let h = self.height as usize;
        let mut pixels = 0u32;
        let mut row = 0;

        while row < w {
            let mut col = 0;
            while col < h {
                let src = (h - 1 - col) * w + row;
                if self.pixels & (1 << src) != 0 {
                    pixels |= 1 << (row * h + col);
                }
                col += 1;
            }
            row += 1;
        }

        Self {
            pixels,
            width: self.height,
            height: self.width,
            group_size: 0,
            grayscale: self.grayscale,
        }
    }

    fn row_mask(&self) -> u32 {
        (1u32 << self.width) - 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Off,
    PlaneA,
    PlaneB,
    Full,
    /// The catalog's own plane bitmaps; `Full` for monochrome sprites.
    Natural,
    /// Keep whatever the sprite is currently drawn with.
    Unchanged,
}

struct Footprint {
    left: u32,
    top: usize,
}

pub struct Sprite<'a> {
    catalog: &'a [SpriteDef],
    base: usize,
    index: usize,
    x: i32,
    y: i32,
    rotation: i32,
    color: Color,
}

impl<'a> Sprite<'a> {
    pub fn new(catalog: &'a [SpriteDef], base: usize) -> Self {
        Self {
            catalog,
            base,
            index: base,
            x: 0,
            y: 0,
            rotation: 0,
            color: Color::Off,
        }
    }

    pub fn def(&self) -> &SpriteDef {
        &self.catalog[self.index]
    }

    pub fn base_def(&self) -> &SpriteDef {
        &self.catalog[self.base]
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Moves the sprite so its center lands on `(x, y)` with the given rotation.
    ///
    /// Fails, keeping the previous placement and color, when the new footprint
    /// leaves the grid or covers a lit pixel that is not the sprite's own.
    pub fn place(
        &mut self,
        pixs: &mut Pixels,
        x: i32,
        y: i32,
        rotation: i32,
        color: Color,
    ) -> bool {
        let saved = (self.x, self.y, self.rotation);
        let color = match color {
            Color::Unchanged => self.color,
            other => other,
        };

        if self.color != Color::Off {
            self.clear(pixs);
        }

        self.x = x;
        self.y = y;
        self.set_rotation(rotation);

        if color == Color::Off {
            self.color = Color::Off;
            return true;
        }

        let collision = self.collides(pixs);

        let color = if collision {
            let moved = (self.x, self.y, self.rotation) != saved;

            self.x = saved.0;
            self.y = saved.1;
            self.set_rotation(saved.2);

            match self.color {
                Color::Off => Color::Off,
                current if moved => current,
                _ => color,
            }
        } else {
            color
        };

        if color != Color::Off {
            self.draw(pixs, color);
        }
        self.color = color;

        !collision
    }

    pub fn move_by(
        &mut self,
        pixs: &mut Pixels,
        dx: i32,
        dy: i32,
        drot: i32,
        color: Color,
    ) -> bool {
        self.place(pixs, self.x + dx, self.y + dy, self.rotation + drot, color)
    }

    fn set_rotation(&mut self, rotation: i32) {
        let base = self.base_def();
        let count = base.group_size as i32 + 1;
        let stride = if base.grayscale { 2 } else { 1 };

        self.rotation = rotation.rem_euclid(count);
        self.index = self.base + (self.rotation as usize) * stride;
    }

    fn footprint(&self) -> Option<Footprint> {
        let def = self.def();
        let left = self.x - (def.width / 2) as i32;
        let top = self.y - (def.height / 2) as i32;

        let fits = left >= 0
            && top >= 0
            && left + def.width as i32 <= COLUMNS as i32
            && top + def.height as i32 <= ROWS as i32;

        fits.then_some(Footprint {
            left: left as u32,
            top: top as usize,
        })
    }

    fn plane2(&self) -> u32 {
        let def = self.def();
        match def.grayscale {
            true => self.catalog[self.index + 1].pixels,
            false => 0,
        }
    }

    fn mask(&self) -> u32 {
        self.def().pixels | self.plane2()
    }

    /// Walks the footprint rows, handing `f` both plane bytes, the row's
    /// bounding mask and the two data rows shifted into place.
    fn process<F>(&self, pixs: &mut Pixels, data1: u32, data2: u32, mut f: F) -> u8
    where
        F: FnMut(&mut u8, &mut u8, u8, u8, u8) -> u8,
    {
        let Some(fp) = self.footprint() else {
            return 0;
        };

        let def = self.def();
        let row_mask = def.row_mask();
        let bounds = (row_mask << fp.left) as u8;
        let mut result = 0;

        for row in 0..def.height as usize {
            let shift = row as u32 * def.width as u32;
            let d1 = (((data1 >> shift) & row_mask) << fp.left) as u8;
            let d2 = (((data2 >> shift) & row_mask) << fp.left) as u8;
            let y = fp.top + row;

            result |= f(&mut pixs.br1[y], &mut pixs.br2[y], bounds, d1, d2);
        }

        result
    }

    fn collides(&self, pixs: &mut Pixels) -> bool {
        if self.footprint().is_none() {
            return true;
        }

        let mask = self.mask();

        self.process(pixs, mask, mask, |b1, b2, _, d1, d2| (*b1 | *b2) & (d1 | d2)) != 0
    }

    fn clear(&self, pixs: &mut Pixels) {
        let mask = self.mask();

        self.process(pixs, mask, mask, |b1, b2, _, d1, d2| {
            *b1 &= !d1;
            *b2 &= !d2;
            0
        });
    }

    fn draw(&self, pixs: &mut Pixels, color: Color) {
        let def = self.def();
        let color = match color {
            Color::Natural if !def.grayscale => Color::Full,
            other => other,
        };

        let mask = self.mask();
        let (data1, data2) = match color {
            Color::PlaneA => (mask, 0),
            Color::PlaneB => (0, mask),
            Color::Full => (mask, mask),
            Color::Natural => (def.pixels, self.plane2()),
            Color::Off | Color::Unchanged => return,
        };

        self.process(pixs, data1, data2, |b1, b2, bounds, d1, d2| {
            let m = bounds & (d1 | d2);
            *b1 = (*b1 & !m) | d1;
            *b2 = (*b2 & !m) | d2;
            0
        });
    }
}
