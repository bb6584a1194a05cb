//! Compile-time decoding of ASCII art used for sprites and menu logos.
//!
//! Palette: `' '` off, `'.'` dim (plane 1), `'o'` medium (plane 2), any other
//! symbol full (both planes).

pub const PLANE1: u8 = 1;
pub const PLANE2: u8 = 2;
pub const BOTH_PLANES: u8 = PLANE1 | PLANE2;

pub const fn code(sym: u8) -> u8 {
    match sym {
        b' ' => 0,
        b'.' => 1,
        b'o' => 2,
        _ => 3,
    }
}

pub const fn width(art: &[&str]) -> usize {
    let mut width = 0;
    let mut row = 0;

    while row < art.len() {
        if art[row].len() > width {
            width = art[row].len();
        }
        row += 1;
    }

    width
}

/// Packs the cells of `art` whose code shares a bit with `planes`, row after
/// row, `width(art)` bits per row, first row in the low bits.
pub const fn pack(art: &[&str], planes: u8) -> u32 {
    let width = width(art);
    assert!(width * art.len() <= 32, "art does not fit a 32-bit bitmap");

    let mut pixels = 0u32;
    let mut row = 0;

    while row < art.len() {
        let bytes = art[row].as_bytes();
        let mut col = 0;

        while col < bytes.len() {
            if code(bytes[col]) & planes != 0 {
                pixels |= 1 << (row * width + col);
            }
            col += 1;
        }
        row += 1;
    }

    pixels
}

/// One byte per art row for `planes`, column 0 in bit 0.
pub const fn rows<const N: usize>(art: &[&str; N], planes: u8) -> [u8; N] {
    let mut out = [0u8; N];
    let mut row = 0;

    while row < N {
        let bytes = art[row].as_bytes();
        assert!(bytes.len() <= 8, "art row wider than a byte");

        let mut col = 0;
        while col < bytes.len() {
            if code(bytes[col]) & planes != 0 {
                out[row] |= 1 << col;
            }
            col += 1;
        }
        row += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_uses_row_major_low_bits_first() {
        const ART: [&str; 2] = ["#. ", " o#"];

        assert_eq!(width(&ART), 3);
        assert_eq!(pack(&ART, BOTH_PLANES), 0b110_011);
        assert_eq!(pack(&ART, PLANE1), 0b100_011);
        assert_eq!(pack(&ART, PLANE2), 0b110_001);
    }

    #[test]
    fn short_rows_are_padded() {
        assert_eq!(pack(&["##", "#"], BOTH_PLANES), 0b01_11);
    }

    #[test]
    fn rows_map_columns_to_bits() {
        assert_eq!(rows(&["#  o", ".."], PLANE1), [0b0001, 0b11]);
        assert_eq!(rows(&["#  o", ".."], PLANE2), [0b1001, 0b00]);
    }
}
