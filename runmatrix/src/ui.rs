use std::time::Duration;

pub(super) use minifb::Key;
use minifb::{KeyRepeat, Scale, ScaleMode, Window, WindowOptions};

use libmatrix::{COLUMNS, ROWS};

const PALLET: [u32; 4] = [0x00_2a_0a_08, 0x00_6e_14_0e, 0x00_b8_26_18, 0x00_ff_4a_30];
const BACKGROUND: u32 = 0x00_10_10_10;

pub struct Ui {
    buffer: Box<[u32]>,
    window: Window,
    cell: usize,
}

impl Ui {
    pub fn new(cell: usize) -> minifb::Result<Self> {
        let cell = cell.max(3);
        let (res_x, res_y) = (COLUMNS * cell, ROWS * cell);
        let buffer = vec![BACKGROUND; res_x * res_y].into_boxed_slice();

        let options = WindowOptions {
            resize: true,
            scale: Scale::FitScreen,
            scale_mode: ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        };

        let mut window = Window::new("runmatrix - ESC to exit", res_x, res_y, options)?;

        window.limit_update_rate(Some(Duration::from_micros(16600)));

        Ok(Self {
            buffer,
            window,
            cell,
        })
    }

    /// Draws one round LED per entry of `levels` (row-major, 0-3).
    pub fn update(&mut self, levels: &[u8]) -> minifb::Result<bool> {
        let cell = self.cell;
        let (res_x, res_y) = (COLUMNS * cell, ROWS * cell);
        let radius = (cell as i32 - 2) / 2;

        for (idx, dst) in self.buffer.iter_mut().enumerate() {
            let (px, py) = (idx % res_x, idx / res_x);
            let led = (py / cell) * COLUMNS + px / cell;

            let dx = (px % cell) as i32 * 2 + 1 - cell as i32;
            let dy = (py % cell) as i32 * 2 + 1 - cell as i32;
            let inside = dx * dx + dy * dy <= 4 * radius * radius;

            *dst = match levels.get(led) {
                Some(level) if inside => PALLET[*level as usize & 3],
                _ => BACKGROUND,
            };
        }

        self.window.update_with_buffer(&self.buffer, res_x, res_y)?;

        Ok(self.window.is_open() && !self.window.is_key_down(Key::Escape))
    }

    pub fn buttons<B: Copy>(&mut self, map: &[(Key, B)]) -> Vec<B> {
        map.iter()
            .filter_map(|(k, b)| self.window.is_key_down(*k).then_some(*b))
            .collect()
    }

    pub fn pressed(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }
}
