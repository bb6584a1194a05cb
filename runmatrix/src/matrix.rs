//! Software stand-in for the LED matrix, its buttons and the feedback ADC.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use libmatrix::{PhaseTable, Rail, ScanHardware, ADC_MAX, COLUMNS, ROWS};

pub const LEDS: usize = COLUMNS * ROWS;

/// ADC counts contributed by every lit LED on a rail.
const COUNTS_PER_LED: u16 = 300;

pub struct SimulatedMatrix {
    buttons: Arc<AtomicU8>,
    started: Instant,
    levels: [u32; 4],
    columns: u8,
    rows: u16,
    lit_time: [u32; LEDS],
    conversion: Option<u16>,
}

impl SimulatedMatrix {
    pub fn new(buttons: Arc<AtomicU8>, phases: PhaseTable) -> Self {
        Self {
            buttons,
            started: Instant::now(),
            levels: phases.levels(),
            columns: 0xff,
            rows: 0,
            lit_time: [0; LEDS],
            conversion: None,
        }
    }

    /// Brightness code of every LED over the cycle just finished, estimated
    /// from how long each one was lit. Resets the integration.
    pub fn take_frame(&mut self) -> [u8; LEDS] {
        let levels = self.levels;
        let frame = self.lit_time.map(|time| {
            (0..levels.len())
                .min_by_key(|&code| levels[code].abs_diff(time))
                .unwrap_or(0) as u8
        });

        self.lit_time = [0; LEDS];
        frame
    }

    /// Framebuffer index of each lit LED under the latched outputs.
    fn lit(&self) -> impl Iterator<Item = usize> + '_ {
        (0..COLUMNS)
            .filter(|col| self.columns & (1 << col) == 0)
            .flat_map(move |col| {
                (0..16)
                    .filter(move |bit| self.rows & (1 << bit) != 0)
                    .map(move |bit| {
                        let y = if bit < 8 { col } else { col + 8 };
                        y * COLUMNS + bit % 8
                    })
            })
    }
}

impl ScanHardware for SimulatedMatrix {
    fn drive(&mut self, columns: u8, rows: u16) -> bool {
        self.columns = columns;
        self.rows = rows;
        true
    }

    fn set_period(&mut self, units: u8) {
        let leds: Vec<usize> = self.lit().collect();

        for led in leds {
            self.lit_time[led] += units as u32;
        }
    }

    fn read_buttons(&mut self) -> u8 {
        self.buttons.load(Ordering::Relaxed)
    }

    fn counter(&mut self) -> u32 {
        self.started.elapsed().as_nanos() as u32
    }

    fn start_conversion(&mut self, rail: Rail) -> bool {
        let mask = match rail {
            Rail::Low => 0x00ff,
            Rail::High => 0xff00,
        };
        let lit = (self.rows & mask).count_ones() as u16;

        self.conversion = Some((lit * COUNTS_PER_LED).min(ADC_MAX));
        true
    }

    fn conversion(&mut self) -> Option<u16> {
        self.conversion.take()
    }
}
