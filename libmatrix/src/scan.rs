use log::debug;

use crate::debounce::{InputLatch, DEFAULT_DEBOUNCE_CYCLES};
use crate::led::{FrameRails, LedSampler, Rail, Rails, DEFAULT_LED_TIMEOUT_CYCLES};
use crate::pixels::{Pixels, COLUMNS};
use crate::shared::Shared;

/// Output and input peripherals touched by the scan interrupt.
///
/// None of these may block. A busy peripheral reports `false`/`None` and the
/// engine skips that step until its next opportunity.
pub trait ScanHardware {
    /// Latches an active-low column select and the 16-bit row word.
    fn drive(&mut self, columns: u8, rows: u16) -> bool;

    fn set_period(&mut self, units: u8);

    /// Raw pressed lines, active high, in `Keys` bit order.
    fn read_buttons(&mut self) -> u8;

    fn counter(&mut self) -> u32;

    fn start_conversion(&mut self, rail: Rail) -> bool;

    fn conversion(&mut self) -> Option<u16>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneMix {
    Plane1,
    Plane2,
    And,
    Or,
    /// No output write; whatever was latched last stays lit.
    Hold,
}

impl PlaneMix {
    pub fn row_word(self, pixs: &Pixels, col: usize) -> Option<u16> {
        let p1 = Pixels::row_word(&pixs.br1, col);
        let p2 = Pixels::row_word(&pixs.br2, col);

        match self {
            PlaneMix::Plane1 => Some(p1),
            PlaneMix::Plane2 => Some(p2),
            PlaneMix::And => Some(p1 & p2),
            PlaneMix::Or => Some(p1 | p2),
            PlaneMix::Hold => None,
        }
    }

    fn lights(self, code: u8) -> bool {
        match self {
            PlaneMix::Plane1 => code & 1 != 0,
            PlaneMix::Plane2 => code & 2 != 0,
            PlaneMix::And => code == 3,
            PlaneMix::Or => code != 0,
            PlaneMix::Hold => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Phase {
    pub mix: PlaneMix,
    pub dwell: u8,
}

const fn phase(mix: PlaneMix, dwell: u8) -> Phase {
    Phase { mix, dwell }
}

const BASIC: [Phase; 3] = [
    phase(PlaneMix::Plane1, 1),
    phase(PlaneMix::Plane2, 1),
    phase(PlaneMix::Hold, 1),
];

const GRAYSCALE: [Phase; 4] = [
    phase(PlaneMix::And, 4),
    phase(PlaneMix::Or, 2),
    phase(PlaneMix::Plane2, 1),
    phase(PlaneMix::Hold, 1),
];

/// Per-column phase sequences. Both start with a lit phase and end with a
/// `Hold`, which is the LED sampler's idle window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PhaseTable {
    /// Plane 1, plane 2, hold: levels 1:2:3.
    Basic,
    /// AND, OR, plane 2, hold: levels 2:4:8.
    #[default]
    Grayscale,
}

impl PhaseTable {
    pub fn phases(self) -> &'static [Phase] {
        match self {
            PhaseTable::Basic => &BASIC,
            PhaseTable::Grayscale => &GRAYSCALE,
        }
    }

    /// On-time of each brightness code during one column slot, in base units.
    pub fn levels(self) -> [u32; 4] {
        let mut levels = [0u32; 4];
        let mut shown = PlaneMix::Hold;

        for phase in self.phases() {
            if phase.mix != PlaneMix::Hold {
                shown = phase.mix;
            }

            for (code, level) in levels.iter_mut().enumerate() {
                if shown.lights(code as u8) {
                    *level += phase.dwell as u32;
                }
            }
        }

        levels
    }

    pub fn slot(self) -> u32 {
        self.phases().iter().map(|p| p.dwell as u32).sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    pub debounce_cycles: u8,
    pub phases: PhaseTable,
    pub led_timeout_cycles: u16,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            debounce_cycles: DEFAULT_DEBOUNCE_CYCLES,
            phases: PhaseTable::default(),
            led_timeout_cycles: DEFAULT_LED_TIMEOUT_CYCLES,
        }
    }
}

/// The display scan interrupt.
///
/// Owns the scan copy of the framebuffer and all interrupt-only state. Create
/// it once and call `fire` from the periodic interrupt only.
pub struct ScanEngine {
    scan: Pixels,
    column: u8,
    phase: u8,
    phases: &'static [Phase],
    held: u16,
    held_mix: PlaneMix,
    input: InputLatch,
    led: LedSampler,
}

impl ScanEngine {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            scan: Pixels::new(),
            column: 0,
            phase: 0,
            phases: config.phases.phases(),
            held: 0,
            held_mix: PlaneMix::Hold,
            input: InputLatch::new(config.debounce_cycles),
            led: LedSampler::new(config.led_timeout_cycles),
        }
    }

    pub fn column(&self) -> usize {
        self.column as usize
    }

    pub fn phase(&self) -> usize {
        self.phase as usize
    }

    pub fn scan_pixels(&self) -> &Pixels {
        &self.scan
    }

    pub fn input(&self) -> &InputLatch {
        &self.input
    }

    /// One interrupt. Returns `true` on the firing that completes a refresh cycle.
    pub fn fire(&mut self, shared: &Shared, hw: &mut impl ScanHardware) -> bool {
        if self.led.converting() {
            self.led.harvest(shared.led(), shared.entropy(), hw);
        }

        let phase = self.phases[self.phase as usize];
        let col = self.column as usize;

        match phase.mix.row_word(&self.scan, col) {
            Some(rows) => {
                if hw.drive(!(1u8 << col), rows) {
                    self.held = rows;
                    self.held_mix = phase.mix;
                }
            }
            None => {
                let scan = &self.scan;
                let held_mix = self.held_mix;

                self.led.on_hold(
                    shared.led(),
                    self.held,
                    || FrameRails {
                        lit: frame_rails(scan, PlaneMix::Or),
                        held: frame_rails(scan, held_mix),
                    },
                    hw,
                );
            }
        }

        hw.set_period(phase.dwell);

        if self.input.sampling() {
            self.input.sample(hw.read_buttons());
        }

        self.advance(shared, hw)
    }

    fn advance(&mut self, shared: &Shared, hw: &mut impl ScanHardware) -> bool {
        self.phase += 1;

        if self.phase as usize != self.phases.len() {
            return false;
        }

        self.phase = 0;
        self.column += 1;

        if self.column as usize != COLUMNS {
            return false;
        }

        self.column = 0;
        self.end_cycle(shared, hw);

        true
    }

    fn end_cycle(&mut self, shared: &Shared, hw: &mut impl ScanHardware) {
        match shared.try_snapshot() {
            Some(front) => self.scan = front,
            None => debug!("front framebuffer busy, keeping previous snapshot"),
        }

        self.input.end_cycle(shared.keys());
        self.led.end_cycle(shared.led());
        shared.feed_entropy(hw.counter());
        shared.signal_cycle_complete();
    }
}

fn frame_rails(pixs: &Pixels, mix: PlaneMix) -> Rails {
    (0..COLUMNS)
        .filter_map(|col| mix.row_word(pixs, col))
        .fold(Rails::empty(), |acc, rows| acc | Rails::lit_by(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_give_three_distinct_levels() {
        for table in [PhaseTable::Basic, PhaseTable::Grayscale] {
            let levels = table.levels();

            assert_eq!(levels[0], 0);
            assert!(levels[1] < levels[2] && levels[2] < levels[3]);
            assert!(levels[3] <= table.slot());
        }

        assert_eq!(PhaseTable::Basic.levels(), [0, 1, 2, 3]);
        assert_eq!(PhaseTable::Grayscale.levels(), [0, 2, 4, 8]);
    }

    #[test]
    fn tables_end_in_an_idle_window() {
        for table in [PhaseTable::Basic, PhaseTable::Grayscale] {
            let phases = table.phases();

            assert_ne!(phases[0].mix, PlaneMix::Hold);
            assert_eq!(phases[phases.len() - 1].mix, PlaneMix::Hold);
            assert!(phases.iter().all(|p| p.dwell > 0));
        }
    }

    #[test]
    fn row_word_mixes() {
        let mut pixs = Pixels::new();
        pixs.br1[1] = 0b0011;
        pixs.br2[1] = 0b0101;
        pixs.br2[9] = 0b1000_0000;

        assert_eq!(PlaneMix::Plane1.row_word(&pixs, 1), Some(0x0003));
        assert_eq!(PlaneMix::Plane2.row_word(&pixs, 1), Some(0x8005));
        assert_eq!(PlaneMix::And.row_word(&pixs, 1), Some(0x0001));
        assert_eq!(PlaneMix::Or.row_word(&pixs, 1), Some(0x8007));
        assert_eq!(PlaneMix::Hold.row_word(&pixs, 1), None);
    }

    #[test]
    fn frame_rails_sees_every_column() {
        let mut pixs = Pixels::new();
        assert_eq!(frame_rails(&pixs, PlaneMix::Plane2), Rails::empty());

        pixs.set_br(5, 12, 2);
        assert_eq!(frame_rails(&pixs, PlaneMix::Plane2), Rails::HIGH);
        assert_eq!(frame_rails(&pixs, PlaneMix::Plane1), Rails::empty());

        pixs.set_br(1, 3, 1);
        assert_eq!(frame_rails(&pixs, PlaneMix::Or), Rails::all());
        assert_eq!(frame_rails(&pixs, PlaneMix::Plane2), Rails::HIGH);
    }
}
