use libmatrix::{
    Keys, LedState, Pixels, PhaseTable, PlaneMix, Rail, Rails, ScanConfig, ScanEngine,
    ScanHardware, Shared, ADC_MAX, COLUMNS, NOT_SAMPLED,
};

/// Peripherals that never stall, with a scripted analog converter.
#[derive(Default)]
struct FakeMatrix {
    latched: Vec<(u8, u16)>,
    periods: Vec<u8>,
    buttons: u8,
    counter: u32,
    converting: Option<Rail>,
    conversions: Vec<Rail>,
    low: u16,
    high: u16,
}

impl ScanHardware for FakeMatrix {
    fn drive(&mut self, columns: u8, rows: u16) -> bool {
        self.latched.push((columns, rows));
        true
    }

    fn set_period(&mut self, units: u8) {
        self.periods.push(units);
    }

    fn read_buttons(&mut self) -> u8 {
        self.buttons
    }

    fn counter(&mut self) -> u32 {
        self.counter = self.counter.wrapping_add(7919);
        self.counter
    }

    fn start_conversion(&mut self, rail: Rail) -> bool {
        self.converting = Some(rail);
        self.conversions.push(rail);
        true
    }

    fn conversion(&mut self) -> Option<u16> {
        self.converting.take().map(|rail| match rail {
            Rail::Low => self.low,
            Rail::High => self.high,
        })
    }
}

fn run_cycle(engine: &mut ScanEngine, shared: &Shared, hw: &mut FakeMatrix) {
    for _ in 0..1000 {
        if engine.fire(shared, hw) {
            return;
        }
    }
    panic!("refresh cycle never completed");
}

fn checkerboard() -> Pixels {
    let mut pixs = Pixels::new();
    for y in 0..pixs.br1.len() {
        pixs.br1[y] = if y % 2 == 0 { 0x55 } else { 0xaa };
        pixs.br2[y] = !pixs.br1[y];
    }
    pixs
}

#[test]
fn snapshot_is_taken_once_per_cycle() {
    let shared = Shared::new();
    let mut engine = ScanEngine::new(ScanConfig::default());
    let mut hw = FakeMatrix::default();

    let board = checkerboard();
    shared.with_pixels(|pixs| *pixs = board);

    run_cycle(&mut engine, &shared, &mut hw);
    assert!(shared.take_cycle_complete());
    assert!(!shared.take_cycle_complete());
    assert_eq!(*engine.scan_pixels(), board);

    // A foreground change mid-cycle is not visible until the boundary.
    for _ in 0..5 {
        assert!(!engine.fire(&shared, &mut hw));
    }
    shared.with_pixels(|pixs| pixs.clear());
    assert_eq!(*engine.scan_pixels(), board);
    assert!(!shared.take_cycle_complete());

    run_cycle(&mut engine, &shared, &mut hw);
    assert!(shared.take_cycle_complete());
    assert_eq!(*engine.scan_pixels(), Pixels::new());
}

#[test]
fn outputs_follow_the_phase_table() {
    let shared = Shared::new();
    let table = PhaseTable::Grayscale;
    let mut engine = ScanEngine::new(ScanConfig {
        phases: table,
        ..ScanConfig::default()
    });
    let mut hw = FakeMatrix::default();

    let board = checkerboard();
    shared.with_pixels(|pixs| *pixs = board);
    run_cycle(&mut engine, &shared, &mut hw);

    hw.latched.clear();
    hw.periods.clear();
    run_cycle(&mut engine, &shared, &mut hw);

    let lit: Vec<_> = table
        .phases()
        .iter()
        .filter(|p| p.mix != PlaneMix::Hold)
        .collect();
    assert_eq!(hw.latched.len(), COLUMNS * lit.len());

    for (col, chunk) in hw.latched.chunks(lit.len()).enumerate() {
        for (phase, &(columns, rows)) in lit.iter().zip(chunk) {
            assert_eq!(columns, !(1 << col));
            assert_eq!(Some(rows), phase.mix.row_word(&board, col));
        }
    }

    let dwell: Vec<u8> = table.phases().iter().map(|p| p.dwell).collect();
    assert_eq!(hw.periods, dwell.repeat(COLUMNS));
}

#[test]
fn indices_stay_in_range() {
    let shared = Shared::new();
    let mut engine = ScanEngine::new(ScanConfig {
        phases: PhaseTable::Basic,
        debounce_cycles: 3,
        ..ScanConfig::default()
    });
    let mut hw = FakeMatrix::default();
    let phases = PhaseTable::Basic.phases().len();

    for fire in 0..5000u32 {
        hw.buttons = if fire % 37 < 11 { 0x21 } else { 0x04 };

        let done = engine.fire(&shared, &mut hw);

        assert!(engine.column() < COLUMNS);
        assert!(engine.phase() < phases);
        assert!(engine.input().countdown() <= 3);
        assert_eq!(done, engine.column() == 0 && engine.phase() == 0);
    }
}

#[test]
fn stable_press_commits_after_window() {
    let shared = Shared::new();
    let mut engine = ScanEngine::new(ScanConfig {
        debounce_cycles: 2,
        ..ScanConfig::default()
    });
    let mut hw = FakeMatrix::default();

    hw.buttons = Keys::HIT.bits();

    // Observe, two quiet cycles, confirm.
    for _ in 0..3 {
        run_cycle(&mut engine, &shared, &mut hw);
        assert_eq!(shared.active_keys(), Keys::empty());
    }
    run_cycle(&mut engine, &shared, &mut hw);
    assert_eq!(shared.active_keys(), Keys::HIT);

    // Consumed by the foreground, stays consumed while held.
    shared.clr_keys(Keys::HIT);
    for _ in 0..10 {
        run_cycle(&mut engine, &shared, &mut hw);
    }
    assert_eq!(shared.active_keys(), Keys::empty());
    assert_eq!(engine.input().committed(), Keys::HIT.bits());
}

#[test]
fn change_of_mind_within_window_is_not_committed() {
    let shared = Shared::new();
    let mut engine = ScanEngine::new(ScanConfig {
        debounce_cycles: 5,
        ..ScanConfig::default()
    });
    let mut hw = FakeMatrix::default();

    hw.buttons = Keys::LEFT.bits();
    run_cycle(&mut engine, &shared, &mut hw);
    assert_eq!(engine.input().pending(), Keys::LEFT.bits());
    assert_eq!(engine.input().countdown(), 5);

    hw.buttons = Keys::RIGHT.bits();
    for _ in 0..5 {
        run_cycle(&mut engine, &shared, &mut hw);
        assert_eq!(shared.active_keys(), Keys::empty());
    }

    // Confirmation cycle sees Right only: Left never made it.
    run_cycle(&mut engine, &shared, &mut hw);
    assert_eq!(engine.input().pending(), 0);
    assert_eq!(engine.input().committed(), 0);
    assert_eq!(shared.active_keys(), Keys::empty());

    // Right then goes through its own window.
    for _ in 0..7 {
        run_cycle(&mut engine, &shared, &mut hw);
        assert!(!shared.active_keys().contains(Keys::LEFT));
    }
    assert_eq!(shared.active_keys(), Keys::RIGHT);
}

fn sample_leds(calibration: i16, low: u16) -> (u16, u16) {
    let shared = Shared::new();
    let mut engine = ScanEngine::new(ScanConfig::default());
    let mut hw = FakeMatrix {
        low,
        high: 3000,
        ..FakeMatrix::default()
    };

    // One full brightness pixel on the low rail only.
    shared.with_pixels(|pixs| pixs.set_br(3, 2, 3));
    run_cycle(&mut engine, &shared, &mut hw);

    shared.led().set_calibration(calibration);
    shared.led().request();

    for _ in 0..20 {
        run_cycle(&mut engine, &shared, &mut hw);
        if shared.led().is_ready() {
            break;
        }
    }

    assert!(shared.led().is_ready());
    assert!(hw.conversions.iter().all(|&rail| rail == Rail::Low));

    let result = shared.led().collect();
    assert_eq!(shared.led().state(), LedState::Idle);
    result
}

#[test]
fn led_sampling_reports_only_lit_rail() {
    assert_eq!(sample_leds(100, 1000), (1100, NOT_SAMPLED));
}

#[test]
fn led_calibration_is_clamped() {
    assert_eq!(sample_leds(50, 4090), (ADC_MAX, NOT_SAMPLED));
    assert_eq!(sample_leds(-500, 300), (0, NOT_SAMPLED));
}

#[test]
fn led_request_times_out_on_dark_frame() {
    let shared = Shared::new();
    let mut engine = ScanEngine::new(ScanConfig {
        led_timeout_cycles: 10,
        ..ScanConfig::default()
    });
    let mut hw = FakeMatrix::default();

    shared.led().request();

    for _ in 0..9 {
        run_cycle(&mut engine, &shared, &mut hw);
        assert_eq!(shared.led().state(), LedState::Requested);
    }

    run_cycle(&mut engine, &shared, &mut hw);
    assert!(shared.led().is_ready());
    assert_eq!(shared.led().collect(), (NOT_SAMPLED, NOT_SAMPLED));
    assert!(hw.conversions.is_empty());
}

#[test]
fn led_request_of_one_rail_skips_the_other() {
    let shared = Shared::new();
    let mut engine = ScanEngine::new(ScanConfig::default());
    let mut hw = FakeMatrix {
        low: 1000,
        high: 3000,
        ..FakeMatrix::default()
    };

    shared.with_pixels(|pixs| {
        pixs.set_br(3, 2, 3);
        pixs.set_br(3, 10, 3);
    });
    run_cycle(&mut engine, &shared, &mut hw);

    shared.led().request_rails(Rails::HIGH);

    for _ in 0..20 {
        run_cycle(&mut engine, &shared, &mut hw);
        if shared.led().is_ready() {
            break;
        }
    }

    assert!(shared.led().is_ready());
    assert!(!hw.conversions.is_empty());
    assert!(hw.conversions.iter().all(|&rail| rail == Rail::High));
    assert_eq!(shared.led().collect(), (NOT_SAMPLED, 3000));
}

#[test]
fn led_request_on_dim_pixels_resolves_at_once() {
    let shared = Shared::new();
    let mut engine = ScanEngine::new(ScanConfig::default());
    let mut hw = FakeMatrix::default();

    shared.with_pixels(|pixs| pixs.set_br(3, 2, 1));
    run_cycle(&mut engine, &shared, &mut hw);

    shared.led().request();
    run_cycle(&mut engine, &shared, &mut hw);

    assert!(shared.led().is_ready());
    assert_eq!(shared.led().collect(), (NOT_SAMPLED, NOT_SAMPLED));
    assert!(hw.conversions.is_empty());
}

#[test]
fn led_request_repeated_mid_sample_gets_full_timeout() {
    let shared = Shared::new();
    let mut engine = ScanEngine::new(ScanConfig {
        led_timeout_cycles: 50,
        ..ScanConfig::default()
    });
    let mut hw = FakeMatrix {
        low: 1000,
        ..FakeMatrix::default()
    };

    shared.with_pixels(|pixs| pixs.set_br(3, 2, 3));
    run_cycle(&mut engine, &shared, &mut hw);

    shared.led().request();
    run_cycle(&mut engine, &shared, &mut hw);
    assert_eq!(shared.led().state(), LedState::InProgress);

    // The frame goes dark before the sample completes.
    shared.with_pixels(|pixs| pixs.clear());
    for _ in 0..46 {
        run_cycle(&mut engine, &shared, &mut hw);
        assert_eq!(shared.led().state(), LedState::InProgress);
    }

    shared.led().request();
    for _ in 0..49 {
        run_cycle(&mut engine, &shared, &mut hw);
        assert_eq!(shared.led().state(), LedState::Requested);
    }

    run_cycle(&mut engine, &shared, &mut hw);
    assert!(shared.led().is_ready());
    assert_eq!(shared.led().collect(), (NOT_SAMPLED, NOT_SAMPLED));
}

#[test]
fn scan_events_feed_entropy() {
    let shared = Shared::new();
    let mut engine = ScanEngine::new(ScanConfig::default());
    let mut hw = FakeMatrix::default();

    let mut draws = Vec::new();
    for _ in 0..4 {
        run_cycle(&mut engine, &shared, &mut hw);
        draws.push(shared.feed_entropy(0));
    }

    draws.sort_unstable();
    draws.dedup();
    assert_eq!(draws.len(), 4);
}
