use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{debug, info};

use libmatrix::{
    menu, Keys, PhaseTable, ScanConfig, ScanEngine, DEFAULT_DEBOUNCE_CYCLES,
    DEFAULT_LED_TIMEOUT_CYCLES, TICK_TIME_MS,
};

mod matrix;
mod platform;
mod ui;

use matrix::SimulatedMatrix;
use platform::Desktop;
use ui::Key;

const BUTTON_MAP: [(Key, Keys); 8] = [
    (Key::Up, Keys::UP),
    (Key::Down, Keys::DOWN),
    (Key::Left, Keys::LEFT),
    (Key::Right, Keys::RIGHT),
    (Key::Space, Keys::HIT),
    (Key::Key1, Keys::K1),
    (Key::Key2, Keys::K2),
    (Key::Key3, Keys::K3),
];

/// Key that asks the LED feedback sampler for a measurement.
const LED_SAMPLE_KEY: Key = Key::L;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Phases {
    /// Plane 1, plane 2, hold
    Basic,
    /// Weighted AND/OR/plane 2 phases
    Grayscale,
}

impl From<Phases> for PhaseTable {
    fn from(phases: Phases) -> Self {
        match phases {
            Phases::Basic => PhaseTable::Basic,
            Phases::Grayscale => PhaseTable::Grayscale,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Run the LED matrix console in a window")]
struct Args {
    /// Window pixels per LED
    #[arg(long, default_value_t = 8)]
    scale: usize,

    /// Full refresh cycles a key change must persist before it is committed
    #[arg(long, default_value_t = DEFAULT_DEBOUNCE_CYCLES)]
    debounce: u8,

    /// Scan phase sequence used to render grayscale
    #[arg(long, value_enum, default_value_t = Phases::Grayscale)]
    phases: Phases,

    /// Refresh cycles before an LED sample request gives up (0 waits forever)
    #[arg(long, default_value_t = DEFAULT_LED_TIMEOUT_CYCLES)]
    led_timeout: u16,

    /// Offset added to every LED feedback average
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    calibration: i16,

    /// Duration of one refresh cycle in milliseconds
    #[arg(long, default_value_t = TICK_TIME_MS as u64)]
    period_ms: u64,
}

fn spawn_scan(
    desktop: Arc<Desktop>,
    config: ScanConfig,
    period: Duration,
) -> anyhow::Result<()> {
    let mut engine = ScanEngine::new(config);
    let mut matrix = SimulatedMatrix::new(desktop.buttons(), config.phases);

    thread::Builder::new()
        .name("scan".into())
        .spawn(move || {
            let mut deadline = Instant::now();

            loop {
                while !engine.fire(desktop.shared(), &mut matrix) {}

                desktop.publish(matrix.take_frame());

                deadline += period;
                match deadline.checked_duration_since(Instant::now()) {
                    Some(rest) => thread::sleep(rest),
                    None => {
                        debug!("scan thread fell behind");
                        deadline = Instant::now();
                    }
                }
            }
        })
        .context("failed to spawn scan thread")?;

    Ok(())
}

fn spawn_game(desktop: Arc<Desktop>) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("game".into())
        .spawn(move || {
            menu::run(&*desktop);
        })
        .context("failed to spawn game thread")?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();
    debug!("{args:?}");

    let config = ScanConfig {
        debounce_cycles: args.debounce,
        phases: args.phases.into(),
        led_timeout_cycles: args.led_timeout,
    };

    let desktop = Arc::new(Desktop::new());
    desktop.shared().led().set_calibration(args.calibration);

    let mut window = ui::Ui::new(args.scale).context("failed to open window")?;

    let period = Duration::from_millis(args.period_ms.max(1));

    spawn_scan(Arc::clone(&desktop), config, period)?;
    spawn_game(Arc::clone(&desktop))?;

    loop {
        let keys = window
            .buttons(&BUTTON_MAP)
            .into_iter()
            .fold(Keys::empty(), |acc, key| acc | key);

        desktop.set_buttons(keys);

        if window.pressed(LED_SAMPLE_KEY) {
            info!("requesting LED feedback sample");
            desktop.shared().led().request();
        }

        if desktop.shared().led().is_ready() {
            let (low, high) = desktop.shared().led().collect();
            info!(
                "LED feedback after {} cycles: low {low}, high {high}",
                desktop.cycles()
            );
        }

        if !window.update(&desktop.frame())? {
            break;
        }
    }

    Ok(())
}
