use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Context, Result};

use cadence_engine::logging::{init_logging, LoggingConfig};
use cadence_engine::tick::FrameLoop;
use cadence_engine::time::FrameCounter;
use cadence_engine::timer::TimerHandle;

/// Simulation settings.
#[derive(Debug, Clone)]
struct SimConfig {
    frames: u64,
    log_filter: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frames: 12,
            log_filter: "info,cadence_engine=debug".to_string(),
        }
    }
}

impl SimConfig {
    /// `cadence-sim [FRAMES]`
    fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(arg) = args.nth(1) {
            config.frames = arg
                .parse()
                .with_context(|| format!("invalid frame count {arg:?}"))?;
        }
        Ok(config)
    }
}

/// A target owned outside the timer; callbacks only hold it weakly.
struct Beacon {
    name: &'static str,
    pings: Cell<u32>,
}

fn main() -> Result<()> {
    let config = SimConfig::from_args(std::env::args())?;

    init_logging(
        LoggingConfig {
            timestamps: false,
            ..LoggingConfig::default()
        }
        .with_filter(config.log_filter.clone()),
    );

    let mut frames = FrameLoop::new();
    let timer = frames.create_timer();
    let counter = frames.counter().clone();

    let at = counter.clone();
    timer.schedule(0, move || log::info!("[frame {}] immediate", at.get()));

    for delay in [4, 1, 4] {
        let at = counter.clone();
        timer.schedule(delay, move || {
            log::info!("[frame {}] fired (delay {delay})", at.get())
        });
    }

    // Re-arms itself three times, one frame apart.
    let handle = timer.handle();
    let at = counter.clone();
    timer.schedule(2, move || pulse(handle, at, 3));

    let beacon = Rc::new(Beacon {
        name: "alpha",
        pings: Cell::new(0),
    });
    let at = counter.clone();
    timer.schedule_weak(5, &beacon, move |b| {
        b.pings.set(b.pings.get() + 1);
        log::info!("[frame {}] beacon {} pinged", at.get(), b.name);
    });

    let doomed = Rc::new(Beacon {
        name: "bravo",
        pings: Cell::new(0),
    });
    timer.schedule_weak(6, &doomed, |b| {
        log::error!("beacon {} outlived its owner", b.name)
    });
    drop(doomed);

    log::info!(
        "scheduled {} callbacks, running {} frames",
        timer.pending_count(),
        config.frames
    );

    frames.run_frames(config.frames);

    log::info!(
        "done at frame {}: {} pending, beacon {} pinged {} time(s)",
        counter.get(),
        timer.pending_count(),
        beacon.name,
        beacon.pings.get()
    );

    Ok(())
}

fn pulse(handle: TimerHandle, at: FrameCounter, left: u32) {
    log::info!("[frame {}] pulse ({left} left)", at.get());
    if left > 1 {
        let next = handle.clone();
        handle.schedule(1, move || pulse(next, at, left - 1));
    }
}
