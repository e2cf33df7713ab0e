//! Cadence Runtime
//!
//! Headless binary: loads settings, builds the demo scene and simulates a
//! fixed number of frames, then reports timings and counters.
//!
//! Usage: `cadence [settings.json]`

mod demo;

use anyhow::{Context, Result};
use cadence_core::ecs::World;
use cadence_metrics::FrameTimer;
use cadence_services::Settings;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_SETTINGS_PATH: &str = "cadence.json";
const DEMO_SEED: u64 = 0x00C0_FFEE;
const REPORT_EVERY: u64 = 120;
const BOOTSTRAP_FILTER: &str = "info";

fn main() -> Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());
    // The log filter lives in the settings, so loading runs under a
    // scoped bootstrap subscriber until the real one is installed.
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter(BOOTSTRAP_FILTER))
        .finish();
    let settings = tracing::subscriber::with_default(bootstrap, || Settings::load(&settings_path))
        .with_context(|| format!("failed to load settings from {settings_path}"))?;

    init_logging(&settings.log.filter);
    info!("Cadence v{}", cadence_core::VERSION);
    info!(
        path = %settings_path,
        frames = settings.scheduler.frames,
        frame_delta_ms = settings.scheduler.frame_delta_ms,
        "settings loaded"
    );

    let mut world = World::with_clock_config(settings.to_clock_config());
    let scene = demo::populate(&mut world, DEMO_SEED).context("failed to build demo scene")?;
    info!(
        player = %scene.player,
        drones = scene.drones.len(),
        turrets = scene.turrets.len(),
        "demo scene ready"
    );

    for name in &settings.scheduler.disabled_systems {
        world
            .set_system_enabled_by_name(name, false)
            .with_context(|| format!("cannot disable system '{name}'"))?;
        info!(system = %name, "disabled by settings");
    }

    let frame_delta = settings.frame_delta();
    let mut timer = FrameTimer::new(REPORT_EVERY as usize);
    for _ in 0..settings.scheduler.frames {
        timer.begin();
        let report = world.run_frame(frame_delta)?;
        timer.end();

        if report.index % REPORT_EVERY == 0 {
            info!(
                frame = report.index,
                gametime = ?report.gametime,
                entities = world.entity_count(),
                slow_motion = world.slow_motion().combined_factor(),
                "progress"
            );
        }
        if !world.contains(scene.player) {
            warn!(frame = report.index, "player destroyed, stopping early");
            break;
        }
    }

    report(&world, &timer);
    Ok(())
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .init();
}

fn report(world: &World, timer: &FrameTimer) {
    let clock = world.clock();
    info!(
        frames = clock.frame_count(),
        skipped = clock.skipped_frames(),
        gametime = ?clock.gametime(),
        entities = world.entity_count(),
        "simulation finished"
    );

    let (min_ms, max_ms) = timer.frame_time_range_ms();
    info!(
        fps = %format!("{:.0}", timer.fps()),
        avg_ms = %format!("{:.3}", timer.frame_time_ms()),
        min_ms = %format!("{min_ms:.3}"),
        max_ms = %format!("{max_ms:.3}"),
        "frame timing"
    );

    for (name, timing) in world.profiler().slowest(3) {
        info!(
            system = %name,
            calls = timing.calls,
            total = ?timing.total,
            "slowest system"
        );
    }

    for (name, value) in world.counters().iter() {
        info!(counter = name, value, "counter");
    }
}
