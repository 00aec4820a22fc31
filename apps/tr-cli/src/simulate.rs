//! Fast-forward run of a station against the thermal plant.

use std::path::Path;

use tracing::{debug, info};
use tr_controls::TuneOutcome;
use tr_core::units::ms;
use tr_core::{ChannelId, NUM_CHANNELS};
use tr_engine::RegulationEngine;
use tr_io::{EnableInput, EnableLatch, RecordingSink, SensorBank};

use crate::error::{CliError, CliResult};
use crate::plant::{Plant, PlantParams};

pub type PlantEngine = RegulationEngine<SensorBank<Plant>, EnableLatch>;

pub struct SimulateOptions {
    pub duration_s: f64,
    pub every: u64,
    pub autotune: Option<ChannelId>,
    pub json: bool,
}

/// Load a station and drive it over a fresh plant.
pub fn load_engine(config_path: &Path) -> CliResult<PlantEngine> {
    let station = tr_project::load(config_path)?;
    let plant = Plant::new(PlantParams::default())?;
    Ok(station.build_engine(plant)?)
}

/// Tick the engine once at `now_ms`, then let the plant respond for one period.
pub fn step(engine: &mut PlantEngine, sink: &mut RecordingSink, now_ms: u64) {
    let report = engine.tick(now_ms, sink);
    if report.overrun {
        debug!(elapsed_us = report.elapsed.as_micros() as u64, "tick overrun");
    }
    let commands: [f64; NUM_CHANNELS] = std::array::from_fn(|i| sink.commands[i].normalized);
    let period = engine.sample_config().period_ms;
    engine.sensors_mut().driver_mut().step(commands, ms(period));
}

pub fn run(config_path: &Path, options: SimulateOptions) -> CliResult<()> {
    if !(options.duration_s > 0.0) {
        return Err(CliError::InvalidArg {
            what: "duration must be positive".into(),
        });
    }
    let mut engine = load_engine(config_path)?;
    let period_ms = engine.sample_config().period_ms;
    let ticks = (options.duration_s * 1000.0 / period_ms as f64).ceil() as u64;
    let every = options.every.max(1);

    if let Some(id) = options.autotune {
        engine.start_autotune(id, None, 0)?;
    }

    info!(ticks, period_ms, "starting simulation");
    if !options.json {
        print_header();
    }

    let mut sink = RecordingSink::default();
    for n in 1..=ticks {
        let now_ms = n * period_ms;
        step(&mut engine, &mut sink, now_ms);
        if !options.json && n % every == 0 {
            print_row(&engine, now_ms);
        }
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    } else {
        print_summary(&engine);
    }
    Ok(())
}

fn print_header() {
    print!("{:>8}", "t [s]");
    for id in ChannelId::all() {
        print!(
            " | {:>7} {:>7} {:>8} {:>8} {:>3}",
            format!("T{id}"),
            "out",
            "state",
            "alarm",
            "en"
        );
    }
    println!();
}

fn print_row(engine: &PlantEngine, now_ms: u64) {
    print!("{:>8.1}", now_ms as f64 / 1000.0);
    for slot in engine.slots() {
        let status = slot.channel.status();
        let temp = status
            .input
            .map(|t| format!("{t:.2}"))
            .unwrap_or_else(|| "--".to_string());
        let enable = if engine.enables().is_enabled(slot.channel.id()) {
            "on"
        } else {
            "off"
        };
        print!(
            " | {:>7} {:>7.1} {:>8} {:>8} {:>3}",
            temp,
            status.output,
            format!("{:?}", status.state),
            format!("{:?}", slot.alarm.state().level),
            enable,
        );
    }
    println!();
}

fn print_summary(engine: &PlantEngine) {
    let stats = engine.stats();
    println!(
        "{} ticks, {} overruns, worst {:?}, average {:?}",
        stats.ticks,
        stats.overruns,
        stats.worst,
        stats.average()
    );
    for slot in engine.slots() {
        match slot.channel.status().last_tune {
            Some(TuneOutcome::Completed(report)) => println!(
                "channel {}: auto-tune committed kp {:.3} ki {:.4} kd {:.3}",
                slot.channel.id(),
                report.gains.kp,
                report.gains.ki,
                report.gains.kd
            ),
            Some(TuneOutcome::Failed(failure)) => {
                println!("channel {}: auto-tune failed: {:?}", slot.channel.id(), failure)
            }
            Some(TuneOutcome::Cancelled) => {
                println!("channel {}: auto-tune cancelled", slot.channel.id())
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tr_controls::ControllerState;

    fn bench() -> PlantEngine {
        load_engine(Path::new("../../configs/bench.yaml")).unwrap()
    }

    #[test]
    fn enabled_channels_heat_their_zones() {
        let mut engine = bench();
        let mut sink = RecordingSink::default();
        for n in 1..=300 {
            step(&mut engine, &mut sink, n * 1000);
        }
        let plant = engine.sensors().driver();
        assert!(plant.temperature(0) > 30.0);
        assert!(plant.temperature(1) > 30.0);
        // Channel 2 is disabled, its zone never leaves ambient
        assert!((plant.temperature(2) - 20.0).abs() < 1e-9);
        assert_eq!(engine.stats().ticks, 300);
    }

    #[test]
    fn autotune_on_plant_ends_the_session() {
        let mut engine = bench();
        let id = ChannelId::new(0).unwrap();
        engine.start_autotune(id, None, 0).unwrap();
        let mut sink = RecordingSink::default();
        // Session is 600 s at 1 s ticks
        for n in 1..=601 {
            step(&mut engine, &mut sink, n * 1000);
        }
        let state = engine.slot(id).channel.state();
        assert_ne!(state, ControllerState::Tuning);
        assert!(engine.slot(id).channel.status().last_tune.is_some());
    }
}
