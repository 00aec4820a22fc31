use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod error;
mod plant;
mod serve;
mod simulate;

use error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "tr-cli")]
#[command(about = "thermoreg CLI - three-channel temperature regulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a station file
    Validate {
        /// Path to the station YAML or JSON file
        config_path: PathBuf,
    },
    /// Run the regulator against a simulated plant, as fast as possible
    Simulate {
        /// Path to the station YAML or JSON file
        config_path: PathBuf,
        /// Simulated duration in seconds
        #[arg(long, default_value_t = 600.0)]
        duration_s: f64,
        /// Print one row every N ticks
        #[arg(long, default_value_t = 10)]
        every: u64,
        /// Start an auto-tune on this channel at t = 0
        #[arg(long)]
        autotune: Option<i64>,
        /// Print the final status snapshot as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run in real time, reading JSON commands on stdin and answering on stdout
    Serve {
        /// Path to the station YAML or JSON file
        config_path: PathBuf,
    },
}

fn main() -> CliResult<()> {
    // Logs go to stderr so stdout stays a clean response stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Simulate {
            config_path,
            duration_s,
            every,
            autotune,
            json,
        } => simulate::run(
            &config_path,
            simulate::SimulateOptions {
                duration_s,
                every,
                autotune: autotune.map(parse_channel).transpose()?,
                json,
            },
        ),
        Commands::Serve { config_path } => serve::run(&config_path),
    }
}

fn cmd_validate(config_path: &Path) -> CliResult<()> {
    println!("Validating station: {}", config_path.display());
    let station = tr_project::load(config_path)?;
    // Building proves the file also passes the engine's own checks.
    station.build_engine(tr_io::NullDriver)?;
    println!("✓ Station '{}' is valid", station.name);
    for id in station.listed_channels() {
        if let Some(def) = station.channels.iter().find(|c| c.index == id.index()) {
            println!(
                "  channel {} - {:?}, setpoint {} °C, sensor {}",
                id,
                def.law,
                def.setpoint,
                def.sensor
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            );
        }
    }
    Ok(())
}

fn parse_channel(index: i64) -> CliResult<tr_core::ChannelId> {
    tr_core::ChannelId::new(index).map_err(|_| CliError::InvalidArg {
        what: format!("no channel {index}"),
    })
}
