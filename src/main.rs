//! CLI entry point for plotkit.
//!
//! Inspects the device extension registry: built-in declarations plus any
//! driver manifests found on the configured search paths.
//!
//! # Usage
//!
//! ```bash
//! plotkit list
//! plotkit show generic.cutter
//! plotkit config generic.cutter --connection serial
//! plotkit view generic.cutter
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plotkit::commands::{self, ConfigSlice};
use plotkit::config::{AppConfig, DEFAULT_CONFIG_FILE};
use plotkit::device::ExtensionPoint;
use plotkit::{tracing_setup, Host};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plotkit")]
#[command(about = "Inspect plotter and cutter device declarations", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered IDs per extension point
    List {
        /// Only list one extension point: driver, protocol, transport or a
        /// full ID such as `plotkit.device.protocols`
        #[arg(long, value_parser = parse_point)]
        point: Option<ExtensionPoint>,
    },

    /// Describe a driver
    Show {
        /// Driver ID
        id: String,
    },

    /// Print a slice of a driver's default configuration
    Config {
        /// Driver ID
        id: String,

        /// Print the job section
        #[arg(long, conflicts_with_all = ["protocol", "connection"])]
        job: bool,

        /// Print the defaults for a protocol
        #[arg(long, conflicts_with = "connection")]
        protocol: Option<String>,

        /// Print the defaults for a transport
        #[arg(long)]
        connection: Option<String>,
    },

    /// Print the config view layout for a driver
    View {
        /// Driver ID
        id: String,
    },
}

fn parse_point(value: &str) -> Result<ExtensionPoint, String> {
    let point = match value {
        "driver" => Some(ExtensionPoint::Driver),
        "protocol" => Some(ExtensionPoint::Protocol),
        "transport" => Some(ExtensionPoint::Transport),
        id => ExtensionPoint::from_id(id),
    };
    point.ok_or_else(|| format!("unknown extension point '{value}'"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.validate()?;
    tracing_setup::init_from_config(&config)?;

    let (host, report) = Host::from_config(&config)?;
    if !report.is_clean() {
        tracing::warn!(
            manifest_errors = report.manifest_errors.len(),
            registration_errors = report.registration_errors.len(),
            "some manifests were skipped"
        );
    }

    let output = match cli.command {
        Commands::List { point } => commands::list(&host, point),
        Commands::Show { id } => commands::show(&host, &id)?,
        Commands::Config {
            id,
            job,
            protocol,
            connection,
        } => {
            let slice = match (job, protocol, connection) {
                (true, _, _) => ConfigSlice::Job,
                (_, Some(protocol), _) => ConfigSlice::Protocol(protocol),
                (_, _, Some(connection)) => ConfigSlice::Connection(connection),
                _ => ConfigSlice::Device,
            };
            commands::config(&host, &id, &slice)?
        }
        Commands::View { id } => commands::view(&host, &id)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
