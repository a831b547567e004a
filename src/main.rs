// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;

use beatronome::config::init_sequencer_and_controller;
use beatronome::signature::TimeSignature;
use beatronome::{audio, pattern};
use clap::{crate_version, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A step sequencer and drum machine."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Starts the sequencer, controlled from the keyboard.
    Start {
        /// The path to the sequencer config. The built-in kit is used if omitted.
        config_path: Option<PathBuf>,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the supported time signatures.
    Signatures {},
    /// Prints a basic beat for the given time signature as JSON.
    Pattern {
        /// The time signature, e.g. 3/4.
        signature: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config_path } => {
            init_sequencer_and_controller(config_path.as_deref())?
                .join()
                .await?;
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Signatures {} => {
            println!("Time signatures:");
            for signature in TimeSignature::ALL {
                let layout = signature.layout();
                println!(
                    "- {} ({} sections of {} steps, {} steps total)",
                    signature,
                    layout.sections(),
                    layout.steps_per_section(),
                    layout.total_steps()
                );
            }
        }
        Commands::Pattern { signature } => {
            println!("{}", pattern::describe_json(&signature)?);
        }
    }

    Ok(())
}
