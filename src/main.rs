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
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use drumpad::audio;
use drumpad::config::{self, PreloadMode};
use drumpad::controller::{feedback::Highlights, keyboard, layout::PadLayout, Controller};
use drumpad::keys::LogicalKey;
use drumpad::samples::{
    KitDefinition, PadEngine, PreloadStatus, ResourceLoadError, SampleLoader, SampleRegistry,
};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A virtual drum pad."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plays the pad from the terminal keyboard and mouse.
    Play {
        /// The path to the pad config.
        config: PathBuf,
        /// The audio device to play through. Overrides the config.
        #[arg(short, long)]
        device: Option<String>,
        /// The kit to start with. Overrides the config.
        #[arg(short, long)]
        kit: Option<String>,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Loads every kit and reports samples that are missing or can't be decoded.
    Verify {
        /// The path to the pad config.
        config: PathBuf,
    },
    /// Prints the built-in pad config to stdout.
    DefaultConfig {},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // The pad draws on stdout, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config: config_path,
            device,
            kit,
        } => {
            let mut pad = config::load_pad(&config_path)?;
            if let Some(device) = device {
                pad.set_device(&device);
            }
            if let Some(kit) = kit {
                pad.set_default_kit(&kit)?;
            }

            let (completions_tx, completions_rx) = audio::completion_channel();
            let device = audio::get_device(pad.audio(), completions_tx)?;
            let highlights = Highlights::new(pad.highlight()?);
            let engine = PadEngine::new(&pad, device, Box::new(highlights.clone()));

            let driver = Arc::new(keyboard::Driver::new(
                PadLayout::default(),
                highlights,
                (pad.default_volume() * 100.0).round() as u8,
            ));
            let mut controller = Controller::new(engine, completions_rx, driver);
            controller.join().await?;
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
        Commands::Verify {
            config: config_path,
        } => {
            let mut pad = config::load_pad(&config_path)?;
            pad.set_preload(PreloadMode::Inline);
            let mut registry = SampleRegistry::new(
                KitDefinition::from_pad(&pad),
                Arc::new(SampleLoader::new(pad.audio().sample_rate())),
                pad.preload(),
                pad.default_volume(),
            );

            let mut failures = 0;
            let kits: Vec<String> = registry.kits().map(str::to_string).collect();
            for kit in kits {
                match registry.load(&kit) {
                    Ok(()) | Err(ResourceLoadError::MissingSamples { .. }) => {}
                    Err(e) => return Err(e.into()),
                }

                let failed = registry.failed_keys();
                if failed.is_empty() {
                    println!("- {}: ok", kit);
                    continue;
                }

                failures += failed.len();
                println!("- {}: {} failed", kit, failed.len());
                for key in failed {
                    print_failure(&registry, key);
                }
            }

            println!(
                "Decoded {} KiB of samples.",
                registry.loader().total_memory_usage() / 1024
            );
            if failures > 0 {
                return Err(format!("{} samples failed to load", failures).into());
            }
        }
        Commands::DefaultConfig {} => {
            print!("{}", config::render_pad(&config::Pad::default())?);
        }
    }

    Ok(())
}

fn print_failure(registry: &SampleRegistry, key: LogicalKey) {
    if let Some(resource) = registry.get(key) {
        if let PreloadStatus::Failed(e) = resource.preload().status() {
            println!("  - {} ({}): {}", key, resource.locator(), e);
        }
    }
}
