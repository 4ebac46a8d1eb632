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

use clap::{crate_version, Parser, Subcommand};
use dacsynth::dac::Transport as _;
use dacsynth::{config, dac, engine, midi};
use tracing::info;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A note-driven synthesizer for SPI DACs."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available MIDI input devices.
    MidiDevices {},
    /// Start will run the synthesizer until interrupted.
    Start {
        /// The path to the engine config.
        config_path: PathBuf,
    },
    /// Renders samples offline and writes packed DAC words to a file.
    Render {
        /// The path to the engine config.
        config_path: PathBuf,
        /// The number of synthesis ticks to render.
        #[arg(short, long)]
        ticks: u64,
        /// Where to write the packed DAC words.
        #[arg(short, long)]
        output: PathBuf,
        /// A standard MIDI file to play while rendering.
        #[arg(short, long)]
        midi_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::MidiDevices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Start { config_path } => {
            let config = config::Engine::deserialize(&config_path)?;
            let midi_device = match config.midi() {
                Some(midi) => Some(midi::get_device(midi.device())?),
                None => None,
            };
            let transport = dac::get_transport(config.dac_output())?;

            let mut engine = engine::Engine::start(&config, midi_device, transport)?;
            tokio::signal::ctrl_c().await?;
            info!("Interrupted, stopping.");
            engine.stop();
        }
        Commands::Render {
            config_path,
            ticks,
            output,
            midi_file,
        } => {
            let config = config::Engine::deserialize(&config_path)?;
            let events = match midi_file {
                Some(midi_file) => engine::midi_file_events(&midi_file, config.sample_rate())?,
                None => Vec::new(),
            };
            let transport = dac::get_transport(Some(output.as_path()))?;

            let (stats, mut transport) = engine::render(&config, &events, ticks, transport)?;
            transport.flush()?;
            println!(
                "Rendered {} ticks, sent {} samples ({} stalls) to {}.",
                ticks,
                stats.samples_sent(),
                stats.stalls(),
                output.display()
            );
        }
    }

    Ok(())
}
