use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use miditap::backend_midir::MidirBackend;
use miditap::{config, MidiSession};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let settings = config::load();
    debug!(client_name = %settings.client_name, "loaded settings");
    let session = MidiSession::new(MidirBackend::new(settings.client_name.clone()));

    match cli.command {
        Commands::List => list(&session),
        Commands::Monitor { interval_ms } => {
            monitor(&session, interval_ms.unwrap_or(settings.poll_interval_ms))
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "MIDI input aggregation monitor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List currently attached MIDI input endpoints.
    List,
    /// Print incoming MIDI messages in a frame-polling loop.
    Monitor {
        /// Milliseconds to sleep between polling frames.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

fn list(session: &MidiSession<MidirBackend>) -> Result<()> {
    let count = session.refresh();
    println!("Detected {count} endpoints:");
    for index in 0..count {
        let Some(id) = session.endpoint_at(index) else {
            break;
        };
        println!("- {index:3}: 0x{id:08X} {}", session.endpoint_name(id));
    }
    Ok(())
}

fn monitor(session: &MidiSession<MidirBackend>, interval_ms: u64) -> Result<()> {
    let count = session.refresh();
    println!("Monitoring {count} endpoints (ctrl-c to exit)");
    loop {
        // Drain until the queue reports empty, then sleep one frame.
        while let Some(message) = session.dequeue() {
            println!(
                "0x{:08X} ({}): 0x{:02X} 0x{:02X} 0x{:02X}",
                message.source,
                session.endpoint_name(message.source),
                message.status,
                message.data1,
                message.data2
            );
        }
        thread::sleep(Duration::from_millis(interval_ms));
    }
}
