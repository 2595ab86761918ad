//! Command-line interface for mca_daq.
//!
//! ```bash
//! # List available serial ports
//! mca_daq list-ports
//!
//! # Acquire one spectrum and save it
//! mca_daq acquire --port /dev/ttyACM0 --output spectrum.csv
//!
//! # Summarize a previously saved spectrum
//! mca_daq show spectrum.csv
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use mca_daq::config::Settings;
use mca_daq::ports;
use mca_daq::session::SpectrumSession;

#[derive(Parser)]
#[command(name = "mca_daq", about = "Serial spectrum acquisition for 4096-channel MCAs")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available serial ports with descriptive metadata.
    ListPorts,

    /// Acquire one spectrum, smooth it, and save it as CSV.
    Acquire {
        /// Serial endpoint to acquire from (overrides configuration).
        #[arg(long)]
        port: Option<String>,

        /// Baud rate (overrides configuration).
        #[arg(long)]
        baud: Option<u32>,

        /// Per-read timeout in seconds (overrides configuration).
        #[arg(long)]
        timeout: Option<f64>,

        /// Smoothing window width in channels (overrides configuration).
        #[arg(long)]
        window: Option<usize>,

        /// Output path; defaults to a timestamped file in the storage
        /// directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Load a saved spectrum CSV and print a summary.
    Show {
        /// Path to the spectrum CSV.
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::ListPorts => list_ports(),
        Command::Acquire {
            port,
            baud,
            timeout,
            window,
            output,
        } => acquire(settings, port, baud, timeout, window, output),
        Command::Show { path } => show(settings, &path),
    }
}

fn list_ports() -> Result<()> {
    let descriptors = ports::list_ports();
    if descriptors.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }
    println!("Available serial ports:");
    for (index, descriptor) in descriptors.iter().enumerate() {
        println!(
            "{}: {} - {} ({})",
            index, descriptor.device, descriptor.description, descriptor.manufacturer
        );
    }
    Ok(())
}

fn acquire(
    mut settings: Settings,
    port: Option<String>,
    baud: Option<u32>,
    timeout: Option<f64>,
    window: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    if let Some(port) = port {
        settings.port = port;
    }
    if let Some(baud) = baud {
        settings.set_baud_rate(baud)?;
    }
    if let Some(timeout) = timeout {
        settings.set_timeout(timeout)?;
    }
    if let Some(window) = window {
        settings.window_size = window;
    }
    settings.validate()?;

    println!(
        "Acquiring from {} at {} baud...",
        settings.port, settings.baud_rate
    );
    let mut session = SpectrumSession::new(settings);
    session.acquire()?;

    let written = match output {
        Some(path) => {
            session.save_csv(&path)?;
            path
        }
        None => session.save_timestamped()?,
    };

    if let Some(pair) = session.current() {
        print_summary(&pair.raw);
    }
    println!("Saved to {}", written.display());
    Ok(())
}

fn show(settings: Settings, path: &std::path::Path) -> Result<()> {
    let mut session = SpectrumSession::new(settings);
    let pair = session.load_csv(path)?;
    println!("Loaded {} channels from {}", pair.raw.len(), path.display());
    print_summary(&pair.raw);
    Ok(())
}

fn print_summary(raw: &[u32]) {
    let total: u64 = raw.iter().map(|&v| u64::from(v)).sum();
    let peak = raw
        .iter()
        .enumerate()
        .max_by_key(|(_, &v)| v)
        .map(|(i, &v)| (i, v));
    println!("Total counts: {}", total);
    if let Some((channel, counts)) = peak {
        println!("Peak: channel {} with {} counts", channel, counts);
    }
}
