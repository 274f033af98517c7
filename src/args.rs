use std::path::PathBuf;

use clap::Parser;

/// Headless Game Boy emulator core.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the ROM image (.gb or .gbc).
    #[arg(long)]
    pub load_rom: PathBuf,

    // Optional log path, if none given, logs go to stdout.
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// Stop after this many frames instead of running forever.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Battery RAM file: loaded on start, written back on exit.
    #[arg(long)]
    pub save_ram: Option<PathBuf>,
}
