use clap::Parser;

use pocketgb::args::Args;

fn main() {
    let args = Args::parse();

    if let Err(e) = pocketgb::rom_exec(args) {
        eprintln!("fatal: {}", e);
        std::process::exit(1);
    }
}
