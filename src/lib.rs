pub mod apu;
pub mod args;
pub mod bus;
pub mod cartridge;
pub mod constants;
pub mod cpu;
pub mod dma;
pub mod emulator;
pub mod error;
pub mod interrupts;
pub mod io;
pub mod ppu;
pub mod registers;
pub mod timer;

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use log::info;

use crate::cartridge::Cartridge;
use crate::constants::FRAME_DURATION;
use crate::emulator::Emulator;
use crate::error::CoreError;

pub fn setup_logging(log_path: &Option<PathBuf>) -> Result<(), std::io::Error> {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    builder.format(|buf, record| writeln!(buf, "{}", record.args()));

    // If a path is provided, redirect output to the file.
    if let Some(path) = log_path {
        let file = fs::File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

/// Loads the ROM named by the arguments and emulates it. Returns when
/// the frame cap is reached or a fatal core error surfaces; otherwise
/// runs until killed.
pub fn rom_exec(args: args::Args) -> Result<(), Box<dyn std::error::Error>> {
    setup_logging(&args.log_path)?;

    let rom = cartridge::load_rom(&args.load_rom)?;
    let save_ram = match &args.save_ram {
        Some(path) if path.exists() => Some(fs::read(path)?),
        _ => None,
    };

    let cart = Cartridge::new(rom, save_ram)?;
    info!("running '{}'", cart.header.title);

    let mut emulator = Emulator::new(cart);
    main_loop(&mut emulator, args.frames)?;

    if let Some(path) = &args.save_ram {
        fs::write(path, emulator.battery_ram())?;
        info!("battery RAM written to {}", path.display());
    }
    Ok(())
}

/// Renders frames forever, or up to `frames`, sleeping between frames
/// to hold original hardware speed.
fn main_loop(emulator: &mut Emulator, frames: Option<u64>) -> Result<(), CoreError> {
    let mut rendered: u64 = 0;
    let mut last_frame_time = Instant::now();

    loop {
        emulator.run_frame()?;
        rendered += 1;

        if let Some(cap) = frames {
            if rendered >= cap {
                info!(
                    "{} frames, {} machine cycles",
                    rendered,
                    emulator.elapsed_m_cycles()
                );
                return Ok(());
            }
        }

        let elapsed = last_frame_time.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
        last_frame_time = Instant::now();
    }
}
