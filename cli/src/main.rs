use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod keymap;
mod run;

/// CHIP-8 virtual machine.
///
/// Runs a ROM image in a window; keys 1-4, Q-R, A-F and Z-V map to the
/// hexadecimal pad. Escape or closing the window quits.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Path to the ROM image to run
    rom: PathBuf,

    /// Window scale factor (physical pixels per machine pixel)
    #[arg(long, default_value_t = 10)]
    scale: u32,

    /// Instruction rate in Hz
    #[arg(long, default_value_t = oxid8_core::constants::CLOCK_HZ)]
    clock: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    run::run(&args)
}
