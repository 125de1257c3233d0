use anyhow::{bail, Context, Result};

use retropet::RunnerConfig;
use retropet_e0c6s46::{MachineConfig, OpcodeAlignment};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(rom_path) = args.next() else {
        bail!("Usage: retropet <rom> [seconds] [upper|lower]");
    };
    let seconds = args
        .next()
        .map(|arg| arg.parse::<f64>())
        .transpose()
        .context("seconds must be a number")?;
    let alignment = match args.next().as_deref() {
        None | Some("upper") => OpcodeAlignment::UpperBits,
        Some("lower") => OpcodeAlignment::LowerBits,
        Some(other) => bail!("Unknown opcode alignment '{}', expected upper or lower", other),
    };

    log::info!("Loading ROM '{}'", rom_path);
    let rom = std::fs::read(&rom_path)
        .with_context(|| format!("Failed to read ROM '{}'", rom_path))?;

    let machine = MachineConfig::builder().opcode_alignment(alignment).build();
    let config = match seconds {
        Some(seconds) => RunnerConfig::builder().machine(machine).seconds(seconds).build(),
        None => RunnerConfig::builder().machine(machine).build(),
    };
    retropet::run(config, &rom)
}
