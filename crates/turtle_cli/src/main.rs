//! Thin entry point over the `turtle_asm`/`turtle_core` libraries: `assemble`,
//! `simulate`, and `run` subcommands.

#[macro_use]
extern crate log;

mod config;

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use config::{Config, ConfigError};

#[derive(Debug)]
enum CliError {
    Usage(String),
    Io(std::io::Error),
    Assemble(turtle_asm::Error),
    Simulate(turtle_core::SimulationError),
    Config(ConfigError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "{err}"),
            CliError::Assemble(err) => write!(f, "{err}"),
            CliError::Simulate(err) => write!(f, "{err}"),
            CliError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<turtle_asm::Error> for CliError {
    fn from(err: turtle_asm::Error) -> Self {
        CliError::Assemble(err)
    }
}

impl From<turtle_core::SimulationError> for CliError {
    fn from(err: turtle_core::SimulationError) -> Self {
        CliError::Simulate(err)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err)
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), CliError> {
    let (command, rest) = args
        .split_first()
        .ok_or_else(|| CliError::Usage(usage()))?;

    match command.as_str() {
        "assemble" => assemble_command(rest),
        "simulate" => simulate_command(rest),
        "run" => run_command(rest),
        other => Err(CliError::Usage(format!("unknown subcommand '{other}'\n{}", usage()))),
    }
}

fn usage() -> String {
    "usage:\n\
     \  turtle assemble <input.asm> [-o out.bin] [-l length]\n\
     \  turtle simulate <input.bin> [-m max_cycles]\n\
     \  turtle run <input.asm> [-m max_cycles]"
        .to_string()
}

struct Flags {
    input: PathBuf,
    output: Option<PathBuf>,
    length: Option<usize>,
    max_cycles: Option<u64>,
}

fn parse_flags(args: &[String]) -> Result<Flags, CliError> {
    let (input, rest) = args
        .split_first()
        .ok_or_else(|| CliError::Usage(usage()))?;

    let mut output = None;
    let mut length = None;
    let mut max_cycles = None;

    let mut iter = rest.iter();
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "-o" => {
                let value = iter.next().ok_or_else(|| CliError::Usage("-o requires a path".into()))?;
                output = Some(PathBuf::from(value));
            }
            "-l" => {
                let value = iter.next().ok_or_else(|| CliError::Usage("-l requires a length".into()))?;
                length = Some(value.parse().map_err(|_| CliError::Usage(format!("invalid length '{value}'")))?);
            }
            "-m" => {
                let value = iter.next().ok_or_else(|| CliError::Usage("-m requires a cycle count".into()))?;
                max_cycles = Some(value.parse().map_err(|_| CliError::Usage(format!("invalid max_cycles '{value}'")))?);
            }
            other => return Err(CliError::Usage(format!("unrecognized flag '{other}'"))),
        }
    }

    Ok(Flags { input: PathBuf::from(input), output, length, max_cycles })
}

fn load_config() -> Result<Config, CliError> {
    Ok(Config::load(Path::new("turtle.toml"))?)
}

fn assemble_command(args: &[String]) -> Result<(), CliError> {
    let flags = parse_flags(args)?;
    let source = std::fs::read_to_string(&flags.input)?;
    let image = match flags.length {
        Some(length) => turtle_asm::assemble_padded(&source, length)?,
        None => turtle_asm::assemble(&source)?,
    };

    let output_path = flags.output.unwrap_or_else(|| flags.input.with_extension("bin"));
    std::fs::write(&output_path, &image)?;
    println!("assembled {} bytes to {}", image.len(), output_path.display());
    Ok(())
}

fn simulate_command(args: &[String]) -> Result<(), CliError> {
    let flags = parse_flags(args)?;
    let image = std::fs::read(&flags.input)?;
    let config = load_config()?;
    let mut sim = build_simulator(&config);
    sim.load_binary(&image);
    simulate_and_report(&mut sim, flags.max_cycles)
}

fn run_command(args: &[String]) -> Result<(), CliError> {
    let flags = parse_flags(args)?;
    let source = std::fs::read_to_string(&flags.input)?;
    let image = turtle_asm::assemble(&source)?;
    let config = load_config()?;
    let mut sim = build_simulator(&config);
    sim.load_binary(&image);
    simulate_and_report(&mut sim, flags.max_cycles)
}

fn build_simulator(config: &Config) -> turtle_core::Simulator {
    turtle_core::Simulator::new(config.instruction_fetch_latency_cycles, config.data_memory_latency_cycles)
}

fn simulate_and_report(sim: &mut turtle_core::Simulator, max_cycles: Option<u64>) -> Result<(), CliError> {
    sim.run_until_halt(max_cycles)?;
    info!("halted after {} cycles", sim.cycle_count());
    println!("ACC = 0x{:02x}", sim.registers().get_acc().unsigned());
    println!("cycles = {}", sim.cycle_count());
    Ok(())
}
