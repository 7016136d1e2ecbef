use clap::{Parser, ValueEnum};
use piet_vm::{NonStandardPolicy, Options};
use std::error::Error;
use std::path::PathBuf;

fn parse_codel_size(arg: &str) -> Result<u32, String> {
    let codel_size = arg.parse().map_err(|_| "codel-size must be an integer".to_string())?;
    if codel_size == 0 {
        return Err("codel-size must be non-zero".to_string());
    }
    Ok(codel_size)
}

/// How codels with no exact palette match are treated.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Nonstandard {
    White,
    Black,
}

impl From<Nonstandard> for NonStandardPolicy {
    fn from(value: Nonstandard) -> Self {
        match value {
            Nonstandard::White => NonStandardPolicy::White,
            Nonstandard::Black => NonStandardPolicy::Black,
        }
    }
}

/// Run a Piet program stored as an image.
#[derive(Parser)]
struct Cli {
    /// Path to the program image.
    image: PathBuf,

    /// Side length, in pixels, of one codel.
    #[arg(long, default_value_t = 1, value_parser = parse_codel_size)]
    codel_size: u32,

    /// How to treat codels with no exact palette match.
    #[arg(long, value_enum, default_value = "white")]
    nonstandard: Nonstandard,

    /// Enable trace-level logging (every step).
    #[arg(long)]
    trace: bool,

    /// Enable debug-level logging (slides, bounces, skipped instructions).
    #[arg(long)]
    debug: bool,
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let options = Options {
        codel_size: cli.codel_size,
        nonstandard: cli.nonstandard.into(),
        trace: cli.trace,
        debug: cli.debug,
    };

    let mut builder = env_logger::Builder::new();
    match std::env::var("RUST_LOG") {
        Ok(filter) if !cli.trace && !cli.debug => {
            builder.parse_filters(&filter);
        }
        _ => {
            builder.filter_level(options.log_level());
        }
    }
    builder.init();

    let code = piet_vm::load(&cli.image, &options)?;
    code.execute().run();
    println!();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    match run() {
        Err(e) => Err(e.to_string().into()),
        Ok(_) => Ok(()),
    }
}
