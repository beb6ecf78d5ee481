//! # Calc
//!
//! Calculator with units of measure and named programs.
//!

mod term;

use calc::lang::{Category, DefaultUnits};
use calc::mach::{Config, Format, Precision, Runtime};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "calc")]
#[command(version)]
#[command(about = "Calculator with units of measure and named programs", long_about = None)]
struct Args {
    /// Expressions to evaluate instead of starting a session
    expressions: Vec<String>,

    /// 32 bit integers and floats
    #[arg(long)]
    bits32: bool,

    /// Number display: auto, dec, hex, oct or bin
    #[arg(short, long, default_value = "auto")]
    format: Format,

    #[arg(long)]
    distance: Option<String>,

    #[arg(long)]
    temperature: Option<String>,

    #[arg(long)]
    mass: Option<String>,

    #[arg(long)]
    angle: Option<String>,

    /// Directory holding <name>.calc programs
    #[arg(short, long, default_value = ".")]
    programs: PathBuf,
}

impl Args {
    fn config(&self) -> Result<Config, String> {
        let mut units = DefaultUnits::default();
        for (category, suffix) in [
            (Category::Distance, &self.distance),
            (Category::Temperature, &self.temperature),
            (Category::Mass, &self.mass),
            (Category::Angle, &self.angle),
        ]
        .iter()
        {
            if let Some(suffix) = suffix {
                let known = category
                    .units()
                    .iter()
                    .any(|unit| unit.suffix.eq_ignore_ascii_case(suffix));
                if !known || !units.set(suffix) {
                    return Err(format!("unknown {:?} unit '{}'", category, suffix));
                }
            }
        }
        Ok(Config {
            precision: if self.bits32 {
                Precision::Bits32
            } else {
                Precision::Bits64
            },
            format: self.format,
            units,
        })
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let config = match args.config() {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{}", msg);
            std::process::exit(2);
        }
    };
    let runtime = Runtime::new(config);
    let console = term::Console::new(args.programs.clone(), config);
    if args.expressions.is_empty() {
        term::main(runtime, console);
    } else if !term::batch(runtime, console, &args.expressions) {
        std::process::exit(1);
    }
}
