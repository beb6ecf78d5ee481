use crate::lang::DefaultUnits;

/// Width of integers and floats produced by the lexer and by
/// logical or comparison results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Bits64,
    Bits32,
}

/// ## Display modes
///
/// `Auto` renders strings as quoted C strings. The others render
/// integers in their radix and strings as arrays of character codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Auto,
    Dec,
    Hex,
    Oct,
    Bin,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Format, String> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "default" => Ok(Format::Auto),
            "dec" => Ok(Format::Dec),
            "hex" => Ok(Format::Hex),
            "oct" => Ok(Format::Oct),
            "bin" => Ok(Format::Bin),
            _ => Err(format!("unknown display mode '{}'", s)),
        }
    }
}

/// ## Evaluation context settings

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub precision: Precision,
    pub format: Format,
    pub units: DefaultUnits,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            precision: Precision::Bits64,
            format: Format::Auto,
            units: DefaultUnits::default(),
        }
    }
}
