use super::{compile, Address, Config, Opcode, Val};
use crate::error;
use crate::lang::{self, Error};
use crc::crc32;

type Result<T> = std::result::Result<T, Error>;

/// Compile script source. Errors carry the line they were found on.
pub fn compile_program(source: &str, config: &Config) -> Result<Program> {
    Program::compile(source, config)
}

/// ## Compiled program
///
/// The code of a named program together with the CRC-32 of the source
/// it came from, so a cached copy can be checked against the current
/// source without compiling it again.

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    code: Vec<u8>,
    checksum: u32,
}

impl Program {
    pub fn compile(source: &str, config: &Config) -> Result<Program> {
        let code = compile::compile(source, config)?;
        Ok(Program {
            code,
            checksum: Program::checksum_of(source),
        })
    }

    pub fn checksum_of(source: &str) -> u32 {
        crc32::checksum_ieee(source.as_bytes())
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    fn line(&self, f: &mut std::fmt::Formatter, pc: Address) -> Result<Option<Address>> {
        let corrupt = || error!(InvalidOperation; "CORRUPT PROGRAM");
        let op = match self.code.get(pc) {
            Some(byte) => Opcode::from_u8(*byte).ok_or_else(corrupt)?,
            None => return Ok(None),
        };
        let mut next = pc + op.size();
        let text = match op {
            Opcode::If | Opcode::While | Opcode::Goto => {
                let field = self.code.get(pc + 1..pc + 3).ok_or_else(corrupt)?;
                format!("{} {:04X}", op, u16::from_le_bytes([field[0], field[1]]))
            }
            Opcode::Expr => {
                next = lang::skip_block(&self.code, next)?;
                format!("{} [{}]", op, next - pc - 1)
            }
            _ if op.has_target() => {
                let (name, after) = Val::decode(&self.code, next)?;
                next = after;
                format!("{} {}", op, super::text(&name))
            }
            _ => op.to_string(),
        };
        writeln!(f, "{:04X} {}", pc, text).map_err(|_| corrupt())?;
        Ok(Some(next))
    }
}

/// One instruction per line, expression blocks shown by size.
impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut pc = 0;
        loop {
            match self.line(f, pc) {
                Ok(Some(next)) => pc = next,
                Ok(None) => return Ok(()),
                Err(error) => return writeln!(f, "{:04X} {}", pc, error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing() {
        let program = Program::compile("IF A>0 THEN PRINT A END", &Config::default()).unwrap();
        assert_eq!(program.len(), 31);
        assert_eq!(
            program.to_string(),
            "0000 IF 001F\n0003 EXPR [19]\n0017 PRINT\n0018 EXPR [6]\n"
        );
        let program = Program::compile("POP list", &Config::default()).unwrap();
        assert_eq!(program.to_string(), "0000 POP list\n");
    }

    #[test]
    fn test_checksum() {
        let config = Config::default();
        let one = Program::compile("x = 1", &config).unwrap();
        let two = Program::compile("x = 2", &config).unwrap();
        assert_ne!(one.checksum(), two.checksum());
        assert_eq!(one.checksum(), Program::checksum_of("x = 1"));
        assert_eq!(Program::checksum_of("123456789"), 0xCBF4_3926);
    }
}
