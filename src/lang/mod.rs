/*!
# Rust Language Module

This Rust module provides lexical analysis of calculator expressions,
the unit tables, and the shunting-yard parser which either evaluates
an expression or serializes it into an expression block for a program.

*/

pub type LineNumber = Option<usize>;
pub type Column = std::ops::Range<usize>;

#[macro_use]
mod error;
mod lex;
mod parse;
mod token;
mod unit;

pub use error::Error;
pub use error::ErrorCode;
pub use lex::parse_number;
pub use lex::Lexer;
pub use parse::{compile, evaluate, replay, skip_block, Resolve};
pub use token::{Assoc, Op, Operator, Token};
pub use unit::{Category, DefaultUnits, Scale, Unit, UnitId};

/// Words which end an expression when compiling a program.
pub fn is_keyword(word: &str) -> bool {
    const KEYWORDS: [&str; 18] = [
        "IF", "THEN", "ELSE", "ELSEIF", "END", "WHILE", "DO", "BREAK", "CONTINUE", "GOTO",
        "RETURN", "EXIT", "PRINT", "REDIM", "PUSH", "POP", "SHIFT", "UNSHIFT",
    ];
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}
