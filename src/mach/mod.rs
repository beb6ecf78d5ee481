/*!
## Rust Machine Module

This Rust module holds the values, the variables and the numeric
operations of the calculator. It also holds the script compiler and
the virtual machine which runs named programs.

*/

pub type Address = usize;

mod arena;
mod compile;
mod config;
mod format;
mod function;
mod link;
mod opcode;
mod operation;
mod program;
mod runtime;
mod stack;
mod val;
mod var;

pub use arena::{Handle, Pool, Source, Stats, HEAP_LIMIT, POOL_SIZE};
pub use config::{Config, Format, Precision};
pub use format::{format, text};
pub use function::Function;
pub use link::Link;
pub use opcode::Opcode;
pub use operation::Operation;
pub use program::{compile_program, Program};
pub use runtime::{Event, Host, Library, Runtime, MAX_DEPTH, MAX_OUTPUT};
pub use stack::Stack;
pub use val::*;
pub use var::{same_value, Entry, Var, MAX_NAME_LEN};
