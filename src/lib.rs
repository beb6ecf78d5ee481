//! # Calc Script
//!
//! The expression evaluator and script machine of a desktop calculator.
//!
//! Run the `calc` executable for an interactive session, or pass
//! expressions on the command line to evaluate them in order.
//! ```text
//! $ calc "100cm + 1ft" "x = 2 * pi"
//! $1 = 1.3048m
//! x = 6.283185307179586
//! ```
//!
//! The library exposes the same machinery. A [`mach::Runtime`] holds the
//! variables and compiled programs; the caller implements [`mach::Host`]
//! to supply program sources and receive results.
//! ```
//! use calc::mach::{Event, Host, Runtime, Val};
//!
//! struct Quiet;
//! impl Host for Quiet {
//!     fn source(&mut self, _name: &str) -> Option<String> { None }
//!     fn event(&mut self, _event: Event) {}
//! }
//!
//! let mut runtime = Runtime::default();
//! let val = runtime.evaluate("2 + 3 * 4", &mut Quiet).unwrap();
//! assert_eq!(val, Val::Int(14));
//! ```

#[path = "doc/introduction.rs"]
#[allow(non_snake_case)]
pub mod _Introduction;

#[path = "doc/chapter_1.rs"]
#[allow(non_snake_case)]
pub mod __Chapter_1;

#[path = "doc/chapter_2.rs"]
#[allow(non_snake_case)]
pub mod __Chapter_2;

#[path = "doc/appendix_a.rs"]
#[allow(non_snake_case)]
pub mod ___Appendix_A;

pub mod lang;
pub mod mach;
