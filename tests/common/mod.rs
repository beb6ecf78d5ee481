#![allow(dead_code)]

use calc::lang::{Error, ErrorCode};
use calc::mach::{Config, Event, Host, Runtime, Val};
use std::collections::HashMap;

/// Serves programs from a map and records every event.
#[derive(Default)]
pub struct Recorder {
    pub programs: HashMap<String, String>,
    pub events: Vec<Event>,
}

impl Recorder {
    pub fn with(programs: &[(&str, &str)]) -> Recorder {
        Recorder {
            programs: programs
                .iter()
                .map(|(name, source)| (name.to_string(), source.to_string()))
                .collect(),
            events: vec![],
        }
    }

    /// Announced results as `name = value` pairs.
    pub fn results(&self) -> Vec<(String, Val)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Result(val, name) => Some((name.to_string(), val.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn printed(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Print(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Host for Recorder {
    fn source(&mut self, name: &str) -> Option<String> {
        self.programs.get(&name.to_ascii_lowercase()).cloned()
    }

    fn event(&mut self, event: Event) {
        self.events.push(event);
    }
}

pub fn eval(text: &str) -> Result<Val, Error> {
    Runtime::default().evaluate(text, &mut Recorder::default())
}

pub fn eval_with(config: Config, text: &str) -> Result<Val, Error> {
    Runtime::new(config).evaluate(text, &mut Recorder::default())
}

pub fn error_of(text: &str) -> ErrorCode {
    eval(text).unwrap_err().code()
}

/// Run `source` as program `main` and return its value and output.
pub fn run(source: &str, args: Vec<Val>) -> (Val, Vec<String>) {
    let mut host = Recorder::with(&[("main", source)]);
    let val = Runtime::default().run_program("main", args, &mut host);
    (val, host.printed())
}

pub fn s(text: &str) -> Val {
    Val::Str(text.into())
}
