use super::{format, same_value, Config, Function, Opcode, Program, Val, Var};
use crate::error;
use crate::lang::{self, Error, ErrorCode, Resolve};
use log::{debug, trace, warn};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Result<T> = std::result::Result<T, Error>;

/// Bytes a program may print before it fails with `StdoutFull`.
pub const MAX_OUTPUT: usize = 0x10000;
/// Programs calling programs, counting the outermost one.
pub const MAX_DEPTH: usize = 32;

/// ## Host interface
///
/// The runtime asks the host for program sources and reports
/// everything the user should see as events.

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A value and the variable it is stored in, empty if none.
    Result(Val, Rc<str>),
    /// One line of program output.
    Print(String),
}

pub trait Host {
    /// Source text of the named program.
    fn source(&mut self, name: &str) -> Option<String>;
    fn event(&mut self, event: Event);
}

/// Compiled programs by case insensitive name.
#[derive(Debug, Default)]
pub struct Library {
    programs: HashMap<String, Rc<Program>>,
}

impl Library {
    /// The cached program if it was compiled from this exact source,
    /// otherwise a fresh compile which replaces it.
    pub fn load(&mut self, name: &str, source: &str, config: &Config) -> Result<Rc<Program>> {
        let key = name.to_ascii_lowercase();
        let checksum = Program::checksum_of(source);
        if let Some(program) = self.programs.get(&key) {
            if program.checksum() == checksum {
                debug!("program {} from cache", name);
                return Ok(Rc::clone(program));
            }
        }
        let program = Rc::new(Program::compile(source, config)?);
        debug!(
            "compiled program {} into {} bytes, crc {:08x}",
            name,
            program.len(),
            checksum
        );
        self.programs.insert(key, Rc::clone(&program));
        Ok(program)
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Program>> {
        self.programs.get(&name.to_ascii_lowercase())
    }

    pub fn clear(&mut self) {
        self.programs.clear();
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

/// ## Evaluation context
///
/// Owns the variables of the top level, the compiled programs and the
/// output of the program running now. Each call to `evaluate` is one
/// frame: a value is announced at most once per frame.

pub struct Runtime {
    config: Config,
    vars: Var,
    frame: usize,
    temps: usize,
    library: Library,
    output: String,
    depth: usize,
    interrupted: Arc<AtomicBool>,
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new(Config::default())
    }
}

impl Runtime {
    pub fn new(config: Config) -> Runtime {
        Runtime {
            config,
            vars: Var::new(),
            frame: 0,
            temps: 0,
            library: Library::default(),
            output: String::new(),
            depth: 0,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compiled programs depend on the precision of their literals.
    pub fn set_config(&mut self, config: Config) {
        if config != self.config {
            self.library.clear();
        }
        self.config = config;
    }

    pub fn vars(&self) -> &Var {
        &self.vars
    }

    pub fn clear_vars(&mut self) {
        self.vars.clear();
        self.temps = 0;
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Setting the flag stops the running program at its next jump.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    /// Evaluate the `;` separated expressions of `text`. Returns the
    /// value of the last one.
    pub fn evaluate(&mut self, text: &str, host: &mut dyn Host) -> Result<Val> {
        self.frame += 1;
        let config = self.config;
        let mut last = Val::Void;
        for statement in statements(text) {
            if statement.trim().is_empty() {
                continue;
            }
            let mut session = Session {
                runtime: self,
                host: &mut *host,
                stored: None,
            };
            let val = lang::evaluate(statement, &config, &mut session)?;
            let stored = session.stored;
            self.announce(&val, stored, host)?;
            last = val;
        }
        Ok(last)
    }

    fn announce(&mut self, val: &Val, stored: Option<Rc<str>>, host: &mut dyn Host) -> Result<()> {
        if *val == Val::Void {
            return Ok(());
        }
        if let Some(name) = stored {
            if self.vars.lookup(&name).map_or(false, |held| same_value(held, val)) {
                return Ok(());
            }
        }
        let found = self
            .vars
            .find_by_value(val)
            .map(|entry| (entry.name.clone(), entry.frame));
        let name: Rc<str> = match found {
            Some((_, frame)) if frame == self.frame => return Ok(()),
            Some((name, _)) => name,
            None if is_null(val) => {
                host.event(Event::Result(val.clone(), "".into()));
                return Ok(());
            }
            None => {
                self.temps += 1;
                let name: Rc<str> = format!("${}", self.temps).into();
                self.vars.upsert(&name, val.clone())?;
                name
            }
        };
        self.vars.mark(&name, self.frame);
        host.event(Event::Result(val.clone(), name));
        Ok(())
    }

    /// Run a named program. A program which fails or does not compile
    /// becomes an `Error` value; only a missing source is an error.
    pub fn invoke(&mut self, name: &str, args: Vec<Val>, host: &mut dyn Host) -> Result<Val> {
        let source = host.source(name).ok_or_else(|| error!(UnknownFunction))?;
        let config = self.config;
        let program = match self.library.load(name, &source, &config) {
            Ok(program) => program,
            Err(error) => {
                warn!("program {} does not compile: {}", name, error);
                return Ok(Val::Error(error.code()));
            }
        };
        Ok(self.execute(name, &program, args, host))
    }

    pub fn run_program(&mut self, name: &str, args: Vec<Val>, host: &mut dyn Host) -> Val {
        match self.invoke(name, args, host) {
            Ok(val) => val,
            Err(error) => Val::Error(error.code()),
        }
    }

    fn execute(&mut self, name: &str, program: &Program, args: Vec<Val>, host: &mut dyn Host) -> Val {
        if self.depth >= MAX_DEPTH {
            warn!("program {} nested too deep", name);
            return Val::Error(ErrorCode::CallDepth);
        }
        if self.depth == 0 {
            self.interrupted.store(false, Ordering::SeqCst);
            self.output.clear();
        }
        let mark = self.output.len();
        self.depth += 1;
        let result = Machine::new(self, host, args).and_then(|mut machine| machine.run(program));
        self.depth -= 1;
        match result {
            Ok(val) => {
                if self.depth == 0 {
                    self.flush(host);
                }
                val
            }
            Err(error) => {
                self.output.truncate(mark);
                warn!("program {} failed: {}", name, error);
                Val::Error(error.code())
            }
        }
    }

    fn print(&mut self, val: &Val) -> Result<()> {
        let shown = match val {
            Val::Str(s) => s.to_string(),
            _ => format(val, self.config.format, self.config.precision),
        };
        if self.output.len() + shown.len() > MAX_OUTPUT {
            return Err(error!(StdoutFull));
        }
        self.output.push_str(&shown);
        Ok(())
    }

    fn flush(&mut self, host: &mut dyn Host) {
        let output = std::mem::take(&mut self.output);
        for line in output.lines().filter(|line| !line.is_empty()) {
            host.event(Event::Print(line.to_string()));
        }
    }
}

/// Void, errors and zero are not worth a variable.
fn is_null(val: &Val) -> bool {
    match val {
        Val::Void | Val::Error(_) => true,
        _ => val.num().map_or(false, |n| n.is_zero()),
    }
}

/// Split on `;` outside of string literals.
fn statements(text: &str) -> Vec<&str> {
    let mut found = vec![];
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (index, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(_) if ch == '\\' => escaped = true,
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == ';' => {
                found.push(&text[start..index]);
                start = index + 1;
            }
            None => {}
        }
    }
    found.push(&text[start..]);
    found
}

fn constant_name(name: &str, config: &Config) -> Result<()> {
    match Function::constant(name, config.precision) {
        Some(_) => Err(error!(LValueNotModifiable)),
        None => Ok(()),
    }
}

/// Names seen by a top level expression.
struct Session<'a> {
    runtime: &'a mut Runtime,
    host: &'a mut dyn Host,
    /// Last variable assigned, already announced.
    stored: Option<Rc<str>>,
}

impl Resolve for Session<'_> {
    fn fetch(&mut self, name: &str) -> Result<Val> {
        let precision = self.runtime.config.precision;
        match Function::constant(name, precision) {
            Some(val) => Ok(val),
            None => Ok(self.runtime.vars.fetch(name, precision)),
        }
    }

    fn store(&mut self, name: &str, val: &Val) -> Result<()> {
        let runtime = &mut *self.runtime;
        constant_name(name, &runtime.config)?;
        runtime.vars.upsert(name, val.clone())?;
        runtime.vars.mark(name, runtime.frame);
        if let Some(n) = name.strip_prefix('$').and_then(|n| n.parse::<usize>().ok()) {
            runtime.temps = runtime.temps.max(n);
        }
        let shown = match runtime.vars.entry(name) {
            Some(entry) => entry.name.clone(),
            None => name.into(),
        };
        self.host.event(Event::Result(val.clone(), shown.clone()));
        self.stored = Some(shown);
        Ok(())
    }

    fn call(&mut self, name: &str, args: Vec<Val>) -> Result<Val> {
        if let Some(result) = Function::call(name, &args, self.runtime.config.precision) {
            return result;
        }
        self.runtime.invoke(name, args, &mut *self.host)
    }
}

enum Capture {
    Print,
    Return,
    Array(Opcode, Rc<str>),
}

fn corrupt() -> Error {
    error!(InvalidOperation; "CORRUPT PROGRAM")
}

fn read_u16(code: &[u8], pc: usize) -> Result<usize> {
    match code.get(pc..pc + 2) {
        Some(bytes) => Ok(u16::from_le_bytes([bytes[0], bytes[1]]) as usize),
        None => Err(corrupt()),
    }
}

fn target(code: &[u8], pc: usize) -> Result<(Rc<str>, usize)> {
    match Val::decode(code, pc)? {
        (Val::Ident(name), next) => Ok((name, next)),
        _ => Err(corrupt()),
    }
}

/// ## Program machine
///
/// Runs one program with its own variables. `ARGV` holds the
/// arguments it was called with.

struct Machine<'a> {
    runtime: &'a mut Runtime,
    host: &'a mut dyn Host,
    config: Config,
    locals: Var,
}

impl<'a> Machine<'a> {
    fn new(runtime: &'a mut Runtime, host: &'a mut dyn Host, args: Vec<Val>) -> Result<Machine<'a>> {
        let mut locals = Var::new();
        locals.upsert("ARGV", Val::Array(Rc::new(args)))?;
        Ok(Machine {
            config: runtime.config,
            runtime,
            host,
            locals,
        })
    }

    fn interrupted(&self) -> Result<()> {
        if self.runtime.interrupted.load(Ordering::SeqCst) {
            Err(error!(Interrupted))
        } else {
            Ok(())
        }
    }

    fn replay(&mut self, code: &[u8], pc: usize) -> Result<(Val, usize)> {
        let config = self.config;
        lang::replay(code, pc, &config, self)
    }

    fn run(&mut self, program: &Program) -> Result<Val> {
        let code = program.code();
        let mut pc = 0;
        let mut capture = None;
        while let Some(&byte) = code.get(pc) {
            let op = Opcode::from_u8(byte).ok_or_else(corrupt)?;
            trace!("{:04X} {}", pc, op);
            match op {
                Opcode::If => {
                    self.interrupted()?;
                    let target = read_u16(code, pc + 1)?;
                    if code.get(pc + 3) != Some(&(Opcode::Expr as u8)) {
                        return Err(corrupt());
                    }
                    let (val, next) = self.replay(code, pc + 4)?;
                    pc = if val.is_truthy() { next } else { target };
                }
                Opcode::Goto => {
                    self.interrupted()?;
                    pc = read_u16(code, pc + 1)?;
                }
                Opcode::Exit => break,
                Opcode::Return => {
                    capture = Some(Capture::Return);
                    pc += 1;
                }
                Opcode::Print => {
                    capture = Some(Capture::Print);
                    pc += 1;
                }
                Opcode::Push | Opcode::Unshift | Opcode::Redim => {
                    let (name, next) = target(code, pc + 1)?;
                    capture = Some(Capture::Array(op, name));
                    pc = next;
                }
                Opcode::Pop | Opcode::Shift => {
                    let (name, next) = target(code, pc + 1)?;
                    self.array(op, &name, Val::Void)?;
                    pc = next;
                }
                Opcode::Expr => {
                    let (val, next) = self.replay(code, pc + 1)?;
                    pc = next;
                    match capture.take() {
                        None => {}
                        Some(Capture::Print) => self.runtime.print(&val)?,
                        Some(Capture::Return) => return Ok(val),
                        Some(Capture::Array(op, name)) => self.array(op, &name, val)?,
                    }
                }
                Opcode::While => return Err(corrupt()),
            }
        }
        Ok(Val::Void)
    }

    /// A variable which does not hold an array starts as an empty one.
    fn array(&mut self, op: Opcode, name: &str, val: Val) -> Result<()> {
        if !matches!(self.locals.lookup(name), Some(Val::Array(_))) {
            self.locals.upsert(name, Val::Array(Rc::new(vec![])))?;
        }
        let items = match self.locals.lookup_mut(name) {
            Some(Val::Array(items)) => Rc::make_mut(items),
            _ => return Err(corrupt()),
        };
        match op {
            Opcode::Push => items.push(val),
            Opcode::Unshift => items.insert(0, val),
            Opcode::Pop => {
                items.pop().ok_or_else(|| error!(IndexOutOfRange))?;
            }
            Opcode::Shift => {
                if items.is_empty() {
                    return Err(error!(IndexOutOfRange));
                }
                items.remove(0);
            }
            Opcode::Redim => {
                let size = val
                    .num()
                    .map(|n| n.as_i64())
                    .ok_or_else(|| error!(InvalidOperation))?;
                if size < 0 || size > u16::max_value() as i64 {
                    return Err(error!(InvalidOperation; "ARRAY SIZE OUT OF RANGE"));
                }
                items.resize(size as usize, Val::int(0, self.config.precision));
            }
            _ => return Err(corrupt()),
        }
        Ok(())
    }
}

impl Resolve for Machine<'_> {
    fn fetch(&mut self, name: &str) -> Result<Val> {
        let precision = self.config.precision;
        match Function::constant(name, precision) {
            Some(val) => Ok(val),
            None => Ok(self.locals.fetch(name, precision)),
        }
    }

    fn store(&mut self, name: &str, val: &Val) -> Result<()> {
        constant_name(name, &self.config)?;
        self.locals.upsert(name, val.clone())
    }

    fn call(&mut self, name: &str, args: Vec<Val>) -> Result<Val> {
        if let Some(result) = Function::call(name, &args, self.config.precision) {
            return result;
        }
        self.runtime.invoke(name, args, &mut *self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl Host for Recorder {
        fn source(&mut self, name: &str) -> Option<String> {
            match name.to_ascii_lowercase().as_str() {
                "twice" => Some("RETURN ARGV[0] * 2".to_string()),
                "hello" => Some("PRINT \"hi\\n\"; PRINT ARGV".to_string()),
                _ => None,
            }
        }
        fn event(&mut self, event: Event) {
            self.events.push(event);
        }
    }

    #[test]
    fn test_statements() {
        assert_eq!(statements("a;b"), vec!["a", "b"]);
        assert_eq!(statements("'x;y';\"\\\";\""), vec!["'x;y'", "\"\\\";\""]);
        assert_eq!(statements(""), vec![""]);
    }

    #[test]
    fn test_cache() {
        let mut runtime = Runtime::default();
        let mut host = Recorder::default();
        assert_eq!(
            runtime.run_program("Twice", vec![Val::Int(4)], &mut host),
            Val::Int(8)
        );
        let checksum = runtime.library().get("twice").unwrap().checksum();
        assert_eq!(checksum, Program::checksum_of("RETURN ARGV[0] * 2"));
        runtime.run_program("twice", vec![Val::Int(1)], &mut host);
        assert_eq!(runtime.library().len(), 1);
        runtime.set_config(Config {
            precision: crate::mach::Precision::Bits32,
            ..Config::default()
        });
        assert!(runtime.library().is_empty());
    }

    #[test]
    fn test_output() {
        let mut runtime = Runtime::default();
        let mut host = Recorder::default();
        runtime.run_program("hello", vec![Val::Int(1)], &mut host);
        assert_eq!(
            host.events,
            vec![Event::Print("hi".into()), Event::Print("[1]".into())]
        );
        assert_eq!(
            runtime.run_program("missing", vec![], &mut host),
            Val::Error(ErrorCode::UnknownFunction)
        );
    }
}
