use ansi_term::Style;
use calc::mach::{format, Config, Event, Host, Program, Runtime};
use linefeed::{Interface, ReadResult};
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

/// Programs are the files named `<name>.calc` in one directory.
/// Results and printed lines wait in `lines` until the caller shows them.
pub struct Console {
    programs: PathBuf,
    config: Config,
    lines: Vec<String>,
}

impl Console {
    pub fn new(programs: PathBuf, config: Config) -> Console {
        Console {
            programs,
            config,
            lines: vec![],
        }
    }

    fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

impl Host for Console {
    fn source(&mut self, name: &str) -> Option<String> {
        if !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return None;
        }
        let path = self.programs.join(format!("{}.calc", name));
        match std::fs::read_to_string(&path) {
            Ok(source) => Some(source),
            Err(error) => {
                debug!("{}: {}", path.display(), error);
                None
            }
        }
    }

    fn event(&mut self, event: Event) {
        let line = match event {
            Event::Result(val, name) => {
                let shown = format(&val, self.config.format, self.config.precision);
                if name.is_empty() {
                    shown
                } else {
                    format!("{} = {}", name, shown)
                }
            }
            Event::Print(line) => line,
        };
        self.lines.push(line);
    }
}

pub fn main(mut runtime: Runtime, mut console: Console) {
    let interrupted = runtime.interrupt_flag();
    if let Err(error) = ctrlc::set_handler(move || {
        interrupted.store(true, Ordering::SeqCst);
    }) {
        warn!("Ctrl-C will not stop programs: {}", error);
    }
    if let Err(error) = main_loop(&mut runtime, &mut console) {
        eprintln!("{}", error);
    }
}

/// Evaluate each expression in turn. False if any failed.
pub fn batch(mut runtime: Runtime, mut console: Console, expressions: &[String]) -> bool {
    let mut ok = true;
    for expression in expressions {
        let result = runtime.evaluate(expression, &mut console);
        for line in console.drain() {
            println!("{}", line);
        }
        if let Err(error) = result {
            eprintln!("{}", Style::new().bold().paint(error.to_string()));
            ok = false;
        }
    }
    ok
}

fn main_loop(runtime: &mut Runtime, console: &mut Console) -> std::io::Result<()> {
    let interface = Interface::new("calc")?;
    interface.set_prompt("> ")?;
    loop {
        let input = match interface.read_line()? {
            ReadResult::Input(input) => input,
            ReadResult::Signal(_) | ReadResult::Eof => break,
        };
        if input.trim().is_empty() {
            continue;
        }
        interface.add_history_unique(input.clone());
        let result = match input.trim().strip_prefix(':') {
            Some(command) => command_line(command, runtime, console),
            None => runtime.evaluate(&input, console).map(|_| ()),
        };
        for line in console.drain() {
            interface.write_fmt(format_args!("  {}\n", line))?;
        }
        if let Err(error) = result {
            interface.write_fmt(format_args!(
                "{}\n",
                Style::new().bold().paint(error.to_string())
            ))?;
        }
    }
    Ok(())
}

/// `:vars`, `:clear` and `:list name`.
fn command_line(
    command: &str,
    runtime: &mut Runtime,
    console: &mut Console,
) -> Result<(), calc::lang::Error> {
    let mut words = command.split_whitespace();
    match (words.next(), words.next()) {
        (Some("vars"), None) => {
            let config = *runtime.config();
            let mut entries: Vec<_> = runtime.vars().entries().collect();
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            for entry in entries {
                let shown = format(&entry.val, config.format, config.precision);
                console.lines.push(format!("{} = {}", entry.name, shown));
            }
        }
        (Some("clear"), None) => runtime.clear_vars(),
        (Some("list"), Some(name)) => {
            let source = match console.source(name) {
                Some(source) => source,
                None => return Err(calc::error!(UnknownFunction)),
            };
            let program = Program::compile(&source, runtime.config())?;
            console.lines.extend(program.to_string().lines().map(String::from));
        }
        _ => return Err(calc::error!(SyntaxError; "TRY :vars, :clear OR :list NAME")),
    }
    Ok(())
}
