use super::{Address, Config, Link, Opcode, Stack, Val};
use crate::error;
use crate::lang::{self, Error};

type Result<T> = std::result::Result<T, Error>;

/// Largest program, every address has to fit 16 bits.
const MAX_CODE: usize = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Word {
    If,
    Then,
    Else,
    End,
    ElseIf,
    While,
    Do,
    Break,
    Continue,
    Goto,
    Return,
    Exit,
    Print,
    Redim,
    Push,
    Pop,
    Shift,
    Unshift,
    /// Expression starting a line.
    Expr,
    /// Expression following something else on its line.
    ImmExpr,
    /// Any statement of the top level.
    Any,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    None,
    /// Open a nested block.
    Push,
    /// Close the innermost block.
    Pop,
    /// Enter an `ELSEIF` or `ELSE` branch.
    Accept,
    /// Commit the next rule as the place to come back to.
    SetDefault,
    /// Back to the default rule of the block.
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Jump {
    Next(usize),
    Back(usize),
    Fail,
}

struct Rule {
    word: Word,
    action: Action,
    matched: Jump,
    failed: Jump,
}

macro_rules! rule {
    ($word:ident, $action:ident, $matched:expr, $failed:expr) => {
        Rule {
            word: Word::$word,
            action: Action::$action,
            matched: $matched,
            failed: $failed,
        }
    };
}

use Jump::{Back, Fail, Next};

/// ## Statement grammar
///
/// Each rule is tried against the current word. On a match its action
/// runs and the rule index moves by `matched`, otherwise the next rule
/// to try is `failed` away. The rules chained from index 0 by their
/// failure jumps are the top level statements; an `Any` rule matches
/// whatever they do.

static GRAMMAR: [Rule; 41] = [
    // IF cond THEN ... ELSEIF cond THEN ... ELSE ... END
    rule!(If, Push, Next(1), Next(14)),
    rule!(ImmExpr, None, Next(1), Fail),
    rule!(Then, SetDefault, Next(1), Fail),
    rule!(Any, Restart, Next(0), Next(1)),
    rule!(ElseIf, None, Next(1), Next(6)),
    rule!(ImmExpr, None, Next(1), Fail),
    rule!(Then, Accept, Next(1), Fail),
    rule!(Any, Restart, Next(0), Next(1)),
    rule!(ElseIf, None, Back(3), Next(1)),
    rule!(Else, Accept, Next(2), Next(3)),
    rule!(Else, Accept, Next(1), Next(3)),
    rule!(Any, Restart, Next(0), Next(1)),
    rule!(End, Pop, Next(0), Fail),
    rule!(End, Pop, Next(0), Fail),
    // WHILE cond DO ... END
    rule!(While, Push, Next(1), Next(5)),
    rule!(ImmExpr, None, Next(1), Fail),
    rule!(Do, SetDefault, Next(1), Fail),
    rule!(Any, None, Next(0), Next(1)),
    rule!(End, Pop, Next(0), Fail),
    // single words
    rule!(Continue, Restart, Next(0), Next(1)),
    rule!(Break, Restart, Next(0), Next(1)),
    rule!(Goto, Restart, Next(0), Next(1)),
    rule!(Exit, Restart, Next(0), Next(1)),
    // statements taking an expression or a variable
    rule!(Print, None, Next(1), Next(2)),
    rule!(ImmExpr, Restart, Next(0), Fail),
    rule!(Return, None, Next(1), Next(2)),
    rule!(ImmExpr, Restart, Next(0), Fail),
    rule!(Pop, None, Next(1), Next(2)),
    rule!(Var, Restart, Next(0), Fail),
    rule!(Shift, None, Next(1), Next(2)),
    rule!(Var, Restart, Next(0), Fail),
    rule!(Push, None, Next(1), Next(3)),
    rule!(Var, None, Next(1), Fail),
    rule!(ImmExpr, Restart, Next(0), Fail),
    rule!(Redim, None, Next(1), Next(3)),
    rule!(Var, None, Next(1), Fail),
    rule!(ImmExpr, Restart, Next(0), Fail),
    rule!(Unshift, None, Next(1), Next(3)),
    rule!(Var, None, Next(1), Fail),
    rule!(ImmExpr, Restart, Next(0), Fail),
    // a plain expression
    rule!(Expr, Restart, Next(0), Fail),
];

static KEYWORDS: [(&str, Word); 18] = [
    ("IF", Word::If),
    ("THEN", Word::Then),
    ("ELSE", Word::Else),
    ("ELSEIF", Word::ElseIf),
    ("END", Word::End),
    ("WHILE", Word::While),
    ("DO", Word::Do),
    ("BREAK", Word::Break),
    ("CONTINUE", Word::Continue),
    ("GOTO", Word::Goto),
    ("RETURN", Word::Return),
    ("EXIT", Word::Exit),
    ("PRINT", Word::Print),
    ("REDIM", Word::Redim),
    ("PUSH", Word::Push),
    ("POP", Word::Pop),
    ("SHIFT", Word::Shift),
    ("UNSHIFT", Word::Unshift),
];

fn follow(index: usize, jump: Jump) -> Option<usize> {
    match jump {
        Next(n) => Some(index + n),
        Back(n) => index.checked_sub(n),
        Fail => None,
    }
}

/// Walk the top level chain looking for `word`.
fn top_level(word: Word) -> Option<(usize, Word)> {
    let mut index = 0;
    loop {
        let rule = GRAMMAR.get(index)?;
        if rule.word == word {
            return Some((index, word));
        }
        if rule.word == Word::Expr && word == Word::ImmExpr {
            return Some((index, Word::Expr));
        }
        index = follow(index, rule.failed)?;
    }
}

fn corrupt() -> Error {
    error!(InvalidOperation; "GRAMMAR FAILURE")
}

fn address(pc: Address) -> Result<u16> {
    if pc > MAX_CODE {
        Err(error!(NoMem; "PROGRAM TOO LARGE"))
    } else {
        Ok(pc as u16)
    }
}

/// Point the jump instruction at `at` to `target`.
fn patch(code: &mut [u8], at: Address, target: Address) -> Result<()> {
    let target = address(target)?;
    match code.get_mut(at + 1..at + 3) {
        Some(field) => {
            field.copy_from_slice(&target.to_le_bytes());
            Ok(())
        }
        None => Err(corrupt()),
    }
}

/// An `IF` or `WHILE` being compiled. The root block holds the top
/// level statements and has no condition.
#[derive(Debug)]
struct Block {
    grammar: usize,
    default: usize,
    /// The conditional jump still waiting for its target.
    cond: Option<Address>,
    /// Jumps from the end of each branch over the others.
    exits: Vec<Address>,
    breaks: Vec<Address>,
    line: usize,
    /// A statement followed `THEN`, `ELSE` or `DO` on the same line.
    pending_end: bool,
    is_loop: bool,
}

impl Block {
    fn new(grammar: usize, cond: Option<Address>, line: usize, is_loop: bool) -> Block {
        Block {
            grammar,
            default: grammar,
            cond,
            exits: vec![],
            breaks: vec![],
            line,
            pending_end: false,
            is_loop,
        }
    }

    fn in_statement(&self) -> bool {
        self.grammar != self.default
    }
}

struct Match {
    index: usize,
    word: Word,
    any: bool,
}

/// ## Program compiler
///
/// Converts source text into program code. Statements are separated by
/// new lines or `;`, and `#` starts a comment. Every error carries the
/// line it was found on.

pub fn compile(source: &str, config: &Config) -> Result<Vec<u8>> {
    let mut compiler = Compiler::new(source, config);
    compiler.run()?;
    Ok(compiler.code)
}

struct Compiler<'a> {
    src: &'a str,
    config: &'a Config,
    pos: usize,
    line: usize,
    start_line: usize,
    code: Vec<u8>,
    link: Link,
    blocks: Stack<Block>,
    last_word: Option<Word>,
}

impl<'a> Compiler<'a> {
    fn new(src: &'a str, config: &'a Config) -> Compiler<'a> {
        Compiler {
            src,
            config,
            pos: 0,
            line: 1,
            start_line: 1,
            code: vec![],
            link: Link::new(),
            blocks: Stack::with_limit("BLOCKS NESTED TOO DEEP", 256),
            last_word: None,
        }
    }

    fn run(&mut self) -> Result<()> {
        self.blocks.push(Block::new(0, None, 0, false))?;
        loop {
            self.skip_blank();
            if self.pos >= self.src.len() {
                break;
            }
            self.start_line = self.line;
            if let Err(error) = self.statement() {
                return Err(error.in_line_number(Some(self.start_line)));
            }
            if self.code.len() > MAX_CODE {
                return Err(error!(NoMem, Some(self.start_line)));
            }
        }
        self.finish()
    }

    fn skip_blank(&mut self) {
        let bytes = self.src.as_bytes();
        while let Some(&ch) = bytes.get(self.pos) {
            match ch {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b'#' => {
                    while bytes.get(self.pos).map_or(false, |&c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                b';' => self.pos += 1,
                _ if ch.is_ascii_whitespace() => self.pos += 1,
                _ => break,
            }
        }
    }

    fn advance(&mut self, to: usize) {
        let lines = self.src[self.pos..to].bytes().filter(|&c| c == b'\n').count();
        self.line += lines;
        self.pos = to;
    }

    fn top(&self) -> Result<&Block> {
        self.blocks.last().ok_or_else(corrupt)
    }

    fn top_mut(&mut self) -> Result<&mut Block> {
        self.blocks.last_mut().ok_or_else(corrupt)
    }

    fn statement(&mut self) -> Result<()> {
        if self.close_one_liner()? || self.label()? {
            return Ok(());
        }
        let word = match self.keyword() {
            Some((word, end)) => {
                self.advance(end);
                word
            }
            None if GRAMMAR[self.top()?.grammar].word == Word::Var => self.variable()?,
            None => self.expression()?,
        };
        self.accept(word)
    }

    /// `IF x THEN y` on one line needs no `END`. It is supplied
    /// before the first statement on a later line.
    fn close_one_liner(&mut self) -> Result<bool> {
        let top = self.top()?;
        if self.blocks.len() < 2
            || !top.pending_end
            || top.in_statement()
            || self.line <= top.line
        {
            return Ok(false);
        }
        if let Some((word, _)) = self.keyword() {
            if matches!(word, Word::End | Word::Else | Word::ElseIf) {
                return Ok(false);
            }
        }
        self.close()?;
        self.last_word = Some(Word::End);
        Ok(true)
    }

    fn label(&mut self) -> Result<bool> {
        let src = self.src;
        let rest = &src[self.pos..];
        let len = rest.bytes().take_while(|c| c.is_ascii_alphabetic()).count();
        if len == 0 || rest.as_bytes().get(len) != Some(&b':') {
            return Ok(false);
        }
        self.link
            .define(&rest[..len], self.code.len(), Some(self.line))?;
        self.pos += len + 1;
        self.last_word = None;
        Ok(true)
    }

    fn keyword(&self) -> Option<(Word, usize)> {
        let rest = &self.src[self.pos..];
        let len = rest
            .bytes()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == b'_')
            .count();
        let word = KEYWORDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&rest[..len]))?
            .1;
        Some((word, self.pos + len))
    }

    /// Target of an array statement, with an optional `,` after it.
    fn variable(&mut self) -> Result<Word> {
        let src = self.src;
        let rest = &src[self.pos..];
        let bytes = rest.as_bytes();
        match bytes.first() {
            Some(c) if c.is_ascii_alphabetic() || *c == b'_' || *c == b'$' => {}
            _ => return Err(error!(SyntaxError)),
        }
        let len = 1 + bytes[1..]
            .iter()
            .take_while(|c| c.is_ascii_alphanumeric() || **c == b'_')
            .count();
        Val::Ident(rest[..len].into()).encode(&mut self.code)?;
        let after = &rest[len..];
        let blank = after.len() - after.trim_start_matches(|c: char| c == ' ' || c == '\t').len();
        let end = if after[blank..].starts_with(',') {
            len + blank + 1
        } else {
            len
        };
        self.pos += end;
        Ok(Word::Var)
    }

    /// Last character before the current position on the same line.
    fn previous_char(&self) -> Option<u8> {
        self.src.as_bytes()[..self.pos]
            .iter()
            .rev()
            .find(|&&c| c == b'\n' || !c.is_ascii_whitespace())
            .filter(|&&c| c != b'\n')
            .copied()
    }

    fn expression(&mut self) -> Result<Word> {
        let previous = self.previous_char();
        if let Some(ch) = previous {
            let after_expr = matches!(self.last_word, Some(Word::Expr) | Some(Word::ImmExpr));
            if after_expr && ch != b';' {
                return Err(error!(MissingSeparator));
            }
        }
        self.code.push(Opcode::Expr as u8);
        let used = lang::compile(&self.src[self.pos..], self.config, &mut self.code)?;
        self.advance(self.pos + used);
        Ok(match previous {
            Some(_) => Word::ImmExpr,
            None => Word::Expr,
        })
    }

    fn find(&self, word: Word) -> Result<Match> {
        let mut index = self.top()?.grammar;
        loop {
            let rule = GRAMMAR.get(index).ok_or_else(corrupt)?;
            if rule.word == word {
                return Ok(Match {
                    index,
                    word,
                    any: false,
                });
            }
            if rule.word == Word::Any {
                if let Some((index, word)) = top_level(word) {
                    return Ok(Match {
                        index,
                        word,
                        any: true,
                    });
                }
            }
            if rule.word == Word::Expr && word == Word::ImmExpr {
                return Ok(Match {
                    index,
                    word: Word::Expr,
                    any: false,
                });
            }
            index = follow(index, rule.failed).ok_or_else(|| error!(SyntaxError))?;
        }
    }

    fn accept(&mut self, word: Word) -> Result<()> {
        let found = self.find(word)?;
        let at = self.code.len();
        self.emit(found.word)?;
        self.last_word = Some(found.word);
        if found.any && self.blocks.len() > 1 {
            let line = self.start_line;
            let top = self.top_mut()?;
            if top.line == line {
                top.pending_end = true;
            }
        }
        self.apply(found.index, at)
    }

    fn emit(&mut self, word: Word) -> Result<()> {
        match word {
            Word::If => self.code.extend_from_slice(&[Opcode::If as u8, 0, 0]),
            Word::While => self.code.extend_from_slice(&[Opcode::While as u8, 0, 0]),
            Word::Else | Word::ElseIf => self.branch(word)?,
            Word::Break | Word::Continue => self.jump_out(word)?,
            Word::Goto => self.goto()?,
            Word::Return => self.code.push(Opcode::Return as u8),
            Word::Exit => self.code.push(Opcode::Exit as u8),
            Word::Print => self.code.push(Opcode::Print as u8),
            Word::Redim => self.code.push(Opcode::Redim as u8),
            Word::Push => self.code.push(Opcode::Push as u8),
            Word::Pop => self.code.push(Opcode::Pop as u8),
            Word::Shift => self.code.push(Opcode::Shift as u8),
            Word::Unshift => self.code.push(Opcode::Unshift as u8),
            _ => {}
        }
        Ok(())
    }

    /// End of a branch: jump over the rest of the `IF` and send the
    /// failed condition here.
    fn branch(&mut self, word: Word) -> Result<()> {
        let at = self.code.len();
        self.code.extend_from_slice(&[Opcode::Goto as u8, 0, 0]);
        let here = self.code.len();
        let line = self.start_line;
        let top = self.blocks.last_mut().ok_or_else(corrupt)?;
        top.exits.push(at);
        top.line = line;
        top.pending_end = false;
        if let Some(cond) = top.cond.take() {
            patch(&mut self.code, cond, here)?;
        }
        if word == Word::ElseIf {
            top.cond = Some(here);
            self.code.extend_from_slice(&[Opcode::If as u8, 0, 0]);
        }
        Ok(())
    }

    fn jump_out(&mut self, word: Word) -> Result<()> {
        let depth = self
            .blocks
            .iter()
            .position(|block| block.is_loop)
            .ok_or_else(|| error!(NotInsideLoop))?;
        let index = self.blocks.len() - 1 - depth;
        let at = self.code.len();
        let block = self.blocks.get_mut(index).ok_or_else(corrupt)?;
        if word == Word::Break {
            block.breaks.push(at);
            self.code.extend_from_slice(&[Opcode::Goto as u8, 0, 0]);
        } else {
            let head = address(block.cond.ok_or_else(corrupt)?)?.to_le_bytes();
            self.code
                .extend_from_slice(&[Opcode::Goto as u8, head[0], head[1]]);
        }
        Ok(())
    }

    fn goto(&mut self) -> Result<()> {
        let at = self.code.len();
        self.code.extend_from_slice(&[Opcode::Goto as u8, 0, 0]);
        let src = self.src;
        let rest = &src[self.pos..];
        let start = rest.len() - rest.trim_start_matches(|c: char| c == ' ' || c == '\t').len();
        let len = rest[start..]
            .bytes()
            .take_while(|c| c.is_ascii_alphabetic())
            .count();
        if len == 0 {
            return Err(error!(SyntaxError));
        }
        self.link
            .reference(&rest[start..start + len], at + 1, Some(self.line));
        self.pos += start + len;
        Ok(())
    }

    fn apply(&mut self, index: usize, at: Address) -> Result<()> {
        let rule = GRAMMAR.get(index).ok_or_else(corrupt)?;
        match rule.action {
            Action::Pop => return self.close(),
            Action::Push => {
                self.top_mut()?.grammar = index;
                let line = self.start_line;
                let block = Block::new(index, Some(at), line, rule.word == Word::While);
                self.blocks.push(block)?;
            }
            Action::Restart => {
                let top = self.top_mut()?;
                top.grammar = top.default;
            }
            Action::Accept | Action::SetDefault => {
                let top = self.top_mut()?;
                if rule.action == Action::Accept {
                    top.pending_end = false;
                }
                top.grammar = index;
                top.default = follow(index, rule.matched).ok_or_else(corrupt)?;
            }
            Action::None => self.top_mut()?.grammar = index,
        }
        let top = self.top_mut()?;
        top.grammar = follow(top.grammar, rule.matched).ok_or_else(corrupt)?;
        Ok(())
    }

    /// `END`: every pending jump of the block lands here. A loop jumps
    /// back to its condition first, and `BREAK` lands after that.
    fn close(&mut self) -> Result<()> {
        if self.blocks.len() < 2 {
            return Err(error!(SyntaxError));
        }
        let block = self.blocks.pop()?;
        let end = self.code.len();
        for &exit in &block.exits {
            patch(&mut self.code, exit, end)?;
        }
        if let Some(cond) = block.cond {
            if block.is_loop {
                match self.code.get_mut(cond) {
                    Some(op) => *op = Opcode::If as u8,
                    None => return Err(corrupt()),
                }
                let head = address(cond)?.to_le_bytes();
                self.code
                    .extend_from_slice(&[Opcode::Goto as u8, head[0], head[1]]);
                let end = self.code.len();
                for &exit in &block.breaks {
                    patch(&mut self.code, exit, end)?;
                }
            }
            let end = self.code.len();
            patch(&mut self.code, cond, end)?;
        }
        let parent = self.top_mut()?;
        parent.grammar = parent.default;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        while self.blocks.len() > 1 {
            let top = self.top()?;
            let line = Some(top.line);
            if !top.pending_end {
                return Err(error!(MissingEnd, line));
            }
            if top.in_statement() {
                return Err(error!(SyntaxError, line));
            }
            self.close()?;
        }
        if self.top()?.in_statement() {
            return Err(error!(SyntaxError, Some(self.line)));
        }
        self.link.link(&mut self.code)?;
        address(self.code.len())?;
        Ok(())
    }
}
