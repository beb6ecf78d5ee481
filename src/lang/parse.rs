use super::{is_keyword, token::*, Error, ErrorCode, Lexer};
use crate::error;
use crate::mach::{Config, Handle, Operation, Pool, Val};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Host services
///
/// The parser never owns variables or functions. Every name it has to
/// look up, every assignment and every call goes through this trait.

pub trait Resolve {
    fn fetch(&mut self, name: &str) -> Result<Val>;
    fn store(&mut self, name: &str, val: &Val) -> Result<()>;
    /// Builtin function or named program.
    fn call(&mut self, name: &str, args: Vec<Val>) -> Result<Val>;
}

// Item tags of an expression block. Operands use their type byte.
pub const OPERATION: u8 = 0x10;
pub const CALL: u8 = 0x11;
pub const BUILD: u8 = 0x12;
pub const SKIP: u8 = 0x13;
pub const JUMP: u8 = 0x14;
pub const END: u8 = 0xFF;

const NODE_SIZE: usize = 16;
/// Added to operator priorities for each open bracket.
const LEVEL: usize = 30;

/// Evaluate one expression, up to the end of `text` or the first `;`.
pub fn evaluate(text: &str, config: &Config, resolve: &mut dyn Resolve) -> Result<Val> {
    let mut parser = Parser::new(text, config, Mode::Direct(resolve));
    parser.run()?;
    let engine = &mut parser.engine;
    if engine.depth == 0 {
        return Ok(Val::Void);
    }
    let top = engine.pop_value()?;
    engine.resolve(top)
}

/// ## Expression blocks
///
/// Compiling appends an expression block to `out` and returns how many
/// bytes of `text` it used. The expression ends before a `;`, a
/// keyword, or the first token which cannot continue it.
///
/// A block is a sequence of items ending with `END`:
///
/// * an operand `[type][size:2][payload]` pushes a value,
/// * `[OPERATION][op]` followed by the operator's operands,
/// * `[CALL][argc:2]` followed by the function name and the arguments,
/// * `[BUILD][count:2]` followed by the array items,
/// * `[SKIP][op][addr:2]` tests the stacked value of `&&`, `||` or `?`
///   and jumps over the branch which must not run,
/// * `[JUMP][addr:2]` jumps over the second branch of `?:`.
///
/// Operands of type `Pending` take their value from the results
/// stacked by earlier items. Operators whose operands are all constant
/// are folded while compiling.

pub fn compile(text: &str, config: &Config, out: &mut Vec<u8>) -> Result<usize> {
    let start = out.len();
    let result = compile_block(text, config, out);
    if result.is_err() {
        out.truncate(start);
    }
    result
}

fn compile_block(text: &str, config: &Config, out: &mut Vec<u8>) -> Result<usize> {
    let mut parser = Parser::new(text, config, Mode::Compile(out));
    parser.run()?;
    let consumed = parser.last.ok_or_else(|| error!(SyntaxError))?;
    let engine = &mut parser.engine;
    if engine.depth > 0 {
        let mut top = engine.pop_value()?;
        engine.flush(&mut top)?;
    }
    engine.output()?.push(END);
    Ok(consumed)
}

/// Run the expression block at `pc`. Returns its value and the
/// address after the block.
pub fn replay(
    code: &[u8],
    pc: usize,
    config: &Config,
    resolve: &mut dyn Resolve,
) -> Result<(Val, usize)> {
    Engine::new(config, Mode::Direct(resolve)).replay(code, pc)
}

/// Address after the expression block at `pc`, without running it.
pub fn skip_block(code: &[u8], mut pc: usize) -> Result<usize> {
    loop {
        let tag = *code.get(pc).ok_or_else(corrupt)?;
        pc = match tag {
            END => return Ok(pc + 1),
            OPERATION => pc + 2,
            CALL | BUILD | JUMP => pc + 3,
            SKIP => pc + 4,
            byte if Val::is_operand(byte) => Val::decode(code, pc)?.1,
            _ => return Err(corrupt()),
        };
    }
}

fn is_dynamic(val: &Val) -> bool {
    val.is_unresolved() || matches!(val, Val::Array(_))
}

fn address(pc: usize) -> Result<u16> {
    if pc > u16::max_value() as usize {
        Err(error!(NoMem))
    } else {
        Ok(pc as u16)
    }
}

fn corrupt() -> Error {
    error!(InvalidOperation; "CORRUPT EXPRESSION BLOCK")
}

fn read_u16(code: &[u8], pc: usize) -> Result<usize> {
    match code.get(pc..pc + 2) {
        Some(bytes) => Ok(u16::from_le_bytes([bytes[0], bytes[1]]) as usize),
        None => Err(corrupt()),
    }
}

fn next(args: &mut impl Iterator<Item = Val>) -> Val {
    args.next().unwrap_or(Val::Void)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Taken,
    Skipped,
    /// Decided when the compiled block runs.
    Deferred,
}

#[derive(Debug, Clone)]
struct Pending {
    op: Op,
    priority: usize,
    /// Value depth below the operator's first operand.
    base: usize,
    branch: Branch,
    /// Address field of the last SKIP or JUMP emitted for this operator.
    patch: Option<usize>,
    colon: bool,
}

impl Pending {
    fn new(op: Op, priority: usize, base: usize) -> Pending {
        Pending {
            op,
            priority,
            base,
            branch: Branch::Taken,
            patch: None,
            colon: false,
        }
    }

    /// True while the operand being parsed must not be evaluated.
    fn skips(&self) -> bool {
        match (self.op, self.branch) {
            (_, Branch::Deferred) => false,
            (Op::Ternary, branch) => (branch == Branch::Skipped) != self.colon,
            (_, branch) => branch == Branch::Skipped,
        }
    }
}

enum Item {
    Value(Val),
    Operator(Pending),
}

struct Node {
    item: Item,
    next: Option<Handle>,
}

enum Mode<'a> {
    Direct(&'a mut dyn Resolve),
    Compile(&'a mut Vec<u8>),
}

/// ## Operand and operator stacks
///
/// Both stacks are linked lists of nodes in one pool which lives as
/// long as the evaluation.

struct Engine<'a> {
    config: &'a Config,
    mode: Mode<'a>,
    pool: Pool<Node>,
    values: Option<Handle>,
    operators: Option<Handle>,
    depth: usize,
}

impl<'a> Engine<'a> {
    fn new(config: &'a Config, mode: Mode<'a>) -> Engine<'a> {
        Engine {
            config,
            mode,
            pool: Pool::new(),
            values: None,
            operators: None,
            depth: 0,
        }
    }

    fn compiling(&self) -> bool {
        matches!(self.mode, Mode::Compile(_))
    }

    fn output(&mut self) -> Result<&mut Vec<u8>> {
        match &mut self.mode {
            Mode::Compile(out) => Ok(&mut **out),
            Mode::Direct(_) => Err(error!(InvalidOperation; "NOT COMPILING")),
        }
    }

    fn host(&mut self) -> Result<&mut dyn Resolve> {
        match &mut self.mode {
            Mode::Direct(host) => Ok(&mut **host),
            Mode::Compile(_) => Err(error!(InvalidOperation; "NO HOST WHILE COMPILING")),
        }
    }

    fn push_value(&mut self, val: Val) -> Result<()> {
        let size = NODE_SIZE + val.weight();
        let node = Node {
            item: Item::Value(val),
            next: self.values,
        };
        self.values = Some(self.pool.alloc(node, size)?);
        self.depth += 1;
        Ok(())
    }

    fn pop_value(&mut self) -> Result<Val> {
        let handle = self.values.ok_or_else(|| error!(MissingOperand))?;
        let node = self.pool.free(handle)?;
        self.values = node.next;
        self.depth -= 1;
        match node.item {
            Item::Value(val) => Ok(val),
            Item::Operator(_) => Err(error!(InvalidOperation; "CORRUPT PARSER STACK")),
        }
    }

    /// Top `count` values in the order they were pushed.
    fn pop_values(&mut self, count: usize) -> Result<Vec<Val>> {
        let mut vals = Vec::with_capacity(count);
        for _ in 0..count {
            vals.push(self.pop_value()?);
        }
        vals.reverse();
        Ok(vals)
    }

    fn top_value_mut(&mut self) -> Option<&mut Val> {
        match self.pool.get_mut(self.values?) {
            Some(Node {
                item: Item::Value(val),
                ..
            }) => Some(val),
            _ => None,
        }
    }

    fn push_operator(&mut self, pending: Pending) -> Result<()> {
        let node = Node {
            item: Item::Operator(pending),
            next: self.operators,
        };
        self.operators = Some(self.pool.alloc(node, NODE_SIZE)?);
        Ok(())
    }

    fn pop_operator(&mut self) -> Result<Pending> {
        let handle = self.operators.ok_or_else(|| error!(SyntaxError))?;
        let node = self.pool.free(handle)?;
        self.operators = node.next;
        match node.item {
            Item::Operator(pending) => Ok(pending),
            Item::Value(_) => Err(error!(InvalidOperation; "CORRUPT PARSER STACK")),
        }
    }

    fn top_operator(&self) -> Option<&Pending> {
        match self.pool.get(self.operators?) {
            Some(Node {
                item: Item::Operator(pending),
                ..
            }) => Some(pending),
            _ => None,
        }
    }

    fn top_operator_mut(&mut self) -> Option<&mut Pending> {
        match self.pool.get_mut(self.operators?) {
            Some(Node {
                item: Item::Operator(pending),
                ..
            }) => Some(pending),
            _ => None,
        }
    }

    fn skipping(&self) -> bool {
        let mut at = self.operators;
        while let Some(handle) = at {
            match self.pool.get(handle) {
                Some(Node {
                    item: Item::Operator(pending),
                    next,
                }) => {
                    if pending.skips() {
                        return true;
                    }
                    at = *next;
                }
                _ => break,
            }
        }
        false
    }

    fn resolve(&mut self, val: Val) -> Result<Val> {
        match (val, &mut self.mode) {
            (Val::Ident(name), Mode::Direct(host)) => host.fetch(&name),
            (val, _) => Ok(val),
        }
    }

    /// Pop the top operator and replace its operands with the result.
    fn reduce(&mut self) -> Result<()> {
        if let Some(pending) = self.top_operator() {
            if pending.op == Op::Ternary && !pending.colon {
                return Err(error!(SyntaxError));
            }
        }
        let pending = self.pop_operator()?;
        let op = pending.op;
        let count = match op {
            Op::Call | Op::Build => self.depth.saturating_sub(pending.base),
            _ => op.arity(),
        };
        if self.depth < pending.base + count {
            return Err(error!(MissingOperand));
        }
        let mut args = self.pop_values(count)?;
        let callee = match op {
            Op::Call => match self.pop_value()? {
                Val::Function(name) => Some(name),
                _ => return Err(error!(SyntaxError)),
            },
            _ => None,
        };
        if self.skipping() {
            return self.push_value(Val::Void);
        }
        if let Some(base_op) = op.compound() {
            return self.rewrite(base_op, args);
        }
        match (op, pending.branch) {
            (Op::And, Branch::Skipped) | (Op::Or, Branch::Skipped) => args[1] = Val::Void,
            (Op::Ternary, Branch::Taken) => args[2] = Val::Void,
            (Op::Ternary, Branch::Skipped) => args[1] = Val::Void,
            _ => {}
        }
        let result = if self.compiling() {
            self.emit(&pending, callee, args)?
        } else {
            self.apply(op, callee, args)?
        };
        self.push_value(result)
    }

    /// `a op= b`, `a++` and `a--` reduce as `a = a op b`.
    fn rewrite(&mut self, op: Op, mut args: Vec<Val>) -> Result<()> {
        let rhs = if args.len() > 1 {
            args.pop().unwrap_or(Val::Void)
        } else {
            Val::int(1, self.config.precision)
        };
        let name = match args.pop() {
            Some(Val::Ident(name)) => name,
            _ => return Err(error!(LValueNotModifiable)),
        };
        let base = self.depth;
        self.push_value(Val::Ident(name.clone()))?;
        self.push_value(Val::Ident(name))?;
        self.push_value(rhs)?;
        self.push_operator(Pending::new(Op::Assign, 0, base))?;
        self.push_operator(Pending::new(op, 0, base + 1))?;
        self.reduce()?;
        self.reduce()
    }

    /// Fold values left by `,` into the last one.
    fn collapse(&mut self, base: usize) -> Result<()> {
        while self.depth > base + 1 {
            self.push_operator(Pending::new(Op::Comma, 0, self.depth - 2))?;
            self.reduce()?;
        }
        Ok(())
    }

    fn apply(&mut self, op: Op, callee: Option<Rc<str>>, args: Vec<Val>) -> Result<Val> {
        let precision = self.config.precision;
        let mut args = args.into_iter();
        match op {
            Op::Assign => {
                let target = next(&mut args);
                let value = self.resolve(next(&mut args))?;
                match target {
                    Val::Ident(name) => {
                        self.host()?.store(&name, &value)?;
                        Ok(value)
                    }
                    _ => Err(error!(LValueNotModifiable)),
                }
            }
            Op::Ternary => {
                let condition = self.resolve(next(&mut args))?;
                let (a, b) = (next(&mut args), next(&mut args));
                Ok(if condition.is_truthy() { a } else { b })
            }
            Op::Comma => Ok(args.last().unwrap_or(Val::Void)),
            Op::Call => {
                let mut resolved = vec![];
                for arg in args {
                    resolved.push(self.resolve(arg)?);
                }
                let name = callee.ok_or_else(|| error!(SyntaxError))?;
                self.host()?.call(&name, resolved)
            }
            Op::Build => {
                let mut resolved = vec![];
                for arg in args {
                    resolved.push(self.resolve(arg)?);
                }
                Ok(Operation::array(resolved))
            }
            Op::Index => {
                let target = self.resolve(next(&mut args))?;
                let index = self.resolve(next(&mut args))?;
                Operation::index(target, index)
            }
            Op::Negate => Operation::negate(self.resolve(next(&mut args))?),
            Op::Complement => Operation::complement(self.resolve(next(&mut args))?),
            Op::Not => Operation::not(self.resolve(next(&mut args))?, precision),
            _ => {
                let lhs = self.resolve(next(&mut args))?;
                let rhs = self.resolve(next(&mut args))?;
                Operation::binary(op, lhs, rhs, precision)
            }
        }
    }

    fn emit(&mut self, pending: &Pending, callee: Option<Rc<str>>, mut args: Vec<Val>) -> Result<Val> {
        let op = pending.op;
        if pending.branch == Branch::Deferred {
            if let Some(last) = args.last_mut() {
                self.flush(last)?;
            }
            self.patch(pending.patch)?;
            self.write(op, None, &args)?;
            return Ok(Val::Pending);
        }
        match op {
            Op::Ternary => {
                let pick = if pending.branch == Branch::Taken { 1 } else { 2 };
                return Ok(args.swap_remove(pick));
            }
            Op::Assign if !matches!(args.first(), Some(Val::Ident(_))) => {
                return Err(error!(LValueNotModifiable));
            }
            _ => {}
        }
        let forced = matches!(op, Op::Call | Op::Assign);
        if !forced && !args.iter().any(is_dynamic) {
            return self.apply(op, callee, args);
        }
        self.write(op, callee, &args)?;
        Ok(Val::Pending)
    }

    fn write(&mut self, op: Op, callee: Option<Rc<str>>, args: &[Val]) -> Result<()> {
        let count = address(args.len())?;
        let out = self.output()?;
        match op {
            Op::Call => {
                out.push(CALL);
                out.extend_from_slice(&count.to_le_bytes());
                Val::Function(callee.unwrap_or_else(|| "".into())).encode(out)?;
            }
            Op::Build => {
                out.push(BUILD);
                out.extend_from_slice(&count.to_le_bytes());
            }
            _ => {
                out.push(OPERATION);
                out.push(op as u8);
            }
        }
        for arg in args {
            arg.encode(out)?;
        }
        Ok(())
    }

    /// Emit a constant or a name as a standalone operand so the value
    /// sits on the block's stack before a branch.
    fn flush(&mut self, val: &mut Val) -> Result<()> {
        if *val != Val::Pending {
            val.encode(self.output()?)?;
            *val = Val::Pending;
        }
        Ok(())
    }

    fn flush_top(&mut self) -> Result<()> {
        let mut top = self.pop_value()?;
        self.flush(&mut top)?;
        self.push_value(top)
    }

    /// Point the address field at `at` to the end of the output.
    fn patch(&mut self, at: Option<usize>) -> Result<()> {
        if let Some(at) = at {
            let out = self.output()?;
            let target = address(out.len())?;
            out[at..at + 2].copy_from_slice(&target.to_le_bytes());
        }
        Ok(())
    }

    fn jump_field(&mut self, tag: u8, op: Option<Op>) -> Result<usize> {
        let out = self.output()?;
        out.push(tag);
        if let Some(op) = op {
            out.push(op as u8);
        }
        let at = out.len();
        out.extend_from_slice(&[0, 0]);
        Ok(at)
    }

    /// Decide the branch of `&&`, `||` or `?` from the value on top.
    fn branch(&mut self, op: Op) -> Result<(Branch, Option<usize>)> {
        if self.skipping() {
            return Ok((Branch::Taken, None));
        }
        let top = self.pop_value()?;
        let top = if !self.compiling() {
            self.resolve(top)?
        } else if is_dynamic(&top) {
            self.push_value(top)?;
            self.flush_top()?;
            let at = self.jump_field(SKIP, Some(op))?;
            return Ok((Branch::Deferred, Some(at)));
        } else {
            top
        };
        let truthy = top.is_truthy();
        self.push_value(top)?;
        let taken = match op {
            Op::Or => !truthy,
            _ => truthy,
        };
        Ok((if taken { Branch::Taken } else { Branch::Skipped }, None))
    }

    /// `:` of a conditional whose first branch is complete.
    fn otherwise(&mut self) -> Result<()> {
        let deferred = match self.top_operator() {
            Some(pending) if pending.branch == Branch::Deferred => pending.patch,
            _ => None,
        };
        let mut patch = None;
        if let Some(skip) = deferred {
            self.flush_top()?;
            patch = Some(self.jump_field(JUMP, None)?);
            self.patch(Some(skip))?;
        }
        if let Some(pending) = self.top_operator_mut() {
            pending.colon = true;
            if patch.is_some() {
                pending.patch = patch;
            }
        }
        Ok(())
    }

    /// `count` operands; placeholders take stacked results in order.
    fn operands(&mut self, code: &[u8], mut pc: usize, count: usize) -> Result<(Vec<Val>, usize)> {
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            let (val, next) = Val::decode(code, pc)?;
            args.push(val);
            pc = next;
        }
        let refs = args.iter().filter(|arg| **arg == Val::Pending).count();
        let mut stacked = self.pop_values(refs)?.into_iter();
        for arg in args.iter_mut() {
            if *arg == Val::Pending {
                *arg = next(&mut stacked);
            }
        }
        Ok((args, pc))
    }

    fn replay(&mut self, code: &[u8], mut pc: usize) -> Result<(Val, usize)> {
        loop {
            let tag = *code.get(pc).ok_or_else(corrupt)?;
            let op = || code.get(pc + 1).and_then(|b| Op::from_u8(*b)).ok_or_else(corrupt);
            match tag {
                END => {
                    pc += 1;
                    break;
                }
                OPERATION => {
                    let op = op()?;
                    let (args, next) = self.operands(code, pc + 2, op.arity())?;
                    let val = self.apply(op, None, args)?;
                    self.push_value(val)?;
                    pc = next;
                }
                CALL => {
                    let count = read_u16(code, pc + 1)?;
                    let name = match Val::decode(code, pc + 3)? {
                        (Val::Function(name), next) => {
                            pc = next;
                            name
                        }
                        _ => return Err(corrupt()),
                    };
                    let (args, next) = self.operands(code, pc, count)?;
                    let val = self.apply(Op::Call, Some(name), args)?;
                    self.push_value(val)?;
                    pc = next;
                }
                BUILD => {
                    let count = read_u16(code, pc + 1)?;
                    let (args, next) = self.operands(code, pc + 3, count)?;
                    let val = self.apply(Op::Build, None, args)?;
                    self.push_value(val)?;
                    pc = next;
                }
                SKIP => {
                    let op = op()?;
                    let target = read_u16(code, pc + 2)?;
                    let top = self.pop_value()?;
                    let top = self.resolve(top)?;
                    let truthy = top.is_truthy();
                    self.push_value(top)?;
                    let skip = match op {
                        Op::Or => truthy,
                        _ => !truthy,
                    };
                    pc += 4;
                    if skip {
                        if target <= pc {
                            return Err(corrupt());
                        }
                        self.push_value(Val::Void)?;
                        pc = target;
                    }
                }
                JUMP => {
                    let target = read_u16(code, pc + 1)?;
                    if target <= pc {
                        return Err(corrupt());
                    }
                    self.push_value(Val::Void)?;
                    pc = target;
                }
                byte if Val::is_operand(byte) => {
                    let (val, next) = Val::decode(code, pc)?;
                    self.push_value(val)?;
                    pc = next;
                }
                _ => return Err(corrupt()),
            }
        }
        let result = match self.depth {
            0 => Val::Void,
            _ => {
                let top = self.pop_value()?;
                self.resolve(top)?
            }
        };
        Ok((result, pc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Group,
    Call,
    Index,
    Build,
}

/// ## Shunting-yard driver
///
/// Feeds tokens to the engine. Brackets raise the priority of
/// everything inside them by `LEVEL`.

struct Parser<'a> {
    engine: Engine<'a>,
    lexer: Lexer<'a>,
    brackets: Vec<(Bracket, usize)>,
    level: usize,
    /// The previous token completed an operand.
    operand: bool,
    /// End of the last token taken.
    last: Option<usize>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, config: &'a Config, mode: Mode<'a>) -> Parser<'a> {
        Parser {
            engine: Engine::new(config, mode),
            lexer: Lexer::new(text, config),
            brackets: vec![],
            level: 0,
            operand: false,
            last: None,
        }
    }

    fn run(&mut self) -> Result<()> {
        loop {
            let start = self.lexer.pos();
            let (token, col) = match self.lexer.next_token() {
                Ok(found) => found,
                Err(error) if self.can_stop(&error) => {
                    self.lexer.rewind(start);
                    break;
                }
                Err(error) => return Err(error.in_column(&(start..self.lexer.pos()))),
            };
            let more = match self.token(token) {
                Ok(more) => more,
                Err(error) if self.can_stop(&error) => false,
                Err(error) => return Err(error.in_column(&col)),
            };
            if !more {
                self.lexer.rewind(col.start);
                break;
            }
            self.last = Some(col.end);
        }
        self.finish()
    }

    /// A compiled expression ends quietly where it stops making sense,
    /// so the statement compiler can look at what follows.
    fn can_stop(&self, error: &Error) -> bool {
        self.engine.compiling() && self.last.is_some() && error.code() == ErrorCode::SyntaxError
    }

    fn finish(&mut self) -> Result<()> {
        while let Some((bracket, _)) = self.brackets.last().copied() {
            self.close(matches!(bracket, Bracket::Group | Bracket::Call))?;
        }
        while self.engine.top_operator().is_some() {
            self.engine.reduce()?;
        }
        self.engine.collapse(0)
    }

    fn token(&mut self, token: Token) -> Result<bool> {
        match token {
            Token::End => return Ok(false),
            Token::Ident(name) => {
                if self.engine.compiling() && is_keyword(&name) {
                    return Ok(false);
                }
                self.operand(Val::Ident(name))?
            }
            Token::Literal(val) => self.operand(val)?,
            Token::Open => self.open()?,
            Token::Close => self.close(true)?,
            Token::OpenBracket => self.open_bracket()?,
            Token::CloseBracket => self.close(false)?,
            Token::Operator(op) => self.operator(op)?,
            Token::Unknown(_) => return Err(error!(SyntaxError)),
        }
        Ok(true)
    }

    fn operand(&mut self, val: Val) -> Result<()> {
        if self.operand {
            return Err(error!(SyntaxError));
        }
        self.engine.push_value(val)?;
        self.operand = true;
        Ok(())
    }

    fn reduce_above(&mut self, priority: usize) -> Result<()> {
        while self
            .engine
            .top_operator()
            .map_or(false, |pending| pending.priority > priority)
        {
            self.engine.reduce()?;
        }
        Ok(())
    }

    fn open(&mut self) -> Result<()> {
        let base = self.engine.depth;
        if self.operand {
            match self.engine.top_value_mut() {
                Some(top) => match top {
                    Val::Ident(name) => {
                        let name = name.clone();
                        *top = Val::Function(name);
                    }
                    _ => return Err(error!(SyntaxError)),
                },
                None => return Err(error!(SyntaxError)),
            }
            let priority = self.level + Op::Call.priority() as usize;
            self.engine
                .push_operator(Pending::new(Op::Call, priority, base))?;
            self.brackets.push((Bracket::Call, base));
        } else {
            self.brackets.push((Bracket::Group, base));
        }
        self.level += LEVEL;
        self.operand = false;
        Ok(())
    }

    fn open_bracket(&mut self) -> Result<()> {
        let bracket = if self.operand {
            let priority = self.level + Op::Index.priority() as usize;
            self.reduce_above(priority - 1)?;
            let base = self.engine.depth - 1;
            self.engine
                .push_operator(Pending::new(Op::Index, priority, base))?;
            Bracket::Index
        } else {
            let priority = self.level + Op::Build.priority() as usize;
            let base = self.engine.depth;
            self.engine
                .push_operator(Pending::new(Op::Build, priority, base))?;
            Bracket::Build
        };
        self.brackets.push((bracket, self.engine.depth));
        self.level += LEVEL;
        self.operand = false;
        Ok(())
    }

    fn close(&mut self, round: bool) -> Result<()> {
        let (bracket, base) = match self.brackets.last() {
            Some(open) => *open,
            None => return Err(error!(TooManyClosingParens)),
        };
        let matched = match bracket {
            Bracket::Group | Bracket::Call => round,
            Bracket::Index | Bracket::Build => !round,
        };
        if !matched {
            return Err(error!(SyntaxError));
        }
        let empty = matches!(bracket, Bracket::Call | Bracket::Build) && self.engine.depth == base;
        if !self.operand && !empty {
            return Err(error!(MissingOperand));
        }
        self.brackets.pop();
        self.reduce_above(self.level)?;
        self.level -= LEVEL;
        match bracket {
            Bracket::Group | Bracket::Index => {
                if self.engine.depth == base {
                    return Err(error!(MissingOperand));
                }
                self.engine.collapse(base)?;
                if bracket == Bracket::Index {
                    self.engine.reduce()?;
                }
            }
            Bracket::Call | Bracket::Build => self.engine.reduce()?,
        }
        self.operand = true;
        Ok(())
    }

    fn operator(&mut self, op: Op) -> Result<()> {
        let op = match op {
            Op::Negate if self.operand => Op::Subtract,
            op => op,
        };
        let priority = self.level + op.priority() as usize;
        match op {
            Op::Comma => {
                if !self.operand {
                    return Err(error!(SyntaxError));
                }
                self.reduce_above(priority)?;
                self.operand = false;
            }
            Op::Colon => {
                if !self.operand {
                    return Err(error!(SyntaxError));
                }
                self.colon(priority)?;
                self.operand = false;
            }
            Op::Increment | Op::Decrement if self.operand => {
                self.reduce_above(priority - 1)?;
                let base = self.engine.depth - 1;
                self.engine.push_operator(Pending::new(op, priority, base))?;
                self.engine.reduce()?;
            }
            _ if op.arity() == 1 => {
                if self.operand {
                    return Err(error!(SyntaxError));
                }
                let base = self.engine.depth;
                self.engine.push_operator(Pending::new(op, priority, base))?;
            }
            _ => {
                if !self.operand {
                    return Err(error!(SyntaxError));
                }
                let incoming = match op.assoc() {
                    Assoc::Left => priority - 1,
                    Assoc::Right => priority,
                };
                self.reduce_above(incoming)?;
                let mut pending = Pending::new(op, priority, self.engine.depth - 1);
                if op.is_branch() {
                    let (branch, patch) = self.engine.branch(op)?;
                    pending.branch = branch;
                    pending.patch = patch;
                }
                self.engine.push_operator(pending)?;
                self.operand = false;
            }
        }
        Ok(())
    }

    fn colon(&mut self, priority: usize) -> Result<()> {
        loop {
            match self.engine.top_operator() {
                Some(pending) if pending.priority > priority => {}
                Some(pending)
                    if pending.op == Op::Ternary && pending.colon && pending.priority == priority => {}
                _ => break,
            }
            self.engine.reduce()?;
        }
        let depth = self.engine.depth;
        match self.engine.top_operator() {
            Some(pending)
                if pending.op == Op::Ternary && !pending.colon && pending.priority == priority =>
            {
                if depth != pending.base + 2 {
                    return Err(error!(MissingOperand));
                }
            }
            _ => return Err(error!(SyntaxError)),
        }
        self.engine.otherwise()
    }
}
