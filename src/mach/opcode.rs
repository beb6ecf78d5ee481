/// ## Program instruction set
///
/// A compiled program is a flat byte stream. Every instruction starts
/// with its opcode byte; jumps carry a 16 bit little-endian absolute
/// address. Expressions are embedded as `Expr` followed by an
/// expression block which ends with `0xFF`.
///
/// For example: `IF A>0 THEN PRINT A END` compiles to
/// `[If][addr:2] [Expr]{A>0} [Print] [Expr]{A}` where `addr` is the
/// offset right after the last block.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Evaluate the following `Expr` and jump to the address if false.
    If = 1,
    /// Loop head. Rewritten to `If` when its `END` is compiled.
    While = 6,
    /// Unconditional jump.
    Goto = 10,
    /// The following `Expr` is the value of the program.
    Return = 11,
    /// Stop the program with no value.
    Exit = 12,
    /// The following `Expr` is appended to the output.
    Print = 13,
    /// `[Redim][name]` resizes an array to the following `Expr`.
    Redim = 14,
    /// `[Push][name]` appends the following `Expr`.
    Push = 15,
    /// `[Pop][name]` removes the last item.
    Pop = 16,
    /// `[Shift][name]` removes the first item.
    Shift = 17,
    /// `[Unshift][name]` prepends the following `Expr`.
    Unshift = 18,
    /// An expression block evaluated for its side effects, or for the
    /// instruction before it.
    Expr = 19,
}

impl Opcode {
    pub fn from_u8(byte: u8) -> Option<Opcode> {
        use Opcode::*;
        Some(match byte {
            1 => If,
            6 => While,
            10 => Goto,
            11 => Return,
            12 => Exit,
            13 => Print,
            14 => Redim,
            15 => Push,
            16 => Pop,
            17 => Shift,
            18 => Unshift,
            19 => Expr,
            _ => return None,
        })
    }

    /// Bytes of the instruction itself, before any operand or block.
    pub fn size(self) -> usize {
        match self {
            Opcode::If | Opcode::While | Opcode::Goto => 3,
            _ => 1,
        }
    }

    /// Instructions followed by a variable name operand.
    pub fn has_target(self) -> bool {
        use Opcode::*;
        matches!(self, Redim | Push | Pop | Shift | Unshift)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Opcode::*;
        let s = match self {
            If => "IF",
            While => "WHILE",
            Goto => "GOTO",
            Return => "RETURN",
            Exit => "EXIT",
            Print => "PRINT",
            Redim => "REDIM",
            Push => "PUSH",
            Pop => "POP",
            Shift => "SHIFT",
            Unshift => "UNSHIFT",
            Expr => "EXPR",
        };
        write!(f, "{}", s)
    }
}
