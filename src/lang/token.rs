use crate::mach::Val;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Literal(Val),
    Ident(Rc<str>),
    Operator(Op),
    Open,
    Close,
    OpenBracket,
    CloseBracket,
    Unknown(char),
    /// End of input or a `;` separator, which is left unconsumed.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// ## Operator descriptor
///
/// Priorities follow C: a higher value binds tighter.
#[derive(Debug)]
pub struct Operator {
    pub token: &'static str,
    pub arity: u8,
    pub assoc: Assoc,
    pub priority: u8,
}

macro_rules! operator {
    ($token:expr, $arity:expr, $assoc:ident, $priority:expr) => {
        Operator {
            token: $token,
            arity: $arity,
            assoc: Assoc::$assoc,
            priority: $priority,
        }
    };
}

/// Indexed by `Op as usize`. The index is also the operator's
/// byte in an expression block.
static OPERATORS: [Operator; 40] = [
    operator!("-", 1, Right, 14),
    operator!("~", 1, Right, 14),
    operator!("!", 1, Right, 14),
    operator!("++", 1, Left, 15),
    operator!("--", 1, Left, 15),
    operator!("*", 2, Left, 13),
    operator!("/", 2, Left, 13),
    operator!("%", 2, Left, 13),
    operator!("+", 2, Left, 12),
    operator!("-", 2, Left, 12),
    operator!("<<", 2, Left, 11),
    operator!(">>", 2, Left, 11),
    operator!("<", 2, Left, 10),
    operator!(">", 2, Left, 10),
    operator!("<=", 2, Left, 10),
    operator!(">=", 2, Left, 10),
    operator!("==", 2, Left, 9),
    operator!("!=", 2, Left, 9),
    operator!("&", 2, Left, 8),
    operator!("^", 2, Left, 7),
    operator!("|", 2, Left, 6),
    operator!("&&", 2, Left, 5),
    operator!("||", 2, Left, 4),
    operator!("?", 3, Right, 3),
    operator!(":", 0, Right, 3),
    operator!("=", 2, Right, 2),
    operator!("*=", 2, Right, 2),
    operator!("/=", 2, Right, 2),
    operator!("%=", 2, Right, 2),
    operator!("+=", 2, Right, 2),
    operator!("-=", 2, Right, 2),
    operator!("<<=", 2, Right, 2),
    operator!(">>=", 2, Right, 2),
    operator!("&=", 2, Right, 2),
    operator!("^=", 2, Right, 2),
    operator!("|=", 2, Right, 2),
    operator!(",", 2, Right, 1),
    // Not lexed: produced by the parser from brackets.
    operator!("(", 0, Left, 17),
    operator!("[", 2, Left, 17),
    operator!("[", 0, Left, 17),
];

/// Number of operators the lexer may match by text.
const LEXED: usize = 37;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Negate,
    Complement,
    Not,
    Increment,
    Decrement,
    Multiply,
    Divide,
    Modulo,
    Add,
    Subtract,
    ShiftLeft,
    ShiftRight,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Ternary,
    Colon,
    Assign,
    MulAssign,
    DivAssign,
    ModAssign,
    AddAssign,
    SubAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    XorAssign,
    OrAssign,
    Comma,
    Call,
    Index,
    Build,
}

impl Op {
    const ALL: [Op; 40] = [
        Op::Negate,
        Op::Complement,
        Op::Not,
        Op::Increment,
        Op::Decrement,
        Op::Multiply,
        Op::Divide,
        Op::Modulo,
        Op::Add,
        Op::Subtract,
        Op::ShiftLeft,
        Op::ShiftRight,
        Op::Less,
        Op::Greater,
        Op::LessEqual,
        Op::GreaterEqual,
        Op::Equal,
        Op::NotEqual,
        Op::BitAnd,
        Op::BitXor,
        Op::BitOr,
        Op::And,
        Op::Or,
        Op::Ternary,
        Op::Colon,
        Op::Assign,
        Op::MulAssign,
        Op::DivAssign,
        Op::ModAssign,
        Op::AddAssign,
        Op::SubAssign,
        Op::ShlAssign,
        Op::ShrAssign,
        Op::AndAssign,
        Op::XorAssign,
        Op::OrAssign,
        Op::Comma,
        Op::Call,
        Op::Index,
        Op::Build,
    ];

    pub fn from_u8(byte: u8) -> Option<Op> {
        Op::ALL.get(byte as usize).copied()
    }

    pub fn descriptor(self) -> &'static Operator {
        &OPERATORS[self as usize]
    }

    pub fn arity(self) -> usize {
        self.descriptor().arity as usize
    }

    pub fn assoc(self) -> Assoc {
        self.descriptor().assoc
    }

    pub fn priority(self) -> u8 {
        self.descriptor().priority
    }

    /// Longest operator at the start of `s`, C style.
    pub fn longest_match(s: &str) -> Option<Op> {
        let mut best: Option<usize> = None;
        for (index, operator) in OPERATORS[..LEXED].iter().enumerate() {
            if s.starts_with(operator.token) {
                match best {
                    Some(b) if OPERATORS[b].token.len() >= operator.token.len() => {}
                    _ => best = Some(index),
                }
            }
        }
        best.map(|index| Op::ALL[index])
    }

    /// Binary operator a compound assignment or increment expands to.
    pub fn compound(self) -> Option<Op> {
        use Op::*;
        Some(match self {
            Increment | AddAssign => Add,
            Decrement | SubAssign => Subtract,
            MulAssign => Multiply,
            DivAssign => Divide,
            ModAssign => Modulo,
            ShlAssign => ShiftLeft,
            ShrAssign => ShiftRight,
            AndAssign => BitAnd,
            XorAssign => BitXor,
            OrAssign => BitOr,
            _ => return None,
        })
    }

    /// Operators which remember whether their right side is evaluated.
    pub fn is_branch(self) -> bool {
        matches!(self, Op::And | Op::Or | Op::Ternary)
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Call => write!(f, "CALL"),
            Op::Index => write!(f, "INDEX"),
            Op::Build => write!(f, "ARRAY"),
            _ => write!(f, "{}", self.descriptor().token),
        }
    }
}
