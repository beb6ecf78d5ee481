use super::{Column, LineNumber};

#[derive(Clone, PartialEq)]
pub struct Error {
    code: ErrorCode,
    line_number: LineNumber,
    column: Column,
    message: &'static str,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_column($col)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code,
            line_number: None,
            column: 0..0,
            message: "",
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn line_number(&self) -> LineNumber {
        self.line_number
    }

    pub fn column(&self) -> Column {
        self.column.clone()
    }

    /// Attach a source line unless one is already known.
    /// Errors raised deep inside an expression keep the line
    /// of the statement that first reported them.
    pub fn in_line_number(&self, line: LineNumber) -> Error {
        Error {
            code: self.code,
            line_number: self.line_number.or(line),
            column: self.column.clone(),
            message: self.message,
        }
    }

    pub fn in_column(&self, column: &Column) -> Error {
        Error {
            code: self.code,
            line_number: self.line_number,
            column: column.clone(),
            message: self.message,
        }
    }

    pub fn message(&self, message: &'static str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error {
            code: self.code,
            line_number: self.line_number,
            column: self.column.clone(),
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    SyntaxError = 1,
    DivisionByZero = 2,
    LValueNotModifiable = 3,
    TooManyClosingParens = 4,
    MissingOperand = 5,
    InvalidOperation = 6,
    IndexOutOfRange = 7,
    NoMem = 8,
    UnknownFunction = 9,
    DuplicateLabel = 10,
    MissingLabel = 11,
    NotInsideLoop = 12,
    MissingEnd = 13,
    MissingSeparator = 14,
    StdoutFull = 15,
    CallDepth = 16,
    Interrupted = 17,
}

impl ErrorCode {
    pub fn from_u8(code: u8) -> Option<ErrorCode> {
        use ErrorCode::*;
        Some(match code {
            1 => SyntaxError,
            2 => DivisionByZero,
            3 => LValueNotModifiable,
            4 => TooManyClosingParens,
            5 => MissingOperand,
            6 => InvalidOperation,
            7 => IndexOutOfRange,
            8 => NoMem,
            9 => UnknownFunction,
            10 => DuplicateLabel,
            11 => MissingLabel,
            12 => NotInsideLoop,
            13 => MissingEnd,
            14 => MissingSeparator,
            15 => StdoutFull,
            16 => CallDepth,
            17 => Interrupted,
            _ => return None,
        })
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use ErrorCode::*;
        let s = match self {
            SyntaxError => "Syntax error",
            DivisionByZero => "Division by zero",
            LValueNotModifiable => "Invalid assignment",
            TooManyClosingParens => "Too many parenthesis",
            MissingOperand => "Missing operand",
            InvalidOperation => "Invalid expression",
            IndexOutOfRange => "Index out of range",
            NoMem => "Not enough memory",
            UnknownFunction => "Unknown function",
            DuplicateLabel => "Duplicate label",
            MissingLabel => "Missing label",
            NotInsideLoop => "Not inside a loop",
            MissingEnd => "Missing END keyword",
            MissingSeparator => "Missing semicolon",
            StdoutFull => "Output overflow",
            CallDepth => "Too many nested calls",
            Interrupted => "Interrupted",
        };
        write!(f, "{}", s)
    }
}

impl std::error::Error for Error {}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(line_number) = self.line_number {
            write!(f, " in line {}", line_number)?;
        }
        if (0..0) != self.column {
            write!(f, " ({}..{})", self.column.start, self.column.end)?;
        }
        if !self.message.is_empty() {
            write!(f, "; {}", self.message)?;
        }
        Ok(())
    }
}
