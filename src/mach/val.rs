use super::Precision;
use crate::error;
use crate::lang::{Error, ErrorCode, UnitId};
use std::convert::TryInto;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Runtime value
///
/// `Ident` is a name not yet looked up, `Function` marks the callee of
/// a call being parsed, and `Pending` stands in for a result which only
/// exists when a compiled expression block runs.

#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Int(i64),
    Int32(i32),
    Double(f64),
    Float(f32),
    /// Float64 expressed in the default unit of its category.
    Measure(f64, UnitId),
    Str(Rc<str>),
    Ident(Rc<str>),
    Array(Rc<Vec<Val>>),
    Function(Rc<str>),
    Pending,
    Error(ErrorCode),
    Void,
}

// Operand type bytes of an expression block.
pub const TYPE_INT: u8 = 0;
pub const TYPE_INT32: u8 = 1;
pub const TYPE_DOUBLE: u8 = 2;
pub const TYPE_FLOAT: u8 = 3;
pub const TYPE_IDENT: u8 = 4;
pub const TYPE_STR: u8 = 5;
pub const TYPE_MEASURE: u8 = 6;
pub const TYPE_PENDING: u8 = 7;
pub const TYPE_FUNCTION: u8 = 8;
pub const TYPE_ERROR: u8 = 9;
pub const TYPE_VOID: u8 = 10;
pub const TYPE_ARRAY: u8 = 11;

/// Numeric view of a value, ordered by width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    I32(i32),
    F32(f32),
    I64(i64),
    F64(f64),
}

impl Num {
    fn width(self) -> u8 {
        match self {
            Num::I32(_) => 4,
            Num::F32(_) => 5,
            Num::I64(_) => 8,
            Num::F64(_) => 9,
        }
    }

    /// Convert both operands to the kind of the wider one.
    pub fn promote(lhs: Num, rhs: Num) -> (Num, Num) {
        if lhs.width() >= rhs.width() {
            (lhs, rhs.to_kind_of(lhs))
        } else {
            (lhs.to_kind_of(rhs), rhs)
        }
    }

    fn to_kind_of(self, like: Num) -> Num {
        match like {
            Num::I32(_) => Num::I32(self.as_i64() as i32),
            Num::F32(_) => Num::F32(self.as_f64() as f32),
            Num::I64(_) => Num::I64(self.as_i64()),
            Num::F64(_) => Num::F64(self.as_f64()),
        }
    }

    /// Floats become integers of the same width.
    pub fn to_integer(self) -> Num {
        match self {
            Num::F32(n) => Num::I32(n as i32),
            Num::F64(n) => Num::I64(n as i64),
            n => n,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Num::I32(n) => n as i64,
            Num::F32(n) => n as i64,
            Num::I64(n) => n,
            Num::F64(n) => n as i64,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Num::I32(n) => n as f64,
            Num::F32(n) => n as f64,
            Num::I64(n) => n as f64,
            Num::F64(n) => n,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Num::I32(n) => n == 0,
            Num::F32(n) => n == 0.0,
            Num::I64(n) => n == 0,
            Num::F64(n) => n == 0.0,
        }
    }

    pub fn is_32(self) -> bool {
        matches!(self, Num::I32(_) | Num::F32(_))
    }
}

impl From<Num> for Val {
    fn from(num: Num) -> Val {
        match num {
            Num::I32(n) => Val::Int32(n),
            Num::F32(n) => Val::Float(n),
            Num::I64(n) => Val::Int(n),
            Num::F64(n) => Val::Double(n),
        }
    }
}

impl Val {
    pub fn int(n: i64, precision: Precision) -> Val {
        match precision {
            Precision::Bits64 => Val::Int(n),
            Precision::Bits32 => Val::Int32(n as i32),
        }
    }

    pub fn bool(b: bool, precision: Precision) -> Val {
        Val::int(b as i64, precision)
    }

    pub fn num(&self) -> Option<Num> {
        match self {
            Val::Int(n) => Some(Num::I64(*n)),
            Val::Int32(n) => Some(Num::I32(*n)),
            Val::Double(n) | Val::Measure(n, _) => Some(Num::F64(*n)),
            Val::Float(n) => Some(Num::F32(*n)),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> Option<f64> {
        self.num().map(Num::as_f64)
    }

    pub fn unit(&self) -> Option<UnitId> {
        match self {
            Val::Measure(_, unit) => Some(*unit),
            _ => None,
        }
    }

    /// Same value as a plain Float64 if it carried a unit.
    pub fn without_unit(self) -> Val {
        match self {
            Val::Measure(n, _) => Val::Double(n),
            v => v,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Str(s) => !s.is_empty(),
            Val::Array(a) => !a.is_empty(),
            Val::Ident(_) | Val::Function(_) | Val::Pending => true,
            Val::Error(_) | Val::Void => false,
            v => v.num().map_or(false, |n| !n.is_zero()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.num().is_some()
    }

    /// Names and placeholders which need the host or the compiled
    /// block before they have a value.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Val::Ident(_) | Val::Function(_) | Val::Pending)
    }

    /// Bytes an operand occupies while it sits on the parser stacks.
    pub fn weight(&self) -> usize {
        match self {
            Val::Str(s) | Val::Ident(s) | Val::Function(s) => s.len() + 1,
            _ => 0,
        }
    }

    /// Append this value as an operand: `[type][size:2][payload]`,
    /// size counting the three header bytes, little-endian.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        out.extend_from_slice(&[0, 0, 0]);
        let kind = match self {
            Val::Int(n) => {
                out.extend_from_slice(&n.to_le_bytes());
                TYPE_INT
            }
            Val::Int32(n) => {
                out.extend_from_slice(&n.to_le_bytes());
                TYPE_INT32
            }
            Val::Double(n) => {
                out.extend_from_slice(&n.to_le_bytes());
                TYPE_DOUBLE
            }
            Val::Float(n) => {
                out.extend_from_slice(&n.to_le_bytes());
                TYPE_FLOAT
            }
            Val::Measure(n, unit) => {
                out.extend_from_slice(&n.to_le_bytes());
                out.push(unit.to_byte());
                TYPE_MEASURE
            }
            Val::Str(s) | Val::Ident(s) | Val::Function(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
                match self {
                    Val::Str(_) => TYPE_STR,
                    Val::Ident(_) => TYPE_IDENT,
                    _ => TYPE_FUNCTION,
                }
            }
            Val::Array(items) => {
                out.extend_from_slice(&(items.len() as u16).to_le_bytes());
                for item in items.iter() {
                    item.encode(out)?;
                }
                TYPE_ARRAY
            }
            Val::Pending => TYPE_PENDING,
            Val::Error(code) => {
                out.push(*code as u8);
                TYPE_ERROR
            }
            Val::Void => TYPE_VOID,
        };
        let size = out.len() - start;
        if size > u16::max_value() as usize {
            out.truncate(start);
            return Err(error!(NoMem));
        }
        out[start] = kind;
        out[start + 1..start + 3].copy_from_slice(&(size as u16).to_le_bytes());
        Ok(())
    }

    pub fn is_operand(byte: u8) -> bool {
        byte <= TYPE_ARRAY
    }

    /// Read the operand at `pc`, returning it and the address after it.
    pub fn decode(code: &[u8], pc: usize) -> Result<(Val, usize)> {
        let corrupt = || error!(InvalidOperation; "CORRUPT EXPRESSION BLOCK");
        let header = code.get(pc..pc + 3).ok_or_else(corrupt)?;
        let size = u16::from_le_bytes([header[1], header[2]]) as usize;
        if size < 3 {
            return Err(corrupt());
        }
        let payload = code.get(pc + 3..pc + size).ok_or_else(corrupt)?;
        let text = |payload: &[u8]| -> Result<Rc<str>> {
            let bytes = payload.strip_suffix(b"\0").unwrap_or(payload);
            std::str::from_utf8(bytes)
                .map(Rc::from)
                .map_err(|_| corrupt())
        };
        let val = match header[0] {
            TYPE_INT => Val::Int(i64::from_le_bytes(payload.try_into().map_err(|_| corrupt())?)),
            TYPE_INT32 => {
                Val::Int32(i32::from_le_bytes(payload.try_into().map_err(|_| corrupt())?))
            }
            TYPE_DOUBLE => {
                Val::Double(f64::from_le_bytes(payload.try_into().map_err(|_| corrupt())?))
            }
            TYPE_FLOAT => {
                Val::Float(f32::from_le_bytes(payload.try_into().map_err(|_| corrupt())?))
            }
            TYPE_MEASURE => {
                if payload.len() != 9 {
                    return Err(corrupt());
                }
                let n = f64::from_le_bytes(payload[..8].try_into().map_err(|_| corrupt())?);
                let unit = UnitId::from_byte(payload[8]).ok_or_else(corrupt)?;
                Val::Measure(n, unit)
            }
            TYPE_STR => Val::Str(text(payload)?),
            TYPE_IDENT => Val::Ident(text(payload)?),
            TYPE_FUNCTION => Val::Function(text(payload)?),
            TYPE_ARRAY => {
                let count = payload.get(..2).ok_or_else(corrupt)?;
                let count = u16::from_le_bytes([count[0], count[1]]) as usize;
                let mut items = Vec::with_capacity(count);
                let mut at = pc + 5;
                for _ in 0..count {
                    let (item, next) = Val::decode(code, at)?;
                    items.push(item);
                    at = next;
                }
                if at != pc + size {
                    return Err(corrupt());
                }
                Val::Array(Rc::new(items))
            }
            TYPE_PENDING => Val::Pending,
            TYPE_ERROR => {
                let code = payload.first().and_then(|c| ErrorCode::from_u8(*c));
                Val::Error(code.ok_or_else(corrupt)?)
            }
            TYPE_VOID => Val::Void,
            _ => return Err(corrupt()),
        };
        Ok((val, pc + size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Category;

    #[test]
    fn test_promote() {
        assert_eq!(
            Num::promote(Num::I32(2), Num::F32(1.5)),
            (Num::F32(2.0), Num::F32(1.5))
        );
        assert_eq!(
            Num::promote(Num::F32(2.5), Num::I64(3)),
            (Num::I64(2), Num::I64(3))
        );
        assert_eq!(
            Num::promote(Num::F64(0.5), Num::I64(3)),
            (Num::F64(0.5), Num::F64(3.0))
        );
    }

    #[test]
    fn test_truthy() {
        assert!(Val::Int(3).is_truthy());
        assert!(!Val::Float(0.0).is_truthy());
        assert!(!Val::Str("".into()).is_truthy());
        assert!(Val::Str("0".into()).is_truthy());
        assert!(!Val::Void.is_truthy());
    }

    #[test]
    fn test_unresolved() {
        assert!(Val::Ident("x".into()).is_unresolved());
        assert!(Val::Function("f".into()).is_unresolved());
        assert!(Val::Pending.is_unresolved());
        assert!(!Val::Str("x".into()).is_unresolved());
        assert!(!Val::Array(vec![Val::Int(1)].into()).is_unresolved());
    }

    #[test]
    fn test_operand_layout() {
        let mut out = vec![];
        Val::Ident("A".into()).encode(&mut out).unwrap();
        assert_eq!(out, vec![TYPE_IDENT, 5, 0, b'A', 0]);
        out.clear();
        Val::Int(11).encode(&mut out).unwrap();
        assert_eq!(out[..3], [TYPE_INT, 11, 0]);
        assert_eq!(Val::decode(&out, 0).unwrap(), (Val::Int(11), 11));
    }

    #[test]
    fn test_nested_array() {
        let unit = UnitId::new(Category::Mass, 1).unwrap();
        let val = Val::Array(Rc::new(vec![
            Val::Str("x".into()),
            Val::Measure(2.0, unit),
            Val::Array(Rc::new(vec![])),
        ]));
        let mut out = vec![0xAA];
        val.encode(&mut out).unwrap();
        assert_eq!(Val::decode(&out, 1).unwrap(), (val, out.len()));
    }
}
