use super::format::text;
use super::{Num, Precision, Val};
use crate::error;
use crate::lang::{parse_number, Error, Op, UnitId};
use std::cmp::Ordering;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Largest repeat count for `string * number`.
const MAX_REPEAT: i64 = 1000;

#[derive(Debug, Clone, Copy)]
enum Arith {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy)]
enum Bits {
    Shl,
    Shr,
    And,
    Xor,
    Or,
}

macro_rules! integer_arith {
    ($kind:ident, $a:expr, $b:expr, $arith:expr) => {
        Num::$kind(match $arith {
            Arith::Mul => $a.wrapping_mul($b),
            Arith::Div if $b == 0 => return Err(error!(DivisionByZero)),
            Arith::Div => $a.wrapping_div($b),
            Arith::Rem if $b == 0 => return Err(error!(DivisionByZero)),
            Arith::Rem => $a.wrapping_rem($b),
            Arith::Add => $a.wrapping_add($b),
            Arith::Sub => $a.wrapping_sub($b),
        })
    };
}

macro_rules! float_arith {
    ($kind:ident, $a:expr, $b:expr, $arith:expr) => {
        Num::$kind(match $arith {
            Arith::Mul => $a * $b,
            Arith::Div => $a / $b,
            Arith::Rem => $a % $b,
            Arith::Add => $a + $b,
            Arith::Sub => $a - $b,
        })
    };
}

macro_rules! integer_bits {
    ($kind:ident, $a:expr, $b:expr, $bits:expr) => {
        Num::$kind(match $bits {
            Bits::Shl => $a.wrapping_shl($b as u32),
            Bits::Shr => $a.wrapping_shr($b as u32),
            Bits::And => $a & $b,
            Bits::Xor => $a ^ $b,
            Bits::Or => $a | $b,
        })
    };
}

/// ## Operator semantics
///
/// Operands are always resolved values here: no identifiers,
/// functions or placeholders. Numeric operands are promoted to the
/// wider kind (Int32 < Float32 < Int64 < Float64). A unit carried by
/// either operand survives arithmetic but not comparisons, logic or
/// bitwise operators.

pub struct Operation {}

impl Operation {
    pub fn negate(val: Val) -> Result<Val> {
        use Val::*;
        match val {
            Int(n) => Ok(Int(n.wrapping_neg())),
            Int32(n) => Ok(Int32(n.wrapping_neg())),
            Double(n) => Ok(Double(-n)),
            Float(n) => Ok(Float(-n)),
            Measure(n, unit) => Ok(Measure(-n, unit)),
            _ => Err(error!(InvalidOperation)),
        }
    }

    pub fn complement(val: Val) -> Result<Val> {
        match val.num() {
            Some(num) => Ok(match num.to_integer() {
                Num::I32(n) => Val::Int32(!n),
                n => Val::Int(!n.as_i64()),
            }),
            None => Err(error!(InvalidOperation)),
        }
    }

    pub fn not(val: Val, precision: Precision) -> Result<Val> {
        match &val {
            Val::Str(s) => Ok(Val::bool(s.is_empty(), precision)),
            Val::Array(a) => Ok(Val::bool(a.is_empty(), precision)),
            _ => match val.num() {
                Some(num) => Ok(Operation::flag(num.is_zero(), num)),
                None => Err(error!(InvalidOperation)),
            },
        }
    }

    pub fn binary(op: Op, lhs: Val, rhs: Val, precision: Precision) -> Result<Val> {
        use Op::*;
        let unit = lhs.unit().or_else(|| rhs.unit());
        let (lhs, rhs) = (lhs.without_unit(), rhs.without_unit());
        let arith = match op {
            Multiply => Arith::Mul,
            Divide => Arith::Div,
            Modulo => Arith::Rem,
            Add => Arith::Add,
            Subtract => Arith::Sub,
            ShiftLeft => return Operation::bits(Bits::Shl, lhs, rhs, precision),
            ShiftRight => return Operation::bits(Bits::Shr, lhs, rhs, precision),
            BitAnd => return Operation::bits(Bits::And, lhs, rhs, precision),
            BitXor => return Operation::bits(Bits::Xor, lhs, rhs, precision),
            BitOr => return Operation::bits(Bits::Or, lhs, rhs, precision),
            Less | Greater | LessEqual | GreaterEqual | Equal | NotEqual => {
                return Operation::compare(op, lhs, rhs, precision)
            }
            And => return Ok(Val::bool(lhs.is_truthy() && rhs.is_truthy(), precision)),
            Or => return Ok(Val::bool(lhs.is_truthy() || rhs.is_truthy(), precision)),
            _ => return Err(error!(InvalidOperation; "NOT A BINARY OPERATOR")),
        };
        match (arith, &lhs, &rhs) {
            (Arith::Add, Val::Str(_), _) | (Arith::Add, _, Val::Str(_)) => {
                return Ok(Val::Str(format!("{}{}", text(&lhs), text(&rhs)).into()))
            }
            (Arith::Mul, Val::Str(s), n) | (Arith::Mul, n, Val::Str(s)) if n.is_numeric() => {
                return Operation::repeat(s, n)
            }
            _ => {}
        }
        let (l, r) = Operation::numbers(lhs, rhs, precision)?;
        let num = match Num::promote(l, r) {
            (Num::I32(a), Num::I32(b)) => integer_arith!(I32, a, b, arith),
            (Num::I64(a), Num::I64(b)) => integer_arith!(I64, a, b, arith),
            (Num::F32(a), Num::F32(b)) => float_arith!(F32, a, b, arith),
            (a, b) => float_arith!(F64, a.as_f64(), b.as_f64(), arith),
        };
        Ok(Operation::with_unit(num, unit))
    }

    /// `target[index]` on an array or a string. Negative indexes count
    /// from the end.
    pub fn index(target: Val, index: Val) -> Result<Val> {
        let i = match index.num() {
            Some(num) => num.as_i64(),
            None => return Err(error!(InvalidOperation)),
        };
        let position = |len: usize| -> Result<usize> {
            let at = if i < 0 { i + len as i64 } else { i };
            if at < 0 || at >= len as i64 {
                Err(error!(IndexOutOfRange))
            } else {
                Ok(at as usize)
            }
        };
        match target {
            Val::Array(items) => Ok(items[position(items.len())?].clone()),
            Val::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let ch = chars[position(chars.len())?];
                Ok(Val::Str(ch.to_string().into()))
            }
            _ => Err(error!(InvalidOperation)),
        }
    }

    pub fn array(items: Vec<Val>) -> Val {
        Val::Array(Rc::new(items))
    }

    fn repeat(s: &str, count: &Val) -> Result<Val> {
        let count = count.num().map_or(-1, Num::as_i64);
        if count < 0 || count > MAX_REPEAT {
            return Err(error!(InvalidOperation; "REPEAT COUNT OUT OF RANGE"));
        }
        Ok(Val::Str(s.repeat(count as usize).into()))
    }

    /// Both operands as numbers. When exactly one of them is a string
    /// it is read as a numeric literal.
    fn numbers(lhs: Val, rhs: Val, precision: Precision) -> Result<(Num, Num)> {
        let coerce = |val: &Val| -> Result<Num> {
            match val {
                Val::Str(s) => parse_number(s, precision)
                    .and_then(|v| v.num())
                    .ok_or_else(|| error!(InvalidOperation; "STRING IS NOT A NUMBER")),
                _ => val.num().ok_or_else(|| error!(InvalidOperation)),
            }
        };
        match (&lhs, &rhs) {
            (Val::Str(_), Val::Str(_)) => Err(error!(InvalidOperation)),
            _ => Ok((coerce(&lhs)?, coerce(&rhs)?)),
        }
    }

    fn bits(bits: Bits, lhs: Val, rhs: Val, precision: Precision) -> Result<Val> {
        let (l, r) = Operation::numbers(lhs, rhs, precision)?;
        Ok(Val::from(
            match Num::promote(l.to_integer(), r.to_integer()) {
                (Num::I32(a), Num::I32(b)) => integer_bits!(I32, a, b, bits),
                (a, b) => integer_bits!(I64, a.as_i64(), b.as_i64(), bits),
            },
        ))
    }

    fn compare(op: Op, lhs: Val, rhs: Val, precision: Precision) -> Result<Val> {
        let ordering = match (&lhs, &rhs) {
            (Val::Str(a), Val::Str(b)) => Some(a.cmp(b)),
            (Val::Str(a), n) | (n, Val::Str(a)) if n.is_numeric() => {
                let number = text(n);
                match parse_number(a, precision) {
                    Some(_) => None,
                    None if matches!(lhs, Val::Str(_)) => Some((**a).cmp(number.as_str())),
                    None => Some(number.as_str().cmp(&**a)),
                }
            }
            _ => None,
        };
        if let Some(ordering) = ordering {
            return Ok(Val::bool(Operation::holds(op, Some(ordering)), precision));
        }
        match Operation::numbers(lhs.clone(), rhs.clone(), precision) {
            Ok((l, r)) => {
                let (a, b) = Num::promote(l, r);
                let ordering = match (a, b) {
                    (Num::I32(a), Num::I32(b)) => Some(a.cmp(&b)),
                    (Num::I64(a), Num::I64(b)) => Some(a.cmp(&b)),
                    (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
                };
                Ok(Operation::flag(Operation::holds(op, ordering), a))
            }
            Err(error) => match op {
                Op::Equal => Ok(Val::bool(lhs == rhs, precision)),
                Op::NotEqual => Ok(Val::bool(lhs != rhs, precision)),
                _ => Err(error),
            },
        }
    }

    fn holds(op: Op, ordering: Option<Ordering>) -> bool {
        use Ordering::*;
        match (op, ordering) {
            (Op::NotEqual, None) => true,
            (_, None) => false,
            (Op::Less, Some(o)) => o == Less,
            (Op::Greater, Some(o)) => o == Greater,
            (Op::LessEqual, Some(o)) => o != Greater,
            (Op::GreaterEqual, Some(o)) => o != Less,
            (Op::Equal, Some(o)) => o == Equal,
            (_, Some(o)) => o != Equal,
        }
    }

    /// 0 or 1 as wide as the operand kind it was computed from.
    fn flag(b: bool, kind: Num) -> Val {
        if kind.is_32() {
            Val::Int32(b as i32)
        } else {
            Val::Int(b as i64)
        }
    }

    fn with_unit(num: Num, unit: Option<UnitId>) -> Val {
        match unit {
            Some(unit) => Val::Measure(num.as_f64(), unit),
            None => Val::from(num),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Category;

    const P: Precision = Precision::Bits64;

    fn bin(op: Op, lhs: Val, rhs: Val) -> Result<Val> {
        Operation::binary(op, lhs, rhs, P)
    }

    #[test]
    fn test_promotion() {
        assert_eq!(bin(Op::Add, Val::Int32(2), Val::Float(0.5)), Ok(Val::Float(2.5)));
        assert_eq!(bin(Op::Add, Val::Float(0.5), Val::Int(2)), Ok(Val::Int(2)));
        assert_eq!(bin(Op::Multiply, Val::Int(3), Val::Double(0.5)), Ok(Val::Double(1.5)));
        assert_eq!(bin(Op::Divide, Val::Int(7), Val::Int(2)), Ok(Val::Int(3)));
        assert_eq!(
            bin(Op::Add, Val::Int(i64::max_value()), Val::Int(1)),
            Ok(Val::Int(i64::min_value()))
        );
    }

    #[test]
    fn test_division_by_zero() {
        let error = bin(Op::Divide, Val::Int(1), Val::Int(0)).unwrap_err();
        assert_eq!(error.code(), crate::lang::ErrorCode::DivisionByZero);
        let error = bin(Op::Modulo, Val::Int32(1), Val::Int32(0)).unwrap_err();
        assert_eq!(error.code(), crate::lang::ErrorCode::DivisionByZero);
        assert_eq!(
            bin(Op::Divide, Val::Double(1.0), Val::Double(0.0)),
            Ok(Val::Double(std::f64::INFINITY))
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            bin(Op::Add, Val::Str("a".into()), Val::Int(1)),
            Ok(Val::Str("a1".into()))
        );
        assert_eq!(
            bin(Op::Add, Val::Double(0.5), Val::Str("x".into())),
            Ok(Val::Str("0.5x".into()))
        );
        assert_eq!(
            bin(Op::Multiply, Val::Int(3), Val::Str("ab".into())),
            Ok(Val::Str("ababab".into()))
        );
        assert!(bin(Op::Multiply, Val::Str("ab".into()), Val::Int(-1)).is_err());
        assert!(bin(Op::Multiply, Val::Str("ab".into()), Val::Int(1001)).is_err());
        assert_eq!(bin(Op::Subtract, Val::Str("10".into()), Val::Int(4)), Ok(Val::Int(6)));
        assert!(bin(Op::Subtract, Val::Str("x".into()), Val::Int(4)).is_err());
        assert_eq!(
            bin(Op::Less, Val::Str("abc".into()), Val::Str("abd".into())),
            Ok(Val::Int(1))
        );
        assert_eq!(bin(Op::Equal, Val::Str("2".into()), Val::Int(2)), Ok(Val::Int(1)));
    }

    #[test]
    fn test_comparison_width() {
        assert_eq!(bin(Op::Less, Val::Int32(1), Val::Float(2.0)), Ok(Val::Int32(1)));
        assert_eq!(bin(Op::Less, Val::Int32(1), Val::Double(2.0)), Ok(Val::Int(1)));
        assert_eq!(
            bin(Op::Equal, Val::Double(std::f64::NAN), Val::Double(std::f64::NAN)),
            Ok(Val::Int(0))
        );
    }

    #[test]
    fn test_units() {
        let cm = UnitId::new(Category::Distance, 0).unwrap();
        assert_eq!(
            bin(Op::Add, Val::Measure(0.5, cm), Val::Int(1)),
            Ok(Val::Measure(1.5, cm))
        );
        assert_eq!(bin(Op::Greater, Val::Measure(2.0, cm), Val::Int(1)), Ok(Val::Int(1)));
        assert_eq!(Operation::negate(Val::Measure(2.0, cm)), Ok(Val::Measure(-2.0, cm)));
    }

    #[test]
    fn test_bits() {
        assert_eq!(bin(Op::ShiftLeft, Val::Int(1), Val::Int(4)), Ok(Val::Int(16)));
        assert_eq!(bin(Op::BitAnd, Val::Double(7.9), Val::Int(2)), Ok(Val::Int(2)));
        assert_eq!(bin(Op::BitXor, Val::Int32(5), Val::Int32(1)), Ok(Val::Int32(4)));
        assert_eq!(Operation::complement(Val::Double(0.0)), Ok(Val::Int(-1)));
        assert_eq!(Operation::not(Val::Str("".into()), P), Ok(Val::Int(1)));
        assert_eq!(Operation::not(Val::Float(2.0), P), Ok(Val::Int32(0)));
    }

    #[test]
    fn test_index() {
        let array = Operation::array(vec![Val::Int(1), Val::Int(2), Val::Int(3)]);
        assert_eq!(Operation::index(array.clone(), Val::Int(-1)), Ok(Val::Int(3)));
        assert!(Operation::index(array, Val::Int(3)).is_err());
        assert_eq!(
            Operation::index(Val::Str("héllo".into()), Val::Int(1)),
            Ok(Val::Str("é".into()))
        );
    }
}
