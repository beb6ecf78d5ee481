use super::{Precision, Val};
use crate::error;
use crate::lang::{parse_number, Category, Error, UnitId};
use chrono::{Local, Timelike, Utc};

type Result<T> = std::result::Result<T, Error>;

/// ## Builtin functions and constants
///
/// Names are case insensitive. Math functions return Float64 with
/// 64 bit precision and Float32 with 32 bit precision. A missing
/// argument reads as zero.

pub struct Function {}

const MATH: [&str; 13] = [
    "sin", "cos", "tan", "asin", "acos", "atan", "pow", "exp", "log", "sqrt", "floor", "ceil",
    "round",
];

impl Function {
    /// `None` when `name` is not a builtin.
    pub fn call(name: &str, args: &[Val], precision: Precision) -> Option<Result<Val>> {
        let name = name.to_ascii_lowercase();
        if name == "len" {
            return Some(Function::len(args.first(), precision));
        }
        if !MATH.contains(&name.as_str()) {
            return None;
        }
        Some(Function::math(&name, args, precision))
    }

    pub fn constant(name: &str, precision: Precision) -> Option<Val> {
        let real = |n: f64| match precision {
            Precision::Bits64 => Val::Double(n),
            Precision::Bits32 => Val::Float(n as f32),
        };
        Some(match name.to_ascii_lowercase().as_str() {
            "pi" => real(std::f64::consts::PI),
            "e" => real(std::f64::consts::E),
            "ln2" => real(std::f64::consts::LN_2),
            "time" => Val::int(Local::now().num_seconds_from_midnight() as i64, precision),
            "now" => Val::int(Utc::now().timestamp(), precision),
            _ => return None,
        })
    }

    fn len(arg: Option<&Val>, precision: Precision) -> Result<Val> {
        match arg {
            Some(Val::Str(s)) => Ok(Val::int(s.chars().count() as i64, precision)),
            Some(Val::Array(items)) => Ok(Val::int(items.len() as i64, precision)),
            None => Ok(Val::int(0, precision)),
            Some(_) => Err(error!(InvalidOperation)),
        }
    }

    fn argument(args: &[Val], index: usize, precision: Precision) -> Result<f64> {
        match args.get(index) {
            None => Ok(0.0),
            Some(Val::Measure(n, unit)) if unit.category() == Category::Angle => {
                let radians = UnitId::new(Category::Angle, 0).unwrap_or(*unit);
                Ok(unit.convert(*n, radians))
            }
            Some(Val::Str(s)) => parse_number(s, precision)
                .and_then(|v| v.to_f64())
                .ok_or_else(|| error!(InvalidOperation; "STRING IS NOT A NUMBER")),
            Some(val) => val.to_f64().ok_or_else(|| error!(InvalidOperation)),
        }
    }

    fn math(name: &str, args: &[Val], precision: Precision) -> Result<Val> {
        let x = Function::argument(args, 0, precision)?;
        match precision {
            Precision::Bits64 => {
                let n = match name {
                    "sin" => x.sin(),
                    "cos" => x.cos(),
                    "tan" => x.tan(),
                    "asin" => x.asin(),
                    "acos" => x.acos(),
                    "atan" => x.atan(),
                    "pow" => x.powf(Function::argument(args, 1, precision)?),
                    "exp" => x.exp(),
                    "log" => x.ln(),
                    "sqrt" => x.sqrt(),
                    "floor" => x.floor(),
                    "ceil" => x.ceil(),
                    "round" => x.round(),
                    _ => return Err(error!(UnknownFunction)),
                };
                Ok(Val::Double(n))
            }
            Precision::Bits32 => {
                let x = x as f32;
                let n = match name {
                    "sin" => x.sin(),
                    "cos" => x.cos(),
                    "tan" => x.tan(),
                    "asin" => x.asin(),
                    "acos" => x.acos(),
                    "atan" => x.atan(),
                    "pow" => x.powf(Function::argument(args, 1, precision)? as f32),
                    "exp" => x.exp(),
                    "log" => x.ln(),
                    "sqrt" => x.sqrt(),
                    "floor" => x.floor(),
                    "ceil" => x.ceil(),
                    "round" => x.round(),
                    _ => return Err(error!(UnknownFunction)),
                };
                Ok(Val::Float(n))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Val]) -> Val {
        Function::call(name, args, Precision::Bits64).unwrap().unwrap()
    }

    #[test]
    fn test_math() {
        assert_eq!(call("SQRT", &[Val::Int(16)]), Val::Double(4.0));
        assert_eq!(call("pow", &[Val::Int(2), Val::Int32(10)]), Val::Double(1024.0));
        assert_eq!(call("floor", &[Val::Str("2.5".into())]), Val::Double(2.0));
        assert_eq!(call("cos", &[]), Val::Double(1.0));
        assert_eq!(call("asin", &[Val::Int(1)]), Val::Double(std::f64::consts::FRAC_PI_2));
        assert_eq!(call("acos", &[Val::Int(1)]), Val::Double(0.0));
        assert_eq!(
            Function::call("round", &[Val::Double(2.5)], Precision::Bits32),
            Some(Ok(Val::Float(3.0)))
        );
        assert!(Function::call("sin", &[Val::Str("x".into())], Precision::Bits64)
            .unwrap()
            .is_err());
        assert!(Function::call("nope", &[], Precision::Bits64).is_none());
    }

    #[test]
    fn test_degrees() {
        let deg = UnitId::new(Category::Angle, 1).unwrap();
        match call("sin", &[Val::Measure(90.0, deg)]) {
            Val::Double(n) => assert!((n - 1.0).abs() < 1e-12),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_len() {
        assert_eq!(call("len", &[Val::Str("héllo".into())]), Val::Int(5));
        assert_eq!(
            call("LEN", &[Val::Array(vec![Val::Int(1), Val::Void].into())]),
            Val::Int(2)
        );
    }

    #[test]
    fn test_constants() {
        assert_eq!(
            Function::constant("PI", Precision::Bits64),
            Some(Val::Double(std::f64::consts::PI))
        );
        assert_eq!(
            Function::constant("e", Precision::Bits32),
            Some(Val::Float(std::f64::consts::E as f32))
        );
        match Function::constant("time", Precision::Bits64) {
            Some(Val::Int(n)) => assert!((0..86400).contains(&n)),
            other => panic!("{:?}", other),
        }
        match Function::constant("now", Precision::Bits32) {
            Some(Val::Int32(_)) => {}
            other => panic!("{:?}", other),
        }
        assert_eq!(Function::constant("x", Precision::Bits64), None);
    }
}
