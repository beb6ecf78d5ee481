mod common;
use calc::lang::{Category, ErrorCode, UnitId};
use calc::mach::{format, Config, Format, Precision, Runtime, Val};
use common::*;

fn bits32() -> Config {
    Config {
        precision: Precision::Bits32,
        ..Config::default()
    }
}

fn meters() -> UnitId {
    UnitId::new(Category::Distance, 0).unwrap()
}

fn measure(text: &str) -> (f64, UnitId) {
    match eval(text) {
        Ok(Val::Measure(n, unit)) => (n, unit),
        other => panic!("{} gave {:?}", text, other),
    }
}

#[test]
fn test_precedence() {
    assert_eq!(eval("2+3*4"), Ok(Val::Int(14)));
    assert_eq!(eval("1<<2+1"), Ok(Val::Int(8)));
    assert_eq!(eval("6&3==3"), Ok(Val::Int(0)));
    assert_eq!(eval("7 - 2 - 1"), Ok(Val::Int(4)));
    assert_eq!(eval("2 * (3 + 4)"), Ok(Val::Int(14)));
}

#[test]
fn test_division() {
    assert_eq!(error_of("1/0"), ErrorCode::DivisionByZero);
    assert_eq!(error_of("5 % 0"), ErrorCode::DivisionByZero);
    assert_eq!(eval("1.0/0"), Ok(Val::Double(std::f64::INFINITY)));
    assert_eq!(eval("7/2"), Ok(Val::Int(3)));
}

#[test]
fn test_strings() {
    assert_eq!(eval("\"ab\"*3"), Ok(s("ababab")));
    assert_eq!(error_of("\"x\"*1001"), ErrorCode::InvalidOperation);
    assert_eq!(eval("\"x\" + 1"), Ok(s("x1")));
    assert_eq!(eval("\"10\" - 4"), Ok(Val::Int(6)));
    assert_eq!(eval("len(\"héllo\")"), Ok(Val::Int(5)));
    assert_eq!(eval("'a;b'"), Ok(s("a;b")));
}

#[test]
fn test_arrays() {
    assert_eq!(eval("[1, 2, 3][-1]"), Ok(Val::Int(3)));
    assert_eq!(eval("a = [4, 5]; a[0] + a[1]"), Ok(Val::Int(9)));
    assert_eq!(eval("len([1, 2, 3])"), Ok(Val::Int(3)));
    assert_eq!(error_of("[1, 2][2]"), ErrorCode::IndexOutOfRange);
}

#[test]
fn test_units() {
    assert_eq!(eval("100cm"), Ok(Val::Measure(1.0, meters())));
    let (n, unit) = measure("100cm + 1ft");
    assert_eq!(unit, meters());
    assert!((n - 1.3048).abs() < 1e-12);
    let val = eval("0.005m").unwrap();
    assert_eq!(format(&val, Format::Auto, Precision::Bits64), "5mm");
    assert_eq!(eval("2m > 1m"), Ok(Val::Int(1)));
}

#[test]
fn test_default_units() {
    let mut config = Config::default();
    assert!(config.units.set("ft"));
    match eval_with(config, "12in") {
        Ok(Val::Measure(n, unit)) => {
            assert!((n - 1.0).abs() < 1e-12);
            assert_eq!(unit, UnitId::new(Category::Distance, 2).unwrap());
        }
        other => panic!("{:?}", other),
    }
    assert!(!config.units.set("parsec"));
}

#[test]
fn test_functions() {
    assert_eq!(eval("sqrt(16)"), Ok(Val::Double(4.0)));
    assert_eq!(eval("pow(2, 10)"), Ok(Val::Double(1024.0)));
    match eval("sin(90deg)") {
        Ok(Val::Double(n)) => assert!((n - 1.0).abs() < 1e-12),
        other => panic!("{:?}", other),
    }
    assert_eq!(eval("pi"), Ok(Val::Double(std::f64::consts::PI)));
    assert_eq!(error_of("nosuch(1)"), ErrorCode::UnknownFunction);
    assert_eq!(error_of("pi = 3"), ErrorCode::LValueNotModifiable);
    assert_eq!(eval("0 && nosuch(1)"), Ok(Val::Int(0)));
}

#[test]
fn test_bits32() {
    assert_eq!(eval_with(bits32(), "7/2"), Ok(Val::Int32(3)));
    assert_eq!(eval_with(bits32(), "0xFFFFFFFF"), Ok(Val::Int32(-1)));
    assert_eq!(eval_with(bits32(), "sqrt(4)"), Ok(Val::Float(2.0)));
    assert_eq!(eval_with(bits32(), "2.5"), Ok(Val::Float(2.5)));
}

#[test]
fn test_errors() {
    assert_eq!(error_of("1 +"), ErrorCode::MissingOperand);
    assert_eq!(error_of("(1))"), ErrorCode::TooManyClosingParens);
    assert_eq!(error_of("1 2"), ErrorCode::SyntaxError);
    assert_eq!(error_of("3 = 4"), ErrorCode::LValueNotModifiable);
    assert!(eval("1/0")
        .unwrap_err()
        .to_string()
        .starts_with("Division by zero"));
}

#[test]
fn test_round_trip() {
    let mut runtime = Runtime::default();
    let mut host = Recorder::default();
    for text in &["2+3*4", "1/3.0", "0.1+0.2", "-2.5*3", "123.456", "\"a\\\"b\\n\""] {
        let val = runtime.evaluate(text, &mut host).unwrap();
        let shown = format(&val, Format::Auto, Precision::Bits64);
        assert_eq!(runtime.evaluate(&shown, &mut host), Ok(val), "{}", shown);
    }
}
