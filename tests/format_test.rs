mod common;
use calc::lang::{Category, ErrorCode, UnitId};
use calc::mach::{format, Format, Precision, Val};
use common::s;

fn show(val: Val, mode: Format) -> String {
    format(&val, mode, Precision::Bits64)
}

#[test]
fn test_integers() {
    assert_eq!(show(Val::Int(255), Format::Hex), "0xff");
    assert_eq!(show(Val::Int(255), Format::Oct), "0377");
    assert_eq!(show(Val::Int(255), Format::Dec), "255");
    assert_eq!(show(Val::Int(5), Format::Bin), "00000101");
    assert_eq!(show(Val::Int(-3), Format::Auto), "-3");
    assert_eq!(
        format(&Val::Int32(-1), Format::Hex, Precision::Bits32),
        "0xffffffff"
    );
}

#[test]
fn test_strings() {
    assert_eq!(show(s("AB"), Format::Hex), "[0x41,0x42]");
    assert_eq!(show(s("AB"), Format::Dec), "[65,66]");
    assert_eq!(show(s("AB"), Format::Auto), "\"AB\"");
    assert_eq!(show(s("tab\there"), Format::Auto), "\"tab\\there\"");
}

#[test]
fn test_reals_and_measures() {
    assert_eq!(show(Val::Double(0.5), Format::Auto), "0.5");
    assert_eq!(show(Val::Float(0.1), Format::Auto), "0.1");
    let meters = UnitId::new(Category::Distance, 0).unwrap();
    let inches = UnitId::new(Category::Distance, 1).unwrap();
    assert_eq!(show(Val::Measure(0.005, meters), Format::Auto), "5mm");
    assert_eq!(show(Val::Measure(0.0005, meters), Format::Auto), "500um");
    assert_eq!(show(Val::Measure(2500.0, meters), Format::Auto), "2.5Km");
    assert_eq!(show(Val::Measure(24.0, inches), Format::Auto), "2ft");
}

#[test]
fn test_other_values() {
    assert_eq!(
        show(Val::Error(ErrorCode::DivisionByZero), Format::Auto),
        "#Division by zero"
    );
    assert_eq!(show(Val::Void, Format::Auto), "");
    let array = Val::Array(vec![Val::Int(1), s("a")].into());
    assert_eq!(show(array, Format::Auto), "[1,\"a\"]");
}

#[test]
fn test_mode_names() {
    assert_eq!("auto".parse::<Format>(), Ok(Format::Auto));
    assert_eq!("HEX".parse::<Format>(), Ok(Format::Hex));
    assert!("octal".parse::<Format>().is_err());
}
