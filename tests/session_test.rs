mod common;
use calc::lang::ErrorCode;
use calc::mach::{Runtime, Val};
use common::*;

fn results(runtime: &mut Runtime, host: &mut Recorder, text: &str) -> Vec<(String, Val)> {
    host.clear();
    runtime.evaluate(text, host).unwrap();
    host.results()
}

fn named(name: &str, val: Val) -> (String, Val) {
    (name.to_string(), val)
}

#[test]
fn test_assignments() {
    let mut runtime = Runtime::default();
    let mut host = Recorder::default();
    assert_eq!(
        results(&mut runtime, &mut host, "a = 1; b = a + 1"),
        vec![named("a", Val::Int(1)), named("b", Val::Int(2))]
    );
    assert_eq!(
        results(&mut runtime, &mut host, "x = 4; x"),
        vec![named("x", Val::Int(4))]
    );
    assert_eq!(runtime.vars().lookup("B"), Some(&Val::Int(2)));
}

#[test]
fn test_temporaries() {
    let mut runtime = Runtime::default();
    let mut host = Recorder::default();
    assert_eq!(
        results(&mut runtime, &mut host, "2+3"),
        vec![named("$1", Val::Int(5))]
    );
    assert_eq!(
        results(&mut runtime, &mut host, "5"),
        vec![named("$1", Val::Int(5))]
    );
    assert_eq!(
        results(&mut runtime, &mut host, "$1 * 2"),
        vec![named("$2", Val::Int(10))]
    );
    assert_eq!(
        results(&mut runtime, &mut host, "3; 3"),
        vec![named("$3", Val::Int(3))]
    );
    assert_eq!(
        results(&mut runtime, &mut host, "$7 = 1; 2"),
        vec![named("$7", Val::Int(1)), named("$8", Val::Int(2))]
    );
}

#[test]
fn test_close_values() {
    let mut runtime = Runtime::default();
    let mut host = Recorder::default();
    results(&mut runtime, &mut host, "x = 1.5");
    assert_eq!(
        results(&mut runtime, &mut host, "1.500001"),
        vec![named("x", Val::Double(1.500001))]
    );
    assert_eq!(runtime.vars().lookup("x"), Some(&Val::Double(1.5)));
}

#[test]
fn test_null_results() {
    let mut runtime = Runtime::default();
    let mut host = Recorder::with(&[("bad", "RETURN 1/0")]);
    assert_eq!(
        results(&mut runtime, &mut host, "0"),
        vec![named("", Val::Int(0))]
    );
    assert_eq!(
        results(&mut runtime, &mut host, "bad()"),
        vec![named("", Val::Error(ErrorCode::DivisionByZero))]
    );
    assert_eq!(results(&mut runtime, &mut host, ""), vec![]);
    assert!(runtime.vars().is_empty());
}

#[test]
fn test_clear() {
    let mut runtime = Runtime::default();
    let mut host = Recorder::default();
    results(&mut runtime, &mut host, "a = 1; 9");
    runtime.clear_vars();
    assert!(runtime.vars().is_empty());
    assert_eq!(
        results(&mut runtime, &mut host, "9"),
        vec![named("$1", Val::Int(9))]
    );
}
