mod common;
use calc::lang::ErrorCode;
use calc::mach::{Runtime, Val};
use common::*;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

const FIZZBUZZ: &str = "# FIZZ-BUZZ
A = 1
WHILE A <= 15 DO
    IF A % 15 == 0 THEN PRINT \"FIZZBUZZ\\n\"
    ELSEIF A % 3 == 0 THEN PRINT \"FIZZ\\n\"
    ELSEIF A % 5 == 0 THEN PRINT \"BUZZ\\n\"
    ELSE PRINT A; PRINT \"\\n\"
    A ++
END";

const FIBONACCI: &str = "N = ARGV[0]
J = 1; K = 1
IF N == 0 THEN RETURN 0
WHILE K < N DO
    T = I + J
    I = J
    J = T
    K ++
END
RETURN J";

fn array(items: &[i64]) -> Val {
    Val::Array(items.iter().map(|&n| Val::Int(n)).collect::<Vec<_>>().into())
}

#[test]
fn test_fizzbuzz() {
    let (val, printed) = run(FIZZBUZZ, vec![]);
    assert_eq!(val, Val::Void);
    assert_eq!(
        printed,
        vec![
            "1", "2", "FIZZ", "4", "BUZZ", "FIZZ", "7", "8", "FIZZ", "BUZZ", "11", "FIZZ", "13",
            "14", "FIZZBUZZ"
        ]
    );
}

#[test]
fn test_fibonacci() {
    assert_eq!(run(FIBONACCI, vec![Val::Int(10)]).0, Val::Int(55));
    assert_eq!(run(FIBONACCI, vec![Val::Int(1)]).0, Val::Int(1));
    assert_eq!(run(FIBONACCI, vec![Val::Int(0)]).0, Val::Int(0));
}

#[test]
fn test_goto() {
    let source = "A = 0\ntop:\nA ++\nIF A < 5 THEN GOTO top END\nRETURN A";
    assert_eq!(run(source, vec![]).0, Val::Int(5));
    let (val, printed) = run("PRINT 1\nEXIT\nPRINT 2", vec![]);
    assert_eq!(val, Val::Void);
    assert_eq!(printed, vec!["1"]);
}

#[test]
fn test_loops() {
    let source = "i = 0; n = 0
WHILE 1 DO
    i ++
    IF i > 10 THEN BREAK END
    IF i % 2 THEN CONTINUE END
    n += i
END
RETURN n";
    assert_eq!(run(source, vec![]).0, Val::Int(30));
}

#[test]
fn test_array_statements() {
    let source = "PUSH list, 1\nPUSH list, 2\nUNSHIFT list, 0\nPUSH list, 3\nPOP list\nRETURN list";
    assert_eq!(run(source, vec![]).0, array(&[0, 1, 2]));
    assert_eq!(
        run("a = [1, 2, 3]\nSHIFT a\nRETURN a", vec![]).0,
        array(&[2, 3])
    );
    assert_eq!(run("REDIM a, 3\nRETURN a", vec![]).0, array(&[0, 0, 0]));
    assert_eq!(
        run("a = [1, 2, 3]\nREDIM a, 1\nRETURN a", vec![]).0,
        array(&[1])
    );
    assert_eq!(
        run("REDIM a, -1", vec![]).0,
        Val::Error(ErrorCode::InvalidOperation)
    );
    assert_eq!(run("POP a", vec![]).0, Val::Error(ErrorCode::IndexOutOfRange));
    assert_eq!(run("SHIFT a", vec![]).0, Val::Error(ErrorCode::IndexOutOfRange));
}

#[test]
fn test_arguments() {
    assert_eq!(
        run("RETURN len(ARGV)", vec![Val::Int(1), s("x"), Val::Void]).0,
        Val::Int(3)
    );
    assert_eq!(run("RETURN ARGV", vec![]).0, array(&[]));
}

#[test]
fn test_calls() {
    let mut host = Recorder::with(&[
        ("double", "RETURN ARGV[0] * 2"),
        ("main", "RETURN double(double(3)) + 1"),
        ("forever", "RETURN forever()"),
        ("broken", "GOTO nowhere"),
        ("missing", "RETURN nosuch()"),
    ]);
    let mut runtime = Runtime::default();
    assert_eq!(runtime.run_program("MAIN", vec![], &mut host), Val::Int(13));
    assert_eq!(runtime.evaluate("double(21)", &mut host), Ok(Val::Int(42)));
    assert_eq!(
        runtime.run_program("forever", vec![], &mut host),
        Val::Error(ErrorCode::CallDepth)
    );
    assert_eq!(
        runtime.run_program("broken", vec![], &mut host),
        Val::Error(ErrorCode::MissingLabel)
    );
    assert_eq!(
        runtime.run_program("missing", vec![], &mut host),
        Val::Error(ErrorCode::UnknownFunction)
    );
    assert_eq!(
        runtime.run_program("nothing", vec![], &mut host),
        Val::Error(ErrorCode::UnknownFunction)
    );
}

#[test]
fn test_local_variables() {
    let mut host = Recorder::with(&[("peek", "x = 5\nRETURN y")]);
    let mut runtime = Runtime::default();
    runtime.evaluate("x = 1; y = 7", &mut host).unwrap();
    assert_eq!(runtime.run_program("peek", vec![], &mut host), Val::Int(0));
    assert_eq!(runtime.vars().lookup("x"), Some(&Val::Int(1)));
}

#[test]
fn test_output() {
    let mut host = Recorder::with(&[
        ("inner", "PRINT \"in\\n\""),
        ("lost", "PRINT \"lost\\n\"\nz = 0\nRETURN 1/z"),
        ("main", "PRINT \"out\\n\"\nx = inner()\nr = lost()\nPRINT \"done\"\nRETURN r"),
    ]);
    let mut runtime = Runtime::default();
    let val = runtime.run_program("main", vec![], &mut host);
    assert_eq!(val, Val::Error(ErrorCode::DivisionByZero));
    assert_eq!(host.printed(), vec!["out", "in", "done"]);

    let (val, printed) = run("PRINT \"gone\\n\"\nz = 0\nRETURN 1/z", vec![]);
    assert_eq!(val, Val::Error(ErrorCode::DivisionByZero));
    assert!(printed.is_empty());
}

#[test]
fn test_output_limit() {
    let (val, printed) = run("WHILE 1 DO\n    PRINT \"x\" * 1000\nEND", vec![]);
    assert_eq!(val, Val::Error(ErrorCode::StdoutFull));
    assert!(printed.is_empty());
}

#[test]
fn test_cache() {
    let mut host = Recorder::with(&[("main", "RETURN 1")]);
    let mut runtime = Runtime::default();
    assert_eq!(runtime.run_program("main", vec![], &mut host), Val::Int(1));
    let first = runtime.library().get("main").unwrap().checksum();
    assert_eq!(runtime.run_program("Main", vec![], &mut host), Val::Int(1));
    assert_eq!(runtime.library().len(), 1);
    host.programs.insert("main".into(), "RETURN 2".into());
    assert_eq!(runtime.run_program("main", vec![], &mut host), Val::Int(2));
    assert_ne!(runtime.library().get("main").unwrap().checksum(), first);
    assert_eq!(runtime.library().len(), 1);
}

#[test]
fn test_interrupt() {
    let mut host = Recorder::with(&[("spin", "WHILE 1 DO\n    a ++\nEND")]);
    let mut runtime = Runtime::default();
    let flag = runtime.interrupt_flag();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        flag.store(true, Ordering::SeqCst);
    });
    assert_eq!(
        runtime.run_program("spin", vec![], &mut host),
        Val::Error(ErrorCode::Interrupted)
    );
    stopper.join().unwrap();
}
