// tests/interpreter_tests.rs

use std::{cell::RefCell, rc::Rc};

use futures::executor::block_on;
use mini4gl::{Context, Error, EvalError, Evaluator, RunOptions, Value, interpret, parse_program};

fn run(source: &str) -> Vec<String> {
    interpret(source, RunOptions::new()).unwrap().output
}

fn run_err(source: &str) -> Error {
    interpret(source, RunOptions::new()).unwrap_err()
}

// ============================================================================
// Variables and Assignment
// ============================================================================

#[test]
fn test_define_defaults_by_type() {
    let outcome = interpret(
        "DEFINE VARIABLE n AS INTEGER.\n\
         DEFINE VARIABLE s AS CHARACTER.\n\
         DEFINE VARIABLE ok AS LOGICAL.\n\
         DEFINE VARIABLE d AS DATE.",
        RunOptions::new(),
    )
    .unwrap();

    let vars = outcome.variables();
    assert_eq!(vars["n"], Value::Integer(0));
    assert_eq!(vars["s"], Value::String(String::new()));
    assert_eq!(vars["ok"], Value::Boolean(false));
    assert_eq!(vars["d"], Value::Null);
}

#[test]
fn test_names_are_case_insensitive() {
    assert_eq!(run("DEFINE VARIABLE Count INIT 2. count = COUNT + 1. DISPLAY cOuNt."), vec!["3"]);
}

#[test]
fn test_unbound_variable_displays_unknown() {
    assert_eq!(run("DISPLAY missing."), vec!["?"]);
}

#[test]
fn test_assignment_without_define_creates_variable() {
    let outcome = interpret("total = 5. total = total * 2.", RunOptions::new()).unwrap();
    assert_eq!(outcome.variables()["total"], Value::Integer(10));
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_arithmetic_and_concatenation() {
    assert_eq!(
        run("DISPLAY 1 + 2 * 3. DISPLAY \"a\" + 1. DISPLAY 7 / 2. DISPLAY 0.1 + 0.2."),
        vec!["7", "a1", "3.5", "0.3"]
    );
}

#[test]
fn test_logical_results_are_booleans() {
    assert_eq!(run("DISPLAY 1 < 2 AND \"x\" = \"x\". DISPLAY NOT 1."), vec!["true", "false"]);
}

#[test]
fn test_division_by_zero_is_an_error() {
    let err = run_err("DISPLAY 1 / 0.");
    assert!(matches!(err, Error::Eval(EvalError::DivisionByZero)));
    assert_eq!(err.to_string(), "Runtime error: Division by zero");
}

#[test]
fn test_integer_division_overflow_falls_back_to_float() {
    let outcome = interpret(
        "x = (-9223372036854775807 - 1) / -1. DISPLAY 8 / -2.",
        RunOptions::new(),
    )
    .unwrap();
    assert!(matches!(outcome.variables()["x"], Value::Float(n) if n > 9.2e18));
    assert_eq!(outcome.output, vec!["-4"]);
}

#[test]
fn test_unknown_function() {
    let err = run_err("x = NOPE(1).");
    assert!(matches!(err, Error::Eval(EvalError::UnknownFunction(ref name)) if name == "NOPE"));
}

// ============================================================================
// DISPLAY
// ============================================================================

#[test]
fn test_display_items_join_with_spaces() {
    assert_eq!(run("DEFINE VARIABLE n AS INTEGER INIT 4. DISPLAY \"n is\" n, ?."), vec!["n is 4 ?"]);
}

#[test]
fn test_display_label_and_format() {
    assert_eq!(
        run("DISPLAY 5 LABEL \"Qty\" 3.14159 FORMAT \">>9.99\"."),
        vec!["Qty 5   3.14"]
    );
}

#[test]
fn test_display_centered() {
    let output = run("DISPLAY \"ab\" WITH CENTERED.");
    assert_eq!(output[0], format!("{}ab", " ".repeat(39)));
}

#[test]
fn test_print_statement() {
    assert_eq!(run("PRINT \"a\" 1."), vec!["a 1"]);
}

// ============================================================================
// Control Flow
// ============================================================================

#[test]
fn test_if_else() {
    let source = "DEFINE VARIABLE n INIT 5.\n\
                  IF n > 3 THEN DISPLAY \"big\". ELSE DISPLAY \"small\".\n\
                  IF n > 9 THEN DO: DISPLAY \"huge\". END. ELSE DO: DISPLAY \"not huge\". END.";
    assert_eq!(run(source), vec!["big", "not huge"]);
}

#[test]
fn test_counted_do_loop_counts_down() {
    assert_eq!(run("DO i = 3 TO 1 BY -1: DISPLAY i. END."), vec!["3", "2", "1"]);
}

#[test]
fn test_counted_do_loop_keeps_last_counter_value() {
    let outcome = interpret("DO i = 1 TO 3: END.", RunOptions::new()).unwrap();
    assert_eq!(outcome.variables()["i"], Value::Integer(3));
}

#[test]
fn test_counted_do_loop_with_while() {
    assert_eq!(run("DO i = 1 TO 10 WHILE i < 3: DISPLAY i. END."), vec!["1", "2"]);
}

#[test]
fn test_zero_step_is_rejected() {
    let err = run_err("DO i = 1 TO 3 BY 0: END.");
    assert!(matches!(err, Error::Eval(EvalError::InvalidLoop(_))));
}

#[test]
fn test_do_while_and_repeat_while() {
    let source = "n = 0.\n\
                  DO WHILE n < 2: n = n + 1. DISPLAY \"do\" n. END.\n\
                  REPEAT WHILE n < 4: n = n + 1. DISPLAY \"repeat\" n. END.\n\
                  WHILE n < 5 DO: n = n + 1. DISPLAY \"while\" n. END.";
    assert_eq!(
        run(source),
        vec!["do 1", "do 2", "repeat 3", "repeat 4", "while 5"]
    );
}

#[test]
fn test_repeat_without_while_is_refused() {
    let err = run_err("REPEAT: DISPLAY 1. END.");
    assert!(matches!(err, Error::Eval(EvalError::Unsupported(_))));
}

#[test]
fn test_plain_do_block_runs_once() {
    assert_eq!(run("DO: DISPLAY 1. END."), vec!["1"]);
}

#[test]
fn test_nested_blocks_assign_the_outer_binding() {
    let source = "DO:\n\
                  DEFINE VARIABLE x AS INTEGER INIT 1.\n\
                  DO:\n\
                  x = 2.\n\
                  IF x = 2 THEN x = 3.\n\
                  END.\n\
                  DISPLAY x.\n\
                  END.\n\
                  DISPLAY x.";
    let outcome = interpret(source, RunOptions::new()).unwrap();
    assert_eq!(outcome.output, vec!["3", "3"]);
    assert_eq!(outcome.variables()["x"], Value::Integer(3));
}

#[test]
fn test_do_for_restores_buffer() {
    let source = "customer = 5.\n\
                  DO FOR customer: DISPLAY customer. customer = 9. DISPLAY customer. END.\n\
                  DISPLAY customer.";
    assert_eq!(run(source), vec!["?", "9", "5"]);
}

#[test]
fn test_do_for_restores_buffer_when_body_fails() {
    let program = parse_program(
        "customer = 5.\n\
         DO FOR customer: customer = 9. x = 1 / 0. END.",
    )
    .unwrap();
    let evaluator = Evaluator::new(Context::new());

    let err = block_on(evaluator.execute_program(&program)).unwrap_err();
    assert!(matches!(err, EvalError::DivisionByZero));
    assert_eq!(evaluator.root().get("customer"), Value::Integer(5));
}

// ============================================================================
// Procedures
// ============================================================================

const DOUBLE: &str = "PROCEDURE double:\n\
                      DEFINE INPUT PARAMETER n AS INTEGER.\n\
                      DEFINE OUTPUT PARAMETER result AS INTEGER.\n\
                      result = n * 2.\n\
                      END PROCEDURE.\n";

#[test]
fn test_output_parameter_is_copied_back() {
    let source = format!(
        "{}DEFINE VARIABLE r AS INTEGER.\nRUN double (INPUT 21, OUTPUT r).\nDISPLAY r.",
        DOUBLE
    );
    assert_eq!(run(&source), vec!["42"]);
}

#[test]
fn test_arguments_without_modes() {
    let source = format!("{}RUN double (3.5, r). DISPLAY r.", DOUBLE);
    assert_eq!(run(&source), vec!["7"]);
}

#[test]
fn test_arity_mismatch() {
    let err = run_err(&format!("{}RUN double (1).", DOUBLE));
    assert_eq!(
        err.to_string(),
        "Runtime error: Procedure double expects 2 argument(s) but got 1"
    );
}

#[test]
fn test_mode_mismatch() {
    let err = run_err(&format!("{}RUN double (OUTPUT a, OUTPUT b).", DOUBLE));
    assert!(matches!(err, Error::Eval(EvalError::Call(_))));
}

#[test]
fn test_output_argument_must_be_variable() {
    let err = run_err(&format!("{}RUN double (1, 2 + 3).", DOUBLE));
    assert!(matches!(err, Error::Eval(EvalError::Call(_))));
}

#[test]
fn test_unknown_procedure() {
    let err = run_err("RUN nowhere.");
    assert!(matches!(err, Error::Eval(EvalError::UnknownProcedure(ref n)) if n == "nowhere"));
}

#[test]
fn test_procedure_must_be_defined_before_run() {
    let err = run_err("RUN later. PROCEDURE later: END PROCEDURE.");
    assert!(matches!(err, Error::Eval(EvalError::UnknownProcedure(_))));
}

#[test]
fn test_procedure_updates_caller_variables() {
    let source = "DEFINE VARIABLE total AS INTEGER.\n\
                  PROCEDURE bump: total = total + 1. END PROCEDURE.\n\
                  RUN bump. RUN bump.\n\
                  DISPLAY total.";
    assert_eq!(run(source), vec!["2"]);
}

#[test]
fn test_procedure_locals_shadow_globals() {
    let source = "DEFINE VARIABLE x INIT 1.\n\
                  PROCEDURE p: DEFINE VARIABLE x INIT 5. x = 9. DISPLAY x. END PROCEDURE.\n\
                  RUN p.\n\
                  DISPLAY x.";
    assert_eq!(run(source), vec!["9", "1"]);
}

#[test]
fn test_private_procedure_outside_its_frame() {
    let source = "PROCEDURE outer:\n\
                  PROCEDURE inner PRIVATE: DISPLAY \"in\". END PROCEDURE.\n\
                  RUN inner.\n\
                  END PROCEDURE.\n\
                  RUN outer.\n\
                  RUN inner.";
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lines);
    let options = RunOptions::new().on_output(move |line| sink.borrow_mut().push(line.to_string()));

    let err = interpret(source, options).unwrap_err();
    assert!(matches!(err, Error::Eval(EvalError::Call(_))));
    assert_eq!(*lines.borrow(), vec!["in"]);
}

#[test]
fn test_top_level_private_procedure_is_callable() {
    assert_eq!(run("PROCEDURE p PRIVATE: DISPLAY 1. END PROCEDURE. RUN p."), vec!["1"]);
}

#[test]
fn test_prototypes_cannot_run() {
    let err = run_err("PROCEDURE ext EXTERNAL \"lib.so\". RUN ext.");
    assert!(matches!(err, Error::Eval(EvalError::Unsupported(_))));
    let err = run_err("PROCEDURE up IN SUPER. RUN up.");
    assert!(matches!(err, Error::Eval(EvalError::Unsupported(_))));
}

// ============================================================================
// INPUT
// ============================================================================

#[test]
fn test_input_reads_queued_values_in_order() {
    let source = "DEFINE VARIABLE nm AS CHARACTER.\n\
                  INPUT nm. DISPLAY \"Hello,\" nm.\n\
                  INPUT nm. DISPLAY nm.\n\
                  INPUT nm. DISPLAY nm.";
    let options = RunOptions::new().input("Ann").input(7i64);
    let outcome = interpret(source, options).unwrap();
    assert_eq!(outcome.output, vec!["Hello, Ann", "7", "?"]);
}

#[test]
fn test_input_from_value() {
    assert_eq!(run("INPUT x FROM VALUE(\"abc\" + \"d\"). DISPLAY x."), vec!["abcd"]);
}

#[test]
fn test_input_from_os_dir_is_unsupported() {
    let err = run_err("INPUT x FROM OS-DIR(\"/tmp\").");
    assert!(matches!(err, Error::Eval(EvalError::Unsupported(_))));
}

// ============================================================================
// Run Options and Outcome
// ============================================================================

#[test]
fn test_listener_sees_lines_as_they_are_produced() {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lines);
    let options = RunOptions::new().on_output(move |line| sink.borrow_mut().push(line.to_string()));

    let err = interpret("DISPLAY 1. DISPLAY 1 / 0. DISPLAY 2.", options).unwrap_err();
    assert!(matches!(err, Error::Eval(EvalError::DivisionByZero)));
    assert_eq!(*lines.borrow(), vec!["1"]);
}

#[test]
fn test_syntax_error_produces_no_output() {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lines);
    let options = RunOptions::new().on_output(move |line| sink.borrow_mut().push(line.to_string()));

    let err = interpret("DISPLAY 1. x = .", options).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert!(lines.borrow().is_empty());
}

#[test]
fn test_lex_errors_are_reported_as_lex_errors() {
    assert!(matches!(run_err("DISPLAY 1 @ 2."), Error::Lex(_)));
}

#[test]
fn test_ready_gate_runs_before_first_statement() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let gate_log = Rc::clone(&log);
    let line_log = Rc::clone(&log);

    let options = RunOptions::new()
        .ready(async move { gate_log.borrow_mut().push("ready".to_string()) })
        .on_output(move |line| line_log.borrow_mut().push(line.to_string()));

    interpret("DISPLAY \"first\".", options).unwrap();
    assert_eq!(*log.borrow(), vec!["ready", "first"]);
}

#[test]
fn test_runs_are_deterministic() {
    let source = format!(
        "{}DO i = 1 TO 3: RUN double (i, r). DISPLAY i r. END.",
        DOUBLE
    );
    let first = run(&source);
    assert_eq!(first, vec!["1 2", "2 4", "3 6"]);
    assert_eq!(first, run(&source));
}

#[test]
fn test_outcome_exposes_program_and_globals() {
    let outcome = interpret("DEFINE VARIABLE n INIT 2. n = n * 21.", RunOptions::new()).unwrap();
    assert_eq!(outcome.program.body.len(), 2);
    assert_eq!(outcome.variables()["n"], Value::Integer(42));
    assert!(outcome.output.is_empty());
}

#[test]
fn test_async_run() {
    let outcome = block_on(mini4gl::run(
        "DISPLAY UPPER(\"ok\").",
        RunOptions::new(),
    ))
    .unwrap();
    assert_eq!(outcome.output, vec!["OK"]);
}
