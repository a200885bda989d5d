// tests/parser_tests.rs

use mini4gl::ast::{
    BinOp, DisplayOption, Expr, InputSource, LogicalOp, ParamMode, Qualifier, Statement,
    UnaryOp,
};
use mini4gl::parser::{ParseError, parse_program};

fn parse(source: &str) -> Vec<Statement> {
    parse_program(source).unwrap().body
}

fn parse_one(source: &str) -> Statement {
    let mut body = parse(source);
    assert_eq!(body.len(), 1, "Expected one statement for: {}", source);
    body.remove(0)
}

/// The expression of `x = <expr>.`
fn expr(source: &str) -> Expr {
    match parse_one(&format!("x = {}.", source)) {
        Statement::Assign(assign) => assign.value,
        other => panic!("Expected assignment, got {:?}", other),
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_multiplication_binds_tighter() {
    // Should be: Add(1, Multiply(2, 3))
    match expr("1 + 2 * 3") {
        Expr::Binary {
            op: BinOp::Add,
            left,
            right,
        } => {
            assert_eq!(*left, Expr::Integer(1));
            assert!(matches!(
                *right,
                Expr::Binary {
                    op: BinOp::Multiply,
                    ..
                }
            ));
        }
        other => panic!("Expected addition, got {:?}", other),
    }
}

#[test]
fn test_parentheses() {
    match expr("(1 + 2) * 3") {
        Expr::Binary {
            op: BinOp::Multiply,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::Binary { op: BinOp::Add, .. }));
            assert_eq!(*right, Expr::Integer(3));
        }
        other => panic!("Expected multiplication, got {:?}", other),
    }
}

#[test]
fn test_subtraction_is_left_associative() {
    // (10 - 4) - 3
    match expr("10 - 4 - 3") {
        Expr::Binary {
            op: BinOp::Subtract,
            left,
            right,
        } => {
            assert!(matches!(
                *left,
                Expr::Binary {
                    op: BinOp::Subtract,
                    ..
                }
            ));
            assert_eq!(*right, Expr::Integer(3));
        }
        other => panic!("Expected subtraction, got {:?}", other),
    }
}

#[test]
fn test_and_binds_tighter_than_or() {
    match expr("a OR b AND c") {
        Expr::Logical {
            op: LogicalOp::Or,
            right,
            ..
        } => {
            assert!(matches!(
                *right,
                Expr::Logical {
                    op: LogicalOp::And,
                    ..
                }
            ));
        }
        other => panic!("Expected OR, got {:?}", other),
    }
}

#[test]
fn test_not_wraps_comparison() {
    match expr("NOT a = 1") {
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } => {
            assert!(matches!(*operand, Expr::Binary { op: BinOp::Equal, .. }));
        }
        other => panic!("Expected NOT, got {:?}", other),
    }
}

#[test]
fn test_comparison_operators() {
    let test_cases = vec![
        ("a = 1", BinOp::Equal),
        ("a == 1", BinOp::Equal),
        ("a <> 1", BinOp::NotEqual),
        ("a NE 1", BinOp::NotEqual),
        ("a < 1", BinOp::LessThan),
        ("a <= 1", BinOp::LessEqual),
        ("a > 1", BinOp::GreaterThan),
        ("a GE 1", BinOp::GreaterEqual),
    ];

    for (input, expected) in test_cases {
        match expr(input) {
            Expr::Binary { op, .. } => assert_eq!(op, expected, "Failed for input: {}", input),
            other => panic!("Expected comparison for {}, got {:?}", input, other),
        }
    }
}

#[test]
fn test_function_call_name_is_upper_cased() {
    assert_eq!(
        expr("entry(2, \"a,b\")"),
        Expr::Call {
            name: "ENTRY".to_string(),
            args: vec![Expr::Integer(2), Expr::String("a,b".to_string())],
        }
    );
    assert_eq!(
        expr("Upper(name)"),
        Expr::Call {
            name: "UPPER".to_string(),
            args: vec![Expr::Var("name".to_string())],
        }
    );
}

#[test]
fn test_unknown_literal() {
    assert_eq!(expr("?"), Expr::Unknown);
}

#[test]
fn test_unexpected_token_in_expression() {
    let err = parse_program("x = ).").unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnexpectedInExpression { ref found, position: 4 } if found == "RPAREN"
    ));
}

// ============================================================================
// Field Paths
// ============================================================================

#[test]
fn test_adjacent_dots_make_a_field_path() {
    assert_eq!(
        expr("order.customer.name"),
        Expr::Field(vec![
            "order".to_string(),
            "customer".to_string(),
            "name".to_string()
        ])
    );
}

#[test]
fn test_trailing_dot_terminates_statement() {
    assert_eq!(expr("total"), Expr::Var("total".to_string()));
}

#[test]
fn test_dot_before_newline_is_a_terminator() {
    let body = parse("x = a.\nb = 2.");
    assert_eq!(body.len(), 2);
    match &body[0] {
        Statement::Assign(assign) => assert_eq!(assign.value, Expr::Var("a".to_string())),
        other => panic!("Expected assignment, got {:?}", other),
    }
}

// ============================================================================
// Assignment and DEFINE
// ============================================================================

#[test]
fn test_assign_with_and_without_keyword() {
    for source in ["ASSIGN Total = 1.", "Total = 1."] {
        match parse_one(source) {
            Statement::Assign(assign) => {
                assert_eq!(assign.target, "total");
                assert_eq!(assign.value, Expr::Integer(1));
            }
            other => panic!("Expected assignment for {}, got {:?}", source, other),
        }
    }
}

#[test]
fn test_assign_requires_equals() {
    let err = parse_program("x + 1.").unwrap_err();
    assert_eq!(err.to_string(), "Expected '=' but got + at 2");
}

#[test]
fn test_define_variable() {
    match parse_one("DEFINE VARIABLE Name AS character INIT \"Ann\" NO-UNDO.") {
        Statement::DefineVariable(decl) => {
            assert_eq!(decl.name, "name");
            assert_eq!(decl.data_type.as_deref(), Some("CHARACTER"));
            assert_eq!(decl.init, Some(Expr::String("Ann".to_string())));
            assert!(decl.no_undo);
        }
        other => panic!("Expected DEFINE VARIABLE, got {:?}", other),
    }
}

#[test]
fn test_define_options_in_any_order() {
    match parse_one("DEFINE VARIABLE n NO-UNDO INIT = 5.") {
        Statement::DefineVariable(decl) => {
            assert_eq!(decl.data_type, None);
            assert_eq!(decl.init, Some(Expr::Integer(5)));
            assert!(decl.no_undo);
        }
        other => panic!("Expected DEFINE VARIABLE, got {:?}", other),
    }
}

#[test]
fn test_unsupported_define_form() {
    let err = parse_program("DEFINE BUFFER b FOR customer.").unwrap_err();
    assert!(
        err.to_string()
            .starts_with("Unsupported DEFINE form: DEFINE IDENT"),
        "Got: {}",
        err
    );
}

// ============================================================================
// DISPLAY
// ============================================================================

#[test]
fn test_display_items_and_options() {
    match parse_one("DISPLAY \"Total:\" total FORMAT \">>9.99\" LABEL \"T\", n WITH CENTERED.") {
        Statement::Display(display) => {
            assert_eq!(display.items.len(), 3);
            assert_eq!(display.items[0].expr, Expr::String("Total:".to_string()));
            assert_eq!(
                display.items[1].format,
                Some(Expr::String(">>9.99".to_string()))
            );
            assert_eq!(display.items[1].label, Some(Expr::String("T".to_string())));
            assert_eq!(display.items[2].expr, Expr::Var("n".to_string()));
            assert_eq!(display.options, vec![DisplayOption::Centered]);
            assert!(display.is_centered());
        }
        other => panic!("Expected DISPLAY, got {:?}", other),
    }
}

#[test]
fn test_display_frame_and_other_options() {
    match parse_one("DISPLAY x WITH FRAME f, DOWN.") {
        Statement::Display(display) => {
            assert_eq!(
                display.options,
                vec![DisplayOption::Frame, DisplayOption::Other("DOWN".to_string())]
            );
            assert!(!display.is_centered());
        }
        other => panic!("Expected DISPLAY, got {:?}", other),
    }
}

#[test]
fn test_print_statement_shares_display_grammar() {
    assert!(matches!(parse_one("PRINT 1 2."), Statement::Display(_)));
}

// ============================================================================
// Control Flow
// ============================================================================

#[test]
fn test_if_then_else_blocks() {
    match parse_one("IF a > 1 THEN DO: x = 1. END. ELSE x = 2.") {
        Statement::If(node) => {
            // THEN holds a single DO statement, ELSE a single assignment
            match *node.then_branch {
                Statement::Block(ref body) => assert!(matches!(body[0], Statement::Do(_))),
                ref other => panic!("Expected block, got {:?}", other),
            }
            match node.else_branch.as_deref() {
                Some(Statement::Block(body)) => {
                    assert!(matches!(body[0], Statement::Assign(_)))
                }
                other => panic!("Expected else block, got {:?}", other),
            }
        }
        other => panic!("Expected IF, got {:?}", other),
    }
}

#[test]
fn test_if_colon_block() {
    match parse_one("IF ok THEN: x = 1. y = 2. END.") {
        Statement::If(node) => match *node.then_branch {
            Statement::Block(ref body) => assert_eq!(body.len(), 2),
            ref other => panic!("Expected block, got {:?}", other),
        },
        other => panic!("Expected IF, got {:?}", other),
    }
}

#[test]
fn test_do_counted_range() {
    match parse_one("DO i = 3 TO 1 BY -1: DISPLAY i. END.") {
        Statement::Do(node) => {
            let range = node.range.expect("range");
            assert_eq!(range.variable, "i");
            assert_eq!(range.from, Expr::Integer(3));
            assert_eq!(range.to, Expr::Integer(1));
            assert!(matches!(
                range.step,
                Some(Expr::Unary {
                    op: UnaryOp::Minus,
                    ..
                })
            ));
            assert_eq!(node.body.len(), 1);
        }
        other => panic!("Expected DO, got {:?}", other),
    }
}

#[test]
fn test_labelled_do_with_options() {
    match parse_one("outer: DO FOR customer TRANSACTION WHILE n < 3: n = n + 1. END.") {
        Statement::Do(node) => {
            assert_eq!(node.label.as_deref(), Some("outer"));
            assert_eq!(node.records.len(), 1);
            assert_eq!(node.records[0].name, "customer");
            assert!(node.transaction);
            assert!(node.while_cond.is_some());
        }
        other => panic!("Expected DO, got {:?}", other),
    }
}

#[test]
fn test_do_range_requires_to() {
    let err = parse_program("DO i = 1 UNTIL 3: END.").unwrap_err();
    assert!(matches!(err, ParseError::Expected { ref expected, .. } if expected == "TO in DO iteration range"));
}

#[test]
fn test_repeat_and_while() {
    let body = parse("REPEAT WHILE n < 3: n = n + 1. END. DO WHILE n > 0: n = n - 1. END.");
    assert!(matches!(&body[0], Statement::Repeat(r) if r.while_cond.is_some()));
    assert!(matches!(&body[1], Statement::Do(d) if d.while_cond.is_some()));
}

#[test]
fn test_stray_end_is_empty() {
    assert_eq!(parse("END."), vec![Statement::Empty]);
}

#[test]
fn test_leave_is_not_a_statement() {
    let err = parse_program("LEAVE.").unwrap_err();
    assert_eq!(
        err,
        ParseError::UnexpectedToken {
            found: "LEAVE".to_string(),
            position: 0,
        }
    );
}

// ============================================================================
// FOR EACH and FIND
// ============================================================================

#[test]
fn test_for_each_full_header() {
    let source = "FOR EACH Order OF Customer NO-LOCK WHERE Order.total > 100 \
                  BREAK BY placedAt DESCENDING BY id: DISPLAY Order.id. END.";
    match parse_one(source) {
        Statement::ForEach(node) => {
            assert_eq!(node.qualifier, Qualifier::Each);
            assert_eq!(node.target, "Order");
            assert_eq!(node.relation.as_deref(), Some("Customer"));
            assert!(node.no_lock);
            assert!(node.where_clause.is_some());
            assert_eq!(node.order_by.len(), 2);
            assert_eq!(node.order_by[0].path, vec!["placedAt".to_string()]);
            assert!(node.order_by[0].descending);
            assert!(node.order_by[0].break_group);
            assert!(!node.order_by[1].descending);
            assert_eq!(node.body.len(), 1);
        }
        other => panic!("Expected FOR EACH, got {:?}", other),
    }
}

#[test]
fn test_for_first_and_last() {
    let body = parse("FOR FIRST c: END. FOR LAST c WHERE c.id > 1 NO-LOCK: END.");
    assert!(matches!(&body[0], Statement::ForEach(f) if f.qualifier == Qualifier::First));
    assert!(
        matches!(&body[1], Statement::ForEach(f) if f.qualifier == Qualifier::Last && f.no_lock)
    );
}

#[test]
fn test_break_without_by() {
    let err = parse_program("FOR EACH c BREAK: END.").unwrap_err();
    assert!(matches!(err, ParseError::Expected { ref expected, .. } if expected == "BY after BREAK"));
}

#[test]
fn test_for_each_requires_colon() {
    assert!(parse_program("FOR EACH c DISPLAY c.id. END.").is_err());
}

#[test]
fn test_find_options() {
    match parse_one("FIND FIRST customer WHERE customer.id = 1 NO-LOCK NO-ERROR.") {
        Statement::Find(node) => {
            assert_eq!(node.qualifier, Some(Qualifier::First));
            assert!(node.no_lock);
            assert!(node.no_error);
        }
        other => panic!("Expected FIND, got {:?}", other),
    }

    match parse_one("FIND customer OF order NO.") {
        Statement::Find(node) => {
            assert_eq!(node.qualifier, None);
            assert_eq!(node.relation.as_deref(), Some("order"));
            assert!(!node.no_lock);
            assert!(node.no_error);
        }
        other => panic!("Expected FIND, got {:?}", other),
    }
}

// ============================================================================
// Procedures and RUN
// ============================================================================

#[test]
fn test_procedure_lifts_parameters() {
    let source = "PROCEDURE Calc:\n\
                  DEFINE INPUT PARAMETER a AS INTEGER.\n\
                  DEFINE OUTPUT PARAMETER b AS INTEGER.\n\
                  b = a * 2.\n\
                  END PROCEDURE.";
    match parse_one(source) {
        Statement::Procedure(proc) => {
            assert_eq!(proc.name, "calc");
            assert_eq!(proc.parameters.len(), 2);
            assert_eq!(proc.parameters[0].mode, ParamMode::Input);
            assert_eq!(proc.parameters[1].mode, ParamMode::Output);
            assert_eq!(proc.parameters[1].name, "b");
            assert_eq!(proc.body.len(), 1);
            assert!(!proc.is_private);
            assert!(!proc.prototype_only);
        }
        other => panic!("Expected PROCEDURE, got {:?}", other),
    }
}

#[test]
fn test_private_procedure() {
    match parse_one("PROCEDURE helper PRIVATE: END.") {
        Statement::Procedure(proc) => assert!(proc.is_private && proc.body.is_empty()),
        other => panic!("Expected PROCEDURE, got {:?}", other),
    }
}

#[test]
fn test_external_prototype() {
    let source = "PROCEDURE GetTick EXTERNAL \"kernel32.dll\" STDCALL ORDINAL 12 PERSISTENT THREAD-SAFE.";
    match parse_one(source) {
        Statement::Procedure(proc) => {
            assert!(proc.prototype_only);
            let external = proc.external.expect("external binding");
            assert_eq!(external.library, "kernel32.dll");
            assert_eq!(external.ordinal, Some(12));
            assert!(external.persistent);
            assert!(external.thread_safe);
        }
        other => panic!("Expected PROCEDURE, got {:?}", other),
    }
}

#[test]
fn test_in_super_prototype() {
    match parse_one("PROCEDURE shared IN SUPER.") {
        Statement::Procedure(proc) => assert!(proc.in_super && proc.prototype_only),
        other => panic!("Expected PROCEDURE, got {:?}", other),
    }
    assert!(parse_program("PROCEDURE p IN x.").is_err());
}

#[test]
fn test_run_arguments_with_modes() {
    match parse_one("RUN Calc (INPUT 21, OUTPUT result, n + 1).") {
        Statement::Run(run) => {
            assert_eq!(run.name, "calc");
            assert_eq!(run.args.len(), 3);
            assert_eq!(run.args[0].mode, Some(ParamMode::Input));
            assert_eq!(run.args[1].mode, Some(ParamMode::Output));
            assert_eq!(run.args[1].expr, Expr::Var("result".to_string()));
            assert_eq!(run.args[2].mode, None);
        }
        other => panic!("Expected RUN, got {:?}", other),
    }

    match parse_one("RUN setup.") {
        Statement::Run(run) => assert!(run.args.is_empty()),
        other => panic!("Expected RUN, got {:?}", other),
    }
}

// ============================================================================
// INPUT
// ============================================================================

#[test]
fn test_input_target() {
    match parse_one("INPUT Answer.") {
        Statement::Input(input) => {
            assert_eq!(input.target.as_deref(), Some("answer"));
            assert!(input.source.is_none());
        }
        other => panic!("Expected INPUT, got {:?}", other),
    }
}

#[test]
fn test_input_from_value_with_options() {
    match parse_one("INPUT x FROM VALUE(\"data.txt\") NO-ECHO BINARY.") {
        Statement::Input(input) => {
            assert_eq!(
                input.source,
                Some(InputSource::Value(Expr::String("data.txt".to_string())))
            );
            let options = input.options.expect("options");
            assert_eq!(options.echo, Some(false));
            assert!(options.binary);
        }
        other => panic!("Expected INPUT, got {:?}", other),
    }
}

#[test]
fn test_input_requires_something() {
    let err = parse_program("INPUT.").unwrap_err();
    assert!(matches!(err, ParseError::Invalid { .. }));
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn test_stray_dots_are_skipped() {
    assert_eq!(parse(". . x = 1. .").len(), 1);
}

#[test]
fn test_lex_errors_surface_through_parser() {
    let err = parse_program("x = 1 @").unwrap_err();
    assert!(matches!(err, ParseError::Lex(_)));
}
