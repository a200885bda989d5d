use crate::{
    ast::{Expr, Keyword, Op, ParamMode, Parameter, Statement, TokenKind, VariableDecl},
    evaluator::{Env, EvalError, Evaluator},
    grammar::StatementModule,
    parser::{ParseError, Parser},
    value::Value,
};

pub const MODULE: StatementModule = StatementModule {
    name: "define",
    keywords: &[Keyword::Define],
    identifier_start: None,
    parse,
};

struct Details {
    name: String,
    data_type: Option<String>,
    init: Option<Expr>,
    no_undo: bool,
}

fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.expect_keyword(Keyword::Define)?;

    if parser.match_keyword(Keyword::Variable) {
        let details = parse_details(parser)?;
        parser.optional_dot();
        return Ok(Statement::DefineVariable(VariableDecl {
            name: details.name,
            data_type: details.data_type,
            init: details.init,
            no_undo: details.no_undo,
        }));
    }

    let mode = if parser.match_keyword(Keyword::Input) {
        ParamMode::Input
    } else if parser.match_keyword(Keyword::Output) {
        ParamMode::Output
    } else {
        let found = parser.peek().kind.tag();
        return Err(parser.invalid(format!("Unsupported DEFINE form: DEFINE {}", found)));
    };

    parser.expect_keyword(Keyword::Parameter)?;
    let details = parse_details(parser)?;
    parser.optional_dot();
    Ok(Statement::DefineParameter(Parameter {
        mode,
        name: details.name,
        data_type: details.data_type,
        init: details.init,
        no_undo: details.no_undo,
    }))
}

/// `ident [AS type] [INIT [=] expr] [NO-UNDO]`, options in any order.
fn parse_details(parser: &mut Parser) -> Result<Details, ParseError> {
    let name = parser.expect_ident()?.to_ascii_lowercase();

    let mut data_type = None;
    if parser.match_keyword(Keyword::As) {
        let token = parser.advance();
        let text = match token.kind {
            TokenKind::Ident(name) => name,
            TokenKind::Keyword(keyword) => keyword.as_str().to_string(),
            other => {
                return Err(ParseError::Expected {
                    expected: "type name".to_string(),
                    found: other.tag(),
                    position: token.span.start,
                });
            }
        };
        data_type = Some(text.to_ascii_uppercase());
    }

    let mut init = None;
    let mut no_undo = false;
    loop {
        if parser.match_keyword(Keyword::Init) {
            parser.match_op(Op::Eq);
            init = Some(parser.parse_expression()?);
            continue;
        }
        if parser.match_keyword(Keyword::No) {
            parser.match_op(Op::Minus);
            parser.match_keyword(Keyword::Undo);
            no_undo = true;
            continue;
        }
        break;
    }

    Ok(Details {
        name,
        data_type,
        init,
        no_undo,
    })
}

/// Value a variable or OUTPUT parameter starts with when it has no `INIT`.
pub fn initial_value(data_type: Option<&str>) -> Value {
    match data_type.map(str::to_ascii_uppercase).as_deref() {
        Some(
            "INTEGER" | "INT" | "INT64" | "DECIMAL" | "DEC" | "NUMERIC" | "FLOAT" | "DOUBLE",
        ) => Value::Integer(0),
        Some("LOGICAL" | "BOOLEAN") => Value::Boolean(false),
        Some("CHARACTER" | "CHAR" | "STRING" | "LONGCHAR") => Value::String(String::new()),
        _ => Value::Null,
    }
}

pub fn execute_variable(ev: &Evaluator, node: &VariableDecl, env: &Env) -> Result<(), EvalError> {
    let value = match &node.init {
        Some(expr) => ev.eval_expr(expr, env)?,
        None => initial_value(node.data_type.as_deref()),
    };
    env.define(&node.name, value);
    Ok(())
}
