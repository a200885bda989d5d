use crate::{
    ast::{Assign, Keyword, Op, Statement, TokenKind},
    evaluator::{Env, EvalError, Evaluator},
    grammar::StatementModule,
    parser::{ParseError, Parser},
};

pub const MODULE: StatementModule = StatementModule {
    name: "assign",
    keywords: &[Keyword::Assign],
    identifier_start: Some(any_identifier),
    parse,
};

fn any_identifier(_: &Parser) -> bool {
    true
}

/// `[ASSIGN] ident = expr [.]`
fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.match_keyword(Keyword::Assign);
    let target = parser.expect_ident()?.to_ascii_lowercase();

    let token = parser.peek();
    if !token.is_op(Op::Eq) {
        let found = match &token.kind {
            TokenKind::Op(op) => op.to_string(),
            other => other.tag(),
        };
        return Err(ParseError::Expected {
            expected: "'='".to_string(),
            found,
            position: token.span.start,
        });
    }
    parser.advance();

    let value = parser.parse_expression()?;
    parser.optional_dot();
    Ok(Statement::Assign(Assign { target, value }))
}

pub fn execute(ev: &Evaluator, node: &Assign, env: &Env) -> Result<(), EvalError> {
    let value = ev.eval_expr(&node.value, env)?;
    env.assign(&node.target, value);
    Ok(())
}
