use crate::{
    ast::{If, Keyword, Statement},
    evaluator::{Env, EvalError, Evaluator},
    grammar::StatementModule,
    parser::{ParseError, Parser},
};

pub const MODULE: StatementModule = StatementModule {
    name: "if",
    keywords: &[Keyword::If],
    identifier_start: None,
    parse,
};

/// `IF expr THEN body [ELSE body]`, each body a `: ... END` block or a
/// single statement.
fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.expect_keyword(Keyword::If)?;
    let condition = parser.parse_expression()?;
    parser.expect_keyword(Keyword::Then)?;
    let then_branch = Box::new(parser.parse_possibly_block()?);

    let else_branch = if parser.match_keyword(Keyword::Else) {
        Some(Box::new(parser.parse_possibly_block()?))
    } else {
        None
    };

    Ok(Statement::If(If {
        condition,
        then_branch,
        else_branch,
    }))
}

pub async fn execute(ev: &Evaluator, node: &If, env: &Env) -> Result<(), EvalError> {
    let branch = if ev.eval_expr(&node.condition, env)?.is_truthy() {
        Some(&node.then_branch)
    } else {
        node.else_branch.as_ref()
    };

    match branch.map(|b| b.as_ref()) {
        Some(Statement::Block(body)) => ev.exec_block(body, env).await,
        Some(other) => ev.exec_block(std::slice::from_ref(other), env).await,
        None => Ok(()),
    }
}
