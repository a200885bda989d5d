use crate::{
    ast::{Keyword, Statement, TokenKind, While},
    evaluator::{Env, EvalError, Evaluator},
    grammar::StatementModule,
    parser::{ParseError, Parser},
};

pub const MODULE: StatementModule = StatementModule {
    name: "while",
    keywords: &[Keyword::While],
    identifier_start: None,
    parse,
};

/// `WHILE expr DO [:] ... END [.]`
fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.expect_keyword(Keyword::While)?;
    let condition = parser.parse_expression()?;
    parser.expect_keyword(Keyword::Do)?;
    parser.match_kind(&TokenKind::Colon);
    let body = parser.parse_block_statements()?;
    parser.parse_block_end()?;
    Ok(Statement::While(While { condition, body }))
}

pub async fn execute(ev: &Evaluator, node: &While, env: &Env) -> Result<(), EvalError> {
    while ev.eval_expr(&node.condition, env)?.is_truthy() {
        ev.exec_block(&node.body, env).await?;
    }
    Ok(())
}
