use crate::{
    ast::{Keyword, Repeat, Statement, TokenKind},
    evaluator::{Env, EvalError, Evaluator},
    grammar::StatementModule,
    parser::{ParseError, Parser},
};

pub const MODULE: StatementModule = StatementModule {
    name: "repeat",
    keywords: &[Keyword::Repeat],
    identifier_start: None,
    parse,
};

/// `REPEAT [WHILE expr] [:] ... END [.]`
fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.expect_keyword(Keyword::Repeat)?;
    let while_cond = if parser.match_keyword(Keyword::While) {
        Some(parser.parse_expression()?)
    } else {
        None
    };
    parser.match_kind(&TokenKind::Colon);
    let body = parser.parse_block_statements()?;
    parser.parse_block_end()?;
    Ok(Statement::Repeat(Repeat { while_cond, body }))
}

/// Runs the body while the condition holds. A REPEAT without WHILE is
/// refused at run time.
pub async fn execute(ev: &Evaluator, node: &Repeat, env: &Env) -> Result<(), EvalError> {
    let Some(condition) = &node.while_cond else {
        return Err(EvalError::Unsupported(
            "REPEAT without WHILE is not supported".to_string(),
        ));
    };
    while ev.eval_expr(condition, env)?.is_truthy() {
        ev.exec_block(&node.body, env).await?;
    }
    Ok(())
}
