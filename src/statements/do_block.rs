use crate::{
    ast::{Do, Keyword, LoopRange, Op, RecordRef, Statement, TokenKind},
    evaluator::{Env, EvalError, Evaluator},
    grammar::StatementModule,
    parser::{ParseError, Parser},
    value::Value,
};

use super::SavedBuffer;

pub const MODULE: StatementModule = StatementModule {
    name: "do",
    keywords: &[Keyword::Do],
    identifier_start: Some(is_labelled_do),
    parse,
};

/// `label : DO`
fn is_labelled_do(parser: &Parser) -> bool {
    matches!(parser.peek().kind, TokenKind::Ident(_))
        && parser.peek_at(1).is_some_and(|t| t.kind == TokenKind::Colon)
        && parser.peek_at(2).is_some_and(|t| t.is_keyword(Keyword::Do))
}

/// `[label:] DO [FOR buf, ...] [TRANSACTION] [var = a TO b [BY s]] [WHILE e] [:] ... END [.]`
///
/// The header options may appear in any order, each at most once.
fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    let mut label = None;
    if is_labelled_do(parser) {
        label = Some(parser.expect_ident()?);
        parser.expect(TokenKind::Colon)?;
    }
    parser.expect_keyword(Keyword::Do)?;

    let mut records = Vec::new();
    let mut transaction = false;
    let mut range = None;
    let mut while_cond = None;

    loop {
        if records.is_empty() && parser.match_keyword(Keyword::For) {
            records.push(parse_record_ref(parser)?);
            while parser.match_kind(&TokenKind::Comma) {
                records.push(parse_record_ref(parser)?);
            }
            continue;
        }
        if !transaction && parser.match_word("TRANSACTION") {
            transaction = true;
            continue;
        }
        if range.is_none()
            && matches!(parser.peek().kind, TokenKind::Ident(_))
            && parser.peek_at(1).is_some_and(|t| t.is_op(Op::Eq))
        {
            range = Some(parse_range(parser)?);
            continue;
        }
        if while_cond.is_none() && parser.match_keyword(Keyword::While) {
            while_cond = Some(parser.parse_expression()?);
            continue;
        }
        break;
    }

    parser.match_kind(&TokenKind::Colon);
    let body = parser.parse_block_statements()?;
    parser.parse_block_end()?;

    Ok(Statement::Do(Do {
        label,
        records,
        transaction,
        range,
        while_cond,
        body,
    }))
}

fn parse_record_ref(parser: &mut Parser) -> Result<RecordRef, ParseError> {
    let path = parser.parse_field_path()?;
    let name = path.last().cloned().unwrap_or_default();
    Ok(RecordRef { name, path })
}

fn parse_range(parser: &mut Parser) -> Result<LoopRange, ParseError> {
    let variable = parser.expect_ident()?.to_ascii_lowercase();
    parser.advance(); // '='
    let from = parser.parse_expression()?;
    if !parser.check_keyword(Keyword::To) {
        return Err(parser.expected("TO in DO iteration range"));
    }
    parser.advance();
    let to = parser.parse_expression()?;
    let step = if parser.match_keyword(Keyword::By) {
        Some(parser.parse_expression()?)
    } else {
        None
    };
    Ok(LoopRange {
        variable,
        from,
        to,
        step,
    })
}

pub async fn execute(ev: &Evaluator, node: &Do, env: &Env) -> Result<(), EvalError> {
    if let Some(range) = &node.range {
        return run_counted(ev, node, range, env).await;
    }

    if let Some(condition) = &node.while_cond {
        while ev.eval_expr(condition, env)?.is_truthy() {
            run_iteration(ev, node, env).await?;
        }
        return Ok(());
    }

    run_iteration(ev, node, env).await
}

/// The limit is re-evaluated before every pass; the step is fixed up front.
async fn run_counted(
    ev: &Evaluator,
    node: &Do,
    range: &LoopRange,
    env: &Env,
) -> Result<(), EvalError> {
    let step = match &range.step {
        Some(expr) => ev.eval_expr(expr, env)?.to_number(),
        None => 1.0,
    };
    if !step.is_finite() || step == 0.0 {
        return Err(EvalError::InvalidLoop(
            "DO loop BY value must be a non-zero finite number".to_string(),
        ));
    }

    let mut current = ev.eval_expr(&range.from, env)?.to_number();
    loop {
        let limit = ev.eval_expr(&range.to, env)?.to_number();
        if !limit.is_finite() || !current.is_finite() {
            return Err(EvalError::InvalidLoop(
                "DO loop bounds must evaluate to finite numbers".to_string(),
            ));
        }
        let within = if step >= 0.0 {
            current <= limit
        } else {
            current >= limit
        };
        if !within {
            break;
        }

        env.assign(&range.variable, Value::from_f64(current));
        if let Some(condition) = &node.while_cond
            && !ev.eval_expr(condition, env)?.is_truthy()
        {
            break;
        }
        run_iteration(ev, node, env).await?;
        current += step;
    }
    Ok(())
}

/// One pass over the body with the `DO FOR` buffers cleared and then put
/// back, even when the body fails.
async fn run_iteration(ev: &Evaluator, node: &Do, env: &Env) -> Result<(), EvalError> {
    let saved: Vec<SavedBuffer> = node
        .records
        .iter()
        .map(|record| SavedBuffer::clear(&record.name, env))
        .collect();

    let result = ev.exec_block(&node.body, env).await;

    for buffer in saved.into_iter().rev() {
        buffer.restore(env);
    }
    result
}
