use tracing::debug;

use crate::{
    ast::{ForEach, Keyword, Op, Qualifier, SortKey, Statement, TokenKind},
    evaluator::{Env, EvalError, Evaluator},
    grammar::StatementModule,
    parser::{ParseError, Parser},
    query::{QuerySpec, compile_query},
    store::Delegate,
    value::Value,
};

use super::SavedBuffer;

pub const MODULE: StatementModule = StatementModule {
    name: "for_each",
    keywords: &[Keyword::For],
    identifier_start: None,
    parse,
};

/// Consumes `NO [-] word`. The hyphen is optional; nothing is consumed
/// unless the whole sequence is present.
pub(super) fn match_no(parser: &mut Parser, word: &str) -> bool {
    if !parser.check_keyword(Keyword::No) {
        return false;
    }
    let offset = match parser.peek_at(1) {
        Some(t) if t.is_op(Op::Minus) => 2,
        _ => 1,
    };
    if !parser.peek_at(offset).is_some_and(|t| t.is_word(word)) {
        return false;
    }
    for _ in 0..=offset {
        parser.advance();
    }
    true
}

/// `FOR EACH|FIRST|LAST target [OF parent] [NO-LOCK] [WHERE e] [NO-LOCK]
/// [[BREAK] BY path [DESCENDING]]... : body END [.]`
fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.expect_keyword(Keyword::For)?;
    let qualifier = if parser.match_keyword(Keyword::Each) {
        Qualifier::Each
    } else if parser.match_keyword(Keyword::First) {
        Qualifier::First
    } else if parser.match_keyword(Keyword::Last) {
        Qualifier::Last
    } else {
        return Err(parser.expected("EACH, FIRST, or LAST after FOR"));
    };

    let target = parser.expect_ident()?;
    let relation = if parser.match_keyword(Keyword::Of) {
        Some(parser.expect_ident()?)
    } else {
        None
    };

    let mut no_lock = parse_no_lock(parser)?;
    let where_clause = if parser.match_keyword(Keyword::Where) {
        Some(parser.parse_expression()?)
    } else {
        None
    };
    no_lock |= parse_no_lock(parser)?;

    let mut order_by = Vec::new();
    loop {
        let break_group = parser.match_keyword(Keyword::Break);
        if !parser.match_keyword(Keyword::By) {
            if break_group {
                return Err(parser.expected("BY after BREAK"));
            }
            break;
        }
        let path = parser.parse_field_path()?;
        let descending = parser.match_keyword(Keyword::Descending);
        order_by.push(SortKey {
            path,
            descending,
            break_group,
        });
    }

    parser.expect(TokenKind::Colon)?;
    let body = parser.parse_block_statements()?;
    parser.parse_block_end()?;

    Ok(Statement::ForEach(ForEach {
        qualifier,
        target,
        relation,
        where_clause,
        order_by,
        no_lock,
        body,
    }))
}

fn parse_no_lock(parser: &mut Parser) -> Result<bool, ParseError> {
    if match_no(parser, "LOCK") {
        return Ok(true);
    }
    if parser.check_keyword(Keyword::No) {
        return Err(parser.invalid("Expected LOCK after NO in FOR EACH"));
    }
    Ok(false)
}

/// Fetches the matching rows, then runs the body once per row with the row
/// bound to the buffer and to the variable of the same name. Both are
/// cleared before the first row and put back afterwards.
pub async fn execute(ev: &Evaluator, node: &ForEach, env: &Env) -> Result<(), EvalError> {
    let context = env.context();
    let store = context.store().ok_or_else(|| {
        EvalError::Unsupported("A record store is required for FOR EACH statements".to_string())
    })?;
    let delegate = Delegate::resolve(store.as_ref(), &node.target)?;

    let order_by: &[SortKey] = match node.qualifier {
        Qualifier::Each => &node.order_by,
        Qualifier::First | Qualifier::Last => &[],
    };
    let query = compile_query(
        ev,
        env,
        &QuerySpec {
            statement: "FOR EACH",
            target: &node.target,
            relation: node.relation.as_deref(),
            where_clause: node.where_clause.as_ref(),
            order_by,
        },
    )?;

    let rows: Vec<Value> = match node.qualifier {
        Qualifier::First => delegate.find_first(&query).await?.into_iter().collect(),
        Qualifier::Last => delegate.find_many(&query).await?.pop().into_iter().collect(),
        Qualifier::Each => delegate.find_many(&query).await?,
    };
    debug!(model = %node.target, rows = rows.len(), "FOR EACH fetched");

    let name = node.target.to_ascii_lowercase();
    let saved = SavedBuffer::clear(&name, env);

    let mut result = Ok(());
    for row in rows {
        context.set_record(&name, row.clone());
        env.define(&name, row);
        result = ev.exec_block(&node.body, env).await;
        if result.is_err() {
            break;
        }
    }

    saved.restore(env);
    result
}
