use tracing::debug;

use crate::{
    ast::{Find, Keyword, Qualifier, Statement},
    evaluator::{Env, EvalError, Evaluator},
    grammar::StatementModule,
    parser::{ParseError, Parser},
    query::{QuerySpec, compile_query},
    store::Delegate,
    value::Value,
};

use super::for_each::match_no;

pub const MODULE: StatementModule = StatementModule {
    name: "find",
    keywords: &[Keyword::Find],
    identifier_start: None,
    parse,
};

/// `FIND [FIRST|LAST] target [OF parent] [WHERE e] [NO-LOCK] [NO-ERROR] [.]`
fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.expect_keyword(Keyword::Find)?;
    let qualifier = if parser.match_keyword(Keyword::First) {
        Some(Qualifier::First)
    } else if parser.match_keyword(Keyword::Last) {
        Some(Qualifier::Last)
    } else {
        None
    };

    let target = parser.expect_ident()?;
    let relation = if parser.match_keyword(Keyword::Of) {
        Some(parser.expect_ident()?)
    } else {
        None
    };
    let where_clause = if parser.match_keyword(Keyword::Where) {
        Some(parser.parse_expression()?)
    } else {
        None
    };

    let mut no_lock = false;
    let mut no_error = false;
    loop {
        if !no_lock && match_no(parser, "LOCK") {
            no_lock = true;
            continue;
        }
        if !no_error && parser.check_keyword(Keyword::No) {
            // A bare NO means NO-ERROR
            if !match_no(parser, "ERROR") {
                parser.advance();
            }
            no_error = true;
            continue;
        }
        break;
    }

    parser.optional_dot();
    Ok(Statement::Find(Find {
        qualifier,
        target,
        relation,
        where_clause,
        no_lock,
        no_error,
    }))
}

/// Binds at most one row to the buffer and the variable of the same name.
/// The binding is not scoped: it stays until something rebinds it.
pub async fn execute(ev: &Evaluator, node: &Find, env: &Env) -> Result<(), EvalError> {
    let context = env.context();
    let store = context.store().ok_or_else(|| {
        EvalError::Unsupported("A record store is required for FIND statements".to_string())
    })?;
    let delegate = Delegate::resolve(store.as_ref(), &node.target)?;

    let query = compile_query(
        ev,
        env,
        &QuerySpec {
            statement: "FIND",
            target: &node.target,
            relation: node.relation.as_deref(),
            where_clause: node.where_clause.as_ref(),
            order_by: &[],
        },
    )?;

    let found = match node.qualifier {
        Some(Qualifier::Last) => delegate.find_many(&query).await?.pop(),
        _ => delegate.find_first(&query).await?,
    };

    let name = node.target.to_ascii_lowercase();
    let record = match found {
        Some(record) => record,
        None if node.no_error => Value::Null,
        None => return Err(EvalError::RecordNotFound(node.target.clone())),
    };
    debug!(model = %node.target, found = !record.is_null(), "FIND");

    context.set_record(&name, record.clone());
    env.define(&name, record);
    Ok(())
}
