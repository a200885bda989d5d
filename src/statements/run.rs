use tracing::debug;

use crate::{
    ast::{Expr, Keyword, ParamMode, Run, RunArg, Statement, TokenKind},
    evaluator::{Env, EvalError, Evaluator},
    grammar::StatementModule,
    parser::{ParseError, Parser},
};

use super::define::initial_value;

pub const MODULE: StatementModule = StatementModule {
    name: "run",
    keywords: &[Keyword::Run],
    identifier_start: None,
    parse,
};

/// `RUN name [( [INPUT|OUTPUT] expr, ... )] [.]`
fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.expect_keyword(Keyword::Run)?;
    let name = parser.expect_ident()?.to_ascii_lowercase();

    let mut args = Vec::new();
    if parser.match_kind(&TokenKind::LParen) {
        if !parser.check(&TokenKind::RParen) {
            loop {
                let mode = if parser.match_keyword(Keyword::Input) {
                    Some(ParamMode::Input)
                } else if parser.match_keyword(Keyword::Output) {
                    Some(ParamMode::Output)
                } else {
                    None
                };
                let expr = parser.parse_expression()?;
                args.push(RunArg { mode, expr });
                if !parser.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        parser.expect(TokenKind::RParen)?;
    }

    parser.optional_dot();
    Ok(Statement::Run(Run { name, args }))
}

/// Invokes a registered procedure.
///
/// The callee runs in a fresh frame whose parent is the caller's frame.
/// INPUT arguments are evaluated in the caller. OUTPUT arguments must be
/// plain variables; their parameters start from the caller's current value
/// (or the type default) and are copied back once the body completes.
pub async fn execute(ev: &Evaluator, node: &Run, env: &Env) -> Result<(), EvalError> {
    let entry = env
        .context()
        .procedure(&node.name)
        .ok_or_else(|| EvalError::UnknownProcedure(node.name.clone()))?;
    let decl = &entry.decl;

    if decl.prototype_only || decl.in_super {
        return Err(EvalError::Unsupported(format!(
            "Procedure {} is only a prototype and has no body to run",
            decl.name
        )));
    }
    if decl.external.is_some() {
        return Err(EvalError::Unsupported(format!(
            "External procedure {} cannot be run in this runtime",
            decl.name
        )));
    }
    if decl.is_private {
        let visible = entry
            .owner
            .upgrade()
            .is_some_and(|owner| env.is_within(&owner));
        if !visible {
            return Err(EvalError::Call(format!(
                "Procedure {} is PRIVATE and cannot be run from here",
                decl.name
            )));
        }
    }
    if node.args.len() != decl.parameters.len() {
        return Err(EvalError::Arity {
            name: decl.name.clone(),
            expected: decl.parameters.len(),
            found: node.args.len(),
        });
    }

    let callee = env.child();
    let mut outputs = Vec::new();

    for (param, arg) in decl.parameters.iter().zip(&node.args) {
        if let Some(mode) = arg.mode
            && mode != param.mode
        {
            return Err(EvalError::Call(format!(
                "Parameter {} of {} is {} but the argument was passed as {}",
                param.name, decl.name, param.mode, mode
            )));
        }

        match param.mode {
            ParamMode::Input => {
                let value = ev.eval_expr(&arg.expr, env)?;
                callee.define(&param.name, value);
            }
            ParamMode::Output => {
                let Expr::Var(target) = &arg.expr else {
                    return Err(EvalError::Call(format!(
                        "OUTPUT argument for parameter {} of {} must be a variable",
                        param.name, decl.name
                    )));
                };
                let seed = match env.lookup(target) {
                    Some(value) => value,
                    None => match &param.init {
                        Some(expr) => ev.eval_expr(expr, env)?,
                        None => initial_value(param.data_type.as_deref()),
                    },
                };
                callee.define(&param.name, seed);
                outputs.push((param.name.as_str(), target.as_str()));
            }
        }
    }

    debug!(procedure = %decl.name, args = node.args.len(), "running procedure");
    ev.exec_block(&decl.body, &callee).await?;

    for (param, target) in outputs {
        env.assign(target, callee.get(param));
    }
    Ok(())
}
