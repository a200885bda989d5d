use crate::{
    ast::{Display, DisplayItem, DisplayOption, Keyword, Op, Statement, Token, TokenKind},
    evaluator::{Env, EvalError, Evaluator},
    format,
    grammar::StatementModule,
    parser::{ParseError, Parser},
};

pub const MODULE: StatementModule = StatementModule {
    name: "display",
    keywords: &[Keyword::Display, Keyword::Print],
    identifier_start: None,
    parse,
};

/// Tokens that can begin another DISPLAY item without a separating comma.
fn starts_expression(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Ident(_)
            | TokenKind::Integer(_)
            | TokenKind::Float(_)
            | TokenKind::String(_)
            | TokenKind::Unknown
            | TokenKind::LParen
            | TokenKind::Op(Op::Plus)
            | TokenKind::Op(Op::Minus)
            | TokenKind::Keyword(Keyword::Not)
    )
}

/// `DISPLAY|PRINT item [, item | item]... [WITH option [, option]...] [.]`
fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.advance(); // DISPLAY or PRINT

    let mut items = Vec::new();
    loop {
        let mut item = DisplayItem {
            expr: parser.parse_expression()?,
            label: None,
            format: None,
        };
        loop {
            if parser.match_keyword(Keyword::Label) {
                item.label = Some(parser.parse_expression()?);
            } else if parser.match_keyword(Keyword::Format) {
                item.format = Some(parser.parse_expression()?);
            } else {
                break;
            }
        }
        items.push(item);

        if parser.match_kind(&TokenKind::Comma) || starts_expression(parser.peek()) {
            continue;
        }
        break;
    }

    let mut options = Vec::new();
    if parser.match_keyword(Keyword::With) {
        loop {
            if parser.match_keyword(Keyword::Centered) {
                options.push(DisplayOption::Centered);
            } else if parser.match_keyword(Keyword::Frame) {
                if starts_expression(parser.peek()) {
                    parser.parse_expression()?;
                }
                options.push(DisplayOption::Frame);
            } else if let TokenKind::Ident(name) = &parser.peek().kind {
                let name = name.to_ascii_uppercase();
                parser.advance();
                options.push(DisplayOption::Other(name));
            } else {
                break;
            }

            if !parser.match_kind(&TokenKind::Comma) {
                break;
            }
        }
    }

    parser.optional_dot();
    Ok(Statement::Display(Display { items, options }))
}

pub fn execute(ev: &Evaluator, node: &Display, env: &Env) -> Result<(), EvalError> {
    let mut parts = Vec::with_capacity(node.items.len());

    for item in &node.items {
        let value = ev.eval_expr(&item.expr, env)?;
        let format_spec = match &item.format {
            Some(expr) => Some(ev.eval_expr(expr, env)?),
            None => None,
        };
        let formatted = format::format_display_value(&value, format_spec.as_ref());

        let label = match &item.label {
            Some(expr) => ev.eval_expr(expr, env)?.as_text(),
            None => String::new(),
        };
        if label.is_empty() {
            parts.push(formatted);
        } else {
            parts.push(format!("{} {}", label, formatted).trim().to_string());
        }
    }

    let line = parts.join(" ");
    let line = if node.is_centered() {
        format::center_line(&line)
    } else {
        line
    };
    env.context().emit(line);
    Ok(())
}
