use crate::{
    ast::{
        ConvertOption, Expr, Input, InputOptions, InputSource, Keyword, MapOption, Statement,
        StreamClause, TokenKind,
    },
    evaluator::{Env, EvalError, Evaluator},
    grammar::StatementModule,
    parser::{ParseError, Parser},
    value::Value,
};

pub const MODULE: StatementModule = StatementModule {
    name: "input",
    keywords: &[Keyword::Input],
    identifier_start: None,
    parse,
};

/// `INPUT [STREAM s | STREAM-HANDLE h] [target] [FROM source [options]] [.]`
fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.expect_keyword(Keyword::Input)?;

    let stream = parse_stream_clause(parser)?;

    let target = if matches!(parser.peek().kind, TokenKind::Ident(_)) {
        Some(parser.expect_ident()?.to_ascii_lowercase())
    } else {
        None
    };

    let mut source = None;
    let mut options = None;
    if parser.match_keyword(Keyword::From) {
        source = Some(parse_source(parser)?);
        options = parse_options(parser)?;
    }

    if target.is_none() && source.is_none() && stream.is_none() {
        return Err(parser.invalid("INPUT statement requires a target variable or FROM clause"));
    }

    parser.optional_dot();
    Ok(Statement::Input(Input {
        target,
        stream,
        source,
        options,
    }))
}

fn parse_stream_clause(parser: &mut Parser) -> Result<Option<StreamClause>, ParseError> {
    if parser.match_hyphenated(&["STREAM", "HANDLE"]) {
        let handle = parser.expect_ident()?.to_ascii_lowercase();
        return Ok(Some(StreamClause::StreamHandle(handle)));
    }
    if parser.match_keyword(Keyword::Stream) {
        let name = parser.expect_ident()?.to_ascii_lowercase();
        return Ok(Some(StreamClause::Stream(name)));
    }
    Ok(None)
}

/// `VALUE ( expr )`
fn parse_value_expression(parser: &mut Parser) -> Result<Expr, ParseError> {
    parser.expect_keyword(Keyword::Value)?;
    parser.expect(TokenKind::LParen)?;
    let expr = parser.parse_expression()?;
    parser.expect(TokenKind::RParen)?;
    Ok(expr)
}

fn parse_source(parser: &mut Parser) -> Result<InputSource, ParseError> {
    if parser.match_keyword(Keyword::Terminal) {
        return Ok(InputSource::Terminal);
    }
    if parser.check_keyword(Keyword::Value) {
        return Ok(InputSource::Value(parse_value_expression(parser)?));
    }
    if parser.match_hyphenated(&["OS", "DIR"]) {
        parser.expect(TokenKind::LParen)?;
        let directory = parser.parse_expression()?;
        parser.expect(TokenKind::RParen)?;
        let no_attr_list = parser.match_hyphenated(&["NO", "ATTR", "LIST"]);
        return Ok(InputSource::OsDir {
            directory,
            no_attr_list,
        });
    }
    Ok(InputSource::Expr(parser.parse_expression()?))
}

fn parse_options(parser: &mut Parser) -> Result<Option<InputOptions>, ParseError> {
    let mut options = InputOptions::default();
    let mut consumed = false;

    loop {
        if parser.match_hyphenated(&["LOB", "DIR"]) {
            options.lob_dir = Some(if parser.check_keyword(Keyword::Value) {
                parse_value_expression(parser)?
            } else {
                parser.parse_expression()?
            });
        } else if parser.match_keyword(Keyword::Binary) {
            options.binary = true;
        } else if parser.match_hyphenated(&["NO", "ECHO"]) {
            options.echo = Some(false);
        } else if parser.match_keyword(Keyword::Echo) {
            options.echo = Some(true);
        } else if parser.match_hyphenated(&["NO", "MAP"]) {
            options.map = Some(MapOption::None);
        } else if parser.match_keyword(Keyword::Map) {
            options.map = Some(MapOption::Entry(parser.parse_expression()?));
        } else if parser.match_keyword(Keyword::Unbuffered) {
            options.unbuffered = true;
        } else if parser.match_hyphenated(&["NO", "CONVERT"]) {
            options.convert = Some(ConvertOption::None);
        } else if parser.match_keyword(Keyword::Convert) {
            let target = if parser.match_keyword(Keyword::Target) {
                Some(parser.parse_expression()?)
            } else {
                None
            };
            let source = if parser.match_keyword(Keyword::Source) {
                Some(parser.parse_expression()?)
            } else {
                None
            };
            options.convert = Some(ConvertOption::Convert { target, source });
        } else {
            break;
        }
        consumed = true;
    }

    Ok(consumed.then_some(options))
}

pub fn execute(ev: &Evaluator, node: &Input, env: &Env) -> Result<(), EvalError> {
    let Some(target) = &node.target else {
        if node.stream.is_some() {
            return Err(EvalError::Unsupported(
                "INPUT STREAM configuration is not supported in this runtime".to_string(),
            ));
        }
        if node.source.is_some() {
            return Err(EvalError::Unsupported(
                "INPUT FROM without a target variable is not supported in this runtime".to_string(),
            ));
        }
        return Ok(());
    };

    let value = match &node.source {
        None | Some(InputSource::Terminal) => env.context().next_input().unwrap_or(Value::Null),
        Some(InputSource::Value(expr)) | Some(InputSource::Expr(expr)) => ev.eval_expr(expr, env)?,
        Some(InputSource::OsDir { .. }) => {
            return Err(EvalError::Unsupported(
                "INPUT FROM OS-DIR is not supported in this runtime".to_string(),
            ));
        }
    };
    env.assign(target, value);
    Ok(())
}
