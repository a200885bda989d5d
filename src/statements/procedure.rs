use crate::{
    ast::{CallingConvention, ExternalBinding, Keyword, Op, Procedure, Statement, TokenKind},
    evaluator::{Env, EvalError},
    grammar::StatementModule,
    parser::{ParseError, Parser},
};

pub const MODULE: StatementModule = StatementModule {
    name: "procedure",
    keywords: &[Keyword::Procedure],
    identifier_start: None,
    parse,
};

/// ```text
/// PROCEDURE name [PRIVATE] [EXTERNAL "lib" [CDECL|PASCAL|STDCALL] [ORDINAL n]
///     [PERSISTENT] [THREAD-SAFE]] [IN SUPER] ( : body END [PROCEDURE] [.] | . )
/// ```
fn parse(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.expect_keyword(Keyword::Procedure)?;
    let name = parser.expect_ident()?.to_ascii_lowercase();

    let mut is_private = false;
    let mut external = None;
    let mut in_super = false;

    loop {
        if !is_private && parser.match_keyword(Keyword::Private) {
            is_private = true;
            continue;
        }
        if external.is_none() && !in_super && parser.match_keyword(Keyword::External) {
            external = Some(parse_external(parser)?);
            continue;
        }
        if external.is_none() && !in_super && parser.match_keyword(Keyword::In) {
            if !parser.match_keyword(Keyword::Super) {
                return Err(parser.expected("SUPER after IN"));
            }
            in_super = true;
            continue;
        }
        break;
    }

    let mut prototype_only = false;
    let mut statements = Vec::new();
    if parser.match_kind(&TokenKind::Colon) {
        statements = parser.parse_block_statements()?;
        parser.expect_keyword(Keyword::End)?;
        parser.match_keyword(Keyword::Procedure);
        parser.optional_dot();
    } else if parser.match_kind(&TokenKind::Dot) {
        prototype_only = true;
    } else {
        return Err(parser.expected(": or . after PROCEDURE header"));
    }

    let mut parameters = Vec::new();
    let mut body = Vec::new();
    for stmt in statements {
        match stmt {
            Statement::DefineParameter(param) => parameters.push(param),
            Statement::Empty => {}
            other => body.push(other),
        }
    }

    Ok(Statement::Procedure(Procedure {
        name,
        parameters,
        body,
        is_private,
        external,
        in_super,
        prototype_only,
    }))
}

fn parse_external(parser: &mut Parser) -> Result<ExternalBinding, ParseError> {
    let library = match &parser.peek().kind {
        TokenKind::String(s) => s.clone(),
        _ => return Err(parser.expected("string literal after EXTERNAL")),
    };
    parser.advance();

    let calling_convention = if parser.match_keyword(Keyword::Cdecl) {
        Some(CallingConvention::Cdecl)
    } else if parser.match_keyword(Keyword::Pascal) {
        Some(CallingConvention::Pascal)
    } else if parser.match_keyword(Keyword::Stdcall) {
        Some(CallingConvention::Stdcall)
    } else {
        None
    };

    let mut ordinal = None;
    if parser.match_keyword(Keyword::Ordinal) {
        match parser.peek().kind {
            TokenKind::Integer(n) => {
                parser.advance();
                ordinal = Some(n);
            }
            _ => return Err(parser.expected("numeric literal after ORDINAL")),
        }
    }

    let persistent = parser.match_keyword(Keyword::Persistent);

    let mut thread_safe = false;
    if parser.match_keyword(Keyword::Thread) {
        parser.match_op(Op::Minus);
        if !parser.match_keyword(Keyword::Safe) {
            return Err(parser.expected("SAFE after THREAD-"));
        }
        thread_safe = true;
    }

    Ok(ExternalBinding {
        library,
        calling_convention,
        ordinal,
        persistent,
        thread_safe,
    })
}

/// Registers the procedure. It becomes callable from this point on.
pub fn execute(node: &Procedure, env: &Env) -> Result<(), EvalError> {
    env.context().register_procedure(node.clone(), env);
    Ok(())
}
