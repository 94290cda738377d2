//! Parser for FullForm templates using chumsky.
//!
//! Grammar:
//! ```text
//! expression := atom ('[' arguments? ']')?
//!             | '{' arguments? '}'
//! arguments  := expression (',' expression)*
//! ```
//! `{a, b}` is sugar for `List[a, b]`. It is handled on tokens, so braces inside string
//! literals are left alone. Empty brackets (`f[]`, `{}`) produce one synthetic null argument.
use chumsky::{input::ValueInput, prelude::*};
use log::{debug, warn};

use super::ast::{Atom, AtomKind, Expression};
use super::lexer::{Span, Token, lexer};
use crate::encoding::magic::LIST_HEAD;
use crate::error::{Error, Result};

fn expression_parser<'tokens, I>()
-> impl Parser<'tokens, I, Expression, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    recursive(|expr| {
        let atom = select! {
            Token::Ident(name) => Atom::new(AtomKind::Symbol, name),
            Token::Placeholder(name) => Atom::new(AtomKind::Placeholder, name),
            Token::Integer(text) => Atom::new(AtomKind::Integer, text),
            Token::Real(text) => Atom::new(AtomKind::Real, text),
            Token::Str(text) => Atom::new(AtomKind::String, text),
        }
        .labelled("atom");

        let arguments = expr
            .clone()
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>();

        // head[args] (recover unbalanced brackets)
        let bracketed = arguments
            .clone()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .recover_with(via_parser(nested_delimiters(
                Token::LBracket,
                Token::RBracket,
                [(Token::LBrace, Token::RBrace)],
                |_| Vec::new(),
            )))
            .labelled("arguments");

        let application = atom
            .then(bracketed.or_not())
            .map(|(head, args)| match args {
                Some(args) => Expression::apply(head, args),
                None => Expression::atom(head),
            })
            .labelled("expression");

        // {args} => List[args]
        let list = arguments
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .recover_with(via_parser(nested_delimiters(
                Token::LBrace,
                Token::RBrace,
                [(Token::LBracket, Token::RBracket)],
                |_| Vec::new(),
            )))
            .map(|args| Expression::apply(Atom::symbol(LIST_HEAD), args))
            .labelled("list");

        application.or(list)
    })
}

/// Parse a template, recovering from errors where possible.
///
/// Returns the (possibly partial) expression together with human-readable diagnostics. When
/// nothing could be recovered the expression is a null atom. Never panics.
pub fn parse_lossy(src: &str) -> (Expression, Vec<String>) {
    // 1) Lexing
    let (tokens, lex_errs) = lexer().parse(src).into_output_errors();
    let mut errors: Vec<String> = lex_errs
        .into_iter()
        .map(|e| format!("lexing error: {e}"))
        .collect();

    let Some(tokens) = tokens else {
        return (Expression::null(), errors);
    };

    // 2) Parsing over the token stream (spans are only kept for lexing diagnostics)
    let plain: Vec<Token> = tokens.into_iter().map(|(t, _)| t).collect();
    let (ast, parse_errs) = expression_parser()
        .then_ignore(end())
        .parse(plain.as_slice())
        .into_output_errors();
    errors.extend(parse_errs.into_iter().map(|e| format!("parse error: {e}")));

    (ast.unwrap_or_else(Expression::null), errors)
}

/// Parse a template into an [`Expression`].
///
/// Fails with [`Error::TemplateSyntax`] carrying every diagnostic if the template is not
/// entirely valid.
///
/// Example
/// ```
/// use wxf::fullform::{AtomKind, parse};
///
/// let e = parse("{1, x}").unwrap();
/// assert_eq!(e.head().text(), "List");
/// assert_eq!(e.args()[0].head().kind(), AtomKind::Integer);
/// assert_eq!(e.to_full_form(), "List[1, x]");
/// ```
pub fn parse(src: &str) -> Result<Expression> {
    let (expression, errors) = parse_lossy(src);
    if errors.is_empty() {
        debug!("Parsed FullForm template of {} byte(s)", src.len());
        Ok(expression)
    } else {
        warn!(
            "FullForm template rejected with {} diagnostic(s): {}",
            errors.len(),
            errors.join("; ")
        );
        Err(Error::TemplateSyntax(errors))
    }
}
