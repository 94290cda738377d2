//! Tokenisation of FullForm templates.
//!
//! Accepted tokens:
//! - identifiers `[A-Za-z$][A-Za-z0-9$]*` and placeholders `#[A-Za-z0-9$]*`;
//! - integers (`42`, `-7`) and reals (`1.5`, `.5`, `2.`, `1e10`, `-3.2E-4`);
//! - double-quoted strings with the escapes `\n \t \r \" \\` (any other escaped character
//!   keeps its backslash);
//! - the punctuation `[ ] , { }`.
//!
//! A `-` that is not directly followed by a digit is read as the identifier `-`. Whitespace
//! between tokens is skipped. Lexing recovers from bad characters by skipping them, so the
//! parser still sees every valid token.
use std::fmt;

use chumsky::prelude::*;

pub type Span = SimpleSpan;
pub type Spanned<T> = (T, Span);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    // Punctuation
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,

    // Atoms
    Ident(String),
    Placeholder(String),
    Integer(String),
    Real(String),
    Str(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Ident(s) | Token::Placeholder(s) | Token::Integer(s) | Token::Real(s) => {
                write!(f, "{s}")
            }
            Token::Str(s) => write!(f, "{s:?}"),
        }
    }
}

fn is_name_char(c: &char) -> bool {
    c.is_ascii_alphanumeric() || *c == '$'
}

pub(crate) fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<Spanned<Token>>, extra::Err<Rich<'a, char>>> {
    let ident = any()
        .filter(|c: &char| c.is_ascii_alphabetic() || *c == '$')
        .then(any().filter(is_name_char).repeated())
        .to_slice()
        .map(|s: &str| Token::Ident(s.to_owned()));

    let placeholder = just('#')
        .then(any().filter(is_name_char).repeated())
        .to_slice()
        .map(|s: &str| Token::Placeholder(s.to_owned()));

    // Numbers
    let digit = any().filter(|c: &char| c.is_ascii_digit());
    let unsigned = digit
        .clone()
        .repeated()
        .at_least(1)
        .then(just('.').then(digit.clone().repeated()).or_not())
        .ignored();
    let leading_dot = just('.')
        .then(digit.clone().repeated().at_least(1))
        .ignored();
    // Once `e` is seen the exponent is committed; missing digits are reported, not backtracked.
    let exponent = one_of("eE")
        .then(one_of("+-").or_not())
        .then(digit.repeated())
        .to_slice()
        .validate(|s: &str, e, emitter| {
            if !s.ends_with(|c: char| c.is_ascii_digit()) {
                emitter.emit(Rich::custom(e.span(), "malformed exponent"));
            }
        });
    let number = choice((
        just('-').then(unsigned.clone()).ignored(),
        unsigned,
        leading_dot,
    ))
    .then(exponent.or_not())
    .to_slice()
    .map(|s: &str| {
        if s.contains(['.', 'e', 'E']) {
            Token::Real(s.to_owned())
        } else {
            Token::Integer(s.to_owned())
        }
    });
    let minus = just('-').to(Token::Ident("-".to_owned()));

    // Strings
    let escape = just('\\').ignore_then(any()).map(|c: char| match c {
        'n' => ('\n', None),
        't' => ('\t', None),
        'r' => ('\r', None),
        '"' => ('"', None),
        '\\' => ('\\', None),
        other => ('\\', Some(other)),
    });
    let plain = none_of("\\\"").map(|c: char| (c, None));
    let string = just('"')
        .ignore_then(escape.or(plain).repeated().collect::<Vec<_>>())
        .then_ignore(just('"').labelled("closing quote"))
        .map(|pieces| {
            let mut text = String::with_capacity(pieces.len());
            for (c, extra) in pieces {
                text.push(c);
                text.extend(extra);
            }
            Token::Str(text)
        })
        .labelled("string");

    let punct = choice((
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just(',').to(Token::Comma),
    ));

    let token = choice((string, placeholder, number, minus, ident, punct));

    token
        .map_with(|tok, e| (tok, e.span()))
        .padded()
        .recover_with(skip_then_retry_until(any().ignored(), end()))
        .repeated()
        .collect()
        .then_ignore(end())
}
