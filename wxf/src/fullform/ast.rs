use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs};

/// Kind of an [`Atom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AtomKind {
    /// Decimal integer literal, kept as text until compilation.
    Integer,
    /// Real literal, kept as text until compilation.
    Real,
    /// String literal with escapes already resolved.
    String,
    Symbol,
    /// `#name`, resolved at compile time.
    Placeholder,
    /// Synthetic argument of an empty application such as `f[]`; encodes to nothing.
    Null,
}

/// Leaf of a template: a literal, a symbol or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Atom {
    kind: AtomKind,
    text: String,
}

impl Atom {
    pub fn new(kind: AtomKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::new(AtomKind::Symbol, name)
    }

    pub fn null() -> Self {
        Self::new(AtomKind::Null, String::new())
    }

    pub fn kind(&self) -> AtomKind {
        self.kind
    }

    /// Literal text, symbol name or placeholder name (leading `#` included).
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AtomKind::String => {
                f.write_str("\"")?;
                for c in self.text.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            _ => f.write_str(&self.text),
        }
    }
}

/// A parsed template: a head atom applied to zero or more arguments.
///
/// An expression without arguments is an atom. An application written with empty brackets
/// (`f[]`) holds a single [`AtomKind::Null`] argument so that it stays distinct from the bare
/// atom `f`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Expression {
    head: Atom,
    args: Vec<Expression>,
}

impl Expression {
    pub fn atom(head: Atom) -> Self {
        Self {
            head,
            args: Vec::new(),
        }
    }

    /// `head[args...]`; an empty argument list becomes a single null argument.
    pub fn apply(head: Atom, mut args: Vec<Expression>) -> Self {
        if args.is_empty() {
            args.push(Self::null());
        }
        Self { head, args }
    }

    pub fn null() -> Self {
        Self::atom(Atom::null())
    }

    pub fn head(&self) -> &Atom {
        &self.head
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    pub fn is_atom(&self) -> bool {
        self.args.is_empty()
    }

    pub fn is_null(&self) -> bool {
        self.is_atom() && self.head.kind == AtomKind::Null
    }

    /// Arguments that produce output, i.e. without the synthetic null of `f[]`.
    pub fn effective_args(&self) -> &[Expression] {
        match self.args.as_slice() {
            [only] if only.is_null() => &[],
            args => args,
        }
    }

    /// Render back to template text. Parsing the result yields an equal expression.
    pub fn to_full_form(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if self.is_atom() {
            return Ok(());
        }
        f.write_str("[")?;
        for (i, arg) in self.effective_args().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_application_keeps_a_null_argument() {
        let e = Expression::apply(Atom::symbol("f"), Vec::new());
        assert!(!e.is_atom());
        assert_eq!(e.args().len(), 1);
        assert!(e.args()[0].is_null());
        assert!(e.effective_args().is_empty());
        assert_eq!(e.to_full_form(), "f[]");
    }

    #[test]
    fn strings_are_escaped_when_rendered() {
        let e = Expression::apply(
            Atom::symbol("f"),
            vec![
                Expression::atom(Atom::new(AtomKind::String, "a\"b\\c\n")),
                Expression::atom(Atom::new(AtomKind::Integer, "-3")),
            ],
        );
        assert_eq!(e.to_full_form(), r#"f["a\"b\\c\n", -3]"#);
    }
}
