//! Template compiler: FullForm [`Expression`] to WXF bytes.
use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};

use super::ast::{AtomKind, Expression};
use super::parser::parse;
use crate::encoder::Encoder;
use crate::encoding::magic::{HEADER, RULE_ARITY, RULE_DELAYED_HEAD, RULE_HEAD};
use crate::error::{Error, Result};

type Generator = Box<dyn Fn(&mut Encoder) -> Result<()> + Send + Sync>;

/// What a placeholder expands to.
pub enum Fragment {
    /// Pre-encoded elements, copied verbatim (no header).
    Encoded(Vec<u8>),
    /// Callback writing elements straight into the output encoder.
    Generator(Generator),
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Encoded(bytes) => f.debug_tuple("Encoded").field(bytes).finish(),
            Fragment::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

impl Fragment {
    fn emit(&self, encoder: &mut Encoder) -> Result<()> {
        match self {
            Fragment::Encoded(bytes) => {
                encoder.push_raw(bytes);
                Ok(())
            }
            Fragment::Generator(generate) => generate(encoder),
        }
    }
}

/// Placeholder name to fragment map, handed to [`compile`] by the caller.
///
/// Names are stored with their leading `#`; one is added when missing, so `"x"` and `"#x"`
/// address the same entry.
#[derive(Debug, Default)]
pub struct Placeholders {
    entries: HashMap<String, Fragment>,
}

fn placeholder_key(name: impl Into<String>) -> String {
    let name = name.into();
    if name.starts_with('#') {
        name
    } else {
        format!("#{name}")
    }
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register pre-encoded bytes, e.g. an [`Encoder`] built without header. Returns the
    /// fragment previously registered under that name.
    pub fn insert_encoded(
        &mut self,
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Option<Fragment> {
        self.entries
            .insert(placeholder_key(name), Fragment::Encoded(bytes.into()))
    }

    /// Register a callback invoked with the output encoder each time the placeholder occurs.
    pub fn insert_generator<F>(&mut self, name: impl Into<String>, generator: F) -> Option<Fragment>
    where
        F: Fn(&mut Encoder) -> Result<()> + Send + Sync + 'static,
    {
        self.entries
            .insert(placeholder_key(name), Fragment::Generator(Box::new(generator)))
    }

    pub fn get(&self, name: &str) -> Option<&Fragment> {
        if name.starts_with('#') {
            self.entries.get(name)
        } else {
            self.entries.get(&placeholder_key(name))
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Fragment> {
        self.entries.remove(&placeholder_key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn numeric_error(text: &str, reason: impl ToString) -> Error {
    Error::NumericConversion {
        text: text.to_owned(),
        reason: reason.to_string(),
    }
}

/// Append the elements described by `expression` to `encoder`.
///
/// The traversal is depth-first and uses an explicit stack. On error the encoder keeps what
/// was written so far; that prefix is generally not a complete expression.
pub fn compile(
    encoder: &mut Encoder,
    expression: &Expression,
    placeholders: &Placeholders,
) -> Result<()> {
    let mut stack = vec![expression];
    while let Some(expr) = stack.pop() {
        let head = expr.head();

        if expr.is_atom() {
            let text = head.text();
            match head.kind() {
                AtomKind::Integer => {
                    let value = text.parse::<i64>().map_err(|e| numeric_error(text, e))?;
                    encoder.push_integer(value);
                }
                AtomKind::Real => {
                    let value = text.parse::<f64>().map_err(|e| numeric_error(text, e))?;
                    if !value.is_finite() {
                        return Err(numeric_error(text, "out of range for a 64-bit real"));
                    }
                    encoder.push_real(value);
                }
                AtomKind::String => {
                    encoder.push_string(text);
                }
                AtomKind::Symbol => {
                    encoder.push_symbol(text);
                }
                AtomKind::Placeholder => match placeholders.get(text) {
                    Some(fragment) => fragment.emit(encoder)?,
                    None => {
                        warn!("No fragment registered for placeholder `{text}`");
                        return Err(Error::UnresolvedPlaceholder(text.to_owned()));
                    }
                },
                AtomKind::Null => {}
            }
            continue;
        }

        if head.kind() != AtomKind::Symbol {
            return Err(Error::InvalidHead(head.to_string()));
        }

        let args = expr.effective_args();
        match head.text() {
            name @ (RULE_HEAD | RULE_DELAYED_HEAD) => {
                if args.len() != RULE_ARITY {
                    return Err(Error::RuleArity {
                        head: name.to_owned(),
                        found: args.len(),
                    });
                }
                if name == RULE_HEAD {
                    encoder.push_rule();
                } else {
                    encoder.push_delay_rule();
                }
            }
            name => {
                encoder.push_function(name, args.len());
            }
        }
        stack.extend(args.iter().rev());
    }
    Ok(())
}

/// Parse `template` and compile it into a fresh encoder.
///
/// With `include_header` the output starts with the `8:` magic and is a complete document;
/// without it the output is a fragment suitable for [`Placeholders::insert_encoded`] or
/// [`Encoder::push_raw`].
pub fn fullform_to_wxf(
    template: &str,
    placeholders: &Placeholders,
    include_header: bool,
) -> Result<Encoder> {
    let expression = parse(template)?;

    let mut encoder = Encoder::with_capacity(template.len() + HEADER.len());
    if include_header {
        encoder.push_header();
    }
    compile(&mut encoder, &expression, placeholders)?;

    debug!("Compiled FullForm template into {} byte(s)", encoder.len());
    Ok(encoder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_str(src: &str, placeholders: &Placeholders) -> Result<Vec<u8>> {
        fullform_to_wxf(src, placeholders, false).map(Encoder::into_bytes)
    }

    #[test]
    fn rule_uses_its_own_tag() {
        let bytes = compile_str("Rule[a, 1]", &Placeholders::new()).unwrap();
        assert_eq!(bytes, [45, 115, 1, b'a', 67, 1]);
        let bytes = compile_str("RuleDelayed[a, 1]", &Placeholders::new()).unwrap();
        assert_eq!(bytes, [58, 115, 1, b'a', 67, 1]);
    }

    #[test]
    fn empty_application_has_zero_arity() {
        let bytes = compile_str("f[]", &Placeholders::new()).unwrap();
        assert_eq!(bytes, [102, 0, 115, 1, b'f']);
    }

    #[test]
    fn header_is_optional() {
        let doc = fullform_to_wxf("x", &Placeholders::new(), true).unwrap();
        assert_eq!(doc.as_bytes(), [b'8', b':', 115, 1, b'x']);
    }

    #[test]
    fn placeholder_names_are_normalised() {
        let mut map = Placeholders::new();
        assert!(map.insert_encoded("a", vec![67, 5]).is_none());
        assert!(map.contains("#a"));
        assert!(map.contains("a"));
        assert!(map.insert_encoded("#a", vec![67, 6]).is_some());
        assert_eq!(map.len(), 1);
        assert_eq!(compile_str("#a", &map).unwrap(), [67, 6]);
    }

    #[test]
    fn generators_may_fail() {
        let mut map = Placeholders::new();
        map.insert_generator("#bad", |enc| {
            enc.push_numeric_array(&[3], &[1u8, 2])?;
            Ok(())
        });
        let err = compile_str("f[#bad]", &map).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn unresolved_placeholder_leaves_partial_output() {
        let expression = parse("f[1, #missing]").unwrap();
        let mut encoder = Encoder::new();
        let err = compile(&mut encoder, &expression, &Placeholders::new()).unwrap_err();
        assert_eq!(err, Error::UnresolvedPlaceholder("#missing".into()));
        assert_eq!(encoder.as_bytes(), [102, 2, 115, 1, b'f', 67, 1]);
    }

    #[test]
    fn numeric_literals_must_fit_machine_numbers() {
        let map = Placeholders::new();
        assert!(
            compile_str("99999999999999999999", &map)
                .unwrap_err()
                .is_numeric_conversion()
        );
        assert!(compile_str("1e400", &map).unwrap_err().is_numeric_conversion());
        let mut min = vec![76];
        min.extend_from_slice(&i64::MIN.to_ne_bytes());
        assert_eq!(compile_str("-9223372036854775808", &map).unwrap(), min);
    }

    #[test]
    fn structural_errors() {
        let map = Placeholders::new();
        assert_eq!(
            compile_str("Rule[a]", &map).unwrap_err(),
            Error::RuleArity {
                head: "Rule".into(),
                found: 1
            }
        );
        assert_eq!(
            compile_str("RuleDelayed[]", &map).unwrap_err(),
            Error::RuleArity {
                head: "RuleDelayed".into(),
                found: 0
            }
        );
        assert!(compile_str("1[2]", &map).unwrap_err().is_invalid_head());
        assert!(compile_str("\"s\"[2]", &map).unwrap_err().is_invalid_head());
    }
}
