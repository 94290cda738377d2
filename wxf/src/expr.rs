//! Owned expression values.
//!
//! [`Expr`] is the in-memory counterpart of a WXF document. It is what callers build when they
//! want to serialize something without driving the [`Encoder`] by hand, and what an
//! [`ExprTree`] can be converted into once the borrowed source buffer has to be released.
//!
//! ```
//! use wxf::expr::Expr;
//!
//! let value = Expr::rule(Expr::symbol("a"), Expr::from(1i64));
//! let bytes = value.to_wxf().unwrap();
//! assert_eq!(bytes, [b'8', b':', 45, 115, 1, b'a', 67, 1]);
//! assert_eq!(Expr::from_wxf(&bytes).unwrap(), value);
//! ```
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::EnumIs;

use crate::encoder::{Encoder, WxfEncodable};
use crate::encoding::{
    element::{ArrayElement, PackedArrayElement, to_ne_bytes},
    magic::{ArrayElementType, ElementTag, LIST_HEAD},
};
use crate::error::{Error, Result};
use crate::token::{Dimensions, TokenPayload};
use crate::tree::{ExprNode, ExprTree};

/// Dense array payload shared by packed and numeric arrays.
///
/// `data` always holds exactly `product(dimensions) * element_type.size()` bytes in
/// row-major, native byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArrayValue {
    element_type: ArrayElementType,
    dimensions: Dimensions,
    data: Vec<u8>,
}

impl ArrayValue {
    /// Build an array from typed elements.
    pub fn new<T: ArrayElement>(dimensions: &[usize], elements: &[T]) -> Result<Self> {
        Self::from_raw(T::ELEMENT_TYPE, dimensions, to_ne_bytes(elements))
    }

    /// Build an array from raw native-order element bytes.
    pub fn from_raw(
        element_type: ArrayElementType,
        dimensions: &[usize],
        data: Vec<u8>,
    ) -> Result<Self> {
        let found = data.len() / element_type.size();
        let expected = dimensions
            .iter()
            .try_fold(1usize, |n, &dim| n.checked_mul(dim));
        match expected {
            Some(expected) if expected == found && data.len() % element_type.size() == 0 => {
                Ok(Self {
                    element_type,
                    dimensions: Dimensions::from_slice(dimensions),
                    data,
                })
            }
            expected => Err(Error::DimensionMismatch {
                expected: expected.unwrap_or(usize::MAX),
                found,
            }),
        }
    }

    pub fn element_type(&self) -> ArrayElementType {
        self.element_type
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of elements.
    pub fn count(&self) -> usize {
        self.data.len() / self.element_type.size()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy the elements out, in row-major order.
    pub fn to_vec<T: ArrayElement>(&self) -> Result<Vec<T>> {
        if T::ELEMENT_TYPE != self.element_type {
            return Err(Error::UnexpectedToken {
                expected: "array of the requested element type",
                found: ElementTag::NumericArray,
            });
        }
        Ok(self
            .data
            .chunks_exact(self.element_type.size())
            .map(T::read_ne)
            .collect())
    }
}

/// An owned WXF expression.
#[derive(Debug, Clone, PartialEq, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    Integer(i64),
    Real(f64),
    String(String),
    BinaryString(Vec<u8>),
    Symbol(String),
    /// Arbitrary-precision integer, kept as its decimal text.
    BigInteger(String),
    /// Arbitrary-precision real, kept as its textual form, precision mark included.
    BigReal(String),
    Function {
        head: String,
        args: Vec<Expr>,
    },
    /// Rules only, by convention.
    Association(Vec<Expr>),
    Rule(Box<Expr>, Box<Expr>),
    RuleDelayed(Box<Expr>, Box<Expr>),
    PackedArray(ArrayValue),
    NumericArray(ArrayValue),
}

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Expr::String(text.into())
    }

    pub fn function(head: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Function {
            head: head.into(),
            args: args.into_iter().collect(),
        }
    }

    /// `List[args...]`
    pub fn list(args: impl IntoIterator<Item = Expr>) -> Self {
        Self::function(LIST_HEAD, args)
    }

    pub fn association(rules: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Association(rules.into_iter().collect())
    }

    pub fn rule(lhs: Expr, rhs: Expr) -> Self {
        Expr::Rule(Box::new(lhs), Box::new(rhs))
    }

    pub fn rule_delayed(lhs: Expr, rhs: Expr) -> Self {
        Expr::RuleDelayed(Box::new(lhs), Box::new(rhs))
    }

    pub fn packed_array<T: PackedArrayElement>(dimensions: &[usize], elements: &[T]) -> Result<Self> {
        ArrayValue::new(dimensions, elements).map(Expr::PackedArray)
    }

    pub fn numeric_array<T: ArrayElement>(dimensions: &[usize], elements: &[T]) -> Result<Self> {
        ArrayValue::new(dimensions, elements).map(Expr::NumericArray)
    }

    /// Head symbol of a function expression.
    pub fn head(&self) -> Option<&str> {
        match self {
            Expr::Function { head, .. } => Some(head),
            _ => None,
        }
    }

    /// Encode as a complete document, header included.
    pub fn to_wxf(&self) -> Result<Vec<u8>> {
        let mut encoder = Encoder::document();
        encoder.encode(self)?;
        Ok(encoder.into_bytes())
    }

    /// Decode a complete document.
    pub fn from_wxf(buffer: &[u8]) -> Result<Self> {
        ExprTree::parse(buffer)?.to_expr()
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Integer(value)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Real(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::String(value.to_owned())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::String(value)
    }
}

impl WxfEncodable for Expr {
    fn encode_wxf(&self, encoder: &mut Encoder) -> Result<()> {
        // Pre-order with an explicit stack; arguments are pushed in reverse.
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Expr::Integer(value) => {
                    encoder.push_integer(*value);
                }
                Expr::Real(value) => {
                    encoder.push_real(*value);
                }
                Expr::String(text) => {
                    encoder.push_string(text);
                }
                Expr::BinaryString(bytes) => {
                    encoder.push_binary_string(bytes);
                }
                Expr::Symbol(name) => {
                    encoder.push_symbol(name);
                }
                Expr::BigInteger(digits) => {
                    encoder.push_bigint(digits);
                }
                Expr::BigReal(digits) => {
                    encoder.push_bigreal(digits);
                }
                Expr::Function { head, args } => {
                    encoder.push_function(head, args.len());
                    stack.extend(args.iter().rev());
                }
                Expr::Association(rules) => {
                    encoder.push_association(rules.len());
                    stack.extend(rules.iter().rev());
                }
                Expr::Rule(lhs, rhs) => {
                    encoder.push_rule();
                    stack.push(rhs);
                    stack.push(lhs);
                }
                Expr::RuleDelayed(lhs, rhs) => {
                    encoder.push_delay_rule();
                    stack.push(rhs);
                    stack.push(lhs);
                }
                Expr::PackedArray(array) => {
                    encoder.push_array(
                        ElementTag::PackedArray,
                        array.element_type,
                        &array.dimensions,
                        &array.data,
                    )?;
                }
                Expr::NumericArray(array) => {
                    encoder.push_array(
                        ElementTag::NumericArray,
                        array.element_type,
                        &array.dimensions,
                        &array.data,
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl ExprTree<'_> {
    /// Copy the tree into an owned [`Expr`].
    pub fn to_expr(&self) -> Result<Expr> {
        node_to_expr(self, self.root())
    }
}

// Recurses once per nesting level, bounded by the `max_depth` the tree was built with.
fn node_to_expr(tree: &ExprTree<'_>, node: &ExprNode) -> Result<Expr> {
    let token = tree.token(node);
    let expr = match token.tag() {
        ElementTag::Integer8
        | ElementTag::Integer16
        | ElementTag::Integer32
        | ElementTag::Integer64 => Expr::Integer(token.integer()?),
        ElementTag::Real64 => Expr::Real(token.real()?),
        ElementTag::String => Expr::String(token.text()?.to_owned()),
        ElementTag::Symbol => Expr::Symbol(token.text()?.to_owned()),
        ElementTag::BigInteger => Expr::BigInteger(token.text()?.to_owned()),
        ElementTag::BigReal => Expr::BigReal(token.text()?.to_owned()),
        ElementTag::BinaryString => Expr::BinaryString(token.bytes().to_vec()),
        ElementTag::Function => {
            let head = tree.head(node).ok_or(Error::MissingHead {
                position: token.offset(),
            })?;
            Expr::Function {
                head: head.to_owned(),
                args: children_to_exprs(tree, node)?,
            }
        }
        ElementTag::Association => Expr::Association(children_to_exprs(tree, node)?),
        tag @ (ElementTag::Rule | ElementTag::RuleDelayed) => {
            let [lhs, rhs] = node.children() else {
                return Err(Error::RuleArity {
                    head: tag.to_string(),
                    found: node.len(),
                });
            };
            let lhs = Box::new(node_to_expr(tree, lhs)?);
            let rhs = Box::new(node_to_expr(tree, rhs)?);
            if tag == ElementTag::Rule {
                Expr::Rule(lhs, rhs)
            } else {
                Expr::RuleDelayed(lhs, rhs)
            }
        }
        tag @ (ElementTag::PackedArray | ElementTag::NumericArray) => {
            let TokenPayload::Array {
                element_type,
                dimensions,
                ..
            } = token.payload()
            else {
                return Err(Error::UnexpectedToken {
                    expected: "array payload",
                    found: tag,
                });
            };
            let array = ArrayValue {
                element_type: *element_type,
                dimensions: dimensions.clone(),
                data: token.bytes().to_vec(),
            };
            if tag == ElementTag::PackedArray {
                Expr::PackedArray(array)
            } else {
                Expr::NumericArray(array)
            }
        }
    };
    Ok(expr)
}

fn children_to_exprs(tree: &ExprTree<'_>, node: &ExprNode) -> Result<Vec<Expr>> {
    node.children()
        .iter()
        .map(|child| node_to_expr(tree, child))
        .collect()
}
