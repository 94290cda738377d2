//! Decoded wire elements.
//!
//! A [`Token`] describes one element of a WXF buffer and borrows its payload straight from
//! that buffer; nothing is copied while decoding. Composite elements (functions,
//! associations and rules) only carry their declared arity, their children are the tokens
//! that follow them in the stream. See [`ExprTree`](crate::tree::ExprTree) for the
//! hierarchical view.
use smallvec::SmallVec;
use strum::EnumIs;

use crate::encoding::{
    element::ArrayElement,
    magic::{ArrayElementType, ElementTag, RULE_ARITY},
};
use crate::error::{Error, Result};

/// Dimensions of an array token; ranks up to 4 stay inline.
pub type Dimensions = SmallVec<[usize; 4]>;

/// Shape-specific part of a token.
#[derive(Debug, Clone, PartialEq, Eq, EnumIs)]
pub enum TokenPayload {
    /// Numbers, strings and composite tags.
    ///
    /// `length` is the payload byte count for numbers and string-like tags, the declared
    /// arity (or rule count) for functions and associations, and always 2 for rules.
    Scalar { length: usize },

    /// Packed and numeric arrays.
    Array {
        element_type: ArrayElementType,
        dimensions: Dimensions,
        /// Product of `dimensions`.
        count: usize,
    },
}

/// One decoded element, borrowing its bytes from the source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    tag: ElementTag,
    payload: TokenPayload,
    data: &'a [u8],
    offset: usize,
}

impl<'a> Token<'a> {
    pub(crate) fn scalar(tag: ElementTag, length: usize, data: &'a [u8], offset: usize) -> Self {
        debug_assert!(!tag.is_array());
        Self {
            tag,
            payload: TokenPayload::Scalar { length },
            data,
            offset,
        }
    }

    pub(crate) fn array(
        tag: ElementTag,
        element_type: ArrayElementType,
        dimensions: Dimensions,
        count: usize,
        data: &'a [u8],
        offset: usize,
    ) -> Self {
        debug_assert!(tag.is_array());
        debug_assert_eq!(data.len(), count * element_type.size());
        Self {
            tag,
            payload: TokenPayload::Array {
                element_type,
                dimensions,
                count,
            },
            data,
            offset,
        }
    }

    pub fn tag(&self) -> ElementTag {
        self.tag
    }

    pub fn payload(&self) -> &TokenPayload {
        &self.payload
    }

    /// Byte offset of the tag in the source buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Raw payload bytes; empty for composite tags.
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Scalar length field, `None` for arrays.
    pub fn length(&self) -> Option<usize> {
        match self.payload {
            TokenPayload::Scalar { length } => Some(length),
            TokenPayload::Array { .. } => None,
        }
    }

    /// Number of child elements that follow this token in the stream.
    ///
    /// This is the declared arity for functions, the rule count for associations, 2 for rules
    /// and 0 for everything else. The head symbol of a function is not counted.
    pub fn arity(&self) -> usize {
        match (self.tag, &self.payload) {
            (ElementTag::Rule | ElementTag::RuleDelayed, _) => RULE_ARITY,
            (ElementTag::Function | ElementTag::Association, TokenPayload::Scalar { length }) => {
                *length
            }
            _ => 0,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.tag.is_composite()
    }

    /// Value of an integer token.
    pub fn integer(&self) -> Result<i64> {
        let value = match self.tag {
            ElementTag::Integer8 => i8::read_ne(self.data) as i64,
            ElementTag::Integer16 => i16::read_ne(self.data) as i64,
            ElementTag::Integer32 => i32::read_ne(self.data) as i64,
            ElementTag::Integer64 => i64::read_ne(self.data),
            found => {
                return Err(Error::UnexpectedToken {
                    expected: "integer",
                    found,
                });
            }
        };
        Ok(value)
    }

    /// Value of a machine real token.
    pub fn real(&self) -> Result<f64> {
        match self.tag {
            ElementTag::Real64 => Ok(f64::read_ne(self.data)),
            found => Err(Error::UnexpectedToken {
                expected: "real",
                found,
            }),
        }
    }

    /// Text of a symbol, string, big integer or big real token.
    ///
    /// Binary strings are accepted too when their bytes happen to be UTF-8; use
    /// [`Token::bytes`] for arbitrary binary data.
    pub fn text(&self) -> Result<&'a str> {
        if !self.tag.is_string_like() {
            return Err(Error::UnexpectedToken {
                expected: "string-like",
                found: self.tag,
            });
        }
        std::str::from_utf8(self.data).map_err(|_| Error::InvalidUtf8 {
            position: self.offset,
        })
    }

    /// Symbol name, `None` for every other kind of token.
    pub fn symbol(&self) -> Option<&'a str> {
        match self.tag {
            ElementTag::Symbol => self.text().ok(),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<ArrayElementType> {
        match &self.payload {
            TokenPayload::Array { element_type, .. } => Some(*element_type),
            TokenPayload::Scalar { .. } => None,
        }
    }

    /// Array dimensions; empty for non-array tokens.
    pub fn dimensions(&self) -> &[usize] {
        match &self.payload {
            TokenPayload::Array { dimensions, .. } => dimensions.as_slice(),
            TokenPayload::Scalar { .. } => &[],
        }
    }

    pub fn rank(&self) -> usize {
        self.dimensions().len()
    }

    /// Total number of array elements; 0 for non-array tokens.
    pub fn count(&self) -> usize {
        match &self.payload {
            TokenPayload::Array { count, .. } => *count,
            TokenPayload::Scalar { .. } => 0,
        }
    }

    /// Iterate over the elements of an array token, in row-major order.
    ///
    /// Fails unless the token is an array whose element type is exactly `T`.
    pub fn elements<T: ArrayElement>(&self) -> Result<impl ExactSizeIterator<Item = T> + use<'a, T>> {
        match self.element_type() {
            Some(ty) if ty == T::ELEMENT_TYPE => {
                Ok(self.data.chunks_exact(ty.size()).map(T::read_ne))
            }
            _ => Err(Error::UnexpectedToken {
                expected: "array of the requested element type",
                found: self.tag,
            }),
        }
    }

    /// Copy the elements of an array token into a `Vec`.
    pub fn to_vec<T: ArrayElement>(&self) -> Result<Vec<T>> {
        Ok(self.elements::<T>()?.collect())
    }
}
