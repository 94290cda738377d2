//! Magic constants of the WXF wire format.
//!
//! Conventions:
//! - A document starts with the two header bytes [`HEADER`] (`8:`).
//! - Every element starts with one tag byte ([`ElementTag`]).
//! - Elements are laid out in prefix order: a function tag, its arity and its head symbol
//!   come before its arguments, and nothing marks the end of a subtree.
//! - Rules carry no arity, they always have exactly two operands.
//! - Arrays carry an element type byte ([`ArrayElementType`]), a rank, one varint per
//!   dimension and then the flattened elements in row-major, native byte order.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};

/// Header of every WXF document.
pub const HEADER: [u8; 2] = [0x38, 0x3A];

/// Arity of `Rule` and `RuleDelayed`; it is implied and never written.
pub const RULE_ARITY: usize = 2;

/// Head symbol names used by the template front-end.
pub const RULE_HEAD: &str = "Rule";
pub const RULE_DELAYED_HEAD: &str = "RuleDelayed";
pub const LIST_HEAD: &str = "List";

/// Tag byte identifying the kind of the next wire element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ElementTag {
    // Composite
    Function = 102,
    Association = 65,
    RuleDelayed = 58,
    Rule = 45,

    // String-like
    Symbol = 115,
    String = 83,
    BinaryString = 66,
    BigInteger = 73,
    BigReal = 82,

    // Fixed-width numbers
    Integer8 = 67,
    Integer16 = 106,
    Integer32 = 105,
    Integer64 = 76,
    Real64 = 114,

    // Arrays
    PackedArray = 193,
    NumericArray = 194,
}

impl ElementTag {
    /// Payload width of fixed-width numeric tags, `None` for every other tag.
    pub const fn scalar_width(self) -> Option<usize> {
        match self {
            ElementTag::Integer8 => Some(1),
            ElementTag::Integer16 => Some(2),
            ElementTag::Integer32 => Some(4),
            ElementTag::Integer64 | ElementTag::Real64 => Some(8),
            _ => None,
        }
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            ElementTag::Integer8 | ElementTag::Integer16 | ElementTag::Integer32 | ElementTag::Integer64
        )
    }

    /// Tags followed by a varint byte length and raw bytes.
    pub const fn is_string_like(self) -> bool {
        matches!(
            self,
            ElementTag::Symbol
                | ElementTag::String
                | ElementTag::BinaryString
                | ElementTag::BigInteger
                | ElementTag::BigReal
        )
    }

    pub const fn is_rule(self) -> bool {
        matches!(self, ElementTag::Rule | ElementTag::RuleDelayed)
    }

    /// Tags whose element owns sub-elements (function, association and rules).
    pub const fn is_composite(self) -> bool {
        matches!(self, ElementTag::Function | ElementTag::Association) || self.is_rule()
    }

    pub const fn is_array(self) -> bool {
        matches!(self, ElementTag::PackedArray | ElementTag::NumericArray)
    }
}

/// Element type byte of packed and numeric arrays.
///
/// The low three bits of the code give the base-2 logarithm of the element size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ArrayElementType {
    Integer8 = 0,
    Integer16 = 1,
    Integer32 = 2,
    Integer64 = 3,
    // Numeric arrays only
    UnsignedInteger8 = 16,
    UnsignedInteger16 = 17,
    UnsignedInteger32 = 18,
    UnsignedInteger64 = 19,
    Real32 = 34,
    Real64 = 35,
    ComplexReal32 = 51,
    ComplexReal64 = 52,
}

impl ArrayElementType {
    /// Size in bytes of one element.
    pub const fn size(self) -> usize {
        1 << (self as u8 & 0b111)
    }

    /// Packed arrays only hold signed integers, reals and complex numbers.
    pub const fn allowed_in_packed_array(self) -> bool {
        !matches!(
            self,
            ArrayElementType::UnsignedInteger8
                | ArrayElementType::UnsignedInteger16
                | ArrayElementType::UnsignedInteger32
                | ArrayElementType::UnsignedInteger64
        )
    }

    /// Whether arrays of kind `tag` may hold this element type.
    pub const fn allowed_in(self, tag: ElementTag) -> bool {
        match tag {
            ElementTag::PackedArray => self.allowed_in_packed_array(),
            ElementTag::NumericArray => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn tag_bytes_roundtrip_through_from_repr() {
        for tag in ElementTag::iter() {
            assert_eq!(ElementTag::from_repr(tag as u8), Some(tag));
        }
        assert_eq!(ElementTag::from_repr(0), None);
        assert_eq!(ElementTag::from_repr(b'8'), None);
    }

    #[test]
    fn element_sizes_follow_low_bits() {
        use ArrayElementType::*;
        let expected = [
            (Integer8, 1),
            (Integer16, 2),
            (Integer32, 4),
            (Integer64, 8),
            (UnsignedInteger8, 1),
            (UnsignedInteger16, 2),
            (UnsignedInteger32, 4),
            (UnsignedInteger64, 8),
            (Real32, 4),
            (Real64, 8),
            (ComplexReal32, 8),
            (ComplexReal64, 16),
        ];
        for (ty, size) in expected {
            assert_eq!(ty.size(), size, "{ty}");
        }
    }

    #[test]
    fn categories_are_disjoint() {
        for tag in ElementTag::iter() {
            let categories = [
                tag.scalar_width().is_some(),
                tag.is_string_like(),
                tag.is_composite(),
                tag.is_array(),
            ];
            assert_eq!(categories.iter().filter(|c| **c).count(), 1, "{tag}");
        }
    }
}
