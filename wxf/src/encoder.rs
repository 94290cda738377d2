//! Append-only WXF writer.
//!
//! [`Encoder`] is a stateless stream writer: each `push_*` call appends exactly one complete
//! wire element and returns the encoder for chaining. It does not check that a function is
//! followed by as many arguments as its declared arity; keeping the prefix structure
//! consistent is the caller's job (or the job of [`WxfEncodable`] implementations).
//!
//! ```
//! use wxf::encoder::Encoder;
//!
//! // f[1, "x"]
//! let mut enc = Encoder::document();
//! enc.push_function("f", 2).push_integer(1).push_string("x");
//! assert_eq!(
//!     enc.as_bytes(),
//!     &[b'8', b':', 102, 2, 115, 1, b'f', 67, 1, 83, 1, b'x']
//! );
//! ```
use log::warn;

use crate::encoding::{
    element::{ArrayElement, PackedArrayElement, to_ne_bytes},
    magic::{ArrayElementType, ElementTag, HEADER},
    push_len, varint,
};
use crate::error::{Error, Result};

/// Growable buffer of complete WXF elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoder {
    buffer: Vec<u8>,
}

impl From<Vec<u8>> for Encoder {
    fn from(buffer: Vec<u8>) -> Self {
        Self { buffer }
    }
}

impl From<Encoder> for Vec<u8> {
    fn from(encoder: Encoder) -> Self {
        encoder.buffer
    }
}

impl AsRef<[u8]> for Encoder {
    fn as_ref(&self) -> &[u8] {
        &self.buffer
    }
}

impl Encoder {
    /// An empty encoder, suitable for building fragments.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// An encoder that already holds the `8:` document header.
    pub fn document() -> Self {
        let mut encoder = Self::new();
        encoder.push_header();
        encoder
    }

    /// Append the `8:` document header.
    pub fn push_header(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&HEADER);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Splice already-encoded bytes, typically a fragment produced by another encoder.
    pub fn push_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buffer.extend_from_slice(bytes);
        self
    }

    /// Encode `value` through its [`WxfEncodable`] implementation.
    pub fn encode<E: WxfEncodable + ?Sized>(&mut self, value: &E) -> Result<&mut Self> {
        value.encode_wxf(self)?;
        Ok(self)
    }

    #[inline]
    fn push_tag(&mut self, tag: ElementTag) {
        self.buffer.push(tag as u8);
    }

    /// Append an integer using the narrowest of the 8/16/32/64-bit tags that holds it.
    pub fn push_integer(&mut self, value: i64) -> &mut Self {
        if let Ok(v) = i8::try_from(value) {
            self.push_tag(ElementTag::Integer8);
            self.buffer.extend_from_slice(&v.to_ne_bytes());
        } else if let Ok(v) = i16::try_from(value) {
            self.push_tag(ElementTag::Integer16);
            self.buffer.extend_from_slice(&v.to_ne_bytes());
        } else if let Ok(v) = i32::try_from(value) {
            self.push_tag(ElementTag::Integer32);
            self.buffer.extend_from_slice(&v.to_ne_bytes());
        } else {
            self.push_tag(ElementTag::Integer64);
            self.buffer.extend_from_slice(&value.to_ne_bytes());
        }
        self
    }

    pub fn push_real(&mut self, value: f64) -> &mut Self {
        self.push_tag(ElementTag::Real64);
        self.buffer.extend_from_slice(&value.to_ne_bytes());
        self
    }

    fn push_string_like(&mut self, tag: ElementTag, bytes: &[u8]) -> &mut Self {
        debug_assert!(tag.is_string_like());
        self.buffer
            .reserve(1 + varint::encoded_size_u64(bytes.len() as u64) as usize + bytes.len());
        self.push_tag(tag);
        push_len(bytes.len(), &mut self.buffer);
        self.buffer.extend_from_slice(bytes);
        self
    }

    pub fn push_string(&mut self, text: &str) -> &mut Self {
        self.push_string_like(ElementTag::String, text.as_bytes())
    }

    pub fn push_symbol(&mut self, name: &str) -> &mut Self {
        self.push_string_like(ElementTag::Symbol, name.as_bytes())
    }

    /// Append a big integer given as decimal text. The text is not validated.
    pub fn push_bigint(&mut self, digits: &str) -> &mut Self {
        self.push_string_like(ElementTag::BigInteger, digits.as_bytes())
    }

    /// Append a big real given as decimal text, precision mark included. The text is not validated.
    pub fn push_bigreal(&mut self, digits: &str) -> &mut Self {
        self.push_string_like(ElementTag::BigReal, digits.as_bytes())
    }

    pub fn push_binary_string(&mut self, bytes: &[u8]) -> &mut Self {
        self.push_string_like(ElementTag::BinaryString, bytes)
    }

    /// Start a function application `head[...]`.
    ///
    /// Exactly `arity` complete elements must be pushed afterwards.
    pub fn push_function(&mut self, head: &str, arity: usize) -> &mut Self {
        self.push_tag(ElementTag::Function);
        push_len(arity, &mut self.buffer);
        self.push_symbol(head)
    }

    /// Start an association of `rule_count` entries.
    ///
    /// Exactly `rule_count` rules (or delayed rules) must be pushed afterwards.
    pub fn push_association(&mut self, rule_count: usize) -> &mut Self {
        self.push_tag(ElementTag::Association);
        push_len(rule_count, &mut self.buffer);
        self
    }

    /// Start a rule `lhs -> rhs`; exactly two elements must follow.
    pub fn push_rule(&mut self) -> &mut Self {
        self.push_tag(ElementTag::Rule);
        self
    }

    /// Start a delayed rule `lhs :> rhs`; exactly two elements must follow.
    pub fn push_delay_rule(&mut self) -> &mut Self {
        self.push_tag(ElementTag::RuleDelayed);
        self
    }

    /// Append an array from raw native-order element bytes.
    ///
    /// `kind` must be [`ElementTag::PackedArray`] or [`ElementTag::NumericArray`]. If the
    /// product of `dimensions` does not match the number of elements in `data`, the buffer
    /// is restored to its previous length and [`Error::DimensionMismatch`] is returned.
    pub fn push_array(
        &mut self,
        kind: ElementTag,
        element_type: ArrayElementType,
        dimensions: &[usize],
        data: &[u8],
    ) -> Result<&mut Self> {
        if !element_type.allowed_in(kind) {
            return Err(Error::InvalidArrayElementType {
                code: element_type as u8,
                position: self.buffer.len(),
            });
        }

        let rollback = self.buffer.len();

        // [tag, element type, rank, dimensions..., data...]
        self.push_tag(kind);
        self.buffer.push(element_type as u8);
        push_len(dimensions.len(), &mut self.buffer);
        let mut expected: Option<usize> = Some(1);
        for &dim in dimensions {
            push_len(dim, &mut self.buffer);
            expected = expected.and_then(|n| n.checked_mul(dim));
        }

        let found = data.len() / element_type.size();
        let exact = data.len() % element_type.size() == 0;
        match expected {
            Some(expected) if exact && expected == found => {
                self.buffer.extend_from_slice(data);
                Ok(self)
            }
            expected => {
                self.buffer.truncate(rollback);
                let expected = expected.unwrap_or(usize::MAX);
                warn!(
                    "Discarding {kind}: dimensions {dimensions:?} describe {expected} element(s), but {} byte(s) of {element_type} were supplied",
                    data.len()
                );
                Err(Error::DimensionMismatch { expected, found })
            }
        }
    }

    /// Append a packed array of signed integers, reals or complex numbers.
    pub fn push_packed_array<T: PackedArrayElement>(
        &mut self,
        dimensions: &[usize],
        data: &[T],
    ) -> Result<&mut Self> {
        self.push_array(
            ElementTag::PackedArray,
            T::ELEMENT_TYPE,
            dimensions,
            &to_ne_bytes(data),
        )
    }

    /// Append a numeric array; unlike packed arrays these also accept unsigned integers.
    pub fn push_numeric_array<T: ArrayElement>(
        &mut self,
        dimensions: &[usize],
        data: &[T],
    ) -> Result<&mut Self> {
        self.push_array(
            ElementTag::NumericArray,
            T::ELEMENT_TYPE,
            dimensions,
            &to_ne_bytes(data),
        )
    }
}

/// Types that know how to write themselves as WXF elements.
pub trait WxfEncodable {
    fn encode_wxf(&self, encoder: &mut Encoder) -> Result<()>;
}

impl<T: WxfEncodable + ?Sized> WxfEncodable for &T {
    #[inline]
    fn encode_wxf(&self, encoder: &mut Encoder) -> Result<()> {
        (*self).encode_wxf(encoder)
    }
}

impl WxfEncodable for i64 {
    fn encode_wxf(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.push_integer(*self);
        Ok(())
    }
}

impl WxfEncodable for f64 {
    fn encode_wxf(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.push_real(*self);
        Ok(())
    }
}

impl WxfEncodable for str {
    fn encode_wxf(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.push_string(self);
        Ok(())
    }
}

impl WxfEncodable for String {
    fn encode_wxf(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.push_string(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Complex;

    use super::*;

    fn bytes_of(f: impl FnOnce(&mut Encoder)) -> Vec<u8> {
        let mut enc = Encoder::new();
        f(&mut enc);
        enc.into_bytes()
    }

    #[test]
    fn integer_width_selection() {
        for v in [-128i64, -1, 0, 1, 127] {
            assert_eq!(bytes_of(|e| {
                e.push_integer(v);
            })[0], ElementTag::Integer8 as u8, "{v}");
        }
        let cases = [
            (128i64, ElementTag::Integer16, 3),
            (-129, ElementTag::Integer16, 3),
            (32767, ElementTag::Integer16, 3),
            (32768, ElementTag::Integer32, 5),
            (i32::MIN as i64, ElementTag::Integer32, 5),
            (1 << 31, ElementTag::Integer64, 9),
            (i64::MIN, ElementTag::Integer64, 9),
        ];
        for (v, tag, len) in cases {
            let bytes = bytes_of(|e| {
                e.push_integer(v);
            });
            assert_eq!(bytes[0], tag as u8, "{v}");
            assert_eq!(bytes.len(), len, "{v}");
        }
    }

    #[test]
    fn integer_payload_is_native_order() {
        let bytes = bytes_of(|e| {
            e.push_integer(1000);
        });
        assert_eq!(&bytes[1..], &1000i16.to_ne_bytes());
    }

    #[test]
    fn string_like_layout() {
        let bytes = bytes_of(|e| {
            e.push_symbol("a")
                .push_string("")
                .push_bigint("123")
                .push_binary_string(&[0, 255]);
        });
        assert_eq!(
            bytes,
            [115, 1, b'a', 83, 0, 73, 3, b'1', b'2', b'3', 66, 2, 0, 255]
        );
    }

    #[test]
    fn rule_layout() {
        let bytes = bytes_of(|e| {
            e.push_rule().push_symbol("a").push_integer(1);
        });
        assert_eq!(bytes, [45, 115, 1, b'a', 67, 1]);
    }

    #[test]
    fn function_and_association_layout() {
        let bytes = bytes_of(|e| {
            e.push_association(1)
                .push_delay_rule()
                .push_string("k")
                .push_function("List", 0);
        });
        assert_eq!(
            bytes,
            [65, 1, 58, 83, 1, b'k', 102, 0, 115, 4, b'L', b'i', b's', b't']
        );
    }

    #[test]
    fn packed_array_layout() {
        let bytes = bytes_of(|e| {
            e.push_packed_array(&[2, 2], &[1i8, 2, 3, 4]).unwrap();
        });
        assert_eq!(bytes, [193, 0, 2, 2, 2, 1, 2, 3, 4]);
    }

    #[test]
    fn numeric_array_accepts_unsigned() {
        let bytes = bytes_of(|e| {
            e.push_numeric_array(&[3], &[1u8, 2, 3]).unwrap();
        });
        assert_eq!(bytes, [194, 16, 1, 3, 1, 2, 3]);
    }

    #[test]
    fn complex_array_element_code() {
        let bytes = bytes_of(|e| {
            e.push_packed_array(&[1], &[Complex::new(1.0f64, 2.0)]).unwrap();
        });
        assert_eq!(bytes[1], 52);
        assert_eq!(bytes.len(), 4 + 16);
    }

    #[test]
    fn dimension_mismatch_rolls_back() {
        let mut enc = Encoder::document();
        enc.push_function("f", 1);
        let before = enc.as_bytes().to_vec();

        let err = enc.push_packed_array(&[2, 3], &[1i32, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 6,
                found: 3
            }
        );
        assert_eq!(enc.as_bytes(), before.as_slice());

        let err = enc.push_numeric_array(&[usize::MAX, 2], &[1u8]).unwrap_err();
        assert!(err.is_dimension_mismatch());
        assert_eq!(enc.as_bytes(), before.as_slice());
    }

    #[test]
    fn packed_array_rejects_unsigned_raw_push() {
        let mut enc = Encoder::new();
        let err = enc
            .push_array(
                ElementTag::PackedArray,
                ArrayElementType::UnsignedInteger8,
                &[1],
                &[1],
            )
            .unwrap_err();
        assert!(err.is_invalid_array_element_type());
        assert!(enc.is_empty());
    }

    #[test]
    fn raw_fragments_are_spliced_verbatim() {
        let mut fragment = Encoder::new();
        fragment.push_integer(42);

        let mut enc = Encoder::new();
        enc.push_function("f", 1).push_raw(fragment.as_bytes());

        let mut expected = Encoder::new();
        expected.push_function("f", 1).push_integer(42);
        assert_eq!(enc, expected);
    }
}
