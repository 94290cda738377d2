//! Flat, zero-copy WXF tokenizer.
//!
//! [`Decoder`] walks a buffer once, front to back, and turns every wire element into a
//! [`Token`] that borrows its payload from the buffer. Composite elements are not nested
//! here: a function token is simply followed by its head symbol and its arguments. Use
//! [`ExprTree`](crate::tree::ExprTree) to recover the hierarchy.
//!
//! Complexity
//! - Time: O(n) in the buffer length.
//! - Memory: one `Token` per element; payloads are never copied.
//!
//! ```
//! use wxf::decoder::Decoder;
//! use wxf::encoding::magic::ElementTag;
//!
//! let bytes = [b'8', b':', 102, 1, 115, 1, b'f', 67, 7];
//! let mut decoder = Decoder::new(&bytes);
//! decoder.parse().unwrap();
//! let tags: Vec<_> = decoder.tokens().iter().map(|t| t.tag()).collect();
//! assert_eq!(tags, [ElementTag::Function, ElementTag::Symbol, ElementTag::Integer8]);
//! ```
use log::{debug, warn};

use crate::encoding::{
    magic::{ArrayElementType, ElementTag, HEADER, RULE_ARITY},
    varint,
};
use crate::error::{Error, Result};
use crate::limits::DecodeLimits;
use crate::token::{Dimensions, Token};

/// Single-pass tokenizer over a borrowed WXF buffer.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buffer: &'a [u8],
    position: usize,
    expect_header: bool,
    tokens: Vec<Token<'a>>,
    limits: DecodeLimits,
}

impl<'a> Decoder<'a> {
    /// A decoder for a complete document; the buffer must start with the `8:` header.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_limits(buffer, DecodeLimits::default())
    }

    pub fn with_limits(buffer: &'a [u8], limits: DecodeLimits) -> Self {
        Self {
            buffer,
            position: 0,
            expect_header: true,
            tokens: Vec::new(),
            limits,
        }
    }

    /// A decoder for a headerless fragment, such as the output of an [`Encoder`] that was
    /// not created with [`Encoder::document`].
    ///
    /// [`Encoder`]: crate::encoder::Encoder
    /// [`Encoder::document`]: crate::encoder::Encoder::document
    pub fn fragment(buffer: &'a [u8]) -> Self {
        Self {
            expect_header: false,
            ..Self::new(buffer)
        }
    }

    /// Tokens decoded so far. After a failed [`parse`](Self::parse) these are the tokens
    /// that preceded the faulty element.
    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token<'a>> {
        self.tokens
    }

    /// Current byte offset in the buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether the whole buffer has been consumed.
    pub fn is_complete(&self) -> bool {
        self.position == self.buffer.len()
    }

    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    /// Decode every remaining element of the buffer.
    ///
    /// Decoding stops at the first malformed element; the tokens decoded up to that point
    /// stay available through [`tokens`](Self::tokens) and [`position`](Self::position) is
    /// left at the start of the faulty element. Calling `parse` again reports the same error.
    pub fn parse(&mut self) -> Result<()> {
        if self.position == 0 && self.expect_header {
            if self.buffer.get(..HEADER.len()) != Some(&HEADER[..]) {
                warn!("Invalid WXF buffer: missing `8:` header");
                return Err(Error::InvalidMagic);
            }
            self.position = HEADER.len();
        }

        while self.position < self.buffer.len() {
            if self.tokens.len() >= self.limits.max_tokens {
                return Err(Error::TokenLimitExceeded {
                    limit: self.limits.max_tokens,
                });
            }

            let start = self.position;
            match self.next_token() {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    // Stay on the faulty element.
                    self.position = start;
                    warn!(
                        "WXF decoding stopped after {} token(s): {e}",
                        self.tokens.len()
                    );
                    return Err(e);
                }
            }
        }

        debug!(
            "Decoded {} token(s) from {} byte(s)",
            self.tokens.len(),
            self.buffer.len()
        );
        Ok(())
    }

    fn next_token(&mut self) -> Result<Token<'a>> {
        let offset = self.position;
        let byte = self.take(1)?[0];
        let tag = ElementTag::from_repr(byte).ok_or(Error::UnknownTag {
            tag: byte,
            position: offset,
        })?;

        if let Some(width) = tag.scalar_width() {
            let data = self.take(width)?;
            return Ok(Token::scalar(tag, width, data, offset));
        }

        let token = match tag {
            ElementTag::Symbol
            | ElementTag::String
            | ElementTag::BinaryString
            | ElementTag::BigInteger
            | ElementTag::BigReal => {
                let length = self.read_len()?;
                let data = self.take(length)?;
                Token::scalar(tag, length, data, offset)
            }
            // Children are the following tokens; only the count is stored here.
            ElementTag::Function | ElementTag::Association => {
                let arity = self.read_len()?;
                Token::scalar(tag, arity, &[], offset)
            }
            ElementTag::Rule | ElementTag::RuleDelayed => {
                Token::scalar(tag, RULE_ARITY, &[], offset)
            }
            ElementTag::PackedArray | ElementTag::NumericArray => self.read_array(tag, offset)?,
            ElementTag::Integer8
            | ElementTag::Integer16
            | ElementTag::Integer32
            | ElementTag::Integer64
            | ElementTag::Real64 => unreachable!("fixed-width tags are handled above"),
        };
        Ok(token)
    }

    // [element type, rank, dimensions..., data...]
    fn read_array(&mut self, tag: ElementTag, offset: usize) -> Result<Token<'a>> {
        let code_position = self.position;
        let code = self.take(1)?[0];
        let element_type = ArrayElementType::from_repr(code)
            .filter(|ty| ty.allowed_in(tag))
            .ok_or(Error::InvalidArrayElementType {
                code,
                position: code_position,
            })?;

        let rank = self.read_len()?;
        let mut dimensions = Dimensions::new();
        let mut count: usize = 1;
        for _ in 0..rank {
            let dim = self.read_len()?;
            count = count
                .checked_mul(dim)
                .ok_or(Error::ArrayTooLarge { position: offset })?;
            dimensions.push(dim);
        }

        let byte_len = count
            .checked_mul(element_type.size())
            .ok_or(Error::ArrayTooLarge { position: offset })?;
        let data = self.take(byte_len)?;
        Ok(Token::array(
            tag,
            element_type,
            dimensions,
            count,
            data,
            offset,
        ))
    }

    fn read_len(&mut self) -> Result<usize> {
        let buffer = self.buffer;
        let start = self.position;
        let mut rest = &buffer[start..];
        let value =
            varint::decode_u64(&mut rest).ok_or(Error::InvalidVarint { position: start })?;
        self.position = buffer.len() - rest.len();
        usize::try_from(value).map_err(|_| Error::InvalidVarint { position: start })
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let buffer = self.buffer;
        let remaining = buffer.len() - self.position;
        if len > remaining {
            return Err(Error::UnexpectedEnd {
                position: self.position,
                needed: len - remaining,
            });
        }
        let data = &buffer[self.position..self.position + len];
        self.position += len;
        Ok(data)
    }
}

/// Decode a complete document into its flat token sequence.
pub fn tokenize(buffer: &[u8]) -> Result<Vec<Token<'_>>> {
    let mut decoder = Decoder::new(buffer);
    decoder.parse()?;
    Ok(decoder.into_tokens())
}
