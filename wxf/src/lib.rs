//! wxf: a zero-copy codec for the Wolfram eXchange Format.
//!
//! WXF is a tagged, length-prefixed binary encoding of symbolic expressions: function
//! applications over integers, reals, strings, symbols, associations, rules and dense numeric
//! arrays. This crate covers both directions:
//! - writing, with the append-only [`Encoder`](encoder::Encoder) or from an owned
//!   [`Expr`](expr::Expr) value;
//! - reading, with the flat [`Decoder`](decoder::Decoder) and the
//!   [`ExprTree`](tree::ExprTree) that rebuilds the hierarchy from its prefix layout.
//!
//! With the `fullform` feature (on by default), documents can also be described by a short
//! FullForm template with `#name` placeholders, see [`fullform`].
//!
//! Encoding shape
//!  - A document is the `8:` header followed by a single expression in prefix order: a
//!    function element carries its arity and head, and its arguments simply follow. See
//!    [`encoding::magic`].
//!  - Lengths, arities and dimensions are LEB128 varints; see [`encoding::varint`].
//!  - Numbers and array elements are stored in native byte order.
//!
//! Performance
//!  - Decoding is a single linear pass; tokens borrow their payloads from the input buffer.
//!  - Tree reconstruction and encoding use explicit stacks, so deep inputs do not recurse.
//!
//! Example
//! ```
//! use wxf::prelude::*;
//!
//! let mut enc = Encoder::document();
//! enc.push_function("List", 2).push_integer(1).push_integer(2);
//!
//! let tree = ExprTree::parse(enc.as_bytes()).unwrap();
//! assert_eq!(tree.head(tree.root()), Some("List"));
//! assert_eq!(tree.root().len(), 2);
//! assert_eq!(
//!     tree.to_expr().unwrap(),
//!     Expr::list([Expr::Integer(1), Expr::Integer(2)])
//! );
//! ```

/// Single-pass tokenizer.
pub mod decoder;
/// Append-only writer.
pub mod encoder;
/// Wire format constants, varints and array element types.
pub mod encoding;
/// Error type shared by the whole crate.
pub mod error;
/// Owned expression values.
pub mod expr;
/// FullForm template parser and compiler.
#[cfg(feature = "fullform")]
pub mod fullform;
/// Decoding limits.
pub mod limits;
/// Decoded tokens.
pub mod token;
/// Expression tree reconstruction.
pub mod tree;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::decoder::{Decoder, tokenize};
    pub use crate::encoder::{Encoder, WxfEncodable};
    pub use crate::encoding::magic::{ArrayElementType, ElementTag};
    pub use crate::error::{Error, Result};
    pub use crate::expr::{ArrayValue, Expr};
    pub use crate::limits::DecodeLimits;
    pub use crate::token::{Token, TokenPayload};
    pub use crate::tree::{ExprNode, ExprTree};

    #[cfg(feature = "fullform")]
    pub use crate::fullform::{Placeholders, fullform_to_wxf};
}
