//! FullForm templates.
//!
//! Role
//! - Describe a WXF document with a short textual template such as
//!   `f[Rule["data", #payload], {1, 2.5}]` instead of a chain of `push_*` calls.
//! - `{...}` is `List[...]`, and `Rule`/`RuleDelayed` heads get their own tags. Every other
//!   head, `Association` included, is written as an ordinary function element.
//! - Splice caller-supplied pieces into the output through named placeholders (`#name`).
//!
//! Two stages:
//! 1) [`parse`] lexes and parses the template into an [`Expression`] tree.
//! 2) [`compile`] walks that tree and drives an [`Encoder`](crate::encoder::Encoder),
//!    resolving placeholders against a [`Placeholders`] map.
//!
//! [`fullform_to_wxf`] chains both. Numeric literals must fit `i64` / finite `f64`; larger
//! or high-precision numbers belong in a placeholder built with
//! [`Encoder::push_bigint`](crate::encoder::Encoder::push_bigint) or
//! [`Encoder::push_bigreal`](crate::encoder::Encoder::push_bigreal).
//!
//! Example
//! ```
//! use wxf::fullform::{Placeholders, fullform_to_wxf};
//!
//! let mut map = Placeholders::new();
//! map.insert_generator("#x", |enc| {
//!     enc.push_integer(42);
//!     Ok(())
//! });
//! let with_placeholder = fullform_to_wxf("f[#x]", &map, true).unwrap();
//! let literal = fullform_to_wxf("f[42]", &Placeholders::new(), true).unwrap();
//! assert_eq!(with_placeholder, literal);
//! ```
mod ast;
pub mod compiler;
pub mod lexer;
pub mod parser;

pub use ast::{Atom, AtomKind, Expression};
pub use compiler::{Fragment, Placeholders, compile, fullform_to_wxf};
pub use parser::{parse, parse_lossy};
