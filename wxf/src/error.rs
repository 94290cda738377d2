use strum::EnumIs;
use thiserror::Error;

use crate::encoding::magic::ElementTag;

/// Every failure the codec can report.
///
/// Errors are grouped by the stage that raises them: wire-format errors come from the
/// [`Decoder`](crate::decoder::Decoder), structural errors from the encoder's array checks
/// and from [`ExprTree`](crate::tree::ExprTree) reconstruction, and template errors from
/// the FullForm front-end. None of them are retried internally; the same input always
/// yields the same error.
#[derive(Debug, Clone, PartialEq, Eq, EnumIs, Error)]
pub enum Error {
    /// The buffer does not start with the `8:` header.
    #[error("Invalid WXF header: the first two bytes must be `8:` (0x38 0x3A).")]
    InvalidMagic,

    /// A tag byte that is not part of the wire format.
    #[error("Unknown element tag {tag} (0x{tag:02x}) at byte offset {position}.")]
    UnknownTag { tag: u8, position: usize },

    /// A varint ran past the end of the buffer or does not fit in 64 bits.
    #[error("Malformed or truncated varint starting at byte offset {position}.")]
    InvalidVarint { position: usize },

    /// A payload declares more bytes than the buffer holds.
    #[error("Unexpected end of buffer at byte offset {position}: {needed} more byte(s) required.")]
    UnexpectedEnd { position: usize, needed: usize },

    /// An array subtype code that is unknown, or not valid for the array kind.
    #[error("Invalid array element type code {code} at byte offset {position}.")]
    InvalidArrayElementType { code: u8, position: usize },

    /// The dimensions of an array overflow the addressable size.
    #[error("Array dimensions at byte offset {position} overflow the addressable size.")]
    ArrayTooLarge { position: usize },

    /// A string-like token whose payload is not valid UTF-8.
    #[error("Payload of the token at byte offset {position} is not valid UTF-8.")]
    InvalidUtf8 { position: usize },

    /// The product of the dimensions disagrees with the number of supplied elements.
    #[error(
        "Array dimensions describe {expected} element(s) but {found} element(s) were supplied."
    )]
    DimensionMismatch { expected: usize, found: usize },

    /// The token stream ended while composite nodes were still waiting for children.
    #[error(
        "Token stream ended with {open_frames} composite node(s) still missing children."
    )]
    IncompleteTree { open_frames: usize },

    /// Tokens remain after the root expression is complete.
    #[error("Unexpected trailing token at index {position}: the root expression is already complete.")]
    TrailingTokens { position: usize },

    /// A function token is not followed by a symbol naming its head.
    #[error("Function token at index {position} is not followed by a head symbol.")]
    MissingHead { position: usize },

    /// There is nothing to build a tree from.
    #[error("Cannot build an expression tree from an empty token stream.")]
    EmptyStream,

    /// Nesting exceeds [`DecodeLimits::max_depth`](crate::limits::DecodeLimits::max_depth).
    #[error("Expression nesting exceeds the configured depth limit of {limit}.")]
    DepthLimitExceeded { limit: usize },

    /// The buffer holds more tokens than [`DecodeLimits::max_tokens`](crate::limits::DecodeLimits::max_tokens).
    #[error("Buffer holds more than the configured limit of {limit} tokens.")]
    TokenLimitExceeded { limit: usize },

    /// A token accessor was used on a token of another kind.
    #[error("Expected a {expected} token, found `{found}`.")]
    UnexpectedToken {
        expected: &'static str,
        found: ElementTag,
    },

    /// The template could not be lexed or parsed.
    #[error("Invalid FullForm template:\n{}", .0.join("\n"))]
    TemplateSyntax(Vec<String>),

    /// A template placeholder has no entry in the placeholder map.
    #[error("Placeholder `{0}` has no entry in the placeholder map.")]
    UnresolvedPlaceholder(String),

    /// A numeric literal of a template does not fit a machine number.
    #[error(
        "Numeric literal `{text}` cannot be converted ({reason}); encode it with `push_bigint`/`push_bigreal` instead."
    )]
    NumericConversion { text: String, reason: String },

    /// Function heads in templates must be symbols.
    #[error("Template head `{0}` is not a symbol.")]
    InvalidHead(String),

    /// `Rule` and `RuleDelayed` take exactly two arguments.
    #[error("`{head}` takes exactly 2 arguments, found {found}.")]
    RuleArity { head: String, found: usize },
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
