//! Resource limits applied while decoding untrusted buffers.
//!
//! Decoding cost is linear in the input, so bounding the input bounds the work. The only
//! quantities that grow independently of the byte count are the number of tokens kept in
//! memory and the nesting depth of the rebuilt tree; both can be capped here.

/// Nesting depth accepted by [`DecodeLimits::default`]; matches the usual recursion limit of
/// the systems that produce WXF.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Limits for [`Decoder`](crate::decoder::Decoder) and [`ExprTree`](crate::tree::ExprTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum number of tokens a buffer may decode to.
    pub max_tokens: usize,
    /// Maximum nesting depth of composite elements (the root sits at depth 0).
    pub max_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_tokens: usize::MAX,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeLimits {
    /// No limits at all.
    ///
    /// Building and dropping trees never recurses, but
    /// [`ExprTree::to_expr`](crate::tree::ExprTree::to_expr) and dropping the resulting
    /// [`Expr`](crate::expr::Expr) do, one stack frame per nesting level. Keep a finite
    /// `max_depth` for untrusted input that will be converted to `Expr`.
    pub const fn unlimited() -> Self {
        Self {
            max_tokens: usize::MAX,
            max_depth: usize::MAX,
        }
    }

    pub const fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
