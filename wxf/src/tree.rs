//! Hierarchical view over a flat token stream.
//!
//! The wire format stores expressions in prefix order with declared arities and no closing
//! markers, so the hierarchy has to be rebuilt by counting. [`ExprTree::build`] keeps an
//! explicit stack of open composite nodes (no recursion); each node remembers how many
//! children it declared, and a node is moved into its parent as soon as its last child has
//! been placed.
//!
//! ```
//! use wxf::tree::ExprTree;
//!
//! // List[1, 2]
//! let bytes = [b'8', b':', 102, 2, 115, 4, b'L', b'i', b's', b't', 67, 1, 67, 2];
//! let tree = ExprTree::parse(&bytes).unwrap();
//! let root = tree.root();
//! assert_eq!(tree.head(root), Some("List"));
//! let values: Vec<i64> = root
//!     .children()
//!     .iter()
//!     .map(|child| tree.token(child).integer().unwrap())
//!     .collect();
//! assert_eq!(values, [1, 2]);
//! ```
use std::ops::Index;

use log::{debug, warn};

use crate::decoder::Decoder;
use crate::encoding::magic::ElementTag;
use crate::error::{Error, Result};
use crate::limits::DecodeLimits;
use crate::token::Token;

/// A node of an [`ExprTree`].
///
/// Nodes do not hold token data themselves; they index into the token vector owned by the
/// tree. A node has children iff its token is a function, association or rule, in which case
/// the number of children equals the declared arity (2 for rules).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprNode {
    token: usize,
    head: Option<usize>,
    tag: ElementTag,
    children: Vec<ExprNode>,
}

impl ExprNode {
    fn new(token: usize, head: Option<usize>, tag: ElementTag) -> Self {
        Self {
            token,
            head,
            tag,
            children: Vec::new(),
        }
    }

    /// Index of this node's token in [`ExprTree::tokens`].
    pub fn token_index(&self) -> usize {
        self.token
    }

    /// Index of the head symbol token of a function node.
    pub fn head_index(&self) -> Option<usize> {
        self.head
    }

    pub fn tag(&self) -> ElementTag {
        self.tag
    }

    pub fn children(&self) -> &[ExprNode] {
        &self.children
    }

    pub fn get(&self, index: usize) -> Option<&ExprNode> {
        self.children.get(index)
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether this node stands for a scalar or array element.
    pub fn is_leaf(&self) -> bool {
        !self.tag.is_composite()
    }
}

// Children are released with an explicit stack, so deep trees do not recurse in `drop`.
impl Drop for ExprNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl Index<usize> for ExprNode {
    type Output = ExprNode;

    fn index(&self, index: usize) -> &Self::Output {
        &self.children[index]
    }
}

/// An open composite node waiting for `size` children.
struct Frame {
    node: ExprNode,
    size: usize,
}

/// An expression tree together with the tokens it indexes into.
///
/// The tree borrows the source buffer through its tokens and therefore cannot outlive it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprTree<'a> {
    tokens: Vec<Token<'a>>,
    root: ExprNode,
}

impl<'a> ExprTree<'a> {
    /// Decode a complete WXF document and rebuild its tree.
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        Self::parse_with_limits(buffer, DecodeLimits::default())
    }

    pub fn parse_with_limits(buffer: &'a [u8], limits: DecodeLimits) -> Result<Self> {
        let mut decoder = Decoder::with_limits(buffer, limits);
        decoder.parse()?;
        Self::build_with_limits(decoder.into_tokens(), limits)
    }

    /// Rebuild the tree encoded by a flat token sequence in prefix order.
    pub fn build(tokens: Vec<Token<'a>>) -> Result<Self> {
        Self::build_with_limits(tokens, DecodeLimits::default())
    }

    /// Same as [`build`](Self::build) with explicit limits.
    ///
    /// Fails with [`Error::IncompleteTree`] if the stream ends while composite nodes still
    /// expect children, and with [`Error::TrailingTokens`] if tokens remain once the root is
    /// complete. Nothing partial is returned in either case.
    pub fn build_with_limits(tokens: Vec<Token<'a>>, limits: DecodeLimits) -> Result<Self> {
        if tokens.is_empty() {
            return Err(Error::EmptyStream);
        }

        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<ExprNode> = None;
        let mut pos = 0;

        while pos < tokens.len() {
            if root.is_some() {
                return Err(Error::TrailingTokens { position: pos });
            }

            let (node, size, consumed) = Self::open_node(&tokens, pos)?;
            pos += consumed;

            if size > 0 {
                if stack.len() > limits.max_depth {
                    return Err(Error::DepthLimitExceeded {
                        limit: limits.max_depth,
                    });
                }
                // The declared size is untrusted; never reserve more slots than tokens left.
                let mut node = node;
                node.children.reserve_exact(size.min(tokens.len() - pos));
                stack.push(Frame { node, size });
                continue;
            }

            // `node` is complete: place it, then close every frame it fills up.
            let mut done = node;
            loop {
                let Some(frame) = stack.last_mut() else {
                    root = Some(done);
                    break;
                };
                frame.node.children.push(done);
                if frame.node.children.len() < frame.size {
                    break;
                }
                done = match stack.pop() {
                    Some(full) => full.node,
                    None => break,
                };
            }
        }

        if !stack.is_empty() {
            warn!(
                "Incomplete WXF expression: {} composite node(s) still expect children",
                stack.len()
            );
            return Err(Error::IncompleteTree {
                open_frames: stack.len(),
            });
        }

        let root = root.ok_or(Error::EmptyStream)?;
        debug!("Rebuilt expression tree from {} token(s)", tokens.len());
        Ok(Self { tokens, root })
    }

    /// Create the node for `tokens[pos]`.
    ///
    /// Returns the node, the number of children it declares and the number of tokens it
    /// consumes (2 for functions, whose head symbol is folded into the node).
    fn open_node(tokens: &[Token<'a>], pos: usize) -> Result<(ExprNode, usize, usize)> {
        let token = &tokens[pos];
        let tag = token.tag();
        match tag {
            ElementTag::Function => {
                let head = pos + 1;
                match tokens.get(head) {
                    Some(t) if t.tag() == ElementTag::Symbol => {
                        Ok((ExprNode::new(pos, Some(head), tag), token.arity(), 2))
                    }
                    _ => Err(Error::MissingHead { position: pos }),
                }
            }
            ElementTag::Association | ElementTag::Rule | ElementTag::RuleDelayed => {
                Ok((ExprNode::new(pos, None, tag), token.arity(), 1))
            }
            _ => Ok((ExprNode::new(pos, None, tag), 0, 1)),
        }
    }

    pub fn root(&self) -> &ExprNode {
        &self.root
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token<'a>> {
        self.tokens
    }

    /// The token a node stands for.
    pub fn token(&self, node: &ExprNode) -> &Token<'a> {
        &self.tokens[node.token]
    }

    /// Head symbol name of a function node.
    pub fn head(&self, node: &ExprNode) -> Option<&'a str> {
        node.head.and_then(|i| self.tokens[i].symbol())
    }

    /// Pre-order traversal yielding each node with its depth (the root is at depth 0).
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, &self.root)],
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }
}

impl<'a> Index<&ExprNode> for ExprTree<'a> {
    type Output = Token<'a>;

    fn index(&self, node: &ExprNode) -> &Self::Output {
        self.token(node)
    }
}

/// Iterator returned by [`ExprTree::walk`].
pub struct Walk<'t> {
    stack: Vec<(usize, &'t ExprNode)>,
}

impl<'t> Iterator for Walk<'t> {
    type Item = (usize, &'t ExprNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;

    fn fragment_tokens(enc: &Encoder) -> Vec<Token<'_>> {
        let mut decoder = Decoder::fragment(enc.as_bytes());
        decoder.parse().unwrap();
        decoder.into_tokens()
    }

    #[test]
    fn nested_composites_are_rebuilt() {
        // f[g[1], <|a -> 2|>, x]
        let mut enc = Encoder::new();
        enc.push_function("f", 3)
            .push_function("g", 1)
            .push_integer(1)
            .push_association(1)
            .push_rule()
            .push_symbol("a")
            .push_integer(2)
            .push_symbol("x");
        let tree = ExprTree::build(fragment_tokens(&enc)).unwrap();

        let root = tree.root();
        assert_eq!(tree.head(root), Some("f"));
        assert_eq!(root.len(), 3);
        assert_eq!(tree.head(&root[0]), Some("g"));
        assert_eq!(tree.token(&root[0][0]).integer().unwrap(), 1);
        assert_eq!(root[1].tag(), ElementTag::Association);
        assert_eq!(root[1][0].tag(), ElementTag::Rule);
        assert_eq!(tree.token(&root[1][0][0]).symbol(), Some("a"));
        assert!(root[2].is_leaf());
        assert_eq!(tree.node_count(), 8);
    }

    #[test]
    fn zero_arity_composites_complete_immediately() {
        let mut enc = Encoder::new();
        enc.push_function("f", 2)
            .push_function("g", 0)
            .push_association(0);
        let tree = ExprTree::build(fragment_tokens(&enc)).unwrap();
        assert_eq!(tree.root().len(), 2);
        assert!(tree.root()[0].is_empty());
        assert!(!tree.root()[0].is_leaf());
        assert!(tree.root()[1].is_empty());
    }

    #[test]
    fn scalar_root() {
        let mut enc = Encoder::new();
        enc.push_string("alone");
        let tree = ExprTree::build(fragment_tokens(&enc)).unwrap();
        assert!(tree.root().is_leaf());
        assert_eq!(tree.token(tree.root()).text().unwrap(), "alone");

        enc.push_integer(1);
        assert_eq!(
            ExprTree::build(fragment_tokens(&enc)).unwrap_err(),
            Error::TrailingTokens { position: 1 }
        );
    }

    #[test]
    fn structural_errors() {
        let mut enc = Encoder::new();
        enc.push_function("f", 3).push_integer(1);
        assert_eq!(
            ExprTree::build(fragment_tokens(&enc)).unwrap_err(),
            Error::IncompleteTree { open_frames: 1 }
        );

        // Function tag directly followed by an integer instead of its head.
        let bytes = [102, 1, 67, 1, 67, 2];
        let mut decoder = Decoder::fragment(&bytes);
        decoder.parse().unwrap();
        assert_eq!(
            ExprTree::build(decoder.into_tokens()).unwrap_err(),
            Error::MissingHead { position: 0 }
        );

        assert_eq!(ExprTree::build(Vec::new()).unwrap_err(), Error::EmptyStream);
    }

    #[test]
    fn depth_limit() {
        let mut enc = Encoder::new();
        for _ in 0..5 {
            enc.push_function("f", 1);
        }
        enc.push_integer(0);
        let limits = DecodeLimits::default().with_max_depth(3);
        assert_eq!(
            ExprTree::build_with_limits(fragment_tokens(&enc), limits).unwrap_err(),
            Error::DepthLimitExceeded { limit: 3 }
        );
        let limits = DecodeLimits::default().with_max_depth(4);
        assert!(ExprTree::build_with_limits(fragment_tokens(&enc), limits).is_ok());
    }

    #[test]
    fn very_deep_trees_drop_without_recursion() {
        const DEPTH: usize = 200_000;
        let mut enc = Encoder::new();
        for _ in 0..DEPTH {
            enc.push_function("f", 1);
        }
        enc.push_integer(0);

        let tree =
            ExprTree::build_with_limits(fragment_tokens(&enc), DecodeLimits::unlimited()).unwrap();
        assert_eq!(tree.walk().map(|(depth, _)| depth).max(), Some(DEPTH));
        drop(tree);
    }

    #[test]
    fn walk_is_preorder_with_depth() {
        let mut enc = Encoder::new();
        enc.push_function("f", 2)
            .push_function("g", 1)
            .push_integer(1)
            .push_integer(2);
        let tree = ExprTree::build(fragment_tokens(&enc)).unwrap();
        let visited: Vec<(usize, usize)> = tree
            .walk()
            .map(|(depth, node)| (depth, node.token_index()))
            .collect();
        // Token indices: f=0 (head 1), g=2 (head 3), 1=4, 2=5
        assert_eq!(visited, [(0, 0), (1, 2), (2, 4), (1, 5)]);
    }
}
