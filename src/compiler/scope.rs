//! Lexical scope stack used while lowering
//!
//! Each frame maps identifiers to storage locations and remembers the token
//! that opened it (a function name, a `for` keyword, a block brace). The base
//! frame is created with the stack and can never be popped.

use crate::error::{Error, Result};
use crate::lexer::Token;
use std::collections::HashMap;

/// A single lexical scope
#[derive(Debug, Clone)]
pub struct Frame<L> {
    /// Token that introduced this scope
    pub tag: Token,
    /// Bindings declared directly in this scope
    bindings: HashMap<String, L>,
}

impl<L> Frame<L> {
    fn new(tag: Token) -> Self {
        Frame {
            tag,
            bindings: HashMap::new(),
        }
    }

    /// Names bound in this frame, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True when nothing is bound in this frame
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Stack of nested scopes, innermost last
#[derive(Debug, Clone)]
pub struct ScopeStack<L> {
    frames: Vec<Frame<L>>,
}

impl<L> ScopeStack<L> {
    /// Creates a stack holding only the base frame
    pub fn new(base: Token) -> Self {
        ScopeStack {
            frames: vec![Frame::new(base)],
        }
    }

    /// Enters a new nested scope
    pub fn push(&mut self, tag: Token) {
        self.frames.push(Frame::new(tag));
    }

    /// Leaves the innermost scope
    pub fn pop(&mut self) -> Result<Frame<L>> {
        if self.frames.len() <= 1 {
            return Err(Error::ScopeUnderflow);
        }
        self.frames.pop().ok_or(Error::ScopeUnderflow)
    }

    /// Number of frames, including the base frame
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drops frames until `depth` remain. The base frame always survives.
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth.max(1));
    }

    /// Binds `name` in the innermost frame, shadowing outer bindings
    pub fn bind(&mut self, name: impl Into<String>, location: L) {
        if let Some(frame) = self.frames.last_mut() {
            frame.bindings.insert(name.into(), location);
        }
    }

    /// Finds `name`, innermost frame first
    pub fn get(&self, name: &str) -> Option<&L> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name))
    }

    /// Resolves `name`, innermost frame first
    ///
    /// With no token to point at, a miss is reported at the token that opened
    /// the innermost scope. Prefer [`resolve`](Self::resolve) when the
    /// identifier's own token is at hand.
    pub fn lookup(&self, name: &str) -> Result<&L> {
        self.get(name).ok_or_else(|| {
            let tag = &self.current().tag;
            Error::UnboundIdentifier {
                name: name.to_string(),
                line: tag.line,
                col: tag.column,
            }
        })
    }

    /// Resolves the identifier named by `token`, reporting its position
    pub fn resolve(&self, token: &Token) -> Result<&L> {
        self.get(&token.lexeme)
            .ok_or_else(|| Error::UnboundIdentifier {
                name: token.lexeme.clone(),
                line: token.line,
                col: token.column,
            })
    }

    /// True when `name` is bound in the innermost frame itself
    pub fn is_bound_locally(&self, name: &str) -> bool {
        self.frames
            .last()
            .map_or(false, |frame| frame.bindings.contains_key(name))
    }

    /// Innermost frame
    pub fn current(&self) -> &Frame<L> {
        // The base frame is never removed
        &self.frames[self.frames.len() - 1]
    }

    /// All frames, outermost first
    pub fn frames(&self) -> &[Frame<L>] {
        &self.frames
    }
}
