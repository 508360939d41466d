//! # IR metadata
//!
//! Metadata nodes are the annotation side of the IR. The set of node kinds is
//! closed: tuples, strings, wrapped values, named sets and raw text. Each has a
//! type (always `metadata`) and an identity string, computed from the node's
//! current contents every time it is asked for.
//!
//! ```text
//! !{!"geode 0.1.0"}        anonymous tuple (identity is the definition)
//! !3                       identified tuple (identity is a short reference)
//! !llvm.ident = !{!0}      named set, always lists short references
//! ```

use super::enc;
use super::types::IrType;
use super::value::Value;
use crate::error::{Error, Result};

/// An IR metadata node
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataNode {
    /// `!{...}` tuple, optionally identified
    Tuple(MetadataTuple),
    /// `!"..."`
    String(MetadataString),
    /// Ordinary typed value in metadata position
    Value(MetadataValue),
    /// Module-level named set
    Named(NamedMetadata),
    /// Verbatim text after `!`
    Raw(RawMetadata),
}

impl MetadataNode {
    /// Type of the node
    pub fn ty(&self) -> IrType {
        IrType::Metadata
    }

    /// Textual identity of the node
    pub fn ident(&self) -> String {
        match self {
            MetadataNode::Tuple(md) => md.ident(),
            MetadataNode::String(md) => md.ident(),
            MetadataNode::Value(md) => md.ident(),
            MetadataNode::Named(md) => md.ident(),
            MetadataNode::Raw(md) => md.ident(),
        }
    }
}

/// A list of metadata nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTuple {
    /// Metadata ID; `None` for a literal tuple
    pub id: Option<String>,
    /// Child nodes in insertion order
    pub nodes: Vec<MetadataNode>,
}

impl MetadataTuple {
    /// Anonymous tuple
    pub fn new() -> Self {
        Self::default()
    }

    /// Identified tuple, referenced as `!id`
    pub fn with_id(id: impl Into<String>) -> Self {
        MetadataTuple {
            id: Some(id.into()),
            nodes: Vec::new(),
        }
    }

    /// Appends a child node
    pub fn add(&mut self, node: impl Into<MetadataNode>) {
        self.nodes.push(node.into());
    }

    /// Short reference when identified, full definition otherwise
    pub fn ident(&self) -> String {
        match &self.id {
            Some(id) => enc::metadata(id),
            None => self.def(),
        }
    }

    /// Full literal definition
    pub fn def(&self) -> String {
        let mut buf = String::from("!{");
        for (i, node) in self.nodes.iter().enumerate() {
            if i != 0 {
                buf.push_str(", ");
            }
            let ty = node.ty();
            if !ty.is_metadata() {
                buf.push_str(&format!("{} ", ty));
            }
            buf.push_str(&node.ident());
        }
        buf.push('}');
        buf
    }
}

/// A metadata string
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataString {
    /// Unescaped string value
    pub value: String,
}

impl MetadataString {
    /// Creates a metadata string
    pub fn new(value: impl Into<String>) -> Self {
        MetadataString {
            value: value.into(),
        }
    }

    /// `!"escaped"`
    pub fn ident(&self) -> String {
        format!("!\"{}\"", enc::escape_string(&self.value))
    }
}

/// A typed value used as metadata
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataValue {
    /// Wrapped value
    pub value: Value,
}

impl MetadataValue {
    /// Wraps a value
    pub fn new(value: Value) -> Self {
        MetadataValue { value }
    }

    /// `type ident` of the wrapped value
    pub fn ident(&self) -> String {
        format!("{} {}", self.value.ty(), self.value.ident())
    }
}

/// Named collection of metadata tuples owned by a module
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMetadata {
    /// Metadata name
    pub name: String,
    /// Member tuples
    pub members: Vec<MetadataTuple>,
}

impl NamedMetadata {
    /// Empty named set
    pub fn new(name: impl Into<String>) -> Self {
        NamedMetadata {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Adds a member tuple
    ///
    /// Members are always listed by short reference, so an anonymous tuple is
    /// rejected. [`Module::add_named_member`](super::Module::add_named_member)
    /// numbers one first.
    pub fn add(&mut self, member: MetadataTuple) -> Result<()> {
        if member.id.is_none() {
            return Err(Error::compiler(format!(
                "anonymous tuple {} cannot be a member of {}",
                member.def(),
                self.ident()
            )));
        }
        self.members.push(member);
        Ok(())
    }

    /// `!name`
    pub fn ident(&self) -> String {
        enc::metadata(&self.name)
    }

    /// `!{...}` listing each member by short reference
    pub fn def(&self) -> String {
        let refs: Vec<String> = self
            .members
            .iter()
            .filter_map(|md| md.id.as_deref().map(enc::metadata))
            .collect();
        format!("!{{{}}}", refs.join(", "))
    }
}

/// Raw text placed after a `!` sigil, unchecked
#[derive(Debug, Clone, PartialEq)]
pub struct RawMetadata {
    /// Verbatim text
    pub text: String,
}

impl RawMetadata {
    /// Creates a raw metadata value
    pub fn new(text: impl Into<String>) -> Self {
        RawMetadata { text: text.into() }
    }

    /// `!text`
    pub fn ident(&self) -> String {
        format!("!{}", self.text)
    }
}

impl From<MetadataTuple> for MetadataNode {
    fn from(md: MetadataTuple) -> Self {
        MetadataNode::Tuple(md)
    }
}

impl From<MetadataString> for MetadataNode {
    fn from(md: MetadataString) -> Self {
        MetadataNode::String(md)
    }
}

impl From<MetadataValue> for MetadataNode {
    fn from(md: MetadataValue) -> Self {
        MetadataNode::Value(md)
    }
}

impl From<NamedMetadata> for MetadataNode {
    fn from(md: NamedMetadata) -> Self {
        MetadataNode::Named(md)
    }
}

impl From<RawMetadata> for MetadataNode {
    fn from(md: RawMetadata) -> Self {
        MetadataNode::Raw(md)
    }
}
