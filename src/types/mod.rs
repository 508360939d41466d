//! # Geode Source-Level Types
//!
//! A declared type is written as a base name followed by modifiers, applied
//! in the order they appear:
//!
//! ```text
//! int          ;; plain 64-bit integer
//! byte*        ;; pointer to byte
//! int**        ;; pointer to pointer to int (PointerLevel 2)
//! int[]        ;; slice of int
//! int?         ;; inferred from the initializer
//! ```
//!
//! [`TypeAnnotation`] is what the parser produces. [`TypeTable`] resolves it to
//! an IR type, interning slice aggregates so every element type maps to
//! exactly one slice layout.

mod table;

pub use table::TypeTable;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type names the scanner classifies as type tokens without registration
pub const BUILTIN_TYPE_NAMES: &[&str] = &[
    "int", "long", "byte", "bool", "float", "double", "string", "void", "i8", "i16", "i32",
    "i64",
];

/// One modifier applied to a base type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeModifier {
    /// `*` - one level of indirection
    Pointer,
    /// `?` - concrete type inferred from the initializer
    Unknown,
    /// `[]` - slice of the type so far
    Slice,
}

/// A parsed type annotation
///
/// `pointer_level` always equals the number of [`TypeModifier::Pointer`]
/// entries in `modifiers`, and `unknown` is true iff `modifiers` holds exactly
/// one [`TypeModifier::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeAnnotation {
    /// Base type name
    pub name: String,
    /// Modifiers in encounter order
    pub modifiers: Vec<TypeModifier>,
    /// Number of pointer modifiers
    pub pointer_level: usize,
    /// Whether the concrete type is inferred
    pub unknown: bool,
}

impl TypeAnnotation {
    /// A bare type with no modifiers
    pub fn named(name: impl Into<String>) -> Self {
        TypeAnnotation {
            name: name.into(),
            modifiers: Vec::new(),
            pointer_level: 0,
            unknown: false,
        }
    }

    /// Appends a pointer modifier
    pub fn pointer(mut self) -> Self {
        self.modifiers.push(TypeModifier::Pointer);
        self.pointer_level += 1;
        self
    }

    /// Appends a slice modifier
    pub fn slice(mut self) -> Self {
        self.modifiers.push(TypeModifier::Slice);
        self
    }

    /// Marks the annotation as inferred. Has no effect if already set.
    pub fn inferred(mut self) -> Self {
        if !self.unknown {
            self.modifiers.push(TypeModifier::Unknown);
            self.unknown = true;
        }
        self
    }

    /// True when the annotation is the `void` type with no modifiers
    pub fn is_void(&self) -> bool {
        self.name == "void" && self.modifiers.is_empty()
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for modifier in &self.modifiers {
            match modifier {
                TypeModifier::Pointer => write!(f, "*")?,
                TypeModifier::Unknown => write!(f, "?")?,
                TypeModifier::Slice => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}
