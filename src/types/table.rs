//! Resolution of source type annotations to IR types

use super::{TypeAnnotation, TypeModifier};
use crate::compiler::ir::{FloatKind, IrType, SliceType};
use crate::error::{Error, Result};
use std::collections::HashMap;

lazy_static::lazy_static! {
    /// Builtin Geode type names and their IR representation
    static ref BUILTIN_TYPES: HashMap<&'static str, IrType> = {
        let mut m = HashMap::new();
        m.insert("int", IrType::I64);
        m.insert("long", IrType::I64);
        m.insert("i64", IrType::I64);
        m.insert("i32", IrType::I32);
        m.insert("i16", IrType::Int(16));
        m.insert("i8", IrType::I8);
        m.insert("byte", IrType::I8);
        m.insert("bool", IrType::I1);
        m.insert("float", IrType::Float(FloatKind::Float));
        m.insert("double", IrType::DOUBLE);
        m.insert("string", IrType::I8.pointer_to());
        m.insert("void", IrType::Void);
        m
    };
}

/// Maps type names to IR types and interns slice layouts
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    /// User-registered named types
    named: HashMap<String, IrType>,
    /// Slice layouts, keyed by element type
    slices: HashMap<IrType, SliceType>,
    /// Reverse index from aggregate to element type
    slice_elements: HashMap<IrType, IrType>,
}

impl TypeTable {
    /// Creates a table that knows the builtin types
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named type (e.g. a struct alias)
    pub fn register(&mut self, name: impl Into<String>, ty: IrType) {
        self.named.insert(name.into(), ty);
    }

    /// Looks up a base type name
    pub fn lookup(&self, name: &str) -> Option<IrType> {
        BUILTIN_TYPES
            .get(name)
            .cloned()
            .or_else(|| self.named.get(name).cloned())
    }

    /// Returns the interned slice layout for an element type
    pub fn slice_of(&mut self, elem: &IrType) -> &SliceType {
        if !self.slices.contains_key(elem) {
            let slice = SliceType::new(elem.clone());
            self.slice_elements
                .insert(slice.aggregate.clone(), elem.clone());
            self.slices.insert(elem.clone(), slice);
        }
        &self.slices[elem]
    }

    /// Element type of a slice aggregate previously produced by this table
    pub fn slice_element(&self, aggregate: &IrType) -> Option<&IrType> {
        self.slice_elements.get(aggregate)
    }

    /// Resolves an annotation to its IR type
    ///
    /// Modifiers apply in encounter order. An inferred annotation cannot be
    /// resolved on its own; the caller must supply the type from context.
    pub fn resolve(&mut self, annotation: &TypeAnnotation) -> Result<IrType> {
        if annotation.unknown {
            return Err(Error::compiler(format!(
                "type {} is inferred and needs an initializer",
                annotation
            )));
        }

        let mut ty = self.lookup(&annotation.name).ok_or_else(|| Error::UnknownType {
            name: annotation.name.clone(),
        })?;

        for modifier in &annotation.modifiers {
            ty = match modifier {
                TypeModifier::Pointer => {
                    // i8* is the pointer spelling of void*
                    if ty.is_void() {
                        IrType::I8.pointer_to()
                    } else {
                        ty.pointer_to()
                    }
                }
                TypeModifier::Slice => self.slice_of(&ty).aggregate.clone(),
                TypeModifier::Unknown => ty,
            };
        }

        Ok(ty)
    }
}
