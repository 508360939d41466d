//! IR type definitions

use std::fmt;

/// Float widths supported by the IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    /// 32-bit IEEE float
    Float,
    /// 64-bit IEEE float
    Double,
}

impl FloatKind {
    /// Returns the width of this float kind in bits
    pub fn bits(&self) -> u32 {
        match self {
            FloatKind::Float => 32,
            FloatKind::Double => 64,
        }
    }
}

/// An IR type as written in the textual IR
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    /// `void`
    Void,
    /// `iN`
    Int(u32),
    /// `float` / `double`
    Float(FloatKind),
    /// `T*`
    Pointer(Box<IrType>),
    /// `[N x T]`
    Array(u64, Box<IrType>),
    /// `{ T, U, ... }`
    Struct(Vec<IrType>),
    /// `metadata`
    Metadata,
    /// `label`
    Label,
}

impl IrType {
    /// 1-bit boolean
    pub const I1: IrType = IrType::Int(1);
    /// 8-bit integer
    pub const I8: IrType = IrType::Int(8);
    /// 32-bit integer
    pub const I32: IrType = IrType::Int(32);
    /// 64-bit integer
    pub const I64: IrType = IrType::Int(64);
    /// 64-bit float
    pub const DOUBLE: IrType = IrType::Float(FloatKind::Double);

    /// Pointer to this type
    pub fn pointer_to(&self) -> IrType {
        IrType::Pointer(Box::new(self.clone()))
    }

    /// Type a pointer points to, if this is a pointer
    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Bit width for integer types
    pub fn int_width(&self) -> Option<u32> {
        match self {
            IrType::Int(bits) => Some(*bits),
            _ => None,
        }
    }

    /// True for `iN`
    pub fn is_integer(&self) -> bool {
        matches!(self, IrType::Int(_))
    }

    /// True for `float` and `double`
    pub fn is_float(&self) -> bool {
        matches!(self, IrType::Float(_))
    }

    /// True for `T*`
    pub fn is_pointer(&self) -> bool {
        matches!(self, IrType::Pointer(_))
    }

    /// True for `void`
    pub fn is_void(&self) -> bool {
        matches!(self, IrType::Void)
    }

    /// True for `metadata`
    pub fn is_metadata(&self) -> bool {
        matches!(self, IrType::Metadata)
    }

    /// Field list of a struct type
    pub fn fields(&self) -> Option<&[IrType]> {
        match self {
            IrType::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::Int(bits) => write!(f, "i{}", bits),
            IrType::Float(FloatKind::Float) => write!(f, "float"),
            IrType::Float(FloatKind::Double) => write!(f, "double"),
            IrType::Pointer(inner) => write!(f, "{}*", inner),
            IrType::Array(len, elem) => write!(f, "[{} x {}]", len, elem),
            IrType::Struct(fields) => {
                if fields.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, " }}")
            }
            IrType::Metadata => write!(f, "metadata"),
            IrType::Label => write!(f, "label"),
        }
    }
}

/// A Geode slice: a `{ elem*, i64 }` aggregate that remembers its element type
///
/// The aggregate is what the emitter writes; the element type is what indexing
/// and iteration lowering read without picking apart the field list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceType {
    /// Element type
    pub elem: IrType,
    /// Underlying aggregate, always `{ elem*, i64 }`
    pub aggregate: IrType,
}

impl SliceType {
    /// Index of the element pointer field
    pub const DATA_FIELD: u32 = 0;
    /// Index of the length field
    pub const LEN_FIELD: u32 = 1;

    /// Builds the slice layout for an element type
    pub fn new(elem: IrType) -> Self {
        let aggregate = IrType::Struct(vec![elem.pointer_to(), IrType::I64]);
        SliceType { elem, aggregate }
    }

    /// Returns the underlying IR type of the slice
    pub fn underlying(&self) -> &IrType {
        &self.aggregate
    }
}
