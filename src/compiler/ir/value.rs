//! IR operands: constants, registers and globals

use super::enc;
use super::types::{FloatKind, IrType};
use std::fmt;

/// A typed IR value that can appear as an instruction operand
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer constant (`i1` renders as `true`/`false`)
    Int {
        /// Integer type
        ty: IrType,
        /// Constant value
        value: i64,
    },
    /// Floating point constant
    Float {
        /// `float` or `double`
        ty: IrType,
        /// Constant value
        value: f64,
    },
    /// `null` of a pointer type
    Null(IrType),
    /// Function-local SSA register, `%name`
    Register {
        /// Register type
        ty: IrType,
        /// Register name without sigil
        name: String,
    },
    /// Module-level symbol, `@name`
    Global {
        /// Type of the symbol reference (a pointer for data)
        ty: IrType,
        /// Symbol name without sigil
        name: String,
    },
    /// Constant expression rendered verbatim (e.g. `getelementptr` on a global)
    ConstExpr {
        /// Result type
        ty: IrType,
        /// Expression text
        text: String,
    },
}

impl Value {
    /// Integer constant of the given type
    pub fn int(ty: IrType, value: i64) -> Self {
        Value::Int { ty, value }
    }

    /// `i1` constant
    pub fn bool(value: bool) -> Self {
        Value::Int {
            ty: IrType::I1,
            value: value as i64,
        }
    }

    /// `double` constant
    pub fn double(value: f64) -> Self {
        Value::Float {
            ty: IrType::DOUBLE,
            value,
        }
    }

    /// Register reference
    pub fn register(ty: IrType, name: impl Into<String>) -> Self {
        Value::Register {
            ty,
            name: name.into(),
        }
    }

    /// Zero constant of a scalar type, if the type has one
    pub fn zero(ty: &IrType) -> Option<Self> {
        match ty {
            IrType::Int(_) => Some(Value::int(ty.clone(), 0)),
            IrType::Float(_) => Some(Value::Float {
                ty: ty.clone(),
                value: 0.0,
            }),
            IrType::Pointer(_) => Some(Value::Null(ty.clone())),
            _ => None,
        }
    }

    /// Type of the value
    pub fn ty(&self) -> &IrType {
        match self {
            Value::Int { ty, .. }
            | Value::Float { ty, .. }
            | Value::Null(ty)
            | Value::Register { ty, .. }
            | Value::Global { ty, .. }
            | Value::ConstExpr { ty, .. } => ty,
        }
    }

    /// Textual identity of the value, without its type
    pub fn ident(&self) -> String {
        match self {
            Value::Int { ty, value } if *ty == IrType::I1 => {
                if *value != 0 { "true" } else { "false" }.to_string()
            }
            Value::Int { value, .. } => value.to_string(),
            Value::Float { ty, value } => {
                // Hex form is exact; float constants are spelled as the widened double
                let bits = match ty {
                    IrType::Float(FloatKind::Float) => (*value as f32 as f64).to_bits(),
                    _ => value.to_bits(),
                };
                format!("0x{:016X}", bits)
            }
            Value::Null(_) => "null".to_string(),
            Value::Register { name, .. } => enc::local(name),
            Value::Global { name, .. } => enc::global(name),
            Value::ConstExpr { text, .. } => text.clone(),
        }
    }
}

/// Renders `type ident`, the form used for most operands
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty(), self.ident())
    }
}
