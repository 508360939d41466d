//! Value conversions between IR types

use super::function::FunctionLowerer;
use crate::compiler::ir::{CastOp, FloatPredicate, Instruction, IntPredicate, IrType, Value};
use crate::error::{Error, Result};

/// Conversion instruction for a scalar cast, `None` when no single instruction applies
fn cast_op(from: &IrType, to: &IrType) -> Option<CastOp> {
    match (from, to) {
        (IrType::Int(a), IrType::Int(b)) if a > b => Some(CastOp::Trunc),
        // i1 is a truth value, never a sign bit
        (IrType::Int(1), IrType::Int(_)) => Some(CastOp::ZExt),
        (IrType::Int(_), IrType::Int(_)) => Some(CastOp::SExt),
        (IrType::Int(_), IrType::Float(_)) => Some(CastOp::SIToFP),
        (IrType::Float(_), IrType::Int(_)) => Some(CastOp::FPToSI),
        (IrType::Float(a), IrType::Float(b)) if a.bits() > b.bits() => Some(CastOp::FPTrunc),
        (IrType::Float(_), IrType::Float(_)) => Some(CastOp::FPExt),
        (IrType::Pointer(_), IrType::Pointer(_)) => Some(CastOp::BitCast),
        _ => None,
    }
}

impl FunctionLowerer<'_> {
    /// Converts `value` to `to`, emitting whatever instruction that takes
    ///
    /// Conversions to `i1` compare against zero (`icmp ne` / `fcmp one`)
    /// instead of truncating. Integer constants are retyped in place. Anything
    /// without a conversion fails with [`Error::TypeCast`] naming `context`.
    pub fn create_type_cast(&mut self, value: Value, to: &IrType, context: &str) -> Result<Value> {
        let from = value.ty().clone();
        if from == *to {
            return Ok(value);
        }

        if *to == IrType::I1 {
            return self.truth_value(value, context);
        }

        match (&value, to) {
            (Value::Int { value: v, .. }, IrType::Int(_)) => return Ok(Value::int(to.clone(), *v)),
            (Value::Int { value: v, .. }, IrType::Float(_)) if from != IrType::I1 => {
                return Ok(Value::Float {
                    ty: to.clone(),
                    value: *v as f64,
                })
            }
            (Value::Float { value: v, .. }, IrType::Float(_)) => {
                return Ok(Value::Float {
                    ty: to.clone(),
                    value: *v,
                })
            }
            (Value::Null(_), IrType::Pointer(_)) if from.is_pointer() => {
                return Ok(Value::Null(to.clone()))
            }
            _ => {}
        }

        let op = cast_op(&from, to).ok_or_else(|| Error::cast(&from, to, context))?;
        let dst = self.temp();
        self.emit(Instruction::Cast {
            dst: dst.clone(),
            op,
            value,
            to: to.clone(),
        });
        Ok(Value::register(to.clone(), dst))
    }

    /// `value != 0` as an `i1`
    fn truth_value(&mut self, value: Value, context: &str) -> Result<Value> {
        let ty = value.ty().clone();
        if let Value::Int { value: v, .. } = &value {
            return Ok(Value::bool(*v != 0));
        }

        let zero = match &ty {
            IrType::Int(_) | IrType::Float(_) | IrType::Pointer(_) => Value::zero(&ty),
            _ => None,
        }
        .ok_or_else(|| Error::cast(&ty, IrType::I1, context))?;

        let dst = self.temp();
        let inst = if ty.is_float() {
            Instruction::FCmp {
                dst: dst.clone(),
                pred: FloatPredicate::One,
                lhs: value,
                rhs: zero,
            }
        } else {
            Instruction::ICmp {
                dst: dst.clone(),
                pred: IntPredicate::Ne,
                lhs: value,
                rhs: zero,
            }
        };
        self.emit(inst);
        Ok(Value::register(IrType::I1, dst))
    }
}
