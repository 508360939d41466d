//! Expression lowering

use super::function::FunctionLowerer;
use crate::compiler::ir::{
    BinaryOp as IrBinaryOp, FloatPredicate, Instruction, IntPredicate, IrType, SliceType,
    Terminator, Value,
};
use crate::error::{Error, Result};
use crate::parser::{BinaryOp, Expression, UnaryOp};

impl FunctionLowerer<'_> {
    /// Lowers an expression into the current block and returns its value
    pub fn lower_expression(&mut self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::IntLiteral { value, .. } => Ok(Value::int(IrType::I64, *value)),
            Expression::FloatLiteral { value, .. } => Ok(Value::double(*value)),
            Expression::BoolLiteral { value, .. } => Ok(Value::bool(*value)),
            Expression::StringLiteral { value, .. } => Ok(self.module.add_string(value)),

            Expression::Identifier { .. } | Expression::Index { .. } => {
                let (ptr, ty) = self.lower_address(expr)?;
                let dst = self.temp();
                self.emit(Instruction::Load {
                    dst: dst.clone(),
                    ty: ty.clone(),
                    ptr,
                });
                Ok(Value::register(ty, dst))
            }

            Expression::Assign { target, value, .. } => {
                let (ptr, ty) = self.lower_address(target)?;
                let value = self.lower_expression(value)?;
                let value = self.create_type_cast(value, &ty, "assignment")?;
                self.emit(Instruction::Store {
                    value: value.clone(),
                    ptr,
                });
                Ok(value)
            }

            Expression::Binary { op, lhs, rhs, .. }
                if matches!(op, BinaryOp::And | BinaryOp::Or) =>
            {
                self.lower_logical(*op, lhs, rhs)
            }

            Expression::Binary { op, lhs, rhs, .. } => {
                let lhs = self.lower_expression(lhs)?;
                let rhs = self.lower_expression(rhs)?;
                self.lower_binary(*op, lhs, rhs)
            }

            Expression::Unary { op, operand, .. } => {
                let value = self.lower_expression(operand)?;
                match op {
                    UnaryOp::Neg => {
                        let ty = value.ty().clone();
                        let zero = match &ty {
                            IrType::Int(_) | IrType::Float(_) => Value::zero(&ty),
                            _ => None,
                        }
                        .ok_or_else(|| Error::cast(&ty, "a number", "negation"))?;
                        let op = if ty.is_float() {
                            IrBinaryOp::FSub
                        } else {
                            IrBinaryOp::Sub
                        };
                        Ok(self.binary(op, zero, value))
                    }
                    UnaryOp::Not => {
                        let value = self.create_type_cast(value, &IrType::I1, "logical not")?;
                        Ok(self.binary(IrBinaryOp::Xor, value, Value::bool(true)))
                    }
                }
            }

            Expression::Call { callee, args, token } => {
                if callee == "len" && args.len() == 1 && !self.signatures.contains_key("len") {
                    return self.lower_len(&args[0]);
                }

                let signature = self
                    .signatures
                    .get(callee)
                    .cloned()
                    .ok_or_else(|| Error::UnknownFunction {
                        name: callee.clone(),
                    })?;
                let fixed = signature.params.len();
                let arity_ok = if signature.is_variadic {
                    args.len() >= fixed
                } else {
                    args.len() == fixed
                };
                if !arity_ok {
                    return Err(Error::ArityMismatch {
                        name: callee.clone(),
                        expected: fixed,
                        got: args.len(),
                    });
                }

                let mut values = Vec::with_capacity(args.len());
                for (i, arg) in args.iter().enumerate() {
                    let value = self.lower_expression(arg)?;
                    let context = format!("argument {} of {} at line {}", i + 1, callee, token.line);
                    let value = match signature.params.get(i) {
                        Some(ty) => self.create_type_cast(value, ty, &context)?,
                        None => self.promote_vararg(value, &context)?,
                    };
                    values.push(value);
                }

                let dst = if signature.ret.is_void() {
                    None
                } else {
                    Some(self.temp())
                };
                self.emit(Instruction::Call {
                    dst: dst.clone(),
                    ret: signature.ret.clone(),
                    callee: callee.clone(),
                    args: values,
                    variadic: signature.is_variadic.then(|| signature.params.clone()),
                });
                Ok(match dst {
                    Some(dst) => Value::register(signature.ret, dst),
                    // A void call has no value; using one as an operand fails its cast
                    None => Value::Null(IrType::Void),
                })
            }

            Expression::Cast { ty, value, token } => {
                let target = self.types.resolve(ty)?;
                let value = self.lower_expression(value)?;
                let context = format!("cast at line {}", token.line);
                self.create_type_cast(value, &target, &context)
            }
        }
    }

    /// Extra argument of a variadic call: passed as is, except that a float
    /// is widened to double the way C callers pass it
    fn promote_vararg(&mut self, value: Value, context: &str) -> Result<Value> {
        match value.ty() {
            IrType::Void => Err(Error::cast("void", "a value", context)),
            IrType::Float(kind) if kind.bits() < 64 => {
                self.create_type_cast(value, &IrType::DOUBLE, context)
            }
            _ => Ok(value),
        }
    }

    /// Address and element type of an assignable expression
    pub(super) fn lower_address(&mut self, expr: &Expression) -> Result<(Value, IrType)> {
        match expr {
            Expression::Identifier { token, .. } => {
                let local = self.scopes.resolve(token)?.clone();
                Ok((local.ptr, local.ty))
            }
            Expression::Index { target, index, .. } => {
                let base = self.lower_expression(target)?;
                let (data, elem) = self.element_pointer(base)?;
                let index = self.lower_expression(index)?;
                let index = self.create_type_cast(index, &IrType::I64, "index")?;

                let dst = self.temp();
                self.emit(Instruction::GetElementPtr {
                    dst: dst.clone(),
                    elem: elem.clone(),
                    ptr: data,
                    indices: vec![index],
                });
                Ok((Value::register(elem.pointer_to(), dst), elem))
            }
            other => Err(Error::compiler(format!(
                "expression at line {}, column {} is not assignable",
                other.token().line,
                other.token().column
            ))),
        }
    }

    /// Data pointer and element type of an indexable value
    fn element_pointer(&mut self, base: Value) -> Result<(Value, IrType)> {
        if let Some(elem) = self.types.slice_element(base.ty()).cloned() {
            let dst = self.temp();
            self.emit(Instruction::ExtractValue {
                dst: dst.clone(),
                aggregate: base,
                index: SliceType::DATA_FIELD,
            });
            return Ok((Value::register(elem.pointer_to(), dst), elem));
        }

        match base.ty().pointee().cloned() {
            Some(elem) if !elem.is_void() => Ok((base, elem)),
            _ => Err(Error::cast(base.ty(), "a slice or pointer", "index")),
        }
    }

    /// `len(slice)`: the aggregate's length field
    fn lower_len(&mut self, arg: &Expression) -> Result<Value> {
        let slice = self.lower_expression(arg)?;
        if self.types.slice_element(slice.ty()).is_none() {
            return Err(Error::cast(slice.ty(), "a slice", "len"));
        }
        let dst = self.temp();
        self.emit(Instruction::ExtractValue {
            dst: dst.clone(),
            aggregate: slice,
            index: SliceType::LEN_FIELD,
        });
        Ok(Value::register(IrType::I64, dst))
    }

    /// `&&` and `||`: the right operand runs only when the left one does not
    /// decide the result
    ///
    /// ```text
    /// lhs ──decided──────────────▶ Li_end: phi [short, lhs], [rhs, Li_rhs]
    ///  └──otherwise──▶ Li_rhs ──────┘
    /// ```
    fn lower_logical(
        &mut self,
        op: BinaryOp,
        lhs: &Expression,
        rhs: &Expression,
    ) -> Result<Value> {
        let context = format!("operand of {}", op);
        let lhs = self.lower_expression(lhs)?;
        let lhs = self.create_type_cast(lhs, &IrType::I1, &context)?;
        let lhs_exit = self.current;

        let index = self.next_logic;
        self.next_logic += 1;
        let rhs_blk = self.new_block(&format!("L{:X}_rhs", index));
        let end_blk = self.new_block(&format!("L{:X}_end", index));

        let (rhs, rhs_exit) = {
            let mut right = self.in_block(rhs_blk);
            let value = right.lower_expression(rhs)?;
            let value = right.create_type_cast(value, &IrType::I1, &context)?;
            let exit = right.current;
            right.branch_if_no_terminator(exit, end_blk);
            (value, exit)
        };

        // `||` is decided by a true left operand, `&&` by a false one
        let short = op == BinaryOp::Or;
        let (then_blk, else_blk) = if short {
            (end_blk, rhs_blk)
        } else {
            (rhs_blk, end_blk)
        };
        let then_label = self.label(then_blk);
        let else_label = self.label(else_blk);
        self.terminate(
            lhs_exit,
            Terminator::CondBr {
                cond: lhs,
                then_label,
                else_label,
            },
        );

        self.current = end_blk;
        let dst = self.temp();
        let incoming = vec![
            (Value::bool(short), self.label(lhs_exit)),
            (rhs, self.label(rhs_exit)),
        ];
        self.emit(Instruction::Phi {
            dst: dst.clone(),
            ty: IrType::I1,
            incoming,
        });
        Ok(Value::register(IrType::I1, dst))
    }

    fn lower_binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
        let ty = self.common_type(op, lhs.ty(), rhs.ty())?;
        let context = format!("operand of {}", op);
        let lhs = self.create_type_cast(lhs, &ty, &context)?;
        let rhs = self.create_type_cast(rhs, &ty, &context)?;

        if op.is_comparison() {
            let dst = self.temp();
            let inst = if ty.is_float() {
                let pred = match op {
                    BinaryOp::Eq => FloatPredicate::Oeq,
                    BinaryOp::NotEq => FloatPredicate::One,
                    BinaryOp::Lt => FloatPredicate::Olt,
                    BinaryOp::LtEq => FloatPredicate::Ole,
                    BinaryOp::Gt => FloatPredicate::Ogt,
                    _ => FloatPredicate::Oge,
                };
                Instruction::FCmp {
                    dst: dst.clone(),
                    pred,
                    lhs,
                    rhs,
                }
            } else {
                let pred = match op {
                    BinaryOp::Eq => IntPredicate::Eq,
                    BinaryOp::NotEq => IntPredicate::Ne,
                    BinaryOp::Lt => IntPredicate::Slt,
                    BinaryOp::LtEq => IntPredicate::Sle,
                    BinaryOp::Gt => IntPredicate::Sgt,
                    _ => IntPredicate::Sge,
                };
                Instruction::ICmp {
                    dst: dst.clone(),
                    pred,
                    lhs,
                    rhs,
                }
            };
            self.emit(inst);
            return Ok(Value::register(IrType::I1, dst));
        }

        if !ty.is_integer() && !ty.is_float() {
            return Err(Error::cast(&ty, "a number", format!("operand of {}", op)));
        }
        let float = ty.is_float();
        let ir_op = match (op, float) {
            (BinaryOp::Add, false) => IrBinaryOp::Add,
            (BinaryOp::Sub, false) => IrBinaryOp::Sub,
            (BinaryOp::Mul, false) => IrBinaryOp::Mul,
            (BinaryOp::Div, false) => IrBinaryOp::SDiv,
            (BinaryOp::Mod, false) => IrBinaryOp::SRem,
            (BinaryOp::Add, true) => IrBinaryOp::FAdd,
            (BinaryOp::Sub, true) => IrBinaryOp::FSub,
            (BinaryOp::Mul, true) => IrBinaryOp::FMul,
            (BinaryOp::Div, true) => IrBinaryOp::FDiv,
            (BinaryOp::Mod, true) => IrBinaryOp::FRem,
            (op, _) => return Err(Error::compiler(format!("unsupported operator {}", op))),
        };
        Ok(self.binary(ir_op, lhs, rhs))
    }

    /// Type both operands of `op` are converted to before it is applied
    ///
    /// Floats win over integers and the wider operand wins otherwise. Pointers
    /// only meet pointers of the same type, and only in comparisons.
    fn common_type(&self, op: BinaryOp, lhs: &IrType, rhs: &IrType) -> Result<IrType> {
        let context = || format!("operand of {}", op);
        match (lhs, rhs) {
            (IrType::Float(a), IrType::Float(b)) => Ok(IrType::Float(if a.bits() >= b.bits() {
                *a
            } else {
                *b
            })),
            (IrType::Float(_), IrType::Int(_)) => Ok(lhs.clone()),
            (IrType::Int(_), IrType::Float(_)) => Ok(rhs.clone()),
            (IrType::Int(a), IrType::Int(b)) => Ok(IrType::Int((*a).max(*b))),
            (IrType::Pointer(_), IrType::Pointer(_)) if lhs == rhs && op.is_comparison() => {
                Ok(lhs.clone())
            }
            _ => Err(Error::cast(rhs, lhs, context())),
        }
    }

    pub(super) fn binary(&mut self, op: IrBinaryOp, lhs: Value, rhs: Value) -> Value {
        let ty = lhs.ty().clone();
        let dst = self.temp();
        self.emit(Instruction::Binary {
            dst: dst.clone(),
            op,
            lhs,
            rhs,
        });
        Value::register(ty, dst)
    }
}
