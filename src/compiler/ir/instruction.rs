//! IR instruction definitions

use super::enc;
use super::types::IrType;
use super::value::Value;
use std::fmt;

/// Two-operand arithmetic and bitwise operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Integer addition
    Add,
    /// Integer subtraction
    Sub,
    /// Integer multiplication
    Mul,
    /// Signed integer division
    SDiv,
    /// Signed integer remainder
    SRem,
    /// Float addition
    FAdd,
    /// Float subtraction
    FSub,
    /// Float multiplication
    FMul,
    /// Float division
    FDiv,
    /// Float remainder
    FRem,
    /// Bitwise AND
    And,
    /// Bitwise OR
    Or,
    /// Bitwise XOR
    Xor,
}

impl BinaryOp {
    /// Mnemonic in the textual IR
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::SDiv => "sdiv",
            BinaryOp::SRem => "srem",
            BinaryOp::FAdd => "fadd",
            BinaryOp::FSub => "fsub",
            BinaryOp::FMul => "fmul",
            BinaryOp::FDiv => "fdiv",
            BinaryOp::FRem => "frem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        }
    }
}

/// Integer comparison predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPredicate {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Signed less than
    Slt,
    /// Signed less or equal
    Sle,
    /// Signed greater than
    Sgt,
    /// Signed greater or equal
    Sge,
}

impl IntPredicate {
    /// Mnemonic in the textual IR
    pub fn mnemonic(&self) -> &'static str {
        match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
        }
    }
}

/// Ordered float comparison predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPredicate {
    /// Ordered equal
    Oeq,
    /// Ordered not equal
    One,
    /// Ordered less than
    Olt,
    /// Ordered less or equal
    Ole,
    /// Ordered greater than
    Ogt,
    /// Ordered greater or equal
    Oge,
}

impl FloatPredicate {
    /// Mnemonic in the textual IR
    pub fn mnemonic(&self) -> &'static str {
        match self {
            FloatPredicate::Oeq => "oeq",
            FloatPredicate::One => "one",
            FloatPredicate::Olt => "olt",
            FloatPredicate::Ole => "ole",
            FloatPredicate::Ogt => "ogt",
            FloatPredicate::Oge => "oge",
        }
    }
}

/// Conversion operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    /// Narrow an integer
    Trunc,
    /// Widen an integer with zeros
    ZExt,
    /// Widen an integer with the sign bit
    SExt,
    /// Narrow a float
    FPTrunc,
    /// Widen a float
    FPExt,
    /// Float to signed integer
    FPToSI,
    /// Signed integer to float
    SIToFP,
    /// Reinterpret pointer type
    BitCast,
}

impl CastOp {
    /// Mnemonic in the textual IR
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CastOp::Trunc => "trunc",
            CastOp::ZExt => "zext",
            CastOp::SExt => "sext",
            CastOp::FPTrunc => "fptrunc",
            CastOp::FPExt => "fpext",
            CastOp::FPToSI => "fptosi",
            CastOp::SIToFP => "sitofp",
            CastOp::BitCast => "bitcast",
        }
    }
}

/// A non-terminating IR instruction. Destinations are register names without `%`.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `%dst = alloca ty`
    Alloca {
        /// Destination register
        dst: String,
        /// Allocated type
        ty: IrType,
    },
    /// `%dst = load ty, ty* ptr`
    Load {
        /// Destination register
        dst: String,
        /// Loaded type
        ty: IrType,
        /// Source pointer
        ptr: Value,
    },
    /// `store value, ptr`
    Store {
        /// Stored value
        value: Value,
        /// Destination pointer
        ptr: Value,
    },
    /// `%dst = op lhs, rhs`
    Binary {
        /// Destination register
        dst: String,
        /// Operation
        op: BinaryOp,
        /// Left operand
        lhs: Value,
        /// Right operand
        rhs: Value,
    },
    /// `%dst = icmp pred lhs, rhs`
    ICmp {
        /// Destination register
        dst: String,
        /// Predicate
        pred: IntPredicate,
        /// Left operand
        lhs: Value,
        /// Right operand
        rhs: Value,
    },
    /// `%dst = fcmp pred lhs, rhs`
    FCmp {
        /// Destination register
        dst: String,
        /// Predicate
        pred: FloatPredicate,
        /// Left operand
        lhs: Value,
        /// Right operand
        rhs: Value,
    },
    /// `%dst = op value to ty`
    Cast {
        /// Destination register
        dst: String,
        /// Conversion
        op: CastOp,
        /// Converted value
        value: Value,
        /// Target type
        to: IrType,
    },
    /// `[%dst =] call ret @callee(args)`
    Call {
        /// Destination register, `None` for void calls
        dst: Option<String>,
        /// Return type
        ret: IrType,
        /// Callee symbol without `@`
        callee: String,
        /// Arguments
        args: Vec<Value>,
        /// Fixed parameter types when the callee is variadic; such calls
        /// spell out the callee type, `call ret (params, ...) @callee(args)`
        variadic: Option<Vec<IrType>>,
    },
    /// `%dst = getelementptr elem, elem* ptr, indices`
    GetElementPtr {
        /// Destination register
        dst: String,
        /// Element type the pointer addresses
        elem: IrType,
        /// Base pointer
        ptr: Value,
        /// Indices
        indices: Vec<Value>,
    },
    /// `%dst = extractvalue aggregate, index`
    ExtractValue {
        /// Destination register
        dst: String,
        /// Aggregate operand
        aggregate: Value,
        /// Field index
        index: u32,
    },
    /// `%dst = phi ty [ value, %label ], ...`
    Phi {
        /// Destination register
        dst: String,
        /// Merged type
        ty: IrType,
        /// Incoming value per predecessor label
        incoming: Vec<(Value, String)>,
    },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloca { dst, ty } => write!(f, "{} = alloca {}", enc::local(dst), ty),
            Instruction::Load { dst, ty, ptr } => {
                write!(f, "{} = load {}, {}", enc::local(dst), ty, ptr)
            }
            Instruction::Store { value, ptr } => write!(f, "store {}, {}", value, ptr),
            Instruction::Binary { dst, op, lhs, rhs } => write!(
                f,
                "{} = {} {}, {}",
                enc::local(dst),
                op.mnemonic(),
                lhs,
                rhs.ident()
            ),
            Instruction::ICmp {
                dst,
                pred,
                lhs,
                rhs,
            } => write!(
                f,
                "{} = icmp {} {}, {}",
                enc::local(dst),
                pred.mnemonic(),
                lhs,
                rhs.ident()
            ),
            Instruction::FCmp {
                dst,
                pred,
                lhs,
                rhs,
            } => write!(
                f,
                "{} = fcmp {} {}, {}",
                enc::local(dst),
                pred.mnemonic(),
                lhs,
                rhs.ident()
            ),
            Instruction::Cast { dst, op, value, to } => write!(
                f,
                "{} = {} {} to {}",
                enc::local(dst),
                op.mnemonic(),
                value,
                to
            ),
            Instruction::Call {
                dst,
                ret,
                callee,
                args,
                variadic,
            } => {
                if let Some(dst) = dst {
                    write!(f, "{} = ", enc::local(dst))?;
                }
                write!(f, "call {} ", ret)?;
                if let Some(fixed) = variadic {
                    let mut params: Vec<String> = fixed.iter().map(IrType::to_string).collect();
                    params.push("...".to_string());
                    write!(f, "({}) ", params.join(", "))?;
                }
                let args: Vec<String> = args.iter().map(Value::to_string).collect();
                write!(f, "{}({})", enc::global(callee), args.join(", "))
            }
            Instruction::GetElementPtr {
                dst,
                elem,
                ptr,
                indices,
            } => {
                write!(f, "{} = getelementptr {}, {}", enc::local(dst), elem, ptr)?;
                for index in indices {
                    write!(f, ", {}", index)?;
                }
                Ok(())
            }
            Instruction::ExtractValue {
                dst,
                aggregate,
                index,
            } => write!(
                f,
                "{} = extractvalue {}, {}",
                enc::local(dst),
                aggregate,
                index
            ),
            Instruction::Phi { dst, ty, incoming } => {
                let incoming: Vec<String> = incoming
                    .iter()
                    .map(|(value, label)| format!("[ {}, {} ]", value.ident(), enc::local(label)))
                    .collect();
                write!(
                    f,
                    "{} = phi {} {}",
                    enc::local(dst),
                    ty,
                    incoming.join(", ")
                )
            }
        }
    }
}

/// The single control transfer that ends a basic block
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// `br label %target`
    Br(String),
    /// `br i1 cond, label %then, label %else`
    CondBr {
        /// `i1` predicate
        cond: Value,
        /// Target when true
        then_label: String,
        /// Target when false
        else_label: String,
    },
    /// `ret ty value` / `ret void`
    Ret(Option<Value>),
    /// `unreachable`
    Unreachable,
}

impl Terminator {
    /// Labels this terminator can transfer control to
    pub fn successors(&self) -> Vec<&str> {
        match self {
            Terminator::Br(target) => vec![target.as_str()],
            Terminator::CondBr {
                then_label,
                else_label,
                ..
            } => vec![then_label.as_str(), else_label.as_str()],
            Terminator::Ret(_) | Terminator::Unreachable => Vec::new(),
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Br(target) => write!(f, "br label {}", enc::local(target)),
            Terminator::CondBr {
                cond,
                then_label,
                else_label,
            } => write!(
                f,
                "br {}, label {}, label {}",
                cond,
                enc::local(then_label),
                enc::local(else_label)
            ),
            Terminator::Ret(Some(value)) => write!(f, "ret {}", value),
            Terminator::Ret(None) => write!(f, "ret void"),
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}
