//! Per-function lowering state and scoped redirection guards

use super::{LowerContext, Signature};
use crate::compiler::ir::{
    BlockId, Function, Instruction, IrType, Module, Param, Terminator, Value,
};
use crate::compiler::scope::ScopeStack;
use crate::compiler::CompileOptions;
use crate::error::{Error, Result};
use crate::lexer::Token;
use crate::parser::{FunctionNode, Statement};
use crate::types::TypeTable;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use tracing::trace;

/// Stack slot holding a named variable
#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    /// Pointer to the slot (the `alloca` result)
    pub ptr: Value,
    /// Type stored in the slot
    pub ty: IrType,
}

/// Lowers one function body into a [`Function`]
///
/// `current` is the block new instructions go to. Code that generates into
/// another block goes through [`FunctionLowerer::in_block`], whose guard puts
/// `current` and the scope depth back when it is dropped.
pub struct FunctionLowerer<'a> {
    pub(super) func: Function,
    pub(super) current: BlockId,
    pub(super) scopes: ScopeStack<Local>,
    pub(super) module: &'a mut Module,
    pub(super) types: &'a mut TypeTable,
    pub(super) signatures: &'a HashMap<String, Signature>,
    pub(super) options: &'a CompileOptions,
    /// Entry-block allocas, placed ahead of all other entry instructions
    allocas: Vec<Instruction>,
    /// Suffix counter shared by temporaries and local slots
    next_value: usize,
    next_dead: usize,
    pub(super) next_logic: usize,
}

impl<'a> FunctionLowerer<'a> {
    /// Opens the entry block and spills every parameter to a stack slot
    pub(crate) fn new(
        ctx: LowerContext<'a>,
        node: &FunctionNode,
        signature: &Signature,
    ) -> Result<Self> {
        let mut params = Vec::with_capacity(node.params.len());
        for (param, ty) in node.params.iter().zip(&signature.params) {
            let name = param.name.clone().ok_or_else(|| {
                Error::compiler(format!("parameter of {} has no name", node.name))
            })?;
            params.push(Param {
                name,
                ty: ty.clone(),
            });
        }

        let mut func = Function::new(node.name.clone(), params.clone(), signature.ret.clone());
        let entry = func.new_block("entry");

        let mut lowerer = FunctionLowerer {
            func,
            current: entry,
            scopes: ScopeStack::new(node.token.clone()),
            module: ctx.module,
            types: ctx.types,
            signatures: ctx.signatures,
            options: ctx.options,
            allocas: Vec::new(),
            next_value: 0,
            next_dead: 0,
            next_logic: 0,
        };

        for param in params {
            let ptr = lowerer.alloca(&format!("{}.addr", param.name), &param.ty);
            lowerer.emit(Instruction::Store {
                value: param.value(),
                ptr: ptr.clone(),
            });
            lowerer.scopes.bind(param.name, Local { ptr, ty: param.ty });
        }

        trace!(function = %node.name, "opened entry block");
        Ok(lowerer)
    }

    /// Seals every open block and returns the function
    ///
    /// A block still open at this point falls off the end of the function:
    /// it returns void, returns zero for scalar results, and is unreachable
    /// otherwise.
    pub fn finish(mut self) -> Function {
        let fallback = if self.func.ret.is_void() {
            Terminator::Ret(None)
        } else {
            match Value::zero(&self.func.ret) {
                Some(zero) => Terminator::Ret(Some(zero)),
                None => Terminator::Unreachable,
            }
        };
        for block in &mut self.func.blocks {
            block.set_terminator(fallback.clone());
        }

        if let Some(entry) = self.func.blocks.first_mut() {
            let body = std::mem::take(&mut entry.instructions);
            entry.instructions = std::mem::take(&mut self.allocas);
            entry.instructions.extend(body);
        }
        self.func
    }

    // Block and scope redirection

    /// Redirects generation into `block` until the guard drops
    pub fn in_block(&mut self, block: BlockId) -> LoweringGuard<'_, 'a> {
        let saved_block = Some(self.current);
        let saved_depth = self.scopes.depth();
        self.current = block;
        LoweringGuard {
            lowerer: self,
            saved_block,
            saved_depth,
        }
    }

    /// Like [`in_block`](Self::in_block), with a fresh scope frame for the redirection
    pub fn in_block_scoped(&mut self, block: BlockId, tag: Token) -> LoweringGuard<'_, 'a> {
        let mut guard = self.in_block(block);
        guard.scopes.push(tag);
        guard
    }

    /// Pushes a scope frame that lives until the guard drops or closes
    pub fn scoped(&mut self, tag: Token) -> LoweringGuard<'_, 'a> {
        let saved_depth = self.scopes.depth();
        self.scopes.push(tag);
        LoweringGuard {
            lowerer: self,
            saved_block: None,
            saved_depth,
        }
    }

    // Emission helpers

    /// Block receiving new instructions
    pub fn current_block(&self) -> BlockId {
        self.current
    }

    /// The function under construction
    pub fn function(&self) -> &Function {
        &self.func
    }

    /// Appends a block to the function
    pub fn new_block(&mut self, name: &str) -> BlockId {
        self.func.new_block(name)
    }

    pub(super) fn emit(&mut self, inst: Instruction) {
        let current = self.current;
        self.func.block_mut(current).push(inst);
    }

    /// Seals `block` with `term` unless it already has a terminator
    pub(super) fn terminate(&mut self, block: BlockId, term: Terminator) -> bool {
        self.func.block_mut(block).set_terminator(term)
    }

    /// Branches `from` to `to` unless `from` is already sealed
    pub(super) fn branch_if_no_terminator(&mut self, from: BlockId, to: BlockId) -> bool {
        let target = self.func.block(to).name.clone();
        self.func.block_mut(from).branch_if_no_terminator(&target)
    }

    pub(super) fn label(&self, block: BlockId) -> String {
        self.func.block(block).name.clone()
    }

    pub(super) fn is_terminated(&self) -> bool {
        self.func.block(self.current).is_terminated()
    }

    /// Fresh temporary register name
    pub(super) fn temp(&mut self) -> String {
        self.fresh("t")
    }

    /// `base.N` with `N` unique across temporaries and locals, so a local
    /// named `t` never shadows a temporary
    fn fresh(&mut self, base: &str) -> String {
        let name = format!("{}.{}", base, self.next_value);
        self.next_value += 1;
        name
    }

    /// Reserves a stack slot in the entry block
    pub(super) fn alloca(&mut self, name: &str, ty: &IrType) -> Value {
        self.allocas.push(Instruction::Alloca {
            dst: name.to_string(),
            ty: ty.clone(),
        });
        Value::register(ty.pointer_to(), name)
    }

    // Statements

    /// Lowers statements in order into the current block
    pub fn lower_statements(&mut self, statements: &[Statement]) -> Result<()> {
        for stmt in statements {
            self.lower_statement(stmt)?;
        }
        Ok(())
    }

    fn lower_statement(&mut self, stmt: &Statement) -> Result<()> {
        if self.is_terminated() {
            // Code after a return has no predecessor; give it a block of its own
            let dead = self.new_block(&format!("dead{}", self.next_dead));
            self.next_dead += 1;
            self.current = dead;
        }

        match stmt {
            Statement::VarDecl {
                ty,
                name,
                init,
                token,
            } => {
                if self.scopes.is_bound_locally(name) {
                    return Err(Error::compiler(format!(
                        "{} is already declared in this scope (line {}, column {})",
                        name, token.line, token.column
                    )));
                }

                let (slot_ty, value) = match (ty.unknown, init) {
                    (true, Some(init)) => {
                        let value = self.lower_expression(init)?;
                        (value.ty().clone(), Some(value))
                    }
                    (true, None) => {
                        return Err(Error::compiler(format!(
                            "{} is declared {} but has no initializer to infer from",
                            name, ty
                        )))
                    }
                    (false, init) => {
                        let slot_ty = self.types.resolve(ty)?;
                        let value = match init {
                            Some(init) => {
                                let value = self.lower_expression(init)?;
                                let context = format!("initializer of {}", name);
                                Some(self.create_type_cast(value, &slot_ty, &context)?)
                            }
                            None => None,
                        };
                        (slot_ty, value)
                    }
                };

                if slot_ty.is_void() {
                    return Err(Error::cast("void", ty, format!("declaration of {}", name)));
                }

                let slot_name = self.fresh(name);
                let ptr = self.alloca(&slot_name, &slot_ty);
                let value = value.unwrap_or_else(|| zero_initializer(&slot_ty));
                self.emit(Instruction::Store {
                    value,
                    ptr: ptr.clone(),
                });
                self.scopes.bind(name.clone(), Local { ptr, ty: slot_ty });
                Ok(())
            }
            Statement::Expression(expr) => self.lower_expression(expr).map(|_| ()),
            Statement::Return { value, token } => {
                let ret = self.func.ret.clone();
                let term = match value {
                    Some(expr) => {
                        if ret.is_void() {
                            return Err(Error::compiler(format!(
                                "{} returns void but a value is returned at line {}",
                                self.func.name, token.line
                            )));
                        }
                        let value = self.lower_expression(expr)?;
                        let context = format!("return from {}", self.func.name);
                        Terminator::Ret(Some(self.create_type_cast(value, &ret, &context)?))
                    }
                    None if ret.is_void() => Terminator::Ret(None),
                    None => {
                        return Err(Error::cast(
                            "void",
                            &ret,
                            format!("return from {}", self.func.name),
                        ))
                    }
                };
                let current = self.current;
                self.terminate(current, term);
                Ok(())
            }
            Statement::For(node) => self.lower_for(node),
            Statement::If(node) => self.lower_if(node),
            Statement::Block { statements, token } => {
                let mut block = self.scoped(token.clone());
                block.lower_statements(statements)?;
                block.close()
            }
        }
    }
}

/// Zero value stored into a slot declared without an initializer
fn zero_initializer(ty: &IrType) -> Value {
    Value::zero(ty).unwrap_or_else(|| Value::ConstExpr {
        ty: ty.clone(),
        text: "zeroinitializer".to_string(),
    })
}

/// Scoped redirection of a [`FunctionLowerer`]
///
/// Saves the caller's current block (for [`FunctionLowerer::in_block`]) and
/// scope depth. Dropping the guard restores both on every exit path, so an
/// error inside a nested lowering cannot leave the caller generating into the
/// wrong block or with extra frames on the scope stack.
pub struct LoweringGuard<'g, 'a> {
    lowerer: &'g mut FunctionLowerer<'a>,
    saved_block: Option<BlockId>,
    saved_depth: usize,
}

impl LoweringGuard<'_, '_> {
    /// Pops the guard's own frame explicitly, reporting an unbalanced stack
    pub fn close(self) -> Result<()> {
        if self.lowerer.scopes.depth() != self.saved_depth + 1 {
            return Err(Error::compiler(format!(
                "unbalanced scope stack: expected depth {}, found {}",
                self.saved_depth + 1,
                self.lowerer.scopes.depth()
            )));
        }
        self.lowerer.scopes.pop().map(|_| ())
    }
}

impl<'a> Deref for LoweringGuard<'_, 'a> {
    type Target = FunctionLowerer<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.lowerer
    }
}

impl<'a> DerefMut for LoweringGuard<'_, 'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.lowerer
    }
}

impl Drop for LoweringGuard<'_, '_> {
    fn drop(&mut self) {
        if let Some(block) = self.saved_block {
            self.lowerer.current = block;
        }
        self.lowerer.scopes.truncate(self.saved_depth);
    }
}
