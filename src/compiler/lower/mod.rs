//! # Lowering to IR
//!
//! [`ModuleLowerer`] consumes declarations as the parser produces them. Every
//! signature is registered on arrival so calls may refer to functions defined
//! later in the unit; bodies are lowered once the stream ends.
//!
//! ```text
//! Declaration ─accept─▶ signatures ─finish─▶ FunctionLowerer (per body) ─▶ Module
//! ```
//!
//! A lowering error aborts only the declaration it occurred in. It is recorded
//! as a [`Diagnostic`] and the remaining declarations still lower.

mod cast;
mod control_flow;
mod expr;
mod function;

pub use function::{FunctionLowerer, Local, LoweringGuard};

use super::{CompileOptions, CompiledUnit, Diagnostic};
use crate::compiler::ir::{Function, IrType, MetadataString, MetadataTuple, Module, Param};
use crate::error::{Error, Result};
use crate::parser::{Declaration, FunctionNode, Program};
use crate::types::TypeTable;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Resolved parameter and return types of a function
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Parameter types in order
    pub params: Vec<IrType>,
    /// Return type
    pub ret: IrType,
    /// Extra arguments may follow `params`
    pub is_variadic: bool,
}

/// Shared state a function lowering borrows from its module
pub(crate) struct LowerContext<'a> {
    pub module: &'a mut Module,
    pub types: &'a mut TypeTable,
    pub signatures: &'a HashMap<String, Signature>,
    pub options: &'a CompileOptions,
}

/// Lowers a stream of declarations into one [`Module`]
pub struct ModuleLowerer {
    options: CompileOptions,
    module: Module,
    types: TypeTable,
    signatures: HashMap<String, Signature>,
    declarations: Vec<Declaration>,
    /// Indices of accepted function definitions awaiting lowering
    bodies: Vec<usize>,
    diagnostics: Vec<Diagnostic>,
}

impl ModuleLowerer {
    /// Creates a lowerer for one compilation unit
    pub fn new(options: CompileOptions) -> Self {
        let mut module = Module::new(options.source_filename.clone());
        module.target_triple = options.target_triple.clone();
        ModuleLowerer {
            options,
            module,
            types: TypeTable::new(),
            signatures: HashMap::new(),
            declarations: Vec::new(),
            bodies: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Registers a declaration's signature and queues its body for lowering
    pub fn accept(&mut self, decl: Declaration) {
        match self.declare(&decl) {
            Ok(()) => {
                if let Declaration::Function(_) = decl {
                    self.bodies.push(self.declarations.len());
                }
            }
            Err(error) => {
                warn!(declaration = decl.name(), %error, "declaration rejected");
                self.diagnostics.push(Diagnostic {
                    declaration: decl.name().to_string(),
                    error,
                });
            }
        }
        self.declarations.push(decl);
    }

    fn declare(&mut self, decl: &Declaration) -> Result<()> {
        let (name, params, ret, is_variadic) = match decl {
            Declaration::Function(f) => (&f.name, &f.params, &f.ret, false),
            Declaration::Extern(e) => (&e.name, &e.params, &e.ret, e.is_variadic),
        };

        if self.signatures.contains_key(name) {
            return Err(Error::DuplicateFunction { name: name.clone() });
        }

        let params = params
            .iter()
            .map(|p| self.types.resolve(&p.ty))
            .collect::<Result<Vec<_>>>()?;
        let ret = self.types.resolve(ret)?;

        if let Declaration::Extern(e) = decl {
            let ir_params = e
                .params
                .iter()
                .zip(&params)
                .enumerate()
                .map(|(i, (p, ty))| Param {
                    name: p.name.clone().unwrap_or_else(|| format!("arg{}", i)),
                    ty: ty.clone(),
                })
                .collect();
            let mut function = Function::declaration(name.clone(), ir_params, ret.clone());
            function.is_variadic = is_variadic;
            self.module.functions.push(function);
        }

        debug!(function = %name, params = params.len(), is_variadic, "declared");
        self.signatures.insert(
            name.clone(),
            Signature {
                params,
                ret,
                is_variadic,
            },
        );
        Ok(())
    }

    /// Lowers every queued body and returns the finished unit
    pub fn finish(mut self) -> CompiledUnit {
        let declarations = std::mem::take(&mut self.declarations);
        let bodies = std::mem::take(&mut self.bodies);

        for index in bodies {
            let Declaration::Function(node) = &declarations[index] else {
                continue;
            };
            match self.lower_function(node) {
                Ok(function) => self.module.functions.push(function),
                Err(error) => {
                    warn!(function = %node.name, %error, "lowering failed");
                    self.diagnostics.push(Diagnostic {
                        declaration: node.name.clone(),
                        error,
                    });
                }
            }
        }

        if self.options.emit_ident {
            self.add_ident();
        }

        CompiledUnit {
            module: self.module,
            diagnostics: self.diagnostics,
            program: Program { declarations },
        }
    }

    fn lower_function(&mut self, node: &FunctionNode) -> Result<Function> {
        let signature = self
            .signatures
            .get(&node.name)
            .cloned()
            .ok_or_else(|| Error::UnknownFunction {
                name: node.name.clone(),
            })?;

        let ctx = LowerContext {
            module: &mut self.module,
            types: &mut self.types,
            signatures: &self.signatures,
            options: &self.options,
        };
        let mut lowerer = FunctionLowerer::new(ctx, node, &signature)?;
        lowerer.lower_statements(&node.body)?;
        Ok(lowerer.finish())
    }

    /// `!llvm.ident = !{!N}` naming the compiler
    fn add_ident(&mut self) {
        let mut ident = MetadataTuple::new();
        ident.add(MetadataString::new(format!("geode {}", crate::VERSION)));
        self.module.add_named_member("llvm.ident", ident);
    }
}
