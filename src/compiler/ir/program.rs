//! Basic blocks, functions and modules

use super::enc;
use super::instruction::{Instruction, Terminator};
use super::metadata::{MetadataTuple, NamedMetadata};
use super::types::IrType;
use super::value::Value;
use std::fmt;

/// Metadata attached to an instruction, rendered as `, !kind !N`
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Attachment kind, e.g. `llvm.loop`
    pub kind: String,
    /// Attached node (normally identified)
    pub node: MetadataTuple,
}

/// Basic block in the control flow graph
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    /// Label identifying this basic block
    pub name: String,
    /// Straight-line instructions
    pub instructions: Vec<Instruction>,
    /// The block's single terminator, once sealed
    pub terminator: Option<Terminator>,
    /// Metadata attached to the terminator
    pub attachments: Vec<Attachment>,
}

impl BasicBlock {
    /// Create a new basic block with the given label
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            instructions: Vec::new(),
            terminator: None,
            attachments: Vec::new(),
        }
    }

    /// Appends an instruction
    pub fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    /// True once the block has its terminator
    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }

    /// Seals the block with `term` unless it is already sealed
    ///
    /// Returns whether the terminator was installed. A second call is a no-op.
    pub fn set_terminator(&mut self, term: Terminator) -> bool {
        if self.terminator.is_some() {
            return false;
        }
        self.terminator = Some(term);
        true
    }

    /// Branches to `target` if the block has no terminator yet
    pub fn branch_if_no_terminator(&mut self, target: &str) -> bool {
        self.set_terminator(Terminator::Br(target.to_string()))
    }

    /// Attaches metadata to the terminator
    pub fn attach(&mut self, kind: impl Into<String>, node: MetadataTuple) {
        self.attachments.push(Attachment {
            kind: kind.into(),
            node,
        });
    }

    /// Labels of successor blocks
    pub fn successors(&self) -> Vec<&str> {
        self.terminator
            .as_ref()
            .map(Terminator::successors)
            .unwrap_or_default()
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", enc::local(&self.name).trim_start_matches('%'))?;
        for inst in &self.instructions {
            writeln!(f, "  {}", inst)?;
        }
        match &self.terminator {
            Some(term) => {
                write!(f, "  {}", term)?;
                for attachment in &self.attachments {
                    write!(
                        f,
                        ", {} {}",
                        enc::metadata(&attachment.kind),
                        attachment.node.ident()
                    )?;
                }
                writeln!(f)
            }
            // An unsealed block is invalid IR; keep it visible rather than guess
            None => writeln!(f, "  ; missing terminator"),
        }
    }
}

/// Index of a block inside its function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: IrType,
}

impl Param {
    /// Register holding the incoming argument, `name.arg`
    ///
    /// Block labels never contain a dot, so a parameter can share a name
    /// with any label.
    pub fn register(&self) -> String {
        format!("{}.arg", self.name)
    }

    /// The incoming argument as a value
    pub fn value(&self) -> Value {
        Value::register(self.ty.clone(), self.register())
    }
}

/// IR function, either a definition with blocks or an external declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Symbol name
    pub name: String,
    /// Parameters
    pub params: Vec<Param>,
    /// Return type
    pub ret: IrType,
    /// Blocks in creation order; the first is the entry block
    pub blocks: Vec<BasicBlock>,
    /// Declared but not defined here
    pub is_declaration: bool,
    /// Accepts extra arguments after `params`
    pub is_variadic: bool,
}

impl Function {
    /// Function definition with no blocks yet
    pub fn new(name: impl Into<String>, params: Vec<Param>, ret: IrType) -> Self {
        Function {
            name: name.into(),
            params,
            ret,
            blocks: Vec::new(),
            is_declaration: false,
            is_variadic: false,
        }
    }

    /// External declaration
    pub fn declaration(name: impl Into<String>, params: Vec<Param>, ret: IrType) -> Self {
        Function {
            is_declaration: true,
            ..Function::new(name, params, ret)
        }
    }

    /// Appends a new block
    pub fn new_block(&mut self, name: &str) -> BlockId {
        self.blocks.push(BasicBlock::new(name));
        BlockId(self.blocks.len() - 1)
    }

    /// Block by id
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    /// Mutable block by id
    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0]
    }

    /// Block by label
    pub fn block_by_name(&self, name: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Symbol reference to this function
    pub fn as_value(&self) -> Value {
        Value::Global {
            ty: IrType::I8.pointer_to(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_declaration {
            let mut params: Vec<String> = self.params.iter().map(|p| p.ty.to_string()).collect();
            if self.is_variadic {
                params.push("...".to_string());
            }
            return writeln!(
                f,
                "declare {} {}({})",
                self.ret,
                enc::global(&self.name),
                params.join(", ")
            );
        }

        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{} {}", p.ty, enc::local(&p.register())))
            .collect();
        writeln!(
            f,
            "define {} {}({}) {{",
            self.ret,
            enc::global(&self.name),
            params.join(", ")
        )?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i != 0 {
                writeln!(f)?;
            }
            write!(f, "{}", block)?;
        }
        writeln!(f, "}}")
    }
}

/// Private constant holding a NUL-terminated string literal
#[derive(Debug, Clone, PartialEq)]
pub struct StringGlobal {
    /// Symbol name
    pub name: String,
    /// Literal contents without the terminator
    pub value: String,
}

impl StringGlobal {
    /// `[N x i8]` including the trailing NUL
    pub fn array_type(&self) -> IrType {
        IrType::Array(self.value.len() as u64 + 1, Box::new(IrType::I8))
    }

    /// `i8*` to the first byte
    pub fn as_pointer(&self) -> Value {
        let array = self.array_type();
        Value::ConstExpr {
            ty: IrType::I8.pointer_to(),
            text: format!(
                "getelementptr inbounds ({}, {}* {}, i64 0, i64 0)",
                array,
                array,
                enc::global(&self.name)
            ),
        }
    }
}

impl fmt::Display for StringGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = private unnamed_addr constant {} c\"{}\\00\"",
            enc::global(&self.name),
            self.array_type(),
            enc::escape_string(&self.value)
        )
    }
}

/// A compilation unit's IR
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Name of the source file
    pub source_filename: String,
    /// Target triple, when known
    pub target_triple: Option<String>,
    /// String literal constants
    pub globals: Vec<StringGlobal>,
    /// Functions in definition order
    pub functions: Vec<Function>,
    /// Identified metadata tuples, emitted as `!N = !{...}`
    pub metadata: Vec<MetadataTuple>,
    /// Named metadata sets
    pub named_metadata: Vec<NamedMetadata>,
    next_metadata_id: usize,
}

impl Module {
    /// Empty module
    pub fn new(source_filename: impl Into<String>) -> Self {
        Module {
            source_filename: source_filename.into(),
            target_triple: None,
            globals: Vec::new(),
            functions: Vec::new(),
            metadata: Vec::new(),
            named_metadata: Vec::new(),
            next_metadata_id: 0,
        }
    }

    /// Interns a string literal and returns an `i8*` to it
    pub fn add_string(&mut self, value: &str) -> Value {
        if let Some(existing) = self.globals.iter().find(|g| g.value == value) {
            return existing.as_pointer();
        }
        let global = StringGlobal {
            name: format!(".str.{}", self.globals.len()),
            value: value.to_string(),
        };
        let ptr = global.as_pointer();
        self.globals.push(global);
        ptr
    }

    /// Reserves the next metadata id and returns an empty tuple carrying it
    pub fn new_metadata(&mut self) -> MetadataTuple {
        let id = self.next_metadata_id;
        self.next_metadata_id += 1;
        MetadataTuple::with_id(id.to_string())
    }

    /// Records an identified tuple for emission
    pub fn add_metadata(&mut self, md: MetadataTuple) {
        self.metadata.push(md);
    }

    /// Named metadata set, created on first use
    pub fn named_metadata_mut(&mut self, name: &str) -> &mut NamedMetadata {
        let index = match self.named_metadata.iter().position(|n| n.name == name) {
            Some(index) => index,
            None => {
                self.named_metadata.push(NamedMetadata::new(name));
                self.named_metadata.len() - 1
            }
        };
        &mut self.named_metadata[index]
    }

    /// Adds `md` to the named set `name` and returns its short reference
    ///
    /// An anonymous tuple is given the next metadata id and recorded for
    /// emission first, so the set never inlines a member's definition.
    /// Identified tuples are expected to be recorded by the caller.
    pub fn add_named_member(&mut self, name: &str, md: MetadataTuple) -> String {
        let md = match md.id {
            Some(_) => md,
            None => {
                let mut numbered = self.new_metadata();
                numbered.nodes = md.nodes;
                self.add_metadata(numbered.clone());
                numbered
            }
        };
        let reference = md.ident();
        self.named_metadata_mut(name).members.push(md);
        reference
    }

    /// Function by name
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.source_filename)?;
        writeln!(
            f,
            "source_filename = \"{}\"",
            enc::escape_string(&self.source_filename)
        )?;
        if let Some(triple) = &self.target_triple {
            writeln!(f, "target triple = \"{}\"", enc::escape_string(triple))?;
        }

        if !self.globals.is_empty() {
            writeln!(f)?;
            for global in &self.globals {
                writeln!(f, "{}", global)?;
            }
        }

        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{}", function)?;
        }

        if !self.named_metadata.is_empty() || !self.metadata.is_empty() {
            writeln!(f)?;
        }
        for named in &self.named_metadata {
            writeln!(f, "{} = {}", named.ident(), named.def())?;
        }
        for md in &self.metadata {
            writeln!(f, "{} = {}", md.ident(), md.def())?;
        }
        Ok(())
    }
}
