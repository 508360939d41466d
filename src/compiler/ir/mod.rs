//! # Intermediate Representation (IR) for Geode Compilation
//!
//! Geode lowers to a textual IR in LLVM assembly syntax (typed pointers),
//! which an external toolchain assembles and links.
//!
//! ## Module Structure
//!
//! ```text
//! ir/
//! ├── mod.rs          # This file - module definition and re-exports
//! ├── types.rs        # IrType, SliceType
//! ├── value.rs        # Value (constants, registers, globals)
//! ├── metadata.rs     # MetadataNode and its five kinds
//! ├── enc.rs          # Name sigils and string escaping
//! ├── instruction.rs  # Instruction, Terminator
//! └── program.rs      # BasicBlock, Function, Module
//! ```
//!
//! Every entity renders itself through `Display` (or `ident()`/`def()` for
//! metadata), so `module.to_string()` is the finished IR file.

pub mod enc;
mod instruction;
mod metadata;
mod program;
mod types;
mod value;

// Re-export all public types
pub use instruction::{
    BinaryOp, CastOp, FloatPredicate, Instruction, IntPredicate, Terminator,
};
pub use metadata::{
    MetadataNode, MetadataString, MetadataTuple, MetadataValue, NamedMetadata, RawMetadata,
};
pub use program::{Attachment, BasicBlock, BlockId, Function, Module, Param, StringGlobal};
pub use types::{FloatKind, IrType, SliceType};
pub use value::Value;
