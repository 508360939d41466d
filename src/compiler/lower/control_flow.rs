//! Structured control flow: `for` loops and `if` statements
//!
//! A loop with index `i` always lowers to the same four blocks, named with
//! the hexadecimal index:
//!
//! ```text
//!            ┌────────────┐
//! entry ───▶ │ Fi_cond    │ ──false──▶ Fi_end
//!            └────────────┘
//!              │true   ▲
//!              ▼       │
//!          Fi_body ─▶ Fi_step
//! ```
//!
//! Edges into `step` and back to `cond` are only added to blocks that have
//! no terminator yet, so a body ending in `return` keeps its return.

use super::function::FunctionLowerer;
use crate::compiler::ir::{IrType, MetadataString, MetadataTuple, RawMetadata, Terminator};
use crate::error::Result;
use crate::parser::{ForNode, IfNode};
use tracing::debug;

impl FunctionLowerer<'_> {
    /// Lowers a `for` loop, leaving its `end` block active
    pub fn lower_for(&mut self, node: &ForNode) -> Result<()> {
        let prefix = format!("F{:X}_", node.index);
        debug!(function = %self.func.name, loop_index = node.index, "lowering for loop");

        let cond_blk = self.new_block(&format!("{}cond", prefix));
        let body_blk = self.new_block(&format!("{}body", prefix));
        let step_blk = self.new_block(&format!("{}step", prefix));
        let end_blk = self.new_block(&format!("{}end", prefix));

        // The loop frame holds the initializer's bindings for cond, body and step
        let mut lp = self.scoped(node.token.clone());

        lp.lower_statements(std::slice::from_ref(&*node.init))?;
        let init_blk = lp.current;
        lp.branch_if_no_terminator(init_blk, cond_blk);

        let (predicate, cond_exit) = {
            let mut cond = lp.in_block(cond_blk);
            let value = cond.lower_expression(&node.cond)?;
            let predicate = cond.create_type_cast(value, &IrType::I1, "for loop condition")?;
            (predicate, cond.current)
        };

        {
            let mut body = lp.in_block_scoped(body_blk, node.token.clone());
            body.lower_statements(&node.body)?;
            let body_gen = body.current;
            body.branch_if_no_terminator(body_gen, step_blk);
            body.branch_if_no_terminator(body_blk, step_blk);
        }

        {
            let mut step = lp.in_block_scoped(step_blk, node.token.clone());
            step.lower_expression(&node.step)?;
            let step_gen = step.current;
            let back_edge = step.branch_if_no_terminator(step_gen, cond_blk);
            if back_edge && step.options.loop_metadata {
                let md = step.loop_metadata();
                step.func.block_mut(step_gen).attach("llvm.loop", md);
            }
            step.branch_if_no_terminator(step_blk, cond_blk);
        }

        let then_label = lp.label(body_blk);
        let else_label = lp.label(end_blk);
        lp.terminate(
            cond_exit,
            Terminator::CondBr {
                cond: predicate,
                then_label,
                else_label,
            },
        );

        lp.current = end_blk;
        lp.close()
    }

    /// Lowers an `if`, leaving its `end` block active
    pub fn lower_if(&mut self, node: &IfNode) -> Result<()> {
        let prefix = format!("I{:X}_", node.index);
        debug!(function = %self.func.name, if_index = node.index, "lowering if");

        let value = self.lower_expression(&node.cond)?;
        let predicate = self.create_type_cast(value, &IrType::I1, "if condition")?;
        let branch_blk = self.current;

        let then_blk = self.new_block(&format!("{}then", prefix));
        let else_blk = match node.else_body {
            Some(_) => Some(self.new_block(&format!("{}else", prefix))),
            None => None,
        };
        let end_blk = self.new_block(&format!("{}end", prefix));

        {
            let mut then = self.in_block_scoped(then_blk, node.token.clone());
            then.lower_statements(&node.then_body)?;
            let then_gen = then.current;
            then.branch_if_no_terminator(then_gen, end_blk);
        }

        if let (Some(else_blk), Some(else_body)) = (else_blk, &node.else_body) {
            let mut other = self.in_block_scoped(else_blk, node.token.clone());
            other.lower_statements(else_body)?;
            let else_gen = other.current;
            other.branch_if_no_terminator(else_gen, end_blk);
        }

        let then_label = self.label(then_blk);
        let else_label = self.label(else_blk.unwrap_or(end_blk));
        self.terminate(
            branch_blk,
            Terminator::CondBr {
                cond: predicate,
                then_label,
                else_label,
            },
        );

        self.current = end_blk;
        Ok(())
    }

    /// Self-referential `!llvm.loop` node: `!N = !{!N, !{!"llvm.loop.mustprogress"}}`
    fn loop_metadata(&mut self) -> MetadataTuple {
        let mut md = self.module.new_metadata();
        let id = md.id.clone().unwrap_or_default();
        md.add(RawMetadata::new(id));
        let mut progress = MetadataTuple::new();
        progress.add(MetadataString::new("llvm.loop.mustprogress"));
        md.add(progress);
        self.module.add_metadata(md.clone());
        md
    }
}

