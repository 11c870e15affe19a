//! Per-method emission context: local slots, symbolic stack depth, labels.
//!
//! The stack accounting is a small abstract interpretation and must stay
//! exact: every emit helper pairs its instruction with the pushes and pops
//! that instruction performs, and the emitter asserts neutrality around
//! statements. Underflow means the emitter itself is wrong, so it surfaces
//! as an internal error rather than a diagnostic.

use std::collections::HashMap;

use crate::ast::VarId;
use crate::{Error, Result};

pub struct Frame {
    /// `Class_member`, used to tag generated labels.
    tag: String,
    next_slot: u16,
    max_locals: u16,
    depth: u32,
    max_stack: u32,
    slots: HashMap<VarId, u16>,
    next_label: u32,
}

impl Frame {
    pub fn new(class: &str, member: &str) -> Self {
        Self {
            tag: format!("{}_{}", class, member),
            next_slot: 0,
            max_locals: 0,
            depth: 0,
            max_stack: 0,
            slots: HashMap::new(),
            next_label: 0,
        }
    }

    /// Reserves slot 0 for the instance reference.
    pub fn reserve_receiver(&mut self) {
        debug_assert_eq!(self.next_slot, 0, "receiver must be the first slot");
        self.next_slot = 1;
        self.max_locals = self.max_locals.max(1);
    }

    /// Allocates the next free slot (two for wide types) for a variable.
    pub fn alloc_slot(&mut self, var: VarId, wide: bool) -> u16 {
        let slot = self.next_slot;
        self.next_slot += if wide { 2 } else { 1 };
        self.max_locals = self.max_locals.max(self.next_slot);
        self.slots.insert(var, slot);
        slot
    }

    pub fn slot(&self, var: VarId) -> Result<u16> {
        self.slots.get(&var).copied().ok_or_else(|| {
            Error::Internal(format!("no local slot allocated for variable in {}", self.tag))
        })
    }

    pub fn push(&mut self, slots: u32) {
        self.depth += slots;
        self.max_stack = self.max_stack.max(self.depth);
    }

    pub fn pop(&mut self, slots: u32) -> Result<()> {
        if self.depth < slots {
            return Err(Error::Internal(format!(
                "operand stack underflow in {} (depth {}, popping {})",
                self.tag, self.depth, slots
            )));
        }
        self.depth -= slots;
        Ok(())
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn max_stack(&self) -> u32 {
        self.max_stack
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    /// Unique label tagged by class, member and purpose.
    pub fn fresh_label(&mut self, purpose: &str) -> String {
        let label = format!("{}_{}_{}", self.tag, purpose, self.next_label);
        self.next_label += 1;
        label
    }
}
