//! Per-chain state of the ownership walk.
//!
//! A chain is a sequence of member accesses rooted at the declaring entity, such as
//! `this.items.head.value`. While it is walked, [`ChainState`] records whether the
//! chain is still inside the owned cone and how deep. Independent sub-chains (index
//! operands, call arguments, quantifier sources) are checked against a fresh state
//! that [`ChainStack`] saves and restores around them.
use std::ops::{Deref, DerefMut};

use hyspec::expr::ExprId;
use strum::{Display, EnumIs};

/// Ownership of the elements yielded by the member just visited.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, Display)]
#[repr(u8)]
pub enum ElementLevel {
    #[default]
    None = 0,
    Peer = 1,
    Rep = 2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainState {
    /// Set once the chain has left the owned cone. Never cleared within a chain.
    pub outside_owned_cone: bool,
    /// The cone was left on the very first access.
    pub first_non_rep: bool,
    /// No field or method of the chain has been processed yet.
    pub first_bound_member: bool,
    /// A diagnostic was emitted for this chain.
    pub reported_error: bool,
    pub previous_was_element_collection: bool,
    /// Remaining depth inside the cone, at least 1 while inside.
    pub context_depth: i32,
    pub element_level: ElementLevel,
    /// Top of the chain being walked. Revisiting it terminates the chain.
    pub outermost: Option<ExprId>,
    pub last_accessed_name: String,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            outside_owned_cone: false,
            first_non_rep: false,
            first_bound_member: true,
            reported_error: false,
            previous_was_element_collection: false,
            context_depth: 0,
            element_level: ElementLevel::None,
            outermost: None,
            last_accessed_name: String::new(),
        }
    }
}

impl ChainState {
    /// Leave the owned cone. `first` records whether this happens on the first access.
    pub fn leave_cone(&mut self, first: bool) {
        self.outside_owned_cone = true;
        self.first_non_rep |= first;
    }

    /// Inside the cone with a positive depth.
    pub fn in_cone(&self) -> bool {
        !self.outside_owned_cone && self.context_depth > 0
    }
}

/// The live [`ChainState`] together with the states saved for enclosing chains.
#[derive(Debug, Default, Clone)]
pub struct ChainStack {
    current: ChainState,
    saved: Vec<ChainState>,
}

impl ChainStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new chain.
    pub fn reset(&mut self) {
        self.current = ChainState::default();
    }

    /// Save the live state. The live state is left untouched; callers reset it
    /// when the nested chain must start fresh.
    pub fn push(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Restore the most recently saved state. Unbalanced pops leave a fresh state.
    pub fn pop(&mut self) {
        self.current = self.saved.pop().unwrap_or_default();
    }

    /// Number of saved enclosing states.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

impl Deref for ChainStack {
    type Target = ChainState;

    fn deref(&self) -> &Self::Target {
        &self.current
    }
}

impl DerefMut for ChainStack {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.current
    }
}
