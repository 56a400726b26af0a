//! Declarations that carry specification expressions.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    decl::{FieldId, MethodId, TypeId},
    expr::ExprId,
};

/// An object invariant of `declaring_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Invariant {
    pub declaring_type: TypeId,
    pub condition: ExprId,
}

/// The contract of a model field: the clauses every concrete value must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelFieldContract {
    pub model_field: FieldId,
    /// Getter realising the model field, when the contract is declared on it.
    pub getter: Option<MethodId>,
    /// A sealed model field cannot be overridden in subtypes.
    pub sealed: bool,
    pub satisfies: Vec<ExprId>,
}

impl ModelFieldContract {
    pub fn new(model_field: FieldId) -> Self {
        Self {
            model_field,
            getter: None,
            sealed: false,
            satisfies: Vec::new(),
        }
    }

    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    pub fn getter(mut self, getter: MethodId) -> Self {
        self.getter = Some(getter);
        self
    }

    pub fn satisfies(mut self, clause: ExprId) -> Self {
        self.satisfies.push(clause);
        self
    }
}

/// Pre- and postconditions of a method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MethodContract {
    pub requires: Vec<ExprId>,
    pub ensures: Vec<ExprId>,
    /// The contract is inherited from an overridden method and was checked there.
    pub inherited: bool,
}

impl MethodContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requires(mut self, condition: ExprId) -> Self {
        self.requires.push(condition);
        self
    }

    pub fn ensures(mut self, condition: ExprId) -> Self {
        self.ensures.push(condition);
        self
    }

    pub fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }

    /// Every condition, postconditions first.
    pub fn conditions(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.ensures.iter().chain(self.requires.iter()).copied()
    }
}
