//! Read-effect admissibility.
//!
//! An external effects analysis summarises what a method reads as a set of
//! [`ReadEffect`]s: a root (the receiver, a parameter, a local or global state)
//! followed by the chain of fields dereferenced from it. For Confined and
//! StateIndependent methods every such chain must obey the same ownership
//! discipline as the method's specification. Violations are reported as warnings,
//! at most one per effect.
use hyspec::decl::{FactBase, FieldId, MethodId};
use log::debug;
use smallvec::SmallVec;
use strum::EnumIs;

use crate::{
    diagnostics::{AdmissibilityWarning, DiagnosticSink, Site},
    state::{ChainState, ElementLevel},
};

/// Variable a read-effect starts from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs)]
pub enum EffectRoot {
    This,
    Parameter(String),
    Local(String),
    /// Static state.
    Global,
}

/// One dereference of a read-effect chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum ChainField {
    Field(FieldId),
    /// Every field reachable from the chain so far.
    AllFields,
    /// Every field reachable from the chain so far, owned ones excluded.
    AllFieldsNotOwned,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadEffect {
    pub root: EffectRoot,
    pub chain: SmallVec<ChainField, 4>,
    /// Statement the effect was inferred at.
    pub site: u32,
}

impl ReadEffect {
    pub fn new(root: EffectRoot, chain: impl IntoIterator<Item = ChainField>) -> Self {
        Self {
            root,
            chain: chain.into_iter().collect(),
            site: 0,
        }
    }

    /// Effect reading `fields` from the receiver.
    pub fn this(fields: impl IntoIterator<Item = FieldId>) -> Self {
        Self::new(EffectRoot::This, fields.into_iter().map(ChainField::Field))
    }

    pub fn at(mut self, site: u32) -> Self {
        self.site = site;
        self
    }

    pub fn then(mut self, field: ChainField) -> Self {
        self.chain.push(field);
        self
    }

    pub fn fmt<'a, F: FactBase + ?Sized>(&'a self, facts: &'a F) -> impl std::fmt::Display + 'a {
        pub struct Fmt<'a, F: ?Sized> {
            effect: &'a ReadEffect,
            facts: &'a F,
        }

        impl<F: FactBase + ?Sized> std::fmt::Display for Fmt<'_, F> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match &self.effect.root {
                    EffectRoot::This => write!(f, "this")?,
                    EffectRoot::Parameter(name) | EffectRoot::Local(name) => write!(f, "{}", name)?,
                    EffectRoot::Global => write!(f, "Global")?,
                }
                for field in &self.effect.chain {
                    match field {
                        ChainField::Field(id) => write!(f, ".{}", self.facts.field(*id).name)?,
                        ChainField::AllFields => write!(f, ".*")?,
                        ChainField::AllFieldsNotOwned => write!(f, ".$")?,
                    }
                }
                Ok(())
            }
        }

        Fmt { effect: self, facts }
    }
}

/// Replays the ownership rules over the read-effects of one method.
pub struct ReadEffectChecker<'a, F: FactBase + ?Sized> {
    method: MethodId,
    facts: &'a F,
    state: ChainState,
}

impl<'a, F: FactBase + ?Sized> ReadEffectChecker<'a, F> {
    pub fn new(method: MethodId, facts: &'a F) -> Self {
        Self {
            method,
            facts,
            state: ChainState::default(),
        }
    }

    /// Check every effect, reporting one warning per rejected effect. Returns
    /// whether all effects are admitted.
    pub fn check<'e, S: DiagnosticSink>(
        &mut self,
        effects: impl IntoIterator<Item = &'e ReadEffect>,
        mut sink: S,
    ) -> bool {
        let facts = self.facts;
        let method = facts.method(self.method);
        let mut admitted = true;

        for effect in effects {
            if self.admits(effect) {
                continue;
            }
            admitted = false;
            sink.report_warning(
                Site::Statement(effect.site),
                AdmissibilityWarning::ReadEffectNotAdmitted {
                    effect: effect.fmt(facts).to_string(),
                    purity: method.purity.to_string(),
                    method: method.name.clone(),
                },
            );
        }
        debug!("Read-effects of {} admitted: {}", method.name, admitted);
        admitted
    }

    /// Whether a single effect is admitted.
    pub fn admits(&mut self, effect: &ReadEffect) -> bool {
        self.state = ChainState::default();
        if effect.chain.is_empty() {
            return true;
        }

        match &effect.root {
            EffectRoot::Global => {
                let harmless = match effect.chain.as_slice() {
                    [ChainField::Field(f)] => self.facts.global_field_is_private_or_immutable(*f),
                    _ => false,
                };
                if !harmless {
                    return false;
                }
            }
            // Parameters cannot be annotated Rep.
            EffectRoot::Parameter(_) => {
                self.state.first_bound_member = false;
                self.state.outside_owned_cone = true;
            }
            EffectRoot::This | EffectRoot::Local(_) => {}
        }

        effect.chain.iter().all(|field| match field {
            ChainField::Field(f) => self.admits_field(*f),
            ChainField::AllFields | ChainField::AllFieldsNotOwned => false,
        })
    }

    fn admits_field(&mut self, f: FieldId) -> bool {
        let facts = self.facts;
        let method = facts.method(self.method);
        let readonly_or_immutable = facts.field_is_readonly(f) || facts.field_declaring_type_is_immutable(f);

        if method.purity.is_state_independent() && !readonly_or_immutable {
            return false;
        }

        let element_level = self.state.element_level;
        self.state.element_level = if facts.field_is_elements_rep(f) {
            ElementLevel::Rep
        } else if facts.field_is_elements_peer(f) {
            ElementLevel::Peer
        } else {
            ElementLevel::None
        };

        if self.state.first_bound_member {
            self.state.first_bound_member = false;
            if !(facts.field_is_rep(f) || facts.field_type_is_value_type(f)) {
                self.state.leave_cone(true);
            } else if !facts.field_type_is_value_type(f) {
                self.state.context_depth = 1;
            }
        } else if self.state.outside_owned_cone {
            let dependent = method.purity.is_confined() && facts.field_is_dependent_of(f, method.declaring_type);
            if !(readonly_or_immutable || dependent) {
                return false;
            }
        } else if facts.field_is_rep(f) || facts.field_type_is_struct(f) {
            if !facts.field_type_is_struct(f) {
                self.state.context_depth += 1;
            }
        } else if element_level.is_peer() {
            self.state.context_depth -= 1;
            if self.state.context_depth < 1 {
                self.state.leave_cone(false);
            }
        } else if !element_level.is_rep() && !facts.field_is_peer(f) {
            self.state.leave_cone(false);
        }
        true
    }
}
