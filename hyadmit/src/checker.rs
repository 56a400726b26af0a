//! Expression admissibility checker.
//!
//! The checker walks one specification expression at a time and classifies every
//! access chain as staying inside the owned cone of the declaring entity or leaving
//! it. Chains are processed root-to-leaf: for `this.a.b` the access `a` is handled
//! before `b`, and the chain terminates when the walk returns to its outermost
//! node (`b`). Which continuations are legal depends on the declaration being
//! checked:
//! - invariants may continue outside the cone through fields that declare a
//!   dependency on the invariant's type (visibility-based access),
//! - model-field contracts additionally constrain the visibility of the fields they
//!   read when the model field can be overridden,
//! - method specifications are checked against the purity level of the method.
//!
//! Example: an invariant over a Rep field is admissible, one that dereferences a
//! Peer field is not.
//! ```
//! use hyadmit::prelude::*;
//! use hyspec::prelude::*;
//!
//! let mut decls = DeclTable::new();
//! let list = decls.add_type(TypeDecl::class("List"));
//! let node = decls.add_type(TypeDecl::class("Node"));
//! let head = decls.add_field(FieldDecl::new("head", list).of_type(node).rep());
//! let next = decls.add_field(FieldDecl::new("next", list).of_type(node).peer());
//! let value = decls.add_field(FieldDecl::new("value", node));
//!
//! let mut arena = ExprArena::new();
//! let this = arena.this();
//! let this_head = arena.field(this, head);
//! let head_value = arena.field(this_head, value);
//! let this_next = arena.field(this, next);
//! let next_value = arena.field(this_next, value);
//!
//! let mut checker = AdmissibilityChecker::new(&arena, &decls, Diagnostics::new());
//! checker.check_invariant(&Invariant { declaring_type: list, condition: head_value });
//! assert!(!checker.has_error());
//!
//! checker.check_invariant(&Invariant { declaring_type: list, condition: next_value });
//! assert!(checker.has_error());
//! assert_eq!(checker.sink().error_count(), 1);
//! ```
use hyspec::{
    contract::{Invariant, ModelFieldContract},
    decl::{FactBase, FieldFlags, FieldId, MethodFlags, MethodId, TypeId},
    expr::{Clause, Expr, ExprArena, ExprId, Member, VariableKind},
};
use log::trace;

use crate::{
    diagnostics::{AdmissibilityError, AdmissibilityWarning, DiagnosticSink, ReportMode, Site},
    state::{ChainStack, ElementLevel},
};

/// Declaration whose expressions are being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaringContext {
    Invariant {
        declaring_type: TypeId,
    },
    ModelField {
        model_field: FieldId,
        getter: Option<MethodId>,
        declaring_type: TypeId,
        sealed: bool,
    },
    MethodSpec {
        method: MethodId,
        /// `result` may be used as a chain root.
        postcondition: bool,
    },
}

pub struct AdmissibilityChecker<'a, F: FactBase + ?Sized, S: DiagnosticSink> {
    pub(crate) arena: &'a ExprArena,
    pub(crate) facts: &'a F,
    sink: S,
    pub(crate) context: Option<DeclaringContext>,
    pub(crate) chain: ChainStack,
    has_error: bool,
    pub(crate) mode: ReportMode,
    /// Visiting the source of a quantifier binding.
    pub(crate) quantifier_binding: bool,
    /// The next member visited is the object of an indexer.
    pub(crate) indexer_access: bool,
    /// Whether the last terminated chain ended outside the owned cone.
    pub(crate) target_outside_owned_cone: bool,
}

impl<'a, F: FactBase + ?Sized, S: DiagnosticSink> AdmissibilityChecker<'a, F, S> {
    pub fn new(arena: &'a ExprArena, facts: &'a F, sink: S) -> Self {
        Self {
            arena,
            facts,
            sink,
            context: None,
            chain: ChainStack::new(),
            has_error: false,
            mode: ReportMode::Normal,
            quantifier_binding: false,
            indexer_access: false,
            target_outside_owned_cone: false,
        }
    }

    /// Whether any check run by this checker found a violation, reported or not.
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// Undo the effect of a probing visit on the error verdict.
    pub(crate) fn restore_error_flag(&mut self, has_error: bool) {
        self.has_error = has_error;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn check_invariant(&mut self, invariant: &Invariant) {
        self.context = Some(DeclaringContext::Invariant {
            declaring_type: invariant.declaring_type,
        });
        self.mode = ReportMode::Normal;
        self.begin();
        self.visit(invariant.condition);
    }

    /// Check every satisfies clause of a model-field contract, each as an
    /// independent expression.
    pub fn check_model_field_satisfies(&mut self, contract: &ModelFieldContract) {
        self.context = Some(DeclaringContext::ModelField {
            model_field: contract.model_field,
            getter: contract.getter,
            declaring_type: self.facts.field(contract.model_field).declaring_type,
            sealed: contract.sealed,
        });
        self.mode = ReportMode::Normal;
        for &clause in &contract.satisfies {
            self.begin();
            self.visit(clause);
        }
    }

    /// Check one pre- or postcondition of `method`.
    ///
    /// With `well_foundedness_only` only missing decreasing measures are reported;
    /// with `suppress` nothing is, and the verdict is read through
    /// [`AdmissibilityChecker::has_error`]. An `expr` registered among the
    /// preconditions of `method` may not mention `result`.
    pub fn check_method_spec(&mut self, expr: ExprId, method: MethodId, well_foundedness_only: bool, suppress: bool) {
        let precondition = self
            .facts
            .method_contract(method)
            .is_some_and(|contract| contract.requires.contains(&expr));
        self.context = Some(DeclaringContext::MethodSpec {
            method,
            postcondition: !precondition,
        });
        self.mode = ReportMode::new(well_foundedness_only, suppress);
        self.begin();
        self.visit(expr);
    }

    fn begin(&mut self) {
        self.chain = ChainStack::new();
        self.quantifier_binding = false;
        self.indexer_access = false;
    }

    pub(crate) fn report(&mut self, site: ExprId, error: AdmissibilityError) {
        self.has_error = true;
        if self.chain.reported_error || !self.mode.emits(error.category()) {
            trace!("Muted at {}: {}", site, error);
            return;
        }
        self.sink.report_error(Site::Expr(site), error);
        self.chain.reported_error = true;
    }

    /// Warnings count towards [`AdmissibilityChecker::has_error`] but do not latch
    /// the chain.
    pub(crate) fn warn(&mut self, site: ExprId, warning: AdmissibilityWarning) {
        self.has_error = true;
        if self.chain.reported_error || !self.mode.emits(warning.category()) {
            trace!("Muted at {}: {}", site, warning);
            return;
        }
        self.sink.report_warning(Site::Expr(site), warning);
    }

    pub(crate) fn declaring_method(&self) -> Option<MethodId> {
        match self.context {
            Some(DeclaringContext::MethodSpec { method, .. }) => Some(method),
            _ => None,
        }
    }

    fn in_postcondition(&self) -> bool {
        matches!(
            self.context,
            Some(DeclaringContext::MethodSpec {
                postcondition: true,
                ..
            })
        )
    }

    /// Type declaring the invariant or model field being checked.
    fn declaring_member_type(&self) -> Option<TypeId> {
        match self.context {
            Some(DeclaringContext::Invariant { declaring_type })
            | Some(DeclaringContext::ModelField { declaring_type, .. }) => Some(declaring_type),
            _ => None,
        }
    }

    pub(crate) fn is_invariant(&self) -> bool {
        matches!(self.context, Some(DeclaringContext::Invariant { .. }))
    }

    pub(crate) fn is_model_field(&self) -> bool {
        matches!(self.context, Some(DeclaringContext::ModelField { .. }))
    }

    fn is_state_independent_spec(&self) -> bool {
        self.declaring_method()
            .is_some_and(|m| self.facts.method_purity(m).is_state_independent())
    }

    fn member_name(&self, member: Member) -> String {
        match member {
            Member::Field(f) => self.facts.field(f).name.clone(),
            Member::Method(m) => self.facts.method(m).name.clone(),
            Member::Type(t) => self.facts.type_decl(t).name.clone(),
        }
    }

    /// Fields a StateIndependent specification may read.
    fn state_independent_readable(&self, f: FieldId) -> bool {
        self.facts.field_is_readonly(f)
            || self.facts.field_declaring_type_is_value_type(f)
            || self.facts.field_declaring_type_is_immutable(f)
    }

    /// Visibility-based access: `f` declares a dependency on the invariant's type.
    fn field_is_visible(&self, f: FieldId) -> bool {
        match self.context {
            Some(DeclaringContext::Invariant { declaring_type }) => self.facts.field_is_dependent_of(f, declaring_type),
            _ => false,
        }
    }

    pub(crate) fn visit(&mut self, id: ExprId) {
        let arena = self.arena;
        match arena.get(id) {
            Expr::Member { target, member } => self.visit_member(id, *target, *member),
            Expr::Index { object, indices } => self.visit_index(id, *object, indices),
            Expr::Call { callee, args } => self.visit_call(*callee, args),
            Expr::Quantifier { clauses, body, .. } => self.visit_quantifier(clauses, body),
            Expr::Variable {
                name,
                kind: VariableKind::Bound,
            } => self.visit_bound_variable(id, name),
            other => {
                for child in other.children() {
                    self.visit(child);
                }
            }
        }
    }

    /// A quantifier-bound variable behaves as a Rep access at the root of a chain.
    fn visit_bound_variable(&mut self, id: ExprId, name: &str) {
        self.indexer_access = false;
        if self.chain.outermost.is_none() {
            // The variable is the whole chain, which ends at depth 1 inside the cone.
            self.target_outside_owned_cone = false;
            if self.quantifier_binding {
                self.report(
                    id,
                    AdmissibilityError::BoundCollArrayNotOwned {
                        member: name.to_string(),
                    },
                );
            }
            return;
        }
        if self.chain.first_bound_member {
            self.chain.first_bound_member = false;
            self.chain.context_depth = 1;
            self.chain.element_level = ElementLevel::None;
            self.chain.last_accessed_name = name.to_string();
        }
    }

    fn visit_member(&mut self, id: ExprId, target: Option<ExprId>, member: Member) {
        let is_indexer_access = std::mem::take(&mut self.indexer_access);
        let (field, method) = match member {
            Member::Field(f) => (Some(f), None),
            Member::Method(m) => (None, Some(m)),
            Member::Type(_) => return,
        };

        let site = *self.chain.outermost.get_or_insert(id);
        let name = self.member_name(member);
        let facts = self.facts;
        let arena = self.arena;

        if let (
            Some(DeclaringContext::ModelField {
                model_field,
                getter,
                declaring_type,
                sealed: false,
            }),
            Some(f),
        ) = (self.context, field)
        {
            let field_decl = facts.field(f);
            let model_decl = facts.field(model_field);
            if field_decl.flags.contains(FieldFlags::PRIVATE)
                || !field_decl.flags.contains(FieldFlags::VISIBLE_OUTSIDE_ASSEMBLY)
                    && model_decl.flags.contains(FieldFlags::VISIBLE_OUTSIDE_ASSEMBLY)
            {
                let declaring_member = match getter {
                    Some(getter) => facts.method(getter).name.clone(),
                    None => model_decl.name.clone(),
                };
                self.report(
                    site,
                    AdmissibilityError::InternalFieldInOverridableModelField {
                        field: field_decl.name.clone(),
                        model_field: declaring_member,
                        declaring_type: facts.type_decl(declaring_type).name.clone(),
                    },
                );
            }
        }

        let target_node = target.map(|t| arena.get(t));
        if matches!(target_node, Some(Expr::Unary { .. } | Expr::Binary { .. })) {
            self.report(site, AdmissibilityError::TargetNotAdmissible { member: name.clone() });
        }

        if let Some(target) = target {
            self.visit(target);
        }

        let mut element_level = ElementLevel::None;
        let previous_was_element_collection = std::mem::take(&mut self.chain.previous_was_element_collection);
        if method.is_some_and(|m| facts.method_is_element_or_collection(m)) {
            element_level = self.chain.element_level;
        }
        self.chain.element_level = ElementLevel::None;
        if let Some(f) = field.filter(|&f| facts.field_is_elements_rep_or_peer(f)) {
            self.chain.element_level = if facts.field_is_elements_rep(f) {
                ElementLevel::Rep
            } else {
                ElementLevel::Peer
            };
        } else if method.is_some_and(|m| facts.method_is_element_collection(m)) {
            self.chain.element_level = element_level;
            self.chain.previous_was_element_collection = true;
        }

        if let (Some(spec_method), Some(Expr::Result)) = (self.declaring_method(), target_node) {
            if !self.in_postcondition() {
                self.report(site, AdmissibilityError::TargetNotThis);
            }
            self.chain.first_bound_member = false;
            self.chain.last_accessed_name = "result".to_string();
            if facts.method_is_rep(spec_method) {
                self.chain.context_depth = 1;
            } else {
                self.chain.leave_cone(true);
                if self.quantifier_binding || is_indexer_access {
                    self.report(site, AdmissibilityError::BoundCollArrayNotRep);
                }
            }
        }

        if self.chain.first_bound_member {
            self.first_access(site, target, field, method, is_indexer_access, &name);
        } else if self.is_state_independent_spec() && field.is_some_and(|f| !self.state_independent_readable(f)) {
            self.report(site, AdmissibilityError::StateIndependentSpecNotAdmissible);
        } else if self.chain.outside_owned_cone {
            let admitted = field.is_some_and(|f| self.field_is_visible(f))
                || field.is_some_and(|f| {
                    !facts.field_is_model(f)
                        && (facts.field_is_readonly(f) || facts.field_declaring_type_is_immutable(f))
                })
                || method.is_some_and(|m| {
                    let decl = facts.method(m);
                    decl.purity.is_state_independent()
                        || decl.purity.is_confined() && facts.type_is_immutable(decl.declaring_type)
                });
            if !admitted {
                let last = self.chain.last_accessed_name.clone();
                let visibility_hint = self.is_invariant();
                let error = if self.chain.first_non_rep {
                    AdmissibilityError::FirstNonRepChainNotEnded { last, visibility_hint }
                } else {
                    AdmissibilityError::NonRepOrPeerChainNotEnded { last, visibility_hint }
                };
                self.report(site, error);
            }
        } else if field.is_some_and(|f| facts.field_is_rep(f) || facts.field_type_is_struct(f))
            || method.is_some_and(|m| facts.method_is_rep(m))
        {
            // Structs cannot own objects: the depth stays flat.
            if !field.is_some_and(|f| facts.field_type_is_struct(f)) {
                self.chain.context_depth += 1;
            }
        } else if is_indexer_access && !field.is_some_and(|f| facts.field_is_peer(f)) {
            self.chain.leave_cone(false);
        } else if element_level.is_peer() && !previous_was_element_collection {
            self.chain.context_depth -= 1;
            if self.chain.context_depth < 1 {
                self.chain.leave_cone(false);
                if self.quantifier_binding {
                    self.report(site, AdmissibilityError::BoundCollArrayNotOwned { member: name.clone() });
                }
            }
        } else if !element_level.is_rep()
            && (field.is_some_and(|f| !facts.field_is_peer(f)) || method.is_some_and(|m| !facts.method_is_owned(m)))
        {
            self.chain.leave_cone(false);
            if is_indexer_access || self.quantifier_binding {
                self.report(site, AdmissibilityError::BoundCollArrayNotOwned { member: name.clone() });
            }
        }

        if self.chain.outermost == Some(id) {
            if self.quantifier_binding {
                if self.chain.outside_owned_cone {
                    self.report(site, AdmissibilityError::BoundCollArrayNotOwned { member: name.clone() });
                }
                let ends_owned = field.is_some_and(|f| facts.field_is_elements_rep(f))
                    || self.chain.context_depth > 1 && field.is_some_and(|f| facts.field_is_elements_peer(f))
                    || self.chain.context_depth > 0 && !element_level.is_none();
                if !ends_owned {
                    self.report(site, AdmissibilityError::BoundCollArrayNotOwned { member: name.clone() });
                }
            }
            if is_indexer_access && field.is_some_and(|f| !facts.field_is_owned(f)) {
                self.report(site, AdmissibilityError::BoundCollArrayNotOwned { member: name });
            }
            self.target_outside_owned_cone = self.chain.outside_owned_cone;
            self.chain.reset();
        } else {
            self.chain.last_accessed_name = name;
        }
    }

    /// First access of a chain: the chain leaves the declaring entity.
    fn first_access(
        &mut self,
        site: ExprId,
        target: Option<ExprId>,
        field: Option<FieldId>,
        method: Option<MethodId>,
        is_indexer_access: bool,
        name: &str,
    ) {
        let facts = self.facts;
        self.chain.first_bound_member = false;

        let legal_root = match target.map(|t| self.arena.get(t)) {
            None => !method.is_some_and(|m| facts.method_has_flag(m, MethodFlags::CONSTRUCTOR)),
            Some(Expr::This | Expr::ImplicitThis) => true,
            Some(Expr::Result) => self.in_postcondition(),
            Some(Expr::Cast { .. }) => target.is_some_and(|t| self.casts_of_this(t)),
            Some(_) => false,
        };
        if !legal_root {
            self.report(site, AdmissibilityError::TargetNotThis);
        }

        if self.is_state_independent_spec()
            && field.is_some_and(|f| facts.field_is_model(f) || !self.state_independent_readable(f))
        {
            self.report(site, AdmissibilityError::StateIndependentSpecNotAdmissible);
        }

        if let (Some(declaring_type), Some(f)) = (self.declaring_member_type(), field) {
            let field_type = facts.field(f).declaring_type;
            if field_type != declaring_type {
                if facts.is_assignable_to(declaring_type, field_type) {
                    let overridden_model_field = facts.field_is_model(f)
                        && matches!(
                            self.context,
                            Some(DeclaringContext::ModelField { model_field, .. }) if model_field == f
                        );
                    if !facts.field_is_additive(f) && !overridden_model_field {
                        self.report(
                            site,
                            AdmissibilityError::FirstAccessOnNonAdditiveField {
                                member: name.to_string(),
                            },
                        );
                    }
                } else if facts.is_assignable_to(field_type, declaring_type) {
                    self.report(
                        site,
                        AdmissibilityError::FirstAccessOnFieldDeclaredInSubtype {
                            member: name.to_string(),
                        },
                    );
                }
            }
        }

        let leaves_cone = field.is_some_and(|f| !(facts.field_is_rep(f) || facts.field_type_is_value_type(f)))
            || method.is_some_and(|m| !facts.method_is_rep(m));
        if leaves_cone {
            self.chain.leave_cone(true);
            if self.quantifier_binding || is_indexer_access {
                self.report(site, AdmissibilityError::BoundCollArrayNotRep);
            }
        } else if !field.is_some_and(|f| facts.field_type_is_value_type(f)) {
            self.chain.context_depth = 1;
        }
    }

    /// `target` is a stack of type or non-null casts around `this`.
    fn casts_of_this(&self, mut target: ExprId) -> bool {
        while let Expr::Cast { operand, .. } = self.arena.get(target) {
            target = *operand;
        }
        matches!(self.arena.get(target), Expr::This | Expr::ImplicitThis)
    }

    fn visit_index(&mut self, id: ExprId, object: ExprId, indices: &[ExprId]) {
        let site = *self.chain.outermost.get_or_insert(id);

        self.indexer_access = true;
        self.visit(object);
        self.indexer_access = false;

        let element_level = self.chain.element_level;
        if self.chain.outside_owned_cone {
            let member = self.chain.last_accessed_name.clone();
            self.report(site, AdmissibilityError::BoundCollArrayNotOwned { member });
        } else if element_level.is_none() || element_level.is_peer() && self.chain.context_depth < 2 {
            self.chain.leave_cone(false);
        } else if element_level.is_peer() {
            self.chain.context_depth -= 1;
        }
        self.chain.last_accessed_name = format!("on element of {}", self.chain.last_accessed_name);

        let quantifier_binding = std::mem::take(&mut self.quantifier_binding);
        self.chain.push();
        for &index in indices {
            self.chain.reset();
            self.visit(index);
        }
        self.chain.pop();
        self.quantifier_binding = quantifier_binding;

        if self.chain.outermost == Some(id) {
            self.target_outside_owned_cone = self.chain.outside_owned_cone;
            self.chain.reset();
        }
    }

    fn visit_quantifier(&mut self, clauses: &[Clause], body: &[ExprId]) {
        for clause in clauses {
            match clause {
                Clause::Filter(condition) => self.visit(*condition),
                Clause::Binding { source: None, .. } => {}
                // Numeric ranges are not subject to ownership.
                Clause::Binding {
                    source: Some(source), ..
                } if self.arena.get(*source).is_range() => self.visit(*source),
                Clause::Binding {
                    source: Some(source), ..
                } => {
                    let saved = std::mem::replace(&mut self.quantifier_binding, true);
                    self.visit(*source);
                    self.quantifier_binding = saved;
                }
            }
        }
        for &element in body {
            self.visit(element);
        }
    }
}
