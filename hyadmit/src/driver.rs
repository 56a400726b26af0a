//! Whole-module verification.
//!
//! [`Verifier`] runs every admissibility check over a [`SpecModule`]: each
//! invariant and model-field contract, the contracts of methods annotated with a
//! purity level, and the read-effects of Confined and StateIndependent methods.
//! Each declaration gets its own checker so that findings never leak from one
//! declaration into the next.
use std::collections::BTreeMap;

use hyspec::{
    contract::{Invariant, ModelFieldContract},
    decl::{DeclTable, FactBase, FieldId, MethodId, TypeId},
    expr::{ExprArena, ExprId},
};
use log::{debug, info};
use strum::EnumIs;

use crate::{
    checker::AdmissibilityChecker,
    conf::AdmissibilityOptions,
    diagnostics::{Diagnostics, NullSink},
    effects::{ReadEffect, ReadEffectChecker},
    error::{AdmitError, AdmitResult},
};

/// Everything the admissibility pass looks at.
#[derive(Debug, Clone, Default)]
pub struct SpecModule {
    pub arena: ExprArena,
    pub decls: DeclTable,
    pub invariants: Vec<Invariant>,
    pub model_fields: Vec<ModelFieldContract>,
    /// Inferred read-effects per method.
    pub read_effects: BTreeMap<MethodId, Vec<ReadEffect>>,
}

impl SpecModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_invariant(&mut self, declaring_type: TypeId, condition: ExprId) {
        self.invariants.push(Invariant {
            declaring_type,
            condition,
        });
    }

    pub fn add_model_field(&mut self, contract: ModelFieldContract) {
        self.model_fields.push(contract);
    }

    pub fn add_read_effects(&mut self, method: MethodId, effects: impl IntoIterator<Item = ReadEffect>) {
        self.read_effects.entry(method).or_default().extend(effects);
    }
}

/// Declaration a verification outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
pub enum Declaration {
    /// Index into [`SpecModule::invariants`].
    Invariant(usize),
    ModelField(FieldId),
    MethodContract(MethodId),
    ReadEffects(MethodId),
}

impl std::fmt::Display for Declaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Declaration::Invariant(index) => write!(f, "invariant {}", index),
            Declaration::ModelField(field) => write!(f, "model field {}", field),
            Declaration::MethodContract(method) => write!(f, "contract of {}", method),
            Declaration::ReadEffects(method) => write!(f, "read-effects of {}", method),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Outcome {
    pub declaration: Declaration,
    pub errors: usize,
    pub warnings: usize,
}

impl Outcome {
    fn new(declaration: Declaration, diagnostics: &Diagnostics) -> Self {
        Self {
            declaration,
            errors: diagnostics.error_count(),
            warnings: diagnostics.warning_count(),
        }
    }

    pub fn is_admissible(&self) -> bool {
        self.errors == 0
    }
}

/// Findings of one [`Verifier::verify`] run, in check order.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub diagnostics: Diagnostics,
    pub outcomes: Vec<Outcome>,
}

impl VerificationReport {
    /// No declaration produced an error. Warnings do not count.
    pub fn is_admissible(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_admissible)
    }

    pub fn outcome(&self, declaration: Declaration) -> Option<&Outcome> {
        self.outcomes.iter().find(|outcome| outcome.declaration == declaration)
    }

    fn record(&mut self, declaration: Declaration, diagnostics: Diagnostics) {
        let outcome = Outcome::new(declaration, &diagnostics);
        debug!(
            "{}: {} error(s), {} warning(s)",
            declaration, outcome.errors, outcome.warnings
        );
        self.outcomes.push(outcome);
        self.diagnostics.extend(diagnostics);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Verifier {
    options: AdmissibilityOptions,
}

impl Verifier {
    pub fn new(options: AdmissibilityOptions) -> Self {
        Self { options }
    }

    /// Verifier configured from the default configuration file, if any.
    pub fn from_default_config() -> AdmitResult<Self> {
        Ok(Self::new(AdmissibilityOptions::load_or_default()?))
    }

    pub fn options(&self) -> &AdmissibilityOptions {
        &self.options
    }

    /// Run every enabled check over `module`.
    ///
    /// Fails only when the module references a method or field that its
    /// declaration table does not contain; admissibility violations end up in the
    /// report.
    pub fn verify(&self, module: &SpecModule) -> AdmitResult<VerificationReport> {
        let mut report = VerificationReport::default();
        if !self.options.check_contract_admissibility {
            debug!("Contract admissibility checking is disabled");
            return Ok(report);
        }

        let arena = &module.arena;
        let decls = &module.decls;

        for (index, invariant) in module.invariants.iter().enumerate() {
            let mut checker = AdmissibilityChecker::new(arena, decls, Diagnostics::new());
            checker.check_invariant(invariant);
            report.record(Declaration::Invariant(index), checker.into_sink());
        }

        for contract in &module.model_fields {
            decls
                .try_field(contract.model_field)
                .ok_or(AdmitError::UnknownField(contract.model_field))?;
            let mut checker = AdmissibilityChecker::new(arena, decls, Diagnostics::new());
            checker.check_model_field_satisfies(contract);
            report.record(Declaration::ModelField(contract.model_field), checker.into_sink());
        }

        for (method, contract) in decls.contracts() {
            let decl = decls.try_method(method).ok_or(AdmitError::UnknownMethod(method))?;
            if !decl.purity.is_specified() || contract.inherited {
                continue;
            }
            let well_foundedness_only = decl.purity.is_pure();
            let mut checker = AdmissibilityChecker::new(arena, decls, Diagnostics::new());
            for condition in contract.conditions() {
                checker.check_method_spec(condition, method, well_foundedness_only, false);
            }
            report.record(Declaration::MethodContract(method), checker.into_sink());
        }

        if self.options.check_read_effects {
            for (&method, effects) in &module.read_effects {
                let decl = decls.try_method(method).ok_or(AdmitError::UnknownMethod(method))?;
                if !decl.purity.admits_read_effect_check() {
                    continue;
                }
                let mut diagnostics = Diagnostics::new();
                ReadEffectChecker::new(method, decls).check(effects, &mut diagnostics);
                report.record(Declaration::ReadEffects(method), diagnostics);
            }
        }

        info!(
            "Admissibility: {} declaration(s) checked, {} error(s), {} warning(s)",
            report.outcomes.len(),
            report.diagnostics.error_count(),
            report.diagnostics.warning_count()
        );
        Ok(report)
    }

    /// Whether `expr` would be an admissible specification of `method`, without
    /// reporting anything.
    pub fn is_spec_admissible<F: FactBase + ?Sized>(
        arena: &ExprArena,
        facts: &F,
        expr: ExprId,
        method: MethodId,
    ) -> bool {
        let mut checker = AdmissibilityChecker::new(arena, facts, NullSink);
        checker.check_method_spec(expr, method, false, true);
        !checker.has_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyspec::decl::{FieldDecl, TypeDecl};

    #[test]
    fn disabled_pass_checks_nothing() {
        let mut module = SpecModule::new();
        let ty = module.decls.add_type(TypeDecl::class("Cell"));
        let next = module.decls.add_field(FieldDecl::new("next", ty).of_type(ty).peer());
        let value = module.decls.add_field(FieldDecl::new("value", ty));
        let this = module.arena.this();
        let this_next = module.arena.field(this, next);
        let next_value = module.arena.field(this_next, value);
        module.add_invariant(ty, next_value);

        let options = AdmissibilityOptions {
            check_contract_admissibility: false,
            ..Default::default()
        };
        let report = Verifier::new(options).verify(&module).unwrap();
        assert!(report.outcomes.is_empty());
        assert!(report.is_admissible());

        let report = Verifier::default().verify(&module).unwrap();
        assert!(!report.is_admissible());
        assert_eq!(report.outcome(Declaration::Invariant(0)).map(|o| o.errors), Some(1));
    }

    #[test]
    fn declaration_display() {
        assert_eq!(Declaration::Invariant(2).to_string(), "invariant 2");
        assert_eq!(
            Declaration::ReadEffects(MethodId(4)).to_string(),
            "read-effects of %method_4"
        );
    }
}
