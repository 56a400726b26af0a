//! Calls inside specifications.
//!
//! Besides the ownership rules applied to the receiver chain, a call made from a
//! method specification must respect the purity discipline (a specification may
//! only call methods at least as restrictive as its own method) and must be
//! well-founded: a call to a method of the same purity level needs a strictly
//! decreasing [`Measure`] or a receiver strictly inside the owned cone.
use hyspec::{
    decl::{FactBase, MethodFlags, MethodId, RecursionTermination, STRING_EQUALITY},
    expr::{Expr, ExprId, Member},
};
use log::trace;

use crate::{
    checker::AdmissibilityChecker,
    diagnostics::{AdmissibilityError, AdmissibilityWarning, DiagnosticSink, ReportMode},
};

/// Recursion measure of a method. `Unbounded` compares greater than every bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Measure {
    Finite(u32),
    Unbounded,
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Measure::Finite(n) => write!(f, "{}", n),
            Measure::Unbounded => write!(f, "unbounded"),
        }
    }
}

impl<'a, F: FactBase + ?Sized, S: DiagnosticSink> AdmissibilityChecker<'a, F, S> {
    pub(crate) fn visit_call(&mut self, callee: ExprId, args: &[ExprId]) {
        let Expr::Member {
            target,
            member: Member::Method(method),
        } = *self.arena.get(callee)
        else {
            return;
        };

        let facts = self.facts;
        let decl = facts.method(method);
        let error_site = self.chain.outermost.unwrap_or(callee);

        if (self.declaring_method().is_some() || self.is_model_field())
            && decl.flags.contains(MethodFlags::METHODOLOGY)
        {
            self.report(
                error_site,
                AdmissibilityError::DisallowedInSpec {
                    method: decl.full_name.clone(),
                },
            );
        }

        if let Some(spec_method) = self.declaring_method() {
            let caller = facts.method_purity(spec_method);
            let callee_purity = decl.purity;

            if caller.is_confined() && callee_purity.is_pure() {
                self.report(
                    error_site,
                    AdmissibilityError::ConfinedSpecContainsPureCall {
                        method: decl.name.clone(),
                    },
                );
            } else if caller.is_state_independent() && !callee_purity.is_state_independent() {
                self.report(
                    error_site,
                    AdmissibilityError::StateIndependentSpecContainsPureOrConfinedCall {
                        method: decl.name.clone(),
                    },
                );
            }

            if caller.is_specified() && caller == callee_purity {
                let caller_measure = self.measure(spec_method, false);
                let callee_measure = self.measure(method, true);
                trace!(
                    "Same-level call {} -> {}: measures {} / {}",
                    facts.method(spec_method).name,
                    decl.name,
                    caller_measure,
                    callee_measure
                );
                if caller_measure <= callee_measure && !self.receiver_in_owned_cone(target) {
                    self.warn(
                        error_site,
                        AdmissibilityWarning::NoDecreasingMeasure {
                            method: decl.name.clone(),
                        },
                    );
                }
            }
        }

        let builtin = decl.flags.contains(MethodFlags::BUILTIN);
        let is_static = decl.flags.contains(MethodFlags::STATIC);
        let state_independent = decl.purity.is_state_independent();

        if (self.is_invariant() || self.is_model_field()) && is_static && !builtin && !state_independent {
            self.report(
                error_site,
                AdmissibilityError::StaticNonStateIndependent {
                    method: decl.name.clone(),
                },
            );
        }

        if !(is_static || builtin || state_independent) {
            self.visit(callee);
        } else if !builtin {
            // Keep the chain state consistent without judging the receiver.
            let has_error = self.has_error();
            let saved = std::mem::replace(&mut self.mode, ReportMode::Suppressed);
            self.visit(callee);
            self.mode = saved;
            self.restore_error_flag(has_error);
        }

        if builtin {
            for &arg in args {
                self.visit(arg);
            }
        } else if !(is_static || state_independent) || decl.full_name == STRING_EQUALITY {
            let quantifier_binding = std::mem::take(&mut self.quantifier_binding);
            self.chain.push();
            for &arg in args {
                self.chain.reset();
                self.visit(arg);
            }
            self.chain.pop();
            self.quantifier_binding = quantifier_binding;
        }
    }

    /// Whether `target` lies strictly inside the owned cone. `this` and static
    /// receivers do not.
    fn receiver_in_owned_cone(&mut self, target: Option<ExprId>) -> bool {
        let Some(target) = target else {
            return false;
        };
        if matches!(self.arena.get(target), Expr::This | Expr::ImplicitThis) {
            return false;
        }

        let has_error = self.has_error();
        let mode = std::mem::replace(&mut self.mode, ReportMode::Suppressed);
        let quantifier_binding = std::mem::take(&mut self.quantifier_binding);
        let indexer_access = std::mem::take(&mut self.indexer_access);
        self.target_outside_owned_cone = true;

        self.chain.push();
        self.chain.reset();
        self.visit(target);
        self.chain.pop();

        let inside = !self.target_outside_owned_cone;
        self.mode = mode;
        self.quantifier_binding = quantifier_binding;
        self.indexer_access = indexer_access;
        self.restore_error_flag(has_error);
        inside
    }

    /// Measure used for the well-foundedness check.
    ///
    /// Without a `RecursionTermination` annotation the measure is unbounded, unless
    /// `inspect_contract` is set and the contract of `method` contains no call, in
    /// which case it is 0.
    pub fn measure(&self, method: MethodId, inspect_contract: bool) -> Measure {
        match self.facts.method(method).recursion_termination {
            Some(RecursionTermination::Bound(bound)) => Measure::Finite(bound),
            Some(RecursionTermination::Unbounded) => Measure::Unbounded,
            None if !inspect_contract => Measure::Unbounded,
            None => {
                let has_call = self
                    .facts
                    .method_contract(method)
                    .is_some_and(|contract| contract.conditions().any(|cond| self.arena.scan(cond).has_call));
                if has_call { Measure::Unbounded } else { Measure::Finite(0) }
            }
        }
    }
}
