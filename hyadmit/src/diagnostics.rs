//! Admissibility findings and where they go.
//!
//! The checkers never fail: every violation is handed to a [`DiagnosticSink`]
//! together with the [`Site`] it was detected at. Hard errors are
//! [`AdmissibilityError`]s, soft findings (missing decreasing measure, rejected
//! read-effects) are [`AdmissibilityWarning`]s.
use hyspec::expr::ExprId;
use log::{debug, warn};
use strum::{Display, EnumDiscriminants, EnumIs, EnumIter};
use thiserror::Error;

fn dependency_hint(enabled: &bool) -> &'static str {
    if *enabled {
        " Consider declaring the field as a dependent of the invariant's type."
    } else {
        ""
    }
}

/// Class of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
pub enum Category {
    /// The chain does not start at a legal root.
    Structural,
    /// The chain leaves the owned cone where it must not.
    OwnershipEscape,
    /// Field or model-field visibility and override-eligibility violations.
    CrossHierarchy,
    /// A specification calls a method of a less restrictive purity level.
    PurityDiscipline,
    /// Same-level recursive calls without a decreasing measure.
    WellFoundedness,
    /// Ownership violations found in inferred read-effects.
    ReadEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, EnumDiscriminants)]
#[strum_discriminants(name(AdmissibilityErrorKind), derive(Hash, EnumIter, Display))]
pub enum AdmissibilityError {
    #[error("Expression not admissible: the target of '{member}' is not admissible.")]
    TargetNotAdmissible { member: String },

    #[error("Expression not admissible: the receiver of the first access must be 'this'.")]
    TargetNotThis,

    #[error(
        "Expression not admissible: the first access '{last}' is not Rep, the chain must end here.{}",
        dependency_hint(.visibility_hint)
    )]
    FirstNonRepChainNotEnded { last: String, visibility_hint: bool },

    #[error(
        "Expression not admissible: '{last}' is neither Rep nor Peer, the chain must end here.{}",
        dependency_hint(.visibility_hint)
    )]
    NonRepOrPeerChainNotEnded { last: String, visibility_hint: bool },

    #[error("Expression not admissible: the bound collection or array must be accessed through a Rep field.")]
    BoundCollArrayNotRep,

    #[error("Expression not admissible: the bound collection or array element '{member}' is not owned.")]
    BoundCollArrayNotOwned { member: String },

    #[error(
        "Expression not admissible: the static method '{method}' called from an invariant or model field contract is not StateIndependent."
    )]
    StaticNonStateIndependent { method: String },

    #[error("Expression not admissible: the field '{member}' of a supertype is not marked Additive.")]
    FirstAccessOnNonAdditiveField { member: String },

    #[error("Expression not admissible: the field '{member}' is declared in a subtype.")]
    FirstAccessOnFieldDeclaredInSubtype { member: String },

    #[error(
        "Expression not admissible: a StateIndependent specification may only read readonly fields or fields of immutable types."
    )]
    StateIndependentSpecNotAdmissible,

    #[error("Expression not admissible: a Confined specification calls the Pure method '{method}'.")]
    ConfinedSpecContainsPureCall { method: String },

    #[error(
        "Expression not admissible: a StateIndependent specification calls '{method}', which is not StateIndependent."
    )]
    StateIndependentSpecContainsPureOrConfinedCall { method: String },

    #[error("Expression not admissible: '{method}' is not allowed in this specification.")]
    DisallowedInSpec { method: String },

    #[error(
        "Field '{field}' is not visible outside the assembly but is referenced by the contract of the overridable model field '{model_field}' of '{declaring_type}'."
    )]
    InternalFieldInOverridableModelField {
        field: String,
        model_field: String,
        declaring_type: String,
    },
}

impl AdmissibilityError {
    pub fn kind(&self) -> AdmissibilityErrorKind {
        self.into()
    }

    pub fn category(&self) -> Category {
        use AdmissibilityErrorKind as K;

        match self.kind() {
            K::TargetNotAdmissible | K::TargetNotThis => Category::Structural,
            K::FirstNonRepChainNotEnded
            | K::NonRepOrPeerChainNotEnded
            | K::BoundCollArrayNotRep
            | K::BoundCollArrayNotOwned
            | K::StateIndependentSpecNotAdmissible => Category::OwnershipEscape,
            K::FirstAccessOnNonAdditiveField
            | K::FirstAccessOnFieldDeclaredInSubtype
            | K::InternalFieldInOverridableModelField => Category::CrossHierarchy,
            K::StaticNonStateIndependent
            | K::ConfinedSpecContainsPureCall
            | K::StateIndependentSpecContainsPureOrConfinedCall
            | K::DisallowedInSpec => Category::PurityDiscipline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, EnumIs)]
pub enum AdmissibilityWarning {
    #[error(
        "Method call '{method}' not admissible: could not find decreasing measure based on purity-level, receiver, and recursion termination value."
    )]
    NoDecreasingMeasure { method: String },

    #[error("Read-effect {effect} is not admitted for {purity} method {method}.")]
    ReadEffectNotAdmitted {
        effect: String,
        purity: String,
        method: String,
    },
}

impl AdmissibilityWarning {
    pub fn category(&self) -> Category {
        match self {
            AdmissibilityWarning::NoDecreasingMeasure { .. } => Category::WellFoundedness,
            AdmissibilityWarning::ReadEffectNotAdmitted { .. } => Category::ReadEffect,
        }
    }
}

/// Which findings reach the sink.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, EnumIs, EnumIter, Display)]
pub enum ReportMode {
    /// Every finding is reported.
    #[default]
    Normal,
    /// Only well-foundedness findings are reported.
    WellFoundednessOnly,
    /// Nothing is reported, only the verdict is recorded.
    Suppressed,
}

impl ReportMode {
    pub fn new(well_foundedness_only: bool, suppress: bool) -> Self {
        if suppress {
            ReportMode::Suppressed
        } else if well_foundedness_only {
            ReportMode::WellFoundednessOnly
        } else {
            ReportMode::Normal
        }
    }

    /// Whether a finding of `category` is reported in this mode.
    pub fn emits(self, category: Category) -> bool {
        match self {
            ReportMode::Normal => true,
            ReportMode::WellFoundednessOnly => category.is_well_foundedness(),
            ReportMode::Suppressed => false,
        }
    }
}

/// Location of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
pub enum Site {
    /// A node of the checked expression.
    Expr(ExprId),
    /// A statement of the method whose read-effects were inferred.
    Statement(u32),
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Site::Expr(id) => write!(f, "expr {}", id),
            Site::Statement(index) => write!(f, "statement {}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs)]
pub enum Finding {
    Error(AdmissibilityError),
    Warning(AdmissibilityWarning),
}

impl Finding {
    pub fn category(&self) -> Category {
        match self {
            Finding::Error(error) => error.category(),
            Finding::Warning(warning) => warning.category(),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::Error(error) => write!(f, "error: {}", error),
            Finding::Warning(warning) => write!(f, "warning: {}", warning),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub site: Site,
    pub finding: Finding,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.finding, self.site)
    }
}

/// Receiver of admissibility findings.
pub trait DiagnosticSink {
    fn report_error(&mut self, site: Site, error: AdmissibilityError);
    fn report_warning(&mut self, site: Site, warning: AdmissibilityWarning);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report_error(&mut self, site: Site, error: AdmissibilityError) {
        (**self).report_error(site, error)
    }

    fn report_warning(&mut self, site: Site, warning: AdmissibilityWarning) {
        (**self).report_warning(site, warning)
    }
}

/// Collects findings in report order.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = (Site, &AdmissibilityError)> {
        self.entries.iter().filter_map(|diagnostic| match &diagnostic.finding {
            Finding::Error(error) => Some((diagnostic.site, error)),
            Finding::Warning(_) => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = (Site, &AdmissibilityWarning)> {
        self.entries.iter().filter_map(|diagnostic| match &diagnostic.finding {
            Finding::Warning(warning) => Some((diagnostic.site, warning)),
            Finding::Error(_) => None,
        })
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Append the findings of `other`.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl DiagnosticSink for Diagnostics {
    fn report_error(&mut self, site: Site, error: AdmissibilityError) {
        debug!("{}: {}", site, error);
        self.entries.push(Diagnostic {
            site,
            finding: Finding::Error(error),
        });
    }

    fn report_warning(&mut self, site: Site, warning: AdmissibilityWarning) {
        warn!("{}: {}", site, warning);
        self.entries.push(Diagnostic {
            site,
            finding: Finding::Warning(warning),
        });
    }
}

/// Discards every finding.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report_error(&mut self, _: Site, _: AdmissibilityError) {}
    fn report_warning(&mut self, _: Site, _: AdmissibilityWarning) {}
}
