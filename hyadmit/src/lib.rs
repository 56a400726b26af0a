//! Ownership-based admissibility checking.
//!
//! A specification (object invariant, model-field contract, method pre- or
//! postcondition) is admissible when every state it reads is owned by the entity
//! it is attached to, so that code outside the owner's control cannot invalidate
//! it once proven. This crate implements the checks over the facts and
//! expressions modelled by [`hyspec`]:
//! - [`checker`] and [`calls`]: the expression walk classifying access chains as
//!   staying inside the owned cone or leaving it, together with the purity and
//!   well-foundedness rules for calls made from method specifications,
//! - [`effects`]: the same ownership discipline replayed over inferred
//!   read-effects,
//! - [`driver`]: runs every check over a whole [`driver::SpecModule`],
//! - [`diagnostics`]: what the checks report and where it goes.
//!
//! The library never installs a logger; it logs through the `log` facade.
pub mod calls;
pub mod checker;
pub mod conf;
pub mod diagnostics;
pub mod driver;
pub mod effects;
pub mod error;
pub mod magic;
pub mod state;

pub mod prelude {
    pub use crate::calls::Measure;
    pub use crate::checker::{AdmissibilityChecker, DeclaringContext};
    pub use crate::conf::AdmissibilityOptions;
    pub use crate::diagnostics::{
        AdmissibilityError, AdmissibilityErrorKind, AdmissibilityWarning, Category, Diagnostic, DiagnosticSink,
        Diagnostics, Finding, NullSink, ReportMode, Site,
    };
    pub use crate::driver::{Declaration, Outcome, SpecModule, VerificationReport, Verifier};
    pub use crate::effects::{ChainField, EffectRoot, ReadEffect, ReadEffectChecker};
    pub use crate::error::{AdmitError, AdmitResult};
}
