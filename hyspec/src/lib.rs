//! Declaration facts and specification expressions.
//!
//! `hyspec` is the input model of the admissibility checks implemented in
//! `hyadmit`:
//! - [`decl`]: types, fields and methods with their ownership and purity
//!   annotations, queried through the [`decl::FactBase`] trait.
//! - [`expr`]: arena-allocated specification expressions.
//! - [`contract`]: invariants, model-field contracts and method contracts.
pub mod contract;
pub mod decl;
pub mod expr;

pub mod prelude {
    pub use crate::contract::{Invariant, MethodContract, ModelFieldContract};
    pub use crate::decl::{
        DeclTable, ElementsArg, FactBase, FieldDecl, FieldFlags, FieldId, MethodDecl, MethodFlags, MethodId,
        Ownership, Purity, RecursionTermination, TypeDecl, TypeFlags, TypeId, TypeKind,
    };
    pub use crate::expr::{
        BinaryOp, CastKind, Clause, Expr, ExprArena, ExprId, Literal, Member, QuantifierKind, UnaryOp, VariableKind,
    };
}
