//! Specification expressions
//!
//! Invariants, satisfies clauses and method contracts are small trees over fields,
//! methods and quantifiers. Nodes are stored in an [`ExprArena`] and referenced by
//! [`ExprId`]; children always have a smaller id than their parent, which keeps
//! the trees acyclic by construction.
//!
//! Example: `forall x in this.items : x.value > 0`
//! ```
//! use hyspec::decl::*;
//! use hyspec::expr::*;
//!
//! let mut decls = DeclTable::new();
//! let node = decls.add_type(TypeDecl::class("Node"));
//! let list = decls.add_type(TypeDecl::class("List"));
//! let array = decls.add_type(TypeDecl::array("Node[]", node));
//! let items = decls.add_field(FieldDecl::new("items", list).of_type(array).rep());
//! let value = decls.add_field(FieldDecl::new("value", node));
//!
//! let mut arena = ExprArena::new();
//! let this = arena.this();
//! let source = arena.field(this, items);
//! let x = arena.bound("x");
//! let x_value = arena.field(x, value);
//! let zero = arena.int(0);
//! let body = arena.binary(BinaryOp::Gt, x_value, zero);
//! let forall = arena.forall("x", source, body);
//!
//! assert_eq!(
//!     arena.fmt(forall, &decls).to_string(),
//!     "forall x in this.items : x.value > 0",
//! );
//! ```
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{Display, EnumIs, EnumTryAs};

use crate::decl::{FactBase, FieldId, MethodId, TypeId};

/// Handle to a node of an [`ExprArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExprId(pub u32);

impl std::fmt::Display for ExprId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Null,
    Str(String),
}

/// How a variable is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VariableKind {
    /// Introduced by a quantifier binding.
    Bound,
    /// Formal parameter of the specified method.
    Parameter,
    Local,
}

/// Member designated by a member binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, EnumTryAs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Member {
    Field(FieldId),
    Method(MethodId),
    /// A type used as a qualifier (e.g. `Math.Max`), never subject to ownership.
    Type(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CastKind {
    /// `(T) e`
    Type(TypeId),
    /// `(!) e`, the non-null cast.
    NonNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnaryOp {
    #[strum(to_string = "!")]
    Not,
    #[strum(to_string = "-")]
    Neg,
    #[strum(to_string = "old")]
    Old,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    #[strum(to_string = "==")]
    Eq,
    #[strum(to_string = "!=")]
    Ne,
    #[strum(to_string = "<")]
    Lt,
    #[strum(to_string = "<=")]
    Le,
    #[strum(to_string = ">")]
    Gt,
    #[strum(to_string = ">=")]
    Ge,
    #[strum(to_string = "&&")]
    And,
    #[strum(to_string = "||")]
    Or,
    #[strum(to_string = "==>")]
    Implies,
    #[strum(to_string = "+")]
    Add,
    #[strum(to_string = "-")]
    Sub,
    #[strum(to_string = "*")]
    Mul,
    #[strum(to_string = "/")]
    Div,
    #[strum(to_string = "%")]
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum QuantifierKind {
    Forall,
    Exists,
    Count,
    Sum,
    Min,
    Max,
}

/// One clause of a comprehension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Clause {
    /// `var in source`. A binding without source ranges over the variable's type.
    Binding { var: String, source: Option<ExprId> },
    /// `; condition`
    Filter(ExprId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumTryAs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    This,
    /// Receiver of an unqualified member access.
    ImplicitThis,
    /// `result` in a postcondition.
    Result,
    Literal(Literal),
    Variable {
        name: String,
        kind: VariableKind,
    },
    /// `target.member`, with no target for static members.
    Member {
        target: Option<ExprId>,
        member: Member,
    },
    Cast {
        kind: CastKind,
        operand: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// `object[indices...]`
    Index {
        object: ExprId,
        indices: Vec<ExprId>,
    },
    /// `callee(args...)` where the callee is a [`Expr::Member`] naming a method.
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    /// `new ty(args...)`
    Construct {
        ty: TypeId,
        args: Vec<ExprId>,
    },
    Quantifier {
        kind: QuantifierKind,
        clauses: Vec<Clause>,
        body: Vec<ExprId>,
    },
    /// Primitive numeric range `low .. high`.
    Range {
        low: ExprId,
        high: ExprId,
    },
}

impl Expr {
    /// Direct children in evaluation order.
    pub fn children(&self) -> SmallVec<ExprId, 4> {
        let mut children = SmallVec::new();
        match self {
            Expr::This | Expr::ImplicitThis | Expr::Result | Expr::Literal(_) | Expr::Variable { .. } => {}
            Expr::Member { target, .. } => children.extend(*target),
            Expr::Cast { operand, .. } | Expr::Unary { operand, .. } => children.push(*operand),
            Expr::Binary { lhs, rhs, .. } => {
                children.push(*lhs);
                children.push(*rhs);
            }
            Expr::Range { low, high } => {
                children.push(*low);
                children.push(*high);
            }
            Expr::Index { object, indices } => {
                children.push(*object);
                children.extend(indices.iter().copied());
            }
            Expr::Call { callee, args } => {
                children.push(*callee);
                children.extend(args.iter().copied());
            }
            Expr::Construct { args, .. } => children.extend(args.iter().copied()),
            Expr::Quantifier { clauses, body, .. } => {
                for clause in clauses {
                    match clause {
                        Clause::Binding { source, .. } => children.extend(*source),
                        Clause::Filter(condition) => children.push(*condition),
                    }
                }
                children.extend(body.iter().copied());
            }
        }
        children
    }
}

/// Outcome of [`ExprArena::scan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallAndResult {
    /// A call or an object construction occurs in the expression.
    pub has_call: bool,
    /// `result` occurs in the expression.
    pub has_result: bool,
}

/// Append-only storage of expression nodes.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExprArena {
    nodes: Vec<Expr>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr);
        id
    }

    /// Panics when `id` was not produced by this arena.
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.0 as usize]
    }

    pub fn try_get(&self, id: ExprId) -> Option<&Expr> {
        self.nodes.get(id.0 as usize)
    }

    pub fn this(&mut self) -> ExprId {
        self.alloc(Expr::This)
    }

    pub fn implicit_this(&mut self) -> ExprId {
        self.alloc(Expr::ImplicitThis)
    }

    pub fn result(&mut self) -> ExprId {
        self.alloc(Expr::Result)
    }

    pub fn bool(&mut self, value: bool) -> ExprId {
        self.alloc(Expr::Literal(Literal::Bool(value)))
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.alloc(Expr::Literal(Literal::Int(value)))
    }

    pub fn null(&mut self) -> ExprId {
        self.alloc(Expr::Literal(Literal::Null))
    }

    pub fn str(&mut self, value: impl Into<String>) -> ExprId {
        self.alloc(Expr::Literal(Literal::Str(value.into())))
    }

    fn variable(&mut self, name: impl Into<String>, kind: VariableKind) -> ExprId {
        self.alloc(Expr::Variable {
            name: name.into(),
            kind,
        })
    }

    /// Reference to a quantifier-bound variable.
    pub fn bound(&mut self, name: impl Into<String>) -> ExprId {
        self.variable(name, VariableKind::Bound)
    }

    pub fn param(&mut self, name: impl Into<String>) -> ExprId {
        self.variable(name, VariableKind::Parameter)
    }

    pub fn local(&mut self, name: impl Into<String>) -> ExprId {
        self.variable(name, VariableKind::Local)
    }

    pub fn member(&mut self, target: Option<ExprId>, member: Member) -> ExprId {
        self.alloc(Expr::Member { target, member })
    }

    /// `target.field`
    pub fn field(&mut self, target: ExprId, field: FieldId) -> ExprId {
        self.member(Some(target), Member::Field(field))
    }

    /// Static field access.
    pub fn static_field(&mut self, field: FieldId) -> ExprId {
        self.member(None, Member::Field(field))
    }

    /// `target.method(args...)`
    pub fn call(&mut self, target: ExprId, method: MethodId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let callee = self.member(Some(target), Member::Method(method));
        self.call_member(callee, args)
    }

    /// Call of a static method.
    pub fn static_call(&mut self, method: MethodId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let callee = self.member(None, Member::Method(method));
        self.call_member(callee, args)
    }

    /// Call through an already allocated callee binding.
    pub fn call_member(&mut self, callee: ExprId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        self.alloc(Expr::Call {
            callee,
            args: args.into_iter().collect(),
        })
    }

    pub fn cast(&mut self, ty: TypeId, operand: ExprId) -> ExprId {
        self.alloc(Expr::Cast {
            kind: CastKind::Type(ty),
            operand,
        })
    }

    pub fn non_null(&mut self, operand: ExprId) -> ExprId {
        self.alloc(Expr::Cast {
            kind: CastKind::NonNull,
            operand,
        })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.alloc(Expr::Unary { op, operand })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.alloc(Expr::Binary { op, lhs, rhs })
    }

    pub fn index(&mut self, object: ExprId, indices: impl IntoIterator<Item = ExprId>) -> ExprId {
        self.alloc(Expr::Index {
            object,
            indices: indices.into_iter().collect(),
        })
    }

    pub fn construct(&mut self, ty: TypeId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        self.alloc(Expr::Construct {
            ty,
            args: args.into_iter().collect(),
        })
    }

    pub fn range(&mut self, low: ExprId, high: ExprId) -> ExprId {
        self.alloc(Expr::Range { low, high })
    }

    pub fn quantifier(
        &mut self,
        kind: QuantifierKind,
        clauses: impl IntoIterator<Item = Clause>,
        body: impl IntoIterator<Item = ExprId>,
    ) -> ExprId {
        self.alloc(Expr::Quantifier {
            kind,
            clauses: clauses.into_iter().collect(),
            body: body.into_iter().collect(),
        })
    }

    /// `forall var in source : body`
    pub fn forall(&mut self, var: impl Into<String>, source: ExprId, body: ExprId) -> ExprId {
        let binding = Clause::Binding {
            var: var.into(),
            source: Some(source),
        };
        self.quantifier(QuantifierKind::Forall, [binding], [body])
    }

    /// Iterative pre-order traversal from `root`. Children of a node are visited only
    /// when `visit` returns `true` for it.
    pub fn walk(&self, root: ExprId, mut visit: impl FnMut(ExprId, &Expr) -> bool) {
        let mut stack: Vec<ExprId> = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.get(id);
            if visit(id, node) {
                stack.extend(node.children().into_iter().rev());
            }
        }
    }

    /// Whether `root` contains a call (or construction) and whether it mentions `result`.
    pub fn scan(&self, root: ExprId) -> CallAndResult {
        let mut found = CallAndResult::default();
        self.walk(root, |_, node| {
            match node {
                Expr::Call { .. } | Expr::Construct { .. } => found.has_call = true,
                Expr::Result => found.has_result = true,
                _ => {}
            }
            !(found.has_call && found.has_result)
        });
        found
    }

    /// Render `id` with member names resolved against `facts`.
    pub fn fmt<'a, F: FactBase + ?Sized>(&'a self, id: ExprId, facts: &'a F) -> impl std::fmt::Display + 'a {
        pub struct Fmt<'a, F: ?Sized> {
            arena: &'a ExprArena,
            id: ExprId,
            facts: &'a F,
        }

        impl<'a, F: FactBase + ?Sized> Fmt<'a, F> {
            fn child(&self, id: ExprId) -> Fmt<'a, F> {
                Fmt {
                    arena: self.arena,
                    id,
                    facts: self.facts,
                }
            }

            fn list(&self, f: &mut std::fmt::Formatter<'_>, ids: &[ExprId]) -> std::fmt::Result {
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", self.child(*id))?;
                }
                Ok(())
            }
        }

        impl<F: FactBase + ?Sized> std::fmt::Display for Fmt<'_, F> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.arena.get(self.id) {
                    Expr::This | Expr::ImplicitThis => write!(f, "this"),
                    Expr::Result => write!(f, "result"),
                    Expr::Literal(Literal::Bool(value)) => write!(f, "{}", value),
                    Expr::Literal(Literal::Int(value)) => write!(f, "{}", value),
                    Expr::Literal(Literal::Null) => write!(f, "null"),
                    Expr::Literal(Literal::Str(value)) => write!(f, "{:?}", value),
                    Expr::Variable { name, .. } => write!(f, "{}", name),
                    Expr::Member { target, member } => {
                        if let Some(target) = target {
                            write!(f, "{}.", self.child(*target))?;
                        }
                        match member {
                            Member::Field(field) => write!(f, "{}", self.facts.field(*field).name),
                            Member::Method(method) => write!(f, "{}", self.facts.method(*method).name),
                            Member::Type(ty) => write!(f, "{}", self.facts.type_decl(*ty).name),
                        }
                    }
                    Expr::Cast {
                        kind: CastKind::Type(ty),
                        operand,
                    } => write!(f, "(({}) {})", self.facts.type_decl(*ty).name, self.child(*operand)),
                    Expr::Cast {
                        kind: CastKind::NonNull,
                        operand,
                    } => write!(f, "((!) {})", self.child(*operand)),
                    Expr::Unary {
                        op: UnaryOp::Old,
                        operand,
                    } => write!(f, "old({})", self.child(*operand)),
                    Expr::Unary { op, operand } => write!(f, "{}{}", op, self.child(*operand)),
                    Expr::Binary { op, lhs, rhs } => {
                        write!(f, "{} {} {}", self.child(*lhs), op, self.child(*rhs))
                    }
                    Expr::Index { object, indices } => {
                        write!(f, "{}[", self.child(*object))?;
                        self.list(f, indices)?;
                        write!(f, "]")
                    }
                    Expr::Call { callee, args } => {
                        write!(f, "{}(", self.child(*callee))?;
                        self.list(f, args)?;
                        write!(f, ")")
                    }
                    Expr::Construct { ty, args } => {
                        write!(f, "new {}(", self.facts.type_decl(*ty).name)?;
                        self.list(f, args)?;
                        write!(f, ")")
                    }
                    Expr::Range { low, high } => write!(f, "{} .. {}", self.child(*low), self.child(*high)),
                    Expr::Quantifier { kind, clauses, body } => {
                        write!(f, "{}", kind)?;
                        for (i, clause) in clauses.iter().enumerate() {
                            match clause {
                                Clause::Binding { var, source: Some(source) } => {
                                    write!(f, "{}{} in {}", if i > 0 { ", " } else { " " }, var, self.child(*source))?
                                }
                                Clause::Binding { var, source: None } => {
                                    write!(f, "{}{}", if i > 0 { ", " } else { " " }, var)?
                                }
                                Clause::Filter(condition) => write!(f, "; {}", self.child(*condition))?,
                            }
                        }
                        write!(f, " : ")?;
                        self.list(f, body)
                    }
                }
            }
        }

        Fmt { arena: self, id, facts }
    }
}
