//! Declaration facts
//!
//! This module holds the attribute model the admissibility checks query: types,
//! fields and methods together with their ownership annotations (`Rep`, `Peer`,
//! `ElementsRep`, `ElementsPeer`, `Additive`, ...), purity levels and recursion
//! termination bounds.
//!
//! Facts are consumed through the [`FactBase`] trait. The trait exposes a small
//! set of required accessors and derives every predicate the checkers need from
//! them, so an embedder only has to map its own symbol tables onto
//! [`TypeDecl`], [`FieldDecl`] and [`MethodDecl`]. [`DeclTable`] is the
//! in-memory implementation used by tests and by the driver.
use std::collections::{BTreeMap, BTreeSet};

use bitflags::bitflags;
use either::Either;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{Display, EnumIs, EnumIter};

use crate::contract::MethodContract;

macro_rules! declare_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub u32);

        impl $name {
            /// Position of the declaration inside its table.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

declare_id!(
    /// Stable reference to a [`TypeDecl`] registered in a [`DeclTable`].
    TypeId,
    "%type_"
);
declare_id!(
    /// Stable reference to a [`FieldDecl`] registered in a [`DeclTable`].
    FieldId,
    "%field_"
);
declare_id!(
    /// Stable reference to a [`MethodDecl`] registered in a [`DeclTable`].
    MethodId,
    "%method_"
);

/// Full names of the methodology guard queries. They may not appear in model-field
/// satisfies clauses nor in method specifications.
pub const METHODOLOGY_METHODS: &[&str] = &[
    "Guard.IsConsistent",
    "Guard.IsPeerConsistent",
    "Guard.get_IsExposable",
    "Guard.FrameIsExposable",
    "Guard.get_IsExposed",
    "Guard.FrameIsExposed",
    "Guard.get_IsValid",
    "Guard.FrameIsValid",
    "Guard.get_IsPrevalid",
    "Guard.FrameIsPrevalid",
];

/// Full name of the static string equality overload. Its arguments are checked even
/// though the method itself is static.
pub const STRING_EQUALITY: &str = "String.Equals(String,String)";

/// Purity level of a method.
///
/// The levels form a chain from the least to the most restrictive one:
/// `None < Pure < Confined < StateIndependent`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumIter, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Purity {
    /// No purity annotation, the method may have arbitrary side-effects.
    #[default]
    #[strum(to_string = "impure")]
    None,

    /// The method does not modify pre-existing state.
    Pure,

    /// The method only reads state of its receiver's owned cone.
    Confined,

    /// The method does not depend on mutable heap state at all.
    StateIndependent,
}

impl Purity {
    /// True when the method carries any purity annotation.
    pub fn is_specified(self) -> bool {
        !self.is_none()
    }

    /// True for the levels whose inferred read-effects are checked against the
    /// ownership discipline.
    pub fn admits_read_effect_check(self) -> bool {
        matches!(self, Purity::Confined | Purity::StateIndependent)
    }
}

/// Ownership annotation of a field or of the result of a method.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Ownership {
    /// Not annotated.
    #[default]
    None,

    /// The target shares the owner of the current object.
    Peer,

    /// The target is owned by the current object.
    Rep,
}

impl Ownership {
    /// Rep or Peer.
    pub fn is_owned(self) -> bool {
        !self.is_none()
    }
}

/// Argument of an `ElementsRep`/`ElementsPeer` annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementsArg {
    /// No argument: every applicable position of the field type.
    All,

    /// A single type-argument position of a generic collection.
    Position(u32),
}

/// Position of an element slot inside a type. `-1` stands for the element of an
/// array, non-negative values are generic type-argument indices.
pub type ElementPosition = i32;

/// Position designating the element of an array type.
pub const ARRAY_ELEMENT: ElementPosition = -1;

/// Shape of a type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Struct,
    Enum,
    Primitive,
    Array,
    /// Primitive numeric range (e.g. `0 .. n`), never subject to ownership.
    Range,
}

impl TypeKind {
    /// Value types are copied rather than referenced and cannot be owned.
    pub fn is_value_type(self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::Enum | TypeKind::Primitive | TypeKind::Range)
    }

    /// Reference types may carry ownership.
    pub fn is_reference_type(self) -> bool {
        matches!(self, TypeKind::Class | TypeKind::Interface | TypeKind::Array)
    }
}

bitflags! {
    /// Attributes attached to a type declaration.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct TypeFlags: u8 {
        /// Instances never change after construction.
        const IMMUTABLE = 1 << 0;

        /// The type is a collection enumerable through its item getter.
        const ENUMERABLE = 1 << 1;

        /// The type is visible outside its declaring assembly.
        const VISIBLE_OUTSIDE_ASSEMBLY = 1 << 2;
    }
}

bitflags! {
    /// Attributes attached to a field declaration.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct FieldFlags: u8 {
        /// Init-only field.
        const READONLY = 1 << 0;

        /// Model field (a specification-only abstraction).
        const MODEL = 1 << 1;

        /// Private field.
        const PRIVATE = 1 << 2;

        /// The field is visible outside its declaring assembly.
        const VISIBLE_OUTSIDE_ASSEMBLY = 1 << 3;

        /// Invariants of subtypes may depend on the field.
        const ADDITIVE = 1 << 4;
    }
}

bitflags! {
    /// Attributes attached to a method declaration.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct MethodFlags: u16 {
        const STATIC = 1 << 0;
        const CONSTRUCTOR = 1 << 1;

        /// The method yields an element of the collection it is called on.
        const ELEMENT = 1 << 2;

        /// The method yields a collection of elements of the collection it is called on.
        const ELEMENT_COLLECTION = 1 << 3;

        /// The indexer getter of a collection type.
        const ITEM_GETTER = 1 << 4;

        /// Compiler-synthesized helper (e.g. non-null cast), transparent to the checks.
        const BUILTIN = 1 << 5;

        /// Methodology guard query, see [`METHODOLOGY_METHODS`].
        const METHODOLOGY = 1 << 6;

        const VISIBLE_OUTSIDE_ASSEMBLY = 1 << 7;
    }
}

/// Declared bound of a `RecursionTermination` annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RecursionTermination {
    /// Explicit bound. An annotation without argument is `Bound(0)`.
    Bound(u32),

    /// The annotation argument is not a literal bound.
    Unbounded,
}

/// A type declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypeDecl {
    /// Fully qualified name.
    pub name: String,
    pub kind: TypeKind,
    pub flags: TypeFlags,
    /// Direct base class, if any.
    pub base: Option<TypeId>,
    /// Directly implemented interfaces.
    pub interfaces: Vec<TypeId>,
    /// Type arguments of a generic instantiation, or the element type of an array.
    pub arguments: Vec<TypeId>,
}

impl TypeDecl {
    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Struct)
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Primitive)
    }

    pub fn range(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Range)
    }

    /// Array of `element`.
    pub fn array(name: impl Into<String>, element: TypeId) -> Self {
        Self {
            arguments: vec![element],
            ..Self::with_kind(name, TypeKind::Array)
        }
    }

    pub fn extends(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    pub fn implements(mut self, interface: TypeId) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Generic instantiation over `arguments`.
    pub fn instantiate(mut self, arguments: impl IntoIterator<Item = TypeId>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    pub fn immutable(mut self) -> Self {
        self.flags |= TypeFlags::IMMUTABLE;
        self
    }

    pub fn enumerable(mut self) -> Self {
        self.flags |= TypeFlags::ENUMERABLE;
        self
    }

    pub fn public(mut self) -> Self {
        self.flags |= TypeFlags::VISIBLE_OUTSIDE_ASSEMBLY;
        self
    }
}

/// A field declaration together with its ownership annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldDecl {
    pub name: String,
    pub declaring_type: TypeId,
    /// Declared type of the field. `None` when unresolved.
    pub ty: Option<TypeId>,
    pub ownership: Ownership,
    /// Arguments of every `ElementsRep` annotation on the field.
    pub elements_rep: Vec<ElementsArg>,
    /// Arguments of every `ElementsPeer` annotation on the field.
    pub elements_peer: Vec<ElementsArg>,
    pub flags: FieldFlags,
    /// Types named by the field's dependency annotations. Invariants of these types
    /// may read the field through visibility-based access.
    pub dependents: Vec<TypeId>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, declaring_type: TypeId) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            ty: None,
            ownership: Ownership::None,
            elements_rep: Vec::new(),
            elements_peer: Vec::new(),
            flags: FieldFlags::empty(),
            dependents: Vec::new(),
        }
    }

    pub fn of_type(mut self, ty: TypeId) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn rep(mut self) -> Self {
        self.ownership = Ownership::Rep;
        self
    }

    pub fn peer(mut self) -> Self {
        self.ownership = Ownership::Peer;
        self
    }

    pub fn elements_rep(mut self, arg: ElementsArg) -> Self {
        self.elements_rep.push(arg);
        self
    }

    pub fn elements_peer(mut self, arg: ElementsArg) -> Self {
        self.elements_peer.push(arg);
        self
    }

    pub fn readonly(mut self) -> Self {
        self.flags |= FieldFlags::READONLY;
        self
    }

    pub fn model(mut self) -> Self {
        self.flags |= FieldFlags::MODEL;
        self
    }

    pub fn private(mut self) -> Self {
        self.flags |= FieldFlags::PRIVATE;
        self
    }

    pub fn public(mut self) -> Self {
        self.flags |= FieldFlags::VISIBLE_OUTSIDE_ASSEMBLY;
        self
    }

    pub fn additive(mut self) -> Self {
        self.flags |= FieldFlags::ADDITIVE;
        self
    }

    /// Allow invariants of `ty` to depend on this field.
    pub fn dependent_of(mut self, ty: TypeId) -> Self {
        self.dependents.push(ty);
        self
    }
}

/// A method declaration together with its purity and ownership annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MethodDecl {
    pub name: String,
    /// Qualified name `Type.method(...)`. Filled from the declaring type name when
    /// left empty at registration.
    pub full_name: String,
    pub declaring_type: TypeId,
    pub purity: Purity,
    /// Ownership of the returned object.
    pub ownership: Ownership,
    pub flags: MethodFlags,
    pub recursion_termination: Option<RecursionTermination>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, declaring_type: TypeId) -> Self {
        Self {
            name: name.into(),
            full_name: String::new(),
            declaring_type,
            purity: Purity::None,
            ownership: Ownership::None,
            flags: MethodFlags::empty(),
            recursion_termination: None,
        }
    }

    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn purity(mut self, purity: Purity) -> Self {
        self.purity = purity;
        self
    }

    pub fn pure(self) -> Self {
        self.purity(Purity::Pure)
    }

    pub fn confined(self) -> Self {
        self.purity(Purity::Confined)
    }

    pub fn state_independent(self) -> Self {
        self.purity(Purity::StateIndependent)
    }

    pub fn rep(mut self) -> Self {
        self.ownership = Ownership::Rep;
        self
    }

    pub fn peer(mut self) -> Self {
        self.ownership = Ownership::Peer;
        self
    }

    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn static_(self) -> Self {
        self.with_flags(MethodFlags::STATIC)
    }

    pub fn recursion_termination(mut self, bound: u32) -> Self {
        self.recursion_termination = Some(RecursionTermination::Bound(bound));
        self
    }
}

/// Queryable fact base over declarations.
///
/// Implementors provide the four accessors; every ownership predicate used by the
/// checkers is derived from them. Identifiers handed to the accessors are always
/// ones the implementor produced, so lookups are allowed to panic on foreign ids.
pub trait FactBase {
    fn type_decl(&self, id: TypeId) -> &TypeDecl;
    fn field(&self, id: FieldId) -> &FieldDecl;
    fn method(&self, id: MethodId) -> &MethodDecl;

    /// Contract of a method, if any was registered.
    fn method_contract(&self, id: MethodId) -> Option<&MethodContract>;

    /// `sub` is `sup` or transitively derives from / implements it.
    fn is_assignable_to(&self, sub: TypeId, sup: TypeId) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack: SmallVec<TypeId, 8> = SmallVec::new();
        stack.push(sub);

        while let Some(current) = stack.pop() {
            if current == sup {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            let decl = self.type_decl(current);
            stack.extend(decl.base);
            stack.extend(decl.interfaces.iter().copied());
        }
        false
    }

    fn type_is_immutable(&self, ty: TypeId) -> bool {
        self.type_decl(ty).flags.contains(TypeFlags::IMMUTABLE)
    }

    fn type_is_value_type(&self, ty: TypeId) -> bool {
        self.type_decl(ty).kind.is_value_type()
    }

    /// Enumerable collections expose their elements through the item getter. The
    /// property is inherited.
    fn type_is_enumerable(&self, ty: TypeId) -> bool {
        let mut current = Some(ty);
        while let Some(id) = current {
            let decl = self.type_decl(id);
            if decl.flags.contains(TypeFlags::ENUMERABLE)
                || decl
                    .interfaces
                    .iter()
                    .any(|&iface| self.type_is_enumerable(iface))
            {
                return true;
            }
            current = decl.base;
        }
        false
    }

    /// Every position of `ty` that may carry an elements annotation: the array
    /// element, or each generic argument that is a reference type.
    fn element_positions(&self, ty: TypeId) -> SmallVec<ElementPosition, 4> {
        let decl = self.type_decl(ty);
        if decl.kind.is_array() {
            return SmallVec::from_iter([ARRAY_ELEMENT]);
        }
        decl.arguments
            .iter()
            .enumerate()
            .filter(|&(_, &arg)| self.type_decl(arg).kind.is_reference_type())
            .map(|(position, _)| position as ElementPosition)
            .collect()
    }

    fn field_is_rep(&self, f: FieldId) -> bool {
        self.field(f).ownership.is_rep()
    }

    fn field_is_peer(&self, f: FieldId) -> bool {
        self.field(f).ownership.is_peer()
    }

    fn field_is_owned(&self, f: FieldId) -> bool {
        self.field(f).ownership.is_owned()
    }

    fn field_has_flag(&self, f: FieldId, flag: FieldFlags) -> bool {
        self.field(f).flags.contains(flag)
    }

    fn field_is_additive(&self, f: FieldId) -> bool {
        self.field_has_flag(f, FieldFlags::ADDITIVE)
    }

    fn field_is_model(&self, f: FieldId) -> bool {
        self.field_has_flag(f, FieldFlags::MODEL)
    }

    fn field_is_readonly(&self, f: FieldId) -> bool {
        self.field_has_flag(f, FieldFlags::READONLY)
    }

    /// The declared type of the field is a value type.
    fn field_type_is_value_type(&self, f: FieldId) -> bool {
        self.field(f).ty.is_some_and(|ty| self.type_is_value_type(ty))
    }

    /// The declared type of the field is a struct (value types such as enums and
    /// primitives excluded).
    fn field_type_is_struct(&self, f: FieldId) -> bool {
        self.field(f)
            .ty
            .is_some_and(|ty| self.type_decl(ty).kind.is_struct())
    }

    fn field_declaring_type_is_immutable(&self, f: FieldId) -> bool {
        self.type_is_immutable(self.field(f).declaring_type)
    }

    fn field_declaring_type_is_value_type(&self, f: FieldId) -> bool {
        self.type_is_value_type(self.field(f).declaring_type)
    }

    fn field_is_elements_rep(&self, f: FieldId) -> bool {
        !self.field(f).elements_rep.is_empty()
    }

    fn field_is_elements_peer(&self, f: FieldId) -> bool {
        !self.field(f).elements_peer.is_empty()
    }

    fn field_is_elements_rep_or_peer(&self, f: FieldId) -> bool {
        self.field_is_elements_rep(f) || self.field_is_elements_peer(f)
    }

    /// Positions of `f`'s type whose elements are Rep.
    fn field_elements_rep_positions(&self, f: FieldId) -> SmallVec<ElementPosition, 4> {
        resolve_elements_positions(self, f, &self.field(f).elements_rep)
    }

    /// Positions of `f`'s type whose elements are Peer.
    fn field_elements_peer_positions(&self, f: FieldId) -> SmallVec<ElementPosition, 4> {
        resolve_elements_positions(self, f, &self.field(f).elements_peer)
    }

    /// Visibility-based access: `f` declares a dependency on `ty`.
    fn field_is_dependent_of(&self, f: FieldId, ty: TypeId) -> bool {
        self.field(f).dependents.contains(&ty)
    }

    /// A global read of `f` is harmless: the field is private, or readonly with an
    /// immutable type.
    fn global_field_is_private_or_immutable(&self, f: FieldId) -> bool {
        let field = self.field(f);
        if field.flags.contains(FieldFlags::PRIVATE) {
            return true;
        }
        field.flags.contains(FieldFlags::READONLY)
            && field.ty.is_some_and(|ty| self.type_is_immutable(ty))
    }

    fn method_purity(&self, m: MethodId) -> Purity {
        self.method(m).purity
    }

    fn method_has_flag(&self, m: MethodId, flag: MethodFlags) -> bool {
        self.method(m).flags.contains(flag)
    }

    fn method_is_rep(&self, m: MethodId) -> bool {
        self.method(m).ownership.is_rep()
    }

    fn method_is_owned(&self, m: MethodId) -> bool {
        self.method(m).ownership.is_owned()
    }

    fn method_is_element_collection(&self, m: MethodId) -> bool {
        self.method_has_flag(m, MethodFlags::ELEMENT_COLLECTION)
    }

    /// The method is marked `Element` or `ElementCollection`, or is the item getter
    /// of an enumerable collection.
    fn method_is_element_or_collection(&self, m: MethodId) -> bool {
        let method = self.method(m);
        if method
            .flags
            .intersects(MethodFlags::ELEMENT | MethodFlags::ELEMENT_COLLECTION)
        {
            return true;
        }
        method.flags.contains(MethodFlags::ITEM_GETTER)
            && self.type_is_enumerable(method.declaring_type)
    }
}

fn resolve_elements_positions<F: FactBase + ?Sized>(
    facts: &F,
    f: FieldId,
    args: &[ElementsArg],
) -> SmallVec<ElementPosition, 4> {
    let mut positions = SmallVec::new();
    for arg in args {
        match arg {
            ElementsArg::All => {
                return match facts.field(f).ty {
                    Some(ty) => facts.element_positions(ty),
                    None => SmallVec::new(),
                };
            }
            ElementsArg::Position(index) => positions.push(*index as ElementPosition),
        }
    }
    positions
}

/// In-memory [`FactBase`].
///
/// Declarations are appended and addressed by their index; identifiers therefore
/// stay valid for the lifetime of the table.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeclTable {
    types: Vec<TypeDecl>,
    fields: Vec<FieldDecl>,
    methods: Vec<MethodDecl>,
    contracts: BTreeMap<MethodId, MethodContract>,
}

impl DeclTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, decl: TypeDecl) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(decl);
        id
    }

    pub fn add_field(&mut self, decl: FieldDecl) -> FieldId {
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(decl);
        id
    }

    /// Register a method. An empty full name is derived from the declaring type,
    /// and methodology guard queries are flagged.
    pub fn add_method(&mut self, mut decl: MethodDecl) -> MethodId {
        if decl.full_name.is_empty() {
            decl.full_name = format!("{}.{}", self.types[decl.declaring_type.index()].name, decl.name);
        }
        if METHODOLOGY_METHODS.contains(&decl.full_name.as_str()) {
            decl.flags |= MethodFlags::METHODOLOGY;
        }
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(decl);
        id
    }

    /// Attach (or replace) the contract of `method`.
    pub fn set_contract(&mut self, method: MethodId, contract: MethodContract) -> Option<MethodContract> {
        self.contracts.insert(method, contract)
    }

    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|decl| decl.name == name)
            .map(|index| TypeId(index as u32))
    }

    /// Look up a field by its declaring type and name.
    pub fn find_field(&self, declaring_type: TypeId, name: &str) -> Option<FieldId> {
        self.fields
            .iter()
            .position(|decl| decl.declaring_type == declaring_type && decl.name == name)
            .map(|index| FieldId(index as u32))
    }

    pub fn find_method(&self, full_name: &str) -> Option<MethodId> {
        self.methods
            .iter()
            .position(|decl| decl.full_name == full_name)
            .map(|index| MethodId(index as u32))
    }

    pub fn try_field(&self, id: FieldId) -> Option<&FieldDecl> {
        self.fields.get(id.index())
    }

    pub fn try_method(&self, id: MethodId) -> Option<&MethodDecl> {
        self.methods.get(id.index())
    }

    /// Fields declared by `ty` itself (inherited ones excluded).
    pub fn fields_of(&self, ty: TypeId) -> impl Iterator<Item = (FieldId, &FieldDecl)> {
        self.fields
            .iter()
            .enumerate()
            .filter(move |(_, decl)| decl.declaring_type == ty)
            .map(|(index, decl)| (FieldId(index as u32), decl))
    }

    /// Methods carrying the given purity level, or every method when `purity` is `None`.
    pub fn methods_with(&self, purity: Option<Purity>) -> impl Iterator<Item = (MethodId, &MethodDecl)> {
        let all = self
            .methods
            .iter()
            .enumerate()
            .map(|(index, decl)| (MethodId(index as u32), decl));
        match purity {
            Some(purity) => Either::Left(all.filter(move |(_, decl)| decl.purity == purity)),
            None => Either::Right(all),
        }
    }

    pub fn contracts(&self) -> impl Iterator<Item = (MethodId, &MethodContract)> {
        self.contracts.iter().map(|(id, contract)| (*id, contract))
    }
}

impl FactBase for DeclTable {
    fn type_decl(&self, id: TypeId) -> &TypeDecl {
        &self.types[id.index()]
    }

    fn field(&self, id: FieldId) -> &FieldDecl {
        &self.fields[id.index()]
    }

    fn method(&self, id: MethodId) -> &MethodDecl {
        &self.methods[id.index()]
    }

    fn method_contract(&self, id: MethodId) -> Option<&MethodContract> {
        self.contracts.get(&id)
    }
}
