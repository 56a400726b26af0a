#![allow(dead_code)]

use hyadmit::prelude::*;
use hyspec::prelude::*;

/// A small library model.
///
/// `Shelf` owns its `books` (ElementsRep) and its `catalog` (Rep), shares
/// `neighbour` (Peer) and `shared` books (Peer, ElementsPeer). `Bookcase` derives
/// from `Shelf`.
pub struct Library {
    pub module: SpecModule,

    pub int: TypeId,
    pub book: TypeId,
    pub books_array: TypeId,
    pub shelf: TypeId,
    pub bookcase: TypeId,
    pub catalog: TypeId,
    pub math: TypeId,

    pub books: FieldId,
    pub loose: FieldId,
    pub shared: FieldId,
    pub catalog_field: FieldId,
    pub neighbour: FieldId,
    pub count: FieldId,
    pub label: FieldId,
    pub tag: FieldId,
    pub total: FieldId,
    pub secret: FieldId,

    pub doors: FieldId,

    pub shelved: FieldId,
    pub size: FieldId,

    pub pages: FieldId,
    pub cover: FieldId,
    pub publisher: FieldId,

    pub max: MethodId,
    pub abs: MethodId,
}

impl Library {
    pub fn new() -> Self {
        let mut module = SpecModule::new();
        let decls = &mut module.decls;

        let int = decls.add_type(TypeDecl::primitive("int"));
        let book = decls.add_type(TypeDecl::class("Book"));
        let books_array = decls.add_type(TypeDecl::array("Book[]", book));
        let shelf = decls.add_type(TypeDecl::class("Shelf"));
        let bookcase = decls.add_type(TypeDecl::class("Bookcase").extends(shelf));
        let catalog = decls.add_type(TypeDecl::class("Catalog"));
        let math = decls.add_type(TypeDecl::class("Math"));

        let books = decls.add_field(
            FieldDecl::new("books", shelf)
                .of_type(books_array)
                .rep()
                .elements_rep(ElementsArg::All),
        );
        let loose = decls.add_field(
            FieldDecl::new("loose", shelf)
                .of_type(books_array)
                .rep()
                .elements_peer(ElementsArg::All),
        );
        let shared = decls.add_field(
            FieldDecl::new("shared", shelf)
                .of_type(books_array)
                .peer()
                .elements_peer(ElementsArg::All),
        );
        let catalog_field = decls.add_field(FieldDecl::new("catalog", shelf).of_type(catalog).rep());
        let neighbour = decls.add_field(FieldDecl::new("neighbour", shelf).of_type(shelf).peer());
        let count = decls.add_field(FieldDecl::new("count", shelf).of_type(int));
        let label = decls.add_field(FieldDecl::new("label", shelf).of_type(int).readonly());
        let tag = decls.add_field(FieldDecl::new("tag", shelf).of_type(int).dependent_of(shelf));
        let total = decls.add_field(FieldDecl::new("total", shelf).of_type(int).additive());
        let secret = decls.add_field(FieldDecl::new("secret", shelf).of_type(int).private());

        let doors = decls.add_field(FieldDecl::new("doors", bookcase).of_type(int));

        let shelved = decls.add_field(
            FieldDecl::new("shelved", catalog)
                .of_type(books_array)
                .rep()
                .elements_peer(ElementsArg::All),
        );
        let size = decls.add_field(FieldDecl::new("size", catalog).of_type(int));

        let pages = decls.add_field(FieldDecl::new("pages", book).of_type(int));
        let cover = decls.add_field(FieldDecl::new("cover", book).of_type(book).rep());
        let publisher = decls.add_field(FieldDecl::new("publisher", book).of_type(shelf));

        let max = decls.add_method(MethodDecl::new("Max", math).static_());
        let abs = decls.add_method(MethodDecl::new("Abs", math).static_().state_independent());

        Self {
            module,
            int,
            book,
            books_array,
            shelf,
            bookcase,
            catalog,
            math,
            books,
            loose,
            shared,
            catalog_field,
            neighbour,
            count,
            label,
            tag,
            total,
            secret,
            doors,
            shelved,
            size,
            pages,
            cover,
            publisher,
            max,
            abs,
        }
    }

    pub fn arena(&mut self) -> &mut ExprArena {
        &mut self.module.arena
    }

    pub fn decls(&mut self) -> &mut DeclTable {
        &mut self.module.decls
    }

    /// `root.f0.f1...`
    pub fn chain(&mut self, root: ExprId, fields: &[FieldId]) -> ExprId {
        fields
            .iter()
            .fold(root, |target, &field| self.module.arena.field(target, field))
    }

    /// `this.f0.f1...`
    pub fn this_chain(&mut self, fields: &[FieldId]) -> ExprId {
        let this = self.module.arena.this();
        self.chain(this, fields)
    }

    /// `lhs > 0`
    pub fn positive(&mut self, lhs: ExprId) -> ExprId {
        let zero = self.module.arena.int(0);
        self.module.arena.binary(BinaryOp::Gt, lhs, zero)
    }

    pub fn check_invariant(&self, declaring_type: TypeId, condition: ExprId) -> Diagnostics {
        let mut checker = AdmissibilityChecker::new(&self.module.arena, &self.module.decls, Diagnostics::new());
        checker.check_invariant(&Invariant {
            declaring_type,
            condition,
        });
        checker.into_sink()
    }

    pub fn check_model_field(&self, contract: &ModelFieldContract) -> Diagnostics {
        let mut checker = AdmissibilityChecker::new(&self.module.arena, &self.module.decls, Diagnostics::new());
        checker.check_model_field_satisfies(contract);
        checker.into_sink()
    }

    pub fn check_method_spec(&self, expr: ExprId, method: MethodId) -> Diagnostics {
        let mut checker = AdmissibilityChecker::new(&self.module.arena, &self.module.decls, Diagnostics::new());
        checker.check_method_spec(expr, method, false, false);
        checker.into_sink()
    }
}

/// Kinds of the errors collected in `diagnostics`, in report order.
pub fn error_kinds(diagnostics: &Diagnostics) -> Vec<AdmissibilityErrorKind> {
    diagnostics.errors().map(|(_, error)| error.kind()).collect()
}
