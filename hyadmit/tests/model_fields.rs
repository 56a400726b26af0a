mod common;

use common::{Library, error_kinds};
use hyadmit::prelude::*;
use hyspec::prelude::*;

struct Shapes {
    lib: Library,
    sides: FieldId,
    area: FieldId,
    volume: FieldId,
    width: FieldId,
    height: FieldId,
    hidden: FieldId,
    get_area: MethodId,
}

/// `Square` extends `Shape`. `area` is a public model field, `volume` an internal one.
fn shapes() -> Shapes {
    let mut lib = Library::new();
    let decls = lib.decls();
    let int = decls.find_type("int").unwrap();
    let shape = decls.add_type(TypeDecl::class("Shape").public());
    let square = decls.add_type(TypeDecl::class("Square").extends(shape).public());

    let sides = decls.add_field(FieldDecl::new("sides", shape).of_type(int).public());
    let area = decls.add_field(FieldDecl::new("area", square).of_type(int).model().public());
    let volume = decls.add_field(FieldDecl::new("volume", square).of_type(int).model());
    let width = decls.add_field(FieldDecl::new("width", square).of_type(int));
    let height = decls.add_field(FieldDecl::new("height", square).of_type(int).public());
    let hidden = decls.add_field(FieldDecl::new("hidden", square).of_type(int).private().public());
    let get_area = decls.add_method(MethodDecl::new("get_Area", square).pure());

    Shapes {
        lib,
        sides,
        area,
        volume,
        width,
        height,
        hidden,
        get_area,
    }
}

impl Shapes {
    fn clause(&mut self, field: FieldId) -> ExprId {
        let access = self.lib.this_chain(&[field]);
        self.lib.positive(access)
    }
}

#[test]
fn inherited_non_additive_field_is_rejected() {
    let mut shapes = shapes();
    let clause = shapes.clause(shapes.sides);
    let contract = ModelFieldContract::new(shapes.area).satisfies(clause);

    assert_eq!(
        error_kinds(&shapes.lib.check_model_field(&contract)),
        [AdmissibilityErrorKind::FirstAccessOnNonAdditiveField]
    );
}

#[test]
fn overridable_public_model_field_needs_public_fields() {
    let mut shapes = shapes();
    let width = shapes.clause(shapes.width);
    let height = shapes.clause(shapes.height);

    let contract = ModelFieldContract::new(shapes.area).satisfies(width);
    let diagnostics = shapes.lib.check_model_field(&contract);
    assert_eq!(
        diagnostics.errors().map(|(_, error)| error.clone()).collect::<Vec<_>>(),
        [AdmissibilityError::InternalFieldInOverridableModelField {
            field: "width".into(),
            model_field: "area".into(),
            declaring_type: "Square".into(),
        }]
    );

    let contract = ModelFieldContract::new(shapes.area).satisfies(height);
    assert!(shapes.lib.check_model_field(&contract).is_empty());

    let contract = ModelFieldContract::new(shapes.area).sealed().satisfies(width);
    assert!(shapes.lib.check_model_field(&contract).is_empty());
}

#[test]
fn getter_names_the_overridable_member() {
    let mut shapes = shapes();
    let width = shapes.clause(shapes.width);
    let contract = ModelFieldContract::new(shapes.area)
        .getter(shapes.get_area)
        .satisfies(width);

    let diagnostics = shapes.lib.check_model_field(&contract);
    let (_, error) = diagnostics.errors().next().unwrap();
    assert!(error.to_string().contains("'get_Area' of 'Square'"), "{}", error);
}

#[test]
fn private_fields_are_rejected_for_internal_model_fields_too() {
    let mut shapes = shapes();
    let hidden = shapes.clause(shapes.hidden);
    let width = shapes.clause(shapes.width);

    let contract = ModelFieldContract::new(shapes.volume).satisfies(hidden);
    assert_eq!(
        error_kinds(&shapes.lib.check_model_field(&contract)),
        [AdmissibilityErrorKind::InternalFieldInOverridableModelField]
    );

    let contract = ModelFieldContract::new(shapes.volume).satisfies(width);
    assert!(shapes.lib.check_model_field(&contract).is_empty());
}

#[test]
fn every_clause_is_checked_on_its_own() {
    let mut shapes = shapes();
    let first = shapes.clause(shapes.sides);
    let second = shapes.clause(shapes.sides);
    let fine = shapes.clause(shapes.height);
    let contract = ModelFieldContract::new(shapes.area)
        .satisfies(first)
        .satisfies(fine)
        .satisfies(second);

    assert_eq!(shapes.lib.check_model_field(&contract).error_count(), 2);
}

#[test]
fn methodology_calls_are_disallowed() {
    let mut shapes = shapes();
    let guard = shapes.lib.decls().add_type(TypeDecl::class("Guard"));
    let is_consistent = shapes.lib.decls().add_method(MethodDecl::new("IsConsistent", guard));
    let this = shapes.lib.arena().this();
    let call = shapes.lib.arena().call(this, is_consistent, []);
    let contract = ModelFieldContract::new(shapes.volume).satisfies(call);

    let diagnostics = shapes.lib.check_model_field(&contract);
    assert_eq!(
        diagnostics.errors().map(|(_, error)| error.clone()).collect::<Vec<_>>(),
        [AdmissibilityError::DisallowedInSpec {
            method: "Guard.IsConsistent".into()
        }]
    );
}
