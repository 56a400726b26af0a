mod common;

use common::{Library, error_kinds};
use hyadmit::prelude::*;
use hyspec::{decl::STRING_EQUALITY, prelude::*};

struct Methods {
    lib: Library,
    weight: MethodId,
    total: MethodId,
    key: MethodId,
    size: MethodId,
    first: MethodId,
    any: MethodId,
}

fn methods() -> Methods {
    let mut lib = Library::new();
    let (shelf, catalog) = (lib.shelf, lib.catalog);
    let decls = lib.decls();
    let weight = decls.add_method(MethodDecl::new("Weight", shelf).pure().recursion_termination(0));
    let total = decls.add_method(MethodDecl::new("Total", shelf).confined());
    let key = decls.add_method(MethodDecl::new("Key", shelf).state_independent());
    let size = decls.add_method(MethodDecl::new("Size", catalog).pure().recursion_termination(3));
    let first = decls.add_method(MethodDecl::new("First", shelf).pure().rep());
    let any = decls.add_method(MethodDecl::new("Any", shelf).pure());

    Methods {
        lib,
        weight,
        total,
        key,
        size,
        first,
        any,
    }
}

impl Methods {
    /// `this.method() > 0`
    fn call_on_this(&mut self, method: MethodId) -> ExprId {
        let this = self.lib.arena().this();
        let call = self.lib.arena().call(this, method, []);
        self.lib.positive(call)
    }
}

#[test]
fn confined_spec_cannot_call_pure_methods() {
    let mut m = methods();
    let spec = m.call_on_this(m.weight);

    assert_eq!(
        error_kinds(&m.lib.check_method_spec(spec, m.total)),
        [AdmissibilityErrorKind::ConfinedSpecContainsPureCall]
    );
}

#[test]
fn state_independent_spec_only_calls_state_independent_methods() {
    let mut m = methods();
    let confined = m.call_on_this(m.total);
    let pure = m.call_on_this(m.weight);
    let this = m.lib.arena().this();
    let abs = m.lib.abs;
    let abs = m.lib.arena().static_call(abs, [this]);

    for spec in [confined, pure] {
        assert_eq!(
            error_kinds(&m.lib.check_method_spec(spec, m.key)),
            [AdmissibilityErrorKind::StateIndependentSpecContainsPureOrConfinedCall]
        );
    }
    assert!(m.lib.check_method_spec(abs, m.key).is_empty());
}

#[test]
fn state_independent_spec_reads_only_readonly_state() {
    let mut m = methods();
    let count = m.lib.this_chain(&[m.lib.count]);
    let label = m.lib.this_chain(&[m.lib.label]);

    assert_eq!(
        error_kinds(&m.lib.check_method_spec(count, m.key)),
        [AdmissibilityErrorKind::StateIndependentSpecNotAdmissible]
    );
    assert!(m.lib.check_method_spec(label, m.key).is_empty());
}

#[test]
fn same_level_calls_need_a_decreasing_measure() {
    let mut m = methods();
    let shelf = m.lib.shelf;
    let depth = m
        .lib
        .decls()
        .add_method(MethodDecl::new("Depth", shelf).pure().recursion_termination(1));
    let height = m
        .lib
        .decls()
        .add_method(MethodDecl::new("Height", shelf).pure().recursion_termination(2));

    let calls_height = m.call_on_this(height);
    let diagnostics = m.lib.check_method_spec(calls_height, depth);
    assert_eq!(diagnostics.error_count(), 0);
    assert_eq!(
        diagnostics.warnings().map(|(_, warning)| warning.clone()).collect::<Vec<_>>(),
        [AdmissibilityWarning::NoDecreasingMeasure {
            method: "Height".into()
        }]
    );

    let calls_depth = m.call_on_this(depth);
    assert!(m.lib.check_method_spec(calls_depth, height).is_empty());
}

#[test]
fn calls_on_owned_receivers_are_well_founded() {
    let mut m = methods();
    let catalog = m.lib.this_chain(&[m.lib.catalog_field]);
    let size = m.lib.arena().call(catalog, m.size, []);
    let spec = m.lib.positive(size);

    assert!(m.lib.check_method_spec(spec, m.weight).is_empty());

    let recursive = m.call_on_this(m.weight);
    assert_eq!(m.lib.check_method_spec(recursive, m.weight).warning_count(), 1);
}

#[test]
fn calls_on_bound_elements_of_an_owned_collection_are_well_founded() {
    let mut m = methods();
    let shelf = m.lib.shelf;
    let shelves = m.lib.decls().add_type(TypeDecl::array("Shelf[]", shelf));
    let parts = m.lib.decls().add_field(
        FieldDecl::new("parts", shelf)
            .of_type(shelves)
            .rep()
            .elements_rep(ElementsArg::All),
    );

    // forall x in this.parts : x.Weight() > 0
    let source = m.lib.this_chain(&[parts]);
    let x = m.lib.arena().bound("x");
    let weight = m.lib.arena().call(x, m.weight, []);
    let body = m.lib.positive(weight);
    let spec = m.lib.arena().forall("x", source, body);

    let mut checker = AdmissibilityChecker::new(&m.lib.module.arena, &m.lib.module.decls, Diagnostics::new());
    checker.check_method_spec(spec, m.weight, true, false);
    assert!(!checker.has_error());
    assert!(checker.sink().is_empty());

    assert!(m.lib.check_method_spec(spec, m.weight).is_empty());
}

#[test]
fn well_foundedness_only_mode_keeps_just_the_warning() {
    let mut m = methods();
    let neighbour = m.lib.this_chain(&[m.lib.neighbour]);
    let weight = m.lib.arena().call(neighbour, m.weight, []);
    let spec = m.lib.positive(weight);

    let normal = m.lib.check_method_spec(spec, m.weight);
    assert_eq!(normal.warning_count(), 1);
    assert_eq!(
        error_kinds(&normal),
        [AdmissibilityErrorKind::FirstNonRepChainNotEnded]
    );

    let mut checker = AdmissibilityChecker::new(&m.lib.module.arena, &m.lib.module.decls, Diagnostics::new());
    checker.check_method_spec(spec, m.weight, true, false);
    assert!(checker.has_error());
    let diagnostics = checker.into_sink();
    assert_eq!(diagnostics.error_count(), 0);
    assert_eq!(diagnostics.warning_count(), 1);
}

#[test]
fn result_of_a_rep_method_is_owned() {
    let mut m = methods();
    let result = m.lib.arena().result();
    let pages = m.lib.chain(result, &[m.lib.pages]);
    let spec = m.lib.positive(pages);

    assert!(m.lib.check_method_spec(spec, m.first).is_empty());
    let diagnostics = m.lib.check_method_spec(spec, m.any);
    assert_eq!(
        diagnostics.errors().map(|(_, error)| error.clone()).collect::<Vec<_>>(),
        [AdmissibilityError::FirstNonRepChainNotEnded {
            last: "result".into(),
            visibility_hint: false,
        }]
    );
}

#[test]
fn result_is_not_a_root_in_preconditions() {
    let mut m = methods();
    let result = m.lib.arena().result();
    let pages = m.lib.chain(result, &[m.lib.pages]);
    let pre = m.lib.positive(pages);
    let post = m.lib.positive(pages);
    m.lib
        .decls()
        .set_contract(m.first, MethodContract::new().requires(pre).ensures(post));

    assert_eq!(
        error_kinds(&m.lib.check_method_spec(pre, m.first)),
        [AdmissibilityErrorKind::TargetNotThis]
    );
    assert!(m.lib.check_method_spec(post, m.first).is_empty());
}

#[test]
fn result_is_only_a_root_in_method_specs() {
    let mut m = methods();
    let result = m.lib.arena().result();
    let pages = m.lib.chain(result, &[m.lib.pages]);

    assert_eq!(
        error_kinds(&m.lib.check_invariant(m.lib.book, pages)),
        [AdmissibilityErrorKind::TargetNotThis]
    );
}

#[test]
fn dependent_fields_do_not_help_method_specs() {
    let mut m = methods();
    let tag = m.lib.this_chain(&[m.lib.neighbour, m.lib.tag]);

    assert!(m.lib.check_invariant(m.lib.shelf, tag).is_empty());
    assert_eq!(
        m.lib.check_method_spec(tag, m.total).errors().next().map(|(_, e)| e.clone()),
        Some(AdmissibilityError::FirstNonRepChainNotEnded {
            last: "neighbour".into(),
            visibility_hint: false,
        })
    );
}

#[test]
fn string_equality_arguments_are_checked() {
    let mut m = methods();
    let string = m.lib.decls().add_type(TypeDecl::class("String").immutable());
    let equals = m
        .lib
        .decls()
        .add_method(MethodDecl::new("Equals", string).static_().full_name(STRING_EQUALITY));

    let count = m.lib.this_chain(&[m.lib.neighbour, m.lib.count]);
    let label = m.lib.this_chain(&[m.lib.label]);
    let compare = m.lib.arena().static_call(equals, [count, label]);
    assert_eq!(
        error_kinds(&m.lib.check_method_spec(compare, m.total)),
        [AdmissibilityErrorKind::FirstNonRepChainNotEnded]
    );

    // Other static calls do not look at their arguments.
    let zero = m.lib.arena().int(0);
    let max = m.lib.max;
    let max = m.lib.arena().static_call(max, [count, zero]);
    assert!(m.lib.check_method_spec(max, m.total).is_empty());
}

#[test]
fn suppressed_checks_report_nothing() {
    let mut m = methods();
    let escaping = m.lib.this_chain(&[m.lib.neighbour, m.lib.count]);
    let escaping = m.lib.positive(escaping);
    let owned = m.lib.this_chain(&[m.lib.catalog_field, m.lib.size]);
    let owned = m.lib.positive(owned);

    let (arena, decls) = (&m.lib.module.arena, &m.lib.module.decls);
    assert!(!Verifier::is_spec_admissible(arena, decls, escaping, m.total));
    assert!(Verifier::is_spec_admissible(arena, decls, owned, m.total));

    let mut checker = AdmissibilityChecker::new(arena, decls, Diagnostics::new());
    checker.check_method_spec(escaping, m.total, false, true);
    assert!(checker.has_error());
    assert!(checker.sink().is_empty());
}

#[test]
fn receivers_of_state_independent_calls_do_not_affect_the_verdict() {
    let mut m = methods();
    // this.neighbour.neighbour.Key() > 0
    let neighbours = m.lib.this_chain(&[m.lib.neighbour, m.lib.neighbour]);
    let key = m.lib.arena().call(neighbours, m.key, []);
    let spec = m.lib.positive(key);

    assert!(m.lib.check_method_spec(spec, m.total).is_empty());

    let (arena, decls) = (&m.lib.module.arena, &m.lib.module.decls);
    assert!(Verifier::is_spec_admissible(arena, decls, spec, m.total));
    let mut checker = AdmissibilityChecker::new(arena, decls, NullSink);
    checker.check_method_spec(spec, m.total, false, false);
    assert!(!checker.has_error());
}
