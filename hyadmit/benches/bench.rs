use criterion::{Criterion, black_box, criterion_group, criterion_main};

use hyadmit::prelude::*;
use hyspec::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

struct Model {
    module: SpecModule,
    node: TypeId,
    rep: FieldId,
    peer: FieldId,
    items: FieldId,
    value: FieldId,
    method: MethodId,
}

/// A self-referential `Node` with a Rep and a Peer successor, an ElementsRep array
/// of nodes and an integer payload.
fn build_model() -> Model {
    let mut module = SpecModule::new();
    let decls = &mut module.decls;
    let int = decls.add_type(TypeDecl::primitive("int"));
    let node = decls.add_type(TypeDecl::class("Node"));
    let nodes = decls.add_type(TypeDecl::array("Node[]", node));

    let rep = decls.add_field(FieldDecl::new("child", node).of_type(node).rep());
    let peer = decls.add_field(FieldDecl::new("sibling", node).of_type(node).peer());
    let items = decls.add_field(
        FieldDecl::new("items", node)
            .of_type(nodes)
            .rep()
            .elements_rep(ElementsArg::All),
    );
    let value = decls.add_field(FieldDecl::new("value", node).of_type(int));
    let method = decls.add_method(MethodDecl::new("Sum", node).confined());

    Model {
        module,
        node,
        rep,
        peer,
        items,
        value,
        method,
    }
}

/// A conjunction of `count` random chains, a few of them behind quantifiers.
fn build_random_spec(model: &mut Model, count: usize) -> ExprId {
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    let arena = &mut model.module.arena;

    let mut conjunction = arena.bool(true);
    for _ in 0..count {
        let quantified = rng.random_bool(0.2);
        let mut target = if quantified { arena.bound("x") } else { arena.this() };
        for _ in 0..rng.random_range(0..6) {
            let field = if rng.random_bool(0.8) { model.rep } else { model.peer };
            target = arena.field(target, field);
        }
        let mut condition = arena.field(target, model.value);
        if quantified {
            let this = arena.this();
            let source = arena.field(this, model.items);
            condition = arena.forall("x", source, condition);
        }
        conjunction = arena.binary(BinaryOp::And, conjunction, condition);
    }
    conjunction
}

fn bench_check_invariant(c: &mut Criterion) {
    let mut model = build_model();
    let small = build_random_spec(&mut model, 8);
    let large = build_random_spec(&mut model, 512);

    for (name, condition) in [("check_invariant_small", small), ("check_invariant_large", large)] {
        let invariant = Invariant {
            declaring_type: model.node,
            condition,
        };
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut checker = AdmissibilityChecker::new(&model.module.arena, &model.module.decls, NullSink);
                checker.check_invariant(&invariant);
                black_box(checker.has_error());
            })
        });
    }
}

fn bench_verify_module(c: &mut Criterion) {
    let mut model = build_model();
    for _ in 0..64 {
        let condition = build_random_spec(&mut model, 16);
        model.module.add_invariant(model.node, condition);
    }
    let ensures = build_random_spec(&mut model, 16);
    model
        .module
        .decls
        .set_contract(model.method, MethodContract::new().ensures(ensures));
    model.module.add_read_effects(
        model.method,
        (0..64).map(|i| ReadEffect::this([model.rep, model.rep, model.peer, model.value]).at(i)),
    );

    let verifier = Verifier::default();
    c.bench_function("verify_module", |b| {
        b.iter(|| {
            black_box(verifier.verify(&model.module).map(|report| report.is_admissible()));
        })
    });
}

criterion_group!(benches, bench_check_invariant, bench_verify_module);
criterion_main!(benches);
