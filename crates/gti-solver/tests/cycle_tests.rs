use super::*;
use crate::expr::{Lambda, LambdaBody, LambdaParams};
use crate::fixtures::{World, identity_lambda};
use crate::infer::bound::{Relation, TypeBound};
use crate::infer::constraint::ConstraintRelation;

/// `x -> cond ? x : "s"`, a lambda with a larger tree than `x -> x`.
fn conditional_lambda(exprs: &mut ExprArena) -> crate::expr::ExprId {
    let lambda = exprs.begin_lambda();
    let param = exprs.param_ref(lambda, 0);
    let other = exprs.typed(TypeId::STRING);
    let body = exprs.conditional(param, other);
    exprs.finish_lambda(
        lambda,
        Lambda {
            params: LambdaParams::Implicit(1),
            body: LambdaBody::Expression(body),
            thrown: Vec::new(),
        },
    );
    lambda
}

#[test]
fn test_mutually_dependent_lambdas_form_a_cycle() {
    let w = World::new();
    let (a, b) = (w.db.fresh_inference_var(None), w.db.fresh_inference_var(None));
    let mut exprs = ExprArena::new();
    let first = identity_lambda(&mut exprs);
    let second = conditional_lambda(&mut exprs);
    let constraints = vec![
        Constraint::expression(first, w.ty(w.function, &[a, b])),
        Constraint::expression(second, w.ty(w.function, &[b, a])),
    ];
    let mut bounds = BoundSet::new();
    bounds.register(a);
    bounds.register(b);

    assert_eq!(constraints[0].input_variables(&w.db, &exprs).into_iter().collect::<Vec<_>>(), vec![a]);
    assert_eq!(constraints[0].output_variables(&w.db, &exprs).into_iter().collect::<Vec<_>>(), vec![b]);

    let graph = ConstraintGraph::build(&w.db, &exprs, &bounds, &constraints);
    assert_eq!(graph.len(), 2);
    assert!(graph.depends_on(0, 1));
    assert!(graph.depends_on(1, 0));
    assert!(graph.bottom_set().is_empty());
    assert_eq!(graph.sink_component(), vec![0, 1]);

    // The larger expression wins.
    assert_eq!(pick_from_cycle(&exprs, &constraints, &[0, 1]), Some(1));
    assert_eq!(select_constraints(&w.db, &exprs, &bounds, &constraints), vec![1]);
}

#[test]
fn test_cycle_ties_pick_the_first() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let first = identity_lambda(&mut exprs);
    let second = identity_lambda(&mut exprs);
    let f = w.ty(w.function, &[TypeId::STRING, TypeId::STRING]);
    let constraints = vec![Constraint::expression(first, f), Constraint::expression(second, f)];
    assert_eq!(pick_from_cycle(&exprs, &constraints, &[0, 1]), Some(0));
    assert_eq!(pick_from_cycle(&exprs, &constraints, &[1, 0]), Some(1));
    assert_eq!(pick_from_cycle(&exprs, &constraints, &[]), None);
}

#[test]
fn test_dependencies_follow_bounds() {
    let w = World::new();
    let (a, b, c) = (
        w.db.fresh_inference_var(None),
        w.db.fresh_inference_var(None),
        w.db.fresh_inference_var(None),
    );
    let mut exprs = ExprArena::new();
    let first = identity_lambda(&mut exprs);
    let second = identity_lambda(&mut exprs);
    let constraints = vec![
        Constraint::expression(first, w.ty(w.function, &[a, b])),
        Constraint::expression(second, w.ty(w.function, &[TypeId::STRING, c])),
        Constraint::types(TypeId::STRING, ConstraintRelation::Compatible, a),
    ];
    let mut bounds = BoundSet::new();
    for v in [a, b, c] {
        bounds.register(v);
    }
    let bound = TypeBound::new(&w.db, a, Relation::Subtype, w.list_of_ty(c)).expect("bound");
    bounds.add_bound(&w.db, bound, false);

    let graph = ConstraintGraph::build(&w.db, &exprs, &bounds, &constraints);
    assert!(graph.depends_on(0, 1));
    assert!(!graph.depends_on(1, 0));
    assert_eq!(graph.bottom_set(), vec![1, 2]);
    assert_eq!(select_constraints(&w.db, &exprs, &bounds, &constraints), vec![1, 2]);
    assert!(select_constraints(&w.db, &exprs, &bounds, &[]).is_empty());
}
