//! End-to-end inference scenarios over the shared fixture library.

use crate::db::TypeDatabase;
use crate::error::SessionFlags;
use crate::expr::ExprArena;
use crate::fixtures::{World, identity_lambda, init_logging};
use crate::infer::{BoundSet, InferenceEngine, Relation, TypeBound, resolve_all};
use crate::subtype::SubtypeChecker;
use crate::types::{TypeData, TypeId};
use gti_common::InferenceOptions;

#[test]
fn test_identity_infers_argument_type() {
    init_logging();
    let w = World::new();
    let k = w.ty(w.k, &[]);
    let mut exprs = ExprArena::new();
    let arg = exprs.typed(k);
    let site = exprs.invocation(vec![w.id], vec![arg], Vec::new());

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, None).unwrap();
    assert_eq!(result.method, w.id);
    assert_eq!(result.type_arguments, vec![k]);
    assert_eq!(result.parameter_types, vec![k]);
    assert_eq!(result.return_type, k);
    assert!(result.flags.is_empty());
}

#[test]
fn test_unrelated_arguments_meet_at_common_supertype() {
    init_logging();
    let w = World::new();
    let mut exprs = ExprArena::new();
    let a = exprs.typed(w.ty(w.a, &[]));
    let b = exprs.typed(w.ty(w.b, &[]));
    let site = exprs.invocation(vec![w.pick], vec![a, b], Vec::new());

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, None).unwrap();
    assert_eq!(w.format(result.return_type), "C");
    let c = w.ty(w.c, &[]);
    let mut checker = SubtypeChecker::new(&w.db);
    assert!(checker.is_subtype(result.type_arguments[0], c));
}

#[test]
fn test_mutually_bounded_variables_fall_back_to_captures() {
    init_logging();
    let w = World::new();
    let alpha = w.db.fresh_inference_var(None);
    let beta = w.db.fresh_inference_var(None);
    let mut set = BoundSet::new();
    for (l, r) in [(alpha, beta), (beta, alpha)] {
        let bound = TypeBound::new(&w.db, l, Relation::Subtype, r).expect("bound");
        set.add_bound(&w.db, bound, false);
    }

    let flags = resolve_all(&w.db, &InferenceOptions::default(), &mut set).unwrap();
    assert!(flags.contains(SessionFlags::CAPTURE_FALLBACK));
    let a = set.instantiation(alpha).expect("alpha instantiated");
    let b = set.instantiation(beta).expect("beta instantiated");
    assert!(matches!(w.db.lookup(a), Some(TypeData::Capture(_))));
    assert!(matches!(w.db.lookup(b), Some(TypeData::Capture(_))));
    let mut checker = SubtypeChecker::new(&w.db);
    assert!(checker.is_subtype(a, b));
    assert!(checker.is_subtype(b, a));
}

#[test]
fn test_nested_poly_bounds_land_in_outer_set() {
    init_logging();
    let w = World::new();
    let mut exprs = ExprArena::new();
    let arg = exprs.typed(TypeId::STRING);
    let inner = exprs.invocation(vec![w.wrap], vec![arg], Vec::new());
    let outer = exprs.invocation(vec![w.id], vec![inner], Vec::new());

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let id = engine.new_session(outer, w.id, &[], None).unwrap();
    // The outer argument constraints are seeded before the inner call runs.
    assert!(engine.session(id).unwrap().nested.is_empty());
    engine.infer_applicability(id).unwrap();
    let result = engine.infer_invocation_type(id, None).unwrap();
    assert_eq!(result.return_type, w.list_of_ty(TypeId::STRING));

    let session = engine.session(id).unwrap();
    let (_, inner_id) = session.nested[0];
    let inner_var = engine.session(inner_id).unwrap().variables[0].ty;
    assert!(session.bounds.contains_var(inner_var));
    assert_eq!(session.bounds.instantiation(inner_var), Some(TypeId::STRING));
}

#[test]
fn test_varargs_factory_feeds_lambda_mapping() {
    init_logging();
    let w = World::new();
    let mut exprs = ExprArena::new();
    let first = exprs.typed(TypeId::STRING);
    let second = exprs.typed(TypeId::STRING);
    let list = exprs.invocation(vec![w.list_of], vec![first, second], Vec::new());
    let lambda = identity_lambda(&mut exprs);
    let site = exprs.invocation(vec![w.map], vec![list, lambda], Vec::new());

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, None).unwrap();
    assert_eq!(result.type_arguments, vec![TypeId::STRING, TypeId::STRING]);
    assert_eq!(w.format(result.return_type), "List<String>");
    let nested = engine.resolved(list).expect("factory call resolved");
    assert!(nested.varargs);
    assert_eq!(nested.return_type, w.list_of_ty(TypeId::STRING));
}

#[test]
fn test_recursive_bound_through_nested_factory() {
    init_logging();
    let w = World::new();
    let mut exprs = ExprArena::new();
    let first = exprs.typed(TypeId::INT);
    let second = exprs.typed(TypeId::INTEGER);
    let list = exprs.invocation(vec![w.list_of], vec![first, second], Vec::new());
    let site = exprs.invocation(vec![w.max], vec![list], Vec::new());

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, None).unwrap();
    assert_eq!(result.return_type, TypeId::INTEGER);
}

#[test]
fn test_target_type_drives_empty_factory() {
    init_logging();
    let w = World::new();
    let mut exprs = ExprArena::new();
    let site = exprs.invocation(vec![w.empty_list], Vec::new(), Vec::new());
    let target = w.ty(w.collection, &[TypeId::NUMBER]);

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, Some(target)).unwrap();
    assert_eq!(result.type_arguments, vec![TypeId::NUMBER]);
    assert_eq!(w.format(result.return_type), "List<Number>");
}
