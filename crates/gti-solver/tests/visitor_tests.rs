use super::*;
use crate::fixtures::World;

#[test]
fn test_children_of_each_shape() {
    let w = World::new();
    let fun = w.ty(w.function, &[TypeId::STRING, TypeId::INTEGER]);
    let mut seen = Vec::new();
    for_each_child(&w.db, fun, |c| seen.push(c));
    assert_eq!(seen, vec![TypeId::STRING, TypeId::INTEGER]);

    seen.clear();
    for_each_child(&w.db, w.db.array(fun), |c| seen.push(c));
    assert_eq!(seen, vec![fun]);

    seen.clear();
    for_each_child(&w.db, w.db.wildcard(Wildcard::Unbounded), |c| seen.push(c));
    assert!(seen.is_empty());
}

#[test]
fn test_collects_variables_in_order() {
    let w = World::new();
    let a = w.db.fresh_inference_var(None);
    let b = w.db.fresh_inference_var(None);
    let ty = w.ty(w.function, &[w.list_of_ty(b), w.db.wildcard(Wildcard::Extends(a))]);
    let vars: Vec<TypeId> = inference_vars_of(&w.db, ty).into_iter().collect();
    assert_eq!(vars, vec![b, a]);

    let mut out = IndexSet::new();
    collect_inference_vars(&w.db, w.db.array(a), &mut out);
    collect_inference_vars(&w.db, b, &mut out);
    assert_eq!(out.into_iter().collect::<Vec<_>>(), vec![a, b]);
}

#[test]
fn test_properness_and_mentions() {
    let w = World::new();
    let a = w.db.fresh_inference_var(None);
    let list_a = w.list_of_ty(a);
    assert!(!is_proper(&w.db, list_a));
    assert!(is_proper(&w.db, w.list_of_ty(TypeId::STRING)));
    assert!(mentions(&w.db, list_a, a));
    assert!(!mentions(&w.db, TypeId::STRING, a));

    // Captures are opaque even when they stand for a variable.
    let cap = w.db.fresh_capture(a);
    assert!(is_proper(&w.db, w.list_of_ty(cap)));
}

#[test]
fn test_type_parameter_and_wildcard_detection() {
    let w = World::new();
    let p = w.db.declare_type_param("T");
    let t = w.db.type_param(p);
    assert!(contains_type_parameters(&w.db, w.db.array(w.list_of_ty(t))));
    assert!(!contains_type_parameters(&w.db, w.list_of_ty(TypeId::STRING)));
    assert!(contains_wildcards(&w.db, w.list_of_ty(w.db.wildcard(Wildcard::Unbounded))));
    assert!(!contains_wildcards(&w.db, w.list_of_ty(t)));
    assert!(contains_type_matching(&w.db, w.list_of_ty(TypeId::INTEGER), &mut |ty, _| {
        ty == TypeId::INTEGER
    }));
}
