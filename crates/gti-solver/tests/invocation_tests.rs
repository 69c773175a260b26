use super::*;
use crate::db::TypeDatabase;
use crate::expr::ExprArena;
use crate::fixtures::World;
use gti_common::InferenceOptions;

fn typed_call(exprs: &mut ExprArena, candidates: Vec<MethodId>, args: &[TypeId]) -> ExprId {
    let args = args.iter().map(|&t| exprs.typed(t)).collect();
    exprs.invocation(candidates, args, Vec::new())
}

fn plain(w: &World, name: &str, param: TypeId) -> MethodId {
    w.method(name, &[], |_| (vec![param], TypeId::STRING))
}

#[test]
fn test_identity_infers_argument_type() {
    let w = World::new();
    let k = w.ty(w.k, &[]);
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![w.id], &[k]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());

    let result = engine.resolve_invocation(site, None).unwrap();
    assert_eq!(result.method, w.id);
    assert_eq!(result.type_arguments, vec![k]);
    assert_eq!(result.parameter_types, vec![k]);
    assert_eq!(result.return_type, k);
    assert!(!result.unchecked && !result.varargs);
    assert_eq!(engine.resolved(site), Some(&result));
    assert_eq!(engine.results().count(), 1);
}

#[test]
fn test_session_phases() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![w.id], &[TypeId::STRING]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let id = engine.new_session(site, w.id, &[], None).unwrap();

    engine.infer_applicability(id).unwrap();
    let session = engine.session(id).unwrap();
    assert_eq!(session.phase, SessionPhase::ApplicabilityDone);
    assert!(session.applicability_bounds.is_some());
    // Repeating it is a no-op.
    engine.infer_applicability(id).unwrap();

    let result = engine.infer_invocation_type(id, None).unwrap();
    assert_eq!(result.return_type, TypeId::STRING);
    let session = engine.session(id).unwrap();
    assert_eq!(session.phase, SessionPhase::TypeDoneFinal);
    assert_eq!(session.result.as_ref(), Some(&result));
}

#[test]
fn test_lub_of_arguments() {
    let w = World::new();
    let (a, b) = (w.ty(w.a, &[]), w.ty(w.b, &[]));
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![w.pick], &[a, b]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, None).unwrap();
    assert_eq!(result.return_type, w.ty(w.c, &[]));
}

#[test]
fn test_target_type_participates() {
    let w = World::new();
    let (a, b) = (w.ty(w.a, &[]), w.ty(w.b, &[]));
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![w.pick], &[a, b]);

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, Some(TypeId::OBJECT)).unwrap();
    assert_eq!(result.return_type, w.ty(w.c, &[]));

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let err = engine.resolve_invocation(site, Some(TypeId::STRING)).unwrap_err();
    assert!(matches!(
        err,
        InferenceError::NoSolution {
            right: TypeId::STRING,
            ..
        }
    ));
}

#[test]
fn test_empty_list_takes_its_type_from_the_target() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let site = exprs.invocation(vec![w.empty_list], Vec::new(), Vec::new());
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let target = w.list_of_ty(TypeId::STRING);
    let result = engine.resolve_invocation(site, Some(target)).unwrap();
    assert_eq!(result.return_type, target);
    assert_eq!(result.type_arguments, vec![TypeId::STRING]);
}

#[test]
fn test_recursive_bound() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![w.max], &[w.ty(w.array_list, &[TypeId::INTEGER])]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, None).unwrap();
    assert_eq!(result.return_type, TypeId::INTEGER);

    // K is not Comparable<K>.
    let mut exprs = ExprArena::new();
    let k = w.ty(w.k, &[]);
    let site = typed_call(&mut exprs, vec![w.max], &[w.ty(w.array_list, &[k])]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    assert!(engine.resolve_invocation(site, None).is_err());
}

#[test]
fn test_variable_arity() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![w.list_of], &[TypeId::STRING, TypeId::STRING]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, None).unwrap();
    assert!(result.varargs);
    assert!(result.flags.contains(SessionFlags::USES_VARARGS));
    assert_eq!(result.return_type, w.list_of_ty(TypeId::STRING));

    // An array argument matches the varargs parameter directly.
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![w.list_of], &[w.db.array(TypeId::STRING)]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, None).unwrap();
    assert!(!result.varargs);
    assert_eq!(result.return_type, w.list_of_ty(TypeId::STRING));

    // No arguments at all.
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![w.list_of], &[]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let target = w.list_of_ty(TypeId::INTEGER);
    let result = engine.resolve_invocation(site, Some(target)).unwrap();
    assert!(result.varargs);
    assert_eq!(result.return_type, target);
}

#[test]
fn test_arity_mismatch() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![w.id], &[]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    assert_eq!(
        engine.resolve_invocation(site, None),
        Err(InferenceError::ArityMismatch {
            expected: 1,
            actual: 0,
        })
    );
    assert_eq!(engine.live_sessions(), 0);
}

#[test]
fn test_unchecked_invocation_erases_return() {
    let w = World::new();
    let copy = w.method("copy", &["T"], |t| {
        (vec![w.list_of_ty(t[0])], w.list_of_ty(t[0]))
    });
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![copy], &[w.db.raw(w.array_list)]);

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, None).unwrap();
    assert!(result.unchecked);
    assert!(result.flags.contains(SessionFlags::UNCHECKED_CONVERSION));
    assert_eq!(result.return_type, w.db.raw(w.list));

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::strict());
    assert!(matches!(
        engine.resolve_invocation(site, None),
        Err(InferenceError::NoSolution { .. })
    ));
}

#[test]
fn test_standalone_result_checked_against_target() {
    let w = World::new();
    let f = plain(&w, "f", TypeId::STRING);
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![f], &[TypeId::STRING]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    assert_eq!(
        engine.resolve_invocation(site, Some(TypeId::INTEGER)),
        Err(InferenceError::NoSolution {
            left: TypeId::STRING,
            relation: ConstraintRelation::Compatible,
            right: TypeId::INTEGER,
        })
    );
}

#[test]
fn test_overloads_filtered_by_applicability() {
    let w = World::new();
    let f_string = plain(&w, "f", TypeId::STRING);
    let f_integer = plain(&w, "f", TypeId::INTEGER);
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![f_integer, f_string], &[TypeId::STRING]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(site, None).unwrap();
    assert_eq!(result.method, f_string);

    let k = w.ty(w.k, &[]);
    let mut exprs = ExprArena::new();
    let site = typed_call(&mut exprs, vec![f_integer, f_string], &[k]);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    assert_eq!(
        engine.resolve_invocation(site, None),
        Err(InferenceError::NoApplicableCandidate { site })
    );
    assert_eq!(engine.live_sessions(), 0);
}
