use super::*;
use crate::expr::ExprArena;
use crate::fixtures::{World, init_logging};
use crate::infer::constraint::{Constraint, ConstraintRelation};
use crate::infer::session::SessionPhase;
use crate::types::MethodId;
use gti_common::InferenceOptions;

#[test]
fn test_nested_generic_call_is_solved_with_the_outer_one() {
    init_logging();
    let w = World::new();
    let k = w.ty(w.k, &[]);
    let mut exprs = ExprArena::new();
    let arg = exprs.typed(k);
    let inner = exprs.invocation(vec![w.wrap], vec![arg], Vec::new());
    let outer = exprs.invocation(vec![w.id], vec![inner], Vec::new());

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let id = engine.new_session(outer, w.id, &[], None).unwrap();
    engine.infer_applicability(id).unwrap();

    let session = engine.session(id).unwrap();
    assert_eq!(session.nested.len(), 1);
    let (site, inner_id) = session.nested[0];
    assert_eq!(site, inner);
    // The inner variable now belongs to the outer session too.
    let inner_var = engine.session(inner_id).unwrap().variables[0].ty;
    assert!(session.has_variable(inner_var));
    assert!(session.bounds.contains_var(inner_var));
    assert_eq!(engine.session(inner_id).unwrap().outer, Some(id));

    let result = engine.infer_invocation_type(id, None).unwrap();
    assert_eq!(result.return_type, w.list_of_ty(k));
    let nested = engine.resolved(inner).expect("inner site recorded");
    assert_eq!(nested.return_type, w.list_of_ty(k));
    assert_eq!(nested.type_arguments, vec![k]);
    assert_eq!(engine.session(inner_id).unwrap().phase, SessionPhase::TypeDoneFinal);
}

#[test]
fn test_outer_target_reaches_inner_call() {
    init_logging();
    let w = World::new();
    let mut exprs = ExprArena::new();
    let inner = exprs.invocation(vec![w.empty_list], Vec::new(), Vec::new());
    let outer = exprs.invocation(vec![w.id], vec![inner], Vec::new());

    let target = w.list_of_ty(TypeId::STRING);
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(outer, Some(target)).unwrap();
    assert_eq!(result.return_type, target);
    assert_eq!(engine.resolved(inner).map(|r| r.return_type), Some(target));
}

#[test]
fn test_standalone_argument_invocation_is_solved_alone() {
    init_logging();
    let w = World::new();
    let name = w.method("name", &[], |_| (Vec::new(), TypeId::STRING));
    let mut exprs = ExprArena::new();
    let inner = exprs.invocation(vec![name], Vec::new(), Vec::new());
    let outer = exprs.invocation(vec![w.wrap], vec![inner], Vec::new());

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(outer, None).unwrap();
    assert_eq!(result.return_type, w.list_of_ty(TypeId::STRING));
    assert_eq!(engine.resolved(inner).map(|r| r.return_type), Some(TypeId::STRING));
}

#[test]
fn test_deeply_nested_calls() {
    init_logging();
    let w = World::new();
    let mut exprs = ExprArena::new();
    let mut current = exprs.typed(TypeId::STRING);
    for _ in 0..4 {
        current = exprs.invocation(vec![w.wrap], vec![current], Vec::new());
    }
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(current, None).unwrap();
    let mut expected = TypeId::STRING;
    for _ in 0..4 {
        expected = w.list_of_ty(expected);
    }
    assert_eq!(result.return_type, expected);
    assert_eq!(engine.results().count(), 4);
}

#[test]
fn test_nesting_depth_limit() {
    init_logging();
    let w = World::new();
    let mut exprs = ExprArena::new();
    let arg = exprs.typed(TypeId::STRING);
    let inner = exprs.invocation(vec![w.wrap], vec![arg], Vec::new());
    let outer = exprs.invocation(vec![w.id], vec![inner], Vec::new());
    let options = InferenceOptions {
        max_nested_depth: 1,
        ..InferenceOptions::default()
    };
    let mut engine = InferenceEngine::new(&w.db, &exprs, options);
    assert_eq!(
        engine.resolve_invocation(outer, None),
        Err(InferenceError::NestingTooDeep { depth: 1 })
    );
}

#[test]
fn test_failing_inner_call_fails_the_outer_one() {
    init_logging();
    let w = World::new();
    let mut exprs = ExprArena::new();
    let arg = exprs.typed(w.ty(w.array_list, &[w.ty(w.k, &[])]));
    let inner = exprs.invocation(vec![w.max], vec![arg], Vec::new());
    let outer = exprs.invocation(vec![w.id], vec![inner], Vec::new());
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    assert!(engine.resolve_invocation(outer, None).is_err());
    assert!(engine.resolved(inner).is_none());
}

/// `id(wrap(k))`: the world, its expressions and the outer call site.
fn staged_world() -> (World, ExprArena, ExprId) {
    let w = World::new();
    let k = w.ty(w.k, &[]);
    let mut exprs = ExprArena::new();
    let arg = exprs.typed(k);
    let inner = exprs.invocation(vec![w.wrap], vec![arg], Vec::new());
    let outer = exprs.invocation(vec![w.id], vec![inner], Vec::new());
    (w, exprs, outer)
}

/// Outer session, inner session and outer variable once applicability of
/// the outer call is done.
fn outer_after_applicability(
    engine: &mut InferenceEngine<'_>,
    outer: ExprId,
    method: MethodId,
) -> (SessionId, SessionId, TypeId) {
    let id = engine.new_session(outer, method, &[], None).unwrap();
    engine.infer_applicability(id).unwrap();
    let session = engine.session(id).unwrap();
    let (_, inner_id) = session.nested[0];
    (id, inner_id, session.variables[0].ty)
}

#[test]
fn test_inner_bounds_stay_staged_during_outer_applicability() {
    init_logging();
    let (w, exprs, outer) = staged_world();
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let (id, inner_id, alpha) = outer_after_applicability(&mut engine, outer, w.id);

    let session = engine.session(id).unwrap();
    assert!(session.inbox.is_empty());
    assert!(session.bounds.lower_bounds(&w.db, alpha, false).is_empty());
    assert!(session.applicability_bounds.is_some());

    let staged = engine.session(inner_id).unwrap().outbox.as_ref().expect("bounds staged");
    assert!(!staged.lower_bounds(&w.db, alpha, false).is_empty());
    assert_eq!(engine.staged_inner_bounds(id).unwrap().len(), 1);
}

#[test]
fn test_flushed_bounds_wait_in_inbox_until_drained() {
    init_logging();
    let (w, exprs, outer) = staged_world();
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let (id, inner_id, alpha) = outer_after_applicability(&mut engine, outer, w.id);

    engine.flush_nested_outboxes(id).unwrap();
    assert!(engine.session(inner_id).unwrap().outbox.is_none());
    let session = engine.session(id).unwrap();
    assert_eq!(session.inbox.len(), 1);
    assert!(session.bounds.lower_bounds(&w.db, alpha, false).is_empty());

    engine.drain_inbox(id).unwrap();
    let session = engine.session(id).unwrap();
    assert!(session.inbox.is_empty());
    assert!(!session.bounds.lower_bounds(&w.db, alpha, false).is_empty());
    assert!(engine.staged_inner_bounds(id).unwrap().is_empty());
}

#[test]
fn test_accepting_session_merges_flushed_bounds_directly() {
    init_logging();
    let (w, exprs, outer) = staged_world();
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let (id, _, alpha) = outer_after_applicability(&mut engine, outer, w.id);

    engine.session_mut(id).unwrap().accepting_inner_bounds = true;
    engine.flush_nested_outboxes(id).unwrap();
    let session = engine.session(id).unwrap();
    assert!(session.inbox.is_empty());
    assert!(!session.bounds.lower_bounds(&w.db, alpha, false).is_empty());
}

#[test]
fn test_restore_drops_bounds_queued_since_checkpoint() {
    init_logging();
    let (w, exprs, outer) = staged_world();
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let (id, _, alpha) = outer_after_applicability(&mut engine, outer, w.id);

    let checkpoint = engine.checkpoint(id).unwrap();
    engine.flush_nested_outboxes(id).unwrap();
    assert_eq!(engine.session(id).unwrap().inbox.len(), 1);

    engine.restore(id, checkpoint).unwrap();
    let session = engine.session(id).unwrap();
    assert!(session.inbox.is_empty());
    assert_eq!(session.nested.len(), 1);
    engine.drain_inbox(id).unwrap();
    assert!(engine.session(id).unwrap().bounds.lower_bounds(&w.db, alpha, false).is_empty());
}

#[test]
fn test_suspended_reduction_state_is_restored() {
    init_logging();
    let (w, exprs, outer) = staged_world();
    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let id = engine.new_session(outer, w.id, &[], None).unwrap();
    let alpha = engine.session(id).unwrap().variables[0].ty;
    let waiting = Constraint::types(TypeId::STRING, ConstraintRelation::Subtype, alpha);
    engine.session_mut(id).unwrap().pending.push_back(waiting.clone());

    let state = engine.enter_poly(id, outer).unwrap();
    assert!(engine.session(id).unwrap().pending.is_empty());
    assert_eq!(state.pending.len(), 1);

    let arrived = Constraint::types(TypeId::INTEGER, ConstraintRelation::Subtype, alpha);
    engine.session_mut(id).unwrap().pending.push_back(arrived.clone());
    engine.resume_suspended(state, None).unwrap();
    let session = engine.session(id).unwrap();
    assert_eq!(session.pending.iter().cloned().collect::<Vec<_>>(), vec![waiting, arrived]);
    assert!(session.nested.is_empty());
}

#[test]
fn test_outer_candidate_applicability_sees_inner_bounds() {
    init_logging();
    let w = World::new();
    // <T> void h(List<T>, List<T>) and void h(Object, Object)
    let generic = w.method("h", &["T"], |t| {
        (vec![w.list_of_ty(t[0]), w.list_of_ty(t[0])], TypeId::VOID)
    });
    let plain = w.method("h", &[], |_| (vec![TypeId::OBJECT, TypeId::OBJECT], TypeId::VOID));
    let mut exprs = ExprArena::new();
    let k = exprs.typed(w.ty(w.k, &[]));
    let inner = exprs.invocation(vec![w.wrap], vec![k], Vec::new());
    let strings = exprs.typed(w.list_of_ty(TypeId::STRING));
    let call = exprs.invocation(vec![generic, plain], vec![inner, strings], Vec::new());

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let result = engine.resolve_invocation(call, None).unwrap();
    assert_eq!(result.method, plain);
    assert_eq!(
        engine.resolved(inner).map(|r| r.return_type),
        Some(w.list_of_ty(w.ty(w.k, &[])))
    );
}
