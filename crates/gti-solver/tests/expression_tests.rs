use super::*;
use crate::expr::ExprArena;
use crate::fixtures::{World, constant_lambda, identity_lambda};
use gti_common::InferenceOptions;

fn resolve_call(
    w: &World,
    exprs: &ExprArena,
    site: ExprId,
) -> Result<crate::infer::ResolvedInvocation, InferenceError> {
    let mut engine = InferenceEngine::new(&w.db, exprs, InferenceOptions::default());
    engine.resolve_invocation(site, None)
}

fn strings(w: &World, exprs: &mut ExprArena) -> ExprId {
    exprs.typed(w.ty(w.array_list, &[TypeId::STRING]))
}

#[test]
fn test_implicit_lambda_parameter_comes_from_earlier_argument() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let list = strings(&w, &mut exprs);
    let lambda = identity_lambda(&mut exprs);
    let site = exprs.invocation(vec![w.map], vec![list, lambda], Vec::new());

    let mut engine = InferenceEngine::new(&w.db, &exprs, InferenceOptions::default());
    let id = engine.new_session(site, w.map, &[], None).unwrap();
    engine.infer_applicability(id).unwrap();
    // The lambda waits for invocation type inference.
    assert_eq!(engine.session(id).unwrap().deferred.len(), 2);
    let result = engine.infer_invocation_type(id, None).unwrap();
    assert_eq!(result.type_arguments, vec![TypeId::STRING, TypeId::STRING]);
    assert_eq!(result.return_type, w.list_of_ty(TypeId::STRING));
    assert!(engine.session(id).unwrap().deferred.is_empty());
}

#[test]
fn test_lambda_result_flows_into_return() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let lambda = constant_lambda(&mut exprs, TypeId::STRING, Vec::new());
    let site = exprs.invocation(vec![w.supply], vec![lambda], Vec::new());
    let result = resolve_call(&w, &exprs, site).unwrap();
    assert_eq!(result.return_type, TypeId::STRING);
}

#[test]
fn test_primitive_lambda_result_is_boxed() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let lambda = constant_lambda(&mut exprs, TypeId::INT, Vec::new());
    let site = exprs.invocation(vec![w.supply], vec![lambda], Vec::new());
    let result = resolve_call(&w, &exprs, site).unwrap();
    assert_eq!(result.return_type, TypeId::INTEGER);
}

#[test]
fn test_thrown_type_inference() {
    let w = World::new();
    let io = w.ty(w.io_exception, &[]);

    let mut exprs = ExprArena::new();
    let quiet = constant_lambda(&mut exprs, TypeId::STRING, Vec::new());
    let site = exprs.invocation(vec![w.attempt], vec![quiet], Vec::new());
    let result = resolve_call(&w, &exprs, site).unwrap();
    assert_eq!(result.type_arguments, vec![TypeId::STRING, TypeId::RUNTIME_EXCEPTION]);
    assert_eq!(result.thrown, vec![TypeId::RUNTIME_EXCEPTION]);

    let mut exprs = ExprArena::new();
    let noisy = constant_lambda(&mut exprs, TypeId::STRING, vec![io]);
    let site = exprs.invocation(vec![w.attempt], vec![noisy], Vec::new());
    let result = resolve_call(&w, &exprs, site).unwrap();
    assert_eq!(result.type_arguments, vec![TypeId::STRING, io]);
    assert_eq!(result.thrown, vec![io]);
}

#[test]
fn test_checked_exception_against_non_throwing_function_type() {
    let w = World::new();
    let io = w.ty(w.io_exception, &[]);
    let mut exprs = ExprArena::new();
    let noisy = constant_lambda(&mut exprs, TypeId::STRING, vec![io]);
    let site = exprs.invocation(vec![w.supply], vec![noisy], Vec::new());
    assert!(matches!(
        resolve_call(&w, &exprs, site),
        Err(InferenceError::NoSolution { left, .. }) if left == io
    ));
}

#[test]
fn test_lambda_shape_errors() {
    let w = World::new();

    // Wrong arity.
    let mut exprs = ExprArena::new();
    let list = strings(&w, &mut exprs);
    let lambda = constant_lambda(&mut exprs, TypeId::STRING, Vec::new());
    let site = exprs.invocation(vec![w.map], vec![list, lambda], Vec::new());
    assert_eq!(
        resolve_call(&w, &exprs, site),
        Err(InferenceError::ArityMismatch {
            expected: 1,
            actual: 0,
        })
    );

    // Not a functional interface.
    let take = w.method("take", &[], |_| (vec![TypeId::STRING], TypeId::VOID));
    let mut exprs = ExprArena::new();
    let lambda = identity_lambda(&mut exprs);
    let site = exprs.invocation(vec![take], vec![lambda], Vec::new());
    assert_eq!(
        resolve_call(&w, &exprs, site),
        Err(InferenceError::NotFunctionalInterface { ty: TypeId::STRING })
    );
}

#[test]
fn test_void_and_value_bodies() {
    let w = World::new();
    let run = w.method("run", &[], |_| (vec![w.ty(w.runnable, &[])], TypeId::VOID));
    let get = w.method("get", &[], |_| {
        (vec![w.ty(w.supplier, &[TypeId::STRING])], TypeId::VOID)
    });

    // `() -> { return "s"; }` cannot be a Runnable.
    let mut exprs = ExprArena::new();
    let result = exprs.typed(TypeId::STRING);
    let lambda = exprs.lambda(Lambda {
        params: LambdaParams::Explicit(Vec::new()),
        body: LambdaBody::Block {
            results: vec![result],
            can_complete_normally: false,
        },
        thrown: Vec::new(),
    });
    let site = exprs.invocation(vec![run], vec![lambda], Vec::new());
    assert_eq!(
        resolve_call(&w, &exprs, site),
        Err(InferenceError::NoSolution {
            left: TypeId::OBJECT,
            relation: ConstraintRelation::Compatible,
            right: TypeId::VOID,
        })
    );

    // `() -> { }` cannot be a Supplier.
    let mut exprs = ExprArena::new();
    let lambda = exprs.lambda(Lambda {
        params: LambdaParams::Explicit(Vec::new()),
        body: LambdaBody::Block {
            results: Vec::new(),
            can_complete_normally: true,
        },
        thrown: Vec::new(),
    });
    let site = exprs.invocation(vec![get], vec![lambda], Vec::new());
    assert_eq!(
        resolve_call(&w, &exprs, site),
        Err(InferenceError::NoSolution {
            left: TypeId::VOID,
            relation: ConstraintRelation::Compatible,
            right: TypeId::STRING,
        })
    );

    // An expression statement body fits a void function type.
    let mut exprs = ExprArena::new();
    let lambda = constant_lambda(&mut exprs, TypeId::STRING, Vec::new());
    let site = exprs.invocation(vec![run], vec![lambda], Vec::new());
    assert!(resolve_call(&w, &exprs, site).is_ok());
}

#[test]
fn test_explicit_lambda_parameters_must_match() {
    let w = World::new();
    let apply = w.method("apply", &[], |_| {
        (vec![w.ty(w.function, &[TypeId::STRING, TypeId::INTEGER])], TypeId::VOID)
    });
    let mut exprs = ExprArena::new();
    let body = exprs.typed(TypeId::INTEGER);
    let lambda = exprs.lambda(Lambda {
        params: LambdaParams::Explicit(vec![TypeId::INTEGER]),
        body: LambdaBody::Expression(body),
        thrown: Vec::new(),
    });
    let site = exprs.invocation(vec![apply], vec![lambda], Vec::new());
    assert!(resolve_call(&w, &exprs, site).is_err());
}

#[test]
fn test_exact_method_reference() {
    let w = World::new();
    let len = w.method("len", &[], |_| (vec![TypeId::STRING], TypeId::INT));
    let mut exprs = ExprArena::new();
    let list = strings(&w, &mut exprs);
    let mref = exprs.method_ref(vec![len], None);
    let site = exprs.invocation(vec![w.map], vec![list, mref], Vec::new());
    let result = resolve_call(&w, &exprs, site).unwrap();
    assert_eq!(result.return_type, w.list_of_ty(TypeId::INTEGER));
}

#[test]
fn test_unbound_receiver_method_reference() {
    let w = World::new();
    let length = w.method("length", &[], |_| (Vec::new(), TypeId::INT));
    let mut exprs = ExprArena::new();
    let list = strings(&w, &mut exprs);
    let mref = exprs.method_ref(vec![length], Some(TypeId::STRING));
    let site = exprs.invocation(vec![w.map], vec![list, mref], Vec::new());
    let result = resolve_call(&w, &exprs, site).unwrap();
    assert_eq!(result.return_type, w.list_of_ty(TypeId::INTEGER));
}

#[test]
fn test_inexact_method_reference_picks_matching_overload() {
    let w = World::new();
    let from_int = w.method("parse", &[], |_| (vec![TypeId::INTEGER], TypeId::INTEGER));
    let from_string = w.method("parse", &[], |_| (vec![TypeId::STRING], TypeId::DOUBLE_BOX));
    let mut exprs = ExprArena::new();
    let list = strings(&w, &mut exprs);
    let mref = exprs.method_ref(vec![from_int, from_string], None);
    let site = exprs.invocation(vec![w.map], vec![list, mref], Vec::new());
    let result = resolve_call(&w, &exprs, site).unwrap();
    assert_eq!(result.return_type, w.list_of_ty(TypeId::DOUBLE_BOX));
}

#[test]
fn test_generic_method_reference() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let list = strings(&w, &mut exprs);
    let mref = exprs.method_ref(vec![w.id], None);
    let site = exprs.invocation(vec![w.map], vec![list, mref], Vec::new());
    let result = resolve_call(&w, &exprs, site).unwrap();
    assert_eq!(result.return_type, w.list_of_ty(TypeId::STRING));
}

#[test]
fn test_conditional_and_switch_branches() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let a = exprs.typed(w.ty(w.a, &[]));
    let b = exprs.typed(w.ty(w.b, &[]));
    let cond = exprs.conditional(a, b);
    let site = exprs.invocation(vec![w.id], vec![cond], Vec::new());
    let result = resolve_call(&w, &exprs, site).unwrap();
    assert_eq!(result.return_type, w.ty(w.c, &[]));

    let mut exprs = ExprArena::new();
    let arms = vec![exprs.typed(TypeId::INTEGER), exprs.typed(TypeId::DOUBLE_BOX)];
    let switch = exprs.switch(arms);
    let paren = exprs.paren(switch);
    let site = exprs.invocation(vec![w.id], vec![paren], Vec::new());
    let result = resolve_call(&w, &exprs, site).unwrap();
    assert_eq!(result.return_type, TypeId::NUMBER);
}

#[test]
fn test_null_argument() {
    let w = World::new();
    let mut exprs = ExprArena::new();
    let null = exprs.null();
    let site = exprs.invocation(vec![w.id], vec![null], Vec::new());
    assert!(resolve_call(&w, &exprs, site).is_ok());

    let takes_int = w.method("f", &[], |_| (vec![TypeId::INT], TypeId::VOID));
    let mut exprs = ExprArena::new();
    let null = exprs.null();
    let site = exprs.invocation(vec![takes_int], vec![null], Vec::new());
    assert_eq!(
        resolve_call(&w, &exprs, site),
        Err(InferenceError::NoSolution {
            left: TypeId::NULL,
            relation: ConstraintRelation::Compatible,
            right: TypeId::INT,
        })
    );
}
