//! Constraint formulas and their input/output variables.

use crate::db::TypeDatabase;
use crate::expr::{ExprArena, ExprId, ExprKind};
use crate::functional::functional_signature;
use crate::visitor::collect_inference_vars;
use crate::types::TypeId;
use indexmap::IndexSet;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintRelation {
    /// Loose invocation compatibility, `S → T`.
    Compatible,
    Subtype,
    Supertype,
    Same,
    /// Type-argument containment, `S <= T`.
    Contained,
}

impl fmt::Display for ConstraintRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintRelation::Compatible => "→",
            ConstraintRelation::Subtype => "<:",
            ConstraintRelation::Supertype => ":>",
            ConstraintRelation::Same => "=",
            ConstraintRelation::Contained => "<=",
        })
    }
}

/// A formula awaiting reduction.
///
/// `soft` marks formulas whose derived contradictions are tolerated under
/// raw-type leniency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    /// `‹expr → target›`
    Expression {
        expr: ExprId,
        target: TypeId,
        soft: bool,
    },
    Type {
        left: TypeId,
        relation: ConstraintRelation,
        right: TypeId,
        soft: bool,
    },
    /// `‹expr →throws target›`
    Exception {
        expr: ExprId,
        target: TypeId,
        soft: bool,
    },
}

impl Constraint {
    pub fn expression(expr: ExprId, target: TypeId) -> Self {
        Constraint::Expression {
            expr,
            target,
            soft: false,
        }
    }

    pub fn types(left: TypeId, relation: ConstraintRelation, right: TypeId) -> Self {
        Constraint::Type {
            left,
            relation,
            right,
            soft: false,
        }
    }

    /// Inference variables that must be resolved before this constraint can
    /// be reduced.
    pub fn input_variables(&self, db: &dyn TypeDatabase, exprs: &ExprArena) -> IndexSet<TypeId> {
        let mut out = IndexSet::new();
        match *self {
            Constraint::Expression { expr, target, .. } => {
                expression_inputs(db, exprs, expr, target, &mut out)
            }
            Constraint::Exception { expr, target, .. } => {
                exception_inputs(db, exprs, expr, target, &mut out)
            }
            Constraint::Type { .. } => {}
        }
        out
    }

    /// Inference variables mentioned by the target that are not inputs.
    pub fn output_variables(&self, db: &dyn TypeDatabase, exprs: &ExprArena) -> IndexSet<TypeId> {
        let mut out = IndexSet::new();
        match *self {
            Constraint::Expression { target, .. } => collect_inference_vars(db, target, &mut out),
            Constraint::Exception { target, .. } => {
                if db.is_inference_var(target) {
                    out.insert(target);
                } else if let Some(f) = functional_signature(db, target) {
                    for &t in &f.thrown {
                        collect_inference_vars(db, t, &mut out);
                    }
                }
            }
            Constraint::Type { .. } => return out,
        }
        let inputs = self.input_variables(db, exprs);
        out.retain(|v| !inputs.contains(v));
        out
    }
}

fn expression_inputs(
    db: &dyn TypeDatabase,
    exprs: &ExprArena,
    expr: ExprId,
    target: TypeId,
    out: &mut IndexSet<TypeId>,
) {
    match exprs.kind(expr) {
        Some(ExprKind::Lambda(lambda)) => {
            if db.is_inference_var(target) {
                out.insert(target);
                return;
            }
            let Some(f) = functional_signature(db, target) else {
                return;
            };
            if !lambda.is_explicitly_typed() {
                for &p in &f.params {
                    collect_inference_vars(db, p, out);
                }
            }
            if !f.is_void() {
                for result in lambda.result_exprs() {
                    expression_inputs(db, exprs, result, f.return_type, out);
                }
            }
        }
        Some(ExprKind::MethodRef(_)) => {
            if db.is_inference_var(target) {
                out.insert(target);
                return;
            }
            if exprs.is_exact_method_ref(db, expr) {
                return;
            }
            if let Some(f) = functional_signature(db, target) {
                for &p in &f.params {
                    collect_inference_vars(db, p, out);
                }
            }
        }
        Some(ExprKind::Paren(inner)) => expression_inputs(db, exprs, *inner, target, out),
        Some(ExprKind::Conditional {
            then_branch,
            else_branch,
        }) => {
            expression_inputs(db, exprs, *then_branch, target, out);
            expression_inputs(db, exprs, *else_branch, target, out);
        }
        Some(ExprKind::Switch { arms }) => {
            for &arm in arms {
                expression_inputs(db, exprs, arm, target, out);
            }
        }
        _ => {}
    }
}

fn exception_inputs(
    db: &dyn TypeDatabase,
    exprs: &ExprArena,
    expr: ExprId,
    target: TypeId,
    out: &mut IndexSet<TypeId>,
) {
    match exprs.kind(expr) {
        Some(ExprKind::Lambda(lambda)) => {
            if db.is_inference_var(target) {
                out.insert(target);
                return;
            }
            let Some(f) = functional_signature(db, target) else {
                return;
            };
            if !lambda.is_explicitly_typed() {
                for &p in &f.params {
                    collect_inference_vars(db, p, out);
                }
            }
            collect_inference_vars(db, f.return_type, out);
        }
        Some(ExprKind::MethodRef(_)) => {
            if db.is_inference_var(target) {
                out.insert(target);
                return;
            }
            if let Some(f) = functional_signature(db, target) {
                if !exprs.is_exact_method_ref(db, expr) {
                    for &p in &f.params {
                        collect_inference_vars(db, p, out);
                    }
                }
                collect_inference_vars(db, f.return_type, out);
            }
        }
        Some(ExprKind::Paren(inner)) => exception_inputs(db, exprs, *inner, target, out),
        Some(ExprKind::Conditional {
            then_branch,
            else_branch,
        }) => {
            exception_inputs(db, exprs, *then_branch, target, out);
            exception_inputs(db, exprs, *else_branch, target, out);
        }
        Some(ExprKind::Switch { arms }) => {
            for &arm in arms {
                exception_inputs(db, exprs, arm, target, out);
            }
        }
        _ => {}
    }
}
