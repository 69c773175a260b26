//! Incorporation: derive the consequences of new bounds.
//!
//! Every bound added since the last run is paired once with every bound in
//! the set (including the other new ones). Pairs on the same variable yield
//! the complementary formulas (`S <: α <: T` gives `‹S <: T›`, and so on),
//! proper instantiations are substituted into bounds that mention the
//! variable, and two supertypes of the same generic class force their
//! arguments equal. Capture bounds contribute the implications of their
//! wildcard arguments. Derived formulas are reduced and the resulting bounds
//! appended, until a round adds nothing.

use super::bound::{CaptureBound, Relation, TypeBound};
use super::bound_set::BoundSet;
use super::constraint::ConstraintRelation;
use super::reduce::TypeReducer;
use crate::db::TypeDatabase;
use crate::error::{InferenceError, SessionFlags};
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::subtype::SubtypeChecker;
use crate::types::{ClassId, TypeData, TypeId, Wildcard};
use crate::visitor::{is_proper, mentions};
use gti_common::InferenceOptions;
use gti_common::limits::MAX_DERIVED_BOUNDS;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, trace};

/// A derived formula and whether it came from a soft bound.
///
/// `contradiction` marks a bound that implies `false` outright; the formula
/// then only names the offending bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Derived {
    left: TypeId,
    relation: ConstraintRelation,
    right: TypeId,
    soft: bool,
    contradiction: bool,
}

/// Run incorporation to a fixed point.
///
/// Returns the soft outcomes observed, or the first contradiction derived
/// from hard bounds.
pub fn incorporate(
    db: &dyn TypeDatabase,
    options: &InferenceOptions,
    bounds: &mut BoundSet,
) -> Result<SessionFlags, InferenceError> {
    let mut reducer = TypeReducer::new(db, options);
    let mut flags = SessionFlags::empty();
    let mut rounds = 0u32;
    let start_len = bounds.len();

    while bounds.has_unincorporated() {
        rounds += 1;
        if rounds > options.max_incorporation_rounds {
            debug!(rounds, "incorporation round limit");
            return Err(InferenceError::IncorporationLimit { rounds });
        }
        if bounds.len() - start_len > MAX_DERIVED_BOUNDS {
            debug!(derived = bounds.len() - start_len, "incorporation bound limit");
            return Err(InferenceError::IncorporationLimit { rounds });
        }

        let mut derived: Vec<Derived> = Vec::new();
        for capture in bounds.take_unexpanded_captures() {
            expand_capture(db, &capture, bounds, &mut derived);
        }

        let from = bounds.incorporated();
        let to = bounds.len();
        trace!(round = rounds, new = to - from, total = to, "incorporation round");
        for i in from..to {
            let Some((new, new_soft)) = bounds.bound_at(i) else {
                continue;
            };
            for j in 0..i {
                if let Some((old, old_soft)) = bounds.bound_at(j) {
                    combine(db, new, old, new_soft || old_soft, &mut derived);
                }
            }
            for capture in bounds.captures() {
                capture_rules(db, capture, new, new_soft, &mut derived);
            }
        }
        bounds.mark_incorporated(to);

        let mut seen = FxHashSet::default();
        for formula in derived {
            if !seen.insert(formula) {
                continue;
            }
            let mut out = Vec::new();
            let result = if formula.contradiction {
                Err(InferenceError::NoSolution {
                    left: formula.left,
                    relation: formula.relation,
                    right: formula.right,
                })
            } else {
                reducer.reduce(formula.left, formula.relation, formula.right, &mut out)
            };
            match result {
                Ok(()) => {
                    for b in out {
                        bounds.add_bound(db, b, formula.soft);
                    }
                }
                Err(err) if formula.soft => {
                    trace!(error = %err.describe(db), "ignoring contradiction from soft bound");
                    flags |= SessionFlags::RAW_LENIENCY;
                }
                Err(err) => {
                    debug!(error = %err.describe(db), "incorporation contradiction");
                    return Err(err);
                }
            }
        }
    }

    Ok(flags | reducer.flags)
}

fn push(out: &mut Vec<Derived>, left: TypeId, relation: ConstraintRelation, right: TypeId, soft: bool) {
    if left != right {
        out.push(Derived {
            left,
            relation,
            right,
            soft,
            contradiction: false,
        });
    }
}

/// Formulas implied by a pair of bounds.
fn combine(db: &dyn TypeDatabase, a: TypeBound, b: TypeBound, soft: bool, out: &mut Vec<Derived>) {
    let a_views = a.views(db);
    let b_views = b.views(db);
    for &(va, ra, ta) in &a_views {
        for &(vb, rb, tb) in &b_views {
            if va == vb {
                complementary(db, (ra, ta), (rb, tb), soft, out);
            }
        }
    }
    substitute_instantiation(db, &a_views, b, soft, out);
    substitute_instantiation(db, &b_views, a, soft, out);
}

/// Rules for two bounds on the same variable α.
fn complementary(
    db: &dyn TypeDatabase,
    (ra, s): (Relation, TypeId),
    (rb, t): (Relation, TypeId),
    soft: bool,
    out: &mut Vec<Derived>,
) {
    use ConstraintRelation as C;
    match (ra, rb) {
        // α = S, α = T
        (Relation::Same, Relation::Same) => push(out, s, C::Same, t, soft),
        // α = S, α <: T
        (Relation::Same, Relation::Subtype) => push(out, s, C::Subtype, t, soft),
        (Relation::Subtype, Relation::Same) => push(out, t, C::Subtype, s, soft),
        // α = S, T <: α
        (Relation::Same, Relation::Supertype) => push(out, t, C::Subtype, s, soft),
        (Relation::Supertype, Relation::Same) => push(out, s, C::Subtype, t, soft),
        // S <: α, α <: T
        (Relation::Supertype, Relation::Subtype) => push(out, s, C::Subtype, t, soft),
        (Relation::Subtype, Relation::Supertype) => push(out, t, C::Subtype, s, soft),
        // α <: S, α <: T
        (Relation::Subtype, Relation::Subtype) => same_generic_supertypes(db, s, t, soft, out),
        (Relation::Supertype, Relation::Supertype) => {}
    }
}

/// `α <: S` and `α <: T` where `S` and `T` share a generic supertype class
/// `G`: non-wildcard arguments of the two parameterizations must be equal.
fn same_generic_supertypes(
    db: &dyn TypeDatabase,
    s: TypeId,
    t: TypeId,
    soft: bool,
    out: &mut Vec<Derived>,
) {
    if db.is_inference_var(s) || db.is_inference_var(t) {
        return;
    }
    let mut checker = SubtypeChecker::new(db);
    for decl in generic_supertype_classes(db, &mut checker, s) {
        let (Some(ss), Some(ts)) = (checker.as_super(s, decl), checker.as_super(t, decl)) else {
            continue;
        };
        if ss == ts {
            continue;
        }
        let (Some(TypeData::Class(sr)), Some(TypeData::Class(tr))) = (db.lookup(ss), db.lookup(ts))
        else {
            continue;
        };
        let (sargs, targs) = (db.type_list(sr.args), db.type_list(tr.args));
        for (&a, &b) in sargs.iter().zip(targs.iter()) {
            if db.as_wildcard(a).is_none() && db.as_wildcard(b).is_none() {
                push(out, a, ConstraintRelation::Same, b, soft);
            }
        }
    }
}

fn generic_supertype_classes(
    db: &dyn TypeDatabase,
    checker: &mut SubtypeChecker<'_>,
    ty: TypeId,
) -> SmallVec<[ClassId; 4]> {
    let mut classes = SmallVec::new();
    let mut stack = vec![ty];
    let mut seen = FxHashSet::default();
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        if let Some(TypeData::Class(r)) = db.lookup(current)
            && !db.type_list(r.args).is_empty()
            && !classes.contains(&r.decl)
        {
            classes.push(r.decl);
        }
        stack.extend(checker.direct_supertypes(current));
    }
    classes
}

/// `α = U` with `U` proper, substituted into another bound that mentions α
/// inside a type: `β <: List<α>` gives `‹β <: List<U>›`.
fn substitute_instantiation(
    db: &dyn TypeDatabase,
    views: &[(TypeId, Relation, TypeId)],
    other: TypeBound,
    soft: bool,
    out: &mut Vec<Derived>,
) {
    for &(var, relation, value) in views {
        if relation != Relation::Same || !is_proper(db, value) {
            continue;
        }
        if other.other == var || !mentions(db, other.other, var) {
            continue;
        }
        let mut subst = TypeSubstitution::new();
        subst.insert(var, value);
        let left = if other.var == var { value } else { other.var };
        let right = instantiate_type(db, other.other, &subst);
        let relation = match other.relation {
            Relation::Same => ConstraintRelation::Same,
            Relation::Subtype => ConstraintRelation::Subtype,
            Relation::Supertype => ConstraintRelation::Supertype,
        };
        push(out, left, relation, right, soft);
    }
}

/// Declared bound of parameter `i` of the captured class, with the class's
/// parameters replaced by the capture variables.
fn declared_bound(db: &dyn TypeDatabase, capture: &CaptureBound, i: usize) -> TypeId {
    let Some((decl_id, _)) = db.class_parts(capture.captured) else {
        return TypeId::OBJECT;
    };
    let Some(decl) = db.class_decl(decl_id) else {
        return TypeId::OBJECT;
    };
    let Some(&param) = decl.type_params.get(i) else {
        return TypeId::OBJECT;
    };
    let subst = TypeSubstitution::from_params(db, &decl.type_params, &capture.vars);
    let bounds: Vec<TypeId> = db
        .type_param_bounds(param)
        .into_iter()
        .map(|b| instantiate_type(db, b, &subst))
        .collect();
    db.intersection(bounds)
}

fn captured_args(db: &dyn TypeDatabase, capture: &CaptureBound) -> Vec<TypeId> {
    db.class_parts(capture.captured)
        .map(|(_, args)| args.to_vec())
        .unwrap_or_default()
}

/// Bounds implied by a capture bound on its own.
fn expand_capture(
    db: &dyn TypeDatabase,
    capture: &CaptureBound,
    bounds: &BoundSet,
    out: &mut Vec<Derived>,
) {
    trace!(vars = capture.vars.len(), captured = capture.captured.0, "expand capture");
    let args = captured_args(db, capture);
    for (i, (&var, &arg)) in capture.vars.iter().zip(args.iter()).enumerate() {
        let declared = declared_bound(db, capture, i);
        if declared != TypeId::OBJECT {
            push(out, var, ConstraintRelation::Subtype, declared, false);
        }
        match db.as_wildcard(arg) {
            None => push(out, var, ConstraintRelation::Same, arg, false),
            Some(Wildcard::Unbounded) => {}
            Some(Wildcard::Extends(upper)) => {
                push(out, var, ConstraintRelation::Subtype, upper, false)
            }
            Some(Wildcard::Super(lower)) => {
                push(out, lower, ConstraintRelation::Subtype, var, false)
            }
        }
    }
    // Newly expanded captures must also see the bounds already present.
    for index in 0..bounds.len() {
        if let Some((b, soft)) = bounds.bound_at(index) {
            capture_rules(db, capture, b, soft, out);
        }
    }
}

/// Implications of `G<α1..αn> = capture(G<A1..An>)` for one type bound
/// whose other side is not an inference variable.
fn capture_rules(
    db: &dyn TypeDatabase,
    capture: &CaptureBound,
    bound: TypeBound,
    soft: bool,
    out: &mut Vec<Derived>,
) {
    let Some(i) = capture.vars.iter().position(|&v| v == bound.var) else {
        return;
    };
    let r = bound.other;
    if db.is_inference_var(r) {
        return;
    }
    let args = captured_args(db, capture);
    let Some(&arg) = args.get(i) else {
        return;
    };
    let Some(wildcard) = db.as_wildcard(arg) else {
        return;
    };
    let declared = declared_bound(db, capture, i);
    let contradiction = Derived {
        left: bound.var,
        relation: match bound.relation {
            Relation::Same => ConstraintRelation::Same,
            Relation::Subtype => ConstraintRelation::Subtype,
            Relation::Supertype => ConstraintRelation::Supertype,
        },
        right: r,
        soft,
        contradiction: true,
    };
    match (bound.relation, wildcard) {
        (Relation::Same, _) => out.push(contradiction),
        (Relation::Subtype, Wildcard::Unbounded | Wildcard::Super(_)) => {
            push(out, declared, ConstraintRelation::Subtype, r, soft)
        }
        (Relation::Subtype, Wildcard::Extends(upper)) => {
            if declared == TypeId::OBJECT {
                push(out, upper, ConstraintRelation::Subtype, r, soft);
            }
            if upper == TypeId::OBJECT {
                push(out, declared, ConstraintRelation::Subtype, r, soft);
            }
        }
        (Relation::Supertype, Wildcard::Super(lower)) => {
            push(out, r, ConstraintRelation::Subtype, lower, soft)
        }
        (Relation::Supertype, _) => out.push(contradiction),
    }
}

#[cfg(test)]
#[path = "../../tests/incorporate_tests.rs"]
mod tests;
