//! Resolution: choose instantiations for inference variables.
//!
//! Variables are resolved in dependency order. Each round takes the smallest
//! dependency-closed set of uninstantiated variables and tries to instantiate
//! them directly from their proper bounds (lub of lower bounds, otherwise
//! `RuntimeException` for unconstrained `throws` variables, otherwise glb of
//! upper bounds). If that fails, or a variable is captured, the set is
//! instantiated with fresh capture variables instead. Both attempts run on a
//! copy of the bound set, so a failed attempt leaves no trace.

use super::bound::{Relation, TypeBound};
use super::bound_set::BoundSet;
use super::incorporate::incorporate;
use crate::db::TypeDatabase;
use crate::error::{InferenceError, SessionFlags};
use crate::instantiate::instantiate_type;
use crate::lub::{glb, lub};
use crate::subtype::SubtypeChecker;
use crate::types::{TypeData, TypeId};
use fixedbitset::FixedBitSet;
use gti_common::InferenceOptions;
use indexmap::IndexSet;
use tracing::debug;

/// Resolve `vars` and everything they depend on.
pub fn resolve(
    db: &dyn TypeDatabase,
    options: &InferenceOptions,
    bounds: &mut BoundSet,
    vars: &[TypeId],
) -> Result<SessionFlags, InferenceError> {
    let mut flags = SessionFlags::empty();
    let mut rounds = 0u32;

    loop {
        let graph = DependencyGraph::build(db, bounds);
        let pending: Vec<usize> = graph.closure_of(bounds, vars.iter().copied());
        if pending.is_empty() {
            return Ok(flags);
        }
        rounds += 1;
        if rounds > options.max_resolution_rounds {
            return Err(InferenceError::ResolutionStall {
                uninstantiated: pending.len(),
            });
        }

        let chosen = pending
            .iter()
            .map(|&i| graph.closure_of(bounds, [graph.vars[i]]))
            .min_by_key(|set| set.len())
            .unwrap_or_default();
        let mut batch: Vec<TypeId> = chosen.iter().map(|&i| graph.vars[i]).collect();
        batch.sort_by_key(|&v| db.infer_var(v).map_or(u32::MAX, |id| id.0));
        debug!(round = rounds, batch = batch.len(), pending = pending.len(), "resolution round");

        let before = bounds.num_uninstantiated(&batch);
        let captured = batch.iter().any(|&v| bounds.is_captured(v));
        let direct = if captured {
            None
        } else {
            match instantiate_directly(db, options, bounds, &batch) {
                Ok((candidate, f)) => Some((candidate, f)),
                Err(err) => {
                    debug!(error = %err.describe(db), "direct instantiation failed");
                    None
                }
            }
        };
        let (candidate, round_flags) = match direct {
            Some(result) => result,
            None => {
                let (candidate, f) = capture_fallback(db, options, bounds, &batch)?;
                (candidate, f | SessionFlags::CAPTURE_FALLBACK)
            }
        };
        let after = candidate.num_uninstantiated(&batch);
        if after >= before {
            return Err(InferenceError::ResolutionStall { uninstantiated: after });
        }
        *bounds = candidate;
        flags |= round_flags;
    }
}

/// Resolve every variable known to the bound set.
pub fn resolve_all(
    db: &dyn TypeDatabase,
    options: &InferenceOptions,
    bounds: &mut BoundSet,
) -> Result<SessionFlags, InferenceError> {
    let vars: Vec<TypeId> = bounds.variables().collect();
    resolve(db, options, bounds, &vars)
}

/// Direct dependencies among the variables of a bound set.
struct DependencyGraph {
    vars: Vec<TypeId>,
    edges: Vec<FixedBitSet>,
}

impl DependencyGraph {
    fn build(db: &dyn TypeDatabase, bounds: &BoundSet) -> Self {
        let vars: Vec<TypeId> = bounds.variables().collect();
        let n = vars.len();
        let mut edges = vec![FixedBitSet::with_capacity(n); n];
        for (i, &a) in vars.iter().enumerate() {
            for (j, &b) in vars.iter().enumerate() {
                if i != j && bounds.depends_on_resolution_of(db, a, b) {
                    edges[i].insert(j);
                }
            }
        }
        DependencyGraph { vars, edges }
    }

    /// Uninstantiated variables reachable from `roots`, roots included.
    fn closure_of(&self, bounds: &BoundSet, roots: impl IntoIterator<Item = TypeId>) -> Vec<usize> {
        let mut seen = FixedBitSet::with_capacity(self.vars.len());
        let mut stack: Vec<usize> = roots
            .into_iter()
            .filter_map(|v| self.vars.iter().position(|&x| x == v))
            .collect();
        while let Some(i) = stack.pop() {
            if seen.contains(i) || bounds.is_instantiated(self.vars[i]) {
                continue;
            }
            seen.insert(i);
            stack.extend(self.edges[i].ones());
        }
        seen.ones().collect()
    }
}

fn instantiate_directly(
    db: &dyn TypeDatabase,
    options: &InferenceOptions,
    bounds: &BoundSet,
    batch: &[TypeId],
) -> Result<(BoundSet, SessionFlags), InferenceError> {
    let mut chosen = Vec::with_capacity(batch.len());
    for &var in batch {
        chosen.push((var, candidate_instantiation(db, bounds, var)?));
    }
    let mut candidate = bounds.clone();
    for (var, ty) in chosen {
        debug!(var = var.0, ty = ty.0, "instantiate");
        if let Some(b) = TypeBound::new(db, var, Relation::Same, ty) {
            candidate.add_bound(db, b, false);
        }
    }
    let flags = incorporate(db, options, &mut candidate)?;
    Ok((candidate, flags))
}

fn candidate_instantiation(
    db: &dyn TypeDatabase,
    bounds: &BoundSet,
    var: TypeId,
) -> Result<TypeId, InferenceError> {
    let lowers = bounds.lower_bounds(db, var, true);
    if !lowers.is_empty() {
        return Ok(lub(db, &lowers));
    }
    let uppers = bounds.upper_bounds(db, var, true);
    if bounds.is_throws(var) {
        let mut checker = SubtypeChecker::new(db);
        if uppers
            .iter()
            .all(|&u| checker.is_subtype(TypeId::RUNTIME_EXCEPTION, u))
        {
            return Ok(TypeId::RUNTIME_EXCEPTION);
        }
    }
    if uppers.is_empty() {
        return Err(InferenceError::ResolutionStall { uninstantiated: 1 });
    }
    glb(db, &uppers).ok_or(InferenceError::NoSolution {
        left: var,
        relation: super::constraint::ConstraintRelation::Subtype,
        right: db.intersection(uppers),
    })
}

/// Instantiate `batch` with fresh capture variables whose bounds come from
/// the variables' bounds.
fn capture_fallback(
    db: &dyn TypeDatabase,
    options: &InferenceOptions,
    bounds: &BoundSet,
    batch: &[TypeId],
) -> Result<(BoundSet, SessionFlags), InferenceError> {
    let mut candidate = bounds.clone();
    let resolved: IndexSet<TypeId> = batch.iter().copied().collect();
    candidate.remove_captures_of(&resolved);

    let mut theta = bounds.instantiations();
    let fresh: Vec<TypeId> = batch.iter().map(|&var| db.fresh_capture(var)).collect();
    for (&var, &cap) in batch.iter().zip(fresh.iter()) {
        theta.insert(var, cap);
    }

    let mut checker = SubtypeChecker::new(db);
    for (&var, &cap) in batch.iter().zip(fresh.iter()) {
        let lowers = bounds.lower_bounds(db, var, true);
        let lower = (!lowers.is_empty()).then(|| lub(db, &lowers));
        let uppers: Vec<TypeId> = bounds
            .upper_bounds(db, var, false)
            .into_iter()
            .map(|u| instantiate_type(db, u, &theta))
            .collect();
        let upper = if uppers.is_empty() {
            TypeId::OBJECT
        } else {
            glb(db, &uppers).ok_or(InferenceError::NoSolution {
                left: var,
                relation: super::constraint::ConstraintRelation::Subtype,
                right: db.intersection(uppers.clone()),
            })?
        };
        if let Some(lower) = lower
            && !checker.is_subtype(lower, upper)
        {
            return Err(InferenceError::NoSolution {
                left: lower,
                relation: super::constraint::ConstraintRelation::Subtype,
                right: upper,
            });
        }
        if let Some(TypeData::Capture(id)) = db.lookup(cap) {
            db.set_capture_bounds(id, upper, lower);
        }
        debug!(var = var.0, capture = cap.0, upper = upper.0, "capture fallback");
        if let Some(b) = TypeBound::new(db, var, Relation::Same, cap) {
            candidate.add_bound(db, b, false);
        }
    }
    let flags = incorporate(db, options, &mut candidate)?;
    Ok((candidate, flags))
}

#[cfg(test)]
#[path = "../../tests/resolve_tests.rs"]
mod tests;
