//! Most specific method selection among applicable candidates.

use super::constraint::{Constraint, ConstraintRelation};
use super::engine::InferenceEngine;
use super::expression::is_functional_class_type;
use super::resolve::resolve_all;
use super::session::SessionId;
use crate::error::InferenceError;
use crate::expr::{ExprId, ExprKind};
use crate::functional::functional_signature;
use crate::subtype::{SubtypeChecker, is_subtype_of};
use crate::types::{MethodId, TypeId};
use tracing::debug;

impl<'a> InferenceEngine<'a> {
    /// Pick the single most specific candidate. Fixed-arity candidates win
    /// over variable-arity ones. Losing sessions are released.
    pub(crate) fn select_most_specific(
        &mut self,
        site: ExprId,
        mut applicable: Vec<(MethodId, SessionId)>,
    ) -> Result<SessionId, InferenceError> {
        let mut variable_arity = false;
        if applicable.len() > 1 {
            let mut fixed = Vec::new();
            for &(m, id) in &applicable {
                if !self.session(id)?.variable_arity {
                    fixed.push((m, id));
                }
            }
            if !fixed.is_empty() && fixed.len() < applicable.len() {
                for &(_, id) in &applicable {
                    if !fixed.iter().any(|&(_, f)| f == id) {
                        self.release_tree(id);
                    }
                }
                applicable = fixed;
            } else {
                variable_arity = fixed.is_empty();
            }
        }
        if let [(_, only)] = applicable.as_slice() {
            return Ok(*only);
        }

        let args = self
            .exprs
            .invocation_of(site)
            .map(|inv| inv.args.clone())
            .unwrap_or_default();
        let mut maximal = Vec::new();
        for (i, &(m1, _)) in applicable.iter().enumerate() {
            let mut best = true;
            for (j, &(m2, _)) in applicable.iter().enumerate() {
                if i != j && !self.is_more_specific(site, m1, m2, &args, variable_arity) {
                    best = false;
                    break;
                }
            }
            if best {
                maximal.push(i);
            }
        }
        debug!(
            site = site.0,
            candidates = applicable.len(),
            maximal = maximal.len(),
            variable_arity,
            "most specific"
        );

        if let [winner] = maximal.as_slice() {
            let (_, chosen) = applicable[*winner];
            for &(_, id) in &applicable {
                if id != chosen {
                    self.release_tree(id);
                }
            }
            return Ok(chosen);
        }
        for &(_, id) in &applicable {
            self.release_tree(id);
        }
        Err(InferenceError::Ambiguous {
            site,
            candidates: applicable.into_iter().map(|(m, _)| m).collect(),
        })
    }

    /// `m1` is more specific than `m2` for the arguments at `site`.
    ///
    /// With `variable_arity` both candidates are compared by their first k
    /// expanded parameter types, k being the number of arguments. When `m2`
    /// has k+1 parameters, the k+1'th expanded parameter type of `m1` must
    /// also be a subtype of `m2`'s. Against a generic `m2` this runs a
    /// throwaway inference session for `m2` with `‹Si <: Ti›` for each pair.
    pub fn is_more_specific(
        &mut self,
        site: ExprId,
        m1: MethodId,
        m2: MethodId,
        args: &[ExprId],
        variable_arity: bool,
    ) -> bool {
        let db = self.db;
        let (Some(sig1), Some(sig2)) = (db.method_sig(m1), db.method_sig(m2)) else {
            return false;
        };
        if variable_arity && !(sig1.varargs && sig2.varargs) {
            return false;
        }
        let pairs: Option<Vec<(ExprId, TypeId, TypeId)>> = args
            .iter()
            .enumerate()
            .map(|(i, &arg)| {
                Some((
                    arg,
                    sig1.param_for_arg(db, i, variable_arity)?,
                    sig2.param_for_arg(db, i, variable_arity)?,
                ))
            })
            .collect();
        let Some(pairs) = pairs else {
            return false;
        };
        let k = args.len();
        let trailing = if variable_arity && sig2.params.len() == k + 1 {
            match (sig1.param_for_arg(db, k, true), sig2.param_for_arg(db, k, true)) {
                (Some(s), Some(t)) => Some((s, t)),
                _ => return false,
            }
        } else {
            None
        };

        if !sig2.is_generic() {
            let mut checker = SubtypeChecker::new(db);
            return pairs.iter().all(|&(arg, s, t)| {
                checker.is_subtype(s, t) || self.functional_more_specific(arg, s, t)
            }) && trailing.is_none_or(|(s, t)| checker.is_subtype(s, t));
        }

        let Ok(id) = self.new_session(site, m2, &[], None) else {
            return false;
        };
        let outcome = (|| -> Result<(), InferenceError> {
            for &(arg, s, t) in &pairs {
                let t = self.session(id)?.theta.substitute(db, t);
                let constraint = match self.functional_returns(arg, s, t) {
                    Some((_, TypeId::VOID)) if !is_subtype_of(db, s, t) => continue,
                    Some((rs, rt)) if !is_subtype_of(db, s, t) => {
                        Constraint::types(rs, ConstraintRelation::Subtype, rt)
                    }
                    _ => Constraint::types(s, ConstraintRelation::Subtype, t),
                };
                self.push_constraint(id, constraint)?;
            }
            if let Some((s, t)) = trailing {
                let t = self.session(id)?.theta.substitute(db, t);
                self.push_constraint(id, Constraint::types(s, ConstraintRelation::Subtype, t))?;
            }
            self.reduce_pending(id)?;
            self.incorporate_session(id)?;
            let mut trial = self.session(id)?.bounds.clone();
            resolve_all(db, &self.options, &mut trial)?;
            Ok(())
        })();
        self.release_session(id);
        outcome.is_ok()
    }

    /// Return types of the function types of `s` and `t` when `arg` is an
    /// explicitly typed lambda or an exact method reference and both are
    /// functional interfaces.
    fn functional_returns(&self, arg: ExprId, s: TypeId, t: TypeId) -> Option<(TypeId, TypeId)> {
        let db = self.db;
        let eligible = match self.exprs.kind(arg)? {
            ExprKind::Lambda(lambda) => lambda.is_explicitly_typed(),
            ExprKind::MethodRef(_) => self.exprs.is_exact_method_ref(db, arg),
            _ => false,
        };
        if !eligible || !is_functional_class_type(db, s) || !is_functional_class_type(db, t) {
            return None;
        }
        let rs = functional_signature(db, s)?.return_type;
        let rt = functional_signature(db, t)?.return_type;
        Some((rs, rt))
    }

    /// The functional interface rule: with unrelated `s` and `t`, `s` is
    /// more specific when `t`'s function type returns void, or its return
    /// type is a supertype of `s`'s, or `s` returns a primitive and `t` a
    /// reference.
    fn functional_more_specific(&self, arg: ExprId, s: TypeId, t: TypeId) -> bool {
        let db = self.db;
        let Some((rs, rt)) = self.functional_returns(arg, s, t) else {
            return false;
        };
        if is_subtype_of(db, t, s) {
            return false;
        }
        rt == TypeId::VOID
            || is_subtype_of(db, rs, rt)
            || (rs.is_primitive() && db.is_reference(rt))
    }
}

#[cfg(test)]
#[path = "../../tests/specific_tests.rs"]
mod tests;
