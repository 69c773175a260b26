//! Applicability inference, invocation type inference and the invocation
//! driver.

use super::bound::{Bound, CaptureBound, Relation};
use super::bound_set::BoundSet;
use super::constraint::{Constraint, ConstraintRelation};
use super::cycle::select_constraints;
use super::engine::InferenceEngine;
use super::incorporate::incorporate;
use super::resolve::{resolve, resolve_all};
use super::session::{ResolvedInvocation, SessionId, SessionPhase};
use crate::error::{InferenceError, SessionFlags};
use crate::expr::ExprId;
use crate::functional::functional_signature;
use crate::instantiate::instantiate_type;
use crate::subtype::{Compatibility, SubtypeChecker};
use crate::types::{MethodId, TypeData, TypeId};
use crate::visitor::{contains_type_parameters, is_proper};
use gti_common::limits::{NESTED_STACK_RED_ZONE, NESTED_STACK_SEGMENT};
use indexmap::IndexSet;
use tracing::debug;

impl<'a> InferenceEngine<'a> {
    /// Whether the session's method is applicable to its arguments.
    ///
    /// Tries fixed arity first, then variable arity for varargs methods.
    /// Each attempt works on a checkpoint and is rolled back on failure. On
    /// success the bound set is saved as B2.
    pub fn infer_applicability(&mut self, id: SessionId) -> Result<(), InferenceError> {
        let session = self.session(id)?;
        if session.phase >= SessionPhase::ApplicabilityDone {
            return Ok(());
        }
        let n_args = session.args.len();
        let n_params = session.sig.params.len();
        let mut modes = Vec::with_capacity(2);
        if n_args == n_params {
            modes.push(false);
        }
        if session.sig.varargs && n_params > 0 && n_args + 1 >= n_params {
            modes.push(true);
        }
        if modes.is_empty() {
            return Err(InferenceError::ArityMismatch {
                expected: n_params,
                actual: n_args,
            });
        }

        let mut last_err = None;
        for variable_arity in modes {
            let checkpoint = self.checkpoint(id)?;
            match self.try_applicability(id, variable_arity) {
                Ok(()) => {
                    let session = self.session_mut(id)?;
                    session.variable_arity = variable_arity;
                    if variable_arity {
                        session.flags |= SessionFlags::USES_VARARGS;
                    }
                    session.applicability_bounds = Some(session.bounds.clone());
                    session.advance(SessionPhase::ApplicabilityDone);
                    debug!(session = %id, variable_arity, "applicable");
                    return Ok(());
                }
                Err(err) => {
                    debug!(session = %id, variable_arity, error = %err.describe(self.db), "not applicable");
                    self.restore(id, checkpoint)?;
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or(InferenceError::ArityMismatch {
            expected: n_params,
            actual: n_args,
        }))
    }

    fn try_applicability(&mut self, id: SessionId, variable_arity: bool) -> Result<(), InferenceError> {
        let db = self.db;
        let exprs = self.exprs;
        let soft = self.options.raw_type_leniency;
        let session = self.session(id)?;
        let sig = session.sig.clone();
        let args = session.args.clone();
        let method_params: Vec<TypeId> = sig.type_params.iter().map(|&p| db.type_param(p)).collect();

        let mut pertinent = Vec::new();
        let mut deferred = Vec::new();
        for (i, &arg) in args.iter().enumerate() {
            let Some(formal) = sig.param_for_arg(db, i, variable_arity) else {
                return Err(InferenceError::ArityMismatch {
                    expected: sig.params.len(),
                    actual: args.len(),
                });
            };
            let target = session.theta.substitute(db, formal);
            if exprs.is_pertinent_to_applicability(db, arg, formal, &method_params) {
                pertinent.push(Constraint::Expression {
                    expr: arg,
                    target,
                    soft,
                });
            } else {
                self.check_potentially_compatible(arg, formal, &method_params)?;
                deferred.push(Constraint::Expression {
                    expr: arg,
                    target,
                    soft,
                });
                deferred.push(Constraint::Exception {
                    expr: arg,
                    target,
                    soft,
                });
            }
        }

        let session = self.session_mut(id)?;
        session.pending.extend(pertinent);
        session.deferred.extend(deferred);
        self.reduce_pending(id)?;
        self.incorporate_session(id)?;

        // The bound set, with the bounds staged by poly arguments, must be
        // resolvable; the resolution itself is thrown away.
        let mut trial = self.session(id)?.bounds.clone();
        let staged = self.staged_inner_bounds(id)?;
        if !staged.is_empty() {
            for bounds in &staged {
                trial.merge(db, bounds);
            }
            incorporate(db, &self.options, &mut trial)?;
        }
        resolve_all(db, &self.options, &mut trial)?;
        Ok(())
    }

    /// Potential compatibility of an argument that is not pertinent to
    /// applicability: lambda and method reference shapes must fit the
    /// target's function type.
    fn check_potentially_compatible(
        &self,
        arg: ExprId,
        formal: TypeId,
        method_params: &[TypeId],
    ) -> Result<(), InferenceError> {
        use crate::expr::ExprKind;
        let db = self.db;
        if method_params.contains(&formal) {
            return Ok(());
        }
        match self.exprs.kind(arg) {
            Some(ExprKind::Lambda(lambda)) => {
                let f = functional_signature(db, formal)
                    .ok_or(InferenceError::NotFunctionalInterface { ty: formal })?;
                if f.arity() != lambda.arity() {
                    return Err(InferenceError::ArityMismatch {
                        expected: f.arity(),
                        actual: lambda.arity(),
                    });
                }
                Ok(())
            }
            Some(ExprKind::MethodRef(mref)) => {
                let f = functional_signature(db, formal)
                    .ok_or(InferenceError::NotFunctionalInterface { ty: formal })?;
                let fits = mref.candidates.iter().any(|&m| {
                    db.method_sig(m).is_some_and(|sig| {
                        let k = sig.params.len();
                        f.arity() == k || (mref.unbound_receiver.is_some() && f.arity() == k + 1)
                    })
                });
                if fits {
                    Ok(())
                } else {
                    Err(InferenceError::ArityMismatch {
                        expected: f.arity(),
                        actual: mref
                            .candidates
                            .first()
                            .and_then(|&m| db.method_sig(m))
                            .map_or(0, |s| s.params.len()),
                    })
                }
            }
            Some(ExprKind::Paren(inner)) => self.check_potentially_compatible(*inner, formal, method_params),
            Some(ExprKind::Conditional {
                then_branch,
                else_branch,
            }) => {
                self.check_potentially_compatible(*then_branch, formal, method_params)?;
                self.check_potentially_compatible(*else_branch, formal, method_params)
            }
            Some(ExprKind::Switch { arms }) => arms
                .iter()
                .try_for_each(|&a| self.check_potentially_compatible(a, formal, method_params)),
            _ => Ok(()),
        }
    }

    /// Whether the invocation's type depends on its target.
    pub(crate) fn is_poly_session(&self, id: SessionId) -> Result<bool, InferenceError> {
        let session = self.session(id)?;
        Ok(session.explicit_type_args.is_empty()
            && session.sig.is_generic()
            && contains_type_parameters(self.db, session.sig.return_type))
    }

    /// Add `‹Rθ → target›` to the session, with the special cases for
    /// unchecked invocations, wildcard-parameterized returns and variable
    /// returns that must be resolved first.
    pub(crate) fn add_return_compatibility(&mut self, id: SessionId, target: TypeId) -> Result<(), InferenceError> {
        let db = self.db;
        let session = self.session(id)?;
        if session.sig.return_type == TypeId::VOID {
            return Ok(());
        }
        let ret = session.theta.substitute(db, session.sig.return_type);
        let unchecked = session.flags.contains(SessionFlags::UNCHECKED_CONVERSION);

        let source = if unchecked {
            SubtypeChecker::new(db).erasure(ret)
        } else if db.is_wildcard_parameterized(ret) {
            self.capture_return(id, ret)?
        } else if db.is_inference_var(ret) && self.needs_early_resolution(id, ret, target)? {
            let options = self.options.clone();
            let session = self.session_mut(id)?;
            let flags = resolve(db, &options, &mut session.bounds, &[ret])?;
            session.flags |= flags;
            session.bounds.instantiation(ret).unwrap_or(ret)
        } else {
            ret
        };
        debug!(session = %id, source = source.0, target = target.0, "return compatibility");
        self.push_constraint(
            id,
            Constraint::Type {
                left: source,
                relation: ConstraintRelation::Compatible,
                right: target,
                soft: false,
            },
        )?;
        self.reduce_pending(id)?;
        self.incorporate_session(id)
    }

    /// `G<β1..βn>` with a capture bound `G<β1..βn> = capture(ret)`.
    fn capture_return(&mut self, id: SessionId, ret: TypeId) -> Result<TypeId, InferenceError> {
        let db = self.db;
        let Some((decl, args)) = db.class_parts(ret) else {
            return Ok(ret);
        };
        let site = self.session(id)?.site;
        let fresh: Vec<_> = args
            .iter()
            .map(|_| super::variable::new_variable(db, None, site))
            .collect();
        let vars: Vec<TypeId> = fresh.iter().map(|v| v.ty).collect();
        let captured = db.class_type(decl, vars.clone());
        let session = self.session_mut(id)?;
        session.variables.extend(fresh);
        for &v in &vars {
            session.bounds.register(v);
            if let Some(b) = super::bound::TypeBound::new(db, v, Relation::Subtype, TypeId::OBJECT) {
                session.bounds.add_bound(db, b, false);
            }
        }
        session.bounds.add(
            db,
            Bound::Capture(CaptureBound {
                vars,
                captured: ret,
            }),
            false,
        );
        Ok(captured)
    }

    /// A variable return type is resolved before the return constraint when
    /// the target is primitive and the variable has a box-type bound, or the
    /// target is wildcard-parameterized and the variable has a parameterized
    /// equal or lower bound.
    fn needs_early_resolution(&self, id: SessionId, var: TypeId, target: TypeId) -> Result<bool, InferenceError> {
        let db = self.db;
        let bounds = &self.session(id)?.bounds;
        let Some(view) = bounds.bounds_of(var) else {
            return Ok(false);
        };
        let mut candidates = view.same.iter().chain(view.lower.iter()).copied();
        if target.is_primitive() {
            return Ok(candidates.any(crate::conversion::is_box_type));
        }
        if db.is_wildcard_parameterized(target) {
            return Ok(candidates.any(|t| {
                is_proper(db, t) && matches!(db.lookup(t), Some(TypeData::Class(_)))
            }));
        }
        Ok(false)
    }

    /// Infer the invocation type against `expected` (`None` for a standalone
    /// invocation) and record the result for the site and every nested poly
    /// site.
    pub fn infer_invocation_type(
        &mut self,
        id: SessionId,
        expected: Option<TypeId>,
    ) -> Result<ResolvedInvocation, InferenceError> {
        if self.session(id)?.phase < SessionPhase::ApplicabilityDone {
            self.infer_applicability(id)?;
        }
        let poly = self.is_poly_session(id)?;
        {
            let session = self.session_mut(id)?;
            if let Some(b2) = &session.applicability_bounds {
                session.bounds = b2.clone();
            }
            session.accepting_inner_bounds = true;
        }
        self.flush_nested_outboxes(id)?;
        self.incorporate_session(id)?;
        if let Some(target) = expected
            && poly
        {
            self.add_return_compatibility(id, target)?;
        }
        self.process_deferred(id)?;
        self.incorporate_session(id)?;

        let db = self.db;
        let options = self.options.clone();
        let session = self.session_mut(id)?;
        let flags = resolve_all(db, &options, &mut session.bounds)?;
        session.flags |= flags;
        if options.verify_solutions {
            self.verify_solution(id)?;
        }

        let final_bounds = self.session(id)?.bounds.clone();
        let mut result = self.build_result(id, &final_bounds)?;
        if !poly
            && let Some(target) = expected
            && is_proper(db, target)
            && !db.is_missing(target)
        {
            let mut checker = SubtypeChecker::new(db);
            if checker.compatibility(result.return_type, target, options.allow_unchecked_conversion)
                == Compatibility::Incompatible
            {
                return Err(InferenceError::NoSolution {
                    left: result.return_type,
                    relation: ConstraintRelation::Compatible,
                    right: target,
                });
            }
        }
        self.finalize_nested(id, &final_bounds)?;

        let session = self.session_mut(id)?;
        result.flags = session.flags;
        let final_phase = session.outer.is_none() && expected.is_none_or(|t| is_proper(db, t));
        session.advance(if final_phase {
            SessionPhase::TypeDoneFinal
        } else {
            SessionPhase::TypeDone
        });
        session.result = Some(result.clone());
        debug!(session = %id, phase = ?session.phase, "invocation type inferred");
        self.results.insert(result.site, result.clone());
        Ok(result)
    }

    /// Process the deferred constraints: repeatedly take the bottom set (or
    /// one constraint from a cycle), resolve its input variables, substitute
    /// the instantiations and reduce.
    fn process_deferred(&mut self, id: SessionId) -> Result<(), InferenceError> {
        let db = self.db;
        let exprs = self.exprs;
        loop {
            let session = self.session(id)?;
            if session.deferred.is_empty() {
                return Ok(());
            }
            let picked = select_constraints(db, exprs, &session.bounds, &session.deferred);
            if picked.is_empty() {
                return Ok(());
            }
            let mut inputs = IndexSet::new();
            for &i in &picked {
                inputs.extend(session.deferred[i].input_variables(db, exprs));
            }
            let inputs: Vec<TypeId> = inputs.into_iter().collect();

            let options = self.options.clone();
            let session = self.session_mut(id)?;
            let flags = resolve(db, &options, &mut session.bounds, &inputs)?;
            session.flags |= flags;
            let subst = session.bounds.instantiations();

            let mut selected = Vec::with_capacity(picked.len());
            for &i in picked.iter().rev() {
                selected.push(session.deferred.remove(i));
            }
            selected.reverse();
            debug!(session = %id, selected = selected.len(), inputs = inputs.len(), "processing deferred constraints");
            for constraint in selected {
                let constraint = match constraint {
                    Constraint::Expression { expr, target, soft } => Constraint::Expression {
                        expr,
                        target: instantiate_type(db, target, &subst),
                        soft,
                    },
                    Constraint::Exception { expr, target, soft } => Constraint::Exception {
                        expr,
                        target: instantiate_type(db, target, &subst),
                        soft,
                    },
                    other => other,
                };
                session.pending.push_back(constraint);
            }
            self.reduce_pending(id)?;
            self.incorporate_session(id)?;
        }
    }

    /// Substitute the final instantiations back into every bound and check
    /// it still holds.
    pub(crate) fn verify_solution(&self, id: SessionId) -> Result<(), InferenceError> {
        let db = self.db;
        let session = self.session(id)?;
        let lenient = session
            .flags
            .intersects(SessionFlags::RAW_LENIENCY | SessionFlags::UNCHECKED_CONVERSION);
        let subst = session.bounds.instantiations();
        let mut checker = SubtypeChecker::new(db);
        for (bound, soft) in session.bounds.bounds() {
            if soft {
                continue;
            }
            let left = instantiate_type(db, bound.var, &subst);
            let right = instantiate_type(db, bound.other, &subst);
            if !is_proper(db, left) || !is_proper(db, right) {
                continue;
            }
            let (sub, sup) = match bound.relation {
                Relation::Same => {
                    if left == right {
                        continue;
                    }
                    (left, right)
                }
                Relation::Subtype => (left, right),
                Relation::Supertype => (right, left),
            };
            let holds = checker.is_subtype(sub, sup)
                && (bound.relation != Relation::Same || checker.is_subtype(sup, sub))
                || (lenient && checker.compatibility(sub, sup, true) != Compatibility::Incompatible);
            if !holds {
                debug!(session = %id, left = left.0, right = right.0, "solution violates a bound");
                return Err(InferenceError::NoSolution {
                    left,
                    relation: match bound.relation {
                        Relation::Same => ConstraintRelation::Same,
                        _ => ConstraintRelation::Subtype,
                    },
                    right,
                });
            }
        }
        Ok(())
    }

    /// The resolved invocation for session `id` under `bounds`.
    pub(crate) fn build_result(&self, id: SessionId, bounds: &BoundSet) -> Result<ResolvedInvocation, InferenceError> {
        let db = self.db;
        let session = self.session(id)?;
        let subst = bounds.instantiations();
        let apply = |ty: TypeId| instantiate_type(db, session.theta.substitute(db, ty), &subst);
        let type_arguments = session
            .own_variables()
            .iter()
            .map(|v| bounds.instantiation(v.ty).unwrap_or(v.ty))
            .collect();
        let unchecked = session.flags.contains(SessionFlags::UNCHECKED_CONVERSION);
        let mut return_type = apply(session.sig.return_type);
        if unchecked {
            return_type = SubtypeChecker::new(db).erasure(return_type);
        }
        Ok(ResolvedInvocation {
            site: session.site,
            method: session.method,
            type_arguments,
            parameter_types: session.sig.params.iter().map(|&p| apply(p)).collect(),
            return_type,
            thrown: session.sig.thrown.iter().map(|&t| apply(t)).collect(),
            unchecked,
            varargs: session.variable_arity,
            flags: session.flags,
        })
    }

    /// Record results for poly arguments solved inside session `id`.
    fn finalize_nested(&mut self, id: SessionId, bounds: &BoundSet) -> Result<(), InferenceError> {
        let nested = self.session(id)?.nested.clone();
        for (site, inner) in nested {
            let result = self.build_result(inner, bounds)?;
            let session = self.session_mut(inner)?;
            session.advance(SessionPhase::TypeDoneFinal);
            session.result = Some(result.clone());
            self.results.insert(site, result);
            self.finalize_nested(inner, bounds)?;
        }
        Ok(())
    }

    /// Resolve the invocation at `site`: one session per candidate,
    /// applicability filtering, most specific selection, then invocation
    /// type inference for the winner.
    pub fn resolve_invocation(
        &mut self,
        site: ExprId,
        expected: Option<TypeId>,
    ) -> Result<ResolvedInvocation, InferenceError> {
        self.enter_nested()?;
        let result = stacker::maybe_grow(NESTED_STACK_RED_ZONE, NESTED_STACK_SEGMENT, || {
            self.resolve_invocation_inner(site, expected, None)
        });
        self.leave_nested();
        result
    }

    /// Resolve a standalone invocation nested in an argument of session
    /// `outer`. Its type does not depend on the target, so it is solved on
    /// its own and only its return type flows outward.
    pub(crate) fn resolve_nested_invocation(
        &mut self,
        site: ExprId,
        outer: Option<SessionId>,
    ) -> Result<ResolvedInvocation, InferenceError> {
        if let Some(done) = self.results.get(&site) {
            return Ok(done.clone());
        }
        self.enter_nested()?;
        let result = stacker::maybe_grow(NESTED_STACK_RED_ZONE, NESTED_STACK_SEGMENT, || {
            self.resolve_invocation_inner(site, None, outer)
        });
        self.leave_nested();
        result
    }

    fn resolve_invocation_inner(
        &mut self,
        site: ExprId,
        expected: Option<TypeId>,
        outer: Option<SessionId>,
    ) -> Result<ResolvedInvocation, InferenceError> {
        let exprs = self.exprs;
        let inv = exprs
            .invocation_of(site)
            .ok_or_else(|| InferenceError::IncompleteInformation {
                missing: format!("invocation at expression {}", site.0),
            })?;
        debug!(site = site.0, candidates = inv.candidates.len(), "resolve invocation");
        let applicable = self.applicable_candidates(site, &inv.candidates, &inv.explicit_type_args, outer)?;
        let chosen = self.select_most_specific(site, applicable)?;
        self.flush_nested_outboxes(chosen)?;
        self.infer_invocation_type(chosen, expected)
    }

    /// Sessions for every candidate that passes applicability inference.
    /// With a single candidate its failure is reported as is.
    pub(crate) fn applicable_candidates(
        &mut self,
        site: ExprId,
        candidates: &[MethodId],
        explicit_type_args: &[TypeId],
        outer: Option<SessionId>,
    ) -> Result<Vec<(MethodId, SessionId)>, InferenceError> {
        let mut applicable = Vec::new();
        let mut last_err = None;
        for &method in candidates {
            let id = match self.new_session(site, method, explicit_type_args, outer) {
                Ok(id) => id,
                Err(err) => {
                    last_err = Some(err);
                    continue;
                }
            };
            match self.infer_applicability(id) {
                Ok(()) => applicable.push((method, id)),
                Err(err) => {
                    self.release_tree(id);
                    last_err = Some(err);
                }
            }
        }
        if applicable.is_empty() {
            return Err(match (candidates.len(), last_err) {
                (1, Some(err)) => err,
                _ => InferenceError::NoApplicableCandidate { site },
            });
        }
        Ok(applicable)
    }
}

#[cfg(test)]
#[path = "../../tests/invocation_tests.rs"]
mod tests;
