//! Poly invocations in argument position.
//!
//! An argument `g(..)` whose type depends on its target is not solved on its
//! own. The outer session's reduction state is set aside, the inner
//! invocation goes through overload resolution with the outer session as
//! its parent, and the winner's bound set (B3: its applicability bounds plus
//! `‹R → T›` for the outer formal `T`) is handed to the outer session. The
//! inner variables become outer variables from then on, and the inner
//! session's result is read back once the outer session is resolved.
//!
//! Bounds travel through an outbox. The inner session stages its bound set
//! there once overload resolution at the inner site has picked it. While the
//! outer session is still competing in overload resolution at its own site
//! the staged bounds stay put; applicability of the outer candidate is
//! checked against a copy that includes them. They are flushed when the
//! outer site has chosen its candidate, landing in the outer bound set
//! directly when it is accepting and otherwise in its inbox until the next
//! reduction step.

use super::bound_set::BoundSet;
use super::engine::InferenceEngine;
use super::session::{SessionId, SuspendedState};
use crate::error::{InferenceError, SessionFlags};
use crate::expr::ExprId;
use crate::types::TypeId;
use gti_common::limits::{NESTED_STACK_RED_ZONE, NESTED_STACK_SEGMENT};
use tracing::{debug, trace};

impl<'a> InferenceEngine<'a> {
    /// Set aside the reduction state of session `outer` while the poly
    /// argument at `site` is solved.
    pub(crate) fn enter_poly(&mut self, outer: SessionId, site: ExprId) -> Result<SuspendedState, InferenceError> {
        let session = self.session_mut(outer)?;
        let pending = std::mem::take(&mut session.pending);
        trace!(session = %outer, site = site.0, pending = pending.len(), "suspend for poly argument");
        Ok(SuspendedState {
            session: outer,
            site,
            pending,
        })
    }

    /// Restore a suspended session. When the poly argument was solved by
    /// `inner`, the inner variables and deferred constraints move to the
    /// outer session.
    pub(crate) fn resume_suspended(
        &mut self,
        state: SuspendedState,
        inner: Option<SessionId>,
    ) -> Result<(), InferenceError> {
        let SuspendedState {
            session: outer,
            site,
            mut pending,
        } = state;

        let carried = match inner {
            Some(inner) => {
                let session = self.session_mut(inner)?;
                Some((
                    session.variables.clone(),
                    std::mem::take(&mut session.deferred),
                    session.flags - SessionFlags::USES_VARARGS,
                    session.missing.clone(),
                    session.lambda_params.clone(),
                ))
            }
            None => None,
        };

        let session = self.session_mut(outer)?;
        pending.append(&mut session.pending);
        session.pending = pending;
        let Some((variables, deferred, flags, missing, lambda_params)) = carried else {
            return Ok(());
        };
        for var in variables {
            if !session.has_variable(var.ty) {
                session.bounds.register(var.ty);
                session.variables.push(var);
            }
        }
        session.deferred.extend(deferred);
        session.flags |= flags;
        for name in missing {
            if !session.missing.contains(&name) {
                session.missing.push(name);
            }
        }
        for (lambda, params) in lambda_params {
            session.lambda_params.entry(lambda).or_insert(params);
        }
        if let Some(inner) = inner {
            session.nested.push((site, inner));
        }
        debug!(
            session = %outer,
            site = site.0,
            variables = session.variables.len(),
            deferred = session.deferred.len(),
            bounds = session.bounds.len(),
            "resumed after poly argument"
        );
        Ok(())
    }

    /// Stage session `id`'s current bound set for its parent.
    pub(crate) fn push_bounds_to_outer(&mut self, id: SessionId) -> Result<(), InferenceError> {
        self.drain_inbox(id)?;
        let session = self.session_mut(id)?;
        if session.outer.is_some() {
            session.outbox = Some(session.bounds.clone());
        }
        Ok(())
    }

    /// Deliver staged bounds to the parent session.
    pub(crate) fn flush_bound_outbox(&mut self, id: SessionId) -> Result<(), InferenceError> {
        let session = self.session_mut(id)?;
        let (Some(outbox), Some(outer)) = (session.outbox.take(), session.outer) else {
            return Ok(());
        };
        let db = self.db;
        let parent = self.session_mut(outer)?;
        if parent.accepting_inner_bounds {
            parent.bounds.merge(db, &outbox);
            trace!(session = %id, outer = %outer, "bounds merged into outer session");
        } else {
            parent.inbox.push(outbox);
            trace!(session = %id, outer = %outer, "bounds queued for outer session");
        }
        Ok(())
    }

    /// Flush the outboxes of the poly arguments solved in session `id`.
    /// Called once overload resolution at `id`'s site has chosen `id`.
    pub(crate) fn flush_nested_outboxes(&mut self, id: SessionId) -> Result<(), InferenceError> {
        let nested: Vec<SessionId> = self.session(id)?.nested.iter().map(|&(_, n)| n).collect();
        for inner in nested {
            self.flush_bound_outbox(inner)?;
        }
        Ok(())
    }

    /// Bounds staged by the poly arguments of session `id` and not yet
    /// flushed.
    pub(crate) fn staged_inner_bounds(&self, id: SessionId) -> Result<Vec<BoundSet>, InferenceError> {
        let session = self.session(id)?;
        Ok(session
            .nested
            .iter()
            .filter_map(|&(_, inner)| self.session(inner).ok()?.outbox.clone())
            .collect())
    }

    /// Merge bounds queued by nested sessions.
    pub(crate) fn drain_inbox(&mut self, id: SessionId) -> Result<(), InferenceError> {
        let db = self.db;
        let session = self.session_mut(id)?;
        for bounds in std::mem::take(&mut session.inbox) {
            session.bounds.merge(db, &bounds);
        }
        Ok(())
    }

    /// `‹g(..) → target›` for a poly invocation `g(..)` in session `outer`.
    pub(crate) fn reduce_poly_invocation(
        &mut self,
        outer: SessionId,
        expr: ExprId,
        target: TypeId,
        soft: bool,
    ) -> Result<(), InferenceError> {
        self.enter_nested()?;
        let state = match self.enter_poly(outer, expr) {
            Ok(state) => state,
            Err(err) => {
                self.leave_nested();
                return Err(err);
            }
        };
        let solved = stacker::maybe_grow(NESTED_STACK_RED_ZONE, NESTED_STACK_SEGMENT, || {
            self.solve_poly_argument(outer, expr, target, soft)
        });
        let resumed = self.resume_suspended(state, solved.as_ref().ok().copied());
        self.leave_nested();
        let inner = solved?;
        resumed?;
        // Past overload resolution at the outer site the bounds can go
        // straight in.
        if self.session(outer)?.accepting_inner_bounds {
            self.flush_bound_outbox(inner)?;
        }
        Ok(())
    }

    fn solve_poly_argument(
        &mut self,
        outer: SessionId,
        expr: ExprId,
        target: TypeId,
        soft: bool,
    ) -> Result<SessionId, InferenceError> {
        let exprs = self.exprs;
        let inv = exprs
            .invocation_of(expr)
            .ok_or_else(|| InferenceError::IncompleteInformation {
                missing: format!("invocation at expression {}", expr.0),
            })?;
        let applicable = self.applicable_candidates(expr, &inv.candidates, &inv.explicit_type_args, Some(outer))?;
        let chosen = self.select_most_specific(expr, applicable)?;

        {
            let session = self.session_mut(chosen)?;
            if let Some(b2) = &session.applicability_bounds {
                session.bounds = b2.clone();
            }
            session.accepting_inner_bounds = true;
        }
        self.flush_nested_outboxes(chosen)?;
        let checkpoint = self.checkpoint(chosen)?;
        if let Err(err) = self.add_return_compatibility(chosen, target) {
            if !soft {
                self.release_tree(chosen);
                return Err(err);
            }
            debug!(site = expr.0, error = %err.describe(self.db), "lenient return compatibility ignored");
            self.restore(chosen, checkpoint)?;
            self.session_mut(chosen)?.flags |= SessionFlags::RAW_LENIENCY;
        }
        self.push_bounds_to_outer(chosen)?;
        debug!(site = expr.0, session = %chosen, outer = %outer, "poly argument staged");
        Ok(chosen)
    }
}

#[cfg(test)]
#[path = "../../tests/poly_tests.rs"]
mod tests;
