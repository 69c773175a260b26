//! The inference engine: session storage and the reduce / incorporate
//! plumbing shared by every phase.
//!
//! Sessions live in a slot vector indexed by `SessionId`. Every operation
//! looks its session up by id, so an outer session can be reached from an
//! inner one (and vice versa) without aliasing mutable references. Released
//! slots go on a free list and are handed out again by `new_session`.

use super::bound::{Relation, TypeBound};
use super::constraint::{Constraint, ConstraintRelation};
use super::incorporate::incorporate;
use super::reduce::TypeReducer;
use super::session::{InferenceSession, ResolvedInvocation, SessionCheckpoint, SessionId};
use super::variable::{VariableMap, new_variable};
use crate::db::TypeDatabase;
use crate::error::InferenceError;
use crate::expr::{ExprArena, ExprId};
use crate::types::{MethodId, TypeData, TypeId};
use gti_common::InferenceOptions;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

pub struct InferenceEngine<'a> {
    pub(crate) db: &'a dyn TypeDatabase,
    pub(crate) exprs: &'a ExprArena,
    pub(crate) options: InferenceOptions,
    pub(crate) sessions: Vec<Option<InferenceSession>>,
    free_slots: Vec<u32>,
    pub(crate) results: FxHashMap<ExprId, ResolvedInvocation>,
    /// Current nesting of invocation resolution.
    pub(crate) depth: u32,
}

impl<'a> InferenceEngine<'a> {
    pub fn new(db: &'a dyn TypeDatabase, exprs: &'a ExprArena, options: InferenceOptions) -> Self {
        InferenceEngine {
            db,
            exprs,
            options,
            sessions: Vec::new(),
            free_slots: Vec::new(),
            results: FxHashMap::default(),
            depth: 0,
        }
    }

    pub fn db(&self) -> &'a dyn TypeDatabase {
        self.db
    }

    pub fn exprs(&self) -> &'a ExprArena {
        self.exprs
    }

    pub fn options(&self) -> &InferenceOptions {
        &self.options
    }

    pub fn session(&self, id: SessionId) -> Result<&InferenceSession, InferenceError> {
        self.sessions
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(InferenceError::UnknownSession { id: id.0 })
    }

    pub(crate) fn session_mut(&mut self, id: SessionId) -> Result<&mut InferenceSession, InferenceError> {
        self.sessions
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(InferenceError::UnknownSession { id: id.0 })
    }

    /// Number of live sessions.
    pub fn live_sessions(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_some()).count()
    }

    /// The recorded result for an invocation site.
    pub fn resolved(&self, site: ExprId) -> Option<&ResolvedInvocation> {
        self.results.get(&site)
    }

    pub fn results(&self) -> impl Iterator<Item = (&ExprId, &ResolvedInvocation)> {
        self.results.iter()
    }

    /// Drop a session whose result has been consumed. Its id may be reused
    /// by a later session.
    pub fn release_session(&mut self, id: SessionId) {
        if let Some(slot) = self.sessions.get_mut(id.0 as usize)
            && slot.take().is_some()
        {
            self.free_slots.push(id.0);
            trace!(session = %id, "release session");
        }
    }

    /// Release `id` and every session nested under it.
    pub(crate) fn release_tree(&mut self, id: SessionId) {
        let nested: Vec<SessionId> = self
            .session(id)
            .map(|s| s.nested.iter().map(|&(_, n)| n).collect())
            .unwrap_or_default();
        for n in nested {
            self.release_tree(n);
        }
        self.release_session(id);
    }

    /// Create a session for invoking `method` at `site`.
    ///
    /// The initial bound set has `α <: Bθ` for each declared bound `B` of a
    /// type parameter (`α <: Object` when there is none), `throws α` for
    /// type parameters named in the throws clause, and `α = A` for explicit
    /// type arguments.
    pub fn new_session(
        &mut self,
        site: ExprId,
        method: MethodId,
        explicit_type_args: &[TypeId],
        outer: Option<SessionId>,
    ) -> Result<SessionId, InferenceError> {
        let db = self.db;
        let sig = db
            .method_sig(method)
            .ok_or_else(|| InferenceError::IncompleteInformation {
                missing: format!("method {}", method.0),
            })?;
        if !explicit_type_args.is_empty() && explicit_type_args.len() != sig.type_params.len() {
            return Err(InferenceError::ArityMismatch {
                expected: sig.type_params.len(),
                actual: explicit_type_args.len(),
            });
        }
        let args = self
            .exprs
            .invocation_of(site)
            .map(|inv| inv.args.clone())
            .unwrap_or_default();

        let id = SessionId(self.free_slots.pop().unwrap_or(self.sessions.len() as u32));
        let mut session = InferenceSession::new(id, site, method, sig.clone(), args, outer);
        session.explicit_type_args = explicit_type_args.to_vec();
        session.variables = sig
            .type_params
            .iter()
            .map(|&p| new_variable(db, Some(p), site))
            .collect();
        session.theta = VariableMap::new(db, &sig.type_params, &session.variables);

        for (var, &param) in session.variables.iter().zip(sig.type_params.iter()) {
            session.bounds.register(var.ty);
            for declared in db.type_param_bounds(param) {
                let upper = session.theta.substitute(db, declared);
                if let Some(b) = TypeBound::new(db, var.ty, Relation::Subtype, upper) {
                    session.bounds.add_bound(db, b, false);
                }
            }
        }
        for &thrown in &sig.thrown {
            if let Some(TypeData::TypeParameter(p)) = db.lookup(thrown)
                && sig.type_params.contains(&p)
            {
                let var = session.theta.substitute(db, thrown);
                session.bounds.add_throws(var);
            }
        }
        for (var, &arg) in session.variables.iter().zip(explicit_type_args.iter()) {
            if let Some(b) = TypeBound::new(db, var.ty, Relation::Same, arg) {
                session.bounds.add_bound(db, b, false);
            }
        }

        debug!(
            session = %id,
            site = site.0,
            method = method.0,
            vars = session.variables.len(),
            outer = ?outer,
            "new inference session"
        );
        match self.sessions.get_mut(id.0 as usize) {
            Some(slot) => *slot = Some(session),
            None => self.sessions.push(Some(session)),
        }
        Ok(id)
    }

    pub(crate) fn checkpoint(&self, id: SessionId) -> Result<SessionCheckpoint, InferenceError> {
        Ok(self.session(id)?.checkpoint())
    }

    pub(crate) fn restore(&mut self, id: SessionId, checkpoint: SessionCheckpoint) -> Result<(), InferenceError> {
        let abandoned = self.session_mut(id)?.restore(checkpoint);
        for nested in abandoned {
            self.release_tree(nested);
        }
        Ok(())
    }

    pub(crate) fn push_constraint(&mut self, id: SessionId, constraint: Constraint) -> Result<(), InferenceError> {
        self.session_mut(id)?.pending.push_back(constraint);
        Ok(())
    }

    /// Reduce pending constraints until the queue is empty. Reduction may
    /// append to the queue.
    pub(crate) fn reduce_pending(&mut self, id: SessionId) -> Result<(), InferenceError> {
        self.drain_inbox(id)?;
        while let Some(constraint) = self.session_mut(id)?.pending.pop_front() {
            self.reduce_constraint(id, constraint)?;
        }
        Ok(())
    }

    pub(crate) fn reduce_constraint(&mut self, id: SessionId, constraint: Constraint) -> Result<(), InferenceError> {
        match constraint {
            Constraint::Type {
                left,
                relation,
                right,
                soft,
            } => self.reduce_types(id, left, relation, right, soft),
            Constraint::Expression { expr, target, soft } => {
                self.reduce_expression(id, expr, target, soft)
            }
            Constraint::Exception { expr, target, .. } => self.reduce_exception(id, expr, target),
        }
    }

    /// Reduce a type formula straight into the session's bound set.
    pub(crate) fn reduce_types(
        &mut self,
        id: SessionId,
        left: TypeId,
        relation: ConstraintRelation,
        right: TypeId,
        soft: bool,
    ) -> Result<(), InferenceError> {
        let db = self.db;
        let mut reducer = TypeReducer::new(db, &self.options);
        let mut out = Vec::new();
        let result = reducer.reduce(left, relation, right, &mut out);
        let session = self
            .sessions
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(InferenceError::UnknownSession { id: id.0 })?;
        session.flags |= reducer.flags;
        for name in reducer.missing {
            if !session.missing.contains(&name) {
                session.missing.push(name);
            }
        }
        if let Err(err) = result {
            debug!(session = %id, error = %err.describe(db), "reduction failed");
            return Err(err);
        }
        for bound in out {
            session.bounds.add_bound(db, bound, soft);
        }
        Ok(())
    }

    pub(crate) fn incorporate_session(&mut self, id: SessionId) -> Result<(), InferenceError> {
        self.drain_inbox(id)?;
        let db = self.db;
        let session = self
            .sessions
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(InferenceError::UnknownSession { id: id.0 })?;
        let flags = incorporate(db, &self.options, &mut session.bounds)?;
        session.flags |= flags;
        Ok(())
    }

    /// Nesting guard shared by invocation resolution and poly reduction.
    pub(crate) fn enter_nested(&mut self) -> Result<(), InferenceError> {
        if self.depth >= self.options.max_nested_depth {
            return Err(InferenceError::NestingTooDeep {
                depth: self.options.max_nested_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
#[path = "../../tests/session_tests.rs"]
mod tests;
