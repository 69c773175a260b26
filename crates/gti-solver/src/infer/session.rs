//! Inference sessions: per-invocation solver state.

use super::bound_set::BoundSet;
use super::constraint::Constraint;
use super::variable::{InferenceVariable, VariableMap};
use crate::error::SessionFlags;
use crate::expr::ExprId;
use crate::types::{MethodId, MethodSig, TypeId};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Progress of a session. Phases only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionPhase {
    NotStarted,
    ApplicabilityDone,
    TypeDone,
    /// Invocation type inferred against a proper target with no enclosing
    /// session; the result will not change.
    TypeDoneFinal,
}

/// The outcome of invocation type inference for one site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedInvocation {
    pub site: ExprId,
    pub method: MethodId,
    pub type_arguments: Vec<TypeId>,
    pub parameter_types: Vec<TypeId>,
    pub return_type: TypeId,
    pub thrown: Vec<TypeId>,
    /// Applicability needed unchecked conversion; the return type is erased.
    pub unchecked: bool,
    pub varargs: bool,
    pub flags: SessionFlags,
}

pub struct InferenceSession {
    pub id: SessionId,
    pub site: ExprId,
    pub method: MethodId,
    pub sig: Arc<MethodSig>,
    pub args: Vec<ExprId>,
    pub explicit_type_args: Vec<TypeId>,
    /// Own variables first, then those inherited from nested sessions.
    pub variables: Vec<InferenceVariable>,
    pub theta: VariableMap,
    pub bounds: BoundSet,
    /// Snapshot taken when applicability inference succeeded.
    pub applicability_bounds: Option<BoundSet>,
    pub phase: SessionPhase,
    pub variable_arity: bool,
    pub outer: Option<SessionId>,
    /// Constraints waiting to be reduced.
    pub pending: VecDeque<Constraint>,
    /// Constraints on arguments not pertinent to applicability, processed
    /// during invocation type inference.
    pub deferred: Vec<Constraint>,
    /// Bounds held for the outer session until overload resolution at this
    /// session's site concludes.
    pub outbox: Option<BoundSet>,
    /// Bounds pushed by nested sessions while this one was not accepting.
    pub inbox: Vec<BoundSet>,
    pub accepting_inner_bounds: bool,
    /// Poly arguments solved as part of this session.
    pub nested: Vec<(ExprId, SessionId)>,
    /// Parameter types of lambdas reduced in this session.
    pub lambda_params: FxHashMap<ExprId, Vec<TypeId>>,
    pub flags: SessionFlags,
    pub missing: Vec<String>,
    pub result: Option<ResolvedInvocation>,
}

impl InferenceSession {
    pub fn new(
        id: SessionId,
        site: ExprId,
        method: MethodId,
        sig: Arc<MethodSig>,
        args: Vec<ExprId>,
        outer: Option<SessionId>,
    ) -> Self {
        InferenceSession {
            id,
            site,
            method,
            sig,
            args,
            explicit_type_args: Vec::new(),
            variables: Vec::new(),
            theta: VariableMap::identity(),
            bounds: BoundSet::new(),
            applicability_bounds: None,
            phase: SessionPhase::NotStarted,
            variable_arity: false,
            outer,
            pending: VecDeque::new(),
            deferred: Vec::new(),
            outbox: None,
            inbox: Vec::new(),
            accepting_inner_bounds: false,
            nested: Vec::new(),
            lambda_params: FxHashMap::default(),
            flags: SessionFlags::empty(),
            missing: Vec::new(),
            result: None,
        }
    }

    /// Move to `phase`; earlier phases are ignored.
    pub fn advance(&mut self, phase: SessionPhase) {
        if phase > self.phase {
            self.phase = phase;
        }
    }

    /// The variable standing for each of the method's own type parameters.
    pub fn own_variables(&self) -> &[InferenceVariable] {
        let n = self.sig.type_params.len().min(self.variables.len());
        &self.variables[..n]
    }

    pub fn has_variable(&self, ty: TypeId) -> bool {
        self.variables.iter().any(|v| v.ty == ty)
    }

    pub fn checkpoint(&self) -> SessionCheckpoint {
        SessionCheckpoint {
            bounds: self.bounds.clone(),
            pending: self.pending.clone(),
            deferred: self.deferred.len(),
            variables: self.variables.len(),
            nested: self.nested.len(),
            lambda_params: self.lambda_params.clone(),
            inbox: self.inbox.len(),
            flags: self.flags,
            missing: self.missing.len(),
        }
    }

    /// Roll back to `checkpoint`. Returns the nested sessions created since,
    /// which the caller must release.
    pub fn restore(&mut self, checkpoint: SessionCheckpoint) -> Vec<SessionId> {
        self.bounds = checkpoint.bounds;
        self.pending = checkpoint.pending;
        self.deferred.truncate(checkpoint.deferred);
        self.variables.truncate(checkpoint.variables);
        self.lambda_params = checkpoint.lambda_params;
        self.inbox.truncate(checkpoint.inbox);
        self.flags = checkpoint.flags;
        self.missing.truncate(checkpoint.missing);
        self.nested
            .drain(checkpoint.nested.min(self.nested.len())..)
            .map(|(_, id)| id)
            .collect()
    }
}

/// Session state saved before a speculative attempt.
#[derive(Clone)]
pub struct SessionCheckpoint {
    bounds: BoundSet,
    pending: VecDeque<Constraint>,
    deferred: usize,
    variables: usize,
    nested: usize,
    lambda_params: FxHashMap<ExprId, Vec<TypeId>>,
    inbox: usize,
    flags: SessionFlags,
    missing: usize,
}

/// An outer session's reduction state, set aside while a poly argument is
/// solved and restored by `resume_suspended`.
#[derive(Debug)]
pub struct SuspendedState {
    pub session: SessionId,
    pub site: ExprId,
    pub(crate) pending: VecDeque<Constraint>,
}
