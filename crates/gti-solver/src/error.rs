//! Inference failures and soft outcome flags.

use crate::db::TypeDatabase;
use crate::expr::ExprId;
use crate::format::TypeFormatter;
use crate::infer::constraint::ConstraintRelation;
use crate::types::{MethodId, TypeId};
use bitflags::bitflags;
use thiserror::Error;

/// Coarse classification of a failure for the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The bound set reached `false`: no instantiation exists.
    NoSolution,
    /// A referenced type was unavailable. Recorded, not necessarily fatal.
    IncompleteInformation,
    /// A structural contradiction or protocol violation.
    HardFailure,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("no solution: type {} {relation} type {}", .left.0, .right.0)]
    NoSolution {
        left: TypeId,
        relation: ConstraintRelation,
        right: TypeId,
    },
    #[error("structural mismatch between type {} and type {}", .left.0, .right.0)]
    StructuralMismatch { left: TypeId, right: TypeId },
    #[error("resolution made no progress with {uninstantiated} variables left")]
    ResolutionStall { uninstantiated: usize },
    #[error("incorporation did not converge after {rounds} rounds")]
    IncorporationLimit { rounds: u32 },
    #[error("incomplete information: {missing}")]
    IncompleteInformation { missing: String },
    #[error("arity mismatch: expected {expected}, found {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("type {} is not a functional interface", .ty.0)]
    NotFunctionalInterface { ty: TypeId },
    #[error("no applicable candidate at expression {}", .site.0)]
    NoApplicableCandidate { site: ExprId },
    #[error("ambiguous invocation at expression {}: {} candidates", .site.0, .candidates.len())]
    Ambiguous {
        site: ExprId,
        candidates: Vec<MethodId>,
    },
    #[error("nested inference deeper than {depth}")]
    NestingTooDeep { depth: u32 },
    #[error("unknown inference session {id}")]
    UnknownSession { id: u32 },
}

impl InferenceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            InferenceError::NoSolution { .. }
            | InferenceError::ResolutionStall { .. }
            | InferenceError::IncorporationLimit { .. }
            | InferenceError::ArityMismatch { .. } => FailureKind::NoSolution,
            InferenceError::IncompleteInformation { .. } => FailureKind::IncompleteInformation,
            InferenceError::StructuralMismatch { .. }
            | InferenceError::NotFunctionalInterface { .. }
            | InferenceError::NoApplicableCandidate { .. }
            | InferenceError::Ambiguous { .. }
            | InferenceError::NestingTooDeep { .. }
            | InferenceError::UnknownSession { .. } => FailureKind::HardFailure,
        }
    }

    /// Like `Display`, with types rendered by name.
    pub fn describe(&self, db: &dyn TypeDatabase) -> String {
        let fmt = TypeFormatter::new(db);
        match self {
            InferenceError::NoSolution {
                left,
                relation,
                right,
            } => format!(
                "no solution: {} {relation} {}",
                fmt.format(*left),
                fmt.format(*right)
            ),
            InferenceError::StructuralMismatch { left, right } => format!(
                "structural mismatch between {} and {}",
                fmt.format(*left),
                fmt.format(*right)
            ),
            InferenceError::NotFunctionalInterface { ty } => {
                format!("{} is not a functional interface", fmt.format(*ty))
            }
            other => other.to_string(),
        }
    }
}

bitflags! {
    /// Soft outcomes recorded on a session instead of failing it.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SessionFlags: u8 {
        const UNCHECKED_CONVERSION = 1 << 0;
        const RAW_LENIENCY = 1 << 1;
        const MISSING_TYPE = 1 << 2;
        const USES_VARARGS = 1 << 3;
        const CAPTURE_FALLBACK = 1 << 4;
    }
}

impl SessionFlags {
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

#[cfg(test)]
#[path = "../tests/error_tests.rs"]
mod tests;
