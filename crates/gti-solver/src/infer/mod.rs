//! Constraint-based inference of method type arguments.
//!
//! An inference session owns the inference variables of one invocation and
//! drives them through applicability inference (B2) and invocation type
//! inference (B3 and beyond). Constraint formulas are reduced to bounds,
//! the bound set is closed under incorporation, and resolution picks an
//! instantiation for every variable. Poly invocations in argument position
//! run in nested sessions whose bounds are folded into the enclosing one.

pub mod bound;
pub mod bound_set;
pub mod constraint;
pub mod cycle;
mod engine;
mod expression;
pub mod incorporate;
mod invocation;
mod poly;
pub mod reduce;
pub mod resolve;
pub mod session;
mod specific;
pub mod variable;

pub use bound::{Bound, CaptureBound, Relation, TypeBound};
pub use bound_set::{BoundSet, VarBounds};
pub use constraint::{Constraint, ConstraintRelation};
pub use cycle::{ConstraintGraph, pick_from_cycle, select_constraints};
pub use engine::InferenceEngine;
pub use incorporate::incorporate;
pub use reduce::TypeReducer;
pub use resolve::{resolve, resolve_all};
pub use session::{
    InferenceSession, ResolvedInvocation, SessionCheckpoint, SessionId, SessionPhase, SuspendedState,
};
pub use variable::{InferenceVariable, VariableMap, new_variable};
