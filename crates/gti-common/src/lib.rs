//! Common types and utilities for the gti generic type inference engine.
//!
//! This crate provides the pieces shared by the solver and its front ends:
//! - Name interning (`Atom`, `NameTable`)
//! - Engine limits and thresholds
//! - Runtime options (`InferenceOptions`)

// Name interning for class and type-parameter names
pub mod interner;
pub use interner::{Atom, NameTable};

// Centralized limits and thresholds
pub mod limits;

// Runtime configuration
pub mod options;
pub use options::InferenceOptions;
