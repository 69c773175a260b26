//! Centralized limits for the inference engine.
//!
//! Every loop or recursion in the engine that is not structurally bounded is
//! capped by one of these constants. Exceeding a cap is never a panic: the
//! affected operation reports a failure and the caller decides what to do.
//!
//! # Categories
//!
//! - **Operation Counts**: caps on fixed-point loops (incorporation, resolution)
//! - **Recursion Depths**: caps on structural recursion over types and sessions
//!
//! The runtime-tunable subset is mirrored in
//! [`InferenceOptions`](crate::options::InferenceOptions); these constants are
//! its defaults.

// =============================================================================
// Operation Count Limits
// =============================================================================

/// Maximum number of incorporation passes over a bound set.
///
/// Incorporation is a closure computation: each pass pairs newly added bounds
/// with the existing ones and may derive more. On well-formed input the set
/// saturates after a handful of passes; this cap only stops pathological
/// growth (for example `α <: List<α>` style self-reference feeding itself).
pub const MAX_INCORPORATION_ROUNDS: u32 = 256;

/// Maximum number of newly derived bounds accepted in one incorporation call.
///
/// Backstops [`MAX_INCORPORATION_ROUNDS`] when a single pass keeps producing
/// distinct bounds over ever larger types.
pub const MAX_DERIVED_BOUNDS: usize = 20_000;

/// Maximum number of resolve-one-component iterations in a single resolution.
///
/// Each iteration instantiates at least one variable when it succeeds, so the
/// natural bound is the variable count. The cap catches a non-progressing loop.
pub const MAX_RESOLUTION_ROUNDS: u32 = 512;

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting of poly invocations inside one another.
///
/// `f(g(h(...)))` opens one session per level. Past this depth the engine
/// reports `NestingTooDeep` for the innermost site.
pub const MAX_NESTED_SESSION_DEPTH: u32 = 64;

/// Maximum depth of the structural subtype check.
///
/// Recursive class hierarchies such as `Enum<E extends Enum<E>>` can produce
/// unbounded `as_super` chains when combined with wildcards; the checker
/// answers `false` past this depth.
pub const MAX_SUBTYPE_DEPTH: u32 = 100;

/// Maximum depth of least-upper-bound computation.
///
/// `lub(Integer, String)` recurses into `lub(Comparable<Integer>, Comparable<String>)`
/// and then into their arguments. Past this depth the argument becomes an
/// unbounded wildcard.
pub const MAX_LUB_DEPTH: u32 = 8;

/// Maximum depth for type substitution.
///
/// Substitution is structural and terminates on finite types; the cap guards
/// against cyclic capture bounds that would otherwise be expanded forever.
pub const MAX_INSTANTIATION_DEPTH: u32 = 50;

/// Stack headroom (bytes) below which nested inference grows the stack.
pub const NESTED_STACK_RED_ZONE: usize = 128 * 1024;

/// Size (bytes) of each stack segment allocated for nested inference.
pub const NESTED_STACK_SEGMENT: usize = 2 * 1024 * 1024;
