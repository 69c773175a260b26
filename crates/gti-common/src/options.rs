//! Runtime configuration for inference sessions.

use crate::limits;
use serde::{Deserialize, Serialize};

/// Options that control how inference behaves.
///
/// The defaults match the modern source level. [`InferenceOptions::legacy`]
/// turns on the raw-type leniency older source levels need, and
/// [`InferenceOptions::strict`] disables every lenient path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InferenceOptions {
    /// Accept `Raw <: G<α>` by instantiating nothing instead of failing.
    ///
    /// The session is flagged as using unchecked conversion when this fires.
    pub raw_type_leniency: bool,
    /// Allow unchecked conversion during compatibility reduction.
    pub allow_unchecked_conversion: bool,
    /// Re-check every solved bound against the final substitution.
    pub verify_solutions: bool,
    pub max_incorporation_rounds: u32,
    pub max_resolution_rounds: u32,
    pub max_nested_depth: u32,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        InferenceOptions {
            raw_type_leniency: false,
            allow_unchecked_conversion: true,
            verify_solutions: true,
            max_incorporation_rounds: limits::MAX_INCORPORATION_ROUNDS,
            max_resolution_rounds: limits::MAX_RESOLUTION_ROUNDS,
            max_nested_depth: limits::MAX_NESTED_SESSION_DEPTH,
        }
    }
}

impl InferenceOptions {
    /// Pre-generics-era compatibility: raw leniency on, everything else default.
    pub fn legacy() -> Self {
        InferenceOptions {
            raw_type_leniency: true,
            ..Self::default()
        }
    }

    /// No leniency of any kind.
    pub fn strict() -> Self {
        InferenceOptions {
            raw_type_leniency: false,
            allow_unchecked_conversion: false,
            verify_solutions: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod tests;
