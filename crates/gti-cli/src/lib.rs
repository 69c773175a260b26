//! Command-line front end for the gti inference engine.
//!
//! Loads JSON scenarios (class and method declarations plus one invocation),
//! runs overload resolution and inference on the invocation, and renders
//! the outcome.

pub mod args;
pub mod report;
pub mod scenario;
pub mod tracing_config;
pub mod type_parser;

use anyhow::{Context, Result};
use gti_common::InferenceOptions;
use gti_solver::InferenceEngine;
use report::Report;
use scenario::Scenario;
use tracing::info;
use type_parser::{Scope, parse_type};

/// Command-line overrides applied on top of a scenario's own options.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub legacy: bool,
    pub strict: bool,
    pub no_verify: bool,
    pub expected: Option<String>,
}

impl Overrides {
    pub fn apply(&self, mut options: InferenceOptions) -> InferenceOptions {
        if self.strict {
            options.raw_type_leniency = false;
            options.allow_unchecked_conversion = false;
        }
        if self.legacy {
            options.raw_type_leniency = true;
        }
        if self.no_verify {
            options.verify_solutions = false;
        }
        options
    }
}

/// Solve the scenario's invocation.
pub fn run(scenario: &Scenario, overrides: &Overrides) -> Result<Report> {
    let options = overrides.apply(scenario.options.clone());
    let expected = match &overrides.expected {
        Some(src) => Some(
            parse_type(&scenario.db, &Scope::default(), src).context("invalid --expected type")?,
        ),
        None => scenario.expected,
    };
    let mut engine = InferenceEngine::new(&scenario.db, &scenario.exprs, options);
    let outcome = engine.resolve_invocation(scenario.root, expected);
    info!(
        scenario = scenario.name.as_deref().unwrap_or("<unnamed>"),
        ok = outcome.is_ok(),
        "scenario solved"
    );
    Ok(Report::new(
        &scenario.db,
        &scenario.exprs,
        scenario.name.clone(),
        scenario.root,
        outcome.as_ref(),
        engine.results(),
    ))
}

#[cfg(test)]
#[path = "../tests/run_tests.rs"]
mod tests;
