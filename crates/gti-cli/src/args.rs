use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the gti binary.
#[derive(Parser, Debug)]
#[command(
    name = "gti",
    version,
    about = "Infer the type arguments of a generic method invocation"
)]
pub struct CliArgs {
    /// Scenario files to solve.
    #[arg(required = true)]
    pub scenarios: Vec<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, ignore_case = true)]
    pub format: OutputFormat,

    /// Accept raw types where a parameterization is required (older source levels).
    #[arg(long)]
    pub legacy: bool,

    /// Reject unchecked conversion.
    #[arg(long, conflicts_with = "legacy")]
    pub strict: bool,

    /// Skip re-checking the solution against the final bounds.
    #[arg(long = "no-verify")]
    pub no_verify: bool,

    /// Override the scenario's expected type.
    #[arg(long)]
    pub expected: Option<String>,

    /// Disable colored output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
#[path = "../tests/args_tests.rs"]
mod tests;
