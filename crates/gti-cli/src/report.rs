//! Rendering of inference outcomes.

use colored::Colorize;
use gti_solver::{
    ExprArena, ExprId, InferenceError, ResolvedInvocation, SessionFlags, TypeDatabase,
    TypeFormatter,
};
use serde::Serialize;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypeArgument {
    pub param: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// One resolved invocation with every type rendered by name.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationReport {
    pub site: u32,
    pub method: String,
    pub type_arguments: Vec<TypeArgument>,
    pub parameter_types: Vec<String>,
    pub return_type: String,
    pub thrown: Vec<String>,
    pub unchecked: bool,
    pub varargs: bool,
    pub flags: Vec<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    /// `no-solution`, `incomplete-information` or `hard-failure`.
    pub kind: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation: Option<InvocationReport>,
    /// Invocations nested in the arguments, in source order.
    pub nested: Vec<InvocationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureReport>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn new<'r>(
        db: &dyn TypeDatabase,
        exprs: &ExprArena,
        name: Option<String>,
        root: ExprId,
        outcome: Result<&ResolvedInvocation, &InferenceError>,
        results: impl Iterator<Item = (&'r ExprId, &'r ResolvedInvocation)>,
    ) -> Self {
        let mut nested: Vec<(ExprId, InvocationReport)> = results
            .filter(|&(&site, _)| site != root && exprs.contains(root, site))
            .map(|(&site, r)| (site, describe_invocation(db, r)))
            .collect();
        nested.sort_by_key(|(site, _)| site.0);
        let nested = nested.into_iter().map(|(_, r)| r).collect();
        match outcome {
            Ok(result) => Report {
                name,
                invocation: Some(describe_invocation(db, result)),
                nested,
                error: None,
            },
            Err(err) => Report {
                name,
                invocation: None,
                nested,
                error: Some(FailureReport {
                    kind: failure_kind(err).to_string(),
                    message: err.describe(db),
                }),
            },
        }
    }
}

fn failure_kind(err: &InferenceError) -> &'static str {
    match err.kind() {
        gti_solver::FailureKind::NoSolution => "no-solution",
        gti_solver::FailureKind::IncompleteInformation => "incomplete-information",
        gti_solver::FailureKind::HardFailure => "hard-failure",
    }
}

pub fn describe_invocation(db: &dyn TypeDatabase, result: &ResolvedInvocation) -> InvocationReport {
    let fmt = TypeFormatter::new(db);
    let sig = db.method_sig(result.method);
    let method = sig
        .as_ref()
        .map_or_else(|| format!("method#{}", result.method.0), |s| db.names().resolve(s.name).to_string());
    let params = sig.as_ref().map(|s| s.type_params.clone()).unwrap_or_default();
    let type_arguments = params
        .iter()
        .zip(&result.type_arguments)
        .map(|(&p, &ty)| TypeArgument {
            param: db
                .type_param_decl(p)
                .map_or_else(|| format!("T{}", p.0), |d| db.names().resolve(d.name).to_string()),
            ty: fmt.format(ty),
        })
        .collect();
    InvocationReport {
        site: result.site.0,
        method,
        type_arguments,
        parameter_types: result.parameter_types.iter().map(|&t| fmt.format(t)).collect(),
        return_type: fmt.format(result.return_type),
        thrown: result.thrown.iter().map(|&t| fmt.format(t)).collect(),
        unchecked: result.unchecked,
        varargs: result.varargs,
        flags: flag_names(result.flags),
    }
}

/// `UNCHECKED_CONVERSION` becomes `unchecked-conversion`.
pub fn flag_names(flags: SessionFlags) -> Vec<String> {
    flags
        .iter_names()
        .map(|(name, _)| name.to_lowercase().replace('_', "-"))
        .collect()
}

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    pub fn render_json(&self, report: &Report) -> serde_json::Result<String> {
        serde_json::to_string_pretty(report)
    }

    pub fn render_text(&self, report: &Report) -> String {
        let mut out = String::new();
        if let Some(name) = &report.name {
            out.push_str(&self.heading(name));
            out.push('\n');
        }
        if let Some(invocation) = &report.invocation {
            out.push_str(&self.format_invocation(invocation, ""));
        }
        if let Some(error) = &report.error {
            let label = format!("error[{}]", error.kind);
            out.push_str(&self.paint_error(&label));
            out.push_str(": ");
            out.push_str(&error.message);
            out.push('\n');
        }
        if !report.nested.is_empty() {
            out.push_str(&self.heading("nested"));
            out.push('\n');
            for nested in &report.nested {
                out.push_str(&self.format_invocation(nested, "  "));
            }
        }
        out
    }

    fn format_invocation(&self, r: &InvocationReport, indent: &str) -> String {
        let mut out = String::new();
        let params = r.parameter_types.join(", ");
        out.push_str(&format!(
            "{indent}{}({params}) -> {}\n",
            self.paint_method(&r.method),
            self.paint_type(&r.return_type)
        ));
        if !r.type_arguments.is_empty() {
            let args: Vec<String> = r
                .type_arguments
                .iter()
                .map(|a| format!("{} = {}", a.param, self.paint_type(&a.ty)))
                .collect();
            out.push_str(&format!("{indent}  type arguments: {}\n", args.join(", ")));
        }
        if !r.thrown.is_empty() {
            out.push_str(&format!("{indent}  throws: {}\n", r.thrown.join(", ")));
        }
        if !r.flags.is_empty() {
            out.push_str(&format!("{indent}  flags: {}\n", self.paint_flags(&r.flags.join(", "))));
        }
        out
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_method(&self, text: &str) -> String {
        if self.color {
            text.cyan().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_type(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_flags(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_error(&self, text: &str) -> String {
        if self.color {
            text.red().bold().to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
#[path = "../tests/report_tests.rs"]
mod tests;
