//! Scenario files: declarations plus one invocation to infer.
//!
//! A scenario is a JSON document:
//!
//! ```json
//! {
//!   "classes": [
//!     { "name": "List", "kind": "interface", "typeParams": ["E"] },
//!     { "name": "Function", "kind": "interface", "typeParams": ["T", "R"],
//!       "functional": { "name": "apply", "params": ["T"], "returns": "R" } }
//!   ],
//!   "methods": [
//!     { "name": "map", "typeParams": ["T", "R"],
//!       "params": ["List<T>", "Function<T, R>"], "returns": "List<R>" }
//!   ],
//!   "invocation": { "kind": "call", "method": "map", "args": [
//!     { "kind": "typed", "type": "List<String>" },
//!     { "kind": "lambda", "params": 1, "body": { "kind": "param", "index": 0 } }
//!   ] },
//!   "expected": "List<String>"
//! }
//! ```
//!
//! Classes are declared in two passes so supertypes, bounds and functional
//! methods may refer to classes declared later in the file. Naming a class
//! that already exists (such as `String`) re-opens it.

use crate::type_parser::{Scope, parse_type};
use anyhow::{Context, Result, bail};
use gti_common::InferenceOptions;
use gti_solver::{
    ClassKind, ExprArena, ExprId, FunctionalMethod, Lambda, LambdaBody, LambdaParams,
    MethodId, MethodSig, TypeDatabase, TypeId, TypeInterner, TypeParamId,
};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScenarioFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: InferenceOptions,
    #[serde(default)]
    pub classes: Vec<ClassSpec>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
    pub invocation: ExprSpec,
    #[serde(default)]
    pub expected: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KindSpec {
    #[default]
    Class,
    Interface,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassSpec {
    pub name: String,
    #[serde(default)]
    pub kind: KindSpec,
    #[serde(default)]
    pub type_params: Vec<String>,
    /// Upper bounds per type parameter.
    #[serde(default)]
    pub bounds: FxHashMap<String, Vec<String>>,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub functional: Option<FunctionalSpec>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FunctionalSpec {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    pub returns: String,
    #[serde(default)]
    pub throws: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub bounds: FxHashMap<String, Vec<String>>,
    #[serde(default)]
    pub params: Vec<String>,
    pub returns: String,
    #[serde(default)]
    pub throws: Vec<String>,
    #[serde(default)]
    pub varargs: bool,
}

/// An argument expression.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExprSpec {
    Typed {
        #[serde(rename = "type")]
        ty: String,
    },
    Null,
    Paren {
        expr: Box<ExprSpec>,
    },
    Conditional {
        then: Box<ExprSpec>,
        #[serde(rename = "else")]
        otherwise: Box<ExprSpec>,
    },
    Switch {
        arms: Vec<ExprSpec>,
    },
    /// Every method declared under `method` is a candidate.
    Call {
        method: String,
        #[serde(default)]
        args: Vec<ExprSpec>,
        #[serde(default, rename = "typeArgs")]
        type_args: Vec<String>,
    },
    Lambda {
        params: LambdaParamsSpec,
        body: LambdaBodySpec,
        #[serde(default)]
        throws: Vec<String>,
    },
    /// Parameter `index` of the lambda `up` levels out from the innermost one.
    Param {
        index: usize,
        #[serde(default)]
        up: usize,
    },
    MethodRef {
        method: String,
        /// Receiver type of a `Type::method` reference.
        #[serde(default)]
        receiver: Option<String>,
    },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum LambdaParamsSpec {
    Implicit(usize),
    Explicit(Vec<String>),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum LambdaBodySpec {
    Block {
        returns: Vec<ExprSpec>,
        #[serde(default = "yes", rename = "completesNormally")]
        completes_normally: bool,
    },
    Expression(Box<ExprSpec>),
}

fn yes() -> bool {
    true
}

/// A scenario with every declaration interned and the invocation built.
pub struct Scenario {
    pub name: Option<String>,
    pub db: TypeInterner,
    pub exprs: ExprArena,
    pub options: InferenceOptions,
    pub root: ExprId,
    pub expected: Option<TypeId>,
    pub methods: FxHashMap<String, Vec<MethodId>>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let file: ScenarioFile = serde_json::from_str(text)?;
        Self::build(file)
    }

    pub fn build(file: ScenarioFile) -> Result<Self> {
        let mut builder = Builder {
            db: TypeInterner::new(),
            exprs: ExprArena::new(),
            methods: FxHashMap::default(),
            lambdas: Vec::new(),
        };
        builder.declare_classes(&file.classes)?;
        for spec in &file.methods {
            builder.declare_method(spec)?;
        }
        let root = builder.expr(&file.invocation)?;
        if builder.exprs.invocation_of(root).is_none() {
            bail!("the scenario invocation must be a `call` expression");
        }
        let expected = file
            .expected
            .as_deref()
            .map(|src| parse_type(&builder.db, &Scope::default(), src))
            .transpose()
            .context("invalid expected type")?;
        debug!(
            classes = file.classes.len(),
            methods = file.methods.len(),
            exprs = builder.exprs.len(),
            "scenario built"
        );
        Ok(Scenario {
            name: file.name,
            db: builder.db,
            exprs: builder.exprs,
            options: file.options,
            root,
            expected,
            methods: builder.methods,
        })
    }
}

struct Builder {
    db: TypeInterner,
    exprs: ExprArena,
    methods: FxHashMap<String, Vec<MethodId>>,
    /// Lambdas enclosing the expression being built with their arities,
    /// innermost last.
    lambdas: Vec<(ExprId, usize)>,
}

impl Builder {
    fn declare_classes(&mut self, specs: &[ClassSpec]) -> Result<()> {
        let mut declared = Vec::with_capacity(specs.len());
        for spec in specs {
            let kind = match spec.kind {
                KindSpec::Class => ClassKind::Class,
                KindSpec::Interface => ClassKind::Interface,
            };
            let id = match self.db.class_by_name(&spec.name) {
                Some(existing) => {
                    let arity = self.db.class_decl(existing).map_or(0, |d| d.type_params.len());
                    if arity != spec.type_params.len() {
                        bail!("class `{}` redeclared with a different arity", spec.name);
                    }
                    existing
                }
                None => {
                    let params: Vec<&str> = spec.type_params.iter().map(String::as_str).collect();
                    self.db.declare_class(&spec.name, kind, &params)
                }
            };
            declared.push(id);
        }

        for (spec, &id) in specs.iter().zip(&declared) {
            let params = self
                .db
                .class_decl(id)
                .map(|d| d.type_params.clone())
                .unwrap_or_default();
            let scope = self.scope(&spec.type_params, &params);
            let ctx = || format!("in class `{}`", spec.name);
            self.set_bounds(&scope, &spec.type_params, &params, &spec.bounds)
                .with_context(ctx)?;
            if !spec.supertypes.is_empty() {
                let supertypes = self.types(&scope, &spec.supertypes).with_context(ctx)?;
                self.db.set_supertypes(id, supertypes);
            }
            if let Some(functional) = &spec.functional {
                let method = FunctionalMethod {
                    name: self.db.names().intern(&functional.name),
                    params: self.types(&scope, &functional.params).with_context(ctx)?,
                    return_type: parse_type(&self.db, &scope, &functional.returns).with_context(ctx)?,
                    thrown: self.types(&scope, &functional.throws).with_context(ctx)?,
                };
                self.db.set_functional_method(id, method);
            }
        }
        Ok(())
    }

    fn declare_method(&mut self, spec: &MethodSpec) -> Result<MethodId> {
        let params: Vec<TypeParamId> = spec
            .type_params
            .iter()
            .map(|name| self.db.declare_type_param(name))
            .collect();
        let scope = self.scope(&spec.type_params, &params);
        let ctx = || format!("in method `{}`", spec.name);
        self.set_bounds(&scope, &spec.type_params, &params, &spec.bounds)
            .with_context(ctx)?;
        let param_types = self.types(&scope, &spec.params).with_context(ctx)?;
        if spec.varargs
            && param_types
                .last()
                .is_none_or(|&last| self.db.array_element(last).is_none())
        {
            bail!("varargs method `{}` must end with an array parameter", spec.name);
        }
        let sig = MethodSig {
            name: self.db.names().intern(&spec.name),
            type_params: params,
            params: param_types,
            return_type: parse_type(&self.db, &scope, &spec.returns).with_context(ctx)?,
            thrown: self.types(&scope, &spec.throws).with_context(ctx)?,
            varargs: spec.varargs,
        };
        let id = self.db.declare_method(sig);
        self.methods.entry(spec.name.clone()).or_default().push(id);
        Ok(id)
    }

    fn scope(&self, names: &[String], params: &[TypeParamId]) -> Scope {
        names
            .iter()
            .zip(params)
            .map(|(name, &p)| (name.clone(), self.db.type_param(p)))
            .collect()
    }

    fn set_bounds(
        &self,
        scope: &Scope,
        names: &[String],
        params: &[TypeParamId],
        bounds: &FxHashMap<String, Vec<String>>,
    ) -> Result<()> {
        for (name, srcs) in bounds {
            let Some(index) = names.iter().position(|n| n == name) else {
                bail!("bound for undeclared type parameter `{name}`");
            };
            let types = self.types(scope, srcs)?;
            if let Some(&param) = params.get(index) {
                self.db.set_type_param_bounds(param, types);
            }
        }
        Ok(())
    }

    fn types(&self, scope: &Scope, srcs: &[String]) -> Result<Vec<TypeId>> {
        srcs.iter().map(|src| parse_type(&self.db, scope, src)).collect()
    }

    fn candidates(&self, method: &str) -> Result<Vec<MethodId>> {
        match self.methods.get(method) {
            Some(ids) => Ok(ids.clone()),
            None => bail!("unknown method `{method}`"),
        }
    }

    fn expr(&mut self, spec: &ExprSpec) -> Result<ExprId> {
        let empty = Scope::default();
        Ok(match spec {
            ExprSpec::Typed { ty } => {
                let ty = parse_type(&self.db, &empty, ty)?;
                self.exprs.typed(ty)
            }
            ExprSpec::Null => self.exprs.null(),
            ExprSpec::Paren { expr } => {
                let inner = self.expr(expr)?;
                self.exprs.paren(inner)
            }
            ExprSpec::Conditional { then, otherwise } => {
                let then_branch = self.expr(then)?;
                let else_branch = self.expr(otherwise)?;
                self.exprs.conditional(then_branch, else_branch)
            }
            ExprSpec::Switch { arms } => {
                let arms = arms.iter().map(|arm| self.expr(arm)).collect::<Result<Vec<_>>>()?;
                self.exprs.switch(arms)
            }
            ExprSpec::Call {
                method,
                args,
                type_args,
            } => {
                let candidates = self.candidates(method)?;
                let args = args.iter().map(|arg| self.expr(arg)).collect::<Result<Vec<_>>>()?;
                let explicit = self.types(&empty, type_args)?;
                self.exprs.invocation(candidates, args, explicit)
            }
            ExprSpec::Lambda {
                params,
                body,
                throws,
            } => {
                let params = match params {
                    LambdaParamsSpec::Implicit(n) => LambdaParams::Implicit(*n),
                    LambdaParamsSpec::Explicit(types) => {
                        LambdaParams::Explicit(self.types(&empty, types)?)
                    }
                };
                let thrown = self.types(&empty, throws)?;
                let lambda = self.exprs.begin_lambda();
                self.lambdas.push((lambda, params_arity(&params)));
                let body = self.lambda_body(body);
                self.lambdas.pop();
                self.exprs.finish_lambda(
                    lambda,
                    Lambda {
                        params,
                        body: body?,
                        thrown,
                    },
                );
                lambda
            }
            ExprSpec::Param { index, up } => {
                let Some(&(lambda, arity)) = self
                    .lambdas
                    .len()
                    .checked_sub(up + 1)
                    .and_then(|i| self.lambdas.get(i))
                else {
                    bail!("parameter reference outside of a lambda");
                };
                if *index >= arity {
                    bail!("lambda has no parameter {index}");
                }
                self.exprs.param_ref(lambda, *index)
            }
            ExprSpec::MethodRef { method, receiver } => {
                let candidates = self.candidates(method)?;
                let receiver = receiver
                    .as_deref()
                    .map(|src| parse_type(&self.db, &empty, src))
                    .transpose()?;
                self.exprs.method_ref(candidates, receiver)
            }
        })
    }

    fn lambda_body(&mut self, body: &LambdaBodySpec) -> Result<LambdaBody> {
        Ok(match body {
            LambdaBodySpec::Expression(expr) => LambdaBody::Expression(self.expr(expr)?),
            LambdaBodySpec::Block {
                returns,
                completes_normally,
            } => LambdaBody::Block {
                results: returns.iter().map(|r| self.expr(r)).collect::<Result<Vec<_>>>()?,
                can_complete_normally: *completes_normally,
            },
        })
    }
}

fn params_arity(params: &LambdaParams) -> usize {
    match params {
        LambdaParams::Implicit(n) => *n,
        LambdaParams::Explicit(types) => types.len(),
    }
}

#[cfg(test)]
#[path = "../tests/scenario_tests.rs"]
mod tests;
