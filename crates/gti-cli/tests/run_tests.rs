use super::*;
use crate::report::{InvocationReport, TypeArgument};
use std::path::Path;

fn solve(file: &str, overrides: &Overrides) -> Report {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file);
    let scenario = Scenario::load(&path).unwrap();
    run(&scenario, overrides).unwrap()
}

fn solved(file: &str) -> InvocationReport {
    let report = solve(file, &Overrides::default());
    assert!(report.is_success(), "{file} failed: {:?}", report.error);
    report.invocation.expect("invocation report")
}

fn arg(param: &str, ty: &str) -> TypeArgument {
    TypeArgument {
        param: param.to_string(),
        ty: ty.to_string(),
    }
}

#[test]
fn test_identity() {
    let r = solved("identity.json");
    assert_eq!(r.method, "id");
    assert_eq!(r.type_arguments, vec![arg("T", "K")]);
    assert_eq!(r.parameter_types, vec!["K"]);
    assert_eq!(r.return_type, "K");
    assert!(r.flags.is_empty());
}

#[test]
fn test_pick_lub() {
    let r = solved("pick-lub.json");
    assert_eq!(r.return_type, "C");
}

#[test]
fn test_map_with_nested_factory() {
    let report = solve("map-lambda.json", &Overrides::default());
    let r = report.invocation.expect("invocation report");
    assert_eq!(r.type_arguments, vec![arg("T", "String"), arg("R", "String")]);
    assert_eq!(r.return_type, "List<String>");
    assert_eq!(report.nested.len(), 1);
    let factory = &report.nested[0];
    assert_eq!(factory.method, "listOf");
    assert!(factory.varargs);
    assert_eq!(factory.return_type, "List<String>");
}

#[test]
fn test_recursive_bound() {
    let r = solved("max-comparable.json");
    assert_eq!(r.type_arguments, vec![arg("T", "Integer")]);
}

#[test]
fn test_thrown_type_inference() {
    let r = solved("attempt-throws.json");
    assert_eq!(r.type_arguments, vec![arg("T", "String"), arg("X", "IOException")]);
    assert_eq!(r.thrown, vec!["IOException"]);
}

#[test]
fn test_unchecked_conversion_and_strict_mode() {
    let r = solved("raw-unchecked.json");
    assert!(r.unchecked);
    assert_eq!(r.return_type, "List");
    assert!(r.flags.contains(&"unchecked-conversion".to_string()));

    let strict = Overrides {
        strict: true,
        ..Overrides::default()
    };
    let report = solve("raw-unchecked.json", &strict);
    assert!(!report.is_success());
    assert_eq!(report.error.map(|e| e.kind).as_deref(), Some("no-solution"));
}

#[test]
fn test_ambiguity_is_a_hard_failure() {
    let report = solve("ambiguous.json", &Overrides::default());
    let error = report.error.expect("ambiguous");
    assert_eq!(error.kind, "hard-failure");
    assert!(error.message.contains("ambiguous"));
    assert!(report.invocation.is_none());
}

#[test]
fn test_expected_type_override() {
    let overrides = Overrides {
        expected: Some("String".to_string()),
        ..Overrides::default()
    };
    let report = solve("identity.json", &overrides);
    assert_eq!(report.error.map(|e| e.kind).as_deref(), Some("no-solution"));

    let overrides = Overrides {
        expected: Some("Object".to_string()),
        ..Overrides::default()
    };
    assert!(solve("identity.json", &overrides).is_success());

    let overrides = Overrides {
        expected: Some("List<".to_string()),
        ..Overrides::default()
    };
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/identity.json");
    let scenario = Scenario::load(&path).unwrap();
    assert!(run(&scenario, &overrides).is_err());
}

#[test]
fn test_overrides_apply_on_top_of_scenario_options() {
    let base = InferenceOptions::default();
    assert_eq!(Overrides::default().apply(base.clone()), base);

    let legacy = Overrides {
        legacy: true,
        no_verify: true,
        ..Overrides::default()
    }
    .apply(base.clone());
    assert!(legacy.raw_type_leniency);
    assert!(!legacy.verify_solutions);

    let strict = Overrides {
        strict: true,
        ..Overrides::default()
    }
    .apply(InferenceOptions::legacy());
    assert!(!strict.raw_type_leniency);
    assert!(!strict.allow_unchecked_conversion);
    assert_eq!(strict.max_resolution_rounds, base.max_resolution_rounds);
}
