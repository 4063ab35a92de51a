//! Unit tests for option declaration and validation.

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;

#[fixture]
fn registration_spec() -> OptionSet {
    let mut spec = OptionSet::new();
    spec.add("domain", OptionRule::required());
    spec.add("years", OptionRule::with_default(json!(1)));
    spec.add_flag("note");
    spec
}

// ---------------------------------------------------------------------------
// Declaration
// ---------------------------------------------------------------------------

#[rstest]
fn add_is_additive(mut registration_spec: OptionSet) {
    registration_spec.add("owner", OptionRule::required());
    let required: Vec<&str> = registration_spec.required_keys().collect();
    assert_eq!(required, vec!["domain", "owner"]);
}

#[rstest]
fn re_adding_a_key_replaces_its_rule_in_place(mut registration_spec: OptionSet) {
    registration_spec.add("years", OptionRule::required());
    let required: Vec<&str> = registration_spec.required_keys().collect();
    assert_eq!(required, vec!["domain", "years"]);
}

#[rstest]
fn bare_key_is_not_required(registration_spec: OptionSet) {
    let rule = registration_spec.rule("note").expect("declared");
    assert!(!rule.required);
    assert!(rule.default.is_none());
}

#[test]
fn merge_missing_does_not_clobber_local_rules() {
    let mut local = OptionSet::new();
    local.add("domain", OptionRule::optional());
    let mut inherited = OptionSet::new();
    inherited.add("domain", OptionRule::required());
    inherited.add("owner", OptionRule::required());

    local.merge_missing(&inherited);
    assert!(!local.rule("domain").expect("declared").required);
    let required: Vec<&str> = local.required_keys().collect();
    assert_eq!(required, vec!["owner"]);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[rstest]
fn validate_accepts_satisfied_requirements(registration_spec: OptionSet) {
    let args = Args::keyed([("domain", json!("test.com"))]);
    assert!(registration_spec.validate("register", &args).is_ok());
}

#[rstest]
fn validate_reports_first_declared_missing_key(mut registration_spec: OptionSet) {
    registration_spec.add("owner", OptionRule::required());
    let err = registration_spec
        .validate("register", &Args::Empty)
        .expect_err("both keys missing");
    assert!(
        matches!(err, DriverError::MissingParameter { ref key, .. } if key == "domain"),
        "expected first-declared key, got {err:?}"
    );
}

#[rstest]
fn validate_treats_empty_args_as_empty_map(registration_spec: OptionSet) {
    let err = registration_spec
        .validate("register", &Args::Empty)
        .expect_err("required key missing");
    assert!(matches!(err, DriverError::MissingParameter { .. }));
}

#[test]
fn validate_rejects_positional_args_even_with_no_requirements() {
    let spec = OptionSet::new();
    let err = spec
        .validate("list", &Args::positional([json!(1)]))
        .expect_err("positional args are not validatable");
    assert!(matches!(err, DriverError::InvalidArguments { .. }));
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[rstest]
fn defaults_merge_into_keyed_args(registration_spec: OptionSet) {
    let mut args = Args::keyed([("domain", json!("test.com"))]);
    registration_spec.apply_defaults(&mut args);
    assert_eq!(args.get("years"), Some(&json!(1)));
}

#[rstest]
fn defaults_do_not_overwrite_supplied_values(registration_spec: OptionSet) {
    let mut args = Args::keyed([("domain", json!("test.com")), ("years", json!(5))]);
    registration_spec.apply_defaults(&mut args);
    assert_eq!(args.get("years"), Some(&json!(5)));
}

#[rstest]
fn defaults_promote_empty_args_to_keyed(registration_spec: OptionSet) {
    let mut args = Args::Empty;
    registration_spec.apply_defaults(&mut args);
    assert_eq!(args.get("years"), Some(&json!(1)));
}

// ---------------------------------------------------------------------------
// Validations table
// ---------------------------------------------------------------------------

#[test]
fn finalize_checks_global_before_action_scope() {
    let mut validations = Validations::new();
    validations.global_mut().add("all", OptionRule::required());
    validations
        .for_action_mut("register")
        .add("domain", OptionRule::required());

    let err = validations
        .finalize("register", Args::keyed([("domain", json!("x"))]))
        .expect_err("global requirement missing");
    assert!(
        matches!(err, DriverError::MissingParameter { ref key, .. } if key == "all"),
        "expected global key first, got {err:?}"
    );
}

#[test]
fn finalize_without_specs_passes_positional_args_through() {
    let validations = Validations::new();
    let args = Args::positional([json!(1)]);
    let out = validations.finalize("list", args.clone()).expect("no specs");
    assert_eq!(out, args);
}

#[test]
fn finalize_merges_defaults_after_validation() {
    let mut validations = Validations::new();
    validations
        .for_action_mut("register")
        .add("domain", OptionRule::required());
    validations
        .for_action_mut("register")
        .add("years", OptionRule::with_default(json!(1)));

    let out = validations
        .finalize("register", Args::keyed([("domain", json!("x"))]))
        .expect("valid");
    assert_eq!(out.get("years"), Some(&json!(1)));
}

#[test]
fn finalize_default_cannot_satisfy_a_requirement() {
    let mut validations = Validations::new();
    validations.for_action_mut("register").add(
        "domain",
        OptionRule {
            required: true,
            default: Some(json!("fallback")),
        },
    );

    let err = validations
        .finalize("register", Args::Empty)
        .expect_err("required key checked before defaults merge");
    assert!(matches!(err, DriverError::MissingParameter { .. }));
}
