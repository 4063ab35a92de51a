//! Crate-level integration tests.
//!
//! These exercise the public surface the way a host would: a `domain` driver
//! fronting two registrar backends, each with a nested `nameservers` handler.

use std::sync::Arc;

use serde_json::json;

use crate::args::Args;
use crate::builder::{ActionOptions, DriverBuilder, HandlerOptions};
use crate::driver::Driver;
use crate::error::DriverError;
use crate::handler::{ActionResult, Handler};
use crate::option::OptionRule;

mod scenarios;

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

struct Enom;

impl Handler for Enom {
    fn invoke(&self, method: &str, args: Args) -> Option<ActionResult> {
        match method {
            "list" => Some(Ok(json!("enom_list"))),
            "transfer" => Some(Ok(json!("enom_transfer"))),
            "register" => Some(Ok(registration("enom", &args))),
            _ => None,
        }
    }

    fn namespace(&self, name: &str) -> Option<Arc<dyn Handler>> {
        (name == "nameservers").then(|| Arc::new(EnomNameservers) as Arc<dyn Handler>)
    }
}

struct EnomNameservers;

impl Handler for EnomNameservers {
    fn invoke(&self, method: &str, _args: Args) -> Option<ActionResult> {
        (method == "list").then(|| Ok(json!("enom_ns_list")))
    }
}

struct Opensrs;

impl Handler for Opensrs {
    fn invoke(&self, method: &str, args: Args) -> Option<ActionResult> {
        match method {
            "list" => Some(Ok(json!("opensrs_list"))),
            "transfer" => Some(Ok(json!("opensrs_transfer"))),
            "register" => Some(Ok(registration("opensrs", &args))),
            _ => None,
        }
    }

    fn namespace(&self, name: &str) -> Option<Arc<dyn Handler>> {
        (name == "nameservers").then(|| Arc::new(OpensrsNameservers) as Arc<dyn Handler>)
    }
}

struct OpensrsNameservers;

impl Handler for OpensrsNameservers {
    fn invoke(&self, method: &str, _args: Args) -> Option<ActionResult> {
        (method == "list").then(|| Ok(json!("opensrs_ns_list")))
    }
}

fn registration(backend: &str, args: &Args) -> serde_json::Value {
    json!({
        "backend": backend,
        "domain": args.get("domain").cloned().unwrap_or(json!(null)),
        "years": args.get("years").cloned().unwrap_or(json!(null)),
    })
}

fn domain_driver() -> Driver {
    let mut builder = Driver::builder("domain");
    builder.install("domain::Enom", |_config| Arc::new(Enom));
    builder.install("domain::Opensrs", |_config| Arc::new(Opensrs));
    builder.register_handler("enom").expect("register enom");
    builder
        .register_handler_with(
            "opensrs",
            HandlerOptions::new().with_config(|bag| {
                bag.insert("username".to_owned(), json!("opensrs-user"));
            }),
        )
        .expect("register opensrs");
    builder.define_action("list").expect("define list");
    builder.define_action("transfer").expect("define transfer");
    builder
        .define_action_with(
            "register",
            ActionOptions::new()
                .with_option("domain", OptionRule::required())
                .with_option("years", OptionRule::with_default(json!(1))),
        )
        .expect("define register");
    builder
        .define_namespace("nameservers", |ns| {
            ns.define_action("list")?;
            Ok(())
        })
        .expect("define namespace");
    builder.set_default_handler("opensrs").expect("default");
    builder.build()
}

// ---------------------------------------------------------------------------
// End-to-end surface
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_default_and_scoped_dispatch() {
    let domain = domain_driver();

    assert_eq!(domain.call("list", Args::Empty).expect("default"), json!("opensrs_list"));

    let scoped = domain
        .with_handler("enom", |handler| handler.execute("list", Args::Empty))
        .expect("scoped");
    assert_eq!(scoped, json!("enom_list"));

    assert_eq!(domain.call("list", Args::Empty).expect("restored"), json!("opensrs_list"));
}

#[test]
fn end_to_end_validation_and_defaults() {
    let domain = domain_driver();

    let err = domain
        .call("register", Args::Empty)
        .expect_err("domain is required");
    assert!(matches!(err, DriverError::MissingParameter { ref key, .. } if key == "domain"));

    let value = domain
        .call("register", Args::keyed([("domain", json!("example.com"))]))
        .expect("register");
    assert_eq!(
        value,
        json!({"backend": "opensrs", "domain": "example.com", "years": 1})
    );
}

#[test]
fn end_to_end_namespaces_follow_the_outer_handler() {
    let domain = domain_driver();

    let ns = domain.namespace("nameservers").expect("opensrs context");
    assert_eq!(ns.call("list", Args::Empty).expect("dispatch"), json!("opensrs_ns_list"));

    domain.set_current_handler("enom").expect("switch");
    let ns = domain.namespace("nameservers").expect("enom context");
    assert_eq!(ns.call("list", Args::Empty).expect("dispatch"), json!("enom_ns_list"));
}

#[test]
fn drivers_built_from_one_declaration_are_isolated() {
    let mut builder = DriverBuilder::new("domain");
    builder.install("domain::Enom", |_config| Arc::new(Enom));
    builder.install("domain::Opensrs", |_config| Arc::new(Opensrs));
    builder.register_handler("enom").expect("enom");
    builder.register_handler("opensrs").expect("opensrs");
    builder.define_action("list").expect("list");
    builder.set_default_handler("opensrs").expect("default");

    let first = builder.build();
    let second = builder.build();
    second.set_current_handler("enom").expect("override second");

    assert_eq!(first.call("list", Args::Empty).expect("first"), json!("opensrs_list"));
    assert_eq!(second.call("list", Args::Empty).expect("second"), json!("enom_list"));
    assert_eq!(first.current_handler().as_deref(), Some("opensrs"));
}

#[test]
fn handler_configuration_is_visible_to_the_host() {
    let domain = domain_driver();
    assert_eq!(
        domain.handler_config("opensrs")["username"],
        json!("opensrs-user")
    );
    assert!(domain.handler_config("enom").get("username").is_none());
}

#[test]
fn validation_failures_leave_dispatch_state_untouched() {
    let domain = domain_driver();

    let result = domain.with_handler("enom", |handler| {
        handler.execute("register", Args::Empty)
    });
    assert!(result.is_err());

    // The failed scoped call restored the default; repeating the valid call
    // still succeeds against opensrs.
    let value = domain
        .call("register", Args::keyed([("domain", json!("example.com"))]))
        .expect("dispatch after failure");
    assert_eq!(value["backend"], json!("opensrs"));
}
