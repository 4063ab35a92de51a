//! Workflow scenarios: multi-step host interactions against one driver.

use rstest::{fixture, rstest};
use serde_json::json;

use crate::args::Args;
use crate::driver::Driver;
use crate::error::DriverError;

use super::domain_driver;

#[fixture]
fn domain() -> Driver {
    domain_driver()
}

/// A host serves read traffic from the default backend, then pins a cheaper
/// backend for a bulk transfer job and unpins afterwards.
#[rstest]
fn bulk_job_pins_and_unpins_a_backend(domain: Driver) {
    assert_eq!(domain.call("list", Args::Empty).expect("read"), json!("opensrs_list"));

    domain.set_current_handler("enom").expect("pin");
    for _ in 0..3 {
        assert_eq!(
            domain.call("transfer", Args::Empty).expect("bulk step"),
            json!("enom_transfer")
        );
    }
    domain.clear_current_handler();

    assert_eq!(domain.call("list", Args::Empty).expect("read again"), json!("opensrs_list"));
}

/// A retry path escalates to an alternate backend for one call without
/// disturbing surrounding traffic, even when the alternate also fails.
#[rstest]
fn failover_retry_is_scoped(domain: Driver) {
    let err = domain
        .with_handler("enom", |handler| handler.execute("whois", Args::Empty))
        .expect_err("alternate lacks the action too");
    assert!(matches!(err, DriverError::UnregisteredAction { .. }));

    assert_eq!(domain.current_handler().as_deref(), Some("opensrs"));
    assert_eq!(domain.call("list", Args::Empty).expect("traffic resumes"), json!("opensrs_list"));
}

/// Nested scopes: an audit pass runs against one backend while, inside it, a
/// comparison call targets the other.
#[rstest]
fn nested_scopes_compare_backends(domain: Driver) {
    let (primary, secondary) = domain
        .with_handler("enom", |outer| {
            let primary = outer.execute("list", Args::Empty)?;
            let secondary = domain
                .with_handler("opensrs", |inner| inner.execute("list", Args::Empty))?;
            Ok((primary, secondary))
        })
        .expect("audit pass");

    assert_eq!(primary, json!("enom_list"));
    assert_eq!(secondary, json!("opensrs_list"));
    assert_eq!(domain.current_handler().as_deref(), Some("opensrs"));
}

/// A registration flow validates twice with the same arguments; validation is
/// a pure check and the second dispatch sees the same merged defaults.
#[rstest]
fn repeated_registration_is_stable(domain: Driver) {
    let args = Args::keyed([("domain", json!("example.com"))]);

    let first = domain.call("register", args.clone()).expect("first");
    let second = domain.call("register", args).expect("second");
    assert_eq!(first, second);
    assert_eq!(first["years"], json!(1));
}

/// Namespace contexts created under different outer handlers keep serving
/// their own backend after the driver moves on.
#[rstest]
fn long_lived_namespace_contexts_stay_rooted(domain: Driver) {
    let opensrs_ns = domain.namespace("nameservers").expect("opensrs context");

    domain.set_current_handler("enom").expect("switch");
    let enom_ns = domain.namespace("nameservers").expect("enom context");
    domain.clear_current_handler();

    assert_eq!(
        opensrs_ns.call("list", Args::Empty).expect("opensrs"),
        json!("opensrs_ns_list")
    );
    assert_eq!(enom_ns.call("list", Args::Empty).expect("enom"), json!("enom_ns_list"));
}
