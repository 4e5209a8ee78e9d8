//! Contract Test: Import
//!
//! Constraints verified:
//! - `<zone_id>/<rule_id>` is split on the first `/` only
//! - A malformed id fails before any remote call
//! - A successful import leaves data equivalent to a fresh read

mod common;

use common::*;
use uarules_core::ResourceData;
use uarules_core::diag::has_errors;
use uarules_core::traits::{Resource, UserAgentRuleApi};

#[tokio::test]
async fn import_populates_from_remote() {
    let api = RecordingRuleApi::new();
    let resource = resource(&api);
    let mut original = rule_data("zoneA", "Block curl", Some("curl/8.4.0"));
    assert!(resource.create(&mut original).await.is_empty());
    let rule_id = original.id().unwrap().to_string();
    api.reset_calls();

    let mut data = ResourceData::new();
    data.set_id(format!("zoneA/{}", rule_id));
    let diags = resource.import(&mut data).await;

    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    assert_eq!(api.calls(), vec![Method::Get]);
    assert_eq!(data.id(), Some(rule_id.as_str()));
    assert_eq!(data.get_str("zone_id"), "zoneA");
    assert_eq!(data, original, "import matches a fresh read");
}

#[tokio::test]
async fn import_without_separator_fails_before_remote_call() {
    let api = RecordingRuleApi::new();
    let resource = resource(&api);
    let mut data = ResourceData::new();
    data.set_id("zoneAonly");

    let diags = resource.import(&mut data).await;

    assert!(has_errors(&diags));
    assert_eq!(
        diags[0].summary,
        "Invalid input: invalid id (\"zoneAonly\") specified, should be in format \"zoneID/userAgentBlockingRuleID\""
    );
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn import_of_empty_parts_is_not_rejected_locally() {
    let api = RecordingRuleApi::new();
    let resource = resource(&api);
    let mut data = ResourceData::new();
    data.set_id("/");

    let diags = resource.import(&mut data).await;

    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    assert_eq!(data.get_str("zone_id"), "");
    assert_eq!(data.id(), None, "an empty rule id leaves nothing to read");
}

#[tokio::test]
async fn import_keeps_extra_slashes_in_rule_id() {
    let api = RecordingRuleApi::new();
    let resource = resource(&api);
    let mut data = ResourceData::new();
    data.set_id("zone/a/b");

    let diags = resource.import(&mut data).await;

    // The rule does not exist, so the read clears the id without error.
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    assert_eq!(api.calls(), vec![Method::Get]);
    assert_eq!(data.get_str("zone_id"), "zone");
    assert_eq!(data.id(), None);
}

#[tokio::test]
async fn import_surfaces_read_errors() {
    let api = RecordingRuleApi::new();
    api.fail(Method::Get, "forbidden");
    let resource = resource(&api);
    let mut data = ResourceData::new();
    data.set_id("zone/rule");

    let diags = resource.import(&mut data).await;

    assert!(has_errors(&diags));
    assert!(
        diags[0]
            .summary
            .starts_with("error finding User Agent Blocking Rule \"rule\"")
    );
}

#[tokio::test]
async fn import_of_rule_in_another_zone_finds_nothing() {
    let api = RecordingRuleApi::new();
    let created = api
        .storage()
        .create_rule("zoneA", &Default::default())
        .await
        .unwrap();
    let resource = resource(&api);

    let mut data = ResourceData::new();
    data.set_id(format!("zoneB/{}", created.id.unwrap()));
    let diags = resource.import(&mut data).await;

    assert!(diags.is_empty());
    assert_eq!(data.id(), None);
}
