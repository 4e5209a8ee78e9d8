//! Test doubles and common utilities for lifecycle contract tests

#![allow(dead_code)]

use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uarules_core::api::MemoryRuleApi;
use uarules_core::error::{Error, Result};
use uarules_core::rule::RemoteRule;
use uarules_core::traits::{RulePage, UserAgentRuleApi};
use uarules_core::{ResourceData, UserAgentBlockingRuleResource};

/// Remote API methods, for call recording and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Create,
    Get,
    Update,
    Delete,
    List,
}

/// A rule API that records every call and can be told to fail
///
/// Storage is delegated to [`MemoryRuleApi`]. When `normalize` is on, the
/// "server" trims whitespace from descriptions it stores, so tests can tell
/// submitted payloads apart from server-reported values.
pub struct RecordingRuleApi {
    inner: MemoryRuleApi,
    calls: Mutex<Vec<Method>>,
    failures: Mutex<HashMap<Method, String>>,
    normalize: bool,
}

impl RecordingRuleApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryRuleApi::new(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            normalize: false,
        })
    }

    pub fn normalizing() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryRuleApi::new(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            normalize: true,
        })
    }

    /// Backing storage, for out-of-band changes
    pub fn storage(&self) -> &MemoryRuleApi {
        &self.inner
    }

    /// Make every call to `method` fail with a provider error
    pub fn fail(&self, method: Method, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(method, message.to_string());
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<Method> {
        self.calls.lock().unwrap().clone()
    }

    /// Forget recorded calls
    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn enter(&self, method: Method) -> Result<()> {
        self.calls.lock().unwrap().push(method);
        match self.failures.lock().unwrap().get(&method) {
            Some(message) => Err(Error::provider("recording", message.clone())),
            None => Ok(()),
        }
    }

    fn server_side(&self, rule: &RemoteRule) -> RemoteRule {
        let mut stored = rule.clone();
        if self.normalize {
            stored.description = stored.description.trim().to_string();
        }
        stored
    }
}

#[async_trait::async_trait]
impl UserAgentRuleApi for RecordingRuleApi {
    async fn create_rule(&self, zone_id: &str, rule: &RemoteRule) -> Result<RemoteRule> {
        self.enter(Method::Create)?;
        self.inner.create_rule(zone_id, &self.server_side(rule)).await
    }

    async fn get_rule(&self, zone_id: &str, rule_id: &str) -> Result<RemoteRule> {
        self.enter(Method::Get)?;
        self.inner.get_rule(zone_id, rule_id).await
    }

    async fn update_rule(
        &self,
        zone_id: &str,
        rule_id: &str,
        rule: &RemoteRule,
    ) -> Result<RemoteRule> {
        self.enter(Method::Update)?;
        self.inner
            .update_rule(zone_id, rule_id, &self.server_side(rule))
            .await
    }

    async fn delete_rule(&self, zone_id: &str, rule_id: &str) -> Result<()> {
        self.enter(Method::Delete)?;
        self.inner.delete_rule(zone_id, rule_id).await
    }

    async fn list_rules(&self, zone_id: &str, page: u32) -> Result<RulePage> {
        self.enter(Method::List)?;
        self.inner.list_rules(zone_id, page).await
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Resource wired to a recording API
pub fn resource(api: &Arc<RecordingRuleApi>) -> UserAgentBlockingRuleResource {
    UserAgentBlockingRuleResource::new(api.clone())
}

/// User configuration for a rule
pub fn rule_config(zone_id: &str, description: &str, user_agent: Option<&str>) -> Map<String, Value> {
    let mut value = json!({
        "zone_id": zone_id,
        "description": description,
        "paused": false,
        "mode": "block",
    });
    if let Some(user_agent) = user_agent {
        value["configuration"] = json!([{ "target": "ua", "value": user_agent }]);
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Resource data holding user configuration, as the host passes it to create
pub fn rule_data(zone_id: &str, description: &str, user_agent: Option<&str>) -> ResourceData {
    ResourceData::from_attributes(rule_config(zone_id, description, user_agent))
}
