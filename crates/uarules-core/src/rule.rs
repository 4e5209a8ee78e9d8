//! User Agent Blocking Rule data model
//!
//! [`UserAgentBlockingRule`] is the typed local record. [`RemoteRule`] is the
//! record as the remote service sends and receives it.

use serde::{Deserialize, Serialize};

use crate::mapper;
use crate::resource_data::ResourceData;

/// Attribute holding the zone the rule belongs to
pub const ZONE_ID_KEY: &str = "zone_id";
/// Attribute holding the free-form description
pub const DESCRIPTION_KEY: &str = "description";
/// Attribute holding the paused flag
pub const PAUSED_KEY: &str = "paused";
/// Attribute holding the action mode
pub const MODE_KEY: &str = "mode";
/// Attribute holding the single-element configuration block
pub const CONFIGURATION_KEY: &str = "configuration";
/// Key of the target inside a configuration block
pub const TARGET_KEY: &str = "target";
/// Key of the value inside a configuration block
pub const VALUE_KEY: &str = "value";

/// What a rule matches on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfiguration {
    /// Match target (the service only knows `ua`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,

    /// User-Agent string to match
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
}

impl RuleConfiguration {
    /// Create a configuration block
    pub fn new(target: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            value: value.into(),
        }
    }
}

/// A rule as exchanged with the remote service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRule {
    /// Identifier assigned by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Whether the rule is disabled
    #[serde(default)]
    pub paused: bool,

    /// Action taken on match (service-defined)
    #[serde(default)]
    pub mode: String,

    /// Match configuration; omitted from requests when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<RuleConfiguration>,
}

/// Typed local record of a User Agent Blocking Rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAgentBlockingRule {
    /// Zone the rule belongs to
    pub zone_id: String,
    /// Remote identifier; `None` until created
    pub id: Option<String>,
    /// Free-form description
    pub description: String,
    /// Whether the rule is disabled
    pub paused: bool,
    /// Action taken on match
    pub mode: String,
    /// Optional match configuration
    pub configuration: Option<RuleConfiguration>,
}

impl UserAgentBlockingRule {
    /// Read the typed record out of host field storage
    ///
    /// The configuration block is only populated when the host holds a
    /// non-empty `configuration` list; inside it, unset `target`/`value` stay
    /// empty rather than being filled in.
    pub fn from_resource_data(data: &ResourceData) -> Self {
        let configuration = data.get_ok(CONFIGURATION_KEY).map(|_| {
            let mut configuration = RuleConfiguration::default();
            if let Some(target) = data.get_ok("configuration.0.target").and_then(|v| v.as_str()) {
                configuration.target = target.to_string();
            }
            if let Some(value) = data.get_ok("configuration.0.value").and_then(|v| v.as_str()) {
                configuration.value = value.to_string();
            }
            configuration
        });

        Self {
            zone_id: data.get_str(ZONE_ID_KEY),
            id: data.id().map(str::to_string),
            description: data.get_str(DESCRIPTION_KEY),
            paused: data.get_bool(PAUSED_KEY),
            mode: data.get_str(MODE_KEY),
            configuration,
        }
    }

    /// Write the record into host field storage
    ///
    /// An absent configuration removes the attribute; an absent id clears
    /// the id slot.
    pub fn apply_to(&self, data: &mut ResourceData) {
        data.set(ZONE_ID_KEY, self.zone_id.clone());
        data.set(DESCRIPTION_KEY, self.description.clone());
        data.set(PAUSED_KEY, self.paused);
        data.set(MODE_KEY, self.mode.clone());
        match &self.configuration {
            Some(configuration) => {
                data.set(CONFIGURATION_KEY, mapper::configuration_to_schema(configuration))
            }
            None => {
                data.remove(CONFIGURATION_KEY);
            }
        }
        match &self.id {
            Some(id) => data.set_id(id.clone()),
            None => data.clear_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_rule_omits_unset_configuration() {
        let rule = RemoteRule {
            description: "block curl".to_string(),
            mode: "block".to_string(),
            ..Default::default()
        };

        let body = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            body,
            json!({ "description": "block curl", "paused": false, "mode": "block" })
        );
    }

    #[test]
    fn test_remote_rule_decodes_api_payload() {
        let rule: RemoteRule = serde_json::from_value(json!({
            "id": "372e67954025e0ba6aaa6d586b9e0b59",
            "paused": true,
            "description": "Prevent access from abusive clients identified by this UserAgent to mitigate DDoS attack",
            "mode": "js_challenge",
            "configuration": {
                "target": "ua",
                "value": "Mozilla/5.0 (compatible; Googlebot/2.1)"
            }
        }))
        .unwrap();

        assert_eq!(rule.id.as_deref(), Some("372e67954025e0ba6aaa6d586b9e0b59"));
        assert!(rule.paused);
        assert_eq!(rule.mode, "js_challenge");
        assert_eq!(
            rule.configuration,
            Some(RuleConfiguration::new("ua", "Mozilla/5.0 (compatible; Googlebot/2.1)"))
        );
    }

    #[test]
    fn test_from_resource_data_without_configuration() {
        let mut data = ResourceData::new();
        data.set(ZONE_ID_KEY, "zone-1");
        data.set(MODE_KEY, "block");
        data.set_id("rule-1");

        let rule = UserAgentBlockingRule::from_resource_data(&data);
        assert_eq!(rule.zone_id, "zone-1");
        assert_eq!(rule.id.as_deref(), Some("rule-1"));
        assert_eq!(rule.mode, "block");
        assert!(!rule.paused);
        assert_eq!(rule.configuration, None);
    }

    #[test]
    fn test_from_resource_data_partial_configuration() {
        let mut data = ResourceData::new();
        data.set(CONFIGURATION_KEY, json!([{ "value": "BadBot" }]));

        let rule = UserAgentBlockingRule::from_resource_data(&data);
        assert_eq!(rule.configuration, Some(RuleConfiguration::new("", "BadBot")));
    }

    #[test]
    fn test_apply_to_round_trip() {
        let rule = UserAgentBlockingRule {
            zone_id: "zone-1".to_string(),
            id: Some("rule-1".to_string()),
            description: "Scrapers".to_string(),
            paused: true,
            mode: "managed_challenge".to_string(),
            configuration: Some(RuleConfiguration::new("ua", "Scrapy/2.11")),
        };

        let mut data = ResourceData::new();
        rule.apply_to(&mut data);
        assert_eq!(data.get_str("configuration.0.value"), "Scrapy/2.11");
        assert_eq!(UserAgentBlockingRule::from_resource_data(&data), rule);

        let cleared = UserAgentBlockingRule {
            id: None,
            configuration: None,
            ..rule
        };
        cleared.apply_to(&mut data);
        assert_eq!(data.id(), None);
        assert!(data.get(CONFIGURATION_KEY).is_none());
    }
}
