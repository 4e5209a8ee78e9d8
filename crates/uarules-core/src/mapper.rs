//! Mapping between the local rule record and the remote record
//!
//! Both directions are total: no validation happens here.

use serde_json::{Map, Value};

use crate::resource_data::ResourceData;
use crate::rule::{
    CONFIGURATION_KEY, DESCRIPTION_KEY, MODE_KEY, PAUSED_KEY, RemoteRule, RuleConfiguration,
    TARGET_KEY, UserAgentBlockingRule, VALUE_KEY,
};

/// Build the request body for a create or update call
pub fn to_remote(rule: &UserAgentBlockingRule) -> RemoteRule {
    RemoteRule {
        id: None,
        description: rule.description.clone(),
        paused: rule.paused,
        mode: rule.mode.clone(),
        configuration: rule.configuration.clone(),
    }
}

/// Copy server-reported values back into host field storage
///
/// Identity fields (`zone_id`, id) are left alone.
pub fn from_remote(remote: &RemoteRule, data: &mut ResourceData) {
    data.set(PAUSED_KEY, remote.paused);
    data.set(MODE_KEY, remote.mode.clone());
    data.set(DESCRIPTION_KEY, remote.description.clone());

    match &remote.configuration {
        Some(configuration) => data.set(CONFIGURATION_KEY, configuration_to_schema(configuration)),
        None => {
            data.remove(CONFIGURATION_KEY);
        }
    }
}

/// Encode a configuration as the one-element list the schema layer uses for
/// an optional nested block
pub fn configuration_to_schema(configuration: &RuleConfiguration) -> Value {
    let mut block = Map::new();
    block.insert(TARGET_KEY.to_string(), Value::String(configuration.target.clone()));
    block.insert(VALUE_KEY.to_string(), Value::String(configuration.value.clone()));
    Value::Array(vec![Value::Object(block)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::ZONE_ID_KEY;
    use serde_json::json;

    fn rule(configuration: Option<RuleConfiguration>) -> UserAgentBlockingRule {
        UserAgentBlockingRule {
            zone_id: "zone-1".to_string(),
            id: Some("rule-1".to_string()),
            description: "No scrapers".to_string(),
            paused: true,
            mode: "challenge".to_string(),
            configuration,
        }
    }

    fn round_trip(rule: &UserAgentBlockingRule) -> UserAgentBlockingRule {
        let mut data = ResourceData::new();
        data.set(ZONE_ID_KEY, rule.zone_id.clone());
        if let Some(id) = &rule.id {
            data.set_id(id.clone());
        }
        from_remote(&to_remote(rule), &mut data);
        UserAgentBlockingRule::from_resource_data(&data)
    }

    #[test]
    fn test_round_trip_with_configuration() {
        let original = rule(Some(RuleConfiguration::new("ua", "Scrapy/2.11")));
        assert_eq!(round_trip(&original), original);
    }

    #[test]
    fn test_round_trip_without_configuration() {
        let original = rule(None);
        let restored = round_trip(&original);
        assert_eq!(restored, original);
        assert_eq!(restored.configuration, None);
    }

    #[test]
    fn test_to_remote_never_sends_id() {
        let remote = to_remote(&rule(None));
        assert_eq!(remote.id, None);
        assert_eq!(remote.configuration, None);
        assert!(remote.paused);
    }

    #[test]
    fn test_from_remote_drops_stale_configuration() {
        let mut data = ResourceData::new();
        data.set(CONFIGURATION_KEY, json!([{ "target": "ua", "value": "old" }]));

        from_remote(&RemoteRule::default(), &mut data);
        assert!(data.get(CONFIGURATION_KEY).is_none());
    }

    #[test]
    fn test_configuration_is_single_element_list() {
        let encoded = configuration_to_schema(&RuleConfiguration::new("ua", "BadBot"));
        assert_eq!(encoded, json!([{ "target": "ua", "value": "BadBot" }]));
    }
}
