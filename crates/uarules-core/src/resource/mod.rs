// # User Agent Blocking Rule Resource
//
// Lifecycle operations for a User Agent Blocking Rule. Each operation reads
// the typed record out of the host's field storage, issues one remote call,
// and, except on failure, reconciles with a follow-up read.
//
// ## States
//
// The identifier slot is the state: absent before create and after the
// remote reports the rule gone, present otherwise.
//
// ## Errors
//
// - Remote failures are wrapped with the operation name and returned as a
//   single error diagnostic. Nothing is retried.
// - "Not found" during read is not an error: the identifier is cleared so the
//   host can plan a re-create.
// - A malformed import id fails before any remote call.

use async_trait::async_trait;
use std::sync::Arc;

use crate::diag::{self, Diagnostics};
use crate::error::{Error, Result};
use crate::mapper;
use crate::resource_data::ResourceData;
use crate::rule::{
    CONFIGURATION_KEY, DESCRIPTION_KEY, MODE_KEY, PAUSED_KEY, TARGET_KEY, UserAgentBlockingRule,
    VALUE_KEY, ZONE_ID_KEY,
};
use crate::schema::{Attribute, ResourceSchema};
use crate::traits::{Resource, UserAgentRuleApi};

/// Resource type name
pub const RESOURCE_TYPE: &str = "cloudflare_user_agent_blocking_rule";

/// Modes the schema layer accepts
pub const KNOWN_MODES: &[&str] = &["block", "challenge", "js_challenge", "managed_challenge"];

/// Configuration targets the schema layer accepts
pub const KNOWN_TARGETS: &[&str] = &["ua"];

/// Split an import id of the form `<zone_id>/<rule_id>` on the first `/`
///
/// Either part may be empty; whether such ids exist is for the remote service
/// to decide.
pub fn parse_import_id(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('/').ok_or_else(|| {
        Error::invalid_input(format!(
            "invalid id (\"{}\") specified, should be in format \"zoneID/userAgentBlockingRuleID\"",
            raw
        ))
    })
}

/// User Agent Blocking Rule resource backed by a remote rule API
pub struct UserAgentBlockingRuleResource {
    api: Arc<dyn UserAgentRuleApi>,
}

impl UserAgentBlockingRuleResource {
    /// Create the resource on top of a rule API client
    pub fn new(api: Arc<dyn UserAgentRuleApi>) -> Self {
        Self { api }
    }
}

impl std::fmt::Debug for UserAgentBlockingRuleResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAgentBlockingRuleResource")
            .field("api", &self.api.provider_name())
            .finish()
    }
}

#[async_trait]
impl Resource for UserAgentBlockingRuleResource {
    fn type_name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema {
            type_name: RESOURCE_TYPE,
            description: "Provides a resource to manage User Agent Blocking Rules.",
            attributes: vec![
                Attribute::required_string(ZONE_ID_KEY)
                    .force_new()
                    .with_description("The zone identifier to target for the resource."),
                Attribute::required_string(DESCRIPTION_KEY)
                    .with_description("An informative summary of the rule."),
                Attribute::required_bool(PAUSED_KEY)
                    .with_description("When true, indicates that the rule is currently paused."),
                Attribute::required_string(MODE_KEY)
                    .one_of(KNOWN_MODES)
                    .with_description("The action to apply to a matched request."),
                Attribute::optional_block(
                    CONFIGURATION_KEY,
                    vec![
                        Attribute::required_string(TARGET_KEY)
                            .one_of(KNOWN_TARGETS)
                            .with_description("The configuration target for this rule."),
                        Attribute::required_string(VALUE_KEY)
                            .with_description("The exact user agent string to match."),
                    ],
                )
                .max_items(1)
                .with_description("The configuration object for the current rule."),
            ],
        }
    }

    async fn create(&self, data: &mut ResourceData) -> Diagnostics {
        let rule = UserAgentBlockingRule::from_resource_data(data);
        let request = mapper::to_remote(&rule);

        let created = match self.api.create_rule(&rule.zone_id, &request).await {
            Ok(created) => created,
            Err(e) => return diag::from_err(e.context("failed to create User Agent Blocking Rule")),
        };

        match created.id {
            Some(id) if !id.is_empty() => {
                tracing::debug!("Created User Agent Blocking Rule {} in zone {}", id, rule.zone_id);
                data.set_id(id);
            }
            _ => {
                return diag::from_err(
                    Error::provider(self.api.provider_name(), "response did not include a rule id")
                        .context("failed to create User Agent Blocking Rule"),
                );
            }
        }

        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Diagnostics {
        let zone_id = data.get_str(ZONE_ID_KEY);
        let Some(rule_id) = data.id().map(str::to_string) else {
            return Diagnostics::new();
        };

        match self.api.get_rule(&zone_id, &rule_id).await {
            Ok(remote) => {
                mapper::from_remote(&remote, data);
                Diagnostics::new()
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("User Agent Blocking Rule {} no longer exists", rule_id);
                data.clear_id();
                Diagnostics::new()
            }
            Err(e) => diag::from_err(
                e.context(format!("error finding User Agent Blocking Rule {:?}", rule_id)),
            ),
        }
    }

    async fn update(&self, data: &mut ResourceData) -> Diagnostics {
        let rule = UserAgentBlockingRule::from_resource_data(data);
        let Some(rule_id) = rule.id.as_deref() else {
            return diag::from_err(
                Error::invalid_input("resource has no id").context("failed to update User Agent Blocking Rule"),
            );
        };

        let request = mapper::to_remote(&rule);
        if let Err(e) = self.api.update_rule(&rule.zone_id, rule_id, &request).await {
            return diag::from_err(e.context("failed to update User Agent Blocking Rule"));
        }

        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Diagnostics {
        let zone_id = data.get_str(ZONE_ID_KEY);
        let Some(rule_id) = data.id().map(str::to_string) else {
            return Diagnostics::new();
        };

        if let Err(e) = self.api.delete_rule(&zone_id, &rule_id).await {
            return diag::from_err(e.context("failed to delete User Agent Blocking Rule"));
        }

        self.read(data).await
    }

    async fn import(&self, data: &mut ResourceData) -> Diagnostics {
        let raw = data.id().unwrap_or_default().to_string();
        let (zone_id, rule_id) = match parse_import_id(&raw) {
            Ok(parts) => parts,
            Err(e) => return diag::from_err(e),
        };

        tracing::debug!(
            "Importing User Agent Blocking Rule: id {} for zone {}",
            rule_id,
            zone_id
        );

        data.set(ZONE_ID_KEY, zone_id);
        data.set_id(rule_id);

        self.read(data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryRuleApi;
    use crate::diag::has_errors;

    #[test]
    fn test_parse_import_id() {
        assert_eq!(parse_import_id("zoneA/ruleB").unwrap(), ("zoneA", "ruleB"));
        assert_eq!(parse_import_id("/").unwrap(), ("", ""));
        assert_eq!(parse_import_id("a/b/c").unwrap(), ("a", "b/c"));
    }

    #[test]
    fn test_parse_import_id_without_separator() {
        let err = parse_import_id("zoneAonly").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("zoneID/userAgentBlockingRuleID"));
    }

    #[tokio::test]
    async fn test_import_malformed_id_leaves_data_untouched() {
        let resource = UserAgentBlockingRuleResource::new(Arc::new(MemoryRuleApi::new()));
        let mut data = ResourceData::new();
        data.set_id("zoneAonly");

        let diags = resource.import(&mut data).await;
        assert!(has_errors(&diags));
        assert!(data.get(ZONE_ID_KEY).is_none());
        assert_eq!(data.id(), Some("zoneAonly"));
    }

    #[tokio::test]
    async fn test_read_without_id_is_noop() {
        let resource = UserAgentBlockingRuleResource::new(Arc::new(MemoryRuleApi::new()));
        let mut data = ResourceData::new();
        data.set(ZONE_ID_KEY, "zone-1");

        assert!(resource.read(&mut data).await.is_empty());
        assert_eq!(data.id(), None);
    }

    #[test]
    fn test_schema_shape() {
        let resource = UserAgentBlockingRuleResource::new(Arc::new(MemoryRuleApi::new()));
        let schema = resource.schema();

        assert_eq!(schema.type_name, RESOURCE_TYPE);
        assert!(schema.attribute(ZONE_ID_KEY).unwrap().force_new);
        assert_eq!(schema.attribute(CONFIGURATION_KEY).unwrap().max_items, Some(1));
        assert_eq!(schema.attribute(MODE_KEY).unwrap().allowed_values, KNOWN_MODES);
    }
}
