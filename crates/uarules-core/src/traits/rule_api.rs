// # Rule API Trait
//
// Defines the interface to the remote service that owns User Agent Blocking
// Rules.
//
// ## Implementations
//
// - Cloudflare: `uarules-provider-cloudflare` crate
// - In-memory: [`crate::api::MemoryRuleApi`]
//
// ## Usage
//
// ```rust,ignore
// use uarules_core::traits::UserAgentRuleApi;
//
// let api = /* UserAgentRuleApi implementation */;
// let created = api.create_rule("zone", &rule).await?;
// let fetched = api.get_rule("zone", created.id.as_deref().unwrap()).await?;
// ```

use async_trait::async_trait;

use crate::rule::RemoteRule;

/// One page of rules returned by [`UserAgentRuleApi::list_rules`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulePage {
    /// Rules on this page
    pub rules: Vec<RemoteRule>,
    /// 1-based page number
    pub page: u32,
    /// Total number of pages, if the service reports it
    pub total_pages: Option<u32>,
}

impl RulePage {
    /// Whether another page follows this one
    pub fn has_next(&self) -> bool {
        match self.total_pages {
            Some(total) => self.page < total,
            None => false,
        }
    }
}

/// Trait for remote rule API implementations
///
/// Each method performs exactly one request against the remote service.
///
/// # Trust Level: Untrusted
///
/// Implementations are thin clients:
/// - ✅ Perform API calls to their endpoint only
/// - ✅ Map transport and status failures onto [`crate::Error`]
/// - ❌ Retry, back off or cache (callers and the host own that)
/// - ❌ Validate rule contents (the schema layer owns that)
///
/// # Not Found
///
/// `get_rule` must return [`crate::Error::NotFound`] when the rule does not
/// exist. Lifecycle code relies on it to detect out-of-band deletion.
#[async_trait]
pub trait UserAgentRuleApi: Send + Sync {
    /// Create a rule in `zone_id`
    ///
    /// # Returns
    ///
    /// - `Ok(RemoteRule)`: The created rule, with its assigned `id`
    /// - `Err(Error)`: If the request failed
    async fn create_rule(&self, zone_id: &str, rule: &RemoteRule) -> Result<RemoteRule, crate::Error>;

    /// Fetch a rule by identifier
    ///
    /// # Returns
    ///
    /// - `Ok(RemoteRule)`: The rule as the service stores it
    /// - `Err(Error::NotFound)`: If the rule does not exist
    /// - `Err(Error)`: If the request failed
    async fn get_rule(&self, zone_id: &str, rule_id: &str) -> Result<RemoteRule, crate::Error>;

    /// Replace a rule's contents
    async fn update_rule(
        &self,
        zone_id: &str,
        rule_id: &str,
        rule: &RemoteRule,
    ) -> Result<RemoteRule, crate::Error>;

    /// Delete a rule
    async fn delete_rule(&self, zone_id: &str, rule_id: &str) -> Result<(), crate::Error>;

    /// Fetch one page of the rules in a zone
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Zone to list
    /// - `page`: 1-based page number
    async fn list_rules(&self, zone_id: &str, page: u32) -> Result<RulePage, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing rule API clients from configuration
pub trait RuleApiFactory: Send + Sync {
    /// Create a UserAgentRuleApi instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Provider configuration
    ///
    /// # Returns
    ///
    /// A boxed UserAgentRuleApi trait object
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn UserAgentRuleApi>, crate::Error>;
}
