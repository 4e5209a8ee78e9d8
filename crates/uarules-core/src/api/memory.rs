// # Memory Rule API
//
// In-memory stand-in for the remote rule service.
//
// ## Purpose
//
// Behaves like the real service from a caller's point of view: assigns ids
// on create, reports missing rules as `NotFound`, pages list results. Nothing
// survives the process.
//
// ## When to Use
//
// - Tests of lifecycle and host code
// - Trying configurations offline (`UARULES_PROVIDER_TYPE=memory`)

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::config::ProviderConfig;
use crate::rule::RemoteRule;
use crate::traits::{RuleApiFactory, RulePage, UserAgentRuleApi};
use crate::{Error, Result};

/// Rules per page returned by `list_rules`
pub const DEFAULT_PER_PAGE: usize = 20;

/// In-memory rule API implementation
///
/// Rules are keyed by `(zone_id, rule_id)`. Clones share the same storage.
///
/// # Example
///
/// ```rust,no_run
/// use uarules_core::api::MemoryRuleApi;
/// use uarules_core::rule::RemoteRule;
/// use uarules_core::traits::UserAgentRuleApi;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = MemoryRuleApi::new();
///
///     let created = api.create_rule("zone", &RemoteRule::default()).await?;
///     let id = created.id.unwrap();
///
///     let fetched = api.get_rule("zone", &id).await?;
///     assert_eq!(fetched.id.as_deref(), Some(id.as_str()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryRuleApi {
    rules: Arc<RwLock<BTreeMap<(String, String), RemoteRule>>>,
    next_id: Arc<AtomicU64>,
    per_page: usize,
}

impl MemoryRuleApi {
    /// Create an empty rule API
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Use a different page size for `list_rules`
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Number of rules across all zones
    pub async fn len(&self) -> usize {
        self.rules.read().await.len()
    }

    /// Check if no rules are stored
    pub async fn is_empty(&self) -> bool {
        self.rules.read().await.is_empty()
    }

    /// Remove a rule behind the caller's back, as another client would
    pub async fn remove_out_of_band(&self, zone_id: &str, rule_id: &str) -> bool {
        let mut guard = self.rules.write().await;
        guard
            .remove(&(zone_id.to_string(), rule_id.to_string()))
            .is_some()
    }

    /// Replace a rule's contents behind the caller's back
    pub async fn modify_out_of_band(&self, zone_id: &str, rule_id: &str, rule: RemoteRule) -> bool {
        let mut guard = self.rules.write().await;
        match guard.get_mut(&(zone_id.to_string(), rule_id.to_string())) {
            Some(stored) => {
                *stored = RemoteRule {
                    id: Some(rule_id.to_string()),
                    ..rule
                };
                true
            }
            None => false,
        }
    }

    fn not_found(zone_id: &str, rule_id: &str) -> Error {
        Error::not_found(format!(
            "User Agent Blocking Rule {} in zone {}",
            rule_id, zone_id
        ))
    }
}

impl Default for MemoryRuleApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserAgentRuleApi for MemoryRuleApi {
    async fn create_rule(&self, zone_id: &str, rule: &RemoteRule) -> Result<RemoteRule> {
        let id = format!("{:032x}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let stored = RemoteRule {
            id: Some(id.clone()),
            ..rule.clone()
        };

        let mut guard = self.rules.write().await;
        guard.insert((zone_id.to_string(), id), stored.clone());
        Ok(stored)
    }

    async fn get_rule(&self, zone_id: &str, rule_id: &str) -> Result<RemoteRule> {
        let guard = self.rules.read().await;
        guard
            .get(&(zone_id.to_string(), rule_id.to_string()))
            .cloned()
            .ok_or_else(|| Self::not_found(zone_id, rule_id))
    }

    async fn update_rule(
        &self,
        zone_id: &str,
        rule_id: &str,
        rule: &RemoteRule,
    ) -> Result<RemoteRule> {
        let mut guard = self.rules.write().await;
        let stored = guard
            .get_mut(&(zone_id.to_string(), rule_id.to_string()))
            .ok_or_else(|| Self::not_found(zone_id, rule_id))?;

        *stored = RemoteRule {
            id: Some(rule_id.to_string()),
            ..rule.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_rule(&self, zone_id: &str, rule_id: &str) -> Result<()> {
        let mut guard = self.rules.write().await;
        guard
            .remove(&(zone_id.to_string(), rule_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(zone_id, rule_id))
    }

    async fn list_rules(&self, zone_id: &str, page: u32) -> Result<RulePage> {
        if page == 0 {
            return Err(Error::invalid_input("page numbers start at 1"));
        }

        let guard = self.rules.read().await;
        let in_zone: Vec<&RemoteRule> = guard
            .iter()
            .filter(|((zone, _), _)| zone == zone_id)
            .map(|(_, rule)| rule)
            .collect();

        let total_pages = in_zone.len().div_ceil(self.per_page).max(1);
        let rules = in_zone
            .into_iter()
            .skip((page as usize - 1) * self.per_page)
            .take(self.per_page)
            .cloned()
            .collect();

        Ok(RulePage {
            rules,
            page,
            total_pages: Some(total_pages as u32),
        })
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for the in-memory rule API
pub struct MemoryRuleApiFactory;

impl RuleApiFactory for MemoryRuleApiFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn UserAgentRuleApi>> {
        match config {
            ProviderConfig::Memory => Ok(Box::new(MemoryRuleApi::new())),
            _ => Err(Error::config("Invalid config for memory rule API")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(description: &str) -> RemoteRule {
        RemoteRule {
            description: description.to_string(),
            mode: "block".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_memory_api_basic() {
        let api = MemoryRuleApi::new();
        assert!(api.is_empty().await);

        let created = api.create_rule("zone", &rule("first")).await.unwrap();
        let id = created.id.clone().unwrap();
        assert_eq!(api.len().await, 1);

        let fetched = api.get_rule("zone", &id).await.unwrap();
        assert_eq!(fetched, created);

        api.delete_rule("zone", &id).await.unwrap();
        assert!(api.get_rule("zone", &id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_memory_api_ids_are_unique() {
        let api = MemoryRuleApi::new();
        let a = api.create_rule("zone", &rule("a")).await.unwrap();
        let b = api.create_rule("zone", &rule("b")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_memory_api_scopes_by_zone() {
        let api = MemoryRuleApi::new();
        let created = api.create_rule("zone-a", &rule("a")).await.unwrap();
        let id = created.id.unwrap();

        assert!(api.get_rule("zone-b", &id).await.unwrap_err().is_not_found());
        assert!(api.update_rule("zone-b", &id, &rule("x")).await.unwrap_err().is_not_found());
        assert!(api.delete_rule("zone-b", &id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_memory_api_update_keeps_id() {
        let api = MemoryRuleApi::new();
        let id = api.create_rule("zone", &rule("before")).await.unwrap().id.unwrap();

        let updated = api.update_rule("zone", &id, &rule("after")).await.unwrap();
        assert_eq!(updated.id.as_deref(), Some(id.as_str()));
        assert_eq!(updated.description, "after");
    }

    #[tokio::test]
    async fn test_memory_api_pagination() {
        let api = MemoryRuleApi::new().with_per_page(2);
        for i in 0..5 {
            api.create_rule("zone", &rule(&format!("rule {}", i))).await.unwrap();
        }
        api.create_rule("other", &rule("elsewhere")).await.unwrap();

        let first = api.list_rules("zone", 1).await.unwrap();
        assert_eq!(first.rules.len(), 2);
        assert_eq!(first.total_pages, Some(3));
        assert!(first.has_next());

        let last = api.list_rules("zone", 3).await.unwrap();
        assert_eq!(last.rules.len(), 1);
        assert!(!last.has_next());

        assert!(api.list_rules("zone", 0).await.is_err());
    }

    #[test]
    fn test_factory_rejects_other_config() {
        let factory = MemoryRuleApiFactory;
        assert!(factory.create(&ProviderConfig::Memory).is_ok());
        assert!(
            factory
                .create(&ProviderConfig::Cloudflare {
                    api_token: "token".to_string(),
                    base_url: None,
                })
                .is_err()
        );
    }
}
