//! Plugin-based rule API registry
//!
//! The registry allows rule API clients to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains in the host.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use uarules_core::registry::ApiRegistry;
//! use uarules_core::config::ProviderConfig;
//!
//! let registry = ApiRegistry::with_builtins();
//! uarules_provider_cloudflare::register(&registry);
//!
//! let config = ProviderConfig::Cloudflare { ... };
//! let api = registry.create_api(&config)?;
//! ```

use crate::api::MemoryRuleApiFactory;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{RuleApiFactory, UserAgentRuleApi};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry for plugin-based rule API creation
///
/// Maps provider type names to factory objects. Uses interior mutability
/// with RwLock, allowing concurrent reads and exclusive writes.
#[derive(Default)]
pub struct ApiRegistry {
    factories: RwLock<HashMap<String, Box<dyn RuleApiFactory>>>,
}

impl ApiRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the in-crate providers (`memory`) registered
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("memory", Box::new(MemoryRuleApiFactory));
        registry
    }

    /// Register a rule API factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "cloudflare")
    /// - `factory`: Factory object for creating API clients
    pub fn register(&self, name: impl Into<String>, factory: Box<dyn RuleApiFactory>) {
        let name = name.into();
        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        factories.insert(name, factory);
    }

    /// Create a rule API client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn UserAgentRuleApi>)`: Created client
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_api(&self, config: &ProviderConfig) -> Result<Box<dyn UserAgentRuleApi>> {
        let provider_type = config.type_name();
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);

        let factory = factories
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has(&self, name: &str) -> bool {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        factories.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingFactory;

    impl RuleApiFactory for FailingFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn UserAgentRuleApi>> {
            Err(Error::not_found("Mock provider not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ApiRegistry::new();
        assert!(!registry.has("mock"));

        registry.register("mock", Box::new(FailingFactory));

        assert!(registry.has("mock"));
        assert_eq!(registry.list(), vec!["mock".to_string()]);
    }

    #[test]
    fn test_builtins_create_memory_api() {
        let registry = ApiRegistry::with_builtins();
        let api = registry.create_api(&ProviderConfig::Memory).unwrap();
        assert_eq!(api.provider_name(), "memory");

        let page = tokio_test::block_on(api.list_rules("zone", 1)).unwrap();
        assert!(page.rules.is_empty());
        assert!(!page.has_next());
    }

    #[test]
    fn test_unknown_provider_type() {
        let registry = ApiRegistry::with_builtins();
        let result = registry.create_api(&ProviderConfig::Cloudflare {
            api_token: "token".to_string(),
            base_url: None,
        });
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("cloudflare")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("cloudflare is not a builtin"),
        }
    }

    #[test]
    fn test_custom_provider_dispatches_on_factory_name() {
        let registry = ApiRegistry::new();
        registry.register("acme", Box::new(FailingFactory));

        let config = ProviderConfig::Custom {
            factory: "acme".to_string(),
            config: serde_json::json!({}),
        };
        assert!(matches!(registry.create_api(&config), Err(Error::NotFound(_))));
    }
}
