// # uarules-core
//
// Core library for managing User Agent Blocking Rules as a declarative
// resource.
//
// ## Architecture Overview
//
// - **UserAgentRuleApi**: Trait for the remote service that owns the rules
// - **Resource**: Trait for the create/read/update/delete/import lifecycle
// - **UserAgentBlockingRuleResource**: The lifecycle for User Agent Blocking Rules
// - **mapper**: Field mapping between the local record and the remote record
// - **ResourceSchema**: Attribute description and validation (host side)
// - **LifecycleEngine**: Host that plans, applies and persists resources
// - **StateStore**: Trait for persisting the host's local projection
// - **ApiRegistry**: Plugin-based registry for rule API clients
//
// ## Design Principles
//
// 1. **Remote owns the truth**: Local state is only a cached projection
// 2. **Typed inside, generic at the edge**: `ResourceData` is the only untyped surface
// 3. **Plugin-Based**: API clients are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All lifecycle logic can be used as a library

pub mod api;
pub mod config;
pub mod diag;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod registry;
pub mod resource;
pub mod resource_data;
pub mod rule;
pub mod schema;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use api::MemoryRuleApi;
pub use config::{ProviderConfig, StateStoreConfig, UarulesConfig};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use engine::{Action, LifecycleEngine, Outcome};
pub use error::{Error, Result};
pub use registry::ApiRegistry;
pub use resource::UserAgentBlockingRuleResource;
pub use resource_data::ResourceData;
pub use rule::{RemoteRule, RuleConfiguration, UserAgentBlockingRule};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{Resource, StateStore, UserAgentRuleApi};
