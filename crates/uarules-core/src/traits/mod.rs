//! Core traits for the uarules system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`UserAgentRuleApi`]: Talk to the remote service that owns the rules
//! - [`Resource`]: Lifecycle operations a host drives
//! - [`StateStore`]: Persistence of the host's local projection

pub mod resource;
pub mod rule_api;
pub mod state_store;

pub use resource::Resource;
pub use rule_api::{RuleApiFactory, RulePage, UserAgentRuleApi};
pub use state_store::{StateRecord, StateStore};
