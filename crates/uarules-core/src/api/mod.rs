// # Rule API Implementations
//
// Implementations of the UserAgentRuleApi trait that live in the core crate.
// Network-backed clients live in their own provider crates.

pub mod memory;

pub use memory::{MemoryRuleApi, MemoryRuleApiFactory};
