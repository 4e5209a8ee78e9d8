//! Lifecycle engine
//!
//! The LifecycleEngine plays the host role for one resource type:
//! - Validates user configuration against the resource schema
//! - Refreshes managed resources, then plans which lifecycle operation a
//!   configuration needs
//! - Drives the resource's create/read/update/delete/import operations
//! - Persists the resulting local projection in a StateStore
//!
//! ## Architecture
//!
//! ```text
//!   configuration ──┐
//!                   ▼
//!          ┌──────────────────┐       ┌──────────────┐
//!          │ LifecycleEngine  │──────▶│  StateStore  │
//!          └──────────────────┘       └──────────────┘
//!                   │
//!                   ▼
//!          ┌──────────────────┐       ┌──────────────────┐
//!          │     Resource     │──────▶│ UserAgentRuleApi │
//!          └──────────────────┘       └──────────────────┘
//! ```
//!
//! ## Persistence Rules
//!
//! - A resource whose identifier is cleared is dropped from state.
//! - State is left untouched when an operation reports errors, except after a
//!   create, where a remote object may already exist and must not be lost.

use crate::diag::{self, Diagnostic, Diagnostics};
use crate::error::{Error, Result};
use crate::resource_data::ResourceData;
use crate::traits::{Resource, StateRecord, StateStore};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info, warn};

/// What the engine decided to do for a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No remote object yet
    Create,
    /// Remote object exists and differs from configuration
    Update,
    /// A force-new attribute changed: delete, then create
    Replace,
    /// Configuration matches state
    NoOp,
    /// Refresh state from the remote object
    Refresh,
    /// Delete the remote object
    Delete,
    /// Adopt an existing remote object
    Import,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Replace => "replace",
            Action::NoOp => "no-op",
            Action::Refresh => "refresh",
            Action::Delete => "delete",
            Action::Import => "import",
        };
        f.write_str(name)
    }
}

/// Result of one engine operation
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Operation performed (or attempted)
    pub action: Action,
    /// Diagnostics reported by validation or the resource
    pub diagnostics: Diagnostics,
    /// Resource data after the operation; `None` if it no longer exists
    pub data: Option<ResourceData>,
}

impl Outcome {
    /// Whether the operation finished without error diagnostics
    pub fn is_success(&self) -> bool {
        !diag::has_errors(&self.diagnostics)
    }
}

/// Host engine for a single resource type
pub struct LifecycleEngine {
    /// Resource implementation
    resource: Box<dyn Resource>,

    /// Local projection of managed resources
    state_store: Box<dyn StateStore>,
}

impl LifecycleEngine {
    /// Create a new lifecycle engine
    pub fn new(resource: Box<dyn Resource>, state_store: Box<dyn StateStore>) -> Self {
        Self {
            resource,
            state_store,
        }
    }

    /// The resource this engine drives
    pub fn resource(&self) -> &dyn Resource {
        self.resource.as_ref()
    }

    /// Decide which operation `config` needs at `address`
    pub async fn plan(&self, address: &str, config: &Map<String, Value>) -> Result<Action> {
        let prior = match self.state_store.get_record(address).await? {
            Some(record) if record.data.id().is_some() => record.data,
            _ => return Ok(Action::Create),
        };

        let schema = self.resource.schema();
        let replace = schema
            .force_new_attributes()
            .any(|name| prior.attributes().get(name) != config.get(name));
        if replace {
            return Ok(Action::Replace);
        }

        if prior.attributes() == config {
            Ok(Action::NoOp)
        } else {
            Ok(Action::Update)
        }
    }

    /// Make the remote object at `address` match `config`
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome)`: The operation ran (check [`Outcome::is_success`])
    /// - `Err(Error)`: Local state could not be read or written
    pub async fn apply(&self, address: &str, config: Map<String, Value>) -> Result<Outcome> {
        let mut data = ResourceData::from_attributes(config);

        let diagnostics = self.resource.schema().validate(&data);
        if diag::has_errors(&diagnostics) {
            warn!("Configuration for {} is invalid", address);
            return Ok(Outcome {
                action: self.plan(address, data.attributes()).await?,
                diagnostics,
                data: None,
            });
        }

        // Plan against the remote object, not the last thing we saw of it.
        if self.is_managed(address).await? {
            let refreshed = self.refresh(address).await?;
            if !refreshed.is_success() {
                return Ok(refreshed);
            }
        }

        let action = self.plan(address, data.attributes()).await?;

        info!("Applying {}: {}", address, action);

        let diagnostics = match action {
            Action::Create => self.resource.create(&mut data).await,
            Action::Update => {
                self.carry_id(address, &mut data).await?;
                self.resource.update(&mut data).await
            }
            Action::Replace => {
                let mut prior = self.prior_data(address).await?;
                let diagnostics = self.resource.delete(&mut prior).await;
                if diag::has_errors(&diagnostics) {
                    return Ok(Outcome {
                        action,
                        diagnostics,
                        data: Some(prior),
                    });
                }
                self.state_store.delete_record(address).await?;
                self.state_store.flush().await?;
                self.resource.create(&mut data).await
            }
            _ => {
                debug!("{} is up to date", address);
                let data = self.prior_data(address).await?;
                return Ok(Outcome {
                    action,
                    diagnostics: Diagnostics::new(),
                    data: Some(data),
                });
            }
        };

        let keep_partial = matches!(action, Action::Create | Action::Replace);
        self.persist(address, action, data, diagnostics, keep_partial)
            .await
    }

    /// Refresh the state at `address` from the remote object
    pub async fn refresh(&self, address: &str) -> Result<Outcome> {
        let mut data = self.prior_data(address).await?;
        let diagnostics = self.resource.read(&mut data).await;
        self.persist(address, Action::Refresh, data, diagnostics, false)
            .await
    }

    /// Delete the remote object at `address` and forget it
    pub async fn destroy(&self, address: &str) -> Result<Outcome> {
        let Some(record) = self.state_store.get_record(address).await? else {
            debug!("Nothing to destroy at {}", address);
            return Ok(Outcome {
                action: Action::NoOp,
                diagnostics: Diagnostics::new(),
                data: None,
            });
        };

        let mut data = record.data;
        let diagnostics = self.resource.delete(&mut data).await;
        self.persist(address, Action::Delete, data, diagnostics, false)
            .await
    }

    /// Adopt the remote object named by `import_id` under `address`
    pub async fn import(&self, address: &str, import_id: &str) -> Result<Outcome> {
        if let Some(record) = self.state_store.get_record(address).await?
            && record.data.id().is_some()
        {
            return Ok(Outcome {
                action: Action::Import,
                diagnostics: vec![Diagnostic::error(format!(
                    "Resource already managed: {} is already tracked in state",
                    address
                ))],
                data: Some(record.data),
            });
        }

        let mut data = ResourceData::new();
        data.set_id(import_id);

        let mut diagnostics = self.resource.import(&mut data).await;
        if !diag::has_errors(&diagnostics) && data.id().is_none() {
            diagnostics.push(
                Diagnostic::error("Cannot import non-existent remote object").with_detail(
                    format!("No {} exists with id {:?}", self.resource.type_name(), import_id),
                ),
            );
        }

        self.persist(address, Action::Import, data, diagnostics, false)
            .await
    }

    /// Stored state for `address`, if any
    pub async fn show(&self, address: &str) -> Result<Option<StateRecord>> {
        self.state_store.get_record(address).await
    }

    /// All managed resource addresses
    pub async fn addresses(&self) -> Result<Vec<String>> {
        self.state_store.list_records().await
    }

    async fn is_managed(&self, address: &str) -> Result<bool> {
        Ok(self
            .state_store
            .get_record(address)
            .await?
            .is_some_and(|record| record.data.id().is_some()))
    }

    async fn prior_data(&self, address: &str) -> Result<ResourceData> {
        self.state_store
            .get_record(address)
            .await?
            .map(|record| record.data)
            .ok_or_else(|| Error::not_found(format!("No state for {}", address)))
    }

    async fn carry_id(&self, address: &str, data: &mut ResourceData) -> Result<()> {
        let prior = self.prior_data(address).await?;
        if let Some(id) = prior.id() {
            data.set_id(id);
        }
        Ok(())
    }

    async fn persist(
        &self,
        address: &str,
        action: Action,
        data: ResourceData,
        diagnostics: Diagnostics,
        keep_partial: bool,
    ) -> Result<Outcome> {
        let failed = diag::has_errors(&diagnostics);

        if failed && !(keep_partial && data.id().is_some()) {
            warn!("{} of {} failed; state left unchanged", action, address);
            return Ok(Outcome {
                action,
                diagnostics,
                data: Some(data),
            });
        }

        let data = if data.id().is_some() {
            let record = StateRecord::new(self.resource.type_name(), data.clone());
            self.state_store.set_record(address, &record).await?;
            Some(data)
        } else {
            info!("{} no longer exists; removing from state", address);
            self.state_store.delete_record(address).await?;
            None
        };
        self.state_store.flush().await?;

        Ok(Outcome {
            action,
            diagnostics,
            data,
        })
    }
}
