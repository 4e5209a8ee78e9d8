// # Resource Trait
//
// The interface a host uses to drive a declarative resource through its
// lifecycle. Every operation works on the host's [`ResourceData`] in place and
// reports back with [`Diagnostics`]; an empty list is success.
//
// The identifier slot carries the lifecycle state: no id means the resource
// is absent, an id means it is present. Operations signal that the remote
// object is gone by clearing the id rather than by failing.

use async_trait::async_trait;

use crate::diag::Diagnostics;
use crate::resource_data::ResourceData;
use crate::schema::ResourceSchema;

/// A declarative resource type
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource type name (e.g. `cloudflare_user_agent_blocking_rule`)
    fn type_name(&self) -> &'static str;

    /// Attribute schema used by the host for validation
    fn schema(&self) -> ResourceSchema;

    /// Create the remote object and record its identifier
    async fn create(&self, data: &mut ResourceData) -> Diagnostics;

    /// Refresh `data` from the remote object
    ///
    /// Clears the identifier if the remote object no longer exists.
    async fn read(&self, data: &mut ResourceData) -> Diagnostics;

    /// Push the configuration in `data` to the existing remote object
    async fn update(&self, data: &mut ResourceData) -> Diagnostics;

    /// Delete the remote object
    async fn delete(&self, data: &mut ResourceData) -> Diagnostics;

    /// Adopt an existing remote object
    ///
    /// On entry the identifier slot holds the user-supplied import string.
    async fn import(&self, data: &mut ResourceData) -> Diagnostics;
}
