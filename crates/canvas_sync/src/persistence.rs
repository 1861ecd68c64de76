use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use canvas_common::{EntityRecord, ProjectRecord, SceneObject, SettingsRecord};

use crate::{GatewayError, PersistenceGateway};

/// What happens to a local change when the store rejects it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Keep the local change, log the failure and carry on.
    #[default]
    Optimistic,
    /// Report the failure so the caller can undo its local change.
    WriteThrough,
}

/// Keeps scene objects and the remote store in step.
///
/// Enforces the id discipline: an object gets its [`ApiId`](canvas_common::ApiId)
/// from its first successful create, updates and deletes are keyed by it, and
/// an object without one never reaches the store for an update or a delete.
#[derive(Clone)]
pub struct Persistence {
    gateway: Arc<dyn PersistenceGateway>,
    policy: SyncPolicy,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Persistence {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            policy: SyncPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn gateway(&self) -> &Arc<dyn PersistenceGateway> {
        &self.gateway
    }

    /// Creates `object` in the store and records the id it was given.
    ///
    /// An object that still has an id, because its earlier delete failed,
    /// overwrites that record instead. If the store no longer holds it, the
    /// id is dropped and a new record is created.
    pub async fn create(&self, object: &SceneObject) -> Result<(), GatewayError> {
        let result = self.try_create(object).await;
        self.settle("create", object, result)
    }

    /// Sends the full record of `object`. No-op for unpersisted objects.
    pub async fn update(&self, object: &SceneObject) -> Result<(), GatewayError> {
        let result = self.try_update(object).await;
        self.settle("update", object, result)
    }

    /// Deletes `object` from the store and clears its id. No-op for
    /// unpersisted objects.
    pub async fn delete(&self, object: &SceneObject) -> Result<(), GatewayError> {
        let result = self.try_delete(object).await;
        self.settle("delete", object, result)
    }

    pub async fn load_project(&self) -> Result<ProjectRecord, GatewayError> {
        self.gateway.load_project().await
    }

    pub async fn update_settings(&self, settings: SettingsRecord) -> Result<(), GatewayError> {
        match self.gateway.update_settings(settings).await {
            Err(err) if self.policy == SyncPolicy::Optimistic => {
                warn!("[Persistence] Failed to store settings {:?}: {}", settings, err);
                Ok(())
            }
            result => result,
        }
    }

    async fn try_create(&self, object: &SceneObject) -> Result<(), GatewayError> {
        if let Some(id) = object.api_id() {
            match self.try_update(object).await {
                Err(GatewayError::NotFound { .. }) => {
                    debug!(
                        "[Persistence] {} {} is gone from the store, creating it anew",
                        object.kind(),
                        id
                    );
                    object.set_api_id(None);
                }
                result => return result,
            }
        }
        let stored = match object.to_record() {
            EntityRecord::Heliostat(r) => {
                EntityRecord::Heliostat(self.gateway.create_heliostat(r).await?)
            }
            EntityRecord::Receiver(r) => {
                EntityRecord::Receiver(self.gateway.create_receiver(r).await?)
            }
            EntityRecord::LightSource(r) => {
                EntityRecord::LightSource(self.gateway.create_light_source(r).await?)
            }
        };
        let id = stored.id().ok_or_else(|| {
            GatewayError::Codec(format!("created {} record carries no id", stored.kind()))
        })?;
        object.set_api_id(Some(id));
        debug!("[Persistence] Created {} {}", object.kind(), id);
        Ok(())
    }

    async fn try_update(&self, object: &SceneObject) -> Result<(), GatewayError> {
        let Some(id) = object.api_id() else {
            trace!("[Persistence] Skipping update of unpersisted {}", object.kind());
            return Ok(());
        };
        match object.to_record() {
            EntityRecord::Heliostat(r) => {
                self.gateway.update_heliostat(id, r).await?;
            }
            EntityRecord::Receiver(r) => {
                self.gateway.update_receiver(id, r).await?;
            }
            EntityRecord::LightSource(r) => {
                self.gateway.update_light_source(id, r).await?;
            }
        }
        trace!("[Persistence] Updated {} {}", object.kind(), id);
        Ok(())
    }

    async fn try_delete(&self, object: &SceneObject) -> Result<(), GatewayError> {
        let Some(id) = object.api_id() else {
            trace!("[Persistence] Skipping delete of unpersisted {}", object.kind());
            return Ok(());
        };
        match object {
            SceneObject::Heliostat(_) => self.gateway.delete_heliostat(id).await?,
            SceneObject::Receiver(_) => self.gateway.delete_receiver(id).await?,
            SceneObject::LightSource(_) => self.gateway.delete_light_source(id).await?,
        }
        object.set_api_id(None);
        debug!("[Persistence] Deleted {} {}", object.kind(), id);
        Ok(())
    }

    fn settle(
        &self,
        operation: &'static str,
        object: &SceneObject,
        result: Result<(), GatewayError>,
    ) -> Result<(), GatewayError> {
        match (result, self.policy) {
            (Ok(()), _) => Ok(()),
            (Err(err), SyncPolicy::Optimistic) => {
                warn!(
                    "[Persistence] Failed to {} {} '{}', keeping local state: {}",
                    operation,
                    object.kind(),
                    object.display_name(),
                    err
                );
                Ok(())
            }
            (Err(err), SyncPolicy::WriteThrough) => {
                debug!(
                    "[Persistence] Failed to {} {} '{}': {}",
                    operation,
                    object.kind(),
                    object.display_name(),
                    err
                );
                Err(err)
            }
        }
    }
}
