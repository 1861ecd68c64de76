use async_trait::async_trait;

use canvas_common::{
    ApiId, HeliostatRecord, LightSourceRecord, ProjectRecord, ReceiverRecord, SettingsRecord,
};

use crate::GatewayError;

/// The remote store an editing session keeps in sync with.
///
/// There is one create/update/delete triple per entity kind. Every call
/// carries the entity's full record rather than a diff. Creates return the
/// stored record, whose `id` is the identifier the store assigned.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait PersistenceGateway: Send + Sync + 'static {
    async fn create_heliostat(&self, record: HeliostatRecord)
    -> Result<HeliostatRecord, GatewayError>;

    async fn update_heliostat(
        &self,
        id: ApiId,
        record: HeliostatRecord,
    ) -> Result<HeliostatRecord, GatewayError>;

    async fn delete_heliostat(&self, id: ApiId) -> Result<(), GatewayError>;

    async fn create_receiver(&self, record: ReceiverRecord) -> Result<ReceiverRecord, GatewayError>;

    async fn update_receiver(
        &self,
        id: ApiId,
        record: ReceiverRecord,
    ) -> Result<ReceiverRecord, GatewayError>;

    async fn delete_receiver(&self, id: ApiId) -> Result<(), GatewayError>;

    async fn create_light_source(
        &self,
        record: LightSourceRecord,
    ) -> Result<LightSourceRecord, GatewayError>;

    async fn update_light_source(
        &self,
        id: ApiId,
        record: LightSourceRecord,
    ) -> Result<LightSourceRecord, GatewayError>;

    async fn delete_light_source(&self, id: ApiId) -> Result<(), GatewayError>;

    /// Fetches the whole project the session is editing.
    async fn load_project(&self) -> Result<ProjectRecord, GatewayError>;

    async fn update_settings(&self, settings: SettingsRecord) -> Result<(), GatewayError>;
}
