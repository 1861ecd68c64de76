//! A complete [`PersistenceGateway`] that keeps the project in memory.
//!
//! Records are stored bincode-encoded, the same way they would sit in a
//! byte-oriented cache, so every call pays the encode/decode round trip a
//! real store would. Calls are journaled and failures can be injected.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::trace;

use canvas_common::{
    ApiId, EntityKind, HeliostatRecord, LightSourceRecord, ProjectRecord, ReceiverRecord,
    SettingsRecord,
};

use crate::{GatewayError, PersistenceGateway};

/// The kind of request a gateway received.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    Create,
    Update,
    Delete,
    LoadProject,
    UpdateSettings,
}

/// One journaled gateway call.
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayCall {
    /// `None` for project-level calls.
    pub kind: Option<EntityKind>,
    pub op: GatewayOp,
    pub id: Option<ApiId>,
}

trait StoredRecord: Serialize + DeserializeOwned {
    const KIND: EntityKind;

    fn id(&self) -> Option<u64>;

    fn set_id(&mut self, id: u64);
}

macro_rules! impl_stored_record {
    ($record:ty, $kind:ident) => {
        impl StoredRecord for $record {
            const KIND: EntityKind = EntityKind::$kind;

            fn id(&self) -> Option<u64> {
                self.id
            }

            fn set_id(&mut self, id: u64) {
                self.id = Some(id);
            }
        }
    };
}

impl_stored_record!(HeliostatRecord, Heliostat);
impl_stored_record!(ReceiverRecord, Receiver);
impl_stored_record!(LightSourceRecord, LightSource);

/// Splits `records` into those that already carry an id and those that don't.
fn numbered_first<T: StoredRecord>(records: Vec<T>) -> (Vec<T>, Vec<T>) {
    records.into_iter().partition(|record| record.id().is_some())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct InMemoryGateway {
    project_name: String,
    records: DashMap<(EntityKind, ApiId), Vec<u8>>,
    settings: Mutex<SettingsRecord>,
    next_id: AtomicU64,
    calls: Mutex<Vec<GatewayCall>>,
    /// One slot per upcoming call, `None` lets the call through.
    failures: Mutex<VecDeque<Option<GatewayError>>>,
    offline: AtomicBool,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            project_name: String::new(),
            records: DashMap::new(),
            settings: Mutex::new(SettingsRecord::default()),
            next_id: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// A store already holding `project`.
    ///
    /// Records that carry an id keep it and are stored first, so records
    /// without one are numbered past every id already taken. Two records of
    /// one kind with the same id are rejected.
    pub fn with_project(project: ProjectRecord) -> Result<Self, GatewayError> {
        let mut gateway = Self::new();
        gateway.project_name = project.name;
        *lock(&gateway.settings) = project.settings;
        let (heliostats, new_heliostats) = numbered_first(project.heliostats);
        let (receivers, new_receivers) = numbered_first(project.receivers);
        let (lightsources, new_lightsources) = numbered_first(project.lightsources);
        gateway.seed_all(heliostats)?;
        gateway.seed_all(receivers)?;
        gateway.seed_all(lightsources)?;
        gateway.seed_all(new_heliostats)?;
        gateway.seed_all(new_receivers)?;
        gateway.seed_all(new_lightsources)?;
        Ok(gateway)
    }

    /// Makes the next unscheduled call fail with `error`. Queued errors are
    /// used in order, one per call.
    pub fn fail_next(&self, error: GatewayError) {
        lock(&self.failures).push_back(Some(error));
    }

    /// Makes the call `n` positions from now fail (0 is the next call).
    pub fn fail_nth(&self, n: usize, error: GatewayError) {
        let mut failures = lock(&self.failures);
        if failures.len() <= n {
            failures.resize(n + 1, None);
        }
        failures[n] = Some(error);
    }

    /// While offline every call fails with [`GatewayError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, kind: EntityKind, op: GatewayOp) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.kind == Some(kind) && call.op == op)
            .count()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub fn contains(&self, kind: EntityKind, id: ApiId) -> bool {
        self.records.contains_key(&(kind, id))
    }

    /// Number of stored entities of `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.records.iter().filter(|entry| entry.key().0 == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn heliostat(&self, id: ApiId) -> Result<HeliostatRecord, GatewayError> {
        self.fetch(id)
    }

    pub fn receiver(&self, id: ApiId) -> Result<ReceiverRecord, GatewayError> {
        self.fetch(id)
    }

    pub fn light_source(&self, id: ApiId) -> Result<LightSourceRecord, GatewayError> {
        self.fetch(id)
    }

    pub fn settings(&self) -> SettingsRecord {
        *lock(&self.settings)
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn seed_all<T: StoredRecord>(&self, records: Vec<T>) -> Result<(), GatewayError> {
        records.into_iter().try_for_each(|record| self.seed(record))
    }

    fn seed<T: StoredRecord>(&self, mut record: T) -> Result<(), GatewayError> {
        let id = match record.id() {
            Some(id) => {
                if self.contains(T::KIND, ApiId(id)) {
                    return Err(GatewayError::Rejected {
                        status: 409,
                        message: format!("duplicate {} id {}", T::KIND, id),
                    });
                }
                self.next_id.fetch_max(id + 1, Ordering::SeqCst);
                id
            }
            None => {
                let id = self.allocate_id();
                record.set_id(id);
                id
            }
        };
        self.store(ApiId(id), &record)
    }

    fn store<T: StoredRecord>(&self, id: ApiId, record: &T) -> Result<(), GatewayError> {
        let bytes = bincode::serde::encode_to_vec(record, bincode::config::standard())?;
        self.records.insert((T::KIND, id), bytes);
        Ok(())
    }

    fn fetch<T: StoredRecord>(&self, id: ApiId) -> Result<T, GatewayError> {
        let bytes = self
            .records
            .get(&(T::KIND, id))
            .ok_or(GatewayError::NotFound { kind: T::KIND, id })?;
        let (record, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
        Ok(record)
    }

    fn fetch_all<T: StoredRecord>(&self) -> Result<Vec<T>, GatewayError> {
        let mut ids: Vec<ApiId> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == T::KIND)
            .map(|entry| entry.key().1)
            .collect();
        ids.sort();
        ids.into_iter().map(|id| self.fetch(id)).collect()
    }

    /// Journals the call, then applies offline mode and injected failures.
    fn begin(
        &self,
        kind: Option<EntityKind>,
        op: GatewayOp,
        id: Option<ApiId>,
    ) -> Result<(), GatewayError> {
        trace!("[InMemoryGateway] {:?} {:?} {:?}", op, kind, id);
        lock(&self.calls).push(GatewayCall { kind, op, id });
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("store is offline".to_string()));
        }
        match lock(&self.failures).pop_front().flatten() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn create<T: StoredRecord>(&self, mut record: T) -> Result<T, GatewayError> {
        self.begin(Some(T::KIND), GatewayOp::Create, None)?;
        let id = self.allocate_id();
        record.set_id(id);
        self.store(ApiId(id), &record)?;
        Ok(record)
    }

    fn update<T: StoredRecord>(&self, id: ApiId, mut record: T) -> Result<T, GatewayError> {
        self.begin(Some(T::KIND), GatewayOp::Update, Some(id))?;
        if !self.contains(T::KIND, id) {
            return Err(GatewayError::NotFound { kind: T::KIND, id });
        }
        record.set_id(id.0);
        self.store(id, &record)?;
        Ok(record)
    }

    fn delete(&self, kind: EntityKind, id: ApiId) -> Result<(), GatewayError> {
        self.begin(Some(kind), GatewayOp::Delete, Some(id))?;
        self.records
            .remove(&(kind, id))
            .map(|_| ())
            .ok_or(GatewayError::NotFound { kind, id })
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl PersistenceGateway for InMemoryGateway {
    async fn create_heliostat(
        &self,
        record: HeliostatRecord,
    ) -> Result<HeliostatRecord, GatewayError> {
        self.create(record)
    }

    async fn update_heliostat(
        &self,
        id: ApiId,
        record: HeliostatRecord,
    ) -> Result<HeliostatRecord, GatewayError> {
        self.update(id, record)
    }

    async fn delete_heliostat(&self, id: ApiId) -> Result<(), GatewayError> {
        self.delete(EntityKind::Heliostat, id)
    }

    async fn create_receiver(&self, record: ReceiverRecord) -> Result<ReceiverRecord, GatewayError> {
        self.create(record)
    }

    async fn update_receiver(
        &self,
        id: ApiId,
        record: ReceiverRecord,
    ) -> Result<ReceiverRecord, GatewayError> {
        self.update(id, record)
    }

    async fn delete_receiver(&self, id: ApiId) -> Result<(), GatewayError> {
        self.delete(EntityKind::Receiver, id)
    }

    async fn create_light_source(
        &self,
        record: LightSourceRecord,
    ) -> Result<LightSourceRecord, GatewayError> {
        self.create(record)
    }

    async fn update_light_source(
        &self,
        id: ApiId,
        record: LightSourceRecord,
    ) -> Result<LightSourceRecord, GatewayError> {
        self.update(id, record)
    }

    async fn delete_light_source(&self, id: ApiId) -> Result<(), GatewayError> {
        self.delete(EntityKind::LightSource, id)
    }

    async fn load_project(&self) -> Result<ProjectRecord, GatewayError> {
        self.begin(None, GatewayOp::LoadProject, None)?;
        Ok(ProjectRecord {
            name: self.project_name.clone(),
            heliostats: self.fetch_all()?,
            receivers: self.fetch_all()?,
            lightsources: self.fetch_all()?,
            settings: self.settings(),
        })
    }

    async fn update_settings(&self, settings: SettingsRecord) -> Result<(), GatewayError> {
        self.begin(None, GatewayOp::UpdateSettings, None)?;
        *lock(&self.settings) = settings;
        Ok(())
    }
}
