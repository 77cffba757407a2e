//! In-memory collaborator implementations.
//!
//! These are suitable for embedding and testing. Production deployments
//! should use persistent backends such as `fund-storage-json`.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use dashmap::DashMap;
use fund_domain::{
    ActorRole, BudgetPool, FiscalYear, Money, NotificationEvent, PoolKey, SharedCap, Submission,
    SubmissionKind, TierCode,
};
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    ports::{
        ApplicationWindow, BlobStore, IdentityProvider, Notifier, PoolStore, RewardConfigSource,
        SubmissionStore,
    },
    CoreError,
};

/// In-memory submission store
#[derive(Default)]
pub struct InMemorySubmissionStore {
    submissions: DashMap<Uuid, Submission>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, submission: Submission) {
        self.submissions.insert(submission.id, submission);
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}

impl SubmissionStore for InMemorySubmissionStore {
    fn load_submission(&self, id: Uuid) -> Result<Submission, CoreError> {
        self.submissions
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(CoreError::SubmissionNotFound(id))
    }

    fn save_submission(&self, submission: &Submission) -> Result<(), CoreError> {
        self.submissions.insert(submission.id, submission.clone());
        Ok(())
    }
}

/// In-memory pool store
#[derive(Default)]
pub struct InMemoryPoolStore {
    pools: DashMap<PoolKey, BudgetPool>,
}

impl InMemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self, key: &PoolKey) -> Option<BudgetPool> {
        self.pools.get(key).map(|entry| entry.clone())
    }
}

impl PoolStore for InMemoryPoolStore {
    fn load_pools(&self, subcategory_id: Uuid) -> Result<Vec<BudgetPool>, CoreError> {
        let mut pools: Vec<BudgetPool> = self
            .pools
            .iter()
            .filter(|entry| entry.key().subcategory_id == subcategory_id)
            .map(|entry| entry.value().clone())
            .collect();
        pools.sort_by_key(|pool| pool.tier);
        Ok(pools)
    }

    fn save_pool(&self, pool: &BudgetPool) -> Result<(), CoreError> {
        self.pools.insert(pool.key(), pool.clone());
        Ok(())
    }
}

/// Identity whose role can be switched between calls.
pub struct SessionIdentity {
    role: RwLock<ActorRole>,
}

impl SessionIdentity {
    pub fn new(role: ActorRole) -> Self {
        Self {
            role: RwLock::new(role),
        }
    }

    pub fn set_role(&self, role: ActorRole) {
        *self.role.write() = role;
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_actor_role(&self) -> ActorRole {
        *self.role.read()
    }
}

/// Notifier that records deliveries and can fail a number of leading attempts.
#[derive(Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<NotificationEvent>>,
    failures_left: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(attempts: usize) -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(attempts),
        }
    }

    pub fn delivered(&self) -> Vec<NotificationEvent> {
        self.delivered.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), CoreError> {
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "notification endpoint unavailable",
            )));
        }
        self.delivered.lock().push(event.clone());
        Ok(())
    }
}

/// In-memory blob store
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: DashMap<Uuid, Vec<u8>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, file_id: Uuid, bytes: Vec<u8>) {
        self.blobs.insert(file_id, bytes);
    }
}

impl BlobStore for InMemoryBlobStore {
    fn fetch(&self, file_id: Uuid) -> Result<Vec<u8>, CoreError> {
        self.blobs
            .get(&file_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| CoreError::Storage(format!("blob {file_id} not found")))
    }
}

/// Cap table held in memory; counts lookups so caching can be observed.
#[derive(Default)]
pub struct StaticCapSource {
    caps: HashMap<(FiscalYear, TierCode), Money>,
    lookups: AtomicUsize,
}

impl StaticCapSource {
    pub fn new(caps: impl IntoIterator<Item = SharedCap>) -> Self {
        Self {
            caps: caps
                .into_iter()
                .map(|cap| ((cap.fiscal_year, cap.tier), cap.max_amount))
                .collect(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl RewardConfigSource for StaticCapSource {
    fn lookup_shared_cap(
        &self,
        fiscal_year: FiscalYear,
        tier: TierCode,
    ) -> Result<Option<Money>, CoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.caps.get(&(fiscal_year, tier)).copied())
    }
}

/// Application window with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticWindow(pub bool);

impl ApplicationWindow for StaticWindow {
    fn is_open(&self, _fiscal_year: FiscalYear, _kind: SubmissionKind) -> bool {
        self.0
    }
}
