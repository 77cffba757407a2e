//! Collaborator contracts consumed by the engine.
//!
//! Implementations live outside the engine (storage crates, identity
//! services, mailers). [`crate::memory`] provides in-process versions.

use fund_domain::{
    ActorRole, BudgetPool, FiscalYear, Money, NotificationEvent, Submission, SubmissionKind,
    TierCode,
};
use uuid::Uuid;

use crate::CoreError;

/// Persistence for submissions.
pub trait SubmissionStore: Send + Sync {
    fn load_submission(&self, id: Uuid) -> Result<Submission, CoreError>;
    fn save_submission(&self, submission: &Submission) -> Result<(), CoreError>;
}

/// Persistence for budget pools. `save_pool` is invoked from inside the
/// ledger's per-pool critical section.
pub trait PoolStore: Send + Sync {
    fn load_pools(&self, subcategory_id: Uuid) -> Result<Vec<BudgetPool>, CoreError>;
    fn save_pool(&self, pool: &BudgetPool) -> Result<(), CoreError>;
}

/// Answers who is acting.
pub trait IdentityProvider: Send + Sync {
    fn current_actor_role(&self) -> ActorRole;
}

/// Best-effort delivery of decision events.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &NotificationEvent) -> Result<(), CoreError>;
}

/// Read access to attachment content.
pub trait BlobStore: Send + Sync {
    fn fetch(&self, file_id: Uuid) -> Result<Vec<u8>, CoreError>;
}

/// Externally maintained reward configuration.
pub trait RewardConfigSource: Send + Sync {
    fn lookup_shared_cap(
        &self,
        fiscal_year: FiscalYear,
        tier: TierCode,
    ) -> Result<Option<Money>, CoreError>;
}

/// Decides whether applications are being accepted.
pub trait ApplicationWindow: Send + Sync {
    fn is_open(&self, fiscal_year: FiscalYear, kind: SubmissionKind) -> bool;
}
