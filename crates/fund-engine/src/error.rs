use fund_domain::{
    ActorRole, AmountField, DecisionInputError, Money, PoolKey, PoolMutationError,
    SubmissionStatus, TierCode, WorkflowAction,
};
use thiserror::Error;
use uuid::Uuid;

/// Engine failures. Every variant is returned before any budget or status
/// mutation is made visible.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid {field} amount: {reason}")]
    InvalidAmount { field: AmountField, reason: String },
    #[error(
        "revision+publication ({}) exceeds shared cap of {cap} (revision {revision}, publication {publication})",
        shared_total(.revision, .publication)
    )]
    SharedCapExceeded {
        cap: Money,
        revision: Money,
        publication: Money,
    },
    #[error("insufficient budget in pool {pool}: requested {requested}, remaining {remaining}")]
    InsufficientBudget {
        pool: PoolKey,
        requested: Money,
        remaining: Money,
    },
    #[error("cannot {action} a submission in {from} as {actor}")]
    InvalidTransition {
        action: WorkflowAction,
        from: SubmissionStatus,
        actor: ActorRole,
    },
    #[error("no mergeable content ({} attachment(s) skipped)", .skipped.len())]
    NoMergeableContent { skipped: Vec<String> },
    #[error("subcategory {subcategory} has no usable budget for tier(s): {}", join_tiers(.missing))]
    MissingBudgetTier {
        subcategory: Uuid,
        missing: Vec<TierCode>,
    },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("application window closed for fiscal year {0}")]
    ApplicationWindowClosed(i32),
    #[error("Submission not found: {0}")]
    SubmissionNotFound(Uuid),
    #[error("Budget pool not found: {0}")]
    PoolNotFound(PoolKey),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub(crate) fn from_pool_mutation(pool: PoolKey, err: PoolMutationError) -> Self {
        match err {
            PoolMutationError::NegativeAmount(amount) => CoreError::InvalidAmount {
                field: AmountField::Other,
                reason: format!("{amount} is negative"),
            },
            PoolMutationError::Insufficient {
                requested,
                remaining,
            } => CoreError::InsufficientBudget {
                pool,
                requested,
                remaining,
            },
            PoolMutationError::ExceedsAllocated { .. } => CoreError::Validation(err.to_string()),
        }
    }
}

impl From<DecisionInputError> for CoreError {
    fn from(err: DecisionInputError) -> Self {
        CoreError::InvalidAmount {
            field: err.field,
            reason: err.source.to_string(),
        }
    }
}

fn shared_total(revision: &Money, publication: &Money) -> Money {
    *revision + *publication
}

fn join_tiers(tiers: &[TierCode]) -> String {
    tiers
        .iter()
        .map(TierCode::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
