//! Engine assembly from configuration and collaborators.

use std::sync::Arc;

use fund_config::{ConfigManager, EngineConfig};
use fund_domain::{
    ApprovalDecision, BudgetPool, DecisionInput, Money, Submission, SubmissionStatus, TierCode,
};
use fund_engine::{
    memory::{InMemoryBlobStore, InMemorySubmissionStore, RecordingNotifier, StaticWindow},
    ports::{ApplicationWindow, BlobStore, IdentityProvider, Notifier, PoolStore, SubmissionStore},
    workflow::ApprovalOutcome,
    BudgetLedger, Clock, Collaborators, CoreError, DocumentConsolidator, FlushReport,
    MergedDocument, RewardTable, SubmissionWorkflow, SystemClock,
};
use fund_storage_json::JsonStore;
use uuid::Uuid;

use crate::{caps::ConfigCapSource, FundError};

/// Collaborators a [`ReviewEngine`] is built from.
#[derive(Clone)]
pub struct EngineParts {
    pub submissions: Arc<dyn SubmissionStore>,
    /// `None` keeps pools in memory only.
    pub pools: Option<Arc<dyn PoolStore>>,
    pub identity: Arc<dyn IdentityProvider>,
    pub window: Arc<dyn ApplicationWindow>,
    pub notifier: Arc<dyn Notifier>,
    pub blobs: Arc<dyn BlobStore>,
    pub clock: Arc<dyn Clock>,
}

impl EngineParts {
    /// In-memory stores, an always-open application window and a recording
    /// notifier.
    pub fn in_memory(identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            submissions: Arc::new(InMemorySubmissionStore::new()),
            pools: None,
            identity,
            window: Arc::new(StaticWindow(true)),
            notifier: Arc::new(RecordingNotifier::new()),
            blobs: Arc::new(InMemoryBlobStore::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Persists submissions and pools as JSON files.
    pub fn with_json_store(mut self, store: Arc<JsonStore>) -> Self {
        self.submissions = store.clone();
        self.pools = Some(store as Arc<dyn PoolStore>);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_blobs(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = blobs;
        self
    }

    pub fn with_window(mut self, window: Arc<dyn ApplicationWindow>) -> Self {
        self.window = window;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

pub struct ReviewEngine {
    config: EngineConfig,
    submissions: Arc<dyn SubmissionStore>,
    identity: Arc<dyn IdentityProvider>,
    blobs: Arc<dyn BlobStore>,
    ledger: Arc<BudgetLedger>,
    workflow: SubmissionWorkflow,
}

impl ReviewEngine {
    pub fn new(config: EngineConfig, parts: EngineParts) -> Result<Self, FundError> {
        config.validate()?;
        let ledger = Arc::new(match parts.pools {
            Some(store) => BudgetLedger::with_store(store),
            None => BudgetLedger::new(),
        });
        let rewards = RewardTable::from_rates(config.rate_entries());
        let caps = ConfigCapSource::new(&config);
        tracing::info!(
            currency = %config.currency,
            rates = rewards.len(),
            caps = caps.len(),
            "review engine configured"
        );
        let collaborators = Collaborators {
            submissions: parts.submissions.clone(),
            identity: parts.identity.clone(),
            window: parts.window,
            notifier: parts.notifier,
            reward_config: Arc::new(caps),
            clock: parts.clock,
        };
        let workflow = SubmissionWorkflow::with_notification_attempts(
            collaborators,
            Arc::clone(&ledger),
            rewards,
            config.notifications.max_attempts,
        );
        Ok(Self {
            config,
            submissions: parts.submissions,
            identity: parts.identity,
            blobs: parts.blobs,
            ledger,
            workflow,
        })
    }

    /// Builds the engine from the configuration stored by `manager`, starting
    /// tracing with its log filter if nothing has yet.
    pub fn from_manager(manager: &ConfigManager, parts: EngineParts) -> Result<Self, FundError> {
        let config = manager.load()?;
        crate::init_with(&config);
        Self::new(config, parts)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn workflow(&self) -> &SubmissionWorkflow {
        &self.workflow
    }

    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    /// Registers a fresh pool for a subcategory and tier.
    pub fn open_pool(
        &self,
        subcategory_id: Uuid,
        tier: TierCode,
        total_budget: Money,
    ) -> Result<(), FundError> {
        self.ledger
            .configure_pool(BudgetPool::new(subcategory_id, tier, total_budget))?;
        Ok(())
    }

    /// Reloads a subcategory's pools from the pool store.
    pub fn restore_pools(&self, subcategory_id: Uuid) -> Result<usize, FundError> {
        Ok(self.ledger.load_subcategory(subcategory_id)?)
    }

    /// Stores a new draft.
    pub fn create_draft(&self, submission: Submission) -> Result<Uuid, FundError> {
        if submission.status != SubmissionStatus::Draft {
            return Err(CoreError::Validation(format!(
                "new submissions start as draft, not {}",
                submission.status
            ))
            .into());
        }
        self.submissions.save_submission(&submission)?;
        Ok(submission.id)
    }

    pub fn submission(&self, id: Uuid) -> Result<Submission, FundError> {
        Ok(self.submissions.load_submission(id)?)
    }

    /// Approves from raw form input, attributed to the current actor.
    pub fn approve_input(
        &self,
        id: Uuid,
        input: &DecisionInput,
    ) -> Result<ApprovalOutcome, FundError> {
        let decision = self.decision_from(input)?;
        Ok(self.workflow.approve(id, &decision)?)
    }

    pub fn correct_input(
        &self,
        id: Uuid,
        input: &DecisionInput,
    ) -> Result<ApprovalOutcome, FundError> {
        let decision = self.decision_from(input)?;
        Ok(self.workflow.correct_approval(id, &decision)?)
    }

    /// Merged attachments of a submission, in declared order.
    pub fn review_packet(&self, id: Uuid) -> Result<MergedDocument, FundError> {
        let submission = self.submissions.load_submission(id)?;
        Ok(DocumentConsolidator::consolidate(
            self.blobs.as_ref(),
            &submission,
        )?)
    }

    /// Retries notifications still waiting in the outbox.
    pub fn flush_notifications(&self) -> FlushReport {
        self.workflow.outbox().flush()
    }

    fn decision_from(&self, input: &DecisionInput) -> Result<ApprovalDecision, FundError> {
        Ok(ApprovalDecision::from_input(
            input,
            self.identity.current_actor_role(),
        )?)
    }
}
