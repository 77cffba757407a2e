//! fund-engine
//!
//! Approval and budget-allocation engine: reward lookup, shared-cap
//! resolution, decision validation, the budget ledger, the submission state
//! machine and attachment consolidation.
//! Depends on fund-domain. Collaborators (persistence, identity, notifier,
//! blob store, reward configuration) are reached through the traits in
//! [`ports`].

pub mod approval_calculator;
pub mod budget_ledger;
pub mod cap_resolver;
pub mod consolidator;
pub mod error;
pub mod memory;
pub mod outbox;
pub mod ports;
pub mod reward_table;
pub mod time;
pub mod workflow;

pub use approval_calculator::{
    Adjustment, AdjustmentReason, ApprovalCalculator, ClampedDecision, Prefill,
};
pub use budget_ledger::{BudgetLedger, FullAvailability};
pub use cap_resolver::CapResolver;
pub use consolidator::{collect_attachments, AttachmentBlob, DocumentConsolidator, MergedDocument};
pub use error::CoreError;
pub use outbox::{FlushReport, Outbox};
pub use reward_table::{RewardLookup, RewardTable};
pub use time::{Clock, FixedClock, SystemClock};
pub use workflow::{ApprovalOutcome, Collaborators, SubmissionWorkflow};
