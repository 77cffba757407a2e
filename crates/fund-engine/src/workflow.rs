//! Submission lifecycle.
//!
//! Every action runs under a per-submission lock, checks the transition table
//! against the current actor, and persists the result before any event is
//! queued. A rejected action leaves the submission, the ledger and the outbox
//! untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fund_domain::{
    ActorRole, ApprovalDecision, Displayable, NotificationEvent, StatusChange, Submission,
    SubmissionStatus, WorkflowAction,
};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    approval_calculator::{ApprovalCalculator, ClampedDecision, Prefill},
    budget_ledger::BudgetLedger,
    cap_resolver::CapResolver,
    outbox::{Outbox, DEFAULT_MAX_ATTEMPTS},
    ports::{ApplicationWindow, IdentityProvider, Notifier, RewardConfigSource, SubmissionStore},
    reward_table::RewardTable,
    time::Clock,
    CoreError,
};

/// External services the workflow talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub submissions: Arc<dyn SubmissionStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub window: Arc<dyn ApplicationWindow>,
    pub notifier: Arc<dyn Notifier>,
    pub reward_config: Arc<dyn RewardConfigSource>,
    pub clock: Arc<dyn Clock>,
}

/// A committed approval and the adjustments made on the way.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub submission: Submission,
    pub decision: ClampedDecision,
}

pub struct SubmissionWorkflow {
    submissions: Arc<dyn SubmissionStore>,
    identity: Arc<dyn IdentityProvider>,
    window: Arc<dyn ApplicationWindow>,
    clock: Arc<dyn Clock>,
    ledger: Arc<BudgetLedger>,
    caps: CapResolver,
    rewards: RewardTable,
    outbox: Outbox,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl SubmissionWorkflow {
    pub fn new(collaborators: Collaborators, ledger: Arc<BudgetLedger>, rewards: RewardTable) -> Self {
        Self::with_notification_attempts(collaborators, ledger, rewards, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_notification_attempts(
        collaborators: Collaborators,
        ledger: Arc<BudgetLedger>,
        rewards: RewardTable,
        max_attempts: u32,
    ) -> Self {
        Self {
            submissions: collaborators.submissions,
            identity: collaborators.identity,
            window: collaborators.window,
            clock: collaborators.clock,
            ledger,
            caps: CapResolver::new(collaborators.reward_config),
            rewards,
            outbox: Outbox::with_max_attempts(collaborators.notifier, max_attempts),
            locks: DashMap::new(),
        }
    }

    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn cap_resolver(&self) -> &CapResolver {
        &self.caps
    }

    pub fn reward_table(&self) -> &RewardTable {
        &self.rewards
    }

    /// Actions the current actor may take on the submission.
    pub fn available_actions(&self, id: Uuid) -> Result<Vec<WorkflowAction>, CoreError> {
        let submission = self.submissions.load_submission(id)?;
        Ok(WorkflowAction::available(
            submission.status,
            self.identity.current_actor_role(),
        ))
    }

    /// Files a draft and routes it to the department head.
    pub fn submit(&self, id: Uuid) -> Result<Submission, CoreError> {
        self.locked(id, |submission, actor, now| {
            let target = guard(WorkflowAction::Submit, submission, actor)?;
            let missing = submission.missing_requirements();
            if !missing.is_empty() {
                return Err(CoreError::Validation(format!(
                    "submission is missing: {}",
                    missing.join(", ")
                )));
            }
            if !self.window.is_open(submission.fiscal_year, submission.kind) {
                return Err(CoreError::ApplicationWindowClosed(submission.fiscal_year));
            }
            record(submission, target, Some(actor), now, None);
            submission.submitted_at = Some(now);
            submission.revision_reason = None;
            if let Some(routed) = submission.status.auto_advance() {
                record(
                    submission,
                    routed,
                    None,
                    now,
                    Some("routed to department".into()),
                );
            }
            Ok(())
        })
    }

    pub fn recommend(&self, id: Uuid, note: Option<&str>) -> Result<Submission, CoreError> {
        self.locked(id, |submission, actor, now| {
            let target = guard(WorkflowAction::Recommend, submission, actor)?;
            let note = note.map(str::trim).filter(|text| !text.is_empty());
            record(submission, target, Some(actor), now, note.map(String::from));
            Ok(())
        })
    }

    pub fn request_revision(&self, id: Uuid, reason: &str) -> Result<Submission, CoreError> {
        self.locked(id, |submission, actor, now| {
            let target = guard(WorkflowAction::RequestRevision, submission, actor)?;
            let reason = required_text(reason, "revision reason")?;
            submission.revision_reason = Some(reason.clone());
            record(submission, target, Some(actor), now, Some(reason));
            Ok(())
        })
    }

    /// Applicant takes a submission sent back for revision into draft again.
    pub fn reopen(&self, id: Uuid) -> Result<Submission, CoreError> {
        self.locked(id, |submission, actor, now| {
            let target = guard(WorkflowAction::Reopen, submission, actor)?;
            record(submission, target, Some(actor), now, None);
            Ok(())
        })
    }

    pub fn reject(&self, id: Uuid, reason: &str) -> Result<Submission, CoreError> {
        let submission = self.locked(id, |submission, actor, now| {
            let target = guard(WorkflowAction::Reject, submission, actor)?;
            let reason = required_text(reason, "rejection reason")?;
            submission.rejection_reason = Some(reason.clone());
            submission.decided_at = Some(now);
            record(submission, target, Some(actor), now, Some(reason));
            Ok(())
        })?;
        let reason = submission.rejection_reason.clone().unwrap_or_default();
        self.publish(NotificationEvent::rejected(submission.id, reason));
        Ok(submission)
    }

    /// Validates the decision, commits the budget and marks the submission approved.
    pub fn approve(
        &self,
        id: Uuid,
        decision: &ApprovalDecision,
    ) -> Result<ApprovalOutcome, CoreError> {
        let outcome = self.serialized(id, || self.commit_approval(id, decision))?;
        self.publish(NotificationEvent::approved(
            id,
            outcome.decision.total,
            outcome.decision.announcement_ref.clone(),
        ));
        Ok(outcome)
    }

    fn commit_approval(
        &self,
        id: Uuid,
        decision: &ApprovalDecision,
    ) -> Result<ApprovalOutcome, CoreError> {
        let mut submission = self.submissions.load_submission(id)?;
        let actor = self.identity.current_actor_role();
        let target = guard(WorkflowAction::Approve, &submission, actor)?;
        ensure_same_actor(decision, actor)?;

        let cap = self
            .caps
            .resolve_cap(submission.fiscal_year, submission.tier)?;
        let clamped = ApprovalCalculator::validate(decision, &submission, &self.ledger, cap)?;
        let key = submission.pool_key();
        self.ledger
            .commit(key.subcategory_id, key.tier, clamped.total)?;

        let now = self.clock.now();
        submission.approved = Some(clamped.amounts);
        submission.announcement_ref = clamped.announcement_ref.clone();
        submission.rejection_reason = None;
        submission.revision_reason = None;
        submission.decided_at = Some(now);
        record(&mut submission, target, Some(actor), now, None);

        if let Err(err) = self.submissions.save_submission(&submission) {
            tracing::warn!(submission = %id, error = %err, "approval not persisted; releasing budget");
            if let Err(release_err) =
                self.ledger
                    .release(key.subcategory_id, key.tier, clamped.total)
            {
                tracing::error!(submission = %id, error = %release_err, "failed to release budget after aborted approval");
            }
            return Err(err);
        }

        tracing::info!(
            submission = %id,
            label = %submission.display_label(),
            total = %clamped.total,
            adjusted = clamped.was_adjusted(),
            "submission approved"
        );
        Ok(ApprovalOutcome {
            submission,
            decision: clamped,
        })
    }

    /// Replaces the approved amounts of an approved submission, moving the
    /// difference in or out of the pool.
    pub fn correct_approval(
        &self,
        id: Uuid,
        decision: &ApprovalDecision,
    ) -> Result<ApprovalOutcome, CoreError> {
        self.serialized(id, || self.commit_correction(id, decision))
    }

    fn commit_correction(
        &self,
        id: Uuid,
        decision: &ApprovalDecision,
    ) -> Result<ApprovalOutcome, CoreError> {
        let mut submission = self.submissions.load_submission(id)?;
        let actor = self.identity.current_actor_role();
        let target = guard(WorkflowAction::CorrectApproval, &submission, actor)?;
        ensure_same_actor(decision, actor)?;
        let previous = submission
            .approved
            .ok_or_else(|| CoreError::Validation("approved submission has no amounts".into()))?;

        let cap = self
            .caps
            .resolve_cap(submission.fiscal_year, submission.tier)?;
        let clamped = ApprovalCalculator::clamp(decision, &submission, cap)?;
        let key = submission.pool_key();
        self.ledger
            .reallocate(key.subcategory_id, key.tier, previous.total(), clamped.total)?;

        let now = self.clock.now();
        submission.approved = Some(clamped.amounts);
        if clamped.announcement_ref.is_some() {
            submission.announcement_ref = clamped.announcement_ref.clone();
        }
        submission.decided_at = Some(now);
        record(
            &mut submission,
            target,
            Some(actor),
            now,
            Some(format!("approval corrected from {} to {}", previous.total(), clamped.total)),
        );

        if let Err(err) = self.submissions.save_submission(&submission) {
            tracing::warn!(submission = %id, error = %err, "correction not persisted; restoring allocation");
            if let Err(restore_err) = self.ledger.reallocate(
                key.subcategory_id,
                key.tier,
                clamped.total,
                previous.total(),
            ) {
                tracing::error!(submission = %id, error = %restore_err, "failed to restore allocation after aborted correction");
            }
            return Err(err);
        }

        tracing::info!(
            submission = %id,
            previous = %previous.total(),
            total = %clamped.total,
            "approval corrected"
        );
        Ok(ApprovalOutcome {
            submission,
            decision: clamped,
        })
    }

    /// Entitlement-based starting values for the approver's form.
    pub fn prefill(&self, id: Uuid) -> Result<Prefill, CoreError> {
        let submission = self.submissions.load_submission(id)?;
        let cap = self
            .caps
            .resolve_cap(submission.fiscal_year, submission.tier)?;
        Ok(ApprovalCalculator::prefill(&submission, &self.rewards, cap))
    }

    fn locked<F>(&self, id: Uuid, apply: F) -> Result<Submission, CoreError>
    where
        F: FnOnce(&mut Submission, ActorRole, DateTime<Utc>) -> Result<(), CoreError>,
    {
        self.serialized(id, || {
            let mut submission = self.submissions.load_submission(id)?;
            let from = submission.status;
            let actor = self.identity.current_actor_role();
            apply(&mut submission, actor, self.clock.now())?;
            self.submissions.save_submission(&submission)?;
            tracing::info!(
                submission = %id,
                %from,
                to = %submission.status,
                %actor,
                "submission transitioned"
            );
            Ok(submission)
        })
    }

    /// Runs `work` while holding the submission's lock. The lock entry is
    /// dropped again once no other caller holds or waits on it.
    fn serialized<T>(&self, id: Uuid, work: impl FnOnce() -> T) -> T {
        let lock = Arc::clone(self.locks.entry(id).or_default().value());
        let result = {
            let _guard = lock.lock();
            work()
        };
        drop(lock);
        self.locks
            .remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    #[cfg(test)]
    pub(crate) fn tracked_locks(&self) -> usize {
        self.locks.len()
    }

    /// Queues the event and attempts delivery. Called after the submission
    /// lock is released.
    fn publish(&self, event: NotificationEvent) {
        self.outbox.enqueue(event);
        let report = self.outbox.flush();
        tracing::debug!(
            delivered = report.delivered,
            retrying = report.retrying,
            dropped = report.dropped,
            "outbox flushed"
        );
    }
}

fn guard(
    action: WorkflowAction,
    submission: &Submission,
    actor: ActorRole,
) -> Result<SubmissionStatus, CoreError> {
    action
        .target(submission.status, actor)
        .ok_or(CoreError::InvalidTransition {
            action,
            from: submission.status,
            actor,
        })
}

fn ensure_same_actor(decision: &ApprovalDecision, actor: ActorRole) -> Result<(), CoreError> {
    if decision.actor != actor {
        return Err(CoreError::Validation(format!(
            "decision prepared as {} but current actor is {}",
            decision.actor, actor
        )));
    }
    Ok(())
}

fn record(
    submission: &mut Submission,
    to: SubmissionStatus,
    actor: Option<ActorRole>,
    at: DateTime<Utc>,
    note: Option<String>,
) {
    submission.history.push(StatusChange {
        from: submission.status,
        to,
        actor,
        at,
        note,
    });
    submission.status = to;
}

fn required_text(value: &str, what: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}
