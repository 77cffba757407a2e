//! Submission lifecycle states and the single authoritative transition table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::ActorRole;

/// Where a submission sits in the review pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
    DeptHeadReview,
    AdminReview,
    RevisionRequired,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    /// Status reached without any reviewer action (department routing).
    pub fn auto_advance(self) -> Option<SubmissionStatus> {
        match self {
            SubmissionStatus::Submitted => Some(SubmissionStatus::DeptHeadReview),
            _ => None,
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::DeptHeadReview => "dept_head_review",
            SubmissionStatus::AdminReview => "admin_review",
            SubmissionStatus::RevisionRequired => "revision_required",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Actions an actor may request against a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Submit,
    Recommend,
    RequestRevision,
    Approve,
    Reject,
    Reopen,
    CorrectApproval,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 7] = [
        WorkflowAction::Submit,
        WorkflowAction::Recommend,
        WorkflowAction::RequestRevision,
        WorkflowAction::Approve,
        WorkflowAction::Reject,
        WorkflowAction::Reopen,
        WorkflowAction::CorrectApproval,
    ];

    /// Returns the status this action leads to, or `None` when the action is
    /// not allowed from `from` for `actor`.
    pub fn target(self, from: SubmissionStatus, actor: ActorRole) -> Option<SubmissionStatus> {
        use ActorRole::*;
        use SubmissionStatus::*;
        use WorkflowAction::*;

        match (self, from, actor) {
            (Submit, Draft, Teacher) => Some(Submitted),
            (Recommend, DeptHeadReview, DeptHead) => Some(AdminReview),
            (RequestRevision, DeptHeadReview | AdminReview, DeptHead | Admin) => {
                Some(RevisionRequired)
            }
            (Approve, AdminReview, Admin) => Some(Approved),
            (Reject, DeptHeadReview | AdminReview, DeptHead | Admin) => Some(Rejected),
            (Reopen, RevisionRequired, Teacher) => Some(Draft),
            (CorrectApproval, Approved, Admin) => Some(Approved),
            _ => None,
        }
    }

    /// Actions available to `actor` in the given status.
    pub fn available(from: SubmissionStatus, actor: ActorRole) -> Vec<WorkflowAction> {
        Self::ALL
            .into_iter()
            .filter(|action| action.target(from, actor).is_some())
            .collect()
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkflowAction::Submit => "submit",
            WorkflowAction::Recommend => "recommend",
            WorkflowAction::RequestRevision => "request_revision",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
            WorkflowAction::Reopen => "reopen",
            WorkflowAction::CorrectApproval => "correct_approval",
        };
        f.write_str(label)
    }
}

/// Audit entry appended on every status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: SubmissionStatus,
    pub to: SubmissionStatus,
    pub actor: Option<ActorRole>,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
