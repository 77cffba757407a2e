//! Notification events produced by committed decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SubmissionApproved,
    SubmissionRejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Approved {
        total: Money,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        announcement_ref: Option<String>,
    },
    Rejected {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub submission_id: Uuid,
    pub payload: EventPayload,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn approved(submission_id: Uuid, total: Money, announcement_ref: Option<String>) -> Self {
        Self::new(
            NotificationKind::SubmissionApproved,
            submission_id,
            EventPayload::Approved {
                total,
                announcement_ref,
            },
        )
    }

    pub fn rejected(submission_id: Uuid, reason: impl Into<String>) -> Self {
        Self::new(
            NotificationKind::SubmissionRejected,
            submission_id,
            EventPayload::Rejected {
                reason: reason.into(),
            },
        )
    }

    fn new(kind: NotificationKind, submission_id: Uuid, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            submission_id,
            payload,
            created_at: Utc::now(),
        }
    }
}
