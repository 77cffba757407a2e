//! The submission record and its decision invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    amounts::AmountSet,
    attachment::Attachment,
    common::{Displayable, FiscalYear},
    pool::PoolKey,
    roles::AuthorRole,
    status::{StatusChange, SubmissionStatus},
    tier::TierCode,
};

/// Kind of request a teacher files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    GeneralFund,
    PublicationReward,
}

/// A fund or publication-reward application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub kind: SubmissionKind,
    pub title: String,
    pub fiscal_year: FiscalYear,
    pub subcategory_id: Uuid,
    pub tier: TierCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_role: Option<AuthorRole>,
    pub applicant_id: Uuid,
    #[serde(default)]
    pub co_authors: Vec<Uuid>,
    pub status: SubmissionStatus,
    pub requested: AmountSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved: Option<AmountSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announcement_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_reason: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn new(
        kind: SubmissionKind,
        title: impl Into<String>,
        fiscal_year: FiscalYear,
        subcategory_id: Uuid,
        tier: TierCode,
        applicant_id: Uuid,
        requested: AmountSet,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            fiscal_year,
            subcategory_id,
            tier,
            author_role: None,
            applicant_id,
            co_authors: Vec::new(),
            status: SubmissionStatus::Draft,
            requested,
            approved: None,
            announcement_ref: None,
            rejection_reason: None,
            revision_reason: None,
            attachments: Vec::new(),
            history: Vec::new(),
            created_at: Utc::now(),
            submitted_at: None,
            decided_at: None,
        }
    }

    pub fn with_author_role(mut self, role: AuthorRole) -> Self {
        self.author_role = Some(role);
        self
    }

    /// Attaches a file at the next ordering index.
    pub fn attach(&mut self, file_name: impl Into<String>, mime_type: impl Into<String>) -> Uuid {
        let order = self.attachments.len() as u32;
        let attachment = Attachment::new(self.id, file_name, mime_type, order);
        let file_id = attachment.file_id;
        self.attachments.push(attachment);
        file_id
    }

    pub fn pool_key(&self) -> PoolKey {
        PoolKey::new(self.subcategory_id, self.tier)
    }

    /// Names the mandatory pieces still missing before the submission can be filed.
    pub fn missing_requirements(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title".to_string());
        }
        if let Some(field) = self.requested.first_negative() {
            missing.push(format!("non-negative {field} amount"));
        }
        if self.attachments.is_empty() {
            missing.push("at least one attachment".to_string());
        }
        if self.kind == SubmissionKind::PublicationReward && self.author_role.is_none() {
            missing.push("author role".to_string());
        }
        missing
    }

    /// Approved amounts are present iff approved; a rejection reason iff rejected.
    pub fn decision_fields_consistent(&self) -> bool {
        let approved = self.status == SubmissionStatus::Approved;
        let rejected = self.status == SubmissionStatus::Rejected;
        self.approved.is_some() == approved && self.rejection_reason.is_some() == rejected
    }
}

impl Displayable for Submission {
    fn display_label(&self) -> String {
        format!("{} [{} / {}]", self.title, self.tier, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn draft() -> Submission {
        Submission::new(
            SubmissionKind::PublicationReward,
            "Graph sparsification",
            2025,
            Uuid::new_v4(),
            TierCode::Q1,
            Uuid::new_v4(),
            AmountSet::new(Money::from_major(40_000), Money::ZERO, Money::ZERO, Money::ZERO),
        )
    }

    #[test]
    fn reports_missing_requirements() {
        let mut submission = draft();
        submission.title = "  ".into();
        submission.requested.revision = Money::from_minor(-1);
        let missing = submission.missing_requirements();
        assert_eq!(
            missing,
            vec![
                "title".to_string(),
                "non-negative revision fee amount".to_string(),
                "at least one attachment".to_string(),
                "author role".to_string(),
            ]
        );
    }

    #[test]
    fn complete_submission_has_no_missing_requirements() {
        let mut submission = draft().with_author_role(AuthorRole::FirstAuthor);
        submission.attach("paper.pdf", "application/pdf");
        assert!(submission.missing_requirements().is_empty());
        assert!(submission.decision_fields_consistent());
    }

    #[test]
    fn serde_roundtrip_keeps_optional_fields() {
        let mut submission = draft().with_author_role(AuthorRole::CorrespondingAuthor);
        submission.attach("paper.pdf", "application/pdf");
        let json = serde_json::to_string(&submission).unwrap();
        let restored: Submission = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, submission);
    }
}
