//! Approval decisions proposed by reviewers.
//!
//! Raw reviewer input arrives as strings ([`DecisionInput`]) and is turned into
//! a typed [`ApprovalDecision`] at the boundary; malformed amounts never reach
//! the calculation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    amounts::{AmountField, AmountSet},
    money::{Money, MoneyParseError},
    roles::ActorRole,
};

/// Which of the two shared-cap lines the approver typed into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedCapEdit {
    #[default]
    Neither,
    Revision,
    Publication,
    Both,
}

impl SharedCapEdit {
    pub fn from_flags(revision: bool, publication: bool) -> Self {
        match (revision, publication) {
            (false, false) => SharedCapEdit::Neither,
            (true, false) => SharedCapEdit::Revision,
            (false, true) => SharedCapEdit::Publication,
            (true, true) => SharedCapEdit::Both,
        }
    }

    /// The single edited line, if exactly one was edited.
    pub fn single(self) -> Option<AmountField> {
        match self {
            SharedCapEdit::Revision => Some(AmountField::Revision),
            SharedCapEdit::Publication => Some(AmountField::Publication),
            _ => None,
        }
    }
}

/// A reviewer's proposed approval, prior to validation and clamping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub amounts: AmountSet,
    #[serde(default)]
    pub edited: SharedCapEdit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announcement_ref: Option<String>,
    pub actor: ActorRole,
}

impl ApprovalDecision {
    /// Builds a decision where both shared-cap lines count as supplied together.
    pub fn new(actor: ActorRole, amounts: AmountSet) -> Self {
        Self {
            amounts,
            edited: SharedCapEdit::Both,
            announcement_ref: None,
            actor,
        }
    }

    pub fn with_edit(mut self, edited: SharedCapEdit) -> Self {
        self.edited = edited;
        self
    }

    pub fn with_announcement(mut self, reference: impl Into<String>) -> Self {
        self.announcement_ref = normalize_text(Some(reference.into()));
        self
    }

    /// Derived; never supplied by the reviewer.
    pub fn total(&self) -> Money {
        self.amounts.total()
    }

    /// Parses loosely shaped reviewer input.
    pub fn from_input(input: &DecisionInput, actor: ActorRole) -> Result<Self, DecisionInputError> {
        let reward = parse_field(AmountField::Reward, Some(&input.reward))?;
        let revision = parse_field(AmountField::Revision, input.revision.as_deref())?;
        let publication = parse_field(AmountField::Publication, input.publication.as_deref())?;
        let other = parse_field(AmountField::Other, input.other.as_deref())?;
        Ok(Self {
            amounts: AmountSet::new(reward, revision, publication, other),
            edited: SharedCapEdit::from_flags(input.revision_edited, input.publication_edited),
            announcement_ref: normalize_text(input.announcement_ref.clone()),
            actor,
        })
    }
}

/// Reviewer form payload as received from the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionInput {
    pub reward: String,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub publication: Option<String>,
    #[serde(default)]
    pub other: Option<String>,
    #[serde(default)]
    pub revision_edited: bool,
    #[serde(default)]
    pub publication_edited: bool,
    #[serde(default)]
    pub announcement_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {source}")]
pub struct DecisionInputError {
    pub field: AmountField,
    #[source]
    pub source: MoneyParseError,
}

fn parse_field(field: AmountField, raw: Option<&str>) -> Result<Money, DecisionInputError> {
    match raw {
        // Optional lines left blank count as zero; the reward line is mandatory.
        None => Ok(Money::ZERO),
        Some(value) if value.trim().is_empty() && field != AmountField::Reward => Ok(Money::ZERO),
        Some(value) => Money::parse(value).map_err(|source| DecisionInputError { field, source }),
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reviewer_form() {
        let input = DecisionInput {
            reward: "40,000".into(),
            revision: Some("1,500.50".into()),
            publication: Some("".into()),
            other: None,
            revision_edited: true,
            publication_edited: false,
            announcement_ref: Some("  ANN-2025/14 ".into()),
        };
        let decision = ApprovalDecision::from_input(&input, ActorRole::Admin).unwrap();
        assert_eq!(decision.amounts.reward, Money::from_major(40_000));
        assert_eq!(decision.amounts.revision, Money::from_minor(150_050));
        assert_eq!(decision.amounts.publication, Money::ZERO);
        assert_eq!(decision.edited, SharedCapEdit::Revision);
        assert_eq!(decision.announcement_ref.as_deref(), Some("ANN-2025/14"));
        assert_eq!(decision.total(), Money::from_minor(4_150_050));
    }

    #[test]
    fn names_the_malformed_field() {
        let input = DecisionInput {
            reward: "12000".into(),
            publication: Some("twelve".into()),
            ..DecisionInput::default()
        };
        let err = ApprovalDecision::from_input(&input, ActorRole::Admin).unwrap_err();
        assert_eq!(err.field, AmountField::Publication);
        assert!(matches!(err.source, MoneyParseError::NotANumber(_)));
    }

    #[test]
    fn blank_reward_is_rejected() {
        let err = ApprovalDecision::from_input(&DecisionInput::default(), ActorRole::Admin)
            .unwrap_err();
        assert_eq!(err.field, AmountField::Reward);
        assert_eq!(err.source, MoneyParseError::Empty);
    }

    #[test]
    fn deserializes_sparse_payload() {
        let input: DecisionInput =
            serde_json::from_str(r#"{"reward":"100","publication_edited":true}"#).unwrap();
        let decision = ApprovalDecision::from_input(&input, ActorRole::Admin).unwrap();
        assert_eq!(decision.edited, SharedCapEdit::Publication);
        assert_eq!(decision.amounts.revision, Money::ZERO);
    }
}
