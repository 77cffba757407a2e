//! Validation and clamping of reviewer-proposed approvals.
//!
//! Rules, in order:
//! 1. every proposed amount is non-negative;
//! 2. the reward and other lines never exceed what was requested;
//! 3. without a configured shared cap, revision and publication fees are zero;
//! 4. with a cap, revision + publication never exceeds it (a single edited
//!    line is clamped, two lines supplied together are rejected);
//! 5. the total is derived;
//! 6. the pool must cover the total.

use fund_domain::{
    ActorRole, AmountField, AmountSet, ApprovalDecision, AuthorRole, Money, ResolvedCap,
    SharedCapEdit, Submission, TierCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    budget_ledger::BudgetLedger,
    reward_table::{RewardLookup, RewardTable},
    CoreError,
};

/// Why a proposed amount was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdjustmentReason {
    /// No shared cap resolved for the tier; the line is ineligible.
    CapUnconfigured,
    /// Reduced so revision + publication fits the shared cap.
    SharedCapClamp { cap: Money },
    /// Reduced to the configured base rate.
    RewardRate {
        role: AuthorRole,
        tier: TierCode,
        rate: Money,
    },
}

/// A single change applied to a proposed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub field: AmountField,
    pub proposed: Money,
    pub applied: Money,
    pub reason: AdjustmentReason,
}

impl Adjustment {
    /// Explanation for the approver.
    pub fn message(&self) -> String {
        match self.reason {
            AdjustmentReason::CapUnconfigured => format!(
                "{} set to {} (was {}): no shared cap is configured for this tier",
                self.field, self.applied, self.proposed
            ),
            AdjustmentReason::SharedCapClamp { cap } => format!(
                "{} reduced from {} to {}: revision+publication may not exceed shared cap of {}",
                self.field, self.proposed, self.applied, cap
            ),
            AdjustmentReason::RewardRate { role, tier, rate } => format!(
                "{} reduced from {} to {}: base rate for {} / {} is {}",
                self.field, self.proposed, self.applied, role, tier, rate
            ),
        }
    }
}

/// A decision that passed validation, with every adjustment flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClampedDecision {
    pub amounts: AmountSet,
    pub total: Money,
    pub announcement_ref: Option<String>,
    pub actor: ActorRole,
    pub cap: ResolvedCap,
    pub adjustments: Vec<Adjustment>,
}

impl ClampedDecision {
    pub fn was_adjusted(&self) -> bool {
        !self.adjustments.is_empty()
    }
}

/// Initial values presented to an approver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefill {
    pub decision: ApprovalDecision,
    /// `None` when the submission carries no author role (general fund).
    pub reward_rate: Option<RewardLookup>,
    pub adjustments: Vec<Adjustment>,
}

pub struct ApprovalCalculator;

impl ApprovalCalculator {
    /// Runs every rule, including the read-only pool availability check.
    pub fn validate(
        decision: &ApprovalDecision,
        submission: &Submission,
        ledger: &BudgetLedger,
        cap: ResolvedCap,
    ) -> Result<ClampedDecision, CoreError> {
        let clamped = Self::clamp(decision, submission, cap)?;
        let key = submission.pool_key();
        if !ledger.check_availability(key.subcategory_id, key.tier, clamped.total) {
            let pool = ledger
                .pool(key.subcategory_id, key.tier)
                .ok_or(CoreError::PoolNotFound(key))?;
            return Err(CoreError::InsufficientBudget {
                pool: key,
                requested: clamped.total,
                remaining: pool.remaining_budget,
            });
        }
        Ok(clamped)
    }

    /// Applies the amount rules without consulting the ledger.
    pub fn clamp(
        decision: &ApprovalDecision,
        submission: &Submission,
        cap: ResolvedCap,
    ) -> Result<ClampedDecision, CoreError> {
        let proposed = decision.amounts;
        if let Some(field) = proposed.first_negative() {
            return Err(CoreError::InvalidAmount {
                field,
                reason: format!("{} is negative", proposed.get(field)),
            });
        }
        for field in [AmountField::Reward, AmountField::Other] {
            let requested = submission.requested.get(field);
            if proposed.get(field) > requested {
                return Err(CoreError::InvalidAmount {
                    field,
                    reason: format!(
                        "approved {} exceeds requested {}",
                        proposed.get(field),
                        requested
                    ),
                });
            }
        }

        let mut amounts = proposed;
        let mut adjustments = Vec::new();
        if cap.found {
            Self::fit_shared_cap(&mut amounts, decision.edited, cap.max_amount, &mut adjustments)?;
        } else {
            for field in [AmountField::Revision, AmountField::Publication] {
                let value = amounts.get(field);
                if !value.is_zero() {
                    adjustments.push(Adjustment {
                        field,
                        proposed: value,
                        applied: Money::ZERO,
                        reason: AdjustmentReason::CapUnconfigured,
                    });
                }
            }
            amounts.revision = Money::ZERO;
            amounts.publication = Money::ZERO;
        }

        Ok(ClampedDecision {
            amounts,
            total: amounts.total(),
            announcement_ref: decision.announcement_ref.clone(),
            actor: decision.actor,
            cap,
            adjustments,
        })
    }

    /// Computes what the submission is entitled to and returns it as the
    /// starting decision for an approver.
    pub fn prefill(submission: &Submission, rewards: &RewardTable, cap: ResolvedCap) -> Prefill {
        let requested = submission.requested;
        let mut amounts = requested;
        let mut adjustments = Vec::new();

        let reward_rate = submission
            .author_role
            .map(|role| (role, rewards.base_reward(role, submission.tier)));
        if let Some((role, lookup)) = reward_rate {
            if lookup.configured && lookup.amount < requested.reward {
                amounts.reward = lookup.amount;
                adjustments.push(Adjustment {
                    field: AmountField::Reward,
                    proposed: requested.reward,
                    applied: lookup.amount,
                    reason: AdjustmentReason::RewardRate {
                        role,
                        tier: submission.tier,
                        rate: lookup.amount,
                    },
                });
            }
        }

        if cap.found {
            for field in [AmountField::Revision, AmountField::Publication] {
                let other = match field {
                    AmountField::Revision => Money::ZERO,
                    _ => amounts.revision,
                };
                let limit = cap.max_amount.saturating_sub_floor(other);
                let value = amounts.get(field);
                if value > limit {
                    set_field(&mut amounts, field, limit);
                    adjustments.push(Adjustment {
                        field,
                        proposed: value,
                        applied: limit,
                        reason: AdjustmentReason::SharedCapClamp {
                            cap: cap.max_amount,
                        },
                    });
                }
            }
        } else {
            for field in [AmountField::Revision, AmountField::Publication] {
                let value = amounts.get(field);
                if !value.is_zero() {
                    set_field(&mut amounts, field, Money::ZERO);
                    adjustments.push(Adjustment {
                        field,
                        proposed: value,
                        applied: Money::ZERO,
                        reason: AdjustmentReason::CapUnconfigured,
                    });
                }
            }
        }

        Prefill {
            decision: ApprovalDecision::new(ActorRole::Admin, amounts)
                .with_edit(SharedCapEdit::Neither),
            reward_rate: reward_rate.map(|(_, lookup)| lookup),
            adjustments,
        }
    }

    fn fit_shared_cap(
        amounts: &mut AmountSet,
        edited: SharedCapEdit,
        cap: Money,
        adjustments: &mut Vec<Adjustment>,
    ) -> Result<(), CoreError> {
        if let Some(field) = edited.single() {
            let other = match field {
                AmountField::Revision => amounts.publication,
                _ => amounts.revision,
            };
            let limit = cap.saturating_sub_floor(other);
            let value = amounts.get(field);
            if value > limit {
                set_field(amounts, field, limit);
                adjustments.push(Adjustment {
                    field,
                    proposed: value,
                    applied: limit,
                    reason: AdjustmentReason::SharedCapClamp { cap },
                });
            }
        }
        // Reached with two lines supplied together, or with an untouched line
        // that alone exceeds the cap.
        if amounts.shared_cap_total() > cap {
            return Err(CoreError::SharedCapExceeded {
                cap,
                revision: amounts.revision,
                publication: amounts.publication,
            });
        }
        Ok(())
    }
}

fn set_field(amounts: &mut AmountSet, field: AmountField, value: Money) {
    match field {
        AmountField::Reward => amounts.reward = value,
        AmountField::Revision => amounts.revision = value,
        AmountField::Publication => amounts.publication = value,
        AmountField::Other => amounts.other = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fund_domain::{BudgetPool, SubmissionKind};
    use uuid::Uuid;

    fn submission(reward: i64, revision: i64, publication: i64) -> Submission {
        Submission::new(
            SubmissionKind::PublicationReward,
            "Sparse attention in practice",
            2025,
            Uuid::new_v4(),
            TierCode::Q1,
            Uuid::new_v4(),
            AmountSet::new(
                Money::from_major(reward),
                Money::from_major(revision),
                Money::from_major(publication),
                Money::ZERO,
            ),
        )
        .with_author_role(AuthorRole::FirstAuthor)
    }

    fn decision(reward: i64, revision: i64, publication: i64) -> ApprovalDecision {
        ApprovalDecision::new(
            ActorRole::Admin,
            AmountSet::new(
                Money::from_major(reward),
                Money::from_major(revision),
                Money::from_major(publication),
                Money::ZERO,
            ),
        )
    }

    fn cap(major: i64) -> ResolvedCap {
        ResolvedCap::configured(Money::from_major(major))
    }

    #[test]
    fn reward_above_request_is_invalid() {
        let err = ApprovalCalculator::clamp(&decision(45_000, 0, 0), &submission(40_000, 0, 0), cap(10_000))
            .unwrap_err();
        match err {
            CoreError::InvalidAmount { field, .. } => assert_eq!(field, AmountField::Reward),
            other => panic!("expected InvalidAmount, got {other:?}"),
        }
    }

    #[test]
    fn negative_amount_is_invalid() {
        let mut proposal = decision(100, 0, 0);
        proposal.amounts.publication = Money::from_minor(-1);
        let err = ApprovalCalculator::clamp(&proposal, &submission(100, 0, 0), cap(10))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidAmount {
                field: AmountField::Publication,
                ..
            }
        ));
    }

    #[test]
    fn unconfigured_cap_forces_shared_lines_to_zero() {
        let clamped = ApprovalCalculator::clamp(
            &decision(30_000, 5_000, 7_000),
            &submission(40_000, 5_000, 7_000),
            ResolvedCap::unconfigured(),
        )
        .unwrap();
        assert_eq!(clamped.amounts.revision, Money::ZERO);
        assert_eq!(clamped.amounts.publication, Money::ZERO);
        assert_eq!(clamped.total, Money::from_major(30_000));
        assert_eq!(clamped.adjustments.len(), 2);
        assert!(clamped
            .adjustments
            .iter()
            .all(|adj| adj.reason == AdjustmentReason::CapUnconfigured));
    }

    #[test]
    fn single_edited_line_is_clamped_to_cap() {
        let proposal = decision(0, 50_000, 4_000).with_edit(SharedCapEdit::Revision);
        let clamped =
            ApprovalCalculator::clamp(&proposal, &submission(0, 50_000, 4_000), cap(10_000)).unwrap();
        assert_eq!(clamped.amounts.revision, Money::from_major(6_000));
        assert_eq!(clamped.amounts.publication, Money::from_major(4_000));
        assert_eq!(clamped.adjustments.len(), 1);
        assert!(clamped.adjustments[0].message().contains("shared cap of 10,000.00"));
    }

    #[test]
    fn two_lines_over_cap_are_rejected() {
        let err = ApprovalCalculator::clamp(
            &decision(0, 6_000, 6_000),
            &submission(0, 6_000, 6_000),
            cap(10_000),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::SharedCapExceeded { .. }));
    }

    #[test]
    fn untouched_line_over_cap_is_rejected() {
        let proposal = decision(0, 500, 12_000).with_edit(SharedCapEdit::Revision);
        let err = ApprovalCalculator::clamp(&proposal, &submission(0, 500, 12_000), cap(10_000))
            .unwrap_err();
        assert!(matches!(err, CoreError::SharedCapExceeded { .. }));
    }

    #[test]
    fn shared_total_never_exceeds_cap_after_success() {
        let cap_major = 10_000;
        for revision in [0, 1, 4_999, 10_000, 10_001, 250_000] {
            for publication in [0, 2_500, 9_999, 10_000, 99_999] {
                for edited in [
                    SharedCapEdit::Neither,
                    SharedCapEdit::Revision,
                    SharedCapEdit::Publication,
                    SharedCapEdit::Both,
                ] {
                    let proposal = decision(0, revision, publication).with_edit(edited);
                    let outcome = ApprovalCalculator::clamp(
                        &proposal,
                        &submission(0, revision, publication),
                        cap(cap_major),
                    );
                    if let Ok(clamped) = outcome {
                        assert!(
                            clamped.amounts.shared_cap_total() <= Money::from_major(cap_major),
                            "{revision}/{publication}/{edited:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn validate_checks_pool_without_mutating() {
        let submission = submission(40_000, 0, 0);
        let ledger = BudgetLedger::new();
        ledger
            .configure_pool(BudgetPool::new(
                submission.subcategory_id,
                TierCode::Q1,
                Money::from_major(30_000),
            ))
            .unwrap();
        let err = ApprovalCalculator::validate(
            &decision(35_000, 0, 0),
            &submission,
            &ledger,
            ResolvedCap::unconfigured(),
        )
        .unwrap_err();
        match err {
            CoreError::InsufficientBudget {
                requested,
                remaining,
                ..
            } => {
                assert_eq!(requested, Money::from_major(35_000));
                assert_eq!(remaining, Money::from_major(30_000));
            }
            other => panic!("expected InsufficientBudget, got {other:?}"),
        }
        let pool = ledger.pool(submission.subcategory_id, TierCode::Q1).unwrap();
        assert_eq!(pool.allocated_budget, Money::ZERO);

        let ok = ApprovalCalculator::validate(
            &decision(30_000, 0, 0),
            &submission,
            &ledger,
            ResolvedCap::unconfigured(),
        )
        .unwrap();
        assert_eq!(ok.total, Money::from_major(30_000));
    }

    #[test]
    fn prefill_applies_rate_and_cap() {
        let table = RewardTable::from_rates([(
            AuthorRole::FirstAuthor,
            TierCode::Q1,
            Money::from_major(40_000),
        )]);
        let prefill = ApprovalCalculator::prefill(&submission(50_000, 8_000, 8_000), &table, cap(10_000));
        let amounts = prefill.decision.amounts;
        assert_eq!(amounts.reward, Money::from_major(40_000));
        assert_eq!(amounts.revision, Money::from_major(8_000));
        assert_eq!(amounts.publication, Money::from_major(2_000));
        assert_eq!(prefill.adjustments.len(), 2);
        assert!(prefill.reward_rate.unwrap().configured);
    }

    #[test]
    fn prefill_surfaces_missing_rate() {
        let table = RewardTable::new();
        let prefill =
            ApprovalCalculator::prefill(&submission(50_000, 0, 0), &table, ResolvedCap::unconfigured());
        let rate = prefill.reward_rate.unwrap();
        assert!(!rate.configured);
        assert_eq!(rate.amount, Money::ZERO);
        assert_eq!(prefill.decision.amounts.reward, Money::from_major(50_000));
    }
}
