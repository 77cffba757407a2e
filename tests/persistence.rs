mod common;

use std::sync::Arc;

use common::setup_test_env;
use fund_core::{
    config::EngineConfig,
    domain::{ActorRole, AmountSet, Money, Submission, SubmissionKind, SubmissionStatus, TierCode},
    engine::memory::SessionIdentity,
    EngineParts, ReviewEngine,
};
use uuid::Uuid;

fn general_draft(subcategory: Uuid, amount: i64) -> Submission {
    let mut submission = Submission::new(
        SubmissionKind::GeneralFund,
        "Workshop on reproducible pipelines",
        2025,
        subcategory,
        TierCode::Default,
        Uuid::new_v4(),
        AmountSet::general(Money::from_major(amount)),
    );
    submission.attach("budget.pdf", "application/pdf");
    submission
}

#[test]
fn approvals_survive_an_engine_restart() {
    let (store, config_manager, _) = setup_test_env();
    let mut config = EngineConfig::default();
    config.notifications.max_attempts = 2;
    config_manager.save(&config).unwrap();

    let identity = Arc::new(SessionIdentity::new(ActorRole::Teacher));
    let parts = EngineParts::in_memory(identity.clone()).with_json_store(store.clone());
    let engine = ReviewEngine::from_manager(&config_manager, parts.clone()).unwrap();
    assert_eq!(engine.config().notifications.max_attempts, 2);

    let subcategory = Uuid::new_v4();
    engine
        .open_pool(subcategory, TierCode::Default, Money::from_major(15_000))
        .unwrap();
    let id = engine.create_draft(general_draft(subcategory, 6_000)).unwrap();
    engine.workflow().submit(id).unwrap();
    identity.set_role(ActorRole::DeptHead);
    engine.workflow().recommend(id, None).unwrap();
    identity.set_role(ActorRole::Admin);
    let decision = fund_core::domain::ApprovalDecision::new(
        ActorRole::Admin,
        AmountSet::general(Money::from_major(5_500)),
    );
    engine.workflow().approve(id, &decision).unwrap();
    drop(engine);

    let restarted = ReviewEngine::from_manager(&config_manager, parts).unwrap();
    assert_eq!(restarted.restore_pools(subcategory).unwrap(), 1);
    let pool = restarted
        .ledger()
        .pool(subcategory, TierCode::Default)
        .unwrap();
    assert_eq!(pool.allocated_budget, Money::from_major(5_500));
    assert_eq!(pool.remaining_budget, Money::from_major(9_500));

    let stored = restarted.submission(id).unwrap();
    assert_eq!(stored.status, SubmissionStatus::Approved);
    assert_eq!(stored.approved.unwrap().other, Money::from_major(5_500));
    assert!(stored.decision_fields_consistent());
    assert_eq!(store.list_submissions().unwrap(), vec![id]);
}

#[test]
fn drafts_must_start_in_draft() {
    let (store, _, _) = setup_test_env();
    let identity = Arc::new(SessionIdentity::new(ActorRole::Teacher));
    let engine = ReviewEngine::new(
        EngineConfig::default(),
        EngineParts::in_memory(identity).with_json_store(store),
    )
    .unwrap();
    let mut submission = general_draft(Uuid::new_v4(), 1_000);
    submission.status = SubmissionStatus::Approved;

    assert!(engine.create_draft(submission).is_err());
}

#[test]
fn invalid_stored_config_blocks_startup() {
    let (_, config_manager, _) = setup_test_env();
    std::fs::write(
        config_manager.config_path(),
        r#"{"currency":"THB","notifications":{"max_attempts":0}}"#,
    )
    .unwrap();
    let identity = Arc::new(SessionIdentity::new(ActorRole::Admin));

    let result = ReviewEngine::from_manager(&config_manager, EngineParts::in_memory(identity));
    assert!(matches!(result, Err(fund_core::FundError::Config(_))));
}
