use alloy::primitives::{
    Address,
    U256,
    utils::parse_ether,
};
use wrestling_client::{
    ContractVariant,
    Field,
    FieldValue,
    SessionState,
    Slot,
    StateReconciler,
    presentation::{
        Control,
        TextSlot,
        WAITING_FOR_PLAYER,
    },
    test_helpers::{
        MockContract,
        RecordingPresenter,
    },
};

fn full_game(first: Address, second: Address) -> Vec<(Field, FieldValue)> {
    vec![
        (Field::Wrestler1, FieldValue::Address(first)),
        (Field::Wrestler2, FieldValue::Address(second)),
        (Field::Wrestler1Played, FieldValue::Flag(false)),
        (Field::Wrestler2Played, FieldValue::Flag(false)),
        (Field::Wrestler1Deposit, FieldValue::Amount(parse_ether("1").unwrap())),
        (Field::Wrestler2Deposit, FieldValue::Amount(parse_ether("0.5").unwrap())),
        (Field::Winner, FieldValue::Address(Address::ZERO)),
        (Field::Gains, FieldValue::Amount(U256::ZERO)),
        (Field::GameFinished, FieldValue::Flag(false)),
    ]
}

#[tokio::test]
async fn reconcile__all_reads_resolve_and_render_once_each() {
    // given
    let first = Address::repeat_byte(0x11);
    let second = Address::repeat_byte(0x22);
    let state = full_game(first, second);
    let backend = MockContract::with_state(&state);
    let reconciler = StateReconciler::new(ContractVariant::PerSlotRegistration);
    let mut session = SessionState::new();
    let mut presenter = RecordingPresenter::new();

    // when
    let report = reconciler
        .reconcile(&backend, &mut session, &mut presenter)
        .await;

    // then
    assert_eq!(report.resolved, 9);
    assert_eq!(report.failed, 0);
    for (field, value) in &state {
        assert_eq!(session.get(*field), Some(value));
        assert_eq!(presenter.renders_for(*field), 1, "{field:?}");
    }
    assert_eq!(presenter.updates.len(), 9);
}

#[tokio::test]
async fn reconcile__failing_reads_leave_session_unresolved() {
    // given
    let backend = ContractVariant::PerSlotRegistration
        .tracked_fields()
        .iter()
        .fold(MockContract::new(), |mock, field| mock.failing(*field, "node unreachable"));
    let reconciler = StateReconciler::new(ContractVariant::PerSlotRegistration);
    let mut session = SessionState::new();
    let mut presenter = RecordingPresenter::new();

    // when
    let report = reconciler
        .reconcile(&backend, &mut session, &mut presenter)
        .await;

    // then
    assert_eq!(report.resolved, 0);
    assert_eq!(report.failed, 9);
    assert_eq!(session, SessionState::new());
    assert!(presenter.updates.is_empty());
}

#[tokio::test]
async fn reconcile__partial_failure_keeps_the_rest() {
    // given
    let first = Address::repeat_byte(0x11);
    let backend = MockContract::with_state(&full_game(first, Address::ZERO))
        .failing(Field::Gains, "execution reverted");
    let reconciler = StateReconciler::new(ContractVariant::PerSlotRegistration);
    let mut session = SessionState::new();
    let mut presenter = RecordingPresenter::new();

    // when
    let report = reconciler
        .reconcile(&backend, &mut session, &mut presenter)
        .await;

    // then
    assert_eq!(report.resolved, 8);
    assert_eq!(report.failed, 1);
    assert_eq!(session.gains(), None);
    assert_eq!(session.player(Slot::One), Some(first));
    assert_eq!(presenter.renders_for(Field::Gains), 0);
}

#[tokio::test]
async fn reconcile__empty_wrestler2_shows_placeholder_and_register_control() {
    // given
    let first = Address::repeat_byte(0x11);
    let backend = MockContract::with_state(&full_game(first, Address::ZERO));
    let reconciler = StateReconciler::new(ContractVariant::PerSlotRegistration);
    let mut session = SessionState::new();
    let mut presenter = RecordingPresenter::new();

    // when
    reconciler
        .reconcile(&backend, &mut session, &mut presenter)
        .await;

    // then
    let update = presenter.last_for(Field::Wrestler2).unwrap();
    assert_eq!(
        update.texts,
        vec![(TextSlot::Wrestler2, WAITING_FOR_PLAYER.to_string())]
    );
    assert_eq!(update.visibility, vec![(Control::Register2, true)]);
    let update = presenter.last_for(Field::Wrestler1).unwrap();
    assert_eq!(update.visibility, vec![(Control::Register1, false)]);
}

#[tokio::test]
async fn reconcile__opponent_variant_tracks_six_fields() {
    // given
    let first = Address::repeat_byte(0x11);
    let backend = MockContract::with_state(&full_game(first, Address::ZERO));
    let reconciler = StateReconciler::new(ContractVariant::OpponentRegistration);
    let mut session = SessionState::new();
    let mut presenter = RecordingPresenter::new();

    // when
    let report = reconciler
        .reconcile(&backend, &mut session, &mut presenter)
        .await;

    // then
    assert_eq!(report.resolved, 6);
    assert!(!session.is_resolved(Field::Wrestler1Deposit));
    assert!(!session.is_resolved(Field::Gains));
    assert!(backend.read_log().iter().all(|field| *field != Field::Gains));
}
