use crate::{
    contract::{
        ContractBackend,
        ContractVariant,
        Field,
        FieldValue,
    },
    error::ClientError,
    presentation::{
        Presenter,
        project,
    },
    session::SessionState,
};
use futures::{
    StreamExt,
    stream::FuturesUnordered,
};
use std::future::Future;
use tracing::{
    debug,
    error,
};

pub type ReadOutcome = (Field, Result<FieldValue, ClientError>);

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReconcileReport {
    pub resolved: usize,
    pub failed: usize,
}

/// Issues the load-time read batch and folds each result into the session.
#[derive(Clone, Copy, Debug)]
pub struct StateReconciler {
    variant: ContractVariant,
}

impl StateReconciler {
    pub fn new(variant: ContractVariant) -> Self {
        Self { variant }
    }

    pub fn tracked_fields(&self) -> &'static [Field] {
        self.variant.tracked_fields()
    }

    /// One independent read per tracked field; results arrive in completion order.
    pub fn issue_reads<'a, B: ContractBackend>(
        &self,
        backend: &'a B,
    ) -> FuturesUnordered<impl Future<Output = ReadOutcome> + 'a> {
        self.tracked_fields()
            .iter()
            .map(move |&field| async move { (field, backend.read(field).await) })
            .collect()
    }

    /// Stores a successful read and renders it; a failed read is logged and leaves the field as it was.
    pub fn apply<P: Presenter>(
        &self,
        outcome: ReadOutcome,
        session: &mut SessionState,
        presenter: &mut P,
    ) -> bool {
        let (field, result) = outcome;
        match result {
            Ok(value) => {
                debug!(method = field.method(), ?value, "read resolved");
                session.store(field, value);
                presenter.render(&project(field, &value, session));
                true
            }
            Err(err) => {
                error!(method = field.method(), error = %err, "read call failed");
                false
            }
        }
    }

    /// Drives the whole batch to completion. Never fails; a hung read never returns.
    pub async fn reconcile<B, P>(
        &self,
        backend: &B,
        session: &mut SessionState,
        presenter: &mut P,
    ) -> ReconcileReport
    where
        B: ContractBackend,
        P: Presenter,
    {
        let mut report = ReconcileReport::default();
        let mut reads = self.issue_reads(backend);
        while let Some(outcome) = reads.next().await {
            if self.apply(outcome, session, presenter) {
                report.resolved += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::{
        contract::Slot,
        test_helpers::{
            MockContract,
            RecordingPresenter,
        },
    };
    use alloy::primitives::{
        Address,
        U256,
    };
    use futures::FutureExt;

    #[tokio::test]
    async fn reconcile__issues_one_read_per_tracked_field() {
        // given
        let backend = MockContract::new();
        let reconciler = StateReconciler::new(ContractVariant::OpponentRegistration);
        let mut session = SessionState::new();
        let mut presenter = RecordingPresenter::new();

        // when
        let report = reconciler
            .reconcile(&backend, &mut session, &mut presenter)
            .await;

        // then
        let mut issued = backend.read_log();
        issued.sort();
        let mut expected = reconciler.tracked_fields().to_vec();
        expected.sort();
        assert_eq!(issued, expected);
        assert_eq!(report.failed, expected.len());
        assert_eq!(session.resolved_count(), 0);
        assert!(presenter.updates.is_empty());
    }

    #[test]
    fn issue_reads__hung_read_does_not_block_the_others() {
        // given
        let player = Address::repeat_byte(0x07);
        let backend = MockContract::with_state(&[
            (Field::Wrestler1, FieldValue::Address(player)),
            (Field::GameFinished, FieldValue::Flag(false)),
        ])
        .hanging(Field::Wrestler2);
        let reconciler = StateReconciler::new(ContractVariant::PerSlotRegistration);
        let mut session = SessionState::new();
        let mut presenter = RecordingPresenter::new();
        let mut reads = reconciler.issue_reads(&backend);

        // when
        let mut applied = 0;
        while let Some(Some(outcome)) = reads.next().now_or_never() {
            reconciler.apply(outcome, &mut session, &mut presenter);
            applied += 1;
        }

        // then
        assert_eq!(applied, reconciler.tracked_fields().len() - 1);
        assert_eq!(session.player(Slot::One), Some(player));
        assert_eq!(session.game_finished(), Some(false));
        assert!(!session.is_resolved(Field::Wrestler2));
        assert_eq!(presenter.renders_for(Field::Wrestler2), 0);
    }

    #[test]
    fn apply__failure_leaves_previous_value_untouched() {
        // given
        let reconciler = StateReconciler::new(ContractVariant::PerSlotRegistration);
        let mut session = SessionState::new();
        session.store(Field::Gains, FieldValue::Amount(U256::from(5u8)));
        let mut presenter = RecordingPresenter::new();

        // when
        let applied = reconciler.apply(
            (Field::Gains, Err(ClientError::Rpc("timeout".into()))),
            &mut session,
            &mut presenter,
        );

        // then
        assert!(!applied);
        assert_eq!(session.gains(), Some(U256::from(5u8)));
        assert!(presenter.updates.is_empty());
    }
}
