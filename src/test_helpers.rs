use crate::{
    contract::{
        ContractBackend,
        Field,
        FieldValue,
        TxOptions,
        WriteCall,
    },
    error::ClientError,
    presentation::{
        PresentationUpdate,
        Presenter,
    },
};
use alloy::primitives::TxHash;
use std::{
    cell::RefCell,
    collections::HashMap,
};

#[derive(Clone, Debug)]
pub enum ScriptedRead {
    Value(FieldValue),
    Fail(String),
    /// Never resolves.
    Hang,
}

/// In-memory stand-in for a deployed wrestling contract.
pub struct MockContract {
    reads: HashMap<Field, ScriptedRead>,
    read_log: RefCell<Vec<Field>>,
    sent: RefCell<Vec<(WriteCall, TxOptions)>>,
    send_failure: Option<String>,
    can_sign: bool,
}

impl Default for MockContract {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContract {
    pub fn new() -> Self {
        Self {
            reads: HashMap::new(),
            read_log: RefCell::new(Vec::new()),
            sent: RefCell::new(Vec::new()),
            send_failure: None,
            can_sign: true,
        }
    }

    pub fn with_state(entries: &[(Field, FieldValue)]) -> Self {
        entries
            .iter()
            .fold(Self::new(), |mock, (field, value)| mock.returning(*field, *value))
    }

    pub fn returning(mut self, field: Field, value: FieldValue) -> Self {
        self.reads.insert(field, ScriptedRead::Value(value));
        self
    }

    pub fn failing(mut self, field: Field, reason: impl Into<String>) -> Self {
        self.reads.insert(field, ScriptedRead::Fail(reason.into()));
        self
    }

    pub fn hanging(mut self, field: Field) -> Self {
        self.reads.insert(field, ScriptedRead::Hang);
        self
    }

    pub fn failing_sends(mut self, reason: impl Into<String>) -> Self {
        self.send_failure = Some(reason.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.can_sign = false;
        self
    }

    pub fn read_log(&self) -> Vec<Field> {
        self.read_log.borrow().clone()
    }

    pub fn sent(&self) -> Vec<(WriteCall, TxOptions)> {
        self.sent.borrow().clone()
    }
}

impl ContractBackend for MockContract {
    async fn read(&self, field: Field) -> Result<FieldValue, ClientError> {
        self.read_log.borrow_mut().push(field);
        match self.reads.get(&field).cloned() {
            Some(ScriptedRead::Value(value)) => Ok(value),
            Some(ScriptedRead::Fail(reason)) => Err(ClientError::Rpc(reason)),
            Some(ScriptedRead::Hang) => std::future::pending().await,
            None => Err(ClientError::Rpc(format!(
                "no scripted response for {}",
                field.method()
            ))),
        }
    }

    async fn send(&self, call: WriteCall, options: TxOptions) -> Result<TxHash, ClientError> {
        if !self.can_sign {
            return Err(ClientError::NoSigner);
        }
        let mut sent = self.sent.borrow_mut();
        sent.push((call, options));
        match &self.send_failure {
            Some(reason) => Err(ClientError::Rpc(reason.clone())),
            None => Ok(TxHash::with_last_byte(sent.len() as u8)),
        }
    }

    fn can_sign(&self) -> bool {
        self.can_sign
    }
}

/// Captures every update a session renders.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub updates: Vec<PresentationUpdate>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renders_for(&self, field: Field) -> usize {
        self.updates
            .iter()
            .filter(|update| update.source == Some(field))
            .count()
    }

    pub fn last_for(&self, field: Field) -> Option<&PresentationUpdate> {
        self.updates
            .iter()
            .rev()
            .find(|update| update.source == Some(field))
    }
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, update: &PresentationUpdate) {
        self.updates.push(update.clone());
    }
}
