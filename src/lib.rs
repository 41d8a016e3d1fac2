pub use contract::{
    ContractBackend,
    ContractVariant,
    ContractView,
    Field,
    FieldValue,
    Slot,
    TxOptions,
    WriteCall,
};
pub use dispatcher::{
    Action,
    ActionDispatcher,
    DepositInputs,
    GasPricePolicy,
};
pub use error::ClientError;
pub use presentation::{
    PresentationUpdate,
    Presenter,
};
pub use reconciler::StateReconciler;
pub use session::SessionState;

pub mod config;
pub mod connection;
pub mod contract;
pub mod deployment;
pub mod dispatcher;
pub mod error;
pub mod presentation;
pub mod reconciler;
pub mod session;
pub mod wallets;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
