use alloy::contract::Error as ContractError;
use thiserror::Error;

/// Every failure a read or write call can resolve to.
///
/// Provider construction failures are fatal to the session; every other
/// variant is caught at its call site, logged, and dropped.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to construct {mode} provider: {reason}")]
    ProviderConstruction { mode: &'static str, reason: String },

    #[error("rpc call failed: {0}")]
    Rpc(String),

    #[error("`{method}` is not part of the contract interface")]
    Interface { method: String },

    #[error("could not decode `{method}` output: {reason}")]
    Decode { method: String, reason: String },

    #[error("no signer available for write calls (read-only connection)")]
    NoSigner,

    #[error("invalid deposit amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("invalid gas price {input:?}: {reason}")]
    InvalidGasPrice { input: String, reason: String },
}

impl ClientError {
    pub(crate) fn from_contract(method: &str, err: ContractError) -> Self {
        match err {
            ContractError::UnknownFunction(name) => ClientError::Interface { method: name },
            ContractError::AbiError(e) => ClientError::Decode {
                method: method.to_string(),
                reason: e.to_string(),
            },
            // empty `0x` return: the address does not implement this descriptor
            zero @ ContractError::ZeroData(..) => ClientError::Decode {
                method: method.to_string(),
                reason: zero.to_string(),
            },
            other => ClientError::Rpc(other.to_string()),
        }
    }
}
