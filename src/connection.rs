//! Wallet backend selection.
//!
//! One [`Connection`] is built per session and never changes afterwards.

use crate::{
    error::ClientError,
    wallets::{
        self,
        WalletDescriptor,
    },
};
use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{
        DynProvider,
        Provider,
        ProviderBuilder,
    },
    signers::{
        Signer,
        ledger::{
            HDPath,
            LedgerSigner,
        },
    },
};
use tracing::{
    info,
    warn,
};
use url::Url;

pub const LEDGER_LABEL: &str = "Ledger";
pub const KEYSTORE_LABEL: &str = "Keystore";
pub const READ_ONLY_LABEL: &str = "None";

/// Endpoint and network a connection is pinned to.
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub rpc_url: Url,
    pub chain_id: u64,
}

/// The backend picked from the ledger switch and the wallet found in the environment.
#[derive(Clone, Debug)]
pub enum ProviderChoice {
    HardwareWallet,
    InjectedWallet(WalletDescriptor),
    ReadOnly,
}

impl ProviderChoice {
    /// Ledger wins when requested; otherwise an available keystore; otherwise read-only.
    pub fn select(ledger_requested: bool, injected: Option<WalletDescriptor>) -> Self {
        if ledger_requested {
            ProviderChoice::HardwareWallet
        } else if let Some(wallet) = injected {
            ProviderChoice::InjectedWallet(wallet)
        } else {
            ProviderChoice::ReadOnly
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProviderChoice::HardwareWallet => LEDGER_LABEL,
            ProviderChoice::InjectedWallet(_) => KEYSTORE_LABEL,
            ProviderChoice::ReadOnly => READ_ONLY_LABEL,
        }
    }
}

/// The active connection handle.
pub enum Connection {
    HardwareWallet {
        provider: DynProvider,
        account: Address,
    },
    InjectedWallet {
        provider: DynProvider,
        account: Address,
    },
    ReadOnly {
        provider: DynProvider,
    },
}

impl Connection {
    pub async fn open(choice: ProviderChoice, endpoint: &Endpoint) -> Result<Self, ClientError> {
        let label = choice.label();
        info!(mode = label, url = %endpoint.rpc_url, chain_id = endpoint.chain_id, "opening connection");
        match choice {
            ProviderChoice::HardwareWallet => {
                let signer =
                    LedgerSigner::new(HDPath::LedgerLive(0), Some(endpoint.chain_id))
                        .await
                        .map_err(|e| ClientError::ProviderConstruction {
                            mode: label,
                            reason: e.to_string(),
                        })?;
                let account = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(endpoint.rpc_url.clone())
                    .erased();
                Ok(Connection::HardwareWallet { provider, account })
            }
            ProviderChoice::InjectedWallet(descriptor) => {
                let signer = wallets::unlock_wallet(&descriptor).map_err(|e| {
                    ClientError::ProviderConstruction {
                        mode: label,
                        reason: format!("{e:#}"),
                    }
                })?;
                let signer = signer.with_chain_id(Some(endpoint.chain_id));
                let account = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(endpoint.rpc_url.clone())
                    .erased();
                Ok(Connection::InjectedWallet { provider, account })
            }
            ProviderChoice::ReadOnly => {
                let provider = ProviderBuilder::new()
                    .connect_http(endpoint.rpc_url.clone())
                    .erased();
                Ok(Connection::ReadOnly { provider })
            }
        }
    }

    pub fn provider(&self) -> &DynProvider {
        match self {
            Connection::HardwareWallet { provider, .. }
            | Connection::InjectedWallet { provider, .. }
            | Connection::ReadOnly { provider } => provider,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Connection::HardwareWallet { .. } => LEDGER_LABEL,
            Connection::InjectedWallet { .. } => KEYSTORE_LABEL,
            Connection::ReadOnly { .. } => READ_ONLY_LABEL,
        }
    }

    pub fn can_sign(&self) -> bool {
        !matches!(self, Connection::ReadOnly { .. })
    }

    /// Signer-backed connections already know their account; read-only ones ask the node.
    pub async fn resolve_account(&self) -> Option<Address> {
        match self {
            Connection::HardwareWallet { account, .. }
            | Connection::InjectedWallet { account, .. } => Some(*account),
            Connection::ReadOnly { provider } => match provider.get_accounts().await {
                Ok(accounts) => {
                    let first = accounts.first().copied();
                    if first.is_none() {
                        warn!("You are not logged in");
                    }
                    first
                }
                Err(err) => {
                    warn!(error = %err, "account lookup failed");
                    None
                }
            },
        }
    }
}
