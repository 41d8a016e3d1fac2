use crate::{
    connection::Endpoint,
    contract::ContractVariant,
    deployment::{
        DeploymentEnv,
        DeploymentRecord,
    },
    dispatcher::GasPricePolicy,
};
use alloy::primitives::Address;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::path::PathBuf;

pub const DEFAULT_LOG_DIR: &str = ".logs";

/// Values given on the command line; anything left `None` falls back to the deployment record.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub rpc_url: Option<String>,
    pub contract: Option<String>,
    pub chain_id: Option<u64>,
    pub variant: Option<ContractVariant>,
    pub gas_price_gwei: Option<String>,
}

/// Everything a session needs to know before it connects.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub network: DeploymentEnv,
    pub endpoint: Endpoint,
    pub contract: Address,
    pub variant: ContractVariant,
    pub gas_price: GasPricePolicy,
    pub ledger: bool,
    pub wallet_name: Option<String>,
    pub wallet_dir: Option<String>,
    pub log_dir: PathBuf,
}

impl ClientConfig {
    /// Merges overrides over the stored record. Endpoint and contract have no built-in default.
    pub fn resolve(
        network: DeploymentEnv,
        overrides: &Overrides,
        record: Option<&DeploymentRecord>,
    ) -> Result<Self> {
        let rpc_url = overrides
            .rpc_url
            .clone()
            .or_else(|| record.map(|r| r.network_url.clone()))
            .ok_or_else(|| {
                eyre!("No RPC endpoint for {network}; pass --rpc-url or record a deployment")
            })?;
        let rpc_url = rpc_url
            .parse()
            .wrap_err_with(|| format!("Invalid RPC URL '{rpc_url}'"))?;

        let contract = overrides
            .contract
            .clone()
            .or_else(|| record.map(|r| r.contract_address.clone()))
            .ok_or_else(|| {
                eyre!("No contract address for {network}; pass --contract or record a deployment")
            })?;
        let contract: Address = contract
            .parse()
            .wrap_err_with(|| format!("Invalid contract address '{contract}'"))?;

        let chain_id = overrides
            .chain_id
            .or_else(|| record.map(|r| r.chain_id))
            .unwrap_or_else(|| network.default_chain_id());

        let variant = match (overrides.variant, record.and_then(|r| r.variant.as_deref())) {
            (Some(variant), _) => variant,
            (None, Some(stored)) => stored.parse().map_err(|e: String| eyre!(e))?,
            (None, None) => ContractVariant::default(),
        };

        let gas_price = match overrides.gas_price_gwei.as_deref() {
            Some(gwei) => GasPricePolicy::from_gwei(gwei)?,
            None => GasPricePolicy::default(),
        };

        Ok(Self {
            network,
            endpoint: Endpoint { rpc_url, chain_id },
            contract,
            variant,
            gas_price,
            ledger: false,
            wallet_name: None,
            wallet_dir: None,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        })
    }

    /// The record `--save-deployment` writes for the effective settings.
    pub fn to_record(&self) -> DeploymentRecord {
        DeploymentRecord::new(
            self.contract.to_string(),
            self.endpoint.rpc_url.to_string(),
            self.endpoint.chain_id,
            Some(self.variant.name().to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    const CONTRACT: &str = "0x033C341Edea44FDE85BCb114A632E2A2c8E19C4E";

    #[test]
    fn resolve__requires_endpoint_and_contract() {
        let err = ClientConfig::resolve(DeploymentEnv::Testnet, &Overrides::default(), None)
            .unwrap_err();
        assert!(err.to_string().contains("--rpc-url"));

        let overrides = Overrides {
            rpc_url: Some("http://localhost:8545".into()),
            ..Overrides::default()
        };
        let err = ClientConfig::resolve(DeploymentEnv::Local, &overrides, None).unwrap_err();
        assert!(err.to_string().contains("--contract"));
    }

    #[test]
    fn resolve__falls_back_to_record_and_network_defaults() {
        // given
        let record = DeploymentRecord::new(CONTRACT, "https://rpc.example", 3, Some("opponent".into()));

        // when
        let config =
            ClientConfig::resolve(DeploymentEnv::Testnet, &Overrides::default(), Some(&record))
                .unwrap();

        // then
        assert_eq!(config.contract, CONTRACT.parse::<Address>().unwrap());
        assert_eq!(config.endpoint.chain_id, 3);
        assert_eq!(config.variant, ContractVariant::OpponentRegistration);
        assert_eq!(config.gas_price, GasPricePolicy::default());
    }

    #[test]
    fn resolve__overrides_win_over_record() {
        // given
        let record = DeploymentRecord::new(CONTRACT, "https://rpc.example", 3, None);
        let overrides = Overrides {
            rpc_url: Some("http://127.0.0.1:8545".into()),
            chain_id: None,
            variant: Some(ContractVariant::OpponentRegistration),
            gas_price_gwei: Some("10".into()),
            ..Overrides::default()
        };

        // when
        let config =
            ClientConfig::resolve(DeploymentEnv::Local, &overrides, Some(&record)).unwrap();

        // then
        assert_eq!(config.endpoint.rpc_url.as_str(), "http://127.0.0.1:8545/");
        assert_eq!(config.endpoint.chain_id, 3);
        assert_eq!(config.variant, ContractVariant::OpponentRegistration);
        assert_eq!(config.gas_price.wei(), 10_000_000_000);
    }

    #[test]
    fn resolve__chain_id_defaults_per_network() {
        let overrides = Overrides {
            rpc_url: Some("http://127.0.0.1:8545".into()),
            contract: Some(CONTRACT.into()),
            ..Overrides::default()
        };

        let config = ClientConfig::resolve(DeploymentEnv::Local, &overrides, None).unwrap();

        assert_eq!(config.endpoint.chain_id, 31_337);
        assert_eq!(config.variant, ContractVariant::PerSlotRegistration);
    }
}
