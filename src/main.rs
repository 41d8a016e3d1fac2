use color_eyre::eyre::{
    Result,
    eyre,
};
use std::path::PathBuf;
use wrestling_client::{
    config::{
        ClientConfig,
        DEFAULT_LOG_DIR,
        Overrides,
    },
    deployment::{
        DeploymentEnv,
        DeploymentStore,
    },
    wallets,
};

mod client;
mod ui;

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: wrestling-client [--mainnet | --testnet | --local] [--rpc-url <url>]\n\
         [--contract <address>] [--chain-id <id>] [--variant <per-slot|opponent>]\n\
         [--gas-price-gwei <gwei>] [--ledger] [--wallet <name>] [--wallet-dir <path>]\n\
         [--log-dir <path>] [--save-deployment]\n\
         \n\
         Flags:\n\
           --mainnet              Use the mainnet deployment record (chain id 1)\n\
           --testnet              Use the testnet deployment record (default, chain id 11155111)\n\
           --local                Use the local node deployment record (chain id 31337)\n\
           --rpc-url <url>        Override the RPC endpoint from the deployment record\n\
           --contract <address>   Override the contract address from the deployment record\n\
           --chain-id <id>        Override the chain id\n\
           --variant <name>       Contract flavour: per-slot (default) or opponent\n\
           --gas-price-gwei <n>   Gas price attached to write calls (default 4.1)\n\
           --ledger               Sign with a Ledger hardware wallet\n\
           --wallet <name>        Keystore to sign with (or set {})\n\
           --wallet-dir <path>    Keystore directory (defaults to ~/.foundry/keystores)\n\
           --log-dir <path>       Where the log file goes (default {})\n\
           --save-deployment      Record the effective endpoint and contract for this network",
        wallets::WALLET_ENV_VAR,
        DEFAULT_LOG_DIR,
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<client::AppConfig> {
    let mut args = std::env::args().skip(1);
    let mut network: Option<DeploymentEnv> = None;
    let mut overrides = Overrides::default();
    let mut ledger = false;
    let mut wallet_name: Option<String> = None;
    let mut wallet_dir: Option<String> = None;
    let mut log_dir: Option<String> = None;
    let mut save_deployment = false;

    fn once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<()> {
        if slot.is_some() {
            return Err(eyre!("{flag} may only be specified once"));
        }
        *slot = Some(value);
        Ok(())
    }

    while let Some(arg) = args.next() {
        let mut value = |flag: &str, what: &str| {
            args.next()
                .ok_or_else(|| eyre!("{flag} requires {what} argument"))
        };
        match arg.as_str() {
            "--mainnet" | "--testnet" | "--local" => {
                let env = match arg.as_str() {
                    "--mainnet" => DeploymentEnv::Mainnet,
                    "--testnet" => DeploymentEnv::Testnet,
                    _ => DeploymentEnv::Local,
                };
                if network.is_some() {
                    return Err(eyre!(
                        "Multiple network flags provided; choose one of --mainnet/--testnet/--local"
                    ));
                }
                network = Some(env);
            }
            "--rpc-url" => {
                let url = value("--rpc-url", "a URL")?;
                once(&mut overrides.rpc_url, url, "--rpc-url")?;
            }
            "--contract" => {
                let address = value("--contract", "an address")?;
                once(&mut overrides.contract, address, "--contract")?;
            }
            "--chain-id" => {
                let raw = value("--chain-id", "a number")?;
                let id = raw
                    .parse::<u64>()
                    .map_err(|e| eyre!("Invalid chain id '{raw}': {e}"))?;
                once(&mut overrides.chain_id, id, "--chain-id")?;
            }
            "--variant" => {
                let raw = value("--variant", "a name")?;
                let variant = raw.parse().map_err(|e: String| eyre!(e))?;
                once(&mut overrides.variant, variant, "--variant")?;
            }
            "--gas-price-gwei" => {
                let gwei = value("--gas-price-gwei", "an amount")?;
                once(&mut overrides.gas_price_gwei, gwei, "--gas-price-gwei")?;
            }
            "--ledger" => ledger = true,
            "--wallet" => {
                let name = value("--wallet", "a keystore name")?;
                once(&mut wallet_name, name, "--wallet")?;
            }
            "--wallet-dir" => {
                let dir = value("--wallet-dir", "a path")?;
                once(&mut wallet_dir, dir, "--wallet-dir")?;
            }
            "--log-dir" => {
                let dir = value("--log-dir", "a path")?;
                once(&mut log_dir, dir, "--log-dir")?;
            }
            "--save-deployment" => save_deployment = true,
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let network = network.unwrap_or(DeploymentEnv::Testnet);
    let record = DeploymentStore::new(network)?.load()?;
    let mut client = ClientConfig::resolve(network, &overrides, record.as_ref())?;
    client.ledger = ledger;
    client.wallet_name = wallet_name;
    client.wallet_dir = wallet_dir;
    if let Some(dir) = log_dir {
        client.log_dir = PathBuf::from(shellexpand::tilde(&dir).into_owned());
    }

    Ok(client::AppConfig {
        client,
        save_deployment,
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let app_config = parse_cli_args()?;
    client::run_app(app_config).await
}
