use crate::ui;
use alloy::primitives::TxHash;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use futures::{
    FutureExt,
    StreamExt,
    future::LocalBoxFuture,
    stream::FuturesUnordered,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};
use tracing::{
    error,
    info,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::EnvFilter;
use wrestling_client::{
    Action,
    ActionDispatcher,
    ClientError,
    ContractView,
    PresentationUpdate,
    Presenter,
    SessionState,
    StateReconciler,
    config::ClientConfig,
    connection::{
        Connection,
        ProviderChoice,
    },
    deployment::DeploymentStore,
    wallets,
};

pub const LOG_FILE_NAME: &str = "wrestling-client.log";

type WriteOutcome = (Action, Result<TxHash, ClientError>);

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub save_deployment: bool,
}

/// Routes `tracing` output to `<log_dir>/wrestling-client.log`; the terminal belongs to the UI.
pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let appender = rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(guard)
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let AppConfig {
        client,
        save_deployment,
    } = config;
    let _log_guard = init_tracing(&client.log_dir)?;
    info!(
        network = %client.network,
        contract = %client.contract,
        variant = %client.variant,
        "starting wrestling client"
    );

    if save_deployment {
        let store = DeploymentStore::new(client.network)?;
        store.save(&client.to_record())?;
        info!(path = %store.path().display(), "deployment recorded");
    }

    // keystore unlock may prompt, so this happens before the terminal is taken over
    let injected =
        wallets::injected_wallet(client.wallet_name.as_deref(), client.wallet_dir.as_deref())?;
    let choice = ProviderChoice::select(client.ledger, injected);
    let connection = Connection::open(choice, &client.endpoint)
        .await
        .inspect_err(|err| error!(error = %err, "could not open connection"))?;

    let mut page = ui::PageState::new(&client);
    page.render(&PresentationUpdate::mode(connection.label()));

    let mut session = SessionState::new();
    let account = connection.resolve_account().await;
    let mut view = ContractView::bind(client.contract, client.variant, &connection)?;
    if let Some(account) = account {
        info!(%account, "using account");
        session.set_account(account);
        view.set_default_sender(account);
        page.render(&PresentationUpdate::account(account));
    }

    let reconciler = StateReconciler::new(client.variant);
    let dispatcher = ActionDispatcher::new(client.variant, client.gas_price);
    let mut ui_state = ui::UiState::new(log_path(&client.log_dir));
    let mut input_events = ui::input_event_stream();

    info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(
        &view,
        reconciler,
        dispatcher,
        &mut session,
        &mut page,
        &mut ui_state,
        &mut input_events,
    )
    .await;
    ui::terminal_exit()?;
    res
}

fn log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

async fn run_loop(
    view: &ContractView,
    reconciler: StateReconciler,
    dispatcher: ActionDispatcher,
    session: &mut SessionState,
    page: &mut ui::PageState,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    let mut reads = reconciler.issue_reads(view);
    let mut writes: FuturesUnordered<LocalBoxFuture<'_, WriteOutcome>> =
        FuturesUnordered::new();
    ui::draw(ui_state, page).wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            Some(outcome) = reads.next(), if !reads.is_empty() => {
                reconciler.apply(outcome, session, page);
                if reads.is_empty() {
                    info!(resolved = session.resolved_count(), "load-time reads settled");
                }
                ui::draw(ui_state, page).wrap_err("draw after read failed")?;
            }
            Some((action, result)) = writes.next(), if !writes.is_empty() => {
                page.write_finished(action, &result);
                ui::draw(ui_state, page).wrap_err("draw after write failed")?;
            }
            _ = tokio::signal::ctrl_c() => break,
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, page, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => {}
                    ui::UserEvent::Dispatch(action) => {
                        if let Ok(request) = dispatcher.prepare(action, session, &page.inputs) {
                            page.write_started();
                            writes.push(
                                async move { (action, dispatcher.submit(view, request).await) }
                                    .boxed_local(),
                            );
                        }
                    }
                }
                ui::draw(ui_state, page).wrap_err("draw after input failed")?;
            }
        }
    }

    if !writes.is_empty() {
        info!(pending = writes.len(), "leaving with transactions still in flight");
    }
    Ok(())
}
