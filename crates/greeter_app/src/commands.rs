//! One handler per subcommand.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use greeter_core::{TabTarget, TraversalView};
use greeter_engine::{
    ApiClient, ApiSettings, Controller, ControllerParts, FileFlagStore, HtmlDom,
    KeystrokeInjector, LoadOutcome, QuotaSource, StartAck, StateStore,
};
use run_logging::run_info;

use crate::cli::PageArgs;
use crate::config::AppConfig;
use crate::terminal::{PromptConfirm, TerminalNotifier};

fn open_store(config: &AppConfig) -> StateStore {
    StateStore::new(Arc::new(FileFlagStore::new(config.state_dir.clone())))
}

fn api_client(config: &AppConfig, store: &StateStore) -> Result<ApiClient> {
    let settings = ApiSettings {
        base_url: config.api_base_url.clone(),
        ..ApiSettings::default()
    };
    let token = store.auth_token().context("reading stored auth token")?;
    ApiClient::new(settings, token).context("building backend client")
}

fn build_parts(config: &AppConfig, assume_yes: bool) -> Result<ControllerParts> {
    let store = open_store(config);
    let api = Arc::new(api_client(config, &store)?);
    Ok(ControllerParts {
        store,
        greeting: api.clone(),
        tracker: api.clone(),
        quota: api,
        injector: Arc::new(KeystrokeInjector::new(config.timings.keystroke)),
        notifier: Arc::new(TerminalNotifier),
        confirm: Arc::new(PromptConfirm { assume_yes }),
        profile: Arc::new(config.profile.clone()),
        timings: config.timings.clone(),
    })
}

fn load_page(page: &PageArgs) -> Result<Arc<HtmlDom>> {
    let markup = fs::read_to_string(&page.html)
        .with_context(|| format!("reading page {}", page.html.display()))?;
    Ok(Arc::new(HtmlDom::new(page.url.clone(), markup)))
}

pub(crate) fn login(config: &AppConfig, token: &str) -> Result<()> {
    let token = token.trim();
    anyhow::ensure!(!token.is_empty(), "auth token is empty");
    open_store(config)
        .save_auth_token(token)
        .context("saving auth token")?;
    println!("Token saved.");
    Ok(())
}

pub(crate) fn logout(config: &AppConfig) -> Result<()> {
    open_store(config)
        .clear_auth_token()
        .context("removing auth token")?;
    println!("Token removed.");
    Ok(())
}

pub(crate) fn status(config: &AppConfig) -> Result<()> {
    let state = open_store(config).load().context("reading run state")?;
    let view = TraversalView::from_state(state.as_ref());
    if view.is_active() {
        println!("{}", view.summary());
    } else {
        println!("No run in progress.");
    }
    Ok(())
}

pub(crate) async fn quota(config: &AppConfig) -> Result<()> {
    let store = open_store(config);
    let quota = api_client(config, &store)?
        .quota()
        .await
        .context("fetching quota")?;
    println!(
        "{} of {} submissions left today{}",
        quota.remaining_submissions,
        quota.effective_limit(),
        if quota.is_effectively_member {
            " (member)"
        } else {
            ""
        }
    );
    Ok(())
}

pub(crate) fn reset(config: &AppConfig) -> Result<()> {
    open_store(config).clear().context("clearing run state")?;
    println!("Run state cleared.");
    Ok(())
}

pub(crate) async fn start(
    config: &AppConfig,
    count: u32,
    tab: i32,
    page: &PageArgs,
    assume_yes: bool,
) -> Result<()> {
    let parts = build_parts(config, assume_yes)?;
    let dom = load_page(page)?;
    let mut controller = Controller::new(dom.clone(), parts);

    let ack = controller.start(count, TabTarget::from_index(tab)).await?;
    println!("{ack}");
    if let StartAck::Started { .. } = ack {
        let outcome = controller.on_page_load().await?;
        report(&outcome);
    }
    controller.flush_tracking().await;
    log_actions(&dom);
    Ok(())
}

pub(crate) async fn step(config: &AppConfig, page: &PageArgs) -> Result<()> {
    let parts = build_parts(config, false)?;
    let dom = load_page(page)?;
    let mut controller = Controller::new(dom.clone(), parts);
    let outcome = controller.on_page_load().await?;
    report(&outcome);
    controller.flush_tracking().await;
    log_actions(&dom);
    Ok(())
}

/// Logs what a live page would have received.
fn log_actions(dom: &HtmlDom) {
    for action in dom.actions() {
        run_info!("page action: {:?}", action);
    }
}

fn report(outcome: &LoadOutcome) {
    run_info!("Page load finished: {:?}", outcome);
    match outcome {
        LoadOutcome::Idle => println!("Nothing to do on this page."),
        LoadOutcome::Navigating => {
            println!("Left the page; run `greeter step` on the next page.")
        }
        // Completion and abort reach the user through the notifier.
        LoadOutcome::Completed { .. } | LoadOutcome::Aborted(_) => {}
    }
}
