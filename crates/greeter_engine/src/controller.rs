use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use greeter_core::{
    plan_start, resolve_page, update, url_hint, AbortReason, Effect, Msg, Notice, PageKind,
    StartPlan, Status, TabTarget, Traversal, UrlHint, LIST_PROBE_ATTEMPTS,
};
use run_logging::{run_debug, run_error, run_info, run_warn};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::api::{GreetingService, QuotaSource, Submission, SubmissionTracker};
use crate::dom::{Dom, ElementPath};
use crate::input::InputInjector;
use crate::notify::{Confirm, Notifier};
use crate::profile::SiteProfile;
use crate::scrape::PageScraper;
use crate::store::{StateStore, StoreError};
use crate::timings::Timings;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("state store failed: {0}")]
    Store(#[from] StoreError),
}

/// Collaborators shared by every page load.
#[derive(Clone)]
pub struct ControllerParts {
    pub store: StateStore,
    pub greeting: Arc<dyn GreetingService>,
    pub tracker: Arc<dyn SubmissionTracker>,
    pub quota: Arc<dyn QuotaSource>,
    pub injector: Arc<dyn InputInjector>,
    pub notifier: Arc<dyn Notifier>,
    pub confirm: Arc<dyn Confirm>,
    pub profile: Arc<SiteProfile>,
    pub timings: Timings,
}

/// Immediate reply to a start command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartAck {
    Started { total: u32 },
    Refused(Notice),
    Cancelled { remaining: u32 },
}

impl fmt::Display for StartAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartAck::Started { total } => write!(f, "Processing started for {total} jobs"),
            StartAck::Refused(notice) => write!(f, "{notice}"),
            StartAck::Cancelled { remaining } => write!(
                f,
                "Start cancelled ({remaining} submissions left today)"
            ),
        }
    }
}

/// How a page load ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No run active, or nothing to do on this page.
    Idle,
    /// An action that leaves the page was issued; the next load resumes.
    Navigating,
    Completed { processed: u32 },
    Aborted(AbortReason),
}

/// Runs the traversal for one page load.
///
/// A navigation ends the controller's useful life: the next page gets a new
/// one, rebuilt from the store.
pub struct Controller {
    dom: Arc<dyn Dom>,
    parts: ControllerParts,
    traversal: Traversal,
    cards: Vec<ElementPath>,
    terminal: Option<Notice>,
    tracking: Vec<JoinHandle<()>>,
}

impl Controller {
    pub fn new(dom: Arc<dyn Dom>, parts: ControllerParts) -> Self {
        Self {
            dom,
            parts,
            traversal: Traversal::new(),
            cards: Vec::new(),
            terminal: None,
            tracking: Vec::new(),
        }
    }

    pub fn traversal(&self) -> &Traversal {
        &self.traversal
    }

    /// URL patterns first; list pages must also show the list container.
    pub async fn classify_page(&self) -> PageKind {
        let url = self.dom.url();
        let hint = url_hint(&url);
        let scraper = PageScraper::new(&self.parts.profile);
        let dom = self.dom.as_ref();

        let present = match hint {
            UrlHint::Chat => false,
            UrlHint::Other => scraper.has_list_container(dom).await,
            UrlHint::List => {
                let mut present = false;
                for attempt in 1..=LIST_PROBE_ATTEMPTS {
                    if scraper.has_list_container(dom).await {
                        present = true;
                        break;
                    }
                    if attempt < LIST_PROBE_ATTEMPTS {
                        self.sleep(greeter_core::Delay::ListProbe).await;
                    }
                }
                present
            }
        };

        let page = resolve_page(hint, present);
        run_info!("Classified {} as {:?}", url, page);
        page
    }

    /// On the way back from a chat the list may still be rendering; a list URL
    /// is taken at its word and the traversal's own bounded probe decides.
    async fn classify_for_resume(&self) -> PageKind {
        if self.traversal.status() == Status::MessageSentGoingBack {
            let url = self.dom.url();
            if url_hint(&url) == UrlHint::List {
                run_info!("Classified {} as List (awaiting the list container)", url);
                return PageKind::List;
            }
        }
        self.classify_page().await
    }

    /// Handles a start command. The traversal itself begins on the next call
    /// to [`Controller::on_page_load`].
    pub async fn start(
        &mut self,
        count: u32,
        target_tab: TabTarget,
    ) -> Result<StartAck, ControllerError> {
        let quota = match self.parts.quota.quota().await {
            Ok(quota) => Some(quota),
            Err(err) => {
                run_warn!("Quota check failed, starting anyway: {}", err);
                None
            }
        };

        let count = match plan_start(count, quota.as_ref()) {
            StartPlan::Proceed { count } => count,
            StartPlan::Refuse(notice) => {
                self.parts.notifier.notify(&notice);
                return Ok(StartAck::Refused(notice));
            }
            StartPlan::ConfirmReduced {
                requested,
                remaining,
            } => {
                let question = format!(
                    "Only {remaining} submissions left today, fewer than the {requested} requested. Continue with {remaining}?"
                );
                if !self.parts.confirm.confirm(&question).await {
                    return Ok(StartAck::Cancelled { remaining });
                }
                remaining
            }
        };

        let page = self.classify_page().await;
        self.traversal = Traversal::new();
        self.terminal = None;
        self.drive(Msg::StartRequested {
            count,
            target_tab,
            page,
        })
        .await?;

        match self.terminal.take() {
            Some(notice) => Ok(StartAck::Refused(notice)),
            None => {
                run_info!("Started a run of {} jobs ({:?})", count, target_tab);
                Ok(StartAck::Started { total: count })
            }
        }
    }

    /// Entry point for every page load.
    pub async fn on_page_load(&mut self) -> Result<LoadOutcome, ControllerError> {
        let stored = match self.parts.store.load() {
            Ok(stored) => stored,
            Err(StoreError::Corrupt { key, message }) => {
                run_error!("Discarding unreadable {}: {}", key, message);
                self.parts.store.clear()?;
                let reason = AbortReason::CorruptState;
                self.parts
                    .notifier
                    .notify(&Notice::Aborted(reason.clone()));
                return Ok(LoadOutcome::Aborted(reason));
            }
            Err(err) => return Err(err.into()),
        };

        self.traversal = Traversal::resume(stored);
        self.terminal = None;
        if !self.traversal.view().is_active() {
            run_debug!("No active run on {}", self.dom.url());
            return Ok(LoadOutcome::Idle);
        }

        let page = self.classify_for_resume().await;
        self.drive(Msg::PageLoaded { page }).await?;

        Ok(match self.terminal.take() {
            Some(Notice::Completed { processed }) => LoadOutcome::Completed { processed },
            Some(Notice::Aborted(reason)) => LoadOutcome::Aborted(reason),
            _ if self.traversal.awaiting_navigation() => LoadOutcome::Navigating,
            _ => LoadOutcome::Idle,
        })
    }

    /// Waits for background tracking calls issued during this load.
    pub async fn flush_tracking(&mut self) {
        for handle in self.tracking.drain(..) {
            if let Err(err) = handle.await {
                run_warn!("Tracking task failed: {}", err);
            }
        }
    }

    async fn drive(&mut self, first: Msg) -> Result<(), ControllerError> {
        let mut inbox = VecDeque::from([first]);
        while let Some(msg) = inbox.pop_front() {
            run_debug!("msg {:?}", msg);
            let (traversal, effects) = update(std::mem::take(&mut self.traversal), msg);
            self.traversal = traversal;
            for effect in effects {
                if let Some(reply) = self.execute(effect).await? {
                    inbox.push_back(reply);
                }
            }
        }
        Ok(())
    }

    async fn execute(&mut self, effect: Effect) -> Result<Option<Msg>, ControllerError> {
        run_debug!("effect {:?}", effect);
        let profile = Arc::clone(&self.parts.profile);
        let scraper = PageScraper::new(&profile);
        let dom = Arc::clone(&self.dom);
        let dom = dom.as_ref();

        let reply = match effect {
            Effect::Persist(state) => {
                self.parts.store.save(&state)?;
                None
            }
            Effect::ClearState => {
                self.parts.store.clear()?;
                None
            }
            Effect::Notify(notice) => {
                self.parts.notifier.notify(&notice);
                if !notice.is_warning() {
                    self.terminal = Some(notice);
                }
                None
            }
            Effect::Sleep(delay) => {
                self.sleep(delay).await;
                None
            }
            Effect::CheckTab { tab } => Some(Msg::TabChecked(scraper.probe_tab(dom, tab).await)),
            Effect::ActivateTab { tab, method } => {
                if !scraper.activate_tab(dom, tab, method).await {
                    run_warn!("Tab #{} could not be targeted with {:?}", tab + 1, method);
                }
                None
            }
            Effect::ScanJobList => {
                let (container_found, cards) = scraper.scan_list(dom).await;
                let items = cards.len();
                self.cards = cards;
                Some(Msg::JobListScanned {
                    container_found,
                    items,
                })
            }
            Effect::ScrapeCard { index } => {
                let info = match self.cards.get(index) {
                    Some(card) => scraper.card_info(dom, card).await,
                    None => Default::default(),
                };
                Some(Msg::CardScraped(info))
            }
            Effect::OpenJob { index } => {
                let clicked = match self.cards.get(index) {
                    Some(card) => scraper.open_job(dom, card).await,
                    None => false,
                };
                Some(Msg::JobOpened { clicked })
            }
            Effect::ExtractDetails => Some(Msg::DetailsExtracted(scraper.detail_scrape(dom).await)),
            Effect::RequestGreeting(job) => {
                run_info!("Requesting greeting for {} @ {}", job.job_title, job.company_name);
                let reply = self
                    .parts
                    .greeting
                    .generate_greeting(&job)
                    .await
                    .map_err(|err| {
                        run_error!("Greeting request failed: {}", err);
                        err.to_string()
                    });
                Some(Msg::GreetingReceived(reply))
            }
            Effect::ClickStartChat => Some(Msg::StartChatClicked {
                clicked: profile.start_chat_button.click(dom, None).await,
            }),
            Effect::ConfirmChatPopup => Some(Msg::ChatPopupConfirmed {
                clicked: profile.continue_chat_popup.click(dom, None).await,
            }),
            Effect::TypeGreeting(text) => {
                let verified = match profile.chat_input.find(dom, None).await {
                    Some(input) => self.parts.injector.deliver(dom, &input, &text).await,
                    None => {
                        run_warn!("Chat input not found");
                        false
                    }
                };
                Some(Msg::GreetingTyped { verified })
            }
            Effect::ClickSend => Some(Msg::SendClicked {
                clicked: profile.chat_send_button.click(dom, None).await,
            }),
            Effect::TrackSubmission { job, greeting } => {
                self.track(job, greeting);
                None
            }
            Effect::ProbeListContainer => Some(Msg::ListContainerProbed {
                present: scraper.has_list_container(dom).await,
            }),
            Effect::NavigateBack => {
                dom.history_back().await;
                None
            }
        };
        Ok(reply)
    }

    fn track(&mut self, job: Option<greeter_core::JobDetails>, greeting: String) {
        let Some(job) = job else {
            run_warn!("No staged job details; skipping submission tracking");
            return;
        };
        let submission = Submission::new(job, greeting, self.dom.url(), Utc::now());
        let tracker = Arc::clone(&self.parts.tracker);
        self.tracking.push(tokio::spawn(async move {
            match tracker.track(&submission).await {
                Ok(()) => run_debug!("Tracked submission for {}", submission.company_name),
                Err(err) => run_warn!("Submission tracking failed: {}", err),
            }
        }));
    }

    async fn sleep(&self, delay: greeter_core::Delay) {
        let duration = self.parts.timings.duration(delay);
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
