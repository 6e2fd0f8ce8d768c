use crate::{
    next_job_index, AbortReason, Activation, CardJobInfo, Delay, DetailScrape, Effect,
    JobDetails, MissingFields, Msg, Notice, PageKind, Status, TabProbe, TabTarget, TraversalState,
    TraversalView, DESCRIPTION_PLACEHOLDER, LIST_PROBE_ATTEMPTS,
};

/// Detail-pane extraction attempts before the job is declared unreadable.
pub const MAX_DETAIL_ATTEMPTS: u32 = 3;

/// Clicks on the chat popup's "continue" button before giving up.
pub const POPUP_ATTEMPTS: u32 = 2;

const REGULAR_TAB_LADDER: &[Activation] = &[Activation::Click, Activation::Click];
const FIRST_TAB_LADDER: &[Activation] = &[
    Activation::Click,
    Activation::Click,
    Activation::PointerSequence,
    Activation::ForceMarker,
];

/// The traversal as seen during one page load.
///
/// Only `state` outlives the page: it is persisted before anything that may
/// navigate. The counters are per-load scratch and start from zero whenever a
/// traversal is resumed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Traversal {
    state: Option<TraversalState>,
    selected_index: Option<usize>,
    tab_rung: usize,
    detail_attempts: u32,
    popup_attempts: u32,
    list_probes: u32,
    awaiting_navigation: bool,
}

impl Traversal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the in-memory traversal from the persisted record.
    pub fn resume(persisted: Option<TraversalState>) -> Self {
        Self {
            state: persisted,
            ..Self::default()
        }
    }

    pub fn state(&self) -> Option<&TraversalState> {
        self.state.as_ref()
    }

    pub fn status(&self) -> Status {
        self.state.as_ref().map_or(Status::Idle, |state| state.status)
    }

    /// True once an action that leaves the page has been issued.
    pub fn awaiting_navigation(&self) -> bool {
        self.awaiting_navigation
    }

    pub fn view(&self) -> TraversalView {
        TraversalView::from_state(self.state.as_ref())
    }

    fn in_status(&mut self, status: Status) -> Option<&mut TraversalState> {
        self.state.as_mut().filter(|state| state.status == status)
    }

    fn abort(&mut self, reason: AbortReason) -> Vec<Effect> {
        self.state = None;
        self.awaiting_navigation = false;
        vec![Effect::ClearState, Effect::Notify(Notice::Aborted(reason))]
    }

    fn start(&mut self, count: u32, target_tab: TabTarget, page: PageKind) -> Vec<Effect> {
        if count == 0 {
            return vec![Effect::Notify(Notice::InvalidCount)];
        }
        if page != PageKind::List {
            return vec![Effect::Notify(Notice::NotOnListPage)];
        }

        let state = TraversalState::begin(count, target_tab);
        *self = Self::resume(Some(state.clone()));
        vec![Effect::ClearState, Effect::Persist(state)]
    }

    fn page_loaded(&mut self, page: PageKind) -> Vec<Effect> {
        let Some(state) = self.state.as_mut() else {
            return Vec::new();
        };

        match (page, state.status) {
            (_, Status::Idle) => Vec::new(),
            (PageKind::Chat, Status::WaitingToSendOnChatPage) => {
                match state.greeting_to_send.clone().filter(|g| !g.trim().is_empty()) {
                    Some(greeting) => vec![
                        Effect::Sleep(Delay::ChatPageLoad),
                        Effect::TypeGreeting(greeting),
                    ],
                    None => self.abort(AbortReason::NoStagedGreeting),
                }
            }
            (PageKind::List, Status::MessageSentGoingBack) => {
                self.list_probes = 1;
                vec![Effect::Sleep(Delay::Navigation), Effect::ProbeListContainer]
            }
            (PageKind::List, Status::LookingForNextJob) => self.look_for_next_job(),
            (PageKind::List, Status::ProcessingJobIndex | Status::ProcessingJobDetails) => {
                // Reloaded while a card was being opened: move on to the next one.
                state.status = Status::LookingForNextJob;
                let mut effects = vec![Effect::Persist(state.clone())];
                effects.extend(self.look_for_next_job());
                effects
            }
            (PageKind::Unknown, status) => self.abort(AbortReason::UnrecognizedPage { status }),
            (page, status) => self.abort(AbortReason::UnexpectedState { page, status }),
        }
    }

    fn look_for_next_job(&mut self) -> Vec<Effect> {
        let Some(state) = self.in_status(Status::LookingForNextJob) else {
            return Vec::new();
        };

        if state.is_complete() {
            let processed = state.processed_count;
            self.state = None;
            return vec![
                Effect::ClearState,
                Effect::Notify(Notice::Completed { processed }),
            ];
        }

        match state.target_tab {
            TabTarget::Custom(tab) => {
                self.tab_rung = 0;
                vec![Effect::CheckTab { tab }]
            }
            TabTarget::Recommended => vec![Effect::ScanJobList],
        }
    }

    fn tab_checked(&mut self, probe: TabProbe) -> Vec<Effect> {
        let Some(state) = self.in_status(Status::LookingForNextJob) else {
            return Vec::new();
        };
        let TabTarget::Custom(tab) = state.target_tab else {
            return vec![Effect::ScanJobList];
        };

        match probe {
            TabProbe::Active => vec![Effect::ScanJobList],
            TabProbe::Missing => vec![
                Effect::Notify(Notice::TabNotActivated { tab }),
                Effect::ScanJobList,
            ],
            TabProbe::Inactive => {
                let ladder = if tab == 0 {
                    FIRST_TAB_LADDER
                } else {
                    REGULAR_TAB_LADDER
                };
                match ladder.get(self.tab_rung).copied() {
                    Some(Activation::ForceMarker) => {
                        self.tab_rung += 1;
                        vec![
                            Effect::ActivateTab {
                                tab,
                                method: Activation::ForceMarker,
                            },
                            Effect::ScanJobList,
                        ]
                    }
                    Some(method) => {
                        self.tab_rung += 1;
                        vec![
                            Effect::ActivateTab { tab, method },
                            Effect::Sleep(Delay::TabSwitch),
                            Effect::CheckTab { tab },
                        ]
                    }
                    None => vec![
                        Effect::Notify(Notice::TabNotActivated { tab }),
                        Effect::ScanJobList,
                    ],
                }
            }
        }
    }

    fn job_list_scanned(&mut self, container_found: bool, items: usize) -> Vec<Effect> {
        let Some(state) = self.in_status(Status::LookingForNextJob) else {
            return Vec::new();
        };
        if !container_found {
            return self.abort(AbortReason::NoListContainer);
        }
        let Some(index) = next_job_index(state.last_processed_job_index, items) else {
            return self.abort(AbortReason::NoJobItems);
        };

        self.selected_index = Some(index);
        vec![Effect::ScrapeCard { index }]
    }

    fn card_scraped(&mut self, info: CardJobInfo) -> Vec<Effect> {
        let Some(index) = self.selected_index else {
            return Vec::new();
        };
        let Some(state) = self.in_status(Status::LookingForNextJob) else {
            return Vec::new();
        };

        state.card_job_info = (!info.is_empty()).then_some(info);
        state.current_job_index = Some(index);
        state.last_processed_job_index = Some(index);
        state.status = Status::ProcessingJobIndex;
        vec![Effect::Persist(state.clone()), Effect::OpenJob { index }]
    }

    fn job_opened(&mut self, clicked: bool) -> Vec<Effect> {
        if self.in_status(Status::ProcessingJobIndex).is_none() {
            return Vec::new();
        }
        if !clicked {
            let index = self.selected_index.unwrap_or_default();
            return self.abort(AbortReason::JobNotClickable { index });
        }

        self.detail_attempts = 1;
        let Some(state) = self.in_status(Status::ProcessingJobIndex) else {
            return Vec::new();
        };
        state.status = Status::ProcessingJobDetails;
        vec![
            Effect::Sleep(Delay::NextJobClick),
            Effect::Persist(state.clone()),
            Effect::Sleep(Delay::DetailLoad { attempt: 1 }),
            Effect::ExtractDetails,
        ]
    }

    fn details_extracted(&mut self, scrape: DetailScrape) -> Vec<Effect> {
        let attempts = self.detail_attempts;
        let Some(state) = self.in_status(Status::ProcessingJobDetails) else {
            return Vec::new();
        };

        let card = state.card_job_info.clone().unwrap_or_default();
        let job_title = non_empty(card.job_title).or_else(|| non_empty(scrape.job_title));
        let company_name = non_empty(card.company_name).or_else(|| non_empty(scrape.company_name));

        match (job_title, company_name) {
            (Some(job_title), Some(company_name)) => {
                let details = JobDetails {
                    job_title,
                    company_name,
                    job_description: non_empty(scrape.job_description)
                        .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string()),
                };
                state.current_processing_job_details = Some(details.clone());
                vec![Effect::RequestGreeting(details)]
            }
            (job_title, company_name) => {
                if attempts < MAX_DETAIL_ATTEMPTS {
                    self.detail_attempts += 1;
                    vec![
                        Effect::Sleep(Delay::DetailLoad {
                            attempt: self.detail_attempts,
                        }),
                        Effect::ExtractDetails,
                    ]
                } else {
                    self.abort(AbortReason::MissingFields(MissingFields {
                        job_title: job_title.is_none(),
                        company_name: company_name.is_none(),
                    }))
                }
            }
        }
    }

    fn greeting_received(&mut self, reply: Result<String, String>) -> Vec<Effect> {
        let Some(state) = self.in_status(Status::ProcessingJobDetails) else {
            return Vec::new();
        };
        if state.current_processing_job_details.is_none() {
            return Vec::new();
        }

        match reply {
            Ok(greeting) if !greeting.trim().is_empty() => {
                state.status = Status::WaitingToSendOnChatPage;
                state.greeting_to_send = Some(greeting);
                let persisted = state.clone();
                self.popup_attempts = 0;
                vec![Effect::Persist(persisted), Effect::ClickStartChat]
            }
            Ok(_) => self.abort(AbortReason::GreetingFailed(
                "service returned an empty greeting".to_string(),
            )),
            Err(reason) => self.abort(AbortReason::GreetingFailed(reason)),
        }
    }

    fn start_chat_clicked(&mut self, clicked: bool) -> Vec<Effect> {
        if self.in_status(Status::WaitingToSendOnChatPage).is_none() {
            return Vec::new();
        }
        if !clicked {
            return self.abort(AbortReason::StartChatMissing);
        }
        self.popup_attempts = 1;
        vec![Effect::Sleep(Delay::PopupAppear), Effect::ConfirmChatPopup]
    }

    fn chat_popup_confirmed(&mut self, clicked: bool) -> Vec<Effect> {
        if self.in_status(Status::WaitingToSendOnChatPage).is_none() {
            return Vec::new();
        }
        if clicked {
            self.awaiting_navigation = true;
            return Vec::new();
        }
        if self.popup_attempts < POPUP_ATTEMPTS {
            self.popup_attempts += 1;
            return vec![Effect::Sleep(Delay::PopupAppear), Effect::ConfirmChatPopup];
        }
        self.abort(AbortReason::ChatPopupMissing)
    }

    fn greeting_typed(&mut self, verified: bool) -> Vec<Effect> {
        if self.in_status(Status::WaitingToSendOnChatPage).is_none() {
            return Vec::new();
        }
        if !verified {
            return self.abort(AbortReason::InputNotApplied);
        }
        vec![Effect::Sleep(Delay::BeforeSend), Effect::ClickSend]
    }

    fn send_clicked(&mut self, clicked: bool) -> Vec<Effect> {
        if self.in_status(Status::WaitingToSendOnChatPage).is_none() {
            return Vec::new();
        }
        if !clicked {
            return self.abort(AbortReason::SendFailed);
        }

        let Some(state) = self.in_status(Status::WaitingToSendOnChatPage) else {
            return Vec::new();
        };
        let greeting = state.greeting_to_send.take().unwrap_or_default();
        let job = state.current_processing_job_details.take();
        state.processed_count = state.processed_count.saturating_add(1).min(state.total_count);
        state.status = Status::MessageSentGoingBack;
        let persisted = state.clone();
        self.awaiting_navigation = true;

        vec![
            Effect::Persist(persisted),
            Effect::TrackSubmission { job, greeting },
            Effect::Sleep(Delay::AfterClick),
            Effect::NavigateBack,
        ]
    }

    fn list_container_probed(&mut self, present: bool) -> Vec<Effect> {
        let Some(state) = self.in_status(Status::MessageSentGoingBack) else {
            return Vec::new();
        };

        if present {
            state.status = Status::LookingForNextJob;
            if state.is_complete() {
                return self.look_for_next_job();
            }
            let mut effects = vec![Effect::Persist(state.clone())];
            effects.extend(self.look_for_next_job());
            return effects;
        }

        if self.list_probes < LIST_PROBE_ATTEMPTS {
            self.list_probes += 1;
            vec![Effect::Sleep(Delay::ListProbe), Effect::ProbeListContainer]
        } else {
            self.abort(AbortReason::ListNeverReappeared)
        }
    }
}

/// Pure update function: applies a message to the traversal and returns the
/// effects to run, in order.
pub fn update(mut traversal: Traversal, msg: Msg) -> (Traversal, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested {
            count,
            target_tab,
            page,
        } => traversal.start(count, target_tab, page),
        Msg::PageLoaded { page } => traversal.page_loaded(page),
        Msg::TabChecked(probe) => traversal.tab_checked(probe),
        Msg::JobListScanned {
            container_found,
            items,
        } => traversal.job_list_scanned(container_found, items),
        Msg::CardScraped(info) => traversal.card_scraped(info),
        Msg::JobOpened { clicked } => traversal.job_opened(clicked),
        Msg::DetailsExtracted(scrape) => traversal.details_extracted(scrape),
        Msg::GreetingReceived(reply) => traversal.greeting_received(reply),
        Msg::StartChatClicked { clicked } => traversal.start_chat_clicked(clicked),
        Msg::ChatPopupConfirmed { clicked } => traversal.chat_popup_confirmed(clicked),
        Msg::GreetingTyped { verified } => traversal.greeting_typed(verified),
        Msg::SendClicked { clicked } => traversal.send_clicked(clicked),
        Msg::ListContainerProbed { present } => traversal.list_container_probed(present),
    };

    (traversal, effects)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
