use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use greeter_core::{
    AbortReason, JobDetails, MissingFields, Notice, QuotaStatus, Status, TabTarget,
    TraversalState, STATE_KEY,
};
use greeter_engine::{
    ApiError, AutoConfirm, Controller, ControllerParts, Dom, DomAction, ElementPath, FlagStore,
    GreetingService, HtmlDom, JitterRange, KeystrokeInjector, LoadOutcome, MemoryFlagStore,
    Notifier, QuotaSource, SiteProfile, StartAck, StateStore, Submission, SubmissionTracker,
    Timings,
};
use pretty_assertions::assert_eq;

const LIST_URL: &str = "https://www.zhipin.com/web/geek/job-recommend?ka=header-job-recommend";
const CHAT_URL: &str = "https://www.zhipin.com/web/geek/chat?id=4f2c&source=0";
const LIST_PAGE: &str = include_str!("fixtures/list_page.html");
const BARE_LIST_PAGE: &str = include_str!("fixtures/bare_list_page.html");
const CHAT_PAGE: &str = include_str!("fixtures/chat_page.html");
const READONLY_CHAT_PAGE: &str = include_str!("fixtures/chat_page_readonly.html");

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(run_logging::initialize_for_tests);
}

struct FakeGreeting {
    reply: Option<String>,
    requests: Mutex<Vec<JobDetails>>,
}

#[async_trait]
impl GreetingService for FakeGreeting {
    async fn generate_greeting(&self, job: &JobDetails) -> Result<String, ApiError> {
        self.requests.lock().unwrap().push(job.clone());
        self.reply.clone().ok_or(ApiError::Status {
            status: 500,
            message: "model unavailable".to_string(),
        })
    }
}

#[derive(Default)]
struct RecordingTracker {
    submissions: Mutex<Vec<Submission>>,
    unreachable: bool,
}

#[async_trait]
impl SubmissionTracker for RecordingTracker {
    async fn track(&self, submission: &Submission) -> Result<(), ApiError> {
        self.submissions.lock().unwrap().push(submission.clone());
        if self.unreachable {
            return Err(ApiError::Timeout);
        }
        Ok(())
    }
}

struct FixedQuota(Option<QuotaStatus>);

#[async_trait]
impl QuotaSource for FixedQuota {
    async fn quota(&self) -> Result<QuotaStatus, ApiError> {
        self.0
            .clone()
            .ok_or_else(|| ApiError::Network("connection refused".to_string()))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn take(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().drain(..).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

struct Harness {
    flags: Arc<MemoryFlagStore>,
    store: StateStore,
    greeting: Arc<FakeGreeting>,
    tracker: Arc<RecordingTracker>,
    notifier: Arc<RecordingNotifier>,
    quota: Option<QuotaStatus>,
    confirm: bool,
}

impl Harness {
    fn new() -> Self {
        init_logging();
        let flags = Arc::new(MemoryFlagStore::new());
        Self {
            store: StateStore::new(flags.clone()),
            flags,
            greeting: Arc::new(FakeGreeting {
                reply: Some("Hello Acme, I have five years of Rust.".to_string()),
                requests: Mutex::new(Vec::new()),
            }),
            tracker: Arc::new(RecordingTracker::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            quota: Some(quota(200, true)),
            confirm: true,
        }
    }

    fn failing_greeting(mut self) -> Self {
        self.greeting = Arc::new(FakeGreeting {
            reply: None,
            requests: Mutex::new(Vec::new()),
        });
        self
    }

    fn unreachable_tracker(mut self) -> Self {
        self.tracker = Arc::new(RecordingTracker {
            submissions: Mutex::new(Vec::new()),
            unreachable: true,
        });
        self
    }

    fn parts(&self) -> ControllerParts {
        ControllerParts {
            store: self.store.clone(),
            greeting: self.greeting.clone(),
            tracker: self.tracker.clone(),
            quota: Arc::new(FixedQuota(self.quota.clone())),
            injector: Arc::new(KeystrokeInjector::new(JitterRange::new(0, 0))),
            notifier: self.notifier.clone(),
            confirm: Arc::new(AutoConfirm(self.confirm)),
            profile: Arc::new(SiteProfile::default()),
            timings: Timings::immediate(),
        }
    }

    fn controller(&self, dom: &Arc<HtmlDom>) -> Controller {
        Controller::new(dom.clone(), self.parts())
    }

    fn stored(&self) -> Option<TraversalState> {
        self.store.load().unwrap()
    }
}

fn quota(remaining: u32, member: bool) -> QuotaStatus {
    QuotaStatus {
        remaining_submissions: remaining,
        limit: if member { 200 } else { 3 },
        is_effectively_member: member,
        limit_reached: false,
    }
}

fn page(url: &str, markup: &str) -> Arc<HtmlDom> {
    Arc::new(HtmlDom::new(url, markup))
}

fn card_link(index: usize) -> ElementPath {
    ElementPath::root(".job-list-container .card-area", index).child(".job-info a", 0)
}

#[tokio::test]
async fn happy_path_greets_first_job_then_moves_to_the_second() {
    let harness = Harness::new();

    // List page: start, then the same load carries on into the first job.
    let list = page(LIST_URL, LIST_PAGE);
    let mut controller = harness.controller(&list);
    let ack = controller.start(2, TabTarget::Recommended).await.unwrap();
    assert_eq!(ack, StartAck::Started { total: 2 });
    assert_eq!(ack.to_string(), "Processing started for 2 jobs");

    let outcome = controller.on_page_load().await.unwrap();
    assert_eq!(outcome, LoadOutcome::Navigating);
    assert_eq!(list.clicks().first(), Some(&card_link(0)));

    let staged = harness.stored().expect("state persisted before navigating");
    assert_eq!(staged.status, Status::WaitingToSendOnChatPage);
    assert_eq!(staged.current_job_index, Some(0));
    assert_eq!(
        harness.greeting.requests.lock().unwrap().clone(),
        vec![JobDetails {
            job_title: "Engineer".to_string(),
            company_name: "Acme".to_string(),
            job_description: "Build things".to_string(),
        }]
    );

    // Chat page: a fresh controller resumes from the store alone.
    let chat = page(CHAT_URL, CHAT_PAGE);
    let mut controller = harness.controller(&chat);
    assert_eq!(
        controller.on_page_load().await.unwrap(),
        LoadOutcome::Navigating
    );
    controller.flush_tracking().await;

    let input = ElementPath::root("#chat-input", 0);
    assert_eq!(
        chat.read_input(&input).await.as_deref(),
        Some("Hello Acme, I have five years of Rust.")
    );
    assert!(chat.went_back());

    let after_send = harness.stored().unwrap();
    assert_eq!(after_send.processed_count, 1);
    assert_eq!(after_send.status, Status::MessageSentGoingBack);
    assert_eq!(after_send.greeting_to_send, None);

    let submissions = harness.tracker.submissions.lock().unwrap().clone();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].company_name, "Acme");
    assert_eq!(submissions[0].platform_link, CHAT_URL);
    assert!(chrono::DateTime::parse_from_rfc3339(&submissions[0].timestamp).is_ok());

    // Back on the list: the next card is index 1.
    let list = page(LIST_URL, LIST_PAGE);
    let mut controller = harness.controller(&list);
    assert_eq!(
        controller.on_page_load().await.unwrap(),
        LoadOutcome::Navigating
    );
    assert_eq!(list.clicks().first(), Some(&card_link(1)));
    assert_eq!(harness.stored().unwrap().current_job_index, Some(1));
    assert!(harness.notifier.take().is_empty());
}

#[tokio::test]
async fn last_job_completes_and_deletes_state() {
    let harness = Harness::new();
    let mut state = TraversalState::begin(1, TabTarget::Recommended);
    state.status = Status::MessageSentGoingBack;
    state.processed_count = 1;
    state.last_processed_job_index = Some(0);
    harness.store.save(&state).unwrap();

    let list = page(LIST_URL, LIST_PAGE);
    let outcome = harness.controller(&list).on_page_load().await.unwrap();

    assert_eq!(outcome, LoadOutcome::Completed { processed: 1 });
    assert_eq!(harness.stored(), None);
    assert!(list.clicks().is_empty());
    assert_eq!(
        harness.notifier.take(),
        vec![Notice::Completed { processed: 1 }]
    );
}

#[tokio::test]
async fn list_that_never_reappears_after_sending_is_fatal() {
    let harness = Harness::new();
    let mut state = TraversalState::begin(2, TabTarget::Recommended);
    state.status = Status::MessageSentGoingBack;
    state.processed_count = 1;
    state.last_processed_job_index = Some(0);
    harness.store.save(&state).unwrap();

    let still_loading = page(LIST_URL, "<html><body><div class=\"loading\"></div></body></html>");
    let outcome = harness
        .controller(&still_loading)
        .on_page_load()
        .await
        .unwrap();

    assert_eq!(outcome, LoadOutcome::Aborted(AbortReason::ListNeverReappeared));
    assert_eq!(harness.stored(), None);
    assert_eq!(
        harness.notifier.take(),
        vec![Notice::Aborted(AbortReason::ListNeverReappeared)]
    );
    assert!(still_loading.clicks().is_empty());
}

#[tokio::test]
async fn failed_tracking_call_does_not_stop_the_run() {
    let harness = Harness::new().unreachable_tracker();
    let mut state = TraversalState::begin(2, TabTarget::Recommended);
    state.status = Status::WaitingToSendOnChatPage;
    state.current_job_index = Some(0);
    state.last_processed_job_index = Some(0);
    state.greeting_to_send = Some("Hello Acme, I have five years of Rust.".to_string());
    state.current_processing_job_details = Some(JobDetails {
        job_title: "Engineer".to_string(),
        company_name: "Acme".to_string(),
        job_description: "Build things".to_string(),
    });
    harness.store.save(&state).unwrap();

    let chat = page(CHAT_URL, CHAT_PAGE);
    let mut controller = harness.controller(&chat);
    let outcome = controller.on_page_load().await.unwrap();
    controller.flush_tracking().await;

    assert_eq!(outcome, LoadOutcome::Navigating);
    assert_eq!(harness.tracker.submissions.lock().unwrap().len(), 1);
    let stored = harness.stored().expect("run still active");
    assert_eq!(stored.status, Status::MessageSentGoingBack);
    assert_eq!(stored.processed_count, 1);
    assert!(chat.went_back());
    assert!(harness.notifier.take().is_empty());
}

#[tokio::test]
async fn exhausted_quota_refuses_before_creating_state() {
    let mut harness = Harness::new();
    harness.quota = Some(quota(0, false));

    let list = page(LIST_URL, LIST_PAGE);
    let ack = harness
        .controller(&list)
        .start(5, TabTarget::Recommended)
        .await
        .unwrap();

    let refusal = Notice::QuotaExhausted {
        limit: 3,
        member: false,
    };
    assert_eq!(ack, StartAck::Refused(refusal.clone()));
    assert_eq!(harness.stored(), None);
    assert_eq!(harness.notifier.take(), vec![refusal]);
}

#[tokio::test]
async fn reduced_quota_needs_confirmation() {
    let mut harness = Harness::new();
    harness.quota = Some(quota(1, false));
    let list = page(LIST_URL, LIST_PAGE);

    let ack = harness
        .controller(&list)
        .start(3, TabTarget::Recommended)
        .await
        .unwrap();
    assert_eq!(ack, StartAck::Started { total: 1 });
    assert_eq!(harness.stored().map(|state| state.total_count), Some(1));

    harness.store.clear().unwrap();
    harness.confirm = false;
    let ack = harness
        .controller(&list)
        .start(3, TabTarget::Recommended)
        .await
        .unwrap();
    assert_eq!(ack, StartAck::Cancelled { remaining: 1 });
    assert_eq!(harness.stored(), None);
}

#[tokio::test]
async fn unreachable_quota_endpoint_does_not_block_start() {
    let mut harness = Harness::new();
    harness.quota = None;
    let list = page(LIST_URL, LIST_PAGE);

    let ack = harness
        .controller(&list)
        .start(2, TabTarget::Recommended)
        .await
        .unwrap();
    assert_eq!(ack, StartAck::Started { total: 2 });
}

#[tokio::test]
async fn start_outside_a_list_page_is_refused() {
    let harness = Harness::new();
    let chat = page(CHAT_URL, CHAT_PAGE);

    let ack = harness
        .controller(&chat)
        .start(2, TabTarget::Recommended)
        .await
        .unwrap();
    assert_eq!(ack, StartAck::Refused(Notice::NotOnListPage));
    assert_eq!(harness.stored(), None);
}

#[tokio::test]
async fn new_start_replaces_a_run_in_progress() {
    let harness = Harness::new();
    let mut previous = TraversalState::begin(9, TabTarget::Custom(2));
    previous.processed_count = 4;
    previous.last_processed_job_index = Some(3);
    harness.store.save(&previous).unwrap();

    let list = page(LIST_URL, LIST_PAGE);
    harness
        .controller(&list)
        .start(2, TabTarget::Recommended)
        .await
        .unwrap();

    assert_eq!(
        harness.stored(),
        Some(TraversalState::begin(2, TabTarget::Recommended))
    );
}

#[tokio::test]
async fn extraction_failure_clears_state_and_names_both_fields() {
    let harness = Harness::new();
    harness
        .store
        .save(&TraversalState::begin(2, TabTarget::Recommended))
        .unwrap();

    let list = page(LIST_URL, BARE_LIST_PAGE);
    let outcome = harness.controller(&list).on_page_load().await.unwrap();

    let reason = AbortReason::MissingFields(MissingFields {
        job_title: true,
        company_name: true,
    });
    assert_eq!(outcome, LoadOutcome::Aborted(reason.clone()));
    assert_eq!(harness.stored(), None);
    assert!(harness.greeting.requests.lock().unwrap().is_empty());

    let notices = harness.notifier.take();
    assert_eq!(notices, vec![Notice::Aborted(reason)]);
    assert!(notices[0].to_string().contains("job title, company name"));
}

#[tokio::test]
async fn greeting_service_error_clears_state() {
    let harness = Harness::new().failing_greeting();
    harness
        .store
        .save(&TraversalState::begin(2, TabTarget::Recommended))
        .unwrap();

    let list = page(LIST_URL, LIST_PAGE);
    let outcome = harness.controller(&list).on_page_load().await.unwrap();

    assert!(matches!(
        outcome,
        LoadOutcome::Aborted(AbortReason::GreetingFailed(ref message)) if message.contains("model unavailable")
    ));
    assert_eq!(harness.stored(), None);
}

#[tokio::test]
async fn unrecognised_page_during_a_run_clears_state() {
    let harness = Harness::new();
    harness
        .store
        .save(&TraversalState::begin(2, TabTarget::Recommended))
        .unwrap();

    let login = page(
        "https://www.zhipin.com/web/user/?ka=header-login",
        "<html><body><form class=\"login\"></form></body></html>",
    );
    let outcome = harness.controller(&login).on_page_load().await.unwrap();

    assert_eq!(
        outcome,
        LoadOutcome::Aborted(AbortReason::UnrecognizedPage {
            status: Status::LookingForNextJob,
        })
    );
    assert_eq!(harness.stored(), None);
}

#[tokio::test]
async fn input_that_does_not_stick_is_fatal_without_sending() {
    let harness = Harness::new();
    let mut state = TraversalState::begin(2, TabTarget::Recommended);
    state.status = Status::WaitingToSendOnChatPage;
    state.greeting_to_send = Some("Hello there, nice to meet you".to_string());
    harness.store.save(&state).unwrap();

    let chat = page(CHAT_URL, READONLY_CHAT_PAGE);
    let outcome = harness.controller(&chat).on_page_load().await.unwrap();

    assert_eq!(outcome, LoadOutcome::Aborted(AbortReason::InputNotApplied));
    assert_eq!(harness.stored(), None);
    assert!(chat.clicks().is_empty());
    assert!(!chat.went_back());
}

#[tokio::test]
async fn corrupt_state_is_discarded_and_reported() {
    let harness = Harness::new();
    harness.flags.set(STATE_KEY, "(status: LOOKING").unwrap();

    let list = page(LIST_URL, LIST_PAGE);
    let outcome = harness.controller(&list).on_page_load().await.unwrap();

    assert_eq!(outcome, LoadOutcome::Aborted(AbortReason::CorruptState));
    assert_eq!(harness.flags.get(STATE_KEY).unwrap(), None);
}

#[tokio::test]
async fn idle_page_load_touches_nothing() {
    let harness = Harness::new();
    let list = page(LIST_URL, LIST_PAGE);

    let outcome = harness.controller(&list).on_page_load().await.unwrap();

    assert_eq!(outcome, LoadOutcome::Idle);
    assert!(list.actions().is_empty());
}

#[tokio::test]
async fn stubborn_first_tab_gets_the_marker_forced() {
    let harness = Harness::new();
    harness
        .store
        .save(&TraversalState::begin(1, TabTarget::Custom(0)))
        .unwrap();

    let list = page(LIST_URL, LIST_PAGE);
    harness.controller(&list).on_page_load().await.unwrap();

    let tab_actions: Vec<DomAction> = list
        .actions()
        .into_iter()
        .filter(|action| match action {
            DomAction::Click(path)
            | DomAction::PointerSequence(path)
            | DomAction::AddClass(path, _) => path.to_string().contains("expect"),
            _ => false,
        })
        .collect();
    assert_eq!(tab_actions.len(), 4, "{tab_actions:?}");
    assert!(matches!(tab_actions[2], DomAction::PointerSequence(_)));
    assert!(matches!(tab_actions[3], DomAction::AddClass(_, ref class) if class == "cur"));

    // The run carried on into the first job after forcing the tab.
    assert_eq!(
        harness.stored().map(|state| state.status),
        Some(Status::WaitingToSendOnChatPage)
    );
}

#[tokio::test]
async fn responsive_tab_is_clicked_once() {
    let harness = Harness::new();
    harness
        .store
        .save(&TraversalState::begin(1, TabTarget::Custom(1)))
        .unwrap();

    let list = Arc::new(HtmlDom::new(LIST_URL, LIST_PAGE).react_on_click(".expect-item", "cur"));
    harness.controller(&list).on_page_load().await.unwrap();

    let tab_clicks = list
        .clicks()
        .into_iter()
        .filter(|path| path.to_string().contains("expect"))
        .count();
    assert_eq!(tab_clicks, 1);
    assert!(harness.notifier.take().is_empty());
}

#[tokio::test]
async fn missing_tab_only_warns() {
    let harness = Harness::new();
    harness
        .store
        .save(&TraversalState::begin(1, TabTarget::Custom(1)))
        .unwrap();

    let list = page(LIST_URL, BARE_LIST_PAGE);
    harness.controller(&list).on_page_load().await.unwrap();

    let notices = harness.notifier.take();
    assert_eq!(notices.first(), Some(&Notice::TabNotActivated { tab: 1 }));
}
