use std::sync::Once;

use greeter_core::{
    update, AbortReason, DetailScrape, Effect, MissingFields, Msg, Notice, PageKind, Status,
    TabTarget, Traversal, TraversalState, LIST_PROBE_ATTEMPTS, MAX_DETAIL_ATTEMPTS,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(run_logging::initialize_for_tests);
}

fn in_status(status: Status) -> Traversal {
    let mut state = TraversalState::begin(3, TabTarget::Recommended);
    state.status = status;
    state.greeting_to_send = Some("Hello".to_string());
    Traversal::resume(Some(state))
}

fn assert_aborted(traversal: &Traversal, effects: &[Effect], reason: AbortReason) {
    assert_eq!(traversal.state(), None);
    assert_eq!(
        effects,
        &[Effect::ClearState, Effect::Notify(Notice::Aborted(reason))]
    );
}

#[test]
fn missing_list_container_is_fatal() {
    init_logging();
    let (traversal, effects) = update(
        in_status(Status::LookingForNextJob),
        Msg::JobListScanned {
            container_found: false,
            items: 0,
        },
    );
    assert_aborted(&traversal, &effects, AbortReason::NoListContainer);
}

#[test]
fn empty_job_list_is_fatal() {
    init_logging();
    let (traversal, effects) = update(
        in_status(Status::LookingForNextJob),
        Msg::JobListScanned {
            container_found: true,
            items: 0,
        },
    );
    assert_aborted(&traversal, &effects, AbortReason::NoJobItems);
}

#[test]
fn extraction_failure_names_both_fields_after_retries() {
    init_logging();
    let mut traversal = in_status(Status::ProcessingJobIndex);
    let (next, _) = update(traversal, Msg::JobOpened { clicked: true });
    traversal = next;

    let empty = DetailScrape {
        container_found: true,
        ..DetailScrape::default()
    };
    for attempt in 2..=MAX_DETAIL_ATTEMPTS {
        let (next, effects) = update(traversal, Msg::DetailsExtracted(empty.clone()));
        traversal = next;
        assert_eq!(
            effects,
            vec![
                Effect::Sleep(greeter_core::Delay::DetailLoad { attempt }),
                Effect::ExtractDetails,
            ]
        );
    }

    let (traversal, effects) = update(traversal, Msg::DetailsExtracted(empty));
    let reason = AbortReason::MissingFields(MissingFields {
        job_title: true,
        company_name: true,
    });
    assert_aborted(&traversal, &effects, reason.clone());
    assert!(Notice::Aborted(reason)
        .to_string()
        .contains("job title, company name"));
}

#[test]
fn greeting_service_error_is_fatal() {
    init_logging();
    let mut state = TraversalState::begin(3, TabTarget::Recommended);
    state.status = Status::ProcessingJobDetails;
    state.current_processing_job_details = Some(greeter_core::JobDetails {
        job_title: "Engineer".to_string(),
        company_name: "Acme".to_string(),
        job_description: "desc".to_string(),
    });

    let (traversal, effects) = update(
        Traversal::resume(Some(state)),
        Msg::GreetingReceived(Err("HTTP 500".to_string())),
    );
    assert_aborted(
        &traversal,
        &effects,
        AbortReason::GreetingFailed("HTTP 500".to_string()),
    );
}

#[test]
fn chat_popup_is_retried_once() {
    init_logging();
    let (traversal, _) = update(
        in_status(Status::WaitingToSendOnChatPage),
        Msg::StartChatClicked { clicked: true },
    );
    let (traversal, effects) = update(traversal, Msg::ChatPopupConfirmed { clicked: false });
    assert_eq!(effects.last(), Some(&Effect::ConfirmChatPopup));

    let (traversal, effects) = update(traversal, Msg::ChatPopupConfirmed { clicked: false });
    assert_aborted(&traversal, &effects, AbortReason::ChatPopupMissing);
}

#[test]
fn input_simulation_failure_is_not_retried() {
    init_logging();
    let (traversal, effects) = update(
        in_status(Status::WaitingToSendOnChatPage),
        Msg::GreetingTyped { verified: false },
    );
    assert_aborted(&traversal, &effects, AbortReason::InputNotApplied);
}

#[test]
fn send_click_failure_is_fatal() {
    init_logging();
    let (traversal, effects) = update(
        in_status(Status::WaitingToSendOnChatPage),
        Msg::SendClicked { clicked: false },
    );
    assert_aborted(&traversal, &effects, AbortReason::SendFailed);
}

#[test]
fn unrecognised_page_during_a_run_is_fatal() {
    init_logging();
    let (traversal, effects) = update(
        in_status(Status::WaitingToSendOnChatPage),
        Msg::PageLoaded {
            page: PageKind::Unknown,
        },
    );
    assert_aborted(
        &traversal,
        &effects,
        AbortReason::UnrecognizedPage {
            status: Status::WaitingToSendOnChatPage,
        },
    );
}

#[test]
fn chat_page_outside_the_chat_step_is_fatal() {
    init_logging();
    let (traversal, effects) = update(
        in_status(Status::LookingForNextJob),
        Msg::PageLoaded {
            page: PageKind::Chat,
        },
    );
    assert_aborted(
        &traversal,
        &effects,
        AbortReason::UnexpectedState {
            page: PageKind::Chat,
            status: Status::LookingForNextJob,
        },
    );
}

#[test]
fn list_that_never_returns_is_fatal() {
    init_logging();
    let (mut traversal, _) = update(
        in_status(Status::MessageSentGoingBack),
        Msg::PageLoaded {
            page: PageKind::List,
        },
    );
    for _ in 1..LIST_PROBE_ATTEMPTS {
        let (next, effects) = update(traversal, Msg::ListContainerProbed { present: false });
        traversal = next;
        assert_eq!(effects.last(), Some(&Effect::ProbeListContainer));
    }
    let (traversal, effects) = update(traversal, Msg::ListContainerProbed { present: false });
    assert_aborted(&traversal, &effects, AbortReason::ListNeverReappeared);
}

#[test]
fn idle_pages_do_nothing() {
    init_logging();
    for page in [PageKind::List, PageKind::Chat, PageKind::Unknown] {
        let (traversal, effects) = update(Traversal::new(), Msg::PageLoaded { page });
        assert_eq!(traversal, Traversal::new());
        assert!(effects.is_empty());
    }
}

#[test]
fn stray_replies_are_ignored() {
    init_logging();
    let traversal = in_status(Status::LookingForNextJob);
    let (next, effects) = update(traversal.clone(), Msg::SendClicked { clicked: false });
    assert_eq!(next, traversal);
    assert!(effects.is_empty());
}
