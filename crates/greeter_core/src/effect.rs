use crate::{JobDetails, Notice, TraversalState};

/// Side effects requested by [`crate::update`].
///
/// Within one batch at most one effect expects a reply message, and it is
/// always the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Persist(TraversalState),
    ClearState,
    Notify(Notice),
    Sleep(Delay),
    CheckTab { tab: usize },
    ActivateTab { tab: usize, method: Activation },
    ScanJobList,
    ScrapeCard { index: usize },
    OpenJob { index: usize },
    ExtractDetails,
    RequestGreeting(JobDetails),
    ClickStartChat,
    ConfirmChatPopup,
    TypeGreeting(String),
    ClickSend,
    TrackSubmission {
        job: Option<JobDetails>,
        greeting: String,
    },
    ProbeListContainer,
    NavigateBack,
}

impl Effect {
    /// Effects whose outcome comes back as a [`crate::Msg`].
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            Effect::CheckTab { .. }
                | Effect::ScanJobList
                | Effect::ScrapeCard { .. }
                | Effect::OpenJob { .. }
                | Effect::ExtractDetails
                | Effect::RequestGreeting(_)
                | Effect::ClickStartChat
                | Effect::ConfirmChatPopup
                | Effect::TypeGreeting(_)
                | Effect::ClickSend
                | Effect::ProbeListContainer
        )
    }

    /// Effects after which the page may be replaced, dropping in-memory state.
    pub fn may_navigate(&self) -> bool {
        matches!(
            self,
            Effect::OpenJob { .. }
                | Effect::ClickStartChat
                | Effect::ConfirmChatPopup
                | Effect::NavigateBack
        )
    }
}

/// Named waits; durations are configured by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    ChatPageLoad,
    Navigation,
    NextJobClick,
    TabSwitch,
    PopupAppear,
    /// Grows with the attempt number.
    DetailLoad { attempt: u32 },
    ListProbe,
    AfterClick,
    BeforeSend,
}

/// Rungs of the tab activation ladder, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Click,
    PointerSequence,
    ForceMarker,
}
