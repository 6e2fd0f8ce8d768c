use crate::{CardJobInfo, PageKind, TabTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked for a new run (quota already checked).
    StartRequested {
        count: u32,
        target_tab: TabTarget,
        page: PageKind,
    },
    /// A page finished loading and was classified.
    PageLoaded { page: PageKind },
    /// Result of looking at the target category tab.
    TabChecked(TabProbe),
    /// Job list container and card count on the current page.
    JobListScanned { container_found: bool, items: usize },
    /// Card-level values for the selected job.
    CardScraped(CardJobInfo),
    /// Whether the selected card's title link was clicked.
    JobOpened { clicked: bool },
    /// Raw values read from the detail pane.
    DetailsExtracted(DetailScrape),
    /// Reply from the greeting service.
    GreetingReceived(Result<String, String>),
    StartChatClicked { clicked: bool },
    ChatPopupConfirmed { clicked: bool },
    /// Whether the typed greeting was read back from the chat box.
    GreetingTyped { verified: bool },
    SendClicked { clicked: bool },
    ListContainerProbed { present: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabProbe {
    Missing,
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailScrape {
    pub container_found: bool,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub job_description: Option<String>,
}
