use std::fmt;

use crate::{PageKind, Status};

/// Required job fields that could not be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingFields {
    pub job_title: bool,
    pub company_name: bool,
}

impl MissingFields {
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(2);
        if self.job_title {
            names.push("job title");
        }
        if self.company_name {
            names.push("company name");
        }
        names
    }
}

impl fmt::Display for MissingFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(", "))
    }
}

/// Why a run was stopped. Every variant ends with the persisted state deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    NoListContainer,
    NoJobItems,
    JobNotClickable { index: usize },
    MissingFields(MissingFields),
    GreetingFailed(String),
    StartChatMissing,
    ChatPopupMissing,
    NoStagedGreeting,
    InputNotApplied,
    SendFailed,
    ListNeverReappeared,
    UnrecognizedPage { status: Status },
    UnexpectedState { page: PageKind, status: Status },
    CorruptState,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::NoListContainer => write!(f, "job list container not found"),
            AbortReason::NoJobItems => write!(f, "no job cards found on this page"),
            AbortReason::JobNotClickable { index } => {
                write!(f, "could not open job card #{index}")
            }
            AbortReason::MissingFields(missing) => write!(
                f,
                "could not extract required job fields after retrying: {missing}"
            ),
            AbortReason::GreetingFailed(reason) => {
                write!(f, "greeting generation failed: {reason}")
            }
            AbortReason::StartChatMissing => write!(f, "'start chat' button not found"),
            AbortReason::ChatPopupMissing => {
                write!(f, "'continue chat' button in the popup not found")
            }
            AbortReason::NoStagedGreeting => {
                write!(f, "chat page reached without a staged greeting")
            }
            AbortReason::InputNotApplied => write!(
                f,
                "greeting could not be typed into the chat box; please send it manually"
            ),
            AbortReason::SendFailed => write!(
                f,
                "greeting was typed but the send button could not be clicked; please send it manually"
            ),
            AbortReason::ListNeverReappeared => {
                write!(f, "job list did not reappear after returning from the chat")
            }
            AbortReason::UnrecognizedPage { status } => write!(
                f,
                "page not recognised while a run was active ({})",
                status.as_str()
            ),
            AbortReason::UnexpectedState { page, status } => write!(
                f,
                "unexpected state {} on {:?} page",
                status.as_str(),
                page
            ),
            AbortReason::CorruptState => write!(f, "stored run state was unreadable"),
        }
    }
}

/// User-visible messages raised by the traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Completed { processed: u32 },
    Aborted(AbortReason),
    TabNotActivated { tab: usize },
    InvalidCount,
    NotOnListPage,
    QuotaExhausted { limit: u32, member: bool },
}

impl Notice {
    /// Warnings leave the run going; everything else is terminal for the run
    /// or for the start command.
    pub fn is_warning(&self) -> bool {
        matches!(self, Notice::TabNotActivated { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Completed { processed } => {
                write!(f, "Done: greeted {processed} job(s).")
            }
            Notice::Aborted(reason) => write!(f, "Run stopped: {reason}."),
            Notice::TabNotActivated { tab } => write!(
                f,
                "Could not switch to category tab #{}; continuing on the current tab.",
                tab + 1
            ),
            Notice::InvalidCount => write!(f, "Enter a job count of at least 1."),
            Notice::NotOnListPage => write!(f, "Open a job list page before starting."),
            Notice::QuotaExhausted { limit, member } => {
                if *member {
                    write!(f, "Today's submissions are used up ({limit} per day for members).")
                } else {
                    write!(
                        f,
                        "Today's submissions are used up ({limit} per day); members get more."
                    )
                }
            }
        }
    }
}
