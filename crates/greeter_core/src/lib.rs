//! Pure traversal logic for the auto-greeter: state, messages, effects and the
//! update function. No IO happens here.

pub mod effect;
pub mod msg;
pub mod notice;
pub mod page;
pub mod quota;
pub mod state;
pub mod update;
pub mod view_model;

pub use effect::{Activation, Delay, Effect};
pub use msg::{DetailScrape, Msg, TabProbe};
pub use notice::{AbortReason, MissingFields, Notice};
pub use page::{resolve_page, url_hint, PageKind, UrlHint, LIST_PROBE_ATTEMPTS};
pub use quota::{
    plan_start, QuotaStatus, StartPlan, MEMBER_DAILY_LIMIT, NON_MEMBER_DAILY_LIMIT,
};
pub use state::{
    next_job_index, CardJobInfo, JobDetails, Status, TabTarget, TraversalState,
    DESCRIPTION_PLACEHOLDER, STATE_KEY,
};
pub use update::{update, Traversal, MAX_DETAIL_ATTEMPTS, POPUP_ATTEMPTS};
pub use view_model::TraversalView;
