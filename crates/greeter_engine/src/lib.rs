//! Greeter engine: executes traversal effects against a page and the backend.
mod api;
mod controller;
mod dom;
mod html_dom;
mod input;
mod locator;
mod notify;
mod persist;
mod profile;
mod scrape;
mod store;
mod timings;

pub use api::{
    ApiClient, ApiError, ApiSettings, GreetingService, QuotaSource, Submission,
    SubmissionTracker, DEFAULT_API_BASE_URL,
};
pub use controller::{Controller, ControllerError, ControllerParts, LoadOutcome, StartAck};
pub use dom::{Dom, ElementPath, PathStep};
pub use html_dom::{DomAction, HtmlDom};
pub use input::{InputInjector, KeystrokeInjector, READBACK_CHARS};
pub use locator::{Locator, TextFilter};
pub use notify::{AutoConfirm, Confirm, LogNotifier, Notifier};
pub use persist::{ensure_state_dir, PersistError, StateDir};
pub use profile::{ProfileError, SiteProfile};
pub use scrape::PageScraper;
pub use store::{FileFlagStore, FlagStore, MemoryFlagStore, StateStore, StoreError, AUTH_TOKEN_KEY};
pub use timings::{JitterRange, Timings};
