use url::Url;

/// How many times a list URL is probed for its list container before the page
/// is declared unrecognised. The same budget bounds the wait for the list to
/// reappear after navigating back from a chat.
pub const LIST_PROBE_ATTEMPTS: u32 = 5;

const CHAT_URL_MARKERS: &[&str] = &["/chat/im?", "/web/geek/chat"];
const LIST_URL_MARKERS: &[&str] = &[
    "/web/geek/job-recommend",
    "/web/geek/jobs",
    "/web/geek/job-brand",
    "/c/search/joblist",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    List,
    Chat,
    Unknown,
}

/// What the URL alone says about the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlHint {
    Chat,
    List,
    Other,
}

pub fn url_hint(url: &str) -> UrlHint {
    let target = path_and_query(url);
    if CHAT_URL_MARKERS.iter().any(|marker| target.contains(marker)) {
        UrlHint::Chat
    } else if LIST_URL_MARKERS.iter().any(|marker| target.contains(marker)) {
        UrlHint::List
    } else {
        UrlHint::Other
    }
}

/// Combines the URL hint with the list-container probe.
///
/// Chat URLs win outright; everything else is a list page only when the
/// container is actually present.
pub fn resolve_page(hint: UrlHint, list_container_present: bool) -> PageKind {
    match (hint, list_container_present) {
        (UrlHint::Chat, _) => PageKind::Chat,
        (UrlHint::List | UrlHint::Other, true) => PageKind::List,
        (UrlHint::List | UrlHint::Other, false) => PageKind::Unknown,
    }
}

fn path_and_query(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(parsed) => {
            let mut target = parsed.path().to_string();
            if let Some(query) = parsed.query() {
                target.push('?');
                target.push_str(query);
            }
            target
        }
        Err(_) => url.trim().to_string(),
    }
}
