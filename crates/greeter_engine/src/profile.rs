//! Locator catalog for the job site.
//!
//! Every chain is ordered from the most specific selector to the loosest.
//! A RON file can override any subset of fields.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locator::Locator;

const TAB_LIST: &str =
    "#wrap > div.page-jobs-main > div.expect-and-search > div > div.c-expect-select > div.expect-list.has-add.no-part";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("could not read profile {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse profile {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub job_list_container: Locator,
    pub job_list_items: Locator,
    /// Title link inside a card; also the element clicked to open the job.
    pub card_title_link: Locator,
    /// Looser title chain tried inside the card when no link has text.
    pub card_title: Locator,
    pub card_company: Locator,
    /// Cards whose own short text lines may stand in for a missing title.
    pub card_line_max_chars: usize,
    pub detail_container: Locator,
    pub detail_title: Locator,
    pub detail_company: Locator,
    pub detail_description: Locator,
    pub rejected_title_fragments: Vec<String>,
    pub start_chat_button: Locator,
    pub continue_chat_popup: Locator,
    pub chat_input: Locator,
    pub chat_send_button: Locator,
    /// Per-index locators for the first custom category tabs.
    pub tab_direct: Vec<Locator>,
    pub tab_list: Locator,
    pub active_tab_classes: Vec<String>,
    pub forced_active_class: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            job_list_container: Locator::new([".job-list-container"]),
            job_list_items: Locator::new([
                ".job-list-container .job-card-wrap",
                ".job-list-container .card-area",
                ".job-list-container li",
                ".job-list-container > ul > div",
                ".job-recommend-result .job-list-container > ul > div",
                "ul div.card-area",
                ".job-card-wrapper",
            ]),
            card_title_link: Locator::new([
                ".job-info a",
                ".job-title",
                "a.job-name",
                "div.job-info h4 a",
                "div.job-title a",
            ]),
            card_title: Locator::new([
                ".job-name",
                ".job-card a[title]",
                "a[data-seo=\"job-name\"]",
                "a.job-title",
                "a[href*=\"job\"]",
                "h3 a",
                "h4 a",
            ]),
            card_company: Locator::new([
                ".job-card-footer a span",
                ".company-name",
                "a.company-name",
                ".job-company",
                ".job-card-right a.company-name",
                "div.company-name",
                ".job-footer .company",
                "[class*=\"company\"]",
                ".job-card-footer a",
            ]),
            card_line_max_chars: 50,
            detail_container: Locator::new([".job-detail-container", ".job-box", ".job-detail"]),
            detail_title: Locator::new([
                ".job-detail-header .title",
                ".job-detail-box .title",
                ".job-detail-container h3",
                "h3.title",
                ".job-box .job-name",
                ".job-header .title",
                ".job-detail h3",
                "h1.job-title",
                ".job-name",
                ".job-detail-container h1, .job-detail-container h2, .job-detail-container h3",
            ]),
            detail_company: Locator::new([
                ".job-detail-header .company-name",
                ".job-detail-box .company-name",
                ".job-detail-container .company-logo-wrapper + div",
                ".job-box .job-company-info",
                ".company-name",
                ".job-company",
                ".job-card-footer a span",
                "[class*=\"company\"]",
            ]),
            detail_description: Locator::new([
                ".job-sec .text",
                ".job-description .text",
                ".job-box .text",
                "p.desc",
                ".detail-content",
                ".job-detail .detail-content",
                ".detail-section .text",
            ]),
            rejected_title_fragments: vec!["职位描述".to_string()],
            start_chat_button: Locator::new([
                ".job-detail-op a.op-btn-chat",
                ".op-btn-chat",
                "a.primary.start-chat-btn",
            ]),
            continue_chat_popup: Locator::new([
                "body > div.greet-boss-dialog > div.greet-boss-container > div.greet-boss-footer > a.default-btn.sure-btn",
                ".greet-boss-dialog a.sure-btn",
            ]),
            chat_input: Locator::new(["#chat-input"]),
            chat_send_button: Locator::new([
                "#container > div > div > div.chat-conversation > div.message-controls > div > div:nth-child(2) > div.chat-op > button",
                ".chat-op button",
            ]),
            tab_direct: (1..=3)
                .map(|position| Locator::new([format!("{TAB_LIST} > a:nth-child({position})")]))
                .collect(),
            tab_list: Locator::new([
                format!("{TAB_LIST} > a.expect-item"),
                ".c-expect-select .expect-list a.expect-item".to_string(),
                ".expect-list a.expect-item".to_string(),
                ".expect-list a".to_string(),
            ]),
            active_tab_classes: vec!["cur".to_string(), "active".to_string()],
            forced_active_class: "cur".to_string(),
        }
    }
}

impl SiteProfile {
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.display().to_string(),
            source,
        })?;
        ron::from_str(&content).map_err(|err| ProfileError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_profile_keeps_defaults() {
        let profile: SiteProfile =
            ron::from_str(r##"(chat_input: ["textarea.chat", "#chat-input"])"##).unwrap();
        assert_eq!(
            profile.chat_input.candidates(),
            &["textarea.chat".to_string(), "#chat-input".to_string()]
        );
        assert_eq!(profile.job_list_container, SiteProfile::default().job_list_container);
        assert_eq!(profile.tab_direct.len(), 3);
    }
}
