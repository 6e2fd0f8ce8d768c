use greeter_core::{Activation, CardJobInfo, DetailScrape, TabProbe};
use run_logging::{run_debug, run_info};

use crate::dom::{Dom, ElementPath};
use crate::locator::TextFilter;
use crate::profile::SiteProfile;

/// Reads and pokes the job site through the locator catalog.
#[derive(Debug, Clone)]
pub struct PageScraper<'p> {
    profile: &'p SiteProfile,
}

impl<'p> PageScraper<'p> {
    pub fn new(profile: &'p SiteProfile) -> Self {
        Self { profile }
    }

    pub async fn has_list_container(&self, dom: &dyn Dom) -> bool {
        self.profile.job_list_container.find(dom, None).await.is_some()
    }

    /// Whether the list container exists, and the cards found.
    pub async fn scan_list(&self, dom: &dyn Dom) -> (bool, Vec<ElementPath>) {
        if !self.has_list_container(dom).await {
            return (false, Vec::new());
        }
        let cards = self.profile.job_list_items.find_all(dom, None).await;
        run_debug!("Found {} job cards", cards.len());
        (true, cards)
    }

    pub async fn card_info(&self, dom: &dyn Dom, card: &ElementPath) -> CardJobInfo {
        let plain = TextFilter::default();
        let mut job_title = self
            .profile
            .card_title_link
            .text(dom, Some(card), plain)
            .await;
        if job_title.is_none() {
            job_title = self.profile.card_title.text(dom, Some(card), plain).await;
        }
        if job_title.is_none() {
            let max = self.profile.card_line_max_chars;
            job_title = dom
                .text_lines(card)
                .await
                .into_iter()
                .find(|line| line.chars().count() < max);
        }
        let company_name = self
            .profile
            .card_company
            .text(dom, Some(card), plain)
            .await;

        run_debug!(
            "Card {}: title={:?} company={:?}",
            card,
            job_title,
            company_name
        );
        CardJobInfo {
            job_title,
            company_name,
        }
    }

    /// Clicks the card's title link, or the card itself when it has none.
    pub async fn open_job(&self, dom: &dyn Dom, card: &ElementPath) -> bool {
        if self.profile.card_title_link.click(dom, Some(card)).await {
            return true;
        }
        run_debug!("No title link in {}; clicking the card", card);
        dom.click(card).await
    }

    pub async fn detail_scrape(&self, dom: &dyn Dom) -> DetailScrape {
        let visible = TextFilter {
            visible_only: true,
            ..TextFilter::default()
        };
        let container = self.profile.detail_container.find(dom, None).await;

        let mut job_description = None;
        if let Some(container) = container.as_ref() {
            job_description = self
                .profile
                .detail_description
                .text(dom, Some(container), visible)
                .await;
            if job_description.is_none() && dom.is_visible(container).await {
                job_description = dom.text(container).await;
            }
        }

        let title_filter = TextFilter {
            visible_only: true,
            reject: &self.profile.rejected_title_fragments,
            max_chars: None,
        };
        let job_title = self.profile.detail_title.text(dom, None, title_filter).await;
        let company_name = self.profile.detail_company.text(dom, None, visible).await;

        DetailScrape {
            container_found: container.is_some(),
            job_title,
            company_name,
            job_description,
        }
    }

    /// Locates custom category tab `tab`; indices past the end clamp to the
    /// last tab.
    pub async fn find_tab(&self, dom: &dyn Dom, tab: usize) -> Option<ElementPath> {
        if let Some(direct) = self.profile.tab_direct.get(tab) {
            if let Some(element) = direct.find(dom, None).await {
                return Some(element);
            }
        }
        let tabs = self.profile.tab_list.find_all(dom, None).await;
        let last = tabs.len().checked_sub(1)?;
        tabs.into_iter().nth(tab.min(last))
    }

    pub async fn probe_tab(&self, dom: &dyn Dom, tab: usize) -> TabProbe {
        let Some(element) = self.find_tab(dom, tab).await else {
            return TabProbe::Missing;
        };
        for class in &self.profile.active_tab_classes {
            if dom.has_class(&element, class).await {
                return TabProbe::Active;
            }
        }
        TabProbe::Inactive
    }

    pub async fn activate_tab(&self, dom: &dyn Dom, tab: usize, method: Activation) -> bool {
        let Some(element) = self.find_tab(dom, tab).await else {
            return false;
        };
        run_info!("Activating tab #{} via {:?}", tab + 1, method);
        match method {
            Activation::Click => dom.click(&element).await,
            Activation::PointerSequence => dom.pointer_sequence(&element).await,
            Activation::ForceMarker => {
                let marker = self.profile.forced_active_class.as_str();
                for sibling in self.profile.tab_list.find_all(dom, None).await {
                    dom.remove_class(&sibling, marker).await;
                }
                dom.add_class(&element, marker).await
            }
        }
    }
}
