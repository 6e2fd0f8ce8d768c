use serde::{Deserialize, Serialize};

use crate::dom::{Dom, ElementPath};

/// Ordered CSS candidates; the first one that yields a usable element wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator {
    candidates: Vec<String>,
}

/// Extra conditions a text match has to meet.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFilter<'a> {
    pub visible_only: bool,
    /// Texts containing any of these fragments are skipped.
    pub reject: &'a [String],
    /// Texts longer than this many characters are skipped.
    pub max_chars: Option<usize>,
}

impl TextFilter<'_> {
    fn accepts(&self, text: &str) -> bool {
        !self.reject.iter().any(|fragment| text.contains(fragment.as_str()))
            && self
                .max_chars
                .map_or(true, |max| text.chars().count() <= max)
    }
}

impl Locator {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub async fn find(&self, dom: &dyn Dom, scope: Option<&ElementPath>) -> Option<ElementPath> {
        for css in &self.candidates {
            if dom.count(scope, css).await > 0 {
                return Some(ElementPath::under(scope, css.as_str(), 0));
            }
        }
        None
    }

    /// Every match of the first candidate that matches anything.
    pub async fn find_all(&self, dom: &dyn Dom, scope: Option<&ElementPath>) -> Vec<ElementPath> {
        for css in &self.candidates {
            let count = dom.count(scope, css).await;
            if count > 0 {
                return (0..count)
                    .map(|nth| ElementPath::under(scope, css.as_str(), nth))
                    .collect();
            }
        }
        Vec::new()
    }

    /// First non-empty text accepted by `filter`, trying every match of every
    /// candidate in order.
    pub async fn text(
        &self,
        dom: &dyn Dom,
        scope: Option<&ElementPath>,
        filter: TextFilter<'_>,
    ) -> Option<String> {
        for css in &self.candidates {
            let count = dom.count(scope, css).await;
            for nth in 0..count {
                let element = ElementPath::under(scope, css.as_str(), nth);
                if filter.visible_only && !dom.is_visible(&element).await {
                    continue;
                }
                if let Some(text) = dom.text(&element).await {
                    if filter.accepts(&text) {
                        return Some(text);
                    }
                }
            }
        }
        None
    }

    /// Clicks the first visible match. Returns whether anything was clicked.
    pub async fn click(&self, dom: &dyn Dom, scope: Option<&ElementPath>) -> bool {
        for css in &self.candidates {
            let count = dom.count(scope, css).await;
            for nth in 0..count {
                let element = ElementPath::under(scope, css.as_str(), nth);
                if dom.is_visible(&element).await && dom.click(&element).await {
                    return true;
                }
            }
        }
        false
    }
}
