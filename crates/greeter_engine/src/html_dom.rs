//! [`Dom`] over a static HTML snapshot.
//!
//! The markup never changes; interaction lands in an overlay keyed by node id
//! (class edits, typed input, an action log). The document is re-parsed per
//! call so no parsed tree is held across an await.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use ego_tree::NodeId;
use run_logging::run_debug;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::dom::{Dom, ElementPath};

/// Interactions recorded by [`HtmlDom`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomAction {
    Click(ElementPath),
    PointerSequence(ElementPath),
    AddClass(ElementPath, String),
    RemoveClass(ElementPath, String),
    ClearInput(ElementPath),
    Key(ElementPath, char),
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Click,
    Pointer,
}

#[derive(Debug, Clone)]
struct Reaction {
    trigger: Trigger,
    css: String,
    class: String,
}

#[derive(Debug, Default)]
struct Overlay {
    added: HashMap<NodeId, BTreeSet<String>>,
    removed: HashMap<NodeId, BTreeSet<String>>,
    inputs: HashMap<NodeId, String>,
    reactions: Vec<Reaction>,
    actions: Vec<DomAction>,
}

impl Overlay {
    fn has_class(&self, element: ElementRef<'_>, class: &str) -> bool {
        let id = element.id();
        if self.removed.get(&id).is_some_and(|set| set.contains(class)) {
            return false;
        }
        self.added.get(&id).is_some_and(|set| set.contains(class))
            || element.value().classes().any(|name| name == class)
    }

    fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(set) = self.removed.get_mut(&id) {
            set.remove(class);
        }
        self.added.entry(id).or_default().insert(class.to_string());
    }

    fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(set) = self.added.get_mut(&id) {
            set.remove(class);
        }
        self.removed.entry(id).or_default().insert(class.to_string());
    }

    fn react(&mut self, trigger: Trigger, element: ElementRef<'_>) {
        let matched: Vec<String> = self
            .reactions
            .iter()
            .filter(|reaction| reaction.trigger == trigger)
            .filter(|reaction| {
                parse_selector(&reaction.css).is_some_and(|selector| selector.matches(&element))
            })
            .map(|reaction| reaction.class.clone())
            .collect();
        for class in matched {
            self.add_class(element.id(), &class);
        }
    }

    fn input_value(&self, element: ElementRef<'_>) -> String {
        if let Some(value) = self.inputs.get(&element.id()) {
            return value.clone();
        }
        match element.value().name() {
            "input" | "textarea" => element
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| element.text().collect()),
            _ => element.text().collect(),
        }
    }
}

pub struct HtmlDom {
    url: String,
    markup: String,
    overlay: Mutex<Overlay>,
}

impl HtmlDom {
    pub fn new(url: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markup: markup.into(),
            overlay: Mutex::new(Overlay::default()),
        }
    }

    /// Clicking an element matching `css` adds `class` to it.
    pub fn react_on_click(self, css: impl Into<String>, class: impl Into<String>) -> Self {
        self.push_reaction(Trigger::Click, css.into(), class.into())
    }

    /// Like [`HtmlDom::react_on_click`], but only the pointer sequence works.
    pub fn react_on_pointer(self, css: impl Into<String>, class: impl Into<String>) -> Self {
        self.push_reaction(Trigger::Pointer, css.into(), class.into())
    }

    pub fn actions(&self) -> Vec<DomAction> {
        self.lock().actions.clone()
    }

    pub fn clicks(&self) -> Vec<ElementPath> {
        self.lock()
            .actions
            .iter()
            .filter_map(|action| match action {
                DomAction::Click(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn went_back(&self) -> bool {
        self.lock().actions.contains(&DomAction::Back)
    }

    fn push_reaction(self, trigger: Trigger, css: String, class: String) -> Self {
        self.lock().reactions.push(Reaction {
            trigger,
            css,
            class,
        });
        self
    }

    fn lock(&self) -> MutexGuard<'_, Overlay> {
        self.overlay.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count_matches(&self, scope: Option<&ElementPath>, css: &str) -> usize {
        let Some(selector) = parse_selector(css) else {
            return 0;
        };
        let document = Html::parse_document(&self.markup);
        match scope {
            None => document.select(&selector).count(),
            Some(scope) => resolve(&document, scope)
                .map(|element| element.select(&selector).count())
                .unwrap_or(0),
        }
    }

    fn with_element<T>(
        &self,
        path: &ElementPath,
        missing: T,
        f: impl FnOnce(ElementRef<'_>, &mut Overlay) -> T,
    ) -> T {
        let document = Html::parse_document(&self.markup);
        let mut overlay = self.lock();
        match resolve(&document, path) {
            Some(element) => f(element, &mut overlay),
            None => {
                run_debug!("Element {} not found on {}", path, self.url);
                missing
            }
        }
    }
}

#[async_trait]
impl Dom for HtmlDom {
    fn url(&self) -> String {
        self.url.clone()
    }

    async fn count(&self, scope: Option<&ElementPath>, css: &str) -> usize {
        self.count_matches(scope, css)
    }

    async fn text(&self, element: &ElementPath) -> Option<String> {
        self.with_element(element, None, |element, _| {
            let text = element.text().collect::<Vec<_>>().join(" ");
            let normalised = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!normalised.is_empty()).then_some(normalised)
        })
    }

    async fn text_lines(&self, element: &ElementPath) -> Vec<String> {
        self.with_element(element, Vec::new(), |element, _| {
            element
                .descendants()
                .filter_map(|node| match node.value() {
                    Node::Text(text) => {
                        let line = text.trim();
                        (!line.is_empty()).then(|| line.to_string())
                    }
                    _ => None,
                })
                .collect()
        })
    }

    async fn has_class(&self, element: &ElementPath, class: &str) -> bool {
        self.with_element(element, false, |element, overlay| {
            overlay.has_class(element, class)
        })
    }

    async fn is_visible(&self, element: &ElementPath) -> bool {
        self.with_element(element, false, |element, _| {
            let hidden = std::iter::once(*element)
                .chain(element.ancestors())
                .filter_map(ElementRef::wrap)
                .any(|node| {
                    let value = node.value();
                    value.attr("hidden").is_some()
                        || value.attr("style").is_some_and(|style| {
                            style
                                .chars()
                                .filter(|ch| !ch.is_whitespace())
                                .collect::<String>()
                                .contains("display:none")
                        })
                });
            !hidden
        })
    }

    async fn is_editable(&self, element: &ElementPath) -> bool {
        self.with_element(element, false, |element, _| is_editable(element))
    }

    async fn click(&self, path: &ElementPath) -> bool {
        self.with_element(path, false, |element, overlay| {
            overlay.actions.push(DomAction::Click(path.clone()));
            overlay.react(Trigger::Click, element);
            true
        })
    }

    async fn pointer_sequence(&self, path: &ElementPath) -> bool {
        self.with_element(path, false, |element, overlay| {
            overlay.actions.push(DomAction::PointerSequence(path.clone()));
            overlay.react(Trigger::Pointer, element);
            true
        })
    }

    async fn add_class(&self, path: &ElementPath, class: &str) -> bool {
        self.with_element(path, false, |element, overlay| {
            overlay
                .actions
                .push(DomAction::AddClass(path.clone(), class.to_string()));
            overlay.add_class(element.id(), class);
            true
        })
    }

    async fn remove_class(&self, path: &ElementPath, class: &str) -> bool {
        self.with_element(path, false, |element, overlay| {
            overlay
                .actions
                .push(DomAction::RemoveClass(path.clone(), class.to_string()));
            overlay.remove_class(element.id(), class);
            true
        })
    }

    async fn clear_input(&self, path: &ElementPath) -> bool {
        self.with_element(path, false, |element, overlay| {
            if !is_editable(element) {
                return false;
            }
            overlay.actions.push(DomAction::ClearInput(path.clone()));
            overlay.inputs.insert(element.id(), String::new());
            true
        })
    }

    async fn key_input(&self, path: &ElementPath, ch: char) -> bool {
        self.with_element(path, false, |element, overlay| {
            if !is_editable(element) {
                return false;
            }
            overlay.actions.push(DomAction::Key(path.clone(), ch));
            let mut value = overlay.input_value(element);
            value.push(ch);
            overlay.inputs.insert(element.id(), value);
            true
        })
    }

    async fn read_input(&self, path: &ElementPath) -> Option<String> {
        self.with_element(path, None, |element, overlay| {
            Some(overlay.input_value(element))
        })
    }

    async fn history_back(&self) {
        self.lock().actions.push(DomAction::Back);
    }
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(err) => {
            run_debug!("Ignoring invalid selector {:?}: {:?}", css, err);
            None
        }
    }
}

fn resolve<'a>(document: &'a Html, path: &ElementPath) -> Option<ElementRef<'a>> {
    let (first, rest) = path.steps().split_first()?;
    let selector = parse_selector(&first.css)?;
    let mut current = document.select(&selector).nth(first.nth)?;
    for step in rest {
        let selector = parse_selector(&step.css)?;
        current = current.select(&selector).nth(step.nth)?;
    }
    Some(current)
}

fn is_editable(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("disabled").is_some() || value.attr("readonly").is_some() {
        return false;
    }
    matches!(value.name(), "input" | "textarea")
        || value
            .attr("contenteditable")
            .is_some_and(|flag| !flag.eq_ignore_ascii_case("false"))
}
