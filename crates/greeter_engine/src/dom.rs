use std::fmt;

use async_trait::async_trait;

/// One hop of an [`ElementPath`]: the `nth` match of `css` below the
/// previous hop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub css: String,
    pub nth: usize,
}

/// Backend-neutral handle to an element, re-resolved on every use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ElementPath {
    steps: Vec<PathStep>,
}

impl ElementPath {
    pub fn root(css: impl Into<String>, nth: usize) -> Self {
        Self {
            steps: vec![PathStep {
                css: css.into(),
                nth,
            }],
        }
    }

    /// Path below `scope`, or from the document when there is no scope.
    pub fn under(scope: Option<&ElementPath>, css: impl Into<String>, nth: usize) -> Self {
        match scope {
            Some(scope) => scope.child(css, nth),
            None => Self::root(css, nth),
        }
    }

    pub fn child(&self, css: impl Into<String>, nth: usize) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep {
            css: css.into(),
            nth,
        });
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, step) in self.steps.iter().enumerate() {
            if position > 0 {
                write!(f, " >> ")?;
            }
            write!(f, "{}[{}]", step.css, step.nth)?;
        }
        Ok(())
    }
}

/// The page the controller acts on.
///
/// Methods never fail hard: an element that cannot be resolved reads as
/// empty and rejects interaction, which is what the fallback chains expect.
#[async_trait]
pub trait Dom: Send + Sync {
    fn url(&self) -> String;

    /// Number of matches for `css`, below `scope` when given.
    async fn count(&self, scope: Option<&ElementPath>, css: &str) -> usize;

    /// Whitespace-normalised text content.
    async fn text(&self, element: &ElementPath) -> Option<String>;

    /// Trimmed, non-empty text nodes in document order.
    async fn text_lines(&self, element: &ElementPath) -> Vec<String>;

    async fn has_class(&self, element: &ElementPath, class: &str) -> bool;

    async fn is_visible(&self, element: &ElementPath) -> bool;

    async fn is_editable(&self, element: &ElementPath) -> bool;

    async fn click(&self, element: &ElementPath) -> bool;

    /// Full pointer/mouse event sequence for widgets that ignore plain clicks.
    async fn pointer_sequence(&self, element: &ElementPath) -> bool;

    async fn add_class(&self, element: &ElementPath, class: &str) -> bool;

    async fn remove_class(&self, element: &ElementPath, class: &str) -> bool;

    async fn clear_input(&self, element: &ElementPath) -> bool;

    /// Delivers one character as key and input events.
    async fn key_input(&self, element: &ElementPath, ch: char) -> bool;

    /// Current value of an input, or text of a content-editable element.
    async fn read_input(&self, element: &ElementPath) -> Option<String>;

    async fn history_back(&self);
}
