use async_trait::async_trait;
use run_logging::{run_debug, run_warn};

use crate::dom::{Dom, ElementPath};
use crate::timings::JitterRange;

/// Characters of the greeting that must be read back from the input box.
pub const READBACK_CHARS: usize = 10;

/// Delivers text so that the page's own bindings observe it.
#[async_trait]
pub trait InputInjector: Send + Sync {
    /// Returns `true` only if the text is verifiably in `target`.
    async fn deliver(&self, dom: &dyn Dom, target: &ElementPath, text: &str) -> bool;
}

/// Types one character at a time with a short random pause between keys.
#[derive(Debug, Clone)]
pub struct KeystrokeInjector {
    pause: JitterRange,
}

impl KeystrokeInjector {
    pub fn new(pause: JitterRange) -> Self {
        Self { pause }
    }
}

#[async_trait]
impl InputInjector for KeystrokeInjector {
    async fn deliver(&self, dom: &dyn Dom, target: &ElementPath, text: &str) -> bool {
        if !dom.is_editable(target).await {
            run_warn!("Chat input {} is not editable", target);
            return false;
        }
        if !dom.clear_input(target).await {
            return false;
        }

        for ch in text.chars() {
            if !dom.key_input(target, ch).await {
                run_warn!("Key input rejected by {}", target);
                return false;
            }
            let pause = self.pause.sample();
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        let expected: String = text.chars().take(READBACK_CHARS).collect();
        let actual = dom.read_input(target).await.unwrap_or_default();
        let verified = actual.contains(&expected);
        run_debug!(
            "Typed {} chars into {}; readback verified: {}",
            text.chars().count(),
            target,
            verified
        );
        verified
    }
}
