use std::time::Duration;

use greeter_core::Delay;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive millisecond range a random pause is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitterRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl JitterRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn sample(&self) -> Duration {
        let (low, high) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        if low == high {
            return Duration::from_millis(low);
        }
        Duration::from_millis(rand::thread_rng().gen_range(low..=high))
    }
}

/// Waits used in place of "the page has finished rendering" signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub chat_page_load_ms: u64,
    pub navigation_ms: u64,
    pub next_job_click_ms: u64,
    pub tab_switch_ms: u64,
    pub popup_appear_ms: u64,
    /// Multiplied by the attempt number.
    pub detail_load_ms: u64,
    pub list_probe_ms: u64,
    pub after_click: JitterRange,
    pub before_send: JitterRange,
    pub keystroke: JitterRange,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            chat_page_load_ms: 1500,
            navigation_ms: 1200,
            next_job_click_ms: 500,
            tab_switch_ms: 1000,
            popup_appear_ms: 1500,
            detail_load_ms: 1200,
            list_probe_ms: 300,
            after_click: JitterRange::new(25, 125),
            before_send: JitterRange::new(200, 400),
            keystroke: JitterRange::new(2, 8),
        }
    }
}

impl Timings {
    /// No waiting at all.
    pub fn immediate() -> Self {
        let none = JitterRange::new(0, 0);
        Self {
            chat_page_load_ms: 0,
            navigation_ms: 0,
            next_job_click_ms: 0,
            tab_switch_ms: 0,
            popup_appear_ms: 0,
            detail_load_ms: 0,
            list_probe_ms: 0,
            after_click: none,
            before_send: none,
            keystroke: none,
        }
    }

    pub fn duration(&self, delay: Delay) -> Duration {
        match delay {
            Delay::ChatPageLoad => Duration::from_millis(self.chat_page_load_ms),
            Delay::Navigation => Duration::from_millis(self.navigation_ms),
            Delay::NextJobClick => Duration::from_millis(self.next_job_click_ms),
            Delay::TabSwitch => Duration::from_millis(self.tab_switch_ms),
            Delay::PopupAppear => Duration::from_millis(self.popup_appear_ms),
            Delay::DetailLoad { attempt } => {
                Duration::from_millis(self.detail_load_ms.saturating_mul(u64::from(attempt.max(1))))
            }
            Delay::ListProbe => Duration::from_millis(self.list_probe_ms),
            Delay::AfterClick => self.after_click.sample(),
            Delay::BeforeSend => self.before_send.sample(),
        }
    }
}
