use crate::{next_job_index, CardJobInfo, Status, TabTarget, TraversalState};

/// Read-only summary of a traversal for status output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TraversalView {
    pub status: Status,
    pub processed: u32,
    pub total: u32,
    /// Card index the next lookup starts from, given a list of unknown length.
    pub next_index: Option<usize>,
    pub target_tab: TabTarget,
    pub greeting_staged: bool,
    pub card: Option<CardJobInfo>,
}

impl TraversalView {
    pub fn from_state(state: Option<&TraversalState>) -> Self {
        let Some(state) = state else {
            return Self::default();
        };

        Self {
            status: state.status,
            processed: state.processed_count,
            total: state.total_count,
            next_index: next_job_index(state.last_processed_job_index, usize::MAX),
            target_tab: state.target_tab,
            greeting_staged: state.greeting_to_send.is_some(),
            card: state.card_job_info.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status != Status::Idle
    }

    pub fn summary(&self) -> String {
        if !self.is_active() {
            return "idle".to_string();
        }
        let tab = match self.target_tab {
            TabTarget::Recommended => "recommended".to_string(),
            TabTarget::Custom(index) => format!("custom #{}", index + 1),
        };
        let mut line = format!(
            "{} ({}/{} greeted, tab {})",
            self.status.as_str(),
            self.processed,
            self.total,
            tab
        );
        if let Some(next) = self.next_index {
            line.push_str(&format!(", next card #{}", next + 1));
        }
        if self.greeting_staged {
            line.push_str(", greeting staged");
        }
        line
    }
}
