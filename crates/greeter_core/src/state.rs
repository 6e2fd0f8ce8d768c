use serde::{Deserialize, Serialize};

/// Flag-store key holding the single traversal record.
pub const STATE_KEY: &str = "multiJobState";

/// Description used when the detail pane yields no description text.
pub const DESCRIPTION_PLACEHOLDER: &str = "[description unavailable]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Idle,
    LookingForNextJob,
    ProcessingJobIndex,
    ProcessingJobDetails,
    WaitingToSendOnChatPage,
    MessageSentGoingBack,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Idle => "IDLE",
            Status::LookingForNextJob => "LOOKING_FOR_NEXT_JOB",
            Status::ProcessingJobIndex => "PROCESSING_JOB_INDEX",
            Status::ProcessingJobDetails => "PROCESSING_JOB_DETAILS",
            Status::WaitingToSendOnChatPage => "WAITING_TO_SEND_ON_CHAT_PAGE",
            Status::MessageSentGoingBack => "MESSAGE_SENT_GOING_BACK",
        }
    }
}

/// Category tab the traversal operates in. Stored as its wire index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum TabTarget {
    /// The default "recommended" tab; no switching is attempted.
    #[default]
    Recommended,
    /// Zero-based index into the user's custom category tabs.
    Custom(usize),
}

impl TabTarget {
    /// Maps the wire convention (`-1` = recommended) onto a target.
    pub fn from_index(index: i32) -> Self {
        usize::try_from(index)
            .map(TabTarget::Custom)
            .unwrap_or(TabTarget::Recommended)
    }

    pub fn as_index(self) -> i32 {
        match self {
            TabTarget::Recommended => -1,
            TabTarget::Custom(index) => i32::try_from(index).unwrap_or(i32::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
}

impl From<i32> for TabTarget {
    fn from(index: i32) -> Self {
        TabTarget::from_index(index)
    }
}

impl From<TabTarget> for i32 {
    fn from(target: TabTarget) -> Self {
        target.as_index()
    }
}

/// Values scraped from a list card before the detail pane is opened.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardJobInfo {
    pub job_title: Option<String>,
    pub company_name: Option<String>,
}

impl CardJobInfo {
    pub fn is_empty(&self) -> bool {
        self.job_title.is_none() && self.company_name.is_none()
    }
}

/// The one record that survives page navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalState {
    pub status: Status,
    pub total_count: u32,
    pub processed_count: u32,
    #[serde(with = "job_index")]
    pub current_job_index: Option<usize>,
    #[serde(with = "job_index")]
    pub last_processed_job_index: Option<usize>,
    #[serde(rename = "targetTabIndex")]
    pub target_tab: TabTarget,
    pub greeting_to_send: Option<String>,
    pub current_processing_job_details: Option<JobDetails>,
    pub card_job_info: Option<CardJobInfo>,
}

impl TraversalState {
    /// Fresh record for a new run; counters start at zero.
    pub fn begin(total_count: u32, target_tab: TabTarget) -> Self {
        Self {
            status: Status::LookingForNextJob,
            total_count,
            processed_count: 0,
            current_job_index: None,
            last_processed_job_index: None,
            target_tab,
            greeting_to_send: None,
            current_processing_job_details: None,
            card_job_info: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed_count >= self.total_count
    }

    pub fn remaining(&self) -> u32 {
        self.total_count.saturating_sub(self.processed_count)
    }
}

/// Card indices are stored as plain integers, `-1` meaning none.
mod job_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(index: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match index.and_then(|index| i64::try_from(index).ok()) {
            Some(index) => serializer.serialize_i64(index),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Ok(usize::try_from(raw).ok())
    }
}

/// Index of the job to open next in a list of `len` cards.
///
/// Walks forward from the last opened card and wraps around; `None` when the
/// list is empty.
pub fn next_job_index(last_processed: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match last_processed {
        None => 0,
        Some(last) => last.wrapping_add(1) % len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_index_starts_at_zero_and_wraps() {
        assert_eq!(next_job_index(None, 5), Some(0));
        assert_eq!(next_job_index(Some(0), 5), Some(1));
        assert_eq!(next_job_index(Some(4), 5), Some(0));
        assert_eq!(next_job_index(Some(9), 3), Some(1));
        assert_eq!(next_job_index(Some(2), 0), None);
    }

    #[test]
    fn stored_record_uses_integer_indices() {
        let mut state = TraversalState::begin(3, TabTarget::Recommended);
        state.last_processed_job_index = Some(2);

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["targetTabIndex"], -1);
        assert_eq!(value["currentJobIndex"], -1);
        assert_eq!(value["lastProcessedJobIndex"], 2);
        assert_eq!(value["status"], "LOOKING_FOR_NEXT_JOB");

        let custom: TraversalState = serde_json::from_value(serde_json::json!({
            "status": "PROCESSING_JOB_INDEX",
            "totalCount": 3,
            "processedCount": 1,
            "currentJobIndex": 4,
            "lastProcessedJobIndex": -1,
            "targetTabIndex": 1,
            "greetingToSend": null,
            "currentProcessingJobDetails": null,
            "cardJobInfo": null
        }))
        .unwrap();
        assert_eq!(custom.target_tab, TabTarget::Custom(1));
        assert_eq!(custom.current_job_index, Some(4));
        assert_eq!(custom.last_processed_job_index, None);
    }

    #[test]
    fn tab_target_uses_negative_index_for_recommended() {
        assert_eq!(TabTarget::from_index(-1), TabTarget::Recommended);
        assert_eq!(TabTarget::from_index(2), TabTarget::Custom(2));
        assert_eq!(TabTarget::Custom(0).as_index(), 0);
        assert_eq!(TabTarget::Recommended.as_index(), -1);
    }
}
