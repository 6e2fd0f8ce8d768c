use serde::{Deserialize, Serialize};

use crate::Notice;

pub const MEMBER_DAILY_LIMIT: u32 = 200;
pub const NON_MEMBER_DAILY_LIMIT: u32 = 3;

/// Daily submission allowance as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub remaining_submissions: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default, alias = "isMember")]
    pub is_effectively_member: bool,
    #[serde(default)]
    pub limit_reached: bool,
}

impl QuotaStatus {
    pub fn is_exhausted(&self) -> bool {
        self.limit_reached || self.remaining_submissions == 0
    }

    /// The limit to show the user; falls back to the tier default when the
    /// backend omits it.
    pub fn effective_limit(&self) -> u32 {
        match (self.limit, self.is_effectively_member) {
            (0, true) => MEMBER_DAILY_LIMIT,
            (0, false) => NON_MEMBER_DAILY_LIMIT,
            (limit, _) => limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPlan {
    Proceed { count: u32 },
    /// More jobs were requested than the quota allows; ask before shrinking.
    ConfirmReduced { requested: u32, remaining: u32 },
    Refuse(Notice),
}

/// Decides how a start request fits the quota. An unknown quota does not
/// block the run.
pub fn plan_start(requested: u32, quota: Option<&QuotaStatus>) -> StartPlan {
    if requested == 0 {
        return StartPlan::Refuse(Notice::InvalidCount);
    }
    let Some(quota) = quota else {
        return StartPlan::Proceed { count: requested };
    };

    if quota.is_exhausted() {
        StartPlan::Refuse(Notice::QuotaExhausted {
            limit: quota.effective_limit(),
            member: quota.is_effectively_member,
        })
    } else if requested > quota.remaining_submissions {
        StartPlan::ConfirmReduced {
            requested,
            remaining: quota.remaining_submissions,
        }
    } else {
        StartPlan::Proceed { count: requested }
    }
}
