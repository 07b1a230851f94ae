//! Quota policy and per-user usage counters.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Tier;

/// Default monthly generation limit for the free tier.
pub const DEFAULT_FREE_MONTHLY_LIMIT: u32 = 10;

/// Tier limit configuration.
///
/// Paid-tier metering is owned by the billing system; at this layer it is
/// unmetered unless a limit is configured explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuotaPolicy {
    /// Monthly generation limit for the free tier.
    pub free_monthly_limit: u32,
    /// Monthly limit for the paid tier. `None` means unmetered here.
    pub paid_monthly_limit: Option<u32>,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            free_monthly_limit: DEFAULT_FREE_MONTHLY_LIMIT,
            paid_monthly_limit: None,
        }
    }
}

impl QuotaPolicy {
    /// Get the limit for a tier, if it is metered at this layer.
    pub fn limit_for(&self, tier: Tier) -> Option<u32> {
        match tier {
            Tier::Free => Some(self.free_monthly_limit),
            Tier::Paid => self.paid_monthly_limit,
        }
    }
}

/// Per-user consumption counters for the current billing period.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserQuota {
    /// User ID
    pub user_id: String,
    /// Free-tier generations used this period
    pub free_used: u32,
    /// Paid-tier generations used this period
    pub paid_used: u32,
    /// When the counters reset (first of next month, UTC)
    pub reset_date: DateTime<Utc>,
}

impl UserQuota {
    /// Create a fresh quota record for a user.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            free_used: 0,
            paid_used: 0,
            reset_date: first_of_next_month(Utc::now()),
        }
    }

    /// Get the used counter for a tier.
    pub fn used(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Free => self.free_used,
            Tier::Paid => self.paid_used,
        }
    }

    /// Increment the counter for a tier.
    pub fn increment(&mut self, tier: Tier) {
        match tier {
            Tier::Free => self.free_used += 1,
            Tier::Paid => self.paid_used += 1,
        }
    }

    /// Decrement the counter for a tier, saturating at zero.
    pub fn decrement(&mut self, tier: Tier) {
        match tier {
            Tier::Free => self.free_used = self.free_used.saturating_sub(1),
            Tier::Paid => self.paid_used = self.paid_used.saturating_sub(1),
        }
    }

    /// Reset counters if the billing period has rolled over.
    ///
    /// Returns true if a reset happened. Checked lazily on every quota
    /// access rather than by a background scheduler.
    pub fn maybe_reset(&mut self, now: DateTime<Utc>) -> bool {
        if now < self.reset_date {
            return false;
        }
        self.free_used = 0;
        self.paid_used = 0;
        self.reset_date = first_of_next_month(now);
        true
    }
}

/// First instant of the month following `now`, UTC.
pub fn first_of_next_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
