//! Subscription lookup results and the derived view.
//!
//! The backend answers the subscription lookup with either a
//! [`SubscriptionDetail`] document or a 404 meaning "no active subscription".
//! [`SubscriptionView`] is the interpreted form the rest of the client uses;
//! the 404 translation itself lives next to the lookup operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::PlanCycle;

// ============================================================================
// Remote Status
// ============================================================================

/// Subscription status exactly as the backend stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RemoteSubscriptionStatus {
    /// Created, waiting for the first payment.
    #[default]
    Pending,
    /// Paid and usable.
    Active,
    /// Lapsed.
    Inactive,
    /// Cancelled.
    Canceled,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

// ============================================================================
// Subscription Detail
// ============================================================================

/// Raw subscription document returned by the lookup and cancel endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionDetail {
    /// Backend subscription ID.
    #[serde(default)]
    pub id: Option<u64>,
    /// Name of the subscribed plan.
    pub plan_name: String,
    /// Plan price in cents.
    pub plan_price: i64,
    /// Plan billing cycle.
    #[serde(default)]
    pub plan_cycle: PlanCycle,
    /// Monthly GIF allowance of the plan.
    #[serde(default)]
    pub plan_gif_limit: u32,
    /// Stored status.
    pub status: RemoteSubscriptionStatus,
    /// GIFs generated in the current billing period.
    #[serde(default)]
    pub gif_count: u32,
    /// Whether cancellation at period end was requested.
    #[serde(default)]
    pub cancellation_requested: bool,
    /// End of the paid period.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Next charge date.
    #[serde(default)]
    pub next_billing_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Subscription View
// ============================================================================

/// Interpreted subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Paid and usable.
    Active,
    /// Cancelled.
    Canceled,
    /// No subscription (or one that is not usable).
    #[default]
    None,
}

impl SubscriptionStatus {
    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Canceled => "Canceled",
            Self::None => "Inactive",
        }
    }
}

impl From<RemoteSubscriptionStatus> for SubscriptionStatus {
    fn from(status: RemoteSubscriptionStatus) -> Self {
        match status {
            RemoteSubscriptionStatus::Active => Self::Active,
            RemoteSubscriptionStatus::Canceled => Self::Canceled,
            RemoteSubscriptionStatus::Pending
            | RemoteSubscriptionStatus::Inactive
            | RemoteSubscriptionStatus::Unknown => Self::None,
        }
    }
}

/// The subscription as the client presents it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SubscriptionView {
    /// Interpreted status.
    pub status: SubscriptionStatus,
    /// Plan name, if subscribed.
    pub plan_name: Option<String>,
    /// Plan price in cents, if subscribed.
    pub plan_price: Option<i64>,
    /// Plan billing cycle, if subscribed.
    pub plan_cycle: Option<PlanCycle>,
    /// End of the paid period.
    pub end_date: Option<DateTime<Utc>>,
    /// Next charge date.
    pub next_billing_date: Option<DateTime<Utc>>,
    /// GIFs generated in the current period.
    pub gif_count: u32,
    /// GIF allowance of the plan.
    pub gif_limit: u32,
    /// Whether cancellation at period end was requested.
    pub cancellation_requested: bool,
}

impl SubscriptionView {
    /// The view for a user without a subscription.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if the subscription is usable.
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Returns how many GIFs can still be generated this period.
    pub fn remaining_gifs(&self) -> u32 {
        self.gif_limit.saturating_sub(self.gif_count)
    }

    /// Returns true if this view is for the given plan name.
    pub fn is_plan(&self, plan_name: &str) -> bool {
        self.plan_name.as_deref() == Some(plan_name)
    }
}

impl From<SubscriptionDetail> for SubscriptionView {
    fn from(detail: SubscriptionDetail) -> Self {
        Self {
            status: detail.status.into(),
            plan_name: Some(detail.plan_name),
            plan_price: Some(detail.plan_price),
            plan_cycle: Some(detail.plan_cycle),
            end_date: detail.end_date,
            next_billing_date: detail.next_billing_date,
            gif_count: detail.gif_count,
            gif_limit: detail.plan_gif_limit,
            cancellation_requested: detail.cancellation_requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(status: RemoteSubscriptionStatus) -> SubscriptionDetail {
        SubscriptionDetail {
            id: Some(7),
            plan_name: "Pro".to_string(),
            plan_price: 4990,
            plan_cycle: PlanCycle::Monthly,
            plan_gif_limit: 30,
            status,
            gif_count: 12,
            cancellation_requested: false,
            end_date: None,
            next_billing_date: None,
            created_at: None,
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SubscriptionStatus::from(RemoteSubscriptionStatus::Active),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from(RemoteSubscriptionStatus::Canceled),
            SubscriptionStatus::Canceled
        );
        assert_eq!(
            SubscriptionStatus::from(RemoteSubscriptionStatus::Pending),
            SubscriptionStatus::None
        );
        assert_eq!(
            SubscriptionStatus::from(RemoteSubscriptionStatus::Inactive),
            SubscriptionStatus::None
        );
    }

    #[test]
    fn test_view_from_detail() {
        let view = SubscriptionView::from(detail(RemoteSubscriptionStatus::Active));
        assert!(view.is_active());
        assert_eq!(view.plan_name.as_deref(), Some("Pro"));
        assert_eq!(view.gif_limit, 30);
        assert_eq!(view.remaining_gifs(), 18);
        assert!(view.is_plan("Pro"));
        assert!(!view.is_plan("Basic"));
    }

    #[test]
    fn test_none_view() {
        let view = SubscriptionView::none();
        assert_eq!(view.status, SubscriptionStatus::None);
        assert!(!view.is_active());
        assert_eq!(view.remaining_gifs(), 0);
        assert!(view.plan_name.is_none());
    }

    #[test]
    fn test_remaining_gifs_saturates() {
        let mut d = detail(RemoteSubscriptionStatus::Active);
        d.gif_count = 45;
        let view = SubscriptionView::from(d);
        assert_eq!(view.remaining_gifs(), 0);
    }
}
