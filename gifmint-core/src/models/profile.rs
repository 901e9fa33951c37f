//! The aggregated profile view.

use serde::{Deserialize, Serialize};

use super::gif::GifRecord;
use super::subscription::SubscriptionView;
use super::user::UserProfile;

/// An optional data source of the profile view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    /// The subscription lookup.
    Subscription,
    /// The generation history.
    History,
}

impl std::fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subscription => write!(f, "subscription"),
            Self::History => write!(f, "history"),
        }
    }
}

/// An optional source that failed and was substituted with a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIssue {
    /// Which source degraded.
    pub source: ProfileSource,
    /// Why it degraded.
    pub message: String,
}

/// Everything the profile page shows.
///
/// Identity is mandatory; subscription and history are best-effort and fall
/// back to [`SubscriptionView::none`] and an empty list respectively. Each
/// fallback other than the expected "no subscription" case is recorded in
/// `issues`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    /// The authenticated user.
    pub user: UserProfile,
    /// The subscription (NONE when absent or unavailable).
    pub subscription: SubscriptionView,
    /// Generated GIFs, newest first (empty when unavailable).
    pub history: Vec<GifRecord>,
    /// Optional sources that degraded.
    #[serde(default)]
    pub issues: Vec<SourceIssue>,
}

impl ProfileView {
    /// Returns true if any optional source degraded.
    pub fn is_degraded(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Returns true if the given source degraded.
    pub fn degraded(&self, source: ProfileSource) -> bool {
        self.issues.iter().any(|issue| issue.source == source)
    }
}
