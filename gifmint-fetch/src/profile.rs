//! Best-effort assembly of the profile view.
//!
//! Identity, subscription, and history are fetched concurrently. Identity is
//! mandatory: if it fails the whole view fails and the caller should treat
//! the user as signed out. The other two degrade to a fallback and record a
//! [`SourceIssue`].

use async_trait::async_trait;
use gifmint_core::{
    GifRecord, ProfileSource, ProfileView, SourceIssue, SubscriptionView, UserProfile,
};
use tracing::{debug, instrument, warn};

use crate::api::GifApi;
use crate::error::{ApiError, ProfileError};

// ============================================================================
// Profile Data Source
// ============================================================================

/// The three lookups the profile view is built from.
#[async_trait]
pub trait ProfileDataSource: Send + Sync {
    /// The authenticated user.
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError>;

    /// The subscription, with "no subscription" already mapped to NONE.
    async fn subscription_view(&self) -> Result<SubscriptionView, ApiError>;

    /// The generation history.
    async fn fetch_history(&self) -> Result<Vec<GifRecord>, ApiError>;
}

#[async_trait]
impl ProfileDataSource for GifApi {
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        GifApi::fetch_profile(self).await
    }

    async fn subscription_view(&self) -> Result<SubscriptionView, ApiError> {
        GifApi::subscription_view(self).await
    }

    async fn fetch_history(&self) -> Result<Vec<GifRecord>, ApiError> {
        GifApi::fetch_history(self).await
    }
}

// ============================================================================
// Profile Assembler
// ============================================================================

/// Builds a [`ProfileView`] from a [`ProfileDataSource`].
#[derive(Debug, Clone)]
pub struct ProfileAssembler<S> {
    source: S,
}

impl<S: ProfileDataSource> ProfileAssembler<S> {
    /// Creates an assembler over the given source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches everything and assembles the view.
    ///
    /// Never partially fails on the optional sources: subscription errors
    /// yield NONE and history errors yield an empty list.
    #[instrument(skip(self))]
    pub async fn assemble_profile_view(&self) -> Result<ProfileView, ProfileError> {
        let (identity, subscription, history) = futures::join!(
            self.source.fetch_profile(),
            self.source.subscription_view(),
            self.source.fetch_history(),
        );

        let user = identity.map_err(|e| {
            warn!(error = %e, "Identity lookup failed");
            ProfileError::Unauthenticated(e)
        })?;

        let mut issues = Vec::new();

        let subscription = subscription.unwrap_or_else(|e| {
            warn!(error = %e, "Subscription lookup failed, showing no subscription");
            issues.push(SourceIssue {
                source: ProfileSource::Subscription,
                message: e.user_message(),
            });
            SubscriptionView::none()
        });

        let history = history.unwrap_or_else(|e| {
            warn!(error = %e, "History lookup failed, showing empty history");
            issues.push(SourceIssue {
                source: ProfileSource::History,
                message: e.user_message(),
            });
            Vec::new()
        });

        debug!(
            user_id = user.id,
            status = ?subscription.status,
            history = history.len(),
            degraded = !issues.is_empty(),
            "Profile view assembled"
        );

        Ok(ProfileView {
            user,
            subscription,
            history,
            issues,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use gifmint_core::SubscriptionStatus;

    struct FakeSource {
        profile: Result<UserProfile, ApiError>,
        subscription: Result<SubscriptionView, ApiError>,
        history: Result<Vec<GifRecord>, ApiError>,
        delay: Duration,
    }

    impl FakeSource {
        fn healthy() -> Self {
            Self {
                profile: Ok(user()),
                subscription: Ok(active_view()),
                history: Ok(vec![record()]),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl ProfileDataSource for FakeSource {
        async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
            tokio::time::sleep(self.delay).await;
            self.profile.clone()
        }

        async fn subscription_view(&self) -> Result<SubscriptionView, ApiError> {
            tokio::time::sleep(self.delay).await;
            self.subscription.clone()
        }

        async fn fetch_history(&self) -> Result<Vec<GifRecord>, ApiError> {
            tokio::time::sleep(self.delay).await;
            self.history.clone()
        }
    }

    fn user() -> UserProfile {
        serde_json::from_value(serde_json::json!({"id": 7, "username": "maria"})).unwrap()
    }

    fn active_view() -> SubscriptionView {
        SubscriptionView {
            status: SubscriptionStatus::Active,
            plan_name: Some("Mensal".to_string()),
            ..SubscriptionView::none()
        }
    }

    fn record() -> GifRecord {
        GifRecord {
            id: 1,
            prompt: "gato".to_string(),
            overlay_text: None,
            gif_url: Some("http://x/1.gif".to_string()),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_all_sources_healthy() {
        let view = ProfileAssembler::new(FakeSource::healthy())
            .assemble_profile_view()
            .await
            .unwrap();

        assert_eq!(view.user.id, 7);
        assert!(view.subscription.is_active());
        assert_eq!(view.history.len(), 1);
        assert!(!view.is_degraded());
    }

    #[tokio::test]
    async fn test_identity_failure_is_unauthenticated() {
        let source = FakeSource {
            profile: Err(ApiError::http(401, None)),
            ..FakeSource::healthy()
        };

        let result = ProfileAssembler::new(source).assemble_profile_view().await;
        let Err(ProfileError::Unauthenticated(err)) = result else {
            panic!("expected Unauthenticated");
        };
        assert_eq!(err.status, Some(401));
    }

    #[tokio::test]
    async fn test_network_identity_failure_is_unauthenticated() {
        let source = FakeSource {
            profile: Err(ApiError::network("connection refused")),
            ..FakeSource::healthy()
        };

        let result = ProfileAssembler::new(source).assemble_profile_view().await;
        assert!(matches!(result, Err(ProfileError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_subscription_failure_degrades_to_none() {
        let source = FakeSource {
            subscription: Err(ApiError::http(500, None)),
            ..FakeSource::healthy()
        };

        let view = ProfileAssembler::new(source)
            .assemble_profile_view()
            .await
            .unwrap();

        assert_eq!(view.subscription, SubscriptionView::none());
        assert!(view.degraded(ProfileSource::Subscription));
        assert!(!view.degraded(ProfileSource::History));
        assert_eq!(view.history.len(), 1);
    }

    #[tokio::test]
    async fn test_history_failure_degrades_to_empty() {
        let source = FakeSource {
            history: Err(ApiError::network("timed out")),
            ..FakeSource::healthy()
        };

        let view = ProfileAssembler::new(source)
            .assemble_profile_view()
            .await
            .unwrap();

        assert!(view.history.is_empty());
        assert!(view.degraded(ProfileSource::History));
        assert!(view.subscription.is_active());
    }

    #[tokio::test]
    async fn test_both_optional_sources_fail() {
        let source = FakeSource {
            subscription: Err(ApiError::http(502, None)),
            history: Err(ApiError::http(502, None)),
            ..FakeSource::healthy()
        };

        let view = ProfileAssembler::new(source)
            .assemble_profile_view()
            .await
            .unwrap();

        assert_eq!(view.issues.len(), 2);
        assert_eq!(view.user.username, "maria");
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookups_run_concurrently() {
        let source = FakeSource {
            delay: Duration::from_secs(2),
            ..FakeSource::healthy()
        };

        let start = tokio::time::Instant::now();
        ProfileAssembler::new(source)
            .assemble_profile_view()
            .await
            .unwrap();

        // Sequential would take 6s.
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_idempotent() {
        let assembler = ProfileAssembler::new(FakeSource::healthy());
        let first = assembler.assemble_profile_view().await.unwrap();
        let second = assembler.assemble_profile_view().await.unwrap();
        assert_eq!(first, second);
    }
}
