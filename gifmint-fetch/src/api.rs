//! Domain operations against the subscription backend.
//!
//! Each operation is a thin composition of a request descriptor and the
//! gateway. Errors propagate unchanged; the one exception is
//! [`GifApi::subscription_view`], the single place where a 404 from the
//! subscription lookup becomes "no subscription".

use std::sync::Arc;

use gifmint_core::{
    CheckoutSession, GenerateRequest, GeneratedGif, GifRecord, LoginCredentials, LoginResponse,
    Plan, RegisteredUser, Registration, SubscribeRequest, SubscriptionDetail, SubscriptionView,
    UserProfile,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::context::ClientContext;
use crate::credentials::CredentialStore;
use crate::error::{ApiError, ConfigError, CredentialError, SessionError};
use crate::host::http::{Gateway, RequestDescriptor};

/// Backend endpoint paths, relative to the origin.
pub mod paths {
    /// Exchange username/password for a token.
    pub const LOGIN: &str = "/users/login/";
    /// Create an account.
    pub const REGISTER: &str = "/users/register/";
    /// The authenticated user.
    pub const PROFILE: &str = "/users/profile/";
    /// Purchasable plans.
    pub const PLANS: &str = "/subscriptions/plans/";
    /// Start a checkout for a plan.
    pub const CREATE_SUBSCRIPTION: &str = "/subscriptions/create-subscription/";
    /// The caller's subscription (404 when none).
    pub const MY_SUBSCRIPTION: &str = "/subscriptions/my-subscription/";
    /// Request cancellation of the caller's subscription.
    pub const CANCEL_SUBSCRIPTION: &str = "/subscriptions/cancel-subscription/";
    /// Generate a GIF.
    pub const GENERATE: &str = "/gif/generate-image/";
    /// The caller's generated GIFs.
    pub const HISTORY: &str = "/gif/history/";
}

// ============================================================================
// GIF API
// ============================================================================

/// Typed client for every backend operation.
#[derive(Debug, Clone)]
pub struct GifApi {
    gateway: Gateway,
}

impl GifApi {
    /// Wraps an existing gateway.
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Builds a gateway from the context and wraps it.
    pub fn from_context(context: Arc<ClientContext>) -> Result<Self, ConfigError> {
        Ok(Self::new(Gateway::new(context)?))
    }

    /// Returns the underlying gateway.
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Returns the credential store the gateway reads from.
    pub fn credentials(&self) -> &CredentialStore {
        &self.gateway.context().credentials
    }

    async fn call<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> Result<T, ApiError> {
        let value = self.gateway.execute(&descriptor).await?;
        decode(value)
    }

    // ------------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------------

    /// Exchanges credentials for a session token.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, ApiError> {
        self.call(RequestDescriptor::post(paths::LOGIN).with_body(credentials)?)
            .await
    }

    /// Creates an account. Does not sign in.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<RegisteredUser, ApiError> {
        self.call(RequestDescriptor::post(paths::REGISTER).with_body(registration)?)
            .await
    }

    /// Fetches the authenticated user.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.call(RequestDescriptor::get(paths::PROFILE).authenticated())
            .await
    }

    // ------------------------------------------------------------------------
    // Plans & Subscriptions
    // ------------------------------------------------------------------------

    /// Lists purchasable plans.
    #[instrument(skip(self))]
    pub async fn list_plans(&self) -> Result<Vec<Plan>, ApiError> {
        self.call(RequestDescriptor::get(paths::PLANS)).await
    }

    /// Starts a checkout for the given plan.
    ///
    /// The subscription is not active when this returns; the user must
    /// complete payment at `payment_url` and the result is confirmed later.
    #[instrument(skip(self))]
    pub async fn create_subscription(&self, plan_id: u64) -> Result<CheckoutSession, ApiError> {
        let body = SubscribeRequest { plan_id };
        let checkout: CheckoutSession = self
            .call(
                RequestDescriptor::post(paths::CREATE_SUBSCRIPTION)
                    .authenticated()
                    .with_body(&body)?,
            )
            .await?;

        info!(plan_id, "Checkout session created");
        Ok(checkout)
    }

    /// Looks up the caller's subscription.
    ///
    /// A 404 is returned as an error; see [`Self::subscription_view`] for
    /// the interpreted form.
    #[instrument(skip(self))]
    pub async fn fetch_subscription(&self) -> Result<SubscriptionDetail, ApiError> {
        self.call(RequestDescriptor::get(paths::MY_SUBSCRIPTION).authenticated())
            .await
    }

    /// Looks up the caller's subscription, treating 404 as [`SubscriptionView::none`].
    pub async fn subscription_view(&self) -> Result<SubscriptionView, ApiError> {
        match self.fetch_subscription().await {
            Ok(detail) => Ok(SubscriptionView::from(detail)),
            Err(err) if err.is_not_found() => {
                debug!("No subscription on record");
                Ok(SubscriptionView::none())
            }
            Err(err) => Err(err),
        }
    }

    /// Requests cancellation of the caller's subscription.
    #[instrument(skip(self))]
    pub async fn cancel_subscription(&self) -> Result<SubscriptionDetail, ApiError> {
        let detail: SubscriptionDetail = self
            .call(RequestDescriptor::post(paths::CANCEL_SUBSCRIPTION).authenticated())
            .await?;

        info!(status = ?detail.status, "Subscription cancellation requested");
        Ok(detail)
    }

    // ------------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------------

    /// Generates a GIF.
    ///
    /// Quota and plan rules are enforced by the backend; a refusal arrives as
    /// a 403 with an `error` or `detail` payload.
    #[instrument(skip(self, request))]
    pub async fn generate_gif(&self, request: &GenerateRequest) -> Result<GeneratedGif, ApiError> {
        self.call(
            RequestDescriptor::post(paths::GENERATE)
                .authenticated()
                .with_body(request)?,
        )
        .await
    }

    /// Fetches the caller's generated GIFs, newest first.
    #[instrument(skip(self))]
    pub async fn fetch_history(&self) -> Result<Vec<GifRecord>, ApiError> {
        self.call(RequestDescriptor::get(paths::HISTORY).authenticated())
            .await
    }

    // ------------------------------------------------------------------------
    // Session Flows
    // ------------------------------------------------------------------------

    /// Logs in and stores the returned token.
    pub async fn sign_in(&self, credentials: &LoginCredentials) -> Result<(), SessionError> {
        let response = self.login(credentials).await?;
        self.credentials().set(response.token).await?;
        info!(username = %credentials.username, "Signed in");
        Ok(())
    }

    /// Registers, then signs in with the same username and password.
    pub async fn sign_up(&self, registration: &Registration) -> Result<RegisteredUser, SessionError> {
        let user = self.register(registration).await?;
        info!(username = %user.username, "Account created");
        self.sign_in(&registration.credentials()).await?;
        Ok(user)
    }

    /// Clears the stored credential.
    pub async fn sign_out(&self) -> Result<(), CredentialError> {
        self.credentials().clear().await?;
        info!("Signed out");
        Ok(())
    }

    /// Clears the credential if `err` means the server rejected it.
    ///
    /// Returns true if the error was an authentication failure.
    pub async fn invalidate_if_unauthorized(&self, err: &ApiError) -> bool {
        if !err.is_auth_failure() {
            return false;
        }

        warn!(status = ?err.status, "Server rejected the session credential");
        if let Err(e) = self.credentials().clear().await {
            warn!(error = %e, "Failed to clear rejected credential");
        }
        true
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "Response did not match the expected shape");
        ApiError::malformed(e)
    })
}
