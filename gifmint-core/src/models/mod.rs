//! Domain models for gifmint.
//!
//! ## Submodules
//!
//! - [`user`] - Account types (profile, login, registration)
//! - [`plan`] - Plans, billing cycles, checkout
//! - [`subscription`] - Subscription lookup results and the derived view
//! - [`gif`] - Generation requests and history
//! - [`profile`] - The aggregated profile view

mod gif;
mod plan;
mod profile;
mod subscription;
mod user;

pub use gif::{GenerateRequest, GeneratedGif, GifRecord};
pub use plan::{CheckoutSession, Plan, PlanCycle, SubscribeRequest, format_brl};
pub use profile::{ProfileSource, ProfileView, SourceIssue};
pub use subscription::{
    RemoteSubscriptionStatus, SubscriptionDetail, SubscriptionStatus, SubscriptionView,
};
pub use user::{LoginCredentials, LoginResponse, RegisteredUser, Registration, UserProfile};
