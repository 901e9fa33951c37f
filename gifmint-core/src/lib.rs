// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # gifmint Core
//!
//! Domain models shared by every other gifmint crate.
//!
//! The types here mirror the JSON documents exchanged with the subscription
//! backend, plus the derived views the client assembles from them.
//!
//! ## Key Types
//!
//! ### Accounts
//! - [`UserProfile`] - Authenticated user identity
//! - [`LoginCredentials`] / [`LoginResponse`] - Credential exchange
//! - [`Registration`] / [`RegisteredUser`] - Account creation
//!
//! ### Plans & Subscriptions
//! - [`Plan`] / [`PlanCycle`] - Purchasable plans
//! - [`SubscriptionDetail`] - Raw subscription lookup result
//! - [`SubscriptionView`] - Interpreted subscription state (ACTIVE / CANCELED / NONE)
//! - [`CheckoutSession`] - Redirect to the external payment page
//!
//! ### Generation
//! - [`GenerateRequest`] / [`GeneratedGif`] - Artifact generation
//! - [`GifRecord`] - History entry
//!
//! ### Aggregates
//! - [`ProfileView`] - Identity + subscription + history, best-effort

pub mod models;

pub use models::{
    // Accounts
    LoginCredentials,
    LoginResponse,
    RegisteredUser,
    Registration,
    UserProfile,
    // Plans & subscriptions
    CheckoutSession,
    Plan,
    PlanCycle,
    RemoteSubscriptionStatus,
    SubscribeRequest,
    SubscriptionDetail,
    SubscriptionStatus,
    SubscriptionView,
    format_brl,
    // Generation
    GenerateRequest,
    GeneratedGif,
    GifRecord,
    // Aggregates
    ProfileSource,
    ProfileView,
    SourceIssue,
};
