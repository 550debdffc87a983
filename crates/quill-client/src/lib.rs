//! REST client for the Quill backend.
//!
//! [`Backend`] is the seam the workflows are written against; [`ApiClient`]
//! is the HTTP implementation. Tests substitute their own `Backend`.

pub mod error;
pub mod http;

use std::future::Future;

use quill_types::api::{
    Credentials, GenerateRequest, OnboardingRequest, PublishRequest, SaveCampaignRequest,
    ScheduleRequest,
};
use quill_types::models::{Campaign, GeneratedContent, User};

pub use error::ClientError;
pub use http::{ApiClient, ClientConfig};

pub type Result<T> = std::result::Result<T, ClientError>;

/// Every backend endpoint the client consumes.
pub trait Backend: Send + Sync {
    fn login(&self, credentials: &Credentials) -> impl Future<Output = Result<User>> + Send;

    fn signup(&self, credentials: &Credentials) -> impl Future<Output = Result<()>> + Send;

    /// Invalidate the server-side session.
    fn logout(&self) -> impl Future<Output = Result<()>> + Send;

    fn submit_onboarding(
        &self,
        request: &OnboardingRequest,
    ) -> impl Future<Output = Result<User>> + Send;

    fn fetch_profile(&self) -> impl Future<Output = Result<User>> + Send;

    fn generate(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<GeneratedContent>> + Send;

    fn history(&self) -> impl Future<Output = Result<Vec<Campaign>>> + Send;

    fn schedule(&self, request: &ScheduleRequest) -> impl Future<Output = Result<()>> + Send;

    fn publish(&self, request: &PublishRequest) -> impl Future<Output = Result<()>> + Send;

    fn save_campaign(
        &self,
        request: &SaveCampaignRequest,
    ) -> impl Future<Output = Result<Campaign>> + Send;

    /// `Ok(None)` when the server has no such campaign or no single-item
    /// endpoint.
    fn campaign(&self, id: &str) -> impl Future<Output = Result<Option<Campaign>>> + Send;
}
