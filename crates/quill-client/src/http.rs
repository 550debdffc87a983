use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use quill_types::api::{
    Credentials, Envelope, GenerateRequest, GenerationJob, OnboardingRequest, PublishRequest,
    SaveCampaignRequest, ScheduleRequest,
};
use quill_types::models::{Campaign, GeneratedContent, User};

use crate::{Backend, ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Applies to every call except content generation.
    pub timeout: Duration,
    /// Generation waits on the AI service and gets its own budget.
    pub generation_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(120),
        }
    }
}

/// HTTP implementation of [`Backend`].
///
/// Keeps the session cookie in its own cookie store, so every call carries
/// credentials after login. Every call races a timeout and a shared
/// cancellation token; a stuck backend can never hold a caller forever.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
    generation_timeout: Duration,
    cancel: CancellationToken,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .cookie_store(true)
            .connect_timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            timeout: config.timeout,
            generation_timeout: config.generation_timeout,
            cancel: CancellationToken::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Abort every in-flight and future call made through this client and
    /// its clones.
    pub fn cancel_all(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn campaign_url(&self, id: &str) -> Result<Url> {
        let mut url = self.endpoint("campaign")?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }
        Ok(url)
    }

    /// Send one request and unwrap the response envelope.
    ///
    /// The call is accepted when the envelope says `success`/`ok` explicitly,
    /// or when the status is 2xx and the envelope does not say otherwise.
    async fn send<T: DeserializeOwned>(
        &self,
        op: &'static str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<Option<T>> {
        let request_id = Uuid::new_v4();
        let request = request.header(REQUEST_ID_HEADER, request_id.to_string());
        debug!(op, %request_id, "Sending request");

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, ClientError>((status, body))
        };

        let (status, body) = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!(op, %request_id, "Request cancelled");
                return Err(ClientError::Cancelled);
            }
            outcome = tokio::time::timeout(timeout, exchange) => match outcome {
                Ok(result) => result?,
                Err(_) => {
                    warn!(op, %request_id, "Request timed out after {:?}", timeout);
                    return Err(ClientError::Timeout(timeout));
                }
            },
        };

        let envelope = read_envelope::<T>(status, &body)?;
        let accepted = envelope.is_confirmed() || (status.is_success() && !envelope.is_rejected());
        if !accepted {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("{} failed", op));
            warn!(op, %request_id, status = status.as_u16(), "Request rejected: {}", message);
            return Err(ClientError::rejected(status.as_u16(), message));
        }

        debug!(op, %request_id, status = status.as_u16(), "Request accepted");
        Ok(envelope.into_payload())
    }
}

/// Empty bodies read as an empty envelope. Unparseable error bodies (an HTML
/// error page, say) do too, so the status still decides.
fn read_envelope<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<Envelope<T>> {
    let empty = || serde_json::from_str::<Envelope<T>>("{}");

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(empty()?);
    }

    match serde_json::from_slice(body) {
        Ok(envelope) => Ok(envelope),
        Err(e) if status.is_success() => Err(e.into()),
        Err(_) => Ok(empty()?),
    }
}

impl Backend for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<User> {
        let url = self.endpoint("auth/login")?;
        self.send("login", self.http.post(url).json(credentials), self.timeout)
            .await?
            .ok_or(ClientError::MissingPayload("user"))
    }

    async fn signup(&self, credentials: &Credentials) -> Result<()> {
        let url = self.endpoint("auth/signup")?;
        self.send::<IgnoredAny>("signup", self.http.post(url).json(credentials), self.timeout)
            .await?;
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        let url = self.endpoint("auth/logout")?;
        self.send::<IgnoredAny>("logout", self.http.post(url), self.timeout)
            .await?;
        Ok(())
    }

    async fn submit_onboarding(&self, request: &OnboardingRequest) -> Result<User> {
        let url = self.endpoint("auth/onboarding")?;
        self.send("onboarding", self.http.post(url).json(request), self.timeout)
            .await?
            .ok_or(ClientError::MissingPayload("user"))
    }

    async fn fetch_profile(&self) -> Result<User> {
        let url = self.endpoint("auth/profile")?;
        self.send("profile", self.http.get(url), self.timeout)
            .await?
            .ok_or(ClientError::MissingPayload("user"))
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedContent> {
        let url = self.endpoint("content/generate")?;
        let job: GenerationJob = self
            .send("generate", self.http.post(url).json(request), self.generation_timeout)
            .await?
            .ok_or(ClientError::MissingPayload("job"))?;
        job.generated_content
            .ok_or(ClientError::MissingPayload("generatedContent"))
    }

    async fn history(&self) -> Result<Vec<Campaign>> {
        let url = self.endpoint("content/history")?;
        let campaigns: Option<Vec<Campaign>> =
            self.send("history", self.http.get(url), self.timeout).await?;
        Ok(campaigns.unwrap_or_default())
    }

    async fn schedule(&self, request: &ScheduleRequest) -> Result<()> {
        let url = self.endpoint("content/schedule")?;
        self.send::<IgnoredAny>("schedule", self.http.post(url).json(request), self.timeout)
            .await?;
        Ok(())
    }

    async fn publish(&self, request: &PublishRequest) -> Result<()> {
        let url = self.endpoint("content/publish")?;
        self.send::<IgnoredAny>("publish", self.http.post(url).json(request), self.timeout)
            .await?;
        Ok(())
    }

    async fn save_campaign(&self, request: &SaveCampaignRequest) -> Result<Campaign> {
        let url = self.endpoint("campaign")?;
        self.send("save campaign", self.http.post(url).json(request), self.timeout)
            .await?
            .ok_or(ClientError::MissingPayload("campaign"))
    }

    async fn campaign(&self, id: &str) -> Result<Option<Campaign>> {
        let url = self.campaign_url(id)?;
        match self.send("campaign", self.http.get(url), self.timeout).await {
            Ok(campaign) => Ok(campaign),
            Err(ClientError::Rejected { status: 404 | 405, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
