//! In-memory backend for workflow tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use serde_json::Value;

use quill_client::{Backend, ClientError, Result};
use quill_types::api::{
    Credentials, GenerateRequest, OnboardingRequest, PublishRequest, SaveCampaignRequest,
    ScheduleRequest,
};
use quill_types::models::{BrandProfile, Campaign, ContentBundle, GeneratedContent, User};

#[derive(Default)]
pub struct FakeState {
    pub user: User,
    pub failing: BTreeSet<&'static str>,
    /// When false, onboarding answers with `isOnboarded: false`.
    pub confirm_onboarding: bool,
    /// When false, the single-campaign endpoint always answers not found.
    pub serve_by_id: bool,
    pub generated: GeneratedContent,
    pub campaigns: Vec<Campaign>,
    pub onboarding_requests: Vec<OnboardingRequest>,
    pub schedule_requests: Vec<ScheduleRequest>,
    pub publish_requests: Vec<PublishRequest>,
    pub logout_calls: usize,
    next_id: u32,
}

pub struct FakeBackend {
    pub state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new(user: User) -> Self {
        Self {
            state: Mutex::new(FakeState {
                user,
                confirm_onboarding: true,
                serve_by_id: true,
                ..FakeState::default()
            }),
        }
    }

    pub fn fail(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.state.lock().unwrap().failing.remove(op);
    }

    pub fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    fn check(&self, op: &'static str) -> Result<std::sync::MutexGuard<'_, FakeState>> {
        let state = self.state.lock().unwrap();
        if state.failing.contains(op) {
            return Err(ClientError::rejected(503, format!("{} unavailable", op)));
        }
        Ok(state)
    }
}

pub fn user(email: &str, onboarded: bool) -> User {
    User {
        id: Some("u1".into()),
        email: email.into(),
        is_onboarded: onboarded,
        monthly_credits: 50,
        ..User::default()
    }
}

pub fn campaign(id: &str, prompt: &str) -> Campaign {
    Campaign {
        id: id.into(),
        title: None,
        prompt: prompt.into(),
        content: GeneratedContent::default(),
        image_url: None,
        created_at: None,
        scheduled_at: None,
        status: None,
        platforms: vec![],
    }
}

fn stored_content(bundle: &ContentBundle) -> GeneratedContent {
    let text = |s: &str| Some(Value::String(s.to_string()));
    GeneratedContent {
        twitter: text(&bundle.twitter),
        linkedin: text(&bundle.linkedin),
        instagram: text(&bundle.instagram),
        blog: text(&bundle.blog),
        email: text(&bundle.email),
    }
}

impl Backend for FakeBackend {
    async fn login(&self, credentials: &Credentials) -> Result<User> {
        let state = self.check("login")?;
        if credentials.email != state.user.email {
            return Err(ClientError::rejected(401, "Invalid credentials"));
        }
        Ok(state.user.clone())
    }

    async fn signup(&self, _credentials: &Credentials) -> Result<()> {
        self.check("signup")?;
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.logout_calls += 1;
        if state.failing.contains("logout") {
            return Err(ClientError::rejected(500, "logout unavailable"));
        }
        Ok(())
    }

    async fn submit_onboarding(&self, request: &OnboardingRequest) -> Result<User> {
        let mut state = self.check("onboarding")?;
        state.onboarding_requests.push(request.clone());

        let mut user = state.user.clone();
        user.is_onboarded = state.confirm_onboarding;
        user.brand_profile = BrandProfile {
            company_name: request.company_name.clone(),
            industry: request.industry.clone(),
            target_audience: request.target_audience.clone(),
            brand_tone: request.brand_tone,
            uvp: request.uvp.clone(),
            platforms: request.platforms.clone(),
            platform_ids: request.platform_ids.clone(),
            logo_preview: None,
        };
        if state.confirm_onboarding {
            state.user = user.clone();
        }
        Ok(user)
    }

    async fn fetch_profile(&self) -> Result<User> {
        let state = self.check("profile")?;
        Ok(state.user.clone())
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<GeneratedContent> {
        let state = self.check("generate")?;
        Ok(state.generated.clone())
    }

    async fn history(&self) -> Result<Vec<Campaign>> {
        let state = self.check("history")?;
        Ok(state.campaigns.clone())
    }

    async fn schedule(&self, request: &ScheduleRequest) -> Result<()> {
        let mut state = self.check("schedule")?;
        state.schedule_requests.push(request.clone());
        if let Some(campaign) = state
            .campaigns
            .iter_mut()
            .find(|c| c.id == request.content_id)
        {
            campaign.scheduled_at = Some(request.scheduled_at);
        }
        Ok(())
    }

    async fn publish(&self, request: &PublishRequest) -> Result<()> {
        let mut state = self.check("publish")?;
        state.publish_requests.push(request.clone());
        Ok(())
    }

    async fn save_campaign(&self, request: &SaveCampaignRequest) -> Result<Campaign> {
        let mut state = self.check("save")?;
        state.next_id += 1;

        let saved = Campaign {
            id: format!("c{}", state.next_id),
            title: request.title.clone(),
            prompt: request.prompt.clone(),
            content: stored_content(&request.content),
            image_url: request.image_url.clone(),
            created_at: None,
            scheduled_at: None,
            status: None,
            platforms: request.platforms.clone(),
        };
        state.campaigns.push(saved.clone());
        Ok(saved)
    }

    async fn campaign(&self, id: &str) -> Result<Option<Campaign>> {
        let state = self.check("campaign")?;
        if !state.serve_by_id {
            return Ok(None);
        }
        Ok(state.campaigns.iter().find(|c| c.id == id).cloned())
    }
}
