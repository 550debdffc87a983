use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BrandTone, ContentBundle, GeneratedContent, Platform};

// -- Envelope --

/// Response envelope shared by every backend endpoint:
/// `{success|ok, data|job|user, message}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub job: Option<T>,
    #[serde(default)]
    pub user: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// The server said no, regardless of HTTP status.
    pub fn is_rejected(&self) -> bool {
        self.success == Some(false) || self.ok == Some(false)
    }

    /// The server said yes explicitly.
    pub fn is_confirmed(&self) -> bool {
        self.success == Some(true) || self.ok == Some(true)
    }

    /// The payload, taken from `data`, then `job`, then `user`.
    pub fn into_payload(self) -> Option<T> {
        self.data.or(self.job).or(self.user)
    }
}

// -- Auth --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Flat onboarding payload: brand details plus the selected platforms and
/// one identifier per selected platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    pub company_name: String,
    pub industry: String,
    pub target_audience: String,
    pub brand_tone: BrandTone,
    pub uvp: String,
    pub platforms: Vec<Platform>,
    pub platform_ids: BTreeMap<Platform, String>,
}

// -- Content --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationJob {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    pub generated_content: Option<GeneratedContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub content_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub platform: Platform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub content_id: String,
    pub platform: Platform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCampaignRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub prompt: String,
    pub content: ContentBundle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub platforms: Vec<Platform>,
}
