use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown platform: {0}")]
    Platform(String),
    #[error("unknown brand tone: {0}")]
    BrandTone(String),
    #[error("unknown channel: {0}")]
    Channel(String),
    #[error("unknown theme: {0}")]
    Theme(String),
}

// -- Brand --

/// Social platforms a brand can connect during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Linkedin,
    Instagram,
    Youtube,
    Facebook,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Instagram,
        Platform::Youtube,
        Platform::Facebook,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Facebook => "facebook",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Platform::Twitter => "Twitter / X",
            Platform::Linkedin => "LinkedIn",
            Platform::Instagram => "Instagram",
            Platform::Youtube => "YouTube",
            Platform::Facebook => "Facebook",
        }
    }

    /// Hint shown next to the identifier field for this platform.
    pub fn placeholder(self) -> &'static str {
        match self {
            Platform::Twitter | Platform::Instagram => "@username",
            Platform::Linkedin => "Profile URL or ID",
            Platform::Youtube => "Channel Name",
            Platform::Facebook => "Page Name/ID",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Platform {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Platform::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(needle) || p.label().eq_ignore_ascii_case(needle))
            .or_else(|| (needle.eq_ignore_ascii_case("x")).then_some(Platform::Twitter))
            .ok_or_else(|| ParseError::Platform(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum BrandTone {
    #[default]
    Professional,
    Friendly,
    #[serde(rename = "Witty / Humorous")]
    Witty,
    #[serde(rename = "Bold / Aggressive")]
    Bold,
    #[serde(rename = "Luxury / Elegant")]
    Luxury,
    Educational,
}

impl BrandTone {
    pub const ALL: [BrandTone; 6] = [
        BrandTone::Professional,
        BrandTone::Friendly,
        BrandTone::Witty,
        BrandTone::Bold,
        BrandTone::Luxury,
        BrandTone::Educational,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BrandTone::Professional => "Professional",
            BrandTone::Friendly => "Friendly",
            BrandTone::Witty => "Witty / Humorous",
            BrandTone::Bold => "Bold / Aggressive",
            BrandTone::Luxury => "Luxury / Elegant",
            BrandTone::Educational => "Educational",
        }
    }
}

impl fmt::Display for BrandTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unknown or non-string tones read as the default rather than failing
/// the record they sit in.
impl<'de> Deserialize<'de> for BrandTone {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(raw.as_str().and_then(|s| s.parse().ok()).unwrap_or_default())
    }
}

impl FromStr for BrandTone {
    type Err = ParseError;

    /// Accepts the full label or its first word ("witty", "luxury").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        BrandTone::ALL
            .into_iter()
            .find(|t| {
                let label = t.label();
                label.eq_ignore_ascii_case(needle)
                    || label
                        .split(" / ")
                        .any(|part| part.eq_ignore_ascii_case(needle))
            })
            .ok_or_else(|| ParseError::BrandTone(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandProfile {
    pub company_name: String,
    pub industry: String,
    pub target_audience: String,
    pub brand_tone: BrandTone,
    /// One-line pitch.
    pub uvp: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub platform_ids: BTreeMap<Platform, String>,
    /// Logo as a `data:` URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_preview: Option<String>,
}

/// Wire shape of the brand fields, nested or flat. The tone stays optional
/// so a nested record without one can fall back to the flat value.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BrandRecord {
    company_name: String,
    industry: String,
    target_audience: String,
    #[serde(deserialize_with = "known_tone")]
    brand_tone: Option<BrandTone>,
    uvp: String,
    #[serde(deserialize_with = "known_platforms")]
    platforms: Vec<Platform>,
    #[serde(deserialize_with = "known_platform_ids")]
    platform_ids: BTreeMap<Platform, String>,
    logo_preview: Option<String>,
}

impl BrandRecord {
    /// Field-by-field merge: values set on `self` win, blanks fall back.
    fn or(self, fallback: BrandRecord) -> BrandRecord {
        fn pick(primary: String, fallback: String) -> String {
            if primary.trim().is_empty() { fallback } else { primary }
        }

        BrandRecord {
            company_name: pick(self.company_name, fallback.company_name),
            industry: pick(self.industry, fallback.industry),
            target_audience: pick(self.target_audience, fallback.target_audience),
            brand_tone: self.brand_tone.or(fallback.brand_tone),
            uvp: pick(self.uvp, fallback.uvp),
            platforms: if self.platforms.is_empty() { fallback.platforms } else { self.platforms },
            platform_ids: if self.platform_ids.is_empty() {
                fallback.platform_ids
            } else {
                self.platform_ids
            },
            logo_preview: self.logo_preview.or(fallback.logo_preview),
        }
    }
}

impl From<BrandRecord> for BrandProfile {
    fn from(record: BrandRecord) -> Self {
        BrandProfile {
            company_name: record.company_name,
            industry: record.industry,
            target_audience: record.target_audience,
            brand_tone: record.brand_tone.unwrap_or_default(),
            uvp: record.uvp,
            platforms: record.platforms,
            platform_ids: record.platform_ids,
            logo_preview: record.logo_preview,
        }
    }
}

// -- User --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "UserRecord")]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Avatar as a `data:` URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_website: Option<String>,
    pub is_onboarded: bool,
    pub brand_profile: BrandProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub monthly_credits: u32,
    pub credits_used: u32,
    /// Fields the backend sent that the client does not model. They are
    /// written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wire shape of a user record. The backend has sent brand fields both
/// nested under `brandProfile` and flat on the record.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserRecord {
    #[serde(alias = "_id")]
    id: Option<String>,
    email: String,
    name: Option<String>,
    job_title: Option<String>,
    bio: Option<String>,
    avatar: Option<String>,
    personal_website: Option<String>,
    is_onboarded: bool,
    brand_profile: Option<BrandRecord>,
    website: Option<String>,
    monthly_credits: u32,
    credits_used: u32,
    #[serde(flatten)]
    flat: BrandRecord,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        let brand = match record.brand_profile {
            Some(nested) => nested.or(record.flat),
            None => record.flat,
        };

        User {
            id: record.id,
            email: record.email,
            name: record.name,
            job_title: record.job_title,
            bio: record.bio,
            avatar: record.avatar,
            personal_website: record.personal_website,
            is_onboarded: record.is_onboarded,
            brand_profile: brand.into(),
            website: record.website,
            monthly_credits: record.monthly_credits,
            credits_used: record.credits_used,
            extra: record.extra,
        }
    }
}

impl User {
    /// Credits left this month. Never negative, even if the server
    /// reports more usage than allowance.
    pub fn remaining_credits(&self) -> u32 {
        self.monthly_credits.saturating_sub(self.credits_used)
    }

    /// Advisory check only; the server enforces the allowance.
    pub fn can_spend(&self, amount: u32) -> bool {
        self.remaining_credits() >= amount
    }

    pub fn initial(&self) -> char {
        self.email
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(ParseError::Theme(s.to_string())),
        }
    }
}

// -- Content --

/// Output channels produced by the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Twitter,
    Linkedin,
    Instagram,
    Blog,
    Email,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Twitter,
        Channel::Linkedin,
        Channel::Instagram,
        Channel::Blog,
        Channel::Email,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Channel::Twitter => "twitter",
            Channel::Linkedin => "linkedin",
            Channel::Instagram => "instagram",
            Channel::Blog => "blog",
            Channel::Email => "email",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Twitter => "Twitter",
            Channel::Linkedin => "LinkedIn",
            Channel::Instagram => "Instagram",
            Channel::Blog => "Blog Post",
            Channel::Email => "Email",
        }
    }
}

impl FromStr for Channel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Channel::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(needle))
            .or_else(|| needle.eq_ignore_ascii_case("insta").then_some(Channel::Instagram))
            .ok_or_else(|| ParseError::Channel(s.to_string()))
    }
}

/// Raw per-channel output as the generation service returns it. Each
/// channel has its own shape (list of posts, string, or object).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,
}

impl GeneratedContent {
    pub fn channel(&self, channel: Channel) -> Option<&Value> {
        let value = match channel {
            Channel::Twitter => self.twitter.as_ref(),
            Channel::Linkedin => self.linkedin.as_ref(),
            Channel::Instagram => self.instagram.as_ref(),
            Channel::Blog => self.blog.as_ref(),
            Channel::Email => self.email.as_ref(),
        };
        value.filter(|v| !v.is_null())
    }
}

/// Display-ready text for every channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentBundle {
    pub twitter: String,
    pub linkedin: String,
    pub instagram: String,
    pub blog: String,
    pub email: String,
}

impl ContentBundle {
    pub fn get(&self, channel: Channel) -> &str {
        match channel {
            Channel::Twitter => &self.twitter,
            Channel::Linkedin => &self.linkedin,
            Channel::Instagram => &self.instagram,
            Channel::Blog => &self.blog,
            Channel::Email => &self.email,
        }
    }

    pub fn set(&mut self, channel: Channel, text: String) {
        let slot = match channel {
            Channel::Twitter => &mut self.twitter,
            Channel::Linkedin => &mut self.linkedin,
            Channel::Instagram => &mut self.instagram,
            Channel::Blog => &mut self.blog,
            Channel::Email => &mut self.email,
        };
        *slot = text;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &str)> {
        Channel::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

// -- Campaigns --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "originalContent")]
    pub prompt: String,
    #[serde(default, alias = "generatedContent")]
    pub content: GeneratedContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "scheduledDate", skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Unknown statuses read as `None`.
    #[serde(default, deserialize_with = "known_status", skip_serializing_if = "Option::is_none")]
    pub status: Option<CampaignStatus>,
    #[serde(default, deserialize_with = "known_platforms", skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,
}

impl Campaign {
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.prompt,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_at.is_some()
    }
}

// -- Calendar --

/// Duration given to events loaded from a stored `scheduledAt`.
pub const EVENT_DURATION_MINUTES: i64 = 60;

/// A calendar time slot, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    /// Returns `None` unless `end` is after `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: start + Duration::minutes(EVENT_DURATION_MINUTES),
        }
    }
}

/// View-only projection of a scheduled campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CalendarEvent {
    pub fn new(id: impl Into<String>, title: impl Into<String>, slot: TimeSlot) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start: slot.start,
            end: slot.end,
        }
    }

    pub fn for_campaign(campaign: &Campaign) -> Option<Self> {
        let start = campaign.scheduled_at?;
        Some(Self::new(
            campaign.id.clone(),
            campaign.display_title(),
            TimeSlot::starting_at(start),
        ))
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            start: self.start,
            end: self.end,
        }
    }
}

// -- Lenient decoding --
//
// Backend records are decoded field by field. A value the client does not
// recognise reads as absent instead of failing the whole record.

fn known_tone<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BrandTone>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(|s| s.parse().ok()))
}

fn known_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<CampaignStatus>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).ok())
}

fn known_platforms<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Platform>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    let items = raw.as_array().map(Vec::as_slice).unwrap_or_default();
    Ok(items
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|s| s.parse().ok())
        .collect())
}

fn known_platform_ids<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<Platform, String>, D::Error> {
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(key, id)| match id {
            Value::String(id) => Some((key.parse().ok()?, id)),
            _ => None,
        })
        .collect())
}
