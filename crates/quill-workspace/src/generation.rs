use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use quill_client::{Backend, ClientError};
use quill_session::Session;
use quill_types::api::{GenerateRequest, SaveCampaignRequest};
use quill_types::models::{Campaign, Channel, ContentBundle, GeneratedContent, Platform};

pub const FALLBACK_TEXT: &str = "No content generated";
pub const DEMO_DELAY: Duration = Duration::from_millis(1500);

const PLACEHOLDER_IMAGE_BASE: &str = "https://loremflickr.com/1080/1080/";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Enter a topic!")]
    EmptyPrompt,

    #[error("a generation is already running")]
    Busy,

    #[error("nothing has been generated yet")]
    NothingToSave,

    #[error("demo content cannot be saved")]
    DemoNotSavable,

    #[error(transparent)]
    Client(#[from] ClientError),
}

// -- Normalization --

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Display text for one channel. Each channel has its own raw shape; see
/// the match arms. Missing, null and empty values read as [`FALLBACK_TEXT`].
pub fn normalize(channel: Channel, raw: Option<&Value>) -> String {
    let value = match raw {
        None | Some(Value::Null) => return FALLBACK_TEXT.to_string(),
        Some(Value::String(s)) if s.is_empty() => return FALLBACK_TEXT.to_string(),
        Some(Value::String(s)) => return s.clone(),
        Some(value) => value,
    };

    match (channel, value) {
        (Channel::Twitter, Value::Array(posts)) => posts
            .first()
            .and_then(|post| field(post, "text"))
            .unwrap_or("No tweet text")
            .to_string(),
        (Channel::Twitter, Value::Object(_)) => {
            field(value, "text").map_or_else(|| value.to_string(), str::to_string)
        }
        (Channel::Instagram, Value::Object(_) | Value::Array(_)) => field(value, "caption")
            .unwrap_or("No caption generated")
            .to_string(),
        (Channel::Linkedin | Channel::Blog, Value::Object(_) | Value::Array(_)) => {
            let title = field(value, "title").map_or_else(|| "BLOG POST".to_string(), str::to_uppercase);
            let description = field(value, "description").unwrap_or_default();
            let body = field(value, "content")
                .or_else(|| field(value, "body"))
                .unwrap_or_default();
            format!("{}\n\n{}\n\n{}", title, description, body)
        }
        (Channel::Email, Value::Object(_) | Value::Array(_)) => format!(
            "SUBJECT: {}\n\n{}",
            field(value, "subject").unwrap_or("No Subject"),
            field(value, "body").unwrap_or_default()
        ),
        (_, other) => text_of(other),
    }
}

pub fn normalize_all(content: &GeneratedContent) -> ContentBundle {
    let mut bundle = ContentBundle::default();
    for channel in Channel::ALL {
        bundle.set(channel, normalize(channel, content.channel(channel)));
    }
    bundle
}

/// Image from the first tweet, else a keyword placeholder.
pub fn select_image(content: &GeneratedContent, prompt: &str, now: DateTime<Utc>) -> String {
    let from_tweet = content
        .channel(Channel::Twitter)
        .and_then(|twitter| twitter.get(0))
        .and_then(|post| field(post, "image_url").or_else(|| field(post, "imageUrl")));

    match from_tweet {
        Some(url) => url.to_string(),
        None => placeholder_image(prompt, Some(now.timestamp_millis())),
    }
}

/// `https://loremflickr.com/1080/1080/<first word>[?random=<nonce>]`.
pub fn placeholder_image(prompt: &str, nonce: Option<i64>) -> String {
    let keyword = prompt.split_whitespace().next().unwrap_or("marketing");
    let Ok(mut url) = Url::parse(PLACEHOLDER_IMAGE_BASE) else {
        return PLACEHOLDER_IMAGE_BASE.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(keyword);
    }
    if let Some(nonce) = nonce {
        url.query_pairs_mut().append_pair("random", &nonce.to_string());
    }
    url.into()
}

fn demo_bundle() -> ContentBundle {
    ContentBundle {
        twitter: "🚀 Launching our new eco-friendly bottle! #Sustainability".into(),
        linkedin: "We're proud to share our next step towards sustainable packaging.".into(),
        instagram: "Excited to share our journey towards sustainability. 🌿 #EcoFriendly".into(),
        blog: "TITLE: The Future of Packaging\n\nIntro: Sustainability is key...".into(),
        email: "SUBJECT: Big News!\n\nHi Team, we are launching...".into(),
    }
}

// -- Workflow --

/// Result panel contents. A demo preview is sample copy shown after a
/// failed generation and is never saved.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Generated { bundle: ContentBundle, image_url: String },
    Demo { bundle: ContentBundle, image_url: String },
}

impl Preview {
    pub fn bundle(&self) -> &ContentBundle {
        match self {
            Preview::Generated { bundle, .. } | Preview::Demo { bundle, .. } => bundle,
        }
    }

    pub fn image_url(&self) -> &str {
        match self {
            Preview::Generated { image_url, .. } | Preview::Demo { image_url, .. } => image_url,
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, Preview::Demo { .. })
    }

    fn bundle_mut(&mut self) -> &mut ContentBundle {
        match self {
            Preview::Generated { bundle, .. } | Preview::Demo { bundle, .. } => bundle,
        }
    }
}

/// Proof that a generation was started. Handed back to
/// [`GenerationWorkflow::finish`].
#[derive(Debug)]
pub struct GenerationTicket {
    prompt: String,
}

impl GenerationTicket {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

#[derive(Debug)]
pub struct GenerationWorkflow {
    prompt: String,
    generated_for: String,
    busy: bool,
    preview: Option<Preview>,
    demo_fallback: bool,
    demo_delay: Duration,
}

impl GenerationWorkflow {
    pub fn new(demo_fallback: bool) -> Self {
        Self {
            prompt: String::new(),
            generated_for: String::new(),
            busy: false,
            preview: None,
            demo_fallback,
            demo_delay: DEMO_DELAY,
        }
    }

    pub fn with_demo_delay(mut self, delay: Duration) -> Self {
        self.demo_delay = delay;
        self
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Start a generation. Refused while one is in flight or when the
    /// prompt is blank. Clears the previous result.
    pub fn begin(&mut self) -> Result<GenerationTicket, GenerationError> {
        if self.busy {
            return Err(GenerationError::Busy);
        }
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let ticket = GenerationTicket {
            prompt: prompt.to_string(),
        };
        self.busy = true;
        self.preview = None;
        self.generated_for = ticket.prompt.clone();
        Ok(ticket)
    }

    /// Apply the outcome of a generation. A success replaces the preview
    /// entirely. A failure is returned as an error; with demo fallback on,
    /// the preview becomes a demo first.
    pub fn finish(
        &mut self,
        ticket: GenerationTicket,
        result: Result<GeneratedContent, ClientError>,
        now: DateTime<Utc>,
    ) -> Result<&Preview, GenerationError> {
        self.busy = false;

        match result {
            Ok(content) => {
                let preview = self.preview.insert(Preview::Generated {
                    bundle: normalize_all(&content),
                    image_url: select_image(&content, &ticket.prompt, now),
                });
                info!("Generated content for \"{}\"", ticket.prompt);
                Ok(&*preview)
            }
            Err(e) => {
                warn!("Generation failed: {}", e);
                if self.demo_fallback {
                    self.preview = Some(Preview::Demo {
                        bundle: demo_bundle(),
                        image_url: placeholder_image(&ticket.prompt, None),
                    });
                }
                Err(e.into())
            }
        }
    }

    pub async fn generate<B: Backend>(&mut self, backend: &B) -> Result<&Preview, GenerationError> {
        let ticket = self.begin()?;
        let request = GenerateRequest {
            prompt: ticket.prompt.clone(),
        };

        let result = backend.generate(&request).await;
        if result.is_err() && self.demo_fallback {
            tokio::time::sleep(self.demo_delay).await;
        }
        self.finish(ticket, result, Utc::now())
    }

    /// Hand edits to one channel of the current preview.
    pub fn edit_channel(&mut self, channel: Channel, text: impl Into<String>) -> bool {
        match self.preview.as_mut() {
            Some(preview) => {
                preview.bundle_mut().set(channel, text.into());
                true
            }
            None => false,
        }
    }

    /// Persist the current preview as a new campaign.
    pub async fn save<B: Backend>(
        &mut self,
        backend: &B,
        platforms: &[Platform],
    ) -> Result<Campaign, GenerationError> {
        if self.busy {
            return Err(GenerationError::Busy);
        }
        let preview = match &self.preview {
            None => return Err(GenerationError::NothingToSave),
            Some(preview) if preview.is_demo() => return Err(GenerationError::DemoNotSavable),
            Some(preview) => preview,
        };

        let request = SaveCampaignRequest {
            title: None,
            prompt: self.generated_for.clone(),
            content: preview.bundle().clone(),
            image_url: Some(preview.image_url().to_string()),
            platforms: platforms.to_vec(),
        };

        self.busy = true;
        let result = backend.save_campaign(&request).await;
        self.busy = false;

        let campaign = result?;
        info!("Saved campaign {}", campaign.id);
        Ok(campaign)
    }
}

/// Advisory credit check before generating. The server enforces the
/// allowance, so this only warns.
pub fn credit_warning<S: Session + ?Sized>(session: &S) -> Option<String> {
    let user = session.user()?;
    if user.can_spend(1) {
        return None;
    }
    let message = format!(
        "No credits left this month ({}/{} used)",
        user.credits_used, user.monthly_credits
    );
    warn!("{}", message);
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn twitter_takes_first_post() {
        let raw = json!([{ "text": "A" }, { "text": "B" }]);
        assert_eq!(normalize(Channel::Twitter, Some(&raw)), "A");

        let no_text = json!([{ "image_url": "x" }]);
        assert_eq!(normalize(Channel::Twitter, Some(&no_text)), "No tweet text");

        assert_eq!(normalize(Channel::Twitter, Some(&json!({ "text": "solo" }))), "solo");
    }

    #[test]
    fn email_object_gets_subject_line() {
        let raw = json!({ "subject": "Hi", "body": "Yo" });
        assert_eq!(normalize(Channel::Email, Some(&raw)), "SUBJECT: Hi\n\nYo");

        let no_subject = json!({ "body": "Yo" });
        assert_eq!(normalize(Channel::Email, Some(&no_subject)), "SUBJECT: No Subject\n\nYo");
    }

    #[test]
    fn long_form_object_is_assembled() {
        let raw = json!({ "title": "go green", "description": "why", "body": "because" });
        assert_eq!(normalize(Channel::Blog, Some(&raw)), "GO GREEN\n\nwhy\n\nbecause");

        let untitled = json!({ "content": "text" });
        assert_eq!(normalize(Channel::Linkedin, Some(&untitled)), "BLOG POST\n\n\n\ntext");
    }

    #[test]
    fn instagram_caption_or_marker() {
        assert_eq!(normalize(Channel::Instagram, Some(&json!({ "caption": "c" }))), "c");
        assert_eq!(
            normalize(Channel::Instagram, Some(&json!({ "tags": [] }))),
            "No caption generated"
        );
        assert_eq!(
            normalize(Channel::Instagram, Some(&json!([{ "caption": "c" }]))),
            "No caption generated"
        );
    }

    #[test]
    fn lists_read_like_objects_outside_twitter() {
        let list = json!(["a", "b"]);
        assert_eq!(normalize(Channel::Blog, Some(&list)), "BLOG POST\n\n\n\n");
        assert_eq!(normalize(Channel::Email, Some(&list)), "SUBJECT: No Subject\n\n");
    }

    #[test]
    fn absent_values_fall_back() {
        for channel in Channel::ALL {
            assert_eq!(normalize(channel, None), FALLBACK_TEXT);
            assert_eq!(normalize(channel, Some(&Value::Null)), FALLBACK_TEXT);
            assert_eq!(normalize(channel, Some(&json!(""))), FALLBACK_TEXT);
            assert_eq!(normalize(channel, Some(&json!("as is"))), "as is");
        }
    }

    #[test]
    fn image_prefers_first_tweet() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let with_image = GeneratedContent {
            twitter: Some(json!([{ "text": "A", "imageUrl": "https://cdn/x.png" }])),
            ..GeneratedContent::default()
        };
        assert_eq!(select_image(&with_image, "eco bottle", now), "https://cdn/x.png");

        let url = select_image(&GeneratedContent::default(), "eco bottle", now);
        assert_eq!(url, "https://loremflickr.com/1080/1080/eco?random=1700000000123");
    }

    #[test]
    fn placeholder_keyword_is_encoded() {
        assert_eq!(
            placeholder_image("café/bar launch", None),
            "https://loremflickr.com/1080/1080/caf%C3%A9%2Fbar"
        );
    }

    #[test]
    fn busy_flag_blocks_second_begin() {
        let mut workflow = GenerationWorkflow::new(true);
        workflow.set_prompt("   ");
        assert!(matches!(workflow.begin(), Err(GenerationError::EmptyPrompt)));

        workflow.set_prompt("eco bottle");
        let ticket = workflow.begin().unwrap();
        assert!(matches!(workflow.begin(), Err(GenerationError::Busy)));

        let content = GeneratedContent {
            blog: Some(json!("post")),
            ..GeneratedContent::default()
        };
        let preview = workflow.finish(ticket, Ok(content), Utc::now()).unwrap();
        assert_eq!(preview.bundle().blog, "post");
        assert!(!workflow.is_busy());
    }

    #[test]
    fn failure_becomes_labelled_demo() {
        let mut workflow = GenerationWorkflow::new(true);
        workflow.set_prompt("eco bottle");
        let ticket = workflow.begin().unwrap();

        let err = workflow
            .finish(ticket, Err(ClientError::Cancelled), Utc::now())
            .unwrap_err();
        assert!(matches!(err, GenerationError::Client(ClientError::Cancelled)));
        assert!(workflow.preview().unwrap().is_demo());
        assert!(!workflow.is_busy());
    }

    #[test]
    fn failure_without_fallback_leaves_nothing() {
        let mut workflow = GenerationWorkflow::new(false);
        workflow.set_prompt("eco bottle");
        let ticket = workflow.begin().unwrap();
        assert!(workflow.finish(ticket, Err(ClientError::Cancelled), Utc::now()).is_err());
        assert!(workflow.preview().is_none());
    }

    #[test]
    fn edits_apply_to_preview() {
        let mut workflow = GenerationWorkflow::new(false);
        assert!(!workflow.edit_channel(Channel::Email, "x"));

        workflow.set_prompt("eco");
        let ticket = workflow.begin().unwrap();
        workflow
            .finish(ticket, Ok(GeneratedContent::default()), Utc::now())
            .unwrap();
        assert!(workflow.edit_channel(Channel::Email, "edited"));
        assert_eq!(workflow.preview().unwrap().bundle().email, "edited");
    }
}
