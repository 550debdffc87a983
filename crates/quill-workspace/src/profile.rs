use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tracing::info;

use quill_client::{Backend, ClientError};
use quill_session::{Session, SessionStore};
use quill_types::models::{BrandProfile, BrandTone, Platform, Theme, User};

use crate::platforms::PlatformSelection;

pub const MAX_IMAGE_BYTES: u64 = 2 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Max 2MB allowed ({0} bytes)")]
    ImageTooLarge(u64),

    #[error("unsupported image type: {0}")]
    UnsupportedImage(String),

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("not logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Session(#[from] anyhow::Error),
}

/// Fetch the profile and overwrite the stored user with it.
pub async fn refresh_profile<B, S>(backend: &B, session: &S) -> Result<User, ProfileError>
where
    B: Backend,
    S: Session + ?Sized,
{
    let user = backend.fetch_profile().await?;
    session.replace_user(&user)?;
    Ok(user)
}

/// Editable copy of the brand section of a user record.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandSettings {
    pub company_name: String,
    pub industry: String,
    pub target_audience: String,
    pub brand_tone: BrandTone,
    pub uvp: String,
    pub website: String,
    logo_preview: Option<String>,
    selection: PlatformSelection,
}

impl BrandSettings {
    pub fn from_user(user: &User) -> Self {
        let brand = &user.brand_profile;
        Self {
            company_name: brand.company_name.clone(),
            industry: brand.industry.clone(),
            target_audience: brand.target_audience.clone(),
            brand_tone: brand.brand_tone,
            uvp: brand.uvp.clone(),
            website: user.website.clone().unwrap_or_default(),
            logo_preview: brand.logo_preview.clone(),
            selection: PlatformSelection::from_parts(&brand.platforms, &brand.platform_ids),
        }
    }

    pub fn selection(&self) -> &PlatformSelection {
        &self.selection
    }

    pub fn toggle_platform(&mut self, platform: Platform) -> bool {
        self.selection.toggle(platform)
    }

    pub fn set_platform_id(&mut self, platform: Platform, value: impl Into<String>) -> bool {
        self.selection.set_id(platform, value)
    }

    pub fn logo_preview(&self) -> Option<&str> {
        self.logo_preview.as_deref()
    }

    pub fn set_logo(&mut self, data_url: String) {
        self.logo_preview = Some(data_url);
    }

    /// The full user record with these settings applied.
    pub fn apply_to(&self, mut user: User) -> User {
        let (platforms, platform_ids) = self.selection.to_parts();
        user.brand_profile = BrandProfile {
            company_name: self.company_name.trim().to_string(),
            industry: self.industry.trim().to_string(),
            target_audience: self.target_audience.trim().to_string(),
            brand_tone: self.brand_tone,
            uvp: self.uvp.trim().to_string(),
            platforms,
            platform_ids,
            logo_preview: self.logo_preview.clone(),
        };
        let website = self.website.trim();
        user.website = (!website.is_empty()).then(|| website.to_string());
        user
    }
}

/// Save brand settings into the stored user record. Nothing is sent to
/// the backend.
pub fn save_brand_settings<S: Session + ?Sized>(
    session: &S,
    settings: &BrandSettings,
) -> Result<User, ProfileError> {
    let user = session.user().ok_or(ProfileError::NotLoggedIn)?;
    let updated = settings.apply_to(user);
    session.replace_user(&updated)?;
    info!("Brand settings saved for {}", updated.email);
    Ok(updated)
}

/// Editable copy of the personal section of a user record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonalProfile {
    pub name: String,
    pub job_title: String,
    pub bio: String,
    pub personal_website: String,
    avatar: Option<String>,
}

impl PersonalProfile {
    pub fn from_user(user: &User) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            name: text(&user.name),
            job_title: text(&user.job_title),
            bio: text(&user.bio),
            personal_website: text(&user.personal_website),
            avatar: user.avatar.clone(),
        }
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    pub fn set_avatar(&mut self, data_url: String) {
        self.avatar = Some(data_url);
    }

    /// The full user record with these details applied. Blank fields are
    /// removed from the record.
    pub fn apply_to(&self, mut user: User) -> User {
        fn set(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }

        user.name = set(&self.name);
        user.job_title = set(&self.job_title);
        user.bio = set(&self.bio);
        user.personal_website = set(&self.personal_website);
        user.avatar = self.avatar.clone();
        user
    }
}

/// Save personal details into the stored user record. Like brand settings,
/// this stays local.
pub fn save_personal_profile<S: Session + ?Sized>(
    session: &S,
    profile: &PersonalProfile,
) -> Result<User, ProfileError> {
    let user = session.user().ok_or(ProfileError::NotLoggedIn)?;
    let updated = profile.apply_to(user);
    session.replace_user(&updated)?;
    info!("Personal profile saved for {}", updated.email);
    Ok(updated)
}

fn image_mime(path: &Path) -> Result<&'static str, ProfileError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        "svg" => Ok("image/svg+xml"),
        _ => Err(ProfileError::UnsupportedImage(path.display().to_string())),
    }
}

/// Read a logo or avatar and encode it as a `data:` URL. Files over
/// [`MAX_IMAGE_BYTES`] are refused before reading.
pub async fn image_data_url(path: &Path) -> Result<String, ProfileError> {
    let mime = image_mime(path)?;
    let size = tokio::fs::metadata(path).await?.len();
    if size > MAX_IMAGE_BYTES {
        return Err(ProfileError::ImageTooLarge(size));
    }

    let bytes = tokio::fs::read(path).await?;
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

pub fn toggle_theme(store: &SessionStore) -> Result<Theme, ProfileError> {
    let theme = store.theme().toggled();
    store.set_theme(theme)?;
    Ok(theme)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditSummary {
    pub used: u32,
    pub allowance: u32,
    pub remaining: u32,
}

impl From<&User> for CreditSummary {
    fn from(user: &User) -> Self {
        Self {
            used: user.credits_used,
            allowance: user.monthly_credits,
            remaining: user.remaining_credits(),
        }
    }
}

impl fmt::Display for CreditSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} credits used, {} left",
            self.used, self.allowance, self.remaining
        )
    }
}
