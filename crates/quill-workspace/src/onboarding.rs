//! Two-step onboarding wizard.
//!
//! Everything stays in memory until [`OnboardingWizard::submit`] succeeds.
//! Only then is the returned user written to the session.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{info, warn};

use quill_client::{Backend, ClientError};
use quill_session::{Route, Session, WorkspaceView};
use quill_types::api::OnboardingRequest;
use quill_types::models::{BrandTone, Platform};

use crate::platforms::{PlatformSelection, labels};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Brand,
    Platforms,
}

/// Where an error is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    CompanyName,
    Platforms,
    Server,
}

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("Company name is required")]
    CompanyNameRequired,

    #[error("Please select at least one platform.")]
    NoPlatforms,

    #[error("Please enter details for: {}", labels(.0))]
    MissingIdentifiers(Vec<Platform>),

    #[error("finish the brand step first")]
    NotOnPlatformStep,

    #[error("the server did not confirm onboarding")]
    NotConfirmed,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Session(#[from] anyhow::Error),
}

impl OnboardingError {
    pub fn field(&self) -> Field {
        match self {
            OnboardingError::CompanyNameRequired => Field::CompanyName,
            OnboardingError::NoPlatforms | OnboardingError::MissingIdentifiers(_) => Field::Platforms,
            _ => Field::Server,
        }
    }

    fn banner(&self) -> String {
        match self {
            OnboardingError::Client(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Step 1 answers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandDetails {
    pub company_name: String,
    pub industry: String,
    pub target_audience: String,
    pub brand_tone: BrandTone,
    pub uvp: String,
}

#[derive(Debug, Clone)]
pub struct OnboardingWizard {
    step: Step,
    brand: BrandDetails,
    selection: PlatformSelection,
    errors: BTreeMap<Field, String>,
    submitting: bool,
}

impl Default for OnboardingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingWizard {
    pub fn new() -> Self {
        Self {
            step: Step::Brand,
            brand: BrandDetails::default(),
            selection: PlatformSelection::new(),
            errors: BTreeMap::new(),
            submitting: false,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn brand(&self) -> &BrandDetails {
        &self.brand
    }

    pub fn selection(&self) -> &PlatformSelection {
        &self.selection
    }

    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_company_name(&mut self, value: impl Into<String>) {
        self.brand.company_name = value.into();
        self.errors.remove(&Field::CompanyName);
    }

    pub fn set_industry(&mut self, value: impl Into<String>) {
        self.brand.industry = value.into();
    }

    pub fn set_target_audience(&mut self, value: impl Into<String>) {
        self.brand.target_audience = value.into();
    }

    pub fn set_brand_tone(&mut self, tone: BrandTone) {
        self.brand.brand_tone = tone;
    }

    pub fn set_uvp(&mut self, value: impl Into<String>) {
        self.brand.uvp = value.into();
    }

    /// Validate step 1 and move to step 2. Errors from earlier attempts are
    /// cleared on success.
    pub fn advance(&mut self) -> Result<Step, OnboardingError> {
        if self.brand.company_name.trim().is_empty() {
            let err = OnboardingError::CompanyNameRequired;
            self.record(&err);
            return Err(err);
        }
        self.errors.clear();
        self.step = Step::Platforms;
        Ok(self.step)
    }

    /// Return to step 1. Entered values are kept.
    pub fn back(&mut self) -> Step {
        self.step = Step::Brand;
        self.step
    }

    pub fn toggle_platform(&mut self, platform: Platform) -> bool {
        let selected = self.selection.toggle(platform);
        if !self.selection.is_empty() {
            self.errors.remove(&Field::Platforms);
        }
        selected
    }

    pub fn set_platform_id(&mut self, platform: Platform, value: impl Into<String>) -> bool {
        self.selection.set_id(platform, value)
    }

    /// Check step 2 and build the payload: trimmed brand fields plus exactly
    /// the selected platforms and their trimmed identifiers.
    pub fn build_request(&self) -> Result<OnboardingRequest, OnboardingError> {
        if self.step != Step::Platforms {
            return Err(OnboardingError::NotOnPlatformStep);
        }
        if self.selection.is_empty() {
            return Err(OnboardingError::NoPlatforms);
        }
        let missing = self.selection.missing_ids();
        if !missing.is_empty() {
            return Err(OnboardingError::MissingIdentifiers(missing));
        }

        let (platforms, platform_ids) = self.selection.to_parts();
        Ok(OnboardingRequest {
            company_name: self.brand.company_name.trim().to_string(),
            industry: self.brand.industry.trim().to_string(),
            target_audience: self.brand.target_audience.trim().to_string(),
            brand_tone: self.brand.brand_tone,
            uvp: self.brand.uvp.trim().to_string(),
            platforms,
            platform_ids,
        })
    }

    /// Send the answers. On success the confirmed user replaces the session
    /// and the workspace route is returned. On any failure the wizard stays
    /// on step 2 with the error recorded and nothing is persisted.
    pub async fn submit<B, S>(&mut self, backend: &B, session: &S) -> Result<Route, OnboardingError>
    where
        B: Backend,
        S: Session + ?Sized,
    {
        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => {
                self.record(&e);
                return Err(e);
            }
        };

        self.errors.clear();
        self.submitting = true;
        let outcome = backend.submit_onboarding(&request).await;
        self.submitting = false;

        let result = match outcome {
            Ok(user) if user.is_onboarded => session.replace_user(&user).map_err(OnboardingError::from),
            Ok(_) => Err(OnboardingError::NotConfirmed),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => {
                info!("Onboarding complete for {}", request.company_name);
                Ok(Route::Workspace(WorkspaceView::Studio))
            }
            Err(e) => {
                warn!("Onboarding submission failed: {}", e);
                self.record(&e);
                Err(e)
            }
        }
    }

    fn record(&mut self, err: &OnboardingError) {
        self.errors.insert(err.field(), err.banner());
    }
}
