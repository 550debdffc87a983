mod config;
mod studio;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use quill_client::ApiClient;
use quill_session::{Navigation, Route, Session, SessionStore, WorkspaceView, navigate};
use quill_types::models::{BrandTone, Platform, Theme, TimeSlot};
use quill_workspace::auth;
use quill_workspace::detail::{CampaignLookup, lookup_campaign};
use quill_workspace::generation::{GenerationWorkflow, credit_warning};
use quill_workspace::onboarding::OnboardingWizard;
use quill_workspace::profile::{self, BrandSettings, CreditSummary, PersonalProfile};
use quill_workspace::scheduler::Scheduler;

use crate::config::Config;

/// Quill - AI marketing content workspace
#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Quill - AI marketing content workspace")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides QUILL_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a route through the session guards
    Open { path: String },
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "QUILL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "QUILL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session and clear local state
    Logout,
    /// Answer the onboarding questionnaire
    Onboard {
        #[arg(long)]
        company: String,
        #[arg(long, default_value = "")]
        industry: String,
        #[arg(long, default_value = "")]
        audience: String,
        #[arg(long, default_value = "Professional")]
        tone: BrandTone,
        #[arg(long, default_value = "")]
        pitch: String,
        /// Platform and handle, e.g. `twitter=@acme`. Repeatable.
        #[arg(long = "platform", value_parser = parse_platform_id)]
        platforms: Vec<(Platform, String)>,
    },
    /// Generate copy for every channel
    Generate {
        prompt: String,
        /// Save the result as a campaign
        #[arg(long)]
        save: bool,
        /// Target platform for the saved campaign. Repeatable.
        #[arg(long = "platform")]
        platforms: Vec<Platform>,
    },
    /// List drafts and scheduled campaigns
    Campaigns,
    /// Put a draft on the calendar
    Schedule {
        id: String,
        /// Start time, RFC 3339
        at: DateTime<Utc>,
        #[arg(long, default_value_t = 60)]
        minutes: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Move a scheduled campaign
    Reschedule {
        id: String,
        at: DateTime<Utc>,
        #[arg(long, default_value_t = 60)]
        minutes: i64,
    },
    /// Publish a campaign now
    Publish { id: String },
    /// Show one campaign
    Show { id: String },
    /// Show or edit the profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
    /// Show or change the theme (light, dark, toggle)
    Theme { value: Option<String> },
    /// Interactive content studio with an inactivity timeout
    Studio,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Fetch the profile from the server
    Show,
    /// Edit brand settings (stored locally)
    Set {
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long)]
        audience: Option<String>,
        #[arg(long)]
        tone: Option<BrandTone>,
        #[arg(long)]
        pitch: Option<String>,
        #[arg(long)]
        website: Option<String>,
        /// Logo image, at most 2MB
        #[arg(long)]
        logo: Option<PathBuf>,
        /// Replace the platform list, e.g. `twitter=@acme`. Repeatable.
        #[arg(long = "platform", value_parser = parse_platform_id)]
        platforms: Vec<(Platform, String)>,
    },
    /// Edit personal details (stored locally)
    Personal {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        job_title: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        website: Option<String>,
        /// Avatar image, at most 2MB
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
}

fn parse_platform_id(raw: &str) -> Result<(Platform, String), String> {
    let (platform, id) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <platform>=<handle>, got '{}'", raw))?;
    let platform = platform.parse::<Platform>().map_err(|e| e.to_string())?;
    Ok((platform, id.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "quill=info",
        1 => "quill=debug",
        _ => "quill=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    let store = Arc::new(SessionStore::open(&config.session_path())?);
    let client = ApiClient::new(config.client_config())?;
    info!("Using backend {}", client.base_url());

    let app = App {
        config,
        store,
        client,
    };
    app.run(cli.command).await
}

struct App {
    config: Config,
    store: Arc<SessionStore>,
    client: ApiClient,
}

impl App {
    async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Open { path } => self.open(&path),
            Commands::Login { email, password } => {
                let route = auth::login(&self.client, &*self.store, &email, &password).await?;
                println!("Logged in. Next: {}", route);
                Ok(())
            }
            Commands::Signup { email, password } => {
                let route = auth::signup(&self.client, &email, &password).await?;
                println!("Account created. Next: {}", route);
                Ok(())
            }
            Commands::Logout => {
                auth::logout(&self.client, &*self.store).await?;
                println!("Logged out.");
                Ok(())
            }
            Commands::Onboard {
                company,
                industry,
                audience,
                tone,
                pitch,
                platforms,
            } => {
                self.require(Route::Onboarding)?;
                let mut wizard = OnboardingWizard::new();
                wizard.set_company_name(company);
                wizard.set_industry(industry);
                wizard.set_target_audience(audience);
                wizard.set_brand_tone(tone);
                wizard.set_uvp(pitch);
                wizard.advance()?;
                for (platform, id) in platforms {
                    if !wizard.selection().is_selected(platform) {
                        wizard.toggle_platform(platform);
                    }
                    wizard.set_platform_id(platform, id);
                }
                let route = wizard.submit(&self.client, &*self.store).await?;
                println!("Onboarding complete. Next: {}", route);
                Ok(())
            }
            Commands::Generate {
                prompt,
                save,
                platforms,
            } => self.generate(prompt, save, platforms).await,
            Commands::Campaigns => self.campaigns().await,
            Commands::Schedule {
                id,
                at,
                minutes,
                yes,
            } => self.schedule(&id, slot(at, minutes)?, yes).await,
            Commands::Reschedule { id, at, minutes } => {
                self.require(Route::Workspace(WorkspaceView::Calendar))?;
                let mut scheduler = Scheduler::load(&self.client, self.default_platform()).await?;
                scheduler.reschedule(&self.client, &id, slot(at, minutes)?).await?;
                println!("Moved {} to {}", id, at);
                Ok(())
            }
            Commands::Publish { id } => {
                self.require(Route::Workspace(WorkspaceView::Calendar))?;
                let mut scheduler = Scheduler::load(&self.client, self.default_platform()).await?;
                scheduler.publish(&self.client, &id).await?;
                println!("Published {}", id);
                Ok(())
            }
            Commands::Show { id } => self.show(id).await,
            Commands::Profile { action } => self.profile(action.unwrap_or(ProfileAction::Show)).await,
            Commands::Theme { value } => self.theme(value.as_deref()),
            Commands::Studio => {
                self.require(Route::Workspace(WorkspaceView::Studio))?;
                studio::run(
                    self.client.clone(),
                    self.store.clone(),
                    self.config.idle_timeout,
                    self.config.demo_fallback,
                )
                .await
            }
        }
    }

    fn open(&self, path: &str) -> Result<()> {
        let Some(route) = Route::parse(path) else {
            bail!("Unknown route: {}", path);
        };
        match navigate(&*self.store, route) {
            Navigation::Render(route) => println!("{}", route),
            Navigation::Redirect(target) => println!("{} -> {}", path, target),
        }
        Ok(())
    }

    /// Run the route's guard; a redirect aborts the command.
    fn require(&self, route: Route) -> Result<()> {
        match navigate(&*self.store, route) {
            Navigation::Render(_) => Ok(()),
            Navigation::Redirect(Route::Login) => bail!("Not logged in. Run `quill login` first."),
            Navigation::Redirect(Route::Onboarding) => {
                bail!("Onboarding not finished. Run `quill onboard` first.")
            }
            Navigation::Redirect(other) => bail!("Redirected to {}", other),
        }
    }

    fn default_platform(&self) -> Platform {
        self.store
            .user()
            .and_then(|user| user.brand_profile.platforms.first().copied())
            .unwrap_or(Platform::Twitter)
    }

    async fn generate(&self, prompt: String, save: bool, platforms: Vec<Platform>) -> Result<()> {
        self.require(Route::Workspace(WorkspaceView::Studio))?;
        if let Some(warning) = credit_warning(&*self.store) {
            eprintln!("{}", warning);
        }

        let mut workflow = GenerationWorkflow::new(self.config.demo_fallback);
        workflow.set_prompt(prompt);
        if let Err(e) = workflow.generate(&self.client).await {
            eprintln!("Generation failed: {}", e);
        }

        let Some(preview) = workflow.preview() else {
            bail!("No content generated");
        };
        studio::print_preview(preview);

        if save {
            let platforms = if platforms.is_empty() {
                vec![self.default_platform()]
            } else {
                platforms
            };
            let campaign = workflow.save(&self.client, &platforms).await?;
            println!("Saved as campaign {}", campaign.id);
        }
        Ok(())
    }

    async fn campaigns(&self) -> Result<()> {
        self.require(Route::Workspace(WorkspaceView::Campaigns))?;
        let scheduler = Scheduler::load(&self.client, self.default_platform()).await?;
        let board = scheduler.board();

        println!("Drafts:");
        for draft in board.drafts() {
            println!("  {}  {}", draft.id, draft.title);
        }
        println!("Calendar:");
        for event in board.events_by_start() {
            let published = if board.is_published(&event.id) { " (published)" } else { "" };
            println!("  {}  {} - {}  {}{}", event.id, event.start, event.end, event.title, published);
        }
        Ok(())
    }

    async fn schedule(&self, id: &str, slot: TimeSlot, yes: bool) -> Result<()> {
        self.require(Route::Workspace(WorkspaceView::Calendar))?;
        let mut scheduler = Scheduler::load(&self.client, self.default_platform()).await?;

        scheduler.begin_drag(id)?;
        let pending = scheduler.drop_on(slot)?;
        let question = format!("Schedule \"{}\" at {}? [y/N] ", pending.title, pending.slot.start);

        if !yes && !confirm(&question).await? {
            scheduler.decline();
            println!("Not scheduled.");
            return Ok(());
        }

        let event = scheduler.confirm_and_send(&self.client).await?;
        println!("Scheduled {} for {} - {}", event.title, event.start, event.end);
        Ok(())
    }

    async fn show(&self, id: String) -> Result<()> {
        self.require(Route::CampaignDetail(id.clone()))?;
        match lookup_campaign(&self.client, &id).await {
            CampaignLookup::Found(view) => {
                println!("{}", view.campaign.display_title());
                println!("Prompt: {}", view.campaign.prompt);
                if let Some(at) = view.campaign.scheduled_at {
                    println!("Scheduled: {}", at);
                }
                if let Some(image) = &view.campaign.image_url {
                    println!("Image: {}", image);
                }
                for (channel, text) in view.bundle.iter() {
                    println!("\n[{}]\n{}", channel.label(), text);
                }
            }
            CampaignLookup::NotFound { back } => {
                println!("Campaign not found. Back to {}", back);
            }
        }
        Ok(())
    }

    async fn profile(&self, action: ProfileAction) -> Result<()> {
        self.require(Route::Profile)?;
        match action {
            ProfileAction::Show => {
                let user = profile::refresh_profile(&self.client, &*self.store).await?;
                let brand = &user.brand_profile;
                println!("{} ({})", user.email, user.initial());
                for (label, value) in [
                    ("Name", &user.name),
                    ("Job title", &user.job_title),
                    ("Bio", &user.bio),
                    ("Website", &user.personal_website),
                ] {
                    if let Some(value) = value {
                        println!("{}: {}", label, value);
                    }
                }
                println!("Company: {}", brand.company_name);
                println!("Industry: {}", brand.industry);
                println!("Audience: {}", brand.target_audience);
                println!("Tone: {}", brand.brand_tone);
                for platform in &brand.platforms {
                    let id = brand.platform_ids.get(platform).map_or("", String::as_str);
                    println!("  {}: {}", platform, id);
                }
                println!("{}", CreditSummary::from(&user));
            }
            ProfileAction::Set {
                company,
                industry,
                audience,
                tone,
                pitch,
                website,
                logo,
                platforms,
            } => {
                let Some(user) = self.store.user() else {
                    bail!("Not logged in");
                };
                let mut settings = BrandSettings::from_user(&user);
                if let Some(company) = company {
                    settings.company_name = company;
                }
                if let Some(industry) = industry {
                    settings.industry = industry;
                }
                if let Some(audience) = audience {
                    settings.target_audience = audience;
                }
                if let Some(tone) = tone {
                    settings.brand_tone = tone;
                }
                if let Some(pitch) = pitch {
                    settings.uvp = pitch;
                }
                if let Some(website) = website {
                    settings.website = website;
                }
                if let Some(path) = logo {
                    settings.set_logo(profile::image_data_url(&path).await?);
                }
                if !platforms.is_empty() {
                    for platform in settings.selection().selected().to_vec() {
                        settings.toggle_platform(platform);
                    }
                    for (platform, id) in platforms {
                        if !settings.selection().is_selected(platform) {
                            settings.toggle_platform(platform);
                        }
                        settings.set_platform_id(platform, id);
                    }
                }
                profile::save_brand_settings(&*self.store, &settings)?;
                println!("Brand settings saved.");
            }
            ProfileAction::Personal {
                name,
                job_title,
                bio,
                website,
                avatar,
            } => {
                let Some(user) = self.store.user() else {
                    bail!("Not logged in");
                };
                let mut personal = PersonalProfile::from_user(&user);
                if let Some(name) = name {
                    personal.name = name;
                }
                if let Some(job_title) = job_title {
                    personal.job_title = job_title;
                }
                if let Some(bio) = bio {
                    personal.bio = bio;
                }
                if let Some(website) = website {
                    personal.personal_website = website;
                }
                if let Some(path) = avatar {
                    personal.set_avatar(profile::image_data_url(&path).await?);
                }
                profile::save_personal_profile(&*self.store, &personal)?;
                println!("Personal profile saved.");
            }
        }
        Ok(())
    }

    fn theme(&self, value: Option<&str>) -> Result<()> {
        let theme = match value {
            None => self.store.theme(),
            Some("toggle") => profile::toggle_theme(&self.store)?,
            Some(raw) => {
                let theme: Theme = raw.parse()?;
                self.store.set_theme(theme)?;
                theme
            }
        };
        println!("{}", theme.as_str());
        Ok(())
    }
}

fn slot(start: DateTime<Utc>, minutes: i64) -> Result<TimeSlot> {
    match TimeSlot::new(start, start + Duration::minutes(minutes)) {
        Some(slot) => Ok(slot),
        None => bail!("Duration must be positive, got {} minutes", minutes),
    }
}

async fn confirm(question: &str) -> Result<bool> {
    eprint!("{}", question);
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
