use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use quill_client::ApiClient;
use quill_session::{Session, SessionStore};
use quill_types::models::{Channel, Platform};
use quill_workspace::auth;
use quill_workspace::generation::{GenerationWorkflow, Preview, credit_warning};
use quill_workspace::inactivity::{Activity, InactivityTimer};
use quill_workspace::profile::CreditSummary;

const HELP: &str = "\
commands:
  prompt <text>           set the topic
  generate                generate copy for every channel
  edit <channel> <text>   replace one channel's copy
  save [platform...]      save the result as a campaign
  credits                 show credit usage
  help                    show this list
  quit                    leave the studio";

pub fn print_preview(preview: &Preview) {
    if preview.is_demo() {
        println!("== DEMO CONTENT (generation failed, nothing was generated) ==");
    }
    for (channel, text) in preview.bundle().iter() {
        println!("\n[{}]\n{}", channel.label(), text);
    }
    println!("\nImage: {}", preview.image_url());
}

/// Interactive studio session. Every input line counts as activity; after
/// `idle` without input the session is logged out and the loop ends.
pub async fn run(client: ApiClient, store: Arc<SessionStore>, idle: Duration, demo_fallback: bool) -> Result<()> {
    let mut timer = {
        let client = client.clone();
        let store = store.clone();
        InactivityTimer::start(idle, async move {
            if let Err(e) = auth::logout(&client, &*store).await {
                warn!("Automatic logout failed: {}", e);
            }
        })
    };

    let mut workflow = GenerationWorkflow::new(demo_fallback);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);

    loop {
        let line = tokio::select! {
            _ = timer.expired() => {
                println!("Logged out after {} minutes without activity.", idle.as_secs() / 60);
                return Ok(());
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            return Ok(());
        };
        timer.touch(Activity::Key);

        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "" => {}
            "prompt" => workflow.set_prompt(rest),
            "generate" => {
                if let Some(warning) = credit_warning(&*store) {
                    println!("{}", warning);
                }
                if let Err(e) = workflow.generate(&client).await {
                    println!("Generation failed: {}", e);
                }
                if let Some(preview) = workflow.preview() {
                    print_preview(preview);
                }
            }
            "edit" => {
                let (channel, text) = rest.split_once(' ').unwrap_or((rest, ""));
                match channel.parse::<Channel>() {
                    Ok(channel) if workflow.edit_channel(channel, text) => println!("Updated {}", channel.label()),
                    Ok(_) => println!("Nothing to edit yet."),
                    Err(e) => println!("{}", e),
                }
            }
            "save" => {
                let platforms = match rest
                    .split_whitespace()
                    .map(str::parse::<Platform>)
                    .collect::<Result<Vec<_>, _>>()
                {
                    Ok(platforms) => platforms,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                let platforms = if platforms.is_empty() {
                    store
                        .user()
                        .map(|user| user.brand_profile.platforms)
                        .unwrap_or_default()
                } else {
                    platforms
                };
                match workflow.save(&client, &platforms).await {
                    Ok(campaign) => println!("Saved as campaign {}", campaign.id),
                    Err(e) => println!("Save failed: {}", e),
                }
            }
            "credits" => match store.user() {
                Some(user) => println!("{}", CreditSummary::from(&user)),
                None => println!("Not logged in."),
            },
            "help" => println!("{}", HELP),
            "quit" | "exit" => return Ok(()),
            other => println!("Unknown command: {}", other),
        }
    }
}
