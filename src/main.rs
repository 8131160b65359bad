//! strava-sitelog - post your latest Strava activity to your site's log
//!
//! Fetches the most recent activity, prints a summary, draws the route as
//! an inline SVG and commits a new entry into the site's HTML on GitHub.

mod api;
mod auth;
mod config;
mod error;
mod models;
mod route;
mod site;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{GithubClient, StravaClient};
use crate::auth::{CredentialManager, FileTokenStore, StdinCodeProvider, StravaOAuth};
use crate::config::Config;
use crate::error::PublishError;
use crate::models::{format_summary, Activity};

#[derive(Parser)]
#[command(name = "strava-sitelog")]
#[command(about = "Post your latest Strava activity to your site's log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the log entry instead of committing it
    #[arg(long)]
    dry_run: bool,

    /// Also write the route SVG to this file
    #[arg(long, value_name = "PATH")]
    save_svg: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cached Strava token status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Some(Commands::Status) => {
            let store = FileTokenStore::new(&config.strava.token_file);
            println!("Token cache: {}", store.path().display());
            auth::status(&store)?;
        }
        None => {
            run(&config, &cli).await?;
        }
    }

    Ok(())
}

/// One pass: token, latest activity, summary, route, publish.
///
/// Only configuration and authentication problems are errors; everything
/// after that is reported and the run ends normally.
async fn run(config: &Config, cli: &Cli) -> Result<()> {
    config.validate_strava()?;
    if !cli.dry_run {
        config.validate_github()?;
    }

    let credentials = CredentialManager::new(
        StravaOAuth::new(&config.strava)?,
        FileTokenStore::new(&config.strava.token_file),
        StdinCodeProvider,
    );
    let token = credentials
        .valid_token()
        .await
        .context("Strava authentication failed")?;

    let strava = StravaClient::new(&config.strava);
    let activity = match strava.latest_activity(&token).await {
        Ok(Some(activity)) => activity,
        Ok(None) => {
            println!(
                "No activities found in the last {} hours",
                config.strava.lookback_hours
            );
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Failed to fetch activities: {}", e);
            println!("No activity found");
            return Ok(());
        }
    };

    let fields = format_summary(&activity);
    println!();
    println!("=== Activity Details ===");
    for (label, value) in fields.rows() {
        println!("{}: {}", label, value);
    }

    let svg = render_route(&activity);
    match (&svg, &cli.save_svg) {
        (Some(svg), Some(path)) => match fs::write(path, svg) {
            Ok(()) => println!("\nRoute SVG saved to {}", path.display()),
            Err(e) => tracing::error!("Failed to write {}: {}", path.display(), e),
        },
        (Some(_), None) => {}
        (None, _) => println!("\nCould not create route SVG"),
    }

    if cli.dry_run {
        println!("\n--- Log entry (dry run, not committed) ---");
        println!("{}", site::render_entry(&fields, svg.as_deref()));
        return Ok(());
    }

    let github = GithubClient::new(&config.github);
    let target = site::Target {
        path: &config.github.path,
        marker: &config.github.marker,
    };
    match site::publish(&github, target, &fields, svg.as_deref()).await {
        Ok(()) => println!("Successfully updated website with new activity"),
        Err(e @ PublishError::MissingMarker { .. }) => {
            tracing::warn!("{}", e);
            println!("Could not find logs section in {}", config.github.path);
        }
        Err(e) => {
            tracing::error!("Failed to update website: {}", e);
            println!("Error updating website: {}", e);
        }
    }

    Ok(())
}

/// Inline SVG for the activity's route, if it has a drawable one.
fn render_route(activity: &Activity) -> Option<String> {
    let encoded = activity.summary_polyline()?;
    match route::project_route(encoded) {
        Ok(path) => Some(path.to_svg()),
        Err(e) => {
            tracing::warn!("Skipping route for {:?}: {}", activity.name, e);
            None
        }
    }
}
