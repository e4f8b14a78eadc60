mod commands;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};
use zendesk_api::{ApiClient, CallContext};
use zendesk_config::{Config, Profile};
use zendesk_output::{OutputFormat, OutputRenderer};

#[derive(Parser, Debug)]
#[command(name = "zendesk-cli", version, about = "Zendesk Support Jira links CLI", long_about = None)]
struct Cli {
    /// Profile to use from config file
    #[arg(short, long)]
    profile: Option<String>,

    /// Path to config file (defaults to ~/.zendesk-cli/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format for command results
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Abort the command after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: ZendeskCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum ZendeskCommand {
    /// Jira link commands
    JiraLinks(commands::jira_links::JiraLinksArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let config = Config::load(cli.config.as_ref())?;
    let renderer = OutputRenderer::new(cli.output);
    let profile = resolve_active_profile(&config, cli.profile.as_deref(), |key| {
        std::env::var(key).ok()
    })?;
    let client = build_client(&profile)?;
    let ctx = call_context(cli.timeout);

    match cli.command {
        ZendeskCommand::JiraLinks(args) => {
            commands::jira_links::execute(args, client.jira_links(), &ctx, &renderer).await?
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug {
        "info,zendesk_cli=debug,zendesk_api=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logger: {err}"))
}

/// Context shared by every request of this invocation. Ctrl-C cancels it.
fn call_context(timeout: Option<u64>) -> CallContext {
    let token = CancellationToken::new();
    let watcher = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight request");
            watcher.cancel();
        }
    });

    let ctx = CallContext::background().with_cancellation(token);
    match timeout {
        Some(secs) => ctx.with_timeout(Duration::from_secs(secs)),
        None => ctx,
    }
}

struct ActiveProfile {
    base_url: String,
    email: String,
    token: String,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for ActiveProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveProfile")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn resolve_active_profile<F>(
    config: &Config,
    requested: Option<&str>,
    env: F,
) -> Result<ActiveProfile>
where
    F: Fn(&str) -> Option<String>,
{
    let (name, profile) = config.resolve_profile(requested).ok_or_else(|| match requested {
        Some(name) => anyhow!("Profile '{name}' not found in config."),
        None => anyhow!("No profile configured. Add one to ~/.zendesk-cli/config.yaml first."),
    })?;

    let base_url = profile
        .api_base_url()
        .ok_or_else(|| anyhow!("Profile '{name}' needs a subdomain or base_url."))?;
    let email = profile
        .email
        .clone()
        .ok_or_else(|| anyhow!("Profile '{name}' is missing an email."))?;
    let token = resolve_token(name, profile, env)?;

    Ok(ActiveProfile {
        base_url,
        email,
        token,
        timeout: profile.timeout(),
    })
}

/// Token lookup: profile-specific env var, generic env var, then the config file.
fn resolve_token<F>(name: &str, profile: &Profile, env: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let profile_env_var = profile_token_var(name);
    env(&profile_env_var)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| env("ZENDESK_API_TOKEN").filter(|t| !t.trim().is_empty()))
        .or_else(|| profile.api_token.clone().filter(|t| !t.trim().is_empty()))
        .ok_or_else(|| {
            anyhow!(
                "No API token found for profile '{name}'. \
                 Set {profile_env_var} or add api_token to the profile."
            )
        })
}

fn profile_token_var(name: &str) -> String {
    format!(
        "ZENDESK_CLI_TOKEN_{}",
        name.to_uppercase().replace(['-', ' '], "_")
    )
}

fn build_client(profile: &ActiveProfile) -> Result<ApiClient> {
    let mut client = ApiClient::new(&profile.base_url)?
        .with_api_token(profile.email.clone(), profile.token.clone());
    if let Some(timeout) = profile.timeout {
        client = client.with_timeout(timeout)?;
    }
    Ok(client)
}
