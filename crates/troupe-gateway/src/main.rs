//! Webhook gateway that lets LLM personas chat in Slack channels.

mod dispatcher;
mod server;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use troupe_ai::{CompletionClient, Message, OpenAiClient, OpenAiConfig};
use troupe_core::ActivityLog;
use troupe_ledger::SqliteEventLedger;
use troupe_persona::{Persona, PersonaStore};
use troupe_slack::{NotificationClient, SlackClient, SlackConfig};

use crate::dispatcher::Dispatcher;
use crate::server::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(
    name = "troupe-gateway",
    about = "Webhook gateway that lets LLM personas chat in Slack channels",
    version
)]
struct Cli {
    #[arg(
        long,
        env = "TROUPE_BIND",
        default_value = "0.0.0.0:8080",
        help = "Address to bind the webhook listener on"
    )]
    bind: String,

    #[arg(
        long,
        env = "TROUPE_PERSONA_DIR",
        default_value = "data/personas",
        help = "Directory of persona YAML definitions"
    )]
    persona_dir: PathBuf,

    #[arg(
        long,
        env = "TROUPE_DATABASE_FILE",
        default_value = "data/troupe.db",
        help = "SQLite file holding the event ledger"
    )]
    database_file: PathBuf,

    #[arg(
        long,
        env = "TROUPE_ACTIVITY_LOG",
        default_value = "data/troupe.log",
        help = "Human-readable activity log file"
    )]
    activity_log: PathBuf,

    #[arg(
        long,
        env = "TROUPE_ACTIVITY_LOG_LINES",
        default_value_t = troupe_core::DEFAULT_ACTIVITY_LOG_LINES,
        help = "Number of activity log lines to retain"
    )]
    activity_log_lines: usize,

    #[arg(
        long,
        env = "TROUPE_MODEL",
        default_value = troupe_ai::DEFAULT_COMPLETION_MODEL,
        help = "Chat-completion model personas speak with"
    )]
    model: String,

    #[arg(
        long,
        env = "OPENAI_KEY",
        hide_env_values = true,
        help = "API key for the chat-completion API"
    )]
    openai_key: String,

    #[arg(
        long,
        env = "OPENAI_API_BASE",
        default_value = troupe_ai::DEFAULT_OPENAI_API_BASE,
        help = "Base URL for the chat-completion API"
    )]
    openai_api_base: String,

    #[arg(
        long,
        env = "TROUPE_SLACK_API_BASE",
        default_value = troupe_slack::DEFAULT_SLACK_API_BASE,
        help = "Base URL for the Slack Web API"
    )]
    slack_api_base: String,

    #[arg(
        long,
        help = "Persona name probe modes act as (default: first loaded persona)"
    )]
    persona: Option<String>,

    #[arg(
        long,
        value_name = "TEXT",
        help = "Run one completion with TEXT, print the reply, and exit"
    )]
    probe_completion: Option<String>,

    #[arg(
        long,
        value_name = "CHANNEL:TEXT",
        help = "Post TEXT to CHANNEL with the persona's token and exit"
    )]
    probe_delivery: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let personas = PersonaStore::load_dir(&cli.persona_dir)
        .with_context(|| format!("failed to load personas from {}", cli.persona_dir.display()))?;
    if personas.is_empty() {
        tracing::warn!(
            persona_dir = %cli.persona_dir.display(),
            "no personas loaded; every event will fail resolution"
        );
    }

    let ledger = SqliteEventLedger::new(&cli.database_file).with_context(|| {
        format!(
            "failed to open event ledger at {}",
            cli.database_file.display()
        )
    })?;

    let activity = ActivityLog::open(&cli.activity_log, cli.activity_log_lines)
        .with_context(|| format!("failed to open activity log at {}", cli.activity_log.display()))?;

    let completions = OpenAiClient::new(OpenAiConfig {
        api_base: cli.openai_api_base.clone(),
        api_key: cli.openai_key.clone(),
        model: cli.model.clone(),
        ..OpenAiConfig::default()
    })
    .context("failed to construct completion client")?;

    let notifier = SlackClient::new(SlackConfig {
        api_base: cli.slack_api_base.clone(),
        ..SlackConfig::default()
    })
    .context("failed to construct slack client")?;

    if let Some(text) = cli.probe_completion.as_deref() {
        let persona = probe_persona(&personas, cli.persona.as_deref())?;
        let reply = completions
            .complete(&persona.system_prompt, &[Message::user(text)])
            .await
            .with_context(|| format!("completion probe failed for persona '{}'", persona.name))?;
        println!("{reply}");
        return Ok(());
    }

    if let Some(target) = cli.probe_delivery.as_deref() {
        let persona = probe_persona(&personas, cli.persona.as_deref())?;
        let (channel, text) = target
            .split_once(':')
            .context("--probe-delivery expects CHANNEL:TEXT")?;
        notifier
            .post_message(&persona.delivery_token, channel, text, None)
            .await
            .with_context(|| format!("delivery probe failed for persona '{}'", persona.name))?;
        println!("delivered to {channel} as `{}`", persona.name);
        return Ok(());
    }

    let persona_count = personas.personas().len();
    let dispatcher = Dispatcher::new(
        Arc::new(personas),
        Arc::new(ledger),
        Arc::new(completions),
        Arc::new(notifier),
        Arc::new(activity),
    );
    let state = Arc::new(AppState { dispatcher });

    let bind_addr = cli
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid --bind '{}'", cli.bind))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind webhook listener on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound listener address")?;
    println!("webhook listener on {local_addr} serving {persona_count} personas");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("webhook server exited unexpectedly")?;

    Ok(())
}

fn probe_persona<'a>(store: &'a PersonaStore, name: Option<&str>) -> Result<&'a Persona> {
    match name {
        Some(name) => store
            .personas()
            .iter()
            .find(|persona| persona.name == name)
            .with_context(|| format!("no persona named '{name}' is loaded")),
        None => store.personas().first().context("no personas are loaded"),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
