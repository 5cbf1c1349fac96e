//! Terminal client for the company research assistant.

use account_desk::api::{ChatBackend, HttpChatBackend};
use account_desk::logging::{self, LogTarget};
use account_desk::speech::{
    Capability, CommandRecognizer, CommandSynthesizer, Speaker, SpeechRecognizer,
    SpeechSynthesizer,
};
use account_desk::ui::{TerminalSurface, spawn_stdin_reader};
use account_desk::{ChatApp, DeskConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Chat with the company research assistant from a terminal.
#[derive(Parser)]
#[command(name = "account-desk", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chat endpoint URL (overrides the config file).
    #[arg(long)]
    endpoint: Option<String>,

    /// Persona to start with (overrides the config file).
    #[arg(long)]
    persona: Option<String>,

    /// Speak replies aloud.
    #[arg(long)]
    voice: bool,

    /// Write diagnostics to stderr instead of the log directory.
    #[arg(long)]
    log_stderr: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start a conversation (default).
    Chat,

    /// Check that the research service is up.
    Health,

    /// Report which speech capabilities were detected.
    Capabilities,

    /// Write the default configuration file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let target = if cli.log_stderr {
        LogTarget::Stderr
    } else {
        LogTarget::default()
    };
    let _log_guard = logging::init(&target)?;

    let mut config = match cli.command {
        Some(Command::InitConfig { .. }) => DeskConfig::default(),
        _ => DeskConfig::load(cli.config.as_deref())?,
    };
    if let Some(endpoint) = cli.endpoint {
        config.endpoint.url = endpoint;
    }
    if let Some(persona) = cli.persona {
        config.chat.persona = persona;
    }
    if cli.voice {
        config.chat.voice_output = true;
    }

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            config.validate()?;
            run_chat(config).await
        }
        Command::Health => check_health(&config).await,
        Command::Capabilities => {
            report_capabilities(&config);
            Ok(())
        }
        Command::InitConfig { force } => init_config(cli.config, &config, force),
    }
}

async fn run_chat(config: DeskConfig) -> anyhow::Result<()> {
    println!("account-desk v{}", env!("CARGO_PKG_VERSION"));

    let backend: Arc<dyn ChatBackend> = Arc::new(HttpChatBackend::new(&config.endpoint.url)?);
    let synth = CommandSynthesizer::detect(&config.speech_output)
        .map(|s| Arc::new(s) as Arc<dyn SpeechSynthesizer>);
    let speaker = Speaker::new(synth, &config.speech_output);
    let recognizer = CommandRecognizer::detect(&config.speech_input)
        .map(|r| Arc::new(r) as Arc<dyn SpeechRecognizer>);

    let app = ChatApp::new(
        &config,
        backend,
        speaker,
        recognizer,
        TerminalSurface::stdout(),
    );
    info!(session_id = %app.session(), endpoint = %config.endpoint.url, "chat started");

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            cancel_clone.cancel();
        }
    });

    let (line_tx, line_rx) = mpsc::channel(16);
    let reader = spawn_stdin_reader(line_tx);

    app.run(line_rx, cancel).await;
    reader.abort();
    Ok(())
}

async fn check_health(config: &DeskConfig) -> anyhow::Result<()> {
    let backend = HttpChatBackend::new(&config.endpoint.url)?;
    match backend.health().await {
        Ok(status) if status.is_ok() => {
            println!("{}: ok", backend.health_url());
            Ok(())
        }
        Ok(status) => anyhow::bail!("{}: status `{}`", backend.health_url(), status.status),
        Err(e) => anyhow::bail!("{}: {e}", backend.health_url()),
    }
}

fn report_capabilities(config: &DeskConfig) {
    match CommandSynthesizer::detect(&config.speech_output) {
        Capability::Available(synth) => {
            println!("Speech output: {}", synth.program().display());
        }
        Capability::Unavailable { reason } => println!("Speech output: unavailable ({reason})"),
    }
    match CommandRecognizer::detect(&config.speech_input) {
        Capability::Available(recognizer) => println!("Speech input: {}", recognizer.name()),
        Capability::Unavailable { reason } => println!("Speech input: unavailable ({reason})"),
    }
}

fn init_config(path: Option<PathBuf>, config: &DeskConfig, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(DeskConfig::default_config_path);
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    config.save_to_file(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
