//! CLI entrypoint for scribe
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use scribe_application::{
    ConversationLogger, ResolveReferencesUseCase, RunToolLoopInput, RunToolLoopUseCase,
    ToolLoopObserver, describe_resolution,
};
use scribe_domain::{ChatMessage, build_scope, parse_references};
use scribe_infrastructure::{
    ConfigLoader, DryRunToolExecutor, FileConfig, FileOutputFormat, InMemoryReferenceLookup,
    JsonSchemaToolConverter, JsonlConversationLogger, OpenAiCompatibleProvider, WorkspaceFixture,
};
use scribe_presentation::{
    ChatArgs, Cli, Command, ConsoleFormatter, OutputFormat, ResolveArgs, SimpleToolProgress,
    ToolProgressReporter, configure_color,
};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_tracing(cli.verbose, config.logging.log_dir.as_deref());
    configure_color(config.output.color);

    let format = cli.output.unwrap_or(match config.output.format.unwrap_or_default() {
        FileOutputFormat::Text => OutputFormat::Text,
        FileOutputFormat::Json => OutputFormat::Json,
    });

    let Some(command) = cli.command else {
        bail!("A command is required. Run `scribe --help` for usage.");
    };

    match command {
        Command::Resolve(args) => resolve(args, format).await,
        Command::Chat(args) => chat(args, &config, format, cli.quiet).await,
    }
}

/// Stderr logging filtered by `-v`, plus a daily-rolling file when configured.
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "scribe.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn load_workspace(path: &Path) -> Result<Arc<WorkspaceFixture>> {
    let workspace = WorkspaceFixture::load(path)
        .with_context(|| format!("Failed to load workspace {}", path.display()))?;
    info!(
        "Loaded workspace {} ({} files, {} contents, {} sources)",
        workspace.organization_id,
        workspace.files.len(),
        workspace.contents.len(),
        workspace.sources.len()
    );
    Ok(Arc::new(workspace))
}

async fn resolve(args: ResolveArgs, format: OutputFormat) -> Result<()> {
    let workspace = load_workspace(&args.workspace)?;
    let lookup = Arc::new(InMemoryReferenceLookup::new().with_workspace((*workspace).clone()));
    let resolver = ResolveReferencesUseCase::new(lookup);

    let tokens = parse_references(&args.message);
    let outcome = resolver
        .execute(&tokens, &workspace.organization_id)
        .await?;
    let scope = build_scope(&outcome.resolved);

    let output = match format {
        OutputFormat::Text => ConsoleFormatter::format_resolution(&tokens, &outcome, &scope),
        OutputFormat::Json => ConsoleFormatter::format_resolution_json(&tokens, &outcome, &scope),
    };
    println!("{}", output);
    Ok(())
}

fn load_history(path: Option<&Path>) -> Result<Vec<ChatMessage>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid history file {}", path.display()))
}

async fn chat(args: ChatArgs, config: &FileConfig, format: OutputFormat, quiet: bool) -> Result<()> {
    let workspace = load_workspace(&args.workspace)?;
    let history = load_history(args.history.as_deref())?;

    // === Mentions ===
    let lookup = Arc::new(InMemoryReferenceLookup::new().with_workspace((*workspace).clone()));
    let resolver = ResolveReferencesUseCase::new(lookup);
    let outcome = resolver
        .resolve_message(&args.message, &workspace.organization_id)
        .await?;
    let scope = build_scope(&outcome.resolved);

    let mut input = RunToolLoopInput::new(args.message.clone(), args.mode.into())
        .with_history(history)
        .with_scope(scope);
    if let Some(block) = describe_resolution(&outcome) {
        input = input.with_context_block(block);
    }

    // === Dependency Injection ===
    let provider = Arc::new(OpenAiCompatibleProvider::from_config(&config.provider)?);
    let executor = Arc::new(DryRunToolExecutor::new(workspace.clone()));
    let schema = Arc::new(JsonSchemaToolConverter);

    let mut params = config.to_params();
    if let Some(model) = &args.model {
        params = params.with_model(model.clone());
    }

    let cancellation = CancellationToken::new();
    let mut use_case = RunToolLoopUseCase::new(provider, executor, schema)
        .with_params(params)
        .with_cancellation(cancellation.clone());

    if let Some(path) = &config.logging.transcript_path {
        match JsonlConversationLogger::new(path) {
            Some(logger) => {
                let logger: Arc<dyn ConversationLogger> = Arc::new(logger);
                use_case = use_case.with_conversation_logger(logger);
            }
            None => warn!("Continuing without a transcript"),
        }
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancellation.cancel();
        }
    });

    let output = if quiet {
        use_case.execute(input).await
    } else {
        // Spinners only make sense next to text output
        let observer: Box<dyn ToolLoopObserver> = match format {
            OutputFormat::Text => Box::new(ToolProgressReporter::new()),
            OutputFormat::Json => Box::new(SimpleToolProgress),
        };
        use_case.execute_with_progress(input, observer.as_ref()).await
    };

    let rendered = match format {
        OutputFormat::Text => ConsoleFormatter::format_turn(&output),
        OutputFormat::Json => ConsoleFormatter::format_turn_json(&output),
    };
    println!("{}", rendered);

    if !output.is_completed() {
        bail!("Turn ended early: {}", output.termination);
    }
    Ok(())
}
