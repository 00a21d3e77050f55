//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use scribe_domain::ChatMode;
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Chat mode selectable from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Read-only tools
    #[default]
    Chat,
    /// Read, write and ingestion tools
    Agent,
}

impl From<ModeArg> for ChatMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Chat => ChatMode::Chat,
            ModeArg::Agent => ChatMode::Agent,
        }
    }
}

/// CLI arguments for scribe
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version, about = "Mention-aware tool orchestration for content workspaces")]
#[command(long_about = r#"
Scribe resolves @mentions in a chat message against a workspace and runs a
multi-round tool loop against an OpenAI-compatible model.

Mentions:
  @report.pdf            a file
  @acme-launch           a piece of content (slug or title)
  @acme-launch#intro     a section of that content
  @source:yt-123         an external source

Configuration files are loaded from (in priority order):
1. SCRIBE_* environment variables (SCRIBE_PROVIDER__MODEL=...)
2. --config <path>     Explicit config file
3. ./scribe.toml       Project-level config
4. ~/.config/scribe/config.toml   Global config

Example:
  scribe resolve -w workspace.toml "Compare @report.pdf with @acme-launch#intro"
  scribe chat -w workspace.toml "Summarize @acme-launch"
  scribe chat -w workspace.toml --mode agent "Tighten @acme-launch#intro"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format (defaults to [output].format, then text)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the @mentions in a message and print the resulting scope
    Resolve(ResolveArgs),
    /// Run one chat turn with tools
    Chat(ChatArgs),
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Message containing @mentions
    pub message: String,

    /// Workspace fixture (TOML)
    #[arg(short, long, value_name = "PATH")]
    pub workspace: PathBuf,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// The user message for this turn
    pub message: String,

    /// Workspace fixture (TOML)
    #[arg(short, long, value_name = "PATH")]
    pub workspace: PathBuf,

    /// Tool access mode
    #[arg(long, value_enum, default_value = "chat")]
    pub mode: ModeArg,

    /// Prior conversation as a JSON array of messages
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// Model override for this turn
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,
}
