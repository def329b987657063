//! DocAudit CLI
//!
//! Parse, summarize, chat about and audit documents against the style
//! guide library from the command line.

mod app;
mod commands;
mod output;
mod telemetry;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "docaudit",
    author = "DocAudit Team",
    version,
    about = "DocAudit - document analysis and style-guide audits",
    long_about = "A command-line interface for DocAudit.\n\n\
                  Extract text from uploaded documents, ask questions about them\n\
                  and audit them against the writing style guides."
)]
pub struct Cli {
    /// Configuration file (TOML); DOCAUDIT__* environment variables override it
    #[arg(short, long, env = "DOCAUDIT_CONFIG")]
    config: Option<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Enable verbose error output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from local files and report token counts
    Parse {
        /// Files to parse
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize local files through the inference endpoint
    Summarize {
        /// Files to summarize
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Chat about local files
    Chat {
        /// Files to use as context
        files: Vec<PathBuf>,

        /// Send one message and exit
        #[arg(short, long)]
        message: Option<String>,

        /// Condense the files before chatting
        #[arg(short, long)]
        summarize: bool,
    },

    /// Audit a stored document against the style guides
    Audit {
        #[command(flatten)]
        store: StoreArgs,

        /// Comma-separated names of the stored files to audit
        #[arg(short, long)]
        file: String,

        /// Comma-separated style guide names (default: all)
        #[arg(short, long, default_value = "")]
        guides: String,

        /// Condense the document before auditing
        #[arg(short, long)]
        summarize: bool,
    },

    /// Ask a question about stored files
    Query {
        #[command(flatten)]
        store: StoreArgs,

        /// Comma-separated names of the stored files to use
        #[arg(short, long, default_value = "")]
        files: String,

        /// The question to ask
        question: String,

        /// Condense the files before asking
        #[arg(short, long)]
        summarize: bool,
    },

    /// Upload local files to the store
    Upload {
        #[command(flatten)]
        store: StoreArgs,

        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Location of stored uploads
#[derive(clap::Args)]
pub struct StoreArgs {
    /// Blob store root directory
    #[arg(long, env = "DOCAUDIT_STORE", default_value = "data/uploads")]
    pub store: PathBuf,

    /// User whose uploads to use
    #[arg(short, long, env = "DOCAUDIT_USER", default_value = "local")]
    pub user: String,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// List the default style guides and whether they are present
    Guides,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = telemetry::init_telemetry(&cli.log_level, cli.json_logs) {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        return ExitCode::FAILURE;
    }

    let result = run(&cli).await;

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            if cli.verbose {
                for cause in e.chain().skip(1) {
                    eprintln!("{}: {}", "Caused by".yellow(), cause);
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = app::load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Parse { files, json } => commands::parse::run(&config, files, *json).await,
        Commands::Summarize { files } => commands::summarize::run(&config, files).await,
        Commands::Chat {
            files,
            message,
            summarize,
        } => commands::chat::run(&config, files, message.clone(), *summarize).await,
        Commands::Audit {
            store,
            file,
            guides,
            summarize,
        } => commands::audit::run(&config, store, file, guides, *summarize).await,
        Commands::Query {
            store,
            files,
            question,
            summarize,
        } => commands::query::run(&config, store, files, question, *summarize).await,
        Commands::Upload { store, files } => commands::upload::run(store, files).await,
        Commands::Config(cmd) => commands::config::run(&config, cmd),
    }
}
