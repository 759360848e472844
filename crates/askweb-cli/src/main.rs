mod config;
mod credentials;

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use askweb_client::{
    BackendKind, BingSearch, DuckDuckGoSearch, GoogleSearch, LlmBackend, LlmQueryFormulator,
    LlmSummarizer, Provider, ReqwestFetcher, StrictCleaner,
};
use askweb_core::error::AppError;
use askweb_core::linewrap::LineWrapWriter;
use askweb_core::models::Conversation;
use askweb_core::options::Options;
use askweb_core::pipeline::{ResearchEvent, ResearchReporter, ResearchService, TracingReporter};
use askweb_core::query::formulate_query;
use askweb_db::{ConversationRepository, Database, DatabaseConfig};

use crate::config::{FileConfig, Settings};
use crate::credentials::{Credentials, mask};

const DEFAULT_LOG_DIRECTIVES: &str = "ask_web=info,askweb_core=info,askweb_client=info,askweb_db=info";

#[derive(Parser, Debug)]
#[command(
    name = "ask-web",
    version,
    about = "Search the web, read the top pages, and summarize them with an LLM"
)]
pub(crate) struct Cli {
    /// What to ask. Multiple words are joined with spaces
    #[arg(conflicts_with_all = ["search", "show"])]
    query: Vec<String>,

    /// Configuration file (TOML)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Which LLM to use for the summary (chatgpt|gemini)
    #[arg(short, long, env = "ASK_WEB_MODEL")]
    model: Option<String>,

    /// How many web pages to keep per search engine
    #[arg(short, long)]
    num_results: Option<usize>,

    /// Maximum tokens to generate
    #[arg(short = 't', long)]
    max_tokens: Option<u32>,

    /// Temperature for summarization
    #[arg(short = 'T', long)]
    temperature: Option<f32>,

    /// Instruction for turning the prompt into a search query
    #[arg(short, long)]
    query_prompt: Option<String>,

    /// Instruction for the summary
    #[arg(short = 'S', long)]
    summary_prompt: Option<String>,

    /// Database file
    #[arg(short, long, env = "ASK_WEB_DATABASE")]
    database: Option<PathBuf>,

    /// Screen width for line wrapping
    #[arg(long, env = "COLUMNS")]
    width: Option<usize>,

    /// Log to stderr in addition to the log file
    #[arg(long)]
    stderr: bool,

    /// Print the resolved configuration and exit
    #[arg(long)]
    dump_config: bool,

    /// Show which API keys are configured (masked)
    #[arg(long)]
    show_keys: bool,

    /// Search with the prompt as typed instead of asking the LLM for a query
    #[arg(long)]
    no_rewrite: bool,

    /// List past conversations whose summary contains this text
    #[arg(short, long, conflicts_with = "show")]
    search: Option<String>,

    /// Show the stored conversation with this id
    #[arg(long)]
    show: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config_dir = config::config_dir();
    let config_file = FileConfig::locate(cli.config.as_deref(), &config_dir);
    let file = match &config_file {
        Some(path) => FileConfig::load_from(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&cli, file, &config_dir, config_file);

    init_tracing(&settings.log_file, cli.stderr)?;
    settings.options.validate()?;

    if cli.dump_config {
        print!("{}", toml::to_string_pretty(&settings)?);
        return Ok(());
    }

    let credentials = Credentials::resolve(&config_dir);
    tracing::debug!(?credentials, "Credentials resolved");

    let prompt = cli.query.join(" ");
    let has_lookup = cli.search.is_some() || cli.show.is_some();

    if cli.show_keys {
        print_keys(&credentials);
        if prompt.trim().is_empty() && !has_lookup {
            return Ok(());
        }
    }

    if prompt.trim().is_empty() && !has_lookup {
        bail!("No query given. Pass a question, or use --search / --show");
    }

    // The model is checked before any network call.
    let kind = if has_lookup {
        None
    } else {
        Some(BackendKind::parse(&settings.options.model)?)
    };

    let db = open_database(&settings).await?;
    let repo = db.conversation_repo();

    let outcome = match (&cli.search, cli.show, kind) {
        (Some(needle), _, _) => cmd_search(&repo, needle).await,
        (None, Some(id), _) => cmd_show(&repo, id, &settings.options).await,
        (None, None, Some(kind)) => {
            cmd_ask(&prompt, kind, &settings.options, &credentials, repo).await
        }
        (None, None, None) => Ok(()),
    };

    db.close().await;
    outcome
}

/// Log to an append-mode file, mirrored to stderr on request.
fn init_tracing(log_file: &Path, stderr: bool) -> Result<()> {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file: {}", log_file.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_DIRECTIVES))?;

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false);
    let stderr_layer = stderr.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}

async fn open_database(settings: &Settings) -> Result<Database> {
    if let Some(parent) = settings
        .database_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }

    let config = DatabaseConfig::new(&settings.database_file).with_table(&settings.database_table);
    let db = Database::connect(&config)
        .await
        .context("Failed to open database")?;
    db.migrate().await.context("Failed to migrate database")?;
    Ok(db)
}

/// Search engines in merge priority order: Google, DuckDuckGo, Bing.
/// Keyed engines are skipped when their keys are missing.
fn build_providers(credentials: &Credentials, timeout: Duration) -> Result<Vec<Provider>, AppError> {
    let mut providers = Vec::with_capacity(3);

    if let Some((api_key, cse_id)) = credentials.google() {
        providers.push(Provider::Google(GoogleSearch::new(api_key, cse_id, timeout)?));
    } else {
        tracing::info!("Google search disabled: GOOGLE_API_KEY or GOOGLE_CSE_ID not set");
    }

    providers.push(Provider::DuckDuckGo(DuckDuckGoSearch::new(timeout)?));

    if let Some((api_key, config_key)) = credentials.bing() {
        providers.push(Provider::Bing(BingSearch::new(api_key, config_key, timeout)?));
    } else {
        tracing::info!("Bing search disabled: BING_API_KEY or BING_CONFIG_KEY not set");
    }

    Ok(providers)
}

/// Prints the one progress line the user always sees, and logs the rest.
struct ConsoleReporter;

impl ResearchReporter for ConsoleReporter {
    fn report(&self, event: ResearchEvent<'_>) {
        if matches!(event, ResearchEvent::Summarizing { .. }) {
            println!("Summarizing content...");
        }
        TracingReporter.report(event);
    }
}

async fn cmd_ask(
    prompt: &str,
    kind: BackendKind,
    options: &Options,
    credentials: &Credentials,
    repo: ConversationRepository,
) -> Result<()> {
    let backend = LlmBackend::new(
        kind,
        credentials.llm_key(kind),
        Duration::from_secs(options.llm_timeout_secs),
    )?;

    let query = if options.rewrite_query {
        let formulator = LlmQueryFormulator::new(backend.clone(), options);
        formulate_query(Some(&formulator), prompt).await
    } else {
        prompt.to_string()
    };
    tracing::info!(%prompt, %query, "Search query");

    let http_timeout = Duration::from_secs(options.http_timeout_secs);
    let service = ResearchService::with_store(
        build_providers(credentials, http_timeout)?,
        ReqwestFetcher::with_timeout(http_timeout)?,
        StrictCleaner::default(),
        LlmSummarizer::new(backend, options),
        repo,
        options,
    );

    let outcome = service.run(&query, &ConsoleReporter).await?;
    tracing::info!(
        results = outcome.results.len(),
        pages = outcome.pages_used,
        id = ?outcome.conversation_id,
        "Research complete"
    );

    print_wrapped(&outcome.summary, options)
}

async fn cmd_search(repo: &ConversationRepository, needle: &str) -> Result<()> {
    let matches = repo.search(needle).await?;
    if matches.is_empty() {
        println!("No conversations match '{needle}'");
        return Ok(());
    }

    for conversation in &matches {
        println!("{}", summary_line(conversation));
    }
    println!("\nTotal: {} conversations", matches.len());
    Ok(())
}

async fn cmd_show(repo: &ConversationRepository, id: i64, options: &Options) -> Result<()> {
    let Some(conversation) = repo.get(id).await? else {
        bail!("No conversation with id {id}");
    };

    println!("Query: {}", conversation.query);
    println!("Date:  {}", conversation.timestamp.format("%Y-%m-%d %H:%M:%S"));
    println!("Results:");
    for url in &conversation.result_urls {
        println!("  {url}");
    }
    println!();
    print_wrapped(&conversation.summary, options)
}

fn summary_line(conversation: &Conversation) -> String {
    format!(
        "[{}] {}  {}",
        conversation.id,
        conversation.timestamp.format("%Y-%m-%d %H:%M"),
        conversation.query
    )
}

fn print_wrapped(text: &str, options: &Options) -> Result<()> {
    let stdout = io::stdout().lock();
    let mut writer = LineWrapWriter::new(stdout, options.wrap_width(), options.tab_width);
    writer.write_all(text.as_bytes())?;
    let mut stdout = writer.finish()?;
    writeln!(stdout)?;
    Ok(())
}

fn print_keys(credentials: &Credentials) {
    println!("<== API keys ==>");
    for (name, value) in credentials.entries() {
        println!("{name:<16} {}", mask(value));
    }
}
