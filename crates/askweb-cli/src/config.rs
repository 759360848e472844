//! Configuration loading.
//!
//! Precedence, lowest first: built-in defaults, the TOML file, environment
//! variables, command-line flags. Clap already folds the last two together,
//! so resolution here is `flag.or(file).unwrap_or(default)`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use askweb_core::options::{
    DEFAULT_FILTER, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_NUM_RESULTS, DEFAULT_QUERY_PROMPT,
    DEFAULT_SCREEN_WIDTH, DEFAULT_SUMMARY_PROMPT, DEFAULT_TEMPERATURE, Options,
};
use askweb_db::DEFAULT_TABLE;
use serde::{Deserialize, Serialize};

use crate::Cli;

pub const APP_DIR: &str = "ask-web";
pub const LOCAL_CONFIG_FILE: &str = "ask-web.toml";
pub const CONFIG_FILE: &str = "config.toml";
pub const LOG_FILE: &str = "ask-web.log";
pub const DB_FILE: &str = "ask-web.db";

/// `$XDG_CONFIG_HOME/ask-web` (or the platform equivalent).
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// The TOML file as written by the user. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub model: ModelSection,
    pub logging: LoggingSection,
    pub database: DatabaseSection,
    pub screen: ScreenSection,
    pub filter: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    pub default: Option<String>,
    pub max_tokens: Option<u32>,
    pub num_results: Option<usize>,
    pub temperature: Option<f32>,
    pub query_prompt: Option<String>,
    pub summary_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub file: Option<String>,
    pub table: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScreenSection {
    pub width: Option<usize>,
}

impl FileConfig {
    /// Pick the config file: the explicit path, else `./ask-web.toml`, else
    /// `<config dir>/config.toml`. `None` when nothing exists.
    pub fn locate(explicit: Option<&Path>, config_dir: &Path) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(expand_path(&path.to_string_lossy()));
        }
        [PathBuf::from(LOCAL_CONFIG_FILE), config_dir.join(CONFIG_FILE)]
            .into_iter()
            .find(|p| p.exists())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Everything the binary needs after configuration is resolved.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub config_file: Option<PathBuf>,
    pub log_file: PathBuf,
    pub database_file: PathBuf,
    pub database_table: String,
    pub options: Options,
}

impl Settings {
    pub fn resolve(
        cli: &Cli,
        file: FileConfig,
        config_dir: &Path,
        config_file: Option<PathBuf>,
    ) -> Self {
        let model = file.model;

        let options = Options {
            model: cli
                .model
                .clone()
                .or(model.default)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            num_results: cli
                .num_results
                .or(model.num_results)
                .unwrap_or(DEFAULT_NUM_RESULTS),
            max_tokens: cli
                .max_tokens
                .or(model.max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: cli
                .temperature
                .or(model.temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
            query_prompt: cli
                .query_prompt
                .clone()
                .or(model.query_prompt)
                .unwrap_or_else(|| DEFAULT_QUERY_PROMPT.to_string()),
            summary_prompt: cli
                .summary_prompt
                .clone()
                .or(model.summary_prompt)
                .unwrap_or_else(|| DEFAULT_SUMMARY_PROMPT.to_string()),
            filter: file
                .filter
                .unwrap_or_else(|| DEFAULT_FILTER.iter().map(|s| s.to_string()).collect()),
            screen_width: cli
                .width
                .or(file.screen.width)
                .unwrap_or(DEFAULT_SCREEN_WIDTH),
            rewrite_query: !cli.no_rewrite,
            ..Options::default()
        };

        let log_file = file
            .logging
            .file
            .map(|f| expand_path(&f))
            .unwrap_or_else(|| config_dir.join(LOG_FILE));

        let database_file = cli
            .database
            .clone()
            .or_else(|| file.database.file.map(|f| expand_path(&f)))
            .unwrap_or_else(|| config_dir.join(DB_FILE));

        Self {
            config_file,
            log_file,
            database_file,
            database_table: file
                .database
                .table
                .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            options,
        }
    }
}

/// Expand `$VAR`, `${VAR}` and a leading `~` in a configured path.
pub fn expand_path(raw: &str) -> PathBuf {
    expand_with(raw, |name| std::env::var(name).ok(), dirs::home_dir())
}

fn expand_with(
    raw: &str,
    lookup: impl Fn(&str) -> Option<String>,
    home: Option<PathBuf>,
) -> PathBuf {
    let expanded = expand_vars(raw, &lookup);
    if let (Some(rest), Some(home)) = (expanded.strip_prefix('~'), home) {
        if rest.is_empty() || rest.starts_with('/') {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(expanded)
}

/// Unset variables expand to the empty string.
fn expand_vars(raw: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = match after.strip_prefix('{') {
            Some(braced) => match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            },
            None => {
                let end = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                (&after[..end], end)
            }
        };

        if name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }
        out.push_str(&lookup(name).unwrap_or_default());
        rest = &after[consumed..];
    }

    out.push_str(rest);
    out
}
