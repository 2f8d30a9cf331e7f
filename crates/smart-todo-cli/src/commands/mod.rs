pub mod analyze;
pub mod completions;
pub mod config;
pub mod plan;
pub mod request;
pub mod suggest;

use chrono::{DateTime, Utc};
use smart_todo_core::{Config, ContextSnippet, SourceType, SuggestionEngine};
use std::io::Read;
use std::path::{Path, PathBuf};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Flags shared by every command.
pub struct Globals {
    pub config_path: Option<PathBuf>,
    pub now: Option<DateTime<Utc>>,
    pub local: bool,
}

impl Globals {
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    pub fn config_path(&self) -> Result<PathBuf, smart_todo_core::ConfigError> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Config::path(),
        }
    }

    pub fn load_config(&self) -> Result<Config, smart_todo_core::ConfigError> {
        Config::load_from(&self.config_path()?)
    }

    /// Engine built from the config, with the API key taken from the environment.
    pub fn engine(&self) -> Result<SuggestionEngine, smart_todo_core::ConfigError> {
        let mut config = self.load_config()?;
        config.generator = std::mem::take(&mut config.generator).with_env_api_key();
        if self.local {
            config.generator.enabled = false;
        }
        let engine = SuggestionEngine::from_config(config);
        tracing::debug!(generator = engine.has_generator(), "engine ready");
        Ok(engine)
    }
}

/// Runtime for the async engine calls.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Read a file, or stdin when `path` is absent or `-`.
pub fn read_input(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// One note snippet per context argument, stamped `now`.
pub fn note_snippets(texts: &[String], now: DateTime<Utc>) -> Vec<ContextSnippet> {
    texts
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| ContextSnippet::new(t.clone(), SourceType::Note, now))
        .collect()
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
