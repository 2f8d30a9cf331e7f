//! TOML-based engine configuration.
//!
//! Holds every tunable the suggestion engine reads:
//! - Scoring weights and the deadline horizon
//! - Deadline policy per priority label
//! - Keyword tables (categories, urgency markers, priority hints)
//! - Generative model endpoint and timeout
//!
//! Configuration is stored at `~/.config/smart-todo/config.toml`.
//! The generator API key is never written to disk; it is read from
//! `SMART_TODO_API_KEY` or `OPENAI_API_KEY`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::scoring::PriorityWeights;

/// Returns `~/.config/smart-todo[-dev]/` based on SMART_TODO_ENV.
///
/// Set SMART_TODO_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SMART_TODO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("smart-todo-dev")
    } else {
        base_dir.join("smart-todo")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Longest lead time, in days, a deadline policy may ask for.
pub const MAX_POLICY_DAYS: u32 = 365;
/// Longest minimum lead, in hours, for urgent and high priority tasks.
pub const MAX_POLICY_HOURS: u32 = 24 * 365;

/// Priority scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Days until a deadline stops contributing to the score
    #[serde(default = "default_horizon_days")]
    pub horizon_days: f64,
    /// Urgency confidence at or above which text counts as urgent
    #[serde(default = "default_urgency_threshold")]
    pub urgency_threshold: f64,
    /// Urgency contributed by each detected time expression
    #[serde(default = "default_time_expression_weight")]
    pub time_expression_weight: f64,
    #[serde(default)]
    pub weights: PriorityWeights,
}

/// Deadline suggestion policy used when the text names no explicit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlinePolicy {
    /// Minimum lead time for urgent tasks
    #[serde(default = "default_min_hours")]
    pub urgent_min_hours: u32,
    /// Minimum lead time for high priority tasks
    #[serde(default = "default_min_hours")]
    pub high_min_hours: u32,
    #[serde(default = "default_medium_business_days")]
    pub medium_business_days: u32,
    #[serde(default = "default_low_days")]
    pub low_days: u32,
    /// Move low-priority deadlines that land on a weekend to Monday
    #[serde(default = "default_true")]
    pub roll_weekends: bool,
    /// Hour of day used when a time expression names a day but no time
    #[serde(default = "default_due_hour")]
    pub default_due_hour: u32,
    /// Words that make a task look more involved than its estimate suggests
    #[serde(default = "default_complexity_indicators")]
    pub complexity_indicators: Vec<String>,
}

/// Feature extraction limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Candidates shorter than this (in characters) are dropped
    #[serde(default = "default_min_candidate_len")]
    pub min_candidate_len: usize,
    #[serde(default = "default_max_people")]
    pub max_people: usize,
    #[serde(default = "default_max_projects")]
    pub max_projects: usize,
    #[serde(default = "default_max_deadline_phrases")]
    pub max_deadline_phrases: usize,
}

/// Generative model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Use the generator when an API key is available
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after a failed call (0 or 1)
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Never serialized; filled from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Keyword lists that hint at an explicit priority label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityHints {
    #[serde(default)]
    pub urgent: Vec<String>,
    #[serde(default)]
    pub high: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
    #[serde(default)]
    pub low: Vec<String>,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/smart-todo/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub deadline: DeadlinePolicy,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default = "default_priority_hints")]
    pub priority_hints: PriorityHints,
    /// Urgency keyword -> contribution to urgency confidence
    #[serde(default = "default_urgency_keywords")]
    pub urgency_keywords: BTreeMap<String, f64>,
    /// Category -> keyword -> weight
    #[serde(default = "default_categories")]
    pub categories: BTreeMap<String, BTreeMap<String, f64>>,
}

// Default functions
fn default_horizon_days() -> f64 {
    14.0
}
fn default_urgency_threshold() -> f64 {
    0.3
}
fn default_time_expression_weight() -> f64 {
    0.2
}
fn default_min_hours() -> u32 {
    4
}
fn default_medium_business_days() -> u32 {
    2
}
fn default_low_days() -> u32 {
    7
}
fn default_true() -> bool {
    true
}
fn default_due_hour() -> u32 {
    17
}
fn default_complexity_indicators() -> Vec<String> {
    to_strings(&[
        "research",
        "analysis",
        "development",
        "design",
        "planning",
        "coordination",
    ])
}
fn default_top_keywords() -> usize {
    10
}
fn default_max_candidates() -> usize {
    5
}
fn default_min_candidate_len() -> usize {
    6
}
fn default_max_people() -> usize {
    5
}
fn default_max_projects() -> usize {
    3
}
fn default_max_deadline_phrases() -> usize {
    3
}
fn default_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_temperature() -> f32 {
    0.4
}
fn default_max_tokens() -> u32 {
    400
}

fn default_priority_hints() -> PriorityHints {
    PriorityHints {
        urgent: to_strings(&["urgent", "asap", "immediately", "critical", "emergency"]),
        high: to_strings(&["important", "priority", "deadline", "soon", "quick"]),
        medium: to_strings(&["normal", "regular", "standard", "moderate"]),
        low: to_strings(&["later", "whenever", "optional", "nice-to-have", "someday"]),
    }
}

fn default_urgency_keywords() -> BTreeMap<String, f64> {
    [
        ("asap", 0.8),
        ("urgent", 0.8),
        ("urgently", 0.8),
        ("immediately", 0.8),
        ("emergency", 0.8),
        ("critical", 0.6),
        ("deadline", 0.4),
        ("due", 0.4),
        ("overdue", 0.6),
        ("today", 0.3),
        ("tonight", 0.3),
        ("now", 0.3),
        ("soon", 0.2),
    ]
    .into_iter()
    .map(|(k, w)| (k.to_string(), w))
    .collect()
}

fn default_categories() -> BTreeMap<String, BTreeMap<String, f64>> {
    let table: [(&str, &[&str]); 8] = [
        (
            "work",
            &["meeting", "project", "deadline", "client", "report", "presentation"],
        ),
        ("personal", &["family", "hobby", "personal", "friend", "birthday"]),
        ("shopping", &["buy", "purchase", "shop", "grocery", "store"]),
        (
            "health",
            &["doctor", "appointment", "medicine", "exercise", "fitness"],
        ),
        ("finance", &["payment", "bill", "bank", "money", "budget", "tax"]),
        (
            "education",
            &["study", "course", "learn", "book", "exam", "homework"],
        ),
        ("travel", &["trip", "vacation", "flight", "hotel", "travel"]),
        ("home", &["clean", "repair", "maintenance", "home", "house"]),
    ];
    table
        .iter()
        .map(|(category, keywords)| {
            let keywords = keywords.iter().map(|k| (k.to_string(), 1.0)).collect();
            (category.to_string(), keywords)
        })
        .collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            urgency_threshold: default_urgency_threshold(),
            time_expression_weight: default_time_expression_weight(),
            weights: PriorityWeights::default(),
        }
    }
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            urgent_min_hours: default_min_hours(),
            high_min_hours: default_min_hours(),
            medium_business_days: default_medium_business_days(),
            low_days: default_low_days(),
            roll_weekends: true,
            default_due_hour: default_due_hour(),
            complexity_indicators: default_complexity_indicators(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            top_keywords: default_top_keywords(),
            max_candidates: default_max_candidates(),
            min_candidate_len: default_min_candidate_len(),
            max_people: default_max_people(),
            max_projects: default_max_projects(),
            max_deadline_phrases: default_max_deadline_phrases(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
        }
    }
}

impl GeneratorConfig {
    /// Pick up the API key from the environment.
    pub fn with_env_api_key(mut self) -> Self {
        self.api_key = ["SMART_TODO_API_KEY", "OPENAI_API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty());
        self
    }

    /// Whether a generator should be constructed at all.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl Default for PriorityHints {
    fn default() -> Self {
        default_priority_hints()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            deadline: DeadlinePolicy::default(),
            features: FeatureConfig::default(),
            generator: GeneratorConfig::default(),
            priority_hints: default_priority_hints(),
            urgency_keywords: default_urgency_keywords(),
            categories: default_categories(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".into(),
        };
        let unparsable = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                // Keyword tables accept new entries; everything else must exist.
                let existing = obj.get(part);
                let new_value = match existing {
                    Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| unparsable(e.to_string()))?,
                    ),
                    Some(serde_json::Value::Number(_)) | None => {
                        if existing.is_none() && !key.starts_with("categories.") && !key.starts_with("urgency_keywords.") {
                            return Err(unknown());
                        }
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| unparsable(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(unparsable(format!("cannot parse '{value}' as number")));
                        }
                    }
                    Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                        serde_json::from_str(value).map_err(|e| unparsable(e.to_string()))?
                    }
                    Some(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config file location.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/smart-todo"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, or return defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, or return defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("falling back to default config: {e}");
            Self::default()
        })
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The caller decides whether to save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let mut updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        updated.generator.api_key = self.generator.api_key.take();
        *self = updated;
        Ok(())
    }

    /// Check invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        self.scoring
            .weights
            .validate()
            .map_err(|message| invalid("scoring.weights", &message))?;
        if !self.scoring.horizon_days.is_finite() || self.scoring.horizon_days < 0.0 {
            return Err(invalid("scoring.horizon_days", "must be a non-negative number"));
        }
        if !(0.0..=1.0).contains(&self.scoring.urgency_threshold) {
            return Err(invalid("scoring.urgency_threshold", "must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.scoring.time_expression_weight) {
            return Err(invalid("scoring.time_expression_weight", "must be within [0, 1]"));
        }
        let policy = &self.deadline;
        for (key, hours) in [
            ("deadline.urgent_min_hours", policy.urgent_min_hours),
            ("deadline.high_min_hours", policy.high_min_hours),
        ] {
            if hours > MAX_POLICY_HOURS {
                return Err(invalid(key, &format!("must be at most {MAX_POLICY_HOURS}")));
            }
        }
        for (key, days) in [
            ("deadline.medium_business_days", policy.medium_business_days),
            ("deadline.low_days", policy.low_days),
        ] {
            if days > MAX_POLICY_DAYS {
                return Err(invalid(key, &format!("must be at most {MAX_POLICY_DAYS}")));
            }
        }
        if self.deadline.default_due_hour > 23 {
            return Err(invalid("deadline.default_due_hour", "must be within 0..=23"));
        }
        if self.features.top_keywords == 0 {
            return Err(invalid("features.top_keywords", "must be at least 1"));
        }
        if self.generator.timeout_secs == 0 {
            return Err(invalid("generator.timeout_secs", "must be at least 1"));
        }
        if self.generator.max_retries > 1 {
            return Err(invalid("generator.max_retries", "at most one retry is allowed"));
        }
        for (keyword, weight) in &self.urgency_keywords {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(invalid(&format!("urgency_keywords.{keyword}"), "must be >= 0"));
            }
        }
        for (category, keywords) in &self.categories {
            for (keyword, weight) in keywords {
                if !weight.is_finite() || *weight <= 0.0 {
                    return Err(invalid(
                        &format!("categories.{category}.{keyword}"),
                        "must be > 0",
                    ));
                }
            }
        }
        Ok(())
    }
}
