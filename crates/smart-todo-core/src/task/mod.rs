//! Task and context types passed into the suggestion engine.
//!
//! These are plain values handed over by the persistence layer. The engine
//! never stores them and never writes them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Maximum title length accepted from callers.
pub const MAX_TITLE_LEN: usize = 200;

/// Explicit priority label of a task.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    /// Weight of the label in the priority score.
    pub fn weight(self) -> f64 {
        match self {
            Priority::Low => 0.25,
            Priority::Medium => 0.5,
            Priority::High => 0.75,
            Priority::Urgent => 1.0,
        }
    }

    /// Map a [0,1] priority score back onto a label.
    ///
    /// - `>= 0.8`: urgent
    /// - `>= 0.6`: high
    /// - `>= 0.4`: medium
    /// - otherwise: low
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Priority::Urgent
        } else if score >= 0.6 {
            Priority::High
        } else if score >= 0.4 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(CoreError::invalid(
                "priority",
                format!("expected one of low, medium, high, urgent; got '{other}'"),
            )),
        }
    }
}

/// Lifecycle status, only consulted for workload estimation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// A task as supplied by the caller.
///
/// `priority` is optional: when absent the engine infers a label from the
/// task text and falls back to [`Priority::Medium`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Caller-side identifier, echoed back in rankings
    #[serde(default)]
    pub id: Option<String>,
    /// Task title (required, non-empty)
    #[serde(default)]
    pub title: String,
    /// Optional free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Current category label, if any
    #[serde(default)]
    pub category: Option<String>,
    /// Explicit priority label
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Hard deadline
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Estimated duration in minutes
    #[serde(default, alias = "estimated_minutes")]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl TaskDescriptor {
    /// Create a task with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            category: None,
            priority: None,
            status: TaskStatus::Pending,
            deadline: None,
            estimated_duration: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration = Some(minutes);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Reject tasks the engine cannot reason about.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`] for a blank or oversized title.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::invalid("title", "must not be empty"));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(CoreError::invalid(
                "title",
                format!("must be at most {MAX_TITLE_LEN} characters"),
            ));
        }
        Ok(())
    }

    /// Title and description joined into one text.
    pub fn text(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(desc) if !desc.is_empty() => format!("{}. {}", self.title.trim(), desc),
            _ => self.title.trim().to_string(),
        }
    }

    /// Whether the task still counts towards the open workload.
    pub fn is_open(&self) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

/// Where a context snippet came from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[serde(alias = "whatsapp", alias = "sms", alias = "chat")]
    Message,
    Email,
    #[serde(alias = "meeting", alias = "call")]
    #[default]
    Note,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceType::Message => "message",
            SourceType::Email => "email",
            SourceType::Note => "note",
        })
    }
}

impl FromStr for SourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "message" | "whatsapp" | "sms" | "chat" => Ok(SourceType::Message),
            "email" => Ok(SourceType::Email),
            "note" | "meeting" | "call" => Ok(SourceType::Note),
            other => Err(CoreError::invalid(
                "source",
                format!("expected message, email or note; got '{other}'"),
            )),
        }
    }
}

/// A piece of daily context (message, email, note).
///
/// Fields are private: a snippet cannot be changed after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    #[serde(default, alias = "content")]
    text: String,
    #[serde(default, alias = "context_type")]
    source: SourceType,
    /// Unset until the caller stamps it, see [`ContextSnippet::stamped`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
}

impl ContextSnippet {
    pub fn new(text: impl Into<String>, source: SourceType, timestamp: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            source,
            timestamp: Some(timestamp),
            sender: None,
            subject: None,
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> SourceType {
        self.source
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Fill a missing timestamp with `now`; an existing one is kept.
    pub fn stamped(mut self, now: DateTime<Utc>) -> Self {
        self.timestamp.get_or_insert(now);
        self
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Subject and body as one text.
    pub fn full_text(&self) -> String {
        match self.subject.as_deref().map(str::trim) {
            Some(subject) if !subject.is_empty() => format!("{}. {}", subject, self.text),
            _ => self.text.clone(),
        }
    }
}
