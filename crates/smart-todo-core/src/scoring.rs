//! Weighted priority scoring.
//!
//! A task's priority score is a linear combination of four objective terms,
//! each in [0, 1]:
//!
//! ```text
//! score = w1 * explicit_priority + w2 * urgency
//!       + w3 * deadline_proximity + w4 * sentiment_pressure
//! ```
//!
//! The weights are configuration and are normalized to sum to 1.0, so the
//! total is always within [0, 1]. Every term is kept in a [`ScoreBreakdown`]
//! for explainability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::FeatureVector;
use crate::task::Priority;

const HOURS_PER_DAY: f64 = 24.0;

/// Individual objective term with weight and score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveTerm {
    /// Term name
    pub name: String,
    /// Weight for this term (0.0 to 1.0)
    pub weight: f64,
    /// Raw score (0.0 to 1.0)
    pub score: f64,
    /// Weighted contribution
    pub contribution: f64,
}

impl ObjectiveTerm {
    /// Create a new objective term
    pub fn new(name: impl Into<String>, weight: f64, score: f64) -> Self {
        let weight = sanitize(weight);
        let score = sanitize(score);
        Self {
            name: name.into(),
            weight,
            score,
            contribution: weight * score,
        }
    }
}

/// Complete scoring breakdown for explainability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Individual objective terms
    pub terms: Vec<ObjectiveTerm>,
    /// Total weighted score (0.0 to 1.0)
    pub total_score: f64,
    /// Reference time the deadline term was computed against
    pub scored_at: DateTime<Utc>,
}

impl ScoreBreakdown {
    /// Create a new empty breakdown
    pub fn new(scored_at: DateTime<Utc>) -> Self {
        Self {
            terms: Vec::new(),
            total_score: 0.0,
            scored_at,
        }
    }

    /// Add a term to the breakdown
    pub fn add_term(&mut self, term: ObjectiveTerm) {
        self.total_score = sanitize(self.total_score + term.contribution);
        self.terms.push(term);
    }

    /// Get the top contributing term
    pub fn top_term(&self) -> Option<&ObjectiveTerm> {
        self.terms
            .iter()
            .max_by(|a, b| a.contribution.total_cmp(&b.contribution))
    }

    /// Get terms sorted by contribution (descending)
    pub fn terms_by_contribution(&self) -> Vec<&ObjectiveTerm> {
        let mut sorted: Vec<_> = self.terms.iter().collect();
        sorted.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
        sorted
    }
}

/// Weights for each objective term
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeights {
    /// Weight for the explicit (or inferred) priority label
    pub explicit_priority: f64,
    /// Weight for urgency detected in the text
    pub urgency: f64,
    /// Weight for deadline proximity
    pub deadline_proximity: f64,
    /// Weight for negative-sentiment pressure
    pub sentiment: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            explicit_priority: 0.45,
            urgency: 0.35,
            deadline_proximity: 0.15,
            sentiment: 0.05,
        }
    }
}

impl PriorityWeights {
    fn sum(&self) -> f64 {
        self.explicit_priority + self.urgency + self.deadline_proximity + self.sentiment
    }

    /// Normalize weights to sum to 1.0
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum > 0.0 && sum.is_finite() {
            self.explicit_priority /= sum;
            self.urgency /= sum;
            self.deadline_proximity /= sum;
            self.sentiment /= sum;
        }
    }

    /// Copy of the weights normalized to sum to 1.0
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Validate that all weights are finite, non-negative and not all zero
    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            ("explicit_priority", self.explicit_priority),
            ("urgency", self.urgency),
            ("deadline_proximity", self.deadline_proximity),
            ("sentiment", self.sentiment),
        ];

        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("Weight '{}' must be a non-negative number, got {}", name, weight));
            }
        }

        if self.sum() <= 0.0 {
            return Err("At least one weight must be positive".to_string());
        }

        Ok(())
    }
}

/// Deadline proximity factor in [0, 1].
///
/// - No deadline: 0.0
/// - Past or within 24h: 1.0
/// - Otherwise linear decay to 0.0 at `horizon_days`
///
/// A horizon of one day or less leaves no room to decay, so any deadline
/// counts as already due.
pub fn deadline_proximity_factor(
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    horizon_days: f64,
) -> f64 {
    let Some(deadline) = deadline else {
        return 0.0;
    };

    let hours_left = deadline.signed_duration_since(now).num_seconds() as f64 / 3600.0;
    if hours_left <= HOURS_PER_DAY {
        return 1.0;
    }

    let horizon_hours = horizon_days * HOURS_PER_DAY;
    if !horizon_hours.is_finite() || horizon_hours <= HOURS_PER_DAY {
        return 1.0;
    }

    let factor = 1.0 - (hours_left - HOURS_PER_DAY) / (horizon_hours - HOURS_PER_DAY);
    sanitize(factor)
}

/// Pressure implied by sentiment: negative tone raises it, positive tone is neutral.
pub fn sentiment_pressure(polarity: f64) -> f64 {
    sanitize(-polarity)
}

/// Result of scoring one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityAssessment {
    /// Weighted score (0.0 to 1.0)
    pub priority_score: f64,
    /// Label the score maps to
    pub suggested_priority: Priority,
    /// Label that entered the score
    pub effective_priority: Priority,
    /// True when `effective_priority` was inferred from text
    pub priority_inferred: bool,
    pub breakdown: ScoreBreakdown,
    /// Human-readable explanation
    pub reasoning: String,
}

/// Priority calculator
#[derive(Debug, Clone)]
pub struct PriorityCalculator {
    weights: PriorityWeights,
    horizon_days: f64,
    urgency_threshold: f64,
    now: DateTime<Utc>,
}

impl PriorityCalculator {
    /// Create a calculator; weights are normalized.
    pub fn new(weights: PriorityWeights, horizon_days: f64, now: DateTime<Utc>) -> Self {
        Self {
            weights: weights.normalized(),
            horizon_days,
            urgency_threshold: 0.5,
            now,
        }
    }

    /// Urgency confidence above which the reasoning mentions urgency.
    pub fn with_urgency_threshold(mut self, threshold: f64) -> Self {
        self.urgency_threshold = threshold;
        self
    }

    /// Score a task given its label, extracted features and deadline.
    pub fn assess(
        &self,
        priority: Priority,
        priority_inferred: bool,
        features: &FeatureVector,
        deadline: Option<DateTime<Utc>>,
    ) -> PriorityAssessment {
        let proximity = deadline_proximity_factor(deadline, self.now, self.horizon_days);

        let mut breakdown = ScoreBreakdown::new(self.now);
        breakdown.add_term(ObjectiveTerm::new(
            "explicit_priority",
            self.weights.explicit_priority,
            priority.weight(),
        ));
        breakdown.add_term(ObjectiveTerm::new(
            "urgency",
            self.weights.urgency,
            features.urgency_confidence,
        ));
        breakdown.add_term(ObjectiveTerm::new(
            "deadline_proximity",
            self.weights.deadline_proximity,
            proximity,
        ));
        breakdown.add_term(ObjectiveTerm::new(
            "sentiment",
            self.weights.sentiment,
            sentiment_pressure(features.sentiment),
        ));

        let priority_score = breakdown.total_score.clamp(0.0, 1.0);
        let reasoning = self.reasoning(priority, priority_inferred, features, deadline, priority_score);

        PriorityAssessment {
            priority_score,
            suggested_priority: Priority::from_score(priority_score),
            effective_priority: priority,
            priority_inferred,
            breakdown,
            reasoning,
        }
    }

    fn reasoning(
        &self,
        priority: Priority,
        priority_inferred: bool,
        features: &FeatureVector,
        deadline: Option<DateTime<Utc>>,
        score: f64,
    ) -> String {
        let mut reasons = Vec::new();

        if let Some(deadline) = deadline {
            let hours_left = deadline.signed_duration_since(self.now).num_hours();
            if hours_left < 0 {
                reasons.push("Deadline has passed".to_string());
            } else if hours_left <= 24 {
                reasons.push("Deadline is very close (within 1 day)".to_string());
            } else if hours_left <= 72 {
                reasons.push("Deadline approaching (within 3 days)".to_string());
            }
        }

        if features.urgency_confidence >= self.urgency_threshold {
            if features.urgency_markers.is_empty() {
                reasons.push("Urgency detected in text".to_string());
            } else {
                reasons.push(format!(
                    "Urgency detected ({})",
                    features.urgency_markers.join(", ")
                ));
            }
        }

        if features.sentiment < -0.2 {
            reasons.push("Stressed tone in context".to_string());
        }

        match (priority, priority_inferred) {
            (Priority::Urgent, false) => reasons.push("Marked as urgent priority".to_string()),
            (Priority::Urgent, true) => reasons.push("Wording implies urgent priority".to_string()),
            (Priority::High, false) => reasons.push("Marked as high priority".to_string()),
            _ => {}
        }

        if reasons.is_empty() {
            reasons.push(format!("Priority score: {score:.2}"));
        }

        reasons.join("; ")
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
