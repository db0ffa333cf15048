//! Qualification scoring: blends inference sub-scores into the running score.

use crate::domain::conversation::MAX_QUALIFICATION_SCORE;

/// Weights for the evaluation sub-scores. They are expected to sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    /// Weight for information quality (default: 0.30)
    pub information_quality: f64,
    /// Weight for buying intent (default: 0.40)
    pub buying_intent: f64,
    /// Weight for qualification level (default: 0.30)
    pub qualification_level: f64,
}

pub const DEFAULT_WEIGHTS: ScoringWeights =
    ScoringWeights { information_quality: 0.30, buying_intent: 0.40, qualification_level: 0.30 };

/// Score bump applied when an evaluation reply cannot be parsed.
pub const PARSE_FAILURE_INCREMENT: u8 = 10;

/// Sub-score assumed when the evaluation omits one.
pub const NEUTRAL_SUB_SCORE: f64 = 50.0;

impl Default for ScoringWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

/// Sub-scores (0-100) produced by the inference service for one response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseAssessment {
    pub information_quality: f64,
    pub buying_intent: f64,
    pub qualification_level: f64,
}

impl Default for ResponseAssessment {
    fn default() -> Self {
        Self {
            information_quality: NEUTRAL_SUB_SCORE,
            buying_intent: NEUTRAL_SUB_SCORE,
            qualification_level: NEUTRAL_SUB_SCORE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QualificationScorer {
    weights: ScoringWeights,
    parse_failure_increment: u8,
}

impl Default for QualificationScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl QualificationScorer {
    pub fn new() -> Self {
        Self { weights: ScoringWeights::default(), parse_failure_increment: PARSE_FAILURE_INCREMENT }
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights, ..Self::new() }
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// Weighted blend of the sub-scores, each clamped to 0-100 first.
    pub fn weighted_score(&self, assessment: &ResponseAssessment) -> f64 {
        clamp_sub_score(assessment.information_quality) * self.weights.information_quality
            + clamp_sub_score(assessment.buying_intent) * self.weights.buying_intent
            + clamp_sub_score(assessment.qualification_level) * self.weights.qualification_level
    }

    /// Moves the running score halfway towards the new evaluation, so one noisy
    /// reading cannot swing it further than that.
    pub fn blend(&self, current: u8, assessment: &ResponseAssessment) -> u8 {
        let fresh = self.weighted_score(assessment);
        let blended = ((f64::from(current) + fresh) / 2.0).round();
        clamp_score(blended)
    }

    /// Score after an evaluation reply that could not be parsed.
    pub fn on_parse_failure(&self, current: u8) -> u8 {
        current.saturating_add(self.parse_failure_increment).min(MAX_QUALIFICATION_SCORE)
    }
}

fn clamp_sub_score(value: f64) -> f64 {
    if value.is_nan() {
        return NEUTRAL_SUB_SCORE;
    }
    value.clamp(0.0, f64::from(MAX_QUALIFICATION_SCORE))
}

fn clamp_score(value: f64) -> u8 {
    value.clamp(0.0, f64::from(MAX_QUALIFICATION_SCORE)) as u8
}
