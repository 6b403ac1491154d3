use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use super::recency::{hours_elapsed, recency_bonus};
use crate::profile::PersonProfile;

/// Prediction used for every profile when no forest is available.
pub const FALLBACK_PREDICTION: f64 = 1.0;

/// Base label every training example starts from.
pub const BASE_LABEL: f64 = 1.0;

/// Three-tier step: `>= 80` gives 1.0, `>= 60` gives 0.5, else 0.0.
pub fn stress_bonus(stress: f64) -> f64 {
    if stress >= 80.0 {
        1.0
    } else if stress >= 60.0 {
        0.5
    } else {
        0.0
    }
}

/// How one person's final weight was put together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightBreakdown {
    pub ai_prediction: f64,
    pub recency_bonus: f64,
    pub final_weight: f64,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct WeightAggregator {
    now: Option<NaiveDateTime>,
}

impl Default for WeightAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightAggregator {
    /// Uses local wall-clock time, matching how `updatedAt` stamps are written.
    pub fn new() -> Self {
        Self { now: None }
    }

    /// Pins "now" for reproducible weights.
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now: Some(now) }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }

    pub fn recency_bonus(&self, profile: &PersonProfile) -> f64 {
        recency_bonus(hours_elapsed(profile.updated_at.as_deref(), self.now()))
    }

    pub fn stress_bonus(&self, profile: &PersonProfile) -> f64 {
        stress_bonus(profile.stress())
    }

    /// Target the trainer fits: `1 + recency + stress`.
    pub fn training_label(&self, profile: &PersonProfile) -> f64 {
        BASE_LABEL + self.recency_bonus(profile) + self.stress_bonus(profile)
    }

    /// Live weight on the edge: `prediction + recency`.
    ///
    /// The stress bonus is not added here. The trained label already carries
    /// it, so the forest's prediction reflects it. `None` means no forest is
    /// available and [`FALLBACK_PREDICTION`] is used.
    pub fn final_weight(&self, profile: &PersonProfile, prediction: Option<f64>) -> WeightBreakdown {
        let ai_prediction = prediction.unwrap_or(FALLBACK_PREDICTION);
        let recency = self.recency_bonus(profile);

        WeightBreakdown {
            ai_prediction,
            recency_bonus: recency,
            final_weight: ai_prediction + recency,
            used_fallback: prediction.is_none(),
        }
    }
}
