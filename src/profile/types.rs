use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MBTI: &str = "ISTJ";
pub const DEFAULT_STRESS: f64 = 50.0;
pub const DEFAULT_HRV: f64 = 10.0;
pub const DEFAULT_TEMPERATURE: f64 = 24.0;
pub const DEFAULT_HUMIDITY: f64 = 3.0;
pub const DEFAULT_BRIGHTNESS: f64 = 5.0;

/// Per-channel environment targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentPreference {
    pub temperature: f64,
    pub humidity: f64,
    pub brightness: f64,
}

impl Default for EnvironmentPreference {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            humidity: DEFAULT_HUMIDITY,
            brightness: DEFAULT_BRIGHTNESS,
        }
    }
}

/// Strongly-typed person profile.
///
/// Built from loosely-typed store records by [`PersonProfile::from_record`];
/// everything downstream sees only explicit options and defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonProfile {
    pub id: String,
    pub mbti: String,
    pub stress_avg: Option<f64>,
    pub heart_rate_variation: Option<f64>,
    pub updated_at: Option<String>,
    pub preferences: EnvironmentPreference,
}

impl PersonProfile {
    pub fn new(id: impl Into<String>, mbti: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mbti: mbti.into(),
            stress_avg: None,
            heart_rate_variation: None,
            updated_at: None,
            preferences: EnvironmentPreference::default(),
        }
    }

    pub fn with_metrics(mut self, stress_avg: Option<f64>, heart_rate_variation: Option<f64>) -> Self {
        self.stress_avg = stress_avg.filter(|v| v.is_finite());
        self.heart_rate_variation = heart_rate_variation.filter(|v| v.is_finite());
        self
    }

    pub fn with_updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = Some(updated_at.into());
        self
    }

    pub fn with_preferences(mut self, preferences: EnvironmentPreference) -> Self {
        self.preferences = preferences;
        self
    }

    /// Converts a raw store record. Returns `None` only when the record is
    /// not an object at all; every field-level problem is defaulted.
    pub fn from_record(id: impl Into<String>, record: &Value) -> Option<Self> {
        let fields = record.as_object()?;

        let mbti = fields
            .get("mbti")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MBTI)
            .to_string();

        let metrics = fields.get("bodyMetrics").and_then(Value::as_object);
        let metric = |key: &str| metrics.and_then(|m| m.get(key)).and_then(tolerant_f64);

        let updated_at = match fields.get("updatedAt") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let preference = |key: &str, default: f64| {
            fields.get(key).and_then(tolerant_f64).unwrap_or(default)
        };

        Some(Self {
            id: id.into(),
            mbti,
            stress_avg: metric("stressAvg"),
            heart_rate_variation: metric("heartRateVariation"),
            updated_at,
            preferences: EnvironmentPreference {
                temperature: preference("temperature", DEFAULT_TEMPERATURE),
                // Whole-step levels, truncated per person before weighting.
                humidity: preference("humidity", DEFAULT_HUMIDITY).trunc(),
                brightness: preference("brightness", DEFAULT_BRIGHTNESS).trunc(),
            },
        })
    }

    /// Stress reading with the documented default applied.
    pub fn stress(&self) -> f64 {
        self.stress_avg.unwrap_or(DEFAULT_STRESS)
    }

    pub fn hrv(&self) -> f64 {
        self.heart_rate_variation.unwrap_or(DEFAULT_HRV)
    }
}

/// Numbers pass through; strings are trimmed and parsed. Null, blank,
/// unparseable, and non-finite values all come back as `None`.
pub fn tolerant_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
