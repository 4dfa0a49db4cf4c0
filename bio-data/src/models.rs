//! Record types held by the store, and the partial inputs used to create them.
//!
//! Records serialize in camelCase for the UI layer. Inputs carry `validator`
//! ranges that are only enforced when the store runs in strict mode.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseTrend {
    Up,
    Down,
    Stable,
    RapidUp,
    RapidDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

/// Blood glucose reading in mg/dL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlucoseReading {
    pub id: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<GlucoseTrend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Heart-rate variability summary. One per store, replaced on every update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HrvData {
    /// RMSSD in ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rmssd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<StressLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reading_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_average_rmssd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSession {
    pub id: String,
    pub date: NaiveDate,
    pub score: f64,
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodLog {
    pub id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementLog {
    pub id: String,
    pub name: String,
    /// Free text, e.g. "500mg" or "1 capsule".
    pub dosage: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Self-reported energy on a 1-10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyReport {
    pub level: i32,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementRecommendation {
    pub timing: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_warning: Option<&'static str>,
}

// ============================================================================
// Inputs
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewGlucoseReading {
    #[validate(range(min = 0.0))]
    pub value: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trend: Option<GlucoseTrend>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewGlucoseReading {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }
}

/// Fields to merge into [`HrvData`]. A supplied `last_reading_timestamp` is
/// ignored; the store always stamps the update time.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HrvUpdate {
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub current_rmssd: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub readiness_score: Option<f64>,
    #[serde(default)]
    pub stress_level: Option<StressLevel>,
    #[serde(default)]
    pub last_reading_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub daily_average_rmssd: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSleepSession {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub score: f64,
    pub duration_minutes: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewFoodLog {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub calories: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub protein: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub carbs: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub fat: Option<f64>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplementLog {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub dosage: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEnergyReport {
    #[validate(range(min = 1, max = 10))]
    pub level: i32,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}
