//! The bio-data store: an owned, in-memory state object.
//!
//! Callers hold the store (or a [`crate::SharedBioDataStore`]) and mutate it
//! through the `add_*`/`update_*` actions. Nothing is persisted.

use crate::error::StoreError;
use crate::models::{
    EnergyReport, FoodLog, GlucoseReading, GlucoseTrend, HrvData, HrvUpdate, NewEnergyReport,
    NewFoodLog, NewGlucoseReading, NewSleepSession, NewSupplementLog, SleepSession, StressLevel,
    SupplementLog, SupplementRecommendation,
};
use crate::recommendations;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use validator::Validate;

/// Shown by [`BioDataStore::latest_sleep_duration`] when there is no session.
pub const NO_SLEEP_DURATION: &str = "N/A";

const GLUCOSE_ID_PREFIX: &str = "g";
const SLEEP_ID_PREFIX: &str = "s";
const FOOD_ID_PREFIX: &str = "f";
const SUPPLEMENT_ID_PREFIX: &str = "sup";

#[derive(Debug, Clone)]
pub struct BioDataStore {
    glucose_readings: Vec<GlucoseReading>,
    latest_glucose: Option<usize>,
    hrv: HrvData,
    sleep_sessions: Vec<SleepSession>,
    latest_sleep: Option<usize>,
    food_logs: Vec<FoodLog>,
    supplement_logs: Vec<SupplementLog>,
    energy_reports: Vec<EnergyReport>,
    strict_validation: bool,
    last_id_millis: i64,
}

impl Default for BioDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BioDataStore {
    /// Store seeded with demo readings so a fresh UI has something to show.
    pub fn new() -> Self {
        let now = Utc::now();
        let yesterday = (now - Duration::days(1)).date_naive();

        let mut store = Self::empty();
        store.glucose_readings = vec![
            GlucoseReading {
                id: "g1".to_string(),
                value: 95.0,
                timestamp: now - Duration::minutes(10),
                trend: Some(GlucoseTrend::Stable),
                notes: None,
            },
            GlucoseReading {
                id: "g2".to_string(),
                value: 98.0,
                timestamp: now,
                trend: Some(GlucoseTrend::Up),
                notes: None,
            },
        ];
        store.latest_glucose = Some(1);
        store.hrv = HrvData {
            current_rmssd: Some(65.0),
            readiness_score: Some(75.0),
            stress_level: Some(StressLevel::Low),
            last_reading_timestamp: Some(now - Duration::hours(2)),
            daily_average_rmssd: Some(62.0),
        };
        store.sleep_sessions = vec![SleepSession {
            id: "s1".to_string(),
            date: yesterday,
            score: 82.0,
            duration_minutes: 7 * 60 + 45,
            notes: None,
        }];
        store.latest_sleep = Some(0);
        store.food_logs = vec![FoodLog {
            id: "f1".to_string(),
            name: "Chicken Salad".to_string(),
            timestamp: now - Duration::hours(4),
            calories: Some(450.0),
            protein: Some(30.0),
            carbs: Some(15.0),
            fat: Some(25.0),
            photo_url: None,
            notes: None,
        }];
        store.energy_reports = vec![EnergyReport {
            level: 7,
            timestamp: now - Duration::hours(1),
            notes: None,
        }];
        store
    }

    /// Store with no records and an empty HRV summary.
    pub fn empty() -> Self {
        Self {
            glucose_readings: Vec::new(),
            latest_glucose: None,
            hrv: HrvData::default(),
            sleep_sessions: Vec::new(),
            latest_sleep: None,
            food_logs: Vec::new(),
            supplement_logs: Vec::new(),
            energy_reports: Vec::new(),
            strict_validation: false,
            last_id_millis: 0,
        }
    }

    /// Reject out-of-range input instead of storing it as-is.
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict_validation
    }

    fn check(&self, input: &impl Validate) -> Result<(), StoreError> {
        if self.strict_validation {
            input.validate()?;
        }
        Ok(())
    }

    /// `<prefix><creation millis>`, bumped past the previous id so two records
    /// created within the same millisecond stay distinct.
    fn next_id(&mut self, prefix: &str, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis().max(self.last_id_millis + 1);
        self.last_id_millis = millis;
        format!("{}{}", prefix, millis)
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    pub fn add_glucose_reading(
        &mut self,
        reading: NewGlucoseReading,
    ) -> Result<&GlucoseReading, StoreError> {
        self.check(&reading)?;

        let now = Utc::now();
        let record = GlucoseReading {
            id: self.next_id(GLUCOSE_ID_PREFIX, now),
            value: reading.value,
            timestamp: reading.timestamp.unwrap_or(now),
            trend: reading.trend,
            notes: reading.notes,
        };
        tracing::debug!(id = %record.id, value = record.value, "Added glucose reading");

        self.glucose_readings.push(record);
        let index = self.glucose_readings.len() - 1;
        self.latest_glucose = Some(index);
        Ok(&self.glucose_readings[index])
    }

    pub fn update_hrv_data(&mut self, update: HrvUpdate) -> Result<&HrvData, StoreError> {
        self.check(&update)?;

        let HrvUpdate {
            current_rmssd,
            readiness_score,
            stress_level,
            last_reading_timestamp: _,
            daily_average_rmssd,
        } = update;

        let hrv = &mut self.hrv;
        if current_rmssd.is_some() {
            hrv.current_rmssd = current_rmssd;
        }
        if readiness_score.is_some() {
            hrv.readiness_score = readiness_score;
        }
        if stress_level.is_some() {
            hrv.stress_level = stress_level;
        }
        if daily_average_rmssd.is_some() {
            hrv.daily_average_rmssd = daily_average_rmssd;
        }
        hrv.last_reading_timestamp = Some(Utc::now());

        tracing::debug!(hrv = ?self.hrv, "Updated HRV data");
        Ok(&self.hrv)
    }

    pub fn add_sleep_session(
        &mut self,
        session: NewSleepSession,
    ) -> Result<&SleepSession, StoreError> {
        self.check(&session)?;

        let now = Utc::now();
        let record = SleepSession {
            id: self.next_id(SLEEP_ID_PREFIX, now),
            date: session.date.unwrap_or_else(|| now.date_naive()),
            score: session.score,
            duration_minutes: session.duration_minutes,
            notes: session.notes,
        };
        tracing::debug!(id = %record.id, date = %record.date, "Added sleep session");

        self.sleep_sessions.push(record);
        let index = self.sleep_sessions.len() - 1;
        self.latest_sleep = Some(index);
        Ok(&self.sleep_sessions[index])
    }

    pub fn add_food_log(&mut self, log: NewFoodLog) -> Result<&FoodLog, StoreError> {
        self.check(&log)?;

        let now = Utc::now();
        let record = FoodLog {
            id: self.next_id(FOOD_ID_PREFIX, now),
            name: log.name,
            timestamp: log.timestamp.unwrap_or(now),
            calories: log.calories,
            protein: log.protein,
            carbs: log.carbs,
            fat: log.fat,
            photo_url: log.photo_url,
            notes: log.notes,
        };
        tracing::debug!(id = %record.id, name = %record.name, "Added food log");

        self.food_logs.push(record);
        Ok(&self.food_logs[self.food_logs.len() - 1])
    }

    pub fn add_supplement_log(
        &mut self,
        log: NewSupplementLog,
    ) -> Result<&SupplementLog, StoreError> {
        self.check(&log)?;

        let now = Utc::now();
        let record = SupplementLog {
            id: self.next_id(SUPPLEMENT_ID_PREFIX, now),
            name: log.name,
            dosage: log.dosage,
            timestamp: log.timestamp.unwrap_or(now),
            notes: log.notes,
        };
        tracing::debug!(id = %record.id, name = %record.name, "Added supplement log");

        self.supplement_logs.push(record);
        Ok(&self.supplement_logs[self.supplement_logs.len() - 1])
    }

    pub fn add_energy_report(
        &mut self,
        report: NewEnergyReport,
    ) -> Result<&EnergyReport, StoreError> {
        self.check(&report)?;

        let record = EnergyReport {
            level: report.level,
            timestamp: report.timestamp.unwrap_or_else(Utc::now),
            notes: report.notes,
        };
        tracing::debug!(level = record.level, "Added energy report");

        self.energy_reports.push(record);
        Ok(&self.energy_reports[self.energy_reports.len() - 1])
    }

    // ------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------

    pub fn glucose_readings(&self) -> &[GlucoseReading] {
        &self.glucose_readings
    }

    pub fn latest_glucose(&self) -> Option<&GlucoseReading> {
        self.latest_glucose.map(|i| &self.glucose_readings[i])
    }

    pub fn latest_glucose_value(&self) -> Option<f64> {
        self.latest_glucose().map(|r| r.value)
    }

    pub fn latest_glucose_trend(&self) -> Option<GlucoseTrend> {
        self.latest_glucose().and_then(|r| r.trend)
    }

    pub fn latest_glucose_timestamp(&self) -> Option<DateTime<Utc>> {
        self.latest_glucose().map(|r| r.timestamp)
    }

    pub fn hrv(&self) -> &HrvData {
        &self.hrv
    }

    pub fn hrv_readiness(&self) -> Option<f64> {
        self.hrv.readiness_score
    }

    pub fn hrv_current_rmssd(&self) -> Option<f64> {
        self.hrv.current_rmssd
    }

    pub fn hrv_last_reading_timestamp(&self) -> Option<DateTime<Utc>> {
        self.hrv.last_reading_timestamp
    }

    pub fn sleep_sessions(&self) -> &[SleepSession] {
        &self.sleep_sessions
    }

    pub fn latest_sleep(&self) -> Option<&SleepSession> {
        self.latest_sleep.map(|i| &self.sleep_sessions[i])
    }

    pub fn latest_sleep_score(&self) -> Option<f64> {
        self.latest_sleep().map(|s| s.score)
    }

    /// Latest sleep duration as `"7h 45m"`, or [`NO_SLEEP_DURATION`].
    pub fn latest_sleep_duration(&self) -> String {
        match self.latest_sleep() {
            Some(session) => format_duration(session.duration_minutes),
            None => NO_SLEEP_DURATION.to_string(),
        }
    }

    pub fn latest_sleep_date(&self) -> Option<NaiveDate> {
        self.latest_sleep().map(|s| s.date)
    }

    pub fn food_logs(&self) -> &[FoodLog] {
        &self.food_logs
    }

    pub fn supplement_logs(&self) -> &[SupplementLog] {
        &self.supplement_logs
    }

    pub fn energy_reports(&self) -> &[EnergyReport] {
        &self.energy_reports
    }

    pub fn latest_energy_report(&self) -> Option<&EnergyReport> {
        self.energy_reports.last()
    }

    pub fn supplement_recommendation(
        &self,
        supplement_name: &str,
    ) -> Option<&'static SupplementRecommendation> {
        recommendations::lookup(supplement_name)
    }
}

fn format_duration(total_minutes: u32) -> String {
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}
