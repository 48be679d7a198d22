//! history.rs: chart series and "current value" cards built from the
//! stored health records.

use chrono::Datelike;
use serde::Serialize;
use tracing::warn;

use crate::api::{ApiError, HealthApi, HealthRecord};
use crate::level::RiskLevel;
use crate::risk::bmi;
use crate::session::Session;

/// Only the most recent records are charted.
pub const CHART_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    BloodPressure,
    Glucose,
    Bmi,
    Risk,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::BloodPressure, Metric::Glucose, Metric::Bmi, Metric::Risk];

    pub fn label(self) -> &'static str {
        match self {
            Metric::BloodPressure => "Systolic BP (mmHg)",
            Metric::Glucose => "Glucose (mg/dL)",
            Metric::Bmi => "BMI (kg/m²)",
            Metric::Risk => "Risk score",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Metric::BloodPressure => "#0d9488",
            Metric::Glucose => "#f59e0b",
            Metric::Bmi => "#8b5cf6",
            Metric::Risk => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub metric: Metric,
    /// `M.D` per point, oldest first.
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Series {
    fn new(metric: Metric) -> Self {
        Self {
            metric,
            labels: Vec::new(),
            values: Vec::new(),
        }
    }

    fn push(&mut self, label: &str, value: f64) {
        self.labels.push(label.to_string());
        self.values.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryCharts {
    pub blood_pressure: Series,
    pub glucose: Series,
    /// Empty when the height is unknown.
    pub bmi: Series,
    pub risk: Series,
}

impl HistoryCharts {
    /// Records may come in any order; the newest [`CHART_WINDOW`] are kept
    /// and charted chronologically.
    pub fn from_records(records: &[HealthRecord], height_cm: Option<f64>) -> Self {
        let mut sorted: Vec<&HealthRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.created_at);
        let start = sorted.len().saturating_sub(CHART_WINDOW);

        let mut charts = Self {
            blood_pressure: Series::new(Metric::BloodPressure),
            glucose: Series::new(Metric::Glucose),
            bmi: Series::new(Metric::Bmi),
            risk: Series::new(Metric::Risk),
        };

        for r in &sorted[start..] {
            let label = format!("{}.{}", r.created_at.month(), r.created_at.day());
            charts
                .blood_pressure
                .push(&label, f64::from(r.systolic_bp));
            charts.glucose.push(&label, f64::from(r.glucose_level));
            if let Some(v) = height_cm.and_then(|h| bmi(r.weight_kg, h)) {
                charts.bmi.push(&label, round1(v));
            }
            charts.risk.push(&label, r.stroke_risk_score.unwrap_or(0.0));
        }
        charts
    }

    pub fn series(&self, metric: Metric) -> &Series {
        match metric {
            Metric::BloodPressure => &self.blood_pressure,
            Metric::Glucose => &self.glucose,
            Metric::Bmi => &self.bmi,
            Metric::Risk => &self.risk,
        }
    }
}

/// Values shown on the summary cards above the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestValues {
    /// `systolic/diastolic`
    pub blood_pressure: String,
    pub glucose: i32,
    pub bmi: Option<f64>,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

pub fn latest_values(records: &[HealthRecord], height_cm: Option<f64>) -> Option<LatestValues> {
    let r = records.iter().max_by_key(|r| r.created_at)?;
    let risk_score = r.stroke_risk_score.unwrap_or(0.0);
    Some(LatestValues {
        blood_pressure: format!("{}/{}", r.systolic_bp, r.diastolic_bp),
        glucose: r.glucose_level,
        bmi: height_cm.and_then(|h| bmi(r.weight_kg, h)).map(round1),
        risk_score,
        risk_level: RiskLevel::from_score(risk_score.round().clamp(0.0, 100.0) as u8),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    pub charts: HistoryCharts,
    pub latest: LatestValues,
}

/// `Ok(None)` when the user has no records yet.
pub async fn load_history(
    api: &dyn HealthApi,
    session: &Session,
) -> Result<Option<HistoryView>, ApiError> {
    let records = api.list_records(&session.user_id).await?;
    if records.is_empty() {
        return Ok(None);
    }

    let height_cm = match api.get_health_profile(&session.user_id).await {
        Ok(p) => p.and_then(|p| p.height_cm),
        Err(e) => {
            warn!(user = %session.user_id, error = %e, "no height for BMI series");
            None
        }
    };

    let charts = HistoryCharts::from_records(&records, height_cm);
    Ok(latest_values(&records, height_cm).map(|latest| HistoryView { charts, latest }))
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
