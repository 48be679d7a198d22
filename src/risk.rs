//! # Risk Scoring
//! Pure, testable logic that maps `(reading, profile)` → risk score in `[0, 100]`.
//! No I/O, suitable for unit tests and offline use (`vitalwatch score`).
//!
//! Policy: additive point system. Every factor is banded independently and
//! only the highest matching band of a factor contributes; the sum is capped
//! at 100. A missing profile (or a missing height) contributes nothing.

use serde::{Deserialize, Serialize};

/// One vital-sign reading as submitted by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthReading {
    /// mmHg
    pub systolic_bp: i32,
    /// mmHg
    pub diastolic_bp: i32,
    /// mg/dL
    pub glucose_level: i32,
    pub weight_kg: f64,
    /// Habit intensity, 0 = none (cigarettes per day in the backend).
    #[serde(default)]
    pub smoking: i32,
}

/// Slow-changing history of the user. Every field is optional in effect:
/// `None` height and `false` flags add no points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthProfile {
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub hypertension: bool,
    #[serde(default)]
    pub diabetes: bool,
    #[serde(default)]
    pub heart_disease: bool,
    #[serde(default)]
    pub stroke_history: bool,
}

/// Itemised score, kept for explainability in the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RiskBreakdown {
    pub systolic: u32,
    pub diastolic: u32,
    pub glucose: u32,
    pub smoking: u32,
    pub bmi: u32,
    pub comorbidities: u32,
    /// Sum before capping.
    pub raw: u32,
    /// Final score, `raw` capped at [`MAX_SCORE`].
    pub score: u8,
}

pub const MAX_SCORE: u8 = 100;

/// Compute the risk score for a reading and an optional profile.
pub fn compute_risk_score(reading: &HealthReading, profile: Option<&HealthProfile>) -> u8 {
    risk_breakdown(reading, profile).score
}

/// Same computation as [`compute_risk_score`], itemised per factor.
pub fn risk_breakdown(reading: &HealthReading, profile: Option<&HealthProfile>) -> RiskBreakdown {
    let systolic = systolic_points(reading.systolic_bp);
    let diastolic = diastolic_points(reading.diastolic_bp);
    let glucose = glucose_points(reading.glucose_level);
    let smoking = smoking_points(reading.smoking);

    let bmi = profile
        .and_then(|p| p.height_cm)
        .and_then(|h| bmi(reading.weight_kg, h))
        .map(bmi_points)
        .unwrap_or(0);
    let comorbidities = profile.map(comorbidity_points).unwrap_or(0);

    let raw = systolic + diastolic + glucose + smoking + bmi + comorbidities;
    let score = raw.min(u32::from(MAX_SCORE)) as u8;

    RiskBreakdown {
        systolic,
        diastolic,
        glucose,
        smoking,
        bmi,
        comorbidities,
        raw,
        score,
    }
}

/// Body-mass index, `weight_kg / (height_cm / 100)^2`.
///
/// Returns `None` unless the height is positive and finite; such a profile
/// is treated as having no height at all.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

pub fn systolic_points(mmhg: i32) -> u32 {
    if mmhg >= 180 {
        30
    } else if mmhg >= 140 {
        20
    } else if mmhg >= 120 {
        10
    } else {
        0
    }
}

pub fn diastolic_points(mmhg: i32) -> u32 {
    if mmhg >= 120 {
        20
    } else if mmhg >= 90 {
        15
    } else if mmhg >= 80 {
        5
    } else {
        0
    }
}

pub fn glucose_points(mg_dl: i32) -> u32 {
    if mg_dl >= 200 {
        25
    } else if mg_dl >= 126 {
        15
    } else if mg_dl >= 100 {
        5
    } else {
        0
    }
}

pub fn smoking_points(intensity: i32) -> u32 {
    if intensity >= 20 {
        20
    } else if intensity >= 10 {
        15
    } else if intensity >= 1 {
        10
    } else {
        0
    }
}

/// NaN (e.g. from a NaN weight) falls through every band.
pub fn bmi_points(bmi: f64) -> u32 {
    if bmi >= 30.0 {
        15
    } else if bmi >= 25.0 {
        10
    } else if bmi < 18.5 {
        5
    } else {
        0
    }
}

pub fn comorbidity_points(profile: &HealthProfile) -> u32 {
    let mut points = 0;
    if profile.hypertension {
        points += 10;
    }
    if profile.diabetes {
        points += 10;
    }
    if profile.heart_disease {
        points += 15;
    }
    if profile.stroke_history {
        points += 20;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(sys: i32, dia: i32, glu: i32, weight: f64, smoking: i32) -> HealthReading {
        HealthReading {
            systolic_bp: sys,
            diastolic_bp: dia,
            glucose_level: glu,
            weight_kg: weight,
            smoking,
        }
    }

    #[test]
    fn band_edges_pick_the_highest_band_only() {
        assert_eq!(systolic_points(180), 30);
        assert_eq!(systolic_points(179), 20);
        assert_eq!(systolic_points(140), 20);
        assert_eq!(systolic_points(139), 10);
        assert_eq!(systolic_points(120), 10);
        assert_eq!(systolic_points(119), 0);

        assert_eq!(diastolic_points(120), 20);
        assert_eq!(diastolic_points(90), 15);
        assert_eq!(diastolic_points(89), 5);
        assert_eq!(diastolic_points(79), 0);

        assert_eq!(glucose_points(200), 25);
        assert_eq!(glucose_points(126), 15);
        assert_eq!(glucose_points(125), 5);
        assert_eq!(glucose_points(99), 0);

        assert_eq!(smoking_points(20), 20);
        assert_eq!(smoking_points(19), 15);
        assert_eq!(smoking_points(1), 10);
        assert_eq!(smoking_points(0), 0);
    }

    #[test]
    fn bmi_bands_and_underweight() {
        assert_eq!(bmi_points(30.0), 15);
        assert_eq!(bmi_points(29.999), 10);
        assert_eq!(bmi_points(25.0), 10);
        assert_eq!(bmi_points(22.0), 0);
        assert_eq!(bmi_points(18.5), 0);
        assert_eq!(bmi_points(18.4), 5);
        assert_eq!(bmi_points(f64::NAN), 0);
    }

    #[test]
    fn zero_height_counts_as_missing() {
        assert!(bmi(70.0, 0.0).is_none());
        let profile = HealthProfile {
            height_cm: Some(0.0),
            ..Default::default()
        };
        let b = risk_breakdown(&reading(110, 70, 90, 40.0, 0), Some(&profile));
        assert_eq!(b.bmi, 0);
    }

    #[test]
    fn negative_height_counts_as_missing() {
        // Squaring would otherwise make it look like a real (underweight) BMI.
        assert!(bmi(40.0, -170.0).is_none());
        assert!(bmi(40.0, -0.0).is_none());
        assert!(bmi(40.0, f64::NAN).is_none());
        let profile = HealthProfile {
            height_cm: Some(-170.0),
            ..Default::default()
        };
        let b = risk_breakdown(&reading(110, 70, 90, 40.0, 0), Some(&profile));
        assert_eq!(b.bmi, 0);
        assert_eq!(b.score, 0);
    }

    #[test]
    fn breakdown_sums_and_caps() {
        let profile = HealthProfile {
            height_cm: Some(170.0),
            hypertension: true,
            diabetes: true,
            heart_disease: true,
            stroke_history: true,
        };
        let b = risk_breakdown(&reading(200, 130, 300, 120.0, 40), Some(&profile));
        assert_eq!(b.systolic, 30);
        assert_eq!(b.comorbidities, 55);
        assert_eq!(b.raw, 30 + 20 + 25 + 20 + 15 + 55);
        assert_eq!(b.score, 100);
    }
}
