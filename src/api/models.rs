//! Wire types exchanged with the health backend.
//!
//! Field names follow the backend JSON exactly; enums use the backend's
//! upper-case spellings. Timestamps come back naive from the backend, so
//! they are parsed leniently (see [`flexible_ts`]).

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::risk::{HealthProfile, HealthReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Patient,
    Doctor,
    Caregiver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SmokingHistory {
    Smoker,
    PastSmoker,
    NonSmoker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MonitoringStatus {
    Pending,
    Approved,
    Rejected,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "caregiver" => Ok(Role::Caregiver),
            other => Err(format!("unknown role '{other}' (patient|doctor|caregiver)")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Patient => "PATIENT",
            Role::Doctor => "DOCTOR",
            Role::Caregiver => "CAREGIVER",
        })
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Sex::Male),
            "f" | "female" => Ok(Sex::Female),
            other => Err(format!("unknown sex '{other}' (M|F)")),
        }
    }
}

impl FromStr for SmokingHistory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "smoker" => Ok(SmokingHistory::Smoker),
            "past_smoker" | "past" => Ok(SmokingHistory::PastSmoker),
            "non_smoker" | "never" | "none" => Ok(SmokingHistory::NonSmoker),
            other => Err(format!(
                "unknown smoking history '{other}' (smoker|past-smoker|non-smoker)"
            )),
        }
    }
}

// ---- users ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub id: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub id: String,
    pub password: String,
}

/// Basic health information as stored by the backend (`/users/{id}/health`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthProfileRecord {
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub stroke_history: bool,
    #[serde(default)]
    pub hypertension: bool,
    #[serde(default)]
    pub heart_disease: bool,
    #[serde(default)]
    pub diabetes: bool,
    #[serde(default)]
    pub smoking_history: Option<SmokingHistory>,
    #[serde(default, with = "flexible_ts::option")]
    pub measured_at: Option<NaiveDateTime>,
}

impl HealthProfileRecord {
    /// The subset the scoring function consumes.
    pub fn to_profile(&self) -> HealthProfile {
        HealthProfile {
            height_cm: self.height_cm,
            hypertension: self.hypertension,
            diabetes: self.diabetes,
            heart_disease: self.heart_disease,
            stroke_history: self.stroke_history,
        }
    }
}

/// Partial update; `None` fields are left untouched by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthProfileUpdate {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_history: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hypertension: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_disease: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoking_history: Option<SmokingHistory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diabetes: Option<bool>,
}

// ---- health records ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordInput {
    pub user_id: String,
    pub weight_kg: f64,
    pub systolic_bp: i32,
    pub diastolic_bp: i32,
    pub glucose_level: i32,
    pub smoking: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: String,
    pub user_id: String,
    pub weight_kg: f64,
    pub systolic_bp: i32,
    pub diastolic_bp: i32,
    pub glucose_level: i32,
    #[serde(default)]
    pub smoking: i32,
    #[serde(with = "flexible_ts")]
    pub created_at: NaiveDateTime,
    /// Score stored by the backend, if it computed one.
    #[serde(default)]
    pub stroke_risk_score: Option<f64>,
    #[serde(default)]
    pub stroke_risk_level: Option<String>,
}

impl HealthRecord {
    pub fn reading(&self) -> HealthReading {
        HealthReading {
            systolic_bp: self.systolic_bp,
            diastolic_bp: self.diastolic_bp,
            glucose_level: self.glucose_level,
            weight_kg: self.weight_kg,
            smoking: self.smoking,
        }
    }
}

// ---- monitoring ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringRequestCreate {
    pub patient_id: String,
    pub requester_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringApproval {
    pub request_id: String,
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringRequest {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub requester_id: String,
    pub requester_name: String,
    pub requester_role: String,
    pub status: MonitoringStatus,
    #[serde(with = "flexible_ts")]
    pub created_at: NaiveDateTime,
    #[serde(default, with = "flexible_ts::option")]
    pub responded_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringRelation {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub monitor_id: String,
    pub monitor_name: String,
    pub monitor_role: String,
    #[serde(with = "flexible_ts")]
    pub granted_at: NaiveDateTime,
}

/// Accepts both naive (`2024-05-20T10:00:00.123`) and offset-aware
/// (`2024-05-20T10:00:00Z`) timestamps; aware ones are normalised to UTC.
pub mod flexible_ts {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_utc());
        }
        NaiveDateTime::parse_from_str(s, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
    }

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<NaiveDateTime>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => super::serialize(ts, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp '{raw}'"))
                }),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_parses_naive_and_aware_timestamps() {
        let naive: HealthRecord = serde_json::from_value(json!({
            "id": "r1", "user_id": "u1", "weight_kg": 70, "systolic_bp": 120,
            "diastolic_bp": 80, "glucose_level": 100, "smoking": 0,
            "created_at": "2024-05-20T10:00:00.123456",
            "stroke_risk_score": 12.5, "stroke_risk_level": "낮음"
        }))
        .unwrap();
        assert_eq!(naive.created_at.format("%Y.%m.%d").to_string(), "2024.05.20");
        assert_eq!(naive.weight_kg, 70.0);

        let aware: HealthRecord = serde_json::from_value(json!({
            "id": "r2", "user_id": "u1", "weight_kg": 70.5, "systolic_bp": 120,
            "diastolic_bp": 80, "glucose_level": 100,
            "created_at": "2024-05-20T23:30:00+09:00"
        }))
        .unwrap();
        assert_eq!(aware.created_at.format("%H:%M").to_string(), "14:30");
        assert_eq!(aware.smoking, 0);
        assert!(aware.stroke_risk_score.is_none());
    }

    #[test]
    fn enums_use_backend_spellings() {
        assert_eq!(serde_json::to_value(Role::Caregiver).unwrap(), json!("CAREGIVER"));
        assert_eq!(serde_json::to_value(Sex::Female).unwrap(), json!("F"));
        assert_eq!(
            serde_json::to_value(SmokingHistory::PastSmoker).unwrap(),
            json!("PAST_SMOKER")
        );
        assert_eq!("past-smoker".parse::<SmokingHistory>(), Ok(SmokingHistory::PastSmoker));
        assert_eq!("Doctor".parse::<Role>(), Ok(Role::Doctor));
        assert!("nurse".parse::<Role>().is_err());
    }

    #[test]
    fn profile_update_omits_untouched_fields() {
        let upd = HealthProfileUpdate {
            id: "u1".into(),
            sex: None,
            birth_date: None,
            height_cm: Some(172.0),
            stroke_history: None,
            hypertension: Some(true),
            heart_disease: None,
            smoking_history: None,
            diabetes: None,
        };
        let v = serde_json::to_value(&upd).unwrap();
        assert_eq!(v, json!({ "id": "u1", "height_cm": 172.0, "hypertension": true }));
    }
}
