//! Typed form data, built once at submission time and validated before
//! anything is sent to the backend.

use chrono::NaiveDate;
use thiserror::Error;

use crate::api::models::{
    HealthProfileUpdate, LoginRequest, RecordInput, RegisterRequest, Role, Sex, SmokingHistory,
};
use crate::risk::HealthReading;

/// Registration without explicit credentials derives them the way the web
/// client did: `<name>@test.com` with a fixed password.
pub const DEFAULT_ID_DOMAIN: &str = "test.com";
pub const DEFAULT_PASSWORD: &str = "password123";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("id and password are both required")]
    MissingCredentials,

    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub id: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(self) -> Result<LoginRequest, FormError> {
        let id = self.id.trim();
        if id.is_empty() || self.password.is_empty() {
            return Err(FormError::MissingCredentials);
        }
        Ok(LoginRequest {
            id: id.to_string(),
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub role: Role,
    pub id: Option<String>,
    pub password: Option<String>,
}

impl RegisterForm {
    pub fn validate(self) -> Result<RegisterRequest, FormError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(FormError::Missing("name"));
        }
        let id = self
            .id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("{name}@{DEFAULT_ID_DOMAIN}"));
        let password = self
            .password
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_PASSWORD.to_string());
        Ok(RegisterRequest {
            id,
            password,
            name,
            role: self.role,
        })
    }
}

/// Basic (slow-changing) information. Submitted as a full update.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicInfoForm {
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub height_cm: f64,
    pub hypertension: bool,
    pub diabetes: bool,
    pub heart_disease: bool,
    pub stroke_history: bool,
    pub smoking_history: SmokingHistory,
}

impl BasicInfoForm {
    pub fn into_update(self, user_id: &str) -> Result<HealthProfileUpdate, FormError> {
        positive("height_cm", self.height_cm)?;
        Ok(HealthProfileUpdate {
            id: user_id.to_string(),
            sex: Some(self.sex),
            birth_date: Some(self.birth_date),
            height_cm: Some(self.height_cm),
            stroke_history: Some(self.stroke_history),
            hypertension: Some(self.hypertension),
            heart_disease: Some(self.heart_disease),
            smoking_history: Some(self.smoking_history),
            diabetes: Some(self.diabetes),
        })
    }
}

/// One vital-sign submission. `None` is an empty input field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VitalsForm {
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub glucose_level: Option<i32>,
    pub weight_kg: Option<f64>,
    /// Empty means a non-smoker.
    pub smoking: Option<i32>,
}

impl VitalsForm {
    pub fn validate(self) -> Result<HealthReading, FormError> {
        let systolic_bp = self.systolic_bp.ok_or(FormError::Missing("systolic_bp"))?;
        let diastolic_bp = self.diastolic_bp.ok_or(FormError::Missing("diastolic_bp"))?;
        let glucose_level = self.glucose_level.ok_or(FormError::Missing("glucose_level"))?;
        let weight_kg = self.weight_kg.ok_or(FormError::Missing("weight_kg"))?;
        let smoking = self.smoking.unwrap_or(0);

        positive("systolic_bp", f64::from(systolic_bp))?;
        positive("diastolic_bp", f64::from(diastolic_bp))?;
        positive("glucose_level", f64::from(glucose_level))?;
        positive("weight_kg", weight_kg)?;
        if smoking < 0 {
            return Err(FormError::Negative {
                field: "smoking",
                value: f64::from(smoking),
            });
        }

        Ok(HealthReading {
            systolic_bp,
            diastolic_bp,
            glucose_level,
            weight_kg,
            smoking,
        })
    }

    pub fn into_record(self, user_id: &str) -> Result<RecordInput, FormError> {
        let r = self.validate()?;
        Ok(RecordInput {
            user_id: user_id.to_string(),
            weight_kg: r.weight_kg,
            systolic_bp: r.systolic_bp,
            diastolic_bp: r.diastolic_bp,
            glucose_level: r.glucose_level,
            smoking: r.smoking,
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), FormError> {
    // NaN fails this check too
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(FormError::NotPositive { field, value })
    }
}
