//! # Dashboard
//! The patient home view: who is logged in, the current risk score computed
//! client-side from the latest reading, and how to present it.

use serde::Serialize;
use tracing::{info, warn};

use crate::api::{ApiError, HealthApi, HealthProfileRecord, HealthRecord, User};
use crate::level::{Palette, RiskLevel};
use crate::risk::{compute_risk_score, HealthProfile};
use crate::session::{self, Session};

pub const NO_RECORDS: &str = "no records";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub user_name: String,
    pub initials: String,
    pub risk_score: u8,
    pub level: RiskLevel,
    pub palette: Palette,
    pub status: &'static str,
    /// `YYYY.MM.DD` of the latest record, or [`NO_RECORDS`].
    pub last_update: String,
}

impl Dashboard {
    /// Pure assembly; a missing record yields score 0 and "no records".
    pub fn build(
        user: &User,
        latest: Option<&HealthRecord>,
        profile: Option<&HealthProfileRecord>,
    ) -> Self {
        let profile: Option<HealthProfile> = profile.map(HealthProfileRecord::to_profile);
        let risk_score = latest
            .map(|r| compute_risk_score(&r.reading(), profile.as_ref()))
            .unwrap_or(0);
        let level = RiskLevel::from_score(risk_score);
        let last_update = latest
            .map(|r| r.created_at.format("%Y.%m.%d").to_string())
            .unwrap_or_else(|| NO_RECORDS.to_string());

        Self {
            user_name: user.name.clone(),
            initials: session::initials(&user.name),
            risk_score,
            level,
            palette: level.palette(),
            status: level.status_description(),
            last_update,
        }
    }
}

/// Fetch everything the dashboard shows for the session's user.
///
/// Only the user lookup is fatal. A failing record or profile lookup
/// degrades to "no record" / "no profile", like the web page did.
pub async fn load_dashboard(api: &dyn HealthApi, session: &Session) -> Result<Dashboard, ApiError> {
    let user = api.get_user(&session.user_id).await?;

    let latest = match api.latest_record(&session.user_id).await {
        Ok(r) => r,
        Err(e) => {
            warn!(user = %session.user_id, error = %e, "latest record unavailable");
            None
        }
    };

    let profile = if latest.is_some() {
        fetch_profile(api, &session.user_id).await
    } else {
        None
    };

    let dash = Dashboard::build(&user, latest.as_ref(), profile.as_ref());
    info!(
        user = %session.user_id,
        score = dash.risk_score,
        level = %dash.level,
        "dashboard loaded"
    );
    Ok(dash)
}

/// Basic information used for scoring. A missing or unreachable profile is
/// `None`: the BMI and comorbidity terms then add nothing.
pub async fn fetch_profile(api: &dyn HealthApi, user_id: &str) -> Option<HealthProfileRecord> {
    match api.get_health_profile(user_id).await {
        Ok(Some(p)) => Some(p),
        Ok(None) => {
            warn!(user = %user_id, "no basic information; scoring without BMI and history");
            None
        }
        Err(e) => {
            warn!(user = %user_id, error = %e, "health profile unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Role;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn user() -> User {
        User {
            id: "u1".into(),
            name: "홍길동".into(),
            role: Role::Patient,
        }
    }

    fn record(sys: i32, dia: i32, glu: i32, weight: f64, smoking: i32) -> HealthRecord {
        HealthRecord {
            id: "r1".into(),
            user_id: "u1".into(),
            weight_kg: weight,
            systolic_bp: sys,
            diastolic_bp: dia,
            glucose_level: glu,
            smoking,
            created_at: NaiveDate::from_ymd_opt(2024, 5, 20)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            stroke_risk_score: None,
            stroke_risk_level: None,
        }
    }

    fn profile(height: f64, hypertension: bool) -> HealthProfileRecord {
        HealthProfileRecord {
            sex: None,
            birth_date: None,
            height_cm: Some(height),
            stroke_history: false,
            hypertension,
            heart_disease: false,
            diabetes: false,
            smoking_history: None,
            measured_at: None,
        }
    }

    #[test]
    fn build_without_record_is_normal_with_placeholder_date() {
        let d = Dashboard::build(&user(), None, None);
        assert_eq!(d.risk_score, 0);
        assert_eq!(d.level, RiskLevel::Normal);
        assert_eq!(d.last_update, NO_RECORDS);
        assert_eq!(d.initials, "길동");
    }

    #[test]
    fn build_scores_latest_record_with_profile() {
        let rec = record(150, 95, 140, 70.0, 5);
        let prof = profile(175.0, true);
        let d = Dashboard::build(&user(), Some(&rec), Some(&prof));
        assert_eq!(d.risk_score, 70);
        assert_eq!(d.level, RiskLevel::High);
        assert_eq!(d.palette.chart, "#ef4444");
        assert_eq!(d.last_update, "2024.05.20");
    }

    struct FakeApi {
        latest: Result<Option<HealthRecord>, u16>,
        profile: Option<HealthProfileRecord>,
        profile_calls: Mutex<usize>,
    }

    #[async_trait::async_trait]
    impl HealthApi for FakeApi {
        async fn get_user(&self, _user_id: &str) -> Result<User, ApiError> {
            Ok(user())
        }
        async fn get_health_profile(
            &self,
            _user_id: &str,
        ) -> Result<Option<HealthProfileRecord>, ApiError> {
            *self.profile_calls.lock().unwrap() += 1;
            Ok(self.profile.clone())
        }
        async fn latest_record(&self, _user_id: &str) -> Result<Option<HealthRecord>, ApiError> {
            self.latest.clone().map_err(|status| ApiError::Status {
                status,
                detail: "boom".into(),
            })
        }
        async fn list_records(&self, _user_id: &str) -> Result<Vec<HealthRecord>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn session() -> Session {
        Session::from_user(&user())
    }

    #[tokio::test]
    async fn load_degrades_when_record_lookup_fails() {
        let api = FakeApi {
            latest: Err(500),
            profile: Some(profile(170.0, true)),
            profile_calls: Mutex::new(0),
        };
        let d = load_dashboard(&api, &session()).await.unwrap();
        assert_eq!(d.risk_score, 0);
        assert_eq!(d.last_update, NO_RECORDS);
        assert_eq!(*api.profile_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn load_uses_profile_for_bmi_and_comorbidities() {
        let api = FakeApi {
            latest: Ok(Some(record(185, 125, 210, 90.0, 25))),
            profile: Some(profile(170.0, true)),
            profile_calls: Mutex::new(0),
        };
        let d = load_dashboard(&api, &session()).await.unwrap();
        assert_eq!(d.risk_score, 100);
        assert_eq!(d.level, RiskLevel::High);
        assert_eq!(*api.profile_calls.lock().unwrap(), 1);
    }
}
