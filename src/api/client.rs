//! reqwest-backed client for the health backend.
//!
//! Every call is one-shot: a transport failure or non-2xx status is returned
//! to the caller immediately, there is no retry. Each request is counted and
//! timed through the `metrics` facade.

use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::{extract_detail, ApiError};
use super::models::{
    HealthProfileRecord, HealthProfileUpdate, HealthRecord, LoginRequest, MonitoringApproval,
    MonitoringRelation, MonitoringRequest, MonitoringRequestCreate, RecordInput, RegisterRequest,
    User,
};
use crate::config::ClientConfig;

#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("vitalwatch/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(ApiError::Setup)?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ---- users ----

    pub async fn register(&self, req: &RegisterRequest) -> Result<User, ApiError> {
        self.call(Method::POST, "/users/register", "register", Some(req))
            .await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<User, ApiError> {
        self.call(Method::POST, "/users/login", "login", Some(req)).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, ApiError> {
        self.call(Method::GET, &format!("/users/{user_id}"), "get_user", None::<&()>)
            .await
    }

    /// `None` when the user has not entered basic information yet.
    pub async fn get_health_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<HealthProfileRecord>, ApiError> {
        optional(
            self.call(
                Method::GET,
                &format!("/users/{user_id}/health"),
                "get_health_profile",
                None::<&()>,
            )
            .await,
        )
    }

    pub async fn update_health_profile(
        &self,
        user_id: &str,
        update: &HealthProfileUpdate,
    ) -> Result<HealthProfileRecord, ApiError> {
        self.call(
            Method::PUT,
            &format!("/users/{user_id}/health"),
            "update_health_profile",
            Some(update),
        )
        .await
    }

    // ---- health records ----

    pub async fn create_record(&self, input: &RecordInput) -> Result<HealthRecord, ApiError> {
        self.call(Method::POST, "/health/records", "create_record", Some(input))
            .await
    }

    /// Newest first, as the backend returns them.
    pub async fn list_records(&self, user_id: &str) -> Result<Vec<HealthRecord>, ApiError> {
        self.call(
            Method::GET,
            &format!("/health/records/user/{user_id}"),
            "list_records",
            None::<&()>,
        )
        .await
    }

    pub async fn latest_record(&self, user_id: &str) -> Result<Option<HealthRecord>, ApiError> {
        optional(
            self.call(
                Method::GET,
                &format!("/health/records/user/{user_id}/latest"),
                "latest_record",
                None::<&()>,
            )
            .await,
        )
    }

    pub async fn delete_record(&self, record_id: &str) -> Result<HealthRecord, ApiError> {
        self.call(
            Method::DELETE,
            &format!("/health/records/{record_id}"),
            "delete_record",
            None::<&()>,
        )
        .await
    }

    pub async fn monitored_records(
        &self,
        monitor_id: &str,
        patient_id: &str,
    ) -> Result<Vec<HealthRecord>, ApiError> {
        self.call(
            Method::GET,
            &format!("/health/records/monitor/{monitor_id}/patient/{patient_id}"),
            "monitored_records",
            None::<&()>,
        )
        .await
    }

    /// `None` when the patient has no records yet.
    pub async fn monitored_latest_record(
        &self,
        monitor_id: &str,
        patient_id: &str,
    ) -> Result<Option<HealthRecord>, ApiError> {
        optional(
            self.call(
                Method::GET,
                &format!("/health/records/monitor/{monitor_id}/patient/{patient_id}/latest"),
                "monitored_latest_record",
                None::<&()>,
            )
            .await,
        )
    }

    // ---- monitoring ----

    pub async fn request_monitoring(
        &self,
        patient_id: &str,
        requester_id: &str,
    ) -> Result<MonitoringRequest, ApiError> {
        let body = MonitoringRequestCreate {
            patient_id: patient_id.to_string(),
            requester_id: requester_id.to_string(),
        };
        self.call(
            Method::POST,
            "/monitoring/request",
            "request_monitoring",
            Some(&body),
        )
        .await
    }

    pub async fn pending_requests(
        &self,
        patient_id: &str,
    ) -> Result<Vec<MonitoringRequest>, ApiError> {
        self.call(
            Method::GET,
            &format!("/monitoring/requests/pending/{patient_id}"),
            "pending_requests",
            None::<&()>,
        )
        .await
    }

    /// Requests sent by a doctor or caregiver, in any status.
    pub async fn sent_requests(
        &self,
        requester_id: &str,
    ) -> Result<Vec<MonitoringRequest>, ApiError> {
        self.call(
            Method::GET,
            &format!("/monitoring/requests/sent/{requester_id}"),
            "sent_requests",
            None::<&()>,
        )
        .await
    }

    /// Withdraw a request before the patient answers it.
    pub async fn cancel_request(&self, request_id: &str) -> Result<(), ApiError> {
        self.call_no_content(
            Method::DELETE,
            &format!("/monitoring/request/{request_id}"),
            "cancel_request",
        )
        .await
    }

    pub async fn respond_to_request(
        &self,
        request_id: &str,
        approved: bool,
    ) -> Result<MonitoringRequest, ApiError> {
        let body = MonitoringApproval {
            request_id: request_id.to_string(),
            approved,
        };
        self.call(
            Method::POST,
            "/monitoring/approve",
            "respond_to_request",
            Some(&body),
        )
        .await
    }

    pub async fn relations(&self, patient_id: &str) -> Result<Vec<MonitoringRelation>, ApiError> {
        self.call(
            Method::GET,
            &format!("/monitoring/relations/{patient_id}"),
            "relations",
            None::<&()>,
        )
        .await
    }

    pub async fn my_patients(&self, monitor_id: &str) -> Result<Vec<MonitoringRelation>, ApiError> {
        self.call(
            Method::GET,
            &format!("/monitoring/my-patients/{monitor_id}"),
            "my_patients",
            None::<&()>,
        )
        .await
    }

    /// End an approved relation. Either side may revoke it.
    pub async fn revoke_relation(&self, relation_id: &str) -> Result<(), ApiError> {
        self.call_no_content(
            Method::DELETE,
            &format!("/monitoring/relation/{relation_id}"),
            "revoke_relation",
        )
        .await
    }

    // ---- plumbing ----

    async fn call<B, T>(
        &self,
        method: Method,
        path: &str,
        endpoint: &'static str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let res = self
            .execute(method.clone(), &url, endpoint, body)
            .await
            .and_then(|bytes| decode(&bytes, &url));
        observe(&method, &url, endpoint, res)
    }

    /// For endpoints answering `204 No Content`; any body is ignored.
    async fn call_no_content(
        &self,
        method: Method,
        path: &str,
        endpoint: &'static str,
    ) -> Result<(), ApiError> {
        let url = self.url(path);
        let res = self
            .execute(method.clone(), &url, endpoint, None::<&()>)
            .await
            .map(drop);
        observe(&method, &url, endpoint, res)
    }

    async fn execute<B>(
        &self,
        method: Method,
        url: &str,
        endpoint: &'static str,
        body: Option<&B>,
    ) -> Result<Vec<u8>, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut req: RequestBuilder = self.http.request(method, url);
        if let Some(b) = body {
            req = req.json(b);
        }

        counter!("vitalwatch_api_requests_total", "endpoint" => endpoint).increment(1);
        let t0 = Instant::now();
        let res = send(req, url).await;
        histogram!("vitalwatch_api_duration_ms", "endpoint" => endpoint)
            .record(t0.elapsed().as_secs_f64() * 1000.0);
        res
    }
}

fn observe<T>(
    method: &Method,
    url: &str,
    endpoint: &'static str,
    res: Result<T, ApiError>,
) -> Result<T, ApiError> {
    match &res {
        Ok(_) => debug!(%method, %url, "backend call ok"),
        Err(e) => {
            counter!("vitalwatch_api_errors_total", "endpoint" => endpoint).increment(1);
            warn!(%method, %url, error = %e, "backend call failed");
        }
    }
    res
}

/// Returns the raw body of a 2xx response.
async fn send(req: RequestBuilder, url: &str) -> Result<Vec<u8>, ApiError> {
    let rsp = req.send().await.map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;
    let status = rsp.status();
    let bytes = rsp.bytes().await.map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        let body = String::from_utf8_lossy(&bytes);
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail: extract_detail(&body, status_phrase(status)),
        });
    }
    Ok(bytes.to_vec())
}

fn decode<T: DeserializeOwned>(bytes: &[u8], url: &str) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

fn status_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("unknown status")
}

/// Map a 404 to `Ok(None)`; every other outcome passes through.
fn optional<T>(res: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
