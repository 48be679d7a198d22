//! Backend API: wire types, errors, the HTTP client, and the read-side
//! trait the dashboard and history views are written against.

pub mod client;
pub mod error;
pub mod models;

pub use client::ApiClient;
pub use error::ApiError;
pub use models::{
    HealthProfileRecord, HealthProfileUpdate, HealthRecord, LoginRequest, MonitoringRelation,
    MonitoringRequest, MonitoringStatus, RecordInput, RegisterRequest, Role, Sex, SmokingHistory,
    User,
};

/// Reads the views need. Implemented by [`ApiClient`]; tests plug in fakes.
#[async_trait::async_trait]
pub trait HealthApi: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<User, ApiError>;
    async fn get_health_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<HealthProfileRecord>, ApiError>;
    async fn latest_record(&self, user_id: &str) -> Result<Option<HealthRecord>, ApiError>;
    async fn list_records(&self, user_id: &str) -> Result<Vec<HealthRecord>, ApiError>;
}

#[async_trait::async_trait]
impl HealthApi for ApiClient {
    async fn get_user(&self, user_id: &str) -> Result<User, ApiError> {
        ApiClient::get_user(self, user_id).await
    }

    async fn get_health_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<HealthProfileRecord>, ApiError> {
        ApiClient::get_health_profile(self, user_id).await
    }

    async fn latest_record(&self, user_id: &str) -> Result<Option<HealthRecord>, ApiError> {
        ApiClient::latest_record(self, user_id).await
    }

    async fn list_records(&self, user_id: &str) -> Result<Vec<HealthRecord>, ApiError> {
        ApiClient::list_records(self, user_id).await
    }
}
