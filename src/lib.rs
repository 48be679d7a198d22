// src/lib.rs
// Public library surface for the CLI binary and integration tests.

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod forms;
pub mod history;
pub mod level;
pub mod risk;
pub mod session;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::level::RiskLevel;
pub use crate::risk::{compute_risk_score, HealthProfile, HealthReading};
pub use crate::session::{Session, SessionStore};
