use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Setup(#[source] reqwest::Error),

    #[error("cannot reach backend at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers `{"detail": "..."}`; validation failures carry a
/// structured `detail`, which is rendered as compact JSON. Anything else is
/// returned verbatim (or the status phrase when the body is empty).
pub fn extract_detail(body: &str, fallback: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        match v.get("detail") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_prefers_backend_message() {
        assert_eq!(
            extract_detail(r#"{"detail":"user not found"}"#, "Not Found"),
            "user not found"
        );
        assert_eq!(
            extract_detail(r#"{"detail":[{"loc":["body","id"]}]}"#, "Unprocessable"),
            r#"[{"loc":["body","id"]}]"#
        );
        assert_eq!(extract_detail("  gateway down ", "Bad Gateway"), "gateway down");
        assert_eq!(extract_detail("", "Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn not_found_is_detected_from_status() {
        let e = ApiError::Status {
            status: 404,
            detail: "missing".into(),
        };
        assert!(e.is_not_found());
        assert_eq!(e.to_string(), "backend returned 404: missing");
    }
}
