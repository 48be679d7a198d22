//! session.rs: explicit session context plus its on-disk store.
//!
//! A `Session` is created from the backend's login/registration answer,
//! passed by reference to everything that needs identity, and removed at
//! logout. The store only exists so separate CLI invocations share it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::models::{Role, User};
use crate::level::RiskLevel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub user_name: String,
    pub role: Role,
    /// Level seen on the last dashboard load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

impl Session {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            role: user.role,
            risk_level: None,
        }
    }

    pub fn with_risk_level(mut self, level: RiskLevel) -> Self {
        self.risk_level = Some(level);
        self
    }

    /// Last two characters of the name (dashboard avatar).
    pub fn initials(&self) -> String {
        initials(&self.user_name)
    }

    /// First two characters of the name (form page avatar).
    pub fn short_name(&self) -> String {
        self.user_name.chars().take(2).collect()
    }
}

pub fn initials(name: &str) -> String {
    let n = name.chars().count();
    name.chars().skip(n.saturating_sub(2)).collect()
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nobody is logged in.
    pub fn load(&self) -> Result<Option<Session>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading session {}", self.path.display()))
            }
        };
        let session = serde_json::from_str(&data)
            .with_context(|| format!("parsing session {}", self.path.display()))?;
        Ok(Some(session))
    }

    /// Like [`load`](Self::load) but a missing session is an error.
    pub fn require(&self) -> Result<Session> {
        self.load()?
            .ok_or_else(|| anyhow!("not logged in; run `vitalwatch login` first"))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating session dir {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(session)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing session {}", self.path.display()))?;
        debug!(user = %session.user_id, path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Idempotent: clearing an absent session succeeds.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing session {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User {
            id: "kim@test.com".into(),
            name: name.into(),
            role: Role::Patient,
        }
    }

    #[test]
    fn initials_take_last_two_chars() {
        assert_eq!(Session::from_user(&user("홍길동")).initials(), "길동");
        assert_eq!(Session::from_user(&user("Al")).initials(), "Al");
        assert_eq!(Session::from_user(&user("J")).initials(), "J");
        assert_eq!(Session::from_user(&user("홍길동")).short_name(), "홍길");
    }

    #[test]
    fn save_load_clear_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested/session.json"));

        assert!(store.load().unwrap().is_none());
        assert!(store.require().is_err());

        let s = Session::from_user(&user("Kim")).with_risk_level(RiskLevel::Moderate);
        store.save(&s).unwrap();
        assert_eq!(store.load().unwrap(), Some(s.clone()));
        assert_eq!(store.require().unwrap().user_name, "Kim");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_logout() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("session.json");
        fs::write(&p, "{ not json").unwrap();
        assert!(SessionStore::new(&p).load().is_err());
    }
}
