use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The on-disk form of a saved access token
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AgentIdentity {
    pub token: String,
}

#[derive(thiserror::Error, Debug)]
pub enum IdentityError {
    #[error("no access token to save")]
    NoToken,
    #[error("token file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("token file {path} is not valid json: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct IdentityManager {
    path: PathBuf,
}

impl IdentityManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `{"token": "<token>"}`, replacing any previous file
    pub fn save_token(&self, token: Option<&str>) -> Result<(), IdentityError> {
        let token = token.ok_or(IdentityError::NoToken)?;
        let contents = serde_json::to_string_pretty(&AgentIdentity {
            token: token.to_string(),
        })
        .map_err(|source| IdentityError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, contents).map_err(|source| IdentityError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!("Saved access token to {}", self.path.display());
        Ok(())
    }

    pub fn load_token(&self) -> Result<Option<String>, IdentityError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(IdentityError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let identity: AgentIdentity =
            serde_json::from_str(&contents).map_err(|source| IdentityError::Json {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!("Loaded access token from {}", self.path.display());
        Ok(Some(identity.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_writes_token_object() {
        let dir = tempfile::tempdir().unwrap();
        let manager = IdentityManager::new(dir.path().join("token.json"));
        manager.save_token(Some("abc.def")).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(manager.path()).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({"token": "abc.def"}));
        assert_eq!(manager.load_token().unwrap().as_deref(), Some("abc.def"));
    }

    #[test]
    fn save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let manager = IdentityManager::new(dir.path().join("token.json"));
        manager.save_token(Some("first")).unwrap();
        manager.save_token(Some("second")).unwrap();
        assert_eq!(manager.load_token().unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn nothing_to_save() {
        let dir = tempfile::tempdir().unwrap();
        let manager = IdentityManager::new(dir.path().join("token.json"));
        assert!(matches!(manager.save_token(None), Err(IdentityError::NoToken)));
        assert!(!manager.path().exists());
    }

    #[test]
    fn missing_file_is_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let manager = IdentityManager::new(dir.path().join("absent.json"));
        assert_eq!(manager.load_token().unwrap(), None);
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();
        let manager = IdentityManager::new(path);
        assert!(matches!(manager.load_token(), Err(IdentityError::Json { .. })));
    }
}
