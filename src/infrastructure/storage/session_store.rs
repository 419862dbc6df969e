//! File-backed session storage.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::models::AuthState;
use crate::domain::ports::{SessionStore, StorageError};

/// Session file name inside the storage directory.
pub const SESSION_FILE: &str = "session.json";

/// On-disk layout: the bare token plus the persisted auth slice.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    auth_token: Option<String>,
    #[serde(default)]
    auth_storage: AuthState,
}

/// Session persisted as JSON in `<storage dir>/session.json`
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            path: storage_dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn write(&self, file: &SessionFile) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<AuthState, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AuthState::default()),
            Err(e) => return Err(self.io_error(e)),
        };
        let file: SessionFile = serde_json::from_str(&raw)?;

        // The bare token is authoritative; a slice without one is stale.
        let mut state = file.auth_storage;
        state.token = file.auth_token.or(state.token);
        if state.token.is_none() {
            state = AuthState::default();
        }
        Ok(state)
    }

    fn save(&self, state: &AuthState) -> Result<(), StorageError> {
        debug!(path = %self.path.display(), "saving session");
        self.write(&SessionFile {
            auth_token: state.token.clone(),
            auth_storage: state.clone(),
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::User;
    use tempfile::TempDir;

    fn user() -> User {
        User {
            id: 1,
            username: "amira".to_string(),
            email: "amira@example.tn".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            company_name: Some("Icone".to_string()),
            role: "ADMIN".to_string(),
            has_credentials: true,
        }
    }

    #[test]
    fn test_missing_file_is_signed_out() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        assert_eq!(store.load().unwrap(), AuthState::default());
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested"));
        let state = AuthState::authenticated(user(), "tok".to_string());

        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"auth_token\": \"tok\""));
        assert!(raw.contains("\"auth_storage\""));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), AuthState::default());
        store.clear().unwrap();
    }

    #[test]
    fn test_slice_without_token_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        std::fs::write(
            store.path(),
            r#"{"auth_storage":{"user":null,"token":null,"is_authenticated":true}}"#,
        )
        .unwrap();
        assert!(!store.load().unwrap().is_authenticated);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(StorageError::Serialization(_))));
    }
}
