//! Token persisted in a file between invocations.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::infra::error::InfraError;
use crate::infra::http::TokenProvider;

#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: Mutex<Option<String>>,
}

impl FileTokenStore {
    /// Opens the store, reading an existing token if one is present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, InfraError> {
        let path = path.into();
        if path.is_dir() {
            return Err(InfraError::configuration(format!(
                "token file `{}` is a directory",
                path.display()
            )));
        }
        let cached = match fs::read_to_string(&path) {
            Ok(contents) => {
                let token = contents.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(InfraError::Io(err)),
        };
        Ok(Self {
            path,
            cached: Mutex::new(cached),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, token: &str) -> Result<(), InfraError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        file.write_all(token.as_bytes())?;
        Ok(())
    }
}

impl TokenProvider for FileTokenStore {
    fn token(&self) -> Option<String> {
        self.cached
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn store(&self, token: &str) -> Result<(), InfraError> {
        self.write_file(token)?;
        let mut guard = self
            .cached
            .lock()
            .map_err(|_| InfraError::token_store("token lock poisoned"))?;
        *guard = Some(token.to_string());
        debug!(path = %self.path.display(), "stored api token");
        Ok(())
    }

    fn clear(&self) -> Result<(), InfraError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(InfraError::Io(err)),
        }
        let mut guard = self
            .cached
            .lock()
            .map_err(|_| InfraError::token_store("token lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
