use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::{AccountId, Cents, Ledger};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Ledger file {} is corrupted: {reason}", .path.display())]
    Corrupted { path: PathBuf, reason: String },

    #[error("Failed to read ledger file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write ledger file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Durable home of the ledger: one JSON document holding every balance.
///
/// The whole ledger is read and written as a unit. A missing file is an empty
/// ledger. Writes go to a sibling temporary file that is renamed over the
/// target, so readers never see a half-written document.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Point a store at `path`, creating missing parent directories.
    /// The file itself is only created by the first `save`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::Write {
                    path: path.clone(),
                    source,
                })?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full ledger from disk.
    pub async fn load(&self) -> Result<Ledger, StorageError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Ledger::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let document: Value =
            serde_json::from_slice(&bytes).map_err(|e| self.corrupted(e.to_string()))?;

        match document {
            Value::Null => Ok(Ledger::new()),
            // Older deployments wrote an empty list after a reset
            Value::Array(items) if items.is_empty() => Ok(Ledger::new()),
            Value::Object(_) => {
                let balances: BTreeMap<AccountId, Cents> = serde_json::from_value(document)
                    .map_err(|e| self.corrupted(e.to_string()))?;
                Ledger::from_balances(balances).map_err(|e| self.corrupted(e.to_string()))
            }
            other => Err(self.corrupted(format!(
                "expected an object of account balances, found {}",
                kind_of(&other)
            ))),
        }
    }

    /// Replace the file on disk with `ledger`.
    pub async fn save(&self, ledger: &Ledger) -> Result<(), StorageError> {
        let mut json = serde_json::to_vec_pretty(ledger).map_err(|e| StorageError::Write {
            path: self.path.clone(),
            source: io::Error::other(e),
        })?;
        json.push(b'\n');

        let temp_path = self.temp_path();
        if let Err(source) = write_and_replace(&temp_path, &self.path, &json).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Write {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn corrupted(&self, reason: String) -> StorageError {
        StorageError::Corrupted {
            path: self.path.clone(),
            reason,
        }
    }
}

async fn write_and_replace(temp_path: &Path, target: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp_path, target).await
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a non-empty array",
        Value::Object(_) => "an object",
    }
}
