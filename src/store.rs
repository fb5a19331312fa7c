//! Persistência do [`RunState`] entre execuções.
//!
//! [`JsonFileStore`] grava o estado como JSON de forma atômica (arquivo
//! temporário + rename). `MemoryStore` mantém o estado em memória para os testes.

use std::future::Future;
use std::path::PathBuf;
#[cfg(test)]
use std::sync::Mutex;

use crate::error::StoreError;
use crate::schedule::RunState;

pub trait StateStore {
    /// The last persisted state, or `None` before the first successful run.
    fn get(&self) -> impl Future<Output = Result<Option<RunState>, StoreError>> + Send;

    fn set(&self, state: &RunState) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Armazena o estado em um arquivo JSON.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStore {
    async fn get(&self) -> Result<Option<RunState>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(None),
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, state: &RunState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

/// Estado mantido apenas em memória.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<RunState>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new(initial: Option<RunState>) -> Self {
        Self {
            state: Mutex::new(initial),
        }
    }

    pub fn snapshot(&self) -> Option<RunState> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
impl StateStore for MemoryStore {
    async fn get(&self) -> Result<Option<RunState>, StoreError> {
        Ok(self.snapshot())
    }

    async fn set(&self, state: &RunState) -> Result<(), StoreError> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Some(*state);
        Ok(())
    }
}
