use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, warn};

pub const SESSIONS_KEY: &str = "sessions";
pub const RUNNING_KEY: &str = "running";
pub const TAG_COLORS_KEY: &str = "tagColors";
pub const POMODORO_SETTINGS_KEY: &str = "pomodoroSettings";

/// Interface for abstracting persistence of application state. Every key holds one JSON
/// document.
pub trait StateStore {
    /// Reads the document stored under `key`. Missing or corrupted documents are never an error,
    /// they yield `T::default()`.
    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> impl Future<Output = T>;

    /// Replaces the document stored under `key`.
    fn save<T: Serialize + Sync>(&self, key: &str, value: &T) -> impl Future<Output = Result<()>>;
}

impl<T: Deref> StateStore for T
where
    T::Target: StateStore,
{
    fn load<V: DeserializeOwned + Default>(&self, key: &str) -> impl Future<Output = V> {
        self.deref().load(key)
    }

    fn save<V: Serialize + Sync>(&self, key: &str, value: &V) -> impl Future<Output = Result<()>> {
        self.deref().save(key, value)
    }
}

/// The main realization of [StateStore]. Documents live in `<dir>/<key>.json` and are guarded
/// with advisory file locks so that a concurrent invocation never reads a half written file.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn read_document(path: &Path) -> Result<Option<String>, std::io::Error> {
        let mut file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        file.lock_shared()?;
        let mut content = String::new();
        let result = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        result?;
        Ok(Some(content))
    }

    async fn write_document(path: &Path, content: &[u8]) -> Result<(), std::io::Error> {
        // Truncating only after the lock is taken, otherwise a reader could observe an empty file.
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .await?;
        file.lock_exclusive()?;
        let result = async {
            file.set_len(0).await?;
            file.rewind().await?;
            file.write_all(content).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;
        file.unlock_async().await?;
        result
    }
}

impl StateStore for JsonFileStore {
    async fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let path = self.document_path(key);
        debug!("Loading {path:?}");
        match Self::read_document(&path).await {
            Ok(Some(content)) => match serde_json::from_str::<T>(&content) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Document {key} is corrupted, using defaults: {e}");
                    T::default()
                }
            },
            Ok(None) => {
                debug!("Document {key} doesn't exist yet");
                T::default()
            }
            Err(e) => {
                warn!("Failed to read {path:?}, using defaults: {e}");
                T::default()
            }
        }
    }

    async fn save<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.document_path(key);
        let content = serde_json::to_vec(value)?;
        debug!("Saving {} bytes into {path:?}", content.len());
        Self::write_document(&path, &content).await?;
        Ok(())
    }
}
