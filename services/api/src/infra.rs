use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;
use qualform::form::persistence::{BlobStore, StorageError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Volatile store used by the demo subcommand and tests.
#[derive(Default)]
pub(crate) struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl BlobStore for InMemoryBlobStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.blobs.lock().expect("blob store mutex poisoned");
        Ok(guard.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let mut guard = self.blobs.lock().expect("blob store mutex poisoned");
        guard.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// One file per key under the configured state directory.
pub(crate) struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StorageError::Unavailable(error.to_string())),
        }
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)
            .map_err(|error| StorageError::Unavailable(error.to_string()))?;
        fs::write(self.path_for(key), blob)
            .map_err(|error| StorageError::Unavailable(error.to_string()))
    }
}
