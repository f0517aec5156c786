use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::storage::store::EntityStore;

/// One JSON array file per collection, plus optional per-entity snapshot
/// files named `<key>.json` under a caller-supplied directory. A missing
/// collection file reads as an empty collection so a fresh data directory
/// needs no seeding step.
pub struct JsonFileStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    fn snapshot_path(dir: &Path, key: &str) -> PathBuf {
        dir.join(format!("{}.json", key))
    }
}

impl<T> EntityStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn find_all(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read(&self.path)?;
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        let entities = serde_json::from_slice(&raw)?;
        Ok(entities)
    }

    fn add(&self, entity: &T) -> Result<()> {
        let mut all = self.find_all()?;
        all.push(entity.clone());
        self.write_all(&all)
    }

    fn write_all(&self, entities: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_vec_pretty(entities)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    fn save_snapshot(&self, entity: &T, dir: &Path, key: &str) -> Result<()> {
        fs::create_dir_all(dir)?;
        let raw = serde_json::to_vec_pretty(entity)?;
        fs::write(Self::snapshot_path(dir, key), raw)?;
        Ok(())
    }

    fn delete_snapshot(&self, dir: &Path, key: &str) -> Result<()> {
        let path = Self::snapshot_path(dir, key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                Error::Storage(format!(
                    "Failed to delete snapshot file {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
