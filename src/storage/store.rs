use std::path::Path;

use crate::error::Result;

#[cfg(test)]
use mockall::automock;

/// Bulk persistence contract consumed by the cache-backed repositories.
///
/// `find_all` loads the whole collection; `add` appends a single entity for
/// stores that support incremental writes; `write_all` replaces the persisted
/// collection wholesale. The snapshot pair handles entity kinds that keep an
/// individually addressable file per record.
#[cfg_attr(test, automock)]
pub trait EntityStore<T: 'static + Send + Sync>: Send + Sync {
    fn find_all(&self) -> Result<Vec<T>>;

    fn add(&self, entity: &T) -> Result<()>;

    fn write_all(&self, entities: &[T]) -> Result<()>;

    fn save_snapshot(&self, entity: &T, dir: &Path, key: &str) -> Result<()>;

    fn delete_snapshot(&self, dir: &Path, key: &str) -> Result<()>;
}
