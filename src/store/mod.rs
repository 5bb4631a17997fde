//! Local console state
//!
//! Session and factory selection survive restarts as JSON snapshots under the
//! configured store directory. The department tree is rebuilt from the backend
//! on every fetch and only lives in memory.

pub mod department;
pub mod factory;
pub mod session;

use serde::{de::DeserializeOwned, Serialize};
use std::io;
use std::path::{Path, PathBuf};

pub use department::DepartmentState;
pub use factory::FactoryState;
pub use session::SessionState;

/// File-backed snapshot of a serde value
#[derive(Debug)]
pub struct JsonStore<T> {
    path: PathBuf,
    value: T,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Load `<dir>/<name>.json`. A missing file yields the default value, and
    /// so does an unreadable one (after a warning).
    pub fn load(dir: &Path, name: &str) -> Self {
        let path = dir.join(format!("{}.json", name));
        let value = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("Discarding corrupt store {}: {}", path.display(), e);
                T::default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => T::default(),
            Err(e) => {
                tracing::warn!("Could not read store {}: {}", path.display(), e);
                T::default()
            }
        };
        Self { path, value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mutate the value and persist it
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> io::Result<R> {
        let result = f(&mut self.value);
        self.save()?;
        Ok(result)
    }

    /// Write the snapshot through a temp file so a crash never leaves half a file
    pub fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(&self.value)?;
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)
    }
}
