use super::files::{atomic_write, read_optional};
use anyhow::Result;
#[cfg(test)]
use std::cell::RefCell;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::rc::Rc;

/// Default name of the persisted state blob
pub const DEFAULT_STATE_FILE: &str = "work_planner.json";

/// Storage backend for the serialized state snapshot
pub trait StatePort {
    /// The stored blob, `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<String>>;

    fn save(&mut self, blob: &str) -> Result<()>;
}

/// State blob kept in a single file, written atomically
#[derive(Debug, Clone)]
pub struct FileStatePort {
    path: PathBuf,
}

impl FileStatePort {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Port for `file_name` inside a data directory
    pub fn in_dir(dir: &Path, file_name: &str) -> Self {
        Self::new(dir.join(file_name))
    }
}

impl StatePort for FileStatePort {
    fn load(&self) -> Result<Option<String>> {
        read_optional(&self.path)
    }

    fn save(&mut self, blob: &str) -> Result<()> {
        atomic_write(&self.path, blob)
    }
}

/// In-memory port; clones share the same blob so tests can inspect writes
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStatePort {
    blob: Rc<RefCell<Option<String>>>,
    saves: Rc<RefCell<usize>>,
}

#[cfg(test)]
impl MemoryStatePort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: &str) -> Self {
        let port = Self::default();
        *port.blob.borrow_mut() = Some(blob.to_string());
        port
    }

    pub fn blob(&self) -> Option<String> {
        self.blob.borrow().clone()
    }

    /// Number of saves performed through any clone
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

#[cfg(test)]
impl StatePort for MemoryStatePort {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.blob.borrow().clone())
    }

    fn save(&mut self, blob: &str) -> Result<()> {
        *self.blob.borrow_mut() = Some(blob.to_string());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}
