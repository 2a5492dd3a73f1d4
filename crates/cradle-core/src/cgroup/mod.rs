//! Cgroups v2 memory confinement.
//!
//! Creates a named group under the unified hierarchy, applies the memory
//! ceiling, and attaches the container process. The group directory can
//! only be removed once the attached process has exited and the group is
//! empty.

pub mod memory;

use std::fs;
use std::path::{Path, PathBuf};

use cradle_common::constants::{CGROUP_PARENT, CGROUP_ROOT};
use cradle_common::error::{CradleError, Result};

/// Handle to the cgroup confining one container.
#[derive(Debug)]
pub struct CgroupManager {
    /// Path to this container's cgroup directory.
    path: PathBuf,
}

impl CgroupManager {
    /// Creates the group under `/sys/fs/cgroup/cradle/<name>` and applies
    /// the memory ceiling.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the limit
    /// file cannot be written.
    pub fn create(name: &str, memory_limit_mb: u64) -> Result<Self> {
        Self::create_under(Path::new(CGROUP_ROOT), name, memory_limit_mb)
    }

    /// Creates the group under an explicit hierarchy root.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the limit
    /// file cannot be written.
    pub fn create_under(root: &Path, name: &str, memory_limit_mb: u64) -> Result<Self> {
        let parent = root.join(CGROUP_PARENT);
        let path = parent.join(name);
        fs::create_dir_all(&path).map_err(|e| CradleError::Io {
            path: path.clone(),
            source: e,
        })?;

        memory::enable_controller(&parent);
        memory::set_memory_max(&path, memory::limit_bytes(memory_limit_mb))?;

        tracing::info!(path = %path.display(), memory_limit_mb, "cgroup created");
        Ok(Self { path })
    }

    /// Path of the group's directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds a process to the group by writing its PID.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `cgroup.procs` fails.
    pub fn attach(&self, pid: u32) -> Result<()> {
        let procs = self.path.join("cgroup.procs");
        fs::write(&procs, pid.to_string()).map_err(|e| CradleError::Io {
            path: procs,
            source: e,
        })?;
        tracing::debug!(pid, "process attached to cgroup");
        Ok(())
    }

    /// Removes the group's directory.
    ///
    /// The kernel refuses to remove a group that still holds processes,
    /// so callers must wait for the attached process to exit first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed, including the
    /// non-empty-group condition.
    pub fn release(&self) -> Result<()> {
        fs::remove_dir(&self.path).map_err(|e| CradleError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %self.path.display(), "cgroup released");
        Ok(())
    }
}
