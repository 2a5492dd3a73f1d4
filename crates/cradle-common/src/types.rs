//! Domain primitive types used across the cradle workspace.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MEMORY_LIMIT_MB;
use crate::error::{CradleError, Result};

/// Unique identifier for a container launch.
///
/// Cgroup and diagnostic names derive from this identifier, so two
/// launches never collide on host-global resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random container ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to launch one container.
///
/// Built once from CLI arguments and treated as immutable after
/// [`validate`](Self::validate) passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Path to the container's root filesystem tree.
    pub rootfs: PathBuf,
    /// Command to execute inside the container.
    pub command: String,
    /// Arguments passed through verbatim to the command.
    pub args: Vec<String>,
    /// Memory ceiling in megabytes.
    pub memory_limit_mb: u64,
}

impl LaunchSpec {
    /// Creates a spec with the default memory limit and no arguments.
    #[must_use]
    pub fn new(rootfs: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        Self {
            rootfs: rootfs.into(),
            command: command.into(),
            args: Vec::new(),
            memory_limit_mb: DEFAULT_MEMORY_LIMIT_MB,
        }
    }

    /// Checks that the spec names both a rootfs and a command.
    ///
    /// # Errors
    ///
    /// Returns a usage error if either is missing; runs before any host
    /// state is touched.
    pub fn validate(&self) -> Result<()> {
        if self.rootfs.as_os_str().is_empty() {
            return Err(CradleError::Usage {
                message: "a rootfs path is required".into(),
            });
        }
        if self.command.is_empty() {
            return Err(CradleError::Usage {
                message: "a command is required".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = ContainerId::generate();
        let b = ContainerId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn validate_accepts_complete_spec() {
        let spec = LaunchSpec::new("/tmp/rootfs", "/bin/sh");
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_rootfs() {
        let spec = LaunchSpec::new("", "/bin/sh");
        assert!(matches!(
            spec.validate(),
            Err(CradleError::Usage { .. })
        ));
    }

    #[test]
    fn validate_rejects_missing_command() {
        let spec = LaunchSpec::new("/tmp/rootfs", "");
        assert!(matches!(
            spec.validate(),
            Err(CradleError::Usage { .. })
        ));
    }

    #[test]
    fn new_applies_default_memory_limit() {
        let spec = LaunchSpec::new("/tmp/rootfs", "/bin/sh");
        assert_eq!(spec.memory_limit_mb, DEFAULT_MEMORY_LIMIT_MB);
    }
}
