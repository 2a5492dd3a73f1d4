//! Setup-stage failure policy.
//!
//! Which stages may degrade and which must abort is a property of the
//! stage, kept here as data rather than scattered through the
//! orchestration code.

use cradle_common::error::Result;

/// Distinct setup stages of a launch, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request validation, before any host state is touched.
    Validate,
    /// Creation of the parent/child sync gate.
    CreateGate,
    /// Creation of the cgroup and its memory ceiling.
    CreateCgroup,
    /// Spawning the re-executed child under its namespaces.
    SpawnChild,
    /// Host-side bridge and veth wiring.
    HostNetwork,
    /// Attaching the child process to the cgroup.
    AttachCgroup,
    /// Container-side interface and route configuration.
    ContainerNetwork,
    /// The filesystem pivot inside the child.
    FilesystemIsolation,
    /// Replacing the child's process image with the user command.
    ExecCommand,
}

/// Whether a stage failure aborts the launch or degrades it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The launch cannot continue.
    Fatal,
    /// The launch continues without the stage's feature.
    Tolerable,
}

impl Stage {
    /// Failure policy for this stage.
    ///
    /// Process isolation must not be held hostage by the optional
    /// network feature; everything else is a hard guarantee.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::HostNetwork | Self::ContainerNetwork => Severity::Tolerable,
            Self::Validate
            | Self::CreateGate
            | Self::CreateCgroup
            | Self::SpawnChild
            | Self::AttachCgroup
            | Self::FilesystemIsolation
            | Self::ExecCommand => Severity::Fatal,
        }
    }

    /// Stage name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::CreateGate => "create sync gate",
            Self::CreateCgroup => "create cgroup",
            Self::SpawnChild => "spawn child",
            Self::HostNetwork => "host network",
            Self::AttachCgroup => "attach cgroup",
            Self::ContainerNetwork => "container network",
            Self::FilesystemIsolation => "filesystem isolation",
            Self::ExecCommand => "exec command",
        }
    }
}

/// Applies the stage policy to a setup result.
///
/// Tolerable failures are logged and collapsed to `None`; fatal failures
/// propagate to the caller.
///
/// # Errors
///
/// Returns the original error when the stage is fatal.
pub fn apply<T>(stage: Stage, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if matches!(stage.severity(), Severity::Tolerable) => {
            tracing::warn!(stage = stage.name(), error = %e, "setup stage degraded");
            Ok(None)
        }
        Err(e) => {
            tracing::error!(stage = stage.name(), error = %e, "setup stage failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cradle_common::error::CradleError;

    #[test]
    fn only_network_stages_are_tolerable() {
        for stage in [
            Stage::Validate,
            Stage::CreateGate,
            Stage::CreateCgroup,
            Stage::SpawnChild,
            Stage::AttachCgroup,
            Stage::FilesystemIsolation,
            Stage::ExecCommand,
        ] {
            assert_eq!(stage.severity(), Severity::Fatal, "{}", stage.name());
        }
        assert_eq!(Stage::HostNetwork.severity(), Severity::Tolerable);
        assert_eq!(Stage::ContainerNetwork.severity(), Severity::Tolerable);
    }

    #[test]
    fn tolerable_failure_collapses_to_none() {
        let failed: Result<()> = Err(CradleError::Network {
            message: "veth refused".into(),
        });
        let applied = apply(Stage::HostNetwork, failed).unwrap();
        assert!(applied.is_none());
    }

    #[test]
    fn fatal_failure_propagates() {
        let failed: Result<()> = Err(CradleError::Usage {
            message: "bad".into(),
        });
        assert!(apply(Stage::Validate, failed).is_err());
    }

    #[test]
    fn success_passes_through() {
        let ok: Result<u32> = Ok(7);
        assert_eq!(apply(Stage::SpawnChild, ok).unwrap(), Some(7));
    }
}
