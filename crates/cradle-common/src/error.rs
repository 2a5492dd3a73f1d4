//! Unified error types for the cradle workspace.
//!
//! Every crate in the workspace reports failures through [`CradleError`];
//! the CLI binary is the only place that converts them into `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CradleError {
    /// The runtime was invoked incorrectly.
    #[error("{message}")]
    Usage {
        /// Description of the misuse.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A kernel interface call failed.
    #[error("{op}: {source}")]
    Sys {
        /// The operation that failed.
        op: &'static str,
        /// Errno returned by the kernel.
        source: nix::errno::Errno,
    },

    /// A netlink operation against the network stack failed.
    #[error("network setup: {message}")]
    Network {
        /// Description of the failed operation.
        message: String,
    },

    /// Replacing the process image with the container command failed.
    #[error("failed to exec {command}: {source}")]
    Exec {
        /// The command that could not be executed.
        command: String,
        /// Errno returned by the kernel.
        source: nix::errno::Errno,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CradleError>;
