//! Parent/child synchronization over an inheritable pipe.
//!
//! The gate is a one-shot, one-directional handshake: the child blocks
//! reading its end of a pipe, and is released only when the parent closes
//! the write end. This guarantees cgroup attachment and network
//! relocation complete before the child pivots its filesystem and
//! replaces its process image.

#![allow(unsafe_code)]

use std::os::fd::{AsRawFd, BorrowedFd, OwnedFd, RawFd};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd::{pipe2, read};

use cradle_common::error::{CradleError, Result};

/// Parent-side handle to the gate.
///
/// Holds both pipe ends as owned descriptors. The read end is lent to
/// the child at spawn time; the write end is the release trigger.
/// Signaling and closing are idempotent; a taken end is simply gone.
#[derive(Debug)]
pub struct SyncGate {
    read: Option<OwnedFd>,
    write: Option<OwnedFd>,
}

impl SyncGate {
    /// Creates a new armed gate.
    ///
    /// Both ends carry close-on-exec: a spawned child must not keep its
    /// inherited copy of the write end open past its exec, or the read
    /// side would never see end-of-file. The spawn trampoline re-pins
    /// the read end at the agreed index, which strips the flag there.
    ///
    /// # Errors
    ///
    /// Returns an error if the `pipe2(2)` syscall fails.
    pub fn new() -> Result<Self> {
        let (read, write) = pipe2(OFlag::O_CLOEXEC).map_err(|e| CradleError::Sys {
            op: "pipe2",
            source: e,
        })?;
        Ok(Self {
            read: Some(read),
            write: Some(write),
        })
    }

    /// Raw descriptor of the read end, for duplication into a child.
    ///
    /// Returns `None` once the parent's copy has been closed.
    #[must_use]
    pub fn read_fd(&self) -> Option<RawFd> {
        self.read.as_ref().map(AsRawFd::as_raw_fd)
    }

    /// Releases the gate by closing the write end.
    ///
    /// Safe to call any number of times; only the first close signals.
    pub fn signal_ready(&mut self) {
        if let Some(fd) = self.write.take() {
            drop(fd);
            tracing::debug!("sync gate released");
        }
    }

    /// Closes the parent's copy of the read end.
    ///
    /// Called once the child holds its own duplicate, so that the pipe's
    /// lifetime follows the two processes that actually use it.
    pub fn close_read(&mut self) {
        drop(self.read.take());
    }

    /// Closes whichever ends are still open. Idempotent.
    pub fn close_all(&mut self) {
        drop(self.read.take());
        drop(self.write.take());
    }
}

/// Child-side view of the gate, recovered from an inherited descriptor.
#[derive(Debug, Clone, Copy)]
pub struct GateWaiter {
    fd: RawFd,
}

impl GateWaiter {
    /// Wraps the descriptor the parent placed at a fixed index.
    ///
    /// Ownership stays with the process; the waiter only reads.
    #[must_use]
    pub fn from_inherited_fd(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Blocks until the parent releases the gate.
    ///
    /// Returns immediately if the gate was already released. Stray bytes
    /// on the pipe are ignored; only end-of-file means released.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the descriptor fails.
    pub fn wait(&self) -> Result<()> {
        // SAFETY: the descriptor was pinned to a fixed index by the parent
        // at spawn time and stays open for the life of this process.
        let fd = unsafe { BorrowedFd::borrow_raw(self.fd) };
        let mut buf = [0u8; 1];
        loop {
            match read(fd, &mut buf) {
                Ok(0) => {
                    tracing::debug!("sync gate open, proceeding");
                    return Ok(());
                }
                Ok(_) => {}
                Err(Errno::EINTR) => {}
                Err(e) => {
                    return Err(CradleError::Sys {
                        op: "read sync gate",
                        source: e,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiter_blocks_until_signal() {
        let mut gate = SyncGate::new().unwrap();
        let waiter = GateWaiter::from_inherited_fd(gate.read_fd().unwrap());

        let handle = std::thread::spawn(move || waiter.wait());
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!handle.is_finished(), "waiter must block while armed");

        gate.signal_ready();
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn waiter_returns_immediately_when_released() {
        let mut gate = SyncGate::new().unwrap();
        let waiter = GateWaiter::from_inherited_fd(gate.read_fd().unwrap());
        gate.signal_ready();
        waiter.wait().unwrap();
    }

    #[test]
    fn signal_ready_is_idempotent() {
        let mut gate = SyncGate::new().unwrap();
        gate.signal_ready();
        gate.signal_ready();
        gate.signal_ready();
    }

    #[test]
    fn close_all_tolerates_closed_ends() {
        let mut gate = SyncGate::new().unwrap();
        gate.signal_ready();
        gate.close_all();
        gate.close_all();
        assert!(gate.read_fd().is_none());
    }

    #[test]
    fn read_fd_is_gone_after_close_read() {
        let mut gate = SyncGate::new().unwrap();
        assert!(gate.read_fd().is_some());
        gate.close_read();
        assert!(gate.read_fd().is_none());
    }
}
