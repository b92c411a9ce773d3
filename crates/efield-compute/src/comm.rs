//! Communicator trait and errors.
//!
//! The [`Communicator`] trait covers the handful of collectives a simulation
//! extension needs during setup. Every collective is blocking: all ranks of
//! the group must enter it before any of them returns.

use thiserror::Error;

/// Rank that holds authoritative parameters and owns exclusive I/O.
pub const COORDINATOR_RANK: usize = 0;

/// Errors raised by a process group.
///
/// A failed collective is not recoverable; callers propagate it and abort
/// the run.
#[derive(Debug, Error)]
pub enum CommError {
    #[error("Broadcast length mismatch on rank {rank}: expected {expected} values, received {received}")]
    LengthMismatch {
        rank: usize,
        expected: usize,
        received: usize,
    },

    #[error("Process group is in an inconsistent state: {0}")]
    Poisoned(String),
}

/// A group of cooperating processes running the same simulation loop.
pub trait Communicator: Send + Sync {
    /// Rank of this process within the group.
    fn rank(&self) -> usize;

    /// Number of processes in the group.
    fn size(&self) -> usize;

    /// Whether this process is the coordinating process.
    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR_RANK
    }

    /// Replicate `buffer` from the coordinating process to every rank.
    ///
    /// On the coordinator the buffer is read; on every other rank it is
    /// overwritten with the coordinator's contents.
    fn broadcast(&self, buffer: &mut [f64]) -> Result<(), CommError>;

    /// Block until every rank has reached this point.
    fn barrier(&self) -> Result<(), CommError>;
}
