//! In-process process group backed by OS threads.
//!
//! Each rank holds a [`ThreadGroup`] handle and runs on its own thread.
//! Collectives rendezvous on a shared [`Barrier`]; broadcast payloads pass
//! through a mutex-guarded slot written only by the coordinator.

use std::sync::{Arc, Barrier, Mutex};

use crate::comm::{CommError, Communicator, COORDINATOR_RANK};

struct Shared {
    size: usize,
    barrier: Barrier,
    slot: Mutex<Vec<f64>>,
}

/// Handle for one rank of an in-process group.
#[derive(Clone)]
pub struct ThreadGroup {
    shared: Arc<Shared>,
    rank: usize,
}

impl ThreadGroup {
    /// Create a group of `size` ranks and return one handle per rank,
    /// ordered by rank.
    pub fn create(size: usize) -> Vec<ThreadGroup> {
        let size = size.max(1);
        let shared = Arc::new(Shared {
            size,
            barrier: Barrier::new(size),
            slot: Mutex::new(Vec::new()),
        });
        (0..size)
            .map(|rank| ThreadGroup {
                shared: Arc::clone(&shared),
                rank,
            })
            .collect()
    }
}

impl std::fmt::Debug for ThreadGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadGroup")
            .field("rank", &self.rank)
            .field("size", &self.shared.size)
            .finish()
    }
}

impl Communicator for ThreadGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn broadcast(&self, buffer: &mut [f64]) -> Result<(), CommError> {
        // Every rank must reach both barriers, even on failure, or the
        // remaining ranks would wait forever.
        let staged = if self.rank == COORDINATOR_RANK {
            match self.shared.slot.lock() {
                Ok(mut slot) => {
                    slot.clear();
                    slot.extend_from_slice(buffer);
                    Ok(())
                }
                Err(e) => Err(CommError::Poisoned(e.to_string())),
            }
        } else {
            Ok(())
        };
        self.shared.barrier.wait();

        let result = if self.rank == COORDINATOR_RANK {
            staged
        } else {
            match self.shared.slot.lock() {
                Ok(slot) if slot.len() == buffer.len() => {
                    buffer.copy_from_slice(&slot);
                    Ok(())
                }
                Ok(slot) => Err(CommError::LengthMismatch {
                    rank: self.rank,
                    expected: buffer.len(),
                    received: slot.len(),
                }),
                Err(e) => Err(CommError::Poisoned(e.to_string())),
            }
        };
        self.shared.barrier.wait();

        log::debug!("rank {}: broadcast of {} values complete", self.rank, buffer.len());
        result
    }

    fn barrier(&self) -> Result<(), CommError> {
        self.shared.barrier.wait();
        Ok(())
    }
}
