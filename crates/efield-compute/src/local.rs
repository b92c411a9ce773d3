//! Trivial group of one process.

use crate::comm::{CommError, Communicator, COORDINATOR_RANK};

/// A group containing only the calling process, which is the coordinator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl SingleProcess {
    pub fn new() -> Self {
        Self
    }
}

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        COORDINATOR_RANK
    }

    fn size(&self) -> usize {
        1
    }

    fn broadcast(&self, _buffer: &mut [f64]) -> Result<(), CommError> {
        Ok(())
    }

    fn barrier(&self) -> Result<(), CommError> {
        Ok(())
    }
}
