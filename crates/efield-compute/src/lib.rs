//! # efield-compute
//!
//! Process-group abstraction for lockstep parallel runs. Simulation
//! extensions talk to their cooperating processes only through the
//! [`Communicator`](comm::Communicator) trait, so the physics code never
//! sees how ranks are actually connected.
//!
//! ## Available groups
//!
//! | Group | Feature flag | Use |
//! |-------|-------------|-----|
//! | [`SingleProcess`] | always | Serial runs, offline tools |
//! | [`ThreadGroup`] | `threads` (default) | In-process ranks on OS threads |

pub mod comm;
pub mod local;

#[cfg(feature = "threads")]
pub mod threaded;

pub use comm::{CommError, Communicator, COORDINATOR_RANK};
pub use local::SingleProcess;

#[cfg(feature = "threads")]
pub use threaded::ThreadGroup;
