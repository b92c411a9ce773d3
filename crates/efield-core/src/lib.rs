//! # efield-core
//!
//! A time-dependent external electric field applied as a per-particle force
//! inside a lockstep parallel simulation loop.
//!
//! ## Architecture
//!
//! The field is one [`extension::SimulationExtension`] among the features a
//! simulation driver may carry. The driver holds extensions as trait objects
//! and walks them through a fixed lifecycle:
//!
//! ```text
//! Unconfigured -> Configured -> Distributed -> Active -> Closed
//!   (legacy transform + binding,  (broadcast)  (forces)  (trace closed)
//!    or archive read)
//! ```
//!
//! ## Modules
//!
//! - [`types`]: Axes, field terms and the three-axis field model.
//! - [`units`]: Physical constants and the field-to-force conversion.
//! - [`legacy`]: The `E-x` / `E-xt` legacy configuration grammars.
//! - [`config`]: Structured `electric-field` sections and option binding.
//! - [`codec`]: Fixed-layout archive record (de)serialisation.
//! - [`distribute`]: One-shot broadcast of the authoritative model.
//! - [`force`]: Per-timestep force accumulation.
//! - [`trace`]: Optional field trace output.
//! - [`compare`]: Tolerance-based model comparison.
//! - [`cite`]: Attribution surfaced once at startup.
//! - [`extension`]: The extension capability trait.
//! - [`electric_field`]: The extension implementation tying it together.

pub mod cite;
pub mod codec;
pub mod compare;
pub mod config;
pub mod distribute;
pub mod electric_field;
pub mod extension;
pub mod force;
pub mod format;
pub mod legacy;
pub mod trace;
pub mod types;
pub mod units;

mod xdr;

pub use electric_field::{create_electric_field_module, ElectricField};
pub use extension::SimulationExtension;
pub use types::{Axis, FieldModel, FieldTerm, Parameter};
