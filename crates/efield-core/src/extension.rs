//! The extension capability trait.
//!
//! A simulation driver carries any number of optional features (applied
//! fields, pulling, walls, ...) as `Box<dyn SimulationExtension>` and drives
//! them through the same sequence of calls without knowing their types:
//!
//! 1. [`transform_legacy`](SimulationExtension::transform_legacy) and
//!    [`bind_options`](SimulationExtension::bind_options), or
//!    [`read_archive`](SimulationExtension::read_archive), on the coordinator.
//! 2. [`broadcast`](SimulationExtension::broadcast) on every rank.
//! 3. [`init_output`](SimulationExtension::init_output).
//! 4. [`calculate_forces`](SimulationExtension::calculate_forces) once per
//!    step, for extensions that report themselves as force providers.
//! 5. [`finish_output`](SimulationExtension::finish_output).

use std::any::Any;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use efield_compute::{CommError, Communicator};
use ndarray::ArrayViewMut2;
use thiserror::Error;

use crate::cite::CitationRegistry;
use crate::codec::{ArchiveError, Precision};
use crate::compare::{Mismatch, Tolerance};
use crate::config::ExtensionOptions;
use crate::legacy::{InputError, LegacyEntries};
use crate::trace::TraceError;

/// Lifecycle of an extension's parameters over a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Unconfigured,
    Configured,
    Distributed,
    Active,
    Closed,
}

/// Output requested by the driver.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// Path of the optional field trace.
    pub field_trace: Option<PathBuf>,
    /// Continue an existing trace instead of starting a new one.
    pub append: bool,
}

/// Two extensions of different kinds were compared.
#[derive(Debug, Error)]
#[error("Cannot compare extension '{left}' with '{right}'")]
pub struct IncompatibleExtension {
    pub left: &'static str,
    pub right: &'static str,
}

/// An optional simulation feature.
pub trait SimulationExtension: Send {
    /// Configuration section name of the extension.
    fn name(&self) -> &'static str;

    fn stage(&self) -> Stage;

    /// Convert the extension's legacy entries into structured options.
    fn transform_legacy(
        &self,
        entries: &LegacyEntries,
        options: &mut ExtensionOptions,
    ) -> Result<(), InputError>;

    /// Take parameters from the structured options.
    fn bind_options(&mut self, options: &ExtensionOptions) -> Result<(), InputError>;

    /// Replace the parameters with the extension's archive record.
    fn read_archive(&mut self, reader: &mut dyn Read, precision: Precision) -> Result<(), ArchiveError>;

    fn write_archive(&self, writer: &mut dyn Write, precision: Precision) -> Result<(), ArchiveError>;

    /// Replicate the coordinator's parameters to every rank.
    fn broadcast(&mut self, comm: &dyn Communicator) -> Result<(), CommError>;

    fn compare(
        &self,
        other: &dyn SimulationExtension,
        tolerance: Tolerance,
    ) -> Result<Vec<Mismatch>, IncompatibleExtension>;

    /// Write a human-readable parameter listing.
    fn print_parameters(&self, out: &mut dyn Write, indent: usize) -> io::Result<()>;

    /// Surface citations and open output streams. Only the coordinator
    /// performs I/O.
    fn init_output(
        &mut self,
        is_coordinator: bool,
        options: &OutputOptions,
        citations: &mut CitationRegistry,
    ) -> Result<(), TraceError>;

    /// Close output streams opened by [`init_output`](Self::init_output).
    fn finish_output(&mut self) -> Result<(), TraceError>;

    /// Whether the driver should call [`calculate_forces`](Self::calculate_forces).
    fn is_force_provider(&self) -> bool;

    /// Whether the forces must be left out of the virial sum.
    fn excluded_from_virial(&self) -> bool {
        false
    }

    /// Add this step's forces for the `local_count` particles of this rank.
    fn calculate_forces(
        &mut self,
        is_coordinator: bool,
        charges: &[f64],
        local_count: usize,
        forces: ArrayViewMut2<'_, f64>,
        t: f64,
    );

    fn as_any(&self) -> &dyn Any;
}
