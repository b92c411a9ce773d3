//! The applied electric field as a simulation extension.

use std::any::Any;
use std::io::{self, Read, Write};

use efield_compute::{CommError, Communicator};
use ndarray::ArrayViewMut2;

use crate::cite::{CitationRegistry, CALEMAN_2008};
use crate::codec::{read_field_record, write_field_record, ArchiveError, Precision};
use crate::compare::{compare_models, Mismatch, Tolerance};
use crate::config::{ExtensionOptions, SECTION_NAME};
use crate::distribute::broadcast_model;
use crate::extension::{IncompatibleExtension, OutputOptions, SimulationExtension, Stage};
use crate::force::add_field_forces;
use crate::format::format_g;
use crate::legacy::{apply_entries, InputError, LegacyEntries};
use crate::trace::{TraceError, TraceWriter};
use crate::types::{Axis, FieldModel, FieldTerm};
use crate::units::FIELD_CONVERSION;

/// A time-dependent electric field applied along X, Y and Z.
///
/// The field adds $q_i E_m(t)$ to the force on every local particle. On
/// the coordinating rank it can also record the field at each step.
#[derive(Debug)]
pub struct ElectricField {
    model: FieldModel,
    conversion: f64,
    trace: Option<TraceWriter>,
    stage: Stage,
}

impl ElectricField {
    pub fn new() -> Self {
        Self {
            model: FieldModel::default(),
            conversion: FIELD_CONVERSION,
            trace: None,
            stage: Stage::Unconfigured,
        }
    }

    /// An extension already configured with `model`.
    pub fn with_model(model: FieldModel) -> Self {
        Self {
            model,
            stage: Stage::Configured,
            ..Self::new()
        }
    }

    /// Use a different field-to-force conversion factor, for unit systems
    /// other than nm/ps/kJ mol⁻¹.
    pub fn with_conversion_factor(mut self, conversion: f64) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn model(&self) -> &FieldModel {
        &self.model
    }

    pub fn conversion_factor(&self) -> f64 {
        self.conversion
    }

    pub fn set_field_term(&mut self, axis: Axis, term: FieldTerm) {
        self.model.set_term(axis, term);
        self.stage = Stage::Configured;
    }

    pub fn is_active(&self) -> bool {
        self.model.is_active()
    }

    /// Field strength (V/nm) along `axis` at time `t`.
    pub fn field(&self, axis: Axis, t: f64) -> f64 {
        self.model.field(axis, t)
    }

    pub fn has_trace(&self) -> bool {
        self.trace.is_some()
    }
}

impl Default for ElectricField {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationExtension for ElectricField {
    fn name(&self) -> &'static str {
        SECTION_NAME
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn transform_legacy(
        &self,
        entries: &LegacyEntries,
        options: &mut ExtensionOptions,
    ) -> Result<(), InputError> {
        apply_entries(entries, &mut options.electric_field)
    }

    fn bind_options(&mut self, options: &ExtensionOptions) -> Result<(), InputError> {
        self.model = options.electric_field.to_model()?;
        self.stage = Stage::Configured;
        Ok(())
    }

    fn read_archive(&mut self, reader: &mut dyn Read, precision: Precision) -> Result<(), ArchiveError> {
        self.model = read_field_record(reader, precision)?;
        self.stage = Stage::Configured;
        Ok(())
    }

    fn write_archive(&self, writer: &mut dyn Write, precision: Precision) -> Result<(), ArchiveError> {
        write_field_record(writer, &self.model, precision)
    }

    fn broadcast(&mut self, comm: &dyn Communicator) -> Result<(), CommError> {
        broadcast_model(&mut self.model, comm)?;
        self.stage = Stage::Distributed;
        Ok(())
    }

    fn compare(
        &self,
        other: &dyn SimulationExtension,
        tolerance: Tolerance,
    ) -> Result<Vec<Mismatch>, IncompatibleExtension> {
        let other = other
            .as_any()
            .downcast_ref::<ElectricField>()
            .ok_or(IncompatibleExtension {
                left: self.name(),
                right: other.name(),
            })?;
        Ok(compare_models(&self.model, &other.model, tolerance))
    }

    fn print_parameters(&self, out: &mut dyn Write, indent: usize) -> io::Result<()> {
        writeln!(out, "{:indent$}ElectricField:", "", indent = indent)?;
        let indent = indent + 3;
        for (axis, term) in self.model.terms() {
            writeln!(
                out,
                "{:indent$}-{} E0 = {} omega = {} t0 = {} sigma = {}",
                "",
                axis.label(),
                format_g(term.amplitude()),
                format_g(term.angular_frequency()),
                format_g(term.pulse_center()),
                format_g(term.pulse_width()),
                indent = indent
            )?;
        }
        Ok(())
    }

    fn init_output(
        &mut self,
        is_coordinator: bool,
        options: &OutputOptions,
        citations: &mut CitationRegistry,
    ) -> Result<(), TraceError> {
        if !self.is_active() || !is_coordinator {
            return Ok(());
        }
        citations.cite(&CALEMAN_2008);
        if let Some(path) = &options.field_trace {
            self.trace = Some(TraceWriter::open(path, options.append)?);
        }
        Ok(())
    }

    fn finish_output(&mut self) -> Result<(), TraceError> {
        self.stage = Stage::Closed;
        match self.trace.take() {
            Some(trace) => trace.close(),
            None => Ok(()),
        }
    }

    fn is_force_provider(&self) -> bool {
        self.is_active()
    }

    fn excluded_from_virial(&self) -> bool {
        true
    }

    fn calculate_forces(
        &mut self,
        is_coordinator: bool,
        charges: &[f64],
        local_count: usize,
        forces: ArrayViewMut2<'_, f64>,
        t: f64,
    ) {
        if self.stage < Stage::Distributed {
            log::warn!(
                "Field forces requested at t = {} before parameters were distributed; skipping",
                t
            );
            return;
        }
        if !self.is_active() {
            return;
        }
        if self.stage == Stage::Distributed {
            self.stage = Stage::Active;
        }

        add_field_forces(&self.model, charges, local_count, t, self.conversion, forces);

        if !is_coordinator {
            return;
        }
        let failed = match self.trace.as_mut() {
            Some(trace) => trace.record(t, self.model.fields_at(t)).err(),
            None => None,
        };
        if let Some(e) = failed {
            log::error!("Field trace write failed at t = {}: {}; disabling trace", t, e);
            self.trace = None;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Create the field extension with no field applied.
pub fn create_electric_field_module() -> Box<dyn SimulationExtension> {
    Box::new(ElectricField::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use efield_compute::SingleProcess;
    use ndarray::Array2;

    fn configured() -> ElectricField {
        ElectricField::with_model(FieldModel::new(
            FieldTerm::constant(0.5),
            FieldTerm::new(-1.0, 150.0, 0.0, 0.0),
            FieldTerm::new(0.25, 3.0, 1.0, 0.5),
        ))
    }

    #[test]
    fn test_print_parameters() {
        let mut out = Vec::new();
        configured().print_parameters(&mut out, 2).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "  ElectricField:\n\
             \x20    -X E0 = 0.5 omega = 0 t0 = 0 sigma = 0\n\
             \x20    -Y E0 = -1 omega = 150 t0 = 0 sigma = 0\n\
             \x20    -Z E0 = 0.25 omega = 3 t0 = 1 sigma = 0.5\n"
        );
    }

    #[test]
    fn test_compare_rejects_other_extensions() {
        struct Other;
        impl SimulationExtension for Other {
            fn name(&self) -> &'static str {
                "other"
            }
            fn stage(&self) -> Stage {
                Stage::Unconfigured
            }
            fn transform_legacy(&self, _: &LegacyEntries, _: &mut ExtensionOptions) -> Result<(), InputError> {
                Ok(())
            }
            fn bind_options(&mut self, _: &ExtensionOptions) -> Result<(), InputError> {
                Ok(())
            }
            fn read_archive(&mut self, _: &mut dyn Read, _: Precision) -> Result<(), ArchiveError> {
                Ok(())
            }
            fn write_archive(&self, _: &mut dyn Write, _: Precision) -> Result<(), ArchiveError> {
                Ok(())
            }
            fn broadcast(&mut self, _: &dyn Communicator) -> Result<(), CommError> {
                Ok(())
            }
            fn compare(&self, _: &dyn SimulationExtension, _: Tolerance) -> Result<Vec<Mismatch>, IncompatibleExtension> {
                Ok(Vec::new())
            }
            fn print_parameters(&self, _: &mut dyn Write, _: usize) -> io::Result<()> {
                Ok(())
            }
            fn init_output(&mut self, _: bool, _: &OutputOptions, _: &mut CitationRegistry) -> Result<(), TraceError> {
                Ok(())
            }
            fn finish_output(&mut self) -> Result<(), TraceError> {
                Ok(())
            }
            fn is_force_provider(&self) -> bool {
                false
            }
            fn calculate_forces(&mut self, _: bool, _: &[f64], _: usize, _: ArrayViewMut2<'_, f64>, _: f64) {}
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let err = configured().compare(&Other, Tolerance::EXACT).unwrap_err();
        assert_eq!(err.left, "electric-field");
        assert_eq!(err.right, "other");
    }

    #[test]
    fn test_inactive_field_surfaces_nothing() {
        let mut field = ElectricField::new();
        let mut citations = CitationRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let options = OutputOptions {
            field_trace: Some(dir.path().join("field.xvg")),
            append: false,
        };
        field.init_output(true, &options, &mut citations).unwrap();
        assert!(citations.citations().is_empty());
        assert!(!field.has_trace());
        assert!(!field.is_force_provider());
        assert!(!dir.path().join("field.xvg").exists());
    }

    #[test]
    fn test_non_coordinator_never_opens_trace() {
        let mut field = configured();
        let mut citations = CitationRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let options = OutputOptions {
            field_trace: Some(dir.path().join("field.xvg")),
            append: false,
        };
        field.init_output(false, &options, &mut citations).unwrap();
        assert!(!field.has_trace());
        assert!(citations.citations().is_empty());
    }

    #[test]
    fn test_lifecycle_stages() {
        let mut field = configured();
        assert_eq!(field.stage(), Stage::Configured);

        field.broadcast(&SingleProcess::new()).unwrap();
        assert_eq!(field.stage(), Stage::Distributed);

        let mut forces = Array2::<f64>::zeros((1, 3));
        field.calculate_forces(true, &[1.0], 1, forces.view_mut(), 0.0);
        assert_eq!(field.stage(), Stage::Active);
        assert!(forces[[0, 0]] > 0.0);

        field.finish_output().unwrap();
        assert_eq!(field.stage(), Stage::Closed);
    }

    #[test]
    fn test_forces_before_broadcast_are_skipped() {
        let mut field = configured();
        let mut forces = Array2::<f64>::zeros((1, 3));
        field.calculate_forces(true, &[1.0], 1, forces.view_mut(), 0.0);
        assert!(forces.iter().all(|&f| f == 0.0));
        assert_eq!(field.stage(), Stage::Configured);

        field.broadcast(&SingleProcess::new()).unwrap();
        field.calculate_forces(true, &[1.0], 1, forces.view_mut(), 0.0);
        assert!(forces[[0, 0]] > 0.0);
    }

    #[test]
    fn test_custom_conversion_factor() {
        let mut field = ElectricField::with_model(FieldModel::new(
            FieldTerm::constant(2.0),
            FieldTerm::default(),
            FieldTerm::default(),
        ))
        .with_conversion_factor(1.0);
        field.broadcast(&SingleProcess::new()).unwrap();

        let mut forces = Array2::<f64>::zeros((2, 3));
        field.calculate_forces(false, &[0.5, -1.5], 2, forces.view_mut(), 0.0);
        assert_eq!(forces.column(0).to_vec(), vec![1.0, -3.0]);
    }
}
