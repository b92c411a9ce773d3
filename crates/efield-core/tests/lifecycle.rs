//! Integration tests for the full parameter lifecycle across ranks.
//!
//! - Legacy configuration → binding → broadcast over a thread group
//! - Non-coordinator local parameters are discarded
//! - Per-rank force accumulation and coordinator-only trace output
//! - Archive round trip and comparison through the extension trait

use std::io::Cursor;
use std::thread;

use approx::assert_relative_eq;
use ndarray::Array2;

use efield_compute::{Communicator, ThreadGroup};
use efield_core::cite::CitationRegistry;
use efield_core::codec::Precision;
use efield_core::compare::Tolerance;
use efield_core::config::ExtensionOptions;
use efield_core::extension::{OutputOptions, Stage};
use efield_core::legacy::LegacyEntries;
use efield_core::units::FIELD_CONVERSION;
use efield_core::{create_electric_field_module, Axis, ElectricField, FieldModel, FieldTerm, SimulationExtension};

// ─────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────

fn legacy_entries() -> LegacyEntries {
    [
        ("E-x", "1 0.5 0"),
        ("E-xt", "1 150.0 0"),
        ("E-z", "1 -0.25 0"),
        ("E-zt", "3 20.0 0 0.5 0 0.125 0"),
        ("dt", "0.002"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn configured_extension() -> Box<dyn SimulationExtension> {
    let mut ext = create_electric_field_module();
    let mut options = ExtensionOptions::default();
    ext.transform_legacy(&legacy_entries(), &mut options).unwrap();
    ext.bind_options(&options).unwrap();
    ext
}

fn model_of(ext: &dyn SimulationExtension) -> FieldModel {
    *ext.as_any()
        .downcast_ref::<ElectricField>()
        .expect("electric field extension")
        .model()
}

// ─────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────

#[test]
fn test_legacy_configuration_binds_expected_model() {
    let ext = configured_extension();
    let model = model_of(ext.as_ref());

    assert_eq!(*model.term(Axis::X), FieldTerm::new(0.5, 150.0, 0.0, 0.0));
    assert_eq!(*model.term(Axis::Y), FieldTerm::default());
    assert_eq!(*model.term(Axis::Z), FieldTerm::new(-0.25, 20.0, 0.5, 0.125));
    assert_eq!(ext.stage(), Stage::Configured);
    assert!(ext.is_force_provider());
    assert!(ext.excluded_from_virial());
}

#[test]
fn test_legacy_error_aborts_configuration() {
    let ext = create_electric_field_module();
    let mut entries = legacy_entries();
    entries.insert("E-yt".into(), "2 1.0 0 1.0 0".into());
    let mut options = ExtensionOptions::default();
    let err = ext.transform_legacy(&entries, &mut options).unwrap_err();
    assert!(err.to_string().contains("E-yt"));
}

// ─────────────────────────────────────────────────────────────
// Distribution and forces
// ─────────────────────────────────────────────────────────────

#[test]
fn test_broadcast_replaces_local_parameters_on_every_rank() {
    let reference = model_of(configured_extension().as_ref());

    let handles: Vec<_> = ThreadGroup::create(4)
        .into_iter()
        .map(|comm| {
            thread::spawn(move || {
                let mut ext: Box<dyn SimulationExtension> = if comm.is_coordinator() {
                    configured_extension()
                } else {
                    // Stale local parameters that must be discarded.
                    Box::new(ElectricField::with_model(FieldModel::new(
                        FieldTerm::constant(99.0),
                        FieldTerm::constant(comm.rank() as f64),
                        FieldTerm::default(),
                    )))
                };
                ext.broadcast(&comm).unwrap();
                assert_eq!(ext.stage(), Stage::Distributed);
                model_of(ext.as_ref())
            })
        })
        .collect();

    for handle in handles {
        let model = handle.join().unwrap();
        for (axis, term) in model.terms() {
            let expected = reference.term(axis);
            assert_eq!(term.amplitude().to_bits(), expected.amplitude().to_bits());
            assert_eq!(term.angular_frequency().to_bits(), expected.angular_frequency().to_bits());
            assert_eq!(term.pulse_center().to_bits(), expected.pulse_center().to_bits());
            assert_eq!(term.pulse_width().to_bits(), expected.pulse_width().to_bits());
        }
    }
}

#[test]
fn test_parallel_run_forces_and_trace() {
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("field.xvg");
    let steps = 5;
    let dt = 0.002;
    let charges = [0.4, -0.8, 1.0, -0.6];

    let handles: Vec<_> = ThreadGroup::create(2)
        .into_iter()
        .map(|comm| {
            let trace_path = trace_path.clone();
            thread::spawn(move || {
                let mut ext = if comm.is_coordinator() {
                    configured_extension()
                } else {
                    create_electric_field_module()
                };
                ext.broadcast(&comm).unwrap();

                let mut citations = CitationRegistry::new();
                let output = OutputOptions {
                    field_trace: Some(trace_path),
                    append: false,
                };
                ext.init_output(comm.is_coordinator(), &output, &mut citations).unwrap();

                // Two particles per rank.
                let local = &charges[2 * comm.rank()..2 * comm.rank() + 2];
                let mut forces = Array2::<f64>::zeros((2, 3));
                for step in 0..steps {
                    let t = step as f64 * dt;
                    ext.calculate_forces(comm.is_coordinator(), local, 2, forces.view_mut(), t);
                }
                ext.finish_output().unwrap();
                (comm.rank(), forces, citations.citations().len())
            })
        })
        .collect();

    let reference = model_of(configured_extension().as_ref());
    for handle in handles {
        let (rank, forces, cited) = handle.join().unwrap();
        assert_eq!(cited, if rank == 0 { 1 } else { 0 });
        for i in 0..2 {
            let q = charges[2 * rank + i];
            for axis in Axis::ALL {
                let expected: f64 = (0..steps)
                    .map(|step| q * FIELD_CONVERSION * reference.field(axis, step as f64 * dt))
                    .sum();
                assert_relative_eq!(forces[[i, axis.index()]], expected, max_relative = 1e-12);
            }
            assert_eq!(forces[[i, Axis::Y.index()]], 0.0);
        }
    }

    let text = std::fs::read_to_string(&trace_path).unwrap();
    let data: Vec<&str> = text.lines().filter(|l| !l.starts_with('@')).collect();
    assert_eq!(data.len(), steps);
    let columns: Vec<f64> = data[0]
        .split_whitespace()
        .map(|c| c.parse().unwrap())
        .collect();
    assert_eq!(&columns[..3], &[0.0, 0.5, 0.0]);
    // Six significant digits in the trace.
    assert_relative_eq!(columns[3], reference.field(Axis::Z, 0.0), max_relative = 1e-5);
}

// ─────────────────────────────────────────────────────────────
// Archive and comparison
// ─────────────────────────────────────────────────────────────

#[test]
fn test_archive_round_trip_through_extension() {
    let original = configured_extension();
    let mut buf = Vec::new();
    original.write_archive(&mut buf, Precision::Double).unwrap();

    let mut restored = create_electric_field_module();
    restored
        .read_archive(&mut Cursor::new(buf), Precision::Double)
        .unwrap();

    assert_eq!(model_of(restored.as_ref()), model_of(original.as_ref()));
    assert!(restored.compare(original.as_ref(), Tolerance::EXACT).unwrap().is_empty());
}

#[test]
fn test_compare_reports_changed_parameters() {
    let original = configured_extension();
    let mut changed = ElectricField::with_model(model_of(original.as_ref()));
    changed.set_field_term(Axis::Y, FieldTerm::new(0.1, 0.0, 0.0, 0.0));

    let mismatches = original.compare(&changed, Tolerance::default()).unwrap();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].axis, Axis::Y);
    assert_eq!(mismatches[0].right, 0.1);
}
