//! Lockstep runner: drives the registered extensions over a group of ranks.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use ndarray::{s, Array2};

use efield_compute::{Communicator, ThreadGroup};
use efield_core::cite::{Citation, CitationRegistry};
use efield_core::codec::Precision;
use efield_core::extension::OutputOptions;
use efield_core::{create_electric_field_module, ElectricField, SimulationExtension};

use crate::config::JobConfig;

/// Results from a lockstep run.
#[derive(Debug)]
pub struct RunOutput {
    /// Accumulated forces, one row per particle in input order.
    pub forces: Array2<f64>,
    /// Citations surfaced by the coordinator.
    pub citations: Vec<Citation>,
}

struct RankOutput {
    forces: Array2<f64>,
    citations: Vec<Citation>,
}

/// Every extension known to the driver.
pub fn registered_extensions() -> Vec<Box<dyn SimulationExtension>> {
    vec![create_electric_field_module()]
}

/// Split `n` particles into `ranks` contiguous blocks of near-equal size.
pub fn partition(n: usize, ranks: usize) -> Vec<Range<usize>> {
    let ranks = ranks.max(1);
    let base = n / ranks;
    let extra = n % ranks;
    let mut start = 0;
    (0..ranks)
        .map(|r| {
            let len = base + usize::from(r < extra);
            let block = start..start + len;
            start += len;
            block
        })
        .collect()
}

/// Run the job over `job.run.ranks` in-process ranks.
///
/// `field_trace` overrides the trace path from the configuration.
pub fn run_lockstep(job: &JobConfig, field_trace: Option<PathBuf>) -> Result<RunOutput> {
    let n = job.run.charges.len();
    if n == 0 {
        anyhow::bail!("No particles: set 'charges' in the [run] section");
    }

    // Bind on this thread first: a rank failing before the broadcast would
    // leave the others waiting forever.
    for mut ext in registered_extensions() {
        ext.bind_options(&job.extensions)
            .with_context(|| format!("Invalid '{}' parameters", ext.name()))?;
    }

    let output = OutputOptions {
        field_trace: field_trace.or_else(|| job.output.field.as_ref().map(PathBuf::from)),
        append: job.output.append,
    };
    let blocks = partition(n, job.run.ranks);
    println!("Ranks: {}, particles: {}, steps: {}", blocks.len(), n, job.run.steps);

    let results: Vec<Result<RankOutput>> = thread::scope(|scope| {
        let handles: Vec<_> = ThreadGroup::create(blocks.len())
            .into_iter()
            .zip(blocks.iter().cloned())
            .map(|(comm, block)| {
                let output = &output;
                scope.spawn(move || run_rank(&comm, job, output, block))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().map_err(|_| anyhow!("rank thread panicked"))?)
            .collect()
    });

    let mut forces = Array2::<f64>::zeros((n, 3));
    let mut citations = Vec::new();
    for (result, block) in results.into_iter().zip(blocks) {
        let rank = result?;
        forces.slice_mut(s![block, ..]).assign(&rank.forces);
        citations.extend(rank.citations);
    }
    Ok(RunOutput { forces, citations })
}

fn run_rank(comm: &ThreadGroup, job: &JobConfig, output: &OutputOptions, block: Range<usize>) -> Result<RankOutput> {
    let coordinator = comm.is_coordinator();
    let mut extensions = registered_extensions();

    for ext in extensions.iter_mut() {
        if coordinator {
            ext.bind_options(&job.extensions)?;
        }
        ext.broadcast(comm)?;
    }

    let mut citations = CitationRegistry::new();
    for ext in extensions.iter_mut() {
        ext.init_output(coordinator, output, &mut citations)?;
    }

    let charges = &job.run.charges[block];
    let local_count = charges.len();
    let mut forces = Array2::<f64>::zeros((local_count, 3));
    for step in 0..job.run.steps {
        let t = job.run.start_time + step as f64 * job.run.dt;
        for ext in extensions.iter_mut().filter(|e| e.is_force_provider()) {
            ext.calculate_forces(coordinator, charges, local_count, forces.view_mut(), t);
        }
    }

    for ext in extensions.iter_mut() {
        ext.finish_output()?;
    }
    log::debug!("rank {} finished {} steps", comm.rank(), job.run.steps);

    Ok(RankOutput {
        forces,
        citations: citations.citations().to_vec(),
    })
}

/// Bind a job's field parameters without running it.
pub fn configure_field(job: &JobConfig) -> Result<ElectricField> {
    let mut field = ElectricField::new();
    field
        .bind_options(&job.extensions)
        .context("Invalid electric field parameters")?;
    Ok(field)
}

/// Read the field record stored in `path`.
pub fn read_archive(path: &Path, precision: Precision) -> Result<ElectricField> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut field = ElectricField::new();
    field
        .read_archive(&mut BufReader::new(file), precision)
        .with_context(|| format!("Failed to read field record from {}", path.display()))?;
    Ok(field)
}

/// Write the field record of `field` to `path`.
pub fn write_archive(field: &ElectricField, path: &Path, precision: Precision) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    field.write_archive(&mut out, precision)?;
    out.flush()?;
    println!("Field record written to: {}", path.display());
    Ok(())
}

/// Write accumulated forces to a CSV file with a metadata header.
pub fn write_forces_csv(forces: &Array2<f64>, job: &JobConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "# efield: accumulated applied-field forces")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(
        file,
        "# steps: {}, dt: {} ps, ranks: {}",
        job.run.steps, job.run.dt, job.run.ranks
    )?;
    writeln!(file, "#")?;
    writeln!(file, "particle,charge_e,fx,fy,fz")?;
    for (i, (row, q)) in forces.rows().into_iter().zip(&job.run.charges).enumerate() {
        writeln!(file, "{},{},{:.6e},{:.6e},{:.6e}", i, q, row[0], row[1], row[2])?;
    }
    file.flush()?;

    println!("Forces written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use efield_core::config::AxisSection;
    use efield_core::units::FIELD_CONVERSION;

    fn job(ranks: usize) -> JobConfig {
        let mut job = JobConfig::default();
        job.extensions.electric_field.x = AxisSection { e0: 0.5, omega: 0.0, t0: 0.0, sigma: 0.0 };
        job.extensions.electric_field.z = AxisSection { e0: -0.2, omega: 30.0, t0: 0.01, sigma: 0.005 };
        job.run.steps = 4;
        job.run.ranks = ranks;
        job.run.charges = vec![0.5, -1.0, 0.25, 0.8, -0.3];
        job
    }

    #[test]
    fn test_partition_covers_all_particles() {
        assert_eq!(partition(5, 2), vec![0..3, 3..5]);
        assert_eq!(partition(2, 3), vec![0..1, 1..2, 2..2]);
        assert_eq!(partition(4, 0), vec![0..4]);
    }

    #[test]
    fn test_static_field_forces() {
        let out = run_lockstep(&job(1), None).unwrap();
        // Four steps of a static 0.5 V/nm field along X.
        let expected = 4.0 * 0.5 * FIELD_CONVERSION * 0.5;
        approx::assert_relative_eq!(out.forces[[0, 0]], expected, max_relative = 1e-12);
        assert_eq!(out.forces[[0, 1]], 0.0);
        assert_eq!(out.citations.len(), 1);
    }

    #[test]
    fn test_rank_count_does_not_change_forces() {
        let serial = run_lockstep(&job(1), None).unwrap();
        let parallel = run_lockstep(&job(3), None).unwrap();
        assert_eq!(serial.forces, parallel.forces);
        assert_eq!(parallel.citations.len(), 1);
    }

    #[test]
    fn test_invalid_parameters_fail_before_spawning() {
        let mut job = job(2);
        job.extensions.electric_field.y.sigma = -1.0;
        let err = run_lockstep(&job, None).unwrap_err();
        assert!(format!("{:#}", err).contains("pulse width"));
    }

    #[test]
    fn test_archive_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("field.bin");
        let field = configure_field(&job(1)).unwrap();
        write_archive(&field, &path, Precision::Double).unwrap();
        let back = read_archive(&path, Precision::Double).unwrap();
        assert_eq!(back.model(), field.model());
    }

    #[test]
    fn test_default_precision_archive_keeps_exact_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.bin");
        let mut job = job(1);
        job.extensions.electric_field.y = AxisSection { e0: 0.1, omega: 2.0 / 3.0, t0: 0.0, sigma: 0.0 };
        let field = configure_field(&job).unwrap();
        write_archive(&field, &path, Precision::default()).unwrap();
        let back = read_archive(&path, Precision::default()).unwrap();
        assert_eq!(back.model(), field.model());
    }

    #[test]
    fn test_forces_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forces.csv");
        let job = job(2);
        let out = run_lockstep(&job, None).unwrap();
        write_forces_csv(&out.forces, &job, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(rows[0], "particle,charge_e,fx,fy,fz");
        assert_eq!(rows.len(), 1 + job.run.charges.len());
    }
}
