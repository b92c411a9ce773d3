//! Job configuration: structured TOML or legacy `key = value` files.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use efield_core::config::ExtensionOptions;
use efield_core::legacy::{normalize_key, LegacyEntries};

use crate::runner::registered_extensions;

/// Top-level job configuration.
#[derive(Debug, Default, Deserialize)]
pub struct JobConfig {
    /// Structured sections for every extension (`[electric-field.x]`, ...).
    #[serde(flatten)]
    pub extensions: ExtensionOptions,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Lockstep run parameters.
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Timestep (ps).
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Time of the first step (ps).
    #[serde(default)]
    pub start_time: f64,
    /// Number of cooperating ranks.
    #[serde(default = "default_ranks")]
    pub ranks: usize,
    /// Particle charges (e), split into contiguous blocks across ranks.
    #[serde(default)]
    pub charges: Vec<f64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            dt: default_dt(),
            start_time: 0.0,
            ranks: default_ranks(),
            charges: Vec::new(),
        }
    }
}

fn default_steps() -> usize {
    10
}
fn default_dt() -> f64 {
    0.002
}
fn default_ranks() -> usize {
    1
}

/// Output configuration.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Field trace path (written by the coordinator only).
    #[serde(default)]
    pub field: Option<String>,
    /// Append to an existing field trace instead of replacing it.
    #[serde(default)]
    pub append: bool,
    /// CSV file for the accumulated forces.
    #[serde(default)]
    pub forces: Option<String>,
}

/// Whether `path` names a legacy parameter file.
pub fn is_legacy(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "mdp")
}

/// Load a job from TOML, or from a legacy file if the extension is `.mdp`.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if is_legacy(path) {
        let entries = parse_legacy(&content)?;
        job_from_legacy(&entries)
    } else {
        let config: JobConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }
}

/// Split a legacy file into `key = value` entries. `;` starts a comment.
pub fn parse_legacy(content: &str) -> Result<LegacyEntries> {
    let mut entries = LegacyEntries::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.split(';').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .with_context(|| format!("line {}: expected 'key = value', got '{}'", idx + 1, line))?;
        entries.insert(normalize_key(key), value.trim().to_string());
    }
    Ok(entries)
}

/// Build a job from legacy entries: field keys go through each extension's
/// transform, `nsteps`, `dt` and `tinit` fill the run section.
pub fn job_from_legacy(entries: &LegacyEntries) -> Result<JobConfig> {
    let mut job = JobConfig::default();
    for ext in registered_extensions() {
        ext.transform_legacy(entries, &mut job.extensions)
            .with_context(|| format!("Invalid '{}' parameters", ext.name()))?;
    }
    if let Some(v) = entries.get("nsteps") {
        job.run.steps = v.parse().with_context(|| format!("nsteps: invalid value '{}'", v))?;
    }
    if let Some(v) = entries.get("dt") {
        job.run.dt = v.parse().with_context(|| format!("dt: invalid value '{}'", v))?;
    }
    if let Some(v) = entries.get("tinit") {
        job.run.start_time = v.parse().with_context(|| format!("tinit: invalid value '{}'", v))?;
    }
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legacy_strips_comments() {
        let entries = parse_legacy(
            "; applied field\n\
             E_x = 1 0.5 0   ; V/nm\n\
             \n\
             E-xt = 1 150 0\n",
        )
        .unwrap();
        assert_eq!(entries.get("E-x").map(String::as_str), Some("1 0.5 0"));
        assert_eq!(entries.get("E-xt").map(String::as_str), Some("1 150 0"));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_parse_legacy_rejects_lines_without_value() {
        let err = parse_legacy("E-x 1 0.5 0\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_job_from_legacy() {
        let entries = parse_legacy("nsteps = 50\ndt = 0.001\nE-z = 1 -0.3 0\nE-zt = 3 10 0 0.05 0 0.01 0\n").unwrap();
        let job = job_from_legacy(&entries).unwrap();
        assert_eq!(job.run.steps, 50);
        assert_eq!(job.run.dt, 0.001);
        let z = job.extensions.electric_field.z;
        assert_eq!((z.e0, z.omega, z.t0, z.sigma), (-0.3, 10.0, 0.05, 0.01));
    }

    #[test]
    fn test_job_from_legacy_reports_field_errors() {
        let entries = parse_legacy("E-y = 2 1.0 0 1.0 0\n").unwrap();
        let err = job_from_legacy(&entries).unwrap_err();
        assert!(format!("{:#}", err).contains("only one electric field term"));
    }

    #[test]
    fn test_load_toml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.toml");
        std::fs::write(
            &path,
            r#"
            [electric-field.x]
            E0 = 0.5

            [run]
            steps = 3
            ranks = 2
            charges = [1.0, -1.0]

            [output]
            field = "field.xvg"
            "#,
        )
        .unwrap();

        let job = load_config(&path).unwrap();
        assert_eq!(job.extensions.electric_field.x.e0, 0.5);
        assert_eq!(job.run.steps, 3);
        assert_eq!(job.run.dt, 0.002);
        assert_eq!(job.run.charges, vec![1.0, -1.0]);
        assert_eq!(job.output.field.as_deref(), Some("field.xvg"));
        assert!(!job.output.append);
    }
}
