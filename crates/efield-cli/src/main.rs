//! Applied electric field command-line interface.
//!
//! ```sh
//! efield-cli convert grompp.mdp -o field.toml
//! efield-cli write job.toml -o field.bin
//! efield-cli dump field.bin --json
//! efield-cli compare a.bin b.bin --reltol 1e-6
//! efield-cli run job.toml --field field.xvg --ranks 4
//! ```

mod config;
mod runner;

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use efield_core::codec::Precision;
use efield_core::compare::Tolerance;
use efield_core::config::{ElectricFieldSection, ExtensionOptions};
use efield_core::SimulationExtension;

#[derive(Parser)]
#[command(name = "efield-cli")]
#[command(about = "Applied electric field: configuration, archives and lockstep runs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a legacy parameter file into structured TOML sections.
    Convert {
        /// Legacy `key = value` file.
        input: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the field record of a configuration to a binary archive.
    Write {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Archive to create.
        #[arg(short, long)]
        output: PathBuf,
        /// Store reals in single precision (lossy, for mixed-precision readers).
        #[arg(long)]
        single: bool,
    },
    /// Print the field parameters stored in an archive.
    Dump {
        archive: PathBuf,
        /// Archive stores single-precision reals.
        #[arg(long)]
        single: bool,
        /// Print as JSON instead of a parameter listing.
        #[arg(long)]
        json: bool,
    },
    /// Compare the field parameters of two archives.
    Compare {
        left: PathBuf,
        right: PathBuf,
        /// Archive stores single-precision reals.
        #[arg(long)]
        single: bool,
        /// Relative tolerance.
        #[arg(long, default_value_t = 1e-6)]
        reltol: f64,
        /// Absolute tolerance.
        #[arg(long, default_value_t = 1e-8)]
        abstol: f64,
    },
    /// Apply the field to the configured charges over a number of steps.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Field trace file (overrides config file setting).
        #[arg(long)]
        field: Option<PathBuf>,
        /// Number of ranks (overrides config file setting).
        #[arg(long)]
        ranks: Option<usize>,
        /// Forces CSV (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running it.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
}

fn precision(single: bool) -> Precision {
    if single {
        Precision::Single
    } else {
        Precision::Double
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert { input, output } => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let job = config::job_from_legacy(&config::parse_legacy(&content)?)?;
            let text = toml::to_string_pretty(&job.extensions)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    println!("Converted {} -> {}", input.display(), path.display());
                }
                None => print!("{}", text),
            }
            Ok(())
        }
        Commands::Write { config, output, single } => {
            let job = config::load_config(&config)?;
            let field = runner::configure_field(&job)?;
            runner::write_archive(&field, &output, precision(single))
        }
        Commands::Dump { archive, single, json } => {
            let field = runner::read_archive(&archive, precision(single))?;
            if json {
                let options = ExtensionOptions {
                    electric_field: ElectricFieldSection::from(field.model()),
                };
                println!("{}", serde_json::to_string_pretty(&options)?);
            } else {
                field.print_parameters(&mut io::stdout().lock(), 0)?;
            }
            Ok(())
        }
        Commands::Compare {
            left,
            right,
            single,
            reltol,
            abstol,
        } => {
            let a = runner::read_archive(&left, precision(single))?;
            let b = runner::read_archive(&right, precision(single))?;
            let mismatches = a.compare(&b, Tolerance::new(reltol, abstol))?;
            for m in &mismatches {
                println!("{}", m);
            }
            if !mismatches.is_empty() {
                anyhow::bail!("{} parameter(s) differ", mismatches.len());
            }
            println!("Field parameters match.");
            Ok(())
        }
        Commands::Run {
            config,
            field,
            ranks,
            output,
        } => {
            let mut job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());
            if let Some(ranks) = ranks {
                job.run.ranks = ranks;
            }

            let result = runner::run_lockstep(&job, field)?;
            for c in &result.citations {
                println!("Please cite: {}", c);
            }

            if let Some(path) = output.or_else(|| job.output.forces.as_ref().map(PathBuf::from)) {
                runner::write_forces_csv(&result.forces, &job, &path)?;
            }
            println!("Run complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let field = runner::configure_field(&job)?;
            field.print_parameters(&mut io::stdout().lock(), 0)?;
            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
    }
}
