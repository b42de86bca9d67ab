//! polyremap Command Line Interface
//!
//! Usage:
//!   polyremap [OPTIONS] <COMMAND>
//!   polyremap --help
//!
//! Examples:
//!   polyremap hnf 3,2,3,4                               # Hermite Normal Form
//!   polyremap derive --matrix 1,1,0,1 --domain 1,100,1,100 --verify
//!   polyremap catalog --emit c --output out/            # One C program per case
//!   polyremap sweep --seeds 20 --dump-dir mismatches/   # Seeded equivalence sweep

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use polyremap::analysis::{sweep, verify_coverage, ExecutionPlan};
use polyremap::catalog::{catalog, CatalogConfig};
use polyremap::codegen::{self, Target};
use polyremap::polyhedral::{IterationDomain, TransformMatrix};
use polyremap::utils::IntMatrix;
use std::fs;
use std::path::{Path, PathBuf};

/// polyremap - Affine Iteration-Space Remapping Engine
#[derive(Parser, Debug)]
#[command(name = "polyremap")]
#[command(version)]
#[command(about = "Derive and verify loop bounds for integer iteration-space transforms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress warnings)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Hermite Normal Form A = M * U of a square matrix
    Hnf {
        /// Matrix entries in row-major order (comma-separated)
        #[arg(value_delimiter = ',', allow_negative_numbers = true, required = true)]
        entries: Vec<i64>,
    },

    /// Derive the transformed loop nest for a domain and matrix
    Derive {
        /// Transform entries in row-major order (comma-separated)
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        matrix: Vec<i64>,

        /// Domain as lower,upper pairs per axis (upper exclusive)
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        domain: Vec<i64>,

        /// Check that the nest visits the domain exactly once
        #[arg(long)]
        verify: bool,
    },

    /// Build the case catalog
    Catalog {
        /// What to emit
        #[arg(long, default_value = "summary")]
        emit: EmitKind,

        /// Output file for summaries, or directory for C programs
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Side of the square array
        #[arg(long, default_value_t = 100)]
        size: i64,
    },

    /// Run the equivalence oracle over every case and several seeds
    Sweep {
        /// Number of random inputs per case
        #[arg(long, default_value_t = 10)]
        seeds: usize,

        /// Seed of the first input
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Side of the square array
        #[arg(long, default_value_t = 100)]
        size: i64,

        /// Only run the static coverage and dependence checks
        #[arg(long)]
        skip_equivalence: bool,

        /// Write every mismatch as JSON into this directory
        #[arg(long, value_name = "DIR")]
        dump_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EmitKind {
    /// Domain, transform and both nests of every case
    Summary,
    /// Standalone C program per case
    C,
}

impl From<EmitKind> for Target {
    fn from(kind: EmitKind) -> Self {
        match kind {
            EmitKind::Summary => Target::Summary,
            EmitKind::C => Target::C,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    info!("polyremap v{}", polyremap::VERSION);
    debug!("Command: {:?}", cli.command);

    match cli.command {
        Command::Hnf { entries } => run_hnf(&entries),
        Command::Derive { matrix, domain, verify } => run_derive(&matrix, &domain, verify),
        Command::Catalog { emit, output, size } => run_catalog(emit, output.as_deref(), size),
        Command::Sweep {
            seeds,
            seed,
            size,
            skip_equivalence,
            dump_dir,
        } => {
            let plan = ExecutionPlan {
                seeds,
                base_seed: seed,
                check_equivalence: !skip_equivalence,
                ..Default::default()
            };
            run_sweep(&plan, size, dump_dir.as_deref())
        }
    }
}

fn run_hnf(entries: &[i64]) -> Result<()> {
    let matrix = IntMatrix::from_row_major(entries).context("Invalid matrix")?;
    let form = polyremap::hnf(&matrix)?;
    println!("M = {}", matrix);
    println!("A = {}", form.triangular);
    println!("U = {}", form.unimodular);
    Ok(())
}

fn run_derive(entries: &[i64], bounds: &[i64], verify: bool) -> Result<()> {
    let matrix = IntMatrix::from_row_major(entries).context("Invalid matrix")?;
    let transform = TransformMatrix::new(matrix).context("Invalid transform")?;
    if bounds.len() % 2 != 0 {
        bail!("--domain needs lower,upper pairs, got {} values", bounds.len());
    }
    let (lower, upper): (Vec<i64>, Vec<i64>) = bounds.chunks(2).map(|p| (p[0], p[1])).unzip();
    let domain = IterationDomain::new(lower, upper).context("Invalid domain")?;

    let nest = polyremap::derive_bounds(&domain, &transform)?;
    println!("domain:    {}", domain);
    println!("transform: {} ({})", transform, transform.classify());
    print!("{}", nest);

    if verify {
        verify_coverage(&nest).context("Derived nest does not cover the domain")?;
        println!("coverage:  ok ({} points)", domain.len());
    }
    Ok(())
}

fn run_catalog(emit: EmitKind, output: Option<&Path>, size: i64) -> Result<()> {
    let config = CatalogConfig {
        size,
        ..Default::default()
    };
    let cases = catalog(&config)?;

    match (emit, output) {
        (EmitKind::C, Some(dir)) => {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {:?}", dir))?;
            for case in &cases {
                let path = dir.join(format!("{}.c", case.name));
                let code = codegen::generate(case, Target::C)?;
                fs::write(&path, code).with_context(|| format!("Failed to write output file: {:?}", path))?;
                info!("wrote {:?}", path);
            }
        }
        _ => {
            let mut rendered = Vec::with_capacity(cases.len());
            for case in &cases {
                rendered.push(codegen::generate(case, emit.into())?);
            }
            write_output(output, &rendered.join("\n"))?;
        }
    }
    Ok(())
}

fn run_sweep(plan: &ExecutionPlan, size: i64, dump_dir: Option<&Path>) -> Result<()> {
    let config = CatalogConfig {
        size,
        ..Default::default()
    };
    let cases = catalog(&config)?;
    let report = sweep(&cases, plan)?;

    if let Some(dir) = dump_dir {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {:?}", dir))?;
        for mismatch in &report.mismatches {
            let path = dir.join(format!("{}-{}.json", mismatch.case, mismatch.seed.unwrap_or_default()));
            let json = serde_json::to_string_pretty(mismatch)?;
            fs::write(&path, json).with_context(|| format!("Failed to write output file: {:?}", path))?;
            warn!("dumped mismatch to {:?}", path);
        }
    }

    println!(
        "{} cases, {} runs passed, {} failed",
        cases.len(),
        report.passed,
        report.failed
    );
    report.into_result()?;
    Ok(())
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(p) => {
            fs::write(p, content)
                .with_context(|| format!("Failed to write output file: {:?}", p))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
