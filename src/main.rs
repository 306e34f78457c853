use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sddmm::{read_pattern, BenchmarkHarness, Error, Result, SddmmConfig};

/// Benchmarks SDDMM strategies on the sparsity pattern of a Matrix Market or `.npz` file
///
/// Set `FLUSH_L2=ON` to flush the last-level cache before every timed
/// iteration.
#[derive(Parser)]
#[command(name = "sddmm-bench", version)]
struct Cli {
    /// Path to a Matrix Market coordinate file or a `.npz` archive
    matrix: PathBuf,

    /// Inner dimension of the dense operands
    #[arg(default_value_t = 128, allow_negative_numbers = true)]
    k: i64,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long)]
    threads: Option<usize>,

    /// Untimed iterations before measuring
    #[arg(long)]
    warmup: Option<usize>,

    /// Timed iterations
    #[arg(long)]
    repeat: Option<usize>,

    /// Seed for operand generation
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the comparison against the reference
    #[arg(long)]
    no_validate: bool,
}

fn run(cli: Cli) -> Result<()> {
    let k = usize::try_from(cli.k)
        .ok()
        .filter(|&k| k > 0)
        .ok_or_else(|| Error::InvalidInput {
            arg: "K",
            reason: format!("must be a positive integer, got {}", cli.k),
        })?;

    let mut config = SddmmConfig::from_env();
    if let Some(n) = cli.threads {
        config = config.with_threads(n);
    }
    if let Some(w) = cli.warmup {
        config.bench.warmup_iters = w;
    }
    if let Some(r) = cli.repeat {
        config.bench.repeat_iters = r;
    }
    if let Some(s) = cli.seed {
        config.bench.seed = s;
    }
    config.bench.validate = !cli.no_validate;

    let pattern = read_pattern(&cli.matrix)?;

    let mut harness = BenchmarkHarness::<f32>::new(config)?;
    harness.load(pattern, k)?;
    if harness.params().validate {
        harness.validate()?;
    }
    harness.run_all()?;

    for report in harness.report()? {
        println!("{report}");
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
