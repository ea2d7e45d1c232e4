//! Benchmark sweep for the LU and Cholesky engines
//!
//! Usage:
//!   cargo run --release --bin factor_bench -- --start 6 --end 10 --threads 8
//!   cargo run --release --bin factor_bench -- --algorithm cholesky --json

use clap::{Parser, ValueEnum};
use math_audio_factor::generate::seeded_rng;
use math_audio_factor::{
    Algorithm, BenchConfig, BenchHarness, FactorConfig, PivotCheck, Schedule,
};
use std::process;

#[derive(Parser, Debug)]
#[command(
    name = "factor_bench",
    about = "Time sequential, static and dynamic LU/Cholesky factorizations over a size sweep"
)]
struct Cli {
    /// Smallest size is 2^(start+1)
    #[arg(long, default_value_t = 6)]
    start: u32,

    /// Largest size is 2^(end+1)
    #[arg(long, default_value_t = 12)]
    end: u32,

    /// Factorization(s) to benchmark
    #[arg(long, value_enum, default_value_t = AlgorithmChoice::Both)]
    algorithm: AlgorithmChoice,

    /// Number of worker threads (0 = use all available cores)
    #[arg(short = 't', long, default_value_t = 0)]
    threads: usize,

    /// Chunk size of the static schedule (default: one block per thread)
    #[arg(long)]
    static_chunk: Option<usize>,

    /// Chunk size of the dynamic schedule
    #[arg(long, default_value_t = 1)]
    dynamic_chunk: usize,

    /// Optional random seed for reproducible inputs
    #[arg(long)]
    seed: Option<u64>,

    /// Report max |A - L·U| (or |A - L·Lᵗ|) for every run
    #[arg(long)]
    residual: bool,

    /// Skip pivot validation and let NaN/inf propagate
    #[arg(long)]
    unchecked: bool,

    /// Print records as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AlgorithmChoice {
    Lu,
    Cholesky,
    Both,
}

impl AlgorithmChoice {
    fn algorithms(self) -> Vec<Algorithm> {
        match self {
            AlgorithmChoice::Lu => vec![Algorithm::Lu],
            AlgorithmChoice::Cholesky => vec![Algorithm::Cholesky],
            AlgorithmChoice::Both => vec![Algorithm::Lu, Algorithm::Cholesky],
        }
    }
}

fn main() {
    env_logger::init();
    let args = Cli::parse();

    if args.start > args.end {
        eprintln!("--start ({}) must not exceed --end ({})", args.start, args.end);
        process::exit(2);
    }

    let config = BenchConfig {
        start_exponent: args.start,
        end_exponent: args.end,
        algorithms: args.algorithm.algorithms(),
        schedules: vec![
            Schedule::Sequential,
            Schedule::Static {
                chunk_size: args.static_chunk,
            },
            Schedule::Dynamic {
                chunk_size: args.dynamic_chunk,
            },
        ],
        num_threads: if args.threads == 0 {
            None
        } else {
            Some(args.threads)
        },
        seed: args.seed,
        check_residual: args.residual,
        factor: FactorConfig {
            pivot_check: if args.unchecked {
                PivotCheck::Unchecked
            } else {
                PivotCheck::default()
            },
            ..FactorConfig::default()
        },
    };

    let harness = match BenchHarness::new(config) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let mut rng = seeded_rng(harness.config().seed);
    let mut records = Vec::new();
    for n in harness.config().sizes() {
        for &algorithm in &harness.config().algorithms {
            for record in harness.run_size(algorithm, n, &mut rng) {
                if args.json {
                    records.push(record);
                } else {
                    println!("{record}");
                }
            }
        }
        if !args.json {
            println!();
        }
    }

    if args.json {
        match serde_json::to_string_pretty(&records) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
    }
}
