//! Matrix multiplication dataflow scheduler CLI
//!
//! Usage:
//!   macsched -m 4 -n 4 -k 4 "wavefront"
//!   macsched -m 12 -n 12 -k 12 tensor-systolic --summary
//!   macsched --config run.json --json

use clap::Parser as ClapParser;
use colored::Colorize;
use std::fs;
use tracing_subscriber::EnvFilter;

use matmul_dataflow::{
    parse_strategy, RunConfig, RunStats, Schedule, ScheduleResult, Shape, TimelineStep, PRESETS,
};

#[derive(ClapParser, Debug)]
#[command(name = "macsched")]
#[command(author = "FPGA Team")]
#[command(version = "0.1.0")]
#[command(about = "Steps through the MAC schedule of a matmul dataflow strategy")]
struct Args {
    /// Strategy selector or preset name
    /// (e.g., "naive(ikj)", "tiled(4, 2)", "blocked(8)", "tensor(2, 2x2x4)")
    #[arg(value_name = "STRATEGY", default_value = "naive(ijk)")]
    strategy: String,

    /// Rows of A and C
    #[arg(short = 'm', default_value = "12")]
    m: usize,

    /// Columns of B and C
    #[arg(short = 'n', default_value = "12")]
    n: usize,

    /// Shared reduction dimension
    #[arg(short = 'k', default_value = "12")]
    k: usize,

    /// Read shape and strategy from a JSON run config instead
    #[arg(short = 'c', long = "config")]
    config_file: Option<String>,

    /// Output one JSON object per step
    #[arg(short = 'j', long = "json")]
    json_output: bool,

    /// Print only the run statistics
    #[arg(short = 's', long = "summary")]
    summary_only: bool,

    /// Stop after this many steps
    #[arg(short = 'l', long = "limit")]
    limit: Option<usize>,

    /// List preset names and exit
    #[arg(long = "presets")]
    list_presets: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> ScheduleResult<RunConfig> {
    if let Some(file) = &args.config_file {
        let json = fs::read_to_string(file).unwrap_or_else(|e| {
            eprintln!("{}: Failed to read config '{}': {}", "Error".red(), file, e);
            std::process::exit(1);
        });
        return RunConfig::from_json_str(&json);
    }

    Ok(RunConfig::new(
        Shape::new(args.m, args.n, args.k)?,
        parse_strategy(&args.strategy)?,
    ))
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_presets {
        for name in PRESETS {
            if let Some(strategy) = matmul_dataflow::Strategy::preset(name) {
                println!("{:<18} {}", name.cyan(), strategy);
            }
        }
        return;
    }

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "Configuration error".red(), e);
            std::process::exit(1);
        }
    };

    let scheduler = match config.build() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", "Invalid strategy".red(), e);
            std::process::exit(1);
        }
    };

    let expected = scheduler.expected_steps();
    tracing::info!(shape = %config.shape, strategy = %config.strategy, expected, "starting run");

    if !args.json_output {
        println!("{}", "MAC Schedule".bold().green());
        println!("{}", "=".repeat(50));
        println!("{}: {}", "Shape (MxNxK)".cyan(), config.shape);
        println!("{}: {}", "Strategy".cyan(), config.strategy);
        println!("{}: {}", "Expected steps".cyan(), expected);
        println!();
    }

    let mut stats = RunStats::new();
    let limit = args.limit.unwrap_or(usize::MAX);
    for step in scheduler.run().take(limit) {
        stats.observe(&step);
        if args.summary_only {
            continue;
        }
        if args.json_output {
            match serde_json::to_string(&step) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("{}: Failed to serialize step: {}", "Error".red(), e);
                    std::process::exit(1);
                }
            }
        } else {
            print_step(stats.steps - 1, &step, args.verbose);
        }
    }

    if stats.steps < expected {
        tracing::warn!(emitted = stats.steps, expected, "run stopped early");
    }

    if !args.json_output {
        println!();
        println!("{}", "Run Statistics".bold().yellow());
        println!("{}", "-".repeat(50));
        println!("{}", stats.summary());
    }
}

fn print_step(index: usize, step: &TimelineStep, verbose: bool) {
    println!(
        "{} {}  {} active, {} completed",
        format!("[{:>5}]", index).dimmed(),
        step.description.bold(),
        step.active.len().to_string().green(),
        step.completed.len().to_string().blue()
    );

    if verbose || step.active.len() + step.completed.len() <= 8 {
        if !step.active.is_empty() {
            println!("        {}: {}", "active".green(), join(&step.active));
        }
        if !step.completed.is_empty() {
            println!("        {}: {}", "done".blue(), join(&step.completed));
        }
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(" ")
}
