use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the emergency department simulation workspace",
    long_about = "A unified CLI for running replications, capacity sweeps, benchmarks,\n\
                  and CI checks in the emergency department simulation workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replicate the standard scenario (one 1000-minute day per replication)
    Run {
        /// Number of replications
        #[arg(long, env = "ED_REPLICATIONS", default_value_t = 30)]
        replications: usize,
        /// Optional scenario JSON file
        #[arg(long)]
        config: Option<String>,
    },
    /// Run a capacity sweep over beds and nurses
    Sweep {
        /// Replications per capacity point
        #[arg(long, default_value_t = 10)]
        replications: usize,
        /// Output CSV path
        #[arg(long, default_value = "capacity_sweep.csv")]
        output: String,
    },
    /// Run Criterion benchmarks
    Bench,
    /// Compare benchmarks: stash changes, create baseline, restore, compare
    BenchCompare,
    /// Run CI checks (fmt, clippy, tests, examples, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Run load tests (ignored tests in ed_core)
    LoadTest,
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build and run example binaries
    Examples,
    /// Run benchmarks
    Bench,
    /// Run check + examples + bench
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn git(args: &[&str]) -> ExitStatus {
    eprintln!("+ git {}", args.join(" "));
    Command::new("git")
        .args(args)
        .status()
        .expect("failed to execute git")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_git(args: &[&str]) {
    let status = git(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_replicate(replications: usize, config: Option<&str>) {
    let replications = replications.to_string();
    let mut args = vec![
        "run",
        "-p",
        "ed_experiments",
        "--example",
        "replicate",
        "--release",
        "--",
        "--replications",
        replications.as_str(),
    ];
    if let Some(config) = config {
        args.extend(["--config", config]);
    }
    run_cargo(&args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test ed_core");
    run_cargo(&["test", "-p", "ed_core"]);

    step("Test ed_experiments");
    run_cargo(&["test", "-p", "ed_experiments"]);
}

fn ci_examples() {
    step("Run replicate (5 replications)");
    run_cargo(&[
        "run",
        "-p",
        "ed_experiments",
        "--example",
        "replicate",
        "--release",
        "--",
        "--replications",
        "5",
        "--no-progress",
    ]);

    step("Run capacity_sweep (2 replications per point)");
    let output = std::env::temp_dir().join("ed_capacity_sweep.csv");
    let output = output.to_string_lossy();
    run_cargo(&[
        "run",
        "-p",
        "ed_experiments",
        "--example",
        "capacity_sweep",
        "--release",
        "--",
        "--beds",
        "20,40",
        "--nurses",
        "15",
        "--replications",
        "2",
        "--output",
        &output,
    ]);
}

fn ci_bench() {
    step("Run benchmarks");
    run_cargo(&["bench", "--package", "ed_core", "--bench", "performance"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            replications,
            config,
        } => {
            run_replicate(replications, config.as_deref());
        }
        Commands::Sweep {
            replications,
            output,
        } => {
            let reps = replications.to_string();
            run_cargo(&[
                "run",
                "-p",
                "ed_experiments",
                "--example",
                "capacity_sweep",
                "--release",
                "--",
                "--replications",
                &reps,
                "--output",
                &output,
            ]);
        }
        Commands::Bench => {
            run_cargo(&["bench", "--package", "ed_core", "--bench", "performance"]);
        }
        Commands::BenchCompare => {
            let baseline_dir = Path::new("target/criterion");
            if baseline_dir.exists() {
                step("Removing existing benchmark data");
                std::fs::remove_dir_all(baseline_dir).expect("failed to remove target/criterion");
            }

            step("Stashing current changes");
            run_git(&[
                "stash",
                "push",
                "-m",
                "Temporary stash for benchmark comparison",
            ]);

            step("Running benchmark to create baseline");
            run_cargo(&[
                "bench",
                "--package",
                "ed_core",
                "--bench",
                "performance",
                "--",
                "--save-baseline",
                "main",
            ]);

            step("Reapplying changes");
            run_git(&["stash", "pop"]);

            step("Running benchmark comparing against baseline");
            run_cargo(&[
                "bench",
                "--package",
                "ed_core",
                "--bench",
                "performance",
                "--",
                "--baseline",
                "main",
            ]);

            eprintln!("\nDone! Check the output above to see performance comparison.");
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Examples => ci_examples(),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    ci_examples();
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::LoadTest => {
            run_cargo(&[
                "test",
                "-p",
                "ed_core",
                "--test",
                "load_tests",
                "--",
                "--ignored",
            ]);
        }
    }
}
