// LBP Benchmark Runner v1.0.0 — Monte Carlo validation of ramp, pricing and stage invariants
// Seedable ChaCha8 price paths, per-timestep audit trail
//
// Usage:
//   cargo run --release --bin bench                         # Run all scenarios (30 runs each)
//   cargo run --release --bin bench -- --runs 5             # Quick mode (5 runs each)
//   cargo run --release --bin bench -- LBP_SHORT            # Filter by name
//   cargo run --release --bin bench -- --time-series        # Enable JSONL output
//   cargo run --release --bin bench -- --seed 42            # Custom base seed
//   cargo run --release --bin bench -- --timesteps 240      # Override scenario length
//   cargo run --release --bin bench -- --parallel           # Spread runs over all cores
//   cargo run --release --bin bench -- --config exp.json    # Run one experiment from JSON

mod monte_carlo;
mod report;
mod scenarios;
mod time_series;

use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use lbp_engine::ExperimentConfig;
use monte_carlo::Experiment;
use report::*;
use scenarios::*;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: u32,
    seed: u64,
    timesteps: Option<u64>,
    config: Option<PathBuf>,
    time_series: bool,
    parallel: bool,
    filter: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        runs: 30,
        seed: 0,
        timesteps: None,
        config: None,
        time_series: false,
        parallel: false,
        filter: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                if i < args.len() {
                    cli.runs = args[i].parse().unwrap_or(30);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            "--timesteps" => {
                i += 1;
                if i < args.len() {
                    cli.timesteps = args[i].parse().ok();
                }
            }
            "--config" => {
                i += 1;
                if i < args.len() {
                    cli.config = Some(PathBuf::from(&args[i]));
                }
            }
            "--time-series" => {
                cli.time_series = true;
            }
            "--parallel" => {
                cli.parallel = true;
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .init();

    let cli = parse_args();
    let all_scenarios = scenarios();
    let custom_criteria = PassCriteria::default();

    let experiments: Vec<Experiment<'_>> = match &cli.config {
        Some(path) => match ExperimentConfig::from_path(path) {
            Ok(mut config) => {
                if let Some(t) = cli.timesteps {
                    config.timesteps = t;
                }
                vec![Experiment::from_config(config, &custom_criteria)]
            }
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => {
            let selected: Vec<&Scenario> = match &cli.filter {
                Some(f) => {
                    let f_lower = f.to_lowercase();
                    all_scenarios.iter()
                        .filter(|s| s.name.to_lowercase().contains(&f_lower)
                                  || s.label.to_lowercase().contains(&f_lower)
                                  || s.category.to_lowercase().contains(&f_lower))
                        .collect()
                }
                None => all_scenarios.iter().collect(),
            };
            selected.into_iter()
                .map(|s| Experiment::from_scenario(s, cli.runs, cli.seed, cli.timesteps))
                .collect()
        }
    };

    if experiments.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    let ts_dir = if cli.time_series {
        Some(PathBuf::from("benchmark-results/time-series"))
    } else {
        None
    };

    println!("\n  LBP Benchmark Runner v1.0.0");
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {} | Parallel: {}",
        cli.runs, cli.seed, cli.parallel);
    println!("  Running {} scenario(s)...\n", experiments.len());
    println!("  {:<36} {:>5} {:>6} {:>14} {:>9} {:>6} {:>8}",
        "Scenario", "Pass%", "Sweeps", "Y USD", "Weight", "Fail", "Time");
    println!("  {}", "-".repeat(92));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for experiment in &experiments {
        let report = monte_carlo::run_monte_carlo(experiment, cli.parallel, ts_dir.as_deref());

        let pass_pct = report.pass_rate * 100.0;
        let price = &report.final_y_usd_price;
        let price_ci = (price.ci_upper - price.ci_lower) / 2.0;
        let status = if report.error.is_none() && report.pass_rate >= 1.0 { "PASS" } else { "FAIL" };

        println!("  {:<36} {:>4}% {:>6} {:>8.3}±{:<5.3} {:>9.4} {:>6} {:>6.0}ms  {}",
            report.label,
            pass_pct as u32,
            report.n_sweeps,
            price.mean, price_ci,
            report.final_weight_x.mean,
            report.failed_runs,
            report.elapsed_ms,
            status,
        );
        if let Some(e) = &report.error {
            println!("    error: {}", e);
        }

        mc_reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Invariant Validation ───────────────────────────────────────────

    let runs = || mc_reports.iter().flat_map(|r| r.individual_runs.iter());
    let validation = InvariantValidation {
        weight_ramp_lands_on_end: experiments.iter().zip(&mc_reports)
            .filter(|(e, _)| e.criteria.require_weight_at_end)
            .all(|(_, r)| r.individual_runs.iter().all(|run| run.weight_at_end)),
        stage_monotonic: runs().all(|r| r.stage_monotonic),
        max_round_trip_error: runs().map(|r| r.max_round_trip_error).fold(0.0_f64, f64::max),
    };

    // ─── Summary ────────────────────────────────────────────────────────

    let total = mc_reports.len();
    let passed = mc_reports.iter()
        .filter(|r| r.error.is_none() && r.pass_rate >= 1.0)
        .count();
    let failed = total - passed;

    println!("  {}", "-".repeat(92));
    println!("  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total, passed, failed, suite_elapsed.as_secs_f64());

    println!("  Invariant Validation:");
    println!("    Weight ramp lands on end:  {}", if validation.weight_ramp_lands_on_end { "PASS" } else { "FAIL" });
    println!("    Stage monotonic:           {}", if validation.stage_monotonic { "PASS" } else { "FAIL" });
    println!("    Max price round-trip err:  {:.2e}\n", validation.max_round_trip_error);

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
    let timestamp = format!("{}", ts);
    let all_pass = validation.all_pass();

    let report = BenchReport {
        timestamp: timestamp.clone(),
        version: "1.0.0",
        prng: "ChaCha8Rng",
        n_runs_per_scenario: cli.runs,
        parallel: cli.parallel,
        summary: Summary {
            total,
            passed,
            failed,
            pass_rate: passed as f64 / total as f64,
        },
        validation,
        scenarios: mc_reports,
    };

    let dir = std::path::Path::new("benchmark-results");
    if !dir.exists() {
        std::fs::create_dir_all(dir).expect("Failed to create benchmark-results/");
    }
    let path = dir.join(format!("bench-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report).expect("Failed to serialize");
    std::fs::write(&path, &json).expect("Failed to write benchmark file");
    println!("  Results saved to: {}\n", path.display());

    if failed > 0 || !all_pass {
        std::process::exit(1);
    }
}
