use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;

use guessfire_shared::*;
use guessfire_sim::{run_session, summarize, LearnerConfig, SessionSummary};

/// A sweepable learner parameter with its name, range, and accessor.
struct SweepParam {
    name: &'static str,
    min: f64,
    default: f64,
    max: f64,
    /// Apply this parameter value to a LearnerConfig.
    apply: fn(&mut LearnerConfig, f64),
    /// Only has an effect under additive scoring.
    additive_only: bool,
}

const SWEEP_PARAMS: &[SweepParam] = &[
    SweepParam {
        name: "initial_temperature",
        min: 0.02,
        default: DEFAULT_INITIAL_TEMPERATURE,
        max: 1.0,
        apply: |c, v| c.initial_temperature = v,
        additive_only: false,
    },
    SweepParam {
        name: "temperature_step",
        min: 0.001,
        default: DEFAULT_TEMPERATURE_STEP,
        max: 0.05,
        apply: |c, v| c.temperature_step = v,
        additive_only: false,
    },
    SweepParam {
        name: "actions",
        min: 3.0,
        default: DEFAULT_ACTIONS as f64,
        max: 31.0,
        apply: |c, v| c.actions = v.round() as usize,
        additive_only: false,
    },
    SweepParam {
        name: "discount_factor",
        min: 0.8,
        default: 1.0,
        max: 1.0,
        apply: |c, v| c.discount_factor = v,
        additive_only: true,
    },
    SweepParam {
        name: "min_score",
        min: 0.0,
        default: 0.0,
        max: 0.5,
        apply: |c, v| c.min_score = v,
        additive_only: true,
    },
];

/// Aggregated accuracy for one parameter value across all seeds.
struct AggResult {
    value: f64,
    mean_accuracy: f64,
    mean_last_round: f64,
    mean_temperature: f64,
    session_count: u32,
}

/// A single session to be run in parallel.
struct SessionJob {
    seed: u64,
    learner: LearnerConfig,
}

/// Learner config for one sweep value on top of the chosen scoring scheme.
fn job_config(param: &SweepParam, value: f64, scoring: ScoringScheme) -> LearnerConfig {
    let mut config = LearnerConfig {
        scoring,
        ..Default::default()
    };
    if param.additive_only && config.scoring == ScoringScheme::Ratio {
        config.scoring = ScoringScheme::additive();
    }
    (param.apply)(&mut config, value);
    config
}

fn run_job(job: &SessionJob, rounds: u32, target: &str) -> anyhow::Result<SessionSummary> {
    let range = RangeConfig {
        seed: job.seed,
        ..Default::default()
    };
    let session = run_session(&range, job.learner.clone(), rounds, target)?;
    Ok(summarize(&session.reports()))
}

fn sweep_param(
    param: &SweepParam,
    steps: usize,
    seeds: u32,
    rounds: u32,
    target: &str,
    scoring: ScoringScheme,
) -> anyhow::Result<Vec<AggResult>> {
    // Generate linearly-spaced values
    let values: Vec<f64> = if steps <= 1 {
        vec![param.default]
    } else {
        (0..steps)
            .map(|i| param.min + (param.max - param.min) * i as f64 / (steps - 1) as f64)
            .collect()
    };

    values
        .iter()
        .map(|&val| -> anyhow::Result<AggResult> {
            let jobs: Vec<SessionJob> = (0..seeds)
                .map(|s| SessionJob {
                    seed: s as u64,
                    learner: job_config(param, val, scoring),
                })
                .collect();

            let summaries = jobs
                .par_iter()
                .map(|job| run_job(job, rounds, target))
                .collect::<anyhow::Result<Vec<SessionSummary>>>()
                .with_context(|| format!("{} = {}", param.name, val))?;

            let n = summaries.len().max(1) as f64;
            Ok(AggResult {
                value: val,
                mean_accuracy: summaries.iter().map(|s| s.accuracy).sum::<f64>() / n,
                mean_last_round: summaries.iter().map(|s| s.last_round_accuracy).sum::<f64>() / n,
                mean_temperature: summaries.iter().map(|s| s.final_temperature).sum::<f64>() / n,
                session_count: summaries.len() as u32,
            })
        })
        .collect()
}

fn best_index(results: &[AggResult]) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.mean_accuracy.total_cmp(&b.mean_accuracy))
        .map(|(i, _)| i)
}

fn print_param_table(param_name: &str, results: &[AggResult]) {
    println!("\n--- {} ---", param_name);
    println!(
        "{:>12} {:>9} {:>9} {:>8} {:>6}",
        "value", "accuracy", "last_rnd", "temp", "runs"
    );
    println!("{:-<50}", "");

    let best_idx = best_index(results);
    for (i, r) in results.iter().enumerate() {
        let marker = if Some(i) == best_idx { " *" } else { "" };
        println!(
            "{:>12.3} {:>9.3} {:>9.3} {:>8.4} {:>6}{}",
            r.value, r.mean_accuracy, r.mean_last_round, r.mean_temperature, r.session_count, marker,
        );
    }
}

fn write_csv(path: &Path, all_results: &[(&str, Vec<AggResult>)]) -> anyhow::Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writeln!(
        file,
        "parameter,value,accuracy,last_round_accuracy,temperature,session_count"
    )?;

    for (param_name, results) in all_results {
        for r in results {
            writeln!(
                file,
                "{},{:.4},{:.4},{:.4},{:.5},{}",
                param_name,
                r.value,
                r.mean_accuracy,
                r.mean_last_round,
                r.mean_temperature,
                r.session_count,
            )?;
        }
    }
    println!("\nCSV written to {}", path.display());
    Ok(())
}

pub fn cmd_sweep(
    param_filter: Option<&str>,
    steps: usize,
    seeds: u32,
    rounds: u32,
    target: &str,
    scoring: ScoringScheme,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    crate::ensure_target(target);

    // Filter to requested parameter(s)
    let params_to_sweep: Vec<&SweepParam> = if let Some(name) = param_filter {
        match SWEEP_PARAMS.iter().find(|p| p.name == name) {
            Some(p) => vec![p],
            None => {
                eprintln!(
                    "Unknown parameter '{}'. Available: {}",
                    name,
                    SWEEP_PARAMS
                        .iter()
                        .map(|p| p.name)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                std::process::exit(1);
            }
        }
    } else {
        SWEEP_PARAMS.iter().collect()
    };

    let total_sessions = params_to_sweep.len() * steps.max(1) * seeds as usize;
    println!(
        "=== Learner Sweep ===\nTarget: {} | Steps: {} | Seeds: {} | Rounds: {} | Scoring: {:?}\nParams: {} | Total sessions: {}",
        target,
        steps,
        seeds,
        rounds,
        scoring,
        params_to_sweep.len(),
        total_sessions,
    );

    let start = std::time::Instant::now();

    let mut all_results: Vec<(&str, Vec<AggResult>)> = Vec::new();
    let mut best_per_param: Vec<(&str, f64, f64)> = Vec::new();

    for param in &params_to_sweep {
        let results = sweep_param(param, steps, seeds, rounds, target, scoring)?;
        if let Some(best) = best_index(&results).map(|i| &results[i]) {
            best_per_param.push((param.name, best.value, best.mean_accuracy));
        }
        print_param_table(param.name, &results);
        all_results.push((param.name, results));
    }

    let elapsed = start.elapsed();
    println!("\n=== Summary ({:.1}s) ===", elapsed.as_secs_f32());
    println!("{:<25} {:>12} {:>10}", "Parameter", "Best Value", "Accuracy");
    println!("{:-<50}", "");
    for (name, value, accuracy) in &best_per_param {
        println!("{:<25} {:>12.3} {:>10.3}", name, value, accuracy);
    }

    if let Some(path) = &output {
        write_csv(path, &all_results)?;
    }
    Ok(())
}
