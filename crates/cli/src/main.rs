mod sweep;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;

use guessfire_shared::*;
use guessfire_sim::{run_session, summarize, LearnerConfig, TARGET_NAMES};

#[derive(Parser)]
#[command(name = "guessfire", about = "Guess-factor targeting on the practice range")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Selection {
    Boltzmann,
    SumOfProbabilities,
}

impl From<Selection> for SelectionMode {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::Boltzmann => SelectionMode::Boltzmann,
            Selection::SumOfProbabilities => SelectionMode::SumOfProbabilities,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Scoring {
    Ratio,
    Additive,
}

impl From<Scoring> for ScoringScheme {
    fn from(scoring: Scoring) -> Self {
        match scoring {
            Scoring::Ratio => ScoringScheme::Ratio,
            Scoring::Additive => ScoringScheme::additive(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Train one learner across several rounds against a target
    Run {
        /// Target pattern (sitter, orbiter, oscillator, wanderer)
        #[arg(long, default_value = "orbiter")]
        target: String,

        /// Number of rounds sharing the learner
        #[arg(long, default_value_t = 10)]
        rounds: u32,

        /// Random seed for the session
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Fire at random inside the escape range instead of using the policy
        #[arg(long)]
        random: bool,

        /// Action selection rule
        #[arg(long, value_enum, default_value_t = Selection::Boltzmann)]
        selection: Selection,

        /// How hits and misses update the scores
        #[arg(long, value_enum, default_value_t = Scoring::Ratio)]
        scoring: Scoring,

        /// Output path for the round reports as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compare the learning gunner with the random baseline
    Compare {
        /// Comma-separated list of target names
        #[arg(long, default_value = "sitter,orbiter,oscillator,wanderer")]
        targets: String,

        /// Rounds per session
        #[arg(long, default_value_t = 10)]
        rounds: u32,

        /// Number of seeds per target and mode
        #[arg(long, default_value_t = 8)]
        seeds: u32,

        /// How hits and misses update the scores
        #[arg(long, value_enum, default_value_t = Scoring::Ratio)]
        scoring: Scoring,
    },

    /// Sweep one learner parameter and report mean accuracy
    Sweep {
        /// Parameter to sweep (all if omitted)
        #[arg(long)]
        param: Option<String>,

        /// Number of values per parameter
        #[arg(long, default_value_t = 5)]
        steps: usize,

        /// Number of seeds per value
        #[arg(long, default_value_t = 8)]
        seeds: u32,

        /// Rounds per session
        #[arg(long, default_value_t = 5)]
        rounds: u32,

        /// Target pattern
        #[arg(long, default_value = "oscillator")]
        target: String,

        /// Scoring for parameters that apply to both schemes. discount_factor
        /// and min_score are always swept with additive scoring
        #[arg(long, value_enum, default_value_t = Scoring::Ratio)]
        scoring: Scoring,

        /// Output path for CSV results
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Exit with the list of valid names when `name` is not a known target.
fn ensure_target(name: &str) {
    if !TARGET_NAMES.contains(&name) {
        eprintln!(
            "Unknown target '{}'. Valid options: {}.",
            name,
            TARGET_NAMES.join(", ")
        );
        std::process::exit(1);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            target,
            rounds,
            seed,
            random,
            selection,
            scoring,
            output,
        } => cmd_run(&target, rounds, seed, random, selection, scoring, output),

        Commands::Compare {
            targets,
            rounds,
            seeds,
            scoring,
        } => cmd_compare(&targets, rounds, seeds, scoring),

        Commands::Sweep {
            param,
            steps,
            seeds,
            rounds,
            target,
            scoring,
            output,
        } => sweep::cmd_sweep(
            param.as_deref(),
            steps,
            seeds,
            rounds,
            &target,
            scoring.into(),
            output,
        ),
    }
}

fn cmd_run(
    target: &str,
    rounds: u32,
    seed: u64,
    random: bool,
    selection: Selection,
    scoring: Scoring,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    ensure_target(target);

    let mut range = RangeConfig {
        seed,
        ..Default::default()
    };
    range.gunner.aim.fire_randomly = random;
    let learner_config = LearnerConfig {
        selection: selection.into(),
        scoring: scoring.into(),
        ..Default::default()
    };

    println!(
        "Running session: {} rounds vs {} (seed={}, random={})",
        rounds, target, seed, random
    );

    let session = run_session(&range, learner_config, rounds, target)?;

    println!();
    println!(
        "{:>6} {:>8} {:>6} {:>6} {:>9} {:>8} {:>16}",
        "round", "shots", "res", "hits", "accuracy", "temp", "end"
    );
    println!("{:-<65}", "");
    for record in &session.rounds {
        let report = &record.report;
        println!(
            "{:>6} {:>8} {:>6} {:>6} {:>9.3} {:>8.4} {:>16}",
            report.round,
            report.shots_fired,
            report.resolved,
            report.hits,
            report.accuracy,
            report.temperature,
            format!("{:?}@{}", record.result.reason, record.result.final_tick),
        );
    }

    let reports = session.reports();
    let summary = summarize(&reports);
    println!();
    println!("=== Session ===");
    println!(
        "Accuracy:    {:.3} ({}/{})",
        summary.accuracy, summary.hits, summary.resolved
    );
    println!(
        "First/last:  {:.3} -> {:.3}",
        summary.first_round_accuracy, summary.last_round_accuracy
    );
    println!("Temperature: {:.4}", summary.final_temperature);
    println!();
    println!("--- Scores ---");
    println!("{}", session.learner);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&reports).context("failed to serialize reports")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Reports written to {}", path.display());
    }
    Ok(())
}

/// Mean pooled accuracy of `seeds` sessions against one target.
fn mean_accuracy(
    target: &str,
    learner: &LearnerConfig,
    rounds: u32,
    seeds: u32,
    random: bool,
) -> anyhow::Result<f64> {
    let accuracies = (0..seeds as u64)
        .into_par_iter()
        .map(|seed| -> anyhow::Result<f64> {
            let mut range = RangeConfig {
                seed,
                ..Default::default()
            };
            range.gunner.aim.fire_randomly = random;
            let session = run_session(&range, learner.clone(), rounds, target)?;
            Ok(summarize(&session.reports()).accuracy)
        })
        .collect::<anyhow::Result<Vec<f64>>>()?;

    Ok(accuracies.iter().sum::<f64>() / accuracies.len().max(1) as f64)
}

fn cmd_compare(targets_str: &str, rounds: u32, seeds: u32, scoring: Scoring) -> anyhow::Result<()> {
    let targets: Vec<&str> = targets_str.split(',').map(|s| s.trim()).collect();
    for target in &targets {
        ensure_target(target);
    }

    let learner = LearnerConfig {
        scoring: scoring.into(),
        ..Default::default()
    };

    println!(
        "Compare: {} targets, {} rounds per session, {} seeds, {:?} scoring",
        targets.len(),
        rounds,
        seeds,
        learner.scoring
    );
    println!();
    println!("{:<12} {:>10} {:>10} {:>8}", "Target", "Learning", "Random", "Delta");
    println!("{:-<12} {:-<10} {:-<10} {:-<8}", "", "", "", "");

    for target in &targets {
        let learning = mean_accuracy(target, &learner, rounds, seeds, false)?;
        let random = mean_accuracy(target, &learner, rounds, seeds, true)?;
        println!(
            "{:<12} {:>10.3} {:>10.3} {:>+8.3}",
            target,
            learning,
            random,
            learning - random
        );
    }
    Ok(())
}
