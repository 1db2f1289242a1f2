use super::key_properties;
use crate::cli::BatchArgs;
use crate::config::PartialAnalysisConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use molcomplex::engine::config::AnalysisConfig;
use molcomplex::engine::error::EngineError;
use molcomplex::engine::progress::ProgressReporter;
use molcomplex::workflows::analyze::{self, PairJob};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// One-line summary of the key properties, `key=value` separated by commas.
pub fn summarize(result: &analyze::AnalysisResult) -> String {
    key_properties(&result.properties)
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_pair(job: &PairJob, config: &AnalysisConfig, output_dir: &Path) -> std::result::Result<String, EngineError> {
    let reporter = ProgressReporter::new();
    let result = analyze::run(&job.absorbent, &job.analyte, config, &reporter)?;
    analyze::write_outputs(&result, &output_dir.join(&job.prefix), &config.output)?;
    Ok(summarize(&result))
}

pub async fn run(args: BatchArgs) -> Result<()> {
    let partial_config = PartialAnalysisConfig::load(args.overrides.config.as_deref())?;
    let config = partial_config.merge_with_cli(&args.overrides)?;
    let output_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));

    let jobs = analyze::batch_pairs(&args.dir)?;
    if jobs.is_empty() {
        warn!("Fewer than two .gjf files in {:?}; nothing to do.", args.dir);
        println!("No absorbent-analyte pairs found in {}", args.dir.display());
        return Ok(());
    }
    info!("Analyzing {} pairs from {:?}", jobs.len(), args.dir);

    let bar = CliProgressHandler::pairs_bar(jobs.len() as u64);
    let outcomes: Vec<_> = tokio::task::block_in_place(|| {
        jobs.par_iter()
            .map(|job| {
                let outcome = run_pair(job, &config, &output_dir);
                bar.inc(1);
                outcome
            })
            .collect()
    });
    bar.finish_and_clear();

    let mut failed = 0;
    for (job, outcome) in jobs.iter().zip(outcomes) {
        match outcome {
            Ok(summary) => println!("{} → {}", job.prefix, summary),
            Err(e) => {
                failed += 1;
                error!("Analysis of {} failed: {}", job.prefix, e);
                println!("{} → failed: {}", job.prefix, e);
            }
        }
    }

    if failed == jobs.len() {
        return Err(CliError::BatchFailed { total: jobs.len() });
    }
    if failed > 0 {
        warn!("{} of {} pair analyses failed.", failed, jobs.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::commands::example::write_samples;
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    fn batch_args(dir: &Path, out: &Path) -> BatchArgs {
        let cli = Cli::parse_from([
            "molcomplex",
            "batch",
            "-d",
            dir.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--calculator",
            "none",
        ]);
        match cli.command {
            Commands::Batch(args) => args,
            _ => panic!("Expected 'batch' subcommand"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn batch_analyzes_both_orderings() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_samples(input.path(), false).unwrap();

        run(batch_args(input.path(), output.path())).await.unwrap();

        assert!(output.path().join("absorbent_analyte_optimized.gjf").is_file());
        assert!(output.path().join("analyte_absorbent_optimized.gjf").is_file());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn batch_fails_when_every_pair_fails() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        fs::write(input.path().join("a.gjf"), "not a molecule\n").unwrap();
        fs::write(input.path().join("b.gjf"), "still not a molecule\n").unwrap();

        let err = run(batch_args(input.path(), output.path())).await.unwrap_err();
        assert!(matches!(err, CliError::BatchFailed { total: 2 }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn batch_with_no_pairs_is_a_no_op() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        run(batch_args(input.path(), output.path())).await.unwrap();
        assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
    }
}
