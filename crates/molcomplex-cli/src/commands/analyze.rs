use super::key_properties;
use crate::cli::AnalyzeArgs;
use crate::config::PartialAnalysisConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use molcomplex::{engine::progress::ProgressReporter, workflows::analyze};
use tracing::info;

pub async fn run(args: AnalyzeArgs) -> Result<()> {
    let partial_config = PartialAnalysisConfig::load(args.overrides.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args.overrides)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting molecular complex analysis...");
    info!(
        "Invoking the analysis workflow for {:?} + {:?}",
        args.absorbent, args.analyte
    );
    let (result, paths) = tokio::task::block_in_place(|| -> Result<_> {
        let result = analyze::run(&args.absorbent, &args.analyte, &config, &reporter)?;
        let paths = analyze::write_outputs(&result, &args.prefix, &config.output)?;
        Ok((result, paths))
    })?;

    for (label, outcome) in [
        ("Absorbent", &result.absorbent_optimization),
        ("Analyte", &result.analyte_optimization),
        ("Complex", &result.complex_optimization),
    ] {
        if let (Some(initial), Some(last)) = (outcome.initial_energy, outcome.final_energy) {
            println!(
                "  {:<9} {:>4} steps, {:>12.4} -> {:>12.4} kcal/mol{}",
                label,
                outcome.steps,
                initial,
                last,
                if outcome.converged { "" } else { " (not converged)" }
            );
        }
    }

    println!(
        "Analysis complete! Results saved as {} and {}",
        paths.gjf.display(),
        paths.properties_text.display()
    );
    for path in &paths.trajectories {
        println!("  Trajectory: {}", path.display());
    }

    println!("\nKey Properties:");
    println!("{}", "-".repeat(30));
    for (key, value) in key_properties(&result.properties) {
        println!("{}: {}", key, value);
    }
    if let Some(error) = &result.properties.error {
        println!("Warning: {}", error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::commands::example::write_samples;
    use clap::Parser;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn analyze_writes_outputs_for_sample_pair() {
        let dir = tempdir().unwrap();
        write_samples(dir.path(), false).unwrap();
        let prefix = dir.path().join("benzene_water");

        let absorbent = dir.path().join("absorbent.gjf");
        let analyte = dir.path().join("analyte.gjf");
        let cli = Cli::parse_from([
            "molcomplex",
            "analyze",
            "-a",
            absorbent.to_str().unwrap(),
            "-b",
            analyte.to_str().unwrap(),
            "-p",
            prefix.to_str().unwrap(),
            "--calculator",
            "none",
            "--seed",
            "7",
        ]);
        let Commands::Analyze(args) = cli.command else {
            panic!("Expected 'analyze' subcommand");
        };

        run(args).await.unwrap();

        assert!(dir.path().join("benzene_water_optimized.gjf").is_file());
        assert!(dir.path().join("benzene_water_properties.txt").is_file());
        assert!(dir.path().join("benzene_water_properties.json").is_file());
    }
}
