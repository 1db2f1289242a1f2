use clap::{Args, Parser, Subcommand};
use molcomplex::core::forcefield::calculator::CalculatorKind;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Safi Ullah Majid",
    version,
    about = "molcomplex - build, relax and characterize absorbent-analyte complexes from Gaussian input files.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one absorbent-analyte pair and write the optimized complex and its properties.
    Analyze(AnalyzeArgs),
    /// Analyze every ordered pair of .gjf files in a directory.
    Batch(BatchArgs),
    /// Write the sample benzene absorbent and water analyte input files.
    Example(ExampleArgs),
}

/// Settings shared by every command that runs the analysis pipeline.
#[derive(Args, Debug, Clone, Default)]
pub struct RunOverrides {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Energy model used for optimization: 'classical' or 'none'.
    #[arg(long, value_name = "KIND")]
    pub calculator: Option<CalculatorKind>,

    /// Override the force field parameter file.
    #[arg(long, value_name = "PATH")]
    pub forcefield: Option<PathBuf>,

    /// Initial center-of-mass separation along z, in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub separation: Option<f64>,

    /// Force convergence threshold for every optimization (kcal/mol/Angstrom).
    #[arg(long, value_name = "FLOAT")]
    pub fmax: Option<f64>,

    /// Maximum optimizer steps for each individual molecule.
    #[arg(long, value_name = "INT")]
    pub steps: Option<usize>,

    /// Maximum optimizer steps for the complex.
    #[arg(long, value_name = "INT")]
    pub complex_steps: Option<usize>,

    /// Seed for the noisy property estimates, for reproducible reports.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Write optimization trajectories as multi-frame XYZ files.
    #[arg(long)]
    pub trajectory: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S optimization.steps=50
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the absorbent .gjf file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub absorbent: PathBuf,

    /// Path to the analyte .gjf file.
    #[arg(short = 'b', long, required = true, value_name = "PATH")]
    pub analyte: PathBuf,

    /// Prefix for the output files.
    #[arg(short, long, default_value = "complex", value_name = "PREFIX")]
    pub prefix: PathBuf,

    #[command(flatten)]
    pub overrides: RunOverrides,
}

/// Arguments for the `batch` subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory containing the .gjf inputs.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub dir: PathBuf,

    /// Directory for the output files. Defaults to the current directory.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: RunOverrides,
}

/// Arguments for the `example` subcommand.
#[derive(Args, Debug)]
pub struct ExampleArgs {
    /// Directory to write the sample files into.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub dir: PathBuf,

    /// Overwrite existing files.
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_parses_paths_and_overrides() {
        let cli = Cli::parse_from([
            "molcomplex",
            "-vv",
            "analyze",
            "-a",
            "benzene.gjf",
            "-b",
            "water.gjf",
            "--calculator",
            "none",
            "--complex-steps",
            "50",
            "-S",
            "complex.separation=4.0",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Analyze(args) = cli.command else {
            panic!("Expected 'analyze' subcommand");
        };
        assert_eq!(args.absorbent, PathBuf::from("benzene.gjf"));
        assert_eq!(args.prefix, PathBuf::from("complex"));
        assert_eq!(args.overrides.calculator, Some(CalculatorKind::None));
        assert_eq!(args.overrides.complex_steps, Some(50));
        assert_eq!(args.overrides.set_values, vec!["complex.separation=4.0"]);
    }

    #[test]
    fn unknown_calculator_is_rejected() {
        let result = Cli::try_parse_from([
            "molcomplex",
            "analyze",
            "-a",
            "a.gjf",
            "-b",
            "b.gjf",
            "--calculator",
            "quantum",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["molcomplex", "-q", "-v", "example"]);
        assert!(result.is_err());
    }

    #[test]
    fn example_defaults_to_current_directory() {
        let cli = Cli::parse_from(["molcomplex", "example"]);
        let Commands::Example(args) = cli.command else {
            panic!("Expected 'example' subcommand");
        };
        assert_eq!(args.dir, PathBuf::from("."));
        assert!(!args.force);
    }
}
