use crate::cli::RunOverrides;
use crate::error::{CliError, Result};
use molcomplex::core::forcefield::calculator::CalculatorKind;
use molcomplex::core::io::gjf::GjfWriteOptions;
use molcomplex::engine::config::{self as core_config, OptimizationSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialCalculatorConfig {
    kind: Option<CalculatorKind>,
    forcefield_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialOptimizationConfig {
    fmax: Option<f64>,
    steps: Option<usize>,
    complex_steps: Option<usize>,
    max_step: Option<f64>,
    initial_curvature: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialComplexConfig {
    separation: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialPropertiesConfig {
    seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialOutputConfig {
    title: Option<String>,
    method: Option<String>,
    basis: Option<String>,
    keywords: Option<String>,
    charge: Option<i32>,
    multiplicity: Option<u32>,
    nproc_shared: Option<u32>,
    memory: Option<String>,
    trajectory: Option<bool>,
}

/// Every field of the analysis configuration, all optional, as read from TOML.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAnalysisConfig {
    calculator: Option<PartialCalculatorConfig>,
    optimization: Option<PartialOptimizationConfig>,
    complex: Option<PartialComplexConfig>,
    properties: Option<PartialPropertiesConfig>,
    output: Option<PartialOutputConfig>,
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: '{}'", key, value))
    })
}

impl PartialAnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads `path` when given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    /// Resolves the final configuration. Precedence: CLI flags, then `-S` values,
    /// then the file, then built-in defaults.
    pub fn merge_with_cli(mut self, args: &RunOverrides) -> Result<core_config::AnalysisConfig> {
        self.apply_set_values(&args.set_values)?;

        let calc = self.calculator.take().unwrap_or_default();
        let opt = self.optimization.take().unwrap_or_default();
        let complex = self.complex.take().unwrap_or_default();
        let props = self.properties.take().unwrap_or_default();
        let out = self.output.take().unwrap_or_default();

        let fmax = args.fmax.or(opt.fmax);
        let with_overrides = |base: OptimizationSettings, steps: Option<usize>| OptimizationSettings {
            fmax: fmax.unwrap_or(base.fmax),
            steps: steps.unwrap_or(base.steps),
            max_step: opt.max_step.unwrap_or(base.max_step),
            initial_curvature: opt.initial_curvature.unwrap_or(base.initial_curvature),
            record_trajectory: base.record_trajectory,
        };
        let individual = with_overrides(
            OptimizationSettings::individual(),
            args.steps.or(opt.steps),
        );
        let complex_settings = with_overrides(
            OptimizationSettings::complex(),
            args.complex_steps.or(opt.complex_steps),
        );

        let defaults = GjfWriteOptions {
            title: core_config::DEFAULT_OUTPUT_TITLE.to_string(),
            ..GjfWriteOptions::default()
        };
        let output = GjfWriteOptions {
            title: out.title.unwrap_or(defaults.title),
            method: out.method.unwrap_or(defaults.method),
            basis: out.basis.unwrap_or(defaults.basis),
            keywords: out.keywords.unwrap_or(defaults.keywords),
            charge: out.charge.unwrap_or(defaults.charge),
            multiplicity: out.multiplicity.unwrap_or(defaults.multiplicity),
            nproc_shared: out.nproc_shared.unwrap_or(defaults.nproc_shared),
            memory: out.memory.unwrap_or(defaults.memory),
        };

        core_config::AnalysisConfigBuilder::new()
            .calculator(args.calculator.or(calc.kind).unwrap_or_default())
            .forcefield_path(args.forcefield.clone().or(calc.forcefield_path))
            .individual(individual)
            .complex(complex_settings)
            .separation(
                args.separation
                    .or(complex.separation)
                    .unwrap_or(core_config::DEFAULT_SEPARATION),
            )
            .seed(args.seed.or(props.seed))
            .record_trajectory(args.trajectory || out.trajectory.unwrap_or(false))
            .output(output)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let calc = || PartialCalculatorConfig::default();
            let opt = || PartialOptimizationConfig::default();
            let out = || PartialOutputConfig::default();

            match key {
                "calculator.kind" => {
                    self.calculator.get_or_insert_with(calc).kind = Some(parse_value(key, value)?)
                }
                "calculator.forcefield-path" => {
                    self.calculator.get_or_insert_with(calc).forcefield_path = Some(value.into())
                }
                "optimization.fmax" => {
                    self.optimization.get_or_insert_with(opt).fmax = Some(parse_value(key, value)?)
                }
                "optimization.steps" => {
                    self.optimization.get_or_insert_with(opt).steps = Some(parse_value(key, value)?)
                }
                "optimization.complex-steps" => {
                    self.optimization.get_or_insert_with(opt).complex_steps =
                        Some(parse_value(key, value)?)
                }
                "optimization.max-step" => {
                    self.optimization.get_or_insert_with(opt).max_step =
                        Some(parse_value(key, value)?)
                }
                "optimization.initial-curvature" => {
                    self.optimization.get_or_insert_with(opt).initial_curvature =
                        Some(parse_value(key, value)?)
                }
                "complex.separation" => {
                    self.complex.get_or_insert_with(Default::default).separation =
                        Some(parse_value(key, value)?)
                }
                "properties.seed" => {
                    self.properties.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value)?)
                }
                "output.title" => self.output.get_or_insert_with(out).title = Some(value.to_string()),
                "output.method" => self.output.get_or_insert_with(out).method = Some(value.to_string()),
                "output.basis" => self.output.get_or_insert_with(out).basis = Some(value.to_string()),
                "output.keywords" => {
                    self.output.get_or_insert_with(out).keywords = Some(value.to_string())
                }
                "output.memory" => self.output.get_or_insert_with(out).memory = Some(value.to_string()),
                "output.charge" => {
                    self.output.get_or_insert_with(out).charge = Some(parse_value(key, value)?)
                }
                "output.multiplicity" => {
                    self.output.get_or_insert_with(out).multiplicity = Some(parse_value(key, value)?)
                }
                "output.nproc-shared" => {
                    self.output.get_or_insert_with(out).nproc_shared = Some(parse_value(key, value)?)
                }
                "output.trajectory" => {
                    self.output.get_or_insert_with(out).trajectory = Some(parse_value(key, value)?)
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use once_cell::sync::Lazy;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn overrides_from(extra: &[&str]) -> RunOverrides {
        let mut args = vec!["molcomplex", "analyze", "-a", "a.gjf", "-b", "b.gjf"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Analyze(analyze) => analyze.overrides,
            _ => panic!("Expected 'analyze' subcommand"),
        }
    }

    #[test]
    fn empty_config_yields_defaults() {
        let config = PartialAnalysisConfig::load(None)
            .unwrap()
            .merge_with_cli(&overrides_from(&[]))
            .unwrap();

        assert_eq!(config.calculator, CalculatorKind::Classical);
        assert_eq!(config.individual, OptimizationSettings::individual());
        assert_eq!(config.complex, OptimizationSettings::complex());
        assert_eq!(config.separation, 3.0);
        assert_eq!(config.output.title, "Optimized Absorbent-Analyte Complex");
        assert!(config.forcefield_path.is_none());
        assert!(config.seed.is_none());
    }

    #[test]
    fn file_values_are_applied() {
        let path = write_config_file(
            "file_values.toml",
            r#"
            [calculator]
            kind = "none"
            forcefield-path = "ff.toml"

            [optimization]
            fmax = 0.1
            steps = 50
            complex-steps = 75
            max-step = 0.1

            [complex]
            separation = 4.5

            [properties]
            seed = 42

            [output]
            title = "Custom"
            basis = "def2-SVP"
            multiplicity = 2
            trajectory = true
            "#,
        );
        let config = PartialAnalysisConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&overrides_from(&[]))
            .unwrap();

        assert_eq!(config.calculator, CalculatorKind::None);
        assert_eq!(config.forcefield_path, Some(PathBuf::from("ff.toml")));
        assert_eq!(config.individual.fmax, 0.1);
        assert_eq!(config.individual.steps, 50);
        assert_eq!(config.complex.steps, 75);
        assert_eq!(config.complex.max_step, 0.1);
        assert_eq!(config.separation, 4.5);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.output.title, "Custom");
        assert_eq!(config.output.basis, "def2-SVP");
        assert_eq!(config.output.method, "B3LYP");
        assert_eq!(config.output.multiplicity, 2);
        assert!(config.record_trajectory);
        assert!(config.complex.record_trajectory);
    }

    #[test]
    fn cli_args_override_set_values_and_file() {
        let path = write_config_file(
            "precedence.toml",
            r#"
            [optimization]
            steps = 10
            complex-steps = 20

            [complex]
            separation = 5.0
            "#,
        );
        let overrides = overrides_from(&[
            "--steps",
            "30",
            "-S",
            "optimization.steps=40",
            "-S",
            "optimization.complex-steps=60",
        ]);
        let config = PartialAnalysisConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&overrides)
            .unwrap();

        assert_eq!(config.individual.steps, 30);
        assert_eq!(config.complex.steps, 60);
        assert_eq!(config.separation, 5.0);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let path = write_config_file("unknown.toml", "[optimization]\nmax-iterations = 3\n");
        let result = PartialAnalysisConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["optimization.steps", "optimization.steps=many", "nope.key=1"] {
            let result = PartialAnalysisConfig::default().merge_with_cli(&overrides_from(&["-S", bad]));
            assert!(matches!(result, Err(CliError::Config(_))), "accepted '{}'", bad);
        }
    }

    #[test]
    fn invalid_values_surface_builder_errors() {
        let result =
            PartialAnalysisConfig::default().merge_with_cli(&overrides_from(&["--separation", "0"]));
        match result {
            Err(CliError::Config(msg)) => assert!(msg.contains("separation")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
