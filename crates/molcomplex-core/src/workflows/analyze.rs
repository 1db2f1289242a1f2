use super::complex::create_complex;
use crate::core::forcefield::calculator::{CalculatorKind, build_calculator};
use crate::core::forcefield::params::ForcefieldParams;
use crate::core::io::gjf::{GjfFile, GjfMetadata, GjfWriteOptions, read_gjf_with_fallback};
use crate::core::io::traits::MolecularFile;
use crate::core::io::xyz::{XyzError, XyzFile};
use crate::core::models::structure::Structure;
use crate::core::properties::report::{PropertyReport, estimate_properties};
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::optimizer::{Frame, OptimizationOutcome, optimize_structure, optimize_with};
use crate::engine::progress::ProgressReporter;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub absorbent: Structure,
    pub analyte: Structure,
    /// Header sections of the inputs, when they parsed strictly.
    pub absorbent_metadata: Option<GjfMetadata>,
    pub analyte_metadata: Option<GjfMetadata>,
    pub absorbent_optimization: OptimizationOutcome,
    pub analyte_optimization: OptimizationOutcome,
    pub initial_complex: Structure,
    pub complex_optimization: OptimizationOutcome,
    pub properties: PropertyReport,
}

impl AnalysisResult {
    pub fn optimized_absorbent(&self) -> &Structure {
        &self.absorbent_optimization.structure
    }

    pub fn optimized_analyte(&self) -> &Structure {
        &self.analyte_optimization.structure
    }

    pub fn final_complex(&self) -> &Structure {
        &self.complex_optimization.structure
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub gjf: PathBuf,
    pub properties_text: PathBuf,
    pub properties_json: PathBuf,
    pub trajectories: Vec<PathBuf>,
}

fn read_input(path: &Path, role: &'static str) -> Result<(Structure, Option<GjfMetadata>), EngineError> {
    let (structure, metadata) = read_gjf_with_fallback(path).map_err(|source| EngineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if structure.is_empty() {
        return Err(EngineError::EmptyStructure { role });
    }
    info!("{}: {} atoms ({})", role, structure.len(), structure.formula());
    Ok((structure, metadata))
}

/// Keeps the pipeline going when an optimization fails.
fn optimized_or_input(
    role: &str,
    structure: &Structure,
    result: Result<OptimizationOutcome, EngineError>,
) -> OptimizationOutcome {
    result.unwrap_or_else(|e| {
        error!("Optimization of the {} failed: {}. Continuing with the unoptimized structure.", role, e);
        OptimizationOutcome::unchanged(structure)
    })
}

/// Runs parsing, both individual relaxations, complex assembly, the complex
/// relaxation and property estimation. Nothing is written to disk.
#[instrument(skip_all, name = "analysis_workflow", fields(absorbent = ?absorbent_path, analyte = ?analyte_path))]
pub fn run(
    absorbent_path: &Path,
    analyte_path: &Path,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<AnalysisResult, EngineError> {
    let (absorbent, absorbent_metadata, analyte, analyte_metadata) =
        reporter.phase("Parsing inputs", || -> Result<_, EngineError> {
            info!("Step 1: parsing input structures");
            let (absorbent, absorbent_metadata) = read_input(absorbent_path, "absorbent")?;
            let (analyte, analyte_metadata) = read_input(analyte_path, "analyte")?;
            Ok((absorbent, absorbent_metadata, analyte, analyte_metadata))
        })?;

    let params = match config.calculator {
        CalculatorKind::None => None,
        CalculatorKind::Classical => Some(ForcefieldParams::load_or_builtin(
            config.forcefield_path.as_deref(),
        )?),
    };
    let relax = |structure: &Structure| match &params {
        Some(params) => {
            optimize_structure(structure, config.calculator, params, &config.individual, reporter)
        }
        None => optimize_with(None, structure, &config.individual, reporter),
    };

    let (absorbent_optimization, analyte_optimization) =
        reporter.phase("Optimizing individual structures", || {
            info!("Step 2: optimizing individual structures");
            let absorbent_result = relax(&absorbent);
            let analyte_result = relax(&analyte);
            (
                optimized_or_input("absorbent", &absorbent, absorbent_result),
                optimized_or_input("analyte", &analyte, analyte_result),
            )
        });

    let initial_complex = reporter.phase("Creating complex", || {
        info!("Step 3: creating initial complex");
        create_complex(
            &absorbent_optimization.structure,
            &analyte_optimization.structure,
            config.separation,
        )
    })?;

    let calculator = params
        .as_ref()
        .and_then(|params| build_calculator(config.calculator, &initial_complex, params));

    let complex_optimization = reporter.phase("Optimizing complex", || {
        info!("Step 4: optimizing complex ({} atoms)", initial_complex.len());
        let result = optimize_with(calculator.as_deref(), &initial_complex, &config.complex, reporter);
        optimized_or_input("complex", &initial_complex, result)
    });

    let properties = reporter.phase("Calculating properties", || {
        info!("Step 5: calculating molecular properties");
        estimate_properties(&complex_optimization.structure, calculator.as_deref(), config.seed)
    });

    Ok(AnalysisResult {
        absorbent,
        analyte,
        absorbent_metadata,
        analyte_metadata,
        absorbent_optimization,
        analyte_optimization,
        initial_complex,
        complex_optimization,
        properties,
    })
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn write_trajectory(frames: &[Frame], path: &Path) -> Result<(), EngineError> {
    let to_err = |source: XyzError| EngineError::WriteTrajectory {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|e| to_err(e.into()))?;
    let mut writer = BufWriter::new(file);
    for frame in frames {
        let comment = format!(
            "step={} energy={:.6} max_force={:.6}",
            frame.step, frame.energy, frame.max_force
        );
        XyzFile::write_to(&frame.structure, &comment, &mut writer).map_err(to_err)?;
    }
    writer.flush().map_err(|e| to_err(e.into()))
}

fn write_file(path: PathBuf, contents: &str) -> Result<PathBuf, EngineError> {
    fs::write(&path, contents).map_err(|source| EngineError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Writes `<prefix>_optimized.gjf`, `<prefix>_properties.txt`,
/// `<prefix>_properties.json` and any recorded trajectories as
/// `<prefix>_{absorbent,analyte,complex}.xyz`.
#[instrument(skip_all, fields(prefix = ?prefix))]
pub fn write_outputs(
    result: &AnalysisResult,
    prefix: &Path,
    options: &GjfWriteOptions,
) -> Result<OutputPaths, EngineError> {
    info!("Step 6: saving results");
    if let Some(parent) = prefix.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| EngineError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let gjf = with_suffix(prefix, "_optimized.gjf");
    GjfFile::write_to_path(result.final_complex(), &options.to_metadata(), &gjf).map_err(|source| {
        EngineError::WriteGjf {
            path: gjf.clone(),
            source,
        }
    })?;

    let properties_text = write_file(with_suffix(prefix, "_properties.txt"), &result.properties.to_text())?;
    let properties_json = write_file(with_suffix(prefix, "_properties.json"), &result.properties.to_json()?)?;

    let mut trajectories = Vec::new();
    for (role, outcome) in [
        ("absorbent", &result.absorbent_optimization),
        ("analyte", &result.analyte_optimization),
        ("complex", &result.complex_optimization),
    ] {
        if outcome.trajectory.is_empty() {
            continue;
        }
        let path = with_suffix(prefix, &format!("_{}.xyz", role));
        write_trajectory(&outcome.trajectory, &path)?;
        trajectories.push(path);
    }

    info!(
        "Analysis complete. Results saved as {:?} and {:?}",
        gjf, properties_text
    );
    Ok(OutputPaths {
        gjf,
        properties_text,
        properties_json,
        trajectories,
    })
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// One absorbent/analyte combination found by [`batch_pairs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairJob {
    pub absorbent: PathBuf,
    pub analyte: PathBuf,
    /// `<absorbent-stem>_<analyte-stem>`
    pub prefix: String,
}

/// Every ordered pair of distinct `.gjf` files in `dir`, sorted by file name.
pub fn batch_pairs(dir: &Path) -> Result<Vec<PairJob>, EngineError> {
    let io_err = |source: std::io::Error| EngineError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_gjf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gjf"));
        if is_gjf && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    // `x.gjf` and `x.GJF` would share a stem and so an output prefix.
    let mut seen_stems = HashSet::new();
    files.retain(|path| {
        let unique = seen_stems.insert(stem_of(path));
        if !unique {
            warn!("Skipping {:?}: another input has the same file stem.", path);
        }
        unique
    });

    let mut jobs = Vec::new();
    for absorbent in &files {
        for analyte in files.iter().filter(|a| *a != absorbent) {
            jobs.push(PairJob {
                absorbent: absorbent.clone(),
                analyte: analyte.clone(),
                prefix: format!("{}_{}", stem_of(absorbent), stem_of(analyte)),
            });
        }
    }
    Ok(jobs)
}
