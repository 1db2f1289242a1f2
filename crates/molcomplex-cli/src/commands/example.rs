use crate::cli::ExampleArgs;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const ABSORBENT_FILE: &str = "absorbent.gjf";
pub const ANALYTE_FILE: &str = "analyte.gjf";

const BENZENE_ABSORBENT: &str = "%nprocshared=4
%mem=2GB
# B3LYP/6-31G(d) opt

Benzene absorbent

0 1
C      0.000000    1.396000    0.000000
C      1.209000    0.698000    0.000000
C      1.209000   -0.698000    0.000000
C      0.000000   -1.396000    0.000000
C     -1.209000   -0.698000    0.000000
C     -1.209000    0.698000    0.000000
H      0.000000    2.480000    0.000000
H      2.147000    1.240000    0.000000
H      2.147000   -1.240000    0.000000
H      0.000000   -2.480000    0.000000
H     -2.147000   -1.240000    0.000000
H     -2.147000    1.240000    0.000000

";

const WATER_ANALYTE: &str = "%nprocshared=4
%mem=2GB
# B3LYP/6-31G(d) opt

Water analyte

0 1
O      0.000000    0.000000    0.119000
H      0.000000    0.757000   -0.476000
H      0.000000   -0.757000   -0.476000

";

#[derive(Debug, PartialEq, Eq)]
pub enum SampleStatus {
    Written,
    Skipped,
}

/// Writes both sample inputs into `dir`, leaving existing files alone unless `force`.
pub fn write_samples(dir: &Path, force: bool) -> Result<Vec<(PathBuf, SampleStatus)>> {
    fs::create_dir_all(dir)?;
    let mut results = Vec::new();
    for (name, content) in [(ABSORBENT_FILE, BENZENE_ABSORBENT), (ANALYTE_FILE, WATER_ANALYTE)] {
        let path = dir.join(name);
        if path.exists() && !force {
            info!("{:?} already exists; leaving it unchanged.", path);
            results.push((path, SampleStatus::Skipped));
            continue;
        }
        fs::write(&path, content)?;
        info!("Wrote sample input {:?}", path);
        results.push((path, SampleStatus::Written));
    }
    Ok(results)
}

pub async fn run(args: ExampleArgs) -> Result<()> {
    for (path, status) in write_samples(&args.dir, args.force)? {
        match status {
            SampleStatus::Written => println!("Created example file {}", path.display()),
            SampleStatus::Skipped => {
                println!("Kept existing {} (use --force to overwrite)", path.display())
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use molcomplex::core::io::gjf::GjfFile;
    use molcomplex::core::io::traits::MolecularFile;
    use tempfile::tempdir;

    #[test]
    fn samples_are_valid_gjf_files() {
        let dir = tempdir().unwrap();
        let results = write_samples(dir.path(), false).unwrap();
        assert!(results.iter().all(|(_, s)| *s == SampleStatus::Written));

        let (benzene, meta) = GjfFile::read_from_path(dir.path().join(ABSORBENT_FILE)).unwrap();
        assert_eq!(benzene.len(), 12);
        assert_eq!(benzene.formula(), "C6H6");
        assert_eq!(meta.title, "Benzene absorbent");

        let (water, meta) = GjfFile::read_from_path(dir.path().join(ANALYTE_FILE)).unwrap();
        assert_eq!(water.formula(), "H2O");
        assert_eq!(meta.charge, 0);
        assert_eq!(meta.multiplicity, 1);
    }

    #[test]
    fn existing_files_are_kept_without_force() {
        let dir = tempdir().unwrap();
        let absorbent = dir.path().join(ABSORBENT_FILE);
        fs::write(&absorbent, "custom").unwrap();

        let results = write_samples(dir.path(), false).unwrap();
        assert_eq!(results[0].1, SampleStatus::Skipped);
        assert_eq!(results[1].1, SampleStatus::Written);
        assert_eq!(fs::read_to_string(&absorbent).unwrap(), "custom");

        let results = write_samples(dir.path(), true).unwrap();
        assert_eq!(results[0].1, SampleStatus::Written);
        assert!(fs::read_to_string(&absorbent).unwrap().contains("Benzene absorbent"));
    }
}
