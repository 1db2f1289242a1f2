use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct GjfMetadata {
    pub link0: Vec<String>,
    pub route: String,
    pub title: String,
    pub charge: i32,
    pub multiplicity: u32,
}

impl Default for GjfMetadata {
    fn default() -> Self {
        GjfWriteOptions::default().to_metadata()
    }
}

/// Job settings used when emitting a Gaussian input file.
#[derive(Debug, Clone, PartialEq)]
pub struct GjfWriteOptions {
    pub title: String,
    pub method: String,
    pub basis: String,
    pub keywords: String,
    pub charge: i32,
    pub multiplicity: u32,
    pub nproc_shared: u32,
    pub memory: String,
}

impl Default for GjfWriteOptions {
    fn default() -> Self {
        Self {
            title: "Optimized Complex".to_string(),
            method: "B3LYP".to_string(),
            basis: "6-31G(d)".to_string(),
            keywords: "opt freq".to_string(),
            charge: 0,
            multiplicity: 1,
            nproc_shared: 4,
            memory: "2GB".to_string(),
        }
    }
}

impl GjfWriteOptions {
    pub fn to_metadata(&self) -> GjfMetadata {
        let route = if self.keywords.is_empty() {
            format!("# {}/{}", self.method, self.basis)
        } else {
            format!("# {}/{} {}", self.method, self.basis, self.keywords)
        };
        GjfMetadata {
            link0: vec![
                format!("%nprocshared={}", self.nproc_shared),
                format!("%mem={}", self.memory),
            ],
            route,
            title: self.title.clone(),
            charge: self.charge,
            multiplicity: self.multiplicity,
        }
    }
}

#[derive(Debug, Error)]
pub enum GjfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: GjfParseErrorKind },
    #[error("Missing required section: {0}")]
    MissingSection(&'static str),
    #[error("Could not parse coordinates from .gjf input")]
    NoCoordinates,
}

#[derive(Debug, Error, PartialEq)]
pub enum GjfParseErrorKind {
    #[error("Expected a route line starting with '#' (found '{0}')")]
    ExpectedRoute(String),
    #[error("Invalid charge/multiplicity line '{0}'")]
    InvalidChargeMultiplicity(String),
    #[error("Invalid Cartesian atom line '{0}'")]
    InvalidAtomLine(String),
    #[error("Unknown element label '{0}'")]
    UnknownElement(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Link0,
    Route,
    Title,
    ChargeMultiplicity,
    Atoms,
    Done,
}

/// Parses `label x y z` or `label freeze x y z` into an atom.
fn parse_atom_line(line: &str) -> Result<Atom, GjfParseErrorKind> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let coords: &[&str] = match tokens.len() {
        4 => &tokens[1..4],
        5 if tokens[1].parse::<i32>().is_ok() => &tokens[2..5],
        _ => return Err(GjfParseErrorKind::InvalidAtomLine(line.to_string())),
    };

    let element: Element = tokens[0]
        .parse()
        .map_err(|_| GjfParseErrorKind::UnknownElement(tokens[0].to_string()))?;

    let mut xyz = [0.0f64; 3];
    for (slot, token) in xyz.iter_mut().zip(coords) {
        *slot = token
            .parse()
            .map_err(|_| GjfParseErrorKind::InvalidAtomLine(line.to_string()))?;
    }
    Ok(Atom::new(element, Point3::new(xyz[0], xyz[1], xyz[2])))
}

fn parse_charge_multiplicity(line: &str) -> Result<(i32, u32), GjfParseErrorKind> {
    let invalid = || GjfParseErrorKind::InvalidChargeMultiplicity(line.to_string());
    let values: Vec<i64> = line
        .split_whitespace()
        .map(|t| t.parse::<i64>().map_err(|_| invalid()))
        .collect::<Result<_, _>>()?;
    if values.len() < 2 || values.len() % 2 != 0 {
        return Err(invalid());
    }
    let charge = i32::try_from(values[0]).map_err(|_| invalid())?;
    let multiplicity = u32::try_from(values[1]).map_err(|_| invalid())?;
    if multiplicity == 0 {
        return Err(invalid());
    }
    Ok((charge, multiplicity))
}

pub struct GjfFile;

impl MolecularFile for GjfFile {
    type Metadata = GjfMetadata;
    type Error = GjfError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut section = Section::Link0;
        let mut link0 = Vec::new();
        let mut route_lines: Vec<String> = Vec::new();
        let mut title_lines: Vec<String> = Vec::new();
        let mut charge_multiplicity = None;
        let mut structure = Structure::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let raw = line_res?;
            let line_num = line_num + 1;
            let line = raw.trim();

            match section {
                Section::Link0 => {
                    if line.is_empty() || line.starts_with('!') {
                        continue;
                    }
                    if line.starts_with('%') {
                        link0.push(line.to_string());
                    } else if line.starts_with('#') {
                        route_lines.push(line.to_string());
                        section = Section::Route;
                    } else {
                        return Err(GjfError::Parse {
                            line: line_num,
                            kind: GjfParseErrorKind::ExpectedRoute(line.to_string()),
                        });
                    }
                }
                Section::Route => {
                    if line.is_empty() {
                        section = Section::Title;
                    } else {
                        route_lines.push(line.to_string());
                    }
                }
                Section::Title => {
                    if line.is_empty() {
                        if title_lines.is_empty() {
                            return Err(GjfError::MissingSection("title"));
                        }
                        section = Section::ChargeMultiplicity;
                    } else {
                        title_lines.push(line.to_string());
                    }
                }
                Section::ChargeMultiplicity => {
                    let parsed = parse_charge_multiplicity(line).map_err(|kind| {
                        GjfError::Parse {
                            line: line_num,
                            kind,
                        }
                    })?;
                    charge_multiplicity = Some(parsed);
                    section = Section::Atoms;
                }
                Section::Atoms => {
                    if line.is_empty() {
                        section = Section::Done;
                        continue;
                    }
                    let atom = parse_atom_line(line).map_err(|kind| GjfError::Parse {
                        line: line_num,
                        kind,
                    })?;
                    structure.push(atom);
                }
                Section::Done => break,
            }
        }

        if route_lines.is_empty() {
            return Err(GjfError::MissingSection("route"));
        }
        let (charge, multiplicity) =
            charge_multiplicity.ok_or(GjfError::MissingSection("charge and multiplicity"))?;
        if structure.is_empty() {
            return Err(GjfError::MissingSection("atom coordinates"));
        }

        let metadata = GjfMetadata {
            link0,
            route: route_lines.join(" "),
            title: title_lines.join(" "),
            charge,
            multiplicity,
        };
        Ok((structure, metadata))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for line in &metadata.link0 {
            writeln!(writer, "{}", line)?;
        }
        writeln!(writer, "{}", metadata.route)?;
        writeln!(writer)?;
        writeln!(writer, "{}", metadata.title)?;
        writeln!(writer)?;
        writeln!(writer, "{} {}", metadata.charge, metadata.multiplicity)?;
        for atom in structure.atoms() {
            writeln!(
                writer,
                "{:<2} {:>12.6} {:>12.6} {:>12.6}",
                atom.symbol(),
                atom.position.x,
                atom.position.y,
                atom.position.z
            )?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_structure_to(
        structure: &Structure,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        Self::write_to(structure, &GjfMetadata::default(), writer)
    }
}

/// Heuristic coordinate scraper for inputs the strict reader rejects.
///
/// Header lines (`%`, `#`) and blank lines are skipped. The first remaining line that
/// contains both a digit and a letter opens the coordinate section; from there on any
/// line with at least four tokens whose second to fourth tokens are numbers contributes
/// an atom. Lines that do not fit, including unknown element labels, are ignored.
///
/// # Errors
///
/// Returns [`GjfError::NoCoordinates`] if no atom could be recovered.
pub fn parse_gjf_lenient(reader: &mut impl BufRead) -> Result<Structure, GjfError> {
    let mut structure = Structure::new();
    let mut in_coordinates = false;

    for line_res in reader.lines() {
        let raw = line_res?;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
            continue;
        }

        if !in_coordinates {
            let has_digit = line.chars().any(|c| c.is_ascii_digit());
            let has_alpha = line.chars().any(|c| c.is_alphabetic());
            if !(has_digit && has_alpha) {
                continue;
            }
            in_coordinates = true;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }
        let coords: Result<Vec<f64>, _> = parts[1..4].iter().map(|t| t.parse::<f64>()).collect();
        let Ok(coords) = coords else {
            continue;
        };
        match parts[0].parse::<Element>() {
            Ok(element) => {
                structure.push(Atom::new(element, Point3::new(coords[0], coords[1], coords[2])));
            }
            Err(e) => debug!("Skipping coordinate line with {}", e),
        }
    }

    if structure.is_empty() {
        return Err(GjfError::NoCoordinates);
    }
    Ok(structure)
}

/// Reads a `.gjf` file, falling back to [`parse_gjf_lenient`] if strict parsing fails.
///
/// Returns the parsed structure and, when the strict reader succeeded, its metadata.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, the strict error if a well-formed
/// atom line names an unknown element (the lenient parser would drop that atom), or
/// the lenient parser's error if neither parser recovers any atoms.
pub fn read_gjf_with_fallback(
    path: &Path,
) -> Result<(Structure, Option<GjfMetadata>), GjfError> {
    let content = std::fs::read_to_string(path)?;
    match GjfFile::read_from(&mut content.as_bytes()) {
        Ok((structure, metadata)) => Ok((structure, Some(metadata))),
        Err(
            e @ GjfError::Parse {
                kind: GjfParseErrorKind::UnknownElement(_),
                ..
            },
        ) => Err(e),
        Err(e) => {
            warn!(
                "Strict parsing of {:?} failed ({}); retrying with the lenient parser.",
                path, e
            );
            let structure = parse_gjf_lenient(&mut content.as_bytes())?;
            Ok((structure, None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const WATER_GJF: &str = "%nprocshared=4
%mem=2GB
# B3LYP/6-31G(d) opt

Water analyte

0 1
O      0.000000    0.000000    0.119000
H      0.000000    0.757000   -0.476000
H      0.000000   -0.757000   -0.476000

";

    #[test]
    fn read_from_parses_standard_input_file() {
        let (structure, metadata) = GjfFile::read_from(&mut WATER_GJF.as_bytes()).unwrap();
        assert_eq!(structure.symbols(), vec!["O", "H", "H"]);
        assert_eq!(structure.atoms()[1].position, Point3::new(0.0, 0.757, -0.476));
        assert_eq!(metadata.link0, vec!["%nprocshared=4", "%mem=2GB"]);
        assert_eq!(metadata.route, "# B3LYP/6-31G(d) opt");
        assert_eq!(metadata.title, "Water analyte");
        assert_eq!(metadata.charge, 0);
        assert_eq!(metadata.multiplicity, 1);
    }

    #[test]
    fn read_from_accepts_freeze_codes_and_numeric_labels() {
        let input = "# HF/STO-3G\n\nt\n\n-1 2\n6 0 0.0 0.0 0.0\nC1 -1 1.0 0.0 0.0\n";
        let (structure, metadata) = GjfFile::read_from(&mut input.as_bytes()).unwrap();
        assert_eq!(structure.symbols(), vec!["C", "C"]);
        assert_eq!(structure.atoms()[1].position.x, 1.0);
        assert_eq!(metadata.charge, -1);
        assert_eq!(metadata.multiplicity, 2);
    }

    #[test]
    fn read_from_joins_multiline_route() {
        let input = "# B3LYP/6-31G(d)\n# opt freq\n\ntitle\n\n0 1\nH 0 0 0\nH 0 0 0.74\n";
        let (_, metadata) = GjfFile::read_from(&mut input.as_bytes()).unwrap();
        assert_eq!(metadata.route, "# B3LYP/6-31G(d) # opt freq");
    }

    #[test]
    fn read_from_stops_at_first_blank_after_atoms() {
        let input = "# opt\n\nt\n\n0 1\nH 0 0 0\nH 0 0 0.74\n\nB 0\nconnectivity junk\n";
        let (structure, _) = GjfFile::read_from(&mut input.as_bytes()).unwrap();
        assert_eq!(structure.len(), 2);
    }

    #[test]
    fn read_from_reports_line_of_bad_atom() {
        let input = "# opt\n\nt\n\n0 1\nH 0 0 0\nH 0 zero 0.74\n";
        let err = GjfFile::read_from(&mut input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            GjfError::Parse {
                line: 7,
                kind: GjfParseErrorKind::InvalidAtomLine(_)
            }
        ));
    }

    #[test]
    fn read_from_rejects_missing_route() {
        let input = "Benzene\n\n0 1\nC 0 0 0\n";
        let err = GjfFile::read_from(&mut input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            GjfError::Parse {
                line: 1,
                kind: GjfParseErrorKind::ExpectedRoute(_)
            }
        ));
    }

    #[test]
    fn read_from_rejects_bad_charge_multiplicity() {
        let input = "# opt\n\nt\n\n0\nH 0 0 0\n";
        let err = GjfFile::read_from(&mut input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            GjfError::Parse {
                line: 5,
                kind: GjfParseErrorKind::InvalidChargeMultiplicity(_)
            }
        ));
    }

    #[test]
    fn read_from_keeps_first_pair_of_fragment_charge_line() {
        let input = "# opt\n\nt\n\n0 1 0 1 0 1\nH 0 0 0\nH 0 0 0.74\n";
        let (structure, metadata) = GjfFile::read_from(&mut input.as_bytes()).unwrap();
        assert_eq!(structure.len(), 2);
        assert_eq!(metadata.charge, 0);
        assert_eq!(metadata.multiplicity, 1);
    }

    #[test]
    fn read_from_rejects_odd_count_charge_line() {
        let input = "# opt\n\nt\n\n0 1 0\nH 0 0 0\n";
        let err = GjfFile::read_from(&mut input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            GjfError::Parse {
                line: 5,
                kind: GjfParseErrorKind::InvalidChargeMultiplicity(_)
            }
        ));
    }

    #[test]
    fn read_from_requires_atoms() {
        let input = "# opt\n\nt\n\n0 1\n\n";
        let err = GjfFile::read_from(&mut input.as_bytes()).unwrap_err();
        assert!(matches!(err, GjfError::MissingSection("atom coordinates")));
    }

    #[test]
    fn write_to_matches_expected_layout() {
        let (structure, _) = GjfFile::read_from(&mut WATER_GJF.as_bytes()).unwrap();
        let options = GjfWriteOptions {
            title: "Optimized Absorbent-Analyte Complex".to_string(),
            ..Default::default()
        };
        let mut buffer = Vec::new();
        GjfFile::write_to(&structure, &options.to_metadata(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let expected = "%nprocshared=4
%mem=2GB
# B3LYP/6-31G(d) opt freq

Optimized Absorbent-Analyte Complex

0 1
O      0.000000     0.000000     0.119000
H      0.000000     0.757000    -0.476000
H      0.000000    -0.757000    -0.476000

";
        assert_eq!(text, expected);
    }

    #[test]
    fn written_file_is_readable_by_strict_parser() {
        let (structure, _) = GjfFile::read_from(&mut WATER_GJF.as_bytes()).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.gjf");
        GjfFile::write_structure_to_path(&structure, &path).unwrap();

        let (reread, metadata) = GjfFile::read_from_path(&path).unwrap();
        assert_eq!(reread, structure);
        assert_eq!(metadata.title, "Optimized Complex");
        assert_eq!(metadata.route, "# B3LYP/6-31G(d) opt freq");
    }

    #[test]
    fn lenient_parser_recovers_headerless_coordinates() {
        let input = "Water sample\nsome text\nO 0.0 0.0 0.119 extra\nH 0.0 0.757 -0.476\nnot a coordinate line\nH 0.0 -0.757 -0.476\n";
        let structure = parse_gjf_lenient(&mut input.as_bytes()).unwrap();
        assert_eq!(structure.symbols(), vec!["O", "H", "H"]);
    }

    #[test]
    fn lenient_parser_skips_unknown_labels() {
        let input = "X1 0 0 0\nO 0 0 0\nXx 1 1 1\n";
        let structure = parse_gjf_lenient(&mut input.as_bytes()).unwrap();
        assert_eq!(structure.symbols(), vec!["O"]);
    }

    #[test]
    fn lenient_parser_fails_without_coordinates() {
        let input = "%mem=1GB\n# opt\n\njust a title\n\n";
        let err = parse_gjf_lenient(&mut input.as_bytes()).unwrap_err();
        assert!(matches!(err, GjfError::NoCoordinates));
    }

    #[test]
    fn fallback_reader_uses_lenient_parser_for_malformed_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loose.gjf");
        fs::write(&path, "Loose file 1\nC 0.0 0.0 0.0\nO 0.0 0.0 1.2\n").unwrap();

        let (structure, metadata) = read_gjf_with_fallback(&path).unwrap();
        assert_eq!(structure.symbols(), vec!["C", "O"]);
        assert!(metadata.is_none());
    }

    #[test]
    fn fallback_reader_returns_metadata_for_valid_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("water.gjf");
        fs::write(&path, WATER_GJF).unwrap();

        let (structure, metadata) = read_gjf_with_fallback(&path).unwrap();
        assert_eq!(structure.len(), 3);
        assert_eq!(metadata.unwrap().title, "Water analyte");
    }

    #[test]
    fn fallback_reader_keeps_heavy_metal_atoms() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("silver_water.gjf");
        let input = "# B3LYP/LANL2DZ opt\n\nSilver dimer with water\n\n0 1\n\
                     Ag 0.0 0.0 0.0\nAg 0.0 0.0 2.53\n\
                     O 0.0 0.0 5.0\nH 0.0 0.757 5.6\nH 0.0 -0.757 5.6\n\n";
        fs::write(&path, input).unwrap();

        let (structure, metadata) = read_gjf_with_fallback(&path).unwrap();
        assert_eq!(structure.len(), 5);
        assert_eq!(structure.symbols(), vec!["Ag", "Ag", "O", "H", "H"]);
        assert!(metadata.is_some());
    }

    #[test]
    fn fallback_reader_refuses_to_drop_unknown_elements() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unknown.gjf");
        fs::write(
            &path,
            "# opt\n\nt\n\n0 1\nXq 0.0 0.0 0.0\nO 0.0 0.0 1.2\n\n",
        )
        .unwrap();

        let err = read_gjf_with_fallback(&path).unwrap_err();
        assert!(matches!(
            err,
            GjfError::Parse {
                line: 6,
                kind: GjfParseErrorKind::UnknownElement(_)
            }
        ));
    }

    #[test]
    fn fallback_reader_propagates_io_errors() {
        let dir = tempdir().unwrap();
        let err = read_gjf_with_fallback(&dir.path().join("missing.gjf")).unwrap_err();
        assert!(matches!(err, GjfError::Io(_)));
    }
}
