use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Unexpected end of file: expected {expected} atoms, found {found}")]
    Truncated { expected: usize, found: usize },
}

/// XYZ format. The metadata is the free-form comment line of the frame.
pub struct XyzFile;

impl MolecularFile for XyzFile {
    type Metadata = String;
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut lines = reader.lines();

        let count_line = lines.next().transpose()?.unwrap_or_default();
        let expected: usize = count_line.trim().parse().map_err(|_| XyzError::Parse {
            line: 1,
            message: format!("invalid atom count '{}'", count_line.trim()),
        })?;
        let comment = lines.next().transpose()?.unwrap_or_default();

        let mut structure = Structure::new();
        for (offset, line_res) in lines.take(expected).enumerate() {
            let line = line_res?;
            let line_num = offset + 3;
            let parse_err = |message: String| XyzError::Parse {
                line: line_num,
                message,
            };

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 4 {
                return Err(parse_err(format!("expected 4 columns, found {}", tokens.len())));
            }
            let element: Element = tokens[0].parse().map_err(|e| parse_err(format!("{}", e)))?;
            let mut xyz = [0.0f64; 3];
            for (slot, token) in xyz.iter_mut().zip(&tokens[1..4]) {
                *slot = token
                    .parse()
                    .map_err(|_| parse_err(format!("invalid coordinate '{}'", token)))?;
            }
            structure.push(Atom::new(element, Point3::new(xyz[0], xyz[1], xyz[2])));
        }

        if structure.len() != expected {
            return Err(XyzError::Truncated {
                expected,
                found: structure.len(),
            });
        }
        Ok((structure, comment.trim_end().to_string()))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writeln!(writer, "{}", structure.len())?;
        writeln!(writer, "{}", metadata.replace('\n', " "))?;
        for atom in structure.atoms() {
            writeln!(
                writer,
                "{:<2} {:>15.8} {:>15.8} {:>15.8}",
                atom.symbol(),
                atom.position.x,
                atom.position.y,
                atom.position.z
            )?;
        }
        Ok(())
    }

    fn write_structure_to(
        structure: &Structure,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        Self::write_to(structure, &structure.formula(), writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn co() -> Structure {
        Structure::from_parts(
            &["C", "O"],
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.128)],
        )
        .unwrap()
    }

    #[test]
    fn frames_can_be_concatenated_into_a_trajectory() {
        let mut buffer = Vec::new();
        XyzFile::write_to(&co(), &"step=0 energy=1.0".to_string(), &mut buffer).unwrap();
        XyzFile::write_to(&co(), &"step=1 energy=0.5".to_string(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(text.lines().count(), 8);
        assert!(text.starts_with("2\nstep=0 energy=1.0\nC "));
        assert!(text.contains("\n2\nstep=1 energy=0.5\n"));
    }

    #[test]
    fn read_from_returns_first_frame_and_comment() {
        let mut buffer = Vec::new();
        XyzFile::write_to(&co(), &"first".to_string(), &mut buffer).unwrap();
        XyzFile::write_to(&co(), &"second".to_string(), &mut buffer).unwrap();

        let (structure, comment) = XyzFile::read_from(&mut buffer.as_slice()).unwrap();
        assert_eq!(structure, co());
        assert_eq!(comment, "first");
    }

    #[test]
    fn default_comment_is_formula() {
        let mut buffer = Vec::new();
        XyzFile::write_structure_to(&co(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().nth(1), Some("CO"));
    }

    #[test]
    fn read_from_detects_truncated_frame() {
        let input = "3\ncomment\nC 0 0 0\nO 0 0 1.1\n";
        let err = XyzFile::read_from(&mut input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            XyzError::Truncated {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn read_from_rejects_bad_count_line() {
        let err = XyzFile::read_from(&mut "abc\n".as_bytes()).unwrap_err();
        assert!(matches!(err, XyzError::Parse { line: 1, .. }));
    }
}
