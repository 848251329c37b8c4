//! Hierarchical clustering linkage input
//!

use std::io::BufRead;

use camino::Utf8Path;
use log::info;
use simple_error::{SimpleResult, bail, map_err_with};

use crate::utils::open_text_reader;

/// One merge step of an agglomerative clustering
///
/// Ids below the leaf count refer to samples, higher ids refer to the node created by an
/// earlier merge row.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergeRecord {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub observation_count: usize,
}

/// Merge rows of a clustering over `n` samples, in merge order (`n - 1` rows)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Linkage {
    pub merges: Vec<MergeRecord>,
}

impl Linkage {
    pub fn leaf_count(&self) -> usize {
        self.merges.len() + 1
    }
}

/// Linkage matrices are usually written out as floats, so accept any integral float value as an id
fn parse_linkage_id(word: &str, line_number: usize, label: &str) -> SimpleResult<usize> {
    let value = map_err_with!(
        word.parse::<f64>(),
        "Can't parse id '{word}' on line {line_number} of {label}"
    )?;
    if value < 0.0 || value.fract() != 0.0 {
        bail!("Invalid id '{word}' on line {line_number} of {label}");
    }
    Ok(value as usize)
}

/// Parse linkage rows from whitespace delimited text
///
/// Each non-empty line not starting with '#' must hold 4 values: left id, right id, merge distance
/// and merged observation count.
///
/// # Arguments
/// * `label` - Describes the input source in error messages
///
pub fn parse_linkage(reader: impl BufRead, label: &str) -> SimpleResult<Linkage> {
    let mut merges = Vec::new();
    for (line_index, line) in reader.lines().enumerate() {
        let line_number = line_index + 1;
        let line = map_err_with!(line, "Can't read line {line_number} of {label}")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let words = line.split_whitespace().collect::<Vec<_>>();
        if words.len() != 4 {
            bail!(
                "Expected 4 columns but found {} on line {line_number} of {label}",
                words.len()
            );
        }

        let distance = map_err_with!(
            words[2].parse::<f64>(),
            "Can't parse merge distance on line {line_number} of {label}"
        )?;
        merges.push(MergeRecord {
            left: parse_linkage_id(words[0], line_number, label)?,
            right: parse_linkage_id(words[1], line_number, label)?,
            distance,
            observation_count: parse_linkage_id(words[3], line_number, label)?,
        });
    }

    if merges.is_empty() {
        bail!("No merge rows found in {label}");
    }
    Ok(Linkage { merges })
}

pub fn read_linkage_file(filename: &Utf8Path) -> SimpleResult<Linkage> {
    info!("Reading linkage from file '{filename}'");
    let reader = open_text_reader(filename, "linkage")?;
    parse_linkage(reader, &format!("linkage file '{filename}'"))
}

/// Read one sample label per non-empty line
pub fn read_sample_labels_file(filename: &Utf8Path) -> SimpleResult<Vec<String>> {
    info!("Reading sample labels from file '{filename}'");
    let reader = open_text_reader(filename, "sample labels")?;
    let mut labels = Vec::new();
    for line in reader.lines() {
        let line = map_err_with!(line, "Can't read sample labels file '{filename}'")?;
        let line = line.trim();
        if !line.is_empty() {
            labels.push(line.to_string());
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_linkage() {
        let text = b"# scipy linkage\n\
            0.000000000000000000e+00 1.000000000000000000e+00 1.0 2.0\n\
            2\t3\t1.0\t2\n\
            \n\
            4 5 2.5 4\n";
        let linkage = parse_linkage(&text[..], "test").unwrap();
        assert_eq!(linkage.leaf_count(), 4);
        assert_eq!(
            linkage.merges[2],
            MergeRecord {
                left: 4,
                right: 5,
                distance: 2.5,
                observation_count: 4
            }
        );
        assert_eq!(linkage.merges[0].right, 1);
    }

    #[test]
    fn test_parse_linkage_errors() {
        assert!(parse_linkage(&b"0 1 1.0\n"[..], "test").is_err());
        assert!(parse_linkage(&b"0 1.5 1.0 2\n"[..], "test").is_err());
        assert!(parse_linkage(&b"0 -1 1.0 2\n"[..], "test").is_err());
        assert!(parse_linkage(&b"# empty\n"[..], "test").is_err());
    }
}
