//! Per-region count table input
//!

use std::io::Read;

use camino::Utf8Path;
use csv::{ReaderBuilder, Trim};
use log::info;
use simple_error::{SimpleResult, bail, map_err_with};

use crate::utils::open_text_reader;

/// Numeric table with one row per region and one column per sample
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CountTable {
    pub region_names: Vec<String>,
    pub sample_labels: Vec<String>,

    /// Row-major values, one row per region
    pub values: Vec<Vec<f64>>,
}

impl CountTable {
    pub fn region_count(&self) -> usize {
        self.region_names.len()
    }
}

/// Parse a tab-delimited count table
///
/// The header line holds the region index name followed by the sample labels. Each following
/// line holds the region name followed by one value per sample.
///
/// # Arguments
/// * `label` - Describes the input source in error messages
///
pub fn parse_count_table(reader: impl Read, label: &str) -> SimpleResult<CountTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .delimiter(b'\t')
        .from_reader(reader);

    let header = map_err_with!(rdr.headers(), "Failed to parse header from {label}")?;
    if header.len() < 2 {
        bail!("Header of {label} has no sample columns");
    }
    let sample_labels = header.iter().skip(1).map(String::from).collect::<Vec<_>>();

    let mut table = CountTable {
        region_names: Vec::new(),
        sample_labels,
        values: Vec::new(),
    };

    for (line_index, result) in rdr.records().enumerate() {
        // Line numbers account for the header
        let line_number = line_index + 2;
        let record = map_err_with!(result, "Failed to parse line {line_number} from {label}")?;

        let mut fields = record.iter();
        let Some(region_name) = fields.next() else {
            bail!("Missing region name on line {line_number} from {label}");
        };
        let row = fields
            .map(|x| {
                map_err_with!(
                    x.parse::<f64>(),
                    "Can't parse value '{x}' on line {line_number} from {label}"
                )
            })
            .collect::<SimpleResult<Vec<_>>>()?;

        table.region_names.push(region_name.to_string());
        table.values.push(row);
    }

    Ok(table)
}

pub fn read_count_table_file(filename: &Utf8Path, label: &str) -> SimpleResult<CountTable> {
    info!("Reading {label} table from file '{filename}'");
    let reader = open_text_reader(filename, label)?;
    let table = parse_count_table(reader, &format!("{label} table file '{filename}'"))?;
    info!(
        "Read {} regions over {} samples from {label} table",
        table.region_count(),
        table.sample_labels.len()
    );
    Ok(table)
}

/// Check that the methylated count and coverage tables describe the same regions and samples
pub fn check_matching_count_tables(mc: &CountTable, cov: &CountTable) -> SimpleResult<()> {
    if mc.sample_labels != cov.sample_labels {
        bail!("Methylated count and coverage tables have different sample columns");
    }
    if mc.region_names.len() != cov.region_names.len() {
        bail!(
            "Methylated count table has {} regions, but coverage table has {}",
            mc.region_names.len(),
            cov.region_names.len()
        );
    }
    if let Some((mc_name, cov_name)) = mc
        .region_names
        .iter()
        .zip(cov.region_names.iter())
        .find(|(a, b)| a != b)
    {
        bail!(
            "Methylated count and coverage tables have mismatched region order at regions '{mc_name}' and '{cov_name}'"
        );
    }
    Ok(())
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Build a table with regions named "r0", "r1", ... and samples named by index
    pub fn get_test_table(values: &[&[f64]]) -> CountTable {
        let sample_count = values.first().map(|x| x.len()).unwrap_or(0);
        CountTable {
            region_names: (0..values.len()).map(|x| format!("r{x}")).collect(),
            sample_labels: (0..sample_count).map(|x| x.to_string()).collect(),
            values: values.iter().map(|x| x.to_vec()).collect(),
        }
    }

    #[test]
    fn test_parse_count_table() {
        let text = b"dmr\ts1\ts2\ts3\nchr1-1\t1\t0\t5\nchr1-2\t2.5\t3\t 4\n";
        let table = parse_count_table(&text[..], "test").unwrap();
        assert_eq!(table.sample_labels, vec!["s1", "s2", "s3"]);
        assert_eq!(table.region_names, vec!["chr1-1", "chr1-2"]);
        assert_eq!(table.values[1], vec![2.5, 3.0, 4.0]);
    }

    #[test]
    fn test_parse_count_table_errors() {
        // Ragged row
        let text = b"dmr\ts1\ts2\nr1\t1\n";
        assert!(parse_count_table(&text[..], "test").is_err());

        // Non-numeric value
        let text = b"dmr\ts1\ts2\nr1\t1\tx\n";
        assert!(parse_count_table(&text[..], "test").is_err());

        // No sample columns
        let text = b"dmr\nr1\n";
        assert!(parse_count_table(&text[..], "test").is_err());
    }

    #[test]
    fn test_check_matching_count_tables() {
        let mc = get_test_table(&[&[1.0, 2.0], &[0.0, 1.0]]);
        let cov = get_test_table(&[&[5.0, 5.0], &[5.0, 5.0]]);
        assert!(check_matching_count_tables(&mc, &cov).is_ok());

        let mut cov_reordered = cov.clone();
        cov_reordered.region_names.swap(0, 1);
        assert!(check_matching_count_tables(&mc, &cov_reordered).is_err());

        let mut cov_relabeled = cov.clone();
        cov_relabeled.sample_labels[1] = "x".to_string();
        assert!(check_matching_count_tables(&mc, &cov_relabeled).is_err());
    }
}
