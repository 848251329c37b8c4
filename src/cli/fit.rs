use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail};
use unwrap::unwrap;

use super::utils::{check_input_file, check_optional_input_file};
use crate::fit::SETTINGS_FILENAME;
use crate::parsimony_fit::ParsimonyFitSettings;
use crate::pattern_search::PatternSearchSettings;

#[derive(Args, Deserialize, Serialize)]
pub struct FitSettings {
    /// Directory for all fit command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_fit_output"))]
    pub output_dir: Utf8PathBuf,

    /// Sample clustering tree in linkage matrix format
    ///
    /// Each row describes one merge as 4 whitespace separated columns: the two merged node ids,
    /// the merge distance, and the observation count. Leaves are numbered from 0 in sample order,
    /// and merge row i creates node id (leaf count + i). Lines starting with '#' are ignored.
    ///
    #[arg(long = "linkage", value_name = "FILE")]
    pub linkage_filename: Utf8PathBuf,

    /// Sample label for each tree leaf, one label per line in leaf order
    ///
    /// Leaves are labeled by their index when this is not given. Labels are matched against the
    /// sample columns of the count tables.
    ///
    #[arg(long = "labels", value_name = "FILE")]
    pub labels_filename: Option<Utf8PathBuf>,

    /// Methylated read counts per region and sample, as a tab separated table with a header
    ///
    /// The first column holds the region name, and each remaining column holds the counts of
    /// one sample. The file may be gzip compressed.
    ///
    #[arg(long = "mc", value_name = "FILE")]
    pub mc_filename: Utf8PathBuf,

    /// Total read coverage per region and sample, in the same layout as the methylated counts
    #[arg(long = "cov", value_name = "FILE")]
    pub cov_filename: Utf8PathBuf,

    /// Maximum number of epimutations (cut tree edges) considered in one region
    #[arg(long, default_value_t = 5)]
    pub max_mutation: usize,

    /// Prior probability of an epimutation on each tree edge
    #[arg(long, default_value_t = 0.1)]
    pub p_mutation: f64,

    /// Sub-trees with more edges than this are split at their most central edge, and each side
    /// is searched separately before the results are combined
    ///
    /// Higher values search more patterns exhaustively, at a cost that grows quickly with the
    /// edge count.
    ///
    #[arg(long, default_value_t = 12)]
    pub sub_tree_cutoff: usize,

    /// Number of regions handled by one worker task
    #[arg(hide = true, long, default_value_t = 10)]
    pub chunk_size: usize,
}

impl FitSettings {
    pub fn get_parsimony_fit_settings(&self, thread_count: usize) -> ParsimonyFitSettings {
        ParsimonyFitSettings {
            search: PatternSearchSettings {
                max_mutation: self.max_mutation,
                p_mutation: self.p_mutation,
                sub_tree_cutoff: self.sub_tree_cutoff,
            },
            thread_count,
            chunk_size: self.chunk_size,
        }
    }
}

fn validate_fit_setting_values(settings: &FitSettings) -> SimpleResult<()> {
    if !(settings.p_mutation > 0.0 && settings.p_mutation < 1.0) {
        bail!(
            "--p-mutation argument must be greater than 0 and less than 1, got {}",
            settings.p_mutation
        );
    }

    if settings.chunk_size == 0 {
        bail!("--chunk-size argument must be greater than 0");
    }

    Ok(())
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_fit_settings(settings: FitSettings) -> SimpleResult<FitSettings> {
    check_input_file(&settings.linkage_filename, "linkage")?;
    check_optional_input_file(settings.labels_filename.as_deref(), "sample labels")?;
    check_input_file(&settings.mc_filename, "methylated count")?;
    check_input_file(&settings.cov_filename, "coverage")?;

    validate_fit_setting_values(&settings)?;

    Ok(settings)
}

/// Write fit settings out in json format
pub fn write_fit_settings(output_dir: &Utf8Path, settings: &FitSettings) {
    use log::info;

    let filename = output_dir.join(SETTINGS_FILENAME);

    info!("Writing fit settings to file: '{filename}'");

    let f = unwrap!(
        std::fs::File::create(&filename),
        "Unable to create fit settings json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &settings).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_settings() -> FitSettings {
        FitSettings {
            output_dir: Utf8PathBuf::from("out"),
            linkage_filename: Utf8PathBuf::from("linkage.txt"),
            labels_filename: None,
            mc_filename: Utf8PathBuf::from("mc.tsv"),
            cov_filename: Utf8PathBuf::from("cov.tsv"),
            max_mutation: 5,
            p_mutation: 0.1,
            sub_tree_cutoff: 12,
            chunk_size: 10,
        }
    }

    #[test]
    fn test_validate_fit_setting_values() {
        let mut settings = get_test_settings();
        assert!(validate_fit_setting_values(&settings).is_ok());

        for p_mutation in [0.0, 1.0, -0.5, f64::NAN] {
            settings.p_mutation = p_mutation;
            assert!(validate_fit_setting_values(&settings).is_err());
        }

        settings.p_mutation = 0.5;
        settings.chunk_size = 0;
        assert!(validate_fit_setting_values(&settings).is_err());
    }

    #[test]
    fn test_missing_input_file() {
        let settings = get_test_settings();
        assert!(validate_and_fix_fit_settings(settings).is_err());
    }

    #[test]
    fn test_get_parsimony_fit_settings() {
        let mut settings = get_test_settings();
        settings.max_mutation = 3;
        let fit_settings = settings.get_parsimony_fit_settings(8);
        assert_eq!(fit_settings.search.max_mutation, 3);
        assert_eq!(fit_settings.search.sub_tree_cutoff, 12);
        assert_eq!(fit_settings.thread_count, 8);
        assert_eq!(fit_settings.chunk_size, 10);
    }
}
