//! Track stats for the whole dmrtree run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use unwrap::unwrap;

use crate::fit::RUN_STATS_FILENAME;

#[derive(Default, Deserialize, Serialize)]
pub struct InputStats {
    pub region_count: usize,

    /// Sample columns in the count tables
    pub sample_count: usize,

    /// Sample columns without a matching tree leaf label
    ///
    /// These columns are never pooled with other samples
    pub unmapped_sample_count: usize,

    pub tree_leaf_count: usize,
    pub tree_edge_count: usize,
}

#[derive(Default, Deserialize, Serialize)]
pub struct FitStats {
    pub chunk_count: usize,

    /// Regions whose best pattern contains at least one epimutation
    pub mutated_region_count: usize,

    pub total_fit_time_secs: f64,
}

#[derive(Default, Deserialize, Serialize)]
pub struct FitRunStats {
    pub input_stats: InputStats,
    pub fit_stats: FitStats,
}

/// Write run_stats structure out in json format
pub fn write_fit_run_stats(output_dir: &Utf8Path, run_stats: &FitRunStats) {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &run_stats).unwrap();
}
