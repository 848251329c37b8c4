use std::time::Instant;

use hhmmss::Hhmmss;
use log::{info, warn};
use simple_error::SimpleResult;

use crate::cli;
use crate::fit_output::{write_best_patterns_file, write_candidates_file, write_tree_nodes_file};
use crate::linkage::{read_linkage_file, read_sample_labels_file};
use crate::parsimony_fit::dmr_parsimony_fit;
use crate::region_table::{CountTable, check_matching_count_tables, read_count_table_file};
use crate::run_stats::{FitRunStats, FitStats, InputStats, write_fit_run_stats};
use crate::sample_tree::SampleTree;

pub const BEST_PATTERNS_FILENAME: &str = "best.patterns.tsv";
pub const CANDIDATES_FILENAME: &str = "candidates.tsv";
pub const RUN_STATS_FILENAME: &str = "run.stats.json";
pub const SETTINGS_FILENAME: &str = "fit.settings.json";
pub const TREE_NODES_FILENAME: &str = "tree.nodes.tsv";

/// Summarize the input tables against the sample tree
///
/// Table columns without a matching tree leaf are reported, since these samples are fit
/// independently of the tree.
///
fn get_input_stats(tree: &SampleTree, mc: &CountTable) -> InputStats {
    let unmapped_labels = mc
        .sample_labels
        .iter()
        .filter(|x| tree.get_leaf_node(x).is_none())
        .collect::<Vec<_>>();
    if !unmapped_labels.is_empty() {
        warn!(
            "{} sample columns do not match any tree leaf label, first unmatched sample: '{}'",
            unmapped_labels.len(),
            unmapped_labels[0]
        );
    }

    InputStats {
        region_count: mc.region_count(),
        sample_count: mc.sample_labels.len(),
        unmapped_sample_count: unmapped_labels.len(),
        tree_leaf_count: tree.leaf_count(),
        tree_edge_count: tree.edge_count(),
    }
}

pub fn run_fit(
    shared_settings: &cli::SharedSettings,
    settings: &cli::FitSettings,
) -> SimpleResult<()> {
    cli::write_fit_settings(&settings.output_dir, settings);

    let linkage = read_linkage_file(&settings.linkage_filename)?;
    let labels = match &settings.labels_filename {
        Some(x) => Some(read_sample_labels_file(x)?),
        None => None,
    };
    let mc = read_count_table_file(&settings.mc_filename, "methylated count")?;
    let cov = read_count_table_file(&settings.cov_filename, "coverage")?;
    check_matching_count_tables(&mc, &cov)?;

    let fit_settings = settings.get_parsimony_fit_settings(shared_settings.thread_count);

    let fit_start = Instant::now();
    let (tree, region_fits) =
        dmr_parsimony_fit(&linkage, labels.as_deref(), &mc, &cov, &fit_settings)?;
    let fit_time = fit_start.elapsed();
    info!("Finished epimutation pattern fit in {}", fit_time.hhmmssxxx());

    let input_stats = get_input_stats(&tree, &mc);

    let output_dir = &settings.output_dir;
    write_best_patterns_file(&output_dir.join(BEST_PATTERNS_FILENAME), &tree, &region_fits)?;
    write_candidates_file(&output_dir.join(CANDIDATES_FILENAME), &tree, &region_fits)?;
    write_tree_nodes_file(&output_dir.join(TREE_NODES_FILENAME), &tree)?;

    let fit_stats = FitStats {
        chunk_count: input_stats.region_count.div_ceil(fit_settings.chunk_size),
        mutated_region_count: region_fits
            .iter()
            .filter(|x| !x.best.pattern.is_empty())
            .count(),
        total_fit_time_secs: fit_time.as_secs_f64(),
    };

    let run_stats = FitRunStats {
        input_stats,
        fit_stats,
    };
    write_fit_run_stats(output_dir, &run_stats);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region_table::tests::get_test_table;
    use crate::sample_tree::tests::get_four_leaf_tree;

    #[test]
    fn test_get_input_stats() {
        let tree = get_four_leaf_tree();
        let mut mc = get_test_table(&[&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, 2.0, 3.0, 4.0, 5.0]]);
        mc.sample_labels[4] = "extra".to_string();

        let stats = get_input_stats(&tree, &mc);
        assert_eq!(stats.region_count, 2);
        assert_eq!(stats.sample_count, 5);
        assert_eq!(stats.unmapped_sample_count, 1);
        assert_eq!(stats.tree_leaf_count, 4);
        assert_eq!(stats.tree_edge_count, 6);
    }
}
