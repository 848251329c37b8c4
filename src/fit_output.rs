//! Write epimutation fit results as tab separated tables
//!

use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use itertools::Itertools;
use log::info;
use serde::Serialize;
use simple_error::{SimpleResult, map_err_with};

use crate::parsimony_fit::RegionFit;
use crate::pattern_search::Candidate;
use crate::sample_tree::SampleTree;

/// Format a pattern as a comma separated list of 'child-parent' edge labels
///
/// The empty pattern is written as '.'
///
pub fn format_pattern(tree: &SampleTree, pattern: &[usize]) -> String {
    if pattern.is_empty() {
        ".".to_string()
    } else {
        pattern.iter().map(|&x| tree.get_edge_label(x)).join(",")
    }
}

#[derive(Serialize)]
struct PatternRecord<'a> {
    region: &'a str,
    mutation_count: usize,
    pattern: String,
    log_likelihood: f64,
}

impl<'a> PatternRecord<'a> {
    fn new(tree: &SampleTree, region: &'a str, candidate: &Candidate) -> Self {
        Self {
            region,
            mutation_count: candidate.mutation_count(),
            pattern: format_pattern(tree, &candidate.pattern),
            log_likelihood: candidate.log_likelihood,
        }
    }
}

#[derive(Serialize)]
struct TreeNodeRecord {
    node: usize,
    left_leaves: String,
    right_leaves: String,
}

fn get_tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer)
}

/// Write the best pattern of each region
fn write_best_patterns<W: Write>(
    writer: W,
    tree: &SampleTree,
    region_fits: &[RegionFit],
) -> csv::Result<()> {
    let mut writer = get_tsv_writer(writer);
    for fit in region_fits {
        writer.serialize(PatternRecord::new(tree, &fit.region_name, &fit.best))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write every retained candidate of each region, in order of mutation count
fn write_candidates<W: Write>(
    writer: W,
    tree: &SampleTree,
    region_fits: &[RegionFit],
) -> csv::Result<()> {
    let mut writer = get_tsv_writer(writer);
    for fit in region_fits {
        for candidate in fit.candidates.iter() {
            writer.serialize(PatternRecord::new(tree, &fit.region_name, candidate))?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write the leaves found below each branch of every merge node of the tree
fn write_tree_nodes<W: Write>(writer: W, tree: &SampleTree) -> csv::Result<()> {
    let mut writer = get_tsv_writer(writer);
    for leaf_sets in tree.get_merge_node_leaf_sets() {
        writer.serialize(TreeNodeRecord {
            node: leaf_sets.node,
            left_leaves: leaf_sets.left.iter().join(","),
            right_leaves: leaf_sets.right.iter().join(","),
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn create_output_file(filename: &Utf8Path, label: &str) -> SimpleResult<BufWriter<File>> {
    info!("Writing {label} to file: '{filename}'");
    let f = map_err_with!(
        File::create(filename),
        "Unable to create {label} file: '{filename}'"
    )?;
    Ok(BufWriter::new(f))
}

pub fn write_best_patterns_file(
    filename: &Utf8Path,
    tree: &SampleTree,
    region_fits: &[RegionFit],
) -> SimpleResult<()> {
    let label = "best patterns";
    let f = create_output_file(filename, label)?;
    map_err_with!(
        write_best_patterns(f, tree, region_fits),
        "Failed to write {label} file: '{filename}'"
    )
}

pub fn write_candidates_file(
    filename: &Utf8Path,
    tree: &SampleTree,
    region_fits: &[RegionFit],
) -> SimpleResult<()> {
    let label = "candidate patterns";
    let f = create_output_file(filename, label)?;
    map_err_with!(
        write_candidates(f, tree, region_fits),
        "Failed to write {label} file: '{filename}'"
    )
}

pub fn write_tree_nodes_file(filename: &Utf8Path, tree: &SampleTree) -> SimpleResult<()> {
    let label = "tree nodes";
    let f = create_output_file(filename, label)?;
    map_err_with!(
        write_tree_nodes(f, tree),
        "Failed to write {label} file: '{filename}'"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern_search::CandidateTable;
    use crate::sample_tree::tests::get_four_leaf_tree;

    fn get_test_region_fit() -> RegionFit {
        let mut candidates = CandidateTable::new(2);
        candidates.offer(&[], -20.5);
        candidates.offer(&[3], -12.25);
        candidates.offer(&[1, 3], -14.0);
        RegionFit {
            region_name: "chr1:100-200".to_string(),
            best: candidates.best().unwrap().clone(),
            candidates,
        }
    }

    #[test]
    fn test_format_pattern() {
        let tree = get_four_leaf_tree();
        assert_eq!(format_pattern(&tree, &[]), ".");
        assert_eq!(format_pattern(&tree, &[3]), "3-5");
        assert_eq!(format_pattern(&tree, &[0, 5]), "0-4,5-6");
    }

    #[test]
    fn test_write_best_patterns() {
        let tree = get_four_leaf_tree();
        let mut buffer = Vec::new();
        write_best_patterns(&mut buffer, &tree, &[get_test_region_fit()]).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "region\tmutation_count\tpattern\tlog_likelihood\nchr1:100-200\t1\t3-5\t-12.25\n"
        );
    }

    #[test]
    fn test_write_candidates() {
        let tree = get_four_leaf_tree();
        let mut buffer = Vec::new();
        write_candidates(&mut buffer, &tree, &[get_test_region_fit()]).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "chr1:100-200\t0\t.\t-20.5");
        assert_eq!(lines[3], "chr1:100-200\t2\t1-4,3-5\t-14.0");
    }

    #[test]
    fn test_write_tree_nodes() {
        let tree = get_four_leaf_tree();
        let mut buffer = Vec::new();
        write_tree_nodes(&mut buffer, &tree).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "node\tleft_leaves\tright_leaves\n4\t0\t1\n5\t2\t3\n6\t0,1\t2,3\n"
        );
    }
}
