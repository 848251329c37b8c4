//! Search for the most likely epimutation pattern at each mutation count
//!
//! Small sub-trees are searched exhaustively. Larger sub-trees are cut at their most central edge,
//! each side is searched independently, and the best patterns of both sides are then combined and
//! rescored over the whole sub-tree.
//!

use itertools::Itertools;
use log::debug;

use crate::beta_binomial::mutation_prior;
use crate::pattern_score::PatternGrouping;
use crate::region_block::RegionView;
use crate::sample_tree::{SampleTree, SubTree};
use crate::utils::first_max_index;

#[derive(Clone, Debug)]
pub struct PatternSearchSettings {
    /// Maximum number of edges cut in one pattern
    pub max_mutation: usize,

    /// Prior probability of a mutation on each edge
    pub p_mutation: f64,

    /// Sub-trees with more edges than this are split before searching
    pub sub_tree_cutoff: usize,
}

impl Default for PatternSearchSettings {
    fn default() -> Self {
        Self {
            max_mutation: 5,
            p_mutation: 0.1,
            sub_tree_cutoff: 12,
        }
    }
}

/// A mutation pattern, as a sorted list of edge ids, and its log-likelihood
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub pattern: Vec<usize>,
    pub log_likelihood: f64,
}

impl Candidate {
    pub fn mutation_count(&self) -> usize {
        self.pattern.len()
    }
}

/// Best candidate pattern found for each mutation count of one region
///
/// Slot `k` holds the best pattern with `k` edges, from 0 up to the maximum mutation count
/// searched.
///
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateTable {
    slots: Vec<Option<Candidate>>,
}

impl CandidateTable {
    pub fn new(max_mutation_count: usize) -> Self {
        Self {
            slots: vec![None; max_mutation_count + 1],
        }
    }

    pub fn max_mutation_count(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn get(&self, mutation_count: usize) -> Option<&Candidate> {
        self.slots.get(mutation_count)?.as_ref()
    }

    /// Filled slots, in order of mutation count
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.slots.iter().flatten()
    }

    /// Store the pattern if its slot is empty or it beats the current slot candidate
    ///
    /// Equal likelihoods keep the earlier candidate.
    ///
    pub fn offer(&mut self, pattern: &[usize], log_likelihood: f64) {
        let slot = &mut self.slots[pattern.len()];
        if let Some(candidate) = slot {
            if !(log_likelihood > candidate.log_likelihood) {
                return;
            }
        }
        *slot = Some(Candidate {
            pattern: pattern.to_vec(),
            log_likelihood,
        });
    }

    /// Most likely candidate over all mutation counts, ties go to the lowest mutation count
    pub fn best(&self) -> Option<&Candidate> {
        let candidates = self.iter().collect::<Vec<_>>();
        let index = first_max_index(candidates.iter().map(|x| x.log_likelihood))?;
        Some(candidates[index])
    }
}

/// Prior for every mutation count allowed in a sub-tree
fn get_mutation_priors(
    settings: &PatternSearchSettings,
    edge_count: usize,
    max_mutation_count: usize,
) -> Vec<f64> {
    (0..=max_mutation_count)
        .map(|k| mutation_prior(k, settings.p_mutation, edge_count))
        .collect()
}

/// Score every pattern of up to the maximum mutation count in the sub-tree
///
fn search_patterns_exhaustive(
    tree: &SampleTree,
    sub_tree: &SubTree,
    view: &RegionView,
    settings: &PatternSearchSettings,
) -> Vec<CandidateTable> {
    let edge_count = sub_tree.edge_count();
    let max_mutation_count = std::cmp::min(edge_count, settings.max_mutation);
    let priors = get_mutation_priors(settings, edge_count, max_mutation_count);

    let mut tables = vec![CandidateTable::new(max_mutation_count); view.region_count()];
    for (mutation_count, prior) in priors.iter().enumerate() {
        for pattern in sub_tree.edges.iter().copied().combinations(mutation_count) {
            let grouping = PatternGrouping::new(tree, sub_tree, view, &pattern);
            for (region_index, table) in tables.iter_mut().enumerate() {
                let ll = grouping.get_log_likelihood(view, region_index) + prior;
                table.offer(&pattern, ll);
            }
        }
    }
    tables
}

/// Combine the best patterns from each side of a split, with or without the bridge edge, and
/// rescore the combined patterns over the full sub-tree
///
fn combine_split_patterns(
    tree: &SampleTree,
    sub_tree: &SubTree,
    view: &RegionView,
    settings: &PatternSearchSettings,
    bridge_edge: usize,
    left_tables: &[CandidateTable],
    right_tables: &[CandidateTable],
) -> Vec<CandidateTable> {
    let edge_count = sub_tree.edge_count();
    let max_mutation_count = std::cmp::min(edge_count, settings.max_mutation);
    let priors = get_mutation_priors(settings, edge_count, max_mutation_count);

    let mut tables = Vec::with_capacity(view.region_count());
    for (region_index, (left_table, right_table)) in
        left_tables.iter().zip(right_tables.iter()).enumerate()
    {
        let mut table = CandidateTable::new(max_mutation_count);
        for left in left_table.iter() {
            for right in right_table.iter() {
                for cut_bridge in [false, true] {
                    let mutation_count =
                        left.mutation_count() + right.mutation_count() + cut_bridge as usize;
                    if mutation_count > max_mutation_count {
                        continue;
                    }

                    let mut pattern = Vec::with_capacity(mutation_count);
                    pattern.extend_from_slice(&left.pattern);
                    pattern.extend_from_slice(&right.pattern);
                    if cut_bridge {
                        pattern.push(bridge_edge);
                    }
                    pattern.sort_unstable();

                    let grouping = PatternGrouping::new(tree, sub_tree, view, &pattern);
                    let ll = grouping.get_log_likelihood(view, region_index)
                        + priors[mutation_count];
                    table.offer(&pattern, ll);
                }
            }
        }
        tables.push(table);
    }
    tables
}

/// Find the best pattern at each mutation count for every region in the view
///
/// Returns one candidate table per region, in region order
///
pub fn search_patterns(
    tree: &SampleTree,
    sub_tree: &SubTree,
    view: &RegionView,
    settings: &PatternSearchSettings,
) -> Vec<CandidateTable> {
    if sub_tree.edge_count() <= settings.sub_tree_cutoff {
        return search_patterns_exhaustive(tree, sub_tree, view, settings);
    }

    let split = tree.split_at_max_betweenness(sub_tree);
    debug!(
        "Splitting sub-tree with {} edges at edge {} (betweenness {:.4}) into sides of {} and {} edges",
        sub_tree.edge_count(),
        tree.get_edge_label(split.bridge_edge),
        split.betweenness,
        split.left.edge_count(),
        split.right.edge_count(),
    );

    let left_view = view.restrict(&split.left);
    let left_tables = search_patterns(tree, &split.left, &left_view, settings);
    let right_view = view.restrict(&split.right);
    let right_tables = search_patterns(tree, &split.right, &right_view, settings);

    combine_split_patterns(
        tree,
        sub_tree,
        view,
        settings,
        split.bridge_edge,
        &left_tables,
        &right_tables,
    )
}
