//! Score a mutation pattern against region count data
//!

use crate::beta_binomial::group_log_likelihood;
use crate::region_block::RegionView;
use crate::sample_tree::{SampleTree, SubTree};

/// Sample grouping implied by one mutation pattern, for the columns of a region view
///
/// This depends only on the tree and the pattern, so it is shared by all regions of the view.
///
pub struct PatternGrouping {
    /// Group of each view column, or None if the column's sample is not a leaf of the sub-tree
    column_groups: Vec<Option<usize>>,
    group_count: usize,
}

impl PatternGrouping {
    /// Group the view columns by the connected components left after removing the pattern
    /// edges from `sub_tree`
    pub fn new(
        tree: &SampleTree,
        sub_tree: &SubTree,
        view: &RegionView,
        pattern: &[usize],
    ) -> Self {
        let labels = tree.get_component_labels(sub_tree, pattern);
        let column_groups = view
            .column_nodes()
            .map(|node| node.and_then(|x| labels.node_components[x]))
            .collect();
        Self {
            column_groups,
            group_count: labels.component_count,
        }
    }

    /// Pooled beta-binomial parameters for each view column of one region
    ///
    /// Methylated and unmethylated counts are summed over each group, and the sums are assigned
    /// back to every column in the group. Components without any leaf column are never
    /// referenced. Columns without a group keep their own counts.
    ///
    /// Returns a 2-tuple of the pooled methylated (a) and pooled unmethylated (b) value per column
    ///
    pub fn get_pooled_counts(
        &self,
        view: &RegionView,
        region_index: usize,
    ) -> (Vec<f64>, Vec<f64>) {
        let mut group_methylated = vec![0.0; self.group_count];
        let mut group_unmethylated = vec![0.0; self.group_count];
        for (group, (methylated, coverage)) in self
            .column_groups
            .iter()
            .zip(view.region_counts(region_index))
        {
            if let Some(group) = group {
                group_methylated[*group] += methylated;
                group_unmethylated[*group] += coverage - methylated;
            }
        }

        self.column_groups
            .iter()
            .zip(view.region_counts(region_index))
            .map(|(group, (methylated, coverage))| match group {
                Some(group) => (group_methylated[*group], group_unmethylated[*group]),
                None => (methylated, coverage - methylated),
            })
            .unzip()
    }

    /// Data log-likelihood of one region under this grouping, excluding the mutation prior
    pub fn get_log_likelihood(&self, view: &RegionView, region_index: usize) -> f64 {
        let (pooled_methylated, pooled_unmethylated) = self.get_pooled_counts(view, region_index);
        view.region_counts(region_index)
            .zip(pooled_methylated.iter().zip(pooled_unmethylated.iter()))
            .map(|((x, n), (&a, &b))| group_log_likelihood(x, n, a, b))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region_block::RegionBlock;
    use crate::region_table::tests::get_test_table;
    use crate::sample_tree::tests::get_four_leaf_tree;

    #[test]
    fn test_get_pooled_counts() {
        let tree = get_four_leaf_tree();
        let sub_tree = tree.get_full_sub_tree();
        let mc = get_test_table(&[&[1.0, 2.0, 3.0, 9.0]]);
        let cov = get_test_table(&[&[10.0, 10.0, 10.0, 10.0]]);
        let block = RegionBlock::new(&tree, &mc, &cov);
        let view = block.full_view();

        // No mutation: one group over all samples
        let grouping = PatternGrouping::new(&tree, &sub_tree, &view, &[]);
        let (a, b) = grouping.get_pooled_counts(&view, 0);
        assert_eq!(a, vec![15.0; 4]);
        assert_eq!(b, vec![25.0; 4]);

        // Cut leaf 3 from its parent
        let grouping = PatternGrouping::new(&tree, &sub_tree, &view, &[3]);
        let (a, b) = grouping.get_pooled_counts(&view, 0);
        assert_eq!(a, vec![6.0, 6.0, 6.0, 9.0]);
        assert_eq!(b, vec![24.0, 24.0, 24.0, 1.0]);

        // Cutting both inner edges isolates the leafless root node, which adds no group
        let grouping = PatternGrouping::new(&tree, &sub_tree, &view, &[4, 5]);
        let (a, _) = grouping.get_pooled_counts(&view, 0);
        assert_eq!(a, vec![3.0, 3.0, 12.0, 12.0]);
    }

    #[test]
    fn test_unmapped_column_not_pooled() {
        let tree = get_four_leaf_tree();
        let sub_tree = tree.get_full_sub_tree();
        let mut mc = get_test_table(&[&[1.0, 2.0, 3.0, 4.0, 5.0]]);
        mc.sample_labels[4] = "unknown".to_string();
        let cov = get_test_table(&[&[10.0; 5]]);
        let block = RegionBlock::new(&tree, &mc, &cov);
        let view = block.full_view();

        let grouping = PatternGrouping::new(&tree, &sub_tree, &view, &[]);
        let (a, b) = grouping.get_pooled_counts(&view, 0);
        assert_eq!(a, vec![10.0, 10.0, 10.0, 10.0, 5.0]);
        assert_eq!(b, vec![30.0, 30.0, 30.0, 30.0, 5.0]);
    }

    #[test]
    fn test_get_log_likelihood() {
        let tree = get_four_leaf_tree();
        let sub_tree = tree.get_full_sub_tree();
        let mc = get_test_table(&[&[1.0, 1.0, 1.0, 9.0], &[0.0, 0.0, 0.0, 0.0]]);
        let cov = get_test_table(&[&[10.0, 10.0, 10.0, 10.0], &[0.0, 0.0, 0.0, 0.0]]);
        let block = RegionBlock::new(&tree, &mc, &cov);
        let view = block.full_view();

        let empty = PatternGrouping::new(&tree, &sub_tree, &view, &[]);
        let leaf3 = PatternGrouping::new(&tree, &sub_tree, &view, &[3]);
        assert!(leaf3.get_log_likelihood(&view, 0) > empty.get_log_likelihood(&view, 0));

        let expected = 3.0 * group_log_likelihood(1.0, 10.0, 3.0, 27.0)
            + group_log_likelihood(9.0, 10.0, 9.0, 1.0);
        approx::assert_abs_diff_eq!(
            leaf3.get_log_likelihood(&view, 0),
            expected,
            epsilon = 1e-10
        );

        // A region without coverage has no information under any grouping
        assert_eq!(empty.get_log_likelihood(&view, 1), 0.0);
        assert_eq!(leaf3.get_log_likelihood(&view, 1), 0.0);
    }
}
