//! Region count data laid out for the epimutation search
//!

use crate::region_table::CountTable;
use crate::sample_tree::{SampleTree, SubTree};

/// Methylated counts and coverage for a contiguous block of regions
///
/// Each column is mapped to the tree leaf carrying the same sample label. Columns without a
/// matching leaf are kept, but never pooled with any other column.
///
#[derive(Clone, Debug)]
pub struct RegionBlock {
    pub region_names: Vec<String>,
    pub column_nodes: Vec<Option<usize>>,
    pub methylated: Vec<Vec<f64>>,
    pub coverage: Vec<Vec<f64>>,
}

impl RegionBlock {
    /// The two tables are expected to have matching shape, this is not checked here
    pub fn new(tree: &SampleTree, mc: &CountTable, cov: &CountTable) -> Self {
        Self {
            region_names: mc.region_names.clone(),
            column_nodes: mc
                .sample_labels
                .iter()
                .map(|x| tree.get_leaf_node(x))
                .collect(),
            methylated: mc.values.clone(),
            coverage: cov.values.clone(),
        }
    }

    pub fn region_count(&self) -> usize {
        self.region_names.len()
    }

    /// Copy of up to `size` regions starting from region index `start`
    pub fn get_chunk(&self, start: usize, size: usize) -> Self {
        let end = std::cmp::min(start + size, self.region_count());
        Self {
            region_names: self.region_names[start..end].to_vec(),
            column_nodes: self.column_nodes.clone(),
            methylated: self.methylated[start..end].to_vec(),
            coverage: self.coverage[start..end].to_vec(),
        }
    }

    /// View of all columns of this block
    pub fn full_view(&self) -> RegionView<'_> {
        RegionView {
            block: self,
            columns: (0..self.column_nodes.len()).collect(),
        }
    }
}

/// A subset of the columns of a [RegionBlock]
pub struct RegionView<'a> {
    pub block: &'a RegionBlock,
    pub columns: Vec<usize>,
}

impl RegionView<'_> {
    pub fn region_count(&self) -> usize {
        self.block.region_count()
    }

    /// Tree leaf node of each view column
    pub fn column_nodes(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.columns.iter().map(|&x| self.block.column_nodes[x])
    }

    /// Methylated and coverage values of each view column for one region
    pub fn region_counts(&self, region_index: usize) -> impl Iterator<Item = (f64, f64)> + '_ {
        let methylated = &self.block.methylated[region_index];
        let coverage = &self.block.coverage[region_index];
        self.columns.iter().map(|&x| (methylated[x], coverage[x]))
    }

    /// Restrict the view to columns with a leaf node in `sub_tree`
    pub fn restrict(&self, sub_tree: &SubTree) -> Self {
        let columns = self
            .columns
            .iter()
            .copied()
            .filter(|&x| match self.block.column_nodes[x] {
                Some(node) => sub_tree.contains_node(node),
                None => false,
            })
            .collect();
        Self {
            block: self.block,
            columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region_table::tests::get_test_table;
    use crate::sample_tree::tests::get_four_leaf_tree;

    #[test]
    fn test_region_block_columns() {
        let tree = get_four_leaf_tree();
        let mut mc = get_test_table(&[&[1.0, 2.0, 3.0, 4.0, 5.0]]);
        mc.sample_labels = ["3", "x", "0", "1", "2"].map(String::from).to_vec();
        let cov = mc.clone();

        let block = RegionBlock::new(&tree, &mc, &cov);
        assert_eq!(
            block.column_nodes,
            vec![Some(3), None, Some(0), Some(1), Some(2)]
        );

        let view = block.full_view();
        let split = tree.split_at_max_betweenness(&tree.get_full_sub_tree());
        let left_view = view.restrict(&split.left);
        assert_eq!(left_view.columns, vec![2, 3]);
        let right_view = view.restrict(&split.right);
        assert_eq!(right_view.columns, vec![0, 4]);
        assert_eq!(
            right_view.region_counts(0).collect::<Vec<_>>(),
            vec![(1.0, 1.0), (5.0, 5.0)]
        );
    }

    #[test]
    fn test_get_chunk() {
        let tree = get_four_leaf_tree();
        let values = (0..25).map(|x| vec![x as f64; 4]).collect::<Vec<_>>();
        let values = values.iter().map(|x| x.as_slice()).collect::<Vec<_>>();
        let table = get_test_table(&values);
        let block = RegionBlock::new(&tree, &table, &table);

        let chunk = block.get_chunk(20, 10);
        assert_eq!(chunk.region_count(), 5);
        assert_eq!(chunk.region_names[0], "r20");
        assert_eq!(chunk.methylated[4][0], 24.0);
    }
}
