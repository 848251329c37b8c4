//! Sample clustering tree, and the sub-tree operations used by the epimutation search
//!

use std::collections::{BTreeSet, HashMap};

use simple_error::{SimpleResult, bail};

use crate::linkage::Linkage;
use crate::utils::first_max_index;

/// Tree edge between a node and the merge node which absorbed it
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TreeEdge {
    pub child: usize,
    pub parent: usize,
}

impl TreeEdge {
    fn other_node(&self, node: usize) -> usize {
        if node == self.child {
            self.parent
        } else {
            self.child
        }
    }
}

/// Connected piece of a [SampleTree], expressed as subsets of the tree's node and edge ids
///
/// Both id lists are sorted.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubTree {
    pub nodes: Vec<usize>,
    pub edges: Vec<usize>,
}

impl SubTree {
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, node: usize) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }
}

/// Connected component index for every tree node, after a set of edges has been removed from a
/// sub-tree
///
/// Nodes outside of the sub-tree have no component.
///
pub struct ComponentLabels {
    pub node_components: Vec<Option<usize>>,
    pub component_count: usize,
}

/// Leaf labels found below the left and right branches of one merge node
#[derive(Debug, PartialEq)]
pub struct MergeNodeLeafSets {
    pub node: usize,
    pub left: BTreeSet<String>,
    pub right: BTreeSet<String>,
}

/// Result of cutting a sub-tree at its most central edge
pub struct SubTreeSplit {
    /// Side of the split containing the bridge edge's child node
    pub left: SubTree,
    pub right: SubTree,
    pub bridge_edge: usize,
    /// Normalized edge betweenness centrality of the bridge edge
    pub betweenness: f64,
}

/// Undirected tree over the samples, with one leaf node per sample and one internal node per
/// merge of the source clustering
///
/// Node ids follow the linkage convention: leaves are `0..n`, and merge row `i` creates node
/// `n + i`. Merge row `i` contributes edge `2i` to its left input and edge `2i + 1` to its right
/// input, so edge ids double as a stable ordering key.
///
pub struct SampleTree {
    leaf_labels: Vec<String>,
    leaf_index: HashMap<String, usize>,
    edges: Vec<TreeEdge>,

    /// Ids of the edges touching each node
    node_edges: Vec<Vec<usize>>,
}

impl SampleTree {
    /// Build the tree from a linkage matrix
    ///
    /// # Arguments
    /// * `labels` - Sample label for each leaf. Labels default to the leaf index when not given.
    ///
    pub fn from_linkage(linkage: &Linkage, labels: Option<&[String]>) -> SimpleResult<Self> {
        let leaf_count = linkage.leaf_count();
        let node_count = 2 * leaf_count - 1;

        let leaf_labels = match labels {
            Some(labels) => {
                if labels.len() != leaf_count {
                    bail!(
                        "Sample label count ({}) does not match the linkage leaf count ({leaf_count})",
                        labels.len()
                    );
                }
                labels.to_vec()
            }
            None => (0..leaf_count).map(|x| x.to_string()).collect(),
        };

        let mut leaf_index = HashMap::new();
        for (node, label) in leaf_labels.iter().enumerate() {
            if leaf_index.insert(label.clone(), node).is_some() {
                bail!("Duplicate sample label: '{label}'");
            }
        }

        let mut edges = Vec::with_capacity(node_count - 1);
        let mut node_edges = vec![Vec::new(); node_count];
        let mut has_parent = vec![false; node_count];
        for (merge_index, merge) in linkage.merges.iter().enumerate() {
            let parent = leaf_count + merge_index;
            for child in [merge.left, merge.right] {
                if child >= parent {
                    bail!(
                        "Linkage row {} references node {child}, which does not exist before merge node {parent}",
                        merge_index + 1
                    );
                }
                if has_parent[child] {
                    bail!(
                        "Linkage row {} merges node {child}, which was already merged",
                        merge_index + 1
                    );
                }
                has_parent[child] = true;
                let edge_id = edges.len();
                edges.push(TreeEdge { child, parent });
                node_edges[child].push(edge_id);
                node_edges[parent].push(edge_id);
            }
        }

        Ok(Self {
            leaf_labels,
            leaf_index,
            edges,
            node_edges,
        })
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_labels.len()
    }

    pub fn node_count(&self) -> usize {
        self.node_edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, edge_id: usize) -> &TreeEdge {
        &self.edges[edge_id]
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        node < self.leaf_count()
    }

    /// Find the leaf node for a sample label
    pub fn get_leaf_node(&self, label: &str) -> Option<usize> {
        self.leaf_index.get(label).copied()
    }

    /// Display name of a node: the sample label for leaves, and the node id for merge nodes
    pub fn get_node_name(&self, node: usize) -> String {
        if self.is_leaf(node) {
            self.leaf_labels[node].clone()
        } else {
            node.to_string()
        }
    }

    pub fn get_edge_label(&self, edge_id: usize) -> String {
        let edge = self.edge(edge_id);
        format!(
            "{}-{}",
            self.get_node_name(edge.child),
            self.get_node_name(edge.parent)
        )
    }

    /// Sub-tree covering the whole tree
    pub fn get_full_sub_tree(&self) -> SubTree {
        SubTree {
            nodes: (0..self.node_count()).collect(),
            edges: (0..self.edge_count()).collect(),
        }
    }

    /// Label the connected components of `sub_tree` after removing `removed_edges`
    ///
    /// Removing `k` edges of the sub-tree always produces `k + 1` components. Component indices
    /// are assigned in order of each component's lowest node id.
    ///
    pub fn get_component_labels(
        &self,
        sub_tree: &SubTree,
        removed_edges: &[usize],
    ) -> ComponentLabels {
        let mut edge_active = vec![false; self.edge_count()];
        for &edge_id in sub_tree.edges.iter() {
            edge_active[edge_id] = true;
        }
        for &edge_id in removed_edges {
            edge_active[edge_id] = false;
        }

        let mut node_components = vec![None; self.node_count()];
        let mut component_count = 0;
        let mut stack = Vec::new();
        for &start_node in sub_tree.nodes.iter() {
            if node_components[start_node].is_some() {
                continue;
            }
            node_components[start_node] = Some(component_count);
            stack.push(start_node);
            while let Some(node) = stack.pop() {
                for &edge_id in self.node_edges[node].iter() {
                    if !edge_active[edge_id] {
                        continue;
                    }
                    let next_node = self.edges[edge_id].other_node(node);
                    if node_components[next_node].is_none() {
                        node_components[next_node] = Some(component_count);
                        stack.push(next_node);
                    }
                }
            }
            component_count += 1;
        }

        ComponentLabels {
            node_components,
            component_count,
        }
    }

    /// Count the shortest paths running through each edge of the sub-tree
    ///
    /// Paths between nodes in a tree are unique, so an edge separating the sub-tree's `N` nodes
    /// into sides of size `s` and `N - s` carries exactly `s * (N - s)` paths.
    ///
    /// Returns (edge_id, path_count) pairs in edge id order.
    ///
    fn get_edge_path_counts(&self, sub_tree: &SubTree) -> Vec<(usize, usize)> {
        let node_count = sub_tree.nodes.len();
        if node_count < 2 {
            return Vec::new();
        }

        let mut in_sub_tree = vec![false; self.edge_count()];
        for &edge_id in sub_tree.edges.iter() {
            in_sub_tree[edge_id] = true;
        }

        // Depth-first visit order from the lowest node, recording the edge leading to each node
        let root = sub_tree.nodes[0];
        let mut parent_edge = vec![None; self.node_count()];
        let mut visited = vec![false; self.node_count()];
        let mut visit_order = Vec::with_capacity(node_count);
        let mut stack = vec![root];
        visited[root] = true;
        while let Some(node) = stack.pop() {
            visit_order.push(node);
            for &edge_id in self.node_edges[node].iter() {
                if !in_sub_tree[edge_id] {
                    continue;
                }
                let next_node = self.edges[edge_id].other_node(node);
                if !visited[next_node] {
                    visited[next_node] = true;
                    parent_edge[next_node] = Some(edge_id);
                    stack.push(next_node);
                }
            }
        }

        let mut side_size = vec![1usize; self.node_count()];
        let mut path_counts = Vec::with_capacity(sub_tree.edge_count());
        for &node in visit_order.iter().rev() {
            if let Some(edge_id) = parent_edge[node] {
                let size = side_size[node];
                path_counts.push((edge_id, size * (node_count - size)));
                let up_node = self.edges[edge_id].other_node(node);
                side_size[up_node] += size;
            }
        }
        path_counts.sort_unstable();
        path_counts
    }

    /// Normalized edge betweenness centrality for each edge of the sub-tree, in edge id order
    ///
    /// Normalization follows the undirected graph convention of dividing by the number of node
    /// pairs, `N(N-1)/2`.
    ///
    pub fn get_edge_betweenness(&self, sub_tree: &SubTree) -> Vec<(usize, f64)> {
        let node_count = sub_tree.nodes.len();
        let pair_count = (node_count * node_count.saturating_sub(1) / 2) as f64;
        self.get_edge_path_counts(sub_tree)
            .into_iter()
            .map(|(edge_id, path_count)| (edge_id, path_count as f64 / pair_count))
            .collect()
    }

    /// Split the sub-tree into two sub-trees by removing its edge of highest betweenness centrality
    ///
    /// Ties are broken in favor of the lowest edge id. The sub-tree must have at least one edge.
    ///
    pub fn split_at_max_betweenness(&self, sub_tree: &SubTree) -> SubTreeSplit {
        let betweenness = self.get_edge_betweenness(sub_tree);
        let Some(max_index) = first_max_index(betweenness.iter().map(|&(_, x)| x)) else {
            panic!("Can't split a sub-tree without edges");
        };
        let (bridge_edge, bridge_betweenness) = betweenness[max_index];

        let labels = self.get_component_labels(sub_tree, &[bridge_edge]);
        let left_component = labels.node_components[self.edges[bridge_edge].child];
        let is_left = |node: usize| labels.node_components[node] == left_component;

        let (left_nodes, right_nodes): (Vec<_>, Vec<_>) =
            sub_tree.nodes.iter().copied().partition(|&node| is_left(node));
        let (left_edges, right_edges): (Vec<_>, Vec<_>) = sub_tree
            .edges
            .iter()
            .copied()
            .filter(|&edge_id| edge_id != bridge_edge)
            .partition(|&edge_id| is_left(self.edges[edge_id].child));

        SubTreeSplit {
            left: SubTree {
                nodes: left_nodes,
                edges: left_edges,
            },
            right: SubTree {
                nodes: right_nodes,
                edges: right_edges,
            },
            bridge_edge,
            betweenness: bridge_betweenness,
        }
    }

    /// Leaf labels under the left and right branch of every merge node, in merge order
    ///
    pub fn get_merge_node_leaf_sets(&self) -> Vec<MergeNodeLeafSets> {
        let leaf_count = self.leaf_count();
        let mut node_leaves: Vec<BTreeSet<String>> = self
            .leaf_labels
            .iter()
            .map(|label| BTreeSet::from([label.clone()]))
            .collect();

        let mut merge_node_leaf_sets = Vec::with_capacity(leaf_count.saturating_sub(1));
        for node in leaf_count..self.node_count() {
            let merge_index = node - leaf_count;
            let left = node_leaves[self.edges[2 * merge_index].child].clone();
            let right = node_leaves[self.edges[2 * merge_index + 1].child].clone();
            node_leaves.push(left.union(&right).cloned().collect());
            merge_node_leaf_sets.push(MergeNodeLeafSets { node, left, right });
        }
        merge_node_leaf_sets
    }
}
