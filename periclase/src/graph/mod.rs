//! The bond graph over atoms and their periodic images.

use indexmap::IndexMap;
use nalgebra::Vector3;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

mod builder;
pub use self::builder::{BondingOptions, bonding_radii};

/// One atom instance in a specific periodic image: the index of the atom in
/// the original cell together with the integer translation applied to it.
///
/// Nodes only exist for the duration of one classification call; the
/// translation is always exact integers, so nodes can be compared and hashed
/// reliably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodicNode {
    /// index of the atom in the original structure
    pub atom: usize,
    /// integer translation multipliers along the three cell vectors
    pub shift: [i32; 3],
}

impl PeriodicNode {
    /// Node for an atom in the original (untranslated) cell.
    pub fn original(atom: usize) -> PeriodicNode {
        PeriodicNode { atom, shift: [0, 0, 0] }
    }

    /// Check whether this node lives in the original cell.
    pub fn is_original(&self) -> bool {
        self.shift == [0, 0, 0]
    }
}

/// A bond between two atom instances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    /// bond length
    pub distance: f64,
    /// Cartesian vector from the first to the second atom instance
    pub vector: Vector3<f64>,
}

/// Undirected graph over [`PeriodicNode`]s where edges are bonds.
///
/// The graph contains a node for every atom instance inside the enumerated
/// translation shell, bonded or not, so that isolated atoms still take part
/// in region separation. Nodes are inserted in a fixed order (atom index
/// first, then translation in lexicographic order), which everything
/// downstream relies on for determinism.
pub struct BondGraph {
    graph: UnGraph<PeriodicNode, Bond>,
    nodes: IndexMap<PeriodicNode, NodeIndex>,
    shell: [i32; 3],
    n_atoms: usize,
}

impl BondGraph {
    pub(crate) fn with_shell(n_atoms: usize, shell: [i32; 3]) -> BondGraph {
        BondGraph {
            graph: UnGraph::default(),
            nodes: IndexMap::new(),
            shell,
            n_atoms,
        }
    }

    pub(crate) fn insert_node(&mut self, node: PeriodicNode) {
        debug_assert!(!self.nodes.contains_key(&node));
        let index = self.graph.add_node(node);
        self.nodes.insert(node, index);
    }

    pub(crate) fn insert_bond(&mut self, first: PeriodicNode, second: PeriodicNode, bond: Bond) {
        debug_assert!(first != second, "bond graphs never contain self-loops");
        let first = self.nodes[&first];
        let second = self.nodes[&second];
        self.graph.update_edge(first, second, bond);
    }

    /// Number of atoms in the underlying structure.
    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    /// Per-direction extent of the translation shell this graph was built
    /// with (zero along non-periodic directions).
    pub fn shell(&self) -> [i32; 3] {
        self.shell
    }

    /// Check whether the given atom instance exists in this graph.
    pub fn contains(&self, node: PeriodicNode) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of nodes (atom instances) in this graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of bonds in this graph.
    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterate over all atom instances, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = PeriodicNode> + '_ {
        self.nodes.keys().copied()
    }

    /// Iterate over all bonds as `(first, second, bond)` triples.
    pub fn bonds(&self) -> impl Iterator<Item = (PeriodicNode, PeriodicNode, &Bond)> + '_ {
        self.graph.edge_references().map(move |edge| {
            let first = self.graph[edge.source()];
            let second = self.graph[edge.target()];
            (first, second, edge.weight())
        })
    }

    /// Iterate over the bonds involving the given atom instance.
    pub fn bonds_of(&self, node: PeriodicNode) -> impl Iterator<Item = (PeriodicNode, &Bond)> + '_ {
        let index = self.nodes.get(&node).copied();
        index.into_iter().flat_map(move |index| {
            self.graph.edges(index).map(move |edge| {
                let other = if edge.source() == index { edge.target() } else { edge.source() };
                (self.graph[other], edge.weight())
            })
        })
    }

    /// Compute the connected components of this graph, restricted to the
    /// nodes for which `keep` returns true. Edges with at least one endpoint
    /// outside the restriction are ignored.
    ///
    /// Returns a union-find structure indexed like [`BondGraph::nodes`]; use
    /// [`BondGraph::node_position`] to address it.
    pub fn components_where(&self, keep: impl Fn(PeriodicNode) -> bool) -> UnionFind<usize> {
        let mut union_find = UnionFind::new(self.nodes.len());
        for edge in self.graph.edge_references() {
            let first = self.graph[edge.source()];
            let second = self.graph[edge.target()];
            if keep(first) && keep(second) {
                union_find.union(edge.source().index(), edge.target().index());
            }
        }
        return union_find;
    }

    /// Get the index of the given node in the union-find structures returned
    /// by [`BondGraph::components_where`].
    pub fn node_position(&self, node: PeriodicNode) -> Option<usize> {
        self.nodes.get(&node).map(|index| index.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_graph() -> BondGraph {
        let mut graph = BondGraph::with_shell(2, [0, 0, 0]);
        graph.insert_node(PeriodicNode::original(0));
        graph.insert_node(PeriodicNode::original(1));
        graph.insert_bond(
            PeriodicNode::original(0),
            PeriodicNode::original(1),
            Bond { distance: 1.0, vector: Vector3::new(1.0, 0.0, 0.0) },
        );
        return graph;
    }

    #[test]
    fn nodes_and_bonds() {
        let graph = simple_graph();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.bond_count(), 1);
        assert!(graph.contains(PeriodicNode::original(0)));
        assert!(!graph.contains(PeriodicNode { atom: 0, shift: [1, 0, 0] }));

        let neighbors = graph.bonds_of(PeriodicNode::original(0)).collect::<Vec<_>>();
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].0, PeriodicNode::original(1));
    }

    #[test]
    fn restricted_components() {
        let graph = simple_graph();

        let components = graph.components_where(|_| true);
        let a = graph.node_position(PeriodicNode::original(0)).unwrap();
        let b = graph.node_position(PeriodicNode::original(1)).unwrap();
        assert!(components.equiv(a, b));

        // restricting away atom 1 separates the components
        let components = graph.components_where(|node| node.atom == 0);
        assert!(!components.equiv(a, b));
    }
}
