//! Measurement of how many independent lattice directions propagate
//! infinite connectivity through the primary bonded network.

use nalgebra::Vector3;

use crate::geometry;
use crate::graph::{BondGraph, PeriodicNode};
use crate::regions::{Region, RegionAssignment};
use crate::{Error, Structure};

/// The measured dimensionality of a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionalityResult {
    /// number of independent lattice directions propagating connectivity
    pub rank: usize,
    /// which lattice directions propagate connectivity
    pub propagating: [bool; 3],
    /// which lattice directions contain a vacuum gap separating the
    /// periodic copies (always true for non-periodic directions)
    pub vacuum_gaps: [bool; 3],
}

/// Measure the dimensionality of the primary region of a structure.
///
/// A direction *d* propagates when some primary atom's original node is
/// connected, inside the primary-restricted subgraph, to its own image
/// translated purely along *d*. Diagonal connections do not count towards
/// any single direction: each direction must be confirmed by an
/// isolated-axis translation path. The rank is the number of propagating
/// directions and can never exceed the declared periodicity.
#[time_graph::instrument(name = "dimensionality")]
pub fn classify(
    graph: &BondGraph,
    regions: &RegionAssignment,
    structure: &Structure,
    vacuum_threshold: f64,
) -> Result<DimensionalityResult, Error> {
    let cell = structure.cell();

    // a node translated along a non-periodic direction means the builder
    // violated its contract
    for node in graph.nodes() {
        for axis in 0..3 {
            if node.shift[axis] != 0 && !cell.is_periodic(axis) {
                let mut measured = [false; 3];
                measured[axis] = true;
                return Err(Error::InconsistentPeriodicity {
                    axis,
                    declared: cell.periodic(),
                    measured,
                });
            }
        }
    }

    let primary = graph.components_where(|node| regions.region(node.atom) == Region::Primary);

    let mut propagating = [false; 3];
    let shell = graph.shell();
    'axes: for axis in 0..3 {
        if !cell.is_periodic(axis) {
            continue;
        }

        for atom in regions.primary() {
            let original = match graph.node_position(PeriodicNode::original(atom)) {
                Some(position) => position,
                None => continue,
            };

            for multiple in 1..=shell[axis] {
                let mut shift = [0, 0, 0];
                shift[axis] = multiple;
                let image = match graph.node_position(PeriodicNode { atom, shift }) {
                    Some(position) => position,
                    None => continue,
                };

                if primary.equiv(original, image) {
                    propagating[axis] = true;
                    continue 'axes;
                }
            }
        }
    }

    let rank = propagating.iter().filter(|&&p| p).count();
    let vacuum_gaps = geometry::find_vacuum_gaps(structure, vacuum_threshold);

    Ok(DimensionalityResult { rank, propagating, vacuum_gaps })
}

/// Check whether the space next to the primary region along `axis` is free
/// of outlier atoms.
///
/// The primary atoms' extent along the repeat vector of `axis` is padded by
/// `padding` on both sides; any outlier atom projecting into the padded
/// range means the direction is not pure vacuum. Used to tell actual 2D
/// materials from surfaces with adsorbates.
pub(crate) fn vacuum_is_clear(
    structure: &Structure,
    regions: &RegionAssignment,
    axis: usize,
    padding: f64,
) -> bool {
    let direction = structure.cell().vector(axis);
    let norm = direction.norm();
    if norm == 0.0 {
        return true;
    }
    let direction = direction / norm;

    let project = |position: &Vector3<f64>| position.dot(&direction);

    let positions = structure.positions();
    let mut low = f64::INFINITY;
    let mut high = f64::NEG_INFINITY;
    for atom in regions.primary() {
        let value = project(&positions[atom]);
        low = f64::min(low, value);
        high = f64::max(high, value);
    }

    for atom in regions.outliers() {
        let value = project(&positions[atom]);
        if value >= low - padding && value <= high + padding {
            return false;
        }
    }

    return true;
}
