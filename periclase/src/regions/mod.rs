//! Separation of a structure into its primary bonded network and outlier
//! atoms (adsorbates, noise, embedded clusters).

use indexmap::IndexMap;

use crate::geometry;
use crate::graph::BondGraph;
use crate::{Error, Structure};

mod dbscan;
pub use self::dbscan::dbscan;

/// Which region an atom belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Part of the structure's dominant bonded network
    Primary,
    /// Not connected to the primary network
    Outlier,
}

/// The result of region separation: one label per atom, plus the outlier
/// atoms grouped into physically coherent sub-regions (a whole adsorbed
/// molecule ends up in one group instead of scattering into single atoms).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionAssignment {
    labels: Vec<Region>,
    outlier_groups: Vec<Vec<usize>>,
}

impl RegionAssignment {
    /// Assignment treating every atom as primary, used to measure the
    /// dimensionality of the structure before outlier removal.
    pub(crate) fn all_primary(n_atoms: usize) -> RegionAssignment {
        RegionAssignment {
            labels: vec![Region::Primary; n_atoms],
            outlier_groups: Vec::new(),
        }
    }

    /// Get the region of the given atom.
    pub fn region(&self, atom: usize) -> Region {
        self.labels[atom]
    }

    /// Get the labels of all atoms, indexed by atom.
    pub fn labels(&self) -> &[Region] {
        &self.labels
    }

    /// Iterate over the atoms in the primary region, in ascending order.
    pub fn primary(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels.iter()
            .enumerate()
            .filter(|(_, &region)| region == Region::Primary)
            .map(|(atom, _)| atom)
    }

    /// Iterate over the outlier atoms, in ascending order.
    pub fn outliers(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels.iter()
            .enumerate()
            .filter(|(_, &region)| region == Region::Outlier)
            .map(|(atom, _)| atom)
    }

    /// Number of atoms in the primary region.
    pub fn n_primary(&self) -> usize {
        self.primary().count()
    }

    /// Number of outlier atoms.
    pub fn n_outliers(&self) -> usize {
        self.outliers().count()
    }

    /// Get the outlier atoms grouped into coherent sub-regions, ordered by
    /// their smallest member.
    pub fn outlier_groups(&self) -> &[Vec<usize>] {
        &self.outlier_groups
    }
}

/// Parameters for the geometric grouping of outlier atoms.
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(default)]
pub struct RegionOptions {
    /// Neighborhood radius (in Ångström) used when merging outlier atoms
    /// into coherent groups.
    pub neighbor_radius: f64,
    /// Minimum number of atoms for an outlier group; smaller collections
    /// end up as single-atom groups.
    pub min_cluster_size: usize,
}

impl Default for RegionOptions {
    fn default() -> RegionOptions {
        RegionOptions {
            neighbor_radius: 3.0,
            min_cluster_size: 1,
        }
    }
}

/// Split the atoms of a structure into a primary region and outliers.
///
/// The largest connected component over the original (untranslated) cell is
/// the provisional primary region; ties go to the component with the lowest
/// mean atomic number, then to the one containing the lowest atom index.
/// Atoms reachable from the primary region anywhere in the translation
/// shell stay primary (this keeps molecules split by the cell boundary
/// together); everything else is an outlier. A final DBSCAN pass over the
/// outliers' minimum-image distances merges adjacent outliers into groups.
#[time_graph::instrument(name = "separate_regions")]
pub fn separate_regions(
    graph: &BondGraph,
    structure: &Structure,
    options: &RegionOptions,
) -> Result<RegionAssignment, Error> {
    let n_atoms = structure.size();
    if n_atoms == 0 {
        return Err(Error::EmptyPrimaryRegion { n_atoms: 0 });
    }

    if !(options.neighbor_radius.is_finite() && options.neighbor_radius > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "neighbor_radius must be a positive number, got {}", options.neighbor_radius
        )));
    }

    // connected components restricted to the original cell
    let restricted = graph.components_where(|node| node.is_original());
    let mut components: IndexMap<usize, Vec<usize>> = IndexMap::new();
    for atom in 0..n_atoms {
        let position = graph.node_position(crate::graph::PeriodicNode::original(atom))
            .ok_or_else(|| Error::Internal(format!(
                "atom {} has no node in the original cell", atom
            )))?;
        components.entry(restricted.find(position)).or_default().push(atom);
    }

    let species = structure.species();
    let provisional = components.values()
        .min_by(|a, b| {
            let mean = |atoms: &[usize]| {
                atoms.iter().map(|&i| f64::from(species[i])).sum::<f64>() / atoms.len() as f64
            };
            // largest first, then lowest mean atomic number, then lowest
            // smallest member index
            b.len().cmp(&a.len())
                .then_with(|| mean(a).partial_cmp(&mean(b)).expect("species are finite"))
                .then_with(|| a[0].cmp(&b[0]))
        })
        .expect("there is at least one component");

    let mut is_primary = vec![false; n_atoms];
    for &atom in provisional {
        is_primary[atom] = true;
    }

    // atoms reachable from the provisional primary region through any
    // periodic image are part of the same network
    let full = graph.components_where(|_| true);
    let mut primary_representatives = vec![false; graph.node_count()];
    for node in graph.nodes() {
        if is_primary[node.atom] {
            let position = graph.node_position(node).expect("node comes from the graph");
            primary_representatives[full.find(position)] = true;
        }
    }
    for node in graph.nodes() {
        let position = graph.node_position(node).expect("node comes from the graph");
        if primary_representatives[full.find(position)] {
            is_primary[node.atom] = true;
        }
    }

    let labels = is_primary.iter()
        .map(|&primary| if primary { Region::Primary } else { Region::Outlier })
        .collect::<Vec<_>>();

    if !labels.contains(&Region::Primary) {
        return Err(Error::EmptyPrimaryRegion { n_atoms });
    }

    // group the outliers geometrically
    let candidates = labels.iter()
        .enumerate()
        .filter(|(_, &region)| region == Region::Outlier)
        .map(|(atom, _)| atom)
        .collect::<Vec<_>>();

    let mut outlier_groups = Vec::new();
    if !candidates.is_empty() {
        let distances = geometry::distance_matrix(structure);
        let restricted_distances = ndarray::Array2::from_shape_fn(
            (candidates.len(), candidates.len()),
            |(i, j)| distances[[candidates[i], candidates[j]]],
        );

        let cluster_labels = dbscan(
            restricted_distances.view(),
            options.neighbor_radius,
            options.min_cluster_size,
        );

        let mut groups: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for (candidate, label) in candidates.iter().zip(&cluster_labels) {
            match label {
                Some(cluster) => groups.entry(*cluster).or_default().push(*candidate),
                // noise points stay as single-atom groups
                None => outlier_groups.push(vec![*candidate]),
            }
        }
        outlier_groups.extend(groups.into_values());
        outlier_groups.sort_unstable_by_key(|group| group[0]);
    }

    Ok(RegionAssignment { labels, outlier_groups })
}
