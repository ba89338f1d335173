use log::warn;
use nalgebra::Vector3;
use rayon::prelude::*;

use crate::{elements, Error, Structure};

use super::{Bond, BondGraph, PeriodicNode};

/// Parameters controlling how bonds are detected between atoms.
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(default)]
pub struct BondingOptions {
    /// Scaling applied to the sum of covalent radii when deciding whether
    /// two atoms are bonded. Values slightly above 1 tolerate strained
    /// bonds.
    pub radius_factor: f64,
    /// How many layers of neighboring periodic cells to enumerate along
    /// each periodic direction.
    pub max_translation_shell: u32,
    /// Covalent radius (in Ångström) assumed for species without a
    /// tabulated value.
    pub default_radius: f64,
}

impl Default for BondingOptions {
    fn default() -> BondingOptions {
        BondingOptions {
            radius_factor: 1.1,
            max_translation_shell: 1,
            default_radius: 1.2,
        }
    }
}

impl BondingOptions {
    fn validate(&self) -> Result<(), Error> {
        if !(self.radius_factor.is_finite() && self.radius_factor > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "radius_factor must be a positive number, got {}", self.radius_factor
            )));
        }
        if !(self.default_radius.is_finite() && self.default_radius > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "default_radius must be a positive number, got {}", self.default_radius
            )));
        }
        Ok(())
    }
}

/// Resolve the covalent radius of every atom in the structure, falling back
/// to `default_radius` for species without a tabulated value.
///
/// Returns the radii and the `(atom index, species)` pairs which used the
/// fallback, so callers can surface them in the classification metadata.
pub fn bonding_radii(structure: &Structure, default_radius: f64) -> (Vec<f64>, Vec<(usize, i32)>) {
    let mut radii = Vec::with_capacity(structure.size());
    let mut unknown = Vec::new();
    for (atom, &species) in structure.species().iter().enumerate() {
        match elements::covalent_radius(species) {
            Some(radius) => radii.push(radius),
            None => {
                radii.push(default_radius);
                unknown.push((atom, species));
            }
        }
    }
    return (radii, unknown);
}

/// A bond between atom `first` in the original cell and the image of atom
/// `second` translated by `shift`. By translation invariance this single
/// entry stands for every bond between `(first, s)` and `(second, s +
/// shift)` in the graph.
#[derive(Debug, Clone)]
struct BondTemplate {
    first: usize,
    second: usize,
    shift: [i32; 3],
    bond: Bond,
}

/// For bonds between an atom and its own periodic images, both `shift` and
/// `-shift` describe the same set of undirected edges; keep only the one in
/// the positive half-space.
fn self_bond_is_canonical(shift: [i32; 3]) -> bool {
    let sum = shift[0] + shift[1] + shift[2];
    if sum < 0 {
        return false;
    }
    if sum == 0 && (shift[2] < 0 || (shift[2] == 0 && shift[1] < 0)) {
        return false;
    }
    return true;
}

impl BondGraph {
    /// Build the bond graph of a structure: nodes are atom instances in the
    /// original cell and in every periodic image inside the translation
    /// shell, and edges connect instances within bonding distance
    /// (`radius_factor × (rᵢ + rⱼ)`).
    ///
    /// Bond candidates are found once per `(i, j, relative shift)` triple —
    /// the dominant O(n² × shell volume) cost, scanned in parallel over the
    /// first atom and merged in a fixed order — and then instantiated for
    /// every node pair inside the shell by translation invariance.
    #[time_graph::instrument(name = "BondGraph::new")]
    pub fn new(structure: &Structure, options: &BondingOptions) -> Result<BondGraph, Error> {
        options.validate()?;

        let cell = *structure.cell();
        if cell.any_periodic() && options.max_translation_shell == 0 {
            return Err(Error::InvalidParameter(
                "max_translation_shell must be at least 1 for periodic structures".into()
            ));
        }

        let (radii, unknown) = bonding_radii(structure, options.default_radius);
        for &(atom, species) in &unknown {
            warn!(
                "no tabulated covalent radius for species {} (atom {}), using the default of {} Å",
                species, atom, options.default_radius
            );
        }

        let shell = [0, 1, 2].map(|axis| {
            if cell.is_periodic(axis) { options.max_translation_shell as i32 } else { 0 }
        });

        let shift_to_cartesian = |shift: [i32; 3]| -> Vector3<f64> {
            if shift == [0, 0, 0] {
                return Vector3::zeros();
            }
            cell.cartesian(Vector3::new(shift[0] as f64, shift[1] as f64, shift[2] as f64))
        };

        // relative shifts between two nodes inside the shell span twice the
        // shell extent
        let mut relative_shifts = Vec::new();
        for a in -2 * shell[0]..=2 * shell[0] {
            for b in -2 * shell[1]..=2 * shell[1] {
                for c in -2 * shell[2]..=2 * shell[2] {
                    relative_shifts.push([a, b, c]);
                }
            }
        }

        let positions = structure.positions();
        let n_atoms = structure.size();

        let mut templates = (0..n_atoms).into_par_iter().map(|i| {
            let mut found = Vec::new();
            for j in i..n_atoms {
                let threshold = options.radius_factor * (radii[i] + radii[j]);
                for &shift in &relative_shifts {
                    if i == j && (shift == [0, 0, 0] || !self_bond_is_canonical(shift)) {
                        continue;
                    }

                    let vector = positions[j] + shift_to_cartesian(shift) - positions[i];
                    let distance2 = vector.norm_squared();
                    if distance2 <= threshold * threshold {
                        if distance2 < 1e-3 {
                            warn!(
                                "atoms {} and {} are very close to one another ({} Å)",
                                i, j, distance2.sqrt()
                            );
                        }

                        found.push(BondTemplate {
                            first: i,
                            second: j,
                            shift,
                            bond: Bond { distance: distance2.sqrt(), vector },
                        });
                    }
                }
            }
            return found;
        }).flatten().collect::<Vec<_>>();

        // the parallel scan already yields a deterministic order, sort
        // anyway so the graph does not depend on it
        templates.sort_unstable_by_key(|t| (t.first, t.second, t.shift));

        let mut node_shifts = Vec::new();
        for a in -shell[0]..=shell[0] {
            for b in -shell[1]..=shell[1] {
                for c in -shell[2]..=shell[2] {
                    node_shifts.push([a, b, c]);
                }
            }
        }

        let mut graph = BondGraph::with_shell(n_atoms, shell);
        for atom in 0..n_atoms {
            for &shift in &node_shifts {
                graph.insert_node(PeriodicNode { atom, shift });
            }
        }

        let inside_shell = |shift: [i32; 3]| {
            shift.iter().zip(&shell).all(|(s, max)| s.abs() <= *max)
        };

        for template in &templates {
            for &start in &node_shifts {
                let end = [
                    start[0] + template.shift[0],
                    start[1] + template.shift[1],
                    start[2] + template.shift[2],
                ];
                if inside_shell(end) {
                    graph.insert_bond(
                        PeriodicNode { atom: template.first, shift: start },
                        PeriodicNode { atom: template.second, shift: end },
                        template.bond,
                    );
                }
            }
        }

        return Ok(graph);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    use crate::geometry::Cell;
    use super::*;

    #[test]
    fn diatomic_molecule() {
        let mut structure = Structure::with_cell(Cell::non_periodic());
        structure.add_atom(7, Vector3::new(0.0, 0.0, 0.0));
        structure.add_atom(7, Vector3::new(1.1, 0.0, 0.0));

        let graph = BondGraph::new(&structure, &BondingOptions::default()).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.bond_count(), 1);

        let (neighbor, bond) = graph.bonds_of(PeriodicNode::original(0)).next().unwrap();
        assert_eq!(neighbor, PeriodicNode::original(1));
        assert_relative_eq!(bond.distance, 1.1);
    }

    #[test]
    fn self_bonding_across_short_repeat() {
        // a single Cs atom in a small cubic cell bonds to its own images
        let mut structure = Structure::with_cell(Cell::cubic(2.0).unwrap());
        structure.add_atom(55, Vector3::zeros());

        let graph = BondGraph::new(&structure, &BondingOptions::default()).unwrap();
        assert_eq!(graph.node_count(), 27);

        let origin = PeriodicNode::original(0);
        let image = PeriodicNode { atom: 0, shift: [1, 0, 0] };
        assert!(graph.bonds_of(origin).any(|(neighbor, _)| neighbor == image));
    }

    #[test]
    fn chain_does_not_bond_across_vacuum() {
        // H atoms spaced 0.6 Å along x, 10 Å of vacuum along y and z
        let cell = Cell::new(Matrix3::new(
            1.2, 0.0, 0.0,
            0.0, 10.0, 0.0,
            0.0, 0.0, 10.0,
        ), [true, true, true]).unwrap();
        let mut structure = Structure::with_cell(cell);
        structure.add_atom(1, Vector3::new(0.0, 5.0, 5.0));
        structure.add_atom(1, Vector3::new(0.6, 5.0, 5.0));

        let graph = BondGraph::new(&structure, &BondingOptions::default()).unwrap();
        for (first, second, _) in graph.bonds() {
            let shift = [second.shift[0] - first.shift[0],
                         second.shift[1] - first.shift[1],
                         second.shift[2] - first.shift[2]];
            assert_eq!(shift[1], 0, "unexpected bond along y: {:?} - {:?}", first, second);
            assert_eq!(shift[2], 0, "unexpected bond along z: {:?} - {:?}", first, second);
        }
    }

    #[test]
    fn unknown_species_use_default_radius() {
        let mut structure = Structure::with_cell(Cell::non_periodic());
        structure.add_atom(999, Vector3::new(0.0, 0.0, 0.0));
        structure.add_atom(999, Vector3::new(2.0, 0.0, 0.0));

        let (radii, unknown) = bonding_radii(&structure, 1.0);
        assert_eq!(radii, [1.0, 1.0]);
        assert_eq!(unknown, [(0, 999), (1, 999)]);

        let options = BondingOptions { default_radius: 1.0, ..Default::default() };
        let graph = BondGraph::new(&structure, &options).unwrap();
        assert_eq!(graph.bond_count(), 1);
    }

    #[test]
    fn wider_translation_shell() {
        let cell = Cell::new(Matrix3::new(
            2.0, 0.0, 0.0,
            0.0, 10.0, 0.0,
            0.0, 0.0, 10.0,
        ), [true, false, false]).unwrap();
        let mut structure = Structure::with_cell(cell);
        structure.add_atom(1, Vector3::zeros());

        let options = BondingOptions { max_translation_shell: 2, ..Default::default() };
        let graph = BondGraph::new(&structure, &options).unwrap();
        assert_eq!(graph.shell(), [2, 0, 0]);
        assert_eq!(graph.node_count(), 5);
    }

    #[test]
    fn invalid_options() {
        let structure = Structure::with_cell(Cell::non_periodic());

        let options = BondingOptions { radius_factor: 0.0, ..Default::default() };
        assert!(matches!(
            BondGraph::new(&structure, &options),
            Err(Error::InvalidParameter(_))
        ));

        let mut periodic = Structure::with_cell(Cell::cubic(4.0).unwrap());
        periodic.add_atom(1, Vector3::zeros());
        let options = BondingOptions { max_translation_shell: 0, ..Default::default() };
        assert!(matches!(
            BondGraph::new(&periodic, &options),
            Err(Error::InvalidParameter(_))
        ));
    }
}
