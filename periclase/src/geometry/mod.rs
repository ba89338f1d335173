//! Geometric quantities derived from an atomic structure: minimum-image
//! distances, pairwise distance matrices and vacuum gap detection.

use ndarray::Array2;

use crate::Structure;

mod cell;
pub use self::cell::Cell;

/// Compute the full pairwise minimum-image distance matrix of a structure.
///
/// The matrix is symmetric with zeros on the diagonal. This is the
/// precomputed metric handed to the density clustering in the region
/// separator.
pub fn distance_matrix(structure: &Structure) -> Array2<f64> {
    let positions = structure.positions();
    let cell = structure.cell();

    let n_atoms = positions.len();
    let mut distances = Array2::zeros((n_atoms, n_atoms));
    for i in 0..n_atoms {
        for j in (i + 1)..n_atoms {
            let distance = cell.distance(positions[i], positions[j]);
            distances[[i, j]] = distance;
            distances[[j, i]] = distance;
        }
    }

    return distances;
}

/// Search for vacuum gaps separating the periodic copies of the structure.
///
/// For each periodic direction, the fractional coordinates of all atoms are
/// sorted and the largest gap between consecutive atoms (including the gap
/// wrapping around the cell boundary) is converted to a Cartesian length and
/// compared against `threshold`. Non-periodic directions always count as
/// having a vacuum gap.
pub fn find_vacuum_gaps(structure: &Structure, threshold: f64) -> [bool; 3] {
    let cell = structure.cell();
    let positions = structure.positions();
    if positions.is_empty() {
        return [true; 3];
    }

    let mut gaps = [true; 3];
    for axis in 0..3 {
        if !cell.is_periodic(axis) {
            continue;
        }

        let mut fractional = positions.iter()
            .map(|&p| {
                let f = cell.fractional(p)[axis];
                f - f.floor()
            })
            .collect::<Vec<_>>();
        fractional.sort_unstable_by(|a, b| a.partial_cmp(b).expect("NaN in positions"));

        // the gap from the last atom around the boundary back to the first
        let mut max_gap = fractional[0] + 1.0 - fractional[fractional.len() - 1];
        for window in fractional.windows(2) {
            max_gap = f64::max(max_gap, window[1] - window[0]);
        }

        let gap_cartesian = max_gap * cell.vector(axis).norm();
        gaps[axis] = gap_cartesian >= threshold;
    }

    return gaps;
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use super::*;
    use crate::Structure;

    #[test]
    fn distances_in_cubic_cell() {
        let cell = Cell::cubic(10.0).unwrap();
        let structure = Structure::new(
            vec![1, 1, 1],
            vec![
                Vector3::new(0.5, 0.5, 0.5),
                Vector3::new(1.5, 0.5, 0.5),
                Vector3::new(9.5, 0.5, 0.5),
            ],
            cell,
        ).unwrap();

        let distances = distance_matrix(&structure);
        assert_eq!(distances[[0, 0]], 0.0);
        assert_relative_eq!(distances[[0, 1]], 1.0);
        // wraps around the periodic boundary
        assert_relative_eq!(distances[[0, 2]], 1.0);
        assert_relative_eq!(distances[[1, 2]], 2.0);
        assert_eq!(distances[[2, 1]], distances[[1, 2]]);
    }

    #[test]
    fn vacuum_gaps_slab() {
        // two atomic layers in a 20 Å tall cell, vacuum along z only
        let cell = Cell::orthorhombic(2.0, 2.0, 20.0).unwrap();
        let structure = Structure::new(
            vec![26, 26],
            vec![
                Vector3::new(0.0, 0.0, 9.0),
                Vector3::new(0.0, 0.0, 11.0),
            ],
            cell,
        ).unwrap();

        assert_eq!(find_vacuum_gaps(&structure, 7.0), [false, false, true]);
    }

    #[test]
    fn vacuum_gaps_isolated_atom() {
        let cell = Cell::cubic(10.0).unwrap();
        let structure = Structure::new(
            vec![1],
            vec![Vector3::new(5.0, 5.0, 5.0)],
            cell,
        ).unwrap();

        assert_eq!(find_vacuum_gaps(&structure, 7.0), [true, true, true]);
    }
}
