//! The `Cell` type represents the repeat vectors of an atomic structure,
//! together with a periodic/non-periodic flag for each direction.

use nalgebra::{Matrix3, Vector3};

use crate::Error;

/// Relative volume below which a cell with at least one periodic direction
/// is considered degenerate.
const DEGENERATE_VOLUME_THRESHOLD: f64 = 1e-9;

/// A `Cell` defines the repeat vectors of a structure and which of the three
/// directions are periodic.
///
/// The cell matrix is stored in row-major convention: the first row is the
/// first repeat vector, and so on. Directions which are not periodic still
/// carry a repeat vector (describing the finite extent of the structure
/// along that direction), but no periodic images are ever generated along
/// them. A structure without any repeat vectors uses [`Cell::non_periodic`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Cell matrix, one repeat vector per row
    matrix: Matrix3<f64>,
    /// Transpose of the cell matrix, cached from matrix
    transpose: Matrix3<f64>,
    /// Inverse of the transpose, cached from matrix. Identity for fully
    /// non-periodic cells, where it is never used.
    inverse: Matrix3<f64>,
    /// Which directions are periodic
    periodic: [bool; 3],
}

impl Cell {
    /// Create a cell without any periodic direction and no repeat vectors.
    pub fn non_periodic() -> Cell {
        Cell {
            matrix: Matrix3::zeros(),
            transpose: Matrix3::zeros(),
            inverse: Matrix3::identity(),
            periodic: [false; 3],
        }
    }

    /// Create a cell from the given matrix (one repeat vector per row) and
    /// periodic flags.
    ///
    /// If at least one direction is periodic, the matrix must be invertible
    /// so that fractional coordinates are well defined; a (nearly) singular
    /// matrix is reported as [`Error::DegenerateCell`].
    pub fn new(matrix: Matrix3<f64>, periodic: [bool; 3]) -> Result<Cell, Error> {
        if periodic == [false; 3] && matrix == Matrix3::zeros() {
            return Ok(Cell::non_periodic());
        }

        let volume = matrix.determinant();
        let scale = matrix.row(0).norm() * matrix.row(1).norm() * matrix.row(2).norm();
        if volume.abs() <= DEGENERATE_VOLUME_THRESHOLD * scale || scale == 0.0 {
            return Err(Error::DegenerateCell { volume });
        }

        let transpose = matrix.transpose();
        let inverse = transpose.try_inverse().ok_or(Error::DegenerateCell { volume })?;

        Ok(Cell {
            matrix,
            transpose,
            inverse,
            periodic,
        })
    }

    /// Create a fully periodic cubic cell with the given side length.
    pub fn cubic(length: f64) -> Result<Cell, Error> {
        Cell::orthorhombic(length, length, length)
    }

    /// Create a fully periodic orthorhombic cell with side lengths `a, b, c`.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<Cell, Error> {
        Cell::new(Matrix3::new(
            a, 0.0, 0.0,
            0.0, b, 0.0,
            0.0, 0.0, c,
        ), [true; 3])
    }

    /// Get the cell matrix, one repeat vector per row.
    pub fn matrix(&self) -> Matrix3<f64> {
        self.matrix
    }

    /// Get the repeat vector for the given direction.
    pub fn vector(&self, axis: usize) -> Vector3<f64> {
        self.matrix.row(axis).transpose()
    }

    /// Create a copy of this cell with the repeat vector along `axis`
    /// replaced by `vector`.
    pub fn with_vector(&self, axis: usize, vector: Vector3<f64>) -> Result<Cell, Error> {
        let mut matrix = self.matrix;
        matrix.set_row(axis, &vector.transpose());
        Cell::new(matrix, self.periodic)
    }

    /// Get the periodic flags of this cell.
    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    /// Check whether the given direction is periodic.
    pub fn is_periodic(&self, axis: usize) -> bool {
        self.periodic[axis]
    }

    /// Count the periodic directions of this cell.
    pub fn periodic_count(&self) -> usize {
        self.periodic.iter().filter(|&&p| p).count()
    }

    /// Check whether any direction of this cell is periodic.
    pub fn any_periodic(&self) -> bool {
        self.periodic.iter().any(|&p| p)
    }

    /// Get the volume of the cell, zero for fully non-periodic cells.
    pub fn volume(&self) -> f64 {
        if self.matrix == Matrix3::zeros() {
            return 0.0;
        }
        self.matrix.determinant().abs()
    }

    /// Get the fractional representation of a Cartesian vector in this cell.
    pub fn fractional(&self, cartesian: Vector3<f64>) -> Vector3<f64> {
        self.inverse * cartesian
    }

    /// Get the Cartesian representation of a fractional vector in this cell.
    pub fn cartesian(&self, fractional: Vector3<f64>) -> Vector3<f64> {
        self.transpose * fractional
    }
}

/// Geometric operations under periodic boundary conditions
impl Cell {
    /// Apply the minimum-image convention to the Cartesian displacement
    /// `delta`, returning the shortest equivalent displacement and its norm.
    ///
    /// Periodic directions are first wrapped into `[-0.5, 0.5)` fractional
    /// coordinates; the exact image is then selected among the 27 (±1, 0
    /// per periodic axis) neighboring translations, which is required for
    /// strongly skewed cells. Non-periodic directions pass through
    /// unchanged.
    pub fn minimum_image(&self, delta: Vector3<f64>) -> (Vector3<f64>, f64) {
        if !self.any_periodic() {
            return (delta, delta.norm());
        }

        let mut fractional = self.fractional(delta);
        for axis in 0..3 {
            if self.periodic[axis] {
                fractional[axis] -= fractional[axis].round();
            }
        }

        let search = |axis: usize| -> &'static [i32] {
            if self.periodic[axis] { &[-1, 0, 1] } else { &[0] }
        };

        let mut best = self.cartesian(fractional);
        let mut best_norm2 = best.norm_squared();
        for &sa in search(0) {
            for &sb in search(1) {
                for &sc in search(2) {
                    let shifted = self.cartesian(fractional + Vector3::new(
                        sa as f64, sb as f64, sc as f64,
                    ));
                    let norm2 = shifted.norm_squared();
                    if norm2 < best_norm2 {
                        best = shifted;
                        best_norm2 = norm2;
                    }
                }
            }
        }

        (best, best_norm2.sqrt())
    }

    /// Minimum-image distance between the points `u` and `v`.
    pub fn distance(&self, u: Vector3<f64>, v: Vector3<f64>) -> f64 {
        self.minimum_image(v - u).1
    }
}
