use nalgebra::Vector3;

use crate::geometry::Cell;
use crate::{elements, Error};

/// An atomic structure: an ordered list of atoms with their species and
/// Cartesian positions, together with the [`Cell`] describing its repeat
/// vectors and periodicity.
///
/// Species are identified by atomic number, following the convention that
/// they are plain `i32` values; unknown values are accepted and only affect
/// bond detection through the default-radius fallback.
#[derive(Debug, Clone)]
pub struct Structure {
    species: Vec<i32>,
    positions: Vec<Vector3<f64>>,
    cell: Cell,
}

impl Structure {
    /// Create a structure from parallel `species` and `positions` arrays.
    pub fn new(species: Vec<i32>, positions: Vec<Vector3<f64>>, cell: Cell) -> Result<Structure, Error> {
        if species.len() != positions.len() {
            return Err(Error::InvalidParameter(format!(
                "got {} species for {} positions", species.len(), positions.len()
            )));
        }

        for (i, position) in positions.iter().enumerate() {
            if !(position.x.is_finite() && position.y.is_finite() && position.z.is_finite()) {
                return Err(Error::InvalidParameter(format!(
                    "position of atom {} is not finite: {:?}", i, position
                )));
            }
        }

        Ok(Structure { species, positions, cell })
    }

    /// Create an empty structure with the given cell, to be filled with
    /// [`Structure::add_atom`].
    pub fn with_cell(cell: Cell) -> Structure {
        Structure {
            species: Vec::new(),
            positions: Vec::new(),
            cell,
        }
    }

    /// Add an atom with the given species and position to this structure.
    pub fn add_atom(&mut self, species: i32, position: Vector3<f64>) {
        self.species.push(species);
        self.positions.push(position);
    }

    /// Add an atom identified by its element symbol, e.g. `"Si"`.
    pub fn add_atom_symbol(&mut self, symbol: &str, position: Vector3<f64>) -> Result<(), Error> {
        let species = elements::atomic_number(symbol).ok_or_else(|| Error::InvalidParameter(
            format!("unknown element symbol '{}'", symbol)
        ))?;
        self.add_atom(species, position);
        Ok(())
    }

    /// Get the number of atoms in this structure.
    pub fn size(&self) -> usize {
        self.species.len()
    }

    /// Get the species (atomic numbers) of all atoms.
    pub fn species(&self) -> &[i32] {
        &self.species
    }

    /// Get the Cartesian positions of all atoms.
    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    /// Get the cell of this structure.
    pub fn cell(&self) -> &Cell {
        &self.cell
    }
}
