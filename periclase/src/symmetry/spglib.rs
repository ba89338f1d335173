use nalgebra::Matrix3;

use crate::Error;

use super::{SymmetryDataset, SymmetryEngine, SymmetryRequest};

/// [`SymmetryEngine`] backed by the spglib space-group database.
pub struct SpglibEngine;

impl SymmetryEngine for SpglibEngine {
    fn find_symmetry(&self, request: &SymmetryRequest) -> Result<SymmetryDataset, Error> {
        let lattice = [
            [request.lattice[(0, 0)], request.lattice[(0, 1)], request.lattice[(0, 2)]],
            [request.lattice[(1, 0)], request.lattice[(1, 1)], request.lattice[(1, 2)]],
            [request.lattice[(2, 0)], request.lattice[(2, 1)], request.lattice[(2, 2)]],
        ];
        let positions = request.fractional_positions.iter()
            .map(|p| [p.x, p.y, p.z])
            .collect::<Vec<_>>();
        let types = request.species.clone();

        let mut cell = spglib::cell::Cell::new(&lattice, &positions, &types);
        let dataset = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            spglib::dataset::Dataset::new(&mut cell, request.tolerance)
        })).map_err(|_| Error::Symmetry(
            "spglib could not determine the symmetry of the structure".into()
        ))?;

        let wyckoff_letters = dataset.wyckoffs.iter()
            .map(|&w| wyckoff_letter(w))
            .collect::<Result<Vec<_>, Error>>()?;

        let equivalent_atoms = dataset.equivalent_atoms.iter()
            .map(|&atom| atom as usize)
            .collect();

        let primitive = dataset.primitive_lattice;
        let primitive_lattice = Matrix3::new(
            primitive[0][0], primitive[0][1], primitive[0][2],
            primitive[1][0], primitive[1][1], primitive[1][2],
            primitive[2][0], primitive[2][1], primitive[2][2],
        );

        Ok(SymmetryDataset {
            space_group_number: dataset.spacegroup_number,
            international_symbol: dataset.international_symbol.clone(),
            wyckoff_letters,
            equivalent_atoms,
            primitive_lattice,
        })
    }
}

fn wyckoff_letter(index: i32) -> Result<String, Error> {
    const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzA";
    let index = index as usize;
    LETTERS.get(index..index + 1)
        .map(|letter| letter.to_string())
        .ok_or_else(|| Error::Symmetry(format!("invalid wyckoff position index {}", index)))
}
