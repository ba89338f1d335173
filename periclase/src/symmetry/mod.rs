//! Boundary to the external space-group database, and the mapping of its
//! results back onto the atoms of the original structure.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use indexmap::IndexMap;
use nalgebra::{Matrix3, Vector3};

use crate::dimensionality::DimensionalityResult;
use crate::regions::RegionAssignment;
use crate::{Error, Structure};

#[cfg(feature = "spglib")]
mod spglib;
#[cfg(feature = "spglib")]
pub use self::spglib::SpglibEngine;

/// The input handed to a [`SymmetryEngine`]: a contiguous description of
/// the primary substructure in the engine's conventions.
#[derive(Debug, Clone)]
pub struct SymmetryRequest {
    /// lattice matrix, one repeat vector per row
    pub lattice: Matrix3<f64>,
    /// positions in fractional coordinates, wrapped into `[0, 1)`
    pub fractional_positions: Vec<Vector3<f64>>,
    /// species (atomic numbers), parallel to the positions
    pub species: Vec<i32>,
    /// symmetry detection tolerance
    pub tolerance: f64,
}

/// Raw result of a symmetry database query, indexed in the contiguous atom
/// space of the [`SymmetryRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryDataset {
    /// space group number (1-230); 1 (identity) is a valid result, not an
    /// error
    pub space_group_number: i32,
    /// international short symbol, e.g. `"Fm-3m"`
    pub international_symbol: String,
    /// Wyckoff letter per atom
    pub wyckoff_letters: Vec<String>,
    /// for each atom, the index of a representative symmetry-equivalent
    /// atom
    pub equivalent_atoms: Vec<usize>,
    /// primitive cell vectors, one per row
    pub primitive_lattice: Matrix3<f64>,
}

/// An external symmetry database.
///
/// Implementations are expected to block until they have an answer; the
/// adapter takes care of timeouts.
pub trait SymmetryEngine: Send + Sync {
    fn find_symmetry(&self, request: &SymmetryRequest) -> Result<SymmetryDataset, Error>;
}

/// Symmetry information mapped back onto the original atom indices.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetrySummary {
    pub space_group_number: i32,
    pub international_symbol: String,
    /// Wyckoff letter of each primary atom, keyed by original atom index
    pub wyckoff_letters: IndexMap<usize, String>,
    /// representative symmetry-equivalent atom of each primary atom, both
    /// sides in original atom indices
    pub equivalent_atoms: IndexMap<usize, usize>,
    /// primitive cell vectors, one per row
    pub primitive_lattice: Matrix3<f64>,
}

/// Parameters of the symmetry analysis.
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(default)]
pub struct SymmetryOptions {
    /// position tolerance handed to the symmetry engine
    pub tolerance: f64,
    /// maximal time (in seconds) to wait for the engine; `None` waits
    /// forever
    pub timeout: Option<f64>,
    /// minimal vacuum (in Ångström) inserted along the non-periodic
    /// direction of 2D structures before querying the engine
    pub min_vacuum: f64,
    /// vacuum inserted for 2D structures, as a multiple of the slab
    /// thickness
    pub vacuum_multiple: f64,
}

impl Default for SymmetryOptions {
    fn default() -> SymmetryOptions {
        SymmetryOptions {
            tolerance: 1e-5,
            timeout: None,
            min_vacuum: 5.0,
            vacuum_multiple: 3.0,
        }
    }
}

/// Query the symmetry of the primary region of a structure and map the
/// result back onto the original atom indices.
///
/// Only called for structures with measured rank ≥ 1. For rank-2 structures
/// the repeat vector along the non-propagating direction is stretched to
/// `max(min_vacuum, vacuum_multiple × thickness)` first, so that no
/// spurious translational symmetry along the vacuum axis survives.
#[time_graph::instrument(name = "analyze_symmetry")]
pub fn analyze_symmetry(
    engine: &Arc<dyn SymmetryEngine>,
    structure: &Structure,
    regions: &RegionAssignment,
    dimensionality: &DimensionalityResult,
    options: &SymmetryOptions,
) -> Result<SymmetrySummary, Error> {
    if !(options.tolerance.is_finite() && options.tolerance > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "symmetry tolerance must be a positive number, got {}", options.tolerance
        )));
    }

    let mapping = regions.primary().collect::<Vec<_>>();
    if mapping.is_empty() {
        return Err(Error::EmptyPrimaryRegion { n_atoms: structure.size() });
    }

    let mut cell = *structure.cell();
    if dimensionality.rank == 2 {
        let axis = dimensionality.propagating.iter()
            .position(|&p| !p)
            .expect("rank 2 leaves one non-propagating direction");
        cell = cell.with_vector(axis, padded_vacuum_vector(structure, regions, axis, options))?;
    }

    let positions = structure.positions();
    let species = structure.species();
    let request = SymmetryRequest {
        lattice: cell.matrix(),
        fractional_positions: mapping.iter()
            .map(|&atom| cell.fractional(positions[atom]).map(|x| x - x.floor()))
            .collect(),
        species: mapping.iter().map(|&atom| species[atom]).collect(),
        tolerance: options.tolerance,
    };

    let dataset = call_engine(engine, request, options.timeout)?;

    if dataset.wyckoff_letters.len() != mapping.len()
        || dataset.equivalent_atoms.len() != mapping.len() {
        return Err(Error::Symmetry(format!(
            "engine returned {} wyckoff letters and {} equivalent atoms for {} atoms",
            dataset.wyckoff_letters.len(), dataset.equivalent_atoms.len(), mapping.len()
        )));
    }

    let mut wyckoff_letters = IndexMap::new();
    let mut equivalent_atoms = IndexMap::new();
    for (contiguous, &original) in mapping.iter().enumerate() {
        wyckoff_letters.insert(original, dataset.wyckoff_letters[contiguous].clone());

        let equivalent = dataset.equivalent_atoms[contiguous];
        let equivalent = *mapping.get(equivalent).ok_or_else(|| Error::Symmetry(format!(
            "engine returned equivalent atom {} outside of the {} input atoms",
            equivalent, mapping.len()
        )))?;
        equivalent_atoms.insert(original, equivalent);
    }

    Ok(SymmetrySummary {
        space_group_number: dataset.space_group_number,
        international_symbol: dataset.international_symbol,
        wyckoff_letters,
        equivalent_atoms,
        primitive_lattice: dataset.primitive_lattice,
    })
}

/// Compute the stretched repeat vector along the non-propagating direction
/// of a 2D structure.
fn padded_vacuum_vector(
    structure: &Structure,
    regions: &RegionAssignment,
    axis: usize,
    options: &SymmetryOptions,
) -> Vector3<f64> {
    let direction = structure.cell().vector(axis);
    let norm = direction.norm();
    let unit = direction / norm;

    let positions = structure.positions();
    let mut low = f64::INFINITY;
    let mut high = f64::NEG_INFINITY;
    for atom in regions.primary() {
        let value = positions[atom].dot(&unit);
        low = f64::min(low, value);
        high = f64::max(high, value);
    }

    let thickness = high - low;
    let length = f64::max(options.min_vacuum, options.vacuum_multiple * thickness);
    return unit * length;
}

/// Run the engine, waiting at most `timeout` seconds for the answer.
fn call_engine(
    engine: &Arc<dyn SymmetryEngine>,
    request: SymmetryRequest,
    timeout: Option<f64>,
) -> Result<SymmetryDataset, Error> {
    let seconds = match timeout {
        None => return engine.find_symmetry(&request),
        Some(seconds) => seconds,
    };

    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "symmetry timeout must be a positive number of seconds, got {}", seconds
        )));
    }

    let (sender, receiver) = mpsc::channel();
    let engine = Arc::clone(engine);
    // if the call outlives the timeout, the worker thread is left behind to
    // finish on its own; the send then fails silently
    thread::spawn(move || {
        let _ = sender.send(engine.find_symmetry(&request));
    });

    match receiver.recv_timeout(Duration::from_secs_f64(seconds)) {
        Ok(result) => result,
        Err(_) => Err(Error::SymmetryTimeout { seconds }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use approx::assert_relative_eq;

    use crate::geometry::Cell;
    use crate::graph::{BondGraph, BondingOptions};
    use crate::regions::{separate_regions, RegionOptions};
    use super::*;

    /// Engine answering with a fixed dataset, recording the requests it
    /// received.
    struct ScriptedEngine {
        dataset: SymmetryDataset,
        requests: Mutex<Vec<SymmetryRequest>>,
    }

    impl ScriptedEngine {
        fn new(dataset: SymmetryDataset) -> ScriptedEngine {
            ScriptedEngine {
                dataset,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl SymmetryEngine for ScriptedEngine {
        fn find_symmetry(&self, request: &SymmetryRequest) -> Result<SymmetryDataset, Error> {
            self.requests.lock().expect("poisoned mutex").push(request.clone());
            Ok(self.dataset.clone())
        }
    }

    struct SleepyEngine;

    impl SymmetryEngine for SleepyEngine {
        fn find_symmetry(&self, _: &SymmetryRequest) -> Result<SymmetryDataset, Error> {
            thread::sleep(Duration::from_secs(10));
            Err(Error::Symmetry("answered after the deadline".into()))
        }
    }

    fn simple_cubic() -> (Structure, RegionAssignment, DimensionalityResult) {
        let mut structure = Structure::with_cell(Cell::cubic(3.0).unwrap());
        structure.add_atom(84, Vector3::zeros());

        let graph = BondGraph::new(&structure, &BondingOptions::default()).unwrap();
        let regions = separate_regions(&graph, &structure, &RegionOptions::default()).unwrap();
        let dimensionality = crate::dimensionality::classify(&graph, &regions, &structure, 7.0).unwrap();
        (structure, regions, dimensionality)
    }

    fn pm3m_dataset() -> SymmetryDataset {
        SymmetryDataset {
            space_group_number: 221,
            international_symbol: "Pm-3m".into(),
            wyckoff_letters: vec!["a".into()],
            equivalent_atoms: vec![0],
            primitive_lattice: Matrix3::identity() * 3.0,
        }
    }

    #[test]
    fn pass_through_on_clean_input() {
        let (structure, regions, dimensionality) = simple_cubic();
        let engine: Arc<dyn SymmetryEngine> = Arc::new(ScriptedEngine::new(pm3m_dataset()));

        let summary = analyze_symmetry(
            &engine, &structure, &regions, &dimensionality, &SymmetryOptions::default()
        ).unwrap();

        assert_eq!(summary.space_group_number, 221);
        assert_eq!(summary.international_symbol, "Pm-3m");
        assert_eq!(summary.wyckoff_letters[&0], "a");
        assert_eq!(summary.equivalent_atoms[&0], 0);
    }

    #[test]
    fn identity_group_is_a_valid_result() {
        let (structure, regions, dimensionality) = simple_cubic();
        let engine: Arc<dyn SymmetryEngine> = Arc::new(ScriptedEngine::new(SymmetryDataset {
            space_group_number: 1,
            international_symbol: "P1".into(),
            wyckoff_letters: vec!["a".into()],
            equivalent_atoms: vec![0],
            primitive_lattice: Matrix3::identity() * 3.0,
        }));

        let summary = analyze_symmetry(
            &engine, &structure, &regions, &dimensionality, &SymmetryOptions::default()
        ).unwrap();
        assert_eq!(summary.space_group_number, 1);
    }

    #[test]
    fn timeout_is_an_error() {
        let (structure, regions, dimensionality) = simple_cubic();
        let engine: Arc<dyn SymmetryEngine> = Arc::new(SleepyEngine);

        let options = SymmetryOptions {
            timeout: Some(0.05),
            ..Default::default()
        };
        let result = analyze_symmetry(&engine, &structure, &regions, &dimensionality, &options);
        assert!(matches!(result, Err(Error::SymmetryTimeout { .. })));
    }

    #[test]
    fn mismatched_engine_output_is_rejected() {
        let (structure, regions, dimensionality) = simple_cubic();
        let engine: Arc<dyn SymmetryEngine> = Arc::new(ScriptedEngine::new(SymmetryDataset {
            wyckoff_letters: vec!["a".into(), "b".into()],
            ..pm3m_dataset()
        }));

        let result = analyze_symmetry(
            &engine, &structure, &regions, &dimensionality, &SymmetryOptions::default()
        );
        assert!(matches!(result, Err(Error::Symmetry(_))));
    }

    #[test]
    fn vacuum_is_stretched_for_2d_structures() {
        // a flat sheet along x and y, 20 Å of declared cell along z
        let cell = Cell::new(nalgebra::Matrix3::new(
            2.5, 0.0, 0.0,
            0.0, 2.5, 0.0,
            0.0, 0.0, 20.0,
        ), [true, true, false]).unwrap();
        let mut structure = Structure::with_cell(cell);
        structure.add_atom(26, Vector3::new(0.0, 0.0, 9.0));
        structure.add_atom(26, Vector3::new(0.0, 0.0, 10.0));

        let graph = BondGraph::new(&structure, &BondingOptions::default()).unwrap();
        let regions = separate_regions(&graph, &structure, &RegionOptions::default()).unwrap();
        let dimensionality = crate::dimensionality::classify(&graph, &regions, &structure, 7.0).unwrap();
        assert_eq!(dimensionality.rank, 2);

        let scripted = Arc::new(ScriptedEngine::new(SymmetryDataset {
            wyckoff_letters: vec!["a".into(), "a".into()],
            equivalent_atoms: vec![0, 0],
            ..pm3m_dataset()
        }));
        let engine: Arc<dyn SymmetryEngine> = scripted.clone();

        analyze_symmetry(
            &engine, &structure, &regions, &dimensionality, &SymmetryOptions::default()
        ).unwrap();

        let requests = scripted.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        // thickness is 1 Å, so the vacuum axis shrinks to min_vacuum = 5 Å
        let lattice = requests[0].lattice;
        assert_relative_eq!(lattice.row(2).norm(), 5.0);
        // the in-plane vectors are untouched
        assert_relative_eq!(lattice.row(0).norm(), 2.5);
    }
}
