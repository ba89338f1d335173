use std::sync::Arc;

use log::warn;
use rayon::prelude::*;

use crate::dimensionality::{self, DimensionalityResult};
use crate::graph::{bonding_radii, BondGraph, BondingOptions};
use crate::regions::{separate_regions, RegionAssignment, RegionOptions};
use crate::symmetry::{analyze_symmetry, SymmetryEngine, SymmetryOptions, SymmetrySummary};
use crate::{Error, Structure};

/// The primary classification of a structure, by the number of directions
/// its bonded network extends infinitely along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureClass {
    Class0D,
    Class1D,
    Class2D,
    Class3D,
}

/// A finer-grained tag for the structure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subtype {
    /// finite, isolated group of atoms
    Cluster,
    /// periodic along a single direction
    Chain,
    /// two-dimensional network with adsorbates or other material in the
    /// third direction
    Surface,
    /// two-dimensional network surrounded by pure vacuum
    TwoDMaterial,
    /// periodic along all three directions
    Bulk,
    /// no subtype could be determined
    Unknown,
}

/// Everything a single classification call produces. Immutable once
/// returned; independent of any other call.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub class: StructureClass,
    pub subtype: Subtype,
    pub dimensionality: DimensionalityResult,
    pub regions: RegionAssignment,
    /// symmetry of the primary region, present when the measured rank is at
    /// least 1 and a symmetry engine is configured
    pub symmetry: Option<SymmetrySummary>,
    /// non-fatal conditions encountered during the analysis
    pub warnings: Vec<String>,
}

/// All the tunable parameters of a [`Classifier`], threaded explicitly
/// through every call so that classifications stay independent.
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(default)]
pub struct ClassifierOptions {
    pub bonding: BondingOptions,
    pub regions: RegionOptions,
    pub symmetry: SymmetryOptions,
    /// Minimal Cartesian gap (in Ångström) counting as vacuum, both for
    /// the per-direction gap detection and for deciding whether a 2D
    /// network is a standalone material or a surface.
    pub vacuum_threshold: f64,
}

impl Default for ClassifierOptions {
    fn default() -> ClassifierOptions {
        ClassifierOptions {
            bonding: BondingOptions::default(),
            regions: RegionOptions::default(),
            symmetry: SymmetryOptions::default(),
            vacuum_threshold: 7.0,
        }
    }
}

/// Orchestrates the full classification pipeline: bond graph construction,
/// region separation, dimensionality measurement and symmetry analysis.
pub struct Classifier {
    options: ClassifierOptions,
    engine: Option<Arc<dyn SymmetryEngine>>,
}

impl Classifier {
    /// Create a classifier with the given options and no symmetry engine;
    /// periodic structures will then carry no symmetry summary.
    pub fn new(options: ClassifierOptions) -> Result<Classifier, Error> {
        if !(options.vacuum_threshold.is_finite() && options.vacuum_threshold > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "vacuum_threshold must be a positive number, got {}", options.vacuum_threshold
            )));
        }

        Ok(Classifier { options, engine: None })
    }

    /// Attach the external symmetry engine consulted for structures with
    /// measured rank ≥ 1.
    pub fn with_engine(mut self, engine: Arc<dyn SymmetryEngine>) -> Classifier {
        self.engine = Some(engine);
        return self;
    }

    /// Get the parameters used to create this classifier as a JSON string.
    pub fn parameters(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.options)?)
    }

    /// Classify a single structure.
    ///
    /// The declared periodicity of the input is treated as a hint: the rank
    /// measured on the primary bonded network is authoritative, and when
    /// outlier removal changes the measured rank the primary-region result
    /// wins. The input structure is never modified.
    #[time_graph::instrument(name = "Classifier::classify")]
    pub fn classify(&self, structure: &Structure) -> Result<ClassificationResult, Error> {
        let mut warnings = Vec::new();
        let (_, unknown) = bonding_radii(structure, self.options.bonding.default_radius);
        for (atom, species) in unknown {
            warnings.push(format!(
                "species {} of atom {} has no tabulated covalent radius, \
                used the default of {} Å", species, atom, self.options.bonding.default_radius
            ));
        }

        let graph = BondGraph::new(structure, &self.options.bonding)?;
        let regions = separate_regions(&graph, structure, &self.options.regions)?;

        let dimensionality = dimensionality::classify(
            &graph, &regions, structure, self.options.vacuum_threshold
        )?;

        if regions.n_outliers() > 0 {
            let before = dimensionality::classify(
                &graph,
                &RegionAssignment::all_primary(structure.size()),
                structure,
                self.options.vacuum_threshold,
            )?;
            if before.rank != dimensionality.rank {
                warn!(
                    "outlier removal changed the measured rank from {} to {}, \
                    keeping the primary-region result",
                    before.rank, dimensionality.rank
                );
            }
        }

        let class = match dimensionality.rank {
            0 => StructureClass::Class0D,
            1 => StructureClass::Class1D,
            2 => StructureClass::Class2D,
            3 => StructureClass::Class3D,
            rank => return Err(Error::Internal(format!("measured rank {} out of range", rank))),
        };

        let subtype = match dimensionality.rank {
            0 => Subtype::Cluster,
            1 => Subtype::Chain,
            2 => self.surface_or_2d(structure, &regions, &dimensionality),
            3 => Subtype::Bulk,
            _ => Subtype::Unknown,
        };

        let symmetry = if dimensionality.rank >= 1 {
            match &self.engine {
                Some(engine) => Some(analyze_symmetry(
                    engine, structure, &regions, &dimensionality, &self.options.symmetry
                )?),
                None => {
                    warnings.push("no symmetry engine configured, skipped the symmetry analysis".into());
                    None
                }
            }
        } else {
            None
        };

        Ok(ClassificationResult {
            class,
            subtype,
            dimensionality,
            regions,
            symmetry,
            warnings,
        })
    }

    /// Classify many structures in parallel. Each structure is independent:
    /// one failing classification never affects the others.
    pub fn classify_batch(&self, structures: &[Structure]) -> Vec<Result<ClassificationResult, Error>> {
        structures.par_iter().map(|structure| self.classify(structure)).collect()
    }

    /// A 2D network surrounded by pure vacuum along its non-propagating
    /// direction is a standalone 2D material; anything occupying that space
    /// makes it a surface.
    fn surface_or_2d(
        &self,
        structure: &Structure,
        regions: &RegionAssignment,
        dimensionality: &DimensionalityResult,
    ) -> Subtype {
        let clear = (0..3)
            .filter(|&axis| !dimensionality.propagating[axis])
            .all(|axis| dimensionality::vacuum_is_clear(
                structure, regions, axis, self.options.vacuum_threshold
            ));

        if clear { Subtype::TwoDMaterial } else { Subtype::Surface }
    }
}

impl Default for Classifier {
    fn default() -> Classifier {
        Classifier::new(ClassifierOptions::default()).expect("default options are valid")
    }
}
