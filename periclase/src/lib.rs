//! Periclase analyzes atomic structures — species, Cartesian positions and
//! an optional periodic repeat cell — and determines their geometric
//! dimensionality (isolated cluster, chain, surface/sheet or bulk crystal)
//! together with their symmetry.
//!
//! The pipeline builds a bond graph over the original cell and a bounded
//! shell of periodic repeats, separates the dominant bonded network from
//! outlier atoms (adsorbates, noise), measures along how many lattice
//! directions the network propagates, and delegates the symmetry of
//! periodic results to an external space-group database.

#![warn(clippy::all, clippy::pedantic)]

// disable some style lints
#![allow(clippy::needless_return, clippy::must_use_candidate, clippy::comparison_chain)]
#![allow(clippy::redundant_field_names, clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unreadable_literal, clippy::option_if_let_else, clippy::range_plus_one)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::module_name_repetitions)]

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap, clippy::cast_lossless, clippy::cast_sign_loss)]
#![allow(clippy::default_trait_access)]

// Tests lints
#![cfg_attr(test, allow(clippy::float_cmp))]

mod errors;
pub use self::errors::Error;

pub mod elements;

pub mod geometry;
pub use self::geometry::Cell;

mod structure;
pub use self::structure::Structure;

pub mod graph;
pub use self::graph::{BondGraph, BondingOptions, PeriodicNode};

pub mod regions;
pub use self::regions::{Region, RegionAssignment, RegionOptions};

pub mod dimensionality;
pub use self::dimensionality::DimensionalityResult;

pub mod symmetry;
pub use self::symmetry::{SymmetryEngine, SymmetryOptions, SymmetrySummary};

mod classifier;
pub use self::classifier::{Classifier, ClassifierOptions};
pub use self::classifier::{ClassificationResult, StructureClass, Subtype};
