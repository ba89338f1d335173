#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum Error {
    /// Got an invalid parameter value in a function
    InvalidParameter(String),
    /// The cell matrix of a periodic structure is (nearly) singular, making
    /// fractional coordinates and minimum-image computations meaningless
    DegenerateCell {
        /// volume of the offending cell
        volume: f64,
    },
    /// The bond graph propagates connectivity along a direction which the
    /// input structure did not declare as periodic. This indicates a broken
    /// input or a bug in the graph builder, not a borderline geometry.
    InconsistentPeriodicity {
        /// index of the offending lattice direction
        axis: usize,
        /// periodic flags declared on the input structure
        declared: [bool; 3],
        /// directions measured to propagate connectivity
        measured: [bool; 3],
    },
    /// The external symmetry engine did not answer within the configured
    /// timeout
    SymmetryTimeout {
        /// how long we waited, in seconds
        seconds: f64,
    },
    /// Region separation left no atom in the primary region
    EmptyPrimaryRegion {
        /// number of atoms in the input structure
        n_atoms: usize,
    },
    /// The external symmetry engine reported a failure
    Symmetry(String),
    /// Error while serializing/deserializing data
    Json(String),
    /// Internal error, indicating a bug in this crate
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::DegenerateCell { volume } => write!(
                f, "degenerate cell: volume is {:.6e}, fractional coordinates are undefined", volume
            ),
            Error::InconsistentPeriodicity { axis, declared, measured } => write!(
                f, "connectivity propagates along direction {} which is not declared \
                periodic (declared: {:?}, measured: {:?})", axis, declared, measured
            ),
            Error::SymmetryTimeout { seconds } => write!(
                f, "symmetry engine did not answer after {} seconds", seconds
            ),
            Error::EmptyPrimaryRegion { n_atoms } => write!(
                f, "region separation left no primary atoms in a structure with {} atoms", n_atoms
            ),
            Error::Symmetry(e) => write!(f, "symmetry engine error: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error.to_string())
    }
}
