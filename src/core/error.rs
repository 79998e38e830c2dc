use thiserror::Error;

/// Error encountered while constructing compositions or solutions from
/// caller-supplied data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The number of masses in the formulation does not match the number of
    /// fertilizers.
    #[error("formulation has {formulation} entries but there are {fertilizers} fertilizers")]
    FormulationMismatch {
        /// Number of fertilizers.
        fertilizers: usize,
        /// Length of the formulation.
        formulation: usize,
    },
    /// The fertilizers alone weigh more than the whole solution.
    #[error("fertilizer mass {formulation} kg exceeds total mass {total} kg")]
    MassExceeded {
        /// Sum of the formulation.
        formulation: f64,
        /// Total mass of the solution.
        total: f64,
    },
    /// The total mass is negative or not finite.
    #[error("invalid total mass {0} kg")]
    InvalidMass(f64),
    /// Raw nutrient data of a wrong length.
    #[error("expected {expected} nutrient ratios, got {actual}")]
    InvalidShape {
        /// Length of the stencil.
        expected: usize,
        /// Length of the given data.
        actual: usize,
    },
    /// Solutions made of different water or fertilizers cannot be combined.
    #[error("solutions of different compositions cannot be combined")]
    MixtureMismatch,
    /// The nutrient identifier is not part of the stencil.
    #[error("unknown nutrient `{0}`")]
    UnknownNutrient(String),
}

/// Error encountered while evaluating a solution or running the optimizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid input data.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The quantity depends on the target composition which was not assigned
    /// to the solution.
    #[error("target composition is not set")]
    TargetNotSet,
    /// Matrix decomposition failed.
    #[error("decomposition failed: {0}")]
    Decomposition(&'static str),
}
