use nalgebra::{DMatrix, DVector};
use rand::Rng;
use thiserror::Error;

/// Per-state emission density the model owns one of per state.
///
/// The model never evaluates densities itself. It only sizes the distributions,
/// asks them to pick random parameters and reads their location and spread when
/// rendering reports.
pub trait EmissionDistribution {
    // Allocate/reset parameters for the given number of observation dimensions
    fn init(&mut self, num_dims: usize) -> Result<(), EmissionError>;

    // Pick randomized but valid parameters
    fn randomly_initialize<R: Rng>(&mut self, rng: &mut R) -> Result<(), EmissionError>;

    fn location(&self) -> &DVector<f64>;

    fn spread(&self) -> &DMatrix<f64>;

    fn num_dims(&self) -> usize {
        self.location().len()
    }
}

/// Emission distributions that can also produce observations.
pub trait SampleEmission: EmissionDistribution {
    fn sample<R: Rng>(&self, rng: &mut R) -> Result<DVector<f64>, EmissionError>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmissionError {
    #[error("emission dimensionality must be positive, got {num_dims}")]
    InvalidDimensions { num_dims: usize },
    #[error("covariance matrix is not positive definite")]
    InvalidCovMatrix,
    #[error("mean has {mean_dims} dimensions but covariance is {cov_rows}x{cov_cols}")]
    IncompatibleShapes { mean_dims: usize, cov_rows: usize, cov_cols: usize },
    #[error("emission distribution has not been given parameters yet")]
    Uninitialized,
}
