use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use rand::Rng;
use rand_distr::{StandardNormal, Uniform};

use super::emission::{EmissionDistribution, EmissionError, SampleEmission};

// Randomly initialized means fall in [MEAN_MIN, MEAN_MAX)
pub(crate) const MEAN_MIN: f64 = 0.0;
pub(crate) const MEAN_MAX: f64 = 1.0;
// Noise std as a fraction of the mean range, same defaults as random states use
pub(crate) const STD_MIN_FRACTION: f64 = 1.0 / 20.0;
pub(crate) const STD_MAX_FRACTION: f64 = 1.0 / 5.0;

/// Multivariate Gaussian emission density.
#[derive(Debug, Clone)]
pub struct GaussianEmission {
    mean: DVector<f64>,     // Mean vector
    cov: DMatrix<f64>,      // Covariance matrix
    cholesky: Option<Cholesky<f64, Dyn>>,  // Cholesky decomposition for sampling
}

impl GaussianEmission {
    pub fn new(mean: DVector<f64>, cov: DMatrix<f64>) -> Result<Self, EmissionError> {
        if mean.is_empty() {
            return Err(EmissionError::InvalidDimensions { num_dims: 0 });
        }
        if cov.nrows() != mean.len() || cov.ncols() != mean.len() {
            return Err(EmissionError::IncompatibleShapes {
                mean_dims: mean.len(),
                cov_rows: cov.nrows(),
                cov_cols: cov.ncols(),
            });
        }

        let cholesky = Cholesky::new(cov.clone())
            .ok_or(EmissionError::InvalidCovMatrix)?;

        Ok(Self { mean, cov, cholesky: Some(cholesky) })
    }

    pub fn get_mean_cov(&self) -> (&DVector<f64>, &DMatrix<f64>) {
        (&self.mean, &self.cov)
    }
}

impl Default for GaussianEmission {
    // Zero-dimensional placeholder until init is called
    fn default() -> Self {
        Self {
            mean: DVector::zeros(0),
            cov: DMatrix::zeros(0, 0),
            cholesky: None,
        }
    }
}

impl EmissionDistribution for GaussianEmission {
    // Standard normal over num_dims dimensions
    fn init(&mut self, num_dims: usize) -> Result<(), EmissionError> {
        if num_dims == 0 {
            return Err(EmissionError::InvalidDimensions { num_dims });
        }

        let cov = DMatrix::identity(num_dims, num_dims);
        let cholesky = Cholesky::new(cov.clone())
            .ok_or(EmissionError::InvalidCovMatrix)?;

        self.mean = DVector::zeros(num_dims);
        self.cov = cov;
        self.cholesky = Some(cholesky);

        Ok(())
    }

    fn randomly_initialize<R: Rng>(&mut self, rng: &mut R) -> Result<(), EmissionError> {
        let num_dims = self.mean.len();
        if num_dims == 0 {
            return Err(EmissionError::Uninitialized);
        }

        let value_range = MEAN_MAX - MEAN_MIN;
        let mean_dist = Uniform::new(MEAN_MIN, MEAN_MAX);
        let std_dist = Uniform::new_inclusive(
            value_range * STD_MIN_FRACTION,
            value_range * STD_MAX_FRACTION,
        );

        let mean = DVector::from_fn(num_dims, |_, _| rng.sample(&mean_dist));
        let variances = DVector::from_fn(num_dims, |_, _| rng.sample(&std_dist).powi(2));
        let cov = DMatrix::from_diagonal(&variances);

        let cholesky = Cholesky::new(cov.clone())
            .ok_or(EmissionError::InvalidCovMatrix)?;

        self.mean = mean;
        self.cov = cov;
        self.cholesky = Some(cholesky);

        Ok(())
    }

    fn location(&self) -> &DVector<f64> {
        &self.mean
    }

    fn spread(&self) -> &DMatrix<f64> {
        &self.cov
    }
}

impl SampleEmission for GaussianEmission {
    // Sample using the Cholesky factor: mean + L z, z ~ N(0, I)
    fn sample<R: Rng>(&self, rng: &mut R) -> Result<DVector<f64>, EmissionError> {
        let cholesky = self.cholesky.as_ref().ok_or(EmissionError::Uninitialized)?;

        let z: DVector<f64> = DVector::from_fn(self.mean.len(), |_, _| rng.sample(StandardNormal));

        Ok(&self.mean + cholesky.l() * z)
    }
}
