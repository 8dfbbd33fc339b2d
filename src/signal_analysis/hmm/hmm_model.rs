use nalgebra::DMatrix;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use super::emission::{EmissionDistribution, EmissionError};
use super::gaussian_emission::GaussianEmission;
use super::hmm_matrices::{MatrixValidationError, ProbabilityMatrix, StartMatrix, TransitionMatrix};
use super::setup::{CumulativeRefresh, InitMethod, ModelSetup};

/// Discrete-state HMM with one emission distribution per state.
///
/// Owns the start and transition matrices and the derived tables built from
/// them. A derived table is `None` until it is computed and is dropped again
/// whenever one of its source matrices is replaced.
#[derive(Debug, Clone)]
pub struct HMMModel<D: EmissionDistribution = GaussianEmission> {
    num_states: usize,
    num_dims: usize,
    time_horizon: usize,

    start_matrix: StartMatrix,
    transition_matrix: TransitionMatrix,
    emissions: Vec<D>,

    cumulative_refresh: CumulativeRefresh,

    // Set once an initializer or validated setter has filled the matrix
    start_ready: bool,
    transition_ready: bool,

    // P(q_t = s_i), states along rows, time steps along columns
    pub(super) marginals: Option<DMatrix<f64>>,
    // Running sum of each marginals column down the state axis
    pub(super) marginal_cumulative: Option<DMatrix<f64>>,
    // Column i holds the running sum of transition row i
    pub(super) transition_cumulative: Option<DMatrix<f64>>,
}

impl<D: EmissionDistribution + Default> HMMModel<D> {
    /// Allocates a model with zeroed matrices and `num_states` freshly initialized
    /// emission distributions over `num_dims` dimensions.
    pub fn new(num_states: usize, num_dims: usize, time_horizon: usize) -> Result<Self, ModelError> {
        let emissions = (0..num_states).map(|_| D::default()).collect();
        Self::from_emissions(emissions, num_dims, time_horizon)
    }

    /// Builds, initializes and finalizes a model in one go.
    pub fn from_setup<R: Rng>(setup: &ModelSetup, rng: &mut R) -> Result<Self, ModelError> {
        let mut model = Self::new(setup.num_states, setup.num_dims, setup.time_horizon)?;
        model.set_cumulative_refresh(setup.cumulative_refresh);

        match setup.init_method {
            InitMethod::UniformRandom => model.randomly_initialize(rng)?,
            InitMethod::Biased => model.biased_initialize(rng)?,
        }

        model.finalize()?;

        Ok(model)
    }
}

impl<D: EmissionDistribution> HMMModel<D> {
    /// Builds a model around caller-provided emission instances, one per state.
    /// Each of them is (re)initialized for `num_dims` dimensions.
    pub fn from_emissions(mut emissions: Vec<D>, num_dims: usize, time_horizon: usize) -> Result<Self, ModelError> {
        let num_states = emissions.len();

        if num_states == 0 || num_dims == 0 || time_horizon == 0 {
            return Err(ModelError::InvalidDimensions { num_states, num_dims, time_horizon });
        }

        for emission in emissions.iter_mut() {
            emission.init(num_dims)?;
        }

        debug!(num_states, num_dims, time_horizon, "Allocated HMM model");

        Ok(Self {
            num_states,
            num_dims,
            time_horizon,
            start_matrix: StartMatrix::empty(num_states),
            transition_matrix: TransitionMatrix::empty(num_states),
            emissions,
            cumulative_refresh: CumulativeRefresh::default(),
            start_ready: false,
            transition_ready: false,
            marginals: None,
            marginal_cumulative: None,
            transition_cumulative: None,
        })
    }

    pub fn set_cumulative_refresh(&mut self, cumulative_refresh: CumulativeRefresh) {
        self.cumulative_refresh = cumulative_refresh;
    }

    /// Uniform start and transition matrices, randomized emissions.
    /// Derived tables are left stale.
    pub fn randomly_initialize<R: Rng>(&mut self, rng: &mut R) -> Result<(), ModelError> {
        self.start_matrix = StartMatrix::uniform(self.num_states);
        self.transition_matrix = TransitionMatrix::uniform(self.num_states);
        self.randomize_emissions(rng)?;
        self.start_ready = true;
        self.transition_ready = true;

        self.invalidate_marginals();
        self.invalidate_transition_cumulative();

        debug!(num_states = self.num_states, "Uniform random initialization done");

        Ok(())
    }

    /// Harmonic start matrix (1, 1/2, 1/3, ... normalized), self-loop dominated
    /// transition matrix, randomized emissions.
    ///
    /// Under `CumulativeRefresh::Legacy` the cumulative transition table is
    /// derived before returning. Otherwise every derived table is left stale.
    pub fn biased_initialize<R: Rng>(&mut self, rng: &mut R) -> Result<(), ModelError> {
        self.start_matrix = StartMatrix::harmonic(self.num_states);
        self.transition_matrix = TransitionMatrix::self_biased(self.num_states);
        self.randomize_emissions(rng)?;
        self.start_ready = true;
        self.transition_ready = true;

        self.invalidate_marginals();
        self.invalidate_transition_cumulative();

        if self.cumulative_refresh == CumulativeRefresh::Legacy {
            self.compute_cumulative_transition()?;
        }

        debug!(
            num_states = self.num_states,
            refresh = ?self.cumulative_refresh,
            "Biased initialization done"
        );

        Ok(())
    }

    fn randomize_emissions<R: Rng>(&mut self, rng: &mut R) -> Result<(), ModelError> {
        for emission in self.emissions.iter_mut() {
            emission.randomly_initialize(rng)?;
        }
        Ok(())
    }

    /// Replaces the start matrix. Marginal tables become stale.
    pub fn set_start_matrix(&mut self, start_matrix: StartMatrix) -> Result<(), ModelError> {
        if start_matrix.num_states() != self.num_states {
            return Err(ModelError::IncompatibleDimensions {
                expected: self.num_states,
                found: start_matrix.num_states(),
            });
        }
        start_matrix.validate()?;

        self.start_matrix = start_matrix;
        self.start_ready = true;
        self.invalidate_marginals();

        Ok(())
    }

    /// Replaces the transition matrix. Marginal and cumulative transition tables
    /// become stale.
    pub fn set_transition_matrix(&mut self, transition_matrix: TransitionMatrix) -> Result<(), ModelError> {
        if transition_matrix.num_states() != self.num_states {
            return Err(ModelError::IncompatibleDimensions {
                expected: self.num_states,
                found: transition_matrix.num_states(),
            });
        }
        transition_matrix.validate()?;

        self.transition_matrix = transition_matrix;
        self.transition_ready = true;
        self.invalidate_marginals();
        self.invalidate_transition_cumulative();

        Ok(())
    }

    /// Computes every derived table from the current parameters.
    /// Fails if either matrix has never been initialized or set.
    pub fn finalize(&mut self) -> Result<(), ModelError> {
        self.ensure_parameters(true, true)?;

        self.compute_cumulative_transition()?;
        self.compute_marginal_probabilities()
    }

    /// Derives the transposed cumulative transition table used by
    /// `draw_next_state`.
    pub fn compute_cumulative_transition(&mut self) -> Result<(), ModelError> {
        self.ensure_parameters(false, true)?;

        self.transition_cumulative = Some(self.transition_matrix.cumulative_transposed());
        trace!(num_states = self.num_states, "Cumulative transition table computed");

        Ok(())
    }

    // Rejects work on matrices still holding their zero-filled allocation
    pub(super) fn ensure_parameters(&self, need_start: bool, need_transition: bool) -> Result<(), ModelError> {
        let start_missing = need_start && !self.start_ready;
        let transition_missing = need_transition && !self.transition_ready;

        if start_missing || transition_missing {
            return Err(ModelError::ParametersNotInitialized { start_missing, transition_missing });
        }

        Ok(())
    }

    fn invalidate_marginals(&mut self) {
        if self.marginals.take().is_some() {
            trace!("Marginal probabilities invalidated");
        }
        self.marginal_cumulative = None;
    }

    fn invalidate_transition_cumulative(&mut self) {
        if self.transition_cumulative.take().is_some() {
            trace!("Cumulative transition table invalidated");
        }
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    pub fn time_horizon(&self) -> usize {
        self.time_horizon
    }

    pub fn start_matrix(&self) -> &StartMatrix {
        &self.start_matrix
    }

    pub fn transition_matrix(&self) -> &TransitionMatrix {
        &self.transition_matrix
    }

    pub fn emissions(&self) -> &[D] {
        &self.emissions
    }

    pub fn cumulative_refresh(&self) -> CumulativeRefresh {
        self.cumulative_refresh
    }

    pub fn transition_cumulative(&self) -> Result<&DMatrix<f64>, ModelError> {
        self.transition_cumulative
            .as_ref()
            .ok_or(ModelError::CumulativeTransitionNotReady)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("model sizes must be positive (states: {num_states}, dims: {num_dims}, horizon: {time_horizon})")]
    InvalidDimensions { num_states: usize, num_dims: usize, time_horizon: usize },
    #[error("emission distribution error: {0}")]
    Emission(#[from] EmissionError),
    #[error("invalid probability matrix: {0}")]
    InvalidMatrix(#[from] MatrixValidationError),
    #[error("matrix sized for {found} states, model has {expected}")]
    IncompatibleDimensions { expected: usize, found: usize },
    #[error("time step {time_step} is outside the horizon of {time_horizon} steps")]
    TimeOutOfRange { time_step: usize, time_horizon: usize },
    #[error("state {state} is outside of the {num_states} model states")]
    StateOutOfRange { state: usize, num_states: usize },
    #[error("marginal probabilities are stale, run the marginal propagation first")]
    MarginalsNotReady,
    #[error("cumulative transition table is stale, compute it first")]
    CumulativeTransitionNotReady,
    #[error("model parameters were never set (start missing: {start_missing}, transition missing: {transition_missing})")]
    ParametersNotInitialized { start_missing: bool, transition_missing: bool },
}
