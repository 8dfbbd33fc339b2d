/********** Hidden Markov Model (HMM) with pluggable emission densities **********
* Discrete-time, discrete-state chain whose per-state emissions are continuous
* distributions. The model holds the start and transition matrices plus one
* emission distribution per state, and precomputes:
*
*   - P(q_t = s_i | theta) for t in [0, T), unconditioned on any observation
*     (plain forward propagation of the chain's state distribution)
*   - cumulative tables for inverse-CDF state draws
*
* Derived tables are dropped whenever their source matrices change and must be
* recomputed (see `HMMModel::finalize`) before sampling.
**********/

pub mod hmm_tools;
pub mod hmm_matrices;
pub mod emission;
pub mod gaussian_emission;
pub mod setup;
pub mod hmm_model;
pub mod marginals;
pub mod sampling;
pub mod report;

pub use hmm_tools::{UniformSource, ReplayUniform};
pub use hmm_matrices::{StartMatrix, TransitionMatrix, ProbabilityMatrix, MatrixValidationError};
pub use emission::{EmissionDistribution, SampleEmission, EmissionError};
pub use gaussian_emission::GaussianEmission;
pub use setup::{ModelSetup, InitMethod, CumulativeRefresh};
pub use hmm_model::{HMMModel, ModelError};
