use serde::{Deserialize, Serialize};

/// How the start and transition matrices get their first values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitMethod {
    // Uniform start and transition matrices
    #[default]
    UniformRandom,
    // Harmonic start matrix, self-loop dominated transitions
    Biased,
}

/// When the cumulative transition table gets refreshed after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CumulativeRefresh {
    // Nothing is derived until finalize or the explicit compute calls
    #[default]
    Explicit,
    // Biased initialization derives the cumulative transition table on its own,
    // uniform initialization does not
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSetup {
    pub num_states: usize,
    pub num_dims: usize,
    pub time_horizon: usize,

    pub init_method: InitMethod,
    pub cumulative_refresh: CumulativeRefresh,
}

impl ModelSetup {
    pub fn new(num_states: usize, num_dims: usize, time_horizon: usize) -> Self {
        Self {
            num_states,
            num_dims,
            time_horizon,
            ..Self::default()
        }
    }

    pub fn with_init_method(mut self, init_method: InitMethod) -> Self {
        self.init_method = init_method;
        self
    }

    pub fn with_cumulative_refresh(mut self, cumulative_refresh: CumulativeRefresh) -> Self {
        self.cumulative_refresh = cumulative_refresh;
        self
    }
}

impl Default for ModelSetup {
    fn default() -> Self {
        Self {
            num_states: 2,
            num_dims: 1,
            time_horizon: 100,
            init_method: InitMethod::default(),
            cumulative_refresh: CumulativeRefresh::default(),
        }
    }
}
