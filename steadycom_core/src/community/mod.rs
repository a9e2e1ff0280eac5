//! Module providing steady state community modelling (SteadyCom)
//!
//! A community is a set of organism [`Model`]s sharing a [`SharedMedium`]. At a fixed
//! growth rate [`steadycom::build_and_solve`] finds the abundances maximising the total
//! abundance, and [`search::find_max_growth_rate`] finds the highest growth rate at which
//! the community still reaches its target abundance.

pub mod medium;
pub mod search;
pub mod steadycom;

use thiserror::Error;

use crate::community::medium::SharedMedium;
use crate::community::search::{find_max_growth_rate, GrowthRateResult, SearchParameters};
use crate::community::steadycom::{build_and_solve, CommunitySolution, SteadyComParameters};
use crate::metabolic_model::model::{Model, ModelError};
use crate::optimize::problem::ProblemError;
use crate::optimize::solvers::SolverError;
use crate::optimize::OptimizationStatus;

/// Organisms growing together on a shared medium
#[derive(Debug, Clone, Default)]
pub struct Community {
    pub organisms: Vec<Model>,
    pub medium: SharedMedium,
}

impl Community {
    pub fn new(organisms: Vec<Model>, medium: SharedMedium) -> Self {
        Community { organisms, medium }
    }

    /// Default solve parameters using the medium of the community
    pub fn parameters(&self) -> SteadyComParameters {
        SteadyComParameters {
            medium: self.medium.clone(),
            ..SteadyComParameters::default()
        }
    }

    /// Solve the community at a fixed growth rate, the medium in `parameters` is replaced by
    /// the community medium
    pub fn solve_at(
        &self,
        growth_rate: f64,
        parameters: &SteadyComParameters,
    ) -> Result<CommunitySolution, SteadyComError> {
        let parameters = self.with_medium(parameters);
        build_and_solve(&self.organisms, growth_rate, &parameters)
    }

    /// Find the maximum growth rate of the community, the medium in `parameters` is
    /// replaced by the community medium
    pub fn max_growth_rate(
        &self,
        parameters: &SteadyComParameters,
        search: &SearchParameters,
    ) -> Result<GrowthRateResult, SteadyComError> {
        let parameters = self.with_medium(parameters);
        find_max_growth_rate(&self.organisms, &parameters, search)
    }

    fn with_medium(&self, parameters: &SteadyComParameters) -> SteadyComParameters {
        SteadyComParameters {
            medium: self.medium.clone(),
            ..parameters.clone()
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SteadyComError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("Community has no organisms")]
    EmptyCommunity,
    #[error("Organism {0} appears more than once in the community")]
    DuplicateOrganism(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Community problem is infeasible at growth rate {growth_rate}")]
    Infeasible { growth_rate: f64 },
    #[error("Community problem is unbounded at growth rate {growth_rate}")]
    Unbounded { growth_rate: f64 },
    #[error("Solver stopped with status {status:?} at growth rate {growth_rate}")]
    SolverFailed {
        growth_rate: f64,
        status: OptimizationStatus,
    },
    #[error("Solver returned no value for variable {0}")]
    MissingValue(String),
    #[error("Search did not converge after {iterations} iterations, last bracket {lower:?} to {upper:?}")]
    SearchDidNotConverge {
        lower: Option<f64>,
        upper: Option<f64>,
        iterations: usize,
    },
    #[error("No growth rate between {min} and {max} reaches the target abundance")]
    NoFeasibleGrowthRate { min: f64, max: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::table::ReactionRecord;

    #[test]
    fn community_medium_overrides_parameters() {
        let organism = Model::from_reaction_table(
            "org",
            &[
                ReactionRecord::new("EX_a", "(1) a[e] <=>"),
                ReactionRecord::new("bio1", "(1) a[e] =>"),
            ],
            None,
        )
        .unwrap();
        let mut medium = SharedMedium::new();
        medium.add_compound("a", -1., 1000.).unwrap();
        let community = Community::new(vec![organism], medium);
        // the default parameters carry an empty medium, the community one is used instead
        let parameters = SteadyComParameters::default();
        let solution = community.solve_at(4., &parameters).unwrap();
        assert!((solution.total_abundance - 0.25).abs() < 1e-6);

        let result = community
            .max_growth_rate(&community.parameters(), &SearchParameters::default())
            .unwrap();
        assert!((result.growth_rate - 2.).abs() < 1e-4);
    }
}
