//! Solver backends for linear [`Problem`]s
use crate::configuration::SolverKind;
use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;

use cfg_if::cfg_if;
use thiserror::Error;

pub mod clarabel;
#[cfg(feature = "minilp")]
pub mod microlp;

/// A backend able to solve a linear [`Problem`]
///
/// Infeasible and unbounded problems are not errors, they are reported through the
/// status of the returned [`ProblemSolution`].
pub trait Solver {
    /// Name of the backend, used for logging
    fn name(&self) -> &'static str;

    /// Solve the problem, returning the status and (if solved) the optimal values
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Create the solver backend matching `kind`
pub fn solver_for(kind: SolverKind) -> Result<Box<dyn Solver>, SolverError> {
    match kind {
        SolverKind::Clarabel => Ok(Box::new(clarabel::ClarabelSolver::default())),
        SolverKind::Microlp => {
            cfg_if! {
                if #[cfg(feature = "minilp")] {
                    Ok(Box::new(microlp::MicrolpSolver::default()))
                } else {
                    Err(SolverError::Unavailable(String::from("minilp")))
                }
            }
        }
    }
}

/// Errors raised by a solver backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The backend was not compiled in
    #[error("Solver requires the {0} feature to be enabled")]
    Unavailable(String),
    /// The backend rejected its settings
    #[error("Invalid solver settings: {0}")]
    InvalidSettings(String),
    /// The backend failed for a reason other than infeasibility or unboundedness
    #[error("Solver failed: {0}")]
    Backend(String),
}
