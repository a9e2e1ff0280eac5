//! Implements a solver interface for microlp
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::constraint::Constraint;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

use indexmap::IndexMap;
use ::microlp::{ComparisonOp, LinearExpr, OptimizationDirection};

/// Dense simplex solver, suitable for small and medium sized problems
#[derive(Clone, Debug, Default)]
pub struct MicrolpSolver {}

impl MicrolpSolver {
    fn expression(
        constraint: &Constraint,
        variables: &IndexMap<String, ::microlp::Variable>,
    ) -> Result<LinearExpr, SolverError> {
        let mut expr = LinearExpr::empty();
        for term in constraint.get_terms() {
            let var = variables.get(&term.variable).ok_or_else(|| {
                SolverError::Backend(format!(
                    "constraint {} references unknown variable {}",
                    constraint.get_id(),
                    term.variable
                ))
            })?;
            expr.add(*var, term.coefficient);
        }
        Ok(expr)
    }
}

impl Solver for MicrolpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let direction = match problem.objective().sense() {
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
        };
        let mut lp = ::microlp::Problem::new(direction);
        let variables: IndexMap<String, ::microlp::Variable> = problem
            .variables()
            .iter()
            .map(|(id, var)| {
                let coef = problem.objective().coefficient_of(id);
                (id.clone(), lp.add_var(coef, (var.lower_bound, var.upper_bound)))
            })
            .collect();

        for constraint in problem.constraints().values() {
            match constraint {
                Constraint::Equality { equals, .. } => {
                    let expr = Self::expression(constraint, &variables)?;
                    lp.add_constraint(expr, ComparisonOp::Eq, *equals);
                }
                Constraint::Inequality {
                    lower_bound,
                    upper_bound,
                    ..
                } => {
                    // Infinite sides are simply left out
                    if lower_bound.is_finite() {
                        let expr = Self::expression(constraint, &variables)?;
                        lp.add_constraint(expr, ComparisonOp::Ge, *lower_bound);
                    }
                    if upper_bound.is_finite() {
                        let expr = Self::expression(constraint, &variables)?;
                        lp.add_constraint(expr, ComparisonOp::Le, *upper_bound);
                    }
                }
            }
        }

        match lp.solve() {
            Ok(solution) => {
                let variable_values = variables
                    .iter()
                    .map(|(id, var)| (id.clone(), solution[*var]))
                    .collect();
                Ok(ProblemSolution {
                    status: OptimizationStatus::Optimal,
                    objective_value: Some(solution.objective()),
                    variable_values: Some(variable_values),
                })
            }
            Err(::microlp::Error::Infeasible) => Ok(ProblemSolution::without_values(
                OptimizationStatus::Infeasible,
            )),
            Err(::microlp::Error::Unbounded) => Ok(ProblemSolution::without_values(
                OptimizationStatus::Unbounded,
            )),
            #[allow(unreachable_patterns)]
            Err(err) => Err(SolverError::Backend(err.to_string())),
        }
    }
}
