//! Implements a solver interface for Clarabel
//!
//! Clarabel solves `min 1/2 x'Px + q'x` subject to `Ax + s = b`, `s` in a product of cones.
//! Equalities become rows in the zero cone, every finite side of an inequality or a
//! variable bound becomes a row in the nonnegative cone.
use crate::optimize::constraint::Constraint;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

use ::clarabel::algebra::CscMatrix;
use ::clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use indexmap::IndexMap;
use log::debug;
use nalgebra_sparse::CooMatrix;

/// Interior point conic solver
#[derive(Clone, Debug)]
pub struct ClarabelSolver {
    /// Maximum number of interior point iterations
    pub max_iter: u32,
    /// Print the solver log to stdout
    pub verbose: bool,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        ClarabelSolver {
            max_iter: 200,
            verbose: false,
        }
    }
}

/// Rows of the constraint matrix, kept apart by cone
#[derive(Default)]
struct ConeRows {
    /// (column, coefficient) pairs and right hand side of each row
    zero: Vec<(Vec<(usize, f64)>, f64)>,
    nonnegative: Vec<(Vec<(usize, f64)>, f64)>,
}

impl ConeRows {
    fn from_problem(problem: &Problem) -> Result<Self, SolverError> {
        let columns: IndexMap<&str, usize> = problem
            .variables()
            .keys()
            .enumerate()
            .map(|(ind, id)| (id.as_str(), ind))
            .collect();
        let mut rows = ConeRows::default();

        for constraint in problem.constraints().values() {
            let terms = constraint
                .get_terms()
                .iter()
                .map(|t| match columns.get(t.variable.as_str()) {
                    Some(col) => Ok((*col, t.coefficient)),
                    None => Err(SolverError::Backend(format!(
                        "constraint {} references unknown variable {}",
                        constraint.get_id(),
                        t.variable
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            match constraint {
                Constraint::Equality { equals, .. } => rows.zero.push((terms, *equals)),
                Constraint::Inequality {
                    lower_bound,
                    upper_bound,
                    ..
                } => rows.push_interval(terms, *lower_bound, *upper_bound),
            }
        }
        for (col, var) in problem.variables().values().enumerate() {
            rows.push_interval(vec![(col, 1.)], var.lower_bound, var.upper_bound);
        }
        Ok(rows)
    }

    /// a'x <= ub is a'x + s = ub, lb <= a'x is -a'x + s = -lb
    fn push_interval(&mut self, terms: Vec<(usize, f64)>, lower_bound: f64, upper_bound: f64) {
        if lower_bound.is_finite() && upper_bound.is_finite() && lower_bound == upper_bound {
            self.zero.push((terms, upper_bound));
            return;
        }
        if lower_bound.is_finite() {
            let negated = terms.iter().map(|(col, coef)| (*col, -coef)).collect();
            self.nonnegative.push((negated, -lower_bound));
        }
        if upper_bound.is_finite() {
            self.nonnegative.push((terms, upper_bound));
        }
    }

    fn assemble(self, num_variables: usize) -> (CscMatrix<f64>, Vec<f64>, Vec<SupportedConeT<f64>>) {
        let num_zero = self.zero.len();
        let num_nonnegative = self.nonnegative.len();
        let mut coo = CooMatrix::new(num_zero + num_nonnegative, num_variables);
        let mut b = Vec::with_capacity(num_zero + num_nonnegative);
        for (row, (terms, rhs)) in self.zero.into_iter().chain(self.nonnegative).enumerate() {
            for (col, coef) in terms {
                if coef != 0. {
                    coo.push(row, col, coef);
                }
            }
            b.push(rhs);
        }
        // Duplicate entries are summed by the conversion
        let csc = nalgebra_sparse::CscMatrix::from(&coo);
        let (nrows, ncols) = (csc.nrows(), csc.ncols());
        let (col_offsets, row_indices, values) = csc.disassemble();
        let a = CscMatrix::new(nrows, ncols, col_offsets, row_indices, values);

        let mut cones = Vec::new();
        if num_zero > 0 {
            cones.push(SupportedConeT::ZeroConeT(num_zero));
        }
        if num_nonnegative > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(num_nonnegative));
        }
        (a, b, cones)
    }
}

impl Solver for ClarabelSolver {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let num_variables = problem.num_variables();
        // Clarabel only minimizes
        let sign = match problem.objective().sense() {
            ObjectiveSense::Maximize => -1.,
            ObjectiveSense::Minimize => 1.,
        };
        let q: Vec<f64> = problem
            .variables()
            .keys()
            .map(|id| sign * problem.objective().coefficient_of(id))
            .collect();
        let p = CscMatrix::<f64>::zeros((num_variables, num_variables));
        let (a, b, cones) = ConeRows::from_problem(problem)?.assemble(num_variables);
        debug!(
            "Clarabel problem with {} columns and {} rows",
            num_variables,
            b.len()
        );

        let settings = DefaultSettingsBuilder::default()
            .verbose(self.verbose)
            .max_iter(self.max_iter)
            .build()
            .map_err(|err| SolverError::InvalidSettings(err.to_string()))?;
        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = match solver.solution.status {
            SolverStatus::Solved => OptimizationStatus::Optimal,
            SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                OptimizationStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                OptimizationStatus::Unbounded
            }
            SolverStatus::NumericalError => OptimizationStatus::NumericalError,
            _ => OptimizationStatus::SolverHalted,
        };
        if !status.has_solution() {
            return Ok(ProblemSolution::without_values(status));
        }
        let variable_values = problem
            .variables()
            .keys()
            .cloned()
            .zip(solver.solution.x.iter().copied())
            .collect();
        Ok(ProblemSolution {
            status,
            objective_value: Some(sign * solver.solution.obj_val),
            variable_values: Some(variable_values),
        })
    }
}
