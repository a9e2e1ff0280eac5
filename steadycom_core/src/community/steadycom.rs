//! Community flux balance problem at a fixed growth rate
//!
//! Every organism `k` gets an abundance variable `X[k]` in `[0, 1]` and one flux variable
//! per reaction, capped at the flux cap `M`. Reaction bounds are scaled by the abundance,
//! so an absent organism carries no flux, and every organism grows at the same rate
//! `mu` through `v_bio = mu * X`. The objective is the total abundance.
use derive_builder::Builder;
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::community::medium::SharedMedium;
use crate::community::SteadyComError;
use crate::configuration::{self, SolverKind};
use crate::metabolic_model::model::Model;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::solver_for;
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// How the biomass flux of an organism is tied to the community growth rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BiomassCoupling {
    /// `v_bio - mu * X = 0`
    Equality,
    /// `v_bio - mu * X >= 0`, organisms may produce more biomass than they need
    Minimum,
}

/// Parameters of a single community solve
///
/// # Examples
/// ```rust
/// use steadycom_core::community::steadycom::{BiomassCoupling, SteadyComParametersBuilder};
/// let parameters = SteadyComParametersBuilder::default()
///     .target_abundance(1.)
///     .build()
///     .unwrap();
/// assert_eq!(parameters.biomass_coupling, BiomassCoupling::Equality);
/// assert_eq!(parameters.flux_cap, 1000.);
/// ```
#[derive(Builder, Debug, Clone)]
#[builder(default, setter(into))]
pub struct SteadyComParameters {
    /// Bound on the magnitude of every flux variable
    pub flux_cap: f64,
    /// Total abundance the community must reach for a growth rate to be feasible
    pub target_abundance: f64,
    /// Tolerance when comparing the total abundance with the target
    pub tolerance: f64,
    /// Shared medium of the community
    pub medium: SharedMedium,
    pub biomass_coupling: BiomassCoupling,
    /// Backend used for every solve
    pub solver: SolverKind,
}

impl Default for SteadyComParameters {
    fn default() -> Self {
        let config = configuration::current();
        SteadyComParameters {
            flux_cap: config.flux_cap,
            target_abundance: 0.5,
            tolerance: config.tolerance,
            medium: SharedMedium::new(),
            biomass_coupling: BiomassCoupling::Equality,
            solver: config.solver,
        }
    }
}

impl SteadyComParameters {
    fn validate(&self) -> Result<(), SteadyComError> {
        if !(self.flux_cap > 0.) {
            return Err(SteadyComError::InvalidParameter(format!(
                "flux cap must be positive, got {}",
                self.flux_cap
            )));
        }
        if !(self.target_abundance > 0. && self.target_abundance <= 1.) {
            return Err(SteadyComError::InvalidParameter(format!(
                "target abundance must be in (0, 1], got {}",
                self.target_abundance
            )));
        }
        if !(self.tolerance >= 0.) {
            return Err(SteadyComError::InvalidParameter(format!(
                "tolerance must not be negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Result of a community solve at one growth rate
#[derive(Debug, Clone, Serialize)]
pub struct CommunitySolution {
    /// Growth rate the problem was solved at
    pub growth_rate: f64,
    /// Sum of the abundances, the objective value
    pub total_abundance: f64,
    /// Organism id to abundance
    pub abundances: IndexMap<String, f64>,
    /// Organism id to reaction id to flux
    pub fluxes: IndexMap<String, IndexMap<String, f64>>,
}

/// Id of the abundance variable of an organism
pub fn abundance_variable_id(organism: &str) -> String {
    format!("X[{}]", organism)
}

/// Id of the flux variable of a reaction of an organism
pub fn flux_variable_id(organism: &str, reaction: &str) -> String {
    format!("v[{}][{}]", organism, reaction)
}

/// Build the community problem at growth rate `growth_rate`
pub fn build_problem(
    models: &[Model],
    growth_rate: f64,
    parameters: &SteadyComParameters,
) -> Result<Problem, SteadyComError> {
    check_inputs(models, growth_rate, parameters)?;
    let mut problem = Problem::new_maximization();
    let cap = parameters.flux_cap;

    for model in models {
        let abundance = abundance_variable_id(&model.id);
        problem.add_new_variable(&abundance, Some(model.id.as_str()), 0., 1.)?;
        problem.add_new_linear_objective_term_by_id(&abundance, 1.)?;

        for reaction in model.reactions.values() {
            let flux = flux_variable_id(&model.id, &reaction.id);
            problem.add_new_variable(&flux, Some(reaction.id.as_str()), -cap, cap)?;
            // v - ub * X <= 0
            if reaction.upper_bound.is_finite() {
                problem.add_new_inequality_constraint_by_id(
                    &format!("flux_upper[{}][{}]", model.id, reaction.id),
                    &[flux.as_str(), abundance.as_str()],
                    &[1., -reaction.upper_bound],
                    f64::NEG_INFINITY,
                    0.,
                )?;
            }
            // v - lb * X >= 0
            if reaction.lower_bound.is_finite() {
                problem.add_new_inequality_constraint_by_id(
                    &format!("flux_lower[{}][{}]", model.id, reaction.id),
                    &[flux.as_str(), abundance.as_str()],
                    &[1., -reaction.lower_bound],
                    0.,
                    f64::INFINITY,
                )?;
            }
        }

        for (compound, row) in model.stoichiometry.rows() {
            let variables: Vec<String> = row
                .keys()
                .map(|reaction| flux_variable_id(&model.id, reaction))
                .collect();
            let variable_refs: Vec<&str> = variables.iter().map(String::as_str).collect();
            let coefficients: Vec<f64> = row.values().copied().collect();
            problem.add_new_equality_constraint_by_id(
                &format!("mass_balance[{}][{}]", model.id, compound),
                &variable_refs,
                &coefficients,
                0.,
            )?;
        }

        let biomass = flux_variable_id(&model.id, &model.biomass_reaction);
        let growth = format!("growth[{}]", model.id);
        let coefficients = [1., -growth_rate];
        match parameters.biomass_coupling {
            BiomassCoupling::Equality => problem.add_new_equality_constraint_by_id(
                &growth,
                &[biomass.as_str(), abundance.as_str()],
                &coefficients,
                0.,
            )?,
            BiomassCoupling::Minimum => problem.add_new_inequality_constraint_by_id(
                &growth,
                &[biomass.as_str(), abundance.as_str()],
                &coefficients,
                0.,
                f64::INFINITY,
            )?,
        }
    }

    let medium_constraints = parameters.medium.add_constraints(&mut problem, models)?;
    debug!(
        "Built community problem for {} organisms at growth rate {}: {} variables, {} constraints ({} from the medium)",
        models.len(),
        growth_rate,
        problem.num_variables(),
        problem.num_constraints(),
        medium_constraints
    );
    Ok(problem)
}

/// Build the community problem at `growth_rate` and solve it
///
/// An infeasible or unbounded problem is reported as an error, any other status without a
/// solution as [`SteadyComError::SolverFailed`].
pub fn build_and_solve(
    models: &[Model],
    growth_rate: f64,
    parameters: &SteadyComParameters,
) -> Result<CommunitySolution, SteadyComError> {
    let mut problem = build_problem(models, growth_rate, parameters)?;
    let solver = solver_for(parameters.solver)?;
    debug!("Solving community problem with {}", solver.name());
    let solution = problem.solve(solver.as_ref())?;
    match solution.status {
        OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal => {
            extract_solution(models, growth_rate, &solution)
        }
        OptimizationStatus::Infeasible => Err(SteadyComError::Infeasible { growth_rate }),
        OptimizationStatus::Unbounded => Err(SteadyComError::Unbounded { growth_rate }),
        status => Err(SteadyComError::SolverFailed {
            growth_rate,
            status,
        }),
    }
}

fn check_inputs(
    models: &[Model],
    growth_rate: f64,
    parameters: &SteadyComParameters,
) -> Result<(), SteadyComError> {
    if models.is_empty() {
        return Err(SteadyComError::EmptyCommunity);
    }
    if !(growth_rate.is_finite() && growth_rate >= 0.) {
        return Err(SteadyComError::InvalidParameter(format!(
            "growth rate must be finite and not negative, got {}",
            growth_rate
        )));
    }
    parameters.validate()?;
    let mut seen = Vec::with_capacity(models.len());
    for model in models {
        if seen.contains(&model.id.as_str()) {
            return Err(SteadyComError::DuplicateOrganism(model.id.clone()));
        }
        seen.push(model.id.as_str());
        model.check_biomass()?;
    }
    Ok(())
}

fn extract_solution(
    models: &[Model],
    growth_rate: f64,
    solution: &ProblemSolution,
) -> Result<CommunitySolution, SteadyComError> {
    let missing = |id: String| SteadyComError::MissingValue(id);
    let mut abundances = IndexMap::new();
    let mut fluxes = IndexMap::new();
    for model in models {
        let abundance_id = abundance_variable_id(&model.id);
        let abundance = solution
            .value_of(&abundance_id)
            .ok_or_else(|| missing(abundance_id))?;
        abundances.insert(model.id.clone(), abundance);
        let mut organism_fluxes = IndexMap::new();
        for reaction in model.reactions.keys() {
            let flux_id = flux_variable_id(&model.id, reaction);
            let flux = solution.value_of(&flux_id).ok_or_else(|| missing(flux_id))?;
            organism_fluxes.insert(reaction.clone(), flux);
        }
        fluxes.insert(model.id.clone(), organism_fluxes);
    }
    let total_abundance = solution
        .objective_value
        .unwrap_or_else(|| abundances.values().sum());
    Ok(CommunitySolution {
        growth_rate,
        total_abundance,
        abundances,
        fluxes,
    })
}
