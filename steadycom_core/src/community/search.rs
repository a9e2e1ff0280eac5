//! Search for the highest growth rate at which the community reaches its target abundance
//!
//! The total abundance the community can reach decreases with the growth rate, so the
//! search keeps a bracket of a feasible rate (`lower`) and an infeasible one (`upper`).
//! While one side of the bracket is unknown the next rate is extrapolated from the ratio of
//! the reached abundance to the target, afterwards the bracket is bisected.
use derive_builder::Builder;
use log::{debug, info};
use serde::Serialize;

use crate::community::steadycom::{build_and_solve, CommunitySolution, SteadyComParameters};
use crate::community::SteadyComError;
use crate::metabolic_model::model::Model;

/// Parameters of the growth rate search
///
/// # Examples
/// ```rust
/// use steadycom_core::community::search::SearchParametersBuilder;
/// let search = SearchParametersBuilder::default()
///     .max_growth_rate(2.)
///     .build()
///     .unwrap();
/// assert_eq!(search.initial_growth_rate, 0.5);
/// assert_eq!(search.max_iterations, 100);
/// ```
#[derive(Builder, Debug, Clone)]
#[builder(default, setter(into))]
pub struct SearchParameters {
    /// First growth rate tried
    pub initial_growth_rate: f64,
    /// Lowest growth rate considered
    pub min_growth_rate: f64,
    /// Highest growth rate considered
    pub max_growth_rate: f64,
    /// The search stops once the bracket is narrower than this
    pub tolerance: f64,
    /// Number of community solves allowed
    pub max_iterations: usize,
    /// Smallest factor the growth rate is multiplied by after a feasible solve
    pub min_increase: f64,
    /// Smallest factor the growth rate is multiplied by after an infeasible solve
    pub min_decrease: f64,
}

impl Default for SearchParameters {
    fn default() -> Self {
        SearchParameters {
            initial_growth_rate: 0.5,
            min_growth_rate: 0.,
            max_growth_rate: 10.,
            tolerance: 1e-6,
            max_iterations: 100,
            min_increase: 1.01,
            min_decrease: 0.09,
        }
    }
}

impl SearchParameters {
    fn validate(&self) -> Result<(), SteadyComError> {
        let invalid = |msg: String| Err(SteadyComError::InvalidParameter(msg));
        if !(self.min_growth_rate >= 0. && self.min_growth_rate < self.max_growth_rate) {
            return invalid(format!(
                "growth rate range [{}, {}] is empty or negative",
                self.min_growth_rate, self.max_growth_rate
            ));
        }
        if !self.max_growth_rate.is_finite() {
            return invalid(String::from("maximum growth rate must be finite"));
        }
        if !self.initial_growth_rate.is_finite() {
            return invalid(format!(
                "initial growth rate must be finite, got {}",
                self.initial_growth_rate
            ));
        }
        if !(self.tolerance > 0.) {
            return invalid(format!("tolerance must be positive, got {}", self.tolerance));
        }
        if self.max_iterations == 0 {
            return invalid(String::from("at least one iteration is needed"));
        }
        if !(self.min_increase > 1.) {
            return invalid(format!(
                "minimum increase must be above 1, got {}",
                self.min_increase
            ));
        }
        if !(self.min_decrease > 0. && self.min_decrease < 1.) {
            return invalid(format!(
                "minimum decrease must be in (0, 1), got {}",
                self.min_decrease
            ));
        }
        Ok(())
    }
}

/// Outcome of a successful growth rate search
#[derive(Debug, Clone, Serialize)]
pub struct GrowthRateResult {
    /// Highest growth rate found feasible
    pub growth_rate: f64,
    /// Lowest growth rate found infeasible, if any
    pub upper_bound: Option<f64>,
    /// Community solve at `growth_rate`
    pub solution: CommunitySolution,
    /// Number of community solves
    pub iterations: usize,
    /// The maximum of the growth rate range was feasible, the true optimum may be higher
    pub limited_by_range: bool,
}

/// One step of the search
struct Evaluation {
    feasible: bool,
    total_abundance: f64,
    solution: Option<CommunitySolution>,
}

/// Solve at `growth_rate`, treating an infeasible or unbounded problem as not reaching the
/// target
fn evaluate(
    models: &[Model],
    growth_rate: f64,
    parameters: &SteadyComParameters,
) -> Result<Evaluation, SteadyComError> {
    match build_and_solve(models, growth_rate, parameters) {
        Ok(solution) => Ok(Evaluation {
            feasible: solution.total_abundance
                >= parameters.target_abundance - parameters.tolerance,
            total_abundance: solution.total_abundance,
            solution: Some(solution),
        }),
        Err(SteadyComError::Infeasible { .. }) | Err(SteadyComError::Unbounded { .. }) => {
            Ok(Evaluation {
                feasible: false,
                total_abundance: 0.,
                solution: None,
            })
        }
        Err(err) => Err(err),
    }
}

/// Find the maximum community growth rate
///
/// Every organism grows at the same rate and the community must reach a total abundance of
/// `parameters.target_abundance`. Returns the highest feasible growth rate once the bracket
/// around it is narrower than `search.tolerance`.
///
/// # Errors
/// - [`SteadyComError::NoFeasibleGrowthRate`] if the minimum growth rate is infeasible
/// - [`SteadyComError::SearchDidNotConverge`] if the iteration budget runs out
/// - any error from building or solving the community problem other than infeasibility
pub fn find_max_growth_rate(
    models: &[Model],
    parameters: &SteadyComParameters,
    search: &SearchParameters,
) -> Result<GrowthRateResult, SteadyComError> {
    search.validate()?;
    let min = search.min_growth_rate;
    let max = search.max_growth_rate;
    let mut lower: Option<(f64, CommunitySolution)> = None;
    let mut upper: Option<f64> = None;
    let mut growth_rate = search.initial_growth_rate.clamp(min, max);

    for iteration in 1..=search.max_iterations {
        let evaluation = evaluate(models, growth_rate, parameters)?;
        debug!(
            "Iteration {}: growth rate {} reached total abundance {} ({})",
            iteration,
            growth_rate,
            evaluation.total_abundance,
            if evaluation.feasible {
                "feasible"
            } else {
                "infeasible"
            }
        );

        match (evaluation.feasible, evaluation.solution) {
            (true, Some(solution)) => {
                if growth_rate >= max {
                    info!(
                        "Maximum growth rate {} of the search range is feasible",
                        max
                    );
                    return Ok(GrowthRateResult {
                        growth_rate: max,
                        upper_bound: None,
                        solution,
                        iterations: iteration,
                        limited_by_range: true,
                    });
                }
                lower = Some((growth_rate, solution));
            }
            _ => {
                if growth_rate <= min {
                    info!("Minimum growth rate {} is infeasible", min);
                    return Err(SteadyComError::NoFeasibleGrowthRate { min, max });
                }
                upper = Some(growth_rate);
            }
        }

        match (lower.take(), upper) {
            (Some((lb, solution)), Some(ub)) if ub - lb < search.tolerance => {
                info!(
                    "Maximum growth rate {} found after {} iterations",
                    lb, iteration
                );
                return Ok(GrowthRateResult {
                    growth_rate: lb,
                    upper_bound: Some(ub),
                    solution,
                    iterations: iteration,
                    limited_by_range: false,
                });
            }
            (found, _) => lower = found,
        }

        let ratio = evaluation.total_abundance / parameters.target_abundance;
        let known_lower = lower.as_ref().map(|(lb, _)| *lb);
        growth_rate = next_candidate(growth_rate, ratio, known_lower, upper, search);
    }

    Err(SteadyComError::SearchDidNotConverge {
        lower: lower.map(|(lb, _)| lb),
        upper,
        iterations: search.max_iterations,
    })
}

/// Next growth rate to try, always strictly inside the bracket or on an untested end of
/// the search range
///
/// Going down, a step never lands above the midpoint of the bracket and the minimum is tried
/// once a step comes within `search.tolerance` of it.
fn next_candidate(
    growth_rate: f64,
    ratio: f64,
    lower: Option<f64>,
    upper: Option<f64>,
    search: &SearchParameters,
) -> f64 {
    let low = lower.unwrap_or(search.min_growth_rate);
    let high = upper.unwrap_or(search.max_growth_rate);
    let midpoint = (low + high) / 2.;
    let proposal = match (lower, upper) {
        (Some(_), None) => growth_rate * ratio.max(search.min_increase),
        (None, Some(_)) => (growth_rate * ratio.max(search.min_decrease)).min(midpoint),
        _ => midpoint,
    };
    if lower.is_none() && proposal <= low + search.tolerance {
        search.min_growth_rate
    } else if proposal > low && proposal < high {
        proposal
    } else if upper.is_none() && proposal >= high {
        search.max_growth_rate
    } else {
        midpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::medium::SharedMedium;
    use crate::community::steadycom::SteadyComParametersBuilder;
    use crate::io::table::ReactionRecord;

    fn toy_model() -> Model {
        Model::from_reaction_table(
            "org",
            &[
                ReactionRecord::new("EX_a", "(1) a[e] <=>"),
                ReactionRecord::new("bio1", "(1) a[e] =>"),
            ],
            None,
        )
        .unwrap()
    }

    fn toy_parameters(uptake: f64, target: f64) -> SteadyComParameters {
        let mut medium = SharedMedium::new();
        medium.add_compound("a", -uptake, 1000.).unwrap();
        SteadyComParametersBuilder::default()
            .medium(medium)
            .target_abundance(target)
            .build()
            .unwrap()
    }

    fn wide_range() -> SearchParameters {
        SearchParametersBuilder::default()
            .max_growth_rate(100.)
            .build()
            .unwrap()
    }

    #[test]
    fn converges_to_uptake_over_target() {
        let models = [toy_model()];
        for (uptake, target) in [(10., 0.5), (10., 1.), (1., 0.25)] {
            let result =
                find_max_growth_rate(&models, &toy_parameters(uptake, target), &wide_range())
                    .unwrap();
            let expected = uptake / target;
            assert!(
                (result.growth_rate - expected).abs() < 1e-4,
                "expected {}, got {}",
                expected,
                result.growth_rate
            );
            assert!(!result.limited_by_range);
            assert!(result.upper_bound.unwrap() - result.growth_rate < 1e-6);
            assert!(result.solution.total_abundance >= target - 1e-6);
            assert_eq!(result.solution.growth_rate, result.growth_rate);
        }
    }

    #[test]
    fn starts_above_optimum() {
        let models = [toy_model()];
        let search = SearchParametersBuilder::default()
            .initial_growth_rate(50.)
            .max_growth_rate(100.)
            .build()
            .unwrap();
        let result = find_max_growth_rate(&models, &toy_parameters(1., 0.5), &search).unwrap();
        assert!((result.growth_rate - 2.).abs() < 1e-4);
    }

    #[test]
    fn iteration_budget() {
        let models = [toy_model()];
        let search = SearchParametersBuilder::default()
            .max_growth_rate(100.)
            .max_iterations(3_usize)
            .build()
            .unwrap();
        match find_max_growth_rate(&models, &toy_parameters(10., 0.5), &search) {
            Err(SteadyComError::SearchDidNotConverge {
                lower,
                upper,
                iterations,
            }) => {
                assert_eq!(iterations, 3);
                // 0.5, 1 and 2 are all feasible
                assert!((lower.unwrap() - 2.).abs() < 1e-6);
                assert_eq!(upper, None);
            }
            other => panic!("Expected the search to run out of iterations: {:?}", other),
        }
    }

    #[test]
    fn range_limited() {
        let models = [toy_model()];
        let search = SearchParametersBuilder::default()
            .max_growth_rate(2.)
            .build()
            .unwrap();
        let result = find_max_growth_rate(&models, &toy_parameters(10., 0.5), &search).unwrap();
        assert!(result.limited_by_range);
        assert_eq!(result.growth_rate, 2.);
        assert_eq!(result.upper_bound, None);
    }

    #[test]
    fn no_substrate() {
        let models = [toy_model()];
        let search = SearchParametersBuilder::default()
            .min_growth_rate(0.01)
            .build()
            .unwrap();
        match find_max_growth_rate(&models, &toy_parameters(0., 0.5), &search) {
            Err(SteadyComError::NoFeasibleGrowthRate { min, .. }) => assert_eq!(min, 0.01),
            other => panic!("Expected no feasible growth rate: {:?}", other),
        }
    }

    #[test]
    fn candidates_stay_in_bracket() {
        let search = SearchParameters::default();
        // a feasible zero growth rate can't be scaled up
        assert_eq!(next_candidate(0., 2., Some(0.), None, &search), 5.);
        // overshooting the range tests its maximum
        assert_eq!(next_candidate(8., 2., Some(8.), None, &search), 10.);
        // undershooting tests the minimum
        assert_eq!(next_candidate(0.5, 0., None, Some(0.5), &search), 0.045);
        let above_zero = SearchParametersBuilder::default()
            .min_growth_rate(0.01)
            .build()
            .unwrap();
        assert_eq!(next_candidate(0.05, 0., None, Some(0.05), &above_zero), 0.01);
        // an abundance close to the target still halves the distance to the minimum
        assert_eq!(next_candidate(0.5, 0.95, None, Some(0.5), &search), 0.25);
        // within tolerance of the minimum, the minimum itself is tried
        assert_eq!(next_candidate(2e-6, 0.1, None, Some(2e-6), &search), 0.);
        assert_eq!(next_candidate(3., 1., Some(1.), Some(3.), &search), 2.);
    }

    /// Organism whose maintenance flux `(1) a[e] => (1) waste[e]` has a lower bound of
    /// `maintenance` per unit of abundance
    fn maintenance_model(maintenance: f64) -> Model {
        Model::from_reaction_table(
            "org",
            &[
                ReactionRecord::new("EX_a", "(1) a[e] <=>"),
                ReactionRecord::new("ATPM", "(1) a[e] => (1) waste[e]")
                    .with_bounds(maintenance, 1000.),
                ReactionRecord::new("EX_waste", "(1) waste[e] <=>"),
                ReactionRecord::new("bio1", "(1) a[e] =>"),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn nothing_feasible_on_default_range() {
        let models = [maintenance_model(1.)];
        match find_max_growth_rate(
            &models,
            &toy_parameters(0., 0.5),
            &SearchParameters::default(),
        ) {
            Err(SteadyComError::NoFeasibleGrowthRate { min, max }) => {
                assert_eq!(min, 0.);
                assert_eq!(max, 10.);
            }
            other => panic!("Expected no feasible growth rate: {:?}", other),
        }
    }

    #[test]
    fn optimum_at_zero_growth() {
        // uptake 5 covers maintenance 10 per unit abundance only at X = 0.5 and mu = 0
        let models = [maintenance_model(10.)];
        let result = find_max_growth_rate(
            &models,
            &toy_parameters(5., 0.5),
            &SearchParameters::default(),
        )
        .unwrap();
        assert!(result.growth_rate < 1e-5, "got {}", result.growth_rate);
        assert!(!result.limited_by_range);
        assert!(result.solution.total_abundance >= 0.5 - 1e-6);
    }

    #[test]
    fn builder_defaults_match_default() {
        let built = SearchParametersBuilder::default().build().unwrap();
        let default = SearchParameters::default();
        assert_eq!(built.initial_growth_rate, default.initial_growth_rate);
        assert_eq!(built.max_growth_rate, default.max_growth_rate);
        assert_eq!(built.tolerance, default.tolerance);
        assert_eq!(built.max_iterations, default.max_iterations);
        assert_eq!(built.min_decrease, default.min_decrease);
    }

    #[test]
    fn invalid_range() {
        let models = [toy_model()];
        let search = SearchParametersBuilder::default()
            .min_growth_rate(2.)
            .max_growth_rate(1.)
            .build()
            .unwrap();
        assert!(matches!(
            find_max_growth_rate(&models, &toy_parameters(1., 0.5), &search),
            Err(SteadyComError::InvalidParameter(_))
        ));
    }
}
