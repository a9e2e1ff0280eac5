//! Process wide defaults used to seed builders
use std::sync::{LazyLock, RwLock};

use cfg_if::cfg_if;
use serde::{Deserialize, Serialize};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Default values used when a reaction table, a model, or the SteadyCom parameters don't
/// specify them
#[derive(Clone, Debug)]
pub struct Configuration {
    /// Lower flux bound for reversible reactions without explicit bounds
    pub lower_bound: f64,
    /// Upper flux bound for reactions without explicit bounds
    pub upper_bound: f64,
    /// Tolerance used when comparing optimized values
    pub tolerance: f64,
    /// Magnitude cap applied to every flux variable in the community problem
    pub flux_cap: f64,
    /// Id of the biomass reaction of an organism model
    pub biomass_reaction: String,
    /// Solver backend used for the community problem
    pub solver: SolverKind,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            flux_cap: 1000.,
            biomass_reaction: String::from("bio1"),
            solver: SolverKind::default(),
        }
    }
}

/// Enum used to specify the solver to use
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverKind {
    /// Use the Clarabel interior point solver
    Clarabel,
    /// Use the microlp simplex solver, requires the minilp feature to be enabled
    Microlp,
}

impl Default for SolverKind {
    fn default() -> Self {
        cfg_if! {
            if #[cfg(feature = "minilp")] {
                SolverKind::Microlp
            } else {
                SolverKind::Clarabel
            }
        }
    }
}

/// Read a copy of the current defaults
///
/// A poisoned lock still holds valid defaults, so its contents are used anyway.
pub fn current() -> Configuration {
    match CONFIGURATION.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Configuration::default();
        assert!((config.lower_bound + 1000.).abs() < 1e-12);
        assert!((config.upper_bound - 1000.).abs() < 1e-12);
        assert_eq!(config.biomass_reaction, "bio1");
        #[cfg(feature = "minilp")]
        assert_eq!(config.solver, SolverKind::Microlp);
    }
}
