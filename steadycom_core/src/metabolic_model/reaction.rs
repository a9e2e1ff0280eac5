//! This module provides a struct for representing reactions
use derive_builder::Builder;
use indexmap::IndexMap;
use serde::Serialize;

use crate::configuration;
use crate::io::equation_parse::{
    parse_equation_with_direction, EquationParseError, Reactant, ReactionDirection,
};

/// Represents a reaction of an organism model
#[derive(Builder, Debug, Clone, Serialize)]
#[builder(setter(into))]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Equation the reaction was parsed from
    #[builder(default = "String::new()")]
    pub equation: String,
    /// Parsed terms of the equation, in the order they appear
    #[builder(default = "Vec::new()")]
    pub reactants: Vec<Reactant>,
    /// Metabolite stoichiometry of the reaction, compound id to coefficient
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Direction given by the equation arrow
    #[builder(default = "ReactionDirection::Reversible")]
    pub direction: ReactionDirection,
    /// Lower flux bound
    #[builder(default = "configuration::current().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "configuration::current().upper_bound")]
    pub upper_bound: f64,
}

impl Reaction {
    /// Parse an equation into a reaction, with bounds taken from the arrow direction
    ///
    /// # Examples
    /// ```rust
    /// use steadycom_core::metabolic_model::reaction::Reaction;
    /// let rxn = Reaction::from_equation("rxn1", "(1) a[c] => (2) b[c]").unwrap();
    /// assert_eq!(rxn.metabolites["a"], -1.);
    /// assert_eq!(rxn.metabolites["b"], 2.);
    /// assert_eq!(rxn.lower_bound, 0.);
    /// ```
    pub fn from_equation(id: &str, equation: &str) -> Result<Reaction, EquationParseError> {
        let (reactants, direction) = parse_equation_with_direction(equation)?;
        let (lower_bound, upper_bound) = Reaction::default_bounds(direction);
        Ok(Reaction {
            id: id.to_string(),
            name: None,
            equation: equation.to_string(),
            metabolites: Reaction::fold_metabolites(&reactants),
            reactants,
            direction,
            lower_bound,
            upper_bound,
        })
    }

    /// Default flux bounds for a reaction with the given direction
    pub fn default_bounds(direction: ReactionDirection) -> (f64, f64) {
        let config = configuration::current();
        match direction {
            ReactionDirection::Forward => (0., config.upper_bound),
            ReactionDirection::Reverse => (config.lower_bound, 0.),
            ReactionDirection::Reversible => (config.lower_bound, config.upper_bound),
        }
    }

    /// Collapse reactants into compound coefficients, a repeated compound keeps the last
    /// coefficient seen
    pub(crate) fn fold_metabolites(reactants: &[Reactant]) -> IndexMap<String, f64> {
        let mut metabolites = IndexMap::new();
        for r in reactants {
            metabolites.insert(r.compound.clone(), r.coefficient);
        }
        metabolites
    }

    /// Whether the reaction exchanges a single compound with the outside (one side empty)
    pub fn is_exchange(&self) -> bool {
        self.metabolites.len() == 1
            && (self.reactants.iter().all(|r| r.coefficient < 0.)
                || self.reactants.iter().all(|r| r.coefficient > 0.))
    }
}
