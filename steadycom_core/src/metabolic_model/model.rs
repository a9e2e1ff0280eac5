//! This module provides the Model struct for representing the metabolic model of one organism
use indexmap::IndexMap;
use log::warn;
use serde::Serialize;
use thiserror::Error;

use crate::configuration;
use crate::io::table::ReactionRecord;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::metabolic_model::stoichiometry::{parse_rows, StoichiometricMatrix, StoichiometryError};

/// Metabolic model of a single organism of the community
#[derive(Clone, Debug, Serialize)]
pub struct Model {
    /// Organism identifier
    pub id: String,
    /// Map of reaction ids to Reactions
    pub reactions: IndexMap<String, Reaction>,
    /// Map of compound ids to Metabolites
    pub metabolites: IndexMap<String, Metabolite>,
    /// Stoichiometric matrix built from the reaction equations
    pub stoichiometry: StoichiometricMatrix,
    /// Id of the reaction whose flux is the growth of the organism
    pub biomass_reaction: String,
}

impl Model {
    /// Create an empty model
    pub fn new_empty(id: &str) -> Self {
        Model {
            id: id.to_string(),
            reactions: IndexMap::new(),
            metabolites: IndexMap::new(),
            stoichiometry: StoichiometricMatrix::new(),
            biomass_reaction: configuration::current().biomass_reaction,
        }
    }

    /// Build a model from a reaction table
    ///
    /// Rows without bounds get them from their equation arrow. A row whose equation can't be
    /// parsed makes the whole model unusable.
    ///
    /// # Examples
    /// ```rust
    /// use steadycom_core::io::table::ReactionRecord;
    /// use steadycom_core::metabolic_model::model::Model;
    /// let table = vec![
    ///     ReactionRecord::new("EX_a", "(1) a[e] <=>").with_bounds(-10., 1000.),
    ///     ReactionRecord::new("bio1", "(1) a[e] =>"),
    /// ];
    /// let model = Model::from_reaction_table("org1", &table, None).unwrap();
    /// assert_eq!(model.reactions.len(), 2);
    /// assert_eq!(model.stoichiometry.get("a", "bio1"), Some(-1.));
    /// ```
    pub fn from_reaction_table(
        id: &str,
        records: &[ReactionRecord],
        biomass_reaction: Option<&str>,
    ) -> Result<Model, ModelError> {
        let mut model = Model::new_empty(id);
        if let Some(biomass) = biomass_reaction {
            model.biomass_reaction = biomass.to_string();
        }
        for parsed in parse_rows(records)? {
            let record = parsed.record;
            let (default_lower, default_upper) = Reaction::default_bounds(parsed.direction);
            let lower_bound = record.lower_bound.unwrap_or(default_lower);
            let upper_bound = record.upper_bound.unwrap_or(default_upper);
            if lower_bound.is_nan() || upper_bound.is_nan() || lower_bound > upper_bound {
                return Err(ModelError::InvalidBounds {
                    reaction: record.id.clone(),
                    lower_bound,
                    upper_bound,
                });
            }
            let reaction = Reaction {
                id: record.id.clone(),
                name: record.name.clone(),
                equation: record.equation.clone(),
                metabolites: Reaction::fold_metabolites(&parsed.reactants),
                reactants: parsed.reactants,
                direction: parsed.direction,
                lower_bound,
                upper_bound,
            };
            model.add_reaction(reaction);
        }
        model.check_biomass()?;
        Ok(model)
    }

    /// Add a reaction to the model, updating metabolites and the stoichiometric matrix
    ///
    /// A reaction replacing one with the same id keeps the matrix entries of the older one
    /// for compounds it doesn't mention.
    pub fn add_reaction(&mut self, reaction: Reaction) {
        for reactant in &reaction.reactants {
            self.metabolites
                .entry(reactant.compound.clone())
                .or_insert_with(|| Metabolite {
                    id: reactant.compound.clone(),
                    name: None,
                    compartment: reactant.compartment.clone(),
                });
        }
        for (compound, coefficient) in &reaction.metabolites {
            self.stoichiometry.insert(compound, &reaction.id, *coefficient);
        }
        if self.reactions.contains_key(&reaction.id) {
            warn!(
                "Reaction {} appears more than once in model {}, keeping the last one",
                reaction.id, self.id
            );
        }
        self.reactions.insert(reaction.id.clone(), reaction);
    }

    /// Check that the biomass reaction is part of the model
    pub fn check_biomass(&self) -> Result<(), ModelError> {
        if self.reactions.contains_key(&self.biomass_reaction) {
            Ok(())
        } else {
            Err(ModelError::MissingBiomassReaction {
                model: self.id.clone(),
                reaction: self.biomass_reaction.clone(),
            })
        }
    }

    /// Exchange reactions of the model keyed by the compound they exchange
    ///
    /// The biomass reaction is never an exchange, even when written as a one sided drain.
    /// Every reaction exchanging a compound is listed, in table order.
    pub fn exchange_reactions(&self) -> IndexMap<String, Vec<String>> {
        let mut exchanges: IndexMap<String, Vec<String>> = IndexMap::new();
        for reaction in self
            .reactions
            .values()
            .filter(|r| r.is_exchange() && r.id != self.biomass_reaction)
        {
            if let Some(compound) = reaction.metabolites.keys().next() {
                exchanges
                    .entry(compound.clone())
                    .or_default()
                    .push(reaction.id.clone());
            }
        }
        exchanges
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    #[error(transparent)]
    Stoichiometry(#[from] StoichiometryError),
    #[error("Reaction {reaction} has lower bound {lower_bound} above upper bound {upper_bound}")]
    InvalidBounds {
        reaction: String,
        lower_bound: f64,
        upper_bound: f64,
    },
    #[error("Biomass reaction {reaction} is not part of model {model}")]
    MissingBiomassReaction { model: String, reaction: String },
}
