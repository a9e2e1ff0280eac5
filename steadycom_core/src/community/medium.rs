//! Shared medium coupling the exchange fluxes of every organism in the community
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::community::steadycom::flux_variable_id;
use crate::community::SteadyComError;
use crate::metabolic_model::model::Model;
use crate::optimize::problem::Problem;

/// Community level bounds on the net secretion of a compound
///
/// A negative lower bound is the most the community can take up from the medium, a
/// positive upper bound the most it can release.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediumBounds {
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Extracellular compounds shared by the organisms, with their community bounds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedMedium {
    compounds: IndexMap<String, MediumBounds>,
}

impl SharedMedium {
    pub fn new() -> Self {
        SharedMedium {
            compounds: IndexMap::new(),
        }
    }

    /// Add (or replace) a compound of the medium
    ///
    /// # Examples
    /// ```rust
    /// use steadycom_core::community::medium::SharedMedium;
    /// let mut medium = SharedMedium::new();
    /// // at most 10 units of glucose taken up by the whole community
    /// medium.add_compound("glc", -10., 1000.).unwrap();
    /// assert!(medium.add_compound("o2", 5., 1.).is_err());
    /// ```
    pub fn add_compound(
        &mut self,
        compound: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), SteadyComError> {
        if lower_bound.is_nan() || upper_bound.is_nan() || lower_bound > upper_bound {
            return Err(SteadyComError::InvalidParameter(format!(
                "medium compound {} has lower bound {} above upper bound {}",
                compound, lower_bound, upper_bound
            )));
        }
        self.compounds.insert(
            compound.to_string(),
            MediumBounds {
                lower_bound,
                upper_bound,
            },
        );
        Ok(())
    }

    pub fn get(&self, compound: &str) -> Option<&MediumBounds> {
        self.compounds.get(compound)
    }

    pub fn compounds(&self) -> impl Iterator<Item = (&String, &MediumBounds)> {
        self.compounds.iter()
    }

    pub fn len(&self) -> usize {
        self.compounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty()
    }

    /// Bound the net community secretion of every exchanged compound
    ///
    /// For compound `i` the constraint is `lb_i <= sum_k sum_ex -S_k[i][ex] * v_k_ex <= ub_i`
    /// over every exchange reaction of every organism, so a positive term is always secretion
    /// whichever side of its exchange equation the compound is written on. Exchanged
    /// compounds missing from the medium can only be secreted, `[0, inf)`. Returns the
    /// number of constraints added.
    pub(crate) fn add_constraints(
        &self,
        problem: &mut Problem,
        models: &[Model],
    ) -> Result<usize, SteadyComError> {
        let mut secretion: IndexMap<String, Vec<(String, f64)>> = IndexMap::new();
        for model in models {
            for (compound, reactions) in model.exchange_reactions() {
                for reaction in reactions {
                    if let Some(coefficient) = model.stoichiometry.get(&compound, &reaction) {
                        secretion
                            .entry(compound.clone())
                            .or_default()
                            .push((flux_variable_id(&model.id, &reaction), -coefficient));
                    }
                }
            }
        }

        let mut added = 0;
        for (compound, bounds) in &self.compounds {
            let Some(terms) = secretion.get(compound) else {
                warn!(
                    "No organism exchanges medium compound {}, skipping its constraint",
                    compound
                );
                continue;
            };
            add_secretion_row(problem, compound, terms, bounds.lower_bound, bounds.upper_bound)?;
            added += 1;
        }
        for (compound, terms) in &secretion {
            if self.compounds.contains_key(compound) {
                continue;
            }
            debug!(
                "Compound {} is not in the medium, it can only be secreted",
                compound
            );
            add_secretion_row(problem, compound, terms, 0., f64::INFINITY)?;
            added += 1;
        }
        Ok(added)
    }
}

fn add_secretion_row(
    problem: &mut Problem,
    compound: &str,
    terms: &[(String, f64)],
    lower_bound: f64,
    upper_bound: f64,
) -> Result<(), SteadyComError> {
    let variables: Vec<&str> = terms.iter().map(|(v, _)| v.as_str()).collect();
    let coefficients: Vec<f64> = terms.iter().map(|(_, c)| *c).collect();
    problem.add_new_inequality_constraint_by_id(
        &format!("medium[{}]", compound),
        &variables,
        &coefficients,
        lower_bound,
        upper_bound,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::table::ReactionRecord;
    use crate::optimize::constraint::Constraint;

    #[test]
    fn one_variable_per_organism() {
        let a = Model::from_reaction_table(
            "a",
            &[
                ReactionRecord::new("EX_glc", "(1) glc[e] <=>"),
                ReactionRecord::new("bio1", "(1) glc[e] =>"),
            ],
            None,
        )
        .unwrap();
        let b = Model::from_reaction_table(
            "b",
            &[
                ReactionRecord::new("IN_glc", "=> (1) glc[e]"),
                ReactionRecord::new("bio1", "(1) glc[e] =>"),
            ],
            None,
        )
        .unwrap();
        let mut problem = Problem::new_maximization();
        for (org, rxn) in [("a", "EX_glc"), ("a", "bio1"), ("b", "IN_glc"), ("b", "bio1")] {
            problem
                .add_new_variable(&flux_variable_id(org, rxn), None, -10., 10.)
                .unwrap();
        }
        let mut medium = SharedMedium::new();
        medium.add_compound("glc", -10., 0.).unwrap();
        medium.add_compound("o2", -10., 0.).unwrap();
        let added = medium.add_constraints(&mut problem, &[a, b]).unwrap();
        // o2 is not exchanged by anybody
        assert_eq!(added, 1);
        assert!(!problem.constraints().contains_key("medium[o2]"));
        match problem.constraints().get("medium[glc]").unwrap() {
            Constraint::Inequality { terms, .. } => {
                assert_eq!(terms.len(), 2);
                assert_eq!(terms[0].variable, "v[a][EX_glc]");
                assert_eq!(terms[0].coefficient, 1.);
                // written on the product side, so secretion is the negative direction
                assert_eq!(terms[1].variable, "v[b][IN_glc]");
                assert_eq!(terms[1].coefficient, -1.);
            }
            Constraint::Equality { .. } => panic!("Medium constraint should be an inequality"),
        }
    }

    #[test]
    fn unlisted_compounds_are_secretion_only() {
        let model = Model::from_reaction_table(
            "a",
            &[
                ReactionRecord::new("EX_glc", "(1) glc[e] <=>"),
                ReactionRecord::new("DM_glc", "=> (1) glc[e]"),
                ReactionRecord::new("EX_ac", "(1) ac[e] <=>"),
                ReactionRecord::new("bio1", "(1) glc[e] => (1) ac[e]"),
            ],
            None,
        )
        .unwrap();
        let mut problem = Problem::new_maximization();
        for rxn in ["EX_glc", "DM_glc", "EX_ac", "bio1"] {
            problem
                .add_new_variable(&flux_variable_id("a", rxn), None, -10., 10.)
                .unwrap();
        }
        let mut medium = SharedMedium::new();
        medium.add_compound("glc", -10., 1000.).unwrap();
        let added = medium.add_constraints(&mut problem, &[model]).unwrap();
        assert_eq!(added, 2);
        match problem.constraints().get("medium[glc]").unwrap() {
            Constraint::Inequality { terms, .. } => {
                assert_eq!(terms.len(), 2);
                assert_eq!(terms[1].variable, "v[a][DM_glc]");
                assert_eq!(terms[1].coefficient, -1.);
            }
            Constraint::Equality { .. } => panic!("Medium constraint should be an inequality"),
        }
        match problem.constraints().get("medium[ac]").unwrap() {
            Constraint::Inequality {
                terms,
                lower_bound,
                upper_bound,
                ..
            } => {
                assert_eq!(terms.len(), 1);
                assert_eq!(*lower_bound, 0.);
                assert_eq!(*upper_bound, f64::INFINITY);
            }
            Constraint::Equality { .. } => panic!("Medium constraint should be an inequality"),
        }
    }

    #[test]
    fn serde_as_map() {
        let medium: SharedMedium =
            serde_json::from_str(r#"{"glc": {"lower_bound": -10.0, "upper_bound": 0.0}}"#)
                .unwrap();
        assert_eq!(medium.len(), 1);
        assert_eq!(medium.get("glc").unwrap().lower_bound, -10.);
    }
}
