//! Sparse stoichiometric matrix of an organism, compound to reaction to coefficient
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::io::equation_parse::{
    parse_equation_with_direction, EquationParseError, Reactant, ReactionDirection,
};
use crate::io::table::ReactionRecord;

/// Sparse stoichiometric matrix stored as nested ordered maps
///
/// Rows are compound ids, columns are reaction ids. Only nonzero entries are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoichiometricMatrix {
    rows: IndexMap<String, IndexMap<String, f64>>,
}

impl StoichiometricMatrix {
    pub fn new() -> Self {
        StoichiometricMatrix {
            rows: IndexMap::new(),
        }
    }

    /// Set a coefficient, overwriting any previous value for the same compound and reaction
    pub fn insert(&mut self, compound: &str, reaction: &str, coefficient: f64) {
        self.rows
            .entry(compound.to_string())
            .or_default()
            .insert(reaction.to_string(), coefficient);
    }

    /// Coefficient of `compound` in `reaction`
    pub fn get(&self, compound: &str, reaction: &str) -> Option<f64> {
        self.rows
            .get(compound)
            .and_then(|row| row.get(reaction).copied())
    }

    /// Reactions touching `compound`, with their coefficients
    pub fn row(&self, compound: &str) -> Option<&IndexMap<String, f64>> {
        self.rows.get(compound)
    }

    /// Iterate over (compound, row) pairs in insertion order
    pub fn rows(&self) -> impl Iterator<Item = (&String, &IndexMap<String, f64>)> {
        self.rows.iter()
    }

    pub fn num_compounds(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A table row together with its parsed equation
pub(crate) struct ParsedRow<'a> {
    pub(crate) record: &'a ReactionRecord,
    pub(crate) reactants: Vec<Reactant>,
    pub(crate) direction: ReactionDirection,
}

/// Parse every equation of a table, failing on the first row which can't be parsed
pub(crate) fn parse_rows(records: &[ReactionRecord]) -> Result<Vec<ParsedRow<'_>>, StoichiometryError> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            parse_equation_with_direction(&record.equation)
                .map(|(reactants, direction)| ParsedRow {
                    record,
                    reactants,
                    direction,
                })
                .map_err(|source| StoichiometryError::UnparsableEquation {
                    row,
                    equation: record.equation.clone(),
                    source,
                })
        })
        .collect()
}

/// Build the stoichiometric matrix of a reaction table
///
/// A compound repeated within one reaction keeps the coefficient seen last.
///
/// # Examples
/// ```rust
/// use steadycom_core::io::table::ReactionRecord;
/// use steadycom_core::metabolic_model::stoichiometry::build_stoichiometric_matrix;
/// let table = vec![
///     ReactionRecord::new("r1", "(1) a[c] => (1) b[c]"),
///     ReactionRecord::new("r2", "(2) b[c] => (1) c[c]"),
/// ];
/// let s = build_stoichiometric_matrix(&table).unwrap();
/// assert_eq!(s.get("b", "r1"), Some(1.));
/// assert_eq!(s.get("b", "r2"), Some(-2.));
/// ```
pub fn build_stoichiometric_matrix(
    records: &[ReactionRecord],
) -> Result<StoichiometricMatrix, StoichiometryError> {
    let mut matrix = StoichiometricMatrix::new();
    for parsed in parse_rows(records)? {
        for reactant in &parsed.reactants {
            matrix.insert(&reactant.compound, &parsed.record.id, reactant.coefficient);
        }
    }
    Ok(matrix)
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoichiometryError {
    /// An equation of the table could not be parsed, the model can't be used
    #[error("Can't parse equation {row} - {equation}")]
    UnparsableEquation {
        /// Zero based row of the table
        row: usize,
        /// Raw equation text
        equation: String,
        #[source]
        source: EquationParseError,
    },
}
