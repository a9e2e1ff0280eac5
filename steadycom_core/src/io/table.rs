//! Module providing tab separated reaction table IO
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of a reaction table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    /// Reaction identifier
    pub id: String,
    /// Reaction equation, see [`crate::io::equation_parse`]
    pub equation: String,
    /// Human readable name
    #[serde(default)]
    pub name: Option<String>,
    /// Lower flux bound, taken from the equation arrow when missing
    #[serde(default)]
    pub lower_bound: Option<f64>,
    /// Upper flux bound, taken from the equation arrow when missing
    #[serde(default)]
    pub upper_bound: Option<f64>,
}

impl ReactionRecord {
    /// Create a record without name or bounds
    pub fn new(id: &str, equation: &str) -> Self {
        ReactionRecord {
            id: id.to_string(),
            equation: equation.to_string(),
            name: None,
            lower_bound: None,
            upper_bound: None,
        }
    }

    /// Set explicit flux bounds
    pub fn with_bounds(mut self, lower_bound: f64, upper_bound: f64) -> Self {
        self.lower_bound = Some(lower_bound);
        self.upper_bound = Some(upper_bound);
        self
    }
}

/// Ordered reaction table of one organism
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionTable {
    pub records: Vec<ReactionRecord>,
}

impl ReactionTable {
    /// Read a tab separated table with a header row
    ///
    /// The `id` and `equation` columns are required, `name`, `lower_bound` and
    /// `upper_bound` are optional, and any other column is ignored.
    ///
    /// # Examples
    /// ```rust
    /// use steadycom_core::io::table::ReactionTable;
    /// let tsv = "id\tequation\tdirection\nrxn1\t(1) a[c] => (1) b[c]\t>\n";
    /// let table = ReactionTable::from_reader(tsv.as_bytes()).unwrap();
    /// assert_eq!(table.records[0].id, "rxn1");
    /// ```
    pub fn from_reader<R: Read>(reader: R) -> Result<ReactionTable, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let records = csv_reader
            .deserialize()
            .enumerate()
            .map(|(row, rec)| rec.map_err(|source| TableError::InvalidRow { row, source }))
            .collect::<Result<Vec<ReactionRecord>, _>>()?;
        Ok(ReactionTable { records })
    }

    /// Read a tab separated table from a file
    pub fn read_tsv<P: AsRef<Path>>(path: P) -> Result<ReactionTable, TableError> {
        let file = File::open(path.as_ref()).map_err(|err| {
            TableError::UnableToRead(format!("{}: {}", path.as_ref().display(), err))
        })?;
        ReactionTable::from_reader(file)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<ReactionRecord>> for ReactionTable {
    fn from(records: Vec<ReactionRecord>) -> Self {
        ReactionTable { records }
    }
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Unable to read reaction table {0}")]
    UnableToRead(String),
    #[error("Invalid reaction table row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_columns() {
        let tsv = "id\tname\tequation\tlower_bound\tupper_bound\n\
                   EX_glc\tglucose exchange\t(1) glc[e] <=>\t-10\t1000\n\
                   bio1\tbiomass\t(1) glc[e] =>\t\t\n";
        let table = ReactionTable::from_reader(tsv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].name.as_deref(), Some("glucose exchange"));
        assert_eq!(table.records[0].lower_bound, Some(-10.));
        assert_eq!(table.records[1].lower_bound, None);
        assert_eq!(table.records[1].equation, "(1) glc[e] =>");
    }

    #[test]
    fn missing_equation_column() {
        let tsv = "id\tname\nrxn1\tsomething\n";
        match ReactionTable::from_reader(tsv.as_bytes()) {
            Err(TableError::InvalidRow { row, .. }) => assert_eq!(row, 0),
            other => panic!("Missing column not caught: {:?}", other),
        }
    }
}
