//! This module provides the metabolite struct representing a metabolite

use derive_builder::Builder;
use serde::Serialize;

/// Represents a metabolite (a compound in a compartment)
#[derive(Builder, Debug, Clone, PartialEq, Serialize)]
#[builder(setter(into))]
pub struct Metabolite {
    /// Compound identifier, also the row of the stoichiometric matrix (must be unique)
    pub id: String,
    /// Human Readable name of the metabolite
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Which compartment the metabolite is in
    pub compartment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let met = MetaboliteBuilder::default()
            .id("glc")
            .compartment("e")
            .build()
            .unwrap();
        assert_eq!(met.name, None);
        assert_eq!(met.compartment, "e");
        assert!(MetaboliteBuilder::default().id("glc").build().is_err());
    }
}
