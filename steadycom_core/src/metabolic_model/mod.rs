//! Module providing the types representing the metabolic model of one organism.

pub mod metabolite;
pub mod model;
pub mod reaction;
pub mod stoichiometry;
