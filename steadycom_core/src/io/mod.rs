//! Module for reading reaction tables, reaction equations and community descriptors
pub mod equation_parse;
pub mod json;
pub mod table;
