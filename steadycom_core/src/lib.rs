//! Core rust implementation of SteadyCom, steady state flux balance analysis of microbial
//! communities.
//!
//! Organisms are described by reaction tables whose equations are parsed into
//! stoichiometric matrices ([`io`], [`metabolic_model`]). At a fixed community growth rate
//! the abundances of the organisms are found by solving a linear program ([`community`],
//! [`optimize`]), and the maximum growth rate by searching over that rate.

pub mod community;
pub mod configuration;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
