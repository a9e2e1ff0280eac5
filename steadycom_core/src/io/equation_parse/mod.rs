//! Module for parsing reaction equation strings into signed reactant records
//!
//! Equations have the form `(1) a[c] + (2) b[c] => (1) c[c]`, with the arrow rendered as
//! `=>`, `<=` or `<=>`. Either side can be empty, which is how exchange reactions are
//! written.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::io::equation_parse::scanner::TermScanner;

mod scanner;

/// A compound taking part in a reaction, with a signed stoichiometric coefficient
///
/// Reactants (left hand side) carry negative coefficients, products positive ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reactant {
    /// Signed stoichiometric coefficient, never zero
    pub coefficient: f64,
    /// Compound identifier
    pub compound: String,
    /// Compartment identifier
    pub compartment: String,
}

/// Direction implied by the arrow of a reaction equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionDirection {
    /// `=>`, left to right only
    Forward,
    /// `<=`, right to left only
    Reverse,
    /// `<=>`, either way
    Reversible,
}

/// Parse a single term of an equation
///
/// # Parameters
/// - `reactant`: term of the form `(coefficient) compound[compartment]`
/// - `sign`: -1 for the left hand side, 1 for the right hand side
///
/// # Examples
/// ```rust
/// use steadycom_core::io::equation_parse::parse_reactant;
/// let atp = parse_reactant("(2) atp[c]", -1.).unwrap();
/// assert_eq!(atp.coefficient, -2.);
/// assert_eq!(atp.compound, "atp");
/// assert_eq!(atp.compartment, "c");
/// ```
pub fn parse_reactant(reactant: &str, sign: f64) -> Result<Reactant, EquationParseError> {
    let (coefficient, compound, compartment) = TermScanner::new(reactant).scan()?;
    Ok(Reactant {
        coefficient: coefficient * sign,
        compound,
        compartment,
    })
}

/// Parse an equation into its reactants, left hand side first
///
/// # Examples
/// ```rust
/// use steadycom_core::io::equation_parse::parse_equation;
/// let reactants = parse_equation("(1) a[c] + (1) b[c] => (1) c[c]").unwrap();
/// assert_eq!(reactants.len(), 3);
/// assert_eq!(reactants[0].coefficient, -1.);
/// assert_eq!(reactants[2].compound, "c");
/// ```
pub fn parse_equation(equation: &str) -> Result<Vec<Reactant>, EquationParseError> {
    parse_equation_with_direction(equation).map(|(reactants, _)| reactants)
}

/// Parse an equation into its reactants and the direction given by its arrow
pub fn parse_equation_with_direction(
    equation: &str,
) -> Result<(Vec<Reactant>, ReactionDirection), EquationParseError> {
    let (left_side, direction, right_side) = split_arrow(equation)?;
    let mut reactants = parse_side(left_side, -1.)?;
    reactants.extend(parse_side(right_side, 1.)?);
    Ok((reactants, direction))
}

/// Split the equation around its single arrow
fn split_arrow(equation: &str) -> Result<(&str, ReactionDirection, &str), EquationParseError> {
    let mut arrows = equation.match_indices('=');
    let (eq_pos, _) = arrows
        .next()
        .ok_or_else(|| EquationParseError::MissingArrow(equation.to_string()))?;
    if arrows.next().is_some() {
        return Err(EquationParseError::MultipleArrows(equation.to_string()));
    }
    let bytes = equation.as_bytes();
    let has_left = eq_pos > 0 && bytes[eq_pos - 1] == b'<';
    let has_right = bytes.get(eq_pos + 1) == Some(&b'>');
    let direction = match (has_left, has_right) {
        (false, true) => ReactionDirection::Forward,
        (true, false) => ReactionDirection::Reverse,
        (true, true) => ReactionDirection::Reversible,
        (false, false) => return Err(EquationParseError::InvalidArrow(equation.to_string())),
    };
    let start = if has_left { eq_pos - 1 } else { eq_pos };
    let end = if has_right { eq_pos + 2 } else { eq_pos + 1 };
    Ok((&equation[..start], direction, &equation[end..]))
}

/// Split one side of the equation on whitespace surrounded `+` and parse every term
fn parse_side(side: &str, sign: f64) -> Result<Vec<Reactant>, EquationParseError> {
    if side.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut terms: Vec<Vec<&str>> = vec![Vec::new()];
    for word in side.split_whitespace() {
        if word == "+" {
            terms.push(Vec::new());
        } else if let Some(term) = terms.last_mut() {
            term.push(word);
        }
    }
    terms
        .into_iter()
        .map(|words| {
            if words.is_empty() {
                return Err(EquationParseError::EmptyTerm(side.trim().to_string()));
            }
            parse_reactant(&words.join(" "), sign)
        })
        .collect()
}

/// Errors raised while parsing equations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EquationParseError {
    /// A term does not have the `(coefficient) compound[compartment]` shape
    #[error("Can't parse term '{term}' at position {position}: {reason}")]
    InvalidTerm {
        /// Term being parsed
        term: String,
        /// Character position of the problem
        position: usize,
        /// What was wrong
        reason: String,
    },
    /// No reaction arrow in the equation
    #[error("No reaction arrow in '{0}'")]
    MissingArrow(String),
    /// More than one reaction arrow in the equation
    #[error("More than one reaction arrow in '{0}'")]
    MultipleArrows(String),
    /// An arrow other than `=>`, `<=`, or `<=>`
    #[error("Unrecognised reaction arrow in '{0}'")]
    InvalidArrow(String),
    /// A dangling `+` left an empty term
    #[error("Empty term in '{0}'")]
    EmptyTerm(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reactant_sign() {
        assert_eq!(
            parse_reactant("(2) atp[c]", -1.).unwrap(),
            Reactant {
                coefficient: -2.,
                compound: "atp".to_string(),
                compartment: "c".to_string()
            }
        );
        assert_eq!(
            parse_reactant("(1) h2o[e]", 1.).unwrap(),
            Reactant {
                coefficient: 1.,
                compound: "h2o".to_string(),
                compartment: "e".to_string()
            }
        );
    }

    #[test]
    fn malformed_reactant() {
        match parse_reactant("(x) a_c", 1.) {
            Err(EquationParseError::InvalidTerm { .. }) => {}
            other => panic!("Malformed term not caught: {:?}", other),
        }
    }

    #[test]
    fn simple_equation() {
        let reactants = parse_equation("(1) a[c] + (1) b[c] => (1) c[c]").unwrap();
        let summary: Vec<(&str, f64)> = reactants
            .iter()
            .map(|r| (r.compound.as_str(), r.coefficient))
            .collect();
        assert_eq!(summary, vec![("a", -1.), ("b", -1.), ("c", 1.)]);
    }

    #[test]
    fn directions() {
        let (_, dir) = parse_equation_with_direction("(1) a[c] => (1) b[c]").unwrap();
        assert_eq!(dir, ReactionDirection::Forward);
        let (_, dir) = parse_equation_with_direction("(1) a[c] <= (1) b[c]").unwrap();
        assert_eq!(dir, ReactionDirection::Reverse);
        let (reactants, dir) = parse_equation_with_direction("(1) a[c]<=>(1) b[c]").unwrap();
        assert_eq!(dir, ReactionDirection::Reversible);
        // The sign follows the side, not the arrow
        assert_eq!(reactants[0].coefficient, -1.);
        assert_eq!(reactants[1].coefficient, 1.);
    }

    #[test]
    fn exchange_reactions() {
        let uptake = parse_equation("(1) glc[e] <=>").unwrap();
        assert_eq!(uptake.len(), 1);
        assert_eq!(uptake[0].coefficient, -1.);
        let source = parse_equation(" => (2.5) o2[e]").unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(source[0].coefficient, 2.5);
    }

    #[test]
    fn arrow_errors() {
        assert_eq!(
            parse_equation("(1) a[c] (1) b[c]"),
            Err(EquationParseError::MissingArrow("(1) a[c] (1) b[c]".to_string()))
        );
        assert!(matches!(
            parse_equation("(1) a[c] => (1) b[c] => (1) c[c]"),
            Err(EquationParseError::MultipleArrows(_))
        ));
        assert!(matches!(
            parse_equation("(1) a[c] = (1) b[c]"),
            Err(EquationParseError::InvalidArrow(_))
        ));
    }

    #[test]
    fn dangling_plus() {
        assert!(matches!(
            parse_equation("(1) a[c] + => (1) b[c]"),
            Err(EquationParseError::EmptyTerm(_))
        ));
        // A plus without surrounding whitespace is not a separator
        assert!(matches!(
            parse_equation("(1) a[c]+(1) b[c] => (1) c[c]"),
            Err(EquationParseError::InvalidTerm { .. })
        ));
    }

    #[test]
    fn coefficients_round_trip() {
        let equations = [
            "(1) glc[e] <=>",
            "=> (2) b[c]",
            "(1) a[c] <= (1) b[c]",
            "(0.5) a[c] + (3) b[e] <=> (1e-3) c[c] + (2) d[p]",
            "(-2) a[c] => (1.5E2) b[c]",
        ];
        for equation in equations {
            let (reactants, direction) = parse_equation_with_direction(equation).unwrap();
            let (left_side, _, _) = split_arrow(equation).unwrap();
            let left_len = parse_side(left_side, -1.).unwrap().len();
            let render = |r: &Reactant, sign: f64| {
                format!("({}) {}[{}]", r.coefficient * sign, r.compound, r.compartment)
            };
            let left: Vec<String> = reactants[..left_len]
                .iter()
                .map(|r| render(r, -1.))
                .collect();
            let right: Vec<String> = reactants[left_len..]
                .iter()
                .map(|r| render(r, 1.))
                .collect();
            let arrow = match direction {
                ReactionDirection::Forward => "=>",
                ReactionDirection::Reverse => "<=",
                ReactionDirection::Reversible => "<=>",
            };
            let rebuilt = format!("{} {} {}", left.join(" + "), arrow, right.join(" + "));
            assert_eq!(
                parse_equation_with_direction(&rebuilt).unwrap(),
                (reactants, direction),
                "{} rebuilt as {}",
                equation,
                rebuilt
            );
        }
    }
}
