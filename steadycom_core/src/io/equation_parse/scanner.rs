//! Scan a single reactant term `(coefficient) compound[compartment]`

use crate::io::equation_parse::EquationParseError;

/// Character scanner for one reactant term
pub(crate) struct TermScanner {
    source: Vec<char>,
    current: usize,
}

impl TermScanner {
    pub(crate) fn new(term: &str) -> Self {
        TermScanner {
            source: term.trim().chars().collect(),
            current: 0,
        }
    }

    /// Scan the whole term into (coefficient, compound, compartment)
    pub(crate) fn scan(&mut self) -> Result<(f64, String, String), EquationParseError> {
        let coefficient = self.coefficient()?;
        self.skip_whitespace();
        let compound = self.identifier()?;
        self.consume('[')?;
        let compartment = self.identifier()?;
        self.consume(']')?;
        if !self.is_at_end() {
            return Err(self.error("unexpected text after compartment"));
        }
        Ok((coefficient, compound, compartment))
    }

    /// The coefficient runs from the opening parenthesis to the last closing parenthesis
    fn coefficient(&mut self) -> Result<f64, EquationParseError> {
        self.consume('(')?;
        let close = match self.source.iter().rposition(|c| *c == ')') {
            Some(pos) if pos >= self.current => pos,
            _ => return Err(self.error("missing ')' after coefficient")),
        };
        let text: String = self.source[self.current..close].iter().collect();
        self.current = close + 1;
        let value = text
            .trim()
            .parse::<f64>()
            .map_err(|_| self.error(&format!("'{}' is not a number", text.trim())))?;
        if !value.is_finite() || value == 0. {
            return Err(self.error("coefficient must be finite and non-zero"));
        }
        Ok(value)
    }

    fn identifier(&mut self) -> Result<String, EquationParseError> {
        let start = self.current;
        while TermScanner::is_identifier_char(self.peek()) {
            self.advance();
        }
        if start == self.current {
            return Err(self.error("expected identifier"));
        }
        Ok(self.source[start..self.current].iter().collect())
    }

    fn consume(&mut self, expected: char) -> Result<(), EquationParseError> {
        if self.peek() == expected {
            self.advance();
            return Ok(());
        }
        Err(self.error(&format!("expected '{}'", expected)))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn is_identifier_char(c: char) -> bool {
        matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn error(&self, reason: &str) -> EquationParseError {
        EquationParseError::InvalidTerm {
            term: self.source.iter().collect(),
            position: self.current,
            reason: reason.to_string(),
        }
    }
}
