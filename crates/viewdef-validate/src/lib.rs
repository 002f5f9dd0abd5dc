//! DDL validation boundary
//!
//! The compiler never checks its own output against a grammar. Callers hand
//! generated or user-edited view DDL to a [`DdlValidator`] and get back a
//! list of problems; an empty list means the text parsed.

use serde::{Deserialize, Serialize};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::{Parser, ParserError};
use thiserror::Error;
use tracing::debug;

const NO_DDL: &str = "No DDL to validate";
const SUCCESS: &str = "Success";
const LOCATION_MARKER: &str = " at Line: ";
const COLUMN_MARKER: &str = ", Column: ";

/// 1-based position reported by the grammar parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemPosition {
    pub line: u64,
    pub column: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct DdlProblem {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<ProblemPosition>,
}

impl DdlProblem {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    /// Build a problem from parser text, splitting off a trailing
    /// `at Line: n, Column: m` location when present.
    fn from_parser_message(text: &str) -> Self {
        let Some(index) = text.rfind(LOCATION_MARKER) else {
            return Self::new(text);
        };

        let location = &text[index + LOCATION_MARKER.len()..];
        let position = location.split_once(COLUMN_MARKER).and_then(|(line, column)| {
            Some(ProblemPosition {
                line: line.trim().parse().ok()?,
                column: column.trim().parse().ok()?,
            })
        });

        match position {
            Some(position) => Self {
                message: text[..index].to_string(),
                position: Some(position),
            },
            None => Self::new(text),
        }
    }
}

/// Grammar check for view DDL
pub trait DdlValidator {
    fn validate(&self, ddl: &str) -> Vec<DdlProblem>;
}

/// [`DdlValidator`] backed by `sqlparser` with the generic dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlParserValidator;

impl SqlParserValidator {
    pub fn new() -> Self {
        Self
    }
}

impl DdlValidator for SqlParserValidator {
    fn validate(&self, ddl: &str) -> Vec<DdlProblem> {
        match Parser::parse_sql(&GenericDialect {}, ddl) {
            Ok(statements) if statements.is_empty() => {
                vec![DdlProblem::new("No SQL statement provided")]
            }
            Ok(statements) => {
                debug!(statements = statements.len(), "DDL parsed");
                Vec::new()
            }
            Err(err) => {
                debug!(error = %err, "DDL rejected");
                let text = match &err {
                    ParserError::TokenizerError(msg) | ParserError::ParserError(msg) => msg.clone(),
                    _ => err.to_string(),
                };
                vec![DdlProblem::from_parser_message(&text)]
            }
        }
    }
}

/// Single-line verdict for a piece of DDL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationStatus {
    Empty,
    Success,
    Invalid(DdlProblem),
}

impl ValidationStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationStatus::Success)
    }

    /// `No DDL to validate`, `Success`, or the first problem's message
    pub fn message(&self) -> &str {
        match self {
            ValidationStatus::Empty => NO_DDL,
            ValidationStatus::Success => SUCCESS,
            ValidationStatus::Invalid(problem) => &problem.message,
        }
    }
}

pub fn validation_status(validator: &dyn DdlValidator, ddl: &str) -> ValidationStatus {
    if ddl.trim().is_empty() {
        return ValidationStatus::Empty;
    }

    match validator.validate(ddl).into_iter().next() {
        Some(problem) => ValidationStatus::Invalid(problem),
        None => ValidationStatus::Success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rejecting(&'static [&'static str]);

    impl DdlValidator for Rejecting {
        fn validate(&self, _ddl: &str) -> Vec<DdlProblem> {
            self.0.iter().map(|m| DdlProblem::new(*m)).collect()
        }
    }

    #[test]
    fn test_blank_input_is_not_validated() {
        for input in ["", "   ", "\n\t"] {
            let status = validation_status(&Rejecting(&["unreachable"]), input);
            assert_eq!(status, ValidationStatus::Empty);
            assert_eq!(status.message(), "No DDL to validate");
        }
    }

    #[test]
    fn test_first_problem_wins() {
        let status = validation_status(&Rejecting(&["first", "second"]), "CREATE VIEW");
        assert!(!status.is_success());
        assert_eq!(status.message(), "first");
    }

    #[test]
    fn test_no_problems_is_success() {
        let status = validation_status(&Rejecting(&[]), "anything");
        assert!(status.is_success());
        assert_eq!(status.message(), "Success");
    }

    #[test]
    fn test_sqlparser_accepts_view() {
        let problems = SqlParserValidator::new()
            .validate("CREATE VIEW v (RowId, a) AS SELECT ROW_NUMBER() OVER (ORDER BY a), a FROM s.t;");
        assert!(problems.is_empty(), "{:?}", problems);
    }

    #[test]
    fn test_sqlparser_reports_position() {
        let problems = SqlParserValidator::new().validate("CRE");
        assert_eq!(problems.len(), 1);

        let problem = &problems[0];
        assert!(!problem.message.is_empty());
        assert!(!problem.message.contains("Line:"), "{}", problem.message);
        assert_eq!(problem.position, Some(ProblemPosition { line: 1, column: 1 }));
    }

    #[test]
    fn test_message_without_location() {
        let problem = DdlProblem::from_parser_message("Unexpected EOF");
        assert_eq!(problem.message, "Unexpected EOF");
        assert_eq!(problem.position, None);

        let problem = DdlProblem::from_parser_message("bad at Line: x, Column: 2");
        assert_eq!(problem.message, "bad at Line: x, Column: 2");
        assert_eq!(problem.position, None);
    }
}
