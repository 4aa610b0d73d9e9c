//! Error types for equation parsing with error codes and helpful messages.
//!
//! # Error Codes
//!
//! Each error variant has a unique code (E001-E010) for documentation lookup:
//!
//! - E001: `ParseFailure` (Generic parse failure)
//! - E002: `RegexError` (Invalid regex pattern)
//! - E003: `EmptyInput` (Empty input string)
//! - E004: `MissingEquals` (No `=` between the two sides)
//! - E005: `MultipleEquals` (More than one `=`)
//! - E006: `InvalidLetterName` (Alphabet token not uppercase-led)
//! - E007: `InvalidVariableName` (Variable token not lowercase-led)
//! - E008: `DuplicateDeclaration` (Token declared twice)
//! - E009: `UnknownToken` (Undeclared token inside an equation side)
//! - E010: `NomError` (Low-level nom parser error)
//!
//! # Examples
//!
//! ```
//! use wordeq::errors::ParseError;
//!
//! fn parse_something(input: &str) -> Result<(), Box<ParseError>> {
//!     if input.trim().is_empty() {
//!         return Err(Box::new(ParseError::EmptyInput));
//!     }
//!     Ok(())
//! }
//!
//! match parse_something("  ") {
//!     Err(e) => {
//!         assert_eq!(e.code(), "E003");
//!         assert!(e.help().is_some());
//!     }
//!     Ok(_) => unreachable!(),
//! }
//! ```

use nom::error::{ErrorKind, ParseError as NomParseError};
use std::io;

/// Custom error type for parsing operations
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Equation parsing failed: \"{s}\"")]
    ParseFailure { s: String },

    #[error("Invalid regex pattern: {0}")]
    RegexError(#[from] fancy_regex::Error),

    #[error("Empty input string")]
    EmptyInput,

    #[error("No '=' found in equation \"{input}\"")]
    MissingEquals { input: String },

    #[error("Equation \"{input}\" contains more than one '='")]
    MultipleEquals { input: String },

    #[error("Invalid letter name '{token}' (must start with an uppercase letter)")]
    InvalidLetterName { token: String },

    #[error("Invalid variable name '{token}' (must start with a lowercase letter)")]
    InvalidVariableName { token: String },

    #[error("Token '{token}' is declared more than once")]
    DuplicateDeclaration { token: String },

    #[error("Undeclared token at \"{rest}\" in side \"{side}\"")]
    UnknownToken { side: String, rest: String },

    // nom parser error (lowest level)
    #[error("nom parser error: {0:?}")]
    NomError(ErrorKind),
}

impl From<ParseError> for io::Error {
    fn from(pe: ParseError) -> Self {
        io::Error::new(io::ErrorKind::InvalidInput, pe.to_string())
    }
}

impl From<Box<fancy_regex::Error>> for Box<ParseError> {
    fn from(e: Box<fancy_regex::Error>) -> Self {
        Box::new(ParseError::RegexError(*e))
    }
}

impl<'a> NomParseError<&'a str> for Box<ParseError> {
    fn from_error_kind(_input: &'a str, kind: ErrorKind) -> Self {
        Box::new(ParseError::NomError(kind))
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl ParseError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::ParseFailure { .. } => "E001",
            ParseError::RegexError(_) => "E002",
            ParseError::EmptyInput => "E003",
            ParseError::MissingEquals { .. } => "E004",
            ParseError::MultipleEquals { .. } => "E005",
            ParseError::InvalidLetterName { .. } => "E006",
            ParseError::InvalidVariableName { .. } => "E007",
            ParseError::DuplicateDeclaration { .. } => "E008",
            ParseError::UnknownToken { .. } => "E009",
            ParseError::NomError(_) => "E010",
        }
    }

    /// Returns a short description of this error type (for documentation)
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ParseError::ParseFailure { .. } => "Generic parse failure",
            ParseError::RegexError(_) => "Invalid regex pattern",
            ParseError::EmptyInput => "Empty input string",
            ParseError::MissingEquals { .. } => "Missing '=' between the two sides",
            ParseError::MultipleEquals { .. } => "More than one '='",
            ParseError::InvalidLetterName { .. } => "Invalid alphabet letter name",
            ParseError::InvalidVariableName { .. } => "Invalid variable name",
            ParseError::DuplicateDeclaration { .. } => "Token declared twice",
            ParseError::UnknownToken { .. } => "Undeclared token in equation",
            ParseError::NomError(_) => "Low-level nom parser error",
        }
    }

    /// Returns detailed explanation of this error type (for documentation)
    #[must_use]
    pub fn details(&self) -> &'static str {
        match self {
            ParseError::ParseFailure { .. } => "The input does not have the shape `{letters}, {variables}, lhs = rhs`.",
            ParseError::RegexError(_) => {
                "An internal token-validation regex failed to compile or run. This is usually a bug."
            }
            ParseError::EmptyInput => "The input contained nothing but whitespace.",
            ParseError::MissingEquals { .. } => {
                "An equation needs exactly one '=' separating its left and right sides."
            }
            ParseError::MultipleEquals { .. } => {
                "Only a single equation per input is supported, so '=' may appear only once."
            }
            ParseError::InvalidLetterName { .. } => {
                "Alphabet letters are tokens starting with an uppercase character, \
                 followed by letters, digits, '_' or '\\''."
            }
            ParseError::InvalidVariableName { .. } => {
                "Variables are tokens starting with a lowercase character, followed by letters, digits, '_' or '\\''."
            }
            ParseError::DuplicateDeclaration { .. } => {
                "Every letter and variable may be declared only once across both sets."
            }
            ParseError::UnknownToken { .. } => {
                "Each side is scanned greedily for the longest declared token; \
                 no declared token matched at this position."
            }
            ParseError::NomError(_) => {
                "The nom combinator library reported a low-level failure. \
                 The other error codes are usually more specific."
            }
        }
    }

    /// Returns a helpful suggestion or example for this error
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            ParseError::ParseFailure { .. } => Some("Expected format: {A, B}, {x, y}, ABxy = xBAy"),
            ParseError::EmptyInput => Some("Example: {A, B}, {x}, Ax = AB"),
            ParseError::MissingEquals { .. } => Some("Separate the two sides with '=' (e.g., 'Ax = xA')"),
            ParseError::MultipleEquals { .. } => Some("Solve one equation at a time"),
            ParseError::InvalidLetterName { .. } => Some("Letter names start with A-Z (e.g., 'A', 'B2', 'Cat')"),
            ParseError::InvalidVariableName { .. } => Some("Variable names start with a-z (e.g., 'x', 'y1', 'rest')"),
            ParseError::DuplicateDeclaration { .. } => Some("Remove the repeated name from the letter or variable set"),
            ParseError::UnknownToken { .. } => Some("Declare every letter and variable used in the equation"),
            _ => None,
        }
    }

    /// Formats the error with code and optional help text
    #[must_use]
    pub fn display_detailed(&self) -> String {
        format_error_with_code_and_help(&self.to_string(), self.code(), self.help())
    }
}

/// Helper function to format error messages with code and optional help text
pub(crate) fn format_error_with_code_and_help(base_msg: &str, code: &str, help: Option<&str>) -> String {
    if let Some(help_text) = help {
        format!("{base_msg} ({code})\n{help_text}")
    } else {
        format!("{base_msg} ({code})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_errors() -> Vec<ParseError> {
        vec![
            ParseError::ParseFailure { s: "test".to_string() },
            ParseError::EmptyInput,
            ParseError::MissingEquals { input: "AB".to_string() },
            ParseError::MultipleEquals { input: "A=B=C".to_string() },
            ParseError::InvalidLetterName { token: "a".to_string() },
            ParseError::InvalidVariableName { token: "X".to_string() },
            ParseError::DuplicateDeclaration { token: "A".to_string() },
            ParseError::UnknownToken { side: "AQ".to_string(), rest: "Q".to_string() },
            ParseError::NomError(ErrorKind::Tag),
        ]
    }

    #[test]
    fn test_error_codes_and_help() {
        let err = ParseError::EmptyInput;
        assert_eq!(err.code(), "E003");
        assert!(err.help().is_some());
        let detailed = err.display_detailed();
        assert!(detailed.contains("E003"));
        assert!(detailed.contains("Example"));
    }

    #[test]
    fn test_unknown_token_message() {
        let err = ParseError::UnknownToken { side: "AQx".to_string(), rest: "Qx".to_string() };
        assert_eq!(err.code(), "E009");
        assert!(err.to_string().contains("\"Qx\""));
        assert!(err.display_detailed().contains("Declare every letter"));
    }

    /// Test that all `ParseError` variants have unique error codes
    #[test]
    fn test_all_error_codes_are_unique() {
        let mut codes = std::collections::HashSet::new();
        for err in sample_errors() {
            let code = err.code();
            assert!(code.starts_with('E'), "Error code '{code}' should start with 'E'");
            assert!(codes.insert(code), "Duplicate error code found: {code}");
        }
        assert_eq!(codes.len(), 9);
    }

    /// Test that all error codes follow the format E0XX
    #[test]
    fn test_error_code_format() {
        for err in sample_errors() {
            let code = err.code();
            assert_eq!(code.len(), 4, "Error code '{code}' should be 4 characters (E0XX)");
            assert!(code.starts_with("E0"));
            assert!(code[1..].parse::<u16>().is_ok(), "Error code '{code}' should end with a number");
        }
    }

    #[test]
    fn test_descriptions_and_details_are_nonempty() {
        for err in sample_errors() {
            assert!(!err.description().is_empty());
            assert!(!err.details().is_empty());
        }
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_nom_error_has_no_help() {
            let err = ParseError::NomError(ErrorKind::Char);
            assert!(err.help().is_none());
            assert_eq!(err.display_detailed(), format!("{err} (E010)"));
        }

        #[test]
        fn test_into_io_error() {
            let io_err: io::Error = ParseError::EmptyInput.into();
            assert_eq!(io_err.kind(), io::ErrorKind::InvalidInput);
            assert_eq!(io_err.to_string(), "Empty input string");
        }
    }
}
