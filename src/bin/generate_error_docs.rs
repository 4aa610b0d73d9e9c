//! Generate error code documentation from the source of truth (error enums).
//!
//! This binary reads the error codes, descriptions, details, and help text
//! directly from the `ParseError` and `SolverError` implementations via their
//! `code()`, `description()`, `details()`, and `help()` methods.
//!
//! Run with:
//! ```bash
//! cargo run --bin generate_error_docs > docs/ERROR_CODES.md
//! ```

use wordeq::errors::ParseError;
use wordeq::solver::SolverError;

/// Macro to generate error documentation for any error type
/// with `code()`, `description()`, `details()`, `help()`, and `display_detailed()` methods
macro_rules! generate_error_docs {
    ($errors:expr) => {
        for error in $errors {
            println!("### {}: {}\n", error.code(), error.description());
            println!("**Details:** {}\n", error.details());

            if let Some(help_text) = error.help() {
                println!("**How to fix:**");
                println!("```");
                println!("{help_text}");
                println!("```\n");
            }

            println!("**Example error message:**");
            println!("```");
            println!("{error}");
            println!("```\n");

            println!("**Detailed format:**");
            println!("```");
            println!("{}", error.display_detailed());
            println!("```\n");

            println!("---\n");
        }
    };
}

/// Helper to create all `ParseError` variants for documentation
fn all_parse_error_variants() -> Vec<ParseError> {
    let mut variants = vec![ParseError::ParseFailure { s: "{A}, x = A".to_string() }];
    // RegexError--create by attempting to compile an invalid regex
    if let Err(e) = fancy_regex::Regex::new("(?P<invalid") {
        variants.push(ParseError::RegexError(e));
    }
    variants.extend([
        ParseError::EmptyInput,
        ParseError::MissingEquals { input: "xA".to_string() },
        ParseError::MultipleEquals { input: "x = A = x".to_string() },
        ParseError::InvalidLetterName { token: "a".to_string() },
        ParseError::InvalidVariableName { token: "X".to_string() },
        ParseError::DuplicateDeclaration { token: "A".to_string() },
        ParseError::UnknownToken { side: "AB".to_string(), rest: "B".to_string() },
        // NomError--use a common error kind
        ParseError::NomError(nom::error::ErrorKind::Tag),
    ]);
    variants
}

/// Helper to create all `SolverError` variants for documentation
fn all_solver_error_variants() -> Vec<SolverError> {
    vec![
        SolverError::ParseFailure(Box::new(ParseError::EmptyInput)),
        SolverError::InvalidConfig { reason: "max_iterations_count must be at least 1".to_string() },
    ]
}

fn main() {
    println!("# Error Code Reference\n");
    println!("**⚠️ This document is auto-generated from the source code. Do not edit manually.**\n");

    println!("## Table of Contents\n");
    println!("- [Solver Errors (S001–S002)](#solver-errors)");
    println!("- [Parse Errors (E001–E010)](#parse-errors)");
    println!("- [How to Use Error Codes](#how-to-use-error-codes)\n");

    generate_solver_error_docs();
    generate_parse_error_docs();

    println!("\n## How to Use Error Codes\n");
    println!("When you see an error like:\n");
    println!("```");
    println!("Error: S001");
    println!("  caused by: No '=' found in equation \"xA\" (E004)");
    println!("Separate the two sides with '=' (e.g., 'Ax = xA')");
    println!("```\n");
    println!("1. Note the error code (e.g., `E004`)");
    println!("2. Look it up in this document for detailed explanation");
    println!("3. Follow the suggested resolution steps\n");
}

fn generate_solver_error_docs() {
    println!("## Solver Errors\n");
    println!("Top-level errors from the solver. These wrap lower-level parse errors or reject the configuration.\n");
    generate_error_docs!(all_solver_error_variants());
}

fn generate_parse_error_docs() {
    println!("## Parse Errors\n");
    println!("Errors that occur when parsing the textual equation.\n");
    generate_error_docs!(all_parse_error_variants());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_code_is_documented_once() {
        let parse_codes: Vec<&str> = all_parse_error_variants().iter().map(ParseError::code).collect();
        assert_eq!(parse_codes.len(), 10);
        assert_eq!(parse_codes.iter().collect::<HashSet<_>>().len(), parse_codes.len());

        let solver_codes: Vec<&str> = all_solver_error_variants().iter().map(SolverError::code).collect();
        assert_eq!(solver_codes, ["S001", "S002"]);
    }
}
