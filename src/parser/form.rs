use crate::equation::Equation;
use crate::errors::ParseError;
use crate::parser::utils::{longest_prefix, validate_names, LETTER_RE, VARIABLE_RE};
use crate::symbol::Symbol;
use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, satisfy},
    combinator::{opt, recognize, value},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult,
    Parser,
};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Parser result type: input, output, with our custom `ParseError`
pub type PResult<'a, O> = IResult<&'a str, O, Box<ParseError>>;

/// An equation together with the alphabet and variables it was declared with.
///
/// Textual form: `{A, B}, {x, y}, ABxy = xBAy`. Names inside the sets are
/// separated by commas, semicolons or whitespace. Each side of the equation
/// is a concatenation of declared names; whitespace between them is ignored
/// and either side may be empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedEquation {
    pub alphabet: Vec<Rc<str>>,
    pub variables: Vec<Rc<str>>,
    pub equation: Equation,
}

impl FromStr for ParsedEquation {
    type Err = Box<ParseError>;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.trim().is_empty() {
            return Err(Box::new(ParseError::EmptyInput));
        }

        let (rest, (letters, variables)) = match declarations(input) {
            Ok(parsed) => parsed,
            Err(nom::Err::Failure(e)) => return Err(e),
            Err(_) => return Err(Box::new(ParseError::ParseFailure { s: input.to_string() })),
        };

        let alphabet = validate_names(&letters, &LETTER_RE, |token| ParseError::InvalidLetterName { token })?;
        let variables = validate_names(&variables, &VARIABLE_RE, |token| ParseError::InvalidVariableName { token })?;
        let mut seen = HashSet::new();
        if let Some(dup) = alphabet.iter().chain(&variables).find(|name| !seen.insert(Rc::clone(name))) {
            return Err(Box::new(ParseError::DuplicateDeclaration { token: dup.to_string() }));
        }

        let (lhs, rhs) = match rest.matches('=').count() {
            0 => return Err(Box::new(ParseError::MissingEquals { input: rest.trim().to_string() })),
            1 => rest.split_once('=').unwrap_or((rest, "")),
            _ => return Err(Box::new(ParseError::MultipleEquals { input: rest.trim().to_string() })),
        };

        let lhs = parse_side(lhs, &alphabet, &variables)?;
        let rhs = parse_side(rhs, &alphabet, &variables)?;
        Ok(ParsedEquation { alphabet, variables, equation: Equation::new(lhs, rhs) })
    }
}

impl fmt::Display for ParsedEquation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}, {{{}}}, {}", self.alphabet.join(", "), self.variables.join(", "), self.equation)
    }
}

/// Read one side: greedy longest match against the declared names of the
/// class selected by the case of the next character.
fn parse_side(text: &str, alphabet: &[Rc<str>], variables: &[Rc<str>]) -> Result<Vec<Symbol>, Box<ParseError>> {
    let mut rest = text.trim_start();
    let mut symbols = Vec::new();

    while !rest.is_empty() {
        match side_symbol(rest, alphabet, variables) {
            Ok((next, symbol)) => {
                symbols.push(symbol);
                rest = next.trim_start();
            }
            Err(nom::Err::Failure(e)) => return Err(e),
            Err(_) => {
                return Err(Box::new(ParseError::UnknownToken {
                    side: text.trim().to_string(),
                    rest: rest.to_string(),
                }));
            }
        }
    }

    Ok(symbols)
}

fn side_symbol<'a>(input: &'a str, alphabet: &[Rc<str>], variables: &[Rc<str>]) -> PResult<'a, Symbol> {
    let uppercase = input.chars().next().is_some_and(char::is_uppercase);
    let candidates = if uppercase { alphabet } else { variables };
    match longest_prefix(input, candidates) {
        Some(name) if uppercase => Ok((&input[name.len()..], Symbol::letter(name))),
        Some(name) => Ok((&input[name.len()..], Symbol::variable(name))),
        None => Err(nom::Err::Error(Box::new(ParseError::NomError(nom::error::ErrorKind::Tag)))),
    }
}

// === Declaration parsers ===

fn name(input: &'_ str) -> PResult<'_, &'_ str> {
    recognize(pair(
        satisfy(char::is_alphabetic),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '\''),
    ))
    .parse(input)
}

fn separator(input: &'_ str) -> PResult<'_, ()> {
    value((), take_while1(|c: char| c == ',' || c == ';' || c.is_whitespace())).parse(input)
}

/// `{A, B; C}`
fn name_set(input: &'_ str) -> PResult<'_, Vec<&'_ str>> {
    delimited(
        pair(char('{'), multispace0),
        separated_list0(separator, name),
        pair(opt(separator), char('}')),
    )
    .parse(input)
}

fn comma(input: &'_ str) -> PResult<'_, char> {
    delimited(multispace0, char(','), multispace0).parse(input)
}

/// `{letters}, {variables},`
fn declarations(input: &'_ str) -> PResult<'_, (Vec<&'_ str>, Vec<&'_ str>)> {
    let (input, _) = multispace0(input)?;
    let (input, letters) = name_set(input)?;
    let (input, _) = comma(input)?;
    let (input, variables) = name_set(input)?;
    let (input, _) = comma(input)?;
    Ok((input, (letters, variables)))
}
