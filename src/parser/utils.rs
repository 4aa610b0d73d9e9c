use crate::errors::ParseError;
use fancy_regex::Regex;
use std::rc::Rc;
use std::sync::LazyLock;

/// Alphabet letters: uppercase first character.
///
/// NB: This regex is validated at WASM startup in `wasm::validate_internal_regexes()`.
pub(crate) static LETTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][A-Za-z0-9_']*$")
        .unwrap_or_else(|e| panic!("BUG: Failed to compile LETTER_RE: {e}."))
});

/// Variables: lowercase first character.
///
/// NB: This regex is validated at WASM startup in `wasm::validate_internal_regexes()`.
pub(crate) static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][A-Za-z0-9_']*$")
        .unwrap_or_else(|e| panic!("BUG: Failed to compile VARIABLE_RE: {e}."))
});

/// Check every name against `re`, turning the first mismatch into an error.
pub(crate) fn validate_names(
    names: &[&str],
    re: &Regex,
    invalid: fn(String) -> ParseError,
) -> Result<Vec<Rc<str>>, Box<ParseError>> {
    names
        .iter()
        .map(|name| {
            if re.is_match(name).map_err(|e| Box::new(ParseError::from(e)))? {
                Ok(Rc::from(*name))
            } else {
                Err(Box::new(invalid((*name).to_string())))
            }
        })
        .collect()
}

/// The longest of `candidates` that `text` starts with.
pub(crate) fn longest_prefix<'a>(text: &str, candidates: &'a [Rc<str>]) -> Option<&'a Rc<str>> {
    candidates
        .iter()
        .filter(|candidate| text.starts_with(&***candidate))
        .max_by_key(|candidate| candidate.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<Rc<str>> {
        list.iter().map(|s| Rc::from(*s)).collect()
    }

    #[test]
    fn test_letter_names() {
        assert!(LETTER_RE.is_match("A").unwrap());
        assert!(LETTER_RE.is_match("B2'").unwrap());
        assert!(!LETTER_RE.is_match("a").unwrap());
        assert!(!LETTER_RE.is_match("A-B").unwrap());
    }

    #[test]
    fn test_variable_names() {
        assert!(VARIABLE_RE.is_match("x").unwrap());
        assert!(VARIABLE_RE.is_match("rest_1").unwrap());
        assert!(!VARIABLE_RE.is_match("X").unwrap());
    }

    #[test]
    fn test_validate_names() {
        let ok = validate_names(&["A", "Bc"], &LETTER_RE, |token| ParseError::InvalidLetterName { token }).unwrap();
        assert_eq!(ok, names(&["A", "Bc"]));

        let err = validate_names(&["A", "b"], &LETTER_RE, |token| ParseError::InvalidLetterName { token }).unwrap_err();
        assert_eq!(err.code(), "E006");
    }

    #[test]
    fn test_longest_prefix() {
        let candidates = names(&["A", "AB", "B"]);
        assert_eq!(longest_prefix("ABA", &candidates).map(|s| &**s), Some("AB"));
        assert_eq!(longest_prefix("BA", &candidates).map(|s| &**s), Some("B"));
        assert_eq!(longest_prefix("C", &candidates), None);
    }
}
