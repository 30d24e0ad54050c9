//! ISBN-13 canonicalization

use once_cell::sync::Lazy;
use regex::Regex;

static ISBN13_GROUPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{3})(\d)(\d{3})(\d{5})(\d)$").unwrap());

/// Canonicalizes a raw ISBN into the `ddd-d-ddd-ddddd-d` form.
///
/// Strips every non-digit character first, so hyphenated and spaced input
/// is accepted. Returns `None` unless exactly 13 digits remain.
pub fn canonicalize_isbn(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 13 {
        return None;
    }
    Some(ISBN13_GROUPS.replace(&digits, "$1-$2-$3-$4-$5").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_a_bare_13_digit_isbn() {
        assert_eq!(
            canonicalize_isbn("9788535902773").as_deref(),
            Some("978-8-535-90277-3")
        );
    }

    #[test]
    fn accepts_already_hyphenated_input() {
        assert_eq!(
            canonicalize_isbn("978-8-535-90277-3").as_deref(),
            Some("978-8-535-90277-3")
        );
        assert_eq!(
            canonicalize_isbn("978 85 359 0277 3").as_deref(),
            Some("978-8-535-90277-3")
        );
    }

    #[test]
    fn rejects_wrong_lengths() {
        assert_eq!(canonicalize_isbn("123"), None);
        assert_eq!(canonicalize_isbn("97885359027731"), None);
        assert_eq!(canonicalize_isbn(""), None);
    }

    #[test]
    fn rejects_input_with_too_few_digits_among_junk() {
        assert_eq!(canonicalize_isbn("isbn: 12-34"), None);
    }
}
