//! Normalization of model-produced diagnosis codes.

/// Uppercases, trims, and strips trailing punctuation from a code.
pub fn normalize_code(code: &str) -> String {
    code.trim()
        .to_uppercase()
        .trim_end_matches([':', ';', '.', ','])
        .to_owned()
}

/// Returns search terms for a code: the normalized code, then its dotless
/// variant, without duplicates.
pub fn lookup_candidates(code: &str) -> Vec<String> {
    let normalized = normalize_code(code);
    if normalized.is_empty() {
        return Vec::new();
    }

    let dotless = normalized.replace('.', "");
    let mut candidates = vec![normalized];
    if !candidates.contains(&dotless) && !dotless.is_empty() {
        candidates.push(dotless);
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_punctuation() {
        assert_eq!(normalize_code(" e11.9: "), "E11.9");
        assert_eq!(normalize_code("I10.,;"), "I10");
        assert_eq!(normalize_code(""), "");
    }

    #[test]
    fn candidates_include_dotless_variant() {
        assert_eq!(lookup_candidates("e11.9"), ["E11.9", "E119"]);
        assert_eq!(lookup_candidates("I10"), ["I10"]);
        assert!(lookup_candidates("  ").is_empty());
    }
}
