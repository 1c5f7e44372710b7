//! Lossy name canonicalization used only for fuzzy matching

/// Terms removed after stripping punctuation, in removal order.
/// `creditcard` goes first so it is removed whole before shorter terms can
/// cut into it.
const NOISE_TERMS: [&str; 8] = [
    "creditcard",
    "unsecuredloan",
    "securedloan",
    "loan",
    "mortgage",
    "plc",
    "ltd",
    "limited",
];

/// Normalize an account or lender name for comparison.
///
/// Lowercases, keeps only ASCII letters and digits, then removes every
/// occurrence of each noise term. The removal pass repeats until nothing
/// changes, so a removal that splices a new noise term together
/// (`"lloanoan"`) cannot leave one behind and the function is idempotent.
pub fn normalize(text: &str) -> String {
    let mut normalized: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    loop {
        let before = normalized.len();
        for term in NOISE_TERMS {
            if normalized.contains(term) {
                normalized = normalized.replace(term, "");
            }
        }
        if normalized.len() == before {
            return normalized;
        }
    }
}

/// Containment in either direction. An empty side never matches.
pub fn cross_match(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_case_and_punctuation() {
        assert_eq!(normalize("American Express"), "americanexpress");
        assert_eq!(normalize("  M&S Bank!  "), "msbank");
        assert_eq!(normalize("Café 24"), "caf24");
    }

    #[test]
    fn test_removes_noise_terms() {
        assert_eq!(normalize("Chase Credit Card"), "chase");
        assert_eq!(normalize("Barclays Bank PLC"), "barclaysbank");
        assert_eq!(normalize("Zopa Unsecured Loan"), "zopa");
        assert_eq!(normalize("Nationwide Mortgage"), "nationwide");
        assert_eq!(normalize("Tesco Bank Limited"), "tescobank");
        assert_eq!(normalize("Loans Ltd"), "s");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t "), "");
        assert_eq!(normalize("Loan"), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Chase Credit Card",
            "lloanoan",
            "credit limited card",
            "HSBC UK Bank plc",
            "Secured Loan - Mortgage Ltd.",
            "pplclc",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
        assert_eq!(normalize("lloanoan"), "");
        assert_eq!(normalize("credit limited card"), "");
    }

    #[test]
    fn test_cross_match() {
        assert!(cross_match("chase", "chasebank"));
        assert!(cross_match("chasebank", "chase"));
        assert!(!cross_match("chase", "barclays"));
        assert!(!cross_match("", "chase"));
        assert!(!cross_match("chase", ""));
        assert!(!cross_match("", ""));
    }
}
