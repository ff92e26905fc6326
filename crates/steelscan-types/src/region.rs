//! The fixed universe of region codes a profile can sell into

/// The 50 US state postal codes
pub const REGION_CODES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY",
];

pub fn is_region_code(code: &str) -> bool {
    REGION_CODES.contains(&code)
}

/// All region codes, owned
pub fn all_regions() -> Vec<String> {
    REGION_CODES.iter().map(|c| c.to_string()).collect()
}

/// Uppercase, drop unknown and duplicate codes, and order by the universe.
pub fn normalize_regions<S: AsRef<str>>(codes: &[S]) -> Vec<String> {
    let wanted: Vec<String> = codes
        .iter()
        .map(|c| c.as_ref().trim().to_uppercase())
        .collect();
    REGION_CODES
        .iter()
        .filter(|code| wanted.iter().any(|w| w == *code))
        .map(|code| code.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_regions() {
        let normalized = normalize_regions(&["tx", "TX", "ZZ", "AL", " ok "]);
        assert_eq!(normalized, vec!["AL", "OK", "TX"]);
    }

    #[test]
    fn test_universe_is_unique() {
        let all = all_regions();
        assert_eq!(normalize_regions(&all).len(), 50);
        assert!(is_region_code("WY"));
        assert!(!is_region_code("DC"));
    }
}
