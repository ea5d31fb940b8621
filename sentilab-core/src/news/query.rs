//! Query expansion: one instrument becomes six search phrases.

/// Suffixes appended to the instrument symbol, in request order.
pub const QUERY_TEMPLATES: [&str; 6] = [
    "Outlook",
    "News",
    "Stock Analysis",
    "Stock Market",
    "Predictions",
    "Report",
];

pub fn expand(symbol: &str) -> [String; 6] {
    QUERY_TEMPLATES.map(|suffix| format!("{symbol} {suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_in_fixed_order() {
        let q = expand("ACME");
        assert_eq!(
            q,
            [
                "ACME Outlook",
                "ACME News",
                "ACME Stock Analysis",
                "ACME Stock Market",
                "ACME Predictions",
                "ACME Report",
            ]
        );
    }

    #[test]
    fn deterministic() {
        assert_eq!(expand("NVDA"), expand("NVDA"));
    }
}
