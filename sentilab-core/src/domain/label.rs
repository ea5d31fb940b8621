use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Three-way sentiment bucket.
///
/// Declaration order is the tie-break priority for majority voting:
/// bullish wins over bearish, bearish over neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentLabel {
    /// Labels in tie-break priority order.
    pub const PRIORITY: [SentimentLabel; 3] = [
        SentimentLabel::Bullish,
        SentimentLabel::Bearish,
        SentimentLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "bullish",
            SentimentLabel::Bearish => "bearish",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bullish" => Ok(SentimentLabel::Bullish),
            "bearish" => Ok(SentimentLabel::Bearish),
            "neutral" => Ok(SentimentLabel::Neutral),
            other => Err(format!("unknown sentiment label '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lowercase() {
        assert_eq!(SentimentLabel::Bullish.to_string(), "bullish");
        assert_eq!(SentimentLabel::Neutral.to_string(), "neutral");
    }

    #[test]
    fn parse_accepts_any_case() {
        assert_eq!("BEARISH".parse::<SentimentLabel>().unwrap(), SentimentLabel::Bearish);
        assert!("sideways".parse::<SentimentLabel>().is_err());
    }
}
