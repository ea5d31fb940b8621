//! Lexicon polarity scorer.
//!
//! Averages the polarity of every lexicon word found in the text. Within a
//! clause, a negator flips and halves the next lexicon word, and an
//! intensifier scales the word right after it. Clauses are delimited by
//! `. , ; : ! ?`, and modifiers never carry across a delimiter.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::SentimentScorer;

const POLARITY: &[(&str, f64)] = &[
    // general
    ("good", 0.7),
    ("great", 0.8),
    ("excellent", 1.0),
    ("best", 1.0),
    ("better", 0.5),
    ("impressive", 1.0),
    ("happy", 0.8),
    ("positive", 0.227),
    ("strong", 0.433),
    ("stronger", 0.5),
    ("solid", 0.3),
    ("robust", 0.4),
    ("success", 0.75),
    ("successful", 0.75),
    ("optimistic", 0.5),
    ("upbeat", 0.6),
    ("confident", 0.5),
    ("win", 0.8),
    ("wins", 0.8),
    ("bad", -0.7),
    ("poor", -0.4),
    ("weak", -0.375),
    ("weaker", -0.4),
    ("worse", -0.4),
    ("worst", -1.0),
    ("terrible", -1.0),
    ("awful", -1.0),
    ("negative", -0.3),
    ("disappointing", -0.6),
    ("pessimistic", -0.5),
    ("uncertain", -0.3),
    ("uncertainty", -0.3),
    ("volatile", -0.3),
    ("fear", -0.5),
    ("fears", -0.5),
    ("concern", -0.25),
    ("concerns", -0.25),
    ("warning", -0.4),
    // market moves
    ("bullish", 0.5),
    ("bearish", -0.5),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("rallied", 0.4),
    ("surge", 0.5),
    ("surges", 0.5),
    ("surged", 0.5),
    ("soar", 0.5),
    ("soars", 0.5),
    ("soared", 0.5),
    ("jump", 0.3),
    ("jumps", 0.3),
    ("jumped", 0.3),
    ("gain", 0.3),
    ("gains", 0.3),
    ("rise", 0.2),
    ("rises", 0.2),
    ("rising", 0.2),
    ("higher", 0.25),
    ("record", 0.2),
    ("boost", 0.3),
    ("boosts", 0.3),
    ("beat", 0.3),
    ("beats", 0.3),
    ("upgrade", 0.4),
    ("upgraded", 0.4),
    ("outperform", 0.4),
    ("profit", 0.3),
    ("profitable", 0.5),
    ("growth", 0.3),
    ("buy", 0.2),
    ("fall", -0.3),
    ("falls", -0.3),
    ("fell", -0.3),
    ("drop", -0.3),
    ("drops", -0.3),
    ("dropped", -0.3),
    ("decline", -0.3),
    ("declines", -0.3),
    ("lower", -0.2),
    ("loss", -0.4),
    ("losses", -0.4),
    ("plunge", -0.6),
    ("plunges", -0.6),
    ("plunged", -0.6),
    ("crash", -0.7),
    ("crashes", -0.7),
    ("slump", -0.5),
    ("slumps", -0.5),
    ("miss", -0.3),
    ("misses", -0.3),
    ("missed", -0.3),
    ("downgrade", -0.4),
    ("downgraded", -0.4),
    ("underperform", -0.4),
    ("cut", -0.2),
    ("cuts", -0.2),
    ("sell", -0.2),
    ("sell-off", -0.5),
    ("selloff", -0.5),
    ("risk", -0.2),
    ("risks", -0.2),
    ("lawsuit", -0.4),
    ("fraud", -0.8),
    ("layoffs", -0.4),
    ("recession", -0.5),
    ("slowdown", -0.4),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("really", 1.2),
    ("incredibly", 1.5),
    ("remarkably", 1.3),
    ("quite", 1.1),
    ("somewhat", 0.8),
    ("slightly", 0.6),
    ("barely", 0.5),
];

const NEGATORS: &[&str] = &["not", "no", "never", "neither", "nor", "without", "cannot"];

const CLAUSE_DELIMITERS: &[char] = &['.', ',', ';', ':', '!', '?', '\n'];

const NEGATION_FACTOR: f64 = -0.5;

struct Tables {
    polarity: HashMap<&'static str, f64>,
    intensity: HashMap<&'static str, f64>,
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| Tables {
        polarity: POLARITY.iter().copied().collect(),
        intensity: INTENSIFIERS.iter().copied().collect(),
    })
}

fn is_negator(token: &str) -> bool {
    NEGATORS.contains(&token) || token.ends_with("n't")
}

fn tokens(clause: &str) -> impl Iterator<Item = String> + '_ {
    clause
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .map(|t| t.trim_matches(|c: char| c == '\'' || c == '-'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Pattern-style lexicon scorer; the canonical polarity of the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    /// Polarity contribution of every matched lexicon word, in text order.
    pub fn assessments(&self, text: &str) -> Vec<(String, f64)> {
        let tables = tables();
        let normalized = text.replace(['\u{2019}', '\u{2018}'], "'");
        let mut out = Vec::new();

        for clause in normalized.split(CLAUSE_DELIMITERS) {
            let mut negated = false;
            let mut multiplier: Option<f64> = None;

            for token in tokens(clause) {
                if is_negator(&token) {
                    negated = true;
                    multiplier = None;
                    continue;
                }
                if let Some(&m) = tables.intensity.get(token.as_str()) {
                    multiplier = Some(m);
                    continue;
                }
                match tables.polarity.get(token.as_str()) {
                    Some(&p) => {
                        let mut value = p * multiplier.take().unwrap_or(1.0);
                        if negated {
                            value *= NEGATION_FACTOR;
                            negated = false;
                        }
                        out.push((token, value.clamp(-1.0, 1.0)));
                    }
                    None => multiplier = None,
                }
            }
        }
        out
    }
}

impl SentimentScorer for LexiconScorer {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn score_text(&self, text: &str) -> f64 {
        let assessed = self.assessments(text);
        if assessed.is_empty() {
            return 0.0;
        }
        let mean = assessed.iter().map(|(_, v)| v).sum::<f64>() / assessed.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}
