//! Per-contributor sentiment summaries.
//!
//! Raw text scoring sits behind [`SentimentScorer`]. The default [`LexiconScorer`] averages the
//! polarity and subjectivity of known words, flipping polarity after a negation and scaling it
//! after an intensifier.

use super::round_to;
use crate::Result;
use crate::facts::ContributorMessage;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use strum::Display;

const LOG_TARGET: &str = " sentiment";

/// Contributors below this total activity are not sampled.
pub const MIN_ACTIVITY_FOR_SENTIMENT: u32 = 10;

const POSITIVE_CUTOFF: f64 = 0.3;
const NEGATIVE_CUTOFF: f64 = -0.3;

/// Polarity in `-1.0..=1.0` and subjectivity in `0.0..=1.0` for a single message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    pub polarity: f64,
    pub subjectivity: f64,
}

impl SentimentScore {
    pub const NEUTRAL: Self = Self {
        polarity: 0.0,
        subjectivity: 0.0,
    };
}

/// Turns free text into a sentiment score.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<SentimentScore>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    NoRecentCommentsFound,
    InsufficientActivity,
}

impl SentimentLabel {
    #[must_use]
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > POSITIVE_CUTOFF {
            Self::Positive
        } else if polarity < NEGATIVE_CUTOFF {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub average_polarity: f64,
    pub average_subjectivity: f64,
    pub messages_analyzed: usize,
    pub label: SentimentLabel,
}

impl SentimentSummary {
    #[must_use]
    pub const fn insufficient_activity() -> Self {
        Self::empty(SentimentLabel::InsufficientActivity)
    }

    #[must_use]
    pub const fn no_recent_comments() -> Self {
        Self::empty(SentimentLabel::NoRecentCommentsFound)
    }

    const fn empty(label: SentimentLabel) -> Self {
        Self {
            average_polarity: 0.0,
            average_subjectivity: 0.0,
            messages_analyzed: 0,
            label,
        }
    }
}

/// Score every message and average the results.
///
/// A message the scorer rejects still counts, as a neutral one.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "message counts are tiny")]
pub fn summarize<C: SentimentScorer + ?Sized>(scorer: &C, messages: &[ContributorMessage]) -> SentimentSummary {
    if messages.is_empty() {
        return SentimentSummary::no_recent_comments();
    }

    let (polarity_sum, subjectivity_sum) = messages
        .iter()
        .map(|message| {
            scorer.score(message.body()).unwrap_or_else(|e| {
                log::debug!(target: LOG_TARGET, "Could not score {} message, treating it as neutral: {e:#}", message.kind());
                SentimentScore::NEUTRAL
            })
        })
        .fold((0.0, 0.0), |(p, s), score| (p + score.polarity, s + score.subjectivity));

    let count = messages.len() as f64;
    let average_polarity = polarity_sum / count;
    let average_subjectivity = subjectivity_sum / count;

    SentimentSummary {
        average_polarity: round_to(average_polarity, 3),
        average_subjectivity: round_to(average_subjectivity, 3),
        messages_analyzed: messages.len(),
        label: SentimentLabel::from_polarity(average_polarity),
    }
}

/// Remove a leading `KIND:` label such as `COMMIT:` or `PR_REVIEW:` from a message.
///
/// Only upper-case labels made of letters and underscores are stripped, so ordinary prose
/// containing a colon is left alone.
#[must_use]
pub fn strip_label_prefix(text: &str) -> &str {
    match text.split_once(':') {
        Some((label, rest)) if !label.is_empty() && label.chars().all(|c| c.is_ascii_uppercase() || c == '_') => rest.trim(),
        _ => text.trim(),
    }
}

static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]+(?:'[a-z]+)?").expect("word pattern is valid"));

const NEGATION_FACTOR: f64 = -0.5;

/// (word, polarity, subjectivity)
const LEXICON: &[(&str, f64, f64)] = &[
    ("amazing", 0.6, 0.9),
    ("annoying", -0.8, 0.9),
    ("appreciate", 0.5, 0.6),
    ("appreciated", 0.5, 0.6),
    ("awesome", 1.0, 1.0),
    ("awful", -1.0, 1.0),
    ("bad", -0.7, 0.67),
    ("beautiful", 0.85, 1.0),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("broken", -0.4, 0.4),
    ("clean", 0.37, 0.69),
    ("clear", 0.1, 0.38),
    ("confusing", -0.4, 0.7),
    ("cool", 0.35, 0.65),
    ("correct", 0.0, 0.0),
    ("disappointed", -0.75, 0.75),
    ("disappointing", -0.6, 0.7),
    ("easy", 0.43, 0.83),
    ("elegant", 0.5, 0.8),
    ("excellent", 1.0, 1.0),
    ("fantastic", 0.4, 0.9),
    ("fine", 0.42, 0.5),
    ("frustrating", -0.4, 0.7),
    ("glad", 0.5, 1.0),
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("happy", 0.8, 1.0),
    ("hate", -0.8, 0.9),
    ("helpful", 0.5, 0.5),
    ("horrible", -1.0, 1.0),
    ("impressive", 1.0, 1.0),
    ("improved", 0.3, 0.4),
    ("interesting", 0.5, 0.5),
    ("lovely", 0.5, 0.75),
    ("love", 0.5, 0.6),
    ("mess", -0.3, 0.5),
    ("messy", -0.4, 0.6),
    ("nice", 0.6, 1.0),
    ("perfect", 1.0, 1.0),
    ("pointless", -0.5, 0.8),
    ("poor", -0.4, 0.6),
    ("ridiculous", -0.33, 1.0),
    ("sad", -0.5, 1.0),
    ("simple", 0.0, 0.36),
    ("slow", -0.3, 0.39),
    ("sorry", -0.5, 1.0),
    ("stupid", -0.8, 1.0),
    ("terrible", -1.0, 1.0),
    ("thank", 0.2, 0.2),
    ("thanks", 0.2, 0.2),
    ("ugly", -0.7, 1.0),
    ("unfortunately", -0.5, 1.0),
    ("useful", 0.3, 0.0),
    ("useless", -0.5, 0.0),
    ("weird", -0.5, 1.0),
    ("welcome", 0.8, 0.9),
    ("wonderful", 1.0, 1.0),
    ("worse", -0.4, 0.6),
    ("worst", -1.0, 1.0),
    ("wrong", -0.5, 0.9),
];

/// (word, multiplier)
const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.3),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("incredibly", 1.4),
    ("quite", 1.1),
    ("really", 1.3),
    ("so", 1.3),
    ("super", 1.4),
    ("totally", 1.3),
    ("very", 1.3),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "wasn't", "aren't", "won't", "can't", "cannot", "shouldn't",
];

/// Word-list sentiment scorer.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    words: HashMap<&'static str, SentimentScore>,
    intensifiers: HashMap<&'static str, f64>,
}

impl LexiconScorer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: LEXICON
                .iter()
                .map(|&(word, polarity, subjectivity)| (word, SentimentScore { polarity, subjectivity }))
                .collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for LexiconScorer {
    #[expect(clippy::cast_precision_loss, reason = "word counts are tiny")]
    fn score(&self, text: &str) -> Result<SentimentScore> {
        let text = strip_label_prefix(text).to_lowercase();

        let mut polarity_sum = 0.0;
        let mut subjectivity_sum = 0.0;
        let mut matched = 0_usize;
        let mut negated = false;
        let mut multiplier = 1.0;

        for word in WORD_PATTERN.find_iter(&text).map(|m| m.as_str()) {
            if NEGATIONS.contains(&word) {
                negated = true;
                continue;
            }

            if let Some(&boost) = self.intensifiers.get(word) {
                multiplier *= boost;
                continue;
            }

            if let Some(entry) = self.words.get(word) {
                let mut polarity = (entry.polarity * multiplier).clamp(-1.0, 1.0);
                if negated {
                    polarity *= NEGATION_FACTOR;
                }
                polarity_sum += polarity;
                subjectivity_sum += (entry.subjectivity * multiplier).min(1.0);
                matched += 1;
            }

            negated = false;
            multiplier = 1.0;
        }

        if matched == 0 {
            return Ok(SentimentScore::NEUTRAL);
        }

        let count = matched as f64;
        Ok(SentimentScore {
            polarity: (polarity_sum / count).clamp(-1.0, 1.0),
            subjectivity: (subjectivity_sum / count).clamp(0.0, 1.0),
        })
    }
}
