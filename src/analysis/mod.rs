//! Sustainability risk analysis
//!
//! Turns the activity records of a single repository into a risk report:
//!
//! - [`identity`] classifies commit emails and filters out automation accounts.
//! - [`aggregator`] folds commits, issues, pull requests, reviews and comments into a
//!   [`ContributorLedger`], bucketing activity into four quarters of the [`AnalysisWindow`].
//! - [`trend`] and [`sentiment`] annotate each contributor.
//! - [`concentration`] and [`statistics`] measure how dependent the project is on its top
//!   contributors and how quickly issues and pull requests get closed.
//! - [`recommendations`] turns the resulting [`RiskFactors`] into advice.
//!
//! [`Analyzer`] drives the pipeline for a batch of repositories.

pub mod aggregator;
mod analyzer;
pub mod concentration;
pub mod identity;
pub mod ledger;
pub mod recommendations;
pub mod risk;
pub mod sentiment;
pub mod statistics;
pub mod trend;
mod window;

pub use analyzer::{AnalysisRequest, Analyzer, AnalyzerSettings, validate_window_days};
pub use concentration::{ActivityDistribution, ConcentrationAssessment};
pub use identity::{EmailCategory, IdentityClassifier, IdentityConfig};
pub use ledger::{ContributorEntry, ContributorLedger};
pub use risk::{AnalysisOutcome, RiskFactors, RiskLevel, RiskReport};
pub use sentiment::{LexiconScorer, SentimentLabel, SentimentScore, SentimentScorer, SentimentSummary};
pub use statistics::RepositoryStatistics;
pub use trend::ActivityTrend;
pub use window::{AnalysisWindow, MAX_WINDOW_DAYS, QUARTERS, quarter_index};

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert!((round_to(0.123_456, 3) - 0.123).abs() < 1e-12);
        assert!((round_to(2.005_1, 2) - 2.01).abs() < 1e-12);
        assert!((round_to(-0.000_4, 3)).abs() < 1e-12);
    }
}
