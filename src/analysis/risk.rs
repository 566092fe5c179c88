use super::concentration::ConcentrationAssessment;
use super::recommendations::{self, UNABLE_TO_ANALYZE};
use super::round_to;
use super::statistics::RepositoryStatistics;
use crate::facts::RepositoryInfo;
use chrono::{DateTime, Utc};
use core::time::Duration;
use serde::Serialize;
use strum::Display;

pub const TIMED_OUT: &str = "Analysis timed out - try a shorter analysis window or a smaller repository";

const HIGH_RISK_ABOVE: f64 = 0.7;
const MEDIUM_RISK_ABOVE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_RISK_ABOVE {
            Self::High
        } else if score > MEDIUM_RISK_ABOVE {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Everything the analysis learned about one repository.
#[derive(Debug, Clone)]
pub struct RiskFactors {
    pub concentration: ConcentrationAssessment,
    pub statistics: RepositoryStatistics,
    pub repository: RepositoryInfo,
    pub recent_commits_analyzed: usize,
    pub recent_issues_analyzed: usize,
    pub bots_filtered: u32,
}

impl RiskFactors {
    #[must_use]
    pub fn total_active_contributors(&self) -> usize {
        self.concentration.ranked.len()
    }
}

/// How the analysis of a repository ended.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Complete(Box<RiskFactors>),
    Failed { error: String },
    TimedOut { after: Duration },
}

#[derive(Debug, Clone)]
pub struct RiskReport {
    /// The repository identifier exactly as requested
    pub repository: String,
    pub overall_risk_score: f64,
    pub risk_level: RiskLevel,
    pub outcome: AnalysisOutcome,
    pub recommendations: Vec<String>,
    pub analysis_date: DateTime<Utc>,
}

impl RiskReport {
    #[must_use]
    pub fn complete(repository: impl Into<String>, factors: RiskFactors, analysis_date: DateTime<Utc>) -> Self {
        let score = round_to(factors.concentration.risk, 3);
        Self {
            repository: repository.into(),
            overall_risk_score: score,
            risk_level: RiskLevel::from_score(score),
            recommendations: recommendations::synthesize(&factors),
            outcome: AnalysisOutcome::Complete(Box::new(factors)),
            analysis_date,
        }
    }

    #[must_use]
    pub fn failed(repository: impl Into<String>, error: &ohno::AppError, analysis_date: DateTime<Utc>) -> Self {
        Self::unscored(
            repository,
            AnalysisOutcome::Failed { error: format!("{error:#}") },
            UNABLE_TO_ANALYZE,
            analysis_date,
        )
    }

    #[must_use]
    pub fn timed_out(repository: impl Into<String>, after: Duration, analysis_date: DateTime<Utc>) -> Self {
        Self::unscored(repository, AnalysisOutcome::TimedOut { after }, TIMED_OUT, analysis_date)
    }

    fn unscored(repository: impl Into<String>, outcome: AnalysisOutcome, recommendation: &str, analysis_date: DateTime<Utc>) -> Self {
        Self {
            repository: repository.into(),
            overall_risk_score: 1.0,
            risk_level: RiskLevel::High,
            outcome,
            recommendations: vec![recommendation.to_string()],
            analysis_date,
        }
    }

    #[must_use]
    pub fn factors(&self) -> Option<&RiskFactors> {
        match &self.outcome {
            AnalysisOutcome::Complete(factors) => Some(factors.as_ref()),
            AnalysisOutcome::Failed { .. } | AnalysisOutcome::TimedOut { .. } => None,
        }
    }
}
