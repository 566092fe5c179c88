use super::Host;
use super::common::{ColorMode, LogLevel, init_logging};
use super::config::Config;
use crate::Result;
use crate::analysis::{
    AnalysisRequest, Analyzer, AnalyzerSettings, IdentityClassifier, LexiconScorer, RiskLevel, RiskReport, validate_window_days,
};
use crate::facts::{DEFAULT_API_URL, GitHubSource};
use crate::reports::{generate_console, generate_json};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use clap::Parser;
use core::time::Duration;
use ohno::IntoAppError;
use std::fs;
use std::io::Write;

const LOG_TARGET: &str = "   analyze";

/// Time limit for a single GitHub API request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Repositories to analyze (format: `owner/repo`, `github.com/owner/repo`, or a repository URL)
    #[arg(value_name = "REPO", required = true)]
    pub repositories: Vec<String>,

    /// Look-back window in days, between 1 and 365 [default: `analysis_days` from the configuration]
    #[arg(long, short = 'd', value_name = "DAYS")]
    pub days: Option<u32>,

    /// Sample recent messages of active contributors and score their sentiment
    #[arg(long)]
    pub sentiment: bool,

    /// Email domain of your organization, reported as `custom` (can be repeated)
    #[arg(long = "custom-domain", value_name = "DOMAIN")]
    pub custom_domains: Vec<String>,

    /// Per-repository time limit in seconds [default: from the configuration]
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub github_api_url: String,

    /// Path to configuration file (default is `risk.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,

    /// Output the analyses to a JSON file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub json: Option<Utf8PathBuf>,

    /// Output the analyses to the console. If omitted, console output is shown only when no JSON report is written.
    #[arg(long, help_heading = "Report Output")]
    pub console: bool,

    /// Exit with status code 1 if any repository is assessed as high risk
    #[arg(long)]
    pub error_if_high_risk: bool,
}

pub async fn analyze_repositories<H: Host>(host: &mut H, args: &AnalyzeArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    let days = args.days.unwrap_or(config.analysis_days);
    validate_window_days(days)?;

    if args.github_token.is_none() {
        log::warn!(target: LOG_TARGET, "No GitHub token provided, API calls will be heavily rate-limited");
    }

    let source = GitHubSource::new(
        args.github_token.as_deref(),
        &args.github_api_url,
        config.max_concurrent_requests,
        REQUEST_TIMEOUT,
    )?;

    let classifier = IdentityClassifier::new(&config.identity, &args.custom_domains);
    let analyzer = Analyzer::new(source, LexiconScorer::new(), classifier, settings_for(&config, args.timeout));

    let request = AnalysisRequest::new(args.repositories.clone(), days).with_sentiment(args.sentiment);
    let reports = analyzer.analyze_batch(&request, Utc::now()).await?;

    write_reports(host, args, &reports)?;

    if args.error_if_high_risk && reports.iter().any(|report| report.risk_level == RiskLevel::High) {
        let _ = writeln!(host.error(), "One or more repositories were assessed as high risk");
        host.exit(1);
    }

    Ok(())
}

fn settings_for(config: &Config, timeout_override: Option<u64>) -> AnalyzerSettings {
    let timeout = Duration::from_secs(timeout_override.unwrap_or(config.timeout_secs));
    let sentiment_timeout = Duration::from_secs(timeout_override.unwrap_or(config.sentiment_timeout_secs));

    AnalyzerSettings {
        sentiment_sample_size: config.sentiment_sample_size,
        max_concurrent_sentiment_lookups: config.max_concurrent_requests,
        timeout,
        sentiment_timeout,
    }
}

fn write_reports<H: Host>(host: &mut H, args: &AnalyzeArgs, reports: &[RiskReport]) -> Result<()> {
    if args.console || args.json.is_none() {
        let mut console_output = String::new();
        generate_console(reports, args.color.use_colors(), &mut console_output)?;
        let _ = write!(host.output(), "{console_output}");
    }

    if let Some(filename) = &args.json {
        let mut json_output = String::new();
        generate_json(reports, &mut json_output)?;
        fs::write(filename, json_output).into_app_err_with(|| format!("writing JSON report to '{filename}'"))?;
        log::info!(target: LOG_TARGET, "Wrote JSON report to '{filename}'");
    }

    Ok(())
}
