use crate::Result;
use crate::analysis::{AnalysisOutcome, RiskFactors, RiskLevel, RiskReport};
use core::fmt::Write;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

/// How many of the most active contributors are listed per repository
const TOP_CONTRIBUTORS_SHOWN: usize = 5;

const BULLET_INDENT: usize = 6;

pub fn generate<W: Write>(reports: &[RiskReport], use_colors: bool, writer: &mut W) -> Result<()> {
    let term_width = get_terminal_width();

    for (index, report) in reports.iter().enumerate() {
        if index > 0 {
            writeln!(writer)?;
            writeln!(writer, "═══════════════════════════════════════")?;
            writeln!(writer)?;
        }

        let level_str = report.risk_level.to_string().to_uppercase();
        let colored_level = if use_colors {
            match report.risk_level {
                RiskLevel::Low => level_str.green().bold().to_string(),
                RiskLevel::Medium => level_str.yellow().bold().to_string(),
                RiskLevel::High => level_str.red().bold().to_string(),
            }
        } else {
            level_str
        };

        let name = if use_colors {
            report.repository.bold().to_string()
        } else {
            report.repository.clone()
        };

        writeln!(
            writer,
            "{name} is at {colored_level} risk (score {:.3})",
            report.overall_risk_score
        )?;

        match &report.outcome {
            AnalysisOutcome::Complete(factors) => write_factors(writer, factors)?,
            AnalysisOutcome::Failed { error } => writeln!(writer, "  Analysis failed: {error}")?,
            AnalysisOutcome::TimedOut { after } => writeln!(writer, "  Analysis timed out after {}s", after.as_secs())?,
        }

        writeln!(writer)?;
        writeln!(writer, "  Recommendations")?;
        for recommendation in &report.recommendations {
            let lines = wrap_text(recommendation, term_width, BULLET_INDENT);
            if let Some(first_line) = lines.first() {
                writeln!(writer, "    • {first_line}")?;
                for line in lines.iter().skip(1) {
                    writeln!(writer, "{line}")?;
                }
            }
        }
    }

    Ok(())
}

fn write_factors<W: Write>(writer: &mut W, factors: &RiskFactors) -> Result<()> {
    let concentration = &factors.concentration;
    let statistics = &factors.statistics;

    writeln!(
        writer,
        "  {} active contributors, {} activity events, {} bot records filtered",
        factors.total_active_contributors(),
        concentration.total_activity,
        factors.bots_filtered
    )?;
    writeln!(
        writer,
        "  {} commits ({:.2}/day) and {} issues or pull requests in the analysis window",
        factors.recent_commits_analyzed, statistics.commit_frequency_per_day, factors.recent_issues_analyzed
    )?;

    if let Some(days) = statistics.avg_pr_close_time_days {
        writeln!(writer, "  Pull requests close in {days:.1} days on average")?;
    }

    if let Some(days) = statistics.avg_issue_close_time_days {
        writeln!(writer, "  Issues close in {days:.1} days on average")?;
    }

    if concentration.ranked.is_empty() {
        return Ok(());
    }

    writeln!(writer)?;
    writeln!(writer, "  Top contributors")?;

    let shown = &concentration.ranked[..concentration.ranked.len().min(TOP_CONTRIBUTORS_SHOWN)];
    let max_login_len = shown.iter().map(|entry| entry.login.len()).max().unwrap_or(0);

    for entry in shown {
        let mut line = format!(
            "    {:<width$}  {:>5.1}%  {:<16} {}",
            entry.login,
            concentration.share_of(entry),
            entry.email_category.to_string(),
            entry.trend,
            width = max_login_len
        );

        if let Some(sentiment) = &entry.sentiment {
            write!(line, "  sentiment: {}", sentiment.label)?;
        }

        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

/// Get the terminal width, defaulting to 80 if not detectable
fn get_terminal_width() -> usize {
    terminal_size().map_or(80, |(Width(w), _)| usize::from(w))
}

/// Word-wrap text to fit within a given width, with indentation for continuation lines
fn wrap_text(text: &str, width: usize, indent: usize) -> Vec<String> {
    if width <= indent {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        let used = indent + current_line.len();
        let separator_len = usize::from(!current_line.is_empty());

        if !current_line.is_empty() && used + separator_len + word.len() > width {
            lines.push(core::mem::take(&mut current_line));
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    // continuation lines line up under the first
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| if i == 0 { line } else { format!("{:indent$}{line}", "") })
        .collect()
}
