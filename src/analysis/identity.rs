//! Contributor identity heuristics: bot detection and email domain categorisation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::Display;

/// Broad affiliation inferred from a contributor's email domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmailCategory {
    /// Domain of a well-known company
    Company,

    /// Free-mail provider, or any domain that matched nothing else
    Personal,

    /// University or research institution
    Academic,

    /// Domain supplied by the caller as an organisation of interest
    Custom,

    /// The record carried an email, but it was empty or malformed
    NoEmail,

    /// The record came from a source that never carries an email (issues, pull requests, reviews)
    NotApplicable,
}

impl EmailCategory {
    /// Whether the contributor appears to be paid by a company to work on the project.
    #[must_use]
    pub const fn is_company(self) -> bool {
        matches!(self, Self::Company)
    }
}

/// Lists that drive identity classification.
///
/// All entries are compared case-insensitively.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Organisation domains that should be reported as `custom`
    #[serde(default)]
    pub custom_domains: Vec<String>,

    /// Domains of companies known to employ open source maintainers
    #[serde(default)]
    pub company_domains: Vec<String>,

    /// Free-mail providers
    #[serde(default)]
    pub personal_domains: Vec<String>,

    /// Domain suffixes used by academic institutions, such as `.edu` or `.ac.uk`
    #[serde(default)]
    pub academic_suffixes: Vec<String>,

    /// Substrings that mark a login or display name as automation
    #[serde(default)]
    pub bot_keywords: Vec<String>,

    /// Substrings that mark an email address as automation
    #[serde(default)]
    pub bot_email_keywords: Vec<String>,
}

/// Classifies contributors by email domain and filters out automation accounts.
#[derive(Debug, Clone)]
pub struct IdentityClassifier {
    custom_domains: HashSet<String>,
    company_domains: HashSet<String>,
    personal_domains: HashSet<String>,
    academic_suffixes: Vec<String>,
    bot_keywords: Vec<String>,
    bot_email_keywords: Vec<String>,
}

const LOG_TARGET: &str = "  identity";
const BOT_SUFFIX: &str = "[bot]";

impl IdentityClassifier {
    /// Build a classifier from configured lists plus any extra custom domains given for this run.
    pub fn new<I, S>(config: &IdentityConfig, extra_custom_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut custom_domains = lowercase_set(&config.custom_domains);
        custom_domains.extend(
            extra_custom_domains
                .into_iter()
                .map(|d| d.as_ref().trim().to_lowercase())
                .filter(|d| !d.is_empty()),
        );

        Self {
            custom_domains,
            company_domains: lowercase_set(&config.company_domains),
            personal_domains: lowercase_set(&config.personal_domains),
            academic_suffixes: lowercase_vec(&config.academic_suffixes),
            bot_keywords: lowercase_vec(&config.bot_keywords),
            bot_email_keywords: lowercase_vec(&config.bot_email_keywords),
        }
    }

    /// Categorise an email address by its domain.
    ///
    /// Lookup order is custom, company, academic suffix, personal, then personal as the fallback.
    /// Input without an `@` yields [`EmailCategory::NoEmail`].
    #[must_use]
    pub fn classify_email(&self, email: &str) -> EmailCategory {
        let Some((_, domain)) = email.rsplit_once('@') else {
            return EmailCategory::NoEmail;
        };

        let domain = domain.trim().to_lowercase();

        if self.custom_domains.contains(&domain) {
            EmailCategory::Custom
        } else if self.company_domains.contains(&domain) {
            EmailCategory::Company
        } else if self.academic_suffixes.iter().any(|suffix| domain.ends_with(suffix.as_str())) {
            EmailCategory::Academic
        } else if self.personal_domains.contains(&domain) {
            EmailCategory::Personal
        } else {
            log::trace!(target: LOG_TARGET, "Unrecognized email domain '{domain}', treating as personal");
            EmailCategory::Personal
        }
    }

    /// Heuristically decide whether an identity belongs to automation.
    ///
    /// An empty login is never considered a bot.
    #[must_use]
    pub fn is_bot(&self, login: &str, name: &str, email: &str) -> bool {
        if login.is_empty() {
            return false;
        }

        let login = login.to_lowercase();
        let name = name.to_lowercase();
        let email = email.to_lowercase();

        if login.ends_with(BOT_SUFFIX) || name.ends_with(BOT_SUFFIX) {
            return true;
        }

        if self
            .bot_keywords
            .iter()
            .any(|keyword| login.contains(keyword.as_str()) || name.contains(keyword.as_str()))
        {
            return true;
        }

        !email.is_empty() && self.bot_email_keywords.iter().any(|keyword| email.contains(keyword.as_str()))
    }

    /// Shorthand for records that only carry a login.
    #[must_use]
    pub fn is_bot_login(&self, login: &str) -> bool {
        self.is_bot(login, "", "")
    }
}

fn lowercase_set(values: &[String]) -> HashSet<String> {
    values.iter().map(|v| v.trim().to_lowercase()).filter(|v| !v.is_empty()).collect()
}

fn lowercase_vec(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.trim().to_lowercase()).filter(|v| !v.is_empty()).collect()
}
