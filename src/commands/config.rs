use crate::Result;
use crate::analysis::{IdentityConfig, MAX_WINDOW_DAYS};
use camino::{Utf8Path, Utf8PathBuf};
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io;
use std::sync::LazyLock;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "risk.toml";

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Look-back window in days
    #[serde(default = "default_analysis_days")]
    pub analysis_days: u32,

    /// Maximum number of API requests in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Maximum number of messages scored per contributor
    #[serde(default = "default_sentiment_sample_size")]
    pub sentiment_sample_size: usize,

    /// Per-repository time limit without sentiment analysis
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Per-repository time limit with sentiment analysis
    #[serde(default = "default_sentiment_timeout_secs")]
    pub sentiment_timeout_secs: u64,

    /// Identity lists; any list left out keeps its built-in value
    #[serde(default = "default_identity", deserialize_with = "deserialize_identity")]
    pub identity: IdentityConfig,
}

/// The `[identity]` table of the embedded default configuration
static BUILTIN_IDENTITY: LazyLock<IdentityConfig> = LazyLock::new(|| {
    #[derive(Deserialize)]
    struct Embedded {
        identity: IdentityConfig,
    }

    toml::from_str::<Embedded>(DEFAULT_CONFIG_TOML)
        .expect("default_config.toml should hold a valid [identity] table")
        .identity
});

/// An `[identity]` table as written by the user, where every list is optional.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IdentityOverrides {
    custom_domains: Option<Vec<String>>,
    company_domains: Option<Vec<String>>,
    personal_domains: Option<Vec<String>>,
    academic_suffixes: Option<Vec<String>>,
    bot_keywords: Option<Vec<String>>,
    bot_email_keywords: Option<Vec<String>>,
}

impl IdentityOverrides {
    fn apply_to(self, base: IdentityConfig) -> IdentityConfig {
        IdentityConfig {
            custom_domains: self.custom_domains.unwrap_or(base.custom_domains),
            company_domains: self.company_domains.unwrap_or(base.company_domains),
            personal_domains: self.personal_domains.unwrap_or(base.personal_domains),
            academic_suffixes: self.academic_suffixes.unwrap_or(base.academic_suffixes),
            bot_keywords: self.bot_keywords.unwrap_or(base.bot_keywords),
            bot_email_keywords: self.bot_email_keywords.unwrap_or(base.bot_email_keywords),
        }
    }
}

fn default_identity() -> IdentityConfig {
    BUILTIN_IDENTITY.clone()
}

fn deserialize_identity<'de, D>(deserializer: D) -> core::result::Result<IdentityConfig, D::Error>
where
    D: Deserializer<'de>,
{
    IdentityOverrides::deserialize(deserializer).map(|overrides| overrides.apply_to(default_identity()))
}

const fn default_analysis_days() -> u32 {
    365
}

const fn default_max_concurrent_requests() -> usize {
    8
}

const fn default_sentiment_sample_size() -> usize {
    30
}

const fn default_timeout_secs() -> u64 {
    45
}

const fn default_sentiment_timeout_secs() -> u64 {
    120
}

impl Config {
    /// Load configuration from `config_path`, or from `risk.toml` under `base_dir`, or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds out-of-range values
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.analysis_days == 0 || self.analysis_days > MAX_WINDOW_DAYS {
            return Err(app_err!(
                "analysis_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                self.analysis_days
            ));
        }

        if self.max_concurrent_requests == 0 {
            return Err(app_err!("max_concurrent_requests must be at least 1"));
        }

        if self.sentiment_sample_size == 0 {
            return Err(app_err!("sentiment_sample_size must be at least 1"));
        }

        if self.timeout_secs == 0 || self.sentiment_timeout_secs == 0 {
            return Err(app_err!(
                "timeouts must be at least one second, got timeout_secs = {} and sentiment_timeout_secs = {}",
                self.timeout_secs,
                self.sentiment_timeout_secs
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
