//! Command-line interface for maintainer-risk
//!
//! Two subcommands are provided:
//!
//! - **analyze**: fetch activity for one or more repositories, run the risk analysis, and
//!   write console and/or JSON reports
//! - **init**: write the default configuration file
//!
//! The [`run`] function parses arguments with clap and routes to the handler. Configuration is a
//! TOML file (`risk.toml` by default) holding the analysis defaults and the identity lists used
//! to classify contributors. Command-line flags take precedence over the file.

mod analyze;
mod common;
mod config;
mod host;
mod init;
mod run;

pub use analyze::{AnalyzeArgs, analyze_repositories};
pub use common::{ColorMode, LogLevel, init_logging};
pub use config::{CONFIG_FILE_NAME, Config, DEFAULT_CONFIG_TOML};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
