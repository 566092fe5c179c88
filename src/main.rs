//! A tool to assess the maintainer sustainability risk of GitHub repositories.
//!
//! # Overview
//!
//! `maintainer-risk` looks at who actually keeps a repository alive. It pulls recent commits,
//! issues, pull requests and reviews from GitHub, attributes the activity to contributors,
//! filters out bots, and measures how concentrated the work is. A repository where one person
//! does most of the work gets a high risk score, along with recommendations on what to watch.
//!
//! # Quick Start
//!
//! ```bash
//! export GITHUB_TOKEN=ghp_...
//! maintainer-risk analyze tokio-rs/tokio
//! ```
//!
//! Without a token the GitHub API allows only a handful of requests per hour, which is rarely
//! enough to analyze a single active repository.
//!
//! # Basic Usage
//!
//! **Analyze several repositories at once:**
//! ```bash
//! maintainer-risk analyze serde-rs/serde github.com/tokio-rs/axum https://github.com/rust-lang/log
//! ```
//!
//! **Change the look-back window (1 to 365 days):**
//! ```bash
//! maintainer-risk analyze tokio-rs/tokio --days 90
//! ```
//!
//! **Score the tone of recent contributor messages:**
//! ```bash
//! maintainer-risk analyze tokio-rs/tokio --sentiment
//! ```
//!
//! **Treat your own organization's email domain as its own category:**
//! ```bash
//! maintainer-risk analyze acme/widgets --custom-domain acme.io
//! ```
//!
//! # Output Formats
//!
//! The console report is shown by default. Use `--json` to write a machine-readable report
//! instead, and add `--console` to get both:
//!
//! ```bash
//! maintainer-risk analyze tokio-rs/tokio --json report.json --console
//! ```
//!
//! # CI Integration
//!
//! ```bash
//! maintainer-risk analyze acme/widgets --error-if-high-risk
//! ```
//!
//! The process exits with status 1 when any repository is assessed as high risk.
//!
//! # Configuration
//!
//! Generate the default configuration file and edit it to taste:
//!
//! ```bash
//! maintainer-risk init
//! ```
//!
//! This writes `risk.toml`, which holds the default window, concurrency limits, timeouts, and
//! the domain and keyword lists used to classify contributors. It is picked up automatically from
//! the current directory, or pass `--config <PATH>`.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use maintainer_risk::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};

/// Default host that writes to the real standard streams.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args()).await
}
