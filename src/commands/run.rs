//! Command dispatch logic for maintainer-risk

use super::{AnalyzeArgs, InitArgs, analyze_repositories, init_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "maintainer-risk", version, author, long_about = None)]
#[command(about = "Assess the maintainer sustainability risk of GitHub repositories")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: RiskSubcommand,
}

#[derive(Subcommand, Debug)]
enum RiskSubcommand {
    /// Analyze repositories and report their sustainability risk
    Analyze(Box<AnalyzeArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        RiskSubcommand::Analyze(analyze_args) => analyze_repositories(host, analyze_args).await,
        RiskSubcommand::Init(init_args) => init_config(host, init_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dispatches_init() {
        let cli = Cli::try_parse_from(["maintainer-risk", "init", "out.toml"]).unwrap();
        let RiskSubcommand::Init(args) = cli.command else {
            panic!("expected the init subcommand");
        };
        assert_eq!(args.output, Some(camino::Utf8PathBuf::from("out.toml")));
    }
}
