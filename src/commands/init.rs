use super::Host;
use super::config::{CONFIG_FILE_NAME, Config};
use crate::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::bail;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output configuration file path (default is `risk.toml` in the current directory)
    #[arg(value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    /// Overwrite the file if it already exists
    #[arg(long)]
    pub force: bool,
}

pub fn init_config<H: Host>(host: &mut H, args: &InitArgs) -> Result<()> {
    let output = args.output.clone().unwrap_or_else(|| Utf8PathBuf::from(CONFIG_FILE_NAME));

    if output.exists() && !args.force {
        bail!("configuration file '{output}' already exists, use --force to overwrite it");
    }

    Config::save_default(&output)?;
    let _ = writeln!(host.output(), "Generated default configuration file: {output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;

    #[test]
    fn test_init_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("risk.toml")).unwrap();
        let mut host = TestHost::new();

        init_config(&mut host, &InitArgs { output: Some(path.clone()), force: false }).unwrap();

        assert!(host.output_text().contains("Generated default configuration file"));
        let config = Config::load(path.parent().unwrap(), Some(&path)).unwrap();
        assert_eq!(config.analysis_days, 365);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("risk.toml")).unwrap();
        std::fs::write(&path, "# mine").unwrap();
        let mut host = TestHost::new();

        assert!(init_config(&mut host, &InitArgs { output: Some(path.clone()), force: false }).is_err());
        init_config(&mut host, &InitArgs { output: Some(path.clone()), force: true }).unwrap();
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "# mine");
    }
}
