//! Command line and config file handling.
//!
//! Values are resolved once, in this order: command line (or its environment
//! variable), then the optional TOML file given with `--config`, then the
//! built-in defaults. The result is an immutable [`Settings`] that is handed
//! to the pipeline explicitly.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;

use crate::error::{DocgenError, Result};

pub const DEFAULT_PROMPT_FILE: &str = "topics_files_request.txt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Parser)]
#[command(name = "docgen")]
#[command(about = "Generate Sphinx documentation for a repository using a hosted text-generation endpoint")]
pub struct Cli {
    /// Directory the generated .rst pages, conf.py and index.rst are written to
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// Repository root, where .readthedocs.yaml is written
    #[arg(long = "rootdirectory")]
    pub root_directory: Option<PathBuf>,

    /// Bearer key for the endpoint
    #[arg(long, env = "DOCGEN_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Endpoint URL
    #[arg(long, env = "DOCGEN_URL")]
    pub url: Option<String>,

    /// Repository name substituted into every prompt
    #[arg(long)]
    pub repository_name: Option<String>,

    /// Topics prompt template (default: topics_files_request.txt)
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,

    /// Per-request timeout in seconds (default: 300)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Skip TLS certificate verification (self-signed endpoints only)
    #[arg(long, env = "DOCGEN_INSECURE")]
    pub insecure: bool,

    /// TOML file providing defaults for any option except the key
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Contents of the `--config` file. The key is not accepted here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub directory: Option<PathBuf>,
    #[serde(alias = "rootdirectory")]
    pub root_directory: Option<PathBuf>,
    pub url: Option<String>,
    pub repository_name: Option<String>,
    pub prompt_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub insecure: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from: {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            DocgenError::config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| DocgenError::config(format!("invalid config {}: {}", path.display(), e)))
    }
}

#[derive(Debug)]
pub struct Settings {
    pub directory: PathBuf,
    pub root_directory: PathBuf,
    pub url: String,
    pub repository_name: String,
    pub key: SecretString,
    pub prompt_file: PathBuf,
    pub timeout: Duration,
    pub insecure: bool,
}

impl Settings {
    pub fn resolve(cli: Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: Cli, file: FileConfig) -> Result<Self> {
        let key = cli
            .key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| DocgenError::config("--key (or DOCGEN_KEY) is required"))?;

        let directory = required(cli.directory.or(file.directory), "--directory")?;
        let root_directory = required(cli.root_directory.or(file.root_directory), "--rootdirectory")?;
        let url = required(cli.url.or(file.url), "--url")?;
        let repository_name = required(
            cli.repository_name.or(file.repository_name),
            "--repository-name",
        )?;

        let timeout_secs = cli
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(DocgenError::config("timeout must be at least one second"));
        }

        Ok(Self {
            directory,
            root_directory,
            url,
            repository_name,
            key: SecretString::from(key),
            prompt_file: cli
                .prompt_file
                .or(file.prompt_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPT_FILE)),
            timeout: Duration::from_secs(timeout_secs),
            insecure: cli.insecure || file.insecure.unwrap_or(false),
        })
    }
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T> {
    value.ok_or_else(|| DocgenError::config(format!("{} is required", flag)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("docgen").chain(args.iter().copied())).unwrap()
    }

    const FULL: &[&str] = &[
        "--directory=/out",
        "--rootdirectory=/root",
        "--key=secret",
        "--url=https://example.test/score",
        "--repository-name=demo",
    ];

    #[test]
    fn test_full_command_line_resolves() {
        let settings = Settings::merge(parse(FULL), FileConfig::default()).unwrap();

        assert_eq!(settings.directory, PathBuf::from("/out"));
        assert_eq!(settings.root_directory, PathBuf::from("/root"));
        assert_eq!(settings.key.expose_secret(), "secret");
        assert_eq!(settings.repository_name, "demo");
        assert_eq!(settings.prompt_file, PathBuf::from(DEFAULT_PROMPT_FILE));
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!settings.insecure);
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let args: Vec<&str> = FULL
            .iter()
            .copied()
            .filter(|a| !a.starts_with("--key"))
            .collect();
        let mut cli = parse(&args);
        // DOCGEN_KEY may be set in the developer's environment
        cli.key = None;

        let err = Settings::merge(cli, FileConfig::default()).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("--key"));
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let mut cli = parse(FULL);
        cli.key = Some(String::new());
        assert!(Settings::merge(cli, FileConfig::default()).is_err());
    }

    #[test]
    fn test_config_file_fills_gaps_and_cli_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docgen.toml");
        fs::write(
            &path,
            r#"
directory = "/from-file"
rootdirectory = "/repo"
url = "https://file.test"
repository_name = "file-repo"
timeout_secs = 60
insecure = true
"#,
        )
        .unwrap();

        let mut cli = parse(&["--key=k", "--directory=/from-cli"]);
        cli.url = None;
        let settings = Settings::merge(cli, FileConfig::load(&path).unwrap()).unwrap();

        assert_eq!(settings.directory, PathBuf::from("/from-cli"));
        assert_eq!(settings.root_directory, PathBuf::from("/repo"));
        assert_eq!(settings.url, "https://file.test");
        assert_eq!(settings.repository_name, "file-repo");
        assert_eq!(settings.timeout, Duration::from_secs(60));
        assert!(settings.insecure);
    }

    #[test]
    fn test_config_file_rejects_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docgen.toml");
        fs::write(&path, "key = \"leaked\"\n").unwrap();

        assert!(FileConfig::load(&path).unwrap_err().is_fatal());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut args = FULL.to_vec();
        args.push("--timeout-secs=0");
        assert!(Settings::merge(parse(&args), FileConfig::default()).is_err());
    }
}
