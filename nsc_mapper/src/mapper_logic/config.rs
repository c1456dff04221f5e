use anyhow::{bail, Context, Result};
use clap::Parser;
use lib_pubchem::tabular::DEFAULT_ID_COLUMN;
use lib_pubchem::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_SECS, DEFAULT_MIN_DELAY_SECS, DEFAULT_TIMEOUT, DEFAULT_WORKERS,
    PUBCHEM_BASE_URL,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "nsc_mapper.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Looks up NSC identifiers in PubChem and writes SID, version, CID and synonyms.", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, short = 'i', env = "NSC_INPUT", help = "Input CSV with a column of NSC identifiers.")]
    pub input: Option<PathBuf>,

    #[clap(long, short = 'o', env = "NSC_OUTPUT", help = "Output CSV path.")]
    pub output: Option<PathBuf>,

    #[clap(long, env = "NSC_COLUMN", help = "Name of the identifier column in the input.")]
    pub column: Option<String>,

    #[clap(long, short = 'w', env = "NSC_WORKERS", help = "Number of identifiers fetched concurrently.")]
    pub workers: Option<usize>,

    #[clap(long, env = "NSC_MAX_ATTEMPTS", help = "Attempts per substance lookup before giving up.")]
    pub max_attempts: Option<u32>,

    #[clap(long, env = "NSC_MIN_DELAY_SECS", help = "Lower bound of the random wait between attempts, in seconds.")]
    pub min_delay_secs: Option<f64>,

    #[clap(long, env = "NSC_MAX_DELAY_SECS", help = "Upper bound of the random wait between attempts, in seconds.")]
    pub max_delay_secs: Option<f64>,

    #[clap(long, env = "NSC_TIMEOUT_SECS", help = "Per-request HTTP timeout, in seconds.")]
    pub timeout_secs: Option<u64>,

    #[clap(long, env = "NSC_BASE_URL", help = "PubChem PUG REST base URL.")]
    pub base_url: Option<String>,

    #[clap(long, env = "NSC_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "NSC_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "NSC_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,
}

/// Fully merged settings with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub column: String,
    pub workers: usize,
    pub max_attempts: u32,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub timeout_secs: u64,
    pub base_url: String,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            input: other.input.or(self.input),
            output: other.output.or(self.output),
            column: other.column.or(self.column),
            workers: other.workers.or(self.workers),
            max_attempts: other.max_attempts.or(self.max_attempts),
            min_delay_secs: other.min_delay_secs.or(self.min_delay_secs),
            max_delay_secs: other.max_delay_secs.or(self.max_delay_secs),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            base_url: other.base_url.or(self.base_url),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }

    fn defaults() -> Config {
        Config {
            output: Some(PathBuf::from("output.csv")),
            column: Some(DEFAULT_ID_COLUMN.to_string()),
            workers: Some(DEFAULT_WORKERS),
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            min_delay_secs: Some(DEFAULT_MIN_DELAY_SECS),
            max_delay_secs: Some(DEFAULT_MAX_DELAY_SECS),
            timeout_secs: Some(DEFAULT_TIMEOUT.as_secs()),
            base_url: Some(PUBCHEM_BASE_URL.to_string()),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            ..Default::default()
        }
    }

    /// Checks the merged values and fills in the required ones.
    fn into_settings(self) -> Result<Settings> {
        let defaults = Config::defaults();
        let merged = defaults.merge(self);

        let Some(input) = merged.input else {
            bail!("No input file given (use --input, NSC_INPUT or \"input\" in the config file)");
        };
        let min_delay_secs = merged.min_delay_secs.unwrap_or(DEFAULT_MIN_DELAY_SECS);
        let max_delay_secs = merged.max_delay_secs.unwrap_or(DEFAULT_MAX_DELAY_SECS);
        if min_delay_secs > max_delay_secs {
            bail!(
                "minDelaySecs ({}) must not exceed maxDelaySecs ({})",
                min_delay_secs,
                max_delay_secs
            );
        }
        let max_attempts = merged.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            bail!("maxAttempts must be at least 1");
        }
        let timeout_secs = merged.timeout_secs.unwrap_or(DEFAULT_TIMEOUT.as_secs());
        if timeout_secs == 0 {
            bail!("timeoutSecs must be at least 1");
        }

        Ok(Settings {
            input,
            output: merged.output.unwrap_or_else(|| PathBuf::from("output.csv")),
            column: merged.column.unwrap_or_else(|| DEFAULT_ID_COLUMN.to_string()),
            workers: merged.workers.unwrap_or(DEFAULT_WORKERS),
            max_attempts,
            min_delay_secs,
            max_delay_secs,
            timeout_secs,
            base_url: merged.base_url.unwrap_or_else(|| PUBCHEM_BASE_URL.to_string()),
            log_dir: merged.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
            log_level: merged.log_level.unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn read_config_file(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str::<Config>(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Layers defaults, the JSON config file and CLI/env values, later wins.
///
/// An explicitly named config file must exist and parse; the default
/// `nsc_mapper.conf` is used only if present.
pub fn resolve(cli_args: Config) -> Result<Settings> {
    let file_config = match &cli_args.config_path {
        Some(path) => read_config_file(path)?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                read_config_file(&default_path)?
            } else {
                Config::default()
            }
        }
    };

    // CLI arguments (which include env vars) override the file config.
    file_config.merge(cli_args).into_settings()
}

pub fn load_config() -> Result<Settings> {
    resolve(Config::parse())
}
