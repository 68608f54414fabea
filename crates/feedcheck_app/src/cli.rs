use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use feedcheck_core::ExitPolicy;
use feedcheck_engine::CheckSettings;
use feedcheck_logging::{LevelFilter, LogDestination};

#[derive(Debug, Parser)]
#[command(
    name = "feedcheck",
    version,
    about = "Check the health of a list of syndication feed URLs"
)]
pub struct Cli {
    /// Delimited file whose first column holds feed URLs.
    #[arg(default_value = "feeds.csv")]
    pub input: PathBuf,

    /// Treat the first row as data instead of a header.
    #[arg(long)]
    pub no_header: bool,

    /// RON configuration file; flags below override its values.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of feeds checked at once.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Attempts per feed, first one included.
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Per-attempt timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Exit successfully even when some feeds are invalid.
    #[arg(long, env = "IGNORE_INVALID_FEEDS", value_parser = BoolishValueParser::new())]
    pub ignore_invalid: bool,

    /// Exit with failure when any feed had a transient error.
    #[arg(long, env = "FAIL_ON_TRANSIENT", value_parser = BoolishValueParser::new())]
    pub fail_on_transient: bool,

    /// Also write logs to this file.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn apply_overrides(&self, mut settings: CheckSettings) -> CheckSettings {
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(max_attempts) = self.max_attempts {
            settings.retry.max_attempts = max_attempts;
        }
        if let Some(timeout) = self.timeout {
            settings.fetch.request_timeout = Duration::from_secs(timeout);
        }
        settings
    }

    pub fn exit_policy(&self) -> ExitPolicy {
        ExitPolicy {
            ignore_invalid: self.ignore_invalid,
            fail_on_transient: self.fail_on_transient,
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
