use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Vanish binary.
#[derive(Debug, Parser)]
#[command(
    name = "vanish",
    version,
    about = "Send BAN requests to a Varnish-style cache server"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "VANISH_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Queue the given URLs and patterns, then flush them to the cache server once.
    Ban(Box<BanArgs>),
    /// Print the cache-server base URL ban requests would be sent to.
    Target(TargetArgs),
    /// Print the ban path each URL normalizes to.
    Normalize(NormalizeArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CacheServerOverrides {
    /// Override the site URL the cache-server target is derived from.
    #[arg(long = "site-url", value_name = "URL", value_hint = ValueHint::Url)]
    pub site_url: Option<String>,

    /// Override the port the cache server listens on.
    #[arg(long = "port", value_name = "PORT")]
    pub port_override: Option<u16>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DispatchOverrides {
    /// Override the number of ban requests in flight at once.
    #[arg(long = "dispatch-concurrency", value_name = "COUNT")]
    pub concurrency: Option<u64>,

    /// Override the per-request timeout.
    #[arg(long = "dispatch-request-timeout-ms", value_name = "MILLISECONDS")]
    pub request_timeout_ms: Option<u64>,

    /// Override the number of retries for a failed ban request.
    #[arg(long = "dispatch-max-retries", value_name = "COUNT")]
    pub max_retries: Option<u32>,

    /// Override the base delay between retries.
    #[arg(long = "dispatch-retry-backoff-ms", value_name = "MILLISECONDS")]
    pub retry_backoff_ms: Option<u64>,

    /// Toggle collapsing duplicate bans at flush time.
    #[arg(
        long = "dispatch-dedup",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub dedup: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct BanArgs {
    #[command(flatten)]
    pub cache_server: CacheServerOverrides,

    #[command(flatten)]
    pub dispatch: DispatchOverrides,

    /// URL or path to ban exactly; may be repeated.
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Regex pattern to ban; may be repeated.
    #[arg(long = "regex", value_name = "PATTERN")]
    pub regexes: Vec<String>,

    /// Print the flush result as JSON instead of a summary line.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct TargetArgs {
    #[command(flatten)]
    pub cache_server: CacheServerOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct NormalizeArgs {
    /// URLs to normalize.
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,
}
