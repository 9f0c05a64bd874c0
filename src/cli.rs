//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, validate, health), and their associated argument
//! structs. Every `run` flag has an environment variable equivalent for
//! container deployments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_DIRECTORY_TIMEOUT_MS;

#[derive(Parser)]
#[command(
    name = "signpost",
    version,
    about = "Redirects service hostnames to their registered backends",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        signpost run                                   Redirect *.service.consul via the local agent\n  \
        signpost run --hostname-suffix lab.example     Append a cluster domain to node names\n  \
        signpost validate routes.json                  Check a custom routes file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the redirect server
    Run(Box<RunArgs>),

    /// Validate a custom routes file without starting
    Validate(ValidateArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        signpost run -p 8080 --pretty                                  Local dev mode\n  \
        signpost run --custom-routes '{\"h\": \"http://home:1234\"}'      Inline custom route\n  \
        signpost run --routes-file routes.yaml                         Routes from a file\n  \
        signpost run --directory dns --dns-domain consul               Resolve via DNS SRV")]
pub struct RunArgs {
    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 80)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // -- Routing --
    /// Hostname suffix for nodes in the cluster
    #[arg(long, env = "HOSTNAME_SUFFIX", help_heading = "Routing")]
    pub hostname_suffix: Option<String>,

    /// Hostname to link to for the Nomad UI
    #[arg(long, env = "NOMAD_UI_HOSTNAME", help_heading = "Routing")]
    pub nomad_ui_hostname: Option<String>,

    /// Hostname to link to for the Consul UI
    #[arg(long, env = "CONSUL_UI_HOSTNAME", help_heading = "Routing")]
    pub consul_ui_hostname: Option<String>,

    /// Redirect hosts carrying the hostname suffix to the Nomad UI
    #[arg(long, env = "REDIRECT_TO_NOMAD_UI", help_heading = "Routing")]
    pub redirect_to_nomad_ui: bool,

    /// JSON object mapping hostnames (optionally with a path) to target URLs
    #[arg(
        long,
        env = "CUSTOM_ROUTES",
        default_value = "{}",
        help_heading = "Routing"
    )]
    pub custom_routes: String,

    /// Custom routes file (.json, .yaml, .toml); overrides inline entries
    #[arg(long, env = "ROUTES_FILE", help_heading = "Routing")]
    pub routes_file: Option<PathBuf>,

    // -- Service Directory --
    /// Directory backend to resolve services with
    #[arg(
        long,
        env = "DIRECTORY",
        default_value = "consul",
        help_heading = "Service Directory"
    )]
    pub directory: DirectoryKind,

    /// Consul HTTP API address
    #[arg(
        long,
        env = "CONSUL_HTTP_ADDR",
        default_value = "http://127.0.0.1:8500",
        help_heading = "Service Directory"
    )]
    pub consul_addr: String,

    /// Consul ACL token
    #[arg(long, env = "CONSUL_HTTP_TOKEN", help_heading = "Service Directory")]
    pub consul_token: Option<String>,

    /// Consul datacenter to query (defaults to the agent's)
    #[arg(long, env = "CONSUL_DATACENTER", help_heading = "Service Directory")]
    pub datacenter: Option<String>,

    /// DNS domain served by the directory
    #[arg(
        long,
        env = "DNS_DOMAIN",
        default_value = "consul",
        help_heading = "Service Directory"
    )]
    pub dns_domain: String,

    /// Deadline for a single directory query in milliseconds
    #[arg(
        long = "directory-timeout-ms",
        env = "DIRECTORY_TIMEOUT_MS",
        default_value_t = DEFAULT_DIRECTORY_TIMEOUT_MS,
        help_heading = "Service Directory"
    )]
    pub directory_timeout: u64,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Routes file to validate
    #[arg(default_value = "routes.json")]
    pub routes: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:80")]
    pub url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DirectoryKind {
    /// Consul catalog HTTP API
    Consul,
    /// DNS SRV records plus reverse DNS
    Dns,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
