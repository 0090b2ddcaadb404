//! Session/auth related CLI arguments.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

use crate::auth::state::DEFAULT_SESSION_TTL_SECONDS;

pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_PRODUCTION: &str = "production";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";

#[derive(Debug)]
pub struct Options {
    pub session_secret: Option<String>,
    pub session_ttl_seconds: i64,
    pub production: bool,
    pub frontend_base_url: String,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            session_secret: matches.get_one::<String>(ARG_SESSION_SECRET).cloned(),
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(DEFAULT_SESSION_TTL_SECONDS),
            production: matches.get_flag(ARG_PRODUCTION),
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .context("missing required argument: --frontend-base-url")?,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long("session-secret")
                .help("Secret used to sign session tokens")
                .long_help(
                    "Secret used to sign session tokens. Required in --production; \
                     in development a well-known insecure default is used when absent.",
                )
                .env("QUESTLOG_SESSION_SECRET"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long("session-ttl-seconds")
                .help("Session token and cookie TTL in seconds")
                .env("QUESTLOG_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_PRODUCTION)
                .long("production")
                .help("Production mode: require an explicit session secret and mark cookies Secure")
                .env("QUESTLOG_PRODUCTION")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long("frontend-base-url")
                .help("Frontend base URL allowed for CORS")
                .env("QUESTLOG_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
}
