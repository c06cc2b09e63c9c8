use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_FRONTEND_URL: &str = "frontend-url";
pub const ARG_SESSION_TTL: &str = "session-ttl-seconds";
pub const ARG_VERIFICATION_TTL: &str = "verification-ttl-seconds";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("Secret used to sign session and verification tokens")
                .env("NANTA_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_FRONTEND_URL)
                .long(ARG_FRONTEND_URL)
                .help("Frontend base URL, used for CORS and email links")
                .env("NANTA_FRONTEND_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Session token lifetime in seconds")
                .env("NANTA_SESSION_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_VERIFICATION_TTL)
                .long(ARG_VERIFICATION_TTL)
                .help("Email verification token lifetime in seconds")
                .env("NANTA_VERIFICATION_TTL_SECONDS")
                .default_value("43200")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark the session cookie Secure (HTTPS deployments)")
                .env("NANTA_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
}

#[derive(Debug)]
pub struct Options {
    pub token_secret: String,
    pub frontend_url: String,
    pub session_ttl_seconds: i64,
    pub verification_ttl_seconds: i64,
    pub secure_cookies: bool,
}

impl Options {
    /// Collect auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let token_secret = matches
            .get_one::<String>(ARG_TOKEN_SECRET)
            .cloned()
            .context("missing required argument: --token-secret")?;
        let frontend_url = matches
            .get_one::<String>(ARG_FRONTEND_URL)
            .cloned()
            .context("missing required argument: --frontend-url")?;
        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL)
            .copied()
            .unwrap_or(3600);
        let verification_ttl_seconds = matches
            .get_one::<i64>(ARG_VERIFICATION_TTL)
            .copied()
            .unwrap_or(43_200);
        let secure_cookies = matches.get_flag(ARG_SECURE_COOKIES);

        Ok(Self {
            token_secret,
            frontend_url,
            session_ttl_seconds,
            verification_ttl_seconds,
            secure_cookies,
        })
    }
}
