//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{Error, Result};

const DEFAULT_PROFILE: &str = "default";

/// AWS session token generator.
///
/// Obtains MFA-authenticated temporary credentials from STS and stores them
/// in a named profile of the shared credentials file, so that other tools
/// (e.g. Terraform) can use them as a regular profile.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Path to AWS credentials file [default: ~/.aws/credentials]
    #[arg(short, long, env = "AWS_SHARED_CREDENTIALS_FILE")]
    pub file: Option<PathBuf>,

    /// AWS user name for the MFA device lookup
    #[arg(short, long)]
    pub user: Option<String>,

    /// Credentials profile holding the long-term keys; also sets the user
    /// when --user is not given
    #[arg(short, long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Profile to store the session credentials in
    #[arg(
        short,
        long = "session",
        value_name = "SESSION_PROFILE",
        num_args = 0..=1,
        default_missing_value = "session_profile"
    )]
    pub session_profile: Option<String>,

    /// Print the session credentials as export statements
    #[arg(short, long)]
    pub console: bool,

    /// Duration of the session token in seconds
    #[arg(short, long, env = "AWS_SESSION_DURATION", default_value_t = 3600)]
    pub duration: i32,

    /// OTP code to use for creating the session; skips the prompt
    #[arg(short, long)]
    pub token: Option<String>,
}

/// Resolved per-run configuration, validated and ready for the broker.
#[derive(Debug)]
pub struct SessionOptions {
    pub credentials_file: PathBuf,
    pub profile: String,
    pub session_profile: Option<String>,
    pub duration: i32,
    pub user: Option<String>,
    pub token: Option<String>,
    pub console: bool,
}

impl Args {
    /// Fills in defaults and checks flag combinations that cannot be
    /// expressed in the parser itself.
    pub fn into_options(self) -> Result<SessionOptions> {
        let credentials_file = match self.file {
            Some(path) => path,
            None => dirs::home_dir()
                .ok_or(Error::NoHomeDirectory)?
                .join(".aws")
                .join("credentials"),
        };

        let profile_provided = self.profile.is_some();
        let profile = self.profile.unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        let session_profile = self.session_profile.filter(|name| !name.is_empty());
        if session_profile.as_deref() == Some(profile.as_str()) {
            return Err(Error::ProfileNameCollision);
        }
        if !self.console && session_profile.is_none() {
            return Err(Error::MissingOutputTarget);
        }

        // An explicitly named profile doubles as the user name so the MFA
        // lookup targets the right account.
        let user = match self.user {
            Some(user) => Some(user),
            None if profile_provided => Some(profile.clone()),
            None => None,
        };

        Ok(SessionOptions {
            credentials_file,
            profile,
            session_profile,
            duration: self.duration,
            user,
            token: self.token,
            console: self.console,
        })
    }
}
