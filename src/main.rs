//! AWS session token tool
//!
//! Wraps the AWS API to create and store session tokens so that other
//! commands/tools (e.g. Terraform) can function as necessary.
//!
//! A run performs the following operations:
//! 1. Parses command-line arguments into the run configuration
//! 2. Validates the credentials file, then builds IAM/STS clients from the
//!    source profile's long-term keys
//! 3. Looks up the profile's MFA device and obtains an OTP code
//! 4. Exchanges the OTP code for temporary session credentials
//! 5. Writes the credentials to the session profile and/or prints them
//!    as export statements

use anyhow::Result;
use clap::Parser;
use log::warn;

mod broker;
mod cli;
mod console;
mod credentials;
mod error;
mod identity;
mod prompt;
mod store;

use broker::{CredentialBroker, RunOutcome, validate_credentials_file};
use cli::Args;
use identity::AwsIdentity;
use prompt::TerminalPrompt;

/// Entry point: wires the parsed options, the AWS-backed identity service
/// and the terminal prompt into a broker and runs it once.
///
/// A profile without an MFA device ends the run early but successfully;
/// there is no session to create for it.
#[tokio::main]
async fn main() -> Result<()> {
    // INFO by default so progress is visible; RUST_LOG overrides.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let options = Args::parse().into_options()?;

    // File errors take precedence over source-profile errors.
    validate_credentials_file(&options.credentials_file)?;
    let identity = AwsIdentity::configure(&options).await?;
    let broker = CredentialBroker::new(options, identity, TerminalPrompt);

    match broker.run().await? {
        RunOutcome::SessionAcquired => {}
        RunOutcome::MfaNotRegistered => {
            warn!("Specified profile/user doesn't have an MFA device.");
            warn!("Script execution unnecessary.");
        }
    }
    Ok(())
}
