//! Interactive OTP entry.

use std::io::{self, Write};

use crate::error::Result;

/// Capability for obtaining an OTP code from the operator. The broker only
/// consults it when no preset token was supplied, and tests inject a fake so
/// nothing binds to a real terminal.
pub trait TokenPrompt {
    fn read_code(&self, profile: &str) -> Result<String>;
}

/// Prompts on stdout and blocks on one line from stdin. There is no timeout;
/// an operator who never answers stalls the run.
pub struct TerminalPrompt;

impl TokenPrompt for TerminalPrompt {
    fn read_code(&self, profile: &str) -> Result<String> {
        print!("Specify the OTP code for profile {profile}: ");
        io::stdout().flush()?;

        let mut code = String::new();
        io::stdin().read_line(&mut code)?;
        Ok(code.trim().to_string())
    }
}
