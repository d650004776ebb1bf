//! Export-format console output.

use std::io::{self, Write};

use crate::credentials::SessionCredentials;

/// Writes the credential triple as `export` statements suitable for shell
/// `eval`, one variable per line, in a fixed order.
pub fn write_exports<W: Write>(out: &mut W, credentials: &SessionCredentials) -> io::Result<()> {
    writeln!(out, "export AWS_ACCESS_KEY_ID={}", credentials.access_key_id)?;
    writeln!(
        out,
        "export AWS_SECRET_ACCESS_KEY={}",
        credentials.secret_access_key
    )?;
    writeln!(out, "export AWS_SESSION_TOKEN={}", credentials.session_token)
}
