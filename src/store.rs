//! Shared-credentials file rewrite engine.
//!
//! The credentials file is treated as an ordered sequence of `[section]`
//! blocks whose bodies are opaque text lines. A rewrite replaces exactly one
//! block with a generated session block (or appends one if the profile is
//! absent) and re-emits every other line verbatim, so unrelated profiles keep
//! their formatting untouched. Bodies are deliberately not parsed into
//! key/value pairs: only the block being rewritten is ever regenerated.
//!
//! The file is re-read on every write; nothing is cached between runs.

use std::fs;
use std::path::PathBuf;

use crate::credentials::SessionCredentials;
use crate::error::{Error, Result};

/// Rewrites one profile block of the shared credentials file in place.
pub struct ProfileStore {
    path: PathBuf,
}

/// One `[section]` block: the verbatim header line and the raw body lines
/// that follow it, up to the next header.
struct ProfileBlock {
    header: String,
    lines: Vec<String>,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Replaces the body of the `profile` block with freshly generated
    /// session lines, or appends a new block when the profile is absent.
    ///
    /// The whole file is read before the destination is opened for writing,
    /// so a read failure never truncates it. The write itself is a plain
    /// truncate-and-write with no locking or crash atomicity; callers
    /// serialize invocations against the same file.
    pub fn write(&self, profile: &str, credentials: &SessionCredentials) -> Result<()> {
        let text = fs::read_to_string(&self.path).map_err(|source| Error::ReadFile {
            path: self.path.clone(),
            source,
        })?;

        let mut output = String::with_capacity(text.len());
        let mut found = false;
        for block in parse_blocks(&text) {
            if !found && section_name(&block.header) == Some(profile) {
                // First match wins; later blocks with the same name fall
                // through and are re-emitted verbatim.
                push_session_block(&mut output, &block.header, credentials);
                found = true;
            } else {
                push_block(&mut output, &block);
            }
        }
        if !found {
            push_session_block(&mut output, &format!("[{profile}]"), credentials);
        }

        fs::write(&self.path, output).map_err(|source| Error::WriteFile {
            path: self.path.clone(),
            source,
        })
    }
}

/// Segments the file into header-led blocks. Lines keep their own
/// terminators, so untouched text is re-emitted byte for byte, CRLF
/// included. Lines before the first header belong to no block and are
/// dropped; the shared-credentials format always opens with a header.
fn parse_blocks(text: &str) -> Vec<ProfileBlock> {
    let mut blocks: Vec<ProfileBlock> = Vec::new();
    for line in text.split_inclusive('\n') {
        if line.starts_with('[') {
            blocks.push(ProfileBlock {
                header: line.to_string(),
                lines: Vec::new(),
            });
        } else if let Some(block) = blocks.last_mut() {
            block.lines.push(line.to_string());
        }
    }
    blocks
}

/// The section name between `[` and the first `]`. A header line with no
/// closing bracket has no name and can never match a target profile.
fn section_name(header: &str) -> Option<&str> {
    let rest = header.strip_prefix('[')?;
    rest.split_once(']').map(|(name, _)| name)
}

fn push_block(output: &mut String, block: &ProfileBlock) {
    push_line(output, &block.header);
    for line in &block.lines {
        push_line(output, line);
    }
}

/// The generated block keeps the matched header line and carries exactly
/// three keys in a fixed order. Expiration is never persisted.
fn push_session_block(output: &mut String, header: &str, credentials: &SessionCredentials) {
    push_line(output, header);
    push_line(
        output,
        &format!("aws_access_key_id = {}", credentials.access_key_id),
    );
    push_line(
        output,
        &format!("aws_secret_access_key = {}", credentials.secret_access_key),
    );
    push_line(
        output,
        &format!("aws_session_token = {}", credentials.session_token),
    );
}

/// Kept lines carry their own terminator; generated lines and a final line
/// that ends the file without one get a `\n`.
fn push_line(output: &mut String, line: &str) {
    output.push_str(line);
    if !line.ends_with('\n') {
        output.push('\n');
    }
}
