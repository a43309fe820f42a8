//! Greeting parsing and challenge-response authentication.
//!
//! Immediately after the transport opens, the device sends one greeting
//! line: `PJLINK 0` (no authentication) or `PJLINK 1 <challenge>` where the
//! challenge is a printable nonce valid for this connection only.  When
//! authentication is required, the client prepends the lowercase hex MD5
//! digest of `<challenge><password>` to its first command line, with no
//! separator.  The digest is sent exactly once per connection.

use std::fmt::Write as _;

use md5::{Digest, Md5};
use thiserror::Error;

/// Whether and how the device expects the client to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Greeting {
    /// `PJLINK 0` — no authentication required.
    Open,
    /// `PJLINK 1 <challenge>` — the first command must carry a digest
    /// computed from this challenge.
    AuthRequired { challenge: String },
}

/// Reasons a greeting line can be rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GreetingError {
    /// The line does not begin with the `PJLINK ` header.
    #[error("greeting does not start with PJLINK: {line:?}")]
    NotPjLink { line: String },

    /// The security mode digit is neither `0` nor `1`.
    #[error("unrecognised security mode in greeting: {line:?}")]
    UnknownSecurityMode { line: String },

    /// Mode `1` was announced but no challenge followed.
    #[error("authentication greeting carries no challenge: {line:?}")]
    MissingChallenge { line: String },
}

/// Parses the device's greeting line (terminator already stripped).
pub fn parse_greeting(line: &str) -> Result<Greeting, GreetingError> {
    let rest = match line.get(..7) {
        Some(header) if header.eq_ignore_ascii_case("PJLINK ") => &line[7..],
        _ => {
            return Err(GreetingError::NotPjLink {
                line: line.to_string(),
            })
        }
    };

    match rest.as_bytes().first() {
        Some(b'0') => Ok(Greeting::Open),
        Some(b'1') => {
            let challenge = rest[1..].trim();
            if challenge.is_empty() {
                return Err(GreetingError::MissingChallenge {
                    line: line.to_string(),
                });
            }
            Ok(Greeting::AuthRequired {
                challenge: challenge.to_string(),
            })
        }
        _ => Err(GreetingError::UnknownSecurityMode {
            line: line.to_string(),
        }),
    }
}

/// Computes the authentication prefix: lowercase hex MD5 of the challenge
/// concatenated with the password.
pub fn challenge_digest(challenge: &str, password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(challenge.as_bytes());
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
