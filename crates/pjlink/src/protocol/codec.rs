//! Wire codec for PJLink command and reply lines.
//!
//! Wire format:
//! ```text
//! command:  [digest]%<class><code> <param>\r
//! reply:    %<class><code>=<payload>\r
//! special:  PJLINK ERRA\r            (authentication rejected)
//! ```
//! The 32-character lowercase hex digest appears with no separator before
//! the first command of an authenticated session only.  The payload of a
//! reply is either the literal `OK` token, one of the `ERR1`..`ERR4`/`ERRA`
//! error tokens, or an opaque value string for the facades to convert.

use thiserror::Error;

use crate::protocol::command::{Command, CommandCode, PjClass};

/// Every line on the wire ends with a single carriage return.
pub const TERMINATOR: u8 = b'\r';

/// Errors produced when a reply line cannot be parsed.
///
/// These are distinct from protocol-level error replies (`ERR1`..`ERR4`):
/// a `DecodeError` means the line itself was not understood, and is fatal
/// to the single command awaiting it, never to the connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The line does not begin with the `%` reply marker.
    #[error("reply does not start with '%': {line:?}")]
    MissingMarker { line: String },

    /// The class digit after the marker is not `1` or `2`.
    #[error("unknown protocol class digit {digit:?}")]
    UnknownClass { digit: char },

    /// The echoed command code is not four ASCII letters or digits.
    #[error("reply command code {code:?} is not a four-character code")]
    BadCommandCode { code: String },

    /// The `=` separator between code and payload is missing.
    #[error("reply separator '=' is missing: {line:?}")]
    MissingSeparator { line: String },

    /// The line ended before all mandatory fields were present.
    #[error("reply line is too short: {line:?}")]
    Truncated { line: String },
}

/// Protocol-level error tokens a device can return in place of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorToken {
    /// `ERR1` — the command is not supported by this device.
    UndefinedCommand,
    /// `ERR2` — the parameter is out of range for this device.
    OutOfParameter,
    /// `ERR3` — the device cannot act in its current state.
    Unavailable,
    /// `ERR4` — projector or display failure.
    DeviceFailure,
    /// `ERRA` — the authentication digest was rejected.
    AuthRejected,
}

impl ErrorToken {
    fn from_payload(payload: &str) -> Option<Self> {
        match payload.to_ascii_uppercase().as_str() {
            "ERR1" => Some(ErrorToken::UndefinedCommand),
            "ERR2" => Some(ErrorToken::OutOfParameter),
            "ERR3" => Some(ErrorToken::Unavailable),
            "ERR4" => Some(ErrorToken::DeviceFailure),
            "ERRA" => Some(ErrorToken::AuthRejected),
            _ => None,
        }
    }
}

/// The payload shape of a decoded reply.  Exactly one shape is ever present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    /// The literal `OK` success token (set commands).
    Ok,
    /// Any other payload, left opaque for the facade to convert.
    Value(String),
    /// One of the protocol error tokens.
    Error(ErrorToken),
}

/// A decoded `%<class><code>=<payload>` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Class digit echoed by the device.
    pub class: PjClass,
    /// Command code echoed by the device; the correlation key.
    pub code: CommandCode,
    /// Payload shape.
    pub body: ReplyBody,
}

/// One decoded incoming line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A command reply correlated by its echoed code.
    Response(Response),
    /// The bare `PJLINK ERRA` line sent when the authentication digest
    /// itself is rejected; carries no command echo.
    AuthRejected,
}

/// Renders a command into its exact wire line, including the terminator.
///
/// When `auth_prefix` is supplied it is prepended verbatim; the session
/// guarantees this happens for the first command of the connection only.
pub fn encode_command(command: &Command, auth_prefix: Option<&str>) -> String {
    let prefix = auth_prefix.unwrap_or("");
    format!(
        "{prefix}%{}{} {}\r",
        command.class().digit(),
        command.code(),
        command.param()
    )
}

/// Decodes one incoming line (terminator already stripped).
///
/// # Errors
///
/// Returns [`DecodeError`] when the line is not a recognisable reply.
pub fn decode_reply(line: &str) -> Result<Reply, DecodeError> {
    // Authentication rejection arrives as a bare greeting-style line.
    if line.trim().eq_ignore_ascii_case("PJLINK ERRA") {
        return Ok(Reply::AuthRejected);
    }

    let mut chars = line.chars();
    match chars.next() {
        Some('%') => {}
        _ => {
            return Err(DecodeError::MissingMarker {
                line: line.to_string(),
            })
        }
    }

    let digit = chars.next().ok_or_else(|| DecodeError::Truncated {
        line: line.to_string(),
    })?;
    let class = PjClass::from_digit(digit).ok_or(DecodeError::UnknownClass { digit })?;

    // Marker and class digit are both single-byte, so the code occupies
    // bytes 2..6 and the separator byte 6.
    if line.len() < 7 {
        return Err(DecodeError::Truncated {
            line: line.to_string(),
        });
    }
    let code_bytes = &line.as_bytes()[2..6];
    let code = CommandCode::from_wire(code_bytes).ok_or_else(|| DecodeError::BadCommandCode {
        code: String::from_utf8_lossy(code_bytes).into_owned(),
    })?;

    if line.as_bytes()[6] != b'=' {
        return Err(DecodeError::MissingSeparator {
            line: line.to_string(),
        });
    }

    let payload = &line[7..];
    let body = if let Some(token) = ErrorToken::from_payload(payload) {
        ReplyBody::Error(token)
    } else if payload.eq_ignore_ascii_case("OK") {
        ReplyBody::Ok
    } else {
        ReplyBody::Value(payload.to_string())
    };

    Ok(Reply::Response(Response { class, code, body }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
