//! Error taxonomy and the reply classifier.
//!
//! Every failure a caller can see is one of the [`PjLinkError`] kinds; raw
//! protocol tokens never cross this boundary.  The classifier converts a
//! decoded reply body into either a successful [`Payload`] or the matching
//! error kind, carrying the offending command code for diagnostics.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::codec::{ErrorToken, ReplyBody};
use crate::protocol::command::CommandCode;

/// The closed set of failures the engine can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PjLinkError {
    /// The greeting was malformed or missing, or the device requires
    /// authentication and no password was configured.
    #[error("handshake failed: {reason}")]
    Handshake { reason: String },

    /// The device rejected the authentication digest (`ERRA`).
    #[error("device rejected the authentication digest")]
    AuthenticationRejected,

    /// `ERR1` — the device does not implement this command.
    #[error("{command}: undefined command (ERR1)")]
    UndefinedCommand { command: CommandCode },

    /// `ERR2` — the parameter is out of range for this device.
    #[error("{command}: parameter out of range (ERR2)")]
    InvalidParameter { command: CommandCode },

    /// `ERR3` — the device cannot act in its current state.
    #[error("{command}: device busy or unavailable (ERR3)")]
    DeviceBusy { command: CommandCode },

    /// `ERR4` — projector or display failure.
    #[error("{command}: device failure (ERR4)")]
    DeviceFailure { command: CommandCode },

    /// The reply line could not be parsed, or its payload did not match
    /// the command's semantics.  Local to the single command.
    #[error("{command}: malformed response: {detail}")]
    MalformedResponse { command: CommandCode, detail: String },

    /// No reply arrived within the configured deadline.  Fatal to the
    /// connection: a stale reply could otherwise desynchronise correlation.
    #[error("{command}: no reply within {timeout:?}")]
    Timeout { command: CommandCode, timeout: Duration },

    /// The connection is closed or faulted; no I/O was attempted.
    #[error("connection is not usable")]
    ConnectionUnusable,

    /// A facade rejected a caller argument before any I/O occurred.
    #[error("invalid argument: {detail}")]
    Validation { detail: String },
}

impl PjLinkError {
    /// Whether this failure faults the connection.  Everything else leaves
    /// the connection ready for the next command.
    pub(crate) fn is_fatal(&self) -> bool {
        matches!(
            self,
            PjLinkError::Timeout { .. }
                | PjLinkError::ConnectionUnusable
                | PjLinkError::AuthenticationRejected
                | PjLinkError::Handshake { .. }
        )
    }
}

/// Successful reply payload after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// The literal `OK` status token.
    Status,
    /// An opaque value string for the facade to convert.
    Value(String),
}

/// Maps an error token to its [`PjLinkError`] kind for `command`.
pub(crate) fn classify_token(command: CommandCode, token: ErrorToken) -> PjLinkError {
    match token {
        ErrorToken::UndefinedCommand => PjLinkError::UndefinedCommand { command },
        ErrorToken::OutOfParameter => PjLinkError::InvalidParameter { command },
        ErrorToken::Unavailable => PjLinkError::DeviceBusy { command },
        ErrorToken::DeviceFailure => PjLinkError::DeviceFailure { command },
        ErrorToken::AuthRejected => PjLinkError::AuthenticationRejected,
    }
}

/// Classifies a correlated reply body into a payload or an error kind.
pub(crate) fn classify_body(command: CommandCode, body: ReplyBody) -> Result<Payload, PjLinkError> {
    match body {
        ReplyBody::Ok => Ok(Payload::Status),
        ReplyBody::Value(value) => Ok(Payload::Value(value)),
        ReplyBody::Error(token) => Err(classify_token(command, token)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
