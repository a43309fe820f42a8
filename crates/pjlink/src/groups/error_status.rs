//! Per-subsystem error status query (`ERST`).
//!
//! The reply is six digits, one per subsystem in fixed order: fan, lamp,
//! temperature, cover, filter, other.

use crate::error::PjLinkError;
use crate::protocol::command::{Command, CommandCode, PjClass};
use crate::session::Session;

/// Severity reported for one subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    Ok,
    Warning,
    Error,
}

impl ErrorLevel {
    fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            b'0' => Some(ErrorLevel::Ok),
            b'1' => Some(ErrorLevel::Warning),
            b'2' => Some(ErrorLevel::Error),
            _ => None,
        }
    }
}

/// One status per monitored subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorReport {
    pub fan: ErrorLevel,
    pub lamp: ErrorLevel,
    pub temperature: ErrorLevel,
    pub cover: ErrorLevel,
    pub filter: ErrorLevel,
    pub other: ErrorLevel,
}

impl ErrorReport {
    /// Whether every subsystem reports [`ErrorLevel::Ok`].
    pub fn all_clear(&self) -> bool {
        [
            self.fan,
            self.lamp,
            self.temperature,
            self.cover,
            self.filter,
            self.other,
        ]
        .iter()
        .all(|level| *level == ErrorLevel::Ok)
    }
}

/// Error-status command group.
pub struct ErrorStatus<'a> {
    session: &'a Session,
}

impl<'a> ErrorStatus<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Queries the current status of every subsystem.
    pub async fn query(&self) -> Result<ErrorReport, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(PjClass::One, CommandCode::ERROR_STATUS))
            .await?;
        parse_report(&value)
    }
}

fn parse_report(value: &str) -> Result<ErrorReport, PjLinkError> {
    let malformed = |detail: String| PjLinkError::MalformedResponse {
        command: CommandCode::ERROR_STATUS,
        detail,
    };

    let digits: [u8; 6] = value
        .as_bytes()
        .try_into()
        .map_err(|_| malformed(format!("expected six status digits, got {value:?}")))?;

    let mut levels = [ErrorLevel::Ok; 6];
    for (slot, digit) in levels.iter_mut().zip(digits) {
        *slot = ErrorLevel::from_digit(digit)
            .ok_or_else(|| malformed(format!("unknown status digit in {value:?}")))?;
    }

    let [fan, lamp, temperature, cover, filter, other] = levels;
    Ok(ErrorReport {
        fan,
        lamp,
        temperature,
        cover,
        filter,
        other,
    })
}
