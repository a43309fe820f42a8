//! Lamp usage and replacement model queries (`LAMP`, `RLMP`).
//!
//! A device may carry several lamps; the reply is a space-separated list
//! of `<hours> <lit-flag>` pairs, one per lamp, in a fixed device order.
//! Usage hours read 0 on devices that do not meter them.

use crate::error::PjLinkError;
use crate::protocol::command::{Command, CommandCode, PjClass};
use crate::session::Session;

/// Usage and state of one lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LampStatus {
    /// Cumulative lit hours.
    pub hours: u32,
    /// Whether the lamp is currently lit.
    pub lit: bool,
}

/// Lamp command group.
pub struct Lamps<'a> {
    session: &'a Session,
}

impl<'a> Lamps<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Queries every lamp, preserving the device's wire order.
    ///
    /// Devices without a lamp answer `ERR1`, surfaced as
    /// [`PjLinkError::UndefinedCommand`].
    pub async fn status(&self) -> Result<Vec<LampStatus>, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(PjClass::One, CommandCode::LAMP))
            .await?;
        parse_lamp_list(&value)
    }

    /// Lit hours of the first lamp.
    pub async fn hours(&self) -> Result<u32, PjLinkError> {
        let lamps = self.status().await?;
        lamps
            .first()
            .map(|lamp| lamp.hours)
            .ok_or_else(|| PjLinkError::MalformedResponse {
                command: CommandCode::LAMP,
                detail: "empty lamp list".to_string(),
            })
    }

    /// Replacement lamp model numbers listed by the device (Class 2).
    pub async fn replacement_models(&self) -> Result<Vec<String>, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(PjClass::Two, CommandCode::LAMP_MODELS))
            .await?;
        Ok(value
            .split_ascii_whitespace()
            .map(str::to_string)
            .collect())
    }
}

fn parse_lamp_list(value: &str) -> Result<Vec<LampStatus>, PjLinkError> {
    let malformed = |detail: String| PjLinkError::MalformedResponse {
        command: CommandCode::LAMP,
        detail,
    };

    let tokens: Vec<&str> = value.split_ascii_whitespace().collect();
    if tokens.is_empty() || tokens.len() % 2 != 0 {
        return Err(malformed(format!(
            "expected hour/flag pairs, got {} token(s)",
            tokens.len()
        )));
    }

    tokens
        .chunks_exact(2)
        .map(|pair| {
            let hours = pair[0]
                .parse()
                .map_err(|_| malformed(format!("unparsable lamp hours {:?}", pair[0])))?;
            let lit = match pair[1] {
                "0" => false,
                "1" => true,
                other => return Err(malformed(format!("unknown lit flag {other:?}"))),
            };
            Ok(LampStatus { hours, lit })
        })
        .collect()
}
