//! Class 2 extension groups: frame freeze (`FREZ`), filter status
//! (`FILT`, `RFIL`), and one-step volume control (`SVOL`, `MVOL`).

use crate::error::PjLinkError;
use crate::protocol::command::{Command, CommandCode, PjClass};
use crate::session::Session;

/// Frame-freeze command group.
pub struct Freeze<'a> {
    session: &'a Session,
}

impl<'a> Freeze<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Freezes or releases the current frame.
    pub async fn set(&self, frozen: bool) -> Result<(), PjLinkError> {
        let param = if frozen { "1" } else { "0" };
        self.session
            .request_ok(Command::set(PjClass::Two, CommandCode::FREEZE, param)?)
            .await
    }

    /// Queries whether the frame is currently frozen.
    pub async fn frozen(&self) -> Result<bool, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(PjClass::Two, CommandCode::FREEZE))
            .await?;
        match value.as_str() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(PjLinkError::MalformedResponse {
                command: CommandCode::FREEZE,
                detail: format!("unknown freeze state {other:?}"),
            }),
        }
    }
}

/// Filter command group.
pub struct Filter<'a> {
    session: &'a Session,
}

impl<'a> Filter<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Filter usage hours.  Reads 0 on devices that do not meter it;
    /// devices without a filter answer `ERR1`, surfaced as
    /// [`PjLinkError::UndefinedCommand`].
    pub async fn hours(&self) -> Result<u32, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(PjClass::Two, CommandCode::FILTER_HOURS))
            .await?;
        value.parse().map_err(|_| PjLinkError::MalformedResponse {
            command: CommandCode::FILTER_HOURS,
            detail: format!("unparsable filter hours {value:?}"),
        })
    }

    /// Replacement filter model numbers listed by the device.
    pub async fn replacement_models(&self) -> Result<Vec<String>, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(PjClass::Two, CommandCode::FILTER_MODELS))
            .await?;
        Ok(value
            .split_ascii_whitespace()
            .map(str::to_string)
            .collect())
    }
}

/// One-step volume control for a speaker or microphone channel.
///
/// The protocol only steps the volume by one unit per command; there is
/// no absolute set or query.
pub struct Volume<'a> {
    session: &'a Session,
    code: CommandCode,
}

impl<'a> Volume<'a> {
    pub(crate) fn speaker(session: &'a Session) -> Self {
        Self {
            session,
            code: CommandCode::SPEAKER_VOLUME,
        }
    }

    pub(crate) fn microphone(session: &'a Session) -> Self {
        Self {
            session,
            code: CommandCode::MICROPHONE_VOLUME,
        }
    }

    /// Raises the volume by one unit.
    pub async fn up(&self) -> Result<(), PjLinkError> {
        self.step("1").await
    }

    /// Lowers the volume by one unit.
    pub async fn down(&self) -> Result<(), PjLinkError> {
        self.step("0").await
    }

    async fn step(&self, param: &str) -> Result<(), PjLinkError> {
        self.session
            .request_ok(Command::set(PjClass::Two, self.code, param)?)
            .await
    }
}
