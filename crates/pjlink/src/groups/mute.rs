//! Audio/video mute control and query (`AVMT`).
//!
//! The wire parameter is two digits: a track selector (`1` video, `2`
//! audio, `3` both) followed by `1` to mute or `0` to unmute.  Devices
//! without an individually controllable track answer `ERR2`.

use crate::error::PjLinkError;
use crate::protocol::command::{Command, CommandCode, PjClass};
use crate::session::Session;

/// Current mute status of both tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuteState {
    pub video: bool,
    pub audio: bool,
}

impl MuteState {
    fn from_wire(value: &str) -> Option<Self> {
        match value {
            "11" => Some(MuteState { video: true, audio: false }),
            "21" => Some(MuteState { video: false, audio: true }),
            "31" => Some(MuteState { video: true, audio: true }),
            "30" => Some(MuteState { video: false, audio: false }),
            _ => None,
        }
    }
}

/// AV-mute command group.
pub struct Mute<'a> {
    session: &'a Session,
}

impl<'a> Mute<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Queries the mute status of both tracks.
    pub async fn status(&self) -> Result<MuteState, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(PjClass::One, CommandCode::AV_MUTE))
            .await?;
        MuteState::from_wire(&value).ok_or_else(|| PjLinkError::MalformedResponse {
            command: CommandCode::AV_MUTE,
            detail: format!("unknown mute status {value:?}"),
        })
    }

    /// Mutes or unmutes the video track.
    pub async fn set_video(&self, muted: bool) -> Result<(), PjLinkError> {
        self.transmit('1', muted).await
    }

    /// Mutes or unmutes the audio track.
    pub async fn set_audio(&self, muted: bool) -> Result<(), PjLinkError> {
        self.transmit('2', muted).await
    }

    /// Mutes or unmutes both tracks with a single command.
    pub async fn set_both(&self, muted: bool) -> Result<(), PjLinkError> {
        self.transmit('3', muted).await
    }

    /// Applies a per-track mute setting; `None` leaves a track untouched.
    /// Mirrors the shape returned by [`Mute::status`].
    pub async fn set(&self, video: Option<bool>, audio: Option<bool>) -> Result<(), PjLinkError> {
        match (video, audio) {
            (None, None) => Ok(()),
            (Some(v), Some(a)) if v == a => self.set_both(v).await,
            (video, audio) => {
                if let Some(v) = video {
                    self.set_video(v).await?;
                }
                if let Some(a) = audio {
                    self.set_audio(a).await?;
                }
                Ok(())
            }
        }
    }

    async fn transmit(&self, track: char, muted: bool) -> Result<(), PjLinkError> {
        let state = if muted { '1' } else { '0' };
        let param = format!("{track}{state}");
        self.session
            .request_ok(Command::set(PjClass::One, CommandCode::AV_MUTE, &param)?)
            .await
    }
}
