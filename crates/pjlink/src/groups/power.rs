//! Power control and query (`POWR`).

use crate::error::PjLinkError;
use crate::protocol::command::{Command, CommandCode, PjClass};
use crate::session::Session;

/// Projector lamp power state, combining the settable and reported states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Off,
    On,
    /// Lamp is off and the fans are running down.
    Cooling,
    /// Lamp is on its way up; not yet projecting.
    Warming,
}

impl PowerState {
    fn from_wire(value: &str) -> Option<Self> {
        match value {
            "0" => Some(PowerState::Off),
            "1" => Some(PowerState::On),
            "2" => Some(PowerState::Cooling),
            "3" => Some(PowerState::Warming),
            _ => None,
        }
    }

    /// Whether the projector is heading towards (or at) a lit lamp.
    pub fn is_on(self) -> bool {
        matches!(self, PowerState::On | PowerState::Warming)
    }
}

/// Power command group.
pub struct Power<'a> {
    session: &'a Session,
}

impl<'a> Power<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Queries the current power state.
    pub async fn state(&self) -> Result<PowerState, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(PjClass::One, CommandCode::POWER))
            .await?;
        PowerState::from_wire(&value).ok_or_else(|| PjLinkError::MalformedResponse {
            command: CommandCode::POWER,
            detail: format!("unknown power state {value:?}"),
        })
    }

    /// Sets the power state.  Only [`PowerState::On`] and
    /// [`PowerState::Off`] are commandable; the transitional states are
    /// reported by the device, never requested.
    pub async fn set(&self, state: PowerState) -> Result<(), PjLinkError> {
        let param = match state {
            PowerState::On => "1",
            PowerState::Off => "0",
            PowerState::Cooling | PowerState::Warming => {
                return Err(PjLinkError::Validation {
                    detail: "power can only be set to on or off".to_string(),
                })
            }
        };
        self.session
            .request_ok(Command::set(PjClass::One, CommandCode::POWER, param)?)
            .await
    }

    /// Powers the lamp on.
    pub async fn turn_on(&self) -> Result<(), PjLinkError> {
        self.set(PowerState::On).await
    }

    /// Powers the lamp off.
    pub async fn turn_off(&self) -> Result<(), PjLinkError> {
        self.set(PowerState::Off).await
    }
}
