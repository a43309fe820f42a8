//! Input source selection and enumeration (`INPT`, `INST`, `INNM`,
//! `IRES`, `RRES`).

use std::fmt;

use crate::error::PjLinkError;
use crate::protocol::command::{Command, CommandCode, PjClass};
use crate::session::Session;

/// Input source family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Rgb,
    Video,
    Digital,
    Storage,
    Network,
    /// Class 2 only.
    Internal,
}

impl InputMode {
    fn digit(self) -> char {
        match self {
            InputMode::Rgb => '1',
            InputMode::Video => '2',
            InputMode::Digital => '3',
            InputMode::Storage => '4',
            InputMode::Network => '5',
            InputMode::Internal => '6',
        }
    }

    fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(InputMode::Rgb),
            '2' => Some(InputMode::Video),
            '3' => Some(InputMode::Digital),
            '4' => Some(InputMode::Storage),
            '5' => Some(InputMode::Network),
            '6' => Some(InputMode::Internal),
            _ => None,
        }
    }
}

/// One selectable input: a mode plus a single-character index
/// (`1`-`9` in Class 1, `1`-`9`/`A`-`Z` in Class 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSource {
    pub mode: InputMode,
    pub index: char,
}

impl InputSource {
    /// Builds a source, validating the index against the protocol's
    /// accepted domain.
    pub fn new(mode: InputMode, index: char) -> Result<Self, PjLinkError> {
        if !matches!(index, '1'..='9' | 'A'..='Z') {
            return Err(PjLinkError::Validation {
                detail: format!(
                    "input index {index:?} must be 1-9 (Class 1) or 1-9/A-Z (Class 2)"
                ),
            });
        }
        Ok(Self { mode, index })
    }

    /// Whether this source can only be addressed with a Class 2 command.
    fn needs_class_two(self) -> bool {
        self.mode == InputMode::Internal || self.index.is_ascii_alphabetic()
    }

    fn parse_wire(value: &str) -> Option<Self> {
        let mut chars = value.chars();
        let mode = InputMode::from_digit(chars.next()?)?;
        let index = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        InputSource::new(mode, index).ok()
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.mode.digit(), self.index)
    }
}

/// Resolution of a video signal in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub horizontal: u32,
    pub vertical: u32,
}

/// Outcome of the current-resolution query, which can legitimately report
/// the absence of a parsable signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalResolution {
    Active(Resolution),
    /// Reply `-`: no signal on the selected input.
    NoSignal,
    /// Reply `*`: a signal is present but the device cannot identify it.
    Unknown,
}

/// Input source command group.
pub struct Sources<'a> {
    session: &'a Session,
}

impl<'a> Sources<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Switches to the given input.  Uses a Class 1 command where the
    /// source permits it, Class 2 otherwise.
    pub async fn select(&self, source: InputSource) -> Result<(), PjLinkError> {
        let class = if source.needs_class_two() {
            PjClass::Two
        } else {
            PjClass::One
        };
        self.session
            .request_ok(Command::set(class, CommandCode::INPUT, &source.to_string())?)
            .await
    }

    /// Queries the currently selected input.
    pub async fn current(&self) -> Result<InputSource, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(PjClass::One, CommandCode::INPUT))
            .await?;
        InputSource::parse_wire(&value).ok_or_else(|| PjLinkError::MalformedResponse {
            command: CommandCode::INPUT,
            detail: format!("unparsable input token {value:?}"),
        })
    }

    /// Lists the device-advertised inputs, in wire order.
    pub async fn available(&self) -> Result<Vec<InputSource>, PjLinkError> {
        self.available_with(PjClass::One).await
    }

    async fn available_with(&self, class: PjClass) -> Result<Vec<InputSource>, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(class, CommandCode::INPUT_LIST))
            .await?;
        value
            .split_ascii_whitespace()
            .map(|token| {
                InputSource::parse_wire(token).ok_or_else(|| PjLinkError::MalformedResponse {
                    command: CommandCode::INPUT_LIST,
                    detail: format!("unparsable input token {token:?}"),
                })
            })
            .collect()
    }

    /// Queries the device-assigned name of one input terminal (Class 2).
    pub async fn name_of(&self, source: InputSource) -> Result<String, PjLinkError> {
        self.session
            .request_value(Command::query_with(
                PjClass::Two,
                CommandCode::INPUT_NAME,
                &source.to_string(),
            )?)
            .await
    }

    /// Lists the available inputs together with their terminal names.
    /// Inputs for which the device cannot report a name yield `None`.
    pub async fn available_with_names(
        &self,
    ) -> Result<Vec<(InputSource, Option<String>)>, PjLinkError> {
        let sources = self.available_with(PjClass::Two).await?;
        let mut out = Vec::with_capacity(sources.len());
        for source in sources {
            let name = match self.name_of(source).await {
                Ok(name) => Some(name),
                Err(PjLinkError::InvalidParameter { .. }) => None,
                Err(other) => return Err(other),
            };
            out.push((source, name));
        }
        Ok(out)
    }

    /// Queries the resolution of the current input signal (Class 2).
    pub async fn resolution(&self) -> Result<SignalResolution, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(PjClass::Two, CommandCode::INPUT_RESOLUTION))
            .await?;
        match value.as_str() {
            "-" => Ok(SignalResolution::NoSignal),
            "*" => Ok(SignalResolution::Unknown),
            other => parse_resolution(other, CommandCode::INPUT_RESOLUTION)
                .map(SignalResolution::Active),
        }
    }

    /// Queries the panel's recommended resolution (Class 2).
    pub async fn recommended_resolution(&self) -> Result<Resolution, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(
                PjClass::Two,
                CommandCode::RECOMMENDED_RESOLUTION,
            ))
            .await?;
        parse_resolution(&value, CommandCode::RECOMMENDED_RESOLUTION)
    }
}

/// Parses `<horizontal>x<vertical>`; the separator is case-insensitive.
fn parse_resolution(value: &str, command: CommandCode) -> Result<Resolution, PjLinkError> {
    let malformed = || PjLinkError::MalformedResponse {
        command,
        detail: format!("unparsable resolution {value:?}"),
    };
    let (h, v) = value
        .split_once(['x', 'X'])
        .ok_or_else(malformed)?;
    Ok(Resolution {
        horizontal: h.parse().map_err(|_| malformed())?,
        vertical: v.parse().map_err(|_| malformed())?,
    })
}
