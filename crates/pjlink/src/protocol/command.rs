//! Typed model of an outgoing PJLink command.
//!
//! A command line on the wire looks like `%1POWR ?\r`: a percent marker, a
//! protocol class digit, a four-character command code, a space, a parameter,
//! and a carriage-return terminator.  This module provides the [`Command`]
//! value the facades build and the codec renders, together with the
//! [`PjClass`] and [`CommandCode`] vocabulary types.

use std::fmt;

use crate::error::PjLinkError;

/// Maximum parameter length accepted by the protocol.
pub const MAX_PARAM_LEN: usize = 128;

/// Protocol class of a command.
///
/// Class 1 is the baseline command set (power, input, mute, lamp, errors).
/// Class 2 is a superset adding extension commands such as freeze, filter
/// status, and volume stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PjClass {
    One,
    Two,
}

impl PjClass {
    /// Wire digit for this class (`1` or `2`).
    pub fn digit(self) -> char {
        match self {
            PjClass::One => '1',
            PjClass::Two => '2',
        }
    }

    pub(crate) fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(PjClass::One),
            '2' => Some(PjClass::Two),
            _ => None,
        }
    }
}

impl fmt::Display for PjClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.digit())
    }
}

/// Four-character ASCII command code, e.g. `POWR`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandCode([u8; 4]);

impl CommandCode {
    /// Power control and query (`POWR`).
    pub const POWER: CommandCode = CommandCode(*b"POWR");
    /// Input selection and query (`INPT`).
    pub const INPUT: CommandCode = CommandCode(*b"INPT");
    /// Audio/video mute control and query (`AVMT`).
    pub const AV_MUTE: CommandCode = CommandCode(*b"AVMT");
    /// Per-subsystem error status query (`ERST`).
    pub const ERROR_STATUS: CommandCode = CommandCode(*b"ERST");
    /// Lamp hours and lit state query (`LAMP`).
    pub const LAMP: CommandCode = CommandCode(*b"LAMP");
    /// Available input list query (`INST`).
    pub const INPUT_LIST: CommandCode = CommandCode(*b"INST");
    /// Projector name query (`NAME`).
    pub const NAME: CommandCode = CommandCode(*b"NAME");
    /// Manufacturer name query (`INF1`).
    pub const MANUFACTURER: CommandCode = CommandCode(*b"INF1");
    /// Product name query (`INF2`).
    pub const PRODUCT: CommandCode = CommandCode(*b"INF2");
    /// Free-form other-information query (`INFO`).
    pub const OTHER_INFO: CommandCode = CommandCode(*b"INFO");
    /// Supported PJLink class query (`CLSS`).
    pub const CLASS: CommandCode = CommandCode(*b"CLSS");
    /// Serial number query, Class 2 (`SNUM`).
    pub const SERIAL_NUMBER: CommandCode = CommandCode(*b"SNUM");
    /// Software version query, Class 2 (`SVER`).
    pub const SOFTWARE_VERSION: CommandCode = CommandCode(*b"SVER");
    /// Input terminal name query, Class 2 (`INNM`).
    pub const INPUT_NAME: CommandCode = CommandCode(*b"INNM");
    /// Current input resolution query, Class 2 (`IRES`).
    pub const INPUT_RESOLUTION: CommandCode = CommandCode(*b"IRES");
    /// Recommended resolution query, Class 2 (`RRES`).
    pub const RECOMMENDED_RESOLUTION: CommandCode = CommandCode(*b"RRES");
    /// Filter usage hours query, Class 2 (`FILT`).
    pub const FILTER_HOURS: CommandCode = CommandCode(*b"FILT");
    /// Replacement lamp model query, Class 2 (`RLMP`).
    pub const LAMP_MODELS: CommandCode = CommandCode(*b"RLMP");
    /// Replacement filter model query, Class 2 (`RFIL`).
    pub const FILTER_MODELS: CommandCode = CommandCode(*b"RFIL");
    /// Frame freeze control and query, Class 2 (`FREZ`).
    pub const FREEZE: CommandCode = CommandCode(*b"FREZ");
    /// Speaker volume stepping, Class 2 (`SVOL`).
    pub const SPEAKER_VOLUME: CommandCode = CommandCode(*b"SVOL");
    /// Microphone volume stepping, Class 2 (`MVOL`).
    pub const MICROPHONE_VOLUME: CommandCode = CommandCode(*b"MVOL");

    /// Parses an echoed code from a reply line.  Accepts uppercase ASCII
    /// letters and digits only; lowercase echoes are folded to uppercase.
    pub(crate) fn from_wire(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; 4] = bytes.try_into().ok()?;
        let mut code = [0u8; 4];
        for (slot, byte) in code.iter_mut().zip(raw) {
            let upper = byte.to_ascii_uppercase();
            if !upper.is_ascii_uppercase() && !upper.is_ascii_digit() {
                return None;
            }
            *slot = upper;
        }
        Some(CommandCode(code))
    }

    /// The code as a string slice, e.g. `"POWR"`.
    pub fn as_str(&self) -> &str {
        // Constructors only admit ASCII.
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandCode({})", self.as_str())
    }
}

/// One request unit: class, code, and parameter.  Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    class: PjClass,
    code: CommandCode,
    param: String,
}

impl Command {
    /// Builds a query command (`?` parameter).
    pub fn query(class: PjClass, code: CommandCode) -> Self {
        Self {
            class,
            code,
            param: "?".to_string(),
        }
    }

    /// Builds a query command with a suffix after the `?`, e.g. `INNM ?11`.
    pub fn query_with(class: PjClass, code: CommandCode, suffix: &str) -> Result<Self, PjLinkError> {
        Self::set(class, code, &format!("?{suffix}"))
    }

    /// Builds a set command with an explicit parameter value.
    ///
    /// # Errors
    ///
    /// Returns [`PjLinkError::Validation`] when the parameter exceeds the
    /// protocol's 128-byte limit.
    pub fn set(class: PjClass, code: CommandCode, param: &str) -> Result<Self, PjLinkError> {
        if param.len() > MAX_PARAM_LEN {
            return Err(PjLinkError::Validation {
                detail: format!(
                    "{code} parameter is {} bytes, protocol limit is {MAX_PARAM_LEN}",
                    param.len()
                ),
            });
        }
        Ok(Self {
            class,
            code,
            param: param.to_string(),
        })
    }

    pub fn class(&self) -> PjClass {
        self.class
    }

    pub fn code(&self) -> CommandCode {
        self.code
    }

    pub fn param(&self) -> &str {
        &self.param
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
