//! # pjlink
//!
//! Async client engine for the PJLink projector control protocol: a text
//! line protocol spoken by network-attached projectors and displays.
//!
//! The crate is organised in layers:
//!
//! - **`protocol`** – the wire format: typed commands, the line codec,
//!   and the challenge-response authentication scheme.
//! - **`transport`** – CR-terminated line reads and writes over any
//!   already-open duplex byte stream.
//! - **`session`** – the connection orchestrator: handshake, strict
//!   one-command-in-flight dispatch, reply correlation, timeouts, and
//!   error classification.
//! - **`groups`** – typed facades per command group (power, input
//!   sources, AV mute, lamps, error status, device info, and the Class 2
//!   extensions), reached through accessors on [`PjLink`].
//!
//! ```no_run
//! use pjlink::{PjLink, PjLinkConfig};
//!
//! # async fn demo() -> Result<(), pjlink::PjLinkError> {
//! let link = PjLink::connect_tcp("192.168.1.120", pjlink::DEFAULT_PORT, PjLinkConfig::default())
//!     .await?;
//! link.power().turn_off().await?;
//! let report = link.errors().query().await?;
//! println!("all clear: {}", report.all_clear());
//! link.close();
//! # Ok(())
//! # }
//! ```
//!
//! Device discovery and the device-initiated status-notification
//! protocol are not implemented; the session's read path detects
//! uncorrelated lines so those flows can be added as unsolicited-message
//! handlers without reshaping the engine.

pub mod error;
pub mod groups;
pub mod protocol;
pub mod session;
pub mod transport;

pub use error::PjLinkError;
pub use groups::{
    DeviceInfo, ErrorLevel, ErrorReport, ErrorStatus, Filter, Freeze, Information, InputMode,
    InputSource, LampStatus, Lamps, Mute, MuteState, Power, PowerState, Resolution,
    SignalResolution, Sources, Volume,
};
pub use protocol::{Command, CommandCode, PjClass};
pub use session::{PjLink, PjLinkConfig, DEFAULT_PORT};
