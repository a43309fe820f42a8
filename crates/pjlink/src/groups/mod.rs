//! Command group facades.
//!
//! Each group is a narrow typed wrapper over the shared session: it
//! validates caller arguments, builds the wire command, and converts the
//! reply payload into a domain value.  Groups perform no I/O of their
//! own and hold no state beyond the session reference, so they are
//! created on demand from [`crate::PjLink`] accessors.

pub mod class2;
pub mod error_status;
pub mod info;
pub mod lamp;
pub mod mute;
pub mod power;
pub mod sources;

pub use class2::{Filter, Freeze, Volume};
pub use error_status::{ErrorLevel, ErrorReport, ErrorStatus};
pub use info::{DeviceInfo, Information};
pub use lamp::{LampStatus, Lamps};
pub use mute::{Mute, MuteState};
pub use power::{Power, PowerState};
pub use sources::{InputMode, InputSource, Resolution, SignalResolution, Sources};
