//! Device identification and version queries (`NAME`, `INF1`, `INF2`,
//! `INFO`, `CLSS`, `SNUM`, `SVER`).
//!
//! The identification strings are free-form and may be empty.

use crate::error::PjLinkError;
use crate::protocol::command::{Command, CommandCode, PjClass};
use crate::session::Session;

/// Best-effort snapshot of every identification field.  A field the
/// device does not implement (or answers with a command-level error) is
/// `None` rather than failing the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub projector_name: Option<String>,
    pub manufacturer: Option<String>,
    pub product_name: Option<String>,
    pub other_info: Option<String>,
    pub pjlink_class: Option<PjClass>,
    pub serial_number: Option<String>,
    pub software_version: Option<String>,
}

/// Keeps a field-level failure out of the aggregate unless it faulted
/// the connection, in which case the whole snapshot fails.
fn best_effort<T>(result: Result<T, PjLinkError>) -> Result<Option<T>, PjLinkError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.is_fatal() => Err(error),
        Err(_) => Ok(None),
    }
}

/// Information command group.
pub struct Information<'a> {
    session: &'a Session,
}

impl<'a> Information<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Projector name, e.g. `EBB13648`.
    pub async fn projector_name(&self) -> Result<String, PjLinkError> {
        self.session
            .request_value(Command::query(PjClass::One, CommandCode::NAME))
            .await
    }

    /// Manufacturer name, e.g. `EPSON`.
    pub async fn manufacturer(&self) -> Result<String, PjLinkError> {
        self.session
            .request_value(Command::query(PjClass::One, CommandCode::MANUFACTURER))
            .await
    }

    /// Product name, e.g. `EPSON PU1007B/PU1007W`.
    pub async fn product_name(&self) -> Result<String, PjLinkError> {
        self.session
            .request_value(Command::query(PjClass::One, CommandCode::PRODUCT))
            .await
    }

    /// Manufacturer-defined free-form information.
    pub async fn other_info(&self) -> Result<String, PjLinkError> {
        self.session
            .request_value(Command::query(PjClass::One, CommandCode::OTHER_INFO))
            .await
    }

    /// Highest PJLink class the device supports.
    pub async fn pjlink_class(&self) -> Result<PjClass, PjLinkError> {
        let value = self
            .session
            .request_value(Command::query(PjClass::One, CommandCode::CLASS))
            .await?;
        match value.as_str() {
            "1" => Ok(PjClass::One),
            "2" => Ok(PjClass::Two),
            other => Err(PjLinkError::MalformedResponse {
                command: CommandCode::CLASS,
                detail: format!("unknown PJLink class {other:?}"),
            }),
        }
    }

    /// Serial number (Class 2).
    pub async fn serial_number(&self) -> Result<String, PjLinkError> {
        self.session
            .request_value(Command::query(PjClass::Two, CommandCode::SERIAL_NUMBER))
            .await
    }

    /// Software version string (Class 2).
    pub async fn software_version(&self) -> Result<String, PjLinkError> {
        self.session
            .request_value(Command::query(PjClass::Two, CommandCode::SOFTWARE_VERSION))
            .await
    }

    /// Queries every identification field in one pass.  Fields the
    /// device rejects come back as `None`; only a connection fault ends
    /// the snapshot early.
    pub async fn snapshot(&self) -> Result<DeviceInfo, PjLinkError> {
        Ok(DeviceInfo {
            projector_name: best_effort(self.projector_name().await)?,
            manufacturer: best_effort(self.manufacturer().await)?,
            product_name: best_effort(self.product_name().await)?,
            other_info: best_effort(self.other_info().await)?,
            pjlink_class: best_effort(self.pjlink_class().await)?,
            serial_number: best_effort(self.serial_number().await)?,
            software_version: best_effort(self.software_version().await)?,
        })
    }
}
