//! Wire events published by attendance terminals
//!
//! Payloads are JSON documents tagged by a `cmd` field. Decoding rejects
//! anything that is not one of the recognized shapes before dispatch ever
//! sees it; unknown additive fields are ignored.

use serde::Deserialize;
use thiserror::Error;

/// Why a payload could not be decoded into a [`DeviceEvent`]
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload was not valid JSON
    #[error("malformed payload: {0}")]
    Malformed(#[source] serde_json::Error),
    /// Payload carried no usable `cmd` tag
    #[error("missing cmd field")]
    MissingCmd,
    /// `cmd` tag is not one of the recognized commands
    #[error("unknown cmd {0:?}")]
    UnknownCmd(String),
    /// Recognized command with a field shape that does not validate
    #[error("invalid fields for cmd {cmd:?}: {source}")]
    InvalidFields {
        cmd: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One decoded event from the bus
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd")]
pub enum DeviceEvent {
    /// `log` - an attendance check-in
    #[serde(rename = "log")]
    Checkin(CheckinEvent),
    /// `add_employee` - register or re-register an employee (upsert)
    #[serde(rename = "add_employee")]
    Enroll(EnrollEvent),
    /// `delete_employee` - remove an employee
    #[serde(rename = "delete_employee")]
    Remove(RemoveEvent),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinEvent {
    pub device_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub timestamp: i64,
    #[serde(default)]
    pub face_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollEvent {
    #[serde(default)]
    pub device_id: Option<String>,
    pub employee_id: String,
    pub employee_name: String,
    pub timestamp: i64,
    pub face_embedding: Vec<f64>,
    #[serde(default)]
    pub face_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveEvent {
    pub employee_id: String,
}

const KNOWN_CMDS: [&str; 3] = ["log", "add_employee", "delete_employee"];

impl DeviceEvent {
    /// Decode one raw payload, classifying every failure mode distinctly
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let value: serde_json::Value =
            serde_json::from_slice(payload).map_err(DecodeError::Malformed)?;

        let cmd = match value.get("cmd") {
            Some(serde_json::Value::String(cmd)) if !cmd.is_empty() => cmd.clone(),
            _ => return Err(DecodeError::MissingCmd),
        };

        if !KNOWN_CMDS.contains(&cmd.as_str()) {
            return Err(DecodeError::UnknownCmd(cmd));
        }

        serde_json::from_value(value).map_err(|source| DecodeError::InvalidFields { cmd, source })
    }

    /// The command tag this event arrived under
    pub fn cmd(&self) -> &'static str {
        match self {
            DeviceEvent::Checkin(_) => "log",
            DeviceEvent::Enroll(_) => "add_employee",
            DeviceEvent::Remove(_) => "delete_employee",
        }
    }

    /// The employee this event concerns (the dispatch ordering key)
    pub fn employee_id(&self) -> &str {
        match self {
            DeviceEvent::Checkin(ev) => &ev.employee_id,
            DeviceEvent::Enroll(ev) => &ev.employee_id,
            DeviceEvent::Remove(ev) => &ev.employee_id,
        }
    }
}
