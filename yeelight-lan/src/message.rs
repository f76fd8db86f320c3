/*
 * ReLight - Write-ordering bridge for Yeelight ceiling lamps
 * Copyright (C) 2026 Josh Kropf <josh@slashdev.ca>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Result, YeelightError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub id: u32,
    pub method: String,
    pub params: Vec<Value>
}

impl Command {
    pub const TERMINATOR: &'static [u8] = b"\r\n";

    pub fn new(id: u32, method: &str, params: Vec<Value>) -> Self {
        Self { id, method: method.to_string(), params }
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        buf.put(&serde_json::to_vec(self)?[..]);
        buf.put(Self::TERMINATOR);
        Ok(buf.freeze())
    }
}

/// Error object the lamp returns in place of a result
#[derive(Debug, Clone, PartialEq, Deserialize, thiserror::Error)]
#[error("device error {code}: {message}")]
pub struct DeviceError {
    pub code: i32,
    pub message: String
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceMessage {
    /// Successful reply to the command with matching id
    Result { id: u32, result: Vec<Value> },
    /// Failed reply to the command with matching id
    Error { id: u32, error: DeviceError },
    /// Unsolicited state change pushed by the lamp
    Props(Map<String, Value>)
}

#[derive(Deserialize)]
struct RawMessage {
    id: Option<u32>,
    result: Option<Vec<Value>>,
    error: Option<DeviceError>,
    method: Option<String>,
    params: Option<Map<String, Value>>
}

impl TryFrom<RawMessage> for DeviceMessage {
    type Error = YeelightError;

    fn try_from(value: RawMessage) -> Result<Self> {
        let message = match value {
            RawMessage { id: Some(id), result: Some(result), .. } => {
                DeviceMessage::Result { id, result }
            }
            RawMessage { id: Some(id), error: Some(error), .. } => {
                DeviceMessage::Error { id, error }
            }
            RawMessage { method: Some(method), params: Some(params), .. } if method == "props" => {
                DeviceMessage::Props(params)
            }
            RawMessage { method, id, .. } => {
                return Err(YeelightError::InvalidMessage(
                    format!("unrecognized message id={id:?} method={method:?}")
                ));
            }
        };

        Ok(message)
    }
}

impl DeviceMessage {
    /// Parse the first complete line in `buffer`. Returns `None` when the
    /// buffer doesn't hold a full line yet, otherwise the number of bytes
    /// consumed and the message. Blank lines yield `Ok(Some((n, None)))`.
    pub fn parse(buffer: &[u8]) -> Result<Option<(usize, Option<Self>)>> {
        let Some(end) = buffer.iter().position(|b| *b == b'\n') else {
            return Ok(None);
        };

        let line = buffer[..end].trim_ascii();
        if line.is_empty() {
            return Ok(Some((end + 1, None)));
        }

        let raw: RawMessage = serde_json::from_slice(line)?;
        Ok(Some((end + 1, Some(raw.try_into()?))))
    }
}
