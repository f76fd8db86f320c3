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

//! Line framed JSON protocol spoken by Yeelight lamps on the LAN control port.

mod connection;
mod message;

pub use connection::*;
pub use message::*;

/// Default LAN control port
pub const DEFAULT_PORT: u16 = 55443;

#[derive(thiserror::Error, Debug)]
pub enum YeelightError {
    #[error("IoError {0}")]
    IoError(#[from] std::io::Error),
    #[error("JsonError {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("InvalidMessage {0}")]
    InvalidMessage(String),
    #[error("ConnectionClosed")]
    ConnectionClosed
}

pub type Result<T> = std::result::Result<T, YeelightError>;
