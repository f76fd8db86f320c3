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

use anyhow::Result;
use serde_json::Value;

mod device_lan;
mod device_simulated;

pub use device_lan::LanDevice;
pub use device_simulated::SimulatedDevice;

/// Sends commands to the lamp. Calls block until the lamp replies.
pub trait CommandChannel: Send + Sync {
    fn send_command(&self, method: &str, params: Vec<Value>) -> Result<()>;

    /// Same as `send_command` with a single value, but asks the lamp for a
    /// smooth transition.
    fn send_animated_command(&self, method: &str, value: Value) -> Result<()>;
}

/// Reads current property values straight from the lamp
pub trait PropertySource: Send + Sync {
    fn get_props(&self, names: &[&str]) -> Result<Vec<String>>;
}

/// Everything the bridge needs from a lamp
pub trait LightDevice: CommandChannel + PropertySource {}

impl<T: CommandChannel + PropertySource> LightDevice for T {}
