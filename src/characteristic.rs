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

use std::fmt;

use anyhow::{Result, anyhow};

/// Attributes the control surface can read and write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    On,
    /// Unified 0-100 brightness
    Brightness,
    /// Color temperature in mireds
    ColorTemperature
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicValue {
    Bool(bool),
    Int(u32)
}

impl CharacteristicValue {
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(v) => Ok(*v),
            Self::Int(v) => Err(anyhow!("Expected bool value, found {v}"))
        }
    }

    pub fn as_int(&self) -> Result<u32> {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Bool(v) => Err(anyhow!("Expected int value, found {v}"))
        }
    }
}

impl fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}")
        }
    }
}

/// Registration details for one characteristic. `bounds` is the inclusive
/// range accepted on write, `None` for booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicInfo {
    pub characteristic: Characteristic,
    pub bounds: Option<(u32, u32)>
}

impl CharacteristicInfo {
    /// Check `value` has the right type and falls within bounds
    pub fn validate(&self, value: &CharacteristicValue) -> Result<()> {
        match self.bounds {
            None => {
                value.as_bool()?;
            }
            Some((min, max)) => {
                let v = value.as_int()?;
                if v < min || v > max {
                    return Err(anyhow!(
                        "{:?} value {v} outside of range {min}..={max}", self.characteristic
                    ));
                }
            }
        }

        Ok(())
    }
}

/// The side that displays characteristic values to the user
pub trait ControlSurface {
    fn update_characteristic(&self, characteristic: Characteristic, value: CharacteristicValue);
}
