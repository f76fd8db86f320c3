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

use anyhow::{Result, anyhow};
use serde::Deserialize;

/// Supported color temperature range of the lamp, in kelvin. The control
/// surface speaks mireds, so its advertised range is this one inverted.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "KelvinBounds")]
pub struct ColorTemperatureRange {
    min: u32,
    max: u32
}

#[derive(Deserialize)]
struct KelvinBounds {
    min: u32,
    max: u32
}

impl TryFrom<KelvinBounds> for ColorTemperatureRange {
    type Error = anyhow::Error;

    fn try_from(value: KelvinBounds) -> Result<Self> {
        Self::new(value.min, value.max)
    }
}

impl Default for ColorTemperatureRange {
    fn default() -> Self {
        Self { min: 2700, max: 6500 }
    }
}

impl ColorTemperatureRange {
    /// Range of `min..=max` kelvin, both ends non-zero
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min == 0 {
            return Err(anyhow!("Color temperature min must be above 0K"));
        }
        if min > max {
            return Err(anyhow!("Color temperature min {min}K is above max {max}K"));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// `(min, max)` in mireds
    pub fn mired_range(&self) -> (u32, u32) {
        (kelvin_to_mired(self.max), kelvin_to_mired(self.min))
    }

    pub fn to_kelvin(&self, mired: u32) -> u32 {
        mired_to_kelvin(mired).clamp(self.min, self.max)
    }

    pub fn to_mired(&self, kelvin: u32) -> u32 {
        let (min, max) = self.mired_range();
        kelvin_to_mired(kelvin).clamp(min, max)
    }
}

fn kelvin_to_mired(kelvin: u32) -> u32 {
    reciprocal(kelvin)
}

fn mired_to_kelvin(mired: u32) -> u32 {
    reciprocal(mired)
}

fn reciprocal(value: u32) -> u32 {
    let value = value.max(1);
    (1_000_000 + value / 2) / value
}
