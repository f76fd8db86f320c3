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

use crate::{
    attributes::{ActiveMode, Attributes, AttributesPatch},
    power_mode::PowerMode
};

/// External values below this address the night light range
pub const NIGHT_LIGHT_THRESHOLD: u8 = 50;

pub const MAX_BRIGHTNESS: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessRange {
    /// `bright`, used in CT mode
    Normal,
    /// `nl_br`, used in night light mode
    NightLight
}

/// Brightness as the lamp sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceBrightness {
    pub range: BrightnessRange,
    pub value: u8
}

impl From<DeviceBrightness> for AttributesPatch {
    fn from(value: DeviceBrightness) -> Self {
        match value.range {
            BrightnessRange::Normal => Self { bright: Some(value.value), ..Default::default() },
            BrightnessRange::NightLight => Self { nl_br: Some(value.value), ..Default::default() }
        }
    }
}

/// Maps the single 0-100 control surface scale onto the lamp's two
/// brightness ranges. Lamps without a night light use `bright` directly.
///
/// `encode(50)` yields CT value 1 while CT value 0 decodes to 50. The two
/// directions deliberately disagree at that boundary.
#[derive(Debug, Clone, Copy)]
pub struct BrightnessTranslator {
    night_light: bool
}

impl BrightnessTranslator {
    pub fn new(night_light: bool) -> Self {
        Self { night_light }
    }

    pub fn night_light(&self) -> bool {
        self.night_light
    }

    /// Sub-mode a non-zero external value belongs to
    pub fn desired_mode(&self, value: u8) -> PowerMode {
        if self.night_light && value < NIGHT_LIGHT_THRESHOLD {
            PowerMode::NightLight
        } else {
            PowerMode::Ct
        }
    }

    /// External to device. `value` is expected in 1..=100; zero is a power
    /// off and never reaches the lamp as a brightness. Larger values clamp
    /// to 100.
    pub fn encode(&self, value: u8) -> DeviceBrightness {
        let value = value.min(MAX_BRIGHTNESS);

        if !self.night_light {
            return DeviceBrightness { range: BrightnessRange::Normal, value };
        }

        if value < NIGHT_LIGHT_THRESHOLD {
            // internal 0 may be reserved by the lamp
            DeviceBrightness {
                range: BrightnessRange::NightLight,
                value: (value * 2).saturating_sub(1)
            }
        } else {
            // never send an off-equivalent brightness while on
            DeviceBrightness {
                range: BrightnessRange::Normal,
                value: ((value - NIGHT_LIGHT_THRESHOLD) * 2).max(1)
            }
        }
    }

    /// Device to external. Halves round up, matching how the surface rounds
    /// a fractional percentage.
    pub fn decode(&self, attributes: &Attributes) -> u8 {
        if !self.night_light {
            return attributes.bright;
        }

        match attributes.active_mode {
            ActiveMode::Normal => half_round_up(attributes.bright) + NIGHT_LIGHT_THRESHOLD,
            ActiveMode::Night => half_round_up(attributes.nl_br)
        }
    }
}

fn half_round_up(value: u8) -> u8 {
    value / 2 + value % 2
}
