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

use crate::attributes::{ActiveMode, ColorMode};

/// Mutually exclusive lamp sub-modes the bridge drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerMode {
    Ct,
    NightLight
}

impl PowerMode {
    /// Mode argument of the `set_power` command
    pub fn device_mode(&self) -> u8 {
        match self {
            Self::Ct => 1,
            Self::NightLight => 5
        }
    }

    /// Derive the mode from lamp reported attributes. Color modes other than
    /// CT have no counterpart here and map to `None`.
    pub fn from_device(color_mode: ColorMode, active_mode: ActiveMode) -> Option<Self> {
        match (active_mode, color_mode) {
            (ActiveMode::Night, _) => Some(Self::NightLight),
            (ActiveMode::Normal, ColorMode::Ct) => Some(Self::Ct),
            _ => None
        }
    }
}

/// Tracks the active sub-mode for one lamp session. Device observations
/// always overwrite the local value; forced transitions set it
/// optimistically ahead of any device echo.
#[derive(Debug, Clone, Default)]
pub struct PowerModeState {
    current: Option<PowerMode>
}

impl PowerModeState {
    pub fn current(&self) -> Option<PowerMode> {
        self.current
    }

    /// Mode to power on with when nothing else is known
    pub fn last_or_default(&self) -> PowerMode {
        self.current.unwrap_or(PowerMode::Ct)
    }

    pub fn observe(&mut self, color_mode: ColorMode, active_mode: ActiveMode) {
        self.current = PowerMode::from_device(color_mode, active_mode);
    }

    pub fn force(&mut self, mode: PowerMode) {
        self.current = Some(mode);
    }
}
