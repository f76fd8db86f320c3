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

use std::{fs, path::Path, time::Duration};

use anyhow::Result;
use serde::Deserialize;

mod config_de;

use crate::{color_temperature::ColorTemperatureRange, dispatcher::PowerTiming};

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub light: LightConfig,
    pub timing: TimingConfig
}

impl Config {
    pub fn load<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let toml_src = fs::read_to_string(file_path)?;
        let config = toml::from_str(&toml_src)?;
        Ok(config)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DeviceConfig {
    /// Lamp LAN control address as host:port
    pub address: String,
    pub name: String
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: format!("192.168.1.20:{}", yeelight_lan::DEFAULT_PORT),
            name: "Ceiling Light".to_string()
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LightConfig {
    /// Drop explicit power on writes; some surfaces send them alongside
    /// every brightness change
    pub ignore_power_on: bool,

    /// Save state as the lamp's power-on default after each change
    pub save_default: bool,

    /// Lamp has a night light mode with its own brightness range
    pub night_light: bool,

    /// Supported range in kelvin, `None` when the lamp has no CT control
    pub color_temperature: Option<ColorTemperatureRange>
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ignore_power_on: false,
            save_default: false,
            night_light: true,
            color_temperature: Some(ColorTemperatureRange::default())
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay before a power request is sent, newer requests replace it
    #[serde(deserialize_with = "config_de::duration")]
    pub power_debounce: Duration,

    /// Window after a forced power on during which debounced power
    /// requests are dropped
    #[serde(deserialize_with = "config_de::duration")]
    pub override_settle: Duration,

    /// Duration of smooth brightness and color temperature transitions
    #[serde(deserialize_with = "config_de::duration")]
    pub transition: Duration,

    /// How long to wait for the lamp to answer a command
    #[serde(deserialize_with = "config_de::duration")]
    pub command_timeout: Duration,

    /// Cached attributes older than this are fetched from the lamp again
    #[serde(deserialize_with = "config_de::duration")]
    pub attribute_max_age: Duration,

    #[serde(deserialize_with = "config_de::duration")]
    pub default_save_delay: Duration
}

impl TimingConfig {
    pub fn power_timing(&self) -> PowerTiming {
        PowerTiming {
            debounce: self.power_debounce,
            settle: self.override_settle
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            power_debounce: Duration::from_millis(500),
            override_settle: Duration::from_millis(1000),
            transition: Duration::from_millis(400),
            command_timeout: Duration::from_secs(5),
            attribute_max_age: Duration::from_secs(5),
            default_save_delay: Duration::from_secs(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.timing.power_debounce, Duration::from_millis(500));
        assert_eq!(config.timing.override_settle, Duration::from_secs(1));
        assert!(config.light.night_light);
        assert_eq!(config.device.address, "192.168.1.20:55443");
    }

    #[test]
    fn parse_full_config() {
        let config: Config = toml::from_str(r#"
            [device]
            address = "10.0.0.5:55443"
            name = "Bedroom"

            [light]
            ignore_power_on = true
            save_default = true
            night_light = false
            color_temperature = { min = 1700, max = 6500 }

            [timing]
            power_debounce = "250ms"
            override_settle = 2
            transition = "1s"
            command_timeout = "10s"
            attribute_max_age = "1m"
            default_save_delay = "3s"
        "#).unwrap();

        assert_eq!(config.device.name, "Bedroom");
        assert!(config.light.ignore_power_on);
        assert!(!config.light.night_light);
        assert_eq!(config.light.color_temperature, Some(ColorTemperatureRange::new(1700, 6500).unwrap()));

        let timing = config.timing.power_timing();
        assert_eq!(timing.debounce, Duration::from_millis(250));
        assert_eq!(timing.settle, Duration::from_secs(2));
        assert_eq!(config.timing.attribute_max_age, Duration::from_secs(60));
    }

    #[test]
    fn inverted_color_temperature_range_fails_to_load() {
        let err = toml::from_str::<Config>(r#"
            [light]
            color_temperature = { min = 6500, max = 2700 }
        "#).unwrap_err();
        assert!(err.to_string().contains("min 6500K is above max 2700K"), "{err}");

        let result = toml::from_str::<Config>(r#"
            [light]
            color_temperature = { min = 0, max = 2700 }
        "#);
        assert!(result.is_err());
    }
}
