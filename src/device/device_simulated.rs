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

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Result, anyhow};
use log::info;
use serde_json::Value;

use crate::{
    attributes::{ActiveMode, Attributes, AttributesPatch, ColorMode, PROP_NAMES},
    device::{CommandChannel, PropertySource},
    events::{Event, EventSender}
};

/// In-memory lamp for running without hardware. Applies the commands the
/// bridge sends and pushes the resulting changes back as events, like a
/// real lamp would.
pub struct SimulatedDevice<S> {
    attributes: Mutex<Attributes>,
    event_sender: Mutex<S>
}

impl<S: EventSender + Send> SimulatedDevice<S> {
    pub fn new(event_sender: S) -> Self {
        Self {
            attributes: Mutex::new(Attributes::default()),
            event_sender: Mutex::new(event_sender)
        }
    }

    fn attributes(&self) -> MutexGuard<'_, Attributes> {
        self.attributes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, method: &str, params: &[Value]) -> Result<()> {
        let attributes = self.attributes().clone();

        let patch = match method {
            "set_power" => {
                let on = params.first().and_then(Value::as_str) == Some("on");
                let mut patch = AttributesPatch { power: Some(on), ..Default::default() };
                match params.get(3).and_then(Value::as_u64) {
                    Some(5) => patch.active_mode = Some(ActiveMode::Night),
                    Some(1) => {
                        patch.active_mode = Some(ActiveMode::Normal);
                        patch.color_mode = Some(ColorMode::Ct);
                    }
                    _ => { }
                }
                patch
            }
            "set_bright" => {
                let value = int_param(params)?;
                let value = u8::try_from(value)?;
                match attributes.active_mode {
                    ActiveMode::Normal => AttributesPatch { bright: Some(value), ..Default::default() },
                    ActiveMode::Night => AttributesPatch { nl_br: Some(value), ..Default::default() }
                }
            }
            "set_ct_abx" => {
                let value = u32::try_from(int_param(params)?)?;
                AttributesPatch { ct: Some(value), color_mode: Some(ColorMode::Ct), ..Default::default() }
            }
            "set_default" => {
                info!("Simulated lamp saved {attributes:?} as default");
                return Ok(());
            }
            m => return Err(anyhow!("unsupported method {m}"))
        };

        info!("Simulated lamp {method} {params:?}");
        self.attributes().merge(&patch);

        self.event_sender.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send_event(Event::DeviceProps(patch))
    }
}

fn int_param(params: &[Value]) -> Result<u64> {
    params.first()
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow!("Expected integer parameter, found {params:?}"))
}

impl<S: EventSender + Send> CommandChannel for SimulatedDevice<S> {
    fn send_command(&self, method: &str, params: Vec<Value>) -> Result<()> {
        self.apply(method, &params)
    }

    fn send_animated_command(&self, method: &str, value: Value) -> Result<()> {
        self.apply(method, &[value])
    }
}

impl<S: EventSender + Send> PropertySource for SimulatedDevice<S> {
    fn get_props(&self, names: &[&str]) -> Result<Vec<String>> {
        let attributes = self.attributes();

        names.iter()
            .map(|name| {
                let value = match *name {
                    "power" => if attributes.power { "on".to_string() } else { "off".to_string() },
                    "bright" => attributes.bright.to_string(),
                    "nl_br" => attributes.nl_br.to_string(),
                    "ct" => attributes.ct.to_string(),
                    "color_mode" => match attributes.color_mode {
                        ColorMode::Rgb => "1".to_string(),
                        ColorMode::Ct => "2".to_string(),
                        ColorMode::Hsv => "3".to_string()
                    },
                    "active_mode" => match attributes.active_mode {
                        ActiveMode::Normal => "0".to_string(),
                        ActiveMode::Night => "1".to_string()
                    },
                    n => return Err(anyhow!("unknown prop {n}, expected one of {PROP_NAMES:?}"))
                };
                Ok(value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;

    use serde_json::json;

    use super::*;

    #[test]
    fn night_light_power_on_routes_brightness() {
        let (sender, receiver) = channel::<Event>();
        let device = SimulatedDevice::new(sender);

        device.send_command("set_power", vec![json!("on"), json!("sudden"), json!(0), json!(5)]).unwrap();
        device.send_animated_command("set_bright", json!(59)).unwrap();

        let props = device.get_props(&PROP_NAMES).unwrap();
        assert_eq!(props, vec!["on", "100", "59", "4000", "2", "1"]);

        let events: Vec<Event> = receiver.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], Event::DeviceProps(AttributesPatch { nl_br: Some(59), ..Default::default() }));
    }

    #[test]
    fn unsupported_method_fails() {
        let (sender, _receiver) = channel::<Event>();
        let device = SimulatedDevice::new(sender);
        assert!(device.send_command("set_rgb", vec![json!(255)]).is_err());
    }
}
