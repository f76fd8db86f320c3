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

use std::sync::Arc;

use anyhow::{Result, anyhow};
use log::{debug, info};
use serde_json::json;

use crate::{
    attributes::{AttributeStore, Attributes, AttributesPatch},
    brightness::{BrightnessTranslator, MAX_BRIGHTNESS},
    characteristic::{Characteristic, CharacteristicInfo, CharacteristicValue, ControlSurface},
    color_temperature::ColorTemperatureRange,
    config::LightConfig,
    default_saver::DefaultSaver,
    device::CommandChannel,
    dispatcher::{PowerDispatcher, PowerTiming},
    events::{Event, EventHandler},
    power_mode::PowerMode
};

/// One lamp as presented to the control surface. Owns the power dispatcher
/// and decides how characteristic writes are ordered on their way to the
/// lamp.
pub struct LightAccessory<C, A, S> {
    channel: Arc<C>,
    store: A,
    surface: S,
    dispatcher: PowerDispatcher<C>,
    translator: BrightnessTranslator,
    color_temperature: Option<ColorTemperatureRange>,
    ignore_power_on: bool,
    default_saver: DefaultSaver
}

impl<C, A, S> LightAccessory<C, A, S>
    where C: CommandChannel + 'static, A: AttributeStore, S: ControlSurface
{
    pub fn new(
        config: &LightConfig,
        timing: PowerTiming,
        channel: Arc<C>,
        store: A,
        default_saver: DefaultSaver,
        surface: S
    ) -> Self {
        Self {
            dispatcher: PowerDispatcher::new(Arc::clone(&channel), timing),
            channel,
            store,
            surface,
            translator: BrightnessTranslator::new(config.night_light),
            color_temperature: config.color_temperature,
            ignore_power_on: config.ignore_power_on,
            default_saver
        }
    }

    pub fn dispatcher(&self) -> &PowerDispatcher<C> {
        &self.dispatcher
    }

    /// Characteristics to register with the control surface
    pub fn characteristics(&self) -> Vec<CharacteristicInfo> {
        let mut list = vec![
            CharacteristicInfo { characteristic: Characteristic::On, bounds: None },
            CharacteristicInfo {
                characteristic: Characteristic::Brightness,
                bounds: Some((0, MAX_BRIGHTNESS.into()))
            }
        ];

        if let Some(range) = &self.color_temperature {
            list.push(CharacteristicInfo {
                characteristic: Characteristic::ColorTemperature,
                bounds: Some(range.mired_range())
            });
        }

        list
    }

    fn characteristic_info(&self, characteristic: Characteristic) -> Result<CharacteristicInfo> {
        self.characteristics()
            .into_iter()
            .find(|info| info.characteristic == characteristic)
            .ok_or_else(|| anyhow!("{characteristic:?} is not supported by this light"))
    }

    pub fn read_characteristic(&self, characteristic: Characteristic) -> Result<CharacteristicValue> {
        let info = self.characteristic_info(characteristic)?;
        let attributes = self.store.attributes()?;

        let value = match info.characteristic {
            Characteristic::On => CharacteristicValue::Bool(attributes.power),
            Characteristic::Brightness => {
                CharacteristicValue::Int(self.translator.decode(&attributes).into())
            }
            Characteristic::ColorTemperature => {
                let range = self.color_temperature.unwrap_or_default();
                CharacteristicValue::Int(range.to_mired(attributes.ct))
            }
        };

        Ok(value)
    }

    pub fn write_characteristic(
        &self,
        characteristic: Characteristic,
        value: CharacteristicValue
    ) -> Result<()> {
        self.characteristic_info(characteristic)?.validate(&value)?;

        match characteristic {
            Characteristic::On => {
                self.write_on(value.as_bool()?);
                Ok(())
            }
            Characteristic::Brightness => self.write_brightness(u8::try_from(value.as_int()?)?),
            Characteristic::ColorTemperature => self.write_color_temperature(value.as_int()?)
        }
    }

    /// Debounced power change. The cache is updated right away.
    pub fn write_on(&self, on: bool) {
        if on && self.ignore_power_on {
            info!("Ignore power on write from control surface");
            return;
        }

        if on {
            self.dispatcher.schedule_power(Some(self.dispatcher.last_mode_or_default()));
        } else {
            self.dispatcher.schedule_power(None);
        }

        self.store.set_attributes(AttributesPatch { power: Some(on), ..Default::default() });
    }

    /// Brightness of zero powers off. Otherwise power and mode are forced
    /// ahead of the brightness whenever the lamp is off, a debounced power
    /// request is still pending, or the lamp sits in the wrong sub-mode.
    /// Without that the lamp's own power on brightness would land after
    /// ours.
    pub fn write_brightness(&self, value: u8) -> Result<()> {
        if value > MAX_BRIGHTNESS {
            return Err(anyhow!("Brightness {value} outside of range 0..={MAX_BRIGHTNESS}"));
        }

        if value == 0 {
            self.surface.update_characteristic(Characteristic::Brightness, CharacteristicValue::Int(0));
            self.dispatcher.override_power(None)?;
            self.store.set_attributes(AttributesPatch { power: Some(false), ..Default::default() });
        } else {
            let desired_mode = self.translator.desired_mode(value);
            let attributes = self.store.attributes()?;
            let pending = self.dispatcher.has_pending();
            let wrong_mode = self.translator.night_light() && self.dispatcher.mode() != Some(desired_mode);

            if !attributes.power || pending || wrong_mode {
                debug!(
                    "Force {desired_mode:?} before brightness {value} (power={}, pending={pending}, wrong_mode={wrong_mode})",
                    attributes.power
                );
                self.dispatcher.override_power(Some(desired_mode))?;
            }

            let target = self.translator.encode(value);
            self.channel.send_animated_command("set_bright", json!(target.value))?;
            self.store.set_attributes(target.into());
        }

        self.default_saver.save_default_if_needed();

        Ok(())
    }

    /// Always forces CT mode first; CT writes are rare and only make sense
    /// in that mode.
    pub fn write_color_temperature(&self, mired: u32) -> Result<()> {
        let range = self.color_temperature
            .ok_or_else(|| anyhow!("Color temperature is not supported by this light"))?;

        self.dispatcher.override_power(Some(PowerMode::Ct))?;

        let kelvin = range.to_kelvin(mired);
        self.channel.send_animated_command("set_ct_abx", json!(kelvin))?;
        self.store.set_attributes(AttributesPatch { ct: Some(kelvin), ..Default::default() });

        self.default_saver.save_default_if_needed();

        Ok(())
    }

    /// Resync mode and all characteristics from freshly observed attributes
    pub fn on_attributes_updated(&self, attributes: &Attributes) {
        self.dispatcher.observe_mode(attributes.color_mode, attributes.active_mode);

        self.surface.update_characteristic(
            Characteristic::On,
            CharacteristicValue::Bool(attributes.power)
        );
        self.surface.update_characteristic(
            Characteristic::Brightness,
            CharacteristicValue::Int(self.translator.decode(attributes).into())
        );
        if let Some(range) = &self.color_temperature {
            self.surface.update_characteristic(
                Characteristic::ColorTemperature,
                CharacteristicValue::Int(range.to_mired(attributes.ct))
            );
        }
    }

    /// Fetch attributes and resync everything
    pub fn refresh(&self) -> Result<()> {
        let attributes = self.store.attributes()?;
        self.on_attributes_updated(&attributes);
        Ok(())
    }
}

impl<C, A, S> EventHandler for LightAccessory<C, A, S>
    where C: CommandChannel + 'static, A: AttributeStore, S: ControlSurface
{
    fn handle_event(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::DeviceProps(patch) => {
                let attributes = self.store.set_attributes(patch.clone());
                self.on_attributes_updated(&attributes);
            }
            Event::ReadCharacteristic(characteristic) => {
                let value = self.read_characteristic(*characteristic)?;
                self.surface.update_characteristic(*characteristic, value);
            }
            Event::WriteCharacteristic(characteristic, value) => {
                self.write_characteristic(*characteristic, *value)?;
            }
            Event::Quit => { }
        }

        Ok(())
    }
}
