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

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering}
};

use anyhow::{Result, anyhow};
use serde_json::{Value, json};

use relight::{
    attributes::{AttributeStore, Attributes, AttributesPatch},
    characteristic::{Characteristic, CharacteristicValue, ControlSurface},
    device::CommandChannel
};

#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub method: String,
    pub params: Vec<Value>,
    pub animated: bool
}

impl Sent {
    pub fn power_on(device_mode: u8) -> Self {
        Self {
            method: "set_power".to_string(),
            params: vec![json!("on"), json!("sudden"), json!(0), json!(device_mode)],
            animated: false
        }
    }

    pub fn power_off() -> Self {
        Self {
            method: "set_power".to_string(),
            params: vec![json!("off"), json!("smooth"), json!(500)],
            animated: false
        }
    }

    pub fn animated(method: &str, value: Value) -> Self {
        Self { method: method.to_string(), params: vec![value], animated: true }
    }
}

/// Command channel that records everything and can be told to fail
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<Sent>>,
    fail: AtomicBool
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn record(&self, sent: Sent) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("lamp unreachable"));
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

impl CommandChannel for RecordingChannel {
    fn send_command(&self, method: &str, params: Vec<Value>) -> Result<()> {
        self.record(Sent { method: method.to_string(), params, animated: false })
    }

    fn send_animated_command(&self, method: &str, value: Value) -> Result<()> {
        self.record(Sent::animated(method, value))
    }
}

/// Attribute store with no device behind it
#[derive(Clone, Default)]
pub struct MemoryStore {
    attributes: Arc<Mutex<Attributes>>
}

impl MemoryStore {
    pub fn new(attributes: Attributes) -> Self {
        Self { attributes: Arc::new(Mutex::new(attributes)) }
    }

    pub fn get(&self) -> Attributes {
        self.attributes.lock().unwrap().clone()
    }
}

impl AttributeStore for MemoryStore {
    fn attributes(&self) -> Result<Attributes> {
        Ok(self.get())
    }

    fn set_attributes(&self, patch: AttributesPatch) -> Attributes {
        let mut attributes = self.attributes.lock().unwrap();
        attributes.merge(&patch);
        attributes.clone()
    }
}

#[derive(Clone, Default)]
pub struct RecordingSurface {
    updates: Arc<Mutex<Vec<(Characteristic, CharacteristicValue)>>>
}

impl RecordingSurface {
    pub fn updates(&self) -> Vec<(Characteristic, CharacteristicValue)> {
        self.updates.lock().unwrap().clone()
    }
}

impl ControlSurface for RecordingSurface {
    fn update_characteristic(&self, characteristic: Characteristic, value: CharacteristicValue) {
        self.updates.lock().unwrap().push((characteristic, value));
    }
}
