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

use std::sync::mpsc::{Receiver, Sender, channel};

use anyhow::Result;

use crate::{
    attributes::AttributesPatch,
    characteristic::{Characteristic, CharacteristicValue}
};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// State change pushed by the lamp
    DeviceProps(AttributesPatch),
    /// Control surface wants a characteristic value
    ReadCharacteristic(Characteristic),
    /// Control surface set a characteristic
    WriteCharacteristic(Characteristic, CharacteristicValue),
    Quit
}

pub trait EventSender {
    fn send_event(&self, event: Event) -> Result<()>;
}

pub trait EventHandler {
    fn handle_event(&mut self, event: &Event) -> Result<()>;
}

pub trait EventSource<S: EventSender> {
    fn wait_event(&mut self) -> Result<Event>;
    fn event_sender(&self) -> S;
}

pub struct DefaultEventSource {
    sender: Sender<Event>,
    receiver: Receiver<Event>
}

impl DefaultEventSource {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self { sender, receiver }
    }
}

impl Default for DefaultEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource<Sender<Event>> for DefaultEventSource {
    fn wait_event(&mut self) -> Result<Event> {
        Ok(self.receiver.recv()?)
    }

    fn event_sender(&self) -> Sender<Event> {
        self.sender.clone()
    }
}

impl EventSender for Sender<Event> {
    fn send_event(&self, event: Event) -> Result<()> {
        Ok(self.send(event)?)
    }
}
