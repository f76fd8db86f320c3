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

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU32, Ordering},
        mpsc::{Sender, channel}
    },
    thread::{self, JoinHandle},
    time::Duration
};

use anyhow::{Result, anyhow};
use log::{error, info, warn};
use serde_json::{Value, json};
use yeelight_lan::{Command, CommandWriter, DeviceError, DeviceMessage, MessageReader, YeelightConnection};

use crate::{
    attributes::AttributesPatch,
    config::{DeviceConfig, TimingConfig},
    device::{CommandChannel, PropertySource},
    events::{Event, EventSender}
};

type Reply = std::result::Result<Vec<Value>, DeviceError>;
type Waiting = Arc<Mutex<HashMap<u32, Sender<Reply>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lamp reachable over the LAN control protocol. Replies are matched to
/// requests by id on a reader thread, which also forwards `props`
/// notifications as events.
pub struct LanDevice {
    writer: Mutex<CommandWriter>,
    waiting: Waiting,
    next_id: AtomicU32,
    command_timeout: Duration,
    transition: Duration,
    _reader_thread: JoinHandle<()>
}

impl LanDevice {
    pub fn connect<S>(config: &DeviceConfig, timing: &TimingConfig, event_sender: S) -> Result<Self>
        where S: EventSender + Send + 'static
    {
        info!("Connect to {} at {}", config.name, config.address);

        let connection = YeelightConnection::open(&config.address, timing.command_timeout)?;
        let (writer, reader) = connection.split()?;

        let waiting: Waiting = Arc::new(Mutex::new(HashMap::new()));
        let reader_waiting = Arc::clone(&waiting);

        let reader_thread = thread::spawn(move || {
            if let Err(e) = read_messages(reader, &reader_waiting, &event_sender) {
                error!("Device reader stopped: {e:#}");
            }
            // fail anything still waiting instead of letting it time out
            lock(&reader_waiting).clear();
        });

        Ok(Self {
            writer: Mutex::new(writer),
            waiting,
            next_id: AtomicU32::new(1),
            command_timeout: timing.command_timeout,
            transition: timing.transition,
            _reader_thread: reader_thread
        })
    }

    fn request(&self, method: &str, params: Vec<Value>) -> Result<Vec<Value>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = channel();

        // register before sending so a fast reply can't be missed
        lock(&self.waiting).insert(id, sender);

        let cmd = Command::new(id, method, params);
        if let Err(e) = lock(&self.writer).send_command(&cmd) {
            lock(&self.waiting).remove(&id);
            return Err(e.into());
        }

        match receiver.recv_timeout(self.command_timeout) {
            Ok(reply) => Ok(reply?),
            Err(_) => {
                lock(&self.waiting).remove(&id);
                Err(anyhow!("No reply to {method} (id {id})"))
            }
        }
    }
}

fn read_messages<S: EventSender>(mut reader: MessageReader, waiting: &Waiting, event_sender: &S) -> Result<()> {
    loop {
        match reader.read_message() {
            Ok(DeviceMessage::Result { id, result }) => reply(waiting, id, Ok(result)),
            Ok(DeviceMessage::Error { id, error }) => reply(waiting, id, Err(error)),
            Ok(DeviceMessage::Props(props)) => {
                let patch = AttributesPatch::from_props(&props);
                if !patch.is_empty() {
                    event_sender.send_event(Event::DeviceProps(patch))?;
                }
            }
            Err(yeelight_lan::YeelightError::InvalidMessage(e)) => {
                warn!("Skip invalid message from device: {e}");
            }
            Err(yeelight_lan::YeelightError::JsonError(e)) => {
                warn!("Skip malformed message from device: {e}");
            }
            Err(e) => return Err(e.into())
        }
    }
}

fn reply(waiting: &Waiting, id: u32, reply: Reply) {
    match lock(waiting).remove(&id) {
        // requester may have timed out already
        Some(sender) => { let _ = sender.send(reply); }
        None => warn!("Reply for unknown request id {id}")
    }
}

impl CommandChannel for LanDevice {
    fn send_command(&self, method: &str, params: Vec<Value>) -> Result<()> {
        self.request(method, params)?;
        Ok(())
    }

    fn send_animated_command(&self, method: &str, value: Value) -> Result<()> {
        let duration = u64::try_from(self.transition.as_millis())?;
        self.request(method, vec![value, json!("smooth"), json!(duration)])?;
        Ok(())
    }
}

impl PropertySource for LanDevice {
    fn get_props(&self, names: &[&str]) -> Result<Vec<String>> {
        let params = names.iter().map(|name| json!(name)).collect();
        let result = self.request("get_prop", params)?;

        result.into_iter()
            .map(|value| match value {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                v => Err(anyhow!("Unexpected get_prop value {v}"))
            })
            .collect()
    }
}
