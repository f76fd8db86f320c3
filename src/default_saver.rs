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

use std::{sync::Arc, time::Duration};

use debounce::EventDebouncer;
use log::{info, warn};

use crate::device::CommandChannel;

#[derive(Debug, PartialEq)]
struct SaveDefault;

/// Persists the lamp's current state as its power-on default. Bursts of
/// requests collapse into one `set_default` command sent after `delay`.
pub struct DefaultSaver {
    debouncer: Option<EventDebouncer<SaveDefault>>
}

impl DefaultSaver {
    pub fn new<C>(enabled: bool, delay: Duration, channel: Arc<C>) -> Self
        where C: CommandChannel + 'static
    {
        let debouncer = enabled.then(|| {
            EventDebouncer::new(delay, move |_: SaveDefault| {
                info!("Save current state as default");
                if let Err(e) = channel.send_command("set_default", vec![]) {
                    warn!("Save default failed: {e:#}");
                }
            })
        });

        Self { debouncer }
    }

    /// Saver that never sends anything
    pub fn disabled() -> Self {
        Self { debouncer: None }
    }

    pub fn save_default_if_needed(&self) {
        if let Some(debouncer) = &self.debouncer {
            debouncer.put(SaveDefault);
        }
    }
}
