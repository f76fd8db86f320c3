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
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration
};

use anyhow::Result;
use log::{debug, warn};
use serde_json::json;

use crate::{
    attributes::{ActiveMode, ColorMode},
    device::CommandChannel,
    power_mode::{PowerMode, PowerModeState},
    timer::Delay
};

/// Transition used when powering off through `set_power`
pub const POWER_OFF_TRANSITION_MS: u64 = 500;

#[derive(Debug, Clone, Copy)]
pub struct PowerTiming {
    /// How long a power request waits for a newer one before it's sent
    pub debounce: Duration,
    /// How long after an override power on debounced requests are dropped
    pub settle: Duration
}

impl Default for PowerTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            settle: Duration::from_millis(1000)
        }
    }
}

/// Debounced power request waiting for its delay. `target` of `None` is
/// power off.
struct PendingPower {
    generation: u64,
    target: Option<PowerMode>,
    delay: Delay
}

struct SuppressionWindow {
    generation: u64,
    _delay: Delay
}

#[derive(Default)]
struct DispatchState {
    generation: u64,
    mode: PowerModeState,
    pending: Option<PendingPower>,
    suppression: Option<SuppressionWindow>
}

impl DispatchState {
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn cancel_pending(&mut self) -> Option<Option<PowerMode>> {
        self.pending.take().map(|pending| {
            pending.delay.cancel();
            pending.target
        })
    }
}

fn lock(state: &Mutex<DispatchState>) -> MutexGuard<'_, DispatchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn send_power<C: CommandChannel + ?Sized>(channel: &C, target: Option<PowerMode>) -> Result<()> {
    match target {
        Some(mode) => channel.send_command(
            "set_power",
            vec![json!("on"), json!("sudden"), json!(0), json!(mode.device_mode())]
        ),
        None => channel.send_command(
            "set_power",
            vec![json!("off"), json!("smooth"), json!(POWER_OFF_TRANSITION_MS)]
        )
    }
}

/// Coalesces bursts of power requests for one lamp into a single command,
/// and lets callers force an immediate power change when ordering matters.
///
/// At most one debounced request is pending at a time; a newer request
/// replaces it. An override cancels the pending request, sends right away,
/// and (when powering on) opens a settle window that drops trailing
/// debounced requests.
pub struct PowerDispatcher<C> {
    channel: Arc<C>,
    timing: PowerTiming,
    state: Arc<Mutex<DispatchState>>
}

impl<C: CommandChannel + 'static> PowerDispatcher<C> {
    pub fn new(channel: Arc<C>, timing: PowerTiming) -> Self {
        Self {
            channel,
            timing,
            state: Arc::new(Mutex::new(DispatchState::default()))
        }
    }

    /// Mode the lamp is believed to be in
    pub fn mode(&self) -> Option<PowerMode> {
        lock(&self.state).mode.current()
    }

    /// Mode to use for a plain power on
    pub fn last_mode_or_default(&self) -> PowerMode {
        lock(&self.state).mode.last_or_default()
    }

    /// Replace the mode with one derived from lamp reported attributes
    pub fn observe_mode(&self, color_mode: ColorMode, active_mode: ActiveMode) {
        lock(&self.state).mode.observe(color_mode, active_mode);
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    pub fn is_suppressed(&self) -> bool {
        lock(&self.state).suppression.is_some()
    }

    /// Request power on in `target` mode, or off for `None`, after the
    /// debounce delay. Failures of the eventual command are only logged.
    pub fn schedule_power(&self, target: Option<PowerMode>) {
        let mut state = lock(&self.state);

        if let Some(replaced) = state.cancel_pending() {
            debug!("Replace pending power request {replaced:?} with {target:?}");
        }

        if state.suppression.is_some() {
            debug!("Drop power request {target:?} during override settle window");
            return;
        }

        let generation = state.next_generation();
        let shared = Arc::clone(&self.state);
        let channel = Arc::clone(&self.channel);

        let delay = Delay::start(self.timing.debounce, move || {
            let target = {
                let mut state = lock(&shared);
                match state.pending.take_if(|p| p.generation == generation) {
                    Some(pending) => pending.target,
                    // cancelled while the timer was waking
                    None => return
                }
            };

            debug!("Send debounced power request {target:?}");
            match send_power(&*channel, target) {
                Ok(()) => {
                    if let Some(mode) = target {
                        lock(&shared).mode.force(mode);
                    }
                }
                Err(e) => warn!("Debounced power request {target:?} failed: {e:#}")
            }
        });

        state.pending = Some(PendingPower { generation, target, delay });
    }

    /// Cancel any pending request and send power on in `target` mode, or off
    /// for `None`, right away. Ignores the settle window.
    pub fn override_power(&self, target: Option<PowerMode>) -> Result<()> {
        if let Some(cancelled) = lock(&self.state).cancel_pending() {
            debug!("Override cancelled pending power request {cancelled:?}");
        }

        debug!("Send override power request {target:?}");
        send_power(&*self.channel, target)?;

        if let Some(mode) = target {
            let mut state = lock(&self.state);
            state.mode.force(mode);
            self.open_settle_window(&mut state);
        }

        Ok(())
    }

    fn open_settle_window(&self, state: &mut DispatchState) {
        let generation = state.next_generation();
        let shared = Arc::clone(&self.state);

        let delay = Delay::start(self.timing.settle, move || {
            let mut state = lock(&shared);
            if state.suppression.as_ref().is_some_and(|s| s.generation == generation) {
                state.suppression = None;
            }
        });

        // replacing an open window cancels its timer
        state.suppression = Some(SuppressionWindow { generation, _delay: delay });
    }
}
