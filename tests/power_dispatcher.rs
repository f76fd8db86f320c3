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

mod common;

use std::{sync::Arc, thread, time::Duration};

use relight::{
    attributes::{ActiveMode, ColorMode},
    dispatcher::{PowerDispatcher, PowerTiming},
    power_mode::PowerMode
};

use common::{RecordingChannel, Sent};

const DEBOUNCE: Duration = Duration::from_millis(100);
const SETTLE: Duration = Duration::from_millis(300);

fn dispatcher() -> (PowerDispatcher<RecordingChannel>, Arc<RecordingChannel>) {
    let channel = Arc::new(RecordingChannel::default());
    let timing = PowerTiming { debounce: DEBOUNCE, settle: SETTLE };
    (PowerDispatcher::new(Arc::clone(&channel), timing), channel)
}

fn wait(duration: Duration) {
    thread::sleep(duration);
}

#[test]
fn nothing_sent_before_debounce_delay() {
    let (dispatcher, channel) = dispatcher();

    dispatcher.schedule_power(Some(PowerMode::Ct));
    assert!(dispatcher.has_pending());
    assert!(channel.sent().is_empty());

    wait(DEBOUNCE * 3);
    assert_eq!(channel.sent(), vec![Sent::power_on(1)]);
    assert!(!dispatcher.has_pending());
    assert_eq!(dispatcher.mode(), Some(PowerMode::Ct));
}

#[test]
fn latest_scheduled_request_wins() {
    let (dispatcher, channel) = dispatcher();

    dispatcher.schedule_power(Some(PowerMode::Ct));
    dispatcher.schedule_power(Some(PowerMode::NightLight));

    wait(DEBOUNCE * 3);
    assert_eq!(channel.sent(), vec![Sent::power_on(5)]);
    assert_eq!(dispatcher.mode(), Some(PowerMode::NightLight));
}

#[test]
fn scheduled_power_off_keeps_mode() {
    let (dispatcher, channel) = dispatcher();
    dispatcher.observe_mode(ColorMode::Ct, ActiveMode::Night);

    dispatcher.schedule_power(None);

    wait(DEBOUNCE * 3);
    assert_eq!(channel.sent(), vec![Sent::power_off()]);
    assert_eq!(dispatcher.mode(), Some(PowerMode::NightLight));
}

#[test]
fn override_cancels_pending_request() {
    let (dispatcher, channel) = dispatcher();

    dispatcher.schedule_power(None);
    dispatcher.override_power(Some(PowerMode::Ct)).unwrap();

    assert!(!dispatcher.has_pending());
    assert_eq!(channel.sent(), vec![Sent::power_on(1)]);

    // the cancelled power off must never fire
    wait(DEBOUNCE * 3);
    assert_eq!(channel.sent(), vec![Sent::power_on(1)]);
}

#[test]
fn settle_window_drops_then_allows_scheduled_requests() {
    let (dispatcher, channel) = dispatcher();

    dispatcher.override_power(Some(PowerMode::NightLight)).unwrap();
    assert!(dispatcher.is_suppressed());

    dispatcher.schedule_power(None);
    assert!(!dispatcher.has_pending());

    wait(DEBOUNCE * 2);
    assert_eq!(channel.sent(), vec![Sent::power_on(5)]);

    wait(SETTLE);
    assert!(!dispatcher.is_suppressed());

    dispatcher.schedule_power(None);
    assert!(dispatcher.has_pending());

    wait(DEBOUNCE * 3);
    assert_eq!(channel.sent(), vec![Sent::power_on(5), Sent::power_off()]);
}

#[test]
fn override_ignores_settle_window() {
    let (dispatcher, channel) = dispatcher();

    dispatcher.override_power(Some(PowerMode::Ct)).unwrap();
    dispatcher.override_power(None).unwrap();

    assert_eq!(channel.sent(), vec![Sent::power_on(1), Sent::power_off()]);
}

#[test]
fn override_power_off_opens_no_window() {
    let (dispatcher, channel) = dispatcher();

    dispatcher.override_power(None).unwrap();
    assert!(!dispatcher.is_suppressed());

    dispatcher.schedule_power(Some(PowerMode::Ct));
    wait(DEBOUNCE * 3);
    assert_eq!(channel.sent(), vec![Sent::power_off(), Sent::power_on(1)]);
}

#[test]
fn override_failure_is_returned() {
    let (dispatcher, channel) = dispatcher();
    channel.set_failing(true);

    assert!(dispatcher.override_power(Some(PowerMode::NightLight)).is_err());
    assert_eq!(dispatcher.mode(), None);
    assert!(!dispatcher.is_suppressed());
}

#[test]
fn scheduled_failure_is_not_observed() {
    let (dispatcher, channel) = dispatcher();
    channel.set_failing(true);

    dispatcher.schedule_power(Some(PowerMode::NightLight));
    wait(DEBOUNCE * 3);

    assert!(!dispatcher.has_pending());
    assert_eq!(dispatcher.mode(), None);
}

#[test]
fn observed_mode_overwrites_forced_mode() {
    let (dispatcher, _channel) = dispatcher();

    dispatcher.override_power(Some(PowerMode::NightLight)).unwrap();
    dispatcher.observe_mode(ColorMode::Ct, ActiveMode::Normal);

    assert_eq!(dispatcher.mode(), Some(PowerMode::Ct));
    assert_eq!(dispatcher.last_mode_or_default(), PowerMode::Ct);
}
