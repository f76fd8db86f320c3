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
use argh::FromArgs;
use log::{LevelFilter, error, info};

use relight::{
    attributes::AttributeCache,
    config::Config,
    console::{ConsoleSurface, start_console},
    default_saver::DefaultSaver,
    device::{LanDevice, LightDevice, SimulatedDevice},
    events::{DefaultEventSource, Event, EventHandler, EventSource},
    light::LightAccessory
};

#[derive(FromArgs)]
/// Drive a Yeelight lamp from the console with ordered power and brightness writes
struct Args {
    /// path to config file
    #[argh(option, short = 'c')]
    config: Option<String>,

    /// use an in-memory lamp instead of connecting to one
    #[argh(switch)]
    simulate: bool,

    /// log to syslog instead of stderr
    #[argh(switch)]
    syslog: bool
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    init_logging(args.syslog)?;

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default()
    };

    let event_source = DefaultEventSource::new();

    if args.simulate {
        let device = SimulatedDevice::new(event_source.event_sender());
        run(Arc::new(device), &config, event_source)
    } else {
        let device = LanDevice::connect(&config.device, &config.timing, event_source.event_sender())?;
        run(Arc::new(device), &config, event_source)
    }
}

fn init_logging(syslog: bool) -> Result<()> {
    if syslog {
        syslog::init(syslog::Facility::LOG_DAEMON, LevelFilter::Info, Some("relight"))
            .map_err(|e| anyhow!("Unable to connect to syslog: {e}"))?;
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    Ok(())
}

fn run<D: LightDevice + 'static>(device: Arc<D>, config: &Config, mut event_source: DefaultEventSource) -> Result<()> {
    let store = AttributeCache::new(Arc::clone(&device), config.timing.attribute_max_age);

    let default_saver = DefaultSaver::new(
        config.light.save_default,
        config.timing.default_save_delay,
        Arc::clone(&device)
    );

    let mut light = LightAccessory::new(
        &config.light,
        config.timing.power_timing(),
        device,
        store,
        default_saver,
        ConsoleSurface
    );

    for info in light.characteristics() {
        info!("Register {:?} bounds {:?}", info.characteristic, info.bounds);
    }

    light.refresh()?;

    start_console(event_source.event_sender());

    loop {
        let event = event_source.wait_event()?;
        if matches!(event, Event::Quit) {
            break;
        }

        // a failed write is rejected back to the surface, the loop carries on
        if let Err(e) = light.handle_event(&event) {
            error!("{event:?} failed: {e:#}");
        }
    }

    info!("Shutting down");
    Ok(())
}
