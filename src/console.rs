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

use std::{io::{self, BufRead}, thread::{self, JoinHandle}};

use anyhow::{Result, anyhow};
use log::info;

use crate::{
    characteristic::{Characteristic, CharacteristicValue, ControlSurface},
    events::{Event, EventSender}
};

pub const HELP: &str = "commands: on | off | brightness <0-100> | ct <mired> | get <on|brightness|ct> | quit";

/// Turn one console line into an event. Empty lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Event>> {
    let mut words = line.split_whitespace();

    let Some(cmd) = words.next() else {
        return Ok(None);
    };

    let event = match (cmd, words.next()) {
        ("on", None) => {
            Event::WriteCharacteristic(Characteristic::On, CharacteristicValue::Bool(true))
        }
        ("off", None) => {
            Event::WriteCharacteristic(Characteristic::On, CharacteristicValue::Bool(false))
        }
        ("brightness", Some(value)) => {
            Event::WriteCharacteristic(Characteristic::Brightness, CharacteristicValue::Int(value.parse()?))
        }
        ("ct", Some(value)) => {
            Event::WriteCharacteristic(Characteristic::ColorTemperature, CharacteristicValue::Int(value.parse()?))
        }
        ("get", Some(name)) => Event::ReadCharacteristic(parse_characteristic(name)?),
        ("quit", None) => Event::Quit,
        _ => return Err(anyhow!("Unrecognized command '{}', {HELP}", line.trim()))
    };

    if let Some(extra) = words.next() {
        return Err(anyhow!("Unexpected argument '{extra}', {HELP}"));
    }

    Ok(Some(event))
}

fn parse_characteristic(name: &str) -> Result<Characteristic> {
    Ok(match name {
        "on" => Characteristic::On,
        "brightness" => Characteristic::Brightness,
        "ct" => Characteristic::ColorTemperature,
        n => return Err(anyhow!("Unknown characteristic {n}"))
    })
}

/// Read commands from stdin until EOF or `quit`
pub fn start_console<S>(event_sender: S) -> JoinHandle<Result<()>>
    where S: EventSender + Send + 'static
{
    thread::spawn(move || {
        info!("{HELP}");

        for line in io::stdin().lock().lines() {
            match parse_command(&line?) {
                Ok(Some(event)) => {
                    let quit = event == Event::Quit;
                    event_sender.send_event(event)?;
                    if quit {
                        return Ok(());
                    }
                }
                Ok(None) => { }
                Err(e) => info!("{e}")
            }
        }

        event_sender.send_event(Event::Quit)
    })
}

/// Control surface that logs every characteristic update
pub struct ConsoleSurface;

impl ControlSurface for ConsoleSurface {
    fn update_characteristic(&self, characteristic: Characteristic, value: CharacteristicValue) {
        info!("{characteristic:?} = {value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_writes() {
        assert_eq!(
            parse_command("brightness 30").unwrap(),
            Some(Event::WriteCharacteristic(Characteristic::Brightness, CharacteristicValue::Int(30)))
        );
        assert_eq!(
            parse_command("  off ").unwrap(),
            Some(Event::WriteCharacteristic(Characteristic::On, CharacteristicValue::Bool(false)))
        );
        assert_eq!(
            parse_command("ct 250").unwrap(),
            Some(Event::WriteCharacteristic(Characteristic::ColorTemperature, CharacteristicValue::Int(250)))
        );
    }

    #[test]
    fn parse_reads_and_quit() {
        assert_eq!(parse_command("get ct").unwrap(), Some(Event::ReadCharacteristic(Characteristic::ColorTemperature)));
        assert_eq!(parse_command("quit").unwrap(), Some(Event::Quit));
        assert_eq!(parse_command("").unwrap(), None);
    }

    #[test]
    fn parse_errors() {
        assert!(parse_command("brightness").is_err());
        assert!(parse_command("brightness high").is_err());
        assert!(parse_command("on now").is_err());
        assert!(parse_command("get color").is_err());
        assert!(parse_command("dance").is_err());
    }
}
