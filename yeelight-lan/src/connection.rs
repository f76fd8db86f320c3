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
    io::{self, ErrorKind, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::Duration
};

use bytes::BufMut;
use log::trace;

use crate::{Command, DeviceMessage, Result, YeelightError};

pub struct YeelightConnection {
    stream: TcpStream
}

impl YeelightConnection {
    pub fn open(addr: &str, timeout: Duration) -> Result<Self> {
        let addr = addr.to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, format!("no address for {addr}")))?;

        let stream = TcpStream::connect_timeout(&addr, timeout)?;

        // Commands are tiny; don't let Nagle hold them back
        stream.set_nodelay(true)?;

        Ok(Self { stream })
    }

    /// Split into a writer for commands and a reader for replies and
    /// notifications, so each can live on its own thread.
    pub fn split(self) -> Result<(CommandWriter, MessageReader)> {
        let reader = MessageReader::new(self.stream.try_clone()?);
        Ok((CommandWriter { stream: self.stream }, reader))
    }
}

pub struct CommandWriter {
    stream: TcpStream
}

impl CommandWriter {
    pub fn send_command(&mut self, cmd: &Command) -> Result<()> {
        let data = cmd.to_bytes()?;
        trace!("Write {}", String::from_utf8_lossy(&data).trim_end());
        self.stream.write_all(&data)?;
        Ok(())
    }
}

pub struct MessageReader {
    stream: TcpStream,
    buffer: Vec<u8>
}

impl MessageReader {
    fn new(stream: TcpStream) -> Self {
        Self { stream, buffer: Vec::new() }
    }

    fn fill_buffer(&mut self) -> Result<usize> {
        let mut buf = vec![0; 512];
        let len = match self.stream.read(&mut buf) {
            Ok(0) => return Err(YeelightError::ConnectionClosed),
            Ok(len) => len,
            Err(e) if e.kind() == ErrorKind::Interrupted => 0,
            Err(e) => return Err(e.into())
        };
        self.buffer.put(&buf[..len]);
        trace!("Read {:?}", String::from_utf8_lossy(&buf[..len]));
        Ok(len)
    }

    /// Block until the next complete message arrives.
    pub fn read_message(&mut self) -> Result<DeviceMessage> {
        loop {
            match DeviceMessage::parse(&self.buffer) {
                Ok(Some((len, message))) => {
                    self.buffer.drain(..len);
                    if let Some(message) = message {
                        return Ok(message);
                    }
                }
                Ok(None) => {
                    // buffer doesn't contain a full line, read and try again
                    self.fill_buffer()?;
                }
                Err(e) => {
                    // drop the offending line so the stream can recover
                    if let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
                        self.buffer.drain(..=end);
                    }
                    return Err(e);
                }
            }
        }
    }
}
