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
    sync::mpsc::{RecvTimeoutError, Sender, channel},
    thread,
    time::Duration
};

/// A delayed callback running on its own thread. Calling `cancel()`, or
/// dropping the handle, stops the callback from running if the delay hasn't
/// elapsed yet.
#[derive(Debug)]
pub struct Delay {
    cancel: Sender<()>
}

impl Delay {
    pub fn start<F>(delay: Duration, elapsed: F) -> Self
        where F: FnOnce() + Send + 'static
    {
        let (cancel, receiver) = channel();

        thread::spawn(move || {
            // recv_timeout() returns Timeout when the delay elapsed, anything
            // else means the handle was cancelled or dropped
            if let Err(RecvTimeoutError::Timeout) = receiver.recv_timeout(delay) {
                elapsed();
            }
        });

        Self { cancel }
    }

    pub fn cancel(self) {
        // the timer thread may already be gone
        let _ = self.cancel.send(());
    }
}
