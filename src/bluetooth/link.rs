// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Serial link to a single LED controller.

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::directory::DeviceDirectory;
use super::protocol::Command;
use super::transport::{BoxedStream, PairedDevice};
use crate::error::{RelayError, Result};

/// Result of a send that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The command was written and flushed.
    Written,
    /// No connection is open; nothing was written.
    NotConnected,
}

/// An open RFCOMM channel to one device.
pub struct Connection {
    device: PairedDevice,
    stream: BoxedStream,
}

impl Connection {
    pub fn device(&self) -> &PairedDevice {
        &self.device
    }

    /// Write a command and flush it so the controller sees it immediately.
    pub async fn write_command(&mut self, command: &Command) -> Result<()> {
        self.stream
            .write_all(command.as_bytes())
            .await
            .map_err(RelayError::Write)?;
        self.stream.flush().await.map_err(RelayError::Write)?;
        Ok(())
    }

    /// Shut the channel down.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            warn!("Error closing channel to {}: {}", self.device.name, e);
        }
        info!("Disconnected from {}", self.device.name);
    }
}

/// Owns the device directory and at most one live connection.
pub struct SerialLink {
    directory: DeviceDirectory,
    active: Option<Connection>,
}

impl SerialLink {
    pub fn new(directory: DeviceDirectory) -> Self {
        Self {
            directory,
            active: None,
        }
    }

    pub fn directory(&self) -> &DeviceDirectory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut DeviceDirectory {
        &mut self.directory
    }

    /// The device of the active connection, if any.
    pub fn connected_device(&self) -> Option<&PairedDevice> {
        self.active.as_ref().map(Connection::device)
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Open a new connection to `name` without touching the active one.
    pub async fn open(&mut self, name: &str) -> Result<Connection> {
        let mut refreshed = false;
        if self.directory.snapshot().is_empty() {
            self.directory.list().await?;
            refreshed = true;
        }

        // A stale snapshot misses devices bonded since the last listing.
        if self.directory.find(name).is_none() && !refreshed {
            debug!("{} not in snapshot; refreshing", name);
            self.directory.list().await?;
        }

        let device = self
            .directory
            .find(name)
            .cloned()
            .ok_or_else(|| RelayError::DeviceNotFound(name.to_string()))?;

        let transport = self.directory.transport().clone();
        if let Err(e) = transport.cancel_discovery().await {
            debug!("Could not cancel discovery: {}", e);
        }

        info!("Connecting to {} ({}) over {}", device.name, device.address, transport.name());
        let stream = transport.open(&device).await?;

        Ok(Connection { device, stream })
    }

    /// Connect to `name`, replacing the active connection on success.
    ///
    /// The previous connection is closed only once the new one is open, so
    /// a failed connect leaves it in place.
    pub async fn connect(&mut self, name: &str) -> Result<&PairedDevice> {
        let connection = self.open(name).await?;
        if let Some(previous) = self.active.take() {
            debug!("Replacing connection to {}", previous.device.name);
            previous.close().await;
        }
        info!("Connected to {}", connection.device.name);
        Ok(self.active.insert(connection).device())
    }

    /// Send a command on the active connection.
    pub async fn send(&mut self, command: &Command) -> Result<SendOutcome> {
        let Some(connection) = self.active.as_mut() else {
            debug!("No connection; dropping {:?}", command.as_str());
            return Ok(SendOutcome::NotConnected);
        };

        connection.write_command(command).await?;
        debug!("Sent {:?} to {}", command.as_str(), connection.device.name);
        Ok(SendOutcome::Written)
    }

    /// Close the active connection, if any.
    pub async fn disconnect(&mut self) -> Option<PairedDevice> {
        let connection = self.active.take()?;
        let device = connection.device.clone();
        connection.close().await;
        Some(device)
    }
}
