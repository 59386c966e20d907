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

//! Application state management.

use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::color::Color;

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Error => "Error",
        }
    }
}

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Current connection status.
    pub connection_status: RwLock<ConnectionStatus>,

    /// Connected device name.
    pub connected_device: RwLock<Option<String>>,

    /// Last color the controller accepted, and when.
    pub last_sent: RwLock<Option<(Color, DateTime<Local>)>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            connection_status: RwLock::new(ConnectionStatus::Disconnected),
            connected_device: RwLock::new(None),
            last_sent: RwLock::new(None),
        }
    }
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_connected(&self, device_name: String) {
        *self.connection_status.write() = ConnectionStatus::Connected;
        *self.connected_device.write() = Some(device_name);
    }

    pub fn set_disconnected(&self) {
        *self.connection_status.write() = ConnectionStatus::Disconnected;
        *self.connected_device.write() = None;
    }

    /// Mark a failure. An open connection stays usable, so only the status changes.
    pub fn set_error(&self) {
        *self.connection_status.write() = ConnectionStatus::Error;
    }

    pub fn get_status(&self) -> ConnectionStatus {
        *self.connection_status.read()
    }

    pub fn get_device_name(&self) -> Option<String> {
        self.connected_device.read().clone()
    }

    pub fn set_last_sent(&self, color: Color) {
        *self.last_sent.write() = Some((color, Local::now()));
    }

    pub fn get_last_sent(&self) -> Option<(Color, DateTime<Local>)> {
        *self.last_sent.read()
    }

    /// One-line summary for the console.
    pub fn summary(&self) -> String {
        let device = self
            .get_device_name()
            .map(|d| format!(" to {}", d))
            .unwrap_or_default();
        let last = match self.get_last_sent() {
            Some((color, at)) => format!(", last color {} at {}", color, at.format("%H:%M:%S")),
            None => String::new(),
        };
        format!("{}{}{}", self.get_status().as_str(), device, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        let state = AppState::new();
        assert_eq!(state.get_status(), ConnectionStatus::Disconnected);
        assert_eq!(state.summary(), "Disconnected");

        state.set_connected("HC-06".to_string());
        assert_eq!(state.get_device_name().as_deref(), Some("HC-06"));
        assert_eq!(state.summary(), "Connected to HC-06");

        state.set_last_sent(Color::new(255, 0, 0));
        assert!(state.summary().starts_with("Connected to HC-06, last color #FF0000 at "));

        state.set_disconnected();
        assert_eq!(state.get_status(), ConnectionStatus::Disconnected);
        assert!(state.get_device_name().is_none());
    }
}
