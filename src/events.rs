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

//! Event processing and user notices.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::relay::RelayEvent;
use crate::state::AppState;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A short message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Turns relay events into state updates and notices.
pub struct EventProcessor {
    state: Arc<AppState>,
}

impl EventProcessor {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Process a single event.
    ///
    /// Returns the notice to show, if the event warrants one.
    pub fn process_event(&mut self, event: RelayEvent) -> Option<Notice> {
        match event {
            RelayEvent::DevicesListed(devices) => {
                debug!("{} device(s) listed", devices.len());
                None
            }
            RelayEvent::ListFailed { error } => {
                error!("Listing devices failed: {}", error);
                Some(Notice::error(format!("Could not list devices: {}", error)))
            }
            RelayEvent::Connected { device_name } => {
                info!("Device connected: {}", device_name);
                self.state.set_connected(device_name.clone());
                Some(Notice::info(format!("Connected to {}", device_name)))
            }
            RelayEvent::ConnectFailed { device_name, error } => {
                error!("Connection to {} failed: {}", device_name, error);
                if self.state.get_device_name().is_none() {
                    self.state.set_error();
                }
                Some(Notice::error(format!("Connection failed: {}", error)))
            }
            RelayEvent::Disconnected { device_name } => {
                info!("Device disconnected: {}", device_name);
                self.state.set_disconnected();
                Some(Notice::info(format!("Disconnected from {}", device_name)))
            }
            RelayEvent::Sent(color) => {
                debug!("Color {} delivered", color);
                self.state.set_last_sent(color);
                None
            }
            RelayEvent::SendFailed { color, error } => {
                error!("Sending {} failed: {}", color, error);
                self.state.set_error();
                Some(Notice::error(format!("Send failed: {}", error)))
            }
            RelayEvent::PermissionDenied => {
                warn!("Bluetooth permission denied");
                self.state.set_error();
                Some(Notice::error("Bluetooth permission not granted"))
            }
        }
    }
}
