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

//! Error types for directory, link and relay operations.

use std::io;
use thiserror::Error;

/// Errors surfaced by the Bluetooth relay.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The Bluetooth stack refused access.
    #[error("Bluetooth permission denied")]
    PermissionDenied,

    /// No bonded device carries the requested name.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Opening the RFCOMM channel failed.
    #[error("Connection to {device} failed: {source}")]
    Connect {
        device: String,
        #[source]
        source: io::Error,
    },

    /// Writing a command to the open channel failed.
    #[error("Write failed: {0}")]
    Write(#[source] io::Error),

    /// No usable adapter or BlueZ session.
    #[error("Bluetooth adapter unavailable: {0}")]
    Adapter(#[source] io::Error),

    /// The relay worker is no longer running.
    #[error("Relay worker stopped")]
    WorkerGone,
}

impl RelayError {
    /// Build a connect error, folding permission failures into `PermissionDenied`.
    pub fn connect(device: impl Into<String>, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied;
        }
        Self::Connect {
            device: device.into(),
            source,
        }
    }

    /// Whether this error came from the permission boundary.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

impl From<bluer::Error> for RelayError {
    fn from(err: bluer::Error) -> Self {
        match err.kind {
            bluer::ErrorKind::NotPermitted | bluer::ErrorKind::NotAuthorized => {
                Self::PermissionDenied
            }
            _ => Self::Adapter(io::Error::other(err)),
        }
    }
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_folds_permission_errors() {
        let err = RelayError::connect(
            "HC-06",
            io::Error::new(io::ErrorKind::PermissionDenied, "EACCES"),
        );
        assert!(err.is_permission_denied());

        let err = RelayError::connect("HC-06", io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert!(matches!(err, RelayError::Connect { ref device, .. } if device == "HC-06"));
        assert_eq!(err.to_string(), "Connection to HC-06 failed: slow");
    }
}
