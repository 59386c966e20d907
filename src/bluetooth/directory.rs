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

//! Directory of bonded devices.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::transport::{PairedDevice, Transport};
use crate::error::{RelayError, Result};

/// Snapshot of the bonded devices, keyed by display name.
pub struct DeviceDirectory {
    transport: Arc<dyn Transport>,
    snapshot: Vec<PairedDevice>,
}

impl DeviceDirectory {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            snapshot: Vec::new(),
        }
    }

    /// Refresh the snapshot from the Bluetooth stack.
    ///
    /// On a permission failure the snapshot is emptied and
    /// `PermissionDenied` is returned.
    pub async fn list(&mut self) -> Result<Vec<PairedDevice>> {
        match self.transport.paired_devices().await {
            Ok(devices) => {
                info!("Found {} paired device(s)", devices.len());
                self.snapshot = devices;
                Ok(self.snapshot.clone())
            }
            Err(RelayError::PermissionDenied) => {
                warn!("Bluetooth permission not granted");
                self.snapshot.clear();
                Err(RelayError::PermissionDenied)
            }
            Err(e) => Err(e),
        }
    }

    /// Devices from the last successful listing.
    pub fn snapshot(&self) -> &[PairedDevice] {
        &self.snapshot
    }

    /// Look up a device by display name in the current snapshot.
    pub fn find(&self, name: &str) -> Option<&PairedDevice> {
        let found = self.snapshot.iter().find(|d| d.name == name);
        if found.is_none() {
            debug!("'{}' not in snapshot of {} device(s)", name, self.snapshot.len());
        }
        found
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::LoopbackTransport;

    #[tokio::test]
    async fn test_list_and_find() {
        let transport = LoopbackTransport::new()
            .with_device("HC-06", "98:D3:31:F5:2A:10")
            .with_device("Desk Strip", "00:21:13:00:8E:4C");
        let mut directory = DeviceDirectory::new(Arc::new(transport));

        assert!(directory.find("HC-06").is_none());

        let devices = directory.list().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(directory.find("HC-06").unwrap().address, "98:D3:31:F5:2A:10");
        assert!(directory.find("hc-06").is_none());
    }

    #[tokio::test]
    async fn test_permission_denied_empties_snapshot() {
        let transport = LoopbackTransport::new().with_device("HC-06", "98:D3:31:F5:2A:10");
        let mut directory = DeviceDirectory::new(Arc::new(transport.clone()));
        directory.list().await.unwrap();
        assert_eq!(directory.snapshot().len(), 1);

        transport.set_permission_denied(true);
        let err = directory.list().await.unwrap_err();
        assert!(err.is_permission_denied());
        assert!(directory.snapshot().is_empty());
    }
}
