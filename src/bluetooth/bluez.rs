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

//! BlueZ transport using RFCOMM client sockets.

use async_trait::async_trait;
use bluer::rfcomm::{Profile, ProfileHandle, Role, SocketAddr, Stream};
use bluer::{Adapter, Address, Session};
use futures::StreamExt;
use std::io;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::protocol::SPP_UUID;
use super::transport::{BoxedStream, PairedDevice, Transport};
use crate::config::BluetoothConfig;
use crate::error::{RelayError, Result};

/// Map a BlueZ error to an I/O error, keeping permission failures recognizable.
fn io_err(err: bluer::Error) -> io::Error {
    match err.kind {
        bluer::ErrorKind::NotPermitted | bluer::ErrorKind::NotAuthorized => {
            io::Error::new(io::ErrorKind::PermissionDenied, err)
        }
        _ => io::Error::other(err),
    }
}

/// Keep the paired devices, skipping any whose properties could not be read.
fn collect_paired<A, E>(
    entries: Vec<(A, std::result::Result<Option<PairedDevice>, E>)>,
) -> Vec<PairedDevice>
where
    A: std::fmt::Display,
    E: std::fmt::Display,
{
    entries
        .into_iter()
        .filter_map(|(addr, entry)| match entry {
            Ok(device) => device,
            Err(e) => {
                debug!("Skipping device {}: {}", addr, e);
                None
            }
        })
        .collect()
}

/// Bluetooth transport backed by the system BlueZ daemon.
pub struct BluezTransport {
    session: Session,
    adapter: Adapter,
    channel: Option<u8>,
    connect_timeout: Duration,
    profile: Mutex<Option<ProfileHandle>>,
}

impl BluezTransport {
    /// Open a BlueZ session and select the configured adapter.
    pub async fn new(config: &BluetoothConfig) -> Result<Self> {
        info!("Initializing Bluetooth transport...");

        // Create BlueZ session
        let session = Session::new().await?;
        info!("BlueZ session created");

        let adapter = match &config.adapter {
            Some(name) => session.adapter(name)?,
            None => session.default_adapter().await?,
        };
        info!("Using Bluetooth adapter: {}", adapter.name());

        if !adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            adapter.set_powered(true).await?;
        }

        Ok(Self {
            session,
            adapter,
            channel: config.channel,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            profile: Mutex::new(None),
        })
    }

    /// Connect through a BlueZ client profile for the SPP UUID.
    ///
    /// BlueZ resolves the RFCOMM channel via SDP and hands the connected
    /// socket back through the profile handle.
    async fn open_profile(&self, addr: Address) -> io::Result<Stream> {
        let device = self.adapter.device(addr).map_err(io_err)?;

        let mut guard = self.profile.lock().await;
        if guard.is_none() {
            let profile = Profile {
                uuid: SPP_UUID,
                role: Some(Role::Client),
                require_authentication: Some(false),
                require_authorization: Some(false),
                auto_connect: Some(false),
                ..Default::default()
            };
            let handle = self.session.register_profile(profile).await.map_err(io_err)?;
            info!("SPP client profile registered (UUID: {})", SPP_UUID);
            *guard = Some(handle);
        }
        let handle = guard
            .as_mut()
            .ok_or_else(|| io::Error::other("SPP profile not registered"))?;

        let connect = device.connect_profile(&SPP_UUID);
        tokio::pin!(connect);
        let mut profile_connected = false;

        let request = loop {
            tokio::select! {
                res = &mut connect, if !profile_connected => {
                    res.map_err(io_err)?;
                    profile_connected = true;
                }
                req = handle.next() => match req {
                    Some(req) if req.device() == addr => break req,
                    Some(req) => {
                        // Dropping the request rejects it.
                        debug!("Ignoring profile connection from {}", req.device());
                    }
                    None => return Err(io::Error::other("SPP profile handle closed")),
                },
            }
        };

        request.accept().map_err(io_err)
    }

    /// Read one device, `None` when it is known but not bonded.
    async fn paired_device(&self, addr: Address) -> bluer::Result<Option<PairedDevice>> {
        let device = self.adapter.device(addr)?;
        if !device.is_paired().await? {
            return Ok(None);
        }
        let name = device.alias().await.unwrap_or_else(|_| addr.to_string());
        Ok(Some(PairedDevice {
            name,
            address: addr.to_string(),
        }))
    }

    /// Connect straight to a known RFCOMM channel at low security.
    async fn open_channel(addr: Address, channel: u8) -> io::Result<Stream> {
        Stream::connect(SocketAddr::new(addr, channel)).await
    }
}

#[async_trait]
impl Transport for BluezTransport {
    async fn paired_devices(&self) -> Result<Vec<PairedDevice>> {
        let mut entries = Vec::new();
        for addr in self.adapter.device_addresses().await? {
            entries.push((addr, self.paired_device(addr).await));
        }

        Ok(collect_paired(entries))
    }

    async fn cancel_discovery(&self) -> Result<()> {
        // BlueZ scopes discovery to the D-Bus client that started it and this
        // process never starts one, so all we can do is report a foreign scan.
        if self.adapter.is_discovering().await? {
            warn!("Adapter is discovering; connect may be slow until the scan ends");
        }
        Ok(())
    }

    async fn open(&self, device: &PairedDevice) -> Result<BoxedStream> {
        let addr: Address = device.address.parse().map_err(|_| {
            RelayError::connect(
                &device.name,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid address {}", device.address),
                ),
            )
        })?;

        let open = async {
            match self.channel {
                Some(channel) => {
                    debug!("Connecting to {} on RFCOMM channel {}", addr, channel);
                    BluezTransport::open_channel(addr, channel).await
                }
                None => {
                    debug!("Connecting to {} via SPP profile", addr);
                    self.open_profile(addr).await
                }
            }
        };

        let stream = match tokio::time::timeout(self.connect_timeout, open).await {
            Ok(result) => result.map_err(|e| RelayError::connect(&device.name, e))?,
            Err(_) => {
                return Err(RelayError::connect(
                    &device.name,
                    io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
                ))
            }
        };

        info!("RFCOMM channel open to {} ({})", device.name, addr);
        Ok(Box::new(stream))
    }

    fn name(&self) -> &'static str {
        "BlueZ"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paired(name: &str, address: &str) -> Option<PairedDevice> {
        Some(PairedDevice {
            name: name.to_string(),
            address: address.to_string(),
        })
    }

    #[test]
    fn test_failing_device_is_skipped() {
        let entries = vec![
            ("98:D3:31:F5:1A:2B", Ok(paired("HC-06", "98:D3:31:F5:1A:2B"))),
            (
                "00:11:22:33:44:55",
                Err(io::Error::other("device removed while listing")),
            ),
            ("66:77:88:99:AA:BB", Ok(None)),
            ("AA:BB:CC:DD:EE:FF", Ok(paired("Desk Strip", "AA:BB:CC:DD:EE:FF"))),
        ];

        let names: Vec<String> = collect_paired(entries).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["HC-06", "Desk Strip"]);
    }
}
