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

//! In-memory transport.
//!
//! Backs `--dry-run` and the test suite: every opened channel records the
//! bytes written to it, how often it was flushed and whether it was shut down.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;
use tracing::info;

use super::transport::{BoxedStream, PairedDevice, Transport};
use crate::error::{RelayError, Result};

/// What happened on one opened channel.
#[derive(Debug, Default)]
pub struct ChannelRecord {
    pub device: String,
    pub written: Vec<u8>,
    /// Bytes covered by the most recent flush.
    pub flushed: usize,
    pub flushes: usize,
    pub shut_down: bool,
}

impl ChannelRecord {
    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }
}

#[derive(Debug, Default)]
struct Inner {
    devices: Vec<PairedDevice>,
    permission_denied: bool,
    refuse: Vec<String>,
    fail_writes: bool,
    discovery_cancels: usize,
    channels: Vec<Arc<Mutex<ChannelRecord>>>,
}

/// Transport that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct LoopbackTransport {
    inner: Arc<Mutex<Inner>>,
    echo: bool,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log every line written, for dry runs.
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Register a bonded device.
    pub fn with_device(self, name: &str, address: &str) -> Self {
        self.add_device(name, address);
        self
    }

    /// Bond a device after construction. Names already known are ignored.
    pub fn add_device(&self, name: &str, address: &str) {
        let mut inner = self.inner.lock();
        if inner.devices.iter().any(|d| d.name == name) {
            return;
        }
        inner.devices.push(PairedDevice {
            name: name.to_string(),
            address: address.to_string(),
        });
    }

    /// Simulate the Bluetooth stack denying access.
    pub fn set_permission_denied(&self, denied: bool) {
        self.inner.lock().permission_denied = denied;
    }

    /// Make connects to `name` fail.
    pub fn refuse(&self, name: &str) {
        self.inner.lock().refuse.push(name.to_string());
    }

    /// Make writes on every channel fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// Channels opened so far, oldest first.
    pub fn channels(&self) -> Vec<Arc<Mutex<ChannelRecord>>> {
        self.inner.lock().channels.clone()
    }

    /// Channels not yet shut down.
    pub fn open_channels(&self) -> usize {
        self.inner
            .lock()
            .channels
            .iter()
            .filter(|c| !c.lock().shut_down)
            .count()
    }

    pub fn discovery_cancels(&self) -> usize {
        self.inner.lock().discovery_cancels
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn paired_devices(&self) -> Result<Vec<PairedDevice>> {
        let inner = self.inner.lock();
        if inner.permission_denied {
            return Err(RelayError::PermissionDenied);
        }
        Ok(inner.devices.clone())
    }

    async fn cancel_discovery(&self) -> Result<()> {
        self.inner.lock().discovery_cancels += 1;
        Ok(())
    }

    async fn open(&self, device: &PairedDevice) -> Result<BoxedStream> {
        let mut inner = self.inner.lock();
        if inner.permission_denied {
            return Err(RelayError::PermissionDenied);
        }
        if inner.refuse.contains(&device.name) {
            return Err(RelayError::connect(
                &device.name,
                io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            ));
        }

        let record = Arc::new(Mutex::new(ChannelRecord {
            device: device.name.clone(),
            ..Default::default()
        }));
        inner.channels.push(record.clone());

        Ok(Box::new(LoopbackStream {
            record,
            transport: self.inner.clone(),
            echo: self.echo,
        }))
    }

    fn name(&self) -> &'static str {
        "loopback"
    }
}

struct LoopbackStream {
    record: Arc<Mutex<ChannelRecord>>,
    transport: Arc<Mutex<Inner>>,
    echo: bool,
}

impl AsyncWrite for LoopbackStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.transport.lock().fail_writes {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "channel closed by peer",
            )));
        }

        let mut record = self.record.lock();
        if record.shut_down {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "channel shut down",
            )));
        }
        record.written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut record = self.record.lock();
        if self.echo && record.flushed < record.written.len() {
            let pending = String::from_utf8_lossy(&record.written[record.flushed..]).into_owned();
            info!("[dry-run] {} <- {:?}", record.device, pending);
        }
        record.flushed = record.written.len();
        record.flushes += 1;
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.record.lock().shut_down = true;
        Poll::Ready(Ok(()))
    }
}
