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

//! Transport seam between the relay and the Bluetooth stack.

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWrite;

use crate::error::Result;

/// A bonded Bluetooth device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairedDevice {
    pub name: String,
    pub address: String,
}

/// Writable half of an open serial channel.
pub trait LinkStream: AsyncWrite + Send + Unpin {}

impl<T: AsyncWrite + Send + Unpin> LinkStream for T {}

/// Boxed serial channel.
pub type BoxedStream = Box<dyn LinkStream>;

/// Access to the platform Bluetooth stack.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Read the current set of bonded devices.
    async fn paired_devices(&self) -> Result<Vec<PairedDevice>>;

    /// Stop any discovery that would slow down a connect.
    async fn cancel_discovery(&self) -> Result<()>;

    /// Open a serial channel to the device.
    async fn open(&self, device: &PairedDevice) -> Result<BoxedStream>;

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}
