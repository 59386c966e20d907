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

//! Background relay worker.
//!
//! A single task owns the [`SerialLink`] and processes requests in the order
//! they were queued, so sends never interleave and a reconnect never races a
//! write. Callers hold a cloneable [`RelayHandle`]; the worker stops once
//! every handle is dropped.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::bluetooth::{Command, DeviceDirectory, PairedDevice, SendOutcome, SerialLink, Transport};
use crate::color::Color;
use crate::error::{RelayError, Result};

/// Events emitted by the relay worker.
#[derive(Debug)]
pub enum RelayEvent {
    /// Bonded devices were listed.
    DevicesListed(Vec<PairedDevice>),
    /// Listing bonded devices failed for a reason other than permissions.
    ListFailed { error: String },
    /// Connection established.
    Connected { device_name: String },
    /// Connect attempt failed.
    ConnectFailed { device_name: String, error: String },
    /// Connection closed on request.
    Disconnected { device_name: String },
    /// Color written to the controller.
    Sent(Color),
    /// Write failed.
    SendFailed { color: Color, error: String },
    /// The Bluetooth stack refused access.
    PermissionDenied,
}

enum RelayRequest {
    ListDevices {
        reply: oneshot::Sender<Result<Vec<PairedDevice>>>,
    },
    Connect {
        name: String,
        reply: oneshot::Sender<Result<PairedDevice>>,
    },
    SendColor {
        color: Color,
        reply: oneshot::Sender<Result<SendOutcome>>,
    },
    Disconnect {
        reply: oneshot::Sender<Option<PairedDevice>>,
    },
}

/// Handle for queuing work on the relay worker.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayRequest>,
}

impl RelayHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RelayRequest,
    ) -> std::result::Result<T, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RelayError::WorkerGone)?;
        reply_rx.await.map_err(|_| RelayError::WorkerGone)
    }

    /// List bonded devices.
    pub async fn list_devices(&self) -> Result<Vec<PairedDevice>> {
        self.request(|reply| RelayRequest::ListDevices { reply }).await?
    }

    /// Connect to a device by display name.
    pub async fn connect(&self, name: &str) -> Result<PairedDevice> {
        let name = name.to_string();
        self.request(|reply| RelayRequest::Connect { name, reply }).await?
    }

    /// Send a color to the connected device.
    pub async fn send_color(&self, color: Color) -> Result<SendOutcome> {
        self.request(|reply| RelayRequest::SendColor { color, reply }).await?
    }

    /// Close the active connection.
    pub async fn disconnect(&self) -> Result<Option<PairedDevice>> {
        self.request(|reply| RelayRequest::Disconnect { reply }).await
    }
}

/// Worker that owns the serial link.
pub struct RelayWorker {
    link: SerialLink,
    event_tx: mpsc::Sender<RelayEvent>,
}

impl RelayWorker {
    pub fn new(transport: Arc<dyn Transport>, event_tx: mpsc::Sender<RelayEvent>) -> Self {
        Self {
            link: SerialLink::new(DeviceDirectory::new(transport)),
            event_tx,
        }
    }

    /// Spawn the worker with a bounded request queue.
    pub fn spawn(self, queue_depth: usize) -> (RelayHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let task = tokio::spawn(self.run(rx));
        (RelayHandle { tx }, task)
    }

    /// Emit an event without waiting on the consumer.
    fn emit(&self, event: RelayEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            debug!("Relay event dropped: {}", e);
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<RelayRequest>) {
        info!("Relay worker started");

        while let Some(request) = rx.recv().await {
            match request {
                RelayRequest::ListDevices { reply } => {
                    let result = self.handle_list().await;
                    let _ = reply.send(result);
                }
                RelayRequest::Connect { name, reply } => {
                    let result = self.handle_connect(&name).await;
                    let _ = reply.send(result);
                }
                RelayRequest::SendColor { color, reply } => {
                    let result = self.handle_send(color).await;
                    let _ = reply.send(result);
                }
                RelayRequest::Disconnect { reply } => {
                    let device = self.link.disconnect().await;
                    if let Some(device) = &device {
                        self.emit(RelayEvent::Disconnected {
                            device_name: device.name.clone(),
                        });
                    }
                    let _ = reply.send(device);
                }
            }
        }

        if let Some(device) = self.link.disconnect().await {
            self.emit(RelayEvent::Disconnected {
                device_name: device.name,
            });
        }
        info!("Relay worker stopped");
    }

    async fn handle_list(&mut self) -> Result<Vec<PairedDevice>> {
        match self.link.directory_mut().list().await {
            Ok(devices) => {
                self.emit(RelayEvent::DevicesListed(devices.clone()));
                Ok(devices)
            }
            Err(RelayError::PermissionDenied) => {
                self.emit(RelayEvent::PermissionDenied);
                Err(RelayError::PermissionDenied)
            }
            Err(e) => {
                self.emit(RelayEvent::ListFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn handle_connect(&mut self, name: &str) -> Result<PairedDevice> {
        match self.link.connect(name).await {
            Ok(device) => {
                let device = device.clone();
                self.emit(RelayEvent::Connected {
                    device_name: device.name.clone(),
                });
                Ok(device)
            }
            Err(RelayError::PermissionDenied) => {
                self.emit(RelayEvent::PermissionDenied);
                Err(RelayError::PermissionDenied)
            }
            Err(e) => {
                self.emit(RelayEvent::ConnectFailed {
                    device_name: name.to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn handle_send(&mut self, color: Color) -> Result<SendOutcome> {
        match self.link.send(&Command::from(color)).await {
            Ok(SendOutcome::Written) => {
                self.emit(RelayEvent::Sent(color));
                Ok(SendOutcome::Written)
            }
            Ok(SendOutcome::NotConnected) => {
                debug!("Color {} dropped, not connected", color);
                Ok(SendOutcome::NotConnected)
            }
            Err(e) => {
                self.emit(RelayEvent::SendFailed {
                    color,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }
}
