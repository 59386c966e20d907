//! Integration tests for the full relay flow.

use std::sync::Arc;
use tokio::sync::mpsc;

use rgb_relay::bluetooth::{LoopbackTransport, SendOutcome};
use rgb_relay::events::{EventProcessor, NoticeLevel};
use rgb_relay::relay::{RelayEvent, RelayWorker};
use rgb_relay::state::{AppState, ConnectionStatus};
use rgb_relay::{Color, RelayError};

fn bonded() -> LoopbackTransport {
    LoopbackTransport::new()
        .with_device("HC-06", "98:D3:31:F5:2A:10")
        .with_device("Desk Strip", "00:21:13:00:8E:4C")
}

#[tokio::test]
async fn test_connect_and_send_green() {
    let transport = bonded();
    let (event_tx, _event_rx) = mpsc::channel(32);
    let (relay, worker) = RelayWorker::new(Arc::new(transport.clone()), event_tx).spawn(4);

    let device = relay.connect("HC-06").await.unwrap();
    assert_eq!(device.address, "98:D3:31:F5:2A:10");

    let outcome = relay.send_color(Color::new(0, 255, 0)).await.unwrap();
    assert_eq!(outcome, SendOutcome::Written);

    let channels = transport.channels();
    assert_eq!(channels.len(), 1);
    {
        let record = channels[0].lock();
        assert_eq!(record.device, "HC-06");
        assert_eq!(record.written, b"R0G255B0\n");
        assert_eq!(record.flushed, record.written.len());
    }

    drop(relay);
    worker.await.unwrap();
    assert!(channels[0].lock().shut_down);
}

#[tokio::test]
async fn test_send_before_connect_is_noop() {
    let transport = bonded();
    let (event_tx, _event_rx) = mpsc::channel(32);
    let (relay, _worker) = RelayWorker::new(Arc::new(transport.clone()), event_tx).spawn(4);

    let outcome = relay.send_color(Color::new(255, 128, 0)).await.unwrap();
    assert_eq!(outcome, SendOutcome::NotConnected);
    assert!(transport.channels().is_empty());
}

#[tokio::test]
async fn test_unknown_device_leaves_connection() {
    let transport = bonded();
    let (event_tx, _event_rx) = mpsc::channel(32);
    let (relay, _worker) = RelayWorker::new(Arc::new(transport.clone()), event_tx).spawn(4);

    relay.connect("HC-06").await.unwrap();
    let err = relay.connect("Unknown-Device").await.unwrap_err();
    assert!(matches!(err, RelayError::DeviceNotFound(_)));

    relay.send_color(Color::new(5, 0, 255)).await.unwrap();
    assert_eq!(transport.channels()[0].lock().written_str(), "R5G0B255\n");
}

#[tokio::test]
async fn test_second_connect_is_authoritative() {
    let transport = bonded();
    let (event_tx, _event_rx) = mpsc::channel(32);
    let (relay, _worker) = RelayWorker::new(Arc::new(transport.clone()), event_tx).spawn(4);

    relay.connect("HC-06").await.unwrap();
    relay.send_color(Color::new(1, 1, 1)).await.unwrap();
    relay.connect("Desk Strip").await.unwrap();
    relay.send_color(Color::new(2, 2, 2)).await.unwrap();

    let channels = transport.channels();
    assert_eq!(channels[0].lock().written_str(), "R1G1B1\n");
    assert!(channels[0].lock().shut_down);
    assert_eq!(channels[1].lock().written_str(), "R2G2B2\n");
    assert_eq!(transport.open_channels(), 1);
}

#[tokio::test]
async fn test_permission_denied_reaches_user() {
    let transport = bonded();
    transport.set_permission_denied(true);
    let (event_tx, mut event_rx) = mpsc::channel(32);
    let (relay, worker) = RelayWorker::new(Arc::new(transport), event_tx).spawn(4);

    let err = relay.list_devices().await.unwrap_err();
    assert!(err.is_permission_denied());
    let err = relay.connect("HC-06").await.unwrap_err();
    assert!(err.is_permission_denied());

    drop(relay);
    worker.await.unwrap();

    let state = AppState::new();
    let mut processor = EventProcessor::new(state.clone());
    let mut notices = Vec::new();
    while let Some(event) = event_rx.recv().await {
        assert!(matches!(event, RelayEvent::PermissionDenied));
        notices.extend(processor.process_event(event));
    }
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Error));
    assert_eq!(state.get_status(), ConnectionStatus::Error);
}

#[tokio::test]
async fn test_dry_run_registers_device_on_connect() {
    let transport = LoopbackTransport::new().echoing();
    let (event_tx, _event_rx) = mpsc::channel(32);
    let (relay, _worker) = RelayWorker::new(Arc::new(transport.clone()), event_tx).spawn(4);

    assert!(relay.list_devices().await.unwrap().is_empty());
    let err = relay.connect("Desk Strip").await.unwrap_err();
    assert!(matches!(err, RelayError::DeviceNotFound(_)));

    transport.add_device("Desk Strip", "00:00:00:00:00:00");
    relay.connect("Desk Strip").await.unwrap();
    relay.send_color(Color::new(0, 0, 255)).await.unwrap();
    assert_eq!(transport.channels()[0].lock().written_str(), "R0G0B255\n");
}
