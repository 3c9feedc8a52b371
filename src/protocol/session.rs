//! Serial command session.
//!
//! A [`Session`] owns at most one open transport and the reader thread that
//! drains it. Everything observable (connects, received lines, classified
//! events, failures) is published on a flume channel so any frontend can
//! consume it from its own loop.
//!
//! Write and read failures tear the connection down: once the link has
//! failed it is assumed unusable.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use derive_more::{Display, Error};
use flume::{Receiver, Sender};
use parking_lot::Mutex;
use serde::Serialize;

use crate::protocol::{
    classify::{ClassifiedEvent, Classifier, MarauderClassifier},
    daemon::serial_daemon::{boot_serial_loop, ReaderContext},
    transport::{Connector, LineTransport, SerialConnector},
};

/// Grace period after opening the port while the firmware boots.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Reader back-off when no bytes are pending.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub settle_delay: Duration,
    pub poll_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            settle_delay: SETTLE_DELAY,
            poll_interval: POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ConnectError {
    #[display("no serial port selected")]
    NoPortSelected,
    #[display("already connected to {port}")]
    AlreadyConnected { port: String },
    #[display("failed to open {port}: {message}")]
    Open { port: String, message: String },
}

/// A write to the device failed; the session has been disconnected.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("send to {port} failed: {message}")]
pub struct SendError {
    pub port: String,
    pub message: String,
}

/// Result of a [`Session::send`] call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Written to the device, terminator excluded.
    Sent(String),
    /// The command was blank; nothing happened.
    Skipped,
    /// No open connection; nothing was written.
    NotConnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Connected { port: String },
}

/// Everything a frontend needs to render the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Connected { port: String },
    Disconnected,
    LineReceived { line: String },
    Classified { event: ClassifiedEvent },
    Sent { command: String },
    SendError { message: String },
    ReadError { message: String },
}

pub(crate) type SharedTransport = Arc<Mutex<Box<dyn LineTransport>>>;

/// One live connection and its reader.
pub(crate) struct Link {
    id: u64,
    port: String,
    transport: SharedTransport,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

/// Holder of the current link, shared with the reader thread.
#[derive(Default)]
pub(crate) struct LinkSlot {
    link: Mutex<Option<Link>>,
    next_id: AtomicU64,
}

impl LinkSlot {
    /// Remove the current link. With `Some(id)` only that exact link is
    /// removed, so a stale reader or writer cannot tear down a newer one.
    pub(crate) fn take(&self, id: Option<u64>) -> Option<Link> {
        let mut guard = self.link.lock();
        if let (Some(link), Some(id)) = (guard.as_ref(), id) {
            if link.id != id {
                return None;
            }
        }
        guard.take()
    }

    fn snapshot(&self) -> Option<(u64, String, SharedTransport)> {
        self.link
            .lock()
            .as_ref()
            .map(|link| (link.id, link.port.clone(), Arc::clone(&link.transport)))
    }

    fn port(&self) -> Option<String> {
        self.link.lock().as_ref().map(|link| link.port.clone())
    }
}

/// Stop the reader, close the handle and announce the disconnect.
pub(crate) fn teardown(mut link: Link, evt_tx: &Sender<SessionEvent>) {
    link.running.store(false, Ordering::Release);
    if let Some(reader) = link.reader.take() {
        // The reader tears down its own link on read failure; it cannot join itself.
        if reader.thread().id() != thread::current().id() && reader.join().is_err() {
            log::warn!("Reader thread for {} panicked", link.port);
        }
    }
    let port = link.port.clone();
    drop(link);
    log::info!("Disconnected from {port}");
    let _ = evt_tx.send(SessionEvent::Disconnected);
}

pub struct Session {
    connector: Arc<dyn Connector>,
    classifier: Arc<dyn Classifier>,
    options: SessionOptions,
    slot: Arc<LinkSlot>,
    evt_tx: Sender<SessionEvent>,
    evt_rx: Receiver<SessionEvent>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self::with_options(connector, Arc::new(MarauderClassifier), SessionOptions::default())
    }

    /// Session over real serial ports at 115200 8N1.
    pub fn serial() -> Self {
        Self::new(Arc::new(SerialConnector::default()))
    }

    pub fn with_options(
        connector: Arc<dyn Connector>,
        classifier: Arc<dyn Classifier>,
        options: SessionOptions,
    ) -> Self {
        let (evt_tx, evt_rx) = flume::unbounded();
        Self {
            connector,
            classifier,
            options,
            slot: Arc::new(LinkSlot::default()),
            evt_tx,
            evt_rx,
        }
    }

    /// Receiving side of the event channel. Clones share one queue.
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.evt_rx.clone()
    }

    pub fn list_available_ports(&self) -> Vec<String> {
        self.connector.list_ports()
    }

    pub fn status(&self) -> SessionStatus {
        match self.slot.port() {
            Some(port) => SessionStatus::Connected { port },
            None => SessionStatus::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.slot.port().is_some()
    }

    pub fn port(&self) -> Option<String> {
        self.slot.port()
    }

    /// Open `port`, wait for the device to settle and start the reader.
    pub fn connect(&self, port: &str) -> Result<(), ConnectError> {
        let port = port.trim();
        if port.is_empty() {
            return Err(ConnectError::NoPortSelected);
        }
        if let Some(current) = self.slot.port() {
            return Err(ConnectError::AlreadyConnected { port: current });
        }

        let transport = self.connector.open(port).map_err(|message| {
            log::warn!("Failed to open {port}: {message}");
            ConnectError::Open {
                port: port.to_string(),
                message,
            }
        })?;
        log::debug!(
            "Opened {port}, waiting {:?} for the device to settle",
            self.options.settle_delay
        );
        thread::sleep(self.options.settle_delay);

        let mut guard = self.slot.link.lock();
        if let Some(current) = guard.as_ref() {
            return Err(ConnectError::AlreadyConnected {
                port: current.port.clone(),
            });
        }

        let id = self.slot.next_id.fetch_add(1, Ordering::Relaxed);
        let transport: SharedTransport = Arc::new(Mutex::new(transport));
        let running = Arc::new(AtomicBool::new(true));
        let _ = self.evt_tx.send(SessionEvent::Connected {
            port: port.to_string(),
        });

        let ctx = ReaderContext {
            link_id: id,
            port: port.to_string(),
            transport: Arc::clone(&transport),
            running: Arc::clone(&running),
            slot: Arc::clone(&self.slot),
            classifier: Arc::clone(&self.classifier),
            evt_tx: self.evt_tx.clone(),
            poll_interval: self.options.poll_interval,
        };
        let reader = match thread::Builder::new()
            .name(format!("marauder-reader-{id}"))
            .spawn(move || boot_serial_loop(ctx))
        {
            Ok(reader) => reader,
            Err(err) => {
                log::error!("Failed to start reader for {port}: {err}");
                let _ = self.evt_tx.send(SessionEvent::Disconnected);
                return Err(ConnectError::Open {
                    port: port.to_string(),
                    message: format!("failed to start reader thread: {err}"),
                });
            }
        };

        *guard = Some(Link {
            id,
            port: port.to_string(),
            transport,
            running,
            reader: Some(reader),
        });
        log::info!("Connected to {port}");
        Ok(())
    }

    /// Close the connection if there is one. Safe to call repeatedly.
    pub fn disconnect(&self) {
        if let Some(link) = self.slot.take(None) {
            teardown(link, &self.evt_tx);
        }
    }

    /// Send one command line.
    ///
    /// Surrounding whitespace is trimmed and interior line breaks become
    /// spaces, so exactly one `\n` terminates what reaches the device.
    pub fn send(&self, command: &str) -> Result<SendOutcome, SendError> {
        let command = command.trim();
        if command.is_empty() {
            return Ok(SendOutcome::Skipped);
        }
        let command = command.replace(['\r', '\n'], " ");

        let Some((id, port, transport)) = self.slot.snapshot() else {
            log::warn!("Not connected, dropping command '{command}'");
            return Ok(SendOutcome::NotConnected);
        };

        let mut payload = Vec::with_capacity(command.len() + 1);
        payload.extend_from_slice(command.as_bytes());
        payload.push(b'\n');
        let result = transport.lock().write_all(&payload);
        drop(transport);

        match result {
            Ok(()) => {
                log::debug!("Sent to {port}: {command}");
                let _ = self.evt_tx.send(SessionEvent::Sent {
                    command: command.clone(),
                });
                Ok(SendOutcome::Sent(command))
            }
            Err(err) => {
                let error = SendError {
                    port,
                    message: err.to_string(),
                };
                log::warn!("{error}");
                let _ = self.evt_tx.send(SessionEvent::SendError {
                    message: error.to_string(),
                });
                if let Some(link) = self.slot.take(Some(id)) {
                    teardown(link, &self.evt_tx);
                }
                Err(error)
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::transport::MemoryConnector;

    fn quick(connector: MemoryConnector) -> Session {
        Session::with_options(
            Arc::new(connector),
            Arc::new(MarauderClassifier),
            SessionOptions {
                settle_delay: Duration::ZERO,
                poll_interval: Duration::from_millis(5),
            },
        )
    }

    #[test]
    fn default_options_match_firmware_timing() {
        let options = SessionOptions::default();
        assert_eq!(options.settle_delay, Duration::from_secs(2));
        assert_eq!(options.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn blank_port_is_rejected() {
        let session = quick(MemoryConnector::new().with_port("COM3"));
        assert_eq!(session.connect("   "), Err(ConnectError::NoPortSelected));
        assert_eq!(session.status(), SessionStatus::Disconnected);
    }

    #[test]
    fn second_connect_is_rejected_while_connected() {
        let connector = MemoryConnector::new().with_port("COM3").with_port("COM4");
        let session = quick(connector);
        session.connect("COM3").expect("connect");
        assert_eq!(
            session.connect("COM4"),
            Err(ConnectError::AlreadyConnected {
                port: "COM3".to_string()
            })
        );
        assert_eq!(session.port().as_deref(), Some("COM3"));
    }

    #[test]
    fn interior_line_breaks_are_flattened() {
        let connector = MemoryConnector::new().with_port("COM3");
        let device = connector.device("COM3").expect("device");
        let session = quick(connector);
        session.connect("COM3").expect("connect");

        let outcome = session.send(" ssid -a\r\nfoo ").expect("send");
        assert_eq!(outcome, SendOutcome::Sent("ssid -a  foo".to_string()));
        assert_eq!(device.written(), b"ssid -a  foo\n");
    }

    #[test]
    fn stale_link_id_does_not_take_newer_link() {
        let connector = MemoryConnector::new().with_port("COM3");
        let session = quick(connector);
        session.connect("COM3").expect("connect");
        assert!(session.slot.take(Some(u64::MAX)).is_none());
        assert!(session.is_connected());
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_string(&SessionEvent::LineReceived {
            line: "> ok".to_string(),
        })
        .expect("serialize");
        assert_eq!(json, r#"{"type":"line_received","line":"> ok"}"#);

        let json = serde_json::to_string(&SessionEvent::Classified {
            event: ClassifiedEvent::AttackStarted,
        })
        .expect("serialize");
        assert_eq!(json, r#"{"type":"classified","event":{"kind":"attack_started"}}"#);
    }
}
