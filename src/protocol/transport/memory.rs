//! Scripted in-memory transport.
//!
//! Lets a frontend or a test stand in a fake Marauder device: inbound lines
//! and read failures are queued on a [`MemoryDevice`], outbound bytes are
//! recorded, and writes can be made to fail on demand.

use std::{
    collections::{HashMap, VecDeque},
    io,
    sync::Arc,
};

use parking_lot::Mutex;

use super::{Connector, LineTransport, ReadError};

#[derive(Debug)]
enum Inbound {
    Bytes(Vec<u8>),
    Error(ReadError),
}

#[derive(Debug, Default)]
struct DeviceState {
    inbound: VecDeque<Inbound>,
    written: Vec<u8>,
    writes: usize,
    write_failure: Option<String>,
    open_handles: usize,
    opened_total: usize,
}

/// Shared handle to one fake device. Clones refer to the same device.
#[derive(Debug, Clone, Default)]
pub struct MemoryDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line; the `\n` terminator is appended.
    pub fn push_line(&self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.push_bytes(&bytes);
    }

    /// Queue raw bytes exactly as given.
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.state
            .lock()
            .inbound
            .push_back(Inbound::Bytes(bytes.to_vec()));
    }

    /// Queue a read failure, surfaced once the preceding bytes are consumed.
    pub fn push_error(&self, err: ReadError) {
        self.state.lock().inbound.push_back(Inbound::Error(err));
    }

    /// Make every following write fail with `message` (or succeed again on `None`).
    pub fn fail_writes(&self, message: Option<&str>) {
        self.state.lock().write_failure = message.map(str::to_string);
    }

    /// Every byte successfully written so far.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    /// Number of successful `write_all` calls.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    /// Whether a transport handle to this device is currently alive.
    pub fn is_open(&self) -> bool {
        self.state.lock().open_handles > 0
    }

    /// How many times the device has been opened.
    pub fn times_opened(&self) -> usize {
        self.state.lock().opened_total
    }

    /// Whether every queued inbound item has been consumed.
    pub fn drained(&self) -> bool {
        self.state.lock().inbound.is_empty()
    }

    fn open_transport(&self) -> MemoryTransport {
        let mut state = self.state.lock();
        state.open_handles += 1;
        state.opened_total += 1;
        MemoryTransport {
            device: self.clone(),
        }
    }
}

/// Transport handle to a [`MemoryDevice`]; closes the device on drop.
#[derive(Debug)]
pub struct MemoryTransport {
    device: MemoryDevice,
}

impl LineTransport for MemoryTransport {
    fn bytes_available(&mut self) -> Result<usize, ReadError> {
        let state = self.device.state.lock();
        let mut total = 0;
        for item in state.inbound.iter() {
            match item {
                Inbound::Bytes(bytes) => total += bytes.len(),
                // Report at least one byte so the reader reaches the error.
                Inbound::Error(_) => return Ok(total.max(1)),
            }
        }
        Ok(total)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ReadError> {
        let mut state = self.device.state.lock();
        let mut line = Vec::new();
        while let Some(item) = state.inbound.pop_front() {
            match item {
                Inbound::Error(err) => {
                    if line.is_empty() {
                        return Err(err);
                    }
                    state.inbound.push_front(Inbound::Error(err));
                    return Ok(line);
                }
                Inbound::Bytes(mut bytes) => {
                    if let Some(pos) = bytes.iter().position(|b| *b == b'\n') {
                        let rest = bytes.split_off(pos + 1);
                        line.extend_from_slice(&bytes);
                        if !rest.is_empty() {
                            state.inbound.push_front(Inbound::Bytes(rest));
                        }
                        return Ok(line);
                    }
                    line.extend_from_slice(&bytes);
                }
            }
        }
        // Queue exhausted without a terminator: behaves like a read timeout.
        Ok(line)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.device.state.lock();
        if let Some(message) = state.write_failure.clone() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, message));
        }
        state.written.extend_from_slice(data);
        state.writes += 1;
        Ok(())
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        let mut state = self.device.state.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
    }
}

/// Connector over a fixed set of [`MemoryDevice`]s.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    ports: Vec<String>,
    devices: HashMap<String, MemoryDevice>,
    failures: HashMap<String, String>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a port that opens successfully.
    pub fn with_port(mut self, port: &str) -> Self {
        self.ports.push(port.to_string());
        self.devices.insert(port.to_string(), MemoryDevice::new());
        self
    }

    /// Register a listed port whose open always fails with `message`.
    pub fn with_failing_port(mut self, port: &str, message: &str) -> Self {
        self.ports.push(port.to_string());
        self.failures.insert(port.to_string(), message.to_string());
        self
    }

    pub fn device(&self, port: &str) -> Option<MemoryDevice> {
        self.devices.get(port).cloned()
    }
}

impl Connector for MemoryConnector {
    fn list_ports(&self) -> Vec<String> {
        self.ports.clone()
    }

    fn open(&self, port: &str) -> Result<Box<dyn LineTransport>, String> {
        if let Some(message) = self.failures.get(port) {
            return Err(message.clone());
        }
        match self.devices.get(port) {
            Some(device) => Ok(Box::new(device.open_transport())),
            None => Err(format!("could not open port '{port}': No such file or directory")),
        }
    }
}
