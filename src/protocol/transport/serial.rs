use std::{
    io::{self, Read, Write},
    time::Duration,
};

use serialport::{DataBits, SerialPort, StopBits};

use super::{Connector, LineTransport, ReadError};
use crate::protocol::tty;

/// Baud rate the Marauder firmware console runs at.
pub const BAUD_RATE: u32 = 115_200;

/// Upper bound for a single blocking read.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: serialport::Parity,
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud: BAUD_RATE,
            data_bits: 8,
            stop_bits: 1,
            parity: serialport::Parity::None,
            timeout: READ_TIMEOUT,
        }
    }
}

impl SerialConfig {
    pub fn apply_builder(&self, b: serialport::SerialPortBuilder) -> serialport::SerialPortBuilder {
        let b = b.baud_rate(self.baud).timeout(self.timeout);
        let b = b.data_bits(match self.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        });
        let b = b.stop_bits(match self.stop_bits {
            2 => StopBits::Two,
            _ => StopBits::One,
        });
        b.parity(self.parity)
    }
}

/// Opens real serial ports with a fixed [`SerialConfig`].
#[derive(Debug, Clone, Default)]
pub struct SerialConnector {
    config: SerialConfig,
}

impl SerialConnector {
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }
}

impl Connector for SerialConnector {
    fn list_ports(&self) -> Vec<String> {
        tty::available_ports_sorted()
            .into_iter()
            .map(|p| p.port_name)
            .collect()
    }

    fn open(&self, port: &str) -> Result<Box<dyn LineTransport>, String> {
        let builder = self.config.apply_builder(serialport::new(port, self.config.baud));
        let handle = builder.open().map_err(|err| err.to_string())?;
        log::debug!("Opened {port} at {} baud", self.config.baud);
        Ok(Box::new(SerialTransport::new(handle)))
    }
}

/// Line reader/writer over a `serialport` handle.
///
/// Bytes read past a newline are kept in `pending` for the next call.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl SerialTransport {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            port,
            pending: Vec::with_capacity(256),
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.pending.iter().position(|b| *b == b'\n')?;
        let rest = self.pending.split_off(pos + 1);
        Some(std::mem::replace(&mut self.pending, rest))
    }
}

impl LineTransport for SerialTransport {
    fn bytes_available(&mut self) -> Result<usize, ReadError> {
        let waiting = self
            .port
            .bytes_to_read()
            .map_err(|err| map_serial_error(&err))?;
        Ok(self.pending.len() + waiting as usize)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ReadError> {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }
            let mut buf = [0u8; 256];
            match self.port.read(&mut buf) {
                Ok(0) => return Err(ReadError::transport("serial port reached end of stream")),
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    return Ok(std::mem::take(&mut self.pending));
                }
                Err(e) => return Err(ReadError::from_io(e)),
            }
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }
}

fn map_serial_error(err: &serialport::Error) -> ReadError {
    match err.kind() {
        serialport::ErrorKind::Io(kind) => ReadError::from_io(io::Error::new(kind, err.to_string())),
        _ => ReadError::transport(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_115200_8n1() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud, 115_200);
        assert_eq!(cfg.data_bits, 8);
        assert_eq!(cfg.stop_bits, 1);
        assert_eq!(cfg.parity, serialport::Parity::None);
        assert_eq!(cfg.timeout, Duration::from_secs(1));
    }

    #[test]
    fn serial_errors_map_to_read_errors() {
        let gone = serialport::Error::new(serialport::ErrorKind::NoDevice, "device removed");
        assert!(map_serial_error(&gone).is_fatal());

        let eintr = serialport::Error::new(
            serialport::ErrorKind::Io(io::ErrorKind::Interrupted),
            "interrupted",
        );
        assert!(!map_serial_error(&eintr).is_fatal());
    }

    #[test]
    fn opening_a_missing_port_reports_the_transport_message() {
        let connector = SerialConnector::default();
        let err = connector
            .open("/dev/marauder-does-not-exist")
            .err()
            .expect("missing port must not open");
        assert!(!err.is_empty());
    }
}
