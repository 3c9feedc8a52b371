//! Byte transports the session talks through.
//!
//! A [`Connector`] enumerates and opens ports; every opened port is a
//! [`LineTransport`]. The serial implementation talks to real hardware, the
//! memory implementation is scripted and is what the test-suite drives.
//! Dropping a transport closes the underlying handle.

pub mod memory;
pub mod serial;

use std::io;

use derive_more::{Display, Error};

pub use memory::{MemoryConnector, MemoryDevice};
pub use serial::{SerialConfig, SerialConnector, SerialTransport};

/// Failure raised while polling or reading a transport.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ReadError {
    /// The link itself is gone (device unplugged, broken pipe, end of stream).
    #[display("serial transport failure: {message}")]
    Transport { message: String },
    /// A single read went wrong but the link is still usable.
    #[display("read error: {message}")]
    Transient { message: String },
}

impl ReadError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Whether the error forces the session to tear the connection down.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Classify an I/O error coming out of a port read.
    ///
    /// `TimedOut` must be filtered by the caller, it is not an error here.
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::InvalidData => {
                Self::transient(err.to_string())
            }
            _ => Self::transport(err.to_string()),
        }
    }
}

/// A line-oriented, bidirectional byte link to one device.
pub trait LineTransport: Send {
    /// Number of bytes that can be read without waiting.
    fn bytes_available(&mut self) -> Result<usize, ReadError>;

    /// Read up to and including the next `\n`.
    ///
    /// Returns whatever arrived if the read timeout expires first, which may
    /// be an empty buffer.
    fn read_line(&mut self) -> Result<Vec<u8>, ReadError>;

    /// Write every byte and flush.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;
}

/// Opens transports by port identifier.
pub trait Connector: Send + Sync {
    /// Currently attached ports. Never fails, may be empty.
    fn list_ports(&self) -> Vec<String>;

    /// Open `port`, returning the transport error message on failure.
    fn open(&self, port: &str) -> Result<Box<dyn LineTransport>, String>;
}

/// Decode a raw line, dropping invalid UTF-8 sequences, and trim it.
pub fn decode_line(raw: &[u8]) -> String {
    let mut text = String::with_capacity(raw.len());
    for chunk in raw.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_line_trims_crlf() {
        assert_eq!(decode_line(b"  CH: 6 SSID: TestNet\r\n"), "CH: 6 SSID: TestNet");
        assert_eq!(decode_line(b"stop\n"), "stop");
        assert_eq!(decode_line(b"\r\n"), "");
    }

    #[test]
    fn decode_line_drops_invalid_sequences() {
        let raw = [b'o', b'k', 0xff, 0xfe, b'!', b'\n'];
        assert_eq!(decode_line(&raw), "ok!");

        // A truncated multi-byte sequence at the end is dropped as well.
        let raw = [b'a', 0xe2, 0x82];
        assert_eq!(decode_line(&raw), "a");
    }

    #[test]
    fn decode_line_keeps_valid_multibyte_text() {
        assert_eq!(decode_line("Café ☕\n".as_bytes()), "Café ☕");
    }

    #[test]
    fn io_errors_are_classified() {
        let transient = ReadError::from_io(io::Error::new(io::ErrorKind::Interrupted, "eintr"));
        assert!(!transient.is_fatal());

        let fatal = ReadError::from_io(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(fatal.is_fatal());
        assert_eq!(fatal.to_string(), "serial transport failure: gone");
    }
}
