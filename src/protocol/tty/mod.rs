// Platform-dispatched TTY helpers

use serde::Serialize;
use serialport::{SerialPortInfo, SerialPortType};

#[cfg(windows)]
mod tty_windows;
#[cfg(windows)]
pub use tty_windows::sort_and_dedup_ports;

#[cfg(unix)]
mod tty_unix;
#[cfg(unix)]
pub use tty_unix::sort_and_dedup_ports;

// Fallback for other platforms: keep enumeration order, drop exact duplicates
#[cfg(not(any(unix, windows)))]
pub fn sort_and_dedup_ports(mut raw_ports: Vec<SerialPortInfo>) -> Vec<SerialPortInfo> {
    raw_ports.dedup_by(|a, b| a.port_name == b.port_name);
    raw_ports
}

/// A port as shown to the user: the openable name plus a short description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortEntry {
    pub port_name: String,
    pub port_type: String,
}

/// Return the list of available serial ports sorted/deduped for this platform.
///
/// Enumeration failures are logged and yield an empty list.
pub fn available_ports_sorted() -> Vec<SerialPortInfo> {
    let raw_ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(err) => {
            log::warn!("Serial port enumeration failed: {err}");
            Vec::new()
        }
    };
    sort_and_dedup_ports(raw_ports)
}

/// Sorted ports with a printable type description.
pub fn enumerate_ports() -> Vec<PortEntry> {
    available_ports_sorted()
        .into_iter()
        .map(|p| PortEntry {
            port_type: describe_port_type(&p.port_type),
            port_name: p.port_name,
        })
        .collect()
}

pub fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(info) => {
            let mut text = format!("usb {:04x}:{:04x}", info.vid, info.pid);
            if let Some(product) = &info.product {
                text.push(' ');
                text.push_str(product);
            }
            text
        }
        SerialPortType::PciPort => "pci".to_string(),
        SerialPortType::BluetoothPort => "bluetooth".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    #[test]
    fn describe_usb_port() {
        let pt = SerialPortType::UsbPort(UsbPortInfo {
            vid: 0x10c4,
            pid: 0xea60,
            serial_number: None,
            manufacturer: Some("Silicon Labs".to_string()),
            product: Some("CP2102".to_string()),
        });
        assert_eq!(describe_port_type(&pt), "usb 10c4:ea60 CP2102");
        assert_eq!(describe_port_type(&SerialPortType::Unknown), "unknown");
    }
}
